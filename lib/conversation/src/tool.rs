//! Tool catalog for conversation mode.
//!
//! The catalog is built once at startup and sent unchanged with every
//! completion request.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

/// The tools the model may call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolName {
    /// Read-only `SELECT` queries.
    RunSqlQuery,
    /// `INSERT`, `UPDATE` and `DELETE` statements.
    RunSqlMutation,
}

impl ToolName {
    /// All known tools, in catalog order.
    pub const ALL: [ToolName; 2] = [ToolName::RunSqlQuery, ToolName::RunSqlMutation];

    /// Returns the wire name of the tool.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RunSqlQuery => "run_sql_query",
            Self::RunSqlMutation => "run_sql_mutation",
        }
    }

    /// Looks up a tool by its wire name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tool| tool.as_str() == name)
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Definition of a tool available during conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Unique tool name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// JSON schema for input parameters.
    pub input_schema: JsonValue,
}

impl ToolDefinition {
    /// Creates a new tool definition.
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema: serde_json::json!({}),
        }
    }

    /// Sets the input schema.
    #[must_use]
    pub fn with_input_schema(mut self, schema: JsonValue) -> Self {
        self.input_schema = schema;
        self
    }
}

/// Immutable, ordered list of tool definitions.
#[derive(Debug, Clone, Default)]
pub struct ToolCatalog {
    definitions: Vec<ToolDefinition>,
}

impl ToolCatalog {
    /// Creates a catalog from definitions, keeping their order.
    #[must_use]
    pub fn new(definitions: Vec<ToolDefinition>) -> Self {
        Self { definitions }
    }

    /// The SQL catalog served by the gateway.
    #[must_use]
    pub fn sql() -> Self {
        let query_schema = |description: &str| {
            serde_json::json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": description
                    }
                },
                "required": ["query"]
            })
        };

        Self::new(vec![
            ToolDefinition::new(
                ToolName::RunSqlQuery.as_str(),
                "Execute a read-only SQL SELECT query against the database and return the resulting rows.",
            )
            .with_input_schema(query_schema("The SELECT statement to run.")),
            ToolDefinition::new(
                ToolName::RunSqlMutation.as_str(),
                "Execute a SQL INSERT, UPDATE or DELETE statement against the database and return the outcome.",
            )
            .with_input_schema(query_schema(
                "The INSERT, UPDATE or DELETE statement to run.",
            )),
        ])
    }

    /// Returns all tool definitions in order.
    pub fn all(&self) -> impl Iterator<Item = &ToolDefinition> {
        self.definitions.iter()
    }

    /// Returns the number of tools.
    #[must_use]
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Returns whether the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Converts definitions to the function-tool format of chat-completion APIs.
    #[must_use]
    pub fn to_llm_format(&self) -> Vec<JsonValue> {
        self.all()
            .map(|def| {
                serde_json::json!({
                    "type": "function",
                    "function": {
                        "name": def.name,
                        "description": def.description,
                        "parameters": def.input_schema
                    }
                })
            })
            .collect()
    }
}
