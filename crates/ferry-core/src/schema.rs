//! Schema catalog types: table references and column descriptors

use serde::{Deserialize, Serialize};

/// The table(s) a projection reads from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum TableReference {
    /// A single named table
    Single { table: String },
    /// Several tables joined by an opaque condition expression
    Join {
        tables: Vec<String>,
        condition: String,
    },
}

impl TableReference {
    pub fn single(table: impl Into<String>) -> Self {
        TableReference::Single {
            table: table.into(),
        }
    }

    pub fn join(tables: Vec<String>, condition: impl Into<String>) -> Self {
        TableReference::Join {
            tables,
            condition: condition.into(),
        }
    }

    /// All table names in order
    pub fn tables(&self) -> Vec<&str> {
        match self {
            TableReference::Single { table } => vec![table.as_str()],
            TableReference::Join { tables, .. } => tables.iter().map(String::as_str).collect(),
        }
    }

    pub fn primary_table(&self) -> Option<&str> {
        self.tables().into_iter().next()
    }

    pub fn join_condition(&self) -> Option<&str> {
        match self {
            TableReference::Single { .. } => None,
            TableReference::Join { condition, .. } => Some(condition.as_str()),
        }
    }

    /// Empty references never reach a collaborator
    pub fn is_empty(&self) -> bool {
        match self {
            TableReference::Single { table } => table.trim().is_empty(),
            TableReference::Join { tables, .. } => {
                tables.iter().all(|t| t.trim().is_empty())
            }
        }
    }

    /// Whether this reference needs an actual JOIN query
    pub fn is_multi_table(&self) -> bool {
        matches!(self, TableReference::Join { tables, .. } if tables.len() > 1)
    }
}

impl std::fmt::Display for TableReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TableReference::Single { table } => f.write_str(table),
            TableReference::Join { tables, .. } => f.write_str(&tables.join(" JOIN ")),
        }
    }
}

/// A column in a schema catalog
///
/// Selection identity is by `name` only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub name: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
}

impl ColumnDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: None,
        }
    }

    pub fn typed(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: Some(data_type.into()),
        }
    }

    /// Qualify the column with its table, as used for join catalogs
    pub fn qualified(mut self, table: &str) -> Self {
        self.name = format!("{}.{}", table, self.name);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_reference() {
        let r = TableReference::single("users");
        assert_eq!(r.tables(), vec!["users"]);
        assert_eq!(r.primary_table(), Some("users"));
        assert!(r.join_condition().is_none());
        assert!(!r.is_multi_table());
        assert!(TableReference::single("  ").is_empty());
    }

    #[test]
    fn test_join_reference() {
        let r = TableReference::join(
            vec!["users".into(), "orders".into()],
            "users.id = orders.user_id",
        );
        assert!(r.is_multi_table());
        assert_eq!(r.join_condition(), Some("users.id = orders.user_id"));
        assert!(TableReference::join(vec![], "").is_empty());
    }

    #[test]
    fn test_qualified_column() {
        let c = ColumnDescriptor::typed("id", "UInt64").qualified("users");
        assert_eq!(c.name, "users.id");
        assert_eq!(c.data_type.as_deref(), Some("UInt64"));
    }
}
