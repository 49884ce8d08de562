use serde::Serialize;

use crate::model::{Row, SqlValue};

/// Tabular query result handed to the `sql-table` template
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SqlTable {
    pub head: Vec<String>,
    pub body: Vec<Vec<serde_json::Value>>,
    pub sql_query: String,
}

impl SqlTable {
    /// Build a table from result rows. The header comes from the first row;
    /// returns `None` when there are no rows at all.
    pub fn from_rows(rows: &[Row], sql_query: impl Into<String>) -> Option<Self> {
        let head = rows.first()?.column_names();

        let body = rows
            .iter()
            .map(|row| {
                let mut values: Vec<serde_json::Value> =
                    row.values().take(head.len()).map(SqlValue::to_json).collect();
                values.resize(head.len(), serde_json::Value::Null);
                values
            })
            .collect();

        Some(Self {
            head,
            body,
            sql_query: sql_query.into(),
        })
    }

    pub fn row_count(&self) -> usize {
        self.body.len()
    }

    /// Template context for the result fragment
    pub fn to_context(&self) -> serde_json::Value {
        serde_json::json!({
            "head": self.head,
            "body": self.body,
            "sql_query": self.sql_query,
        })
    }
}
