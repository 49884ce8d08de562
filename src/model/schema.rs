use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// One catalog row describing a user-table column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub table_schema: String,
    pub table_name: String,
    pub column_name: String,
    pub data_type: String,
    pub is_nullable: bool,
    pub references: Option<ForeignKeyRef>,
}

/// One column pair of a foreign-key constraint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForeignKeyRef {
    pub constraint_name: String,
    /// 1-based position of this column within the constraint
    pub position: i64,
    pub table_schema: String,
    pub table_name: String,
    pub column_name: String,
}

/// Columns of one foreign-key constraint, collected across catalog rows
struct ForeignKeyGroup<'a> {
    constraint_name: &'a str,
    target_schema: &'a str,
    target_table: &'a str,
    pairs: Vec<(i64, &'a str, &'a str)>,
}

impl ForeignKeyGroup<'_> {
    fn to_ddl_line(&self) -> String {
        let mut pairs = self.pairs.clone();
        pairs.sort();

        format!(
            "  FOREIGN KEY ({}) REFERENCES {}.{}({})",
            pairs.iter().map(|(_, local, _)| local).join(", "),
            self.target_schema,
            self.target_table,
            pairs.iter().map(|(_, _, target)| target).join(", ")
        )
    }
}

/// Request-time enumeration of user tables as `CREATE TABLE` statements
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaSnapshot {
    pub statements: Vec<String>,
}

impl SchemaSnapshot {
    pub fn new(statements: Vec<String>) -> Self {
        Self { statements }
    }

    /// Group catalog rows per table and render one DDL statement each.
    ///
    /// Input must already be ordered by (schema, table, ordinal position);
    /// a column repeated because it carries several foreign keys is emitted once.
    /// Rows of the same constraint collapse into one `FOREIGN KEY` line with
    /// the column pairs in constraint order.
    pub fn from_columns(columns: &[ColumnInfo]) -> Self {
        let grouped = columns
            .iter()
            .chunk_by(|column| (column.table_schema.clone(), column.table_name.clone()));

        let statements = grouped
            .into_iter()
            .map(|((schema, table), group)| {
                let mut lines: Vec<String> = Vec::new();
                let mut foreign_keys: Vec<ForeignKeyGroup> = Vec::new();
                let mut seen: Vec<&str> = Vec::new();

                for column in group {
                    if !seen.contains(&column.column_name.as_str()) {
                        seen.push(column.column_name.as_str());
                        let nullability = if column.is_nullable { "" } else { " NOT NULL" };
                        lines.push(format!(
                            "  {} {}{}",
                            column.column_name, column.data_type, nullability
                        ));
                    }

                    let Some(target) = &column.references else {
                        continue;
                    };
                    let pair = (
                        target.position,
                        column.column_name.as_str(),
                        target.column_name.as_str(),
                    );
                    match foreign_keys
                        .iter_mut()
                        .find(|fk| fk.constraint_name == target.constraint_name)
                    {
                        Some(fk) => {
                            if !fk.pairs.contains(&pair) {
                                fk.pairs.push(pair);
                            }
                        }
                        None => foreign_keys.push(ForeignKeyGroup {
                            constraint_name: &target.constraint_name,
                            target_schema: &target.table_schema,
                            target_table: &target.table_name,
                            pairs: vec![pair],
                        }),
                    }
                }

                lines.extend(foreign_keys.iter().map(ForeignKeyGroup::to_ddl_line));
                format!("CREATE TABLE {}.{} (\n{}\n);", schema, table, lines.join(",\n"))
            })
            .collect();

        Self { statements }
    }

    /// Text form passed to the translator
    pub fn to_prompt_text(&self) -> String {
        self.statements.join("\n\n")
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }
}
