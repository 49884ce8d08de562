use thiserror::Error;

use crate::model::{Row, SchemaSnapshot};

/// Any backend failure while running SQL or reading the catalog
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct QueryError {
    pub message: String,
}

impl QueryError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<sqlx::Error> for QueryError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => Self::new(db_err.message()),
            other => Self::new(other.to_string()),
        }
    }
}

#[derive(Debug, Error)]
pub enum TranslationError {
    /// The upstream model endpoint answered with a non-success status
    #[error("upstream returned status {status}: {detail}")]
    Upstream { status: u16, detail: String },
    #[error("request to upstream failed: {0}")]
    Transport(String),
    #[error("unexpected upstream response: {0}")]
    MalformedResponse(String),
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("unknown template '{0}'")]
    UnknownTemplate(String),
    #[error("template error: {0}")]
    Template(String),
}

/// Executes SQL and enumerates the user schema
#[async_trait::async_trait]
pub trait Database: Send + Sync {
    async fn execute(&self, sql: &str) -> Result<Vec<Row>, QueryError>;
    async fn read_schema(&self) -> Result<SchemaSnapshot, QueryError>;
}

/// Turns a natural-language prompt into SQL
#[async_trait::async_trait]
pub trait Translator: Send + Sync {
    /// Free-form context supplied when the translator was constructed
    fn context(&self) -> Option<&str> {
        None
    }

    async fn convert_to_sql(
        &self,
        schema: &str,
        context: Option<&str>,
        prompt: &str,
    ) -> Result<String, TranslationError>;
}

/// Renders a named template against a context mapping
pub trait Renderer: Send + Sync {
    fn render(&self, name: &str, context: &serde_json::Value) -> Result<String, RenderError>;
}
