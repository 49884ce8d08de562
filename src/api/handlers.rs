use std::sync::Arc;

use axum::http::StatusCode;
use itertools::Itertools;
use log::{error, info, warn};
use thiserror::Error;
use uuid::Uuid;

use crate::api::context::HttpContext;
use crate::api::handler::Handler;
use crate::capability::{Database, QueryError, RenderError, Renderer, TranslationError, Translator};
use crate::model::SqlTable;
use crate::render::{INDEX_TEMPLATE, SQL_TABLE_TEMPLATE};

pub const MISSING_PROMPT_MESSAGE: &str = "Form 'prompt' field missing";
pub const EMPTY_RESULT_MESSAGE: &str = "Empty response from database";
pub const RENDER_FAILURE_MESSAGE: &str = "Failed to render template";

/// Ways the prompt pipeline can stop early
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Form 'prompt' field missing")]
    MissingPrompt,
    #[error("Failed to read database schema: {0}")]
    Schema(#[source] QueryError),
    #[error("SQL generation failed with {0}")]
    Translation(#[from] TranslationError),
    #[error("SQL query execution failed with {0}")]
    Query(#[source] QueryError),
    #[error("Empty response from database")]
    EmptyResult,
    #[error("Failed to render template")]
    Render(#[source] RenderError),
}

impl PipelineError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingPrompt | Self::Query(_) | Self::EmptyResult => StatusCode::BAD_REQUEST,
            Self::Schema(_) | Self::Translation(_) | Self::Render(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Decode a form body and join every non-blank `prompt` value with newlines
pub fn extract_prompt(body: &[u8]) -> String {
    let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(body).unwrap_or_default();

    pairs
        .into_iter()
        .filter(|(key, value)| key == "prompt" && !value.trim().is_empty())
        .map(|(_, value)| value)
        .join("\n")
}

/// Schema → translate → execute → render for an already extracted prompt
pub async fn run_pipeline(
    request_id: Uuid,
    prompt: &str,
    renderer: &dyn Renderer,
    database: &dyn Database,
    translator: &dyn Translator,
) -> Result<String, PipelineError> {
    if prompt.is_empty() {
        return Err(PipelineError::MissingPrompt);
    }
    info!("[{}] prompt: {}", request_id, prompt);

    let schema = database.read_schema().await.map_err(PipelineError::Schema)?;
    info!("[{}] schema snapshot with {} tables", request_id, schema.len());

    let sql_query = translator
        .convert_to_sql(&schema.to_prompt_text(), translator.context(), prompt)
        .await?;
    info!("[{}] generated sql_query: {}", request_id, sql_query.replace('\n', " "));

    let rows = database.execute(&sql_query).await.map_err(PipelineError::Query)?;

    let table = SqlTable::from_rows(&rows, sql_query).ok_or(PipelineError::EmptyResult)?;
    info!(
        "[{}] got columns: {} with {} rows",
        request_id,
        table.head.join(", "),
        table.row_count()
    );

    renderer
        .render(SQL_TABLE_TEMPLATE, &table.to_context())
        .map_err(PipelineError::Render)
}

fn respond_error(ctx: &mut HttpContext, err: PipelineError) -> Option<String> {
    let status = err.status_code();
    if status.is_server_error() {
        error!("[{}] {}", ctx.request_id(), err);
    } else {
        warn!("[{}] {}", ctx.request_id(), err);
    }

    ctx.send_response(status);
    ctx.send_html_header();
    Some(err.to_string())
}

/// `GET /`: the static root page
pub struct GetRoot;

#[async_trait::async_trait]
impl Handler for GetRoot {
    type Needs = (Arc<dyn Renderer>,);

    async fn handle(&self, ctx: &mut HttpContext, needs: Self::Needs) -> Option<String> {
        let (renderer,) = needs;

        match renderer.render(INDEX_TEMPLATE, &serde_json::json!({})) {
            Ok(html) => {
                ctx.send_response(StatusCode::OK);
                ctx.send_html_header();
                Some(html)
            }
            Err(err) => respond_error(ctx, PipelineError::Render(err)),
        }
    }
}

/// `POST /generate`: prompt → SQL → table fragment
pub struct PostGenerate;

#[async_trait::async_trait]
impl Handler for PostGenerate {
    type Needs = (Arc<dyn Renderer>, Arc<dyn Database>, Arc<dyn Translator>);

    async fn handle(&self, ctx: &mut HttpContext, needs: Self::Needs) -> Option<String> {
        let (renderer, database, translator) = needs;
        let prompt = extract_prompt(ctx.read_body());

        let outcome = run_pipeline(
            ctx.request_id(),
            &prompt,
            renderer.as_ref(),
            database.as_ref(),
            translator.as_ref(),
        )
        .await;

        match outcome {
            Ok(html) => {
                ctx.send_response(StatusCode::OK);
                ctx.send_html_header();
                Some(html)
            }
            Err(err) => respond_error(ctx, err),
        }
    }
}
