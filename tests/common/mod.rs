#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Bytes;
use axum::http::{header, HeaderMap, HeaderValue, Method};
use parking_lot::Mutex;
use sql_orbiter::{
    create_route_table, CapabilityRegistry, Database, Dispatcher, HttpContext, MiniJinjaRenderer,
    QueryError, RenderError, Renderer, Row, SchemaSnapshot, TranslationError, Translator,
};

/// Shared record of every capability call, in order
#[derive(Default)]
pub struct CallLog {
    entries: Mutex<Vec<String>>,
}

impl CallLog {
    pub fn record(&self, entry: impl Into<String>) {
        self.entries.lock().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.entries
            .lock()
            .iter()
            .filter(|entry| entry.starts_with(prefix))
            .count()
    }
}

pub struct FakeDatabase {
    log: Arc<CallLog>,
    schema: Result<Vec<String>, QueryError>,
    outcome: Result<Vec<Row>, QueryError>,
}

#[async_trait::async_trait]
impl Database for FakeDatabase {
    async fn execute(&self, sql: &str) -> Result<Vec<Row>, QueryError> {
        self.log.record(format!("execute:{}", sql));
        self.outcome.clone()
    }

    async fn read_schema(&self) -> Result<SchemaSnapshot, QueryError> {
        self.log.record("read_schema");
        self.schema.clone().map(SchemaSnapshot::new)
    }
}

#[derive(Clone)]
pub enum TranslatorReply {
    Sql(String),
    Upstream(u16, String),
}

pub struct FakeTranslator {
    log: Arc<CallLog>,
    reply: TranslatorReply,
    context: Option<String>,
}

#[async_trait::async_trait]
impl Translator for FakeTranslator {
    fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }

    async fn convert_to_sql(
        &self,
        schema: &str,
        context: Option<&str>,
        prompt: &str,
    ) -> Result<String, TranslationError> {
        self.log.record(format!(
            "translate:{}|{}|{}",
            schema,
            context.unwrap_or("<none>"),
            prompt
        ));
        match &self.reply {
            TranslatorReply::Sql(sql) => Ok(sql.clone()),
            TranslatorReply::Upstream(status, detail) => Err(TranslationError::Upstream {
                status: *status,
                detail: detail.clone(),
            }),
        }
    }
}

/// Real templates, with every render call recorded
pub struct RecordingRenderer {
    log: Arc<CallLog>,
    inner: MiniJinjaRenderer,
}

impl Renderer for RecordingRenderer {
    fn render(&self, name: &str, context: &serde_json::Value) -> Result<String, RenderError> {
        self.log.record(format!("render:{}:{}", name, context));
        self.inner.render(name, context)
    }
}

pub struct Harness {
    pub log: Arc<CallLog>,
    pub dispatcher: Dispatcher,
}

pub fn users_schema() -> Vec<String> {
    vec!["CREATE TABLE public.users (\n  id integer NOT NULL,\n  name text\n);".to_string()]
}

pub fn alice_and_bob() -> Vec<Row> {
    vec![
        Row::new().with("id", 1i64).with("name", "alice"),
        Row::new().with("id", 2i64).with("name", "bob"),
    ]
}

pub fn harness(database: Result<Vec<Row>, QueryError>, reply: TranslatorReply) -> Harness {
    harness_with_context(database, reply, None)
}

pub fn harness_with_context(
    database: Result<Vec<Row>, QueryError>,
    reply: TranslatorReply,
    context: Option<&str>,
) -> Harness {
    build_harness(Ok(users_schema()), database, reply, context)
}

/// Catalog reads fail with `message`; queries would still succeed
pub fn harness_with_schema_error(message: &str) -> Harness {
    build_harness(
        Err(QueryError::new(message)),
        Ok(alice_and_bob()),
        TranslatorReply::Sql("SELECT id, name FROM users".to_string()),
        None,
    )
}

fn build_harness(
    schema: Result<Vec<String>, QueryError>,
    database: Result<Vec<Row>, QueryError>,
    reply: TranslatorReply,
    context: Option<&str>,
) -> Harness {
    let log = Arc::new(CallLog::default());

    let registry = CapabilityRegistry::builder()
        .database(FakeDatabase {
            log: log.clone(),
            schema,
            outcome: database,
        })
        .translator(FakeTranslator {
            log: log.clone(),
            reply,
            context: context.map(str::to_string),
        })
        .renderer(RecordingRenderer {
            log: log.clone(),
            inner: MiniJinjaRenderer::embedded().unwrap(),
        })
        .build()
        .unwrap();

    let dispatcher = Dispatcher::new(create_route_table().unwrap(), registry).unwrap();
    Harness { log, dispatcher }
}

/// A form POST to /generate with a correct Content-Length header
pub fn form_post(body: &str) -> HttpContext {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/x-www-form-urlencoded"),
    );
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(body.len()));
    HttpContext::new(Method::POST, "/generate", headers, Bytes::from(body.to_string()))
}

pub fn get(path: &str) -> HttpContext {
    HttpContext::new(Method::GET, path, HeaderMap::new(), Bytes::new())
}
