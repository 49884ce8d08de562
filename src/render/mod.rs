use std::path::Path;

use anyhow::{Context, Result};
use minijinja::{AutoEscape, Environment, ErrorKind};

use crate::capability::{RenderError, Renderer};

pub const INDEX_TEMPLATE: &str = "index";
pub const SQL_TABLE_TEMPLATE: &str = "sql-table";

/// Logical template name and its path under the templates directory
const TEMPLATE_FILES: [(&str, &str); 2] = [
    (INDEX_TEMPLATE, "page/index.html"),
    (SQL_TABLE_TEMPLATE, "component/sql-table.html"),
];

const EMBEDDED_INDEX: &str = include_str!("../../templates/page/index.html");
const EMBEDDED_SQL_TABLE: &str = include_str!("../../templates/component/sql-table.html");

/// Renderer capability backed by a minijinja environment
pub struct MiniJinjaRenderer {
    env: Environment<'static>,
}

impl MiniJinjaRenderer {
    /// Use the templates compiled into the binary
    pub fn embedded() -> Result<Self> {
        Self::from_sources([
            (INDEX_TEMPLATE, EMBEDDED_INDEX.to_string()),
            (SQL_TABLE_TEMPLATE, EMBEDDED_SQL_TABLE.to_string()),
        ])
    }

    /// Load `page/index.html` and `component/sql-table.html` from `dir`
    pub fn from_directory(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let mut sources = Vec::with_capacity(TEMPLATE_FILES.len());
        for (name, relative) in TEMPLATE_FILES {
            let path = dir.join(relative);
            let source = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read template {}", path.display()))?;
            sources.push((name, source));
        }
        Self::from_sources(sources)
    }

    fn from_sources(sources: impl IntoIterator<Item = (&'static str, String)>) -> Result<Self> {
        let mut env = Environment::new();
        // Database values end up in the markup, so escape regardless of template name
        env.set_auto_escape_callback(|_| AutoEscape::Html);
        for (name, source) in sources {
            env.add_template_owned(name, source)
                .with_context(|| format!("Failed to compile template '{}'", name))?;
        }
        Ok(Self { env })
    }
}

impl Renderer for MiniJinjaRenderer {
    fn render(&self, name: &str, context: &serde_json::Value) -> Result<String, RenderError> {
        let template = self.env.get_template(name).map_err(|err| match err.kind() {
            ErrorKind::TemplateNotFound => RenderError::UnknownTemplate(name.to_string()),
            _ => RenderError::Template(err.to_string()),
        })?;

        template
            .render(context)
            .map_err(|err| RenderError::Template(err.to_string()))
    }
}
