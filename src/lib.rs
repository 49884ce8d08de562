pub mod api;
pub mod capability;
pub mod config;
pub mod model;
pub mod render;
pub mod store;
pub mod translate;

use anyhow::Context;

// Export API types
pub use api::{create_route_table, create_router, Dispatcher, HttpContext};

// Export capability contracts and the registry
pub use capability::*;

// Export all model types
pub use model::*;

// Export the concrete capabilities
pub use render::MiniJinjaRenderer;
pub use store::PostgresDatabase;
pub use translate::{OpenAiTranslator, TranslatorSettings};

/// Build every capability from configuration and bind them to the route table.
///
/// Any missing binding fails here, before the listener is opened.
pub async fn build_dispatcher(config: &config::AppConfig) -> anyhow::Result<Dispatcher> {
    let additional_context = config::load_additional_context(&config.translator.context_file);

    log::info!("Connecting to PostgreSQL...");
    let database = PostgresDatabase::connect(
        &config.database_url(),
        config.database.max_connections,
        config.database.read_only,
    )
    .await?;
    if database.is_read_only() {
        log::info!("Generated SQL runs in read-only transactions");
    } else {
        log::warn!("Generated SQL runs with full write access");
    }

    let translator = OpenAiTranslator::new(
        reqwest::Client::new(),
        config.translator_settings()?,
        additional_context,
    );

    let renderer = match &config.templates.directory {
        Some(dir) => MiniJinjaRenderer::from_directory(dir)?,
        None => MiniJinjaRenderer::embedded()?,
    };

    let registry = CapabilityRegistry::builder()
        .database(database)
        .translator(translator)
        .renderer(renderer)
        .build()?;

    let routes = create_route_table()?;
    let dispatcher = Dispatcher::new(routes, registry).context("Route capability binding failed")?;

    Ok(dispatcher)
}
