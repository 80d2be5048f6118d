use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;

use cfgov_search::app::{router, AppState};
use cfgov_search::config::Settings;
use cfgov_search::db::memory::InMemoryPageRepository;
use cfgov_search::db::repository::{MongoPageRepository, PageRepository};
use cfgov_search::demo_seeder::seed_demo_data;
use cfgov_search::search::backend::build_backend;
use cfgov_search::search::fields::DocumentSchema;
use cfgov_search::search::indexer::Indexer;
use cfgov_search::search::query::SearchContext;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cfgov_search=info,tower_http=info".into()),
        )
        .init();

    tracing::info!("Starting cfgov-search server...");

    let config_path = std::env::var_os("CFGOV_SEARCH_CONFIG").map(PathBuf::from);
    let settings = Settings::load(config_path.as_deref()).context("Failed to load settings")?;

    let backend = build_backend(&settings.search)?;

    let pages: Arc<dyn PageRepository> = if settings.demo_mode {
        tracing::info!("Demo mode: serving pages from memory");
        Arc::new(InMemoryPageRepository::new())
    } else {
        let mongo_client = mongodb::Client::with_uri_str(&settings.mongodb_uri)
            .await
            .context("Failed to connect to MongoDB")?;
        tracing::info!("Connected to MongoDB at {}", settings.mongodb_uri);
        Arc::new(MongoPageRepository::new(
            &mongo_client.database(&settings.mongodb_database),
        ))
    };

    let schema = DocumentSchema::filterable_pages(settings.search.index.clone())
        .with_synonyms(settings.search.synonyms.clone());
    let indexer = Arc::new(Indexer::new(schema, backend.clone(), pages.clone()));

    if settings.demo_mode {
        seed_demo_data(pages.as_ref(), &indexer).await?;
    } else {
        backend.create_index(indexer.schema()).await?;
    }

    let state = AppState {
        search: SearchContext {
            backend,
            pages,
            index: settings.search.index.clone(),
        },
        indexer,
        service_token: settings.service_token.clone(),
        typo_correction: settings.search.typo_correction,
    };

    tracing::info!("Listening on http://{}", settings.bind_addr);
    let listener = tokio::net::TcpListener::bind(&settings.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", settings.bind_addr))?;
    axum::serve(listener, router(state)).await?;

    Ok(())
}
