use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};

use cfgov_search::api::events::IndexEventRequest;
use cfgov_search::config::Settings;
use cfgov_search::db::memory::InMemoryPageRepository;
use cfgov_search::db::repository::{MongoPageRepository, PageRepository};
use cfgov_search::demo_seeder::seed_demo_data;
use cfgov_search::search::backend::build_backend;
use cfgov_search::search::fields::DocumentSchema;
use cfgov_search::search::indexer::{IndexEvent, Indexer};

#[derive(Parser)]
#[command(name = "cfgov-search-cli")]
#[command(about = "Maintain the cf.gov filterable pages index", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Index every live page from the page store
    Rebuild {
        /// Settings file (defaults to ./cfgov-search.toml when present)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Drop and recreate the index before indexing
        #[arg(short, long)]
        recreate: bool,
    },

    /// Send one index event to a running server
    Notify {
        #[arg(short, long, default_value = "http://localhost:3000")]
        server: String,

        #[arg(short, long, env = "CFGOV_SEARCH_SERVICE_TOKEN", default_value = "dev-token")]
        token: String,

        /// Event JSON, e.g. '{"type":"page_saved","page_id":42}'
        #[arg(value_name = "EVENT_JSON")]
        event: String,
    },
}

async fn rebuild(config: Option<PathBuf>, recreate: bool) -> anyhow::Result<()> {
    let settings = Settings::load(config.as_deref()).context("Failed to load settings")?;
    let backend = build_backend(&settings.search)?;
    let schema = DocumentSchema::filterable_pages(settings.search.index.clone())
        .with_synonyms(settings.search.synonyms.clone());

    let report = if settings.demo_mode {
        let pages = Arc::new(InMemoryPageRepository::new());
        if recreate {
            backend.delete_index(schema.index()).await?;
        }
        let indexer = Indexer::new(schema, backend, pages.clone());
        seed_demo_data(pages.as_ref(), &indexer).await?
    } else {
        let mongo_client = mongodb::Client::with_uri_str(&settings.mongodb_uri)
            .await
            .context("Failed to connect to MongoDB")?;
        let pages: Arc<dyn PageRepository> = Arc::new(MongoPageRepository::new(
            &mongo_client.database(&settings.mongodb_database),
        ));
        Indexer::new(schema, backend, pages).rebuild(recreate).await?
    };

    println!("{}", serde_json::to_string_pretty(&report)?);
    if report.failed > 0 {
        bail!("{} pages failed to index", report.failed);
    }
    Ok(())
}

async fn notify(server: &str, token: String, event: &str) -> anyhow::Result<()> {
    let event: IndexEvent = serde_json::from_str(event).context("Invalid event JSON")?;
    let request = IndexEventRequest {
        service_token: token,
        event,
    };

    let response = reqwest::Client::new()
        .post(format!("{}/api/v1/index/events", server.trim_end_matches('/')))
        .json(&request)
        .send()
        .await
        .context("Failed to reach server")?;

    let status = response.status();
    let body: serde_json::Value = response.json().await.unwrap_or_default();
    println!("{}", serde_json::to_string_pretty(&body)?);

    if !status.is_success() {
        bail!("Server answered {status}");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cfgov_search=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Rebuild { config, recreate } => rebuild(config, recreate).await,
        Commands::Notify {
            server,
            token,
            event,
        } => notify(&server, token, &event).await,
    }
}
