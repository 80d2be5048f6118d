#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;

use cfgov_search::app::{router, AppState};
use cfgov_search::db::memory::InMemoryPageRepository;
use cfgov_search::db::repository::PageRepository;
use cfgov_search::demo_seeder::seed_demo_data;
use cfgov_search::search::backend::SearchBackend;
use cfgov_search::search::fields::DocumentSchema;
use cfgov_search::search::indexer::Indexer;
use cfgov_search::search::memory::MemoryBackend;
use cfgov_search::search::query::SearchContext;

pub const INDEX: &str = "filterable-pages";
pub const SERVICE_TOKEN: &str = "test-token";

/// The full HTTP stack over the in-process backend and the demo pages.
pub struct TestEnv {
    pub router: Router,
    pub repo: Arc<dyn PageRepository>,
    pub backend: Arc<dyn SearchBackend>,
    pub indexer: Arc<Indexer>,
}

impl TestEnv {
    /// Seed the demo pages, index them and build the router.
    pub async fn start() -> Self {
        Self::with_typo_correction(true).await
    }

    pub async fn with_typo_correction(typo_correction: bool) -> Self {
        let backend: Arc<dyn SearchBackend> = Arc::new(MemoryBackend::new());
        let repo: Arc<dyn PageRepository> = Arc::new(InMemoryPageRepository::new());
        let indexer = Arc::new(Indexer::new(
            DocumentSchema::filterable_pages(INDEX),
            backend.clone(),
            repo.clone(),
        ));

        seed_demo_data(repo.as_ref(), &indexer)
            .await
            .expect("Failed to seed demo data");

        let state = AppState {
            search: SearchContext {
                backend: backend.clone(),
                pages: repo.clone(),
                index: INDEX.to_string(),
            },
            indexer: indexer.clone(),
            service_token: SERVICE_TOKEN.to_string(),
            typo_correction,
        };

        Self {
            router: router(state),
            repo,
            backend,
            indexer,
        }
    }

    /// Build an `axum_test::TestServer` from this environment's router.
    pub fn server(&self) -> axum_test::TestServer {
        axum_test::TestServer::builder()
            .expect_success_by_default()
            .build(self.router.clone())
    }

    /// Build a `TestServer` that does NOT expect success by default (for error tests).
    pub fn server_permissive(&self) -> axum_test::TestServer {
        axum_test::TestServer::builder()
            .build(self.router.clone())
    }

    /// Helper: push an index event via the API.
    pub async fn send_event(
        &self,
        server: &axum_test::TestServer,
        event: serde_json::Value,
    ) -> axum_test::TestResponse {
        server
            .post("/api/v1/index/events")
            .json(&serde_json::json!({
                "service_token": SERVICE_TOKEN,
                "event": event,
            }))
            .await
    }
}

/// Ids of the `results` array of a search response, in order.
pub fn result_ids(body: &serde_json::Value) -> Vec<i64> {
    body["results"]
        .as_array()
        .map(|results| results.iter().filter_map(|r| r["id"].as_i64()).collect())
        .unwrap_or_default()
}
