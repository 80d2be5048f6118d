use std::path::Path;

use config::builder::DefaultState;
use config::{ConfigBuilder, Environment, File};
use serde::Deserialize;

use crate::error::AppError;

/// Which search engine adapter to run against.
///
/// Chosen once at startup; every request goes through the same adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Elasticsearch2,
    Elasticsearch7,
    /// In-process index, used for demo mode and tests.
    Memory,
}

/// Search engine connection and behaviour settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    pub backend: BackendKind,
    /// Base URL of the engine, e.g. `http://localhost:9200`.
    pub url: String,
    /// Name of the filterable pages index.
    pub index: String,
    /// Per-request timeout for engine calls.
    pub timeout_secs: u64,
    /// Retries for connection failures and 5xx answers.
    pub max_retries: u32,
    /// Global switch for "did you mean" substitution.
    pub typo_correction: bool,
    /// Synonym rules for the suggestion analyzer (`"loan, credit"` style).
    pub synonyms: Vec<String>,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            backend: BackendKind::Elasticsearch7,
            url: "http://localhost:9200".to_string(),
            index: "filterable-pages".to_string(),
            timeout_secs: 5,
            max_retries: 2,
            typo_correction: true,
            synonyms: Vec::new(),
        }
    }
}

/// Top-level service settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub bind_addr: String,
    /// Shared secret the CMS presents when pushing index events.
    pub service_token: String,
    /// Serve seeded demo pages from memory instead of MongoDB.
    pub demo_mode: bool,
    pub mongodb_uri: String,
    pub mongodb_database: String,
    pub search: SearchSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3000".to_string(),
            service_token: "dev-token".to_string(),
            demo_mode: false,
            mongodb_uri: "mongodb://localhost:27017".to_string(),
            mongodb_database: "cfgov".to_string(),
            search: SearchSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings from an optional file plus `CFGOV_SEARCH__*` environment variables.
    ///
    /// Without an explicit path, `cfgov-search.{toml,yaml,json}` in the working
    /// directory is used when present. Environment variables win over the file,
    /// e.g. `CFGOV_SEARCH__SEARCH__BACKEND=memory`.
    pub fn load(path: Option<&Path>) -> Result<Self, AppError> {
        let builder = config::Config::builder();
        let builder = match path {
            Some(path) => builder.add_source(File::from(path)),
            None => builder.add_source(File::with_name("cfgov-search").required(false)),
        };

        Self::from_builder(
            builder.add_source(
                Environment::with_prefix("CFGOV_SEARCH")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("search.synonyms"),
            ),
        )
    }

    fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, AppError> {
        let settings: Settings = builder.build()?.try_deserialize()?;

        if settings.search.index.is_empty() {
            return Err(AppError::Config("search.index cannot be empty".into()));
        }

        Ok(settings)
    }
}
