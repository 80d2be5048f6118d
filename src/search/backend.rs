use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::config::{BackendKind, SearchSettings};
use crate::error::AppError;
use crate::search::elasticsearch2::Elasticsearch2Backend;
use crate::search::elasticsearch7::Elasticsearch7Backend;
use crate::search::fields::{DocumentSchema, SearchField};
use crate::search::memory::MemoryBackend;
use crate::search::request::{Filter, Query, SearchRequest};
use crate::search::transport::EngineTransport;

/// Name of the synonym-aware analyzer applied to suggestion fields.
pub const SUGGESTION_ANALYZER: &str = "synonym_en";

/// Name of the term suggester in suggestion requests and responses.
pub const SUGGESTER_NAME: &str = "suggestions";

/// Trait over the search engine, enabling mock testing and swapping engine versions.
///
/// Each implementation speaks one wire format; higher-level behaviour (document
/// shape, filter semantics, suggestion selection) is identical across them.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Short adapter name for logs.
    fn name(&self) -> &'static str;

    /// Engine mapping for one field, suggestion analyzer included.
    fn map_field_analyzer(&self, field: &SearchField) -> Value;

    /// Create the index with its settings and field mappings.
    /// An index that already exists is left untouched.
    async fn create_index(&self, schema: &DocumentSchema) -> Result<(), AppError>;

    /// Drop the index. A missing index is not an error.
    async fn delete_index(&self, index: &str) -> Result<(), AppError>;

    /// Store a document, fully replacing any previous version.
    async fn upsert(&self, index: &str, id: &str, document: &Value) -> Result<(), AppError>;

    /// Remove a document. A missing document is not an error.
    async fn delete(&self, index: &str, id: &str) -> Result<(), AppError>;

    /// Number of documents matching the request's filters and query.
    async fn count(&self, index: &str, request: &SearchRequest) -> Result<u64, AppError>;

    /// Ids of matching documents, in ranked order, within the request window.
    async fn search(&self, index: &str, request: &SearchRequest) -> Result<Vec<String>, AppError>;

    /// One slot per analyzed token of the query string, see [`extract_suggestions`].
    async fn suggestions_for(
        &self,
        index: &str,
        query_string: &str,
    ) -> Result<Vec<SuggestionSlot>, AppError>;
}

/// One analyzed token of a suggestion request and the engine's best
/// replacement for it, if it had any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestionSlot {
    pub text: String,
    pub option: Option<String>,
}

impl SuggestionSlot {
    pub fn new(text: impl Into<String>, option: Option<&str>) -> Self {
        Self {
            text: text.into(),
            option: option.map(str::to_string),
        }
    }

    /// The replacement when there is one, the token otherwise.
    pub fn resolved(&self) -> &str {
        self.option.as_deref().unwrap_or(&self.text)
    }
}

/// Build the adapter selected in the settings.
pub fn build_backend(settings: &SearchSettings) -> Result<Arc<dyn SearchBackend>, AppError> {
    let backend: Arc<dyn SearchBackend> = match settings.backend {
        BackendKind::Memory => Arc::new(MemoryBackend::new()),
        BackendKind::Elasticsearch2 => Arc::new(Elasticsearch2Backend::new(engine_transport(settings)?)),
        BackendKind::Elasticsearch7 => Arc::new(Elasticsearch7Backend::new(engine_transport(settings)?)),
    };

    tracing::info!(backend = backend.name(), url = %settings.url, "Search backend selected");
    Ok(backend)
}

fn engine_transport(settings: &SearchSettings) -> Result<EngineTransport, AppError> {
    EngineTransport::new(
        &settings.url,
        Duration::from_secs(settings.timeout_secs),
        settings.max_retries,
    )
}

/// Merge the suggestion analyzer over a base field mapping when the field asks for it.
pub fn apply_suggestion_analyzer(field: &SearchField, mut mapping: Value) -> Value {
    if field.suggestion {
        if let Value::Object(map) = &mut mapping {
            map.insert("analyzer".to_string(), json!(SUGGESTION_ANALYZER));
        }
    }
    mapping
}

/// Mapping properties for a list of fields, using the adapter's field mapper.
pub fn field_properties(
    fields: &[SearchField],
    map_field: impl Fn(&SearchField) -> Value,
) -> Map<String, Value> {
    fields
        .iter()
        .map(|field| (field.name.to_string(), map_field(field)))
        .collect()
}

/// Index settings defining the suggestion analyzer.
pub fn analysis_settings(synonyms: &[String]) -> Value {
    if synonyms.is_empty() {
        return json!({
            "analysis": {
                "analyzer": {
                    SUGGESTION_ANALYZER: {
                        "type": "custom",
                        "tokenizer": "standard",
                        "filter": ["lowercase"]
                    }
                }
            }
        });
    }

    json!({
        "analysis": {
            "filter": {
                SUGGESTION_ANALYZER: {
                    "type": "synonym",
                    "synonyms": synonyms
                }
            },
            "analyzer": {
                SUGGESTION_ANALYZER: {
                    "type": "custom",
                    "tokenizer": "standard",
                    "filter": ["lowercase", SUGGESTION_ANALYZER]
                }
            }
        }
    })
}

/// Body of a term-suggestion request against `field`.
pub fn suggestion_body(query_string: &str, field: &str) -> Value {
    json!({
        "size": 0,
        "_source": false,
        "suggest": {
            SUGGESTER_NAME: {
                "text": query_string,
                "term": { "field": field }
            }
        }
    })
}

/// Read the suggestion slots of a search response.
///
/// Each slot keeps its token and the first-ranked option, if any. A response
/// without the suggester yields no slots.
pub fn extract_suggestions(response: &Value) -> Vec<SuggestionSlot> {
    response
        .get("suggest")
        .and_then(|suggest| suggest.get(SUGGESTER_NAME))
        .and_then(Value::as_array)
        .map(|slots| slots.iter().map(read_slot).collect())
        .unwrap_or_default()
}

fn read_slot(slot: &Value) -> SuggestionSlot {
    let first_option = slot
        .get("options")
        .and_then(Value::as_array)
        .and_then(|options| options.first())
        .and_then(|option| option.get("text"))
        .and_then(Value::as_str);
    let text = slot.get("text").and_then(Value::as_str).unwrap_or_default();

    SuggestionSlot::new(text, first_option)
}

/// A filter clause. Both engine versions share this syntax.
pub fn render_filter(filter: &Filter) -> Value {
    match filter {
        Filter::Prefix { field, value } => json!({ "prefix": { field.as_str(): value } }),
        Filter::Terms { field, values } => json!({ "terms": { field.as_str(): values } }),
        Filter::Range { field, gte, lte } => {
            let mut bounds = Map::new();
            if let Some(gte) = gte {
                bounds.insert("gte".into(), json!(gte.format("%Y-%m-%d").to_string()));
            }
            if let Some(lte) = lte {
                bounds.insert("lte".into(), json!(lte.format("%Y-%m-%d").to_string()));
            }
            json!({ "range": { field.as_str(): bounds } })
        }
    }
}

/// A match clause; full-text queries go against the engine's catch-all field.
pub fn render_match(query: &Query, all_field: &str) -> Value {
    match query {
        Query::Match {
            field,
            text,
            operator,
        } => json!({
            "match": { field.as_str(): { "query": text, "operator": operator.as_str() } }
        }),
        Query::FullText { text } => json!({
            "match": { all_field: { "query": text, "operator": "or" } }
        }),
    }
}

/// A `_search` body around an already rendered `query` section.
///
/// With `missing_last` the sort clauses spell out where documents without the
/// field go; newer engines put them last on their own.
pub fn search_body(request: &SearchRequest, query: Value, missing_last: bool) -> Value {
    let mut body = Map::new();
    body.insert("query".into(), query);
    body.insert("_source".into(), json!(false));
    body.insert("from".into(), json!(request.from));
    if let Some(size) = request.size {
        body.insert("size".into(), json!(size));
    }
    if !request.sort.is_empty() {
        let sort: Vec<Value> = request
            .sort
            .iter()
            .map(|s| {
                let mut options = Map::new();
                options.insert("order".into(), json!(if s.descending { "desc" } else { "asc" }));
                if missing_last {
                    options.insert("missing".into(), json!("_last"));
                }
                json!({ s.field.as_str(): options })
            })
            .collect();
        body.insert("sort".into(), Value::Array(sort));
    }
    Value::Object(body)
}

/// Ids of the hits in a `_search` response.
pub fn hit_ids(response: &Value) -> Result<Vec<String>, AppError> {
    let hits = response
        .get("hits")
        .and_then(|hits| hits.get("hits"))
        .and_then(Value::as_array)
        .ok_or_else(|| AppError::SearchUnavailable("Search response has no hits".into()))?;

    Ok(hits
        .iter()
        .filter_map(|hit| hit.get("_id").and_then(Value::as_str))
        .map(str::to_string)
        .collect())
}

/// Total of a `_count` response.
pub fn count_total(response: &Value) -> Result<u64, AppError> {
    response
        .get("count")
        .and_then(Value::as_u64)
        .ok_or_else(|| AppError::SearchUnavailable("Count response has no count".into()))
}
