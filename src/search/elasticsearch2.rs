use async_trait::async_trait;
use reqwest::Method;
use serde_json::{json, Value};

use crate::error::AppError;
use crate::search::backend::{
    self, analysis_settings, apply_suggestion_analyzer, count_total, extract_suggestions,
    field_properties, hit_ids, render_filter, render_match, suggestion_body,
    SearchBackend, SuggestionSlot,
};
use crate::search::fields::{DocumentSchema, FieldKind, SearchField};
use crate::search::request::SearchRequest;
use crate::search::transport::EngineTransport;

/// Mapping type all documents are stored under.
const DOC_TYPE: &str = "doc";

/// The engine's built-in catch-all field.
const ALL_FIELD: &str = "_all";

/// Adapter for Elasticsearch 2.x.
///
/// Documents live under an explicit mapping type, exact-match fields are
/// `not_analyzed` strings, and queries use the `filtered` wrapper.
pub struct Elasticsearch2Backend {
    transport: EngineTransport,
}

impl Elasticsearch2Backend {
    pub fn new(transport: EngineTransport) -> Self {
        Self { transport }
    }

    fn base_mapping(&self, field: &SearchField) -> Value {
        match &field.kind {
            FieldKind::Text => json!({ "type": "string" }),
            FieldKind::Keyword => json!({ "type": "string", "index": "not_analyzed" }),
            FieldKind::Date => json!({ "type": "date" }),
            FieldKind::Object(children) => json!({
                "type": "object",
                "properties": field_properties(children, |f| self.map_field_analyzer(f)),
            }),
        }
    }

    pub(crate) fn index_body(&self, schema: &DocumentSchema) -> Value {
        let properties = field_properties(schema.fields(), |f| self.map_field_analyzer(f));

        json!({
            "settings": analysis_settings(schema.synonyms()),
            "mappings": { DOC_TYPE: { "properties": properties } },
        })
    }

    pub(crate) fn render_query(request: &SearchRequest) -> Value {
        let filters: Vec<Value> = request.filters.iter().map(render_filter).collect();
        let query = match &request.query {
            Some(query) => render_match(query, ALL_FIELD),
            None => json!({ "match_all": {} }),
        };

        json!({
            "filtered": {
                "query": query,
                "filter": { "bool": { "must": filters } }
            }
        })
    }

    /// Sort clauses name `missing` explicitly.
    pub(crate) fn search_body(request: &SearchRequest) -> Value {
        backend::search_body(request, Self::render_query(request), true)
    }

    fn doc_path(index: &str, id: &str) -> String {
        format!("{index}/{DOC_TYPE}/{id}")
    }
}

#[async_trait]
impl SearchBackend for Elasticsearch2Backend {
    fn name(&self) -> &'static str {
        "elasticsearch2"
    }

    fn map_field_analyzer(&self, field: &SearchField) -> Value {
        apply_suggestion_analyzer(field, self.base_mapping(field))
    }

    async fn create_index(&self, schema: &DocumentSchema) -> Result<(), AppError> {
        let body = self.index_body(schema);
        let response = self
            .transport
            .send(Method::PUT, schema.index(), Some(&body))
            .await?;

        if response.body["error"]["type"] == "index_already_exists_exception" {
            tracing::debug!(index = schema.index(), "Index already exists");
            return Ok(());
        }

        response.into_success("Index creation")?;
        tracing::info!(index = schema.index(), "Created search index");
        Ok(())
    }

    async fn delete_index(&self, index: &str) -> Result<(), AppError> {
        let response = self.transport.send(Method::DELETE, index, None).await?;
        if response.is_not_found() {
            return Ok(());
        }
        response.into_success("Index deletion")?;
        Ok(())
    }

    async fn upsert(&self, index: &str, id: &str, document: &Value) -> Result<(), AppError> {
        self.transport
            .send(Method::PUT, &Self::doc_path(index, id), Some(document))
            .await?
            .into_success("Document upsert")?;
        Ok(())
    }

    async fn delete(&self, index: &str, id: &str) -> Result<(), AppError> {
        let response = self
            .transport
            .send(Method::DELETE, &Self::doc_path(index, id), None)
            .await?;
        if response.is_not_found() {
            return Ok(());
        }
        response.into_success("Document deletion")?;
        Ok(())
    }

    async fn count(&self, index: &str, request: &SearchRequest) -> Result<u64, AppError> {
        let body = json!({ "query": Self::render_query(request) });
        let response = self
            .transport
            .send(Method::POST, &format!("{index}/{DOC_TYPE}/_count"), Some(&body))
            .await?
            .into_success("Count")?;
        count_total(&response)
    }

    async fn search(&self, index: &str, request: &SearchRequest) -> Result<Vec<String>, AppError> {
        let body = Self::search_body(request);
        let response = self
            .transport
            .send(Method::POST, &format!("{index}/{DOC_TYPE}/_search"), Some(&body))
            .await?
            .into_success("Search")?;
        hit_ids(&response)
    }

    async fn suggestions_for(
        &self,
        index: &str,
        query_string: &str,
    ) -> Result<Vec<SuggestionSlot>, AppError> {
        let body = suggestion_body(query_string, ALL_FIELD);
        let response = self
            .transport
            .send(Method::POST, &format!("{index}/_search"), Some(&body))
            .await?
            .into_success("Suggestion")?;
        Ok(extract_suggestions(&response))
    }
}
