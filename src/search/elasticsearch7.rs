use async_trait::async_trait;
use reqwest::Method;
use serde_json::{json, Value};

use crate::error::AppError;
use crate::search::backend::{
    self, analysis_settings, apply_suggestion_analyzer, count_total, extract_suggestions,
    field_properties, hit_ids, render_filter, render_match, suggestion_body,
    SearchBackend, SuggestionSlot, SUGGESTION_ANALYZER,
};
use crate::search::fields::{DocumentSchema, FieldKind, SearchField};
use crate::search::request::SearchRequest;
use crate::search::transport::EngineTransport;

/// Catch-all field every text field is copied into.
const ALL_TEXT_FIELD: &str = "_all_text";

/// Adapter for Elasticsearch 7.x.
///
/// Typeless `_doc` endpoints, `text`/`keyword` mappings and `bool` queries.
pub struct Elasticsearch7Backend {
    transport: EngineTransport,
}

impl Elasticsearch7Backend {
    pub fn new(transport: EngineTransport) -> Self {
        Self { transport }
    }

    fn base_mapping(&self, field: &SearchField) -> Value {
        match &field.kind {
            FieldKind::Text => json!({ "type": "text", "copy_to": ALL_TEXT_FIELD }),
            FieldKind::Keyword => json!({ "type": "keyword" }),
            FieldKind::Date => json!({ "type": "date" }),
            FieldKind::Object(children) => json!({
                "type": "object",
                "properties": field_properties(children, |f| self.map_field_analyzer(f)),
            }),
        }
    }

    /// Full index creation body.
    pub(crate) fn index_body(&self, schema: &DocumentSchema) -> Value {
        let mut properties = field_properties(schema.fields(), |f| self.map_field_analyzer(f));
        properties.insert(
            ALL_TEXT_FIELD.to_string(),
            json!({ "type": "text", "analyzer": SUGGESTION_ANALYZER }),
        );

        json!({
            "settings": analysis_settings(schema.synonyms()),
            "mappings": { "properties": properties },
        })
    }

    /// The `query` section for a request.
    pub(crate) fn render_query(request: &SearchRequest) -> Value {
        let filters: Vec<Value> = request.filters.iter().map(render_filter).collect();
        let must: Vec<Value> = request
            .query
            .iter()
            .map(|query| render_match(query, ALL_TEXT_FIELD))
            .collect();

        json!({ "bool": { "filter": filters, "must": must } })
    }

    pub(crate) fn search_body(request: &SearchRequest) -> Value {
        backend::search_body(request, Self::render_query(request), false)
    }
}

#[async_trait]
impl SearchBackend for Elasticsearch7Backend {
    fn name(&self) -> &'static str {
        "elasticsearch7"
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

        if response.body["error"]["type"] == "resource_already_exists_exception" {
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
            .send(Method::PUT, &format!("{index}/_doc/{id}"), Some(document))
            .await?
            .into_success("Document upsert")?;
        Ok(())
    }

    async fn delete(&self, index: &str, id: &str) -> Result<(), AppError> {
        let response = self
            .transport
            .send(Method::DELETE, &format!("{index}/_doc/{id}"), None)
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
            .send(Method::POST, &format!("{index}/_count"), Some(&body))
            .await?
            .into_success("Count")?;
        count_total(&response)
    }

    async fn search(&self, index: &str, request: &SearchRequest) -> Result<Vec<String>, AppError> {
        let body = Self::search_body(request);
        let response = self
            .transport
            .send(Method::POST, &format!("{index}/_search"), Some(&body))
            .await?
            .into_success("Search")?;
        hit_ids(&response)
    }

    async fn suggestions_for(
        &self,
        index: &str,
        query_string: &str,
    ) -> Result<Vec<SuggestionSlot>, AppError> {
        let body = suggestion_body(query_string, ALL_TEXT_FIELD);
        let response = self
            .transport
            .send(Method::POST, &format!("{index}/_search"), Some(&body))
            .await?
            .into_success("Suggestion")?;
        Ok(extract_suggestions(&response))
    }
}
