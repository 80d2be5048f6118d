use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use serde_json::{json, Value};

use crate::error::AppError;
use crate::search::backend::{
    apply_suggestion_analyzer, extract_suggestions, SearchBackend, SuggestionSlot, SUGGESTER_NAME,
};
use crate::search::fields::{DocumentSchema, FieldKind, SearchField};
use crate::search::request::{Filter, Operator, Query, SearchRequest};

/// Page size used when a request does not set one.
const DEFAULT_PAGE_SIZE: usize = 10;

/// Largest edit distance a suggestion may be from the query term.
const MAX_EDIT_DISTANCE: usize = 2;

#[derive(Default)]
struct MemoryIndex {
    text_fields: Vec<String>,
    documents: BTreeMap<String, Value>,
}

/// In-process backend for demo mode and tests.
///
/// Evaluates requests directly against stored JSON documents with the same
/// filter semantics as the engine adapters. Suggestions come from a
/// vocabulary built over the index's text fields.
#[derive(Default)]
pub struct MemoryBackend {
    indices: RwLock<HashMap<String, MemoryIndex>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn read<T>(&self, f: impl FnOnce(&HashMap<String, MemoryIndex>) -> T) -> Result<T, AppError> {
        let guard = self
            .indices
            .read()
            .map_err(|_| AppError::Internal("Memory index lock poisoned".into()))?;
        Ok(f(&*guard))
    }

    fn write<T>(&self, f: impl FnOnce(&mut HashMap<String, MemoryIndex>) -> T) -> Result<T, AppError> {
        let mut guard = self
            .indices
            .write()
            .map_err(|_| AppError::Internal("Memory index lock poisoned".into()))?;
        Ok(f(&mut *guard))
    }
}

/// All scalar values at a dotted path, flattening arrays along the way.
fn values_at<'a>(document: &'a Value, path: &str) -> Vec<&'a Value> {
    let mut current = vec![document];
    for segment in path.split('.') {
        current = current
            .into_iter()
            .flat_map(|value| -> Vec<&'a Value> {
                match value {
                    Value::Array(items) => items.iter().filter_map(|i| i.get(segment)).collect(),
                    other => other.get(segment).into_iter().collect(),
                }
            })
            .collect();
    }

    current
        .into_iter()
        .flat_map(|value| -> Vec<&'a Value> {
            match value {
                Value::Array(items) => items.iter().collect(),
                Value::Null => Vec::new(),
                other => vec![other],
            }
        })
        .collect()
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Day granularity: plain dates as-is, timestamps truncated to their UTC date.
fn as_date(value: &Value) -> Option<NaiveDate> {
    let raw = value.as_str()?;
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.naive_utc().date()))
}

fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn filter_matches(document: &Value, filter: &Filter) -> bool {
    match filter {
        Filter::Prefix { field, value } => values_at(document, field)
            .into_iter()
            .filter_map(Value::as_str)
            .any(|v| v.starts_with(value.as_str())),
        Filter::Terms { field, values } => values_at(document, field)
            .into_iter()
            .filter_map(as_text)
            .any(|v| values.contains(&v)),
        Filter::Range { field, gte, lte } => values_at(document, field)
            .into_iter()
            .filter_map(as_date)
            .any(|date| {
                gte.map_or(true, |bound| date >= bound) && lte.map_or(true, |bound| date <= bound)
            }),
    }
}

fn query_matches(document: &Value, query: &Query, text_fields: &[String]) -> bool {
    let (fields, text, operator): (Vec<&str>, &str, Operator) = match query {
        Query::Match {
            field,
            text,
            operator,
        } => (vec![field.as_str()], text.as_str(), *operator),
        Query::FullText { text } => (
            text_fields.iter().map(String::as_str).collect(),
            text.as_str(),
            Operator::Or,
        ),
    };

    let wanted = tokenize(text);
    if wanted.is_empty() {
        return false;
    }

    let present: Vec<String> = fields
        .iter()
        .flat_map(|field| values_at(document, field))
        .filter_map(Value::as_str)
        .flat_map(tokenize)
        .collect();

    match operator {
        Operator::And => wanted.iter().all(|t| present.contains(t)),
        Operator::Or => wanted.iter().any(|t| present.contains(t)),
    }
}

fn matching_ids(index: &MemoryIndex, request: &SearchRequest) -> Vec<String> {
    let mut hits: Vec<(&String, &Value)> = index
        .documents
        .iter()
        .filter(|(_, doc)| request.filters.iter().all(|f| filter_matches(doc, f)))
        .filter(|(_, doc)| {
            request
                .query
                .as_ref()
                .map_or(true, |q| query_matches(doc, q, &index.text_fields))
        })
        .collect();

    for sort in request.sort.iter().rev() {
        // Stable: earlier sort keys win, ties keep id order.
        hits.sort_by(|(_, a), (_, b)| {
            let left = values_at(a, &sort.field).first().and_then(|v| as_text(v));
            let right = values_at(b, &sort.field).first().and_then(|v| as_text(v));
            match (left, right) {
                (Some(l), Some(r)) if sort.descending => r.cmp(&l),
                (Some(l), Some(r)) => l.cmp(&r),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            }
        });
    }

    hits.into_iter().map(|(id, _)| id.clone()).collect()
}

/// Term frequencies over the text fields of every stored document.
fn vocabulary(index: &MemoryIndex) -> HashMap<String, usize> {
    let mut terms = HashMap::new();
    for document in index.documents.values() {
        for field in &index.text_fields {
            for token in values_at(document, field)
                .into_iter()
                .filter_map(Value::as_str)
                .flat_map(tokenize)
            {
                *terms.entry(token).or_insert(0) += 1;
            }
        }
    }
    terms
}

fn suggestion_options(token: &str, vocabulary: &HashMap<String, usize>) -> Vec<Value> {
    if vocabulary.contains_key(token) {
        return Vec::new();
    }

    let first = token.chars().next();
    let mut candidates: Vec<(usize, usize, &String)> = vocabulary
        .iter()
        .filter(|(term, _)| term.chars().next() == first)
        .map(|(term, freq)| (strsim::damerau_levenshtein(token, term), *freq, term))
        .filter(|(distance, _, _)| *distance <= MAX_EDIT_DISTANCE)
        .collect();

    candidates.sort_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)).then(a.2.cmp(b.2)));

    candidates
        .into_iter()
        .map(|(distance, freq, term)| {
            json!({
                "text": term,
                "score": 1.0 - distance as f64 / token.chars().count().max(1) as f64,
                "freq": freq,
            })
        })
        .collect()
}

#[async_trait]
impl SearchBackend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn map_field_analyzer(&self, field: &SearchField) -> Value {
        let base = match &field.kind {
            FieldKind::Text => json!({ "type": "text" }),
            FieldKind::Keyword => json!({ "type": "keyword" }),
            FieldKind::Date => json!({ "type": "date" }),
            FieldKind::Object(_) => json!({ "type": "object" }),
        };
        apply_suggestion_analyzer(field, base)
    }

    async fn create_index(&self, schema: &DocumentSchema) -> Result<(), AppError> {
        let text_fields = schema.text_field_paths();
        self.write(|indices| {
            indices
                .entry(schema.index().to_string())
                .or_default()
                .text_fields = text_fields;
        })?;
        tracing::debug!(index = schema.index(), "Created in-memory index");
        Ok(())
    }

    async fn delete_index(&self, index: &str) -> Result<(), AppError> {
        self.write(|indices| {
            indices.remove(index);
        })
    }

    async fn upsert(&self, index: &str, id: &str, document: &Value) -> Result<(), AppError> {
        self.write(|indices| {
            indices
                .entry(index.to_string())
                .or_default()
                .documents
                .insert(id.to_string(), document.clone());
        })
    }

    async fn delete(&self, index: &str, id: &str) -> Result<(), AppError> {
        self.write(|indices| {
            if let Some(idx) = indices.get_mut(index) {
                idx.documents.remove(id);
            }
        })
    }

    async fn count(&self, index: &str, request: &SearchRequest) -> Result<u64, AppError> {
        self.read(|indices| {
            indices
                .get(index)
                .map_or(0, |idx| matching_ids(idx, request).len() as u64)
        })
    }

    async fn search(&self, index: &str, request: &SearchRequest) -> Result<Vec<String>, AppError> {
        self.read(|indices| {
            let Some(idx) = indices.get(index) else {
                return Vec::new();
            };
            matching_ids(idx, request)
                .into_iter()
                .skip(request.from)
                .take(request.size.unwrap_or(DEFAULT_PAGE_SIZE))
                .collect()
        })
    }

    async fn suggestions_for(
        &self,
        index: &str,
        query_string: &str,
    ) -> Result<Vec<SuggestionSlot>, AppError> {
        let response = self.read(|indices| {
            let terms = indices.get(index).map(vocabulary).unwrap_or_default();
            let slots: Vec<Value> = tokenize(query_string)
                .into_iter()
                .map(|token| {
                    let options = suggestion_options(&token, &terms);
                    json!({ "text": token, "options": options })
                })
                .collect();
            json!({ "suggest": { SUGGESTER_NAME: slots } })
        })?;

        Ok(extract_suggestions(&response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    async fn seeded() -> MemoryBackend {
        let backend = MemoryBackend::new();
        backend
            .create_index(&DocumentSchema::filterable_pages("pages"))
            .await
            .unwrap();

        let docs = [
            ("1", json!({
                "title": "Student loans explained",
                "content": "How student loans work",
                "url": "/about-us/blog/student-loans/",
                "date_published": "2021-05-01",
                "tags": [{ "slug": "students" }],
                "authors": [{ "name": "Jane Doe", "slug": "jane-doe" }],
                "is_archived": "no",
                "start_dt": null,
            })),
            ("2", json!({
                "title": "Mortgage webinar",
                "content": null,
                "url": "/about-us/events/mortgage-webinar/",
                "date_published": "2021-01-10",
                "tags": [{ "slug": "mortgages" }],
                "authors": [],
                "is_archived": "yes",
                "start_dt": "2021-02-01T14:00:00Z",
            })),
            ("3", json!({
                "title": "Paying for college",
                "content": "Loans and grants for students",
                "url": "/about-us/blog/paying-for-college/",
                "date_published": "2020-08-15",
                "tags": [{ "slug": "students" }, { "slug": "college" }],
                "authors": [],
                "is_archived": "no",
            })),
        ];
        for (id, doc) in docs {
            backend.upsert("pages", id, &doc).await.unwrap();
        }
        backend
    }

    #[test]
    fn test_values_at_flattens_arrays() {
        let doc = json!({ "tags": [{ "slug": "a" }, { "slug": "b" }], "statuses": ["x", "y"] });
        let slugs: Vec<&Value> = values_at(&doc, "tags.slug");
        assert_eq!(slugs, vec![&json!("a"), &json!("b")]);
        assert_eq!(values_at(&doc, "statuses").len(), 2);
        assert!(values_at(&doc, "missing.path").is_empty());
    }

    #[tokio::test]
    async fn test_filters_and_sort() {
        let backend = seeded().await;
        let request = SearchRequest::new()
            .filter(Filter::terms("tags.slug", ["students"]))
            .sort_desc("date_published");

        assert_eq!(backend.count("pages", &request).await.unwrap(), 2);
        assert_eq!(backend.search("pages", &request).await.unwrap(), vec!["1", "3"]);
    }

    #[tokio::test]
    async fn test_empty_terms_match_nothing() {
        let backend = seeded().await;
        let request = SearchRequest::new().filter(Filter::terms("is_archived", Vec::<String>::new()));
        assert_eq!(backend.count("pages", &request).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_range_is_inclusive_at_day_granularity() {
        let backend = seeded().await;

        let request = SearchRequest::new().filter(Filter::range("date_published", date(2021, 1, 10), date(2021, 5, 1)));
        assert_eq!(backend.count("pages", &request).await.unwrap(), 2);

        let request = SearchRequest::new().filter(Filter::range("start_dt", date(2021, 2, 1), None));
        assert_eq!(backend.search("pages", &request).await.unwrap(), vec!["2"]);
    }

    #[tokio::test]
    async fn test_match_operators() {
        let backend = seeded().await;

        let and = SearchRequest::new().query(Query::Match {
            field: "title".into(),
            text: "student explained".into(),
            operator: Operator::And,
        });
        assert_eq!(backend.search("pages", &and).await.unwrap(), vec!["1"]);

        let full_text = SearchRequest::new().query(Query::FullText { text: "grants webinar".into() });
        assert_eq!(backend.search("pages", &full_text).await.unwrap(), vec!["2", "3"]);
    }

    #[tokio::test]
    async fn test_window_and_default_size() {
        let backend = seeded().await;
        let all = SearchRequest::new().sort_desc("date_published");
        assert_eq!(backend.search("pages", &all).await.unwrap().len(), 3);

        let window = SearchRequest::new().sort_desc("date_published").window(1, 1);
        assert_eq!(backend.search("pages", &window).await.unwrap(), vec!["2"]);
    }

    #[tokio::test]
    async fn test_suggestions() {
        let backend = seeded().await;
        assert_eq!(
            backend.suggestions_for("pages", "laons").await.unwrap(),
            vec![SuggestionSlot::new("laons", Some("loans"))]
        );
        assert_eq!(
            backend.suggestions_for("pages", "Student loans").await.unwrap(),
            vec![
                SuggestionSlot::new("student", None),
                SuggestionSlot::new("loans", None),
            ]
        );
        assert_eq!(
            backend.suggestions_for("pages", "zzzz").await.unwrap(),
            vec![SuggestionSlot::new("zzzz", None)]
        );
    }

    #[tokio::test]
    async fn test_upsert_replaces_and_delete_is_idempotent() {
        let backend = seeded().await;
        backend
            .upsert("pages", "1", &json!({ "title": "Replaced", "date_published": "2022-01-01" }))
            .await
            .unwrap();
        let request = SearchRequest::new().filter(Filter::terms("tags.slug", ["students"]));
        assert_eq!(backend.search("pages", &request).await.unwrap(), vec!["3"]);

        backend.delete("pages", "1").await.unwrap();
        backend.delete("pages", "1").await.unwrap();
        assert_eq!(backend.count("pages", &SearchRequest::new()).await.unwrap(), 2);
    }
}
