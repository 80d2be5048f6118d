use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::Deserialize;

use crate::db::repository::PageRepository;
use crate::error::AppError;
use crate::models::page::{ArchiveStatus, Page};
use crate::search::backend::SearchBackend;
use crate::search::request::{Filter, Operator, Query, SearchRequest};

fn default_prefix() -> String {
    "/".to_string()
}

/// User-supplied narrowing of a filterable page list.
///
/// Empty lists and empty strings impose no constraint. `archived` is the one
/// exception: `Some(vec![])` is an explicit constraint that matches nothing.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FilterCriteria {
    pub prefix: String,
    pub topics: Vec<String>,
    pub categories: Vec<String>,
    pub authors: Vec<String>,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
    pub title: String,
    pub archived: Option<Vec<ArchiveStatus>>,
    pub statuses: Vec<String>,
}

impl Default for FilterCriteria {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            topics: Vec::new(),
            categories: Vec::new(),
            authors: Vec::new(),
            from_date: None,
            to_date: None,
            title: String::new(),
            archived: None,
            statuses: Vec::new(),
        }
    }
}

/// Which family of pages a filterable list shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageCategory {
    #[default]
    Default,
    Event,
    EnforcementAction,
}

/// How the from/to dates of the criteria apply to a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFilter {
    /// The field lies within `[from, to]`.
    Range(&'static str),
    /// The `[start, end]` window lies within `[from, to]`.
    Window {
        start: &'static str,
        end: &'static str,
    },
}

/// Per-category query behaviour.
pub struct CategoryStrategy {
    pub date_filter: DateFilter,
    pub sort_field: &'static str,
    pub extra_filters: fn(&FilterCriteria) -> Vec<Filter>,
}

fn no_extra_filters(_: &FilterCriteria) -> Vec<Filter> {
    Vec::new()
}

fn enforcement_filters(criteria: &FilterCriteria) -> Vec<Filter> {
    if criteria.statuses.is_empty() {
        Vec::new()
    } else {
        vec![Filter::terms("statuses", criteria.statuses.iter().cloned())]
    }
}

static DEFAULT_STRATEGY: CategoryStrategy = CategoryStrategy {
    date_filter: DateFilter::Range("date_published"),
    sort_field: "date_published",
    extra_filters: no_extra_filters,
};

static EVENT_STRATEGY: CategoryStrategy = CategoryStrategy {
    date_filter: DateFilter::Window {
        start: "start_dt",
        end: "end_dt",
    },
    sort_field: "date_published",
    extra_filters: no_extra_filters,
};

static ENFORCEMENT_STRATEGY: CategoryStrategy = CategoryStrategy {
    date_filter: DateFilter::Range("initial_filing_date"),
    sort_field: "initial_filing_date",
    extra_filters: enforcement_filters,
};

impl PageCategory {
    pub fn strategy(self) -> &'static CategoryStrategy {
        match self {
            PageCategory::Default => &DEFAULT_STRATEGY,
            PageCategory::Event => &EVENT_STRATEGY,
            PageCategory::EnforcementAction => &ENFORCEMENT_STRATEGY,
        }
    }
}

/// Translate criteria into an engine-neutral request for one category.
pub fn build_request(category: PageCategory, criteria: &FilterCriteria) -> SearchRequest {
    let strategy = category.strategy();
    let mut request = SearchRequest::new();

    if !criteria.prefix.is_empty() {
        request = request.filter(Filter::prefix("url", criteria.prefix.clone()));
    }

    for (field, values) in [
        ("tags.slug", &criteria.topics),
        ("categories.name", &criteria.categories),
        ("authors.slug", &criteria.authors),
    ] {
        if !values.is_empty() {
            request = request.filter(Filter::terms(field, values.iter().cloned()));
        }
    }

    // A single bound is ignored.
    if let (Some(from), Some(to)) = (criteria.from_date, criteria.to_date) {
        match strategy.date_filter {
            DateFilter::Range(field) => {
                request = request.filter(Filter::range(field, Some(from), Some(to)));
            }
            DateFilter::Window { start, end } => {
                request = request
                    .filter(Filter::range(start, Some(from), None))
                    .filter(Filter::range(end, None, Some(to)));
            }
        }
    }

    if let Some(archived) = &criteria.archived {
        request = request.filter(Filter::terms(
            "is_archived",
            archived.iter().map(|status| status.as_str()),
        ));
    }

    if !criteria.title.is_empty() {
        request = request.query(Query::Match {
            field: "title".to_string(),
            text: criteria.title.clone(),
            operator: Operator::And,
        });
    }

    for filter in (strategy.extra_filters)(criteria) {
        request = request.filter(filter);
    }

    request.sort_desc(strategy.sort_field)
}

/// What every search needs: the engine, the page store and the index name.
#[derive(Clone)]
pub struct SearchContext {
    pub backend: Arc<dyn SearchBackend>,
    pub pages: Arc<dyn PageRepository>,
    pub index: String,
}

impl SearchContext {
    /// Count the matches, then fetch all of them and resolve them to pages.
    ///
    /// The fetch window is not clamped. Elasticsearch rejects windows past
    /// `index.max_result_window` (10 000 by default), which surfaces here as
    /// [`AppError::SearchUnavailable`]; raise that index setting when a
    /// listing can grow beyond it.
    pub async fn run(&self, request: SearchRequest) -> Result<Vec<Page>, AppError> {
        let total = self.backend.count(&self.index, &request).await?;
        if total == 0 {
            return Ok(Vec::new());
        }

        let ids = self
            .backend
            .search(&self.index, &request.window(0, total as usize))
            .await?;
        resolve_hits(self.pages.as_ref(), &ids).await
    }
}

/// Map engine hits back to live pages, keeping hit order.
///
/// Ids that do not parse or whose page is gone or unpublished are dropped.
pub async fn resolve_hits(
    pages: &dyn PageRepository,
    hit_ids: &[String],
) -> Result<Vec<Page>, AppError> {
    let ids: Vec<i64> = hit_ids
        .iter()
        .filter_map(|id| match id.parse() {
            Ok(id) => Some(id),
            Err(_) => {
                tracing::debug!(id = %id, "Dropping hit with non-numeric id");
                None
            }
        })
        .collect();

    let mut by_id: HashMap<i64, Page> = pages
        .find_live_by_ids(&ids)
        .await?
        .into_iter()
        .map(|page| (page.id, page))
        .collect();

    Ok(ids
        .into_iter()
        .filter_map(|id| {
            let page = by_id.remove(&id);
            if page.is_none() {
                tracing::debug!(id, "Dropping stale hit");
            }
            page
        })
        .collect())
}

/// A filterable page list query.
pub struct FilterablePagesSearch<'a> {
    context: &'a SearchContext,
    category: PageCategory,
    criteria: FilterCriteria,
}

impl<'a> FilterablePagesSearch<'a> {
    pub fn new(context: &'a SearchContext, category: PageCategory, criteria: FilterCriteria) -> Self {
        Self {
            context,
            category,
            criteria,
        }
    }

    pub fn request(&self) -> SearchRequest {
        build_request(self.category, &self.criteria)
    }

    pub async fn search(&self) -> Result<Vec<Page>, AppError> {
        self.context.run(self.request()).await
    }
}
