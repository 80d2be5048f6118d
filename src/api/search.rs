use axum::extract::State;
use axum::Json;
use axum_extra::extract::Query;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::app::AppState;
use crate::error::AppError;
use crate::models::page::{ArchiveStatus, Page, PageKind};
use crate::search::query::{FilterCriteria, FilterablePagesSearch, PageCategory, SearchContext};
use crate::search::suggest::AskSearch;

/// Query string of `GET /api/v1/filterable-pages`. List parameters repeat,
/// e.g. `?topics=students&topics=mortgages`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FilterablePagesParams {
    pub category: PageCategory,
    pub prefix: Option<String>,
    pub topics: Vec<String>,
    pub categories: Vec<String>,
    pub authors: Vec<String>,
    pub statuses: Vec<String>,
    pub archived: Vec<ArchiveStatus>,
    pub from_date: Option<String>,
    pub to_date: Option<String>,
    pub title: Option<String>,
}

/// Query string of `GET /api/v1/ask/search`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AskSearchParams {
    pub q: String,
    pub language: Option<String>,
    /// `1` (default) allows typo correction, anything else disables it.
    pub correct: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageSummary {
    pub id: i64,
    pub title: String,
    pub url: String,
    pub kind: PageKind,
    pub date_published: NaiveDate,
}

impl From<Page> for PageSummary {
    fn from(page: Page) -> Self {
        Self {
            id: page.id,
            title: page.title,
            url: page.url,
            kind: page.kind,
            date_published: page.date_published,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterablePagesResponse {
    pub total: usize,
    pub results: Vec<PageSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskSearchResponse {
    /// The term the results were found for.
    pub search_term: String,
    /// What the user typed, when it was corrected.
    pub original_term: Option<String>,
    pub language: String,
    pub total: usize,
    pub results: Vec<PageSummary>,
}

fn parse_date(name: &str, raw: Option<&str>) -> Result<Option<NaiveDate>, AppError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| AppError::BadRequest(format!("Invalid {name} '{value}', expected YYYY-MM-DD"))),
    }
}

impl FilterablePagesParams {
    pub fn into_criteria(self) -> Result<FilterCriteria, AppError> {
        let from_date = parse_date("from_date", self.from_date.as_deref())?;
        let to_date = parse_date("to_date", self.to_date.as_deref())?;

        Ok(FilterCriteria {
            prefix: self.prefix.unwrap_or_else(|| FilterCriteria::default().prefix),
            topics: self.topics,
            categories: self.categories,
            authors: self.authors,
            from_date,
            to_date,
            title: self.title.unwrap_or_default().trim().to_string(),
            // A query string cannot carry an explicit empty list.
            archived: if self.archived.is_empty() {
                None
            } else {
                Some(self.archived)
            },
            statuses: self.statuses,
        })
    }
}

fn summaries(pages: Vec<Page>) -> Vec<PageSummary> {
    pages.into_iter().map(PageSummary::from).collect()
}

pub async fn process_filterable_pages(
    context: &SearchContext,
    params: FilterablePagesParams,
) -> Result<FilterablePagesResponse, AppError> {
    let category = params.category;
    let criteria = params.into_criteria()?;
    let pages = FilterablePagesSearch::new(context, category, criteria)
        .search()
        .await?;

    Ok(FilterablePagesResponse {
        total: pages.len(),
        results: summaries(pages),
    })
}

pub async fn process_ask_search(
    context: &SearchContext,
    params: AskSearchParams,
    typo_correction: bool,
) -> Result<AskSearchResponse, AppError> {
    let language = params.language.unwrap_or_else(|| "en".to_string());
    let correct = params.correct.as_deref().unwrap_or("1") == "1";

    let mut search = AskSearch::new(context, &params.q, &language);
    let mut pages = search.results().await?;
    if search.suggest(correct, typo_correction).await? {
        pages = search.results().await?;
    }

    Ok(AskSearchResponse {
        search_term: search.search_term().to_string(),
        original_term: search.suggestion().map(str::to_string),
        language,
        total: pages.len(),
        results: summaries(pages),
    })
}

/// Axum handler for `GET /api/v1/filterable-pages`.
pub async fn filterable_pages_handler(
    State(state): State<AppState>,
    Query(params): Query<FilterablePagesParams>,
) -> Result<Json<FilterablePagesResponse>, AppError> {
    Ok(Json(process_filterable_pages(&state.search, params).await?))
}

/// Axum handler for `GET /api/v1/ask/search`.
pub async fn ask_search_handler(
    State(state): State<AppState>,
    Query(params): Query<AskSearchParams>,
) -> Result<Json<AskSearchResponse>, AppError> {
    Ok(Json(
        process_ask_search(&state.search, params, state.typo_correction).await?,
    ))
}
