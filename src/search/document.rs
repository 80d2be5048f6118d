use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::models::page::{ArchiveStatus, Page, PageSpecific};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagEntry {
    pub slug: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryEntry {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorEntry {
    pub name: String,
    pub slug: String,
}

/// The flattened, engine-resident representation of one page.
///
/// Fields a page type does not have serialize as `null` or `[]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchableDocument {
    pub title: String,
    pub content: Option<String>,
    pub url: String,
    pub language: String,
    pub date_published: NaiveDate,
    pub is_archived: ArchiveStatus,
    pub tags: Vec<TagEntry>,
    pub categories: Vec<CategoryEntry>,
    pub authors: Vec<AuthorEntry>,
    pub start_dt: Option<DateTime<Utc>>,
    pub end_dt: Option<DateTime<Utc>>,
    pub initial_filing_date: Option<NaiveDate>,
    pub statuses: Vec<String>,
}

impl From<&Page> for SearchableDocument {
    fn from(page: &Page) -> Self {
        Self {
            title: page.title.clone(),
            content: prepare_content(page),
            url: prepare_url(page),
            language: page.language.clone(),
            date_published: page.date_published,
            is_archived: page.is_archived,
            tags: page
                .tags
                .iter()
                .map(|t| TagEntry {
                    slug: t.slug.clone(),
                })
                .collect(),
            categories: page
                .categories
                .iter()
                .map(|c| CategoryEntry {
                    name: c.name.clone(),
                })
                .collect(),
            authors: page
                .authors
                .iter()
                .map(|a| AuthorEntry {
                    name: a.name.clone(),
                    slug: a.slug.clone(),
                })
                .collect(),
            start_dt: prepare_start_dt(page),
            end_dt: prepare_end_dt(page),
            initial_filing_date: prepare_initial_filing_date(page),
            statuses: prepare_statuses(page),
        }
    }
}

/// Engine document id for a page.
pub fn document_id(page_id: i64) -> String {
    page_id.to_string()
}

/// Plain searchable text of the page body.
///
/// Returns `None` when the page type has no content field, when the field is
/// unset, or when the body holds no text. Multiple fragments are collapsed
/// into a single string.
pub fn prepare_content(page: &Page) -> Option<String> {
    if !page.kind.has_content_field() {
        return None;
    }

    let fragments = page.content.as_ref()?.searchable_content();
    if fragments.is_empty() {
        None
    } else {
        Some(fragments.join(" "))
    }
}

pub fn prepare_url(page: &Page) -> String {
    page.url.clone()
}

/// Returns `None` for pages without an event window.
pub fn prepare_start_dt(page: &Page) -> Option<DateTime<Utc>> {
    match &page.specific {
        PageSpecific::Event { start_dt, .. } => *start_dt,
        _ => None,
    }
}

/// Returns `None` for pages without an event window.
pub fn prepare_end_dt(page: &Page) -> Option<DateTime<Utc>> {
    match &page.specific {
        PageSpecific::Event { end_dt, .. } => *end_dt,
        _ => None,
    }
}

/// Returns `None` for anything but enforcement actions.
pub fn prepare_initial_filing_date(page: &Page) -> Option<NaiveDate> {
    match &page.specific {
        PageSpecific::EnforcementAction {
            initial_filing_date,
            ..
        } => *initial_filing_date,
        _ => None,
    }
}

/// Status labels of an enforcement action; empty for other pages.
pub fn prepare_statuses(page: &Page) -> Vec<String> {
    match &page.specific {
        PageSpecific::EnforcementAction { statuses, .. } => {
            statuses.iter().map(|s| s.status.clone()).collect()
        }
        _ => Vec::new(),
    }
}
