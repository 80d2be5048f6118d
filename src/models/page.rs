use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::stream::StreamValue;

/// The concrete page types that feed the filterable pages index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageKind {
    BlogPage,
    LegacyBlogPage,
    DocumentDetailPage,
    EnforcementActionPage,
    EventPage,
    LearnPage,
    LegacyNewsroomPage,
    NewsroomPage,
}

impl PageKind {
    /// Whether pages of this kind carry a streamfield `content` body.
    ///
    /// Event pages keep their copy in a separate rich text `body` that is not
    /// part of the searchable content.
    pub fn has_content_field(self) -> bool {
        !matches!(self, PageKind::EventPage)
    }
}

/// Archive state of a page, indexed as a keyword.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveStatus {
    #[default]
    No,
    Yes,
    Never,
}

impl ArchiveStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ArchiveStatus::No => "no",
            ArchiveStatus::Yes => "yes",
            ArchiveStatus::Never => "never",
        }
    }
}

impl fmt::Display for ArchiveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: i64,
    pub slug: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: i64,
    pub name: String,
    pub slug: String,
}

/// Lifecycle label attached to an enforcement action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnforcementStatus {
    pub id: i64,
    pub status: String,
}

/// Attributes only some page types have.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PageSpecific {
    #[default]
    None,
    Event {
        start_dt: Option<DateTime<Utc>>,
        end_dt: Option<DateTime<Utc>>,
    },
    EnforcementAction {
        initial_filing_date: Option<NaiveDate>,
        #[serde(default)]
        statuses: Vec<EnforcementStatus>,
    },
}

fn default_language() -> String {
    "en".to_string()
}

fn default_true() -> bool {
    true
}

/// A content page as supplied by the CMS.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub id: i64,
    pub kind: PageKind,
    pub title: String,
    /// Canonical resolved path, e.g. `/about-us/blog/some-post/`.
    pub url: String,
    #[serde(default = "default_language")]
    pub language: String,
    pub date_published: NaiveDate,
    #[serde(default)]
    pub is_archived: ArchiveStatus,
    #[serde(default = "default_true")]
    pub live: bool,
    #[serde(default = "default_true")]
    pub public: bool,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub authors: Vec<Author>,
    #[serde(default)]
    pub content: Option<StreamValue>,
    #[serde(default)]
    pub specific: PageSpecific,
}

impl Page {
    /// A live, public page with no relations, body or type-specific data.
    pub fn new(
        id: i64,
        kind: PageKind,
        title: impl Into<String>,
        url: impl Into<String>,
        date_published: NaiveDate,
    ) -> Self {
        Self {
            id,
            kind,
            title: title.into(),
            url: url.into(),
            language: default_language(),
            date_published,
            is_archived: ArchiveStatus::No,
            live: true,
            public: true,
            tags: Vec::new(),
            categories: Vec::new(),
            authors: Vec::new(),
            content: None,
            specific: PageSpecific::None,
        }
    }

    /// Only live, public pages belong in the index.
    pub fn is_indexable(&self) -> bool {
        self.live && self.public
    }
}
