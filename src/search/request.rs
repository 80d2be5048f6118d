//! Engine-neutral description of a search.
//!
//! Query builders produce a [`SearchRequest`]; each backend adapter renders it
//! into its own wire format.

use chrono::NaiveDate;

/// Non-scoring filter clause. All filters of a request must match.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Field value starts with `value`.
    Prefix { field: String, value: String },
    /// Field value is one of `values`. An empty set matches nothing.
    Terms { field: String, values: Vec<String> },
    /// Date field within the bounds, both inclusive when present.
    Range {
        field: String,
        gte: Option<NaiveDate>,
        lte: Option<NaiveDate>,
    },
}

impl Filter {
    pub fn prefix(field: &str, value: impl Into<String>) -> Self {
        Filter::Prefix {
            field: field.to_string(),
            value: value.into(),
        }
    }

    pub fn terms<I, S>(field: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Filter::Terms {
            field: field.to_string(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn range(field: &str, gte: Option<NaiveDate>, lte: Option<NaiveDate>) -> Self {
        Filter::Range {
            field: field.to_string(),
            gte,
            lte,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// Every query term must match.
    And,
    /// Any query term may match.
    Or,
}

impl Operator {
    pub fn as_str(self) -> &'static str {
        match self {
            Operator::And => "and",
            Operator::Or => "or",
        }
    }
}

/// Scoring query clause.
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    Match {
        field: String,
        text: String,
        operator: Operator,
    },
    /// Match against the adapter's catch-all text field.
    FullText { text: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sort {
    pub field: String,
    pub descending: bool,
}

/// A complete search: filters, optional query, ordering and result window.
///
/// A `size` of `None` leaves the engine's default page size in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchRequest {
    pub filters: Vec<Filter>,
    pub query: Option<Query>,
    pub sort: Vec<Sort>,
    pub from: usize,
    pub size: Option<usize>,
}

impl SearchRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn query(mut self, query: Query) -> Self {
        self.query = Some(query);
        self
    }

    pub fn sort_desc(mut self, field: &str) -> Self {
        self.sort.push(Sort {
            field: field.to_string(),
            descending: true,
        });
        self
    }

    /// Restrict the result window to `[from, from + size)`.
    pub fn window(mut self, from: usize, size: usize) -> Self {
        self.from = from;
        self.size = Some(size);
        self
    }
}
