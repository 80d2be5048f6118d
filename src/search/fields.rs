/// How a field is stored and analyzed by the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    /// Analyzed full text.
    Text,
    /// Exact-match value.
    Keyword,
    Date,
    /// Nested object with its own properties.
    Object(Vec<SearchField>),
}

/// One field of the searchable document schema.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchField {
    pub name: &'static str,
    pub kind: FieldKind,
    /// Suggestion-eligible fields receive the synonym-aware analyzer.
    pub suggestion: bool,
}

impl SearchField {
    pub fn text(name: &'static str) -> Self {
        Self::new(name, FieldKind::Text)
    }

    pub fn keyword(name: &'static str) -> Self {
        Self::new(name, FieldKind::Keyword)
    }

    pub fn date(name: &'static str) -> Self {
        Self::new(name, FieldKind::Date)
    }

    pub fn object(name: &'static str, properties: Vec<SearchField>) -> Self {
        Self::new(name, FieldKind::Object(properties))
    }

    /// Mark this field as suggestion-eligible.
    pub fn suggestion(mut self) -> Self {
        self.suggestion = true;
        self
    }

    fn new(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            suggestion: false,
        }
    }
}

/// The field table and index settings of one index.
///
/// Owned by the [`Indexer`](crate::search::indexer::Indexer); there is no
/// process-wide registry of documents.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentSchema {
    index: String,
    fields: Vec<SearchField>,
    synonyms: Vec<String>,
}

impl DocumentSchema {
    /// Schema of the filterable pages index.
    pub fn filterable_pages(index: impl Into<String>) -> Self {
        Self {
            index: index.into(),
            fields: vec![
                SearchField::object("tags", vec![SearchField::keyword("slug")]),
                SearchField::object("categories", vec![SearchField::keyword("name")]),
                SearchField::object(
                    "authors",
                    vec![SearchField::text("name"), SearchField::keyword("slug")],
                ),
                SearchField::text("title").suggestion(),
                SearchField::keyword("is_archived"),
                SearchField::text("content").suggestion(),
                SearchField::date("date_published"),
                SearchField::keyword("url"),
                SearchField::keyword("language"),
                SearchField::date("start_dt"),
                SearchField::date("end_dt"),
                SearchField::keyword("statuses"),
                SearchField::date("initial_filing_date"),
            ],
            synonyms: Vec::new(),
        }
    }

    pub fn with_synonyms(mut self, synonyms: Vec<String>) -> Self {
        self.synonyms = synonyms;
        self
    }

    pub fn index(&self) -> &str {
        &self.index
    }

    pub fn fields(&self) -> &[SearchField] {
        &self.fields
    }

    pub fn synonyms(&self) -> &[String] {
        &self.synonyms
    }

    /// Dotted paths of every analyzed text field, nested ones included.
    pub fn text_field_paths(&self) -> Vec<String> {
        let mut paths = Vec::new();
        collect_text_paths(&self.fields, "", &mut paths);
        paths
    }
}

fn collect_text_paths(fields: &[SearchField], prefix: &str, out: &mut Vec<String>) {
    for field in fields {
        let path = if prefix.is_empty() {
            field.name.to_string()
        } else {
            format!("{prefix}.{}", field.name)
        };

        match &field.kind {
            FieldKind::Text => out.push(path),
            FieldKind::Object(children) => collect_text_paths(children, &path, out),
            FieldKind::Keyword | FieldKind::Date => {}
        }
    }
}
