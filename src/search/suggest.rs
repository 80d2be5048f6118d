use crate::error::AppError;
use crate::models::page::Page;
use crate::search::backend::{SearchBackend, SuggestionSlot};
use crate::search::query::SearchContext;
use crate::search::request::{Filter, Operator, Query, SearchRequest};
use crate::search::sanitize::make_safe;

/// The engine's corrected version of `query_string`, if it knows one.
pub async fn suggest(
    backend: &dyn SearchBackend,
    index: &str,
    query_string: &str,
) -> Result<Option<String>, AppError> {
    let slots = backend.suggestions_for(index, query_string).await?;
    Ok(corrected_phrase(&slots))
}

/// Rebuild the phrase from every slot, replacing only the tokens that had an
/// option. `None` when no slot had one.
pub fn corrected_phrase(slots: &[SuggestionSlot]) -> Option<String> {
    if slots.iter().all(|slot| slot.option.is_none()) {
        return None;
    }
    let words: Vec<&str> = slots.iter().map(SuggestionSlot::resolved).collect();
    Some(words.join(" "))
}

/// Whether a suggestion should replace the user's term.
///
/// Suggestions come back analyzed, so case alone never counts as a change.
pub fn should_correct(suggestion: &str, term: &str, correct: bool, typo_correction: bool) -> bool {
    correct
        && typo_correction
        && !suggestion.is_empty()
        && suggestion.to_lowercase() != term.to_lowercase()
}

/// Free-text search over the answer pages of one language, with typo
/// correction.
///
/// After a correction `search_term` holds the corrected term and
/// `suggestion` holds what the user originally typed.
pub struct AskSearch<'a> {
    context: &'a SearchContext,
    language: String,
    search_term: String,
    suggestion: Option<String>,
    request: SearchRequest,
}

impl<'a> AskSearch<'a> {
    pub fn new(context: &'a SearchContext, raw_term: &str, language: &str) -> Self {
        let search_term = make_safe(raw_term).trim().to_string();
        let request = SearchRequest::new()
            .filter(Filter::terms("language", [language]))
            .query(Query::FullText {
                text: search_term.clone(),
            });

        Self {
            context,
            language: language.to_string(),
            search_term,
            suggestion: None,
            request,
        }
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    pub fn suggestion(&self) -> Option<&str> {
        self.suggestion.as_deref()
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    /// Ask the engine for a better term and switch to it when warranted.
    ///
    /// Returns whether the term was replaced.
    pub async fn suggest(&mut self, correct: bool, typo_correction: bool) -> Result<bool, AppError> {
        if !correct || !typo_correction || self.search_term.is_empty() {
            return Ok(false);
        }

        let Some(suggestion) = suggest(
            self.context.backend.as_ref(),
            &self.context.index,
            &self.search_term,
        )
        .await?
        else {
            return Ok(false);
        };

        if !should_correct(&suggestion, &self.search_term, correct, typo_correction) {
            return Ok(false);
        }

        tracing::debug!(from = %self.search_term, to = %suggestion, "Correcting search term");
        self.request = SearchRequest::new()
            .filter(Filter::terms("language", [self.language.as_str()]))
            .query(Query::Match {
                field: "content".to_string(),
                text: suggestion.clone(),
                operator: Operator::Or,
            });
        self.suggestion = Some(std::mem::replace(&mut self.search_term, suggestion));
        Ok(true)
    }

    pub async fn results(&self) -> Result<Vec<Page>, AppError> {
        if self.search_term.is_empty() {
            return Ok(Vec::new());
        }
        self.context.run(self.request.clone()).await
    }
}
