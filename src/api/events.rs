use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::search::indexer::{IndexEvent, IndexReport, Indexer};

/// Body of `POST /api/v1/index/events`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexEventRequest {
    pub service_token: String,
    pub event: IndexEvent,
}

/// Core event handling, separated from the HTTP layer for testability.
///
/// Authenticates the caller, then re-indexes whatever the event touches.
/// Partial failures are reported as an outage so the CMS can retry.
pub async fn process_index_event(
    indexer: &Indexer,
    request: IndexEventRequest,
    expected_token: &str,
) -> Result<IndexReport, AppError> {
    if request.service_token != expected_token {
        return Err(AppError::Auth("Invalid service token".into()));
    }

    let report = indexer.handle(&request.event).await?;
    if report.failed > 0 {
        return Err(AppError::SearchUnavailable(format!(
            "{} of {} documents failed to index",
            report.failed,
            report.indexed + report.removed + report.failed
        )));
    }

    Ok(report)
}

/// Axum handler for `POST /api/v1/index/events`.
pub async fn index_event_handler(
    axum::extract::State(state): axum::extract::State<crate::app::AppState>,
    axum::Json(request): axum::Json<IndexEventRequest>,
) -> Result<axum::Json<IndexReport>, AppError> {
    let report = process_index_event(&state.indexer, request, &state.service_token).await?;
    Ok(axum::Json(report))
}
