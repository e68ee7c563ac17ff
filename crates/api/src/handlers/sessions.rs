//! Handlers for session listing and analysis.

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;
use thermoscan_core::render::ReportDocument;

use crate::error::AppResult;
use crate::state::AppState;

/// Response body for `GET /sessions`.
#[derive(Debug, Serialize)]
pub struct SessionList {
    pub sessions: Vec<String>,
}

/// GET /sessions
///
/// Sorted identifiers of every session in the capture store.
pub async fn list_sessions(State(state): State<AppState>) -> AppResult<Json<SessionList>> {
    let sessions = state.aggregator.list_sessions().await?;
    Ok(Json(SessionList { sessions }))
}

/// GET /analyze/{session_id}
///
/// Runs the full analysis for one session and returns the rendered report.
/// Missing or unusable captures degrade individual phases; only an unknown
/// session yields 404.
pub async fn analyze_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> AppResult<Json<ReportDocument>> {
    let report = state.aggregator.render_session(&session_id).await?;
    tracing::debug!(%session_id, views = report.analyses.len(), "Rendered session report");
    Ok(Json(report))
}
