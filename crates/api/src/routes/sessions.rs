use axum::routing::get;
use axum::Router;

use crate::handlers::sessions;
use crate::state::AppState;

/// Session routes, mounted at the root.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/sessions", get(sessions::list_sessions))
        .route("/analyze/{session_id}", get(sessions::analyze_session))
}
