pub mod health;
pub mod sessions;

use axum::Router;

use crate::state::AppState;

/// Build the analysis route tree.
///
/// ```text
/// /sessions                  list sessions (GET)
/// /analyze/{session_id}      rendered session report (GET)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().merge(sessions::router())
}
