//! Batch analysis of stored sessions.
//!
//! Runs each requested session through the same [`ReportAggregator`] the
//! API uses and collects the rendered reports. A failing session does not
//! stop the others.

use thermoscan_core::error::CoreError;
use thermoscan_core::render::ReportDocument;
use thermoscan_pipeline::ReportAggregator;

#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub reports: Vec<ReportDocument>,
    pub failures: Vec<(String, CoreError)>,
}

impl BatchOutcome {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Pretty JSON: a single report as an object, several as an array.
    pub fn to_json(&self) -> serde_json::Result<String> {
        match self.reports.as_slice() {
            [single] => serde_json::to_string_pretty(single),
            many => serde_json::to_string_pretty(many),
        }
    }
}

/// Analyse `sessions` in order.
pub async fn analyze_sessions(aggregator: &ReportAggregator, sessions: &[String]) -> BatchOutcome {
    let mut outcome = BatchOutcome::default();
    for session_id in sessions {
        match aggregator.render_session(session_id).await {
            Ok(report) => {
                tracing::info!(%session_id, views = report.analyses.len(), "Session analysed");
                outcome.reports.push(report);
            }
            Err(e) => {
                tracing::error!(%session_id, error = %e, "Session analysis failed");
                outcome.failures.push((session_id.clone(), e));
            }
        }
    }
    outcome
}
