use thermoscan_pipeline::ReportAggregator;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: the aggregator keeps its store and config behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Session analysis over the configured capture store.
    pub aggregator: ReportAggregator,
}
