//! Session-level orchestration (Report Aggregator).
//!
//! Each view runs as its own task: the three phase captures are loaded
//! concurrently, then the CPU-bound analysis runs on the blocking pool.
//! Failures stay inside the view that produced them. Only an unknown
//! session fails the whole request.

use std::path::Path;
use std::sync::Arc;

use thermoscan_core::analysis::{analyze_view, ViewAnalysis};
use thermoscan_core::catalog::ViewCatalog;
use thermoscan_core::config::AnalysisConfig;
use thermoscan_core::error::CoreError;
use thermoscan_core::render::{render_report, ReportDocument};
use thermoscan_core::report::Report;
use thermoscan_core::types::{Phase, PhaseSet};
use thermoscan_store::CaptureStore;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Worker count used when the host parallelism cannot be determined.
const FALLBACK_CONCURRENCY: usize = 4;

/// Number of view tasks allowed to run at once by default.
pub fn default_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(FALLBACK_CONCURRENCY)
}

/// Load the analysis configuration from a JSON file, or the defaults when
/// no path is given. The result is validated either way.
pub fn load_analysis_config(path: Option<&Path>) -> Result<AnalysisConfig, CoreError> {
    let Some(path) = path else {
        let config = AnalysisConfig::default();
        config.validate()?;
        return Ok(config);
    };
    let json = std::fs::read_to_string(path).map_err(|e| {
        CoreError::ConfigurationInvalid(format!("cannot read {}: {e}", path.display()))
    })?;
    let config = AnalysisConfig::from_json_str(&json)?;
    tracing::info!(path = %path.display(), views = config.views.len(), "Loaded analysis configuration");
    Ok(config)
}

// ---------------------------------------------------------------------------
// ReportAggregator
// ---------------------------------------------------------------------------

/// Builds per-session reports. Cheap to clone; shares the store and config.
#[derive(Clone)]
pub struct ReportAggregator {
    store: Arc<dyn CaptureStore>,
    config: Arc<AnalysisConfig>,
    concurrency: usize,
}

impl ReportAggregator {
    /// Validate `config` and build an aggregator over `store`.
    ///
    /// A malformed catalog or threshold table fails here with
    /// `ConfigurationInvalid`, never on a later request.
    pub fn new(store: Arc<dyn CaptureStore>, config: AnalysisConfig) -> Result<Self, CoreError> {
        config.validate()?;
        Ok(Self {
            store,
            config: Arc::new(config),
            concurrency: default_concurrency(),
        })
    }

    /// Bound the number of concurrently analysed views (minimum 1).
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub async fn list_sessions(&self) -> Result<Vec<String>, CoreError> {
        self.store.list_sessions().await
    }

    /// Analyse every catalog view of a session.
    ///
    /// Views whose three phases are all unavailable, or whose task panicked,
    /// are left out of the report and logged.
    pub async fn analyze_session(&self, session_id: &str) -> Result<Report, CoreError> {
        if !self.store.session_exists(session_id).await? {
            return Err(CoreError::SessionNotFound(session_id.to_string()));
        }

        tracing::info!(
            session_id,
            views = self.config.views.len(),
            concurrency = self.concurrency,
            "Analysing session"
        );

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();
        for (index, catalog) in self.config.views.iter().enumerate() {
            let store = Arc::clone(&self.store);
            let config = Arc::clone(&self.config);
            let semaphore = Arc::clone(&semaphore);
            let catalog = catalog.clone();
            let session_id = session_id.to_string();
            tasks.spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return (index, None);
                };
                (index, run_view(store, config, catalog, session_id).await)
            });
        }

        let mut finished: Vec<(usize, ViewAnalysis)> = Vec::with_capacity(self.config.views.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, Some(view))) => finished.push((index, view)),
                Ok((_, None)) => {}
                Err(e) => {
                    tracing::error!(session_id, error = %e, "View task failed; view excluded");
                }
            }
        }
        finished.sort_by_key(|(index, _)| *index);

        let mut report = Report::new(session_id);
        for (_, view) in finished {
            report.analyses.insert(view.view.clone(), view);
        }

        tracing::info!(
            session_id,
            views = report.analyses.len(),
            "Session analysis complete"
        );
        Ok(report)
    }

    /// Analyse a session and render it for the display layer.
    pub async fn render_session(&self, session_id: &str) -> Result<ReportDocument, CoreError> {
        let report = self.analyze_session(session_id).await?;
        Ok(render_report(&report, self.config.summary_heat_threshold))
    }
}

/// Load and analyse one view. `None` means the view is excluded.
async fn run_view(
    store: Arc<dyn CaptureStore>,
    config: Arc<AnalysisConfig>,
    catalog: ViewCatalog,
    session_id: String,
) -> Option<ViewAnalysis> {
    let view = catalog.view.clone();

    let (pre, post, recovery) = tokio::join!(
        store.load(&session_id, &view, Phase::Pre),
        store.load(&session_id, &view, Phase::Post),
        store.load(&session_id, &view, Phase::Recovery),
    );
    let captures = PhaseSet { pre, post, recovery };
    for phase in Phase::ALL {
        match captures.get(phase) {
            Err(e) if e.is_phase_local() => {
                tracing::debug!(%session_id, %view, %phase, error = %e, "Capture load failed");
            }
            Err(e) => {
                tracing::error!(%session_id, %view, %phase, error = %e, "Capture store error");
            }
            Ok(_) => {}
        }
    }
    let images = PhaseSet {
        pre: store.image_ref(&session_id, &view, Phase::Pre),
        post: store.image_ref(&session_id, &view, Phase::Post),
        recovery: store.image_ref(&session_id, &view, Phase::Recovery),
    };

    let analysed =
        tokio::task::spawn_blocking(move || analyze_view(&catalog, captures, images, &config))
            .await;

    match analysed {
        Ok(Some(analysis)) => {
            for phase in analysis.unavailable_phases() {
                if let Some(reason) = analysis.snapshots.get(phase).unavailable_reason() {
                    tracing::warn!(
                        %session_id,
                        %view,
                        %phase,
                        reason = %reason.describe(),
                        "Phase degraded to unavailable"
                    );
                }
            }
            tracing::debug!(
                %session_id,
                %view,
                recommendation = ?analysis.recommendation.category,
                "View analysed"
            );
            Some(analysis)
        }
        Ok(None) => {
            tracing::warn!(%session_id, %view, "No phase of view could be analysed; view excluded");
            None
        }
        Err(e) => {
            tracing::error!(%session_id, %view, error = %e, "View analysis panicked; view excluded");
            None
        }
    }
}
