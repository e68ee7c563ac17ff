//! # Thermoscan Store
//!
//! Temperature Field Loader: resolves `(session, view, phase)` to a decoded
//! [`Capture`] and lists the sessions available for analysis.
//!
//! | Backend | Type | Description |
//! |---------|------|-------------|
//! | Filesystem | [`FsCaptureStore`] | One directory per session, CSV grids plus optional JSON sidecars |
//! | In-memory | [`MemoryCaptureStore`] | Pre-decoded captures, used in tests and embedding |
//!
//! Loads are idempotent and never mutate the stored capture.

pub mod decode;
pub mod fs;
pub mod memory;

use async_trait::async_trait;
use thermoscan_core::error::CoreError;
use thermoscan_core::field::Capture;
use thermoscan_core::types::Phase;

pub use fs::FsCaptureStore;
pub use memory::MemoryCaptureStore;

/// Source of captures for the report aggregator.
#[async_trait]
pub trait CaptureStore: Send + Sync {
    /// Session identifiers, sorted.
    async fn list_sessions(&self) -> Result<Vec<String>, CoreError>;

    async fn session_exists(&self, session_id: &str) -> Result<bool, CoreError>;

    /// Load one capture.
    ///
    /// Fails with `SessionNotFound` for an unknown session, `CaptureNotFound`
    /// when the session lacks this view/phase, and `CaptureCorrupt` when the
    /// stored grid cannot be decoded.
    async fn load(&self, session_id: &str, view: &str, phase: Phase)
        -> Result<Capture, CoreError>;

    /// Opaque image reference for the display layer.
    fn image_ref(&self, session_id: &str, view: &str, phase: Phase) -> String;
}

/// Base file name (no extension) of a capture, e.g. `PREWORKOUT_LEG_FRONT`.
pub fn capture_stem(view: &str, phase: Phase) -> String {
    format!("{}_{}", phase.file_prefix(), view)
}

/// `<base_url>/<session>/<PREFIX>_<VIEW>.png`
pub fn image_url(base_url: &str, session_id: &str, view: &str, phase: Phase) -> String {
    format!(
        "{}/{}/{}.png",
        base_url.trim_end_matches('/'),
        session_id,
        capture_stem(view, phase)
    )
}
