use crate::types::Phase;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CoreError {
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Capture not found: {view} ({phase}) in session {session_id}")]
    CaptureNotFound {
        session_id: String,
        view: String,
        phase: Phase,
    },

    #[error("Capture corrupt: {view} ({phase}): {reason}")]
    CaptureCorrupt {
        view: String,
        phase: Phase,
        reason: String,
    },

    #[error("Insufficient signal: {foreground_fraction:.3} of cells are foreground, {required:.3} required")]
    InsufficientSignal {
        foreground_fraction: f64,
        required: f64,
    },

    #[error("Configuration invalid: {0}")]
    ConfigurationInvalid(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Whether this error can be contained at the phase level
    /// (degraded to an unavailable marker) instead of failing a request.
    pub fn is_phase_local(&self) -> bool {
        matches!(
            self,
            CoreError::CaptureNotFound { .. }
                | CoreError::CaptureCorrupt { .. }
                | CoreError::InsufficientSignal { .. }
        )
    }
}
