//! Filesystem capture store.
//!
//! Layout under the root directory:
//!
//! ```text
//! <root>/<session_id>/PREWORKOUT_LEG_FRONT.csv
//! <root>/<session_id>/PREWORKOUT_LEG_FRONT.json   (optional sidecar)
//! <root>/<session_id>/PREWORKOUT_LEG_FRONT.png    (served to the display layer)
//! ```

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thermoscan_core::config::TemperatureRange;
use thermoscan_core::error::CoreError;
use thermoscan_core::field::Capture;
use thermoscan_core::types::Phase;

use crate::decode::decode_capture;
use crate::{capture_stem, image_url, CaptureStore};

pub struct FsCaptureStore {
    root: PathBuf,
    images_base_url: String,
    range: TemperatureRange,
}

impl FsCaptureStore {
    pub fn new(
        root: impl Into<PathBuf>,
        images_base_url: impl Into<String>,
        range: TemperatureRange,
    ) -> Self {
        Self {
            root: root.into(),
            images_base_url: images_base_url.into(),
            range,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory of a session, or `None` when the id could escape the root.
    fn session_dir(&self, session_id: &str) -> Option<PathBuf> {
        let valid = !session_id.is_empty()
            && session_id != "."
            && session_id != ".."
            && !session_id.contains(['/', '\\', '\0']);
        valid.then(|| self.root.join(session_id))
    }
}

#[async_trait]
impl CaptureStore for FsCaptureStore {
    async fn list_sessions(&self) -> Result<Vec<String>, CoreError> {
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::warn!(root = %self.root.display(), "Capture root does not exist");
                return Ok(Vec::new());
            }
            Err(e) => return Err(CoreError::Internal(format!("listing sessions: {e}"))),
        };

        let mut sessions = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| CoreError::Internal(format!("listing sessions: {e}")))?
        {
            let is_dir = entry
                .file_type()
                .await
                .map(|t| t.is_dir())
                .unwrap_or(false);
            if !is_dir {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                sessions.push(name.to_string());
            }
        }
        sessions.sort();
        Ok(sessions)
    }

    async fn session_exists(&self, session_id: &str) -> Result<bool, CoreError> {
        let Some(dir) = self.session_dir(session_id) else {
            return Ok(false);
        };
        match tokio::fs::metadata(&dir).await {
            Ok(meta) => Ok(meta.is_dir()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(CoreError::Internal(format!(
                "checking session {session_id}: {e}"
            ))),
        }
    }

    async fn load(&self, session_id: &str, view: &str, phase: Phase) -> Result<Capture, CoreError> {
        if !self.session_exists(session_id).await? {
            return Err(CoreError::SessionNotFound(session_id.to_string()));
        }
        // session_exists has already rejected ids that escape the root.
        let dir = self.root.join(session_id);
        let stem = capture_stem(view, phase);
        let csv_path = dir.join(format!("{stem}.csv"));

        let csv = match tokio::fs::read(&csv_path).await {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(CoreError::CaptureNotFound {
                    session_id: session_id.to_string(),
                    view: view.to_string(),
                    phase,
                });
            }
            Err(e) => {
                return Err(CoreError::CaptureCorrupt {
                    view: view.to_string(),
                    phase,
                    reason: format!("unreadable: {e}"),
                });
            }
        };

        let metadata = match tokio::fs::read_to_string(dir.join(format!("{stem}.json"))).await {
            Ok(json) => Some(json),
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => {
                tracing::warn!(session_id, %stem, error = %e, "Ignoring unreadable metadata sidecar");
                None
            }
        };

        tracing::debug!(session_id, %stem, "Decoding capture");
        decode_capture(view, phase, &csv, metadata.as_deref(), &self.range)
    }

    fn image_ref(&self, session_id: &str, view: &str, phase: Phase) -> String {
        image_url(&self.images_base_url, session_id, view, phase)
    }
}
