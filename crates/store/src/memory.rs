//! In-memory capture store.
//!
//! Holds already-decoded captures, or the error a load should return, keyed
//! by session, view and phase.

use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use async_trait::async_trait;
use thermoscan_core::config::TemperatureRange;
use thermoscan_core::error::CoreError;
use thermoscan_core::field::{Capture, TemperatureField};
use thermoscan_core::types::Phase;

use crate::decode::decode_capture;
use crate::{image_url, CaptureStore};

type SessionCaptures = HashMap<(String, Phase), Result<Capture, CoreError>>;

pub struct MemoryCaptureStore {
    sessions: RwLock<BTreeMap<String, SessionCaptures>>,
    images_base_url: String,
}

impl Default for MemoryCaptureStore {
    fn default() -> Self {
        Self::new("/images")
    }
}

impl MemoryCaptureStore {
    pub fn new(images_base_url: impl Into<String>) -> Self {
        Self {
            sessions: RwLock::new(BTreeMap::new()),
            images_base_url: images_base_url.into(),
        }
    }

    /// Register an empty session.
    pub fn add_session(&self, session_id: &str) -> Result<(), CoreError> {
        self.sessions
            .write()
            .map_err(|e| CoreError::Internal(format!("Failed to acquire write lock: {e}")))?
            .entry(session_id.to_string())
            .or_default();
        Ok(())
    }

    /// Store a field for `(session, view, phase)`, creating the session if needed.
    pub fn insert_field(
        &self,
        session_id: &str,
        view: &str,
        phase: Phase,
        field: TemperatureField,
    ) -> Result<(), CoreError> {
        let capture = Capture {
            view: view.to_string(),
            phase,
            field,
        };
        self.put(session_id, view, phase, Ok(capture))
    }

    /// Decode CSV text and store the outcome, so a corrupt grid loads as
    /// `CaptureCorrupt` exactly as it would from disk.
    pub fn insert_csv(
        &self,
        session_id: &str,
        view: &str,
        phase: Phase,
        csv: &str,
        range: &TemperatureRange,
    ) -> Result<(), CoreError> {
        let outcome = decode_capture(view, phase, csv, None, range);
        self.put(session_id, view, phase, outcome)
    }

    fn put(
        &self,
        session_id: &str,
        view: &str,
        phase: Phase,
        outcome: Result<Capture, CoreError>,
    ) -> Result<(), CoreError> {
        self.sessions
            .write()
            .map_err(|e| CoreError::Internal(format!("Failed to acquire write lock: {e}")))?
            .entry(session_id.to_string())
            .or_default()
            .insert((view.to_string(), phase), outcome);
        Ok(())
    }
}

#[async_trait]
impl CaptureStore for MemoryCaptureStore {
    async fn list_sessions(&self) -> Result<Vec<String>, CoreError> {
        let sessions = self
            .sessions
            .read()
            .map_err(|e| CoreError::Internal(format!("Failed to acquire read lock: {e}")))?;
        Ok(sessions.keys().cloned().collect())
    }

    async fn session_exists(&self, session_id: &str) -> Result<bool, CoreError> {
        let sessions = self
            .sessions
            .read()
            .map_err(|e| CoreError::Internal(format!("Failed to acquire read lock: {e}")))?;
        Ok(sessions.contains_key(session_id))
    }

    async fn load(&self, session_id: &str, view: &str, phase: Phase) -> Result<Capture, CoreError> {
        let sessions = self
            .sessions
            .read()
            .map_err(|e| CoreError::Internal(format!("Failed to acquire read lock: {e}")))?;
        let captures = sessions
            .get(session_id)
            .ok_or_else(|| CoreError::SessionNotFound(session_id.to_string()))?;
        captures
            .get(&(view.to_string(), phase))
            .cloned()
            .unwrap_or_else(|| {
                Err(CoreError::CaptureNotFound {
                    session_id: session_id.to_string(),
                    view: view.to_string(),
                    phase,
                })
            })
    }

    fn image_ref(&self, session_id: &str, view: &str, phase: Phase) -> String {
        image_url(&self.images_base_url, session_id, view, phase)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn field() -> TemperatureField {
        TemperatureField::from_rows(vec![vec![31.0, 31.5]]).unwrap()
    }

    #[tokio::test]
    async fn stores_and_loads_fields() {
        let store = MemoryCaptureStore::default();
        store
            .insert_field("001", "LEG_FRONT", Phase::Pre, field())
            .unwrap();

        let capture = store.load("001", "LEG_FRONT", Phase::Pre).await.unwrap();
        assert_eq!(capture.field, field());
        assert_matches!(
            store.load("001", "LEG_FRONT", Phase::Post).await,
            Err(CoreError::CaptureNotFound { phase: Phase::Post, .. })
        );
        assert_matches!(
            store.load("002", "LEG_FRONT", Phase::Pre).await,
            Err(CoreError::SessionNotFound(_))
        );
    }

    #[tokio::test]
    async fn corrupt_csv_loads_as_corrupt() {
        let store = MemoryCaptureStore::default();
        store
            .insert_csv("001", "LEG_BACK", Phase::Post, "31,31\n31", &TemperatureRange::default())
            .unwrap();
        assert_matches!(
            store.load("001", "LEG_BACK", Phase::Post).await,
            Err(CoreError::CaptureCorrupt { .. })
        );
    }

    #[tokio::test]
    async fn sessions_are_listed_sorted() {
        let store = MemoryCaptureStore::default();
        store.add_session("b").unwrap();
        store.add_session("a").unwrap();
        assert_eq!(store.list_sessions().await.unwrap(), ["a", "b"]);
        assert!(store.session_exists("a").await.unwrap());
        assert!(!store.session_exists("c").await.unwrap());
    }
}
