//! Session report: typed analyses keyed by view in catalog order.

use indexmap::IndexMap;
use serde::Serialize;

use crate::analysis::ViewAnalysis;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub session_id: String,
    /// Insertion order is catalog order.
    pub analyses: IndexMap<String, ViewAnalysis>,
}

impl Report {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            analyses: IndexMap::new(),
        }
    }

    pub fn view(&self, view: &str) -> Option<&ViewAnalysis> {
        self.analyses.get(view)
    }
}
