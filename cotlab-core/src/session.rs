//! The per-session "current dataset" slot.

use crate::data::{DataError, RecordSource, SourceSpec};
use crate::domain::Dataset;
use std::sync::Arc;

/// Holds at most one loaded dataset.
///
/// A successful [`Session::load`] replaces the dataset wholesale; a failed
/// load leaves the previous one active.
#[derive(Debug, Default, Clone)]
pub struct Session {
    current: Option<Arc<Dataset>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&Arc<Dataset>> {
        self.current.as_ref()
    }

    /// Fetch and normalize `spec`, then swap it in.
    pub fn load(
        &mut self,
        source: &dyn RecordSource,
        spec: &SourceSpec,
    ) -> Result<Arc<Dataset>, DataError> {
        let dataset = Arc::new(source.load(spec)?);
        self.current = Some(Arc::clone(&dataset));
        Ok(dataset)
    }

    pub fn clear(&mut self) {
        self.current = None;
    }
}
