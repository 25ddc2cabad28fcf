//! What the user is currently looking at.

use crate::error::{WorkflowError, WorkflowResult};
use crate::workflow::Resolution;

/// The most recent successful [`Resolution`] plus the latest failure.
///
/// A failed request never clears results that are already on screen.
#[derive(Debug, Default)]
pub struct ResultsView {
    current: Option<Resolution>,
    last_error: Option<String>,
    generation: u64,
}

impl ResultsView {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome of a request. On success the new resolution
    /// replaces the old one; on failure the error is kept for display and
    /// handed back to the caller.
    pub fn apply(&mut self, outcome: WorkflowResult<Resolution>) -> Result<(), WorkflowError> {
        match outcome {
            Ok(resolution) => {
                self.current = Some(resolution);
                self.last_error = None;
                self.generation += 1;
                Ok(())
            }
            Err(e) => {
                self.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    #[must_use]
    pub fn current(&self) -> Option<&Resolution> {
        self.current.as_ref()
    }

    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Number of resolutions shown so far.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }
}
