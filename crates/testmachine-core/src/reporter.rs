//! Reporter contract: turns a finished run into human-readable text.
use crate::error::ReportError;
use crate::outcome::RunResult;

/// Presentation layer invoked once a run reaches Found or Exhausted.
///
/// Errors are logged by the driver and never change the run's outcome.
pub trait Reporter: Send + Sync {
    /// Render (and emit) the result, returning the rendered text.
    fn report(&self, result: &RunResult) -> Result<String, ReportError>;
}

impl<F> Reporter for F
where
    F: Fn(&RunResult) -> Result<String, ReportError> + Send + Sync,
{
    fn report(&self, result: &RunResult) -> Result<String, ReportError> {
        self(result)
    }
}
