//! Error types for sockgen-sync.

use thiserror::Error;

use sockgen_core::PublishError;
use sockgen_renderer::RenderError;

/// All errors that can abort a reconciliation cycle.
///
/// Scanner failures never appear here — the scanner degrades per entry and
/// always produces a (possibly empty) host map. Trigger failures are logged
/// inside the cycle and never abort it.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Template read, parse, or render failure.
    #[error("render error: {0}")]
    Render(#[from] RenderError),

    /// Output publication failure.
    #[error("publish error: {0}")]
    Publish(#[from] PublishError),
}
