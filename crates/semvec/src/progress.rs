//! Progress reporting.
//!
//! Training engines report through an injected [`ProgressReporter`] rather
//! than logging directly, so embedders can route progress wherever they like.
//! Reports never influence results.

use std::path::PathBuf;

use tracing::info;

/// A point of progress in a build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    /// A training cycle began.
    CycleStarted {
        /// 1-based cycle number.
        cycle: usize,
        /// Total number of cycles.
        total: usize,
    },
    /// Terms handled so far by the running pass.
    TermsProcessed {
        /// Count of terms.
        count: usize,
    },
    /// Documents handled so far by the running pass.
    DocumentsProcessed {
        /// Count of documents.
        count: usize,
    },
    /// A vector store artifact was written.
    VectorsWritten {
        /// The artifact.
        path: PathBuf,
        /// Vectors in the artifact.
        count: usize,
    },
}

/// Receives progress events from a build.
pub trait ProgressReporter {
    /// Handle one event.
    fn report(&self, event: &ProgressEvent);
}

impl<P: ProgressReporter + ?Sized> ProgressReporter for &P {
    fn report(&self, event: &ProgressEvent) {
        (**self).report(event);
    }
}

/// Forwards progress to `tracing` at info level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingProgress;

impl ProgressReporter for TracingProgress {
    fn report(&self, event: &ProgressEvent) {
        match event {
            ProgressEvent::CycleStarted { cycle, total } => {
                info!(cycle, total, "starting training cycle");
            }
            ProgressEvent::TermsProcessed { count } => info!(count, "processed terms"),
            ProgressEvent::DocumentsProcessed { count } => info!(count, "processed documents"),
            ProgressEvent::VectorsWritten { path, count } => {
                info!(path = %path.display(), count, "wrote vectors");
            }
        }
    }
}

/// Discards all progress.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn report(&self, _event: &ProgressEvent) {}
}

/// Whether `processed` items warrant a progress report: every 1,000 below
/// 10,000, every 10,000 after.
#[must_use]
pub const fn is_checkpoint(processed: usize) -> bool {
    processed % 10_000 == 0 || (processed < 10_000 && processed % 1_000 == 0)
}
