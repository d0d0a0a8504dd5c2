//! Run progress delivery.
//!
//! The engine reports to an [`EventSink`]: exactly one `on_start`, one
//! `on_file_processed` per processed file in processing order, and one
//! `on_completed`. Sinks are called on the engine's thread; moving work onto
//! another thread is the sink's business. An `mpsc::Sender` is a sink that
//! does exactly that, which is how the CLI prints from a separate thread:
//!
//! ```text
//! engine thread ──ClassificationEvent──▶ channel ──▶ printer thread
//! ```

use crate::types::{ClassificationResult, ClassificationSummary};
use std::sync::mpsc::Sender;

/// Observer for a classification run. Every method defaults to a no-op.
pub trait EventSink {
    fn on_start(&self, _total_files: usize) {}

    /// `index` is 1-based.
    fn on_file_processed(&self, _index: usize, _total: usize, _result: &ClassificationResult) {}

    fn on_completed(&self, _summary: &ClassificationSummary) {}
}

/// Discards every event.
impl EventSink for () {}

impl<S: EventSink + ?Sized> EventSink for &S {
    fn on_start(&self, total_files: usize) {
        (**self).on_start(total_files)
    }

    fn on_file_processed(&self, index: usize, total: usize, result: &ClassificationResult) {
        (**self).on_file_processed(index, total, result)
    }

    fn on_completed(&self, summary: &ClassificationSummary) {
        (**self).on_completed(summary)
    }
}

/// Owned form of the sink callbacks, for sending across threads.
#[derive(Debug, Clone)]
pub enum ClassificationEvent {
    Started {
        total_files: usize,
    },
    FileProcessed {
        index: usize,
        total: usize,
        result: ClassificationResult,
    },
    Completed {
        summary: ClassificationSummary,
    },
}

/// A disconnected receiver is ignored: the run continues without a listener.
impl EventSink for Sender<ClassificationEvent> {
    fn on_start(&self, total_files: usize) {
        let _ = self.send(ClassificationEvent::Started { total_files });
    }

    fn on_file_processed(&self, index: usize, total: usize, result: &ClassificationResult) {
        let _ = self.send(ClassificationEvent::FileProcessed {
            index,
            total,
            result: result.clone(),
        });
    }

    fn on_completed(&self, summary: &ClassificationSummary) {
        let _ = self.send(ClassificationEvent::Completed {
            summary: summary.clone(),
        });
    }
}
