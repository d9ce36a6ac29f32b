//! Background loading off the calling thread.
//!
//! [`spawn_load`] runs [`load_part`] on a dedicated thread. Progress events
//! stream back over a channel and [`AnalysisJob::wait`] blocks until the
//! final result. Each job owns its input and produces its own records; only
//! the geometry cache is shared between jobs.
//!
//! There is no mid-flight cancellation. Dropping the job detaches the thread
//! and discards its result.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, TryIter};
use tracing::{debug, error};

use crate::cache::GeometryCache;
use crate::error::{QuoteError, QuoteResult};
use crate::pipeline::{LoadedPart, load_part};
use crate::progress::{Progress, ProgressCallback};
use crate::stl::IngestOptions;

const WORKER_THREAD_NAME: &str = "mesh-quote-load";

/// Handle to a background load.
#[derive(Debug)]
pub struct AnalysisJob {
    file_name: String,
    progress: Receiver<Progress>,
    handle: JoinHandle<QuoteResult<LoadedPart>>,
}

impl AnalysisJob {
    /// Progress events reported so far; closes when the worker exits.
    pub fn progress(&self) -> &Receiver<Progress> {
        &self.progress
    }

    /// Drain events that have already arrived.
    pub fn pending_progress(&self) -> TryIter<'_, Progress> {
        self.progress.try_iter()
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Block until the load completes.
    ///
    /// A worker that panicked is reported as `WorkerFailed`.
    pub fn wait(self) -> QuoteResult<LoadedPart> {
        match self.handle.join() {
            Ok(result) => result,
            Err(payload) => {
                let details = panic_message(payload.as_ref());
                error!(file_name = %self.file_name, %details, "Load worker panicked");
                Err(QuoteError::WorkerFailed { details })
            }
        }
    }
}

/// Start loading `bytes` on a background thread.
pub fn spawn_load(
    bytes: impl Into<Arc<[u8]>>,
    file_name: impl Into<String>,
    cache: Option<Arc<GeometryCache>>,
    options: IngestOptions,
) -> QuoteResult<AnalysisJob> {
    let bytes: Arc<[u8]> = bytes.into();
    let file_name = file_name.into();
    let (tx, rx) = crossbeam_channel::unbounded();

    let worker_name = file_name.clone();
    let handle = thread::Builder::new()
        .name(WORKER_THREAD_NAME.to_string())
        .spawn(move || {
            let callback: ProgressCallback = Box::new(move |p: &Progress| {
                // Receiver gone means nobody is listening
                let _ = tx.send(p.clone());
            });
            debug!(file_name = %worker_name, bytes = bytes.len(), "Load worker started");
            load_part(
                &bytes,
                &worker_name,
                None,
                cache.as_deref(),
                &options,
                Some(&callback),
            )
        })
        .map_err(|e| QuoteError::WorkerFailed {
            details: format!("could not spawn worker thread: {}", e),
        })?;

    Ok(AnalysisJob {
        file_name,
        progress: rx,
        handle,
    })
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "worker panicked".to_string()
    }
}
