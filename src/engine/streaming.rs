//! Async delivery of generation results.
//!
//! A generator runs on tokio's blocking pool and pushes each result into a
//! bounded channel. Dropping the `ResultStream` abandons the run: its
//! cancellation token fires, and the generator checks it before every pull
//! from the source, so a run that is withholding output stops as well.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::error::GenerationError;
use super::generate::Generator;
use super::output::GenerationResult;
use super::source::TokenSource;

type StreamItem = Result<GenerationResult, GenerationError>;

/// Async stream of generation results for one run.
pub struct ResultStream {
    receiver: mpsc::Receiver<StreamItem>,
    handle: JoinHandle<()>,
    cancel: CancellationToken,
}

impl ResultStream {
    /// Drive `generator` on the blocking pool. Must be called from within a
    /// tokio runtime.
    pub fn spawn<S>(generator: Generator<S>, buffer_size: usize) -> Self
    where
        S: TokenSource + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let generator = generator.with_cancel(cancel.clone());
        let (sender, receiver) = mpsc::channel(buffer_size.max(1));
        let handle = tokio::task::spawn_blocking(move || pump(generator, sender));
        Self {
            receiver,
            handle,
            cancel,
        }
    }

    /// Receive the next result, if available.
    pub async fn next(&mut self) -> Option<StreamItem> {
        self.receiver.recv().await
    }

    /// Collect all remaining results, stopping at the first error.
    pub async fn collect(mut self) -> Result<Vec<GenerationResult>, GenerationError> {
        let mut results = Vec::new();
        while let Some(item) = self.next().await {
            let result = item?;
            let is_final = result.is_final();
            results.push(result);
            if is_final {
                break;
            }
        }
        Ok(results)
    }

    /// Stop the run before its next pull. The stream then yields
    /// `GenerationError::Cancelled` after any results already queued.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Returns true once the producer has exited.
    pub fn is_producer_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for ResultStream {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

fn pump<S: TokenSource>(generator: Generator<S>, sender: mpsc::Sender<StreamItem>) {
    for item in generator {
        if sender.blocking_send(item).is_err() {
            tracing::debug!("result stream dropped, abandoning generation");
            return;
        }
    }
}
