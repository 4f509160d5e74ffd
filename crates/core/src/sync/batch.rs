//! Chunked sequential processing with a cooldown between chunks.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info};

/// Lists at or below this size never report progress.
pub const PROGRESS_THRESHOLD: usize = 100;

/// Processes one item of a batch run.
#[async_trait]
pub trait BatchHandler<T: Sync>: Send + Sync {
    type Output: Send;

    async fn handle(&self, item: &T) -> Self::Output;
}

/// What a batch run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReport<O> {
    /// Handler outputs, in item order.
    pub outputs: Vec<O>,
    pub chunks: usize,
    pub cooldowns: usize,
}

/// Emits a progress percentage each time a further 10% of a large list has
/// been processed.
#[derive(Debug)]
pub struct ProgressTracker {
    total: usize,
    last_reported: usize,
}

impl ProgressTracker {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            last_reported: 0,
        }
    }

    /// Record that `processed` items are done. Returns the percentage when it
    /// should be reported.
    pub fn advance(&mut self, processed: usize) -> Option<usize> {
        if self.total <= PROGRESS_THRESHOLD {
            return None;
        }
        let percent = processed * 100 / self.total;
        if percent >= self.last_reported + 10 {
            self.last_reported = percent;
            Some(percent)
        } else {
            None
        }
    }
}

/// Splits a list into fixed-size chunks and feeds them to a handler one item
/// at a time.
#[derive(Debug, Clone)]
pub struct BatchCoordinator {
    batch_size: usize,
    delay: Duration,
}

impl BatchCoordinator {
    pub fn new(batch_size: usize, delay: Duration) -> Self {
        Self {
            batch_size: batch_size.max(1),
            delay,
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Number of chunks a list of `len` items is split into.
    pub fn chunk_count(&self, len: usize) -> usize {
        len.div_ceil(self.batch_size)
    }

    /// Visit every item exactly once, in order. Sleeps between chunks, never
    /// after the last one.
    pub async fn run<T, H>(&self, label: &str, items: &[T], handler: &H) -> BatchReport<H::Output>
    where
        T: Sync,
        H: BatchHandler<T> + ?Sized,
    {
        let total = items.len();
        let chunks = self.chunk_count(total);
        let mut outputs = Vec::with_capacity(total);
        let mut progress = ProgressTracker::new(total);
        let mut cooldowns = 0;

        for (index, chunk) in items.chunks(self.batch_size).enumerate() {
            debug!(
                "{}: batch {}/{} ({} items)",
                label,
                index + 1,
                chunks,
                chunk.len()
            );

            for item in chunk {
                outputs.push(handler.handle(item).await);

                if let Some(percent) = progress.advance(outputs.len()) {
                    info!(
                        "{}: progress {}% ({}/{} items, batch {}/{})",
                        label,
                        percent,
                        outputs.len(),
                        total,
                        index + 1,
                        chunks
                    );
                }
            }

            if index + 1 < chunks {
                info!(
                    "{}: batch {}/{} done, cooling down for {:?}",
                    label,
                    index + 1,
                    chunks,
                    self.delay
                );
                tokio::time::sleep(self.delay).await;
                cooldowns += 1;
            }
        }

        BatchReport {
            outputs,
            chunks,
            cooldowns,
        }
    }
}
