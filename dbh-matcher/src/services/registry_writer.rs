//! Background registry writer
//!
//! Resolutions must not wait on SQLite, so upserts are queued on a bounded
//! channel and applied in order by one worker task. A full queue drops the
//! write: the mapping is only a cache and will be re-learned next time.

use crate::db::TrackRegistry;
use crate::models::RegistryEntry;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

#[derive(Debug)]
enum WriteCommand {
    Upsert(RegistryEntry),
    Flush(oneshot::Sender<()>),
}

/// Counters reported when the worker exits
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriterStats {
    pub applied: u64,
    pub failed: u64,
}

/// Cloneable sender side of the writer queue
#[derive(Clone)]
pub struct RegistryWriteHandle {
    tx: mpsc::Sender<WriteCommand>,
}

impl RegistryWriteHandle {
    /// Queue an upsert without waiting
    ///
    /// Returns `false` if the write was dropped (queue full or writer gone).
    pub fn schedule(&self, entry: RegistryEntry) -> bool {
        let target_id = entry.target_id.clone();
        match self.tx.try_send(WriteCommand::Upsert(entry)) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(target_id = %target_id, "Registry write queue full, dropping write");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::warn!(target_id = %target_id, "Registry writer stopped, dropping write");
                false
            }
        }
    }

    /// Wait until every write queued before this call has been applied
    pub async fn flush(&self) {
        let (done_tx, done_rx) = oneshot::channel();
        if self.tx.send(WriteCommand::Flush(done_tx)).await.is_ok() {
            let _ = done_rx.await;
        }
    }
}

/// Owner of the writer task
pub struct RegistryWriter {
    handle: RegistryWriteHandle,
    shutdown: CancellationToken,
    worker: JoinHandle<WriterStats>,
}

impl RegistryWriter {
    /// Start the worker with room for `capacity` pending writes
    pub fn spawn(registry: TrackRegistry, capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let shutdown = CancellationToken::new();
        let worker = tokio::spawn(run_worker(registry, rx, shutdown.clone()));

        Self {
            handle: RegistryWriteHandle { tx },
            shutdown,
            worker,
        }
    }

    pub fn handle(&self) -> RegistryWriteHandle {
        self.handle.clone()
    }

    /// Stop accepting writes, apply whatever is already queued, join the task
    pub async fn shutdown(self) -> WriterStats {
        self.shutdown.cancel();
        match self.worker.await {
            Ok(stats) => stats,
            Err(e) => {
                tracing::error!(error = %e, "Registry writer task failed");
                WriterStats::default()
            }
        }
    }
}

async fn run_worker(
    registry: TrackRegistry,
    mut rx: mpsc::Receiver<WriteCommand>,
    shutdown: CancellationToken,
) -> WriterStats {
    let mut stats = WriterStats::default();

    loop {
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            command = rx.recv() => match command {
                Some(command) => apply(&registry, command, &mut stats).await,
                None => break,
            },
        }
    }

    rx.close();
    while let Ok(command) = rx.try_recv() {
        apply(&registry, command, &mut stats).await;
    }

    tracing::debug!(applied = stats.applied, failed = stats.failed, "Registry writer stopped");
    stats
}

async fn apply(registry: &TrackRegistry, command: WriteCommand, stats: &mut WriterStats) {
    match command {
        WriteCommand::Upsert(entry) => match registry.upsert(&entry).await {
            Ok(()) => stats.applied += 1,
            Err(e) => {
                stats.failed += 1;
                tracing::warn!(target_id = %entry.target_id, error = %e, "Registry write failed");
            }
        },
        WriteCommand::Flush(done) => {
            let _ = done.send(());
        }
    }
}
