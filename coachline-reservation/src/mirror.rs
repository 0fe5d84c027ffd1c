use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use coachline_core::models::BookingIndexRow;
use coachline_core::repository::BookingIndex;
use tokio::sync::mpsc;

/// One relational-mirror write.
#[derive(Debug, Clone)]
pub enum MirrorJob {
    Upsert(BookingIndexRow),
    MarkPaid { pnr: String, paid_at: DateTime<Utc> },
}

/// Counters for the mirror queue. Failures are swallowed by the callers'
/// success path, so this is where they become observable.
#[derive(Debug, Default)]
pub struct MirrorStats {
    pub completed: AtomicU64,
    pub failed: AtomicU64,
    pub dropped: AtomicU64,
}

/// Best-effort writer mirroring booking projections into the relational
/// store. Jobs run on a single background task behind a bounded queue; a
/// full queue drops the job rather than blocking the authoritative write.
#[derive(Clone)]
pub struct MirrorWriter {
    tx: mpsc::Sender<MirrorJob>,
    stats: Arc<MirrorStats>,
}

impl MirrorWriter {
    pub fn spawn(index: Arc<dyn BookingIndex>, capacity: usize) -> Self {
        let (tx, mut rx) = mpsc::channel::<MirrorJob>(capacity);
        let stats = Arc::new(MirrorStats::default());
        let worker_stats = stats.clone();

        tokio::spawn(async move {
            while let Some(job) = rx.recv().await {
                let result = match &job {
                    MirrorJob::Upsert(row) => index.upsert(row).await,
                    MirrorJob::MarkPaid { pnr, paid_at } => index.mark_paid(pnr, *paid_at).await,
                };
                match result {
                    Ok(()) => {
                        worker_stats.completed.fetch_add(1, Ordering::Relaxed);
                    }
                    Err(e) => {
                        worker_stats.failed.fetch_add(1, Ordering::Relaxed);
                        tracing::warn!("Mirror write failed: {}", e);
                    }
                }
            }
        });

        Self { tx, stats }
    }

    /// Queue a mirror write. Never blocks and never fails the caller.
    pub fn enqueue(&self, job: MirrorJob) {
        if self.tx.try_send(job).is_err() {
            self.stats.dropped.fetch_add(1, Ordering::Relaxed);
            tracing::warn!("Mirror queue full, dropping write");
        }
    }

    pub fn stats(&self) -> &MirrorStats {
        &self.stats
    }
}
