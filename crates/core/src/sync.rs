//! Snapshot synchronization for list views.
//!
//! A [`RecordSet`] holds the last good copy of a list. Every refresh replaces
//! the whole snapshot; there is no incremental merge, so fields the service
//! derives server-side never need to be recomputed locally. A failed refresh
//! leaves the previous snapshot in place.
//!
//! Closing goes through a [`CloseHandle`], which can be used while a refresh
//! holds the set. A closed set sends no further requests and drops whatever a
//! request already in flight returns.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::service::ServiceError;

/// In-memory copy of one list endpoint.
#[derive(Debug)]
pub struct RecordSet<T> {
    records: Vec<T>,
    /// Number of successful refreshes applied.
    generation: u64,
    active: Arc<AtomicBool>,
}

/// Closes a [`RecordSet`] from outside the task that is refreshing it.
#[derive(Debug, Clone)]
pub struct CloseHandle(Arc<AtomicBool>);

impl CloseHandle {
    pub fn close(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    pub fn is_closed(&self) -> bool {
        !self.0.load(Ordering::SeqCst)
    }
}

impl<T> Default for RecordSet<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            generation: 0,
            active: Arc::new(AtomicBool::new(true)),
        }
    }
}

impl<T> RecordSet<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[T] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Stop applying results. See [`CloseHandle`].
    pub fn close(&self) {
        self.close_handle().close();
    }

    pub fn close_handle(&self) -> CloseHandle {
        CloseHandle(Arc::clone(&self.active))
    }

    /// Fetch a fresh snapshot and swap it in.
    ///
    /// `fetch` is the list call; `prepare` post-processes the fetched rows
    /// (e.g. deduplication) before they replace the snapshot. On error the
    /// current snapshot is kept and the error is returned to the caller.
    pub async fn refresh<F, Fut>(
        &mut self,
        fetch: F,
        prepare: impl FnOnce(Vec<T>) -> Vec<T>,
    ) -> Result<usize, ServiceError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<T>, ServiceError>>,
    {
        if !self.is_active() {
            tracing::debug!("View closed, skipping refresh");
            return Ok(self.records.len());
        }

        let fetched = match fetch().await {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    kept = self.records.len(),
                    "Refresh failed, keeping previous snapshot"
                );
                return Err(e);
            }
        };

        if !self.is_active() {
            tracing::debug!(count = fetched.len(), "View closed, dropping late snapshot");
            return Ok(self.records.len());
        }

        self.records = prepare(fetched);
        self.generation += 1;
        tracing::debug!(
            count = self.records.len(),
            generation = self.generation,
            "Snapshot replaced"
        );
        Ok(self.records.len())
    }
}
