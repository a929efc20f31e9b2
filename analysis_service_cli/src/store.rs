use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::{JobId, JobRecord};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("job store is full ({capacity} analyses in progress)")]
    Full { capacity: usize },

    #[error("analysis {0} already exists")]
    Duplicate(JobId),
}

/// Bounds on how much the store keeps around.
///
/// Only terminal records are ever evicted: first anything older than `ttl`,
/// then, when `capacity` is reached, the least recently updated one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoreLimits {
    pub ttl: Duration,
    pub capacity: usize,
}

impl Default for StoreLimits {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(60 * 60),
            capacity: 1024,
        }
    }
}

/// Process-wide map of analysis id to [`JobRecord`].
///
/// Reads hand out clones and writes go through [`JobStore::update`], which runs
/// under the entry's write lock, so a reader sees a record either before or
/// after a mutation and never halfway through one.
#[derive(Clone, Debug)]
pub struct JobStore {
    records: Arc<DashMap<JobId, JobRecord>>,
    limits: StoreLimits,
}

impl Default for JobStore {
    fn default() -> Self {
        Self::new(StoreLimits::default())
    }
}

impl JobStore {
    pub fn new(limits: StoreLimits) -> Self {
        Self {
            records: Arc::new(DashMap::new()),
            limits,
        }
    }

    pub fn insert(&self, record: JobRecord) -> Result<(), StoreError> {
        self.purge_expired();
        if self.records.len() >= self.limits.capacity && !self.evict_oldest_terminal() {
            return Err(StoreError::Full {
                capacity: self.limits.capacity,
            });
        }

        match self.records.entry(record.id) {
            Entry::Occupied(_) => Err(StoreError::Duplicate(record.id)),
            Entry::Vacant(slot) => {
                slot.insert(record);
                Ok(())
            }
        }
    }

    /// Snapshot of the record, if it is still tracked.
    pub fn get(&self, id: &JobId) -> Option<JobRecord> {
        self.records.get(id).map(|r| r.value().clone())
    }

    /// Applies `f` to the record atomically. `None` when the id is unknown.
    pub fn update<F, R>(&self, id: &JobId, f: F) -> Option<R>
    where
        F: FnOnce(&mut JobRecord) -> R,
    {
        self.records.get_mut(id).map(|mut r| f(r.value_mut()))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Drops terminal records whose last update is older than the ttl.
    /// Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let Ok(ttl) = chrono::Duration::from_std(self.limits.ttl) else {
            return 0;
        };
        let Some(cutoff) = Utc::now().checked_sub_signed(ttl) else {
            return 0;
        };

        let before = self.records.len();
        self.records
            .retain(|_, r| !(r.status.is_terminal() && r.updated_at < cutoff));
        let removed = before.saturating_sub(self.records.len());
        if removed > 0 {
            info!(removed, "evicted expired analyses");
        }
        removed
    }

    fn evict_oldest_terminal(&self) -> bool {
        // Collect first: removing while iterating would deadlock on the shard lock.
        let oldest = self
            .records
            .iter()
            .filter(|r| r.status.is_terminal())
            .min_by_key(|r| r.updated_at)
            .map(|r| *r.key());

        match oldest {
            Some(id) => {
                let removed = self
                    .records
                    .remove_if(&id, |_, r| r.status.is_terminal())
                    .is_some();
                if removed {
                    debug!(%id, "evicted oldest finished analysis to make room");
                }
                removed
            }
            None => false,
        }
    }

    /// Runs [`JobStore::purge_expired`] every `every` until the runtime shuts down.
    pub fn spawn_sweeper(&self, every: Duration) -> JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                store.purge_expired();
            }
        })
    }
}
