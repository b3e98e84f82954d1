//! Store worker thread
//!
//! The game thread never touches SQLite. Requests are boxed closures sent to
//! a dedicated thread over a bounded channel; the caller waits a bounded time
//! for the reply. A request that times out still runs to completion on the
//! worker, its answer is just dropped.

use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{bounded, RecvTimeoutError, Sender, TrySendError};

use super::{
    RecordEvent, ReputationRecord, ReputationStore, StoreError, StoreResult, UpsertOutcome,
};
use crate::bans::BanState;

/// A request executed on the worker thread
type Job = Box<dyn FnOnce(&mut ReputationStore) + Send + 'static>;

/// Handle to the store worker
#[derive(Debug)]
pub struct StoreClient {
    sender: Option<Sender<Job>>,
    worker: Option<JoinHandle<()>>,
    timeout: Duration,
}

impl StoreClient {
    /// Move `store` onto a new worker thread
    pub fn spawn(store: ReputationStore, capacity: usize, timeout: Duration) -> StoreResult<Self> {
        let (sender, receiver) = bounded::<Job>(capacity);

        let worker = std::thread::Builder::new()
            .name("urtadmin-store".to_string())
            .spawn(move || {
                let mut store = store;
                for job in receiver.iter() {
                    job(&mut store);
                }
                tracing::debug!("Store worker stopped");
            })?;

        tracing::debug!(capacity, ?timeout, "Store worker started");
        Ok(Self {
            sender: Some(sender),
            worker: Some(worker),
            timeout,
        })
    }

    /// Open the database at `path` and start a worker for it
    pub fn open(
        path: &str,
        lookup_limit: usize,
        capacity: usize,
        timeout: Duration,
    ) -> StoreResult<Self> {
        let store = ReputationStore::open(path)?.with_lookup_limit(lookup_limit);
        Self::spawn(store, capacity, timeout)
    }

    /// Run `f` on the worker and wait for its result.
    ///
    /// Fails fast with `QueueFull` instead of blocking when the queue is at
    /// capacity.
    pub fn call<T, F>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&mut ReputationStore) -> StoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let sender = self.sender.as_ref().ok_or(StoreError::Disconnected)?;
        let (reply_tx, reply_rx) = bounded(1);

        let job: Job = Box::new(move |store| {
            // The caller may have given up already
            let _ = reply_tx.send(f(store));
        });

        match sender.try_send(job) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                tracing::warn!("Store queue full, dropping request");
                return Err(StoreError::QueueFull);
            }
            Err(TrySendError::Disconnected(_)) => {
                tracing::error!("Store worker disconnected");
                return Err(StoreError::Disconnected);
            }
        }

        match reply_rx.recv_timeout(self.timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => {
                tracing::error!("Store request timed out after {:?}", self.timeout);
                Err(StoreError::Timeout(self.timeout))
            }
            Err(RecvTimeoutError::Disconnected) => Err(StoreError::Disconnected),
        }
    }

    pub fn upsert(&self, guid: &str, event: RecordEvent, now: i64) -> StoreResult<UpsertOutcome> {
        let guid = guid.to_string();
        self.call(move |store| store.upsert(&guid, &event, now))
    }

    pub fn record(&self, guid: &str) -> StoreResult<Option<ReputationRecord>> {
        let guid = guid.to_string();
        self.call(move |store| store.record(&guid))
    }

    pub fn record_by_id(&self, id: i32) -> StoreResult<Option<ReputationRecord>> {
        self.call(move |store| store.record_by_id(id))
    }

    pub fn level(&self, guid: &str) -> StoreResult<Option<i32>> {
        let guid = guid.to_string();
        self.call(move |store| store.level(&guid))
    }

    pub fn guid_by_id(&self, id: i32) -> StoreResult<Option<String>> {
        self.call(move |store| store.guid_by_id(id))
    }

    pub fn ban_state(&self, guid: &str, now: i64) -> StoreResult<Option<BanState>> {
        let guid = guid.to_string();
        self.call(move |store| super::ban_state_of(store, &guid, now))
    }

    pub fn find_by_name(&self, fragment: &str) -> StoreResult<Vec<ReputationRecord>> {
        let fragment = fragment.to_string();
        self.call(move |store| store.find_by_name(&fragment))
    }

    pub fn find_by_ip(&self, ip: &str) -> StoreResult<Vec<ReputationRecord>> {
        let ip = ip.to_string();
        self.call(move |store| store.find_by_ip(&ip))
    }

    pub fn find_bans_by_name(&self, fragment: &str, now: i64) -> StoreResult<Vec<ReputationRecord>> {
        let fragment = fragment.to_string();
        self.call(move |store| store.find_bans_by_name(&fragment, now))
    }

    pub fn alias_owners(&self, name: &str) -> StoreResult<Vec<String>> {
        let name = name.to_string();
        self.call(move |store| store.alias_owners(&name))
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Stop accepting requests and wait for queued ones to finish
    pub fn shutdown(&mut self) {
        self.sender.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::error!("Store worker panicked");
            }
        }
    }
}

impl Drop for StoreClient {
    fn drop(&mut self) {
        self.shutdown();
    }
}
