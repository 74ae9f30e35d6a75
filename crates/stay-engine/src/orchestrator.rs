//! Async orchestration: bounded concurrent fetching, single-flight runs and
//! persistence of the results.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::config::SyncConfig;
use crate::editor::DirectiveBook;
use crate::emitter::CalendarMeta;
use crate::error::{Result, SyncError};
use crate::pipeline::{reconcile_payloads, FeedPayload, Reconciliation, RunError, RunInputs};
use crate::source::FeedSource;
use crate::store::{CalendarStore, StoreKey};

/// Whether a run talks to the feeds at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchMode {
    #[default]
    Online,
    /// Resolve from the stored import calendar only.
    Offline,
}

/// Fetch every source with at most `max_parallel` in flight and a per-fetch timeout.
///
/// Results keep the order of `sources`. A slow or failing source only costs its own
/// slot; the call returns once every fetch has completed or timed out.
pub async fn fetch_all(
    sources: &[Arc<dyn FeedSource>],
    max_parallel: usize,
    timeout: Duration,
) -> (Vec<FeedPayload>, Vec<SyncError>) {
    let semaphore = Arc::new(Semaphore::new(max_parallel.max(1)));
    let mut tasks = JoinSet::new();

    for (index, feed) in sources.iter().enumerate() {
        let feed = Arc::clone(feed);
        let semaphore = Arc::clone(&semaphore);
        tasks.spawn(async move {
            let id = feed.id().to_string();
            let result = match semaphore.acquire_owned().await {
                Ok(_permit) => match tokio::time::timeout(timeout, feed.fetch()).await {
                    Ok(result) => result,
                    Err(_) => Err(SyncError::Fetch {
                        source_id: id.clone(),
                        message: format!("timed out after {}s", timeout.as_secs_f32()),
                    }),
                },
                Err(_) => Err(SyncError::Fetch {
                    source_id: id.clone(),
                    message: "fetch pool closed".to_string(),
                }),
            };
            (index, id, feed.source(), result)
        });
    }

    let mut done = Vec::with_capacity(sources.len());
    let mut lost = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(entry) => done.push(entry),
            Err(e) => lost.push(e.to_string()),
        }
    }

    // A task that panicked or was cancelled still counts as a failed source.
    if !lost.is_empty() {
        let finished: HashSet<usize> = done.iter().map(|(index, ..)| *index).collect();
        let mut reasons = lost.into_iter();
        for (index, feed) in sources.iter().enumerate() {
            if finished.contains(&index) {
                continue;
            }
            let reason = reasons.next().unwrap_or_default();
            warn!(source = %feed.id(), error = %reason, "fetch task failed to complete");
            done.push((
                index,
                feed.id().to_string(),
                feed.source(),
                Err(SyncError::Fetch {
                    source_id: feed.id().to_string(),
                    message: format!("fetch task failed to complete: {reason}"),
                }),
            ));
        }
    }
    done.sort_by_key(|(index, ..)| *index);

    let mut payloads = Vec::new();
    let mut failures = Vec::new();
    for (_, id, source, result) in done {
        match result {
            Ok(bytes) => {
                info!(source = %id, bytes = bytes.len(), "fetched feed");
                payloads.push(FeedPayload { id, source, bytes });
            }
            Err(e) => {
                warn!(source = %id, error = %e, "feed excluded from this run");
                failures.push(e);
            }
        }
    }
    (payloads, failures)
}

/// Runs reconciliation for one target calendar.
///
/// Clones share the same lock, so hand clones to every caller that may trigger a
/// run for this calendar; at most one run (or directive edit) proceeds at a time.
#[derive(Clone)]
pub struct Reconciler {
    target: String,
    store: Arc<dyn CalendarStore>,
    config: SyncConfig,
    lock: Arc<Mutex<()>>,
}

impl Reconciler {
    pub fn new(target: impl Into<String>, store: Arc<dyn CalendarStore>, config: SyncConfig) -> Self {
        Self {
            target: target.into(),
            store,
            config,
            lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Wait for any in-flight run on this calendar, then run.
    pub async fn run(
        &self,
        sources: &[Arc<dyn FeedSource>],
        mode: FetchMode,
        today: NaiveDate,
    ) -> std::result::Result<Reconciliation, RunError> {
        let _guard = self.lock.lock().await;
        self.run_locked(sources, mode, today).await
    }

    /// Like [`Reconciler::run`] but refuses with `SyncError::Busy` instead of waiting.
    pub async fn try_run(
        &self,
        sources: &[Arc<dyn FeedSource>],
        mode: FetchMode,
        today: NaiveDate,
    ) -> std::result::Result<Reconciliation, RunError> {
        let _guard = self
            .lock
            .try_lock()
            .map_err(|_| SyncError::Busy(self.target.clone()))?;
        self.run_locked(sources, mode, today).await
    }

    async fn run_locked(
        &self,
        sources: &[Arc<dyn FeedSource>],
        mode: FetchMode,
        today: NaiveDate,
    ) -> std::result::Result<Reconciliation, RunError> {
        info!(target_calendar = %self.target, sources = sources.len(), ?mode, "starting reconciliation");

        let (feeds, fetch_failures) = match mode {
            FetchMode::Online => {
                fetch_all(
                    sources,
                    self.config.max_parallel_fetches,
                    Duration::from_secs(self.config.fetch_timeout_secs),
                )
                .await
            }
            FetchMode::Offline => (Vec::new(), Vec::new()),
        };

        let directives = self.load(StoreKey::Manual).await?;
        let prior_import = match self.load(StoreKey::Import).await {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                warn!(error = %e, "cached import calendar unavailable");
                None
            }
        };

        let inputs = RunInputs {
            feeds,
            fetch_failures,
            directives,
            cached_import: prior_import.clone().flatten(),
        };
        let outcome = reconcile_payloads(&inputs, &self.config, today)?;

        // Both payloads are fully rendered before anything is written.
        let persist_error =
            |e: SyncError| RunError::new(SyncError::Serialization(e.to_string()), outcome.counts.clone());
        self.save(StoreKey::Import, outcome.import.clone().into_bytes())
            .await
            .map_err(persist_error)?;
        if let Err(e) = self.save(StoreKey::Master, outcome.master.clone().into_bytes()).await {
            self.restore_import(prior_import).await;
            return Err(persist_error(e));
        }

        info!(target_calendar = %self.target, events = outcome.counts.events_emitted, "calendar written");
        Ok(outcome)
    }

    /// Put the import calendar back the way it was before this run.
    ///
    /// `None` means the previous import could not be read, so there is nothing to restore.
    async fn restore_import(&self, prior: Option<Option<Vec<u8>>>) {
        let restored = match prior {
            Some(Some(bytes)) => self.save(StoreKey::Import, bytes).await,
            Some(None) => self.remove(StoreKey::Import).await,
            None => {
                warn!(target_calendar = %self.target, "previous import unknown, new import kept");
                return;
            }
        };
        if let Err(e) = restored {
            warn!(target_calendar = %self.target, error = %e, "could not restore import calendar");
        }
    }

    async fn load(&self, key: StoreKey) -> Result<Option<Vec<u8>>> {
        let store = Arc::clone(&self.store);
        blocking(move || store.load(key)).await
    }

    async fn save(&self, key: StoreKey, bytes: Vec<u8>) -> Result<()> {
        let store = Arc::clone(&self.store);
        blocking(move || store.store(key, &bytes)).await
    }

    async fn remove(&self, key: StoreKey) -> Result<()> {
        let store = Arc::clone(&self.store);
        blocking(move || store.remove(key)).await
    }

    /// Load the directive book, apply `edit`, and store it back, under the run lock.
    pub async fn edit_directives<F, T>(&self, edit: F) -> Result<T>
    where
        F: FnOnce(&mut DirectiveBook) -> T,
    {
        let _guard = self.lock.lock().await;
        let tz = self.config.tz()?;
        let stored = self.load(StoreKey::Manual).await?;
        let mut book = DirectiveBook::load(stored.as_deref(), tz)?;
        let result = edit(&mut book);
        let meta = CalendarMeta::new(&self.config.calendar_name, &self.config.timezone);
        self.save(StoreKey::Manual, book.to_payload(&meta)?.into_bytes()).await?;
        Ok(result)
    }
}

/// Store calls may touch the disk; keep them off the async workers.
async fn blocking<T, F>(call: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(call)
        .await
        .map_err(|e| SyncError::Storage(format!("store task failed: {e}")))?
}
