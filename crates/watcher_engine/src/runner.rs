use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use watcher_logging::{watch_debug, watch_error, watch_info, watch_warn};

use watcher_core::{update, Effect, Listing, Msg, NotifiedSet, NotifyPolicy, WatchState};

use crate::{Extractor, Fetcher, Notifier, SearchQuery, StateStore, StoreError};

#[derive(Debug, Clone)]
pub struct PollSettings {
    /// Pause between cycles.
    pub interval: Duration,
    /// Upper bound on each blocking I/O call (fetch, notify, persist).
    /// A timeout is a recoverable per-cycle failure, never a crash.
    pub io_timeout: Duration,
    pub policy: NotifyPolicy,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
            io_timeout: Duration::from_secs(45),
            policy: NotifyPolicy::default(),
        }
    }
}

/// Drives one search term's poll loop: fetch, extract, dedupe, notify,
/// persist, sleep, forever.
///
/// The loop is strictly sequential; a cycle completes (including the sleep)
/// before the next begins. The pure state machine in `watcher_core` decides
/// every transition; this runner only executes its effects. Cancellation is
/// honored promptly while sleeping; a persist that has started runs to
/// completion.
pub struct PollRunner {
    query: SearchQuery,
    settings: PollSettings,
    fetcher: Arc<dyn Fetcher>,
    extractor: Arc<dyn Extractor>,
    notifier: Arc<dyn Notifier>,
    store: Arc<dyn StateStore>,
}

impl PollRunner {
    pub fn new(
        query: SearchQuery,
        settings: PollSettings,
        fetcher: Arc<dyn Fetcher>,
        extractor: Arc<dyn Extractor>,
        notifier: Arc<dyn Notifier>,
        store: Arc<dyn StateStore>,
    ) -> Self {
        Self {
            query,
            settings,
            fetcher,
            extractor,
            notifier,
            store,
        }
    }

    /// Runs until the token is cancelled.
    pub async fn run(&self, cancel: CancellationToken) {
        let term = self.query.term.clone();
        let notified = self.load_initial(&term).await;
        watch_info!(
            "[{term}] starting poll loop with {} known identifiers",
            notified.len()
        );

        let mut state = WatchState::new(&term, notified, self.settings.policy);
        let mut pending: VecDeque<Effect> = VecDeque::new();

        let (next, effects) = update(state, Msg::PollDue);
        state = next;
        pending.extend(effects);

        while let Some(effect) = pending.pop_front() {
            if cancel.is_cancelled() {
                watch_info!("[{term}] cancelled, exiting poll loop");
                return;
            }

            let msg = match effect {
                Effect::Fetch => {
                    watcher_logging::set_poll_cycle(state.cycle());
                    self.run_fetch().await
                }
                Effect::Notify(listing) => self.run_notify(&term, listing).await,
                Effect::Persist(notified) => self.run_persist(&term, &notified).await,
                Effect::Sleep => {
                    tokio::select! {
                        _ = cancel.cancelled() => {
                            watch_info!("[{term}] cancelled while sleeping, exiting poll loop");
                            return;
                        }
                        _ = tokio::time::sleep(self.settings.interval) => Msg::SleepFinished,
                    }
                }
            };

            let (next, effects) = update(state, msg);
            state = next;
            pending.extend(effects);
        }
    }

    /// Loads prior state; an unavailable store degrades to the empty set so
    /// the loop over-notifies instead of silently dropping listings.
    async fn load_initial(&self, term: &str) -> NotifiedSet {
        match timeout(self.settings.io_timeout, self.store.load(term)).await {
            Ok(Ok(notified)) => notified,
            Ok(Err(StoreError::Unavailable(reason))) => {
                watch_warn!("[{term}] persisted state unavailable ({reason}), starting empty");
                NotifiedSet::new()
            }
            Ok(Err(err)) => {
                watch_warn!("[{term}] state load failed ({err}), starting empty");
                NotifiedSet::new()
            }
            Err(_) => {
                watch_warn!("[{term}] state load timed out, starting empty");
                NotifiedSet::new()
            }
        }
    }

    /// Fetches every configured page and extracts one combined batch.
    /// Page order is preserved so the batch stays newest-first overall.
    async fn run_fetch(&self) -> Msg {
        let term = &self.query.term;
        let mut batch: Vec<Listing> = Vec::new();

        for page in 1..=self.query.pages.max(1) {
            let body = match timeout(
                self.settings.io_timeout,
                self.fetcher.fetch_page(&self.query, page),
            )
            .await
            {
                Ok(Ok(body)) => body,
                Ok(Err(err)) => {
                    watch_warn!("[{term}] fetch of page {page} failed: {err}");
                    return Msg::FetchFailed;
                }
                Err(_) => {
                    watch_warn!("[{term}] fetch of page {page} timed out");
                    return Msg::FetchFailed;
                }
            };

            match self.extractor.extract(&body) {
                Ok(listings) => {
                    watch_debug!("[{term}] page {page}: {} listings", listings.len());
                    batch.extend(listings);
                }
                Err(err) => {
                    watch_warn!("[{term}] extraction of page {page} failed: {err}");
                    return Msg::FetchFailed;
                }
            }
        }

        Msg::FetchSucceeded { batch }
    }

    /// A failed delivery never aborts the cycle; the remaining listings are
    /// still attempted and the policy decides whether the identifier stays
    /// marked as notified.
    async fn run_notify(&self, term: &str, listing: Listing) -> Msg {
        let identifier = listing.identifier.clone();
        let delivered = match timeout(self.settings.io_timeout, self.notifier.notify(&listing)).await
        {
            Ok(Ok(())) => {
                watch_info!("[{term}] notified: {}", listing.title);
                true
            }
            Ok(Err(err)) => {
                watch_warn!("[{term}] delivery of {identifier} failed: {err}");
                false
            }
            Err(_) => {
                watch_warn!("[{term}] delivery of {identifier} timed out");
                false
            }
        };

        Msg::NotifyResolved {
            identifier,
            delivered,
        }
    }

    async fn run_persist(&self, term: &str, notified: &NotifiedSet) -> Msg {
        let persisted = match timeout(
            self.settings.io_timeout,
            self.store.save(term, notified),
        )
        .await
        {
            Ok(Ok(())) => true,
            Ok(Err(err)) => {
                // Notifications already went out; a restart before the next
                // successful save may repeat them (at-least-once).
                watch_error!("[{term}] persist failed: {err}");
                false
            }
            Err(_) => {
                watch_error!("[{term}] persist timed out");
                false
            }
        };

        Msg::PersistResolved { persisted }
    }
}
