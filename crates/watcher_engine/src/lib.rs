//! Watcher engine: fetch, extraction, notification and persistence I/O.
mod extract;
mod fetch;
mod notify;
mod persist;
mod runner;
mod store;
mod types;

pub use extract::{ExtractError, Extractor, InitialStateExtractor, OfferListExtractor};
pub use fetch::{FetchSettings, Fetcher, ReqwestFetcher};
pub use notify::{NotifyError, Notifier, SlackWebhookNotifier};
pub use persist::{ensure_state_dir, AtomicDocWriter, PersistError};
pub use runner::{PollRunner, PollSettings};
pub use store::{FileStore, RunHistoryStore, StateStore, StoreError};
pub use types::{FailureKind, FetchError, SearchQuery};
