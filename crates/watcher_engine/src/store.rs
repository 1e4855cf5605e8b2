use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;
use url::Url;
use watcher_core::NotifiedSet;

use crate::persist::AtomicDocWriter;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Persisted state exists but cannot be read or parsed. Callers treat
    /// this as "term never seen" and degrade to re-notifying what is
    /// currently visible, rather than silently notifying nothing.
    #[error("persisted state unavailable: {0}")]
    Unavailable(String),
    /// The save did not complete; notifications for the cycle are already
    /// out, so a restart before a later successful save may re-notify.
    #[error("failed to persist state: {0}")]
    Persist(String),
}

/// Durable mapping from a search term to its notified identifiers.
///
/// `save` persists the full document (all terms) atomically with respect to
/// process crash; redundant saves are harmless. `load` for a never-seen term
/// returns the empty set.
#[async_trait::async_trait]
pub trait StateStore: Send + Sync {
    async fn load(&self, term: &str) -> Result<NotifiedSet, StoreError>;
    async fn save(&self, term: &str, notified: &NotifiedSet) -> Result<(), StoreError>;
}

type Document = BTreeMap<String, Vec<String>>;

/// Whole-document JSON store on the local filesystem, shaped as
/// `{"<term>": ["<identifier>", …], …}`.
///
/// The document-level mutex makes the read-modify-write in `save` a critical
/// section even when several search terms share one file; the write itself
/// goes through the atomic temp-file-then-rename writer.
pub struct FileStore {
    path: PathBuf,
    doc_lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            doc_lock: Mutex::new(()),
        }
    }
}

fn read_document(path: &Path) -> Result<Document, StoreError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Document::new()),
        Err(err) => return Err(StoreError::Unavailable(err.to_string())),
    };
    serde_json::from_str(&content).map_err(|err| StoreError::Unavailable(err.to_string()))
}

#[async_trait::async_trait]
impl StateStore for FileStore {
    async fn load(&self, term: &str) -> Result<NotifiedSet, StoreError> {
        let _guard = self.doc_lock.lock().await;
        let path = self.path.clone();
        let document = tokio::task::spawn_blocking(move || read_document(&path))
            .await
            .map_err(|err| StoreError::Unavailable(err.to_string()))??;
        Ok(document
            .get(term)
            .map(|ids| ids.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn save(&self, term: &str, notified: &NotifiedSet) -> Result<(), StoreError> {
        // The guard is held across the whole blocking read-modify-write, so
        // the document stays a critical section even with one store shared
        // by several terms.
        let _guard = self.doc_lock.lock().await;
        let path = self.path.clone();
        let term = term.to_string();
        let ids: Vec<String> = notified.iter().map(String::from).collect();

        tokio::task::spawn_blocking(move || {
            // An unreadable document cannot be merged with; start over from
            // this term alone rather than refusing to persist at all.
            let mut document = read_document(&path).unwrap_or_default();
            document.insert(term, ids);

            let content = serde_json::to_string_pretty(&document)
                .map_err(|err| StoreError::Persist(err.to_string()))?;
            AtomicDocWriter::new(path)
                .write(&content)
                .map_err(|err| StoreError::Persist(err.to_string()))
        })
        .await
        .map_err(|err| StoreError::Persist(err.to_string()))?
    }
}

/// One crawl run as recorded by the run-history service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    pub term: String,
    pub identifiers: Vec<String>,
}

/// State store backed by an external run-history service instead of local
/// disk: `load` reconstructs the notified set from the most recent prior run
/// recorded for exactly this search term, `save` records a new run.
///
/// The service lists runs most-recent-first at `GET {endpoint}/runs`; runs
/// recorded for other terms are ignored (string equality, case-sensitive),
/// and no matching run is indistinguishable from a never-seen term.
pub struct RunHistoryStore {
    endpoint: Url,
    client: reqwest::Client,
}

impl RunHistoryStore {
    pub fn new(endpoint: &str) -> Result<Self, StoreError> {
        Ok(Self {
            endpoint: Url::parse(endpoint)
                .map_err(|err| StoreError::Unavailable(err.to_string()))?,
            client: reqwest::Client::new(),
        })
    }

    fn runs_url(&self) -> Result<Url, url::ParseError> {
        self.endpoint.join("runs")
    }
}

#[async_trait::async_trait]
impl StateStore for RunHistoryStore {
    async fn load(&self, term: &str) -> Result<NotifiedSet, StoreError> {
        let response = self
            .client
            .get(
                self.runs_url()
                    .map_err(|err| StoreError::Unavailable(err.to_string()))?,
            )
            .send()
            .await
            .map_err(|err| StoreError::Unavailable(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::Unavailable(format!(
                "run-history service returned {status}"
            )));
        }

        let runs: Vec<RunRecord> = response
            .json()
            .await
            .map_err(|err| StoreError::Unavailable(err.to_string()))?;

        Ok(runs
            .into_iter()
            .find(|run| run.term == term)
            .map(|run| run.identifiers.into_iter().collect())
            .unwrap_or_default())
    }

    async fn save(&self, term: &str, notified: &NotifiedSet) -> Result<(), StoreError> {
        let record = RunRecord {
            term: term.to_string(),
            identifiers: notified.iter().map(String::from).collect(),
        };

        let response = self
            .client
            .post(
                self.runs_url()
                    .map_err(|err| StoreError::Persist(err.to_string()))?,
            )
            .json(&record)
            .send()
            .await
            .map_err(|err| StoreError::Persist(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::Persist(format!(
                "run-history service returned {status}"
            )));
        }
        Ok(())
    }
}
