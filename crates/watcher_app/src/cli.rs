use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Watch a classifieds search and notify a chat webhook about new offers.
#[derive(Parser, Debug)]
#[command(name = "offerwatch", version)]
pub struct Args {
    /// What to look for, e.g. "Roomba 780". Repeat the flag to watch
    /// several searches independently.
    #[arg(long = "search", required = true)]
    pub searches: Vec<String>,

    /// Time between poll cycles in seconds.
    #[arg(long = "interval-every", default_value_t = 60)]
    pub interval_every: u64,

    /// Result pages fetched per cycle.
    #[arg(long, default_value_t = 1)]
    pub pages: u32,

    /// Lower price bound passed through to the search.
    #[arg(long)]
    pub min_price: Option<u32>,

    /// Upper price bound passed through to the search.
    #[arg(long)]
    pub max_price: Option<u32>,

    /// Slack incoming-webhook URL.
    #[arg(long, env = "SLACK_WEBHOOK_URL")]
    pub webhook_url: String,

    /// Search results URL; overrides the built-in default.
    #[arg(long, env = "WATCH_URL")]
    pub base_url: Option<String>,

    /// Which persistence backing to use.
    #[arg(long, value_enum, default_value_t = StoreKind::File)]
    pub store: StoreKind,

    /// Path of the notified-identifier document (file store).
    #[arg(long, env = "SEARCHES_JSON", default_value = "data/searches.json")]
    pub state_file: PathBuf,

    /// Base URL of the run-history service (run-history store).
    #[arg(long, env = "RUN_HISTORY_URL")]
    pub run_history_url: Option<String>,

    /// Which page flavor to extract listings from.
    #[arg(long, value_enum, default_value_t = ExtractorKind::OfferList)]
    pub extractor: ExtractorKind,

    /// CSS selector for one offer row (offer-list extractor).
    #[arg(long, default_value = "div.offer-list > div")]
    pub row_selector: String,

    /// Site base URL for resolving offer links.
    #[arg(long, default_value = "https://www.tutti.ch")]
    pub site_base: String,

    /// Image host base URL for thumbnails (initial-state extractor).
    #[arg(long, default_value = "https://c.tutti.ch/images")]
    pub image_base: String,

    /// Re-attempt failed deliveries next cycle instead of marking the
    /// listing as notified anyway.
    #[arg(long)]
    pub retry_failed_deliveries: bool,

    /// Also write logs to ./offerwatch.log.
    #[arg(long)]
    pub log_file: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    /// Local JSON document keyed by search term.
    File,
    /// Reconstruct state from a remote run-history service.
    RunHistory,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractorKind {
    /// Server-rendered offer list markup.
    OfferList,
    /// Embedded `window.__INITIAL_STATE__` JSON.
    InitialState,
}
