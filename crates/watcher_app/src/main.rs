mod cli;
mod logging;

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use watcher_core::NotifyPolicy;
use watcher_engine::{
    Extractor, Fetcher, FetchSettings, FileStore, InitialStateExtractor, Notifier,
    OfferListExtractor, PollRunner, PollSettings, ReqwestFetcher, RunHistoryStore, SearchQuery,
    SlackWebhookNotifier, StateStore,
};
use watcher_logging::{watch_error, watch_info};

use cli::{Args, ExtractorKind, StoreKind};

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    logging::initialize(if args.log_file {
        logging::LogDestination::Both
    } else {
        logging::LogDestination::Terminal
    });

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            watch_error!("{message}");
            ExitCode::FAILURE
        }
    }
}

/// Builds the component stack from the CLI configuration and runs one poll
/// loop per search term until Ctrl-C. Configuration problems are the only
/// fatal errors; everything after startup is recoverable per cycle.
async fn run(args: Args) -> Result<(), String> {
    let notifier: Arc<dyn Notifier> = Arc::new(
        SlackWebhookNotifier::new(&args.webhook_url)
            .map_err(|err| format!("webhook rejected: {err}"))?,
    );

    let mut fetch_settings = FetchSettings::default();
    if let Some(base_url) = &args.base_url {
        fetch_settings.base_url = base_url.clone();
    }
    let fetcher: Arc<dyn Fetcher> = Arc::new(
        ReqwestFetcher::new(fetch_settings).map_err(|err| format!("http client: {err}"))?,
    );

    let extractor: Arc<dyn Extractor> = match args.extractor {
        ExtractorKind::OfferList => Arc::new(
            OfferListExtractor::new(&args.row_selector, &args.site_base)
                .map_err(|err| format!("extractor configuration: {err}"))?,
        ),
        ExtractorKind::InitialState => Arc::new(
            InitialStateExtractor::new(
                &format!("{}/vi", args.site_base.trim_end_matches('/')),
                &args.image_base,
            )
            .map_err(|err| format!("extractor configuration: {err}"))?,
        ),
    };

    // One shared store: the file store serializes the whole-document
    // read-modify-write internally, so concurrent terms stay safe.
    let store: Arc<dyn StateStore> = match args.store {
        StoreKind::File => Arc::new(FileStore::new(args.state_file.clone())),
        StoreKind::RunHistory => {
            let endpoint = args
                .run_history_url
                .as_deref()
                .ok_or("--run-history-url is required with --store run-history")?;
            Arc::new(
                RunHistoryStore::new(endpoint)
                    .map_err(|err| format!("run-history endpoint rejected: {err}"))?,
            )
        }
    };

    let settings = PollSettings {
        interval: Duration::from_secs(args.interval_every),
        policy: if args.retry_failed_deliveries {
            NotifyPolicy::RetryNextCycle
        } else {
            NotifyPolicy::MarkNotified
        },
        ..PollSettings::default()
    };

    let cancel = CancellationToken::new();
    let mut handles = Vec::with_capacity(args.searches.len());
    for term in &args.searches {
        let query = SearchQuery {
            term: term.clone(),
            pages: args.pages,
            min_price: args.min_price,
            max_price: args.max_price,
        };
        let runner = PollRunner::new(
            query,
            settings.clone(),
            fetcher.clone(),
            extractor.clone(),
            notifier.clone(),
            store.clone(),
        );
        let token = cancel.clone();
        handles.push(tokio::spawn(async move { runner.run(token).await }));
    }

    watch_info!(
        "watching {} search(es) every {}s",
        args.searches.len(),
        args.interval_every
    );

    tokio::signal::ctrl_c()
        .await
        .map_err(|err| format!("failed to listen for shutdown signal: {err}"))?;
    watch_info!("shutdown requested, stopping poll loops");
    cancel.cancel();

    for handle in handles {
        if let Err(err) = handle.await {
            watch_error!("poll loop task failed: {err}");
        }
    }

    Ok(())
}
