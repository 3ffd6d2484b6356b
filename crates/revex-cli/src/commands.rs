//! Command handlers for the CLI.
//!
//! These are called from `main` after config and logging are established.
//! `extract` and `resume` stand up the full pipeline (HTTP session, file
//! store, event bus, summary mirror); `export`, `status`, and `reset` work
//! against the persisted slots alone and never touch the network.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::warn;

use revex_core::{
    AppConfig, ExtractionEvent, ExtractionSettings, ProductInfo, SessionState, SessionSummary,
};
use revex_scraper::{
    build_client, export_filename, get_json, load_resume_plan, spawn_mirror, write_csv,
    Coordinator, EventBus, HttpSession, JsonFileStore, PageSession, SelectorConfig, Selectors,
    StateStore, STATE_KEY, SUMMARY_KEY,
};

/// Selector chains for a run: the built-in defaults, or the defaults with
/// the chains named in a user-supplied JSON file overridden.
///
/// # Errors
///
/// Returns an error when the file cannot be read, is not valid JSON, or a
/// named chain ends up with no compilable candidate.
pub(crate) fn load_selectors(path: Option<&Path>) -> anyhow::Result<Selectors> {
    let config = match path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .map_err(|e| anyhow::anyhow!("cannot read selector file {}: {e}", path.display()))?;
            serde_json::from_str::<SelectorConfig>(&raw)
                .map_err(|e| anyhow::anyhow!("invalid selector file {}: {e}", path.display()))?
        }
        None => SelectorConfig::default(),
    };
    Ok(Selectors::compile(&config)?)
}

/// Run a full extraction starting from `url`, resuming a persisted
/// interrupted run unless `fresh` discards it first.
///
/// Progress events stream to stdout while the run is driven; when `out` is
/// given the accumulated reviews are exported there on completion, otherwise
/// they stay persisted for a later `export`.
///
/// # Errors
///
/// Returns an error when the page cannot be fetched, the page holds no
/// reviews, a mid-run navigation or persistence step fails, or the export
/// file cannot be written. Partial results stay persisted on mid-run errors.
pub(crate) async fn run_extract(
    config: &AppConfig,
    url: &str,
    settings: ExtractionSettings,
    selectors: Selectors,
    out: Option<&Path>,
    fresh: bool,
) -> anyhow::Result<()> {
    let store: Arc<dyn StateStore> = Arc::new(JsonFileStore::new(&config.store_path));
    if fresh {
        store.remove(STATE_KEY).await?;
        store.remove(SUMMARY_KEY).await?;
    }

    let bus = EventBus::default();
    let printer = spawn_event_printer(&bus);
    let mirror = spawn_mirror(&bus, Arc::clone(&store));

    let result: anyhow::Result<()> = async move {
        let client = build_client(&config.user_agent, config.request_timeout_secs)?;
        let session = HttpSession::open(client, url).await?;
        let plan = if fresh {
            None
        } else {
            load_resume_plan(store.as_ref(), session.current_url()).await
        };

        let mut coordinator =
            Coordinator::new(session, store, bus, selectors, config.timing);
        match plan {
            Some(plan) => {
                println!("resuming interrupted extraction from page {}", plan.page);
                coordinator.resume_from_page(plan).await?;
            }
            None => coordinator.extract_all_reviews(settings).await?,
        }

        match out {
            Some(path) => {
                let file = std::fs::File::create(path)
                    .map_err(|e| anyhow::anyhow!("cannot create {}: {e}", path.display()))?;
                let exported = coordinator.export_reviews(file).await?;
                println!("wrote {exported} reviews to {}", path.display());
            }
            None => println!("results persisted; run `revex export` to write the CSV"),
        }
        Ok(())
    }
    .await;

    // The coordinator is gone by now, so both helpers see the bus close and
    // drain whatever was still in flight before the process exits.
    printer.await?;
    mirror.await?;
    result
}

/// Resume an interrupted run from the page `url` points at.
///
/// # Errors
///
/// Returns an error when no interrupted run is persisted, the page cannot
/// be fetched, or the resumed run fails mid-flight.
pub(crate) async fn run_resume(
    config: &AppConfig,
    url: &str,
    selectors: Selectors,
) -> anyhow::Result<()> {
    let store: Arc<dyn StateStore> = Arc::new(JsonFileStore::new(&config.store_path));

    let bus = EventBus::default();
    let printer = spawn_event_printer(&bus);
    let mirror = spawn_mirror(&bus, Arc::clone(&store));

    let result: anyhow::Result<()> = async move {
        let Some(plan) = load_resume_plan(store.as_ref(), url).await else {
            anyhow::bail!("no interrupted extraction to resume; use `revex extract` to start one");
        };
        let client = build_client(&config.user_agent, config.request_timeout_secs)?;
        let session = HttpSession::open(client, url).await?;

        let mut coordinator =
            Coordinator::new(session, store, bus, selectors, config.timing);
        println!("resuming interrupted extraction from page {}", plan.page);
        coordinator.resume_from_page(plan).await?;
        println!("results persisted; run `revex export` to write the CSV");
        Ok(())
    }
    .await;

    printer.await?;
    mirror.await?;
    result
}

/// Export the persisted accumulation to CSV and clear both slots.
///
/// With no `out` path the file lands in the working directory under the
/// product-derived default name.
///
/// # Errors
///
/// Returns an error when no reviews are persisted or the file cannot be
/// written. The slots are only cleared after the file is fully written.
pub(crate) async fn run_export(config: &AppConfig, out: Option<PathBuf>) -> anyhow::Result<()> {
    let store = JsonFileStore::new(&config.store_path);
    let slot: Option<SessionState> = get_json(&store, STATE_KEY).await?;
    let Some(state) = slot.filter(|state| !state.reviews.is_empty()) else {
        anyhow::bail!("no extracted reviews to export; run `revex extract` first");
    };

    let SessionState {
        reviews,
        extracted_pages,
        product,
        ..
    } = state;
    let product = product.unwrap_or_else(|| {
        ProductInfo::new(
            "Unknown Product".to_string(),
            "Unknown".to_string(),
            String::new(),
            0,
        )
    });

    let path =
        out.unwrap_or_else(|| PathBuf::from(export_filename(&product, Utc::now().date_naive())));
    let file = std::fs::File::create(&path)
        .map_err(|e| anyhow::anyhow!("cannot create {}: {e}", path.display()))?;
    write_csv(file, &product, &reviews, extracted_pages.len())?;

    store.remove(STATE_KEY).await?;
    store.remove(SUMMARY_KEY).await?;
    println!("exported {} reviews to {}", reviews.len(), path.display());
    Ok(())
}

/// Print what the persisted slots say about the session.
///
/// # Errors
///
/// Returns an error when the store file exists but cannot be read.
pub(crate) async fn run_status(config: &AppConfig) -> anyhow::Result<()> {
    let store = JsonFileStore::new(&config.store_path);

    let summary: Option<SessionSummary> = get_json(&store, SUMMARY_KEY).await?;
    if let Some(summary) = summary.filter(|summary| summary.is_extracting) {
        println!("extraction in progress");
        println!("  product:      {}", summary.product_title);
        println!(
            "  current page: {} of {}",
            summary.current_page, summary.total_pages
        );
        println!("  reviews:      {}", summary.total_reviews);
        return Ok(());
    }

    let state: Option<SessionState> = get_json(&store, STATE_KEY).await?;
    match state {
        Some(state) if state.is_extracting => {
            println!("interrupted extraction");
            println!(
                "  {} reviews from {} pages persisted",
                state.reviews.len(),
                state.extracted_pages.len()
            );
            println!("  run `revex extract <url>` to continue it");
        }
        Some(state) if !state.reviews.is_empty() => {
            println!("no extraction in progress");
            println!(
                "  {} reviews from {} pages persisted; run `revex export` to write the CSV",
                state.reviews.len(),
                state.extracted_pages.len()
            );
        }
        _ => println!("no extraction in progress"),
    }
    Ok(())
}

/// Clear both persisted slots.
///
/// # Errors
///
/// Returns an error when the store file cannot be rewritten.
pub(crate) async fn run_reset(config: &AppConfig) -> anyhow::Result<()> {
    let store = JsonFileStore::new(&config.store_path);
    store.remove(STATE_KEY).await?;
    store.remove(SUMMARY_KEY).await?;
    println!("extraction state cleared");
    Ok(())
}

/// Prints every bus event to the terminal until the bus closes.
fn spawn_event_printer(bus: &EventBus) -> JoinHandle<()> {
    let mut events = bus.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => print_event(&event),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "event stream lagged, some progress lines were dropped");
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}

fn print_event(event: &ExtractionEvent) {
    match event {
        ExtractionEvent::ExtractionStarted {
            total_reviews,
            total_pages,
            product,
            ..
        } => {
            println!(
                "extracting {total_reviews} reviews across {total_pages} pages of {}",
                product.title
            );
        }
        ExtractionEvent::Progress { percent, message } => println!("[{percent:>3}%] {message}"),
        ExtractionEvent::PageExtracted {
            page, added, total, ..
        } => {
            println!("page {page}: {added} new reviews, {total} total");
        }
        ExtractionEvent::NavigationComplete { message } => println!("{message}"),
        ExtractionEvent::ExtractionComplete {
            total_reviews,
            total_pages,
            ..
        } => {
            println!("extraction complete: {total_reviews} reviews from {total_pages} pages");
        }
        ExtractionEvent::ExportComplete { total_reviews, .. } => {
            println!("exported {total_reviews} reviews");
        }
        ExtractionEvent::ExtractionError { message } => eprintln!("extraction failed: {message}"),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
