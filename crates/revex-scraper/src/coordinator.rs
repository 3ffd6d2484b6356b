//! The extraction coordinator.
//!
//! [`Coordinator`] owns one page session plus the run state and drives every
//! operation the triggers expose: full automatic walks, manual page-by-page
//! extraction, resume after a context loss, export, and the small status
//! queries. Progress and outcomes go out over the [`EventBus`]; the working
//! state is flushed to the [`StateStore`] after every mutation so a
//! navigation that tears the context down loses nothing.
//!
//! Failure handling is deliberately narrow. Driver runs have exactly one
//! error boundary: any error inside [`Coordinator::extract_all_reviews`] or
//! [`Coordinator::resume_from_page`] lands in `fail_run`, which flips and
//! persists the run flag so a dead run cannot refire on the next arrival,
//! then surfaces the error as an [`ExtractionEvent::ExtractionError`].
//! Accumulated reviews survive a failed run and stay exportable.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use revex_core::{
    progress_percent, total_pages_for, ExtractionEvent, ExtractionSettings, ProductInfo,
    SessionState, SessionSummary, Timing,
};
use scraper::Html;
use tracing::{debug, error, info, warn};

use crate::bus::EventBus;
use crate::error::ExtractError;
use crate::export::write_csv;
use crate::navigator::{self, NavOutcome};
use crate::page::PageSession;
use crate::parse;
use crate::reader;
use crate::resume::ResumePlan;
use crate::selectors::Selectors;
use crate::store::{get_json, set_json, StateStore, STATE_KEY};
use crate::wait;

/// What the coordinator is doing right now.
///
/// Distinct from [`SessionState::is_extracting`]: a manual run is live
/// between pages while the coordinator itself sits in `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionPhase {
    Idle,
    Starting,
    ExtractingPage(u32),
    Navigating,
    Complete,
    Error,
}

/// Numbers from one absorbed page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageOutcome {
    /// 1-based page that was read.
    pub page: u32,
    /// Reviews found on the page before deduplication.
    pub found: usize,
    /// Reviews actually added to the accumulation.
    pub added: usize,
    /// Accumulation size afterwards.
    pub total: usize,
}

/// Answer to a last-page probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LastPageStatus {
    pub is_last_page: bool,
    pub total_pages: u32,
    pub total_reviews: u32,
}

/// Drives one extraction session end to end.
pub struct Coordinator<S> {
    session: S,
    store: Arc<dyn StateStore>,
    bus: EventBus,
    selectors: Selectors,
    timing: Timing,
    state: SessionState,
    phase: ExtractionPhase,
}

impl<S: PageSession> Coordinator<S> {
    pub fn new(
        session: S,
        store: Arc<dyn StateStore>,
        bus: EventBus,
        selectors: Selectors,
        timing: Timing,
    ) -> Self {
        Self {
            session,
            store,
            bus,
            selectors,
            timing,
            state: SessionState::default(),
            phase: ExtractionPhase::Idle,
        }
    }

    #[must_use]
    pub fn phase(&self) -> ExtractionPhase {
        self.phase
    }

    #[must_use]
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    #[must_use]
    pub fn session(&self) -> &S {
        &self.session
    }

    #[must_use]
    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Store this coordinator persists into.
    #[must_use]
    pub fn store(&self) -> &dyn StateStore {
        self.store.as_ref()
    }

    #[must_use]
    pub fn current_url(&self) -> &str {
        self.session.current_url()
    }

    /// Lightweight view of the run for status surfaces.
    #[must_use]
    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            is_extracting: self.state.is_extracting,
            total_reviews: u32::try_from(self.state.reviews.len()).unwrap_or(u32::MAX),
            total_pages: self.total_pages(),
            current_page: self.state.current_page,
            product_title: self
                .state
                .product
                .as_ref()
                .map(|product| product.title.clone())
                .unwrap_or_default(),
            settings: self.state.is_extracting.then_some(self.state.settings),
        }
    }

    /// Runs a full automatic extraction from the current page.
    ///
    /// On a product detail page the coordinator first follows the
    /// see-all-reviews link. The walk then moves strictly forward from page
    /// 1, absorbing and persisting after every page; navigator exhaustion
    /// ends it early with whatever was collected.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::NoReviews`] when the page advertises no
    /// reviews, and any session or store error from the walk. Every failure
    /// also goes out as an [`ExtractionEvent::ExtractionError`].
    pub async fn extract_all_reviews(
        &mut self,
        settings: ExtractionSettings,
    ) -> Result<(), ExtractError> {
        match self.run_full_extraction(settings).await {
            Ok(()) => Ok(()),
            Err(err) => Err(self.fail_run(err).await),
        }
    }

    /// Resumes an interrupted run from `plan.page`.
    ///
    /// The persisted accumulation is carried over, the arrival page is
    /// extracted unless it was already absorbed, and the walk continues
    /// forward from there.
    ///
    /// # Errors
    ///
    /// Same failure surface as [`Coordinator::extract_all_reviews`].
    pub async fn resume_from_page(&mut self, plan: ResumePlan) -> Result<(), ExtractError> {
        match self.run_resume(plan).await {
            Ok(()) => Ok(()),
            Err(err) => Err(self.fail_run(err).await),
        }
    }

    /// Starts a manual page-by-page run on the current page.
    ///
    /// Reads product metadata and the current page, persists, and returns a
    /// receipt telling the operator how to continue.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::AlreadyRunning`] when a run is active, plus
    /// any session or store error.
    pub async fn start_page_extraction(
        &mut self,
        settings: ExtractionSettings,
    ) -> Result<String, ExtractError> {
        if self.state.is_extracting {
            return Err(ExtractError::AlreadyRunning);
        }
        info!("starting manual extraction");
        self.state = SessionState::started(settings);
        self.phase = ExtractionPhase::Starting;
        let product = self.read_product_info().await?;
        self.state.product = Some(product);
        self.extract_current_page().await?;
        self.phase = ExtractionPhase::Idle;
        Ok(
            "Current page extracted. Navigate to the next page and extract again to continue."
                .to_string(),
        )
    }

    /// Continues a manual run in a fresh context.
    ///
    /// Restores the persisted accumulation when it holds a live run, then
    /// extracts the current page unless it was already absorbed.
    ///
    /// # Errors
    ///
    /// Returns any session or store error from the restore or the page read.
    pub async fn continue_page_extraction(&mut self) -> Result<String, ExtractError> {
        let slot: Option<SessionState> = get_json(self.store.as_ref(), STATE_KEY).await?;
        if let Some(slot) = slot {
            if slot.is_extracting {
                info!(
                    reviews = slot.reviews.len(),
                    pages = slot.extracted_pages.len(),
                    "restored persisted session"
                );
                self.state = slot;
            }
        }
        let page = parse::page_number_from_url(self.session.current_url()).unwrap_or(1);
        if self.state.has_extracted(page) {
            info!(page, "page already extracted");
            return Ok(format!(
                "Page {page} already extracted. Navigate to a new page and extract again."
            ));
        }
        let outcome = self.extract_current_page().await?;
        self.phase = ExtractionPhase::Idle;
        Ok(format!(
            "Extracted page {}: {} new reviews, {} total.",
            outcome.page, outcome.added, outcome.total
        ))
    }

    /// Reads every review on the current page into the accumulation and
    /// persists the updated state.
    ///
    /// # Errors
    ///
    /// Returns any session error from the scroll and read, or a store error
    /// from the flush.
    pub async fn extract_current_page(&mut self) -> Result<PageOutcome, ExtractError> {
        let page = parse::page_number_from_url(self.session.current_url()).unwrap_or(1);
        self.phase = ExtractionPhase::ExtractingPage(page);
        let found = reader::extract_page_reviews(
            &mut self.session,
            &self.selectors,
            self.state.settings,
            &self.timing,
        )
        .await?;
        let found_count = found.len();
        let added = self.state.absorb_reviews(found);
        self.state.mark_extracted(page);
        self.persist_state().await?;
        let total = self.state.reviews.len();
        info!(page, found = found_count, added, total, "page absorbed");
        self.bus.publish(ExtractionEvent::PageExtracted {
            page,
            found: found_count,
            added,
            total,
        });
        Ok(PageOutcome {
            page,
            found: found_count,
            added,
            total,
        })
    }

    /// Manual-mode navigation to the next review page.
    ///
    /// Both arrival and exhaustion are reported as an
    /// [`ExtractionEvent::NavigationComplete`]; only a broken session is an
    /// error.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::Session`] when the session cannot be driven.
    pub async fn navigate_next_page(&mut self) -> Result<NavOutcome, ExtractError> {
        self.phase = ExtractionPhase::Navigating;
        let result = navigator::navigate_to_next_page(&mut self.session, &self.selectors).await;
        self.phase = ExtractionPhase::Idle;
        let outcome = result?;
        self.bus.publish(ExtractionEvent::NavigationComplete {
            message: outcome.message().to_string(),
        });
        Ok(outcome)
    }

    /// Probes whether the current page is the last review page.
    ///
    /// A fresh document count also refreshes the stored product total, so a
    /// page that advertises its totals late still ends the walk correctly.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::Session`] when the document cannot be read.
    pub async fn check_last_page(&mut self) -> Result<LastPageStatus, ExtractError> {
        let body = self.session.content().await?;
        let current_url = self.session.current_url().to_string();
        let (is_last, total_reviews) = {
            let document = Html::parse_document(&body);
            let known = self.known_total_reviews();
            let is_last =
                navigator::is_on_last_page(&document, &self.selectors, &current_url, known);
            let total = if known > 0 {
                known
            } else {
                reader::extract_total_reviews(&document, &self.selectors)
            };
            (is_last, total)
        };
        if total_reviews > 0 {
            if let Some(product) = self.state.product.as_mut() {
                product.total_reviews = total_reviews;
            }
        }
        Ok(LastPageStatus {
            is_last_page: is_last,
            total_pages: total_pages_for(total_reviews),
            total_reviews,
        })
    }

    /// Exports the accumulation as CSV, then clears the session.
    ///
    /// A fresh context restores the accumulation from the local slot first,
    /// so an export can follow a completed run in a new process. Returns
    /// how many reviews were written.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::NothingToExport`] when no records exist, and
    /// any CSV or store error.
    pub async fn export_reviews<W: Write>(&mut self, writer: W) -> Result<usize, ExtractError> {
        if self.state.reviews.is_empty() {
            let slot: Option<SessionState> = get_json(self.store.as_ref(), STATE_KEY).await?;
            if let Some(slot) = slot {
                if !slot.reviews.is_empty() {
                    info!(
                        reviews = slot.reviews.len(),
                        "restored persisted session for export"
                    );
                    self.state = slot;
                }
            }
        }
        if self.state.reviews.is_empty() {
            return Err(ExtractError::NothingToExport);
        }

        let product = self.state.product.clone().unwrap_or_else(|| {
            ProductInfo::new(
                "Unknown Product".to_string(),
                "Unknown".to_string(),
                self.session.current_url().to_string(),
                0,
            )
        });
        write_csv(
            writer,
            &product,
            &self.state.reviews,
            self.state.extracted_pages.len(),
        )?;

        let exported = self.state.reviews.len();
        let exported_product = self.state.product.clone();
        self.state = SessionState::default();
        self.phase = ExtractionPhase::Idle;
        self.store.remove(STATE_KEY).await?;
        info!(exported, "export complete");
        self.bus.publish(ExtractionEvent::ExportComplete {
            total_reviews: exported,
            product: exported_product,
        });
        Ok(exported)
    }

    /// Clears the working state and the local slot.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::Store`] when the slot cannot be removed.
    pub async fn reset(&mut self) -> Result<(), ExtractError> {
        info!("resetting extraction state");
        self.state = SessionState::default();
        self.phase = ExtractionPhase::Idle;
        self.store.remove(STATE_KEY).await?;
        Ok(())
    }

    async fn run_full_extraction(
        &mut self,
        settings: ExtractionSettings,
    ) -> Result<(), ExtractError> {
        info!("starting automatic extraction");
        self.state = SessionState::started(settings);
        self.phase = ExtractionPhase::Starting;
        self.store.remove(STATE_KEY).await?;

        if parse::is_product_page(self.session.current_url()) {
            info!("on a product page, following the reviews link");
            let outcome =
                navigator::navigate_to_reviews_page(&mut self.session, &self.selectors).await?;
            if let NavOutcome::NoTarget { message } = &outcome {
                warn!(message = message.as_str(), "continuing on the current page");
            }
            wait::wait_for_page_load(&mut self.session, &self.selectors, &self.timing).await?;
            self.sleep(self.timing.page_settle_ms).await;
        }

        wait::wait_for_reviews_page(&mut self.session, &self.selectors, &self.timing).await?;
        self.sleep(self.timing.page_settle_ms).await;

        let product = self.read_product_info().await?;
        let total_reviews = product.total_reviews;
        let total_pages = total_pages_for(total_reviews);
        info!(
            product = product.title.as_str(),
            total_reviews, total_pages, "preflight complete"
        );
        self.state.product = Some(product.clone());

        if total_pages == 0 {
            return Err(ExtractError::NoReviews);
        }

        self.bus.publish(ExtractionEvent::ExtractionStarted {
            total_reviews,
            total_pages,
            product,
            settings: self.state.settings,
        });

        self.extract_current_page().await?;
        self.walk_remaining_pages(2, total_pages).await?;
        self.complete_run(total_pages).await
    }

    async fn run_resume(&mut self, plan: ResumePlan) -> Result<(), ExtractError> {
        info!(page = plan.page, "resuming extraction");
        self.phase = ExtractionPhase::Starting;
        self.sleep(self.timing.resume_settle_ms).await;

        let slot: Option<SessionState> = get_json(self.store.as_ref(), STATE_KEY).await?;
        self.state = slot.unwrap_or_default();
        self.state.is_extracting = true;
        self.state.settings = plan.settings;
        info!(
            restored = self.state.reviews.len(),
            pages = self.state.extracted_pages.len(),
            "carrying persisted accumulation into the resume"
        );

        wait::wait_for_reviews_page(&mut self.session, &self.selectors, &self.timing).await?;
        self.sleep(self.timing.page_settle_ms).await;

        let product = self.read_product_info().await?;
        let total_reviews = product.total_reviews;
        let total_pages = total_pages_for(total_reviews);
        self.state.product = Some(product.clone());

        if total_pages == 0 {
            return Err(ExtractError::NoReviews);
        }

        self.bus.publish(ExtractionEvent::ExtractionStarted {
            total_reviews,
            total_pages,
            product,
            settings: self.state.settings,
        });

        if self.state.has_extracted(plan.page) {
            info!(page = plan.page, "arrival page already extracted, skipping");
        } else {
            self.extract_current_page().await?;
        }
        self.walk_remaining_pages(plan.page + 1, total_pages).await?;
        self.complete_run(total_pages).await
    }

    async fn walk_remaining_pages(
        &mut self,
        from: u32,
        total_pages: u32,
    ) -> Result<(), ExtractError> {
        for page in from..=total_pages {
            self.phase = ExtractionPhase::Navigating;
            debug!(page, "navigating forward");
            let outcome =
                navigator::navigate_to_next_page(&mut self.session, &self.selectors).await?;
            if !outcome.advanced() {
                warn!(page, "no next page link, ending the walk early");
                break;
            }
            wait::wait_for_page_load(&mut self.session, &self.selectors, &self.timing).await?;
            self.sleep(self.timing.post_nav_settle_ms).await;

            self.extract_current_page().await?;

            self.bus.publish(ExtractionEvent::Progress {
                percent: progress_percent(page, total_pages),
                message: format!(
                    "Extracted {} reviews from {page}/{total_pages} pages",
                    self.state.reviews.len()
                ),
            });
            self.sleep(self.timing.inter_page_delay_ms).await;
        }
        Ok(())
    }

    async fn complete_run(&mut self, total_pages: u32) -> Result<(), ExtractError> {
        // The flag is persisted back so an interrupted-looking slot cannot
        // trigger a resume of a finished run.
        self.state.is_extracting = false;
        self.persist_state().await?;
        self.phase = ExtractionPhase::Complete;
        info!(
            total_reviews = self.state.reviews.len(),
            pages = self.state.extracted_pages.len(),
            "extraction complete"
        );
        self.bus.publish(ExtractionEvent::ExtractionComplete {
            total_reviews: self.state.reviews.len(),
            total_pages,
            extracted_pages: self.state.extracted_pages.iter().copied().collect(),
            product: self.state.product.clone(),
        });
        Ok(())
    }

    async fn fail_run(&mut self, err: ExtractError) -> ExtractError {
        self.state.is_extracting = false;
        if let Err(persist_err) = self.persist_state().await {
            warn!(error = %persist_err, "failed to persist aborted run state");
        }
        self.phase = ExtractionPhase::Error;
        error!(error = %err, "extraction run aborted");
        self.bus.publish(ExtractionEvent::ExtractionError {
            message: err.to_string(),
        });
        err
    }

    async fn read_product_info(&mut self) -> Result<ProductInfo, ExtractError> {
        let body = self.session.content().await?;
        let url = self.session.current_url().to_string();
        let info = {
            let document = Html::parse_document(&body);
            reader::extract_product_info(&document, &self.selectors, &url)
        };
        Ok(info)
    }

    fn known_total_reviews(&self) -> u32 {
        self.state
            .product
            .as_ref()
            .map_or(0, |product| product.total_reviews)
    }

    fn total_pages(&self) -> u32 {
        total_pages_for(self.known_total_reviews())
    }

    async fn persist_state(&self) -> Result<(), ExtractError> {
        set_json(self.store.as_ref(), STATE_KEY, &self.state).await?;
        Ok(())
    }

    async fn sleep(&self, ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}

#[cfg(test)]
#[path = "coordinator_test.rs"]
mod tests;
