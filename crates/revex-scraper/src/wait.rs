//! Bounded polling against the live document.
//!
//! Every "wait for X" in the pipeline is the same shape: re-read the
//! document, test a predicate, sleep, give up after a fixed attempt budget.
//! Timing out is not an error; callers proceed with whatever the page has,
//! so one slow page cannot wedge a whole run.

use std::time::Duration;

use revex_core::Timing;
use scraper::Html;
use tracing::{debug, warn};

use crate::error::ExtractError;
use crate::page::PageSession;
use crate::selectors::Selectors;

/// Outcome of one bounded poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// The predicate held within the attempt budget.
    Ready { attempts: u32 },
    /// The budget ran out.
    TimedOut,
}

/// Polls the session's document until `predicate` holds or `max_attempts`
/// checks have failed.
///
/// # Errors
///
/// Returns [`ExtractError::Session`] when the document cannot be read.
pub async fn poll_document<S, P>(
    session: &mut S,
    interval_ms: u64,
    max_attempts: u32,
    description: &str,
    predicate: P,
) -> Result<PollOutcome, ExtractError>
where
    S: PageSession,
    P: Fn(&Html) -> bool + Send,
{
    for attempt in 1..=max_attempts {
        let body = session.content().await?;
        let ready = {
            let document = Html::parse_document(&body);
            predicate(&document)
        };
        if ready {
            debug!(description, attempt, "poll condition met");
            return Ok(PollOutcome::Ready { attempts: attempt });
        }
        if attempt < max_attempts {
            tokio::time::sleep(Duration::from_millis(interval_ms)).await;
        }
    }
    warn!(description, max_attempts, "poll timed out, proceeding anyway");
    Ok(PollOutcome::TimedOut)
}

/// Waits for review containers and the pagination bar, the signature of a
/// fully loaded reviews page.
///
/// # Errors
///
/// Returns [`ExtractError::Session`] when the document cannot be read.
pub async fn wait_for_page_load<S: PageSession>(
    session: &mut S,
    selectors: &Selectors,
    timing: &Timing,
) -> Result<PollOutcome, ExtractError> {
    poll_document(
        session,
        timing.page_poll_interval_ms,
        timing.page_poll_attempts,
        "page load",
        |document| {
            let root = document.root_element();
            selectors.review_container.is_present(root) && selectors.pagination_bar.is_present(root)
        },
    )
    .await
}

/// Waits for review containers or the total-count element, whichever shows
/// first. Used on the initial reviews page, which may legitimately have a
/// count but no reviews rendered yet.
///
/// # Errors
///
/// Returns [`ExtractError::Session`] when the document cannot be read.
pub async fn wait_for_reviews_page<S: PageSession>(
    session: &mut S,
    selectors: &Selectors,
    timing: &Timing,
) -> Result<PollOutcome, ExtractError> {
    poll_document(
        session,
        timing.page_poll_interval_ms,
        timing.page_poll_attempts,
        "reviews page load",
        |document| {
            let root = document.root_element();
            selectors.review_container.is_present(root) || selectors.total_count.is_present(root)
        },
    )
    .await
}

/// Waits for review containers after the lazy-load scroll walk.
///
/// # Errors
///
/// Returns [`ExtractError::Session`] when the document cannot be read.
pub async fn wait_for_reviews<S: PageSession>(
    session: &mut S,
    selectors: &Selectors,
    timing: &Timing,
) -> Result<PollOutcome, ExtractError> {
    poll_document(
        session,
        timing.reviews_poll_interval_ms,
        timing.reviews_poll_attempts,
        "reviews after scroll",
        |document| selectors.review_container.is_present(document.root_element()),
    )
    .await
}
