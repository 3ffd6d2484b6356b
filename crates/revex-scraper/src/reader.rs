//! Page Reader: pulls product info, totals, and review records out of the
//! current document.
//!
//! All HTML parsing is synchronous over a parsed [`Html`] snapshot; only the
//! lazy-load scroll walk and the document reads touch the session. Records
//! that fail to yield a reviewer name and body text are dropped here, at the
//! source; placeholder defaults apply to fields of surviving records only.

use std::time::Duration;

use revex_core::{ExtractionSettings, ProductInfo, ReviewRecord, Timing};
use scraper::{ElementRef, Html};
use tracing::debug;

use crate::error::ExtractError;
use crate::normalize::normalize_review;
use crate::page::PageSession;
use crate::parse;
use crate::selectors::{element_text, Selectors};
use crate::wait::wait_for_reviews;

/// Reads product title, identifier, and total review count off the current
/// document.
#[must_use]
pub fn extract_product_info(document: &Html, selectors: &Selectors, url: &str) -> ProductInfo {
    let root = document.root_element();
    let title = selectors
        .product_title
        .first_text(root)
        .unwrap_or_else(|| "Unknown Product".to_string());
    let product_id = parse::product_id_from_url(url)
        .or_else(|| {
            selectors
                .product_asin
                .first_element(root)
                .and_then(|element| element.value().attr("data-asin"))
                .map(str::to_string)
                .filter(|asin| !asin.is_empty())
        })
        .unwrap_or_else(|| "Unknown".to_string());
    let total_reviews = extract_total_reviews(document, selectors);
    ProductInfo::new(title, product_id, url.to_string(), total_reviews)
}

/// Total review count from the filter-info line, `0` when absent.
///
/// Each candidate's first match is tried against the count patterns in
/// turn; a candidate whose text carries no count does not stop the scan.
#[must_use]
pub fn extract_total_reviews(document: &Html, selectors: &Selectors) -> u32 {
    let root = document.root_element();
    for element in selectors.total_count.first_matches(root) {
        let text = element_text(element);
        if let Some(count) = parse::parse_total_count(&text) {
            return count;
        }
    }
    0
}

/// Extracts every review on the current document.
#[must_use]
pub fn extract_reviews(
    document: &Html,
    selectors: &Selectors,
    settings: ExtractionSettings,
) -> Vec<ReviewRecord> {
    let root = document.root_element();
    let containers = selectors.review_container.select_all(root);
    let mut reviews = Vec::with_capacity(containers.len());
    for container in containers {
        if let Some(review) = extract_single_review(container, selectors, settings) {
            reviews.push(review);
        }
    }
    debug!(count = reviews.len(), "extracted reviews from document");
    reviews
}

fn extract_single_review(
    container: ElementRef<'_>,
    selectors: &Selectors,
    settings: ExtractionSettings,
) -> Option<ReviewRecord> {
    let reviewer_raw = selectors.reviewer_name.first_text(container);
    let date_raw = selectors.review_date.first_text(container);
    let rating_raw = selectors
        .star_rating
        .first_element(container)
        .map(|element| element.text().collect::<String>());

    let text = selectors
        .review_body
        .first_text(container)
        .map(|raw| parse::collapse_whitespace(&raw))
        .unwrap_or_default();

    // Presence gate: no reviewer or no body text means the container is not
    // a usable review (ad slots and media blocks share the review markup).
    let reviewer_name = reviewer_raw?;
    if text.is_empty() {
        return None;
    }

    let id = container
        .value()
        .attr("id")
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .or_else(|| selectors.review_id.first_text(container))
        .unwrap_or_else(|| {
            synthesize_id(&reviewer_name, date_raw.as_deref(), rating_raw.as_deref())
        });

    let rating = rating_raw.as_deref().and_then(parse::parse_rating);

    let title = selectors
        .review_title
        .first_text(container)
        .map(|raw| parse::strip_rating_phrase(&raw))
        .unwrap_or_default();

    let date_info = parse::parse_review_date(date_raw.as_deref().unwrap_or(""));

    let verified_purchase = settings
        .include_verified
        .then(|| selectors.verified_badge.is_present(container));

    let helpful_votes = settings.include_helpful.then(|| {
        selectors
            .helpful_votes
            .first_element(container)
            .map_or(0, |element| {
                parse::parse_helpful_votes(&element.text().collect::<String>())
            })
    });

    let images = settings.include_images.then(|| {
        selectors
            .review_images
            .select_all(container)
            .into_iter()
            .filter_map(|image| image.value().attr("src"))
            .map(str::to_string)
            .collect::<Vec<_>>()
    });

    let location = selectors
        .reviewer_location
        .first_text(container)
        .unwrap_or_default();
    let variant = selectors
        .purchase_variant
        .first_text(container)
        .unwrap_or_default();

    Some(normalize_review(ReviewRecord {
        id,
        reviewer_name,
        rating,
        title,
        date: date_info.date,
        country: date_info.country,
        text,
        verified_purchase,
        helpful_votes,
        images,
        location,
        variant,
    }))
}

/// Stable fallback id for containers that expose none of their own.
///
/// Components are stripped to ASCII alphanumerics, so two anonymous
/// same-day reviews with equal rating text collide and the later duplicate
/// is dropped by the accumulator. Known accuracy gap, kept deliberately.
fn synthesize_id(reviewer: &str, date_raw: Option<&str>, rating_raw: Option<&str>) -> String {
    let component = |value: Option<&str>| {
        let present = value.map(str::trim).filter(|v| !v.is_empty());
        parse::alphanumeric_only(present.unwrap_or("unknown"))
    };
    format!(
        "review_{}_{}_{}",
        parse::alphanumeric_only(reviewer),
        component(date_raw),
        component(rating_raw)
    )
}

/// Drives lazy loading by stepping the viewport down the page.
///
/// Stops at the document bottom, after three height checks without change,
/// or at the step cap. Sessions that report a zero viewport (no rendered
/// layout) skip the walk. Ends by waiting for review containers to appear.
///
/// # Errors
///
/// Returns [`ExtractError::Session`] when the session cannot be driven.
pub async fn scroll_to_load_reviews<S: PageSession>(
    session: &mut S,
    selectors: &Selectors,
    timing: &Timing,
) -> Result<(), ExtractError> {
    let mut height = session.document_height().await?;
    let viewport = session.viewport_height().await?;
    let step = viewport * 4 / 5;

    if step > 0 {
        let mut current = 0u64;
        let mut last_height = 0u64;
        let mut no_change = 0u32;
        let mut steps = 0u32;

        while current < height && no_change < 3 && steps < timing.scroll_max_steps {
            current += step;
            session.scroll_to(current).await?;
            steps += 1;
            tokio::time::sleep(Duration::from_millis(timing.scroll_settle_ms)).await;

            let new_height = session.document_height().await?;
            if new_height == last_height {
                no_change += 1;
            } else {
                no_change = 0;
                last_height = new_height;
            }
            height = new_height;
        }
        session.scroll_to(0).await?;
        debug!(steps, height, "finished lazy-load scroll walk");
    }

    tokio::time::sleep(Duration::from_millis(timing.post_scroll_delay_ms)).await;
    wait_for_reviews(session, selectors, timing).await?;
    Ok(())
}

/// Reads every review on the current page, driving lazy load first.
///
/// # Errors
///
/// Returns [`ExtractError::Session`] when the session cannot be driven.
pub async fn extract_page_reviews<S: PageSession>(
    session: &mut S,
    selectors: &Selectors,
    settings: ExtractionSettings,
    timing: &Timing,
) -> Result<Vec<ReviewRecord>, ExtractError> {
    scroll_to_load_reviews(session, selectors, timing).await?;
    let body = session.content().await?;
    let reviews = {
        let document = Html::parse_document(&body);
        extract_reviews(&document, selectors, settings)
    };
    Ok(reviews)
}

#[cfg(test)]
#[path = "reader_test.rs"]
mod tests;
