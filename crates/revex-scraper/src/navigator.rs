//! Pagination Navigator: finds next-page and see-all-reviews links,
//! activates them, and decides whether the current page is the last one.

use revex_core::total_pages_for;
use scraper::Html;
use tracing::{debug, info, warn};

use crate::error::{ExtractError, SessionError};
use crate::page::{resolve_href, PageSession};
use crate::parse;
use crate::reader::extract_total_reviews;
use crate::selectors::{element_text, Selectors};

/// Outcome of a navigation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavOutcome {
    /// A link was found and activated.
    Advanced { message: String },
    /// The current page carries no suitable link.
    NoTarget { message: String },
}

impl NavOutcome {
    /// Receipt text for the caller.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Advanced { message } | Self::NoTarget { message } => message,
        }
    }

    /// Whether a link was activated.
    #[must_use]
    pub fn advanced(&self) -> bool {
        matches!(self, Self::Advanced { .. })
    }
}

/// A pagination link lifted off the current document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NextPageLink {
    /// Candidate pattern that located the link, reused to activate it.
    pub selector: String,
    /// Raw href attribute, possibly document-relative.
    pub href: String,
    /// Trimmed link text.
    pub text: String,
    /// Page number carried in the href, `0` when it has none.
    pub target_page: u32,
}

/// Finds the link that advances to the next review page.
///
/// Every candidate's first match must carry a `pageNumber` href. The
/// highest-priority candidate is trusted on that alone; later candidates
/// match generic pagination anchors, so their match must also read like a
/// next-page control. Pagination templates put misleading numbers in the
/// href, so the target page is reported but never used to reject a link.
#[must_use]
pub fn find_next_page_link(document: &Html, selectors: &Selectors) -> Option<NextPageLink> {
    let root = document.root_element();
    for (index, (pattern, selector)) in selectors.next_page.candidates().enumerate() {
        let Some(element) = root.select(selector).next() else {
            continue;
        };
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        if !href.contains("pageNumber") {
            continue;
        }
        let text = element_text(element);
        if index > 0 {
            let lowered = text.to_lowercase();
            if !lowered.contains("next page") && !lowered.contains('\u{2192}') {
                continue;
            }
        }
        return Some(NextPageLink {
            selector: pattern.to_string(),
            href: href.to_string(),
            text,
            target_page: parse::page_number_from_url(href).unwrap_or(0),
        });
    }
    None
}

/// Finds and activates the next-page link.
///
/// # Errors
///
/// Returns [`ExtractError::Session`] when the document cannot be read or a
/// located link cannot be activated.
pub async fn navigate_to_next_page<S: PageSession>(
    session: &mut S,
    selectors: &Selectors,
) -> Result<NavOutcome, ExtractError> {
    let current_page = parse::page_number_from_url(session.current_url()).unwrap_or(1);
    let link = {
        let body = session.content().await?;
        let document = Html::parse_document(&body);
        find_next_page_link(&document, selectors)
    };
    let Some(link) = link else {
        debug!(current_page, "no next page link on the current page");
        return Ok(NavOutcome::NoTarget {
            message: "No next page found".to_string(),
        });
    };
    info!(
        current_page,
        target_page = link.target_page,
        href = %link.href,
        text = %link.text,
        "activating next page link"
    );
    let href = resolve_href(session.current_url(), &link.href)?;
    activate_link(session, &link.selector, &href).await?;
    Ok(NavOutcome::Advanced {
        message: "Navigating to next page".to_string(),
    })
}

/// Finds and activates the see-all-reviews link on a product page.
///
/// # Errors
///
/// Returns [`ExtractError::Session`] when the document cannot be read or a
/// located link cannot be activated.
pub async fn navigate_to_reviews_page<S: PageSession>(
    session: &mut S,
    selectors: &Selectors,
) -> Result<NavOutcome, ExtractError> {
    let link = {
        let body = session.content().await?;
        let document = Html::parse_document(&body);
        find_reviews_link(&document, selectors)
    };
    let Some((pattern, raw_href)) = link else {
        warn!("no see-all-reviews link on the current page");
        return Ok(NavOutcome::NoTarget {
            message: "Could not find reviews link".to_string(),
        });
    };
    info!(href = %raw_href, "activating see-all-reviews link");
    let href = resolve_href(session.current_url(), &raw_href)?;
    activate_link(session, &pattern, &href).await?;
    Ok(NavOutcome::Advanced {
        message: "Navigating to reviews page".to_string(),
    })
}

/// First candidate match with an href; alternates must link into the
/// reviews section, the dedicated-hook candidate is trusted as-is.
fn find_reviews_link(document: &Html, selectors: &Selectors) -> Option<(String, String)> {
    let root = document.root_element();
    for (index, (pattern, selector)) in selectors.see_all_reviews.candidates().enumerate() {
        let Some(element) = root.select(selector).next() else {
            continue;
        };
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        if index > 0 && !href.contains("/product-reviews/") {
            continue;
        }
        return Some((pattern.to_string(), href.to_string()));
    }
    None
}

/// Activates a link with a native click, falling back to a synthesized
/// click event and then to direct navigation on the resolved href.
async fn activate_link<S: PageSession>(
    session: &mut S,
    selector: &str,
    href: &str,
) -> Result<(), SessionError> {
    match session.click(selector).await {
        Ok(()) => return Ok(()),
        Err(err) => warn!(error = %err, "click failed, trying a synthesized click event"),
    }
    match session.dispatch_click(selector).await {
        Ok(()) => return Ok(()),
        Err(err) => warn!(error = %err, "synthesized click failed, navigating directly"),
    }
    session.navigate(href).await
}

/// Whether the current page is the last review page.
///
/// A known total review count decides directly at ten reviews per page,
/// falling back to a count read off the document. With no count at all the
/// first pagination link decides: no link means no further pages, and a
/// link that does not point past the current page is an inert control.
#[must_use]
pub fn is_on_last_page(
    document: &Html,
    selectors: &Selectors,
    current_url: &str,
    known_total: u32,
) -> bool {
    let current_page = parse::page_number_from_url(current_url).unwrap_or(1);
    let total = if known_total > 0 {
        known_total
    } else {
        extract_total_reviews(document, selectors)
    };
    if total > 0 {
        let total_pages = total_pages_for(total);
        debug!(
            total,
            total_pages, current_page, "deciding last page from totals"
        );
        return current_page >= total_pages;
    }

    let root = document.root_element();
    let Some(link) = selectors.pagination_links.first_element(root) else {
        return true;
    };
    let target_page = link
        .value()
        .attr("href")
        .and_then(parse::page_number_from_url)
        .unwrap_or(0);
    target_page <= current_page
}

#[cfg(test)]
#[path = "navigator_test.rs"]
mod tests;
