//! Broadcast event payloads published over the extraction bus.
//!
//! Every lifecycle transition the coordinator makes is observable here, so
//! status surfaces (CLI progress output, the summary mirror) never poll the
//! page context. Variants are serde-serializable because the summary mirror
//! persists parts of them.

use serde::{Deserialize, Serialize};

use crate::records::ProductInfo;
use crate::session::ExtractionSettings;

/// Events published by the extraction coordinator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ExtractionEvent {
    /// A run passed its preflight checks and is about to read page 1.
    ExtractionStarted {
        total_reviews: u32,
        total_pages: u32,
        product: ProductInfo,
        settings: ExtractionSettings,
    },

    /// Periodic progress signal, one per completed page.
    Progress { percent: u32, message: String },

    /// One page's reviews were merged into the accumulation.
    PageExtracted {
        page: u32,
        /// Reviews found on the page before deduplication.
        found: usize,
        /// Reviews actually added after deduplication.
        added: usize,
        /// Accumulated total after the merge.
        total: usize,
    },

    /// A navigation step finished (manual page-by-page mode).
    NavigationComplete { message: String },

    /// The run finished; accumulated reviews remain persisted until export
    /// or reset.
    ExtractionComplete {
        total_reviews: usize,
        total_pages: u32,
        extracted_pages: Vec<u32>,
        product: Option<ProductInfo>,
    },

    /// The run aborted. Already-persisted partial results are retained.
    ExtractionError { message: String },

    /// Accumulated reviews were written to CSV and the session was cleared.
    ExportComplete {
        total_reviews: usize,
        product: Option<ProductInfo>,
    },
}

/// Whole-number progress percentage for `page` of `total_pages`, rounded to
/// nearest. Zero when `total_pages` is zero.
#[must_use]
pub fn progress_percent(page: u32, total_pages: u32) -> u32 {
    if total_pages == 0 {
        return 0;
    }
    let page = u64::from(page);
    let total = u64::from(total_pages);
    let percent = (page * 200 + total) / (total * 2);
    u32::try_from(percent).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_percent_rounds_to_nearest() {
        assert_eq!(progress_percent(1, 3), 33);
        assert_eq!(progress_percent(2, 3), 67);
        assert_eq!(progress_percent(3, 3), 100);
    }

    #[test]
    fn progress_percent_zero_total_is_zero() {
        assert_eq!(progress_percent(1, 0), 0);
    }

    #[test]
    fn progress_percent_single_page_is_complete() {
        assert_eq!(progress_percent(1, 1), 100);
    }
}
