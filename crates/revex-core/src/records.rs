//! Review domain types shared across the workspace.
//!
//! ## Observed shape from the supported review-page template
//!
//! ### Review identity
//! Review containers usually carry a page-supplied `id` attribute. When they
//! do not, an identity is synthesized from reviewer name, date, and rating
//! (see the scraper crate's reader). Synthesized identities can collide for
//! two anonymous reviews posted the same day with the same rating; the later
//! one is dropped by deduplication. Known accuracy gap, kept deliberately.
//!
//! ### Dates
//! The page renders dates as localized prose (`"Reviewed in the United States
//! on July 26, 2019"`). [`ReviewRecord::date`] holds the ISO 8601 calendar
//! date when that text parses, otherwise the raw text as displayed, so no
//! review is ever lost to an unanticipated date format.
//!
//! ### Totals
//! The page's total-review count is advisory. It may be zero, stale, or
//! formatted with digit grouping the count patterns do not capture. Page math
//! built on it tolerates short and missing pages.

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Number of reviews the supported page template renders per page.
///
/// Fixed by the site's pagination layout. All page math assumes it.
pub const REVIEWS_PER_PAGE: u32 = 10;

/// Computes how many review pages a total review count implies.
///
/// Zero totals yield zero pages; callers treat that as "nothing to extract".
#[must_use]
pub fn total_pages_for(total_reviews: u32) -> u32 {
    total_reviews.div_ceil(REVIEWS_PER_PAGE)
}

/// One extracted user review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewRecord {
    /// Stable identity used for deduplication. The page-supplied container id
    /// when the markup carries one, otherwise synthesized.
    pub id: String,

    /// Display name of the reviewer. `"Anonymous"` when the page omits it.
    pub reviewer_name: String,

    /// Star rating in `[1.0, 5.0]`. `None` when missing or out of range.
    pub rating: Option<f64>,

    /// Review headline with any rating phrase stripped. `"No Title"` when
    /// the page renders none.
    pub title: String,

    /// ISO 8601 calendar date when the displayed date parses, otherwise the
    /// raw displayed text.
    pub date: String,

    /// Country from the localized "Reviewed in X on DATE" line. `"Unknown"`
    /// when the line is absent or unrecognized.
    pub country: String,

    /// Review body with internal whitespace collapsed. `"No Review Text"`
    /// when the page renders none.
    pub text: String,

    /// Verified-purchase badge presence. Populated only when the extraction
    /// settings request it.
    #[serde(default)]
    pub verified_purchase: Option<bool>,

    /// Helpful-vote count; `0` when the page shows no vote statement.
    /// Populated only when requested.
    #[serde(default)]
    pub helpful_votes: Option<u32>,

    /// Attached image URLs. Populated only when requested.
    #[serde(default)]
    pub images: Option<Vec<String>>,

    /// Reviewer location text. Often empty on the supported template.
    #[serde(default)]
    pub location: String,

    /// Purchased variant description (size, color). May be empty.
    #[serde(default)]
    pub variant: String,
}

/// Product-level metadata captured once per extraction run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductInfo {
    /// Product display name. `"Unknown Product"` when no title selector matches.
    pub title: String,

    /// The 10-character product token from the reviews URL, or a `data-asin`
    /// attribute found in the document. `"Unknown"` when neither exists.
    pub product_id: String,

    /// URL the extraction was started from.
    pub url: String,

    /// RFC 3339 UTC timestamp of when this snapshot was taken.
    pub extracted_at: String,

    /// The page's advertised total review count. Advisory only.
    pub total_reviews: u32,
}

impl ProductInfo {
    /// Creates a `ProductInfo` stamped with the current UTC time.
    #[must_use]
    pub fn new(title: String, product_id: String, url: String, total_reviews: u32) -> Self {
        Self {
            title,
            product_id,
            url,
            extracted_at: Utc::now().to_rfc3339(),
            total_reviews,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_pages_for_zero_reviews_is_zero() {
        assert_eq!(total_pages_for(0), 0);
    }

    #[test]
    fn total_pages_for_partial_page_rounds_up() {
        assert_eq!(total_pages_for(23), 3);
    }

    #[test]
    fn total_pages_for_exact_multiple() {
        assert_eq!(total_pages_for(30), 3);
    }

    #[test]
    fn total_pages_for_single_review() {
        assert_eq!(total_pages_for(1), 1);
    }

    #[test]
    fn review_record_optional_fields_default_when_absent() {
        let json = r#"{
            "id": "review_a_b_5",
            "reviewer_name": "A",
            "rating": 5.0,
            "title": "Great",
            "date": "2025-02-25",
            "country": "United States",
            "text": "Works."
        }"#;
        let record: ReviewRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.verified_purchase, None);
        assert_eq!(record.helpful_votes, None);
        assert!(record.images.is_none());
        assert_eq!(record.location, "");
        assert_eq!(record.variant, "");
    }

    #[test]
    fn product_info_new_stamps_rfc3339_timestamp() {
        let info = ProductInfo::new(
            "Widget".to_string(),
            "B0TEST12345".to_string(),
            "https://example.com/product-reviews/B0TEST1234".to_string(),
            23,
        );
        assert!(
            chrono::DateTime::parse_from_rfc3339(&info.extracted_at).is_ok(),
            "expected RFC 3339 timestamp, got: {}",
            info.extracted_at
        );
    }
}
