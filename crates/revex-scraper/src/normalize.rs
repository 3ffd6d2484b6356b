//! Final cleanup pass over extracted review records.

use revex_core::ReviewRecord;

/// Applies field defaults and range checks before a record enters the
/// accumulated set.
///
/// Empty reviewer names become "Anonymous", ratings outside `1.0..=5.0`
/// (or non-finite) are dropped, empty title and text fall back to fixed
/// placeholders, and stray whitespace is trimmed.
#[must_use]
pub fn normalize_review(mut review: ReviewRecord) -> ReviewRecord {
    review.reviewer_name = review.reviewer_name.trim().to_string();
    if review.reviewer_name.is_empty() {
        review.reviewer_name = "Anonymous".to_string();
    }

    if let Some(rating) = review.rating {
        if !rating.is_finite() || !(1.0..=5.0).contains(&rating) {
            review.rating = None;
        }
    }

    review.title = review.title.trim().to_string();
    if review.title.is_empty() {
        review.title = "No Title".to_string();
    }

    review.text = review.text.trim().to_string();
    if review.text.is_empty() {
        review.text = "No Review Text".to_string();
    }

    review.country = review.country.trim().to_string();

    review
}
