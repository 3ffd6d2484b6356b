//! Text parsing for counts, ratings, dates, and review URLs.
//!
//! Everything here is a pure function over strings pulled out of the page.
//! Parse failures never fail a record; each function falls back to the most
//! useful partial result (raw string, zero, or `None`).

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

static COUNT_RES: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        Regex::new(r"(?i)(\d+)\s+customer\s+reviews?").expect("valid regex"),
        Regex::new(r"(?i)(\d+)\s+reviews?").expect("valid regex"),
        Regex::new(r"(?i)(\d+)\s+total\s+reviews?").expect("valid regex"),
    ]
});

static RATING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+(?:\.\d+)?)\s+out of\s+5").expect("valid regex"));

static TITLE_RATING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\d+\.?\d*\s+out\s+of\s+5\s+stars?\s*").expect("valid regex")
});

static REVIEW_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Reviewed\s+in\s+(.+?)\s+on\s+(.+)").expect("valid regex"));

static MONTH_DAY_YEAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\w+)\s+(\d+),\s+(\d{4})").expect("valid regex"));

static FIRST_INT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)").expect("valid regex"));

static PAGE_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[?&]pageNumber=(\d+)").expect("valid regex"));

static PRODUCT_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/product-reviews/([A-Z0-9]{10})").expect("valid regex"));

/// Pulls a total review count out of a filter-info phrase.
///
/// Patterns are tried in order: "N customer reviews", "N reviews",
/// "N total reviews". Digit-grouped counts only surface their trailing group
/// ("1,234 customer reviews" parses as 234); the supported templates phrase
/// the count ungrouped.
#[must_use]
pub fn parse_total_count(text: &str) -> Option<u32> {
    for re in COUNT_RES.iter() {
        if let Some(caps) = re.captures(text) {
            if let Ok(count) = caps[1].parse::<u32>() {
                return Some(count);
            }
        }
    }
    None
}

/// Parses a star rating out of an "X out of 5" phrase.
#[must_use]
pub fn parse_rating(text: &str) -> Option<f64> {
    RATING_RE
        .captures(text)
        .and_then(|caps| caps[1].parse::<f64>().ok())
}

/// Strips an embedded "N.N out of 5 stars" phrase from a review title.
///
/// Titles on some templates prepend the star rating to the heading text.
#[must_use]
pub fn strip_rating_phrase(title: &str) -> String {
    TITLE_RATING_RE.replace_all(title, "").trim().to_string()
}

/// Country and date split out of a "Reviewed in COUNTRY on DATE" phrase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewDate {
    /// ISO date where parseable, otherwise the raw date text.
    pub date: String,
    /// Country name, `"Unknown"` when the phrase did not match.
    pub country: String,
}

/// Splits a localized "Reviewed in COUNTRY on DATE" phrase.
///
/// A leading "the" is dropped from the country ("the United States" becomes
/// "United States"). When the phrase does not match at all, the raw text is
/// kept as the date and the country reads "Unknown".
#[must_use]
pub fn parse_review_date(text: &str) -> ReviewDate {
    if let Some(caps) = REVIEW_DATE_RE.captures(text) {
        let mut country = caps[1].trim().to_string();
        let date_text = caps[2].trim();
        if country.to_lowercase().starts_with("the ") {
            country = country[4..].to_string();
        }
        ReviewDate {
            date: parse_date_string(date_text),
            country,
        }
    } else {
        ReviewDate {
            date: text.to_string(),
            country: "Unknown".to_string(),
        }
    }
}

/// Normalizes a date string to ISO `YYYY-MM-DD`.
///
/// Tries the "Month D, YYYY" shape against a fixed month-name table first,
/// then a small set of other formats. Anything still unparseable, including
/// calendar-invalid dates, is returned unchanged.
#[must_use]
pub fn parse_date_string(text: &str) -> String {
    if let Some(caps) = MONTH_DAY_YEAR_RE.captures(text) {
        let month = month_number(&caps[1]);
        let day = caps[2].parse::<u32>().ok();
        let year = caps[3].parse::<i32>().ok();
        if let (Some(month), Some(day), Some(year)) = (month, day, year) {
            if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
                return date.format("%Y-%m-%d").to_string();
            }
        }
    }
    for format in ["%Y-%m-%d", "%m/%d/%Y", "%d %B %Y", "%b %d, %Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return date.format("%Y-%m-%d").to_string();
        }
    }
    text.to_string()
}

fn month_number(name: &str) -> Option<u32> {
    let month = match name.to_lowercase().as_str() {
        "january" => 1,
        "february" => 2,
        "march" => 3,
        "april" => 4,
        "may" => 5,
        "june" => 6,
        "july" => 7,
        "august" => 8,
        "september" => 9,
        "october" => 10,
        "november" => 11,
        "december" => 12,
        _ => return None,
    };
    Some(month)
}

/// First integer in a helpful-votes phrase, `0` when none is present.
#[must_use]
pub fn parse_helpful_votes(text: &str) -> u32 {
    FIRST_INT_RE
        .captures(text)
        .and_then(|caps| caps[1].parse::<u32>().ok())
        .unwrap_or(0)
}

/// Collapses interior whitespace runs to single spaces and trims the ends.
#[must_use]
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Strips every character that is not ASCII alphanumeric.
///
/// Used when synthesizing record ids from free text.
#[must_use]
pub fn alphanumeric_only(text: &str) -> String {
    text.chars().filter(char::is_ascii_alphanumeric).collect()
}

/// Page number from a `pageNumber` query parameter, if present.
///
/// Works on absolute URLs and relative hrefs alike.
#[must_use]
pub fn page_number_from_url(url: &str) -> Option<u32> {
    PAGE_NUMBER_RE
        .captures(url)
        .and_then(|caps| caps[1].parse::<u32>().ok())
}

/// Whether `url` points at a product detail page.
#[must_use]
pub fn is_product_page(url: &str) -> bool {
    url.contains("/dp/")
}

/// Whether `url` points at a paginated reviews page.
#[must_use]
pub fn is_reviews_page(url: &str) -> bool {
    url.contains("/product-reviews/")
}

/// Product identifier embedded in a reviews-page URL path.
#[must_use]
pub fn product_id_from_url(url: &str) -> Option<String> {
    PRODUCT_ID_RE.captures(url).map(|caps| caps[1].to_string())
}

#[cfg(test)]
#[path = "parse_test.rs"]
mod tests;
