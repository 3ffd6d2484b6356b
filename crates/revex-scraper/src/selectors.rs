//! Fallback selector chains for the supported review-page templates.
//!
//! Review-page markup differs between template revisions, so every field is
//! located through an ordered list of CSS selector candidates rather than a
//! single selector. The first candidate that produces a usable match wins.
//! Candidate strings that fail to compile are skipped with a warning, so one
//! stale pattern in a user-supplied list cannot take down a whole chain.

use scraper::{ElementRef, Selector};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ExtractError;

/// An ordered list of compiled selector candidates for one field.
#[derive(Debug, Clone)]
pub struct SelectorChain {
    name: String,
    candidates: Vec<(String, Selector)>,
}

impl SelectorChain {
    /// Compiles `patterns` into a chain named `name`, dropping invalid ones.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::SelectorChain`] when no pattern compiles.
    pub fn compile(name: &str, patterns: &[String]) -> Result<Self, ExtractError> {
        let mut candidates = Vec::with_capacity(patterns.len());
        for pattern in patterns {
            match Selector::parse(pattern) {
                Ok(selector) => candidates.push((pattern.clone(), selector)),
                Err(err) => {
                    warn!(
                        chain = name,
                        pattern = %pattern,
                        error = %err,
                        "skipping invalid selector candidate"
                    );
                }
            }
        }
        if candidates.is_empty() {
            return Err(ExtractError::SelectorChain {
                chain: name.to_string(),
            });
        }
        Ok(Self {
            name: name.to_string(),
            candidates,
        })
    }

    /// Chain name, used in logs.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Candidate patterns with their compiled selectors, in priority order.
    pub fn candidates(&self) -> impl Iterator<Item = (&str, &Selector)> {
        self.candidates.iter().map(|(p, s)| (p.as_str(), s))
    }

    /// Text of the first candidate whose first match has non-empty text.
    ///
    /// A candidate that matches an element with only whitespace text is
    /// passed over, so empty placeholder nodes do not mask a later
    /// candidate that carries the real value.
    #[must_use]
    pub fn first_text(&self, root: ElementRef<'_>) -> Option<String> {
        for (_, selector) in &self.candidates {
            if let Some(element) = root.select(selector).next() {
                let text = element_text(element);
                if !text.is_empty() {
                    return Some(text);
                }
            }
        }
        None
    }

    /// First match of the first candidate that matches at all.
    #[must_use]
    pub fn first_element<'a>(&self, root: ElementRef<'a>) -> Option<ElementRef<'a>> {
        for (_, selector) in &self.candidates {
            if let Some(element) = root.select(selector).next() {
                return Some(element);
            }
        }
        None
    }

    /// All matches of the first candidate that matches at all.
    #[must_use]
    pub fn select_all<'a>(&self, root: ElementRef<'a>) -> Vec<ElementRef<'a>> {
        for (_, selector) in &self.candidates {
            let matches: Vec<ElementRef<'a>> = root.select(selector).collect();
            if !matches.is_empty() {
                return matches;
            }
        }
        Vec::new()
    }

    /// First match of every candidate, in candidate order.
    ///
    /// Used where each candidate's match must be inspected in turn instead
    /// of stopping at the first element that exists.
    #[must_use]
    pub fn first_matches<'a>(&self, root: ElementRef<'a>) -> Vec<ElementRef<'a>> {
        self.candidates
            .iter()
            .filter_map(|(_, selector)| root.select(selector).next())
            .collect()
    }

    /// Whether any candidate matches at all.
    #[must_use]
    pub fn is_present(&self, root: ElementRef<'_>) -> bool {
        self.first_element(root).is_some()
    }
}

/// Concatenated, trimmed text of all text nodes under `element`.
pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Candidate pattern lists for every extracted field, one chain per field.
///
/// Deserializes from JSON with every omitted field falling back to the
/// built-in patterns, so a user file only has to override the chains that
/// drifted on their template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectorConfig {
    #[serde(default = "product_title_patterns")]
    pub product_title: Vec<String>,
    #[serde(default = "total_count_patterns")]
    pub total_count: Vec<String>,
    #[serde(default = "review_container_patterns")]
    pub review_container: Vec<String>,
    #[serde(default = "review_id_patterns")]
    pub review_id: Vec<String>,
    #[serde(default = "reviewer_name_patterns")]
    pub reviewer_name: Vec<String>,
    #[serde(default = "star_rating_patterns")]
    pub star_rating: Vec<String>,
    #[serde(default = "review_title_patterns")]
    pub review_title: Vec<String>,
    #[serde(default = "review_date_patterns")]
    pub review_date: Vec<String>,
    #[serde(default = "review_body_patterns")]
    pub review_body: Vec<String>,
    #[serde(default = "verified_badge_patterns")]
    pub verified_badge: Vec<String>,
    #[serde(default = "helpful_votes_patterns")]
    pub helpful_votes: Vec<String>,
    #[serde(default = "review_images_patterns")]
    pub review_images: Vec<String>,
    #[serde(default = "reviewer_location_patterns")]
    pub reviewer_location: Vec<String>,
    #[serde(default = "purchase_variant_patterns")]
    pub purchase_variant: Vec<String>,
    #[serde(default = "product_asin_patterns")]
    pub product_asin: Vec<String>,
    #[serde(default = "see_all_reviews_patterns")]
    pub see_all_reviews: Vec<String>,
    #[serde(default = "pagination_bar_patterns")]
    pub pagination_bar: Vec<String>,
    #[serde(default = "next_page_patterns")]
    pub next_page: Vec<String>,
    #[serde(default = "pagination_links_patterns")]
    pub pagination_links: Vec<String>,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            product_title: product_title_patterns(),
            total_count: total_count_patterns(),
            review_container: review_container_patterns(),
            review_id: review_id_patterns(),
            reviewer_name: reviewer_name_patterns(),
            star_rating: star_rating_patterns(),
            review_title: review_title_patterns(),
            review_date: review_date_patterns(),
            review_body: review_body_patterns(),
            verified_badge: verified_badge_patterns(),
            helpful_votes: helpful_votes_patterns(),
            review_images: review_images_patterns(),
            reviewer_location: reviewer_location_patterns(),
            purchase_variant: purchase_variant_patterns(),
            product_asin: product_asin_patterns(),
            see_all_reviews: see_all_reviews_patterns(),
            pagination_bar: pagination_bar_patterns(),
            next_page: next_page_patterns(),
            pagination_links: pagination_links_patterns(),
        }
    }
}

fn strs(patterns: &[&str]) -> Vec<String> {
    patterns.iter().map(ToString::to_string).collect()
}

fn product_title_patterns() -> Vec<String> {
    strs(&[
        r#"h1[data-automation-id="title"]"#,
        ".a-size-large.product-title-word-break",
        "h1.a-size-large",
        r#"[data-hook="product-title"]"#,
        ".a-size-large.a-spacing-none.a-color-base",
        "h1",
    ])
}

fn total_count_patterns() -> Vec<String> {
    strs(&[
        r#"[data-hook="cr-filter-info-review-rating-count"]"#,
        r#".a-size-base[data-hook="cr-filter-info-review-rating-count"]"#,
        ".a-row.a-spacing-base.a-size-base",
        r#"[data-hook="cr-filter-info-review-rating-count"] .a-size-base"#,
    ])
}

fn review_container_patterns() -> Vec<String> {
    strs(&[
        r#"[data-hook="review"]"#,
        ".review",
        r#"[data-component-type="review"]"#,
        ".a-section.review",
    ])
}

fn review_id_patterns() -> Vec<String> {
    strs(&[r#"[data-hook="review-id"]"#])
}

fn reviewer_name_patterns() -> Vec<String> {
    strs(&[".a-profile-name", r#"[data-hook="reviewer"]"#])
}

fn star_rating_patterns() -> Vec<String> {
    strs(&[
        r#"[data-hook="review-star-rating"] .a-icon-alt"#,
        ".a-icon-alt",
    ])
}

fn review_title_patterns() -> Vec<String> {
    strs(&[r#"[data-hook="review-title"]"#, ".a-size-base.review-title"])
}

fn review_date_patterns() -> Vec<String> {
    strs(&[r#"[data-hook="review-date"]"#, ".review-date"])
}

fn review_body_patterns() -> Vec<String> {
    strs(&[r#"[data-hook="review-body"]"#, ".review-text"])
}

fn verified_badge_patterns() -> Vec<String> {
    strs(&[r#"[data-hook="avp-badge"]"#, ".a-color-state"])
}

fn helpful_votes_patterns() -> Vec<String> {
    strs(&[r#"[data-hook="helpful-vote-statement"]"#, ".cr-vote-text"])
}

fn review_images_patterns() -> Vec<String> {
    strs(&[r#"[data-hook="review-image"] img, .review-image img"#])
}

fn reviewer_location_patterns() -> Vec<String> {
    strs(&[".a-profile-location"])
}

fn purchase_variant_patterns() -> Vec<String> {
    strs(&[".a-size-mini.a-color-secondary"])
}

fn product_asin_patterns() -> Vec<String> {
    strs(&["[data-asin]"])
}

fn see_all_reviews_patterns() -> Vec<String> {
    strs(&[
        r#"a[data-hook="see-all-reviews-link-foot"]"#,
        r#"a[href*="/product-reviews/"]"#,
        r#".a-link-emphasis[href*="/product-reviews/"]"#,
    ])
}

fn pagination_bar_patterns() -> Vec<String> {
    strs(&[r#"nav[data-hook="pagination-bar"]"#])
}

fn next_page_patterns() -> Vec<String> {
    strs(&[
        r#"nav[data-hook="pagination-bar"] li:last-child a[href*="pageNumber"]"#,
        r#"nav[data-hook="pagination-bar"] li:last-child a"#,
        ".a-pagination li:last-child a",
        r#"a[href*="pageNumber"]"#,
    ])
}

fn pagination_links_patterns() -> Vec<String> {
    strs(&[r#"nav[data-hook="pagination-bar"] a[href*="pageNumber"]"#])
}

/// Every chain compiled, ready for one extraction run.
#[derive(Debug, Clone)]
pub struct Selectors {
    pub product_title: SelectorChain,
    pub total_count: SelectorChain,
    pub review_container: SelectorChain,
    pub review_id: SelectorChain,
    pub reviewer_name: SelectorChain,
    pub star_rating: SelectorChain,
    pub review_title: SelectorChain,
    pub review_date: SelectorChain,
    pub review_body: SelectorChain,
    pub verified_badge: SelectorChain,
    pub helpful_votes: SelectorChain,
    pub review_images: SelectorChain,
    pub reviewer_location: SelectorChain,
    pub purchase_variant: SelectorChain,
    pub product_asin: SelectorChain,
    pub see_all_reviews: SelectorChain,
    pub pagination_bar: SelectorChain,
    pub next_page: SelectorChain,
    pub pagination_links: SelectorChain,
}

impl Selectors {
    /// Compiles every chain in `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::SelectorChain`] naming the first chain with
    /// no valid candidate.
    pub fn compile(config: &SelectorConfig) -> Result<Self, ExtractError> {
        Ok(Self {
            product_title: SelectorChain::compile("product_title", &config.product_title)?,
            total_count: SelectorChain::compile("total_count", &config.total_count)?,
            review_container: SelectorChain::compile("review_container", &config.review_container)?,
            review_id: SelectorChain::compile("review_id", &config.review_id)?,
            reviewer_name: SelectorChain::compile("reviewer_name", &config.reviewer_name)?,
            star_rating: SelectorChain::compile("star_rating", &config.star_rating)?,
            review_title: SelectorChain::compile("review_title", &config.review_title)?,
            review_date: SelectorChain::compile("review_date", &config.review_date)?,
            review_body: SelectorChain::compile("review_body", &config.review_body)?,
            verified_badge: SelectorChain::compile("verified_badge", &config.verified_badge)?,
            helpful_votes: SelectorChain::compile("helpful_votes", &config.helpful_votes)?,
            review_images: SelectorChain::compile("review_images", &config.review_images)?,
            reviewer_location: SelectorChain::compile(
                "reviewer_location",
                &config.reviewer_location,
            )?,
            purchase_variant: SelectorChain::compile("purchase_variant", &config.purchase_variant)?,
            product_asin: SelectorChain::compile("product_asin", &config.product_asin)?,
            see_all_reviews: SelectorChain::compile("see_all_reviews", &config.see_all_reviews)?,
            pagination_bar: SelectorChain::compile("pagination_bar", &config.pagination_bar)?,
            next_page: SelectorChain::compile("next_page", &config.next_page)?,
            pagination_links: SelectorChain::compile("pagination_links", &config.pagination_links)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use scraper::Html;

    use super::*;

    fn chain(patterns: &[&str]) -> SelectorChain {
        SelectorChain::compile("test", &strs(patterns)).unwrap()
    }

    #[test]
    fn first_text_skips_candidates_with_empty_text() {
        let html = Html::parse_document(
            r#"<div class="primary">   </div><div class="fallback">hello</div>"#,
        );
        let chain = chain(&[".primary", ".fallback"]);
        assert_eq!(
            chain.first_text(html.root_element()),
            Some("hello".to_string())
        );
    }

    #[test]
    fn first_text_prefers_earlier_candidate() {
        let html = Html::parse_document(
            r#"<div class="primary">first</div><div class="fallback">second</div>"#,
        );
        let chain = chain(&[".primary", ".fallback"]);
        assert_eq!(
            chain.first_text(html.root_element()),
            Some("first".to_string())
        );
    }

    #[test]
    fn first_element_stops_at_existence_even_with_empty_text() {
        let html = Html::parse_document(
            r#"<div class="primary"></div><div class="fallback">ignored</div>"#,
        );
        let chain = chain(&[".primary", ".fallback"]);
        let element = chain.first_element(html.root_element()).unwrap();
        assert_eq!(element.value().attr("class"), Some("primary"));
    }

    #[test]
    fn invalid_candidate_is_skipped_not_fatal() {
        let patterns = strs(&[r#"a:contains("See more reviews")"#, "p"]);
        let chain = SelectorChain::compile("mixed", &patterns).unwrap();
        let html = Html::parse_document("<p>ok</p>");
        assert_eq!(chain.first_text(html.root_element()), Some("ok".to_string()));
    }

    #[test]
    fn chain_with_no_valid_candidate_is_an_error() {
        let patterns = strs(&[r#"a:contains("x")"#]);
        let err = SelectorChain::compile("bad", &patterns).unwrap_err();
        assert!(matches!(err, ExtractError::SelectorChain { chain } if chain == "bad"));
    }

    #[test]
    fn select_all_returns_every_match_of_first_matching_candidate() {
        let html = Html::parse_document(
            r#"<span class="b">1</span><span class="b">2</span><span class="c">3</span>"#,
        );
        let chain = chain(&[".a", ".b", ".c"]);
        let matches = chain.select_all(html.root_element());
        assert_eq!(matches.len(), 2);
    }

    #[test]
    fn first_matches_collects_one_match_per_candidate() {
        let html = Html::parse_document(
            r#"<div class="a">A</div><div class="b">B1</div><div class="b">B2</div>"#,
        );
        let chain = chain(&[".a", ".b", ".missing"]);
        let matches = chain.first_matches(html.root_element());
        let texts: Vec<String> = matches.into_iter().map(element_text).collect();
        assert_eq!(texts, vec!["A".to_string(), "B1".to_string()]);
    }

    #[test]
    fn default_config_compiles() {
        let selectors = Selectors::compile(&SelectorConfig::default()).unwrap();
        assert_eq!(selectors.review_container.name(), "review_container");
        assert_eq!(selectors.next_page.candidates().count(), 4);
    }

    #[test]
    fn empty_json_deserializes_to_defaults() {
        let config: SelectorConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, SelectorConfig::default());
    }

    #[test]
    fn partial_json_overrides_only_named_chains() {
        let config: SelectorConfig =
            serde_json::from_str(r#"{"review_container": [".custom-review"]}"#).unwrap();
        assert_eq!(config.review_container, vec![".custom-review".to_string()]);
        assert_eq!(config.product_title, product_title_patterns());
    }
}
