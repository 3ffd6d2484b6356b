use revex_core::ExtractionSettings;
use scraper::Html;

use super::*;
use crate::selectors::SelectorConfig;
use crate::testkit::{fast_timing, ScriptedSession};

fn selectors() -> Selectors {
    Selectors::compile(&SelectorConfig::default()).unwrap()
}

fn all_settings() -> ExtractionSettings {
    ExtractionSettings {
        include_images: true,
        include_helpful: true,
        include_verified: true,
    }
}

const FULL_REVIEW: &str = r#"
<div data-hook="review" id="R1KEXAMPLE">
  <span class="a-profile-name">Jane Doe</span>
  <span class="a-profile-location">Portland, OR</span>
  <i data-hook="review-star-rating"><span class="a-icon-alt">4.0 out of 5 stars</span></i>
  <a data-hook="review-title">4.0 out of 5 stars Nice product</a>
  <span data-hook="review-date">Reviewed in the United States on July 26, 2019</span>
  <span class="a-size-mini a-color-secondary">Color: Black</span>
  <span data-hook="avp-badge">Verified Purchase</span>
  <span data-hook="review-body">Works
      as   expected.
  </span>
  <span data-hook="helpful-vote-statement">3 people found this helpful</span>
  <div data-hook="review-image"><img src="https://img.example/1.jpg"></div>
  <div data-hook="review-image"><img src="https://img.example/2.jpg"></div>
</div>
"#;

#[test]
fn full_review_extracts_every_field() {
    let document = Html::parse_document(FULL_REVIEW);
    let reviews = extract_reviews(&document, &selectors(), all_settings());
    assert_eq!(reviews.len(), 1);

    let review = &reviews[0];
    assert_eq!(review.id, "R1KEXAMPLE");
    assert_eq!(review.reviewer_name, "Jane Doe");
    assert_eq!(review.rating, Some(4.0));
    assert_eq!(review.title, "Nice product");
    assert_eq!(review.date, "2019-07-26");
    assert_eq!(review.country, "United States");
    assert_eq!(review.text, "Works as expected.");
    assert_eq!(review.verified_purchase, Some(true));
    assert_eq!(review.helpful_votes, Some(3));
    assert_eq!(
        review.images,
        Some(vec![
            "https://img.example/1.jpg".to_string(),
            "https://img.example/2.jpg".to_string(),
        ])
    );
    assert_eq!(review.location, "Portland, OR");
    assert_eq!(review.variant, "Color: Black");
}

#[test]
fn optional_fields_stay_absent_when_settings_are_off() {
    let document = Html::parse_document(FULL_REVIEW);
    let reviews = extract_reviews(&document, &selectors(), ExtractionSettings::default());
    let review = &reviews[0];
    assert_eq!(review.verified_purchase, None);
    assert_eq!(review.helpful_votes, None);
    assert_eq!(review.images, None);
}

#[test]
fn review_without_body_text_is_discarded() {
    let document = Html::parse_document(
        r#"<div data-hook="review" id="R2">
             <span class="a-profile-name">Jane Doe</span>
           </div>"#,
    );
    assert!(extract_reviews(&document, &selectors(), all_settings()).is_empty());
}

#[test]
fn review_without_reviewer_is_discarded() {
    let document = Html::parse_document(
        r#"<div data-hook="review" id="R3">
             <span data-hook="review-body">Decent value for the price.</span>
           </div>"#,
    );
    assert!(extract_reviews(&document, &selectors(), all_settings()).is_empty());
}

#[test]
fn id_falls_back_to_review_id_element() {
    let document = Html::parse_document(
        r#"<div data-hook="review">
             <span data-hook="review-id">RID777</span>
             <span class="a-profile-name">Sam</span>
             <span data-hook="review-body">Fine.</span>
           </div>"#,
    );
    let reviews = extract_reviews(&document, &selectors(), all_settings());
    assert_eq!(reviews[0].id, "RID777");
}

#[test]
fn id_is_synthesized_when_no_source_exposes_one() {
    let document = Html::parse_document(
        r#"<div data-hook="review">
             <span class="a-profile-name">Jane Doe</span>
             <span data-hook="review-date">Reviewed in the United States on July 26, 2019</span>
             <i data-hook="review-star-rating"><span class="a-icon-alt">4.0 out of 5 stars</span></i>
             <span data-hook="review-body">Great.</span>
           </div>"#,
    );
    let reviews = extract_reviews(&document, &selectors(), all_settings());
    assert_eq!(
        reviews[0].id,
        "review_JaneDoe_ReviewedintheUnitedStatesonJuly262019_40outof5stars"
    );
}

#[test]
fn synthesized_id_components_default_to_unknown() {
    let document = Html::parse_document(
        r#"<div data-hook="review">
             <span class="a-profile-name">Sam</span>
             <span data-hook="review-body">Okay.</span>
           </div>"#,
    );
    let reviews = extract_reviews(&document, &selectors(), all_settings());
    assert_eq!(reviews[0].id, "review_Sam_unknown_unknown");
}

#[test]
fn rating_chain_is_existence_gated() {
    // The first matching candidate wins even when its text is empty; a
    // textful element reachable only through a later candidate is ignored.
    let document = Html::parse_document(
        r#"<div data-hook="review">
             <span class="a-icon-alt">5.0 out of 5 stars</span>
             <i data-hook="review-star-rating"><span class="a-icon-alt"></span></i>
             <span class="a-profile-name">Sam</span>
             <span data-hook="review-body">Okay.</span>
           </div>"#,
    );
    let reviews = extract_reviews(&document, &selectors(), all_settings());
    assert_eq!(reviews[0].rating, None);
}

#[test]
fn missing_title_gets_placeholder() {
    let document = Html::parse_document(
        r#"<div data-hook="review" id="R4">
             <span class="a-profile-name">Sam</span>
             <span data-hook="review-body">Okay.</span>
           </div>"#,
    );
    let reviews = extract_reviews(&document, &selectors(), all_settings());
    assert_eq!(reviews[0].title, "No Title");
}

#[test]
fn helpful_votes_zero_without_a_number_or_element() {
    let with_statement = Html::parse_document(
        r#"<div data-hook="review" id="R5">
             <span class="a-profile-name">Sam</span>
             <span data-hook="review-body">Okay.</span>
             <span data-hook="helpful-vote-statement">One person found this helpful</span>
           </div>"#,
    );
    let reviews = extract_reviews(&with_statement, &selectors(), all_settings());
    assert_eq!(reviews[0].helpful_votes, Some(0));

    let without_statement = Html::parse_document(
        r#"<div data-hook="review" id="R6">
             <span class="a-profile-name">Sam</span>
             <span data-hook="review-body">Okay.</span>
           </div>"#,
    );
    let reviews = extract_reviews(&without_statement, &selectors(), all_settings());
    assert_eq!(reviews[0].helpful_votes, Some(0));
}

#[test]
fn container_chain_uses_first_matching_candidate_only() {
    // Legacy `.review` containers are ignored once hook-attributed ones exist.
    let document = Html::parse_document(
        r#"<div data-hook="review" id="R7">
             <span class="a-profile-name">A</span>
             <span data-hook="review-body">First.</span>
           </div>
           <div class="review" id="R8">
             <span class="a-profile-name">B</span>
             <span data-hook="review-body">Second.</span>
           </div>"#,
    );
    let reviews = extract_reviews(&document, &selectors(), all_settings());
    assert_eq!(reviews.len(), 1);
    assert_eq!(reviews[0].id, "R7");
}

#[test]
fn product_info_reads_title_and_id_from_url() {
    let document = Html::parse_document(
        r#"<h1 data-automation-id="title">Widget Max</h1>
           <div data-hook="cr-filter-info-review-rating-count">88 customer reviews</div>"#,
    );
    let info = extract_product_info(
        &document,
        &selectors(),
        "https://example.com/product-reviews/B000TEST99?pageNumber=1",
    );
    assert_eq!(info.title, "Widget Max");
    assert_eq!(info.product_id, "B000TEST99");
    assert_eq!(info.total_reviews, 88);
    assert!(info.url.contains("/product-reviews/"));
}

#[test]
fn product_id_falls_back_to_page_attribute() {
    let document = Html::parse_document(r#"<div data-asin="B000ASIN77">widget</div>"#);
    let info = extract_product_info(&document, &selectors(), "https://example.com/reviews");
    assert_eq!(info.product_id, "B000ASIN77");
}

#[test]
fn product_info_defaults_on_a_bare_page() {
    let document = Html::parse_document("<p>nothing</p>");
    let info = extract_product_info(&document, &selectors(), "https://example.com/");
    assert_eq!(info.title, "Unknown Product");
    assert_eq!(info.product_id, "Unknown");
    assert_eq!(info.total_reviews, 0);
}

#[test]
fn total_count_skips_candidates_without_a_parseable_count() {
    let document = Html::parse_document(
        r#"<div data-hook="cr-filter-info-review-rating-count">See all reviews</div>
           <div class="a-row a-spacing-base a-size-base">77 reviews</div>"#,
    );
    assert_eq!(extract_total_reviews(&document, &selectors()), 77);
}

#[tokio::test]
async fn zero_viewport_session_skips_the_scroll_walk() {
    let mut session = ScriptedSession::single(
        "https://example.com/product-reviews/B000TEST01?pageNumber=1",
        FULL_REVIEW,
    );
    let reviews = extract_page_reviews(&mut session, &selectors(), all_settings(), &fast_timing())
        .await
        .unwrap();
    assert_eq!(reviews.len(), 1);
    assert!(session.scrolled.is_empty());
}

#[tokio::test]
async fn scroll_walk_steps_through_the_document_and_returns_to_top() {
    let mut session = ScriptedSession::single(
        "https://example.com/product-reviews/B000TEST01?pageNumber=1",
        FULL_REVIEW,
    );
    session.viewport = 1000;
    session.doc_height = 3000;

    let mut timing = fast_timing();
    timing.scroll_max_steps = 10;

    extract_page_reviews(&mut session, &selectors(), all_settings(), &timing)
        .await
        .unwrap();
    assert_eq!(session.scrolled, vec![800, 1600, 2400, 3200, 0]);
}
