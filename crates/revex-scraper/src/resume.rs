//! Resume detection for interrupted runs.
//!
//! Every page navigation destroys the page-side execution context, so on
//! arrival at a review page the durable slots are checked for a run that
//! was mid-flight when the previous context died.

use serde::de::DeserializeOwned;
use tracing::warn;

use revex_core::{ExtractionSettings, SessionState, SessionSummary};

use crate::parse;
use crate::store::{get_json, StateStore, STATE_KEY, SUMMARY_KEY};

/// One resumable run, recovered from the durable slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResumePlan {
    /// Page the interrupted run continues on, read off the current URL.
    pub page: u32,
    /// Options the interrupted run was started with.
    pub settings: ExtractionSettings,
}

/// Decides whether the durable slots describe an interrupted run.
///
/// The coordinating summary is consulted first and wins even when the local
/// slot also claims a run; a summary that is mid-run but carries no settings
/// vetoes resumption outright. The resume page always comes from the current
/// URL rather than a stored page counter, because the counter lags the page
/// the last navigation actually landed on.
#[must_use]
pub fn plan_resume(
    summary: Option<&SessionSummary>,
    local: Option<&SessionState>,
    current_url: &str,
) -> Option<ResumePlan> {
    let page = parse::page_number_from_url(current_url).unwrap_or(1);
    if let Some(summary) = summary {
        if summary.is_extracting {
            return summary
                .settings
                .map(|settings| ResumePlan { page, settings });
        }
    }
    let local = local?;
    if local.is_extracting {
        return Some(ResumePlan {
            page,
            settings: local.settings,
        });
    }
    None
}

/// Reads both durable slots and plans a resume for `current_url`.
///
/// A slot that cannot be read or no longer deserializes is treated as
/// absent; a damaged slot must never wedge startup.
pub async fn load_resume_plan(store: &dyn StateStore, current_url: &str) -> Option<ResumePlan> {
    let summary: Option<SessionSummary> = read_slot(store, SUMMARY_KEY).await;
    let local: Option<SessionState> = read_slot(store, STATE_KEY).await;
    plan_resume(summary.as_ref(), local.as_ref(), current_url)
}

async fn read_slot<T: DeserializeOwned>(store: &dyn StateStore, key: &str) -> Option<T> {
    match get_json(store, key).await {
        Ok(slot) => slot,
        Err(err) => {
            warn!(key, error = %err, "ignoring unreadable state slot");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::store::MemoryStore;

    use super::*;

    const PAGE_SEVEN: &str = "https://example.com/product-reviews/B000TEST01?pageNumber=7";

    fn mid_run_summary() -> SessionSummary {
        SessionSummary {
            is_extracting: true,
            total_reviews: 40,
            total_pages: 4,
            current_page: 2,
            product_title: "Widget".to_string(),
            settings: Some(ExtractionSettings::default()),
        }
    }

    fn mid_run_state() -> SessionState {
        let mut state = SessionState::started(ExtractionSettings {
            include_images: true,
            ..ExtractionSettings::default()
        });
        state.mark_extracted(3);
        state
    }

    #[test]
    fn summary_mid_run_resumes_at_the_url_page() {
        let plan = plan_resume(Some(&mid_run_summary()), None, PAGE_SEVEN).unwrap();
        assert_eq!(plan.page, 7);
        assert_eq!(plan.settings, ExtractionSettings::default());
    }

    #[test]
    fn url_page_wins_over_the_stored_counter() {
        // The stored counter says page 3; the context actually arrived on 7.
        let state = mid_run_state();
        assert_eq!(state.current_page, 3);
        let plan = plan_resume(None, Some(&state), PAGE_SEVEN).unwrap();
        assert_eq!(plan.page, 7);
        assert!(plan.settings.include_images);
    }

    #[test]
    fn summary_without_settings_vetoes_resume() {
        let mut summary = mid_run_summary();
        summary.settings = None;
        assert_eq!(
            plan_resume(Some(&summary), Some(&mid_run_state()), PAGE_SEVEN),
            None
        );
    }

    #[test]
    fn idle_slots_do_not_resume() {
        let mut summary = mid_run_summary();
        summary.is_extracting = false;
        let mut state = mid_run_state();
        state.is_extracting = false;
        assert_eq!(plan_resume(Some(&summary), Some(&state), PAGE_SEVEN), None);
        assert_eq!(plan_resume(None, None, PAGE_SEVEN), None);
    }

    #[test]
    fn page_defaults_to_one_without_a_page_parameter() {
        let plan = plan_resume(
            Some(&mid_run_summary()),
            None,
            "https://example.com/product-reviews/B000TEST01",
        )
        .unwrap();
        assert_eq!(plan.page, 1);
    }

    #[tokio::test]
    async fn load_ignores_a_corrupt_slot() {
        let store = MemoryStore::new();
        store.set(SUMMARY_KEY, json!("not an object")).await.unwrap();
        crate::store::set_json(&store, STATE_KEY, &mid_run_state())
            .await
            .unwrap();

        let plan = load_resume_plan(&store, PAGE_SEVEN).await.unwrap();
        assert_eq!(plan.page, 7);
    }

    #[tokio::test]
    async fn load_with_empty_slots_plans_nothing() {
        let store = MemoryStore::new();
        assert_eq!(load_resume_plan(&store, PAGE_SEVEN).await, None);
    }
}
