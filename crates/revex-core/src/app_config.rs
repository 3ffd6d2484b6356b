//! Application configuration types.
//!
//! Built from environment variables by [`crate::config`]. Delay and poll
//! budgets live in [`Timing`] so the scraper crate can take them as one value
//! and tests can construct near-zero variants directly.

use std::path::PathBuf;

/// Top-level application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Log filter directive (e.g. `info`, `revex_scraper=debug`).
    pub log_level: String,

    /// Path of the JSON state-store file.
    pub store_path: PathBuf,

    /// `User-Agent` header for page fetches.
    pub user_agent: String,

    /// Whole-request timeout for page fetches, in seconds.
    pub request_timeout_secs: u64,

    /// Delay and poll budgets for waits, scrolling, and pacing.
    pub timing: Timing,
}

/// Delay and poll budgets used across the extraction pipeline.
///
/// Defaults are tuned for the supported page template's lazy loading and
/// navigation behavior. Tests construct this directly with near-zero values.
#[derive(Debug, Clone, Copy)]
pub struct Timing {
    /// Settle time after each lazy-load scroll step, in milliseconds.
    pub scroll_settle_ms: u64,
    /// Upper bound on lazy-load scroll steps per page.
    pub scroll_max_steps: u32,
    /// Pause after scrolling back to the top, in milliseconds.
    pub post_scroll_delay_ms: u64,
    /// Poll interval while waiting for review containers post-scroll.
    pub reviews_poll_interval_ms: u64,
    /// Poll attempts while waiting for review containers post-scroll.
    pub reviews_poll_attempts: u32,
    /// Poll interval while waiting for a page to finish loading.
    pub page_poll_interval_ms: u64,
    /// Poll attempts while waiting for a page to finish loading.
    pub page_poll_attempts: u32,
    /// Settle time after a page reports loaded, in milliseconds.
    pub page_settle_ms: u64,
    /// Settle time after a next-page navigation, in milliseconds.
    pub post_nav_settle_ms: u64,
    /// Pacing delay between page extractions, in milliseconds.
    pub inter_page_delay_ms: u64,
    /// Settle time before a resumed run re-reads its page, in milliseconds.
    pub resume_settle_ms: u64,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            scroll_settle_ms: 1500,
            scroll_max_steps: 10,
            post_scroll_delay_ms: 1500,
            reviews_poll_interval_ms: 500,
            reviews_poll_attempts: 20,
            page_poll_interval_ms: 500,
            page_poll_attempts: 60,
            page_settle_ms: 2000,
            post_nav_settle_ms: 3000,
            inter_page_delay_ms: 2000,
            resume_settle_ms: 2000,
        }
    }
}
