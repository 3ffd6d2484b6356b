use std::path::PathBuf;

use crate::app_config::{AppConfig, Timing};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if any env var holds an unparseable value.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files; useful for testing
/// or when the caller manages env setup.
///
/// # Errors
///
/// Returns `ConfigError` if any env var holds an unparseable value.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// This is the core parsing logic, decoupled from the actual environment so it
/// can be tested with a pure `HashMap` lookup, no `set_var`/`remove_var` needed.
/// Every variable has a default, so an empty environment is valid.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let log_level = or_default("REVEX_LOG_LEVEL", "info");
    let store_path = PathBuf::from(or_default("REVEX_STORE_PATH", "./revex-state.json"));
    let user_agent = or_default("REVEX_USER_AGENT", "revex/0.1 (review-extractor)");
    let request_timeout_secs = parse_u64("REVEX_REQUEST_TIMEOUT_SECS", "30")?;

    let timing = Timing {
        scroll_settle_ms: parse_u64("REVEX_SCROLL_SETTLE_MS", "1500")?,
        scroll_max_steps: parse_u32("REVEX_SCROLL_MAX_STEPS", "10")?,
        post_scroll_delay_ms: parse_u64("REVEX_POST_SCROLL_DELAY_MS", "1500")?,
        reviews_poll_interval_ms: parse_u64("REVEX_REVIEWS_POLL_INTERVAL_MS", "500")?,
        reviews_poll_attempts: parse_u32("REVEX_REVIEWS_POLL_ATTEMPTS", "20")?,
        page_poll_interval_ms: parse_u64("REVEX_PAGE_POLL_INTERVAL_MS", "500")?,
        page_poll_attempts: parse_u32("REVEX_PAGE_POLL_ATTEMPTS", "60")?,
        page_settle_ms: parse_u64("REVEX_PAGE_SETTLE_MS", "2000")?,
        post_nav_settle_ms: parse_u64("REVEX_POST_NAV_SETTLE_MS", "3000")?,
        inter_page_delay_ms: parse_u64("REVEX_INTER_PAGE_DELAY_MS", "2000")?,
        resume_settle_ms: parse_u64("REVEX_RESUME_SETTLE_MS", "2000")?,
    };

    Ok(AppConfig {
        log_level,
        store_path,
        user_agent,
        request_timeout_secs,
        timing,
    })
}
