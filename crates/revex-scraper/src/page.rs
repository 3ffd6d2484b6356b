//! Abstraction over a live page context.
//!
//! The extraction pipeline never touches a transport directly; it drives a
//! [`PageSession`] and works on the HTML snapshots the session hands back.
//! The production backend is [`HttpSession`](crate::http_session::HttpSession).
//! Tests substitute a scripted session that replays canned documents.

use async_trait::async_trait;
use reqwest::Url;

use crate::error::SessionError;

/// A stateful view of one page at a time, navigable between pages.
///
/// All methods that can observe or mutate the live document take `&mut self`:
/// the session is a single execution context and pages are visited strictly
/// one after another.
#[async_trait]
pub trait PageSession: Send {
    /// URL of the page the session is currently on.
    fn current_url(&self) -> &str;

    /// Full HTML of the current document.
    async fn content(&mut self) -> Result<String, SessionError>;

    /// Total scrollable height of the current document, in pixels.
    ///
    /// Backends without a rendered layout report `0`.
    async fn document_height(&mut self) -> Result<u64, SessionError>;

    /// Height of the visible viewport, in pixels.
    ///
    /// Backends without a rendered layout report `0`.
    async fn viewport_height(&mut self) -> Result<u64, SessionError>;

    /// Scroll the document to the given vertical offset.
    async fn scroll_to(&mut self, y: u64) -> Result<(), SessionError>;

    /// Activate the first element matching `selector` as a user click would.
    ///
    /// For link elements this follows the link, changing the current page.
    /// Returns [`SessionError::ElementNotFound`] when nothing matches.
    async fn click(&mut self, selector: &str) -> Result<(), SessionError>;

    /// Activate the first element matching `selector` by dispatching a
    /// synthetic click event instead of a native click.
    ///
    /// Backends that cannot synthesize events return
    /// [`SessionError::InteractionUnsupported`].
    async fn dispatch_click(&mut self, selector: &str) -> Result<(), SessionError>;

    /// Load `url` directly, replacing the current page.
    async fn navigate(&mut self, url: &str) -> Result<(), SessionError>;
}

/// Resolves a document-relative `href` against the page it appears on.
///
/// # Errors
///
/// Returns [`SessionError::BadUrl`] when `base` is not an absolute URL or
/// `href` cannot be joined onto it.
pub fn resolve_href(base: &str, href: &str) -> Result<String, SessionError> {
    let base = Url::parse(base).map_err(|err| SessionError::BadUrl {
        url: base.to_string(),
        reason: err.to_string(),
    })?;
    let resolved = base.join(href).map_err(|err| SessionError::BadUrl {
        url: href.to_string(),
        reason: err.to_string(),
    })?;
    Ok(resolved.into())
}
