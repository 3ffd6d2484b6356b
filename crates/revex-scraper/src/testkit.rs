//! Scripted page sessions for exercising the pipeline without a transport.

use async_trait::async_trait;
use revex_core::Timing;

use crate::error::SessionError;
use crate::page::PageSession;

/// Replays a fixed sequence of `(url, document)` pairs.
///
/// Clicks and synthetic clicks advance to the next entry; direct navigation
/// jumps to the entry with the matching URL, or advances when none matches.
/// The final entry absorbs any further advances.
pub(crate) struct ScriptedSession {
    entries: Vec<(String, String)>,
    position: usize,
    pub(crate) clicked: Vec<String>,
    pub(crate) navigated: Vec<String>,
    pub(crate) scrolled: Vec<u64>,
    pub(crate) deny_click: bool,
    pub(crate) deny_dispatch: bool,
    pub(crate) viewport: u64,
    pub(crate) doc_height: u64,
}

impl ScriptedSession {
    pub(crate) fn new(entries: &[(&str, &str)]) -> Self {
        assert!(!entries.is_empty(), "a scripted session needs pages");
        Self {
            entries: entries
                .iter()
                .map(|(url, html)| ((*url).to_string(), (*html).to_string()))
                .collect(),
            position: 0,
            clicked: Vec::new(),
            navigated: Vec::new(),
            scrolled: Vec::new(),
            deny_click: false,
            deny_dispatch: false,
            viewport: 0,
            doc_height: 0,
        }
    }

    pub(crate) fn single(url: &str, html: &str) -> Self {
        Self::new(&[(url, html)])
    }

    fn advance(&mut self) {
        if self.position + 1 < self.entries.len() {
            self.position += 1;
        }
    }
}

#[async_trait]
impl PageSession for ScriptedSession {
    fn current_url(&self) -> &str {
        &self.entries[self.position].0
    }

    async fn content(&mut self) -> Result<String, SessionError> {
        Ok(self.entries[self.position].1.clone())
    }

    async fn document_height(&mut self) -> Result<u64, SessionError> {
        Ok(self.doc_height)
    }

    async fn viewport_height(&mut self) -> Result<u64, SessionError> {
        Ok(self.viewport)
    }

    async fn scroll_to(&mut self, y: u64) -> Result<(), SessionError> {
        self.scrolled.push(y);
        Ok(())
    }

    async fn click(&mut self, selector: &str) -> Result<(), SessionError> {
        if self.deny_click {
            return Err(SessionError::InteractionUnsupported {
                interaction: "click".to_string(),
            });
        }
        self.clicked.push(selector.to_string());
        self.advance();
        Ok(())
    }

    async fn dispatch_click(&mut self, selector: &str) -> Result<(), SessionError> {
        if self.deny_dispatch {
            return Err(SessionError::InteractionUnsupported {
                interaction: "dispatched click".to_string(),
            });
        }
        self.clicked.push(selector.to_string());
        self.advance();
        Ok(())
    }

    async fn navigate(&mut self, url: &str) -> Result<(), SessionError> {
        self.navigated.push(url.to_string());
        if let Some(index) = self.entries.iter().position(|(entry, _)| entry == url) {
            self.position = index;
        } else {
            self.advance();
        }
        Ok(())
    }
}

/// Millisecond-scale timing so polled waits finish immediately in tests.
pub(crate) fn fast_timing() -> Timing {
    Timing {
        scroll_settle_ms: 1,
        scroll_max_steps: 3,
        post_scroll_delay_ms: 1,
        reviews_poll_interval_ms: 1,
        reviews_poll_attempts: 3,
        page_poll_interval_ms: 1,
        page_poll_attempts: 3,
        page_settle_ms: 1,
        post_nav_settle_ms: 1,
        inter_page_delay_ms: 1,
        resume_settle_ms: 1,
    }
}
