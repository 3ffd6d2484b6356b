//! HTTP-backed page session.
//!
//! Each navigation is one GET; the response body is cached and every
//! [`PageSession::content`] call reads the cache, so selector work never
//! refetches. Rendered-viewport questions have no HTTP answer: heights
//! report zero, which makes the reader skip its lazy-load scroll walk, and
//! synthetic clicks are unsupported so link activation falls through to the
//! resolved-href navigation rung.

use std::time::Duration;

use async_trait::async_trait;
use scraper::{Html, Selector};
use tracing::{debug, warn};

use crate::error::SessionError;
use crate::page::{resolve_href, PageSession};

/// Builds the HTTP client used for page fetches.
///
/// # Errors
///
/// Returns [`SessionError::Http`] when the client cannot be constructed.
pub fn build_client(user_agent: &str, timeout_secs: u64) -> Result<reqwest::Client, SessionError> {
    let client = reqwest::Client::builder()
        .user_agent(user_agent)
        .timeout(Duration::from_secs(timeout_secs))
        .build()?;
    Ok(client)
}

/// A page session driven over plain HTTP.
pub struct HttpSession {
    client: reqwest::Client,
    current_url: String,
    body: String,
}

impl HttpSession {
    /// Opens a session by fetching `url`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Http`] when the initial fetch fails.
    pub async fn open(client: reqwest::Client, url: &str) -> Result<Self, SessionError> {
        let mut session = Self {
            client,
            current_url: url.to_string(),
            body: String::new(),
        };
        session.fetch(url.to_string()).await?;
        Ok(session)
    }

    async fn fetch(&mut self, url: String) -> Result<(), SessionError> {
        debug!(url = url.as_str(), "fetching page");
        let response = self.client.get(&url).send().await?;
        let status = response.status();
        let final_url = response.url().to_string();
        let body = response.text().await?;
        if !status.is_success() {
            // Review pages sometimes answer with an error status but a
            // usable document; the selector chains decide what it holds.
            warn!(%status, url = final_url.as_str(), "non-success page fetch");
        }
        self.current_url = final_url;
        self.body = body;
        Ok(())
    }
}

#[async_trait]
impl PageSession for HttpSession {
    fn current_url(&self) -> &str {
        &self.current_url
    }

    async fn content(&mut self) -> Result<String, SessionError> {
        Ok(self.body.clone())
    }

    async fn document_height(&mut self) -> Result<u64, SessionError> {
        Ok(0)
    }

    async fn viewport_height(&mut self) -> Result<u64, SessionError> {
        Ok(0)
    }

    async fn scroll_to(&mut self, _y: u64) -> Result<(), SessionError> {
        Ok(())
    }

    async fn click(&mut self, selector: &str) -> Result<(), SessionError> {
        let href = {
            let document = Html::parse_document(&self.body);
            let compiled =
                Selector::parse(selector).map_err(|_| SessionError::ElementNotFound {
                    selector: selector.to_string(),
                })?;
            let element = document.select(&compiled).next().ok_or_else(|| {
                SessionError::ElementNotFound {
                    selector: selector.to_string(),
                }
            })?;
            element.value().attr("href").map(ToString::to_string)
        };
        let Some(href) = href else {
            return Err(SessionError::InteractionUnsupported {
                interaction: "click on an element without an href".to_string(),
            });
        };
        let target = resolve_href(&self.current_url, &href)?;
        self.fetch(target).await
    }

    async fn dispatch_click(&mut self, _selector: &str) -> Result<(), SessionError> {
        Err(SessionError::InteractionUnsupported {
            interaction: "dispatched click".to_string(),
        })
    }

    async fn navigate(&mut self, url: &str) -> Result<(), SessionError> {
        self.fetch(url.to_string()).await
    }
}
