// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Reference browser handle backed by an HTTP client
//!
//! Fetches documents without executing scripts. Only link actions can be
//! fired: following an `href` loads its target. Useful for server-rendered
//! applications and for exercising the engine end to end.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::redirect::Policy;
use reqwest::Client;
use url::Url;

use super::config::BrowserConfig;
use super::{Browser, BrowserFactory};
use crate::error::{Error, ErrorContext, Result};
use crate::state::{Action, How, Snapshot};

static HANDLE_COUNTER: AtomicU64 = AtomicU64::new(0);

fn build_client(config: &BrowserConfig) -> Result<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(
        "accept",
        HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
    );
    for (name, value) in &config.default_headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| Error::Config(format!("Invalid header name '{}': {}", name, e)))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| Error::Config(format!("Invalid header value: {}", e)))?;
        headers.insert(name, value);
    }

    let mut builder = Client::builder()
        .user_agent(&config.user_agent)
        .timeout(config.timeout)
        .redirect(Policy::limited(10))
        .danger_accept_invalid_certs(config.ignore_https_errors)
        .default_headers(headers)
        .cookie_store(config.persist_cookies);

    if let Some(ref proxy_url) = config.proxy {
        builder = builder.proxy(
            reqwest::Proxy::all(proxy_url)
                .map_err(|e| Error::Config(format!("Invalid proxy URL: {}", e)))?,
        );
    }

    Ok(builder.build()?)
}

/// Browser handle that loads documents over HTTP
pub struct HttpBrowser {
    id: String,
    config: BrowserConfig,
    client: Client,
    current: Option<(Url, String)>,
}

impl HttpBrowser {
    pub fn new(config: BrowserConfig) -> Result<Self> {
        let client = build_client(&config)?;
        let n = HANDLE_COUNTER.fetch_add(1, Ordering::Relaxed);
        Ok(Self {
            id: format!("http-{}", n),
            config,
            client,
            current: None,
        })
    }

    /// URL of the loaded document
    pub fn current_url(&self) -> Option<&Url> {
        self.current.as_ref().map(|(url, _)| url)
    }

    async fn load(&mut self, url: Url) -> Result<()> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .with_url(url.as_str())?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::navigation_failed(url.as_str(), format!("HTTP {}", status)));
        }

        let final_url = response.url().clone();
        let body = response.text().await?;
        tracing::trace!(browser = %self.id, url = %final_url, bytes = body.len(), "Loaded document");
        self.current = Some((final_url, body));
        Ok(())
    }

    /// Whether the document links to `target`, ignoring fragments
    fn link_present(dom: &str, base: &Url, target: &Url) -> bool {
        crate::candidate::hrefs(dom)
            .iter()
            .filter_map(|href| base.join(href).ok())
            .any(|mut u| {
                u.set_fragment(None);
                u == *target
            })
    }
}

#[async_trait]
impl Browser for HttpBrowser {
    fn id(&self) -> &str {
        &self.id
    }

    async fn navigate(&mut self, url: &str) -> Result<()> {
        let parsed = Url::parse(url).with_url(url)?;
        self.load(parsed).await
    }

    async fn snapshot(&mut self) -> Result<Snapshot> {
        match self.current {
            Some((ref url, ref dom)) => Ok(Snapshot::new(url.as_str(), dom.as_str())),
            None => Err(Error::other("No document loaded")),
        }
    }

    async fn fire(&mut self, action: &Action) -> Result<()> {
        if action.element.how != How::Href {
            return Err(Error::UnsupportedAction(action.to_string()));
        }

        let target = {
            let (base, dom) = self
                .current
                .as_ref()
                .ok_or_else(|| Error::element_not_found(action))?;
            let mut target = base.join(&action.element.value)?;
            target.set_fragment(None);
            if !Self::link_present(dom, base, &target) {
                return Err(Error::element_not_found(action));
            }
            target
        };

        self.load(target).await
    }

    async fn reset(&mut self) -> Result<()> {
        // A fresh client is the only way to drop reqwest's cookie store
        self.client = build_client(&self.config)?;
        self.current = None;
        Ok(())
    }

    async fn close(&mut self) {
        self.current = None;
    }
}

/// Creates [`HttpBrowser`] handles
#[derive(Debug, Clone, Default)]
pub struct HttpBrowserFactory {
    config: BrowserConfig,
}

impl HttpBrowserFactory {
    pub fn new(config: BrowserConfig) -> Self {
        Self { config }
    }

    /// Use a per-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }
}

#[async_trait]
impl BrowserFactory for HttpBrowserFactory {
    async fn create(&self) -> Result<Box<dyn Browser>> {
        Ok(Box::new(HttpBrowser::new(self.config.clone())?))
    }
}
