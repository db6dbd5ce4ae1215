// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Scripted in-memory application for engine tests
//!
//! Pages are keyed by absolute URL under `http://app.test/`. Links are
//! absolute `<a href>` elements, and firing a link navigates to its target.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::browser::{Browser, BrowserFactory};
use crate::candidate::hrefs;
use crate::error::{Error, Result};
use crate::state::{Action, How, Snapshot};

pub(crate) const ORIGIN: &str = "http://app.test";

/// Absolute URL for a path on the fake origin
pub(crate) fn url(path: &str) -> String {
    format!("{}{}", ORIGIN, path)
}

/// HTML page with a body text and absolute links to `links`
pub(crate) fn page(body: &str, links: &[&str]) -> String {
    let anchors: String = links
        .iter()
        .map(|l| format!(r#"<a href="{}">{}</a>"#, url(l), l))
        .collect();
    format!("<html><body><p>{}</p>{}</body></html>", body, anchors)
}

#[derive(Default)]
pub(crate) struct FakeApp {
    pages: Mutex<HashMap<String, String>>,
    hanging: Mutex<HashSet<String>>,
    panicking: Mutex<HashSet<String>>,
    fail_creations: AtomicU32,
    created: AtomicU32,
    resets: AtomicUsize,
    closed: AtomicUsize,
    reset_gate: Mutex<Option<Arc<Notify>>>,
    reset_began: Notify,
}

impl FakeApp {
    /// App with an empty root page
    pub fn new() -> Arc<Self> {
        let app = Arc::new(Self::default());
        app.set_page("/", page("root", &[]));
        app
    }

    pub fn set_page(&self, path: &str, html: impl Into<String>) {
        self.pages.lock().insert(url(path), html.into());
    }

    /// Page outside the application origin
    pub fn set_external_page(&self, absolute_url: &str, html: impl Into<String>) {
        self.pages.lock().insert(absolute_url.to_string(), html.into());
    }

    /// Page with its own path as body text, so every page is distinct
    pub fn link_page(&self, path: &str, links: &[&str]) {
        self.set_page(path, page(path, links));
    }

    /// Loading `path` never completes
    pub fn hang_on(&self, path: &str) {
        self.hanging.lock().insert(url(path));
    }

    /// Firing a link to `path` panics inside the browser
    pub fn panic_on_fire(&self, path: &str) {
        self.panicking.lock().insert(url(path));
    }

    /// Resets wait until the returned gate is notified
    pub fn hold_resets(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.reset_gate.lock() = Some(gate.clone());
        gate
    }

    /// Completes once a held reset has started
    pub async fn reset_started(&self) {
        self.reset_began.notified().await;
    }

    /// Handles closed across the app
    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn fail_next_creations(&self, n: u32) {
        self.fail_creations.store(n, Ordering::SeqCst);
    }

    /// Resets performed across all handles
    pub fn resets(&self) -> usize {
        self.resets.load(Ordering::SeqCst)
    }

    pub fn created(&self) -> u32 {
        self.created.load(Ordering::SeqCst)
    }

    pub fn factory(self: &Arc<Self>) -> FakeFactory {
        FakeFactory { app: self.clone() }
    }

    async fn load(&self, target: &str) -> Result<String> {
        let hang = self.hanging.lock().contains(target);
        if hang {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        self.pages
            .lock()
            .get(target)
            .cloned()
            .ok_or_else(|| Error::navigation_failed(target, "404"))
    }
}

pub(crate) struct FakeFactory {
    app: Arc<FakeApp>,
}

#[async_trait]
impl BrowserFactory for FakeFactory {
    async fn create(&self) -> Result<Box<dyn Browser>> {
        let pending = self.app.fail_creations.load(Ordering::SeqCst);
        if pending > 0 {
            self.app.fail_creations.store(pending - 1, Ordering::SeqCst);
            return Err(Error::other("browser failed to start"));
        }

        let n = self.app.created.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeBrowser {
            id: format!("fake-{}", n),
            app: self.app.clone(),
            current: None,
        }))
    }
}

pub(crate) struct FakeBrowser {
    id: String,
    app: Arc<FakeApp>,
    current: Option<(String, String)>,
}

#[async_trait]
impl Browser for FakeBrowser {
    fn id(&self) -> &str {
        &self.id
    }

    async fn navigate(&mut self, url: &str) -> Result<()> {
        let dom = self.app.load(url).await?;
        self.current = Some((url.to_string(), dom));
        Ok(())
    }

    async fn snapshot(&mut self) -> Result<Snapshot> {
        self.current
            .as_ref()
            .map(|(url, dom)| Snapshot::new(url.as_str(), dom.as_str()))
            .ok_or_else(|| Error::other("nothing loaded"))
    }

    async fn fire(&mut self, action: &Action) -> Result<()> {
        if action.element.how != How::Href {
            return Err(Error::UnsupportedAction(action.to_string()));
        }
        let present = self
            .current
            .as_ref()
            .is_some_and(|(_, dom)| hrefs(dom).contains(&action.element.value));
        if !present {
            return Err(Error::element_not_found(action));
        }

        let target = action.element.value.clone();
        let panics = self.app.panicking.lock().contains(&target);
        if panics {
            panic!("browser crashed firing {}", target);
        }
        let dom = self.app.load(&target).await?;
        self.current = Some((target, dom));
        Ok(())
    }

    async fn reset(&mut self) -> Result<()> {
        let gate = self.app.reset_gate.lock().clone();
        if let Some(gate) = gate {
            self.app.reset_began.notify_one();
            gate.notified().await;
        }
        self.app.resets.fetch_add(1, Ordering::SeqCst);
        self.current = None;
        Ok(())
    }

    async fn close(&mut self) {
        self.app.closed.fetch_add(1, Ordering::SeqCst);
    }
}
