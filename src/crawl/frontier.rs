// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Pending paths awaiting exploration
//!
//! Workers block in [`Frontier::next`] until a path is available. The
//! frontier is exhausted when the queue is empty and no path is in flight,
//! since only an in-flight path can enqueue more work.

use std::collections::VecDeque;

use parking_lot::Mutex;
use tokio::sync::Notify;

use super::config::ExplorationOrder;
use crate::state::Path;

struct FrontierInner {
    queue: VecDeque<Path>,
    in_flight: usize,
    closed: bool,
}

/// Shared work queue of paths
pub struct Frontier {
    order: ExplorationOrder,
    inner: Mutex<FrontierInner>,
    notify: Notify,
}

impl Frontier {
    pub fn new(order: ExplorationOrder) -> Self {
        Self {
            order,
            inner: Mutex::new(FrontierInner {
                queue: VecDeque::new(),
                in_flight: 0,
                closed: false,
            }),
            notify: Notify::new(),
        }
    }

    /// Queue a path. Returns `false` once the frontier is closed.
    pub fn push(&self, path: Path) -> bool {
        {
            let mut inner = self.inner.lock();
            if inner.closed {
                return false;
            }
            inner.queue.push_back(path);
        }
        self.notify.notify_waiters();
        true
    }

    /// Take the next path, waiting while other paths are in flight.
    ///
    /// Returns `None` when the frontier is closed or exhausted. Every path
    /// returned must be handed back with [`Frontier::complete`].
    pub async fn next(&self) -> Option<Path> {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            // Register before checking so a push between check and await is not lost
            notified.as_mut().enable();

            {
                let mut inner = self.inner.lock();
                if inner.closed {
                    return None;
                }

                let path = match self.order {
                    ExplorationOrder::BreadthFirst => inner.queue.pop_front(),
                    ExplorationOrder::DepthFirst => inner.queue.pop_back(),
                };
                if let Some(path) = path {
                    inner.in_flight += 1;
                    return Some(path);
                }

                if inner.in_flight == 0 {
                    inner.closed = true;
                    drop(inner);
                    self.notify.notify_waiters();
                    return None;
                }
            }

            notified.await;
        }
    }

    /// Mark one path returned by [`Frontier::next`] as done
    pub fn complete(&self) {
        {
            let mut inner = self.inner.lock();
            inner.in_flight = inner.in_flight.saturating_sub(1);
        }
        self.notify.notify_waiters();
    }

    /// Stop handing out paths; waiting workers return `None`
    pub fn close(&self) {
        self.inner.lock().closed = true;
        self.notify.notify_waiters();
    }

    pub fn is_closed(&self) -> bool {
        self.inner.lock().closed
    }

    /// Paths waiting in the queue
    pub fn len(&self) -> usize {
        self.inner.lock().queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Paths handed out and not yet completed
    pub fn in_flight(&self) -> usize {
        self.inner.lock().in_flight
    }
}

impl std::fmt::Debug for Frontier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("Frontier")
            .field("order", &self.order)
            .field("queued", &inner.queue.len())
            .field("in_flight", &inner.in_flight)
            .field("closed", &inner.closed)
            .finish()
    }
}
