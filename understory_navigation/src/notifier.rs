// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Route change notification.
//!
//! Navigation recurses through the region tree and fans out to children. The
//! [`RouteNotifier`] keeps a reentrant counter per tree root so that one outermost
//! navigation raises exactly one [`RouteChanged`], however many nested calls it made.

use core::fmt;
use core::time::Duration;
use std::sync::Arc;

use hashbrown::HashMap;
use parking_lot::Mutex;
use understory_route::Route;
use web_time::Instant;

use crate::region::RegionId;

/// Raised when the outermost navigation on a root completes.
#[derive(Clone, Debug)]
pub struct RouteChanged {
    /// Root of the region tree that navigated.
    pub root: RegionId,
    /// The tree's merged route after navigating.
    pub route: Option<Route>,
    /// Time since the outermost navigation started.
    pub elapsed: Duration,
}

type Listener = Arc<dyn Fn(&RouteChanged) + Send + Sync>;

#[derive(Clone, Copy, Debug)]
struct Transaction {
    depth: usize,
    started: Instant,
}

/// Coalesces nested navigations into one notification per root.
#[derive(Default)]
pub struct RouteNotifier {
    active: Mutex<HashMap<RegionId, Transaction>>,
    listeners: Mutex<Vec<Listener>>,
}

impl fmt::Debug for RouteNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteNotifier")
            .field("active", &self.active.lock().len())
            .field("listeners", &self.listeners.lock().len())
            .finish()
    }
}

impl RouteNotifier {
    /// Create a notifier with no listeners.
    pub fn new() -> Self {
        Self::default()
    }

    /// Call `listener` for every [`RouteChanged`].
    pub fn subscribe(&self, listener: impl Fn(&RouteChanged) + Send + Sync + 'static) {
        self.listeners.lock().push(Arc::new(listener));
    }

    /// Returns true while a navigation on `root` is in progress.
    pub fn is_navigating(&self, root: RegionId) -> bool {
        self.active.lock().contains_key(&root)
    }

    /// Enter a navigation on `root`. The timer starts with the outermost call.
    pub fn start_navigation(&self, root: RegionId) {
        self.active
            .lock()
            .entry(root)
            .and_modify(|t| t.depth += 1)
            .or_insert_with(|| Transaction {
                depth: 1,
                started: Instant::now(),
            });
    }

    /// Enter a navigation on `root` for as long as the returned guard lives.
    ///
    /// Dropping the guard ends the navigation, so a navigation future that is dropped
    /// mid-flight or unwinds still closes its transaction. `route` is evaluated only if
    /// the guard closes the outermost navigation.
    pub fn enter<F>(&self, root: RegionId, route: F) -> NavigationGuard<'_, F>
    where
        F: FnOnce() -> Option<Route>,
    {
        self.start_navigation(root);
        NavigationGuard {
            notifier: self,
            root,
            route: Some(route),
        }
    }

    /// Leave a navigation on `root`.
    ///
    /// When this closes the outermost navigation, `route` is evaluated and every listener
    /// is called once. Calls without a matching start are logged and ignored.
    pub fn end_navigation(&self, root: RegionId, route: impl FnOnce() -> Option<Route>) {
        let finished = {
            let mut active = self.active.lock();
            let Some(transaction) = active.get_mut(&root) else {
                tracing::warn!(?root, "navigation ended without a matching start");
                return;
            };
            transaction.depth -= 1;
            if transaction.depth > 0 {
                return;
            }
            active.remove(&root)
        };
        let Some(transaction) = finished else {
            return;
        };
        let event = RouteChanged {
            root,
            route: route(),
            elapsed: transaction.started.elapsed(),
        };
        tracing::debug!(?root, route = ?event.route.as_ref().map(ToString::to_string), elapsed = ?event.elapsed, "route changed");
        let listeners = self.listeners.lock().clone();
        for listener in listeners {
            listener(&event);
        }
    }
}

/// Ends a navigation entered with [`RouteNotifier::enter`] when dropped.
#[must_use = "the navigation ends when the guard is dropped"]
pub struct NavigationGuard<'a, F: FnOnce() -> Option<Route>> {
    notifier: &'a RouteNotifier,
    root: RegionId,
    route: Option<F>,
}

impl<F: FnOnce() -> Option<Route>> fmt::Debug for NavigationGuard<'_, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NavigationGuard")
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

impl<F: FnOnce() -> Option<Route>> Drop for NavigationGuard<'_, F> {
    fn drop(&mut self) {
        if let Some(route) = self.route.take() {
            self.notifier.end_navigation(self.root, route);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use understory_route::parse;

    fn root() -> RegionId {
        RegionId::new(0, 1)
    }

    #[test]
    fn nested_navigation_raises_once() {
        let notifier = RouteNotifier::new();
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        notifier.subscribe(move |e| sink.lock().push(e.route.clone()));

        notifier.start_navigation(root());
        notifier.start_navigation(root());
        notifier.start_navigation(root());
        notifier.end_navigation(root(), || panic!("inner end must not evaluate the route"));
        notifier.end_navigation(root(), || None);
        assert!(events.lock().is_empty());
        assert!(notifier.is_navigating(root()));
        notifier.end_navigation(root(), || Some(parse("Shell/Home")));
        assert!(!notifier.is_navigating(root()));

        let events = events.lock();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].as_ref().map(ToString::to_string), Some("Shell/Home".into()));
    }

    #[test]
    fn roots_are_independent() {
        let notifier = RouteNotifier::new();
        let count = Arc::new(Mutex::new(0));
        let c = count.clone();
        notifier.subscribe(move |_| *c.lock() += 1);
        let other = RegionId::new(1, 1);
        notifier.start_navigation(root());
        notifier.start_navigation(other);
        notifier.end_navigation(other, || None);
        assert_eq!(*count.lock(), 1);
        notifier.end_navigation(root(), || None);
        assert_eq!(*count.lock(), 2);
    }

    #[test]
    fn guards_close_the_transaction_when_dropped() {
        let notifier = RouteNotifier::new();
        let count = Arc::new(Mutex::new(0));
        let c = count.clone();
        notifier.subscribe(move |_| *c.lock() += 1);
        {
            let _outer = notifier.enter(root(), || Some(parse("Home")));
            let inner = notifier.enter(root(), || panic!("inner guard must not evaluate the route"));
            drop(inner);
            assert!(notifier.is_navigating(root()));
        }
        assert!(!notifier.is_navigating(root()));
        assert_eq!(*count.lock(), 1);
    }

    #[test]
    fn unbalanced_end_is_ignored() {
        let notifier = RouteNotifier::new();
        let count = Arc::new(Mutex::new(0));
        let c = count.clone();
        notifier.subscribe(move |_| *c.lock() += 1);
        notifier.end_navigation(root(), || None);
        assert_eq!(*count.lock(), 0);
    }
}
