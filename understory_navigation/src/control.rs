// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Control adapters.
//!
//! A [`ControlAdapter`] is the part of a region that actually shows content: a frame, a
//! content host, a dialog. The navigator hands it one route segment at a time and asks it
//! to go back. [`StackControl`] is a frame-like reference implementation that keeps a
//! back stack of shown routes.

use core::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use understory_route::{Route, scheme};

use crate::mapping::RouteInfo;
use crate::region::Region;

/// Shows route segments inside a region.
#[async_trait]
pub trait ControlAdapter: Send + Sync + fmt::Debug {
    /// Show the head segment of `route`.
    ///
    /// Returns the route now shown, or `None` if the control could not show it.
    async fn show(&self, region: &Region, route: &Route, info: Option<Arc<RouteInfo>>)
    -> Option<Route>;

    /// Number of entries a back navigation could pop.
    fn back_depth(&self) -> usize;

    /// Go back as far as the pure back `route` asks.
    ///
    /// Returns the route now shown, or `None` if the stack is not deep enough.
    async fn go_back(&self, region: &Region, route: &Route) -> Option<Route>;
}

/// Frame-like control with a back stack.
///
/// - Showing the route already on top is a no-op unless the route is forward (`+`).
/// - A back route with a target (`-Target`, `--Target`) removes
///   [`Route::pages_to_remove`] entries, then pushes the target.
/// - A pure back (`-`, `--`) pops [`Route::pages_to_remove`] extra entries, then the
///   current one.
#[derive(Default)]
pub struct StackControl {
    label: &'static str,
    stack: Mutex<Vec<Route>>,
}

impl fmt::Debug for StackControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stack = self.stack.lock();
        f.debug_struct("StackControl")
            .field("label", &self.label)
            .field(
                "stack",
                &stack.iter().map(ToString::to_string).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl StackControl {
    /// Create an empty stack labeled `label` in logs.
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            stack: Mutex::new(Vec::new()),
        }
    }

    /// The label.
    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Snapshot of the stack, bottom first.
    pub fn entries(&self) -> Vec<Route> {
        self.stack.lock().clone()
    }

    /// The route on top of the stack.
    pub fn current(&self) -> Option<Route> {
        self.stack.lock().last().cloned()
    }
}

#[async_trait]
impl ControlAdapter for StackControl {
    async fn show(
        &self,
        region: &Region,
        route: &Route,
        info: Option<Arc<RouteInfo>>,
    ) -> Option<Route> {
        let head = route.head().with_scheme(scheme::NONE);
        let mut stack = self.stack.lock();
        if route.is_back() {
            let remove = route.pages_to_remove().min(stack.len());
            let keep = stack.len() - remove;
            stack.truncate(keep);
        } else if !route.is_forward() && stack.last().is_some_and(|top| top.base() == head.base())
        {
            tracing::trace!(control = self.label, region = ?region.id(), route = %head, "already shown");
            if let Some(top) = stack.last_mut() {
                *top = head.clone();
            }
            return Some(head);
        }
        tracing::debug!(
            control = self.label,
            region = ?region.id(),
            route = %head,
            view = ?info.as_ref().and_then(|i| i.view()),
            depth = stack.len(),
            "show"
        );
        stack.push(head.clone());
        Some(head)
    }

    fn back_depth(&self) -> usize {
        self.stack.lock().len().saturating_sub(1)
    }

    async fn go_back(&self, region: &Region, route: &Route) -> Option<Route> {
        let pops = route.pages_to_remove() + 1;
        let mut stack = self.stack.lock();
        if stack.len() <= pops {
            return None;
        }
        let keep = stack.len() - pops;
        stack.truncate(keep);
        let current = stack.last().cloned();
        tracing::debug!(control = self.label, region = ?region.id(), pops, current = ?current.as_ref().map(ToString::to_string), "back");
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::NavigationHost;
    use crate::region::RegionSpec;
    use crate::resolver::RouteResolver;
    use futures::executor::block_on;
    use understory_route::parse;

    fn region() -> Region {
        NavigationHost::new(RouteResolver::default())
            .attach_root(RegionSpec::new())
            .unwrap()
    }

    fn names(stack: &StackControl) -> Vec<String> {
        stack.entries().iter().map(ToString::to_string).collect()
    }

    #[test]
    fn repeats_are_idempotent_unless_forward() {
        let region = region();
        let stack = StackControl::new("Stack");
        block_on(stack.show(&region, &parse("Home"), None));
        block_on(stack.show(&region, &parse("Home?tab=2"), None));
        assert_eq!(stack.back_depth(), 0);
        assert_eq!(stack.current().unwrap().to_string(), "Home?tab=2");

        block_on(stack.show(&region, &parse("+Home"), None));
        assert_eq!(stack.back_depth(), 1);
        let shown = block_on(stack.show(&region, &parse("Products/Details"), None));
        assert_eq!(shown.unwrap().to_string(), "Products");
        assert_eq!(names(&stack), ["Home?tab=2", "Home", "Products"]);
    }

    #[test]
    fn back_routes_pop_entries() {
        let region = region();
        let stack = StackControl::new("Stack");
        for route in ["A", "B", "C"] {
            block_on(stack.show(&region, &parse(route), None));
        }
        let current = block_on(stack.go_back(&region, &parse("--")));
        assert_eq!(current.unwrap().to_string(), "A");
        assert!(block_on(stack.go_back(&region, &parse("-"))).is_none());

        for route in ["B", "C", "-D"] {
            block_on(stack.show(&region, &parse(route), None));
        }
        assert_eq!(names(&stack), ["A", "B", "D"]);
    }
}
