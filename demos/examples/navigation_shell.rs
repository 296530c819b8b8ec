// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A shell with tabs, a product list and a confirmation dialog.
//!
//! This example shows how to combine:
//! - `understory_route` for parsing and composing route strings,
//! - `understory_navigation` for the region tree, its navigators and typed results,
//! - a custom `ControlAdapter` that stands in for a tab bar.
//!
//! Run:
//! - `cargo run -p understory_demos --example navigation_shell`
//! - `RUST_LOG=understory_navigation=debug cargo run -p understory_demos --example navigation_shell`

use std::sync::Arc;

use async_trait::async_trait;
use futures::executor::block_on;
use tracing_subscriber::EnvFilter;
use understory_navigation::{
    ControlAdapter, DataMap, NavigationHost, NavigatorExt, NavigatorFactory, QueuedDispatcher,
    Region, RegionSpec, RegionView, RouteInfo, RouteMap, RouteResolver,
};
use understory_route::{Route, RouteData};

enum ShellPage {}
enum HomePage {}
enum ProductsPage {}
enum ProductPage {}
enum ConfirmFlyout {}

#[derive(Clone, Debug)]
struct Product {
    id: u32,
}

/// A tab bar: shows one tab at a time and has no back stack.
#[derive(Debug, Default)]
struct Tabs;

#[async_trait]
impl ControlAdapter for Tabs {
    async fn show(
        &self,
        _region: &Region,
        route: &Route,
        _info: Option<Arc<RouteInfo>>,
    ) -> Option<Route> {
        let head = route.head().with_scheme("");
        println!("  [tabs] select {}", head.base());
        Some(head)
    }

    fn back_depth(&self) -> usize {
        0
    }

    async fn go_back(&self, _region: &Region, _route: &Route) -> Option<Route> {
        None
    }
}

/// A view that is always loaded.
#[derive(Debug)]
struct Loaded(&'static str);

#[async_trait]
impl RegionView for Loaded {
    async fn ensure_ready(&self) {
        tracing::trace!(view = self.0, "view ready");
    }
}

fn routes() -> RouteResolver {
    let mut resolver = RouteResolver::default();
    resolver
        .register([
            RouteMap::new("Shell").view::<ShellPage>().nested([
                RouteMap::new("Home").view::<HomePage>().as_default(),
                RouteMap::new("Products").view::<ProductsPage>(),
                RouteMap::new("Settings"),
                RouteMap::new("Product").view::<ProductPage>().data(
                    DataMap::of::<Product>()
                        .to_query(|p: &Product| RouteData::from_query(&format!("id={}", p.id)))
                        .from_query(|data| {
                            data.text("id")
                                .and_then(|id| id.parse().ok())
                                .map(|id| Product { id })
                        }),
                ),
            ]),
            RouteMap::new("Confirm")
                .view::<ConfirmFlyout>()
                .result::<bool>()
                .dialog(),
        ])
        .expect("route paths are unique");
    resolver
}

fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("understory_navigation=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let queue = Arc::new(QueuedDispatcher::new());
    let host = NavigationHost::builder(routes())
        .factory(NavigatorFactory::new().with("Tabs", || Arc::new(Tabs)))
        .dispatcher(queue.clone())
        .build();
    host.notifier().subscribe(|changed| {
        let route = changed.route.as_ref().map(ToString::to_string);
        println!(
            "  route changed: {} ({:?})",
            route.as_deref().unwrap_or("<none>"),
            changed.elapsed
        );
    });

    let root = host
        .attach_root(RegionSpec::new().control("Stack").view(Arc::new(Loaded("window"))))
        .expect("fresh host");
    let content = root
        .attach_child(RegionSpec::new().control("Stack"))
        .expect("fresh parent");
    let tabs = content
        .attach_child(RegionSpec::new().named("tabs").control("Tabs"))
        .expect("unique name");
    let navigator = root.navigator().expect("live region");

    block_on(async {
        println!("navigate Shell");
        navigator.navigate_route("Shell").await;

        println!("navigate Shell/Product?id=4");
        navigator.navigate_route("Shell/Product?id=4").await;

        println!("navigate ./tabs/Settings from the content region");
        if let Some(content_nav) = content.navigator() {
            content_nav.navigate_route("./tabs/Settings").await;
        }
        println!("  tab shown: {:?}", tabs.current_route().map(|r| r.to_string()));

        println!("open Confirm and wait for an answer");
        let pending = navigator
            .navigate_route_for_result::<bool>("Confirm", None)
            .await
            .expect("dialog opened");
        if let Some(dialog) = &pending.navigator {
            dialog.navigate_back_with_result(Some(true)).await;
        }
        println!("  results queued on the dispatcher: {}", queue.pending());
        queue.run_pending();
        println!("  confirmed: {:?}", pending.result.await);

        println!("navigate back");
        navigator.navigate_back().await;
    });

    println!(
        "final route: {}",
        root.full_route().map(|r| r.to_string()).unwrap_or_default()
    );
}
