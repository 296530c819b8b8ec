// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_navigation --heading-base-level=0

//! Understory Navigation: hierarchical, route-driven navigation for UI region trees.
//!
//! ## Overview
//!
//! An application declares its pages once as [`RouteMap`]s and registers them with a
//! [`RouteResolver`]. The UI is described as a tree of [`Region`]s owned by a
//! [`NavigationHost`]: some regions host a control (a frame-like [`StackControl`] or any
//! other [`ControlAdapter`] registered in the [`NavigatorFactory`]), others only route.
//! Every region gets a [`Navigator`] that dispatches [`NavigationRequest`]s along the
//! tree according to the route's scheme. See [`navigator`] for the dispatch rules.
//!
//! Requests may ask for a typed result. The target region is then served by a
//! [`ResponseNavigator`] until a back or close navigation hands a payload back, and the
//! caller awaits it on the [`NavigationResultResponse`]. Results are delivered through
//! the host's [`Dispatcher`], so a UI thread can own their completion.
//!
//! Every top-level navigation raises one [`RouteChanged`] on the [`RouteNotifier`] with
//! the tree's full route.
//!
//! ```rust
//! use understory_navigation::{
//!     NavigationHost, NavigatorExt, RegionSpec, RouteMap, RouteResolver,
//! };
//!
//! enum ShellPage {}
//! enum HomePage {}
//! enum ProductsPage {}
//!
//! let mut resolver = RouteResolver::default();
//! resolver
//!     .register([RouteMap::new("Shell").view::<ShellPage>().nested([
//!         RouteMap::new("Home").view::<HomePage>().as_default(),
//!         RouteMap::new("Products").view::<ProductsPage>(),
//!     ])])
//!     .unwrap();
//!
//! let host = NavigationHost::new(resolver);
//! let root = host.attach_root(RegionSpec::new().control("Stack")).unwrap();
//! let content = root.attach_child(RegionSpec::new().control("Stack")).unwrap();
//!
//! futures::executor::block_on(async {
//!     let response = root.navigator().unwrap().navigate_route("Shell").await.unwrap();
//!     assert_eq!(response.route.unwrap().to_string(), "Shell/Home");
//!
//!     // Navigating from the content region bubbles up to the root.
//!     content.navigator().unwrap().navigate_route("/Products").await.unwrap();
//!     assert_eq!(root.full_route().unwrap().to_string(), "Shell/Products");
//! });
//! ```

pub mod control;
pub mod dispatcher;
pub mod error;
pub mod factory;
pub mod host;
pub mod mapping;
pub mod navigator;
pub mod notifier;
pub mod region;
pub mod request;
pub mod resolver;
pub mod response;
pub mod response_navigator;
pub mod types;


pub use understory_route as route;

pub use control::{ControlAdapter, StackControl};
pub use dispatcher::{Dispatcher, InlineDispatcher, QueuedDispatcher, Task};
pub use error::NavigationError;
pub use factory::{ControlBuilder, DEFAULT_DIALOG_CONTROL, NavigatorFactory};
pub use host::{NavigationHost, NavigationHostBuilder};
pub use mapping::{DataMap, InitFn, RouteInfo, RouteMap};
pub use navigator::{MAX_INIT_REDIRECTS, Navigator, NavigatorExt, RegionNavigator};
pub use notifier::{NavigationGuard, RouteChanged, RouteNotifier};
pub use region::{Region, RegionId, RegionSpec, RegionView};
pub use request::{NavigationRequest, ResultType};
pub use resolver::{ImplicitMapping, NameConvention, RouteResolver};
pub use response::{NavigationResponse, NavigationResultResponse, ResultFuture};
pub use response_navigator::ResponseNavigator;
pub use types::{TypeCatalog, TypeKey};
