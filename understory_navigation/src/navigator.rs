// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Navigators and the dispatch state machine.
//!
//! Every region owns a [`RegionNavigator`]. A request's scheme decides what it does with
//! it; the rules are evaluated in order:
//!
//! 1. **Root** (`/`): forward unchanged to the parent. At the tree root, strip the `/`
//!    and continue, expanding a nested mapping to its full route.
//! 2. **Parent** (`../`): strip one level and forward to the parent, which handles it
//!    locally. Without a parent the request is dropped and logged.
//! 3. **Implicit parent**: a request without a scheme that was not dispatched from above
//!    passes through unnamed regions to their parent.
//! 4. **Dialog** (`!`): open a dialog scope under this region and dispatch there.
//! 5. **Local**: mark the request internal, wait for the region's view, let a named
//!    region consume its own name, run initializers, resolve an empty route to its
//!    default, install a pending typed result, then
//!    - `./` goes to the children only,
//!    - a pure back or close goes back through open dialog scopes, the local back stack,
//!      children that can go back, closes this region if it is a dialog scope, and
//!      finally goes to the parent unless the request came from above,
//!    - anything else is shown by the region's control and the remainder is sent to the
//!      selected children.
//!
//! Children are selected when they are unnamed, named after the next route segment, or
//! named after the region's current route. They are dispatched concurrently; the first
//! non-`None` response in child order wins.

use core::any::Any;
use core::fmt;
use std::sync::{Arc, Weak};

use async_trait::async_trait;
use futures::future::join_all;
use understory_route::{DataValue, NoLookup, Route, parse_with, scheme};

use crate::control::ControlAdapter;
use crate::host::NavigationHost;
use crate::mapping::RouteInfo;
use crate::region::{Region, RegionId, RegionSpec};
use crate::request::NavigationRequest;
use crate::response::{NavigationResponse, NavigationResultResponse};
use crate::types::TypeKey;

/// Upper bound on initializer rewrites for a single request.
pub const MAX_INIT_REDIRECTS: usize = 8;

/// Handles navigation requests for one region.
#[async_trait]
pub trait Navigator: Send + Sync + fmt::Debug {
    /// The region this navigator serves.
    fn region_id(&self) -> RegionId;

    /// The owning host, while it is alive.
    fn host(&self) -> Option<Arc<NavigationHost>>;

    /// Dispatch `request`. Dead-ends yield `None`.
    async fn navigate(&self, request: NavigationRequest) -> Option<NavigationResponse>;

    /// Returns true when a back navigation from here would pop something.
    async fn can_go_back(&self) -> bool;
}

/// The per-region dispatcher.
pub struct RegionNavigator {
    host: Weak<NavigationHost>,
    id: RegionId,
    adapter: Option<Arc<dyn ControlAdapter>>,
}

impl fmt::Debug for RegionNavigator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegionNavigator")
            .field("id", &self.id)
            .field("adapter", &self.adapter)
            .finish_non_exhaustive()
    }
}

impl RegionNavigator {
    pub(crate) fn new(
        host: Weak<NavigationHost>,
        id: RegionId,
        adapter: Option<Arc<dyn ControlAdapter>>,
    ) -> Self {
        Self { host, id, adapter }
    }

    /// The region's control, if it hosts one.
    pub fn adapter(&self) -> Option<&Arc<dyn ControlAdapter>> {
        self.adapter.as_ref()
    }

    async fn forward(
        host: &Arc<NavigationHost>,
        target: RegionId,
        request: NavigationRequest,
    ) -> Option<NavigationResponse> {
        let Some(navigator) = host.active_navigator(target) else {
            tracing::debug!(region = ?target, route = %request.route, "forward target is gone");
            return None;
        };
        navigator.navigate(request).await
    }

    async fn dispatch(
        &self,
        host: &Arc<NavigationHost>,
        mut request: NavigationRequest,
    ) -> Option<NavigationResponse> {
        let route = request.route.clone();
        let (parent, named) = {
            let regions = host.regions();
            (
                regions.parent_of(self.id),
                regions.name_of(self.id).is_some(),
            )
        };

        if route.is_root() {
            if let Some(parent) = parent {
                return Self::forward(host, parent, request).await;
            }
            let mut stripped = route.without_scheme_prefix(scheme::ROOT);
            if stripped.is_current()
                && host
                    .resolver()
                    .find_by_path(stripped.base())
                    .is_some_and(|info| info.parent().is_some())
            {
                stripped = host.resolver().full_route(&stripped);
            }
            request = request.with_route(stripped);
        } else if route.is_parent() {
            let Some(parent) = parent else {
                tracing::warn!(region = ?self.id, route = %route, "no parent region to forward to");
                return None;
            };
            let stripped = route.without_scheme_prefix(scheme::PARENT);
            let request = request.with_route(stripped).as_internal();
            return Self::forward(host, parent, request).await;
        } else if route.is_current() && !request.internal && !named {
            if let Some(parent) = parent {
                return Self::forward(host, parent, request).await;
            }
        }

        if request.route.is_dialog() {
            return self.open_dialog(host, request).await;
        }
        self.dispatch_local(host, request).await
    }

    async fn open_dialog(
        &self,
        host: &Arc<NavigationHost>,
        request: NavigationRequest,
    ) -> Option<NavigationResponse> {
        // `./!` and `!!` both open one scope here; the scope must not see `!` again.
        let rest = scheme::strip_scope(request.route.scheme()).trim_start_matches(scheme::DIALOG);
        let route = request.route.with_scheme(rest);
        let request = request.with_route(route.clone()).as_internal();
        let view = host
            .resolver()
            .find_by_path(route.base())
            .and_then(|info| info.view());
        let control = host
            .factory()
            .control_for_view(view, host.resolver().catalog());
        let scope = match host.attach(Some(self.id), RegionSpec::new().control(&control), true) {
            Ok(scope) => scope,
            Err(err) => {
                tracing::warn!(region = ?self.id, %err, "could not open dialog scope");
                return None;
            }
        };
        tracing::debug!(region = ?self.id, scope = ?scope.id(), %control, route = %route, "opened dialog scope");
        let response = match scope.navigator() {
            Some(navigator) => navigator.navigate(request).await,
            None => None,
        };
        if response.is_none() {
            scope.detach();
        }
        response
    }

    async fn dispatch_local(
        &self,
        host: &Arc<NavigationHost>,
        mut request: NavigationRequest,
    ) -> Option<NavigationResponse> {
        let from_above = request.internal;
        request.internal = true;

        let view = host.regions().view(self.id);
        if let Some(view) = view {
            view.ensure_ready().await;
        }

        let name = host.regions().name_of(self.id).map(str::to_string);
        if let Some(name) = &name
            && request.route.base() == name.as_str()
        {
            request.route = request.route.trim(&Route::from_base(name.as_str()));
        }

        let mut info = host.resolver().find_by_path(request.route.base());
        let mut redirects = 0;
        while !request.route.is_nested()
            && let Some(current) = info.clone()
            && current.has_init()
        {
            let (scheme_before, base_before) = (
                request.route.scheme().to_string(),
                request.route.base().to_string(),
            );
            request = current.apply_init(request);
            if request.route.scheme() == scheme_before && request.route.base() == base_before {
                break;
            }
            redirects += 1;
            tracing::debug!(region = ?self.id, from = %base_before, to = %request.route, "initializer redirected");
            info = host.resolver().find_by_path(request.route.base());
            if redirects >= MAX_INIT_REDIRECTS {
                tracing::warn!(region = ?self.id, route = %request.route, "initializer redirects capped");
                break;
            }
        }
        if redirects > 0
            && (request.route.is_root() || request.route.is_parent() || request.route.is_dialog())
        {
            return self.navigate(request).await;
        }

        if request.route.is_empty() {
            let Some(default) = self.default_route(host) else {
                tracing::debug!(region = ?self.id, "empty route and no default");
                return None;
            };
            request.route = Route::from_parts(
                scheme::NONE,
                default.path(),
                "",
                request.route.data().clone(),
            );
            info = Some(default);
        }

        let pending = match request.result.take() {
            Some(result) => {
                let pending = result.install(host, self.id, request.cancellation.clone());
                if pending.is_none() {
                    tracing::debug!(region = ?self.id, ?result, "could not install result navigator");
                }
                pending
            }
            None => {
                if let Some(own) = host.primary_navigator(self.id) {
                    host.register_active(self.id, own);
                }
                None
            }
        };

        let route = request.route.clone();
        let response = if route.is_nested() {
            let stripped = route.without_scheme_prefix(scheme::NESTED);
            self.dispatch_children(host, request.with_route(stripped))
                .await
        } else if route.is_pure_back() || route.is_close() {
            self.go_back(host, request, from_above).await
        } else {
            self.execute(host, request, info).await
        };

        let Some(mut response) = response else {
            if let Some(pending) = pending {
                (pending.abandon)();
            }
            return None;
        };
        if response.navigator.is_none() {
            response.navigator = host.active_navigator(self.id);
        }
        if let Some(pending) = pending {
            response.result = Some(pending.future);
        }
        Some(response)
    }

    /// Default child of the nearest ancestor's current route, or the top-level default.
    fn default_route(&self, host: &Arc<NavigationHost>) -> Option<Arc<RouteInfo>> {
        let anchor = {
            let regions = host.regions();
            let mut current = regions.parent_of(self.id);
            let mut anchor = None;
            while let Some(id) = current {
                if let Some(route) = regions.current_route(id) {
                    anchor = Some(route.last_base());
                    break;
                }
                current = regions.parent_of(id);
            }
            anchor
        };
        host.resolver().default_child(anchor.as_deref())
    }

    async fn execute(
        &self,
        host: &Arc<NavigationHost>,
        request: NavigationRequest,
        info: Option<Arc<RouteInfo>>,
    ) -> Option<NavigationResponse> {
        let route = request.route.clone();
        let names_child = host
            .regions()
            .child_named(self.id, route.base())
            .is_some();
        let region = Region::new(host.clone(), self.id);

        let mut executed = None;
        if let Some(adapter) = &self.adapter
            && !route.base().is_empty()
            && !names_child
        {
            match &info {
                None => {
                    tracing::debug!(region = ?self.id, route = %route, "route is not mapped");
                }
                Some(info) => {
                    let mut head = route.head();
                    if let Some(codec) = info.data()
                        && head.data().payload().is_none()
                        && let Some(value) = codec.decode(head.data())
                    {
                        head = head.with_payload(DataValue::Object(value));
                    }
                    if let Some(shown) = adapter.show(&region, &head, Some(info.clone())).await {
                        host.regions()
                            .set_current_route(self.id, Some(shown.clone()));
                        executed = Some(shown);
                    }
                }
            }
        }

        let remainder = match &executed {
            Some(_) => route.trim(&route.head()),
            None => route.clone(),
        };
        let child = self
            .dispatch_children(host, request.with_route(remainder))
            .await;
        let child_route = child.as_ref().and_then(|c| c.route.clone());

        let mut out = match (executed, child_route) {
            (Some(shown), Some(child)) => shown.append(&child),
            (Some(shown), None) => shown,
            (None, Some(child)) if names_child => Route::from_base(route.base()).append(&child),
            (None, Some(child)) => child,
            (None, None) => return None,
        };
        if route.is_back() {
            out = out.with_scheme(route.scheme());
        }
        let navigator = child.and_then(|c| c.navigator);
        Some(NavigationResponse::new(Some(out)).with_navigator(navigator))
    }

    async fn dispatch_children(
        &self,
        host: &Arc<NavigationHost>,
        request: NavigationRequest,
    ) -> Option<NavigationResponse> {
        let targets: Vec<Arc<dyn Navigator>> = {
            let regions = host.regions();
            let current = regions
                .current_route(self.id)
                .map(|r| r.base().to_string());
            let next = request.route.base();
            regions
                .children_of(self.id)
                .iter()
                .filter(|child| match regions.name_of(**child) {
                    None => true,
                    Some(name) => name == next || current.as_deref() == Some(name),
                })
                .filter_map(|child| regions.slot(*child)?.active())
                .collect()
        };
        if targets.is_empty() {
            return None;
        }
        tracing::trace!(region = ?self.id, route = %request.route, children = targets.len(), "dispatch to children");
        let request = request.as_internal();
        join_all(targets.iter().map(|child| child.navigate(request.clone())))
            .await
            .into_iter()
            .flatten()
            .next()
    }

    async fn go_back(
        &self,
        host: &Arc<NavigationHost>,
        request: NavigationRequest,
        from_above: bool,
    ) -> Option<NavigationResponse> {
        let route = request.route.clone();
        let inward = request.as_internal();
        let (scopes, children, parent) = {
            let regions = host.regions();
            let active = |id: &RegionId| regions.slot(*id).and_then(|slot| slot.active());
            (
                regions
                    .scopes_of(self.id)
                    .iter()
                    .rev()
                    .filter_map(active)
                    .collect::<Vec<_>>(),
                regions
                    .children_of(self.id)
                    .iter()
                    .filter_map(active)
                    .collect::<Vec<_>>(),
                regions.parent_of(self.id),
            )
        };

        for scope in scopes {
            if let Some(response) = scope.navigate(inward.clone()).await {
                return Some(response);
            }
        }

        if !route.is_close()
            && let Some(adapter) = &self.adapter
            && adapter.back_depth() > route.pages_to_remove()
        {
            let region = Region::new(host.clone(), self.id);
            if let Some(shown) = adapter.go_back(&region, &route).await {
                host.regions().set_current_route(self.id, Some(shown));
                return Some(NavigationResponse::new(Some(route)));
            }
        }

        let able = join_all(children.iter().map(|child| child.can_go_back())).await;
        for (child, able) in children.iter().zip(able) {
            if able && let Some(response) = child.navigate(inward.clone()).await {
                return Some(response);
            }
        }

        if host.regions().is_scoped(self.id) {
            tracing::debug!(region = ?self.id, route = %route, "closing dialog scope");
            host.close_scope(self.id);
            return Some(NavigationResponse::new(Some(route)));
        }

        if !from_above && let Some(parent) = parent {
            return Self::forward(host, parent, request).await;
        }
        tracing::debug!(region = ?self.id, route = %route, "nothing to go back to");
        None
    }
}

#[async_trait]
impl Navigator for RegionNavigator {
    fn region_id(&self) -> RegionId {
        self.id
    }

    fn host(&self) -> Option<Arc<NavigationHost>> {
        self.host.upgrade()
    }

    async fn navigate(&self, request: NavigationRequest) -> Option<NavigationResponse> {
        let host = self.host.upgrade()?;
        let root = {
            let regions = host.regions();
            if !regions.is_alive(self.id) {
                return None;
            }
            regions.root_of(self.id)
        };
        let _guard = host
            .notifier()
            .enter(root, || host.region(root).and_then(|r| r.full_route()));
        tracing::trace!(region = ?self.id, route = %request.route, internal = request.internal, "navigate");
        self.dispatch(&host, request).await
    }

    async fn can_go_back(&self) -> bool {
        if self.adapter.as_ref().is_some_and(|a| a.back_depth() > 0) {
            return true;
        }
        let Some(host) = self.host.upgrade() else {
            return false;
        };
        let children: Vec<Arc<dyn Navigator>> = {
            let regions = host.regions();
            let current = regions
                .current_route(self.id)
                .map(|r| r.base().to_string());
            regions
                .children_of(self.id)
                .iter()
                .filter(|child| match regions.name_of(**child) {
                    None => true,
                    Some(name) => current.as_deref() == Some(name),
                })
                .filter_map(|child| regions.slot(*child)?.active())
                .collect()
        };
        join_all(children.iter().map(|child| child.can_go_back()))
            .await
            .into_iter()
            .any(|able| able)
    }
}

fn parse_route(
    host: Option<&NavigationHost>,
    text: &str,
    payload: Option<DataValue>,
) -> Route {
    match host {
        Some(host) => parse_with(text, payload, host.resolver()),
        None => parse_with(text, payload, &NoLookup),
    }
}

/// Conveniences available on every [`Navigator`].
#[async_trait]
pub trait NavigatorExt: Navigator {
    /// Parse `route` and navigate to it.
    async fn navigate_route(&self, route: &str) -> Option<NavigationResponse> {
        self.navigate_route_with(route, None).await
    }

    /// Parse `route`, attach `payload` and navigate to it.
    async fn navigate_route_with(
        &self,
        route: &str,
        payload: Option<DataValue>,
    ) -> Option<NavigationResponse> {
        let route = parse_route(self.host().as_deref(), route, payload);
        self.navigate(NavigationRequest::new(route)).await
    }

    /// Navigate with `request`, expecting a `T` back.
    async fn navigate_for_result<T: Any + Clone + Send + Sync>(
        &self,
        request: NavigationRequest,
    ) -> Option<NavigationResultResponse<T>> {
        self.navigate(request.with_result::<T>())
            .await
            .map(NavigationResponse::into_result::<T>)
    }

    /// Parse `route` and navigate to it, expecting a `T` back.
    async fn navigate_route_for_result<T: Any + Clone + Send + Sync>(
        &self,
        route: &str,
        payload: Option<DataValue>,
    ) -> Option<NavigationResultResponse<T>> {
        let route = parse_route(self.host().as_deref(), route, payload);
        self.navigate_for_result::<T>(NavigationRequest::new(route))
            .await
    }

    /// Go back one level.
    async fn navigate_back(&self) -> Option<NavigationResponse> {
        self.navigate_route(scheme::BACK).await
    }

    /// Go back one level, handing `value` to whoever awaits a result.
    async fn navigate_back_with_result<T: Any + Send + Sync>(
        &self,
        value: Option<T>,
    ) -> Option<NavigationResponse> {
        self.navigate_route_with(scheme::BACK, Some(DataValue::optional(value)))
            .await
    }

    /// Navigate to the route mapped to view `V`.
    async fn navigate_view<V: Any>(&self, payload: Option<DataValue>) -> Option<NavigationResponse> {
        let host = self.host()?;
        let info = host.resolver().find_by_view(TypeKey::of::<V>())?;
        self.navigate_route_with(info.path(), payload).await
    }

    /// Navigate to the route mapped to view-model `M`.
    async fn navigate_view_model<M: Any>(
        &self,
        payload: Option<DataValue>,
    ) -> Option<NavigationResponse> {
        let host = self.host()?;
        let info = host.resolver().find_by_view_model(TypeKey::of::<M>())?;
        self.navigate_route_with(info.path(), payload).await
    }

    /// Navigate to the route mapped to data type `D`, encoding `data` into the query.
    async fn navigate_data<D: Any + Send + Sync>(&self, data: D) -> Option<NavigationResponse> {
        let host = self.host()?;
        let info = host.resolver().find_by_data(TypeKey::of::<D>())?;
        let query = info
            .data()
            .map(|codec| codec.encode(&data))
            .unwrap_or_default();
        let route = parse_with(info.path(), None, host.resolver());
        let route = route
            .with_data(route.data().merged(&query))
            .with_payload(DataValue::object(data));
        self.navigate(NavigationRequest::new(route)).await
    }
}

impl<N: Navigator + ?Sized> NavigatorExt for N {}
