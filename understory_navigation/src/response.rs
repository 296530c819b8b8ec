// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Navigation responses.

use core::any::Any;
use core::fmt;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::{self, BoxFuture};
use understory_route::{AnyValue, Route};

use crate::navigator::Navigator;

/// Erased result future.
pub type ResultFuture = BoxFuture<'static, Option<AnyValue>>;

/// Outcome of a navigation.
///
/// A response without a result future is settled. One with a result future settles when
/// the future completes: after a back or close navigation, a cancellation, or when the
/// pending result is displaced.
pub struct NavigationResponse {
    /// The route that was executed, including what the children executed.
    pub route: Option<Route>,
    /// Whether the navigation was carried out.
    pub success: bool,
    /// The navigator that handled the request.
    pub navigator: Option<Arc<dyn Navigator>>,
    /// Pending typed result.
    pub result: Option<ResultFuture>,
}

impl NavigationResponse {
    /// A successful response for `route`.
    pub fn new(route: Option<Route>) -> Self {
        Self {
            route,
            success: true,
            navigator: None,
            result: None,
        }
    }

    /// Replace the route.
    pub fn with_route(self, route: Option<Route>) -> Self {
        Self { route, ..self }
    }

    /// Attach the handling navigator.
    pub fn with_navigator(self, navigator: Option<Arc<dyn Navigator>>) -> Self {
        Self { navigator, ..self }
    }

    /// Attach a result future.
    pub fn with_result(self, result: Option<ResultFuture>) -> Self {
        Self { result, ..self }
    }

    /// Convert into a typed response. Values of another type resolve to `None`.
    pub fn into_result<T: Any + Clone + Send + Sync>(self) -> NavigationResultResponse<T> {
        let result = match self.result {
            Some(pending) => pending
                .map(|value| value.and_then(unwrap_value::<T>))
                .boxed(),
            None => future::ready(None).boxed(),
        };
        NavigationResultResponse {
            route: self.route,
            success: self.success,
            navigator: self.navigator,
            result,
        }
    }
}

impl fmt::Debug for NavigationResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NavigationResponse")
            .field("route", &self.route.as_ref().map(ToString::to_string))
            .field("success", &self.success)
            .field("navigator", &self.navigator)
            .field("result", &self.result.is_some())
            .finish()
    }
}

fn unwrap_value<T: Any + Clone + Send + Sync>(value: AnyValue) -> Option<T> {
    let value = value.downcast::<T>().ok()?;
    Some(Arc::try_unwrap(value).unwrap_or_else(|shared| (*shared).clone()))
}

/// Typed view of a [`NavigationResponse`].
pub struct NavigationResultResponse<T> {
    /// The executed route.
    pub route: Option<Route>,
    /// Whether the navigation was carried out.
    pub success: bool,
    /// The navigator that handled the request.
    pub navigator: Option<Arc<dyn Navigator>>,
    /// Resolves once the navigated-to scope goes back or closes.
    pub result: BoxFuture<'static, Option<T>>,
}

impl<T> fmt::Debug for NavigationResultResponse<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NavigationResultResponse")
            .field("route", &self.route.as_ref().map(ToString::to_string))
            .field("success", &self.success)
            .field("navigator", &self.navigator)
            .finish_non_exhaustive()
    }
}
