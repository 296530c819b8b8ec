// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Navigation requests.

use core::any::Any;
use core::fmt;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use understory_route::{AnyValue, Route};

use crate::host::NavigationHost;
use crate::region::RegionId;
use crate::response_navigator::{self, PendingResult};
use crate::types::TypeKey;

type Installer = fn(
    &Arc<NavigationHost>,
    RegionId,
    Option<CancellationToken>,
) -> Option<PendingResult>;

/// The type a caller expects back from a navigation.
///
/// Carries the installer for the matching
/// [`ResponseNavigator`](crate::response_navigator::ResponseNavigator).
#[derive(Clone, Copy)]
pub struct ResultType {
    key: TypeKey,
    install: Installer,
}

impl ResultType {
    /// Expect a `T`.
    pub fn of<T: Any + Clone + Send + Sync>() -> Self {
        Self {
            key: TypeKey::of::<T>(),
            install: response_navigator::install::<T>,
        }
    }

    /// The expected type.
    pub fn key(&self) -> TypeKey {
        self.key
    }

    pub(crate) fn install(
        &self,
        host: &Arc<NavigationHost>,
        region: RegionId,
        cancellation: Option<CancellationToken>,
    ) -> Option<PendingResult> {
        (self.install)(host, region, cancellation)
    }
}

impl fmt::Debug for ResultType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ResultType").field(&self.key).finish()
    }
}

/// A request handed to a [`Navigator`](crate::navigator::Navigator).
#[derive(Clone)]
pub struct NavigationRequest {
    /// Who asked.
    pub sender: Option<AnyValue>,
    /// Where to go.
    pub route: Route,
    /// Cancels a pending typed result.
    pub cancellation: Option<CancellationToken>,
    /// Expected result type; `None` for fire-and-forget.
    pub result: Option<ResultType>,
    /// Set once the request has entered local dispatch; it is never bounced to a parent
    /// again.
    pub internal: bool,
}

impl NavigationRequest {
    /// A fire-and-forget request for `route`.
    pub fn new(route: Route) -> Self {
        Self {
            sender: None,
            route,
            cancellation: None,
            result: None,
            internal: false,
        }
    }

    /// Copy with a different route.
    pub fn with_route(&self, route: Route) -> Self {
        Self {
            route,
            ..self.clone()
        }
    }

    /// Copy with a sender.
    pub fn with_sender(&self, sender: AnyValue) -> Self {
        Self {
            sender: Some(sender),
            ..self.clone()
        }
    }

    /// Copy with a cancellation token.
    pub fn with_cancellation(&self, token: CancellationToken) -> Self {
        Self {
            cancellation: Some(token),
            ..self.clone()
        }
    }

    /// Copy expecting a result of type `T`.
    pub fn with_result<T: Any + Clone + Send + Sync>(&self) -> Self {
        Self {
            result: Some(ResultType::of::<T>()),
            ..self.clone()
        }
    }

    /// Copy without a result type.
    pub fn without_result(&self) -> Self {
        Self {
            result: None,
            ..self.clone()
        }
    }

    /// Copy marked as internal.
    pub fn as_internal(&self) -> Self {
        Self {
            internal: true,
            ..self.clone()
        }
    }
}

impl fmt::Debug for NavigationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NavigationRequest")
            .field("sender", &self.sender.is_some())
            .field("route", &format_args!("{}", self.route))
            .field("cancellation", &self.cancellation)
            .field("result", &self.result)
            .field("internal", &self.internal)
            .finish()
    }
}

impl From<Route> for NavigationRequest {
    fn from(route: Route) -> Self {
        Self::new(route)
    }
}
