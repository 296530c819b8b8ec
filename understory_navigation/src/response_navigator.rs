// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Typed results.
//!
//! Navigating with a [`ResultType`](crate::request::ResultType) installs a
//! [`ResponseNavigator`] over the target region's own navigator. Requests to the region
//! go through it until a back or close response passes through, which completes the
//! result with the route's payload. Completion restores the region's navigator and hands
//! the value to the waiting future through the host's
//! [`Dispatcher`](crate::dispatcher::Dispatcher).
//!
//! A result completes exactly once. It resolves as `None` when it is displaced by a newer
//! result on the same region, when its region is detached, when the navigation that
//! installed it dead-ends, or when its cancellation token fires. A cancelled result is
//! noticed by whichever comes first: polling its future, a request to the region, or an
//! attempt to complete it.

use core::any::{Any, TypeId};
use core::fmt;
use core::marker::PhantomData;
use std::sync::{Arc, Weak};

use async_trait::async_trait;
use futures::FutureExt;
use futures::channel::oneshot;
use futures::future::{Either, select};
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use understory_route::{AnyValue, DataValue};

use crate::host::NavigationHost;
use crate::navigator::Navigator;
use crate::region::{Abandon, RegionId};
use crate::request::NavigationRequest;
use crate::response::{NavigationResponse, ResultFuture};
use crate::types::TypeKey;

/// An installed result: the future the caller awaits and the hook that resolves it as
/// `None`.
pub(crate) struct PendingResult {
    pub(crate) future: ResultFuture,
    pub(crate) abandon: Abandon,
}

struct ResultState {
    host: Weak<NavigationHost>,
    region: RegionId,
    tag: u64,
    sender: Mutex<Option<oneshot::Sender<Option<AnyValue>>>>,
    cancellation: Option<CancellationToken>,
}

impl ResultState {
    fn complete(&self, value: Option<AnyValue>) {
        let Some(sender) = self.sender.lock().take() else {
            return;
        };
        let value = if self.is_cancelled() { None } else { value };
        tracing::debug!(
            region = ?self.region,
            tag = self.tag,
            has_value = value.is_some(),
            "result completed"
        );
        let Some(host) = self.host.upgrade() else {
            let _ = sender.send(value);
            return;
        };
        host.restore(self.region, self.tag);
        host.dispatcher().dispatch(Box::new(move || {
            let _ = sender.send(value);
        }));
    }

    fn is_completed(&self) -> bool {
        self.sender.lock().is_none()
    }

    fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
    }
}

/// Wraps a region's navigator while a `T` result is pending.
pub struct ResponseNavigator<T> {
    inner: Arc<dyn Navigator>,
    state: Arc<ResultState>,
    marker: PhantomData<fn() -> T>,
}

impl<T> fmt::Debug for ResponseNavigator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseNavigator")
            .field("result", &core::any::type_name::<T>())
            .field("region", &self.state.region)
            .field("tag", &self.state.tag)
            .field("inner", &self.inner)
            .finish()
    }
}

impl<T> ResponseNavigator<T> {
    /// The navigator requests are delegated to.
    pub fn inner(&self) -> &Arc<dyn Navigator> {
        &self.inner
    }

    /// Returns true once the result has been completed or abandoned.
    pub fn is_completed(&self) -> bool {
        self.state.is_completed()
    }
}

#[async_trait]
impl<T: Any + Clone + Send + Sync> Navigator for ResponseNavigator<T> {
    fn region_id(&self) -> RegionId {
        self.inner.region_id()
    }

    fn host(&self) -> Option<Arc<NavigationHost>> {
        self.inner.host()
    }

    async fn navigate(&self, request: NavigationRequest) -> Option<NavigationResponse> {
        if self.state.is_cancelled() && !self.state.is_completed() {
            tracing::debug!(region = ?self.state.region, tag = self.state.tag, "result cancelled");
            self.state.complete(None);
        }
        let response = self.inner.navigate(request).await;
        if let Some(route) = response.as_ref().and_then(|r| r.route.as_ref())
            && route.is_back_or_close()
        {
            let value = route.data().payload().and_then(coerce::<T>);
            self.state.complete(value);
        }
        response
    }

    async fn can_go_back(&self) -> bool {
        self.inner.can_go_back().await
    }
}

/// Coerce a back payload to the expected result type.
fn coerce<T: Any + Clone + Send + Sync>(payload: &DataValue) -> Option<AnyValue> {
    match payload {
        DataValue::Optional(None) => None,
        DataValue::Object(value) | DataValue::Optional(Some(value)) => {
            if value.is::<T>() {
                Some(value.clone())
            } else if let Some(inner) = value.downcast_ref::<Option<T>>() {
                inner.clone().map(|v| Arc::new(v) as AnyValue)
            } else {
                tracing::debug!(expected = %TypeKey::of::<T>(), "result payload has another type");
                None
            }
        }
        DataValue::Text(text) => (TypeId::of::<T>() == TypeId::of::<String>())
            .then(|| Arc::new(text.clone()) as AnyValue),
    }
}

/// Install a [`ResponseNavigator<T>`] over `region`'s own navigator.
pub(crate) fn install<T: Any + Clone + Send + Sync>(
    host: &Arc<NavigationHost>,
    region: RegionId,
    cancellation: Option<CancellationToken>,
) -> Option<PendingResult> {
    let inner = host.primary_navigator(region)?;
    let (sender, receiver) = oneshot::channel();
    let state = Arc::new(ResultState {
        host: Arc::downgrade(host),
        region,
        tag: host.next_tag(),
        sender: Mutex::new(Some(sender)),
        cancellation: cancellation.clone(),
    });
    let navigator: Arc<dyn Navigator> = Arc::new(ResponseNavigator::<T> {
        inner,
        state: state.clone(),
        marker: PhantomData,
    });
    let abandon: Abandon = {
        let state = state.clone();
        Arc::new(move || state.complete(None))
    };
    if !host.substitute(region, state.tag, navigator, abandon.clone()) {
        return None;
    }
    tracing::debug!(region = ?region, tag = state.tag, result = %TypeKey::of::<T>(), "awaiting result");

    let received = receiver.map(|value| value.ok().flatten());
    let future: ResultFuture = match cancellation {
        None => received.boxed(),
        Some(token) => async move {
            let cancelled = token.cancelled();
            futures::pin_mut!(received, cancelled);
            // A value sent before the token fired was completed before cancellation.
            match select(received, cancelled).await {
                Either::Left((value, _)) => value,
                Either::Right(((), _)) => {
                    tracing::debug!(region = ?state.region, tag = state.tag, "result cancelled");
                    state.complete(None);
                    None
                }
            }
        }
        .boxed(),
    };
    Some(PendingResult { future, abandon })
}
