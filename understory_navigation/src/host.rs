// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The navigation host.
//!
//! [`NavigationHost`] owns everything a region tree shares: the region arena, the
//! [`RouteResolver`], the [`NavigatorFactory`], the [`RouteNotifier`] and the
//! [`Dispatcher`] typed results are completed through.
//!
//! All region state, navigator slots included, lives behind one lock. The lock is only
//! held for short, synchronous reads and writes; navigators copy what they need out of
//! the arena before awaiting anything.

use core::fmt;
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

use crate::dispatcher::{Dispatcher, InlineDispatcher};
use crate::error::NavigationError;
use crate::factory::NavigatorFactory;
use crate::navigator::{Navigator, RegionNavigator};
use crate::notifier::RouteNotifier;
use crate::region::{Abandon, Region, RegionArena, RegionId, RegionSpec};
use crate::resolver::RouteResolver;

/// Shared state of one or more region trees.
pub struct NavigationHost {
    regions: Mutex<RegionArena>,
    resolver: RouteResolver,
    factory: NavigatorFactory,
    notifier: RouteNotifier,
    dispatcher: Arc<dyn Dispatcher>,
}

impl fmt::Debug for NavigationHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NavigationHost")
            .field("regions", &*self.regions.lock())
            .field("resolver", &self.resolver)
            .field("factory", &self.factory)
            .field("notifier", &self.notifier)
            .field("dispatcher", &self.dispatcher)
            .finish()
    }
}

/// Builder for [`NavigationHost`].
#[derive(Debug)]
pub struct NavigationHostBuilder {
    resolver: RouteResolver,
    factory: NavigatorFactory,
    dispatcher: Arc<dyn Dispatcher>,
}

impl NavigationHostBuilder {
    /// Use `factory` instead of [`NavigatorFactory::new`].
    pub fn factory(mut self, factory: NavigatorFactory) -> Self {
        self.factory = factory;
        self
    }

    /// Complete typed results through `dispatcher` instead of inline.
    pub fn dispatcher(mut self, dispatcher: Arc<dyn Dispatcher>) -> Self {
        self.dispatcher = dispatcher;
        self
    }

    /// Build the host.
    pub fn build(self) -> Arc<NavigationHost> {
        Arc::new(NavigationHost {
            regions: Mutex::new(RegionArena::default()),
            resolver: self.resolver,
            factory: self.factory,
            notifier: RouteNotifier::new(),
            dispatcher: self.dispatcher,
        })
    }
}

impl NavigationHost {
    /// A host with the default factory and an inline dispatcher.
    pub fn new(resolver: RouteResolver) -> Arc<Self> {
        Self::builder(resolver).build()
    }

    /// Start building a host around `resolver`.
    pub fn builder(resolver: RouteResolver) -> NavigationHostBuilder {
        NavigationHostBuilder {
            resolver,
            factory: NavigatorFactory::new(),
            dispatcher: Arc::new(InlineDispatcher),
        }
    }

    /// The route table.
    pub fn resolver(&self) -> &RouteResolver {
        &self.resolver
    }

    /// The control table.
    pub fn factory(&self) -> &NavigatorFactory {
        &self.factory
    }

    /// Route change notifications.
    pub fn notifier(&self) -> &RouteNotifier {
        &self.notifier
    }

    /// The affinity boundary.
    pub fn dispatcher(&self) -> &Arc<dyn Dispatcher> {
        &self.dispatcher
    }

    /// Attach a new root region.
    pub fn attach_root(self: &Arc<Self>, spec: RegionSpec) -> Result<Region, NavigationError> {
        self.attach(None, spec, false)
    }

    /// Handle for `id`, if it is alive.
    pub fn region(self: &Arc<Self>, id: RegionId) -> Option<Region> {
        self.regions
            .lock()
            .is_alive(id)
            .then(|| Region::new(self.clone(), id))
    }

    pub(crate) fn regions(&self) -> MutexGuard<'_, RegionArena> {
        self.regions.lock()
    }

    pub(crate) fn attach(
        self: &Arc<Self>,
        parent: Option<RegionId>,
        spec: RegionSpec,
        scoped: bool,
    ) -> Result<Region, NavigationError> {
        let adapter = spec
            .control
            .as_deref()
            .and_then(|name| self.factory.build(name));
        let mut regions = self.regions.lock();
        let id = regions.insert(parent, spec.name, scoped, spec.view)?;
        let navigator: Arc<dyn Navigator> =
            Arc::new(RegionNavigator::new(Arc::downgrade(self), id, adapter));
        if let Some(slot) = regions.slot_mut(id) {
            slot.register_active(navigator);
        }
        drop(regions);
        tracing::debug!(region = ?id, ?parent, scoped, control = ?spec.control, "attached region");
        Ok(Region::new(self.clone(), id))
    }

    pub(crate) fn detach(&self, id: RegionId) {
        let abandoned = self.regions.lock().remove(id);
        tracing::debug!(region = ?id, pending = abandoned.len(), "detached region");
        for (_, abandon) in abandoned {
            abandon();
        }
    }

    /// Detach a dialog scope that is closing itself.
    ///
    /// The scope's own pending result is left to the response navigator that is
    /// dispatching the close; results pending deeper in the scope are abandoned.
    pub(crate) fn close_scope(&self, id: RegionId) {
        let abandoned = self.regions.lock().remove(id);
        tracing::debug!(region = ?id, "closed dialog scope");
        for (_, abandon) in abandoned.into_iter().filter(|(region, _)| *region != id) {
            abandon();
        }
    }

    /// The region's own navigator, ignoring any override.
    pub(crate) fn primary_navigator(&self, id: RegionId) -> Option<Arc<dyn Navigator>> {
        self.regions.lock().slot(id)?.primary()
    }

    /// The navigator requests to `id` should go through.
    pub(crate) fn active_navigator(&self, id: RegionId) -> Option<Arc<dyn Navigator>> {
        self.regions.lock().slot(id)?.active()
    }

    pub(crate) fn register_active(&self, id: RegionId, navigator: Arc<dyn Navigator>) -> bool {
        self.regions
            .lock()
            .slot_mut(id)
            .is_some_and(|slot| slot.register_active(navigator))
    }

    pub(crate) fn next_tag(&self) -> u64 {
        self.regions.lock().next_tag()
    }

    /// Install a tagged override on `id`. A displaced override is abandoned.
    ///
    /// Returns false when `id` is stale.
    pub(crate) fn substitute(
        &self,
        id: RegionId,
        tag: u64,
        navigator: Arc<dyn Navigator>,
        abandon: Abandon,
    ) -> bool {
        let displaced = {
            let mut regions = self.regions.lock();
            let Some(slot) = regions.slot_mut(id) else {
                return false;
            };
            slot.substitute(tag, navigator, abandon)
        };
        if let Some(displaced) = displaced {
            tracing::debug!(region = ?id, tag, "pending result displaced");
            displaced();
        }
        true
    }

    /// Remove the override on `id` if it still carries `tag`.
    pub(crate) fn restore(&self, id: RegionId, tag: u64) -> bool {
        self.regions
            .lock()
            .slot_mut(id)
            .is_some_and(|slot| slot.restore(tag))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attach_and_detach() {
        let host = NavigationHost::new(RouteResolver::default());
        let root = host.attach_root(RegionSpec::new().control("Stack")).unwrap();
        let tabs = root.attach_child(RegionSpec::new().named("tabs")).unwrap();
        assert_eq!(tabs.parent(), Some(root.clone()));
        assert_eq!(tabs.root(), root);
        assert_eq!(root.children(), [tabs.clone()]);
        assert!(tabs.navigator().is_some());
        assert_eq!(
            root.attach_child(RegionSpec::new().named("tabs")).unwrap_err(),
            NavigationError::DuplicateName {
                parent: root.id(),
                name: "tabs".into()
            }
        );
        root.detach();
        assert!(!tabs.is_alive());
        assert!(host.region(root.id()).is_none());
        assert!(tabs.navigator().is_none());
    }

    #[test]
    fn unknown_control_leaves_a_routing_only_region() {
        let host = NavigationHost::new(RouteResolver::default());
        let root = host.attach_root(RegionSpec::new().control("Nope")).unwrap();
        assert!(root.navigator().is_some());
    }
}
