// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Region tree.
//!
//! Regions live in a generational arena owned by the
//! [`NavigationHost`](crate::host::NavigationHost). A [`RegionId`] stays valid until its
//! region is detached; afterwards every query on it returns `None` or an empty result,
//! and a reused slot never aliases an old id.
//!
//! Each region has an optional name, an optional parent and an ordered list of children.
//! Dialog scopes are attached to a parent but kept out of its children, so normal child
//! dispatch never reaches them. Among a region's children at most one carries any given
//! non-empty name.
//!
//! A region's navigator slot holds its own navigator plus at most one pending override,
//! the [`ResponseNavigator`](crate::response_navigator::ResponseNavigator) waiting for a
//! typed result. Overrides are tagged; restoring with a stale tag is a no-op.

use core::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use understory_route::{Route, merge};

use crate::error::NavigationError;
use crate::host::NavigationHost;
use crate::navigator::Navigator;

/// Identifier for a region (generational).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct RegionId(u32, u32);

impl RegionId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    const fn idx(self) -> usize {
        self.0 as usize
    }
}

/// The view side of a region.
#[async_trait]
pub trait RegionView: Send + Sync + fmt::Debug {
    /// Resolves once the region's view is attached and can show content.
    async fn ensure_ready(&self);
}

/// Resolves a pending override as "no result".
pub(crate) type Abandon = Arc<dyn Fn() + Send + Sync>;

struct Override {
    tag: u64,
    navigator: Arc<dyn Navigator>,
    abandon: Abandon,
}

/// Primary navigator plus at most one tagged override.
#[derive(Default)]
pub(crate) struct NavigatorSlot {
    primary: Option<Arc<dyn Navigator>>,
    pending: Option<Override>,
}

impl fmt::Debug for NavigatorSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NavigatorSlot")
            .field("primary", &self.primary.is_some())
            .field("pending", &self.pending.as_ref().map(|o| o.tag))
            .finish()
    }
}

impl NavigatorSlot {
    /// The override if one is pending, else the primary navigator.
    pub(crate) fn active(&self) -> Option<Arc<dyn Navigator>> {
        match &self.pending {
            Some(o) => Some(o.navigator.clone()),
            None => self.primary.clone(),
        }
    }

    pub(crate) fn primary(&self) -> Option<Arc<dyn Navigator>> {
        self.primary.clone()
    }

    /// Set the primary navigator unless an override is pending.
    pub(crate) fn register_active(&mut self, navigator: Arc<dyn Navigator>) -> bool {
        if self.pending.is_some() {
            return false;
        }
        self.primary = Some(navigator);
        true
    }

    /// Install an override, returning the abandon hook of the one it displaced.
    pub(crate) fn substitute(
        &mut self,
        tag: u64,
        navigator: Arc<dyn Navigator>,
        abandon: Abandon,
    ) -> Option<Abandon> {
        self.pending
            .replace(Override {
                tag,
                navigator,
                abandon,
            })
            .map(|o| o.abandon)
    }

    /// Remove the override if it still carries `tag`.
    pub(crate) fn restore(&mut self, tag: u64) -> bool {
        if self.pending.as_ref().is_some_and(|o| o.tag == tag) {
            self.pending = None;
            true
        } else {
            false
        }
    }

    fn take_abandon(&mut self) -> Option<Abandon> {
        self.pending.take().map(|o| o.abandon)
    }
}

#[derive(Debug)]
struct RegionNode {
    generation: u32,
    name: Option<String>,
    parent: Option<RegionId>,
    children: Vec<RegionId>,
    scopes: Vec<RegionId>,
    scoped: bool,
    current_route: Option<Route>,
    view: Option<Arc<dyn RegionView>>,
    slot: NavigatorSlot,
}

/// Generational storage for regions.
#[derive(Debug, Default)]
pub(crate) struct RegionArena {
    nodes: Vec<Option<RegionNode>>,
    /// last generation per slot (persists across frees)
    generations: Vec<u32>,
    free_list: Vec<usize>,
    next_tag: u64,
}

impl RegionArena {
    /// Insert a region under `parent`, or as a root.
    ///
    /// Scoped regions keep a parent link but are not listed among its children.
    pub(crate) fn insert(
        &mut self,
        parent: Option<RegionId>,
        name: Option<String>,
        scoped: bool,
        view: Option<Arc<dyn RegionView>>,
    ) -> Result<RegionId, NavigationError> {
        let name = name.filter(|n| !n.is_empty());
        if let Some(p) = parent {
            if !self.is_alive(p) {
                return Err(NavigationError::StaleRegion(p));
            }
            if let Some(name) = &name
                && !scoped
                && self.child_named(p, name).is_some()
            {
                return Err(NavigationError::DuplicateName {
                    parent: p,
                    name: name.clone(),
                });
            }
        }

        let (idx, generation) = if let Some(idx) = self.free_list.pop() {
            let generation = self.generations[idx].saturating_add(1);
            self.generations[idx] = generation;
            (idx, generation)
        } else {
            self.nodes.push(None);
            self.generations.push(1);
            (self.nodes.len() - 1, 1)
        };
        self.nodes[idx] = Some(RegionNode {
            generation,
            name,
            parent,
            children: Vec::new(),
            scopes: Vec::new(),
            scoped,
            current_route: None,
            view,
            slot: NavigatorSlot::default(),
        });
        #[allow(
            clippy::cast_possible_truncation,
            reason = "RegionId uses 32-bit indices by design."
        )]
        let id = RegionId::new(idx as u32, generation);
        if let Some(p) = parent
            && let Some(parent) = self.node_mut(p)
        {
            if scoped {
                parent.scopes.push(id);
            } else {
                parent.children.push(id);
            }
        }
        Ok(id)
    }

    /// Remove a region with its children and scopes.
    ///
    /// Returns the abandon hooks of overrides that were pending in the removed subtree,
    /// keyed by region; call them once the arena is unlocked.
    pub(crate) fn remove(&mut self, id: RegionId) -> Vec<(RegionId, Abandon)> {
        let mut abandoned = Vec::new();
        if let Some(parent) = self.parent_of(id)
            && let Some(p) = self.node_mut(parent)
        {
            p.children.retain(|c| *c != id);
            p.scopes.retain(|c| *c != id);
        }
        let mut stack = vec![id];
        while let Some(id) = stack.pop() {
            let Some(mut node) = self.nodes.get_mut(id.idx()).and_then(Option::take) else {
                continue;
            };
            if node.generation != id.1 {
                self.nodes[id.idx()] = Some(node);
                continue;
            }
            stack.extend(node.children.iter().copied());
            stack.extend(node.scopes.iter().copied());
            abandoned.extend(node.slot.take_abandon().map(|abandon| (id, abandon)));
            self.free_list.push(id.idx());
        }
        abandoned
    }

    fn node(&self, id: RegionId) -> Option<&RegionNode> {
        self.nodes
            .get(id.idx())
            .and_then(|n| n.as_ref())
            .filter(|n| n.generation == id.1)
    }

    fn node_mut(&mut self, id: RegionId) -> Option<&mut RegionNode> {
        self.nodes
            .get_mut(id.idx())
            .and_then(|n| n.as_mut())
            .filter(|n| n.generation == id.1)
    }

    /// Returns true if `id` refers to a live region.
    pub(crate) fn is_alive(&self, id: RegionId) -> bool {
        self.node(id).is_some()
    }

    pub(crate) fn name_of(&self, id: RegionId) -> Option<&str> {
        self.node(id).and_then(|n| n.name.as_deref())
    }

    pub(crate) fn parent_of(&self, id: RegionId) -> Option<RegionId> {
        self.node(id).and_then(|n| n.parent)
    }

    /// Children in attachment order, or empty for stale ids.
    pub(crate) fn children_of(&self, id: RegionId) -> &[RegionId] {
        self.node(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Open dialog scopes, oldest first.
    pub(crate) fn scopes_of(&self, id: RegionId) -> &[RegionId] {
        self.node(id).map(|n| n.scopes.as_slice()).unwrap_or(&[])
    }

    pub(crate) fn is_scoped(&self, id: RegionId) -> bool {
        self.node(id).is_some_and(|n| n.scoped)
    }

    pub(crate) fn root_of(&self, id: RegionId) -> RegionId {
        let mut current = id;
        while let Some(parent) = self.parent_of(current) {
            current = parent;
        }
        current
    }

    pub(crate) fn child_named(&self, id: RegionId, name: &str) -> Option<RegionId> {
        if name.is_empty() {
            return None;
        }
        self.children_of(id)
            .iter()
            .copied()
            .find(|c| self.name_of(*c) == Some(name))
    }

    pub(crate) fn current_route(&self, id: RegionId) -> Option<&Route> {
        self.node(id).and_then(|n| n.current_route.as_ref())
    }

    pub(crate) fn set_current_route(&mut self, id: RegionId, route: Option<Route>) {
        if let Some(node) = self.node_mut(id) {
            node.current_route = route;
        }
    }

    pub(crate) fn view(&self, id: RegionId) -> Option<Arc<dyn RegionView>> {
        self.node(id).and_then(|n| n.view.clone())
    }

    pub(crate) fn slot(&self, id: RegionId) -> Option<&NavigatorSlot> {
        self.node(id).map(|n| &n.slot)
    }

    pub(crate) fn slot_mut(&mut self, id: RegionId) -> Option<&mut NavigatorSlot> {
        self.node_mut(id).map(|n| &mut n.slot)
    }

    pub(crate) fn next_tag(&mut self) -> u64 {
        self.next_tag += 1;
        self.next_tag
    }
}

/// Declaration of a region to attach.
#[derive(Clone, Debug, Default)]
pub struct RegionSpec {
    pub(crate) name: Option<String>,
    pub(crate) control: Option<String>,
    pub(crate) view: Option<Arc<dyn RegionView>>,
}

impl RegionSpec {
    /// An unnamed region without a control.
    pub fn new() -> Self {
        Self::default()
    }

    /// Name the region. Named regions consume their own name from incoming routes.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Host a control registered under `control` in the
    /// [`NavigatorFactory`](crate::factory::NavigatorFactory).
    pub fn control(mut self, control: impl Into<String>) -> Self {
        self.control = Some(control.into());
        self
    }

    /// Attach a view readiness hook.
    pub fn view(mut self, view: Arc<dyn RegionView>) -> Self {
        self.view = Some(view);
        self
    }
}

/// Handle to a live region.
#[derive(Clone)]
pub struct Region {
    host: Arc<NavigationHost>,
    id: RegionId,
}

impl fmt::Debug for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Region")
            .field("id", &self.id)
            .field("name", &self.name())
            .finish_non_exhaustive()
    }
}

impl PartialEq for Region {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && Arc::ptr_eq(&self.host, &other.host)
    }
}

impl Region {
    pub(crate) fn new(host: Arc<NavigationHost>, id: RegionId) -> Self {
        Self { host, id }
    }

    /// The region's id.
    pub fn id(&self) -> RegionId {
        self.id
    }

    /// The owning host.
    pub fn host(&self) -> &Arc<NavigationHost> {
        &self.host
    }

    /// Returns true until the region is detached.
    pub fn is_alive(&self) -> bool {
        self.host.regions().is_alive(self.id)
    }

    /// The region's name.
    pub fn name(&self) -> Option<String> {
        self.host.regions().name_of(self.id).map(str::to_string)
    }

    /// The parent region.
    pub fn parent(&self) -> Option<Self> {
        let parent = self.host.regions().parent_of(self.id)?;
        Some(Self::new(self.host.clone(), parent))
    }

    /// Children in attachment order. Dialog scopes are not included.
    pub fn children(&self) -> Vec<Self> {
        let ids = self.host.regions().children_of(self.id).to_vec();
        ids.into_iter()
            .map(|id| Self::new(self.host.clone(), id))
            .collect()
    }

    /// Open dialog scopes, oldest first.
    pub fn scopes(&self) -> Vec<Self> {
        let ids = self.host.regions().scopes_of(self.id).to_vec();
        ids.into_iter()
            .map(|id| Self::new(self.host.clone(), id))
            .collect()
    }

    /// Returns true for dialog scopes.
    pub fn is_scoped(&self) -> bool {
        self.host.regions().is_scoped(self.id)
    }

    /// The root of this region's tree.
    pub fn root(&self) -> Self {
        let root = self.host.regions().root_of(self.id);
        Self::new(self.host.clone(), root)
    }

    /// The route this region last executed.
    pub fn current_route(&self) -> Option<Route> {
        self.host.regions().current_route(self.id).cloned()
    }

    /// The route describing this region and its subtree, folding in the deepest child.
    pub fn full_route(&self) -> Option<Route> {
        let children: Vec<(String, Route)> = self
            .children()
            .into_iter()
            .filter_map(|c| Some((c.name().unwrap_or_default(), c.full_route()?)))
            .collect();
        let current = self.current_route();
        merge(
            current.as_ref(),
            children.iter().map(|(name, route)| (name.as_str(), route.clone())),
        )
    }

    /// The active navigator: a pending response navigator, else the region's own.
    pub fn navigator(&self) -> Option<Arc<dyn Navigator>> {
        self.host.regions().slot(self.id)?.active()
    }

    /// Attach a child region.
    pub fn attach_child(&self, spec: RegionSpec) -> Result<Self, NavigationError> {
        self.host.attach(Some(self.id), spec, false)
    }

    /// Detach this region and its subtree. Pending typed results resolve as `None`.
    pub fn detach(&self) {
        self.host.detach(self.id);
    }
}
