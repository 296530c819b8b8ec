// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Route resolution.
//!
//! [`RouteResolver`] owns the mapping table and answers lookups by path, view type,
//! view-model type, data type and result type. Each lookup tries, in order:
//!
//! 1. an exact match on the declared table,
//! 2. the key's ancestor chain in the [`TypeCatalog`], nearest first (type-keyed lookups),
//! 3. the configured [`ImplicitMapping`], whose synthesized entries are cached.
//!
//! Misses are logged and yield `None`.

use core::fmt;
use std::sync::Arc;

use hashbrown::HashMap;
use indexmap::IndexMap;
use parking_lot::Mutex;
use understory_route::{DialogLookup, Route};

use crate::error::NavigationError;
use crate::mapping::{RouteInfo, RouteMap};
use crate::types::{TypeCatalog, TypeKey};

/// Convention-based fallback used when no explicit mapping exists.
pub trait ImplicitMapping: Send + Sync + fmt::Debug {
    /// Synthesize a mapping for `path`.
    fn for_path(&self, path: &str, catalog: &TypeCatalog) -> Option<RouteMap>;
    /// Synthesize a mapping for a view type.
    fn for_view(&self, view: TypeKey, catalog: &TypeCatalog) -> Option<RouteMap>;
    /// Synthesize a mapping for a view-model type.
    fn for_view_model(&self, view_model: TypeKey, catalog: &TypeCatalog) -> Option<RouteMap>;
}

/// Suffix-based naming convention.
///
/// A path `Profile` maps to the first catalog type named `Profile{suffix}` for each view
/// suffix in order, and likewise for view-models. View and view-model lookups strip a
/// known suffix to recover the path.
#[derive(Clone, Debug)]
pub struct NameConvention {
    /// View suffixes in priority order.
    pub view_suffixes: Vec<&'static str>,
    /// View-model suffixes in priority order.
    pub view_model_suffixes: Vec<&'static str>,
}

impl Default for NameConvention {
    fn default() -> Self {
        Self {
            view_suffixes: vec!["Page", "View", "Control", "Flyout", "Dialog"],
            view_model_suffixes: vec!["ViewModel", "Model"],
        }
    }
}

impl NameConvention {
    fn find(catalog: &TypeCatalog, stem: &str, suffixes: &[&'static str]) -> Option<TypeKey> {
        suffixes
            .iter()
            .find_map(|suffix| catalog.find_by_name(&format!("{stem}{suffix}")))
    }

    fn stem<'a>(name: &'a str, suffixes: &[&'static str]) -> Option<&'a str> {
        suffixes
            .iter()
            .find_map(|suffix| name.strip_suffix(suffix))
            .filter(|stem| !stem.is_empty())
    }
}

impl ImplicitMapping for NameConvention {
    fn for_path(&self, path: &str, catalog: &TypeCatalog) -> Option<RouteMap> {
        if path.is_empty() {
            return None;
        }
        let view = Self::find(catalog, path, &self.view_suffixes);
        let view_model = Self::find(catalog, path, &self.view_model_suffixes);
        if view.is_none() && view_model.is_none() {
            return None;
        }
        let mut map = RouteMap::new(path);
        map.view = view;
        map.view_model = view_model;
        Some(map)
    }

    fn for_view(&self, view: TypeKey, catalog: &TypeCatalog) -> Option<RouteMap> {
        let stem = Self::stem(view.name(), &self.view_suffixes)?;
        let mut map = RouteMap::new(stem);
        map.view = Some(view);
        map.view_model = Self::find(catalog, stem, &self.view_model_suffixes);
        Some(map)
    }

    fn for_view_model(&self, view_model: TypeKey, catalog: &TypeCatalog) -> Option<RouteMap> {
        let stem = Self::stem(view_model.name(), &self.view_model_suffixes)?;
        let mut map = RouteMap::new(stem);
        map.view = Self::find(catalog, stem, &self.view_suffixes);
        map.view_model = Some(view_model);
        Some(map)
    }
}

#[derive(Debug, Default)]
struct SynthesizedCache {
    by_path: HashMap<String, Arc<RouteInfo>>,
    by_view: HashMap<TypeKey, Arc<RouteInfo>>,
    by_view_model: HashMap<TypeKey, Arc<RouteInfo>>,
}

/// The mapping table and its lookups.
pub struct RouteResolver {
    catalog: TypeCatalog,
    implicit: Option<Box<dyn ImplicitMapping>>,
    dialog_types: Vec<TypeKey>,
    top_level: Vec<Arc<RouteInfo>>,
    by_path: IndexMap<String, Arc<RouteInfo>>,
    cache: Mutex<SynthesizedCache>,
}

impl fmt::Debug for RouteResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteResolver")
            .field("implicit", &self.implicit)
            .field("dialog_types", &self.dialog_types)
            .field("paths", &self.by_path.keys().collect::<Vec<_>>())
            .field("synthesized", &self.cache.lock().by_path.len())
            .finish_non_exhaustive()
    }
}

impl Default for RouteResolver {
    fn default() -> Self {
        Self::new(TypeCatalog::new())
    }
}

impl RouteResolver {
    /// Create a resolver over `catalog` with the default [`NameConvention`].
    pub fn new(catalog: TypeCatalog) -> Self {
        Self {
            catalog,
            implicit: Some(Box::new(NameConvention::default())),
            dialog_types: Vec::new(),
            top_level: Vec::new(),
            by_path: IndexMap::new(),
            cache: Mutex::new(SynthesizedCache::default()),
        }
    }

    /// Replace the implicit mapping strategy.
    pub fn with_implicit_mapping(mut self, implicit: impl ImplicitMapping + 'static) -> Self {
        self.implicit = Some(Box::new(implicit));
        self
    }

    /// Disable implicit mapping; unmapped lookups fail instead of guessing.
    pub fn without_implicit_mapping(mut self) -> Self {
        self.implicit = None;
        self
    }

    /// Treat views deriving from `T` as dialog-only.
    ///
    /// Applies to mappings registered or synthesized after this call.
    pub fn with_dialog_type<T: core::any::Any>(mut self) -> Self {
        let key = TypeKey::of::<T>();
        self.catalog.ensure(key);
        self.dialog_types.push(key);
        self
    }

    /// The type catalog.
    pub fn catalog(&self) -> &TypeCatalog {
        &self.catalog
    }

    /// Returns true when implicit mapping is enabled.
    pub fn has_implicit_mapping(&self) -> bool {
        self.implicit.is_some()
    }

    /// Register route maps and their nested children.
    ///
    /// Fails without registering anything when a path is already taken.
    pub fn register(
        &mut self,
        maps: impl IntoIterator<Item = RouteMap>,
    ) -> Result<(), NavigationError> {
        let maps: Vec<RouteMap> = maps.into_iter().collect();
        let mut seen = Vec::new();
        for map in &maps {
            self.check_paths(map, &mut seen)?;
        }
        for map in maps {
            let info = self.build(map, None);
            self.top_level.push(info);
        }
        Ok(())
    }

    fn check_paths<'a>(
        &self,
        map: &'a RouteMap,
        seen: &mut Vec<&'a str>,
    ) -> Result<(), NavigationError> {
        if self.by_path.contains_key(&map.path) || seen.contains(&map.path.as_str()) {
            return Err(NavigationError::DuplicatePath(map.path.clone()));
        }
        seen.push(&map.path);
        for nested in &map.nested {
            self.check_paths(nested, seen)?;
        }
        Ok(())
    }

    fn build(&mut self, map: RouteMap, parent: Option<&str>) -> Arc<RouteInfo> {
        for key in [map.view, map.view_model].into_iter().flatten() {
            self.catalog.ensure(key);
        }
        let nested = map
            .nested
            .into_iter()
            .map(|child| self.build(child, Some(&map.path)))
            .collect();
        let is_dialog = map.dialog || self.is_dialog_type(map.view);
        let info = Arc::new(RouteInfo {
            path: map.path,
            view: map.view,
            view_model: map.view_model,
            data: map.data,
            result: map.result,
            is_default: map.is_default,
            depends_on: map.depends_on,
            init: map.init,
            is_dialog,
            parent: parent.map(str::to_string),
            nested,
        });
        tracing::trace!(path = %info.path, parent = ?info.parent, "registered route");
        self.by_path.insert(info.path.clone(), info.clone());
        info
    }

    fn synthesize(&self, map: RouteMap) -> Arc<RouteInfo> {
        let is_dialog = map.dialog || self.is_dialog_type(map.view);
        Arc::new(RouteInfo {
            path: map.path,
            view: map.view,
            view_model: map.view_model,
            data: map.data,
            result: map.result,
            is_default: false,
            depends_on: String::new(),
            init: None,
            is_dialog,
            parent: None,
            nested: Vec::new(),
        })
    }

    fn is_dialog_type(&self, view: Option<TypeKey>) -> bool {
        view.is_some_and(|view| {
            self.dialog_types
                .iter()
                .any(|dialog| self.catalog.is_a(view, *dialog))
        })
    }

    /// Registered entries in registration order, nested included.
    pub fn routes(&self) -> impl Iterator<Item = &Arc<RouteInfo>> {
        self.by_path.values()
    }

    /// Look an entry up by path.
    pub fn find_by_path(&self, path: &str) -> Option<Arc<RouteInfo>> {
        if path.is_empty() {
            return None;
        }
        if let Some(info) = self.by_path.get(path) {
            return Some(info.clone());
        }
        if let Some(info) = self.cache.lock().by_path.get(path) {
            return Some(info.clone());
        }
        let Some(implicit) = &self.implicit else {
            tracing::debug!(path, "no route mapped for path");
            return None;
        };
        let Some(map) = implicit.for_path(path, &self.catalog) else {
            tracing::debug!(path, "no route mapped or synthesized for path");
            return None;
        };
        let info = self.synthesize(map);
        tracing::debug!(path, view = ?info.view, view_model = ?info.view_model, "synthesized route");
        Some(
            self.cache
                .lock()
                .by_path
                .entry(path.to_string())
                .or_insert(info)
                .clone(),
        )
    }

    fn find_by_type(
        &self,
        key: TypeKey,
        select: impl Fn(&RouteInfo) -> Option<TypeKey>,
    ) -> Option<Arc<RouteInfo>> {
        let exact = |key: TypeKey| {
            self.by_path
                .values()
                .find(|info| select(&***info) == Some(key))
                .cloned()
        };
        if let Some(info) = exact(key) {
            return Some(info);
        }
        self.catalog.ancestors(key).into_iter().find_map(exact)
    }

    /// Look an entry up by view type, falling back along the view's ancestors.
    pub fn find_by_view(&self, view: TypeKey) -> Option<Arc<RouteInfo>> {
        if let Some(info) = self.find_by_type(view, RouteInfo::view) {
            return Some(info);
        }
        if let Some(info) = self.cache.lock().by_view.get(&view) {
            return Some(info.clone());
        }
        let map = self
            .implicit
            .as_ref()
            .and_then(|implicit| implicit.for_view(view, &self.catalog));
        let Some(map) = map else {
            tracing::debug!(%view, "no route mapped for view");
            return None;
        };
        let info = self.synthesize(map);
        let mut cache = self.cache.lock();
        cache
            .by_path
            .entry(info.path.clone())
            .or_insert_with(|| info.clone());
        Some(cache.by_view.entry(view).or_insert(info).clone())
    }

    /// Look an entry up by view-model type, falling back along its ancestors.
    pub fn find_by_view_model(&self, view_model: TypeKey) -> Option<Arc<RouteInfo>> {
        if let Some(info) = self.find_by_type(view_model, RouteInfo::view_model) {
            return Some(info);
        }
        if let Some(info) = self.cache.lock().by_view_model.get(&view_model) {
            return Some(info.clone());
        }
        let map = self
            .implicit
            .as_ref()
            .and_then(|implicit| implicit.for_view_model(view_model, &self.catalog));
        let Some(map) = map else {
            tracing::debug!(%view_model, "no route mapped for view model");
            return None;
        };
        let info = self.synthesize(map);
        let mut cache = self.cache.lock();
        cache
            .by_path
            .entry(info.path.clone())
            .or_insert_with(|| info.clone());
        Some(cache.by_view_model.entry(view_model).or_insert(info).clone())
    }

    /// Look an entry up by the type of its data codec.
    pub fn find_by_data(&self, data: TypeKey) -> Option<Arc<RouteInfo>> {
        let found = self.find_by_type(data, |info| info.data().map(|d| d.data_type()));
        if found.is_none() {
            tracing::debug!(%data, "no route mapped for data type");
        }
        found
    }

    /// Look an entry up by its declared result type.
    pub fn find_by_result_data(&self, result: TypeKey) -> Option<Arc<RouteInfo>> {
        let found = self.find_by_type(result, RouteInfo::result);
        if found.is_none() {
            tracing::debug!(%result, "no route mapped for result type");
        }
        found
    }

    /// The default child of `parent`, or the first top-level default when `parent` is
    /// `None`.
    pub fn default_child(&self, parent: Option<&str>) -> Option<Arc<RouteInfo>> {
        let candidates = match parent {
            Some(path) => self.find_by_path(path)?.nested.clone(),
            None => self.top_level.clone(),
        };
        candidates.into_iter().find(|info| info.is_default)
    }

    /// Entries that must be in place before `info`, outermost first, ending with `info`.
    ///
    /// Same-level prerequisites (`depends_on`) are placed before their dependent, then
    /// the enclosing routes before those.
    pub fn ancestors(&self, info: &Arc<RouteInfo>) -> Vec<Arc<RouteInfo>> {
        let mut chain = vec![info.clone()];
        let mut current = info.clone();
        loop {
            let mut dependee = current.depends_on.clone();
            while !dependee.is_empty() {
                let Some(found) = self.by_path.get(&dependee) else {
                    tracing::debug!(path = %current.path, %dependee, "unknown route dependency");
                    break;
                };
                if chain.iter().any(|c| Arc::ptr_eq(c, found)) {
                    break;
                }
                chain.insert(0, found.clone());
                dependee = found.depends_on.clone();
            }
            let Some(parent) = current.parent.as_deref().and_then(|p| self.by_path.get(p))
            else {
                break;
            };
            if chain.iter().any(|c| Arc::ptr_eq(c, parent)) {
                break;
            }
            chain.insert(0, parent.clone());
            current = parent.clone();
        }
        chain
    }

    /// Prefix `route` with the paths of its ancestors.
    pub fn full_route(&self, route: &Route) -> Route {
        let Some(info) = self.find_by_path(route.base()) else {
            return route.clone();
        };
        let chain = self.ancestors(&info);
        let prefix = chain[..chain.len() - 1]
            .iter()
            .fold(Route::default(), |acc, a| acc.append(&Route::from_base(a.path())));
        route.insert(&prefix)
    }
}

impl DialogLookup for RouteResolver {
    fn is_dialog(&self, base: &str) -> bool {
        self.find_by_path(base)
            .is_some_and(|info| info.is_dialog_view())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use understory_route::{parse, parse_with};

    enum ProfilePage {}
    enum ProfileViewModel {}
    enum Flyout {}
    enum ConfirmFlyout {}
    enum Control {}
    enum ShellPage {}
    enum FancyShellPage {}
    enum Receipt {}

    #[derive(Debug, Default)]
    struct Counting {
        inner: NameConvention,
        scans: Arc<AtomicUsize>,
    }

    impl ImplicitMapping for Counting {
        fn for_path(&self, path: &str, catalog: &TypeCatalog) -> Option<RouteMap> {
            self.scans.fetch_add(1, Ordering::SeqCst);
            self.inner.for_path(path, catalog)
        }
        fn for_view(&self, view: TypeKey, catalog: &TypeCatalog) -> Option<RouteMap> {
            self.scans.fetch_add(1, Ordering::SeqCst);
            self.inner.for_view(view, catalog)
        }
        fn for_view_model(&self, vm: TypeKey, catalog: &TypeCatalog) -> Option<RouteMap> {
            self.scans.fetch_add(1, Ordering::SeqCst);
            self.inner.for_view_model(vm, catalog)
        }
    }

    fn catalog() -> TypeCatalog {
        let mut catalog = TypeCatalog::new();
        catalog.register_derived::<ProfilePage, Control>();
        catalog.register::<ProfileViewModel>();
        catalog.register_derived::<ConfirmFlyout, Flyout>();
        catalog.register_derived::<FancyShellPage, ShellPage>();
        catalog
    }

    fn shell_routes() -> Vec<RouteMap> {
        vec![
            RouteMap::new("Login"),
            RouteMap::new("Shell")
                .view::<ShellPage>()
                .as_default()
                .nested([
                    RouteMap::new("Home").as_default(),
                    RouteMap::new("Products").nested([RouteMap::new("Details")
                        .depends_on("List")
                        .result::<Receipt>()]),
                    RouteMap::new("List"),
                ]),
        ]
    }

    #[test]
    fn find_by_path_synthesizes_and_caches() {
        let counting = Counting::default();
        let scans = counting.scans.clone();
        let resolver = RouteResolver::new(catalog()).with_implicit_mapping(counting);
        let first = resolver.find_by_path("Profile").unwrap();
        assert_eq!(first.view(), Some(TypeKey::of::<ProfilePage>()));
        assert_eq!(first.view_model(), Some(TypeKey::of::<ProfileViewModel>()));
        let second = resolver.find_by_path("Profile").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(scans.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn disabled_implicit_mapping_refuses_to_guess() {
        let resolver = RouteResolver::new(catalog()).without_implicit_mapping();
        assert!(resolver.find_by_path("Profile").is_none());
        assert!(resolver.find_by_view(TypeKey::of::<ProfilePage>()).is_none());
    }

    #[test]
    fn view_lookup_walks_ancestors_before_convention() {
        let mut resolver = RouteResolver::new(catalog());
        resolver.register(shell_routes()).unwrap();
        let info = resolver.find_by_view(TypeKey::of::<FancyShellPage>()).unwrap();
        assert_eq!(info.path(), "Shell");
        let info = resolver
            .find_by_view_model(TypeKey::of::<ProfileViewModel>())
            .unwrap();
        assert_eq!(info.path(), "Profile");
        assert_eq!(info.view(), Some(TypeKey::of::<ProfilePage>()));
        let by_path = resolver.find_by_path("Profile").unwrap();
        assert!(Arc::ptr_eq(&info, &by_path));
    }

    #[test]
    fn result_lookup_is_exact() {
        let mut resolver = RouteResolver::new(catalog());
        resolver.register(shell_routes()).unwrap();
        let info = resolver.find_by_result_data(TypeKey::of::<Receipt>()).unwrap();
        assert_eq!(info.path(), "Details");
        assert!(resolver.find_by_result_data(TypeKey::of::<Flyout>()).is_none());
    }

    #[test]
    fn duplicate_paths_are_rejected_atomically() {
        let mut resolver = RouteResolver::default();
        resolver.register(shell_routes()).unwrap();
        let err = resolver
            .register([RouteMap::new("Fresh"), RouteMap::new("Home")])
            .unwrap_err();
        assert_eq!(err, NavigationError::DuplicatePath("Home".into()));
        assert!(resolver.by_path.get("Fresh").is_none());
    }

    #[test]
    fn default_children() {
        let mut resolver = RouteResolver::default();
        resolver.register(shell_routes()).unwrap();
        assert_eq!(resolver.default_child(None).unwrap().path(), "Shell");
        assert_eq!(resolver.default_child(Some("Shell")).unwrap().path(), "Home");
        assert!(resolver.default_child(Some("Products")).is_none());
        assert!(resolver.default_child(Some("Nowhere")).is_none());
    }

    #[test]
    fn ancestors_put_dependencies_and_parents_first() {
        let mut resolver = RouteResolver::default();
        resolver.register(shell_routes()).unwrap();
        let details = resolver.find_by_path("Details").unwrap();
        let paths: Vec<String> = resolver
            .ancestors(&details)
            .iter()
            .map(|i| i.path().to_string())
            .collect();
        assert_eq!(paths, ["Shell", "Products", "List", "Details"]);
    }

    #[test]
    fn full_route_inserts_ancestors() {
        let mut resolver = RouteResolver::default();
        resolver.register(shell_routes()).unwrap();
        let full = resolver.full_route(&parse("Home?x=1"));
        assert_eq!(full.to_string(), "Shell/Home?x=1");
        let unknown = parse("Elsewhere");
        assert_eq!(resolver.full_route(&unknown), unknown);
    }

    #[test]
    fn dialog_views_promote_parsed_routes() {
        let mut resolver = RouteResolver::new(catalog()).with_dialog_type::<Flyout>();
        resolver
            .register([
                RouteMap::new("Confirm").view::<ConfirmFlyout>(),
                RouteMap::new("Picker").dialog(),
            ])
            .unwrap();
        assert!(resolver.is_dialog("Confirm"));
        assert!(resolver.is_dialog("Picker"));
        assert!(!resolver.is_dialog("Profile"));
        assert_eq!(parse_with("/Confirm", None, &resolver).scheme(), "/!");
    }
}
