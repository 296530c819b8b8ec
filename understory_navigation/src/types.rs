// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Type keys and the type catalog.
//!
//! Views, view-models, data and result types are identified by [`TypeKey`]. The
//! [`TypeCatalog`] records which types are known and which base each derives from, so
//! lookups can fall back along a type's ancestor chain and naming conventions can search
//! for types by name.

use core::any::{Any, TypeId, type_name};
use core::fmt;
use core::hash::{Hash, Hasher};

use hashbrown::HashMap;

/// Identity and short name of a Rust type.
#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    /// Key for `T`.
    pub fn of<T: Any + ?Sized>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: short_name(type_name::<T>()),
        }
    }

    /// The [`TypeId`].
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// The type name without module path or generic arguments.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns true when this key identifies `T`.
    pub fn is<T: Any + ?Sized>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

fn short_name(full: &'static str) -> &'static str {
    let plain = full.split('<').next().unwrap_or(full);
    plain.rsplit("::").next().unwrap_or(plain)
}

#[derive(Clone, Copy, Debug)]
struct CatalogEntry {
    key: TypeKey,
    base: Option<TypeKey>,
}

/// Known types and their declared bases.
#[derive(Clone, Debug, Default)]
pub struct TypeCatalog {
    entries: HashMap<TypeId, CatalogEntry>,
    by_name: HashMap<&'static str, TypeKey>,
}

impl TypeCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare `T` with no base.
    pub fn register<T: Any>(&mut self) -> TypeKey {
        let key = TypeKey::of::<T>();
        self.insert(key, None);
        key
    }

    /// Declare `T` as derived from `Base`. `Base` is declared too if it was unknown.
    pub fn register_derived<T: Any, Base: Any>(&mut self) -> TypeKey {
        let base = TypeKey::of::<Base>();
        if !self.contains(base) {
            self.insert(base, None);
        }
        let key = TypeKey::of::<T>();
        self.insert(key, Some(base));
        key
    }

    /// Declare `key`, replacing any previous base.
    ///
    /// When two types share a short name the first declared keeps the name.
    pub fn insert(&mut self, key: TypeKey, base: Option<TypeKey>) {
        self.entries.insert(key.id, CatalogEntry { key, base });
        self.by_name.entry(key.name).or_insert(key);
    }

    /// Declare `key` unless it is already known.
    pub fn ensure(&mut self, key: TypeKey) {
        if !self.contains(key) {
            self.insert(key, None);
        }
    }

    /// Returns true when `key` has been declared.
    pub fn contains(&self, key: TypeKey) -> bool {
        self.entries.contains_key(&key.id)
    }

    /// Declared base of `key`.
    pub fn base_of(&self, key: TypeKey) -> Option<TypeKey> {
        self.entries.get(&key.id).and_then(|e| e.base)
    }

    /// Bases of `key`, nearest first. `key` itself is not included.
    pub fn ancestors(&self, key: TypeKey) -> Vec<TypeKey> {
        let mut out = Vec::new();
        let mut current = self.base_of(key);
        while let Some(base) = current {
            if base == key || out.contains(&base) {
                break;
            }
            out.push(base);
            current = self.base_of(base);
        }
        out
    }

    /// Returns true when `key` is `base` or derives from it.
    pub fn is_a(&self, key: TypeKey, base: TypeKey) -> bool {
        key == base || self.ancestors(key).contains(&base)
    }

    /// Look a type up by its short name.
    pub fn find_by_name(&self, name: &str) -> Option<TypeKey> {
        self.by_name.get(name).copied()
    }

    /// Iterate over declared types in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = TypeKey> + '_ {
        self.entries.values().map(|e| e.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    enum Control {}
    enum Page {}
    enum ProfilePage {}
    #[expect(dead_code, reason = "only the type name matters")]
    struct Wrapper<T>(T);

    #[test]
    fn short_names_drop_paths_and_generics() {
        assert_eq!(TypeKey::of::<ProfilePage>().name(), "ProfilePage");
        assert_eq!(TypeKey::of::<Wrapper<Page>>().name(), "Wrapper");
        assert_eq!(TypeKey::of::<String>().name(), "String");
    }

    #[test]
    fn ancestors_are_nearest_first() {
        let mut catalog = TypeCatalog::new();
        catalog.register_derived::<Page, Control>();
        catalog.register_derived::<ProfilePage, Page>();
        let profile = TypeKey::of::<ProfilePage>();
        assert_eq!(
            catalog.ancestors(profile),
            [TypeKey::of::<Page>(), TypeKey::of::<Control>()]
        );
        assert!(catalog.is_a(profile, TypeKey::of::<Control>()));
        assert!(!catalog.is_a(TypeKey::of::<Control>(), profile));
    }

    #[test]
    fn find_by_name_sees_registered_types() {
        let mut catalog = TypeCatalog::new();
        catalog.register::<ProfilePage>();
        assert_eq!(
            catalog.find_by_name("ProfilePage"),
            Some(TypeKey::of::<ProfilePage>())
        );
        assert_eq!(catalog.find_by_name("Missing"), None);
    }

    #[test]
    fn self_referencing_base_does_not_loop() {
        let mut catalog = TypeCatalog::new();
        let key = TypeKey::of::<Page>();
        catalog.insert(key, Some(key));
        assert!(catalog.ancestors(key).is_empty());
    }
}
