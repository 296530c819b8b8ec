// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Control lookup by name.

use core::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::control::{ControlAdapter, StackControl};
use crate::types::{TypeCatalog, TypeKey};

/// Builds a fresh control for a region.
pub type ControlBuilder = Arc<dyn Fn() -> Arc<dyn ControlAdapter> + Send + Sync>;

/// Control used for dialog scopes whose view names no registered control.
pub const DEFAULT_DIALOG_CONTROL: &str = "Dialog";

/// Table from control name to control builder.
///
/// [`NavigatorFactory::new`] registers `"Stack"` and `"Dialog"`, both backed by
/// [`StackControl`].
#[derive(Clone)]
pub struct NavigatorFactory {
    builders: IndexMap<String, ControlBuilder>,
}

impl fmt::Debug for NavigatorFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NavigatorFactory")
            .field("controls", &self.builders.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Default for NavigatorFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl NavigatorFactory {
    /// A factory with the built-in controls.
    pub fn new() -> Self {
        Self::empty()
            .with("Stack", || Arc::new(StackControl::new("Stack")))
            .with(DEFAULT_DIALOG_CONTROL, || {
                Arc::new(StackControl::new(DEFAULT_DIALOG_CONTROL))
            })
    }

    /// A factory with no controls.
    pub fn empty() -> Self {
        Self {
            builders: IndexMap::new(),
        }
    }

    /// Register `builder` under `name`, replacing any previous builder.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        builder: impl Fn() -> Arc<dyn ControlAdapter> + Send + Sync + 'static,
    ) {
        self.builders.insert(name.into(), Arc::new(builder));
    }

    /// Builder-style [`register`](Self::register).
    pub fn with(
        mut self,
        name: impl Into<String>,
        builder: impl Fn() -> Arc<dyn ControlAdapter> + Send + Sync + 'static,
    ) -> Self {
        self.register(name, builder);
        self
    }

    /// Returns true when `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.builders.contains_key(name)
    }

    /// Build the control registered under `name`.
    pub fn build(&self, name: &str) -> Option<Arc<dyn ControlAdapter>> {
        let Some(builder) = self.builders.get(name) else {
            tracing::warn!(control = name, "no control registered");
            return None;
        };
        Some(builder())
    }

    /// Name of the control that hosts `view` in a dialog scope.
    ///
    /// The view type and then its ancestors are matched by name against the registered
    /// controls; without a match the default dialog control is used.
    pub fn control_for_view(&self, view: Option<TypeKey>, catalog: &TypeCatalog) -> String {
        view.into_iter()
            .flat_map(|view| core::iter::once(view).chain(catalog.ancestors(view)))
            .find(|key| self.contains(key.name()))
            .map_or_else(|| DEFAULT_DIALOG_CONTROL.to_string(), |key| key.name().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    enum Flyout {}
    enum ConfirmFlyout {}
    enum Page {}

    #[test]
    fn builtin_controls_are_registered() {
        let factory = NavigatorFactory::new();
        assert!(factory.build("Stack").is_some());
        assert!(factory.build("Dialog").is_some());
        assert!(factory.build("Tabs").is_none());
    }

    #[test]
    fn dialog_control_follows_view_ancestry() {
        let mut catalog = TypeCatalog::new();
        catalog.register_derived::<ConfirmFlyout, Flyout>();
        catalog.register::<Page>();
        let factory = NavigatorFactory::new()
            .with("Flyout", || Arc::new(StackControl::new("Flyout")));
        assert_eq!(
            factory.control_for_view(Some(TypeKey::of::<ConfirmFlyout>()), &catalog),
            "Flyout"
        );
        assert_eq!(
            factory.control_for_view(Some(TypeKey::of::<Page>()), &catalog),
            "Dialog"
        );
        assert_eq!(factory.control_for_view(None, &catalog), "Dialog");
    }
}
