// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Route mappings.
//!
//! A [`RouteMap`] is what an application declares at startup: a path, the view and
//! view-model types it binds, an optional data codec, an optional result type and its
//! nested children. The [`RouteResolver`](crate::resolver::RouteResolver) turns each map
//! into an immutable, shared [`RouteInfo`].

use core::any::Any;
use core::fmt;
use std::sync::Arc;

use understory_route::{AnyValue, RouteData};

use crate::request::NavigationRequest;
use crate::types::TypeKey;

/// Request rewriter run before a mapped route is executed.
pub type InitFn = Arc<dyn Fn(&RouteInfo, NavigationRequest) -> NavigationRequest + Send + Sync>;

type ToQueryFn = Arc<dyn Fn(&dyn Any) -> RouteData + Send + Sync>;
type FromQueryFn = Arc<dyn Fn(&RouteData) -> Option<AnyValue> + Send + Sync>;

/// Codec between a data type and the textual query of a route.
#[derive(Clone)]
pub struct DataMap {
    data_type: TypeKey,
    to_query: ToQueryFn,
    from_query: FromQueryFn,
}

impl DataMap {
    /// Codec for `T` that writes nothing to the query and never rebuilds a value.
    pub fn of<T: Any + Send + Sync>() -> Self {
        Self {
            data_type: TypeKey::of::<T>(),
            to_query: Arc::new(|_| RouteData::new()),
            from_query: Arc::new(|_| None),
        }
    }

    /// Set the encoder.
    pub fn to_query<T: Any + Send + Sync>(
        mut self,
        encode: impl Fn(&T) -> RouteData + Send + Sync + 'static,
    ) -> Self {
        self.to_query = Arc::new(move |value| {
            value
                .downcast_ref::<T>()
                .map(&encode)
                .unwrap_or_default()
        });
        self
    }

    /// Set the decoder.
    pub fn from_query<T: Any + Send + Sync>(
        mut self,
        decode: impl Fn(&RouteData) -> Option<T> + Send + Sync + 'static,
    ) -> Self {
        self.from_query = Arc::new(move |data| decode(data).map(|v| Arc::new(v) as AnyValue));
        self
    }

    /// The data type.
    pub fn data_type(&self) -> TypeKey {
        self.data_type
    }

    /// Encode `value` into query entries. Values of another type encode to nothing.
    pub fn encode(&self, value: &dyn Any) -> RouteData {
        (self.to_query)(value)
    }

    /// Rebuild a value from query entries.
    pub fn decode(&self, data: &RouteData) -> Option<AnyValue> {
        (self.from_query)(data)
    }
}

impl fmt::Debug for DataMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataMap")
            .field("data_type", &self.data_type)
            .finish_non_exhaustive()
    }
}

/// Registration-time declaration of a route.
#[derive(Clone, Default)]
pub struct RouteMap {
    pub(crate) path: String,
    pub(crate) view: Option<TypeKey>,
    pub(crate) view_model: Option<TypeKey>,
    pub(crate) data: Option<DataMap>,
    pub(crate) result: Option<TypeKey>,
    pub(crate) is_default: bool,
    pub(crate) depends_on: String,
    pub(crate) init: Option<InitFn>,
    pub(crate) dialog: bool,
    pub(crate) nested: Vec<Self>,
}

impl RouteMap {
    /// Declare `path`.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Bind the view type.
    pub fn view<T: Any>(mut self) -> Self {
        self.view = Some(TypeKey::of::<T>());
        self
    }

    /// Bind the view-model type.
    pub fn view_model<T: Any>(mut self) -> Self {
        self.view_model = Some(TypeKey::of::<T>());
        self
    }

    /// Bind a data codec.
    pub fn data(mut self, data: DataMap) -> Self {
        self.data = Some(data);
        self
    }

    /// Declare the type this route returns when navigated back from.
    pub fn result<T: Any>(mut self) -> Self {
        self.result = Some(TypeKey::of::<T>());
        self
    }

    /// Mark as the default child of its parent, or of the top level.
    pub fn as_default(mut self) -> Self {
        self.is_default = true;
        self
    }

    /// Declare a same-level prerequisite.
    pub fn depends_on(mut self, path: impl Into<String>) -> Self {
        self.depends_on = path.into();
        self
    }

    /// Rewrite requests before this route executes.
    pub fn init(
        mut self,
        init: impl Fn(&RouteInfo, NavigationRequest) -> NavigationRequest + Send + Sync + 'static,
    ) -> Self {
        self.init = Some(Arc::new(init));
        self
    }

    /// Show this route in a dialog scope regardless of its view type.
    pub fn dialog(mut self) -> Self {
        self.dialog = true;
        self
    }

    /// Declare nested routes.
    pub fn nested(mut self, nested: impl IntoIterator<Item = Self>) -> Self {
        self.nested.extend(nested);
        self
    }

    /// The declared path.
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl fmt::Debug for RouteMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteMap")
            .field("path", &self.path)
            .field("view", &self.view)
            .field("view_model", &self.view_model)
            .field("data", &self.data)
            .field("result", &self.result)
            .field("is_default", &self.is_default)
            .field("depends_on", &self.depends_on)
            .field("init", &self.init.is_some())
            .field("dialog", &self.dialog)
            .field("nested", &self.nested)
            .finish()
    }
}

/// A resolved, immutable route entry.
#[derive(Clone)]
pub struct RouteInfo {
    pub(crate) path: String,
    pub(crate) view: Option<TypeKey>,
    pub(crate) view_model: Option<TypeKey>,
    pub(crate) data: Option<DataMap>,
    pub(crate) result: Option<TypeKey>,
    pub(crate) is_default: bool,
    pub(crate) depends_on: String,
    pub(crate) init: Option<InitFn>,
    pub(crate) is_dialog: bool,
    pub(crate) parent: Option<String>,
    pub(crate) nested: Vec<Arc<Self>>,
}

impl RouteInfo {
    /// The unique path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// View type.
    pub fn view(&self) -> Option<TypeKey> {
        self.view
    }

    /// View-model type.
    pub fn view_model(&self) -> Option<TypeKey> {
        self.view_model
    }

    /// Data codec.
    pub fn data(&self) -> Option<&DataMap> {
        self.data.as_ref()
    }

    /// Result type.
    pub fn result(&self) -> Option<TypeKey> {
        self.result
    }

    /// Default child of its parent.
    pub fn is_default(&self) -> bool {
        self.is_default
    }

    /// Path of the same-level prerequisite, or empty.
    pub fn depends_on(&self) -> &str {
        &self.depends_on
    }

    /// Path of the enclosing route, if nested.
    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    /// Nested entries in declaration order.
    pub fn nested(&self) -> &[Arc<Self>] {
        &self.nested
    }

    /// Returns true when the view only makes sense in a dialog scope.
    pub fn is_dialog_view(&self) -> bool {
        self.is_dialog
    }

    /// Returns true when a request rewriter is declared.
    pub fn has_init(&self) -> bool {
        self.init.is_some()
    }

    /// Apply the request rewriter, if any.
    pub fn apply_init(&self, request: NavigationRequest) -> NavigationRequest {
        match &self.init {
            Some(init) => init(self, request),
            None => request,
        }
    }
}

impl fmt::Debug for RouteInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteInfo")
            .field("path", &self.path)
            .field("view", &self.view)
            .field("view_model", &self.view_model)
            .field("data", &self.data)
            .field("result", &self.result)
            .field("is_default", &self.is_default)
            .field("depends_on", &self.depends_on)
            .field("init", &self.init.is_some())
            .field("is_dialog", &self.is_dialog)
            .field("parent", &self.parent)
            .field("nested", &self.nested)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use understory_route::DataValue;

    #[derive(Debug, PartialEq)]
    struct Product {
        id: u32,
    }

    fn product_codec() -> DataMap {
        DataMap::of::<Product>()
            .to_query(|p: &Product| RouteData::from_query(&format!("id={}", p.id)))
            .from_query(|data| {
                data.text("id")
                    .and_then(|id| id.parse().ok())
                    .map(|id| Product { id })
            })
    }

    #[test]
    fn data_map_round_trips_through_the_query() {
        let codec = product_codec();
        let query = codec.encode(&Product { id: 9 });
        assert_eq!(query.to_query(), "id=9");
        let rebuilt = codec.decode(&query).unwrap();
        assert_eq!(rebuilt.downcast_ref::<Product>(), Some(&Product { id: 9 }));
    }

    #[test]
    fn data_map_ignores_foreign_values() {
        let codec = product_codec();
        assert!(codec.encode(&5_u8).is_empty());
        assert!(codec.decode(&RouteData::from_query("x=1")).is_none());
        let payload = DataValue::object(Product { id: 1 });
        assert!(payload.downcast_ref::<Product>().is_some());
    }

    #[test]
    fn route_map_builder_collects_nested() {
        let map = RouteMap::new("Shell")
            .nested([RouteMap::new("Home").as_default(), RouteMap::new("Settings")]);
        assert_eq!(map.path(), "Shell");
        assert_eq!(map.nested.len(), 2);
        assert!(map.nested[0].is_default);
    }
}
