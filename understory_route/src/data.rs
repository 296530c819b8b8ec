// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Route data bag.
//!
//! [`RouteData`] is an insertion-ordered map from string keys to [`DataValue`]s. Query string
//! pairs land in it as [`DataValue::Text`]; callers attach arbitrary payloads as
//! [`DataValue::Object`]. The empty key ([`PAYLOAD`]) is reserved for the primary payload.
//!
//! Back and close navigations carry their payload as [`DataValue::Optional`] so that an
//! explicit "no value" stays distinguishable from "no payload at all".

use alloc::string::{String, ToString};
use alloc::sync::Arc;
use core::any::Any;
use core::fmt;

use hashbrown::DefaultHashBuilder;
use indexmap::IndexMap;

/// Type-erased, shareable payload.
pub type AnyValue = Arc<dyn Any + Send + Sync>;

/// Reserved key for the primary navigation payload.
pub const PAYLOAD: &str = "";

/// A single value in a [`RouteData`] bag.
#[derive(Clone)]
pub enum DataValue {
    /// Textual value, typically from the query string.
    Text(String),
    /// Arbitrary object.
    Object(AnyValue),
    /// Option-wrapped value used for back/close results.
    Optional(Option<AnyValue>),
}

impl DataValue {
    /// Wrap an arbitrary value as [`DataValue::Object`].
    pub fn object<T: Any + Send + Sync>(value: T) -> Self {
        Self::Object(Arc::new(value))
    }

    /// Wrap an optional value as [`DataValue::Optional`].
    pub fn optional<T: Any + Send + Sync>(value: Option<T>) -> Self {
        Self::Optional(value.map(|v| Arc::new(v) as AnyValue))
    }

    /// Returns the text of a [`DataValue::Text`].
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns true for [`DataValue::Optional`].
    pub fn is_optional(&self) -> bool {
        matches!(self, Self::Optional(_))
    }

    /// Downcast the carried object (if any) to `T`.
    ///
    /// `Optional(None)` and `Text` never downcast.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            Self::Object(v) | Self::Optional(Some(v)) => v.downcast_ref::<T>(),
            _ => None,
        }
    }

    /// Convert into the option-wrapped form.
    ///
    /// Values that are already optional are returned unchanged.
    pub fn into_optional(self) -> Self {
        match self {
            Self::Text(s) => Self::Optional(Some(Arc::new(s) as AnyValue)),
            Self::Object(v) => Self::Optional(Some(v)),
            optional @ Self::Optional(_) => optional,
        }
    }
}

impl fmt::Debug for DataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.debug_tuple("Text").field(s).finish(),
            Self::Object(_) => f.write_str("Object(..)"),
            Self::Optional(Some(_)) => f.write_str("Optional(Some(..))"),
            Self::Optional(None) => f.write_str("Optional(None)"),
        }
    }
}

impl PartialEq for DataValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => Arc::ptr_eq(a, b),
            (Self::Optional(None), Self::Optional(None)) => true,
            (Self::Optional(Some(a)), Self::Optional(Some(b))) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<&str> for DataValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for DataValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Insertion-ordered key/value bag attached to a route.
#[derive(Clone, Default, PartialEq)]
pub struct RouteData {
    entries: IndexMap<String, DataValue, DefaultHashBuilder>,
}

impl fmt::Debug for RouteData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.entries.iter()).finish()
    }
}

impl RouteData {
    /// Create an empty bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a `key=value&key=value` query string.
    ///
    /// Empty pairs are skipped, a pair without `=` yields an empty value and the last
    /// occurrence of a key wins.
    pub fn from_query(query: &str) -> Self {
        let mut data = Self::new();
        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            data.insert(key, DataValue::Text(value.to_string()));
        }
        data
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when the bag has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up a value.
    pub fn get(&self, key: &str) -> Option<&DataValue> {
        self.entries.get(key)
    }

    /// Look up a textual value.
    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(DataValue::as_text)
    }

    /// Insert a value; an existing key keeps its position and takes the new value.
    pub fn insert(&mut self, key: impl Into<String>, value: DataValue) {
        self.entries.insert(key.into(), value);
    }

    /// Remove a value, preserving the order of the remaining entries.
    pub fn remove(&mut self, key: &str) -> Option<DataValue> {
        self.entries.shift_remove(key)
    }

    /// The primary payload, stored under [`PAYLOAD`].
    pub fn payload(&self) -> Option<&DataValue> {
        self.get(PAYLOAD)
    }

    /// Copy of this bag with `payload` stored under [`PAYLOAD`].
    pub fn with_payload(&self, payload: DataValue) -> Self {
        let mut data = self.clone();
        data.insert(PAYLOAD, payload);
        data
    }

    /// Copy of this bag overlaid with `other`; `other` wins on shared keys.
    pub fn merged(&self, other: &Self) -> Self {
        let mut data = self.clone();
        for (key, value) in other.iter() {
            data.insert(key, value.clone());
        }
        data
    }

    /// Iterate over entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &DataValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Textual entries with non-empty keys, in insertion order.
    pub fn query_pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.iter()
            .filter(|(k, _)| !k.is_empty())
            .filter_map(|(k, v)| v.as_text().map(|t| (k, t)))
    }

    /// Render the query string (without the leading `?`).
    pub fn to_query(&self) -> String {
        let mut out = String::new();
        for (key, value) in self.query_pairs() {
            if !out.is_empty() {
                out.push('&');
            }
            out.push_str(key);
            out.push('=');
            out.push_str(value);
        }
        out
    }
}

impl<K: Into<String>> FromIterator<(K, DataValue)> for RouteData {
    fn from_iter<I: IntoIterator<Item = (K, DataValue)>>(iter: I) -> Self {
        let mut data = Self::new();
        for (key, value) in iter {
            data.insert(key, value);
        }
        data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use alloc::vec::Vec;

    #[test]
    fn query_last_key_wins_and_keeps_position() {
        let data = RouteData::from_query("a=1&b=2&a=3");
        let pairs: Vec<(&str, &str)> = data.query_pairs().collect();
        assert_eq!(pairs, vec![("a", "3"), ("b", "2")]);
    }

    #[test]
    fn query_tolerates_missing_values_and_empty_pairs() {
        let data = RouteData::from_query("&flag&x=&&y=1");
        assert_eq!(data.text("flag"), Some(""));
        assert_eq!(data.text("x"), Some(""));
        assert_eq!(data.text("y"), Some("1"));
        assert_eq!(data.len(), 3);
    }

    #[test]
    fn payload_is_not_serialized() {
        let data = RouteData::from_query("id=7").with_payload(DataValue::object(42_u32));
        assert_eq!(data.to_query(), "id=7");
        assert_eq!(data.payload().and_then(|p| p.downcast_ref::<u32>()), Some(&42));
    }

    #[test]
    fn into_optional_wraps_once() {
        let wrapped = DataValue::from("x").into_optional();
        assert!(wrapped.is_optional());
        assert_eq!(
            wrapped.downcast_ref::<String>().map(String::as_str),
            Some("x")
        );
        let none = DataValue::Optional(None).into_optional();
        assert_eq!(none, DataValue::Optional(None));
    }

    #[test]
    fn merged_prefers_other() {
        let a = RouteData::from_query("x=1&y=2");
        let b = RouteData::from_query("y=3&z=4");
        assert_eq!(a.merged(&b).to_query(), "x=1&y=3&z=4");
    }
}
