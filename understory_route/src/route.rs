// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The [`Route`] value and its algebra.

use alloc::string::{String, ToString};
use core::fmt;

use crate::data::{DataValue, RouteData};
use crate::grammar;
use crate::scheme::{self, SchemeKind};

/// A parsed navigation route.
///
/// A route is a scheme, a base segment, the unconsumed remainder of the path and a data
/// bag. Empty strings stand for an absent base or path. Routes are values: every
/// transformation returns a new route.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Route {
    scheme: String,
    base: String,
    path: String,
    data: RouteData,
}

impl Route {
    /// Assemble a route from its parts.
    ///
    /// `path` is kept verbatim and normally starts with the `/` separator.
    pub fn from_parts(
        scheme: impl Into<String>,
        base: impl Into<String>,
        path: impl Into<String>,
        data: RouteData,
    ) -> Self {
        Self {
            scheme: scheme.into(),
            base: base.into(),
            path: path.into(),
            data,
        }
    }

    /// A single-segment route with no scheme.
    pub fn from_base(base: impl Into<String>) -> Self {
        Self::from_parts(scheme::NONE, base, "", RouteData::new())
    }

    /// The scheme.
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// The first path segment.
    pub fn base(&self) -> &str {
        &self.base
    }

    /// The unconsumed remainder, including its leading separator.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The data bag.
    pub fn data(&self) -> &RouteData {
        &self.data
    }

    /// Classification of the scheme.
    pub fn kind(&self) -> SchemeKind {
        SchemeKind::classify(&self.scheme)
    }

    /// Copy with a different scheme.
    pub fn with_scheme(&self, scheme: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
            ..self.clone()
        }
    }

    /// Copy with a different base.
    pub fn with_base(&self, base: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            ..self.clone()
        }
    }

    /// Copy with a different data bag.
    pub fn with_data(&self, data: RouteData) -> Self {
        Self {
            data,
            ..self.clone()
        }
    }

    /// Copy with `payload` stored as the primary payload.
    pub fn with_payload(&self, payload: DataValue) -> Self {
        self.with_data(self.data.with_payload(payload))
    }

    /// Copy with one leading `prefix` removed from the scheme, if present.
    pub fn without_scheme_prefix(&self, prefix: &str) -> Self {
        match self.scheme.strip_prefix(prefix) {
            Some(rest) => self.with_scheme(rest),
            None => self.clone(),
        }
    }

    /// Tree root.
    pub fn is_root(&self) -> bool {
        self.kind().contains(SchemeKind::ROOT)
    }

    /// Nested child scope.
    pub fn is_nested(&self) -> bool {
        self.kind().contains(SchemeKind::NESTED)
    }

    /// Parent scope.
    pub fn is_parent(&self) -> bool {
        self.kind().contains(SchemeKind::PARENT)
    }

    /// Dialog scope.
    pub fn is_dialog(&self) -> bool {
        self.kind().contains(SchemeKind::DIALOG)
    }

    /// Back navigation, including close.
    pub fn is_back(&self) -> bool {
        self.kind().contains(SchemeKind::BACK)
    }

    /// Close of the enclosing dialog scope.
    pub fn is_close(&self) -> bool {
        self.kind().contains(SchemeKind::CLOSE)
    }

    /// Back or close navigation, root- or nested-qualified included.
    pub fn is_back_or_close(&self) -> bool {
        self.kind()
            .intersects(SchemeKind::BACK | SchemeKind::CLOSE)
    }

    /// Forward navigation.
    pub fn is_forward(&self) -> bool {
        self.kind().contains(SchemeKind::FORWARD)
    }

    /// Back navigation that names no target and is not a close.
    pub fn is_pure_back(&self) -> bool {
        self.is_back() && !self.is_close() && self.base.is_empty()
    }

    /// Addressed to the current level.
    pub fn is_current(&self) -> bool {
        self.scheme.is_empty()
    }

    /// No scheme and a blank base.
    pub fn is_empty(&self) -> bool {
        self.scheme.is_empty() && self.base.trim().is_empty()
    }

    /// Number of levels a back navigation pops beyond the first.
    ///
    /// `--` is one extra page; `-Target` is zero extra pages because the pop happens
    /// while navigating to `Target`.
    pub fn pages_to_remove(&self) -> usize {
        let count = scheme::back_count(&self.scheme);
        if self.is_pure_back() {
            count.saturating_sub(1)
        } else {
            count
        }
    }

    /// The head segment alone, keeping scheme and data.
    pub fn head(&self) -> Self {
        Self {
            path: String::new(),
            ..self.clone()
        }
    }

    /// Advance one segment.
    ///
    /// The path's leading scheme and base become the new head. The separator in front of
    /// the next segment is consumed, so a root scheme never survives past the head.
    pub fn next(&self) -> Self {
        let (scheme, base, path) = grammar::split_segment(&self.path);
        let scheme = scheme.strip_prefix(scheme::SEPARATOR).unwrap_or(scheme);
        Self::from_parts(scheme, base, path, self.data.clone())
    }

    /// Iterate over the head routes of every segment.
    pub fn segments(&self) -> Segments {
        Segments {
            current: Some(self.clone()),
        }
    }

    /// Base of the last non-empty segment.
    pub fn last_base(&self) -> String {
        self.segments()
            .filter(|s| !s.base.is_empty())
            .last()
            .map(|s| s.base)
            .unwrap_or_default()
    }

    /// Place `other` after the last segment of this route.
    ///
    /// A none, root or nested scheme on `other` becomes a plain separator; any other
    /// scheme is kept. Appending to a route without a base splices `other` into the head.
    /// Data is merged and `other` wins on shared keys.
    pub fn append(&self, other: &Self) -> Self {
        let data = self.data.merged(&other.data);
        if other.scheme.is_empty() && other.base.is_empty() && other.path.is_empty() {
            return self.with_data(data);
        }
        let other_scheme = match other.scheme.as_str() {
            scheme::NONE | scheme::ROOT | scheme::NESTED => "",
            s => s,
        };

        if self.base.is_empty() && self.path.is_empty() {
            if self.scheme.is_empty() {
                return other.with_data(data);
            }
            let mut spliced = self.scheme.clone();
            spliced.push_str(other_scheme);
            return Self::from_parts(spliced, other.base.clone(), other.path.clone(), data);
        }

        let mut path = self.path.clone();
        if !other_scheme.starts_with(scheme::SEPARATOR) {
            path.push(scheme::SEPARATOR);
        }
        path.push_str(other_scheme);
        path.push_str(&other.base);
        path.push_str(&other.path);
        Self::from_parts(self.scheme.clone(), self.base.clone(), path, data)
    }

    /// Place the segments of `other` in front of this route's head.
    ///
    /// The result keeps this route's scheme; data is merged and this route wins.
    pub fn insert(&self, other: &Self) -> Self {
        if other.base.is_empty() {
            return self.clone();
        }
        let prefix = other.with_scheme(scheme::NONE);
        let tail = self.with_scheme(scheme::NONE);
        let joined = prefix.append(&tail);
        Self {
            scheme: self.scheme.clone(),
            data: other.data.merged(&self.data),
            ..joined
        }
    }

    /// Drop the leading segments whose bases match those of `handled`.
    pub fn trim(&self, handled: &Self) -> Self {
        let mut route = self.clone();
        let mut handled = handled.clone();
        while !handled.base.is_empty() && route.base == handled.base {
            route = route.next();
            handled = handled.next();
        }
        route
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.scheme, self.base, self.path)?;
        let query = self.data.to_query();
        if !query.is_empty() {
            write!(f, "?{query}")?;
        }
        Ok(())
    }
}

impl From<&str> for Route {
    fn from(text: &str) -> Self {
        grammar::parse(text)
    }
}

impl From<Route> for String {
    fn from(route: Route) -> Self {
        route.to_string()
    }
}

/// Iterator over the head segments of a route. See [`Route::segments`].
#[derive(Clone, Debug)]
pub struct Segments {
    current: Option<Route>,
}

impl Iterator for Segments {
    type Item = Route;

    fn next(&mut self) -> Option<Route> {
        let route = self.current.take()?;
        if route.scheme.is_empty() && route.base.is_empty() && route.path.is_empty() {
            return None;
        }
        let next = route.next();
        self.current = Some(next);
        Some(route.head())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::parse;
    use alloc::vec::Vec;

    #[test]
    fn next_consumes_one_segment_and_degrades_root() {
        let r = parse("/Shell/Details/Edit?id=1");
        let n = r.next();
        assert_eq!(n.scheme(), "");
        assert_eq!(n.base(), "Details");
        assert_eq!(n.path(), "/Edit");
        assert_eq!(n.data().text("id"), Some("1"));

        let r = parse("Shell/../Other");
        assert_eq!(r.next().scheme(), "../");
    }

    #[test]
    fn segments_walk_to_the_end() {
        let r = parse("/Shell/tab1/Details");
        let bases: Vec<String> = r.segments().map(|s| s.base().to_string()).collect();
        assert_eq!(bases, ["Shell", "tab1", "Details"]);
        assert_eq!(r.last_base(), "Details");
        assert_eq!(parse("-").segments().count(), 1);
        assert_eq!(Route::default().segments().count(), 0);
    }

    #[test]
    fn append_turns_scope_schemes_into_separators() {
        let shell = parse("Shell");
        assert_eq!(shell.append(&parse("Details")).to_string(), "Shell/Details");
        assert_eq!(shell.append(&parse("./Details")).to_string(), "Shell/Details");
        assert_eq!(shell.append(&parse("/Details")).to_string(), "Shell/Details");
        assert_eq!(shell.append(&parse("!Confirm")).to_string(), "Shell/!Confirm");
        assert_eq!(shell.append(&Route::default()), shell);
    }

    #[test]
    fn append_to_baseless_route_splices_into_head() {
        assert_eq!(parse("-").append(&parse("Home")).to_string(), "-Home");
        assert_eq!(parse("/").append(&parse("./Shell")).to_string(), "/Shell");
        assert_eq!(Route::default().append(&parse("/Shell")).to_string(), "/Shell");
    }

    #[test]
    fn append_merges_data_with_other_winning() {
        let a = parse("Shell?x=1&y=2");
        let b = parse("Details?y=3");
        assert_eq!(a.append(&b).to_string(), "Shell/Details?x=1&y=3");
    }

    #[test]
    fn insert_prefixes_ancestors_and_keeps_scheme() {
        let leaf = parse("/Details?id=4");
        let full = leaf.insert(&parse("Shell/Products"));
        assert_eq!(full.to_string(), "/Shell/Products/Details?id=4");
        assert_eq!(leaf.insert(&Route::default()), leaf);
    }

    #[test]
    fn trim_drops_matching_leading_segments() {
        let r = parse("Shell/Details/Edit");
        assert_eq!(r.trim(&parse("Shell")).to_string(), "Details/Edit");
        assert_eq!(r.trim(&parse("Shell/Details")).to_string(), "Edit");
        assert_eq!(r.trim(&parse("Other")), r);
        assert!(r.trim(&r).is_empty());
    }

    #[test]
    fn predicates() {
        assert!(parse("/Home").is_root());
        assert!(parse("./Home").is_nested());
        assert!(parse("../Home").is_parent());
        assert!(parse("!Confirm").is_dialog());
        assert!(parse("/-").is_back_or_close());
        assert!(parse("-!").is_close());
        assert!(parse("+Home").is_forward());
        assert!(parse("Home").is_current());
        assert!(parse("").is_empty());
        assert!(!parse("-").is_empty());
    }

    #[test]
    fn pages_to_remove_counts_extra_pops() {
        assert_eq!(parse("-").pages_to_remove(), 0);
        assert_eq!(parse("--").pages_to_remove(), 1);
        assert_eq!(parse("---").pages_to_remove(), 2);
        assert_eq!(parse("-Home").pages_to_remove(), 1);
        assert_eq!(parse("--Home").pages_to_remove(), 2);
        assert_eq!(parse("-!").pages_to_remove(), 1);
        assert_eq!(parse("Home").pages_to_remove(), 0);
    }

    #[test]
    fn equality_compares_objects_by_identity() {
        let payload = DataValue::object(5_u8);
        let a = parse("Home").with_payload(payload.clone());
        let b = parse("Home").with_payload(payload);
        let c = parse("Home").with_payload(DataValue::object(5_u8));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn without_scheme_prefix_strips_once() {
        assert_eq!(parse("../../Home").without_scheme_prefix("../").scheme(), "../");
        assert_eq!(parse("Home").without_scheme_prefix("/").scheme(), "");
    }
}
