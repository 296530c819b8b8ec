// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Route string grammar.
//!
//! ```text
//! [<scheme-chars>]<segment>[/<segment>...][?key=value&...]
//! ```
//!
//! Parsing never fails. The query string is split off at the first `?`, the leading run of
//! scheme characters becomes the scheme, the following run of base characters becomes the
//! base, and whatever is left is kept verbatim as the path. Fragments that do not fit the
//! grammar degrade to an empty scheme, base or path.

use alloc::string::{String, ToString};

use crate::data::{DataValue, PAYLOAD, RouteData};
use crate::route::Route;
use crate::scheme::{self, SchemeKind};

/// Source of scheme-independent facts about a base segment.
///
/// Implemented by route registries so that parsing can promote a route to a dialog
/// navigation when the mapped view is dialog-only.
pub trait DialogLookup {
    /// Returns true when `base` is mapped to a dialog-only view.
    fn is_dialog(&self, base: &str) -> bool;
}

/// A [`DialogLookup`] that knows nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoLookup;

impl DialogLookup for NoLookup {
    fn is_dialog(&self, _base: &str) -> bool {
        false
    }
}

impl<L: DialogLookup + ?Sized> DialogLookup for &L {
    fn is_dialog(&self, base: &str) -> bool {
        (**self).is_dialog(base)
    }
}

/// Parse a route string without payload or lookup.
pub fn parse(text: &str) -> Route {
    parse_with(text, None, &NoLookup)
}

/// Parse a route string, attaching `payload` and consulting `lookup` for dialog views.
///
/// When the parsed route is a back or close navigation, a payload that is not already
/// [`DataValue::Optional`] is wrapped as `Optional(Some(..))`.
pub fn parse_with(text: &str, payload: Option<DataValue>, lookup: &impl DialogLookup) -> Route {
    let (path_part, query) = match text.split_once('?') {
        Some((path, query)) => (path, query),
        None => (text, ""),
    };
    let mut data = RouteData::from_query(query);
    if let Some(payload) = payload {
        data.insert(PAYLOAD, payload);
    }

    let (scheme, base, path) = split_segment(path_part);
    let scheme = promote_dialog(scheme, base, lookup);
    let kind = SchemeKind::classify(&scheme);

    if kind.contains(SchemeKind::BACK)
        && let Some(payload) = data.remove(PAYLOAD)
    {
        data.insert(PAYLOAD, payload.into_optional());
    }

    Route::from_parts(scheme, base.to_string(), path.to_string(), data)
}

/// Split a query-less route string into scheme, base and path.
pub(crate) fn split_segment(text: &str) -> (&str, &str, &str) {
    let scheme_len = text.find(scheme::is_base_char).unwrap_or(text.len());
    let (raw_scheme, rest) = text.split_at(scheme_len);
    let scheme = if scheme::is_valid(raw_scheme) {
        raw_scheme
    } else {
        scheme::NONE
    };
    let base_len = rest
        .find(|c: char| !scheme::is_base_char(c))
        .unwrap_or(rest.len());
    let (base, path) = rest.split_at(base_len);
    (scheme, base, path)
}

fn promote_dialog(scheme: &str, base: &str, lookup: &impl DialogLookup) -> String {
    if base.is_empty() || !lookup.is_dialog(base) {
        return scheme.to_string();
    }
    let kind = SchemeKind::classify(scheme);
    if kind.intersects(SchemeKind::DIALOG | SchemeKind::BACK | SchemeKind::PARENT) {
        return scheme.to_string();
    }
    if kind.contains(SchemeKind::ROOT) {
        let mut promoted = String::from(scheme::ROOT);
        promoted.push_str(scheme::DIALOG);
        promoted
    } else {
        scheme::DIALOG.to_string()
    }
}

/// Fold child routes back into `route`.
///
/// The child with the longest serialized route wins; ties keep the first in iteration
/// order. Empty child routes are ignored. A named child whose name is not already the last
/// base of `route` contributes `name/child`.
pub fn merge<'a, I>(route: Option<&Route>, children: I) -> Option<Route>
where
    I: IntoIterator<Item = (&'a str, Route)>,
{
    let mut deepest: Option<(&str, Route, usize)> = None;
    for (name, child) in children {
        if child.is_empty() {
            continue;
        }
        let len = child.to_string().len();
        if deepest.as_ref().is_none_or(|(_, _, best)| len > *best) {
            deepest = Some((name, child, len));
        }
    }

    let Some((name, child, _)) = deepest else {
        return route.cloned();
    };
    let Some(route) = route else {
        return Some(child);
    };
    let contribution = if name.is_empty() || route.last_base() == name {
        child
    } else {
        Route::from_base(name).append(&child)
    };
    Some(route.append(&contribution))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    struct Dialogs;
    impl DialogLookup for Dialogs {
        fn is_dialog(&self, base: &str) -> bool {
            base == "Confirm"
        }
    }

    #[test]
    fn parse_splits_scheme_base_path_and_query() {
        let r = parse("../Shell/Details?id=5&tab=2");
        assert_eq!(r.scheme(), "../");
        assert_eq!(r.base(), "Shell");
        assert_eq!(r.path(), "/Details");
        assert_eq!(r.data().text("id"), Some("5"));
        assert_eq!(r.data().text("tab"), Some("2"));
    }

    #[test]
    fn unknown_scheme_characters_are_dropped() {
        let r = parse("#Home/Next");
        assert_eq!(r.scheme(), "");
        assert_eq!(r.base(), "Home");
        assert_eq!(r.path(), "/Next");
    }

    #[test]
    fn malformed_input_degrades_to_empty() {
        let r = parse("?");
        assert!(r.is_empty());
        let r = parse("");
        assert!(r.is_empty());
        let r = parse("#?x=1");
        assert!(r.is_empty());
        assert_eq!(r.data().text("x"), Some("1"));
    }

    #[test]
    fn dialog_scheme_is_synthesized_from_lookup() {
        assert_eq!(parse_with("Confirm", None, &Dialogs).scheme(), "!");
        assert_eq!(parse_with("./Confirm", None, &Dialogs).scheme(), "!");
        assert_eq!(parse_with("/Confirm", None, &Dialogs).scheme(), "/!");
        assert_eq!(parse_with("-Confirm", None, &Dialogs).scheme(), "-");
        assert_eq!(parse_with("Other", None, &Dialogs).scheme(), "");
    }

    #[test]
    fn back_payload_is_option_wrapped() {
        let r = parse_with("-", Some(DataValue::object(7_i32)), &NoLookup);
        let payload = r.data().payload().unwrap();
        assert!(payload.is_optional());
        assert_eq!(payload.downcast_ref::<i32>(), Some(&7));

        let r = parse_with("-", Some(DataValue::Optional(None)), &NoLookup);
        assert_eq!(r.data().payload(), Some(&DataValue::Optional(None)));

        let r = parse_with("Home", Some(DataValue::object(7_i32)), &NoLookup);
        assert!(!r.data().payload().unwrap().is_optional());
    }

    #[test]
    fn merge_picks_the_deepest_child() {
        let shell = parse("Shell");
        let merged = merge(
            Some(&shell),
            vec![("tab1", parse("Details")), ("", parse("Settings"))],
        );
        assert_eq!(merged.unwrap().to_string(), "Shell/Settings");
    }

    #[test]
    fn merge_ties_keep_the_first_child() {
        let shell = parse("Shell");
        let merged = merge(
            Some(&shell),
            vec![("", parse("Alpha")), ("", parse("Omega"))],
        );
        assert_eq!(merged.unwrap().to_string(), "Shell/Alpha");
    }

    #[test]
    fn merge_prefixes_named_children() {
        let shell = parse("Shell");
        let merged = merge(Some(&shell), vec![("tab1", parse("Details/Edit"))]);
        assert_eq!(merged.unwrap().to_string(), "Shell/tab1/Details/Edit");

        let tab = parse("Shell/tab1");
        let merged = merge(Some(&tab), vec![("tab1", parse("Details"))]);
        assert_eq!(merged.unwrap().to_string(), "Shell/tab1/Details");
    }

    #[test]
    fn merge_without_parent_or_children() {
        assert_eq!(
            merge(None, vec![("", parse("Home"))]).map(|r| r.to_string()),
            Some("Home".into())
        );
        let shell = parse("Shell");
        assert_eq!(merge(Some(&shell), vec![("x", Route::default())]), Some(shell));
        assert_eq!(merge(None, vec![]), None);
    }
}
