// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Property tests for the route grammar.

use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

use proptest::prelude::*;

use crate::{Route, merge, parse};

fn arb_scheme() -> impl Strategy<Value = &'static str> {
    prop::sample::select(&["", "/", "./", "../", "../../", "!", "/!", "-", "--", "-!", "+"][..])
}

fn arb_segment() -> impl Strategy<Value = String> {
    "[A-Za-z][A-Za-z0-9_]{0,7}"
}

fn arb_query() -> impl Strategy<Value = Vec<(String, String)>> {
    prop::collection::btree_map("[a-z]{1,4}", "[a-z0-9]{0,4}", 0..4)
        .prop_map(|m| m.into_iter().collect())
}

fn arb_route_text() -> impl Strategy<Value = String> {
    (
        arb_scheme(),
        prop::collection::vec(arb_segment(), 1..5),
        arb_query(),
    )
        .prop_map(|(scheme, segments, query)| {
            let mut text = format!("{scheme}{}", segments.join("/"));
            let pairs: Vec<String> = query.iter().map(|(k, v)| format!("{k}={v}")).collect();
            if !pairs.is_empty() {
                text.push('?');
                text.push_str(&pairs.join("&"));
            }
            text
        })
}

proptest! {
    /// Serializing a parsed well-formed route reproduces the input.
    #[test]
    fn parse_serialize_round_trip(text in arb_route_text()) {
        prop_assert_eq!(parse(&text).to_string(), text);
    }

    /// Repeated `next` reaches the empty route within one step per segment.
    #[test]
    fn next_terminates(text in arb_route_text()) {
        let mut route = parse(&text);
        let mut steps = 0;
        while !(route.is_empty() && route.path().is_empty()) {
            route = route.next();
            steps += 1;
            prop_assert!(steps <= text.len(), "next did not terminate for {}", text);
        }
    }

    /// Arbitrary input never loops either.
    #[test]
    fn next_terminates_on_arbitrary_input(text in ".{0,40}") {
        let mut route = parse(&text);
        for _ in 0..=text.len() {
            route = route.next();
        }
        prop_assert!(route.path().is_empty());
    }

    /// A route trimmed by itself is empty.
    #[test]
    fn trim_by_self_is_empty(segments in prop::collection::vec(arb_segment(), 1..5)) {
        let route = parse(&segments.join("/"));
        prop_assert!(route.trim(&route).is_empty());
    }

    /// `merge` folds in the longest child and is independent of later equal-length ties.
    #[test]
    fn merge_picks_longest_child(
        parent in arb_segment(),
        children in prop::collection::vec(arb_segment(), 1..5),
    ) {
        let parent = Route::from_base(parent);
        let routes: Vec<(&str, Route)> = children.iter().map(|c| ("", parse(c))).collect();
        let longest = children.iter().map(String::len).max().unwrap_or_default();
        let winner = children.iter().find(|c| c.len() == longest).unwrap();
        let merged = merge(Some(&parent), routes).unwrap();
        prop_assert_eq!(merged.to_string(), format!("{parent}/{winner}"));
        prop_assert_eq!(merged.last_base(), winner.to_string());
    }
}
