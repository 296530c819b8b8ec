// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_route --heading-base-level=0

//! Understory Route: composable route values for hierarchical UI navigation.
//!
//! ## Overview
//!
//! A [`Route`] describes a navigation target as a scheme, a base segment, the unconsumed
//! remainder of the path and a [`RouteData`] bag. Routes are parsed from strings such as
//! `/Shell/Products/Details?id=4` and are never mutated; the algebra on [`Route`]
//! (`next`, `append`, `insert`, `trim`) and [`merge`](grammar::merge) always return new
//! values.
//!
//! The scheme selects how a navigator treats the request: `/` addresses the tree root,
//! `../` the parent scope, `./` the nested children, `!` opens a dialog scope, `-` goes
//! back (repeat it to pop more levels), `-!` closes a dialog and `+` forces a push. See
//! [`scheme`] for the full alphabet and [`SchemeKind`] for classification.
//!
//! ## Parsing
//!
//! Parsing never fails. Unknown scheme characters are dropped and fragments that do not
//! fit the grammar degrade to an empty base or path. A [`DialogLookup`] lets a registry
//! promote routes to dialog navigations, and payloads of back navigations are stored
//! option-wrapped so that "no value" and "a value" stay distinguishable.
//!
//! ```rust
//! use understory_route::{Route, grammar};
//!
//! let route = grammar::parse("/Shell/Products?id=4");
//! assert!(route.is_root());
//! assert_eq!(route.base(), "Shell");
//! assert_eq!(route.next().base(), "Products");
//! assert_eq!(route.to_string(), "/Shell/Products?id=4");
//!
//! // The products level consumed its segment; the remainder goes to the children.
//! let rest = grammar::parse("Products/Details").trim(&Route::from_base("Products"));
//! assert_eq!(rest.to_string(), "Details");
//!
//! // Fold the deepest child route back into the parent.
//! let shell = grammar::parse("Shell");
//! let merged = grammar::merge(
//!     Some(&shell),
//!     [("tab1", grammar::parse("Details")), ("", grammar::parse("Settings"))],
//! );
//! assert_eq!(merged.unwrap().to_string(), "Shell/Settings");
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

#[cfg(test)]
extern crate std;

pub mod data;
pub mod grammar;
pub mod route;
pub mod scheme;

#[cfg(test)]
mod properties;

pub use data::{AnyValue, DataValue, PAYLOAD, RouteData};
pub use grammar::{DialogLookup, NoLookup, merge, parse, parse_with};
pub use route::{Route, Segments};
pub use scheme::SchemeKind;
