// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Programmer errors.
//!
//! Navigational dead-ends (no parent to forward to, unmapped routes, mismatched result
//! types) are never errors; they surface as an absent response and a log line.

use thiserror::Error;

use crate::region::RegionId;

/// Errors raised while building the region tree or the route table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NavigationError {
    /// The region handle no longer refers to a live region.
    #[error("region {0:?} is no longer alive")]
    StaleRegion(RegionId),
    /// A sibling with the same non-empty name is already attached.
    #[error("a region named `{name}` is already attached to {parent:?}")]
    DuplicateName {
        /// Parent region.
        parent: RegionId,
        /// Conflicting name.
        name: String,
    },
    /// A route path was registered twice.
    #[error("route path `{0}` is already registered")]
    DuplicatePath(String),
}
