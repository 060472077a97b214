//! ORA Merge Engine
//!
//! Deterministically reduces a base [`Artifact`](ora_artifact::Artifact)
//! plus a set of validated deltas into a new artifact and a per-delta
//! report.
//!
//! # Core Concepts
//!
//! - [`merge`] / [`merge_attributed`]: single-actor and multi-actor entrypoints
//! - [`AttributedDelta`]: a delta stamped with `(agent, timestamp)`
//! - [`MergeOutcome`]: candidate document + success flag + [`MergeReport`]
//! - [`MergeError`]: hard apply-time failures that block adoption
//! - [`MergeWarning`]: advisory findings that never block adoption
//!
//! Determinism comes from one place: deltas are stable-sorted by their
//! timestamp strings before application. Same multiset in, same document
//! out, whatever the arrival order.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod apply;
mod engine;
mod report;
mod sanitize;

pub use engine::{merge, merge_attributed, merge_now, AttributedDelta};
pub use report::{
    DeltaDisposition, MergeError, MergeOutcome, MergeReport, MergeWarning, WarningCode,
};
pub use sanitize::FORBIDDEN_KEYS;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
