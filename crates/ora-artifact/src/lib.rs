//! ORA Artifact Data Model
//!
//! The shared data model for collaboratively authored research artifacts.
//!
//! # Core Concepts
//!
//! - [`Artifact`]: the canonical document — metadata plus seven sections
//! - [`Section`]: closed set of section identities with fixed id prefixes
//! - [`SectionItem`]: shared lifecycle contract (id, soft-delete kill record)
//! - Typed item variants: [`Hypothesis`], [`Prediction`], [`DiscriminativeTest`],
//!   [`Assumption`], [`Anomaly`], [`Critique`], and the [`ResearchThread`] singleton
//!
//! An artifact is created empty at version 0 and only ever mutated through
//! the merge engine (`ora-merge`). Killed items are retained for audit and
//! diffing but excluded from every count and minimum check.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod artifact;
mod error;
mod item;
mod metadata;
mod section;

pub use artifact::{Artifact, Sections};
pub use error::ArtifactError;
pub use item::{
    active, active_count, find_by_id, find_by_id_mut, next_id, Anomaly, Assumption, Critique,
    DiscriminativeTest, Hypothesis, Prediction, ResearchThread, SectionItem, TestScore,
    SYSTEM_FIELDS,
};
pub use metadata::{parse_timestamp, ArtifactMetadata, Contributor, SessionStatus};
pub use section::{Section, HYPOTHESIS_CAPACITY, SINGLETON_ID};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
