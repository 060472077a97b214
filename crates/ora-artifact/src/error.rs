//! Errors for the artifact data model

/// Errors raised by the artifact data model
#[derive(Debug, Clone, thiserror::Error)]
pub enum ArtifactError {
    /// Section name not in the closed set of seven
    #[error("unknown section: {0}")]
    UnknownSection(String),

    /// Timestamp not parseable as ISO-8601
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// Status transition not permitted
    #[error("invalid status transition: {from} -> {to}")]
    InvalidTransition {
        /// Current status
        from: String,
        /// Requested status
        to: String,
    },
}
