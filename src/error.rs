use thiserror::Error;

/// Unified error type for release-tagger operations
#[derive(Error, Debug)]
pub enum ReleaseError {
    #[error("Git operation failed: {0}")]
    Git(#[from] git2::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Malformed version tag: '{tag}'")]
    MalformedVersionTag { tag: String },

    #[error("Cannot bump version {version}: component overflows")]
    VersionOverflow { version: String },

    #[error(
        "Reference commit {commit} not found in history of '{branch}' after scanning {pages_scanned} page(s)"
    )]
    ReferenceNotFound {
        branch: String,
        commit: String,
        pages_scanned: usize,
    },

    #[error("Tag already exists: {0}")]
    TagAlreadyExists(String),

    #[error("Ref already exists: {0}")]
    RefAlreadyExists(String),

    #[error("Ref not found: {0}")]
    RefNotFound(String),

    #[error("Branch not found: {0}")]
    BranchNotFound(String),

    #[error("Cannot find release branches (e.g. release/1.0.x). Create at least one release branch manually")]
    NoReleaseBranches,

    #[error("Cannot find version tags (e.g. v1.0.0). Create at least one tag manually")]
    NoVersionTags,

    #[error("Cannot find a minor-zero version tag (e.g. v1.0.0) to start the trunk walk from")]
    NoMinorZeroTag,

    #[error("Remote operation failed: {0}")]
    Remote(String),
}

/// Convenience type alias for Results in release-tagger
pub type Result<T> = std::result::Result<T, ReleaseError>;

impl ReleaseError {
    /// Create a configuration error with context
    pub fn config(msg: impl Into<String>) -> Self {
        ReleaseError::Config(msg.into())
    }

    /// Create a remote error with context
    pub fn remote(msg: impl Into<String>) -> Self {
        ReleaseError::Remote(msg.into())
    }

    /// Create a malformed version tag error
    pub fn malformed(tag: impl Into<String>) -> Self {
        ReleaseError::MalformedVersionTag { tag: tag.into() }
    }

    /// Whether the error must abort the run.
    ///
    /// Ref collisions are part of the create-or-update protocol and are
    /// recovered by the caller; everything else stops the run.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            ReleaseError::TagAlreadyExists(_) | ReleaseError::RefAlreadyExists(_)
        )
    }
}
