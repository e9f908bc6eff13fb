use std::fmt;

/// Non-fatal conditions met during a run.
/// They are collected in the run report and shown to the user; none of them stops the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunWarning {
    /// No new commits since the boundary tag
    NoNewCommits { branch: String, tag: String },
    /// A `release/M.N.x` branch exists without any `vM.N.*` tag
    ReleaseBranchWithoutTag { branch: String },
    /// A full version tag was already there, typically from an earlier partial run
    TagAlreadyExists { tag: String },
    /// A release branch was already there
    BranchAlreadyExists { branch: String },
    /// Moving or creating an alias tag failed
    AliasSyncFailed { alias: String, reason: String },
}

impl fmt::Display for RunWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunWarning::NoNewCommits { branch, tag } => {
                write!(f, "No new commits on '{}' since tag '{}'", branch, tag)
            }
            RunWarning::ReleaseBranchWithoutTag { branch } => {
                write!(
                    f,
                    "Release branch '{}' has no matching version tag, skipping it",
                    branch
                )
            }
            RunWarning::TagAlreadyExists { tag } => {
                write!(f, "Tag '{}' already exists, left untouched", tag)
            }
            RunWarning::BranchAlreadyExists { branch } => {
                write!(f, "Branch '{}' already exists, left untouched", branch)
            }
            RunWarning::AliasSyncFailed { alias, reason } => {
                write!(f, "Cannot move alias tag '{}': {}", alias, reason)
            }
        }
    }
}
