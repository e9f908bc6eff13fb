//! Domain logic - pure release rules independent of the repository gateway

pub mod branch;
pub mod commit;
pub mod tag;
pub mod version;

pub use branch::ReleaseBranch;
pub use commit::{classify, CommitKind, CommitMessage};
pub use tag::{Tag, VersionIndex, VersionTag, LATEST_ALIAS};
pub use version::{Version, VersionBump};
