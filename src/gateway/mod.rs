//! Repository gateway abstraction layer
//!
//! The release engine never talks to git directly. Everything it reads
//! (branches, tags, paged commit history) and every ref it writes goes
//! through the [Gateway] trait, so the decision logic can run against a real
//! clone, an in-memory fake, or a recorder that applies nothing.
//!
//! # Implementations
//!
//! - [repository::Git2Gateway]: a local clone driven by the `git2` crate,
//!   optionally mirroring every ref write to a remote
//! - [mock::MockGateway]: an in-memory repository for tests
//! - [dry_run::DryRunGateway]: forwards reads, records writes
//!
//! # Ref names
//!
//! `create_ref` and `update_ref` take fully qualified names
//! (`refs/tags/v1.2.3`, `refs/heads/release/1.2.x`); see [tag_ref] and
//! [branch_ref].

pub mod dry_run;
pub mod mock;
pub mod repository;

pub use dry_run::DryRunGateway;
pub use mock::MockGateway;
pub use repository::Git2Gateway;

use crate::domain::Tag;
use crate::error::Result;
use regex::Regex;
use std::fmt;

/// Commit information as delivered by a history listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitInfo {
    /// Full commit hash
    pub id: String,
    /// Full commit message (subject, blank line, body)
    pub message: String,
}

impl CommitInfo {
    pub fn new(id: impl Into<String>, message: impl Into<String>) -> Self {
        CommitInfo {
            id: id.into(),
            message: message.into(),
        }
    }

    /// First line of the message
    pub fn subject(&self) -> &str {
        self.message.lines().next().unwrap_or("")
    }

    /// First seven characters of the hash
    pub fn short_id(&self) -> &str {
        self.id.get(..7).unwrap_or(&self.id)
    }
}

/// A branch and the commit at its tip
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Branch {
    pub name: String,
    pub tip: String,
}

impl Branch {
    pub fn new(name: impl Into<String>, tip: impl Into<String>) -> Self {
        Branch {
            name: name.into(),
            tip: tip.into(),
        }
    }
}

/// An annotated tag object that no ref points at yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagObject {
    /// Id of the tag object itself
    pub id: String,
    pub name: String,
    /// Commit the tag object annotates
    pub target: String,
}

/// A ref write, as recorded by [MockGateway] and [DryRunGateway]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    CreateTag { name: String, target: String },
    CreateRef { name: String, target: String },
    UpdateRef { name: String, target: String },
}

impl fmt::Display for Mutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mutation::CreateTag { name, target } => {
                write!(f, "create tag object {} -> {}", name, target)
            }
            Mutation::CreateRef { name, target } => write!(f, "create ref {} -> {}", name, target),
            Mutation::UpdateRef { name, target } => {
                write!(f, "force-update ref {} -> {}", name, target)
            }
        }
    }
}

/// Fully qualified ref name for a tag
pub fn tag_ref(name: &str) -> String {
    format!("refs/tags/{}", name)
}

/// Fully qualified ref name for a branch
pub fn branch_ref(name: &str) -> String {
    format!("refs/heads/{}", name)
}

/// Remote repository operations the release engine consumes
///
/// ## Thread Safety
///
/// All implementors must be `Send + Sync`.
///
/// ## Error Handling
///
/// Implementations map their transport errors onto
/// [crate::error::ReleaseError]. The ref-collision variants are part of the
/// contract: `create_ref` must fail with `RefAlreadyExists` rather than
/// overwrite, and `update_ref` must fail with `RefNotFound` rather than
/// create.
pub trait Gateway: Send + Sync {
    /// All branches with their tips, in listing order
    fn list_branches(&self) -> Result<Vec<Branch>>;

    /// All tags, each peeled to the commit it references
    fn list_tags(&self) -> Result<Vec<Tag>>;

    /// Tags whose name matches `pattern`
    fn list_tags_matching(&self, pattern: &Regex) -> Result<Vec<Tag>> {
        Ok(self
            .list_tags()?
            .into_iter()
            .filter(|tag| pattern.is_match(&tag.name))
            .collect())
    }

    /// One page of a branch's history, newest first.
    ///
    /// `page` is 1-based. A page shorter than `page_size` (possibly empty)
    /// means the history is exhausted.
    fn list_commits(&self, branch: &str, page: usize, page_size: usize) -> Result<Vec<CommitInfo>>;

    /// A single branch; `BranchNotFound` if absent
    fn get_branch(&self, name: &str) -> Result<Branch>;

    /// Write an annotated tag object for `target` without creating a ref
    fn create_tag(&self, name: &str, message: &str, target: &str) -> Result<TagObject>;

    /// Create a ref; `RefAlreadyExists` if the name is taken
    fn create_ref(&self, ref_name: &str, target: &str) -> Result<()>;

    /// Move an existing ref; `RefNotFound` if absent
    fn update_ref(&self, ref_name: &str, target: &str, force: bool) -> Result<()>;
}

impl<G: Gateway + ?Sized> Gateway for &G {
    fn list_branches(&self) -> Result<Vec<Branch>> {
        (**self).list_branches()
    }

    fn list_tags(&self) -> Result<Vec<Tag>> {
        (**self).list_tags()
    }

    fn list_commits(&self, branch: &str, page: usize, page_size: usize) -> Result<Vec<CommitInfo>> {
        (**self).list_commits(branch, page, page_size)
    }

    fn get_branch(&self, name: &str) -> Result<Branch> {
        (**self).get_branch(name)
    }

    fn create_tag(&self, name: &str, message: &str, target: &str) -> Result<TagObject> {
        (**self).create_tag(name, message, target)
    }

    fn create_ref(&self, ref_name: &str, target: &str) -> Result<()> {
        (**self).create_ref(ref_name, target)
    }

    fn update_ref(&self, ref_name: &str, target: &str, force: bool) -> Result<()> {
        (**self).update_ref(ref_name, target, force)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ref_names() {
        assert_eq!(tag_ref("v1.2.3"), "refs/tags/v1.2.3");
        assert_eq!(branch_ref("release/1.2.x"), "refs/heads/release/1.2.x");
    }

    #[test]
    fn test_commit_info_accessors() {
        let commit = CommitInfo::new("0123456789abcdef", "feat: thing\n\nbody");
        assert_eq!(commit.subject(), "feat: thing");
        assert_eq!(commit.short_id(), "0123456");

        let short = CommitInfo::new("abc", "");
        assert_eq!(short.short_id(), "abc");
        assert_eq!(short.subject(), "");
    }

    #[test]
    fn test_list_tags_matching_default() {
        let mut repo = MockGateway::new();
        repo.commit("c1", "init", None);
        repo.tag("v1.0.0", "c1");
        repo.tag("latest", "c1");
        repo.tag("v1", "c1");

        let pattern = Regex::new(r"^v[0-9]+\.[0-9]+\.[0-9]+$").unwrap();
        let tags = repo.list_tags_matching(&pattern).unwrap();
        assert_eq!(tags, vec![Tag::new("v1.0.0", "c1")]);
    }
}
