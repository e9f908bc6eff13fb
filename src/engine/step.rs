//! Per-commit release decisions.
//!
//! Both steppers are pure: they read a commit, move their own cursor, record
//! new versions in the [VersionIndex], write the [AliasMap] and hand back the
//! ref creations the engine must perform for that commit.

use crate::domain::{
    classify, CommitKind, ReleaseBranch, Version, VersionBump, VersionIndex, LATEST_ALIAS,
};
use crate::engine::AliasMap;
use crate::error::Result;
use crate::gateway::CommitInfo;
use tracing::debug;

/// A ref creation decided by a stepper
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    CreateTag { name: String, commit: String },
    CreateBranch { name: String, commit: String },
}

impl Intent {
    fn tag(name: String, commit: &CommitInfo) -> Self {
        Intent::CreateTag {
            name,
            commit: commit.id.clone(),
        }
    }

    fn branch(name: String, commit: &CommitInfo) -> Self {
        Intent::CreateBranch {
            name,
            commit: commit.id.clone(),
        }
    }
}

/// Patch cursor of one release branch
#[derive(Debug, Clone)]
pub struct ReleaseLine {
    branch: ReleaseBranch,
    current: Version,
}

impl ReleaseLine {
    /// Start from the branch's highest existing tag
    pub fn new(branch: ReleaseBranch, latest: Version) -> Self {
        ReleaseLine {
            branch,
            current: latest,
        }
    }

    pub fn current(&self) -> Version {
        self.current
    }

    /// Only fixes land on a release branch; everything else is ignored
    pub fn advance(
        &mut self,
        commit: &CommitInfo,
        index: &mut VersionIndex,
        aliases: &mut AliasMap,
    ) -> Result<Vec<Intent>> {
        let kind = classify(&commit.message);
        debug!(
            branch = %self.branch,
            commit = commit.short_id(),
            subject = commit.subject(),
            %kind,
            "classified"
        );
        if kind != CommitKind::Fix {
            return Ok(Vec::new());
        }

        let next = self.current.bump_patch()?;
        if index.tops_major(&next) {
            aliases.assign(next.major_alias(), commit.id.as_str());
        }
        aliases.assign(next.minor_alias(), commit.id.as_str());
        if index.tops_all(&next) {
            aliases.assign(LATEST_ALIAS, commit.id.as_str());
        }

        index.record(next, commit.id.as_str());
        self.current = next;
        Ok(vec![Intent::tag(next.tag_name(), commit)])
    }
}

/// (major, minor) cursor of the trunk walk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrunkCursor {
    current: Version,
}

impl TrunkCursor {
    /// Start from the trunk's boundary `vMAJOR.MINOR.0` tag
    pub fn new(boundary: Version) -> Self {
        TrunkCursor {
            current: Version::new(boundary.major, boundary.minor, 0),
        }
    }

    pub fn current(&self) -> Version {
        self.current
    }

    /// Features open the next minor line, breaking changes the next major line
    pub fn advance(
        &mut self,
        commit: &CommitInfo,
        index: &mut VersionIndex,
        aliases: &mut AliasMap,
    ) -> Result<Vec<Intent>> {
        let kind = classify(&commit.message);
        debug!(
            branch = "trunk",
            commit = commit.short_id(),
            subject = commit.subject(),
            %kind,
            "classified"
        );

        let bump = match kind {
            CommitKind::Feature => VersionBump::Minor,
            CommitKind::Breaking => VersionBump::Major,
            CommitKind::Fix | CommitKind::Other => return Ok(Vec::new()),
        };
        let next = self.current.bump(bump)?;
        self.current = next;
        index.record(next, commit.id.as_str());

        let mut intents = Vec::new();
        if bump == VersionBump::Major {
            // vN and vN.0 are written here as plain tags; only `latest` moves
            intents.push(Intent::tag(next.major_alias(), commit));
            intents.push(Intent::tag(next.minor_alias(), commit));
        } else {
            aliases.assign(next.major_alias(), commit.id.as_str());
            aliases.assign(next.minor_alias(), commit.id.as_str());
        }
        aliases.assign(LATEST_ALIAS, commit.id.as_str());

        intents.push(Intent::tag(next.tag_name(), commit));
        if bump.forks_release_branch() {
            intents.push(Intent::branch(
                ReleaseBranch::for_version(&next).name,
                commit,
            ));
        }
        Ok(intents)
    }
}
