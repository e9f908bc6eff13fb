//! Release engine: decides and performs the tag and branch writes of a run
//!
//! A run is three strictly sequential phases:
//!
//! 1. every release branch, in listing order, gets patch tags for the fixes
//!    landed since its highest tag;
//! 2. the trunk gets minor tags plus release branches for features, and
//!    major tags plus release branches for breaking changes, since the
//!    highest `vMAJOR.MINOR.0` tag;
//! 3. alias tags are reconciled from the accumulated [AliasMap].
//!
//! Full tags and branches are written as soon as a commit calls for them.
//! Alias writes are only collected during phases 1 and 2; the last commit
//! that writes an alias decides its final target, which is why the phase
//! and commit order must not change.

pub mod alias;
pub mod step;

pub use alias::AliasMap;
pub use step::{Intent, ReleaseLine, TrunkCursor};

use crate::domain::{ReleaseBranch, VersionIndex, VersionTag};
use crate::error::{ReleaseError, Result};
use crate::gateway::{branch_ref, tag_ref, Branch, Gateway};
use crate::history::{HistoryWalker, DEFAULT_MAX_PAGES, DEFAULT_PAGE_SIZE};
use crate::sync::{AliasOutcome, TagSynchronizer};
use crate::warnings::RunWarning;
use tracing::{debug, info, warn};

/// Knobs of a single run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    /// Name of the trunk branch
    pub trunk: String,
    pub page_size: usize,
    /// `None` walks history without a page ceiling
    pub max_pages: Option<usize>,
}

impl EngineSettings {
    pub fn new(trunk: impl Into<String>) -> Self {
        EngineSettings {
            trunk: trunk.into(),
            page_size: DEFAULT_PAGE_SIZE,
            max_pages: Some(DEFAULT_MAX_PAGES),
        }
    }
}

/// Everything a run changed or noticed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Full version tags created, in creation order
    pub created_tags: Vec<String>,
    /// Release branches created, in creation order
    pub created_branches: Vec<String>,
    pub aliases: Vec<AliasOutcome>,
    pub warnings: Vec<RunWarning>,
}

impl RunReport {
    /// Nothing was released: no new tags or branches
    pub fn is_noop(&self) -> bool {
        self.created_tags.is_empty() && self.created_branches.is_empty()
    }
}

/// State checked and gathered before the first write
struct Preflight {
    release_branches: Vec<ReleaseBranch>,
    trunk: Branch,
    trunk_boundary: VersionTag,
    index: VersionIndex,
}

/// Orchestrates one release run against a gateway
pub struct ReleaseEngine<'a, G: Gateway + ?Sized> {
    gateway: &'a G,
    settings: EngineSettings,
}

impl<'a, G: Gateway + ?Sized> ReleaseEngine<'a, G> {
    pub fn new(gateway: &'a G, settings: EngineSettings) -> Self {
        ReleaseEngine { gateway, settings }
    }

    /// Run all three phases.
    ///
    /// Configuration problems (no release branches, no version tags, no
    /// minor-zero tag, missing trunk, malformed version tag) are reported
    /// before anything is written. Writes made before a later failure are
    /// kept, and the aliases of the tags already created are still
    /// reconciled before the error is returned, so rerunning is safe.
    pub fn run(&self) -> Result<RunReport> {
        let Preflight {
            release_branches,
            trunk,
            trunk_boundary,
            mut index,
        } = self.preflight()?;

        let mut report = RunReport::default();
        let mut aliases = AliasMap::new();

        let walked = self.walk_phases(
            release_branches,
            &trunk,
            &trunk_boundary,
            &mut index,
            &mut aliases,
            &mut report,
        );

        if let Err(e) = walked {
            if !aliases.is_empty() {
                warn!(
                    error = %e,
                    aliases = aliases.len(),
                    "run failed, reconciling aliases of created tags"
                );
                TagSynchronizer::new(self.gateway).reconcile_all(&aliases);
            }
            return Err(e);
        }

        let (outcomes, warnings) = TagSynchronizer::new(self.gateway).reconcile_all(&aliases);
        report.aliases = outcomes;
        report.warnings.extend(warnings);
        Ok(report)
    }

    /// Phases A and B, in order
    fn walk_phases(
        &self,
        release_branches: Vec<ReleaseBranch>,
        trunk: &Branch,
        trunk_boundary: &VersionTag,
        index: &mut VersionIndex,
        aliases: &mut AliasMap,
        report: &mut RunReport,
    ) -> Result<()> {
        for branch in release_branches {
            self.release_branch_phase(branch, index, aliases, report)?;
        }
        self.trunk_phase(trunk, trunk_boundary, index, aliases, report)
    }

    fn preflight(&self) -> Result<Preflight> {
        let release_branches: Vec<ReleaseBranch> = self
            .gateway
            .list_branches()?
            .iter()
            .filter_map(|branch| ReleaseBranch::parse(&branch.name))
            .collect();
        if release_branches.is_empty() {
            return Err(ReleaseError::NoReleaseBranches);
        }

        let index = VersionIndex::from_tags(&self.gateway.list_tags()?)?;
        if index.is_empty() {
            return Err(ReleaseError::NoVersionTags);
        }

        let trunk_boundary = index
            .highest_minor_zero()
            .cloned()
            .ok_or(ReleaseError::NoMinorZeroTag)?;
        let trunk = self.gateway.get_branch(&self.settings.trunk)?;

        debug!(
            release_branches = release_branches.len(),
            version_tags = index.len(),
            trunk = %trunk.name,
            boundary = %trunk_boundary.name(),
            "preflight passed"
        );
        Ok(Preflight {
            release_branches,
            trunk,
            trunk_boundary,
            index,
        })
    }

    fn walker(&self) -> HistoryWalker<'_, G> {
        HistoryWalker::new(self.gateway)
            .with_page_size(self.settings.page_size)
            .with_max_pages(self.settings.max_pages)
    }

    fn release_branch_phase(
        &self,
        branch: ReleaseBranch,
        index: &mut VersionIndex,
        aliases: &mut AliasMap,
        report: &mut RunReport,
    ) -> Result<()> {
        let Some(latest) = index.highest_on_branch(&branch).cloned() else {
            warn!(branch = %branch, "release branch has no matching version tag");
            report.warnings.push(RunWarning::ReleaseBranchWithoutTag {
                branch: branch.name.clone(),
            });
            return Ok(());
        };

        let commits = self.walker().commits_since(&branch.name, &latest.commit)?;
        if commits.is_empty() {
            report.warnings.push(RunWarning::NoNewCommits {
                branch: branch.name.clone(),
                tag: latest.name(),
            });
            return Ok(());
        }

        let mut line = ReleaseLine::new(branch, latest.version);
        for commit in &commits {
            let before = aliases.clone();
            let intents = line.advance(commit, index, aliases)?;
            self.apply_all(&intents, before, aliases, report)?;
        }
        Ok(())
    }

    fn trunk_phase(
        &self,
        trunk: &Branch,
        boundary: &VersionTag,
        index: &mut VersionIndex,
        aliases: &mut AliasMap,
        report: &mut RunReport,
    ) -> Result<()> {
        let commits = self.walker().commits_since(&trunk.name, &boundary.commit)?;
        if commits.is_empty() {
            report.warnings.push(RunWarning::NoNewCommits {
                branch: trunk.name.clone(),
                tag: boundary.name(),
            });
            return Ok(());
        }

        let mut cursor = TrunkCursor::new(boundary.version);
        for commit in &commits {
            let before = aliases.clone();
            let intents = cursor.advance(commit, index, aliases)?;
            self.apply_all(&intents, before, aliases, report)?;
        }
        Ok(())
    }

    /// Apply one commit's intents. On failure the commit's alias writes
    /// are rolled back to `before`, so aliases only follow created tags.
    fn apply_all(
        &self,
        intents: &[Intent],
        before: AliasMap,
        aliases: &mut AliasMap,
        report: &mut RunReport,
    ) -> Result<()> {
        for intent in intents {
            if let Err(e) = self.apply(intent, report) {
                *aliases = before;
                return Err(e);
            }
        }
        Ok(())
    }

    fn apply(&self, intent: &Intent, report: &mut RunReport) -> Result<()> {
        match intent {
            Intent::CreateTag { name, commit } => match self.create_full_tag(name, commit) {
                Ok(()) => {
                    info!(tag = %name, commit = %commit, "new tag created");
                    report.created_tags.push(name.clone());
                }
                Err(ReleaseError::TagAlreadyExists(_)) => {
                    warn!(tag = %name, "tag already exists");
                    report
                        .warnings
                        .push(RunWarning::TagAlreadyExists { tag: name.clone() });
                }
                Err(e) => return Err(e),
            },
            Intent::CreateBranch { name, commit } => {
                match self.gateway.create_ref(&branch_ref(name), commit) {
                    Ok(()) => {
                        info!(branch = %name, commit = %commit, "new branch created");
                        report.created_branches.push(name.clone());
                    }
                    Err(ReleaseError::RefAlreadyExists(_)) => {
                        warn!(branch = %name, "branch already exists");
                        report
                            .warnings
                            .push(RunWarning::BranchAlreadyExists {
                                branch: name.clone(),
                            });
                    }
                    Err(e) => return Err(e),
                }
            }
        }
        Ok(())
    }

    /// Annotated tag object plus a ref that must not exist yet
    fn create_full_tag(&self, name: &str, commit: &str) -> Result<()> {
        let object = self.gateway.create_tag(name, name, commit)?;
        self.gateway
            .create_ref(&tag_ref(name), &object.id)
            .map_err(|e| match e {
                ReleaseError::RefAlreadyExists(_) => {
                    ReleaseError::TagAlreadyExists(name.to_string())
                }
                other => other,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::MockGateway;

    fn settings() -> EngineSettings {
        EngineSettings::new("main")
    }

    #[test]
    fn test_requires_release_branches() {
        let mut repo = MockGateway::new();
        repo.extend_branch("main", &[("c1", "init")]);
        repo.tag("v1.0.0", "c1");

        let err = ReleaseEngine::new(&repo, settings()).run().unwrap_err();
        assert!(matches!(err, ReleaseError::NoReleaseBranches));
        assert!(repo.mutations().is_empty());
    }

    #[test]
    fn test_requires_version_tags() {
        let mut repo = MockGateway::new();
        repo.extend_branch("main", &[("c1", "init")]);
        repo.branch("release/1.0.x", "c1");
        repo.tag("latest", "c1");

        let err = ReleaseEngine::new(&repo, settings()).run().unwrap_err();
        assert!(matches!(err, ReleaseError::NoVersionTags));
    }

    #[test]
    fn test_requires_trunk() {
        let mut repo = MockGateway::new();
        repo.extend_branch("develop", &[("c1", "init")]);
        repo.branch("release/1.0.x", "c1");
        repo.tag("v1.0.0", "c1");

        let err = ReleaseEngine::new(&repo, settings()).run().unwrap_err();
        assert!(matches!(err, ReleaseError::BranchNotFound(name) if name == "main"));
    }

    #[test]
    fn test_requires_minor_zero_tag() {
        let mut repo = MockGateway::new();
        repo.extend_branch("main", &[("c1", "init")]);
        repo.branch("release/1.0.x", "c1");
        repo.tag("v1.0.1", "c1");

        let err = ReleaseEngine::new(&repo, settings()).run().unwrap_err();
        assert!(matches!(err, ReleaseError::NoMinorZeroTag));
    }

    #[test]
    fn test_malformed_tag_aborts_before_writes() {
        let mut repo = MockGateway::new();
        repo.extend_branch("main", &[("c1", "init"), ("c2", "feat: x")]);
        repo.branch("release/1.0.x", "c1");
        repo.tag("v1.0.0", "c1");
        repo.tag("v1.00.1", "c1");

        let err = ReleaseEngine::new(&repo, settings()).run().unwrap_err();
        assert!(matches!(err, ReleaseError::MalformedVersionTag { .. }));
        assert!(repo.mutations().is_empty());
    }

    #[test]
    fn test_quiet_repository_reports_no_new_commits() {
        let mut repo = MockGateway::new();
        repo.extend_branch("main", &[("c1", "init")]);
        repo.branch("release/1.0.x", "c1");
        repo.tag("v1.0.0", "c1");

        let report = ReleaseEngine::new(&repo, settings()).run().unwrap();
        assert!(report.is_noop());
        assert!(report.aliases.is_empty());
        assert_eq!(report.warnings.len(), 2);
        assert!(repo.mutations().is_empty());
    }

    #[test]
    fn test_failed_tag_write_keeps_aliases_of_created_tags() {
        let mut repo = MockGateway::new();
        repo.extend_branch("main", &[("m0", "init")]);
        repo.tag("v1.0.0", "m0");
        repo.branch("release/1.0.x", "m0");
        repo.extend_branch("release/1.0.x", &[("r1", "fix: patch")]);
        repo.extend_branch("main", &[("t1", "feat: new")]);
        repo.fail_writes_to("refs/tags/v1.1.0");

        let err = ReleaseEngine::new(&repo, settings()).run().unwrap_err();
        assert!(matches!(err, ReleaseError::Remote(_)));

        assert_eq!(repo.tag_target("v1.0.1").as_deref(), Some("r1"));
        assert_eq!(repo.tag_target("v1.0").as_deref(), Some("r1"));
        assert_eq!(repo.tag_target("v1").as_deref(), Some("r1"));
        assert_eq!(repo.tag_target("latest").as_deref(), Some("r1"));
        // the failed trunk commit moves nothing
        assert_eq!(repo.tag_target("v1.1"), None);
        assert_eq!(repo.branch_tip("release/1.1.x"), None);
    }

    #[test]
    fn test_version_overflow_aborts_without_writes() {
        let mut repo = MockGateway::new();
        repo.extend_branch("main", &[("m0", "init")]);
        repo.tag("v1.0.0", "m0");
        repo.branch("release/1.0.x", "m0");
        repo.extend_branch("release/1.0.x", &[("r1", "fix: edge")]);
        repo.tag("v1.0.18446744073709551615", "r1");
        repo.extend_branch("release/1.0.x", &[("r2", "fix: one more")]);

        let err = ReleaseEngine::new(&repo, settings()).run().unwrap_err();
        assert!(matches!(err, ReleaseError::VersionOverflow { .. }));
        assert!(repo.mutations().is_empty());
    }
}
