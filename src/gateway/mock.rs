use crate::domain::Tag;
use crate::error::{ReleaseError, Result};
use crate::gateway::{branch_ref, tag_ref, Branch, CommitInfo, Gateway, Mutation, TagObject};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Clone)]
struct MockCommit {
    message: String,
    parent: Option<String>,
}

#[derive(Debug, Default)]
struct MockState {
    commits: HashMap<String, MockCommit>,
    refs: BTreeMap<String, String>,
    tag_objects: HashMap<String, String>,
    mutations: Vec<Mutation>,
    pages_fetched: usize,
    failing_refs: HashSet<String>,
}

impl MockState {
    fn peel(&self, target: &str) -> String {
        self.tag_objects
            .get(target)
            .cloned()
            .unwrap_or_else(|| target.to_string())
    }

    fn knows_object(&self, id: &str) -> bool {
        self.commits.contains_key(id) || self.tag_objects.contains_key(id)
    }

    fn history_from(&self, tip: &str) -> Vec<CommitInfo> {
        let mut history = Vec::new();
        let mut cursor = Some(tip.to_string());
        while let Some(id) = cursor {
            let Some(commit) = self.commits.get(&id) else {
                break;
            };
            history.push(CommitInfo::new(id.clone(), commit.message.clone()));
            cursor = commit.parent.clone();
        }
        history
    }

    fn check_injected_failure(&self, ref_name: &str) -> Result<()> {
        if self.failing_refs.contains(ref_name) {
            return Err(ReleaseError::remote(format!(
                "injected failure writing {}",
                ref_name
            )));
        }
        Ok(())
    }
}

/// In-memory repository with a linear commit graph per branch
///
/// Reads come from the configured commits and refs. Writes are applied to
/// the in-memory refs and appended to an ordered mutation log.
pub struct MockGateway {
    state: Mutex<MockState>,
}

impl MockGateway {
    /// Create a new empty mock repository
    pub fn new() -> Self {
        MockGateway {
            state: Mutex::new(MockState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a commit with an optional parent
    pub fn commit(&mut self, id: &str, message: &str, parent: Option<&str>) {
        self.state().commits.insert(
            id.to_string(),
            MockCommit {
                message: message.to_string(),
                parent: parent.map(str::to_string),
            },
        );
    }

    /// Point a branch at a commit
    pub fn branch(&mut self, name: &str, tip: &str) {
        self.state().refs.insert(branch_ref(name), tip.to_string());
    }

    /// Add a lightweight tag pointing straight at a commit
    pub fn tag(&mut self, name: &str, commit: &str) {
        self.state().refs.insert(tag_ref(name), commit.to_string());
    }

    /// Append commits (oldest first) on top of a branch's tip, creating the
    /// branch if needed.
    pub fn extend_branch(&mut self, name: &str, commits: &[(&str, &str)]) {
        let mut parent = self.branch_tip(name);
        for (id, message) in commits {
            self.commit(id, message, parent.as_deref());
            parent = Some(id.to_string());
        }
        if let Some(tip) = parent {
            self.branch(name, &tip);
        }
    }

    /// Make every write to `ref_name` fail
    pub fn fail_writes_to(&mut self, ref_name: &str) {
        self.state().failing_refs.insert(ref_name.to_string());
    }

    /// Commit a tag currently resolves to
    pub fn tag_target(&self, name: &str) -> Option<String> {
        let state = self.state();
        state.refs.get(&tag_ref(name)).map(|target| state.peel(target))
    }

    /// Raw value of a ref (a tag object id for annotated tags)
    pub fn ref_value(&self, ref_name: &str) -> Option<String> {
        self.state().refs.get(ref_name).cloned()
    }

    pub fn branch_tip(&self, name: &str) -> Option<String> {
        self.state().refs.get(&branch_ref(name)).cloned()
    }

    /// Ref writes applied so far, in order (tag objects included)
    pub fn mutations(&self) -> Vec<Mutation> {
        self.state().mutations.clone()
    }

    /// Number of `list_commits` calls served
    pub fn pages_fetched(&self) -> usize {
        self.state().pages_fetched
    }
}

impl Default for MockGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl Gateway for MockGateway {
    fn list_branches(&self) -> Result<Vec<Branch>> {
        Ok(self
            .state()
            .refs
            .iter()
            .filter_map(|(name, tip)| {
                name.strip_prefix("refs/heads/")
                    .map(|branch| Branch::new(branch, tip.clone()))
            })
            .collect())
    }

    fn list_tags(&self) -> Result<Vec<Tag>> {
        let state = self.state();
        Ok(state
            .refs
            .iter()
            .filter_map(|(name, target)| {
                name.strip_prefix("refs/tags/")
                    .map(|tag| Tag::new(tag, state.peel(target)))
            })
            .collect())
    }

    fn list_commits(&self, branch: &str, page: usize, page_size: usize) -> Result<Vec<CommitInfo>> {
        let mut state = self.state();
        state.pages_fetched += 1;
        let tip = state
            .refs
            .get(&branch_ref(branch))
            .cloned()
            .ok_or_else(|| ReleaseError::BranchNotFound(branch.to_string()))?;

        let skip = page.saturating_sub(1) * page_size;
        Ok(state
            .history_from(&tip)
            .into_iter()
            .skip(skip)
            .take(page_size)
            .collect())
    }

    fn get_branch(&self, name: &str) -> Result<Branch> {
        self.state()
            .refs
            .get(&branch_ref(name))
            .map(|tip| Branch::new(name, tip.clone()))
            .ok_or_else(|| ReleaseError::BranchNotFound(name.to_string()))
    }

    fn create_tag(&self, name: &str, _message: &str, target: &str) -> Result<TagObject> {
        let mut state = self.state();
        if !state.commits.contains_key(target) {
            return Err(ReleaseError::remote(format!("unknown commit {}", target)));
        }
        let id = format!("tag:{}@{}", name, target);
        state.tag_objects.insert(id.clone(), target.to_string());
        state.mutations.push(Mutation::CreateTag {
            name: name.to_string(),
            target: target.to_string(),
        });
        Ok(TagObject {
            id,
            name: name.to_string(),
            target: target.to_string(),
        })
    }

    fn create_ref(&self, ref_name: &str, target: &str) -> Result<()> {
        let mut state = self.state();
        state.check_injected_failure(ref_name)?;
        if state.refs.contains_key(ref_name) {
            return Err(ReleaseError::RefAlreadyExists(ref_name.to_string()));
        }
        if !state.knows_object(target) {
            return Err(ReleaseError::remote(format!("unknown object {}", target)));
        }
        state.refs.insert(ref_name.to_string(), target.to_string());
        state.mutations.push(Mutation::CreateRef {
            name: ref_name.to_string(),
            target: target.to_string(),
        });
        Ok(())
    }

    fn update_ref(&self, ref_name: &str, target: &str, _force: bool) -> Result<()> {
        let mut state = self.state();
        state.check_injected_failure(ref_name)?;
        if !state.refs.contains_key(ref_name) {
            return Err(ReleaseError::RefNotFound(ref_name.to_string()));
        }
        if !state.knows_object(target) {
            return Err(ReleaseError::remote(format!("unknown object {}", target)));
        }
        state.refs.insert(ref_name.to_string(), target.to_string());
        state.mutations.push(Mutation::UpdateRef {
            name: ref_name.to_string(),
            target: target.to_string(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo() -> MockGateway {
        let mut repo = MockGateway::new();
        repo.extend_branch("main", &[("c1", "init"), ("c2", "feat: a"), ("c3", "fix: b")]);
        repo.tag("v1.0.0", "c1");
        repo
    }

    #[test]
    fn test_mock_branches() {
        let mut repo = repo();
        repo.branch("release/1.0.x", "c1");

        assert_eq!(repo.get_branch("main").unwrap(), Branch::new("main", "c3"));
        let names: Vec<String> = repo
            .list_branches()
            .unwrap()
            .into_iter()
            .map(|b| b.name)
            .collect();
        assert_eq!(names, vec!["main", "release/1.0.x"]);
        assert!(matches!(
            repo.get_branch("develop"),
            Err(ReleaseError::BranchNotFound(_))
        ));
    }

    #[test]
    fn test_mock_commit_pages_newest_first() {
        let repo = repo();
        let first: Vec<String> = repo
            .list_commits("main", 1, 2)
            .unwrap()
            .into_iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(first, vec!["c3", "c2"]);

        let second = repo.list_commits("main", 2, 2).unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].id, "c1");

        assert!(repo.list_commits("main", 3, 2).unwrap().is_empty());
        assert_eq!(repo.pages_fetched(), 3);
    }

    #[test]
    fn test_mock_annotated_tag_flow() {
        let repo = repo();
        let object = repo.create_tag("v1", "v1", "c2").unwrap();
        repo.create_ref("refs/tags/v1", &object.id).unwrap();
        assert_eq!(repo.tag_target("v1").as_deref(), Some("c2"));

        assert!(matches!(
            repo.create_ref("refs/tags/v1", &object.id),
            Err(ReleaseError::RefAlreadyExists(_))
        ));

        let moved = repo.create_tag("v1", "v1", "c3").unwrap();
        repo.update_ref("refs/tags/v1", &moved.id, true).unwrap();
        assert_eq!(repo.tag_target("v1").as_deref(), Some("c3"));
        assert_eq!(repo.mutations().len(), 4);
    }

    #[test]
    fn test_mock_update_missing_ref() {
        let repo = repo();
        assert!(matches!(
            repo.update_ref("refs/tags/nope", "c1", true),
            Err(ReleaseError::RefNotFound(_))
        ));
    }

    #[test]
    fn test_mock_injected_failure() {
        let mut repo = repo();
        repo.fail_writes_to("refs/tags/latest");
        assert!(matches!(
            repo.create_ref("refs/tags/latest", "c1"),
            Err(ReleaseError::Remote(_))
        ));
        assert!(repo.mutations().is_empty());
    }

    #[test]
    fn test_mock_list_tags_peels() {
        let repo = repo();
        let object = repo.create_tag("latest", "latest", "c3").unwrap();
        repo.create_ref("refs/tags/latest", &object.id).unwrap();

        let tags = repo.list_tags().unwrap();
        assert!(tags.contains(&Tag::new("latest", "c3")));
        assert!(tags.contains(&Tag::new("v1.0.0", "c1")));
    }
}
