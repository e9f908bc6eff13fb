use crate::domain::Tag;
use crate::error::{ReleaseError, Result};
use crate::gateway::{branch_ref, tag_ref, Branch, CommitInfo, Gateway, Mutation, TagObject};
use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct Recorded {
    /// Refs known to exist, seeded lazily from the wrapped gateway
    existing: Option<HashSet<String>>,
    mutations: Vec<Mutation>,
}

/// Gateway wrapper that performs every read and none of the writes
///
/// Writes are validated against the refs the wrapped gateway lists (plus the
/// ones this wrapper pretended to create), so ref collisions surface exactly
/// as they would in a real run.
pub struct DryRunGateway<G: Gateway> {
    inner: G,
    recorded: Mutex<Recorded>,
}

impl<G: Gateway> DryRunGateway<G> {
    pub fn new(inner: G) -> Self {
        DryRunGateway {
            inner,
            recorded: Mutex::new(Recorded::default()),
        }
    }

    fn recorded(&self) -> MutexGuard<'_, Recorded> {
        self.recorded.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Writes that would have been performed, in order
    pub fn mutations(&self) -> Vec<Mutation> {
        self.recorded().mutations.clone()
    }

    fn ref_exists(&self, ref_name: &str) -> Result<bool> {
        let mut recorded = self.recorded();
        if recorded.existing.is_none() {
            let mut existing: HashSet<String> = self
                .inner
                .list_tags()?
                .iter()
                .map(|tag| tag_ref(&tag.name))
                .collect();
            existing.extend(
                self.inner
                    .list_branches()?
                    .iter()
                    .map(|branch| branch_ref(&branch.name)),
            );
            recorded.existing = Some(existing);
        }
        Ok(recorded
            .existing
            .as_ref()
            .is_some_and(|existing| existing.contains(ref_name)))
    }

    fn record(&self, mutation: Mutation) {
        let mut recorded = self.recorded();
        if let Mutation::CreateRef { name, .. } = &mutation {
            if let Some(existing) = recorded.existing.as_mut() {
                existing.insert(name.clone());
            }
        }
        recorded.mutations.push(mutation);
    }
}

impl<G: Gateway> Gateway for DryRunGateway<G> {
    fn list_branches(&self) -> Result<Vec<Branch>> {
        self.inner.list_branches()
    }

    fn list_tags(&self) -> Result<Vec<Tag>> {
        self.inner.list_tags()
    }

    fn list_commits(&self, branch: &str, page: usize, page_size: usize) -> Result<Vec<CommitInfo>> {
        self.inner.list_commits(branch, page, page_size)
    }

    fn get_branch(&self, name: &str) -> Result<Branch> {
        self.inner.get_branch(name)
    }

    fn create_tag(&self, name: &str, _message: &str, target: &str) -> Result<TagObject> {
        self.record(Mutation::CreateTag {
            name: name.to_string(),
            target: target.to_string(),
        });
        // No object is written; refs "point" at the commit itself
        Ok(TagObject {
            id: target.to_string(),
            name: name.to_string(),
            target: target.to_string(),
        })
    }

    fn create_ref(&self, ref_name: &str, target: &str) -> Result<()> {
        if self.ref_exists(ref_name)? {
            return Err(ReleaseError::RefAlreadyExists(ref_name.to_string()));
        }
        self.record(Mutation::CreateRef {
            name: ref_name.to_string(),
            target: target.to_string(),
        });
        Ok(())
    }

    fn update_ref(&self, ref_name: &str, target: &str, _force: bool) -> Result<()> {
        if !self.ref_exists(ref_name)? {
            return Err(ReleaseError::RefNotFound(ref_name.to_string()));
        }
        self.record(Mutation::UpdateRef {
            name: ref_name.to_string(),
            target: target.to_string(),
        });
        Ok(())
    }
}
