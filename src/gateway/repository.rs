use crate::domain::Tag;
use crate::error::{ReleaseError, Result};
use crate::gateway::{Branch, CommitInfo, Gateway, TagObject};
use git2::{
    BranchType, Cred, CredentialType, ErrorCode, FetchOptions, ObjectType, Oid, PushOptions,
    RemoteCallbacks, Repository as Git2Repo, Signature, Sort,
};
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

const REFLOG_MESSAGE: &str = "release-tagger";

/// Identity written into annotated tag objects
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tagger {
    pub name: String,
    pub email: String,
}

/// Gateway over a local clone using `git2`
///
/// Without a remote, branches are read from `refs/heads/*` and every write
/// stays local. With a remote, the clone is fetched on open, branches are
/// read from the remote-tracking refs and every ref written locally is
/// pushed to the remote straight away.
pub struct Git2Gateway {
    repo: Mutex<Git2Repo>,
    remote: Option<String>,
    tagger: Tagger,
}

impl Git2Gateway {
    /// Open or discover a git repository
    pub fn open<P: AsRef<Path>>(path: P, remote: Option<String>, tagger: Tagger) -> Result<Self> {
        let repo = Git2Repo::discover(path)?;
        let gateway = Git2Gateway::from_git2(repo, remote, tagger);
        if gateway.remote.is_some() {
            gateway.fetch()?;
        }
        Ok(gateway)
    }

    /// Wrap an existing git2::Repository without fetching
    pub fn from_git2(repo: Git2Repo, remote: Option<String>, tagger: Tagger) -> Self {
        Git2Gateway {
            repo: Mutex::new(repo),
            remote,
            tagger,
        }
    }

    fn repo(&self) -> MutexGuard<'_, Git2Repo> {
        self.repo.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Ref that branch reads resolve against
    fn read_ref(&self, branch: &str) -> String {
        match &self.remote {
            Some(remote) => format!("refs/remotes/{}/{}", remote, branch),
            None => format!("refs/heads/{}", branch),
        }
    }

    /// Fetch all branches and tags from the configured remote
    pub fn fetch(&self) -> Result<()> {
        let Some(remote_name) = self.remote.as_deref() else {
            return Ok(());
        };
        let repo = self.repo();
        let mut remote = repo
            .find_remote(remote_name)
            .map_err(|e| ReleaseError::remote(format!("Cannot find remote '{}': {}", remote_name, e)))?;

        let mut fetch_options = FetchOptions::new();
        fetch_options.remote_callbacks(remote_callbacks());

        let refspec_heads = format!("+refs/heads/*:refs/remotes/{}/*", remote_name);
        let refspecs = [refspec_heads.as_str(), "+refs/tags/*:refs/tags/*"];
        remote
            .fetch(&refspecs, Some(&mut fetch_options), None)
            .map_err(|e| {
                ReleaseError::remote(format!("Failed to fetch from remote '{}': {}", remote_name, e))
            })?;

        debug!(remote = remote_name, "fetched branches and tags");
        Ok(())
    }

    fn push(&self, repo: &Git2Repo, refspec: &str) -> Result<()> {
        let Some(remote_name) = self.remote.as_deref() else {
            return Ok(());
        };
        let mut remote = repo
            .find_remote(remote_name)
            .map_err(|e| ReleaseError::remote(format!("Cannot find remote '{}': {}", remote_name, e)))?;

        let mut callbacks = remote_callbacks();
        callbacks.push_update_reference(|refname, status| match status {
            Some(reason) => Err(git2::Error::from_str(&format!(
                "remote rejected {}: {}",
                refname, reason
            ))),
            None => Ok(()),
        });
        let mut push_options = PushOptions::new();
        push_options.remote_callbacks(callbacks);

        remote
            .push(&[refspec], Some(&mut push_options))
            .map_err(|e| ReleaseError::remote(format!("Push of '{}' failed: {}", refspec, e)))?;

        info!(remote = remote_name, refspec, "pushed");
        Ok(())
    }

    /// A branch creation collides with the remote-tracking copy as well
    fn remote_copy_exists(&self, repo: &Git2Repo, ref_name: &str) -> bool {
        match (&self.remote, ref_name.strip_prefix("refs/heads/")) {
            (Some(remote), Some(branch)) => repo
                .find_reference(&format!("refs/remotes/{}/{}", remote, branch))
                .is_ok(),
            _ => false,
        }
    }
}

fn parse_oid(id: &str) -> Result<Oid> {
    Ok(Oid::from_str(id)?)
}

fn branch_not_found(name: &str, e: git2::Error) -> ReleaseError {
    if e.code() == ErrorCode::NotFound {
        ReleaseError::BranchNotFound(name.to_string())
    } else {
        ReleaseError::Git(e)
    }
}

/// Credentials for fetch and push.
///
/// Tries, in order: a token from `GITHUB_TOKEN` / `GIT_TOKEN` for HTTPS
/// remotes, SSH keys from `~/.ssh/`, the SSH agent, then git's defaults.
fn remote_callbacks<'a>() -> RemoteCallbacks<'a> {
    let mut callbacks = RemoteCallbacks::new();
    callbacks.credentials(|_url, username_from_url, allowed_types| {
        if allowed_types.contains(CredentialType::USER_PASS_PLAINTEXT) {
            if let Ok(token) = std::env::var("GITHUB_TOKEN").or_else(|_| std::env::var("GIT_TOKEN"))
            {
                return Cred::userpass_plaintext("x-access-token", &token);
            }
        }

        if allowed_types.contains(CredentialType::SSH_KEY) {
            let user = username_from_url.unwrap_or("git");
            if let Some(home) = dirs::home_dir() {
                for key in ["id_ed25519", "id_rsa", "id_ecdsa"] {
                    let path = home.join(".ssh").join(key);
                    if path.exists() {
                        if let Ok(cred) = Cred::ssh_key(user, None, &path, None) {
                            return Ok(cred);
                        }
                    }
                }
            }

            if let Ok(cred) = Cred::ssh_key_from_agent(user) {
                return Ok(cred);
            }
        }

        Cred::default()
    });
    callbacks
}

impl Gateway for Git2Gateway {
    fn list_branches(&self) -> Result<Vec<Branch>> {
        let repo = self.repo();
        let (branch_type, prefix) = match &self.remote {
            Some(remote) => (BranchType::Remote, format!("{}/", remote)),
            None => (BranchType::Local, String::new()),
        };

        let mut branches = Vec::new();
        for entry in repo.branches(Some(branch_type))? {
            let (branch, _) = entry?;
            let Some(full_name) = branch.name()? else {
                continue;
            };
            let Some(name) = full_name.strip_prefix(prefix.as_str()) else {
                continue;
            };
            if name == "HEAD" {
                continue;
            }
            // symbolic refs have no direct target
            if let Some(tip) = branch.get().target() {
                branches.push(Branch::new(name, tip.to_string()));
            }
        }
        Ok(branches)
    }

    fn list_tags(&self) -> Result<Vec<Tag>> {
        let repo = self.repo();
        let names = repo.tag_names(None)?;

        let mut tags = Vec::new();
        for name in names.iter().flatten() {
            let reference = repo.find_reference(&format!("refs/tags/{}", name))?;
            match reference.peel_to_commit() {
                Ok(commit) => tags.push(Tag::new(name, commit.id().to_string())),
                Err(e) => debug!(tag = name, error = %e, "skipping tag that does not peel to a commit"),
            }
        }
        Ok(tags)
    }

    fn list_commits(&self, branch: &str, page: usize, page_size: usize) -> Result<Vec<CommitInfo>> {
        let repo = self.repo();
        let tip = repo
            .find_reference(&self.read_ref(branch))
            .map_err(|e| branch_not_found(branch, e))?
            .peel_to_commit()?
            .id();

        let mut revwalk = repo.revwalk()?;
        revwalk.push(tip)?;
        revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;

        let skip = page.saturating_sub(1) * page_size;
        let mut commits = Vec::with_capacity(page_size);
        for oid_result in revwalk.skip(skip).take(page_size) {
            let oid = oid_result?;
            let commit = repo.find_commit(oid)?;
            let message = String::from_utf8_lossy(commit.message_bytes()).into_owned();
            commits.push(CommitInfo::new(oid.to_string(), message));
        }

        debug!(branch, page, count = commits.len(), "listed commits");
        Ok(commits)
    }

    fn get_branch(&self, name: &str) -> Result<Branch> {
        let repo = self.repo();
        let tip = repo
            .find_reference(&self.read_ref(name))
            .map_err(|e| branch_not_found(name, e))?
            .peel_to_commit()?
            .id();
        Ok(Branch::new(name, tip.to_string()))
    }

    fn create_tag(&self, name: &str, message: &str, target: &str) -> Result<TagObject> {
        let repo = self.repo();
        let object = repo.find_object(parse_oid(target)?, Some(ObjectType::Commit))?;
        let tagger = Signature::now(&self.tagger.name, &self.tagger.email)?;
        let id = repo.tag_annotation_create(name, &object, &tagger, message)?;

        Ok(TagObject {
            id: id.to_string(),
            name: name.to_string(),
            target: target.to_string(),
        })
    }

    fn create_ref(&self, ref_name: &str, target: &str) -> Result<()> {
        let repo = self.repo();
        if self.remote_copy_exists(&repo, ref_name) {
            return Err(ReleaseError::RefAlreadyExists(ref_name.to_string()));
        }

        let mut reference = repo
            .reference(ref_name, parse_oid(target)?, false, REFLOG_MESSAGE)
            .map_err(|e| {
                if e.code() == ErrorCode::Exists {
                    ReleaseError::RefAlreadyExists(ref_name.to_string())
                } else {
                    ReleaseError::Git(e)
                }
            })?;

        // An unpublished local ref would pass for a released one on the next run
        if let Err(e) = self.push(&repo, &format!("{}:{}", ref_name, ref_name)) {
            if let Err(cleanup) = reference.delete() {
                warn!(ref_name, error = %cleanup, "could not remove unpushed ref");
            }
            return Err(e);
        }
        Ok(())
    }

    fn update_ref(&self, ref_name: &str, target: &str, force: bool) -> Result<()> {
        let repo = self.repo();
        let mut reference = repo.find_reference(ref_name).map_err(|e| {
            if e.code() == ErrorCode::NotFound {
                ReleaseError::RefNotFound(ref_name.to_string())
            } else {
                ReleaseError::Git(e)
            }
        })?;
        let previous = reference.target();
        let mut updated = reference.set_target(parse_oid(target)?, REFLOG_MESSAGE)?;

        let refspec = if force {
            format!("+{}:{}", ref_name, ref_name)
        } else {
            format!("{}:{}", ref_name, ref_name)
        };
        if let Err(e) = self.push(&repo, &refspec) {
            if let Some(previous) = previous {
                if let Err(cleanup) = updated.set_target(previous, REFLOG_MESSAGE) {
                    warn!(ref_name, error = %cleanup, "could not restore ref after failed push");
                }
            }
            return Err(e);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn tagger() -> Tagger {
        Tagger {
            name: "Release Bot".to_string(),
            email: "bot@example.com".to_string(),
        }
    }

    fn init() -> (TempDir, Git2Repo, Oid) {
        let dir = TempDir::new().unwrap();
        let repo = Git2Repo::init(dir.path()).unwrap();
        let oid = {
            let sig = Signature::now("Test", "test@example.com").unwrap();
            let tree_id = repo.index().unwrap().write_tree().unwrap();
            let tree = repo.find_tree(tree_id).unwrap();
            repo.commit(None, &sig, &sig, "chore: init\n", &tree, &[])
                .unwrap()
        };
        (dir, repo, oid)
    }

    #[test]
    fn test_open_rejects_missing_repository() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");
        assert!(Git2Gateway::open(&missing, None, tagger()).is_err());
    }

    #[test]
    fn test_read_ref_depends_on_remote() {
        let (_dir, repo, _) = init();
        let local = Git2Gateway::from_git2(repo, None, tagger());
        assert_eq!(local.read_ref("main"), "refs/heads/main");

        let (_dir2, repo2, _) = init();
        let remote = Git2Gateway::from_git2(repo2, Some("origin".to_string()), tagger());
        assert_eq!(remote.read_ref("release/1.0.x"), "refs/remotes/origin/release/1.0.x");
    }

    #[test]
    fn test_create_and_update_ref_contract() {
        let (_dir, repo, oid) = init();
        let gateway = Git2Gateway::from_git2(repo, None, tagger());
        let target = oid.to_string();

        let object = gateway.create_tag("latest", "latest", &target).unwrap();
        gateway.create_ref("refs/tags/latest", &object.id).unwrap();
        assert!(matches!(
            gateway.create_ref("refs/tags/latest", &object.id),
            Err(ReleaseError::RefAlreadyExists(_))
        ));
        assert!(matches!(
            gateway.update_ref("refs/tags/missing", &object.id, true),
            Err(ReleaseError::RefNotFound(_))
        ));
        gateway.update_ref("refs/tags/latest", &object.id, true).unwrap();

        let tags = gateway.list_tags().unwrap();
        assert_eq!(tags, vec![Tag::new("latest", target)]);
    }
}
