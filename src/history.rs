//! Branch history retrieval bounded by a previously tagged commit

use crate::error::{ReleaseError, Result};
use crate::gateway::{CommitInfo, Gateway};
use tracing::debug;

/// Page size used when none is configured
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Page ceiling used when none is configured
pub const DEFAULT_MAX_PAGES: usize = 100;

/// Walks a branch's paged history back to a boundary commit
pub struct HistoryWalker<'a, G: Gateway + ?Sized> {
    gateway: &'a G,
    page_size: usize,
    /// `None` scans until the gateway runs out of history
    max_pages: Option<usize>,
}

impl<'a, G: Gateway + ?Sized> HistoryWalker<'a, G> {
    pub fn new(gateway: &'a G) -> Self {
        HistoryWalker {
            gateway,
            page_size: DEFAULT_PAGE_SIZE,
            max_pages: Some(DEFAULT_MAX_PAGES),
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_max_pages(mut self, max_pages: Option<usize>) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Commits on `branch` strictly after `reference`, oldest first.
    ///
    /// Pages are requested newest-first until the one containing `reference`
    /// turns up; no page after it is fetched. Running out of history, or
    /// hitting the page ceiling, is `ReferenceNotFound`.
    pub fn commits_since(&self, branch: &str, reference: &str) -> Result<Vec<CommitInfo>> {
        let mut newer = Vec::new();
        let mut page = 1;

        loop {
            if self.max_pages.is_some_and(|max| page > max) {
                return Err(not_found(branch, reference, page - 1));
            }

            let commits = self.gateway.list_commits(branch, page, self.page_size)?;
            debug!(branch, page, count = commits.len(), "scanning history page");

            if let Some(position) = commits.iter().position(|c| c.id == reference) {
                newer.extend(commits.into_iter().take(position));
                newer.reverse();
                return Ok(newer);
            }

            let exhausted = commits.len() < self.page_size;
            newer.extend(commits);
            if exhausted {
                return Err(not_found(branch, reference, page));
            }
            page += 1;
        }
    }
}

fn not_found(branch: &str, reference: &str, pages_scanned: usize) -> ReleaseError {
    ReleaseError::ReferenceNotFound {
        branch: branch.to_string(),
        commit: reference.to_string(),
        pages_scanned,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::MockGateway;

    /// main: c0 <- c1 <- ... <- c{n-1}
    fn linear(n: usize) -> MockGateway {
        let ids: Vec<String> = (0..n).map(|i| format!("c{}", i)).collect();
        let messages: Vec<String> = (0..n).map(|i| format!("chore: {}", i)).collect();
        let commits: Vec<(&str, &str)> = ids
            .iter()
            .zip(messages.iter())
            .map(|(id, message)| (id.as_str(), message.as_str()))
            .collect();
        let mut repo = MockGateway::new();
        repo.extend_branch("main", &commits);
        repo
    }

    fn ids(commits: &[CommitInfo]) -> Vec<&str> {
        commits.iter().map(|c| c.id.as_str()).collect()
    }

    #[test]
    fn test_reference_on_first_page() {
        let repo = linear(5);
        let commits = HistoryWalker::new(&repo).commits_since("main", "c2").unwrap();
        assert_eq!(ids(&commits), vec!["c3", "c4"]);
        assert_eq!(repo.pages_fetched(), 1);
    }

    #[test]
    fn test_reference_is_tip() {
        let repo = linear(3);
        let commits = HistoryWalker::new(&repo).commits_since("main", "c2").unwrap();
        assert!(commits.is_empty());
    }

    #[test]
    fn test_reference_on_later_page() {
        let repo = linear(10);
        let walker = HistoryWalker::new(&repo).with_page_size(3);
        // pages: [c9 c8 c7] [c6 c5 c4] [c3 c2 c1] [c0]
        let commits = walker.commits_since("main", "c2").unwrap();
        assert_eq!(ids(&commits), vec!["c3", "c4", "c5", "c6", "c7", "c8", "c9"]);
        assert_eq!(repo.pages_fetched(), 3);
    }

    #[test]
    fn test_reference_first_on_its_page() {
        let repo = linear(6);
        let walker = HistoryWalker::new(&repo).with_page_size(3);
        // pages: [c5 c4 c3] [c2 c1 c0]
        let commits = walker.commits_since("main", "c2").unwrap();
        assert_eq!(ids(&commits), vec!["c3", "c4", "c5"]);
        assert_eq!(repo.pages_fetched(), 2);
    }

    #[test]
    fn test_never_includes_reference_and_is_oldest_first() {
        let repo = linear(8);
        let commits = HistoryWalker::new(&repo)
            .with_page_size(2)
            .commits_since("main", "c0")
            .unwrap();
        assert!(!commits.iter().any(|c| c.id == "c0"));
        let numbers: Vec<usize> = commits
            .iter()
            .map(|c| c.id[1..].parse::<usize>().unwrap())
            .collect();
        assert!(numbers.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(numbers.len(), 7);
    }

    #[test]
    fn test_missing_reference_exhausts_history() {
        let repo = linear(4);
        let err = HistoryWalker::new(&repo)
            .with_page_size(2)
            .commits_since("main", "elsewhere")
            .unwrap_err();
        // [c3 c2] [c1 c0] [] : the full second page forces a third request
        assert!(matches!(
            err,
            ReleaseError::ReferenceNotFound { pages_scanned: 3, .. }
        ));
    }

    #[test]
    fn test_missing_reference_short_page_stops_early() {
        let repo = linear(3);
        let err = HistoryWalker::new(&repo)
            .with_page_size(2)
            .commits_since("main", "elsewhere")
            .unwrap_err();
        assert!(matches!(
            err,
            ReleaseError::ReferenceNotFound { pages_scanned: 2, .. }
        ));
        assert_eq!(repo.pages_fetched(), 2);
    }

    #[test]
    fn test_page_ceiling() {
        let repo = linear(20);
        let err = HistoryWalker::new(&repo)
            .with_page_size(2)
            .with_max_pages(Some(3))
            .commits_since("main", "c0")
            .unwrap_err();
        assert!(matches!(
            err,
            ReleaseError::ReferenceNotFound { pages_scanned: 3, .. }
        ));
        assert_eq!(repo.pages_fetched(), 3);
    }

    #[test]
    fn test_unbounded_walk() {
        let repo = linear(20);
        let commits = HistoryWalker::new(&repo)
            .with_page_size(2)
            .with_max_pages(None)
            .commits_since("main", "c0")
            .unwrap();
        assert_eq!(commits.len(), 19);
    }

    #[test]
    fn test_unknown_branch() {
        let repo = linear(2);
        assert!(matches!(
            HistoryWalker::new(&repo).commits_since("nope", "c0"),
            Err(ReleaseError::BranchNotFound(_))
        ));
    }
}
