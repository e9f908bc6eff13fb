use crate::domain::version::is_version_tag;
use crate::domain::{ReleaseBranch, Version};
use crate::error::Result;

/// The global alias that always follows the newest release
pub const LATEST_ALIAS: &str = "latest";

/// A tag as listed by the repository: name plus the commit it peels to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub name: String,
    pub commit: String,
}

impl Tag {
    pub fn new(name: impl Into<String>, commit: impl Into<String>) -> Self {
        Tag {
            name: name.into(),
            commit: commit.into(),
        }
    }
}

/// A parsed, immutable `vMAJOR.MINOR.PATCH` tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionTag {
    pub version: Version,
    pub commit: String,
}

impl VersionTag {
    pub fn name(&self) -> String {
        self.version.tag_name()
    }
}

/// Every full version tag known to the run, including those created during it
#[derive(Debug, Clone, Default)]
pub struct VersionIndex {
    tags: Vec<VersionTag>,
}

impl VersionIndex {
    /// Build the index from a tag listing.
    ///
    /// Names that are not shaped like `vX.Y.Z` (aliases, foreign tags) are
    /// ignored. A name that has the shape but does not parse aborts with
    /// `MalformedVersionTag`.
    pub fn from_tags(tags: &[Tag]) -> Result<Self> {
        let mut index = VersionIndex::default();
        for tag in tags.iter().filter(|tag| is_version_tag(&tag.name)) {
            let version = Version::parse(&tag.name)?;
            index.record(version, tag.commit.clone());
        }
        Ok(index)
    }

    /// Add a newly created tag
    pub fn record(&mut self, version: Version, commit: impl Into<String>) {
        self.tags.push(VersionTag {
            version,
            commit: commit.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn contains(&self, version: &Version) -> bool {
        self.tags.iter().any(|tag| tag.version == *version)
    }

    fn highest_where(&self, predicate: impl Fn(&Version) -> bool) -> Option<&VersionTag> {
        self.tags
            .iter()
            .filter(|tag| predicate(&tag.version))
            .max_by_key(|tag| tag.version)
    }

    /// Highest version overall
    pub fn highest(&self) -> Option<&VersionTag> {
        self.highest_where(|_| true)
    }

    /// Highest version sharing `major`
    pub fn highest_in_major(&self, major: u64) -> Option<&VersionTag> {
        self.highest_where(|v| v.major == major)
    }

    /// Highest version on a release branch's minor line
    pub fn highest_on_branch(&self, branch: &ReleaseBranch) -> Option<&VersionTag> {
        self.highest_where(|v| branch.contains(v))
    }

    /// Highest `vMAJOR.MINOR.0` tag: the trunk walk boundary
    pub fn highest_minor_zero(&self) -> Option<&VersionTag> {
        self.highest_where(Version::is_minor_zero)
    }

    /// Whether `version` would be above every tag of its major line
    pub fn tops_major(&self, version: &Version) -> bool {
        self.highest_in_major(version.major)
            .map_or(true, |tag| *version > tag.version)
    }

    /// Whether `version` would be above every known tag
    pub fn tops_all(&self, version: &Version) -> bool {
        self.highest().map_or(true, |tag| *version > tag.version)
    }
}
