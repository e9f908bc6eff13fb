use crate::error::{ReleaseError, Result};
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

fn version_tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^v[0-9]+\.[0-9]+\.[0-9]+$").expect("valid version tag regex"))
}

/// Whether a tag name has the shape of a full version tag (`vMAJOR.MINOR.PATCH`).
///
/// Shape only: `v01.2.3` matches here and is rejected later by [`Version::parse`].
pub fn is_version_tag(name: &str) -> bool {
    version_tag_regex().is_match(name)
}

/// Semantic version triple, ordered lexicographically on (major, minor, patch)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl Version {
    /// Create a new version
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Version {
            major,
            minor,
            patch,
        }
    }

    /// Parse a full version tag name (e.g., "v1.2.3" -> Version(1,2,3))
    ///
    /// Anything other than a lowercase `v` followed by three dot-separated
    /// base-10 integers without leading zeros is a `MalformedVersionTag`.
    pub fn parse(tag: &str) -> Result<Self> {
        if !is_version_tag(tag) {
            return Err(ReleaseError::malformed(tag));
        }

        let parsed =
            semver::Version::parse(&tag[1..]).map_err(|_| ReleaseError::malformed(tag))?;
        if !parsed.pre.is_empty() || !parsed.build.is_empty() {
            return Err(ReleaseError::malformed(tag));
        }

        Ok(Version::new(parsed.major, parsed.minor, parsed.patch))
    }

    /// Bump version according to bump type.
    ///
    /// A component already at `u64::MAX` is a `VersionOverflow`.
    pub fn bump(&self, bump_type: VersionBump) -> Result<Self> {
        let overflow = || ReleaseError::VersionOverflow {
            version: self.to_string(),
        };
        Ok(match bump_type {
            VersionBump::Major => {
                Version::new(self.major.checked_add(1).ok_or_else(overflow)?, 0, 0)
            }
            VersionBump::Minor => {
                Version::new(self.major, self.minor.checked_add(1).ok_or_else(overflow)?, 0)
            }
            VersionBump::Patch => Version::new(
                self.major,
                self.minor,
                self.patch.checked_add(1).ok_or_else(overflow)?,
            ),
        })
    }

    pub fn bump_patch(&self) -> Result<Self> {
        self.bump(VersionBump::Patch)
    }

    pub fn bump_minor(&self) -> Result<Self> {
        self.bump(VersionBump::Minor)
    }

    pub fn bump_major(&self) -> Result<Self> {
        self.bump(VersionBump::Major)
    }

    /// Full version tag name, e.g. `v1.2.3`
    pub fn tag_name(&self) -> String {
        format!("v{}", self)
    }

    /// Major alias tag name, e.g. `v1`
    pub fn major_alias(&self) -> String {
        format!("v{}", self.major)
    }

    /// Major.minor alias tag name, e.g. `v1.2`
    pub fn minor_alias(&self) -> String {
        format!("v{}.{}", self.major, self.minor)
    }

    /// `vMAJOR.MINOR.0` tags mark the fork point of a release line
    pub fn is_minor_zero(&self) -> bool {
        self.patch == 0
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Version bump type decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionBump {
    Major,
    Minor,
    Patch,
}

impl VersionBump {
    /// Minor and major bumps open a new `release/MAJOR.MINOR.x` line
    pub fn forks_release_branch(&self) -> bool {
        matches!(self, VersionBump::Major | VersionBump::Minor)
    }
}
