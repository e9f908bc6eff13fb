use crate::domain::Version;
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

fn release_branch_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^release/(0|[1-9][0-9]*)\.(0|[1-9][0-9]*)\.x$")
            .expect("valid release branch regex")
    })
}

/// A long-lived `release/MAJOR.MINOR.x` branch tracking one minor line
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReleaseBranch {
    pub name: String,
    pub major: u64,
    pub minor: u64,
}

impl ReleaseBranch {
    /// Parse a branch name; `None` for anything that is not a release branch
    pub fn parse(name: &str) -> Option<Self> {
        let captures = release_branch_regex().captures(name)?;
        let major = captures.get(1)?.as_str().parse::<u64>().ok()?;
        let minor = captures.get(2)?.as_str().parse::<u64>().ok()?;
        Some(ReleaseBranch {
            name: name.to_string(),
            major,
            minor,
        })
    }

    /// The release branch a given version belongs to
    pub fn for_version(version: &Version) -> Self {
        ReleaseBranch {
            name: format!("release/{}.{}.x", version.major, version.minor),
            major: version.major,
            minor: version.minor,
        }
    }

    /// Whether `version` lies on this branch's minor line
    pub fn contains(&self, version: &Version) -> bool {
        version.major == self.major && version.minor == self.minor
    }
}

impl fmt::Display for ReleaseBranch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_release_branch() {
        let branch = ReleaseBranch::parse("release/1.0.x").unwrap();
        assert_eq!(branch.major, 1);
        assert_eq!(branch.minor, 0);
        assert_eq!(branch.name, "release/1.0.x");

        let wide = ReleaseBranch::parse("release/12.340.x").unwrap();
        assert_eq!((wide.major, wide.minor), (12, 340));
    }

    #[test]
    fn test_parse_rejects_non_release_branches() {
        for name in [
            "main",
            "release/1.0",
            "release/1.0.0",
            "release/01.0.x",
            "release/1.00.x",
            "feature/release/1.0.x",
            "release/1.0.x-hotfix",
            "release/a.b.x",
            "release/\u{661}.\u{662}.x",
        ] {
            assert!(ReleaseBranch::parse(name).is_none(), "accepted {}", name);
        }
    }

    #[test]
    fn test_for_version() {
        let branch = ReleaseBranch::for_version(&Version::new(2, 2, 0));
        assert_eq!(branch.name, "release/2.2.x");
        assert_eq!(branch.to_string(), "release/2.2.x");
    }

    #[test]
    fn test_contains() {
        let branch = ReleaseBranch::parse("release/1.10.x").unwrap();
        assert!(branch.contains(&Version::new(1, 10, 3)));
        assert!(!branch.contains(&Version::new(1, 1, 0)));
        assert!(!branch.contains(&Version::new(2, 10, 0)));
    }
}
