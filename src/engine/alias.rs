use std::collections::BTreeMap;

/// Alias tag name -> commit it must reference once the run is reconciled.
///
/// Later assignments to the same alias overwrite earlier ones, so the
/// final value is whatever the last processed qualifying commit wrote.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasMap {
    entries: BTreeMap<String, String>,
}

impl AliasMap {
    pub fn new() -> Self {
        AliasMap::default()
    }

    /// Point `alias` at `commit`, returning the commit it pointed at before
    pub fn assign(&mut self, alias: impl Into<String>, commit: impl Into<String>) -> Option<String> {
        self.entries.insert(alias.into(), commit.into())
    }

    pub fn get(&self, alias: &str) -> Option<&str> {
        self.entries.get(alias).map(String::as_str)
    }

    /// Entries in alias name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(alias, commit)| (alias.as_str(), commit.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_write_wins() {
        let mut aliases = AliasMap::new();
        assert_eq!(aliases.assign("latest", "a"), None);
        assert_eq!(aliases.assign("latest", "b"), Some("a".to_string()));
        assert_eq!(aliases.get("latest"), Some("b"));
        assert_eq!(aliases.len(), 1);
    }

    #[test]
    fn test_iter_is_sorted_by_alias() {
        let mut aliases = AliasMap::new();
        aliases.assign("v1.0", "x");
        aliases.assign("latest", "y");
        aliases.assign("v1", "z");
        let names: Vec<&str> = aliases.iter().map(|(alias, _)| alias).collect();
        assert_eq!(names, vec!["latest", "v1", "v1.0"]);
    }

    #[test]
    fn test_empty() {
        let aliases = AliasMap::new();
        assert!(aliases.is_empty());
        assert_eq!(aliases.get("v1"), None);
    }
}
