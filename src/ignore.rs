//! Ignore filter.
//!
//! An ignore set is a list of repository records of which only `url` is
//! meaningful. Membership is an exact, case-sensitive string comparison: an
//! ssh URL and an https URL of the same repository are different entries.

use crate::config::RepositorySpec;

/// URLs excluded from processing for a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IgnoreSet {
    urls: Vec<String>,
}

impl IgnoreSet {
    /// Builds the set from ignore file records.
    pub fn from_entries(entries: &[RepositorySpec]) -> Self {
        Self {
            urls: entries.iter().map(|entry| entry.url.clone()).collect(),
        }
    }

    /// Builds the set from plain URLs.
    pub fn from_urls<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            urls: urls.into_iter().map(Into::into).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    /// Returns true when `url` exactly matches an ignore entry.
    pub fn should_ignore(&self, url: &str) -> bool {
        self.urls.iter().any(|ignored| ignored == url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_exact_match_only() {
        let set = IgnoreSet::from_urls(["git@github.com:acme/service.git"]);
        assert!(set.should_ignore("git@github.com:acme/service.git"));
        assert!(!set.should_ignore("git@github.com:acme/service"));
        assert!(!set.should_ignore("git@github.com:Acme/service.git"));
        assert!(!set.should_ignore("https://github.com/acme/service.git"));
    }

    #[test]
    fn test_from_entries_uses_url_only() {
        let mut entry = RepositorySpec::new("git@host:a/b.git");
        entry.alt_name = "other".to_string();
        let set = IgnoreSet::from_entries(&[entry]);
        assert_eq!(set.len(), 1);
        assert!(set.should_ignore("git@host:a/b.git"));
        assert!(!set.should_ignore("other"));
    }

    #[test]
    fn test_empty_set_ignores_nothing() {
        let set = IgnoreSet::default();
        assert!(set.is_empty());
        assert!(!set.should_ignore(""));
        assert!(!set.should_ignore("git@host:a/b.git"));
    }

    proptest! {
        #[test]
        fn prop_membership_is_string_equality(a in "[a-zA-Z:/@._-]{1,30}", b in "[a-zA-Z:/@._-]{1,30}") {
            let set = IgnoreSet::from_urls([a.clone()]);
            prop_assert!(set.should_ignore(&a));
            prop_assert_eq!(set.should_ignore(&b), a == b);
        }
    }
}
