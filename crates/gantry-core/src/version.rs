//! Commit-derived version identifiers

/// Prerelease identifier derived from the head commit, `git-<short sha>`.
///
/// Stable for a given commit, so repeated runs on the same SHA produce
/// the same suffix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrereleaseId(String);

impl PrereleaseId {
    /// Derive from a commit SHA, using the 7-character short form.
    pub fn from_commit(sha: &str) -> Self {
        let short = &sha[..sha.len().min(7)];
        Self(format!("git-{}", short))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PrereleaseId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Dist-tag scoping all publishes to one pull request, `pr-<number>`.
///
/// Repeated runs on the same PR overwrite the same tag instead of
/// accumulating new ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishTag(String);

impl PublishTag {
    pub fn for_pull_request(pr_number: u64) -> Self {
        Self(format!("pr-{}", pr_number))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PublishTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
