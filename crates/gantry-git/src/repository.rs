//! Repository access

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use git2::Repository;
use tracing::{info, instrument};

use gantry_core::error::ScmError;

/// Result type for git operations
pub type Result<T> = std::result::Result<T, ScmError>;

/// Git repository wrapper implementing the core SCM seam.
///
/// The inner repository sits behind a mutex: git2 handles are not
/// shareable across threads, and the run may live on a multi-threaded
/// runtime.
pub struct GitScm {
    pub(crate) repo: Mutex<Repository>,
    path: PathBuf,
}

impl GitScm {
    /// Open a repository at the given path
    #[instrument(fields(path = %path.display()))]
    pub fn open(path: &Path) -> Result<Self> {
        info!(path = %path.display(), "opening git repository");
        let repo = Repository::open(path)
            .map_err(|e| ScmError::OpenFailed(format!("{}: {}", path.display(), e.message())))?;

        Ok(Self {
            repo: Mutex::new(repo),
            path: path.to_path_buf(),
        })
    }

    /// Discover and open a repository by searching parent directories
    #[instrument(fields(start_path = %start_path.display()))]
    pub fn discover(start_path: &Path) -> Result<Self> {
        let repo = Repository::discover(start_path).map_err(|e| {
            ScmError::OpenFailed(format!("{}: {}", start_path.display(), e.message()))
        })?;

        let path = repo.workdir().unwrap_or_else(|| repo.path()).to_path_buf();

        Ok(Self {
            repo: Mutex::new(repo),
            path,
        })
    }

    /// Get the repository path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// SHA of the current HEAD commit
    pub fn head_commit_sha(&self) -> Result<String> {
        let repo = self.repo.lock().expect("repository lock poisoned");
        let head = repo
            .head()
            .map_err(|e| ScmError::HeadUnresolved(e.message().to_string()))?;
        let commit = head
            .peel_to_commit()
            .map_err(|e| ScmError::HeadUnresolved(e.message().to_string()))?;
        Ok(commit.id().to_string())
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use git2::Signature;
    use tempfile::TempDir;

    /// Initialize a repository with one committed file.
    pub fn repo_with_commit() -> (TempDir, GitScm) {
        let temp = TempDir::new().unwrap();
        let repo = Repository::init(temp.path()).unwrap();

        let sig = Signature::now("Test", "test@example.com").unwrap();

        std::fs::write(temp.path().join("file.txt"), "content").unwrap();
        let mut index = repo.index().unwrap();
        index.add_path(Path::new("file.txt")).unwrap();
        index.write().unwrap();

        let tree_id = index.write_tree().unwrap();
        let tree = repo.find_tree(tree_id).unwrap();

        repo.commit(Some("HEAD"), &sig, &sig, "Initial commit", &tree, &[])
            .unwrap();
        drop(tree);

        let scm = GitScm::open(temp.path()).unwrap();
        (temp, scm)
    }

    /// Stage and commit a file in an already-open fixture repository.
    pub fn commit_file(scm: &GitScm, root: &Path, rel_path: &str, content: &str) {
        let repo = scm.repo.lock().unwrap();
        let sig = Signature::now("Test", "test@example.com").unwrap();

        let full = root.join(rel_path);
        if let Some(parent) = full.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&full, content).unwrap();

        let mut index = repo.index().unwrap();
        index.add_path(Path::new(rel_path)).unwrap();
        index.write().unwrap();

        let tree_id = index.write_tree().unwrap();
        let tree = repo.find_tree(tree_id).unwrap();
        let parent = repo.head().unwrap().peel_to_commit().unwrap();

        repo.commit(Some("HEAD"), &sig, &sig, "update", &tree, &[&parent])
            .unwrap();
    }
}
