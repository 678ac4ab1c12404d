use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::time::Instant;

use git2::{ObjectType, Oid, Repository, TreeWalkMode, TreeWalkResult};
use lru::LruCache;
use tracing::{debug, info};

use crate::error::{CandidateError, ResolverError};
use crate::patterns;

const GITLINK_MODE: i32 = 0o160000;
const SYMLINK_MODE: i32 = 0o120000;

/// A source file of the pinned commit: repo-relative path and blob id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: String,
    pub blob: Oid,
}

/// Read-only view of one commit. Nothing here touches the working tree.
pub struct CommitSnapshot {
    repo_path: PathBuf,
    commit: Oid,
    tree: Oid,
    repo: Mutex<Repository>,
    blob_ids: Mutex<LruCache<String, Oid>>,
    sources: Vec<SourceFile>,
}

impl CommitSnapshot {
    pub fn open(
        repo_path: &Path,
        commit: &str,
        blob_cache_capacity: NonZeroUsize,
    ) -> Result<Self, ResolverError> {
        let start = Instant::now();
        let repo = Repository::open(repo_path).map_err(|source| ResolverError::Repository {
            path: repo_path.to_path_buf(),
            source,
        })?;

        let resolved = repo
            .revparse_single(commit)
            .and_then(|object| object.peel_to_commit())
            .map_err(|source| ResolverError::Commit {
                path: repo_path.to_path_buf(),
                commit: commit.to_string(),
                source,
            })?;
        let commit_id = resolved.id();
        let tree = resolved.tree().map_err(|source| ResolverError::Tree {
            commit: commit_id.to_string(),
            source,
        })?;
        let tree_id = tree.id();

        let sources = list_sources(&tree).map_err(|source| ResolverError::Tree {
            commit: commit_id.to_string(),
            source,
        })?;
        drop(tree);
        drop(resolved);

        info!(
            stage = "git",
            event = "git.snapshot.open",
            repo = %repo_path.display(),
            commit = %commit_id,
            source_files = sources.len(),
            duration_ms = start.elapsed().as_millis(),
            "opened commit snapshot"
        );

        Ok(Self {
            repo_path: repo_path.to_path_buf(),
            commit: commit_id,
            tree: tree_id,
            repo: Mutex::new(repo),
            blob_ids: Mutex::new(LruCache::new(blob_cache_capacity)),
            sources,
        })
    }

    pub fn repo_path(&self) -> &Path {
        &self.repo_path
    }

    pub fn commit(&self) -> Oid {
        self.commit
    }

    /// Allow-listed C/C++ files of the commit, in tree order.
    pub fn sources(&self) -> &[SourceFile] {
        &self.sources
    }

    /// Content address of `path` at the pinned commit: its git blob id.
    pub fn blob_id(&self, path: &str) -> Result<Oid, CandidateError> {
        if let Some(oid) = self
            .blob_ids
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(path)
        {
            return Ok(*oid);
        }

        let oid = {
            let repo = self.repo.lock().unwrap_or_else(PoisonError::into_inner);
            let tree = repo.find_tree(self.tree)?;
            let entry = tree
                .get_path(Path::new(path))
                .map_err(|_| CandidateError::MissingPath(path.to_string()))?;
            if entry.kind() != Some(ObjectType::Blob) {
                return Err(CandidateError::MissingPath(path.to_string()));
            }
            entry.id()
        };

        debug!(stage = "git", event = "git.blob_id.resolve", path, blob = %oid, "resolved blob id");
        self.blob_ids
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .put(path.to_string(), oid);
        Ok(oid)
    }

    pub fn read_blob(&self, oid: Oid) -> Result<Vec<u8>, CandidateError> {
        let repo = self.repo.lock().unwrap_or_else(PoisonError::into_inner);
        let blob = repo.find_blob(oid)?;
        Ok(blob.content().to_vec())
    }
}

fn list_sources(tree: &git2::Tree<'_>) -> Result<Vec<SourceFile>, git2::Error> {
    let mut sources = Vec::new();
    tree.walk(TreeWalkMode::PreOrder, |root, entry| {
        if entry.kind() != Some(ObjectType::Blob) {
            return TreeWalkResult::Ok;
        }
        let mode = entry.filemode();
        if mode == SYMLINK_MODE || mode == GITLINK_MODE {
            return TreeWalkResult::Ok;
        }
        if let Some(name) = entry.name() {
            let path = format!("{root}{name}");
            if patterns::is_source_path(&path) {
                sources.push(SourceFile {
                    path,
                    blob: entry.id(),
                });
            }
        }
        TreeWalkResult::Ok
    })?;
    Ok(sources)
}
