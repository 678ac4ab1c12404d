use std::path::PathBuf;

use thiserror::Error;

/// Failures that make a resolver unusable. Business-level misses never end up here.
#[derive(Debug, Error)]
pub enum ResolverError {
    #[error("failed to open git repository at {path}: {source}")]
    Repository {
        path: PathBuf,
        #[source]
        source: git2::Error,
    },
    #[error("commit '{commit}' does not resolve in {path}: {source}")]
    Commit {
        path: PathBuf,
        commit: String,
        #[source]
        source: git2::Error,
    },
    #[error("failed to list tree of commit {commit}: {source}")]
    Tree {
        commit: String,
        #[source]
        source: git2::Error,
    },
    #[error("warm store error: {0}")]
    Store(#[from] rusqlite::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid search pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Why a single candidate was skipped. Logged, then the lookup moves on.
#[derive(Debug, Error)]
pub enum CandidateError {
    #[error("path {0} is not a blob at the resolver commit")]
    MissingPath(String),
    #[error("failed to read git object: {0}")]
    Object(#[from] git2::Error),
    #[error("{0} could not be parsed")]
    Parse(String),
}
