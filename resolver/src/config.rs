use std::num::NonZeroUsize;
use std::path::PathBuf;

pub const DEFAULT_HOT_CAPACITY: usize = 20_000;
pub const DEFAULT_BLOB_ID_CAPACITY: usize = 100_000;
pub const DEFAULT_MAX_FALLBACK_CANDIDATES: usize = 32;
pub const DEFAULT_STORE_PATH: &str = "symcache.sqlite";

/// Where the warm tier lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    File(PathBuf),
    InMemory,
}

/// Construction-time settings; fixed for the lifetime of a resolver.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    pub repo_path: PathBuf,
    pub commit: String,
    pub store: StoreLocation,
    pub hot_capacity: NonZeroUsize,
    pub blob_id_capacity: NonZeroUsize,
    /// Upper bound on files tried when only the literal-name fallback hits.
    pub max_fallback_candidates: usize,
}

impl ResolverConfig {
    pub fn new(repo_path: impl Into<PathBuf>, commit: impl Into<String>) -> Self {
        Self {
            repo_path: repo_path.into(),
            commit: commit.into(),
            store: StoreLocation::File(PathBuf::from(DEFAULT_STORE_PATH)),
            hot_capacity: capacity(DEFAULT_HOT_CAPACITY),
            blob_id_capacity: capacity(DEFAULT_BLOB_ID_CAPACITY),
            max_fallback_candidates: DEFAULT_MAX_FALLBACK_CANDIDATES,
        }
    }

    pub fn with_store(mut self, store: StoreLocation) -> Self {
        self.store = store;
        self
    }

    /// A zero capacity is bumped to one.
    pub fn with_hot_capacity(mut self, entries: usize) -> Self {
        self.hot_capacity = capacity(entries);
        self
    }

    pub fn with_max_fallback_candidates(mut self, limit: usize) -> Self {
        self.max_fallback_candidates = limit;
        self
    }
}

fn capacity(entries: usize) -> NonZeroUsize {
    NonZeroUsize::new(entries).unwrap_or(NonZeroUsize::MIN)
}
