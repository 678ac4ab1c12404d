use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::cache::{CacheTier, TieredCache};
use crate::config::{ResolverConfig, StoreLocation};
use crate::error::{CandidateError, ResolverError};
use crate::extractors::{self, SourceText};
use crate::git::CommitSnapshot;
use crate::locator::CandidateLocator;
use crate::models::{CacheKey, Candidate, SymbolKind, SymbolRecord};
use crate::store::WarmStore;
use crate::utils;

/// Resolves C/C++ definitions at one fixed (repository, commit) pair.
///
/// The resolver owns both cache tiers and is the only writer to them. It is
/// `Send + Sync`; callers drive lookups from whatever threads they like.
pub struct Resolver {
    repository: String,
    snapshot: CommitSnapshot,
    locator: CandidateLocator,
    cache: TieredCache,
    stats: Counters,
}

#[derive(Debug, Default)]
struct Counters {
    lookups: AtomicU64,
    hot_hits: AtomicU64,
    warm_hits: AtomicU64,
    extractions: AtomicU64,
    skipped_candidates: AtomicU64,
    not_found: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ResolverStats {
    pub lookups: u64,
    pub hot_hits: u64,
    pub warm_hits: u64,
    pub extractions: u64,
    pub skipped_candidates: u64,
    pub not_found: u64,
}

impl Resolver {
    /// Fails only on misconfiguration: a repository that cannot be opened, a
    /// commit that does not resolve, or an unusable warm store.
    pub fn open(config: ResolverConfig) -> Result<Self, ResolverError> {
        let repo_path = utils::absolute_path(&config.repo_path)?;
        let snapshot = CommitSnapshot::open(&repo_path, &config.commit, config.blob_id_capacity)?;

        let warm = match &config.store {
            StoreLocation::File(path) => WarmStore::open(path)?,
            StoreLocation::InMemory => WarmStore::in_memory()?,
        };

        info!(
            stage = "resolver",
            event = "resolver.open",
            repo = %repo_path.display(),
            commit = %snapshot.commit(),
            store = ?config.store,
            hot_capacity = config.hot_capacity.get(),
            max_fallback_candidates = config.max_fallback_candidates,
            "symbol resolver ready"
        );

        Ok(Self {
            repository: repo_path.display().to_string(),
            snapshot,
            locator: CandidateLocator::new(config.max_fallback_candidates),
            cache: TieredCache::new(warm, config.hot_capacity),
            stats: Counters::default(),
        })
    }

    pub fn repository(&self) -> &str {
        &self.repository
    }

    pub fn commit(&self) -> String {
        self.snapshot.commit().to_string()
    }

    pub fn get_def(&self, name: &str) -> Option<SymbolRecord> {
        self.lookup(name, SymbolKind::Function)
    }

    pub fn get_macro(&self, name: &str) -> Option<SymbolRecord> {
        self.lookup(name, SymbolKind::Macro)
    }

    pub fn get_global(&self, name: &str) -> Option<SymbolRecord> {
        self.lookup(name, SymbolKind::Global)
    }

    pub fn get_typedef(&self, name: &str) -> Option<SymbolRecord> {
        self.lookup(name, SymbolKind::Typedef)
    }

    pub fn get_struct(&self, name: &str) -> Option<SymbolRecord> {
        self.lookup(name, SymbolKind::Struct)
    }

    pub fn get_enum(&self, name: &str) -> Option<SymbolRecord> {
        self.lookup(name, SymbolKind::Enum)
    }

    /// String-kind entry point; kinds outside the supported six are not
    /// found, and nothing is searched for them.
    pub fn lookup_str(&self, name: &str, kind: &str) -> Option<SymbolRecord> {
        match kind.parse::<SymbolKind>() {
            Ok(kind) => self.lookup(name, kind),
            Err(err) => {
                self.bump(&self.stats.lookups);
                self.bump(&self.stats.not_found);
                debug!(
                    stage = "resolver",
                    event = "resolver.lookup.unsupported",
                    symbol = name,
                    error = %err,
                    "unsupported kind"
                );
                None
            }
        }
    }

    /// First structurally or pattern verified definition among the
    /// locator's candidates, or `None`.
    pub fn lookup(&self, name: &str, kind: SymbolKind) -> Option<SymbolRecord> {
        let start = Instant::now();
        self.bump(&self.stats.lookups);

        if name.trim().is_empty() {
            self.bump(&self.stats.not_found);
            return None;
        }

        let candidates = match self.locator.search(&self.snapshot, name, kind) {
            Ok(candidates) => candidates,
            Err(err) => {
                warn!(
                    stage = "resolver",
                    event = "resolver.lookup.locate",
                    result = "fail",
                    symbol = name,
                    %kind,
                    error = %err,
                    "candidate search failed"
                );
                self.bump(&self.stats.not_found);
                return None;
            }
        };

        let mut sources = HashMap::new();
        for candidate in &candidates {
            match self.resolve_candidate(name, kind, candidate, &mut sources) {
                Ok(Some(record)) => {
                    debug!(
                        stage = "resolver",
                        event = "resolver.lookup.end",
                        result = "found",
                        symbol = name,
                        %kind,
                        file = %record.file,
                        line = record.line,
                        candidates = candidates.len(),
                        duration_ms = start.elapsed().as_millis(),
                        "symbol resolved"
                    );
                    return Some(record);
                }
                Ok(None) => {
                    self.bump(&self.stats.skipped_candidates);
                    debug!(
                        stage = "resolver",
                        event = "resolver.candidate.skip",
                        symbol = name,
                        %kind,
                        path = %candidate.path,
                        line_hint = candidate.line_hint,
                        "candidate did not verify"
                    );
                }
                Err(err) => {
                    self.bump(&self.stats.skipped_candidates);
                    debug!(
                        stage = "resolver",
                        event = "resolver.candidate.skip",
                        symbol = name,
                        %kind,
                        path = %candidate.path,
                        line_hint = candidate.line_hint,
                        error = %err,
                        "candidate failed"
                    );
                }
            }
        }

        self.bump(&self.stats.not_found);
        debug!(
            stage = "resolver",
            event = "resolver.lookup.end",
            result = "not_found",
            symbol = name,
            %kind,
            candidates = candidates.len(),
            duration_ms = start.elapsed().as_millis(),
            "symbol not found"
        );
        None
    }

    fn resolve_candidate(
        &self,
        name: &str,
        kind: SymbolKind,
        candidate: &Candidate,
        sources: &mut HashMap<String, SourceText>,
    ) -> Result<Option<SymbolRecord>, CandidateError> {
        let blob = self.snapshot.blob_id(&candidate.path)?;
        let key = CacheKey::new(self.repository.as_str(), blob.to_string(), kind, name);

        if let Some((record, tier)) = self.cache.get(&key) {
            match tier {
                CacheTier::Hot => self.bump(&self.stats.hot_hits),
                CacheTier::Warm => self.bump(&self.stats.warm_hits),
            }
            return Ok(Some(record));
        }

        let source = match sources.entry(candidate.path.clone()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let bytes = self.snapshot.read_blob(blob)?;
                entry.insert(SourceText::new(candidate.path.as_str(), bytes))
            }
        };

        self.bump(&self.stats.extractions);
        let Some(extracted) = extractors::extract(kind, source, name, candidate.line_hint)? else {
            return Ok(None);
        };

        let record = SymbolRecord {
            code: extracted.code,
            file: utils::join_repo_path(self.snapshot.repo_path(), &candidate.path),
            line: extracted.line,
        };
        self.cache.put(&key, &record);
        Ok(Some(record))
    }

    /// Empties the in-process tier; the warm store is untouched.
    pub fn clear_hot_cache(&self) {
        self.cache.clear_hot();
    }

    pub fn stats(&self) -> ResolverStats {
        let load = |counter: &AtomicU64| counter.load(Ordering::Relaxed);
        ResolverStats {
            lookups: load(&self.stats.lookups),
            hot_hits: load(&self.stats.hot_hits),
            warm_hits: load(&self.stats.warm_hits),
            extractions: load(&self.stats.extractions),
            skipped_candidates: load(&self.stats.skipped_candidates),
            not_found: load(&self.stats.not_found),
        }
    }

    fn bump(&self, counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::test_support::TestRepo;
    use pretty_assertions::assert_eq;

    fn open(repo: &TestRepo, commit: &str) -> Resolver {
        Resolver::open(ResolverConfig::new(repo.path(), commit).with_store(StoreLocation::InMemory))
            .unwrap()
    }

    #[test]
    fn resolver_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Resolver>();
    }

    #[test]
    fn resolves_each_kind() {
        let repo = TestRepo::new();
        let commit = repo.commit(&[
            (
                "src/defs.h",
                "#define MAX_LEN 256\ntypedef unsigned int u32;\nenum Color { RED, GREEN };\nstruct Point { int x; int y; };\nextern int counter;\n",
            ),
            ("src/math.c", "int counter = 0;\n\nint add(int a, int b) { return a + b; }\n"),
        ]);
        let resolver = open(&repo, &commit);
        let file = |rel: &str| utils::join_repo_path(Path::new(resolver.repository()), rel);

        assert_eq!(
            resolver.get_def("add"),
            Some(SymbolRecord {
                code: "int add(int a, int b) { return a + b; }".into(),
                file: file("src/math.c"),
                line: 2,
            })
        );
        assert_eq!(resolver.get_macro("MAX_LEN").map(|r| r.code), Some("#define MAX_LEN 256".into()));
        assert_eq!(resolver.get_typedef("u32").map(|r| r.line), Some(1));
        assert_eq!(
            resolver.get_enum("Color").map(|r| r.code),
            Some("enum Color { RED, GREEN }".into())
        );
        assert_eq!(
            resolver.get_struct("Point").map(|r| r.code),
            Some("struct Point { int x; int y; }".into())
        );
        assert_eq!(
            resolver.get_global("counter").map(|r| (r.code, r.file)),
            Some(("extern int counter;".into(), file("src/defs.h")))
        );
    }

    #[test]
    fn unsupported_kind_is_not_found_without_search() {
        let repo = TestRepo::new();
        let commit = repo.commit(&[("a.c", "union U { int a; };\n")]);
        let resolver = open(&repo, &commit);

        assert_eq!(resolver.lookup_str("U", "union"), None);
        let stats = resolver.stats();
        assert_eq!(stats.lookups, 1);
        assert_eq!(stats.not_found, 1);
        assert_eq!(stats.extractions, 0);
        assert_eq!(resolver.lookup_str("U", "struct"), None);
    }

    #[test]
    fn repeat_lookup_is_a_hot_hit() {
        let repo = TestRepo::new();
        let commit = repo.commit(&[("a.c", "int add(int a, int b) { return a + b; }\n")]);
        let resolver = open(&repo, &commit);

        let first = resolver.get_def("add");
        let second = resolver.get_def("add");
        let third = resolver.get_def("add");
        assert!(first.is_some());
        assert_eq!(first, second);
        assert_eq!(second, third);

        let stats = resolver.stats();
        assert_eq!(stats.extractions, 1);
        assert_eq!(stats.warm_hits, 1);
        assert_eq!(stats.hot_hits, 1);
    }

    #[test]
    fn empty_name_is_not_found() {
        let repo = TestRepo::new();
        let commit = repo.commit(&[("a.c", "int a;\n")]);
        let resolver = open(&repo, &commit);
        assert_eq!(resolver.get_global(""), None);
        assert_eq!(resolver.stats().not_found, 1);
    }

    #[test]
    fn bad_repository_is_a_construction_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let result = Resolver::open(
            ResolverConfig::new(dir.path(), "HEAD").with_store(StoreLocation::InMemory),
        );
        assert!(matches!(result, Err(ResolverError::Repository { .. })));
    }
}
