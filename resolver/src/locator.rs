use std::time::Instant;

use git2::Repository;
use pointer_resolver_types::SymbolKind;
use rayon::prelude::*;
use regex::bytes::Regex;
use tracing::{debug, warn};

use crate::error::ResolverError;
use crate::git::{CommitSnapshot, SourceFile};
use crate::models::Candidate;
use crate::patterns;
use crate::utils;

const BINARY_PROBE_LEN: usize = 8000;

/// Shortlists (file, line) pairs that may hold a definition.
#[derive(Debug, Clone)]
pub struct CandidateLocator {
    max_fallback_candidates: usize,
}

impl CandidateLocator {
    pub fn new(max_fallback_candidates: usize) -> Self {
        Self {
            max_fallback_candidates,
        }
    }

    /// Strict per-kind search first; when it finds nothing, every file
    /// mentioning the literal name is returned with an unknown line hint.
    pub fn search(
        &self,
        snapshot: &CommitSnapshot,
        name: &str,
        kind: SymbolKind,
    ) -> Result<Vec<Candidate>, ResolverError> {
        let start = Instant::now();
        let strict = Regex::new(&patterns::pattern_for(kind, name))?;
        let candidates = scan(snapshot, |content, path, out| {
            let mut line = 0;
            let mut offset = 0;
            for m in strict.find_iter(content) {
                line += utils::count_newlines(&content[offset..m.start()]);
                offset = m.start();
                out.push(Candidate::new(path, line));
            }
        });

        if !candidates.is_empty() {
            debug!(
                stage = "locate",
                event = "locate.strict",
                symbol = name,
                %kind,
                candidates = candidates.len(),
                duration_ms = start.elapsed().as_millis(),
                "strict pattern produced candidates"
            );
            return Ok(candidates);
        }

        let literal = Regex::new(&patterns::literal_for(name))?;
        let mut candidates = scan(snapshot, |content, path, out| {
            if literal.is_match(content) {
                out.push(Candidate::new(path, 0));
            }
        });
        let total = candidates.len();
        candidates.truncate(self.max_fallback_candidates);

        debug!(
            stage = "locate",
            event = "locate.fallback",
            symbol = name,
            %kind,
            matched_files = total,
            candidates = candidates.len(),
            duration_ms = start.elapsed().as_millis(),
            "strict pattern found nothing, using literal name search"
        );
        Ok(candidates)
    }
}

fn scan<F>(snapshot: &CommitSnapshot, visit: F) -> Vec<Candidate>
where
    F: Fn(&[u8], &str, &mut Vec<Candidate>) + Sync,
{
    let repo_path = snapshot.repo_path();
    let per_file: Vec<Vec<Candidate>> = snapshot
        .sources()
        .par_iter()
        .map_init(
            || match Repository::open(repo_path) {
                Ok(repo) => Some(repo),
                Err(err) => {
                    warn!(
                        stage = "locate",
                        event = "locate.open_repo",
                        repo = %repo_path.display(),
                        error = %err,
                        "failed to open repository handle for scan worker"
                    );
                    None
                }
            },
            |repo, file| match repo.as_ref() {
                Some(repo) => scan_file(repo, file, &visit),
                None => Vec::new(),
            },
        )
        .collect();

    per_file.into_iter().flatten().collect()
}

fn scan_file<F>(repo: &Repository, file: &SourceFile, visit: &F) -> Vec<Candidate>
where
    F: Fn(&[u8], &str, &mut Vec<Candidate>),
{
    let blob = match repo.find_blob(file.blob) {
        Ok(blob) => blob,
        Err(err) => {
            warn!(
                stage = "locate",
                event = "locate.read_blob",
                path = %file.path,
                error = %err,
                "failed to read blob during scan"
            );
            return Vec::new();
        }
    };

    let content = blob.content();
    if is_binary(content) {
        return Vec::new();
    }

    let mut out = Vec::new();
    visit(content, &file.path, &mut out);
    out
}

fn is_binary(content: &[u8]) -> bool {
    content.iter().take(BINARY_PROBE_LEN).any(|&b| b == 0)
}
