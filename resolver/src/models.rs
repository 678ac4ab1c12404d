pub use pointer_resolver_types::{SymbolKind, SymbolRecord};

/// A location the locator suspects, not yet verified, to define the symbol.
/// A `line_hint` of 0 means the start line is unknown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub path: String,
    pub line_hint: usize,
}

impl Candidate {
    pub fn new(path: impl Into<String>, line_hint: usize) -> Self {
        Self {
            path: path.into(),
            line_hint,
        }
    }
}

// Keyed by blob content rather than commit, so byte-identical files seen
// through different commits share one entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub repository: String,
    pub content_hash: String,
    pub kind: SymbolKind,
    pub name: String,
}

impl CacheKey {
    pub fn new(
        repository: impl Into<String>,
        content_hash: impl Into<String>,
        kind: SymbolKind,
        name: impl Into<String>,
    ) -> Self {
        Self {
            repository: repository.into(),
            content_hash: content_hash.into(),
            kind,
            name: name.into(),
        }
    }
}
