use once_cell::sync::Lazy;
use pointer_resolver_types::SymbolKind;
use regex::bytes::Regex;

use super::Extracted;
use crate::patterns;
use crate::utils;

static GLOBAL_DECL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?m)^[ \t]*(?:extern[ \t]+)?(?P<ty>[\w\* \t]*?)\b(?P<name>\w+)[ \t]*(?:\[[^\]\n]*\][ \t]*)*[=;{]",
    )
    .expect("global declaration pattern is valid")
});

const STATEMENT_KEYWORDS: &[&str] = &[
    "return", "goto", "case", "else", "do", "throw", "delete", "break", "continue", "typedef",
    "using", "namespace", "co_return", "co_yield",
];

/// First `#define NAME`; the matched line only, trimmed.
pub fn extract_macro(source: &[u8], name: &str) -> Option<Extracted> {
    let pattern = Regex::new(&patterns::pattern_for(SymbolKind::Macro, name)).ok()?;
    let m = pattern.find(source)?;
    Some(extracted(source, m.start(), line_end(source, m.start())))
}

/// First top-level declaration-like line whose declared identifier is
/// exactly `name`. Members, locals and commented-out text never qualify.
pub fn extract_global(source: &[u8], name: &str) -> Option<Extracted> {
    let mut scope = ScopeTracker::default();
    GLOBAL_DECL
        .captures_iter(source)
        .filter_map(|caps| caps.get(0).map(|m| (m.start(), caps)))
        .find(|(start, caps)| {
            caps.name("name").map(|n| n.as_bytes()) == Some(name.as_bytes())
                && caps.name("ty").map(|ty| is_type_run(ty.as_bytes())).unwrap_or(false)
                && scope.at_top_level(source, *start)
        })
        .map(|(start, _)| extracted(source, start, statement_end(source, start)))
}

fn extracted(source: &[u8], start: usize, end: usize) -> Extracted {
    Extracted {
        code: String::from_utf8_lossy(&source[start..end]).trim().to_string(),
        line: utils::count_newlines(&source[..start]),
    }
}

// `counter = 1;` and `return counter;` are statements, not declarations.
fn is_type_run(ty: &[u8]) -> bool {
    let text = String::from_utf8_lossy(ty);
    match text.split(|c: char| !(c.is_alphanumeric() || c == '_')).find(|w| !w.is_empty()) {
        Some(first) => !STATEMENT_KEYWORDS.contains(&first),
        None => false,
    }
}

fn line_end(source: &[u8], start: usize) -> usize {
    source[start..]
        .iter()
        .position(|&b| b == b'\n')
        .map(|pos| start + pos)
        .unwrap_or(source.len())
}

/// Forward-only walk that knows which braces enclose a position.
#[derive(Default)]
struct ScopeTracker {
    pos: usize,
    // One entry per open brace; `true` for bodies (struct, function,
    // initialiser), `false` for `namespace` and `extern "C"` blocks.
    scopes: Vec<bool>,
}

impl ScopeTracker {
    /// Advances to `target`. False when `target` lies inside a comment, a
    /// literal or a braced body. Targets must be visited in order.
    fn at_top_level(&mut self, source: &[u8], target: usize) -> bool {
        while self.pos < target {
            if let Some(next) = skip_trivia(source, self.pos) {
                self.pos = next;
                continue;
            }
            match source[self.pos] {
                b'{' => self.scopes.push(!is_namespace_like(source, self.pos)),
                b'}' => {
                    self.scopes.pop();
                }
                _ => {}
            }
            self.pos += 1;
        }
        self.pos == target && !self.scopes.iter().any(|&body| body)
    }
}

fn is_namespace_like(source: &[u8], brace: usize) -> bool {
    let head_start = source[..brace]
        .iter()
        .rposition(|&b| matches!(b, b';' | b'{' | b'}'))
        .map(|pos| pos + 1)
        .unwrap_or(0);
    let head = String::from_utf8_lossy(&source[head_start..brace]);
    let words: Vec<&str> = head
        .lines()
        .filter(|line| !line.trim_start().starts_with('#'))
        .flat_map(str::split_whitespace)
        .collect();
    matches!(
        words.as_slice(),
        ["namespace", ..] | ["inline", "namespace", ..] | ["extern", "\"C\"" | "\"C++\""]
    )
}

/// End of the declaration starting at `start`: the first `;` outside braces,
/// comments and literals, or the end of the first line when none follows.
fn statement_end(source: &[u8], start: usize) -> usize {
    let mut depth = 0usize;
    let mut idx = start;
    while idx < source.len() {
        if let Some(next) = skip_trivia(source, idx) {
            idx = next;
            continue;
        }
        match source[idx] {
            b'{' => depth += 1,
            b'}' => depth = depth.saturating_sub(1),
            b';' if depth == 0 => return idx + 1,
            _ => {}
        }
        idx += 1;
    }
    line_end(source, start)
}

/// When a comment or a string/char literal opens at `idx`, the offset just
/// past it.
fn skip_trivia(source: &[u8], idx: usize) -> Option<usize> {
    match (source[idx], source.get(idx + 1).copied()) {
        (b'/', Some(b'/')) => Some(line_end(source, idx)),
        (b'/', Some(b'*')) => Some(
            source[idx + 2..]
                .windows(2)
                .position(|pair| pair == b"*/")
                .map(|pos| idx + 2 + pos + 2)
                .unwrap_or(source.len()),
        ),
        (b'"' | b'\'', _) => Some((skip_literal(source, idx) + 1).min(source.len())),
        _ => None,
    }
}

fn skip_literal(source: &[u8], open: usize) -> usize {
    let quote = source[open];
    let mut idx = open + 1;
    while idx < source.len() {
        match source[idx] {
            b'\\' => idx += 1,
            b'\n' => return idx,
            b if b == quote => return idx,
            _ => {}
        }
        idx += 1;
    }
    source.len()
}
