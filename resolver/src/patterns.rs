//! Line-anchored search patterns used to shortlist candidate definitions.
//!
//! The patterns aim for precision: every one is anchored at the start of a
//! line, requires the name as a whole word, and never lets whitespace
//! classes cross a newline, so a single match always corresponds to a single
//! source line.

use pointer_resolver_types::SymbolKind;

pub const SOURCE_EXTENSIONS: &[&str] = &["c", "h", "cpp", "cc", "cxx", "hpp", "hh", "hxx"];

pub fn pattern_for(kind: SymbolKind, name: &str) -> String {
    let name = regex::escape(name);
    match kind {
        SymbolKind::Function => format!(
            r"(?m)^[ \t]*(?:(?:static|inline|extern|__\w+__)[ \t]+)*[\w\*&: \t]+\b{name}[ \t]*\("
        ),
        SymbolKind::Macro => format!(r"(?m)^[ \t]*#[ \t]*define[ \t]+{name}\b"),
        SymbolKind::Global => format!(
            r"(?m)^[ \t]*(?:extern[ \t]+)?[\w\* \t\[\]]+\b{name}\b[ \t]*(?:\[[^\]\n]*\][ \t]*)*[=;{{]"
        ),
        SymbolKind::Typedef => format!(r"(?m)^[ \t]*typedef\b[^\n]*\b{name}\b"),
        SymbolKind::Struct => format!(r"(?m)^[ \t]*(?:typedef[ \t]+)?struct[ \t]+{name}\b"),
        SymbolKind::Enum => format!(r"(?m)^[ \t]*(?:typedef[ \t]+)?enum[ \t]+{name}\b"),
    }
}

/// Pattern for the broad fallback search: any occurrence of the literal name.
pub fn literal_for(name: &str) -> String {
    regex::escape(name)
}

pub fn is_source_path(path: &str) -> bool {
    path.rsplit_once('.')
        .map(|(_, ext)| {
            let ext = ext.to_ascii_lowercase();
            SOURCE_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;

    fn matches(kind: SymbolKind, name: &str, line: &str) -> bool {
        Regex::new(&pattern_for(kind, name)).unwrap().is_match(line)
    }

    #[test]
    fn function_pattern_requires_call_paren_and_full_word() {
        assert!(matches(SymbolKind::Function, "add", "int add(int a, int b) {"));
        assert!(matches(SymbolKind::Function, "add", "static inline int *add (void)"));
        assert!(matches(SymbolKind::Function, "add", "__always_inline__ void add(void)"));
        assert!(!matches(SymbolKind::Function, "add", "int add_all(int a)"));
        assert!(!matches(SymbolKind::Function, "add", "int padd(int a)"));
        assert!(!matches(SymbolKind::Function, "add", "int add;"));
        assert!(matches(SymbolKind::Function, "size", "int Widget::size() const {"));
        assert!(matches(SymbolKind::Function, "name", "const std::string& name(void)"));
    }

    #[test]
    fn macro_pattern_allows_spaced_hash() {
        assert!(matches(SymbolKind::Macro, "MAX_LEN", "#define MAX_LEN 256"));
        assert!(matches(SymbolKind::Macro, "MAX_LEN", "  #  define MAX_LEN(x) x"));
        assert!(!matches(SymbolKind::Macro, "MAX_LEN", "#define MAX_LENGTH 256"));
        assert!(!matches(SymbolKind::Macro, "MAX_LEN", "int y = MAX_LEN;"));
    }

    #[test]
    fn global_pattern_accepts_initialisers_and_arrays() {
        assert!(matches(SymbolKind::Global, "counter", "int counter = 0;"));
        assert!(matches(SymbolKind::Global, "counter", "extern unsigned long counter;"));
        assert!(matches(SymbolKind::Global, "table", "static const char *table[16] = {"));
        assert!(!matches(SymbolKind::Global, "counter", "return counter + 1;"));
    }

    #[test]
    fn type_patterns_anchor_on_keywords() {
        assert!(matches(SymbolKind::Typedef, "u32", "typedef unsigned int u32;"));
        assert!(matches(SymbolKind::Struct, "Point", "typedef struct Point {"));
        assert!(matches(SymbolKind::Struct, "Point", "struct Point {"));
        assert!(!matches(SymbolKind::Struct, "Point", "struct Point3D {"));
        assert!(matches(SymbolKind::Enum, "Color", "enum Color { RED };"));
        assert!(!matches(SymbolKind::Enum, "Color", "  int enumColor;"));
    }

    #[test]
    fn patterns_do_not_span_lines() {
        assert!(!matches(SymbolKind::Function, "add", "int\nadd(int a)"));
        assert!(!matches(SymbolKind::Struct, "Point", "struct\nPoint {"));
    }

    #[test]
    fn names_are_escaped() {
        assert!(!matches(SymbolKind::Macro, "A.B", "#define AxB 1"));
        assert_eq!(literal_for("a+b"), r"a\+b");
    }

    #[test]
    fn recognises_source_extensions() {
        assert!(is_source_path("src/main.c"));
        assert!(is_source_path("include/Thing.HPP"));
        assert!(!is_source_path("README.md"));
        assert!(!is_source_path("Makefile"));
    }
}
