mod pattern;
mod structural;

use std::cell::OnceCell;

use pointer_resolver_types::SymbolKind;
use tree_sitter::{Language, Parser, Tree};

use crate::error::CandidateError;

pub use pattern::{extract_global, extract_macro};
pub use structural::find_definition;

/// Grammar used to parse a candidate file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceLanguage {
    C,
    Cpp,
}

impl SourceLanguage {
    pub fn for_path(path: &str) -> Self {
        let ext = path
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "cpp" | "cc" | "cxx" | "hpp" | "hh" | "hxx" => SourceLanguage::Cpp,
            _ => SourceLanguage::C,
        }
    }

    fn grammar(self) -> Language {
        match self {
            SourceLanguage::C => tree_sitter_c::LANGUAGE.into(),
            SourceLanguage::Cpp => tree_sitter_cpp::LANGUAGE.into(),
        }
    }
}

/// Raw bytes of one blob plus its syntax tree, parsed on first use so that
/// several candidates in the same file share a single parse.
pub struct SourceText {
    path: String,
    bytes: Vec<u8>,
    language: SourceLanguage,
    tree: OnceCell<Option<Tree>>,
}

impl SourceText {
    pub fn new(path: impl Into<String>, bytes: Vec<u8>) -> Self {
        let path = path.into();
        let language = SourceLanguage::for_path(&path);
        Self {
            path,
            bytes,
            language,
            tree: OnceCell::new(),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn language(&self) -> SourceLanguage {
        self.language
    }

    pub fn tree(&self) -> Result<&Tree, CandidateError> {
        self.tree
            .get_or_init(|| {
                let mut parser = Parser::new();
                parser.set_language(&self.language.grammar()).ok()?;
                parser.parse(&self.bytes, None)
            })
            .as_ref()
            .ok_or_else(|| CandidateError::Parse(self.path.clone()))
    }
}

/// A verified definition inside one file; the resolver adds the file path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extracted {
    pub code: String,
    pub line: usize,
}

pub fn extract(
    kind: SymbolKind,
    source: &SourceText,
    name: &str,
    line_hint: usize,
) -> Result<Option<Extracted>, CandidateError> {
    match kind {
        SymbolKind::Macro => Ok(extract_macro(source.bytes(), name)),
        SymbolKind::Global => Ok(extract_global(source.bytes(), name)),
        SymbolKind::Function | SymbolKind::Typedef | SymbolKind::Struct | SymbolKind::Enum => {
            let tree = source.tree()?;
            Ok(
                find_definition(tree, source.bytes(), kind, name, line_hint).map(|node| {
                    Extracted {
                        code: String::from_utf8_lossy(&source.bytes()[node.byte_range()])
                            .into_owned(),
                        line: node.start_position().row,
                    }
                }),
            )
        }
    }
}
