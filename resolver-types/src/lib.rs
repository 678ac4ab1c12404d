use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The kinds of C/C++ definitions the resolver knows how to find.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
    Function,
    Macro,
    Global,
    Typedef,
    Struct,
    Enum,
}

impl SymbolKind {
    pub const ALL: [SymbolKind; 6] = [
        SymbolKind::Function,
        SymbolKind::Macro,
        SymbolKind::Global,
        SymbolKind::Typedef,
        SymbolKind::Struct,
        SymbolKind::Enum,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SymbolKind::Function => "function",
            SymbolKind::Macro => "macro",
            SymbolKind::Global => "global",
            SymbolKind::Typedef => "typedef",
            SymbolKind::Struct => "struct",
            SymbolKind::Enum => "enum",
        }
    }
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownKind(pub String);

impl fmt::Display for UnknownKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown symbol kind '{}'", self.0)
    }
}

impl std::error::Error for UnknownKind {}

impl FromStr for SymbolKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "function" | "def" => Ok(SymbolKind::Function),
            "macro" => Ok(SymbolKind::Macro),
            "global" => Ok(SymbolKind::Global),
            "typedef" => Ok(SymbolKind::Typedef),
            "struct" => Ok(SymbolKind::Struct),
            "enum" => Ok(SymbolKind::Enum),
            _ => Err(UnknownKind(s.to_string())),
        }
    }
}

// A verified definition as it exists at one (repository, commit) pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SymbolRecord {
    pub code: String,
    pub file: String,
    pub line: usize,
}
