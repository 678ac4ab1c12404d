pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod extractors;
pub mod git;
pub mod locator;
pub mod models;
pub mod patterns;
pub mod resolver;
pub mod store;
pub mod utils;

#[cfg(test)]
mod test_support;

pub use cli::run;
pub use config::{ResolverConfig, StoreLocation};
pub use error::{CandidateError, ResolverError};
pub use models::{SymbolKind, SymbolRecord};
pub use resolver::{Resolver, ResolverStats};
