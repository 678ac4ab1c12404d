use std::env;
use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};

pub fn init_tracing(verbosity: u8) -> Result<()> {
    let default_directive = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    let subscriber = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        warn!("tracing subscriber already initialized");
    }

    Ok(())
}

/// Absolute form of `path`, canonicalized when it exists. The result doubles
/// as the repository identity in cache keys.
pub fn absolute_path(path: &Path) -> std::io::Result<PathBuf> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        env::current_dir()?.join(path)
    };
    Ok(absolute.canonicalize().unwrap_or(absolute))
}

pub fn count_newlines(bytes: &[u8]) -> usize {
    bytes.iter().filter(|b| **b == b'\n').count()
}

/// Joins a repo-relative git path (always `/`-separated) onto the repo root.
pub fn join_repo_path(root: &Path, relative: &str) -> String {
    relative
        .split('/')
        .filter(|part| !part.is_empty())
        .fold(root.to_path_buf(), |acc, part| acc.join(part))
        .display()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_newlines() {
        assert_eq!(count_newlines(b""), 0);
        assert_eq!(count_newlines(b"a\nb\n\nc"), 3);
    }

    #[test]
    fn joins_git_paths_onto_root() {
        let joined = join_repo_path(Path::new("/repo"), "src/lib/a.c");
        assert_eq!(PathBuf::from(joined), Path::new("/repo").join("src").join("lib").join("a.c"));
    }

    #[test]
    fn relative_paths_become_absolute() {
        let dir = tempfile::TempDir::new().unwrap();
        let resolved = absolute_path(dir.path()).unwrap();
        assert!(resolved.is_absolute());
        assert_eq!(resolved, dir.path().canonicalize().unwrap());
        assert!(absolute_path(Path::new("does-not-exist")).unwrap().is_absolute());
    }
}
