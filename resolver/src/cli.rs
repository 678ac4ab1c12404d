use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use tracing::info;

use crate::config::{
    DEFAULT_HOT_CAPACITY, DEFAULT_MAX_FALLBACK_CANDIDATES, DEFAULT_STORE_PATH, ResolverConfig,
    StoreLocation,
};
use crate::resolver::Resolver;
use crate::utils;

#[derive(Debug, Parser)]
#[command(
    name = "pointer-resolver",
    version,
    about = "Resolve C/C++ symbol definitions at a fixed commit"
)]
pub struct Cli {
    /// Path to the git repository to resolve against.
    #[arg(long = "repo", default_value = ".")]
    pub repo_path: PathBuf,
    /// Commit-ish to pin lookups to.
    #[arg(long, env = "POINTER_RESOLVER_COMMIT", default_value = "HEAD")]
    pub commit: String,
    /// SQLite file backing the warm cache tier.
    #[arg(long, env = "POINTER_RESOLVER_STORE", default_value = DEFAULT_STORE_PATH)]
    pub store: PathBuf,
    /// Entries kept in the in-process hot tier.
    #[arg(long, default_value_t = DEFAULT_HOT_CAPACITY)]
    pub hot_capacity: usize,
    /// Files tried when only the literal-name fallback finds the symbol.
    #[arg(long = "max-fallback", default_value_t = DEFAULT_MAX_FALLBACK_CANDIDATES)]
    pub max_fallback: usize,
    /// Symbol kind: function (or def), macro, global, typedef, struct, enum.
    #[arg(long, default_value = "function")]
    pub kind: String,
    /// Print lookup counters as a final JSON line.
    #[arg(long)]
    pub stats: bool,
    /// Increase logging verbosity (use -vv for trace level).
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
    /// Symbol names to look up.
    #[arg(required = true)]
    pub names: Vec<String>,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    utils::init_tracing(cli.verbose)?;

    let store = utils::absolute_path(&cli.store)
        .with_context(|| format!("failed to resolve store path {}", cli.store.display()))?;
    let config = ResolverConfig::new(cli.repo_path.clone(), cli.commit.clone())
        .with_store(StoreLocation::File(store))
        .with_hot_capacity(cli.hot_capacity)
        .with_max_fallback_candidates(cli.max_fallback);

    let resolver = Resolver::open(config).with_context(|| {
        format!(
            "failed to open resolver for {} at {}",
            cli.repo_path.display(),
            cli.commit
        )
    })?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut found = 0usize;
    for name in &cli.names {
        let record = resolver.lookup_str(name, &cli.kind);
        if record.is_some() {
            found += 1;
        }
        serde_json::to_writer(&mut out, &record).context("failed to encode record")?;
        writeln!(out)?;
    }

    if cli.stats {
        serde_json::to_writer(&mut out, &resolver.stats()).context("failed to encode stats")?;
        writeln!(out)?;
    }
    out.flush()?;

    info!(
        repo = resolver.repository(),
        commit = %resolver.commit(),
        kind = %cli.kind,
        requested = cli.names.len(),
        found,
        "lookups complete"
    );

    Ok(())
}
