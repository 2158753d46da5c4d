//! sockgen — keep a rendered config file in sync with a dynamic set of
//! unix-socket backends.
//!
//! # Usage
//!
//! ```text
//! sockgen --template <file> --output <file>
//!     [--override-dir <dir>] [--command <cmd>] [--delay <secs>]
//!     [--permissions <octal>] [--once] [ROOTS...]
//! ```
//!
//! # Environment
//!
//! - `LISTEN_ADDR` — explicit listen addresses, space-separated, verbatim.
//! - `LISTEN_FDS` / `LISTEN_FDS_START` — socket-activation descriptor count
//!   and starting offset (default 3).
//! - `SOCKGEN_*` — exposed to templates as `Env` with the prefix stripped.

mod listen;

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use sockgen_daemon::WatchSet;
use sockgen_scanner::ScanConfig;
use sockgen_sync::{Pipeline, PipelineConfig};

/// Environment prefix selecting variables for the template's `Env` map.
const ENV_PREFIX: &str = "SOCKGEN_";

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "sockgen",
    version,
    about = "Publish a rendered config file for a dynamic set of unix-socket backends",
    long_about = None,
)]
struct Cli {
    /// Template file rendered against the discovered hosts.
    #[arg(long)]
    template: PathBuf,

    /// Output file to publish the rendered template to.
    #[arg(long)]
    output: PathBuf,

    /// Directory to place override files in.
    #[arg(long)]
    override_dir: Option<PathBuf>,

    /// Command to execute after each reconciliation.
    #[arg(long)]
    command: Option<String>,

    /// Seconds to wait for further changes before reconciling.
    #[arg(long, default_value_t = 5)]
    delay: u64,

    /// Reconcile once and exit instead of watching for changes.
    #[arg(long)]
    once: bool,

    /// Socket permission bits to enforce, in octal (e.g. 0666). Additive
    /// only: existing bits are never removed.
    #[arg(long, value_parser = parse_octal_mode)]
    permissions: Option<u32>,

    /// Root paths to scan for `<vhost-dir>/<socket>` entries.
    #[arg(default_value = ".")]
    roots: Vec<PathBuf>,
}

fn parse_octal_mode(s: &str) -> std::result::Result<u32, String> {
    let digits = s.trim_start_matches("0o");
    u32::from_str_radix(digits, 8).map_err(|e| format!("invalid octal mode '{s}': {e}"))
}

// ---------------------------------------------------------------------------
// Startup helpers
// ---------------------------------------------------------------------------

fn env_snapshot() -> BTreeMap<String, String> {
    filter_env(std::env::vars())
}

/// Select `SOCKGEN_*` variables and strip the prefix from the keys.
fn filter_env(vars: impl Iterator<Item = (String, String)>) -> BTreeMap<String, String> {
    vars.filter_map(|(key, value)| {
        key.strip_prefix(ENV_PREFIX)
            .map(|stripped| (stripped.to_string(), value))
    })
    .collect()
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).with_target(false).try_init();
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    // Startup-fatal checks: listener resolution and template readability.
    let listen_addrs = listen::resolve().context("resolving listen addresses")?;
    let env = env_snapshot();
    fs::metadata(&cli.template)
        .with_context(|| format!("could not read template file {}", cli.template.display()))?;

    let config = PipelineConfig {
        template_file: cli.template.clone(),
        output_file: cli.output,
        trigger_command: cli.command,
        scan: ScanConfig {
            roots: cli.roots.clone(),
            override_dir: cli.override_dir,
            socket_permissions: cli.permissions,
        },
    };
    let pipeline = Pipeline::new(config, listen_addrs, env);

    // Initial synchronous cycle.
    let initial = pipeline.run_cycle();
    if cli.once {
        let outcome = initial.context("reconciliation failed")?;
        tracing::info!(hosts = outcome.hosts, "single run complete");
        return Ok(());
    }
    if let Err(err) = initial {
        // In continuous mode a failed cycle is logged; the next filesystem
        // change is the retry.
        tracing::error!(error = %err, "initial reconciliation cycle failed");
    }

    let watch = WatchSet {
        roots: cli.roots,
        template_file: cli.template,
    };
    sockgen_daemon::start_blocking(pipeline, watch, Duration::from_secs(cli.delay))
        .context("daemon runtime failed")?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
