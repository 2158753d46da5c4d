//! The reconciliation pipeline — one full discover/render/publish cycle.
//!
//! ## Cycle steps, each gating the next
//!
//! 1. Scan all configured roots → fresh host map (per-entry failures are
//!    absorbed inside the scanner).
//! 2. Build this cycle's template input from the static snapshot + hosts.
//! 3. Read and parse the template file.
//! 4. Render into an in-memory buffer.
//! 5. Publish atomically to the output file.
//! 6. Run the trigger command, best-effort.
//!
//! A failure in steps 3–5 aborts the cycle and leaves the previously
//! published output untouched; the caller logs it and waits for the next
//! change notification.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Instant;

use sockgen_core::publish::{self, WriteResult};
use sockgen_renderer::{TemplateEngine, TemplateInput};
use sockgen_scanner::{scan, ScanConfig};

use crate::error::PipelineError;
use crate::trigger::{run_trigger, TriggerOutcome};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Everything a pipeline needs, constructed once at startup and owned by the
/// pipeline — inner components never reach for ambient state.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Template file, re-read every cycle.
    pub template_file: PathBuf,
    /// Output file, replaced atomically on change.
    pub output_file: PathBuf,
    /// Optional trigger command, tokenized and run after a publish.
    pub trigger_command: Option<String>,
    /// Scanner configuration (roots, override dir, socket permissions).
    pub scan: ScanConfig,
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// Summary of one completed cycle.
#[derive(Debug)]
pub struct CycleOutcome {
    /// Number of hosts in this cycle's final map.
    pub hosts: usize,
    /// Whether the output file was rewritten or already current.
    pub write: WriteResult,
    /// What happened to the trigger command.
    pub trigger: TriggerOutcome,
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// The reconciliation pipeline. Cheap to share: holds only configuration and
/// the static template input computed at startup.
pub struct Pipeline {
    config: PipelineConfig,
    base_input: TemplateInput,
}

impl Pipeline {
    /// Build a pipeline around `config` and the process-lifetime static
    /// template inputs (listen addresses and filtered environment).
    pub fn new(
        config: PipelineConfig,
        listen_addrs: Vec<String>,
        env: BTreeMap<String, String>,
    ) -> Self {
        Pipeline {
            config,
            base_input: TemplateInput::new(listen_addrs, env),
        }
    }

    /// Execute exactly one cycle, synchronously.
    ///
    /// The host map and rendered buffer built here are owned by this call
    /// and discarded when it returns; nothing carries over to the next cycle.
    pub fn run_cycle(&self) -> Result<CycleOutcome, PipelineError> {
        let started = Instant::now();
        tracing::info!("scanning");

        let hosts = scan(&self.config.scan);
        let input = self.base_input.with_hosts(hosts);

        let engine = TemplateEngine::load(&self.config.template_file)?;
        let rendered = engine.render(&input)?;
        let write = publish::replace_file(&self.config.output_file, rendered.as_bytes())?;

        let trigger = match self.config.trigger_command.as_deref() {
            Some(command) => run_trigger(command),
            None => TriggerOutcome::Skipped,
        };

        let outcome = CycleOutcome {
            hosts: input.hosts.len(),
            write,
            trigger,
        };
        tracing::info!(
            hosts = outcome.hosts,
            written = matches!(outcome.write, WriteResult::Written { .. }),
            duration_ms = started.elapsed().as_millis() as u64,
            "scan complete",
        );
        Ok(outcome)
    }
}
