//! Orchestration for `executer replay`.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, instrument};

use crate::core::context::ScanContext;
use crate::core::types::OperatorResult;
use crate::executer::Executer;
use crate::io::config::{ExecuterOptions, load_options};
use crate::io::script::load_script;

/// Summary of one replayed script.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplayOutcome {
    pub template_id: String,
    /// Exchanges declared by all steps.
    pub requests: usize,
    pub result: Option<OperatorResult>,
}

/// Load `script_path`, compile its steps and execute them once against `input`.
///
/// Options come from `config_path` when given. An empty `template_id` falls
/// back to the script id.
#[instrument(skip_all, fields(script = %script_path.display()))]
pub fn run_replay(
    script_path: &Path,
    config_path: Option<&Path>,
    input: &ScanContext,
) -> Result<ReplayOutcome> {
    let script = load_script(script_path)?;
    let mut options = match config_path {
        Some(path) => load_options(path)?,
        None => ExecuterOptions::default(),
    };
    if options.template_id.is_empty() {
        options.template_id = script.id.clone();
    }

    let mut executer = Executer::new(script.into_requests(), options);
    executer
        .compile()
        .with_context(|| format!("compile {}", script_path.display()))?;
    let requests = executer.requests();
    let result = executer.execute(input)?;

    info!(requests, matched = result.is_some(), "replay finished");
    Ok(ReplayOutcome {
        template_id: executer.options().template_id.clone(),
        requests,
        result,
    })
}
