//! Test-only helpers: scripted requests, exchange builders and script fixtures.

use std::collections::VecDeque;
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result, anyhow};
use serde_json::Value;
use tempfile::TempDir;

use crate::core::context::{RunContext, ScanContext};
use crate::core::types::{Event, OperatorResult, WrappedEvent};
use crate::executer::Request;
use crate::io::config::ExecuterOptions;
use crate::io::script::ReplayScript;

/// What a [`ScriptedRequest`] does on one `execute_with_results` call.
#[derive(Debug, Clone, Default)]
pub struct ScriptedStep {
    pub events: Vec<WrappedEvent>,
    pub extract: Vec<(String, Value)>,
    pub requires: Vec<String>,
    pub fail: Option<String>,
}

impl ScriptedStep {
    pub fn events(events: Vec<WrappedEvent>) -> Self {
        Self {
            events,
            ..Self::default()
        }
    }

    pub fn fail(message: &str) -> Self {
        Self {
            fail: Some(message.to_string()),
            ..Self::default()
        }
    }

    /// Store `value` under `name` in `previous` after the step runs.
    pub fn extract(mut self, name: &str, value: Value) -> Self {
        self.extract.push((name.to_string(), value));
        self
    }

    /// Fail the step unless `name` is visible in the run context.
    pub fn require(mut self, name: &str) -> Self {
        self.requires.push(name.to_string());
        self
    }
}

/// In-memory [`Request`] that replays queued steps, one per call.
pub struct ScriptedRequest {
    steps: Mutex<VecDeque<ScriptedStep>>,
    declared: usize,
    compile_error: Option<String>,
    compiled: Arc<AtomicBool>,
    calls: Arc<AtomicUsize>,
    seen: Arc<Mutex<Vec<RunContext>>>,
}

impl ScriptedRequest {
    pub fn new(steps: Vec<ScriptedStep>) -> Self {
        let declared = steps.iter().map(|step| step.events.len()).sum();
        Self {
            steps: Mutex::new(steps.into()),
            declared,
            compile_error: None,
            compiled: Arc::new(AtomicBool::new(false)),
            calls: Arc::new(AtomicUsize::new(0)),
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_declared(mut self, declared: usize) -> Self {
        self.declared = declared;
        self
    }

    pub fn with_compile_error(mut self, message: &str) -> Self {
        self.compile_error = Some(message.to_string());
        self
    }

    /// Whether `compile` has succeeded.
    pub fn compiled(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.compiled)
    }

    /// Number of `execute_with_results` calls.
    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }

    /// Run context snapshots taken when each call starts.
    pub fn seen(&self) -> Arc<Mutex<Vec<RunContext>>> {
        Arc::clone(&self.seen)
    }
}

impl Request for ScriptedRequest {
    fn compile(&mut self, _options: &ExecuterOptions) -> Result<()> {
        if let Some(message) = &self.compile_error {
            return Err(anyhow!(message.clone()));
        }
        self.compiled.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn requests(&self) -> usize {
        self.declared
    }

    fn execute_with_results(
        &self,
        _input: &ScanContext,
        ctx: &mut RunContext,
    ) -> Result<Vec<WrappedEvent>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen
            .lock()
            .map_err(|_| anyhow!("seen contexts poisoned"))?
            .push(ctx.clone());

        let step = self
            .steps
            .lock()
            .map_err(|_| anyhow!("scripted steps poisoned"))?
            .pop_front()
            .ok_or_else(|| anyhow!("no scripted step left"))?;

        for name in &step.requires {
            if ctx.lookup(name).is_none() {
                return Err(anyhow!("missing variable {name}"));
            }
        }
        if let Some(message) = step.fail {
            return Err(anyhow!(message));
        }
        ctx.previous.extend(step.extract);
        Ok(step.events)
    }
}

/// A non-matching exchange numbered `n`.
pub fn exchange(n: usize) -> WrappedEvent {
    WrappedEvent::miss(
        Event::default()
            .with_request(format!("GET /{n} HTTP/1.1"))
            .with_response("HTTP/1.1 200 OK")
            .with_host(format!("http://host-{n}")),
    )
}

/// Mark an exchange as matched with an empty operator result.
pub fn hit(mut event: WrappedEvent) -> WrappedEvent {
    event.operators_result = Some(OperatorResult {
        matched: true,
        ..OperatorResult::default()
    });
    event
}

/// Write `script` as JSON into a fresh temp dir and return both.
pub fn script_fixture(script: &ReplayScript) -> Result<(TempDir, PathBuf)> {
    let dir = tempfile::tempdir().context("create tempdir")?;
    let path = dir.path().join("script.json");
    let mut buf = serde_json::to_string_pretty(script).context("serialize script")?;
    buf.push('\n');
    fs::write(&path, buf).with_context(|| format!("write {}", path.display()))?;
    Ok((dir, path))
}
