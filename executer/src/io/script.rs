//! Recorded-exchange scripts and the request type that replays them.
//!
//! A replay script lists steps, each with the exchanges a protocol executor
//! previously observed. Replaying a script drives the executer exactly like a
//! live template would, without any network access.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow, bail};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::core::context::{RunContext, ScanContext};
use crate::core::types::{Event, OperatorResult, WrappedEvent};
use crate::executer::Request;
use crate::io::config::ExecuterOptions;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplayScript {
    pub id: String,
    pub steps: Vec<ReplayStep>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplayStep {
    pub name: String,
    /// Variables that must already be in the run context when the step starts.
    pub requires: Vec<String>,
    pub exchanges: Vec<RecordedExchange>,
    /// Error the step reports instead of replaying its exchanges.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fail: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordedExchange {
    pub event: Event,
    /// Variables merged into `previous` once the exchange is replayed.
    pub extract: BTreeMap<String, Value>,
    pub matched: bool,
}

impl ReplayScript {
    pub fn into_requests(self) -> Vec<Box<dyn Request>> {
        self.steps
            .into_iter()
            .map(|step| Box::new(ReplayRequest::new(step)) as Box<dyn Request>)
            .collect()
    }
}

/// Load a replay script from a JSON file.
pub fn load_script(path: &Path) -> Result<ReplayScript> {
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let script: ReplayScript =
        serde_json::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    Ok(script)
}

/// [`Request`] that yields the recorded exchanges of one script step.
#[derive(Debug, Clone)]
pub struct ReplayRequest {
    step: ReplayStep,
    template_id: Option<String>,
}

impl ReplayRequest {
    pub fn new(step: ReplayStep) -> Self {
        Self {
            step,
            template_id: None,
        }
    }
}

impl Request for ReplayRequest {
    fn compile(&mut self, options: &ExecuterOptions) -> Result<()> {
        if self.step.exchanges.is_empty() && self.step.fail.is_none() {
            bail!("step '{}' has no exchanges", self.step.name);
        }
        if self.step.requires.iter().any(|name| name.trim().is_empty()) {
            bail!("step '{}' requires an empty variable name", self.step.name);
        }
        self.template_id = Some(options.template_id.clone()).filter(|id| !id.is_empty());
        Ok(())
    }

    fn requests(&self) -> usize {
        self.step.exchanges.len()
    }

    fn execute_with_results(
        &self,
        _input: &ScanContext,
        ctx: &mut RunContext,
    ) -> Result<Vec<WrappedEvent>> {
        for name in &self.step.requires {
            if ctx.lookup(name).is_none() {
                bail!("step '{}': missing variable '{}'", self.step.name, name);
            }
        }
        if let Some(message) = &self.step.fail {
            return Err(anyhow!("step '{}': {}", self.step.name, message));
        }

        let mut events = Vec::with_capacity(self.step.exchanges.len());
        for exchange in &self.step.exchanges {
            ctx.previous.extend(exchange.extract.clone());
            let result = exchange.matched.then(|| OperatorResult {
                template_id: self.template_id.clone(),
                matched: true,
                extracts: exchange.extract.clone(),
                payload_req_resp: None,
            });
            events.push(WrappedEvent {
                internal_event: exchange.event.clone(),
                operators_result: result,
            });
        }
        debug!(step = %self.step.name, events = events.len(), "replayed step");
        Ok(events)
    }
}
