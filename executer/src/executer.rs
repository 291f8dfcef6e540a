//! Sequential execution of a template's compiled request steps.
//!
//! The [`Request`] trait decouples orchestration from protocol backends. Each
//! step receives the shared [`RunContext`] by mutable reference and returns the
//! exchanges it performed, in order. Tests use scripted requests that return
//! predetermined events without touching the network.

use anyhow::{Context, Result};
use tracing::{debug, info, instrument, warn};

use crate::core::context::{RunContext, ScanContext};
use crate::core::transcript::EventLog;
use crate::core::types::{OperatorResult, WrappedEvent};
use crate::io::config::ExecuterOptions;

/// A compiled protocol step.
///
/// Steps are shared by every `execute` call on an executer, which may run on
/// any worker thread, so implementors must be `Send + Sync`.
pub trait Request: Send + Sync {
    /// Prepare the step for execution. Called once, before any `execute`.
    fn compile(&mut self, options: &ExecuterOptions) -> Result<()>;

    /// Number of exchanges this step declares it will perform.
    fn requests(&self) -> usize;

    /// Run the step against `input`.
    ///
    /// Implementations may read and extend `ctx` so later steps observe the
    /// values. The returned events are processed in order; returning an error
    /// aborts the whole run.
    fn execute_with_results(
        &self,
        input: &ScanContext,
        ctx: &mut RunContext,
    ) -> Result<Vec<WrappedEvent>>;
}

/// Runs the requests of one template in order.
pub struct Executer {
    requests: Vec<Box<dyn Request>>,
    options: ExecuterOptions,
}

impl Executer {
    pub fn new(requests: Vec<Box<dyn Request>>, options: ExecuterOptions) -> Self {
        Self { requests, options }
    }

    /// Validate the options, then compile every request in list order,
    /// stopping at the first failure.
    #[instrument(skip_all, fields(template = %self.options.template_id, requests = self.requests.len()))]
    pub fn compile(&mut self) -> Result<()> {
        self.options.validate()?;
        for (index, request) in self.requests.iter_mut().enumerate() {
            request
                .compile(&self.options)
                .with_context(|| format!("compile request {index}"))?;
        }
        debug!("compiled all requests");
        Ok(())
    }

    pub fn options(&self) -> &ExecuterOptions {
        &self.options
    }

    /// Total number of exchanges the template will perform.
    pub fn requests(&self) -> usize {
        self.requests.iter().map(|request| request.requests()).sum()
    }

    /// Execute all requests against `input` and return the latest match, if any.
    ///
    /// Invalid options are rejected before any step runs. A step error aborts
    /// the run and is returned unchanged; a match found by an earlier step is
    /// dropped in that case.
    #[instrument(skip_all, fields(template = %self.options.template_id, input = %input.input))]
    pub fn execute(&self, input: &ScanContext) -> Result<Option<OperatorResult>> {
        self.options.validate()?;
        let mut ctx = RunContext::for_scan(input);
        let mut log = EventLog::new(self.options.transcript_window);
        let mut latest: Option<OperatorResult> = None;

        for (index, request) in self.requests.iter().enumerate() {
            let events = match request.execute_with_results(input, &mut ctx) {
                Ok(events) => events,
                Err(err) => {
                    warn!(step = index, err = %err, "request failed, aborting run");
                    return Err(err);
                }
            };
            debug!(step = index, events = events.len(), "request completed");

            for event in events {
                if let Some(result) = record_event(&mut log, event) {
                    latest = Some(result);
                }
            }
        }

        info!(
            events = log.len(),
            matched = latest.is_some(),
            "execution finished"
        );
        Ok(latest)
    }
}

/// Append the exchange to the log and, if it matched, attach a fresh transcript.
fn record_event(log: &mut EventLog, event: WrappedEvent) -> Option<OperatorResult> {
    let WrappedEvent {
        internal_event,
        operators_result,
    } = event;
    log.push(internal_event);

    let mut result = operators_result?;
    log.attach_transcript(&mut result);
    debug!(event = log.len(), "match recorded");
    Some(result)
}
