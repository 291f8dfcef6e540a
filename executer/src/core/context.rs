//! Scan input and the mutable per-run context threaded through request steps.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Named values shared between steps.
pub type Variables = BTreeMap<String, Value>;

/// Caller-supplied input for one scan of one target.
///
/// `input` is passed verbatim to every request; only `payloads` is read here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanContext {
    pub input: String,
    pub payloads: Variables,
}

impl ScanContext {
    pub fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            payloads: Variables::new(),
        }
    }

    pub fn with_payload(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.payloads.insert(key.into(), value.into());
        self
    }
}

/// Mutable state owned by a single `execute` call and lent to each step in turn.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunContext {
    /// Payload values, seeded from [`ScanContext::payloads`].
    pub dynamic_values: Variables,
    /// Variables extracted by earlier steps.
    pub previous: Variables,
}

impl RunContext {
    pub fn for_scan(input: &ScanContext) -> Self {
        let mut dynamic_values = Variables::new();
        dynamic_values.extend(
            input
                .payloads
                .iter()
                .map(|(key, value)| (key.clone(), value.clone())),
        );
        Self {
            dynamic_values,
            previous: Variables::new(),
        }
    }

    /// Look a variable up in `previous` first, then in `dynamic_values`.
    pub fn lookup(&self, name: &str) -> Option<&Value> {
        self.previous
            .get(name)
            .or_else(|| self.dynamic_values.get(name))
    }
}
