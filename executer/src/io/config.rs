//! Executer options, optionally stored as a TOML file.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::core::transcript::TRANSCRIPT_WINDOW;

/// Options shared by an executer and every request it compiles.
///
/// Missing fields default to the values used by the library API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ExecuterOptions {
    /// Identifier of the template the requests were compiled from.
    pub template_id: String,

    /// Number of most recent exchanges kept in a match transcript.
    pub transcript_window: usize,
}

impl Default for ExecuterOptions {
    fn default() -> Self {
        Self {
            template_id: String::new(),
            transcript_window: TRANSCRIPT_WINDOW,
        }
    }
}

impl ExecuterOptions {
    pub fn for_template(template_id: impl Into<String>) -> Self {
        Self {
            template_id: template_id.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.transcript_window == 0 {
            return Err(anyhow!("transcript_window must be > 0"));
        }
        Ok(())
    }
}

/// Load options from a TOML file.
///
/// If the file is missing, returns `ExecuterOptions::default()`.
pub fn load_options(path: &Path) -> Result<ExecuterOptions> {
    if !path.exists() {
        let options = ExecuterOptions::default();
        options.validate()?;
        return Ok(options);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let options: ExecuterOptions =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    options.validate()?;
    Ok(options)
}
