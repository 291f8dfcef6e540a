//! Sequential request orchestration for compiled templates.
//!
//! This crate runs an ordered list of compiled request steps, threads a shared
//! run context between them, and, whenever an exchange is classified as a
//! match, rebuilds a bounded transcript of the exchanges that led to it. The
//! architecture keeps a strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (event records, packet
//!   reconstruction, transcript assembly). No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting operations (configuration files, replay scripts).
//!
//! Orchestration modules ([`executer`], [`replay`]) coordinate core logic with
//! request collaborators to implement the library API and CLI commands.

pub mod core;
pub mod executer;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod replay;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use crate::executer::{Executer, Request};
