//! I/O helpers for executer commands.

pub mod config;
pub mod script;
