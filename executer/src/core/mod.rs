//! Deterministic, pure logic shared by the executer.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! records and return deterministic outputs suitable for tests.

pub mod context;
pub mod packet;
pub mod transcript;
pub mod types;
