//! Tracing setup for the `executer` binary.
//!
//! The library emits spans around `Executer::compile`, `Executer::execute` and
//! `run_replay`, plus per-step `debug!` events (events yielded, matches
//! recorded) and a `warn!` when a step aborts the run. The binary routes all
//! of it to stderr so stdout carries only the replay result JSON.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Directive used when `RUST_LOG` is unset: only aborted runs are reported.
const DEFAULT_DIRECTIVE: &str = "warn";

/// Install the stderr subscriber.
///
/// `RUST_LOG=executer=debug` shows each step and every recorded match.
pub fn init() {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::filter::LevelFilter;

    #[test]
    fn default_filter_reports_warnings_only() {
        let filter = EnvFilter::new(DEFAULT_DIRECTIVE);
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::WARN));
    }
}
