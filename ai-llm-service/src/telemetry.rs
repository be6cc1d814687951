//! Console formatting layer shared by the service crates.

use std::io::{self, IsTerminal};

use tracing::Level;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{EnvFilter, Layer, filter, fmt};

/// Crate target prefix used to filter only library-originated logs.
pub const TARGET_PREFIX: &str = "ai_llm_service";

/// Targets rendered by [`layer`]: this library plus the crates built on it.
pub const SERVICE_TARGETS: &[&str] = &[
    TARGET_PREFIX,
    "rag_store",
    "question_engine",
    "api",
    "exam_prep_backend",
];

/// RFC3339 UTC timer implemented via `chrono`.
/// Example output: `2025-09-12T10:20:30Z`
#[derive(Clone, Debug, Default)]
struct ChronoRfc3339Utc;

impl FormatTime for ChronoRfc3339Utc {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        let now = chrono::Utc::now();
        let s = now.to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
        w.write_str(&s)
    }
}

fn is_service_target(target: &str) -> bool {
    SERVICE_TARGETS
        .iter()
        .any(|p| target == *p || target.starts_with(&format!("{p}::")))
}

/// Formatting layer that renders only events emitted by the service crates.
///
/// - RFC3339 UTC timestamps
/// - Compact single-line format with `file:line` and target
/// - Span close events (duration at the end of spans)
/// - ANSI colors only when stdout is a terminal
pub fn layer<S>() -> impl Layer<S> + Send + Sync
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    let use_ansi = io::stdout().is_terminal();
    let only_service = filter::filter_fn(|meta| is_service_target(meta.target()));

    fmt::layer()
        .with_timer(ChronoRfc3339Utc)
        .with_level(true)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(use_ansi)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .event_format(fmt::format().compact().with_source_location(true))
        .with_filter(only_service)
}

/// `EnvFilter` from `RUST_LOG`, or `default` when unset/invalid, raised to
/// `level` for the service crates.
pub fn env_filter_with_level(default: &str, level: Level) -> EnvFilter {
    let mut f = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    for target in SERVICE_TARGETS {
        if let Ok(d) = format!("{target}={}", LevelFilter::from_level(level)).parse() {
            f = f.add_directive(d);
        }
    }
    f
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_targets_match_by_module_boundary() {
        assert!(is_service_target("question_engine::pipeline"));
        assert!(is_service_target("api"));
        assert!(!is_service_target("apiary"));
        assert!(!is_service_target("hyper::proto"));
    }
}
