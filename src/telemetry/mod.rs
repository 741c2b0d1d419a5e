//! Rendering of trace events and errors for human-readable output.
//!
//! Kept close to the teacher's plain-text formatter: a small trait so sinks
//! (stdout, a log file, a test buffer) can share one rendering rule, with a
//! single ANSI-colored reference implementation.

use crate::error::SimError;
use crate::trace::TraceEvent;

pub const CONTEXT_COLOR: &str = "\x1b[32m"; // green
pub const LINE_COLOR: &str = "\x1b[35m"; // magenta
pub const RESET_COLOR: &str = "\x1b[0m";

/// Rendered output for a single telemetry item.
#[derive(Clone, Debug, Default)]
pub struct EventRender {
    pub context: Option<String>,
    pub lines: Vec<String>,
}

impl EventRender {
    pub fn join_lines(&self) -> String {
        self.lines.join("")
    }
}

pub trait TelemetryFormatter: Send + Sync {
    fn render_event(&self, event: &TraceEvent) -> EventRender;
    fn render_error(&self, error: &SimError) -> EventRender;
}

pub struct PlainFormatter;

impl TelemetryFormatter for PlainFormatter {
    fn render_event(&self, event: &TraceEvent) -> EventRender {
        let line = format!("{LINE_COLOR}{}{RESET_COLOR}\n", event);
        EventRender {
            context: Some(event.kind_label().to_string()),
            lines: vec![line],
        }
    }

    fn render_error(&self, error: &SimError) -> EventRender {
        let mut lines = vec![format!("{CONTEXT_COLOR}error{RESET_COLOR}\n")];
        lines.push(format!("{LINE_COLOR}  {}{RESET_COLOR}\n", error));
        let mut source = std::error::Error::source(error);
        while let Some(cause) = source {
            lines.push(format!("{LINE_COLOR}  caused by: {}{RESET_COLOR}\n", cause));
            source = cause.source();
        }
        EventRender {
            context: Some("error".to_string()),
            lines,
        }
    }
}

/// Initialize a process-wide `tracing` subscriber for binaries and tests.
///
/// Respects `RUST_LOG` via `tracing_subscriber::EnvFilter`; defaults to `info`
/// when unset. Safe to call more than once (later calls are no-ops).
pub fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).with_target(false).try_init();
}
