//! Logging initialization.
//!
//! Controlled by `AGECALC_LOG`:
//! - unset → no-op (tracing disabled, zero overhead)
//! - `"text"` → human-readable events to stderr
//! - `"json"` → JSON spans/events to stderr
//!
//! `RUST_LOG` filters events in both modes (default `info`). Stdout is never
//! written to, so `--format json` output stays machine-parseable.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;

/// Environment variable selecting the log sink.
pub const LOG_ENV: &str = "AGECALC_LOG";

/// Where log events go.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogMode {
    Off,
    Text,
    Json,
}

impl LogMode {
    /// Interpret an `AGECALC_LOG` value. Unknown values disable logging.
    #[must_use]
    pub fn from_env_value(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            None | Some("") => Self::Off,
            Some(v) if v.eq_ignore_ascii_case("json") => Self::Json,
            Some(v) if v.eq_ignore_ascii_case("text") => Self::Text,
            Some(other) => {
                eprintln!("warning: {LOG_ENV}={other} not recognised (use text or json); logging disabled");
                Self::Off
            }
        }
    }
}

/// Held in `main()` until exit.
pub struct TelemetryGuard {
    pub mode: LogMode,
}

/// Initialize logging from `AGECALC_LOG`.
#[must_use]
pub fn init() -> TelemetryGuard {
    let mode = LogMode::from_env_value(std::env::var(LOG_ENV).ok().as_deref());
    match mode {
        LogMode::Off => {}
        LogMode::Text => {
            tracing_subscriber::registry()
                .with(filter())
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_target(false),
                )
                .init();
        }
        LogMode::Json => {
            tracing_subscriber::registry()
                .with(filter())
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(std::io::stderr)
                        .with_span_events(FmtSpan::CLOSE),
                )
                .init();
        }
    }
    TelemetryGuard { mode }
}

fn filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}
