//! Subscriber setup for applications embedding frontal-bundler.
//!
//! Only available with the `logging` feature. Without it the crate emits
//! `tracing` events and leaves subscribers to the caller.

use std::sync::atomic::{AtomicBool, Ordering};

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Crates whose events the level applies to.
const FRONTAL_TARGETS: &[&str] = &["frontal_bundler", "frontal_config"];

static INSTALLED: AtomicBool = AtomicBool::new(false);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Silent,
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn directive(self) -> &'static str {
        match self {
            LogLevel::Silent => "off",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }

    /// Filter applying this level to the frontal crates; everything else
    /// only reports errors.
    pub fn filter(self) -> EnvFilter {
        let mut directives = vec!["error".to_string()];
        directives.extend(
            FRONTAL_TARGETS
                .iter()
                .map(|target| format!("{target}={}", self.directive())),
        );
        EnvFilter::new(directives.join(","))
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "silent" | "off" => Ok(LogLevel::Silent),
            "error" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            other => Err(format!("unknown log level `{other}`")),
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.directive())
    }
}

/// Install a compact stderr subscriber at `level`. Returns `false` when a
/// subscriber was installed before, by this crate or anyone else.
pub fn init_logging(level: LogLevel) -> bool {
    install(level.filter())
}

/// Like [`init_logging`], but `RUST_LOG` wins when it is set.
pub fn init_logging_from_env() -> bool {
    install(EnvFilter::try_from_default_env().unwrap_or_else(|_| LogLevel::default().filter()))
}

fn install(filter: EnvFilter) -> bool {
    if INSTALLED.swap(true, Ordering::SeqCst) {
        return false;
    }
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_target(false).without_time())
        .try_init()
        .is_ok()
}
