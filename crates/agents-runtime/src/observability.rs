use std::path::{Path, PathBuf};

use once_cell::sync::OnceCell;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;

static INIT: OnceCell<()> = OnceCell::new();

const DEFAULT_FILTER: &str = "warn";
const DEFAULT_LOG_FILE: &str = "agents.logs.jsonl";

/// Where log records are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogSink {
    /// Compact human-readable lines on stderr, leaving stdout to rendered text.
    Stderr,
    /// One JSON object per line, appended to `dir/file_name`.
    JsonFile { dir: PathBuf, file_name: String },
}

/// Logging settings, usually read from `AGENTS_*` environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservabilityConfig {
    pub enabled: bool,
    /// Filter directives such as `info` or `agents_runtime=debug`.
    pub filter: String,
    pub sink: LogSink,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            filter: DEFAULT_FILTER.to_string(),
            sink: LogSink::Stderr,
        }
    }
}

impl ObservabilityConfig {
    /// Reads the process environment.
    ///
    /// - `AGENTS_OBSERVABILITY_ENABLED` / `AGENTS_OBSERVABILITY`: on/off flag (default on).
    /// - `AGENTS_LOG_LEVEL`: filter; falls back to `RUST_LOG`, then `warn`.
    /// - `AGENTS_JSON_LOG_PATH`: when set, logs go to that file as JSONL.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let enabled = ["AGENTS_OBSERVABILITY_ENABLED", "AGENTS_OBSERVABILITY"]
            .into_iter()
            .find_map(|key| read(key))
            .map(|value| parse_flag(&value).unwrap_or(true))
            .unwrap_or(true);

        // An unparsable AGENTS_LOG_LEVEL is skipped rather than silencing logs.
        let filter = read("AGENTS_LOG_LEVEL")
            .filter(|level| EnvFilter::try_new(level).is_ok())
            .or_else(|| read("RUST_LOG"))
            .unwrap_or_else(|| DEFAULT_FILTER.to_string());

        let sink = read("AGENTS_JSON_LOG_PATH")
            .map(|path| json_sink(Path::new(&path)))
            .unwrap_or(LogSink::Stderr);

        Self {
            enabled,
            filter,
            sink,
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" | "enabled" => Some(true),
        "0" | "false" | "no" | "off" | "disabled" => Some(false),
        _ => None,
    }
}

fn json_sink(path: &Path) -> LogSink {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
        .to_path_buf();
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(DEFAULT_LOG_FILE)
        .to_string();
    LogSink::JsonFile { dir, file_name }
}

/// Initializes logging from the environment, once per process.
pub fn init_observability() {
    init_with(ObservabilityConfig::from_env());
}

/// Initializes logging with explicit settings. Only the first call in a
/// process has any effect.
pub fn init_with(config: ObservabilityConfig) {
    INIT.get_or_init(|| {
        if !config.enabled {
            return;
        }
        let filter =
            EnvFilter::try_new(&config.filter).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
        let registry = tracing_subscriber::registry().with(filter);

        // Another subscriber may already be installed by the host application.
        let _ = match config.sink {
            LogSink::Stderr => registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .compact()
                        .with_target(false)
                        .with_writer(std::io::stderr),
                )
                .try_init(),
            LogSink::JsonFile { dir, file_name } => {
                let _ = std::fs::create_dir_all(&dir);
                registry
                    .with(
                        tracing_subscriber::fmt::layer()
                            .json()
                            .with_current_span(true)
                            .with_span_list(true)
                            .with_target(false)
                            .with_writer(tracing_appender::rolling::never(dir, file_name)),
                    )
                    .try_init()
            }
        };
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> ObservabilityConfig {
        let vars: HashMap<&str, &str> = vars.iter().copied().collect();
        ObservabilityConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string()))
    }

    #[test]
    fn defaults_to_warn_on_stderr() {
        assert_eq!(config(&[]), ObservabilityConfig::default());
    }

    #[test]
    fn flag_accepts_common_spellings() {
        assert!(!config(&[("AGENTS_OBSERVABILITY", " Disabled ")]).enabled);
        assert!(config(&[("AGENTS_OBSERVABILITY_ENABLED", "yes")]).enabled);
        assert!(config(&[("AGENTS_OBSERVABILITY", "maybe")]).enabled);
    }

    #[test]
    fn log_level_wins_over_rust_log_unless_invalid() {
        let both = config(&[("AGENTS_LOG_LEVEL", "debug"), ("RUST_LOG", "info")]);
        assert_eq!(both.filter, "debug");
        let invalid = config(&[
            ("AGENTS_LOG_LEVEL", "agents_runtime=loud"),
            ("RUST_LOG", "info"),
        ]);
        assert_eq!(invalid.filter, "info");
    }

    #[test]
    fn json_path_splits_into_dir_and_file() {
        let nested = config(&[("AGENTS_JSON_LOG_PATH", "logs/run.jsonl")]);
        assert_eq!(
            nested.sink,
            LogSink::JsonFile {
                dir: PathBuf::from("logs"),
                file_name: "run.jsonl".into()
            }
        );
        let bare = config(&[("AGENTS_JSON_LOG_PATH", "run.jsonl")]);
        assert_eq!(
            bare.sink,
            LogSink::JsonFile {
                dir: PathBuf::from("."),
                file_name: "run.jsonl".into()
            }
        );
    }

    #[test]
    fn init_is_idempotent() {
        init_with(ObservabilityConfig {
            enabled: false,
            ..ObservabilityConfig::default()
        });
        init_observability();
        assert!(INIT.get().is_some());
    }
}
