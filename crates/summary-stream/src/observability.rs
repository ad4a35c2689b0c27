use std::path::{Path, PathBuf};

use once_cell::sync::OnceCell;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;

static INIT: OnceCell<()> = OnceCell::new();

fn parse_bool_env(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" | "enabled" => Some(true),
        "0" | "false" | "no" | "off" | "disabled" => Some(false),
        _ => None,
    }
}

fn observability_enabled() -> bool {
    std::env::var("SUMMARY_STREAM_OBSERVABILITY")
        .ok()
        .and_then(|value| parse_bool_env(&value))
        .unwrap_or(true)
}

/// Filter used when neither `SUMMARY_STREAM_LOG_LEVEL` nor `RUST_LOG` parse.
/// The HTTP stack is kept quiet so chunk-level logs stay readable.
const DEFAULT_DIRECTIVE: &str = "summary_stream=info,reqwest=warn,hyper=warn,warn";

const DEFAULT_LOG_FILE: &str = "summary-stream.logs.jsonl";

fn resolve_env_filter(level: Option<String>) -> tracing_subscriber::EnvFilter {
    if let Some(level) = level
        && let Ok(filter) = tracing_subscriber::EnvFilter::try_new(level)
    {
        return filter;
    }
    tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_DIRECTIVE))
}

/// Splits a log path into the directory to create and the file name to
/// append to. A bare file name lands in the working directory.
fn log_file_target(path: &Path) -> (PathBuf, String) {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(DEFAULT_LOG_FILE)
        .to_owned();
    (dir, file_name)
}

/// Initialize logging once per process.
///
/// Environment variables:
/// - `SUMMARY_STREAM_OBSERVABILITY`: optional enable/disable flag (default enabled).
/// - `SUMMARY_STREAM_LOG_LEVEL`: optional filter override (`debug`, `summary_stream=debug`, ...).
/// - `SUMMARY_STREAM_JSON_LOG_PATH`: optional log file path. If set, session and
///   snapshot events are written there as JSON lines, one object per event.
///   If unset, logs go to stderr in a compact console format.
/// - `RUST_LOG`: fallback filter.
pub fn init_observability() {
    INIT.get_or_init(|| {
        if !observability_enabled() {
            return;
        }

        let env_filter = resolve_env_filter(std::env::var("SUMMARY_STREAM_LOG_LEVEL").ok());
        if let Ok(path_raw) = std::env::var("SUMMARY_STREAM_JSON_LOG_PATH") {
            let (dir, file_name) = log_file_target(Path::new(&path_raw));
            let _ = std::fs::create_dir_all(&dir);
            let writer = tracing_appender::rolling::never(dir, file_name);
            let json_layer = tracing_subscriber::fmt::layer()
                .json()
                .flatten_event(true)
                .with_writer(writer);
            let _ = tracing_subscriber::registry()
                .with(env_filter)
                .with(json_layer)
                .try_init();
        } else {
            let console_layer = tracing_subscriber::fmt::layer()
                .compact()
                .with_target(false)
                .with_writer(std::io::stderr);
            let _ = tracing_subscriber::registry()
                .with(env_filter)
                .with(console_layer)
                .try_init();
        }
    });
}
