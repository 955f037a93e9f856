// ============================================
// logger.rs - Logging Configuration
// ============================================

use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::LoggingConfig;

/// Logger configuration
#[derive(Debug, Clone)]
pub struct LoggerConfig {
    pub level: String,
    pub file_path: Option<PathBuf>,
    pub json_format: bool,
    pub with_timestamps: bool,
    pub with_caller: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            file_path: None,
            json_format: false,
            with_timestamps: true,
            with_caller: false,
        }
    }
}

impl LoggerConfig {
    pub fn from_logging(logging: &LoggingConfig, file_path: Option<PathBuf>) -> Self {
        Self {
            level: logging.level.clone(),
            file_path,
            json_format: logging.json_format,
            with_timestamps: logging.timestamps,
            with_caller: logging.caller_info,
        }
    }
}

type BoxedLayer = Box<dyn Layer<tracing_subscriber::Registry> + Send + Sync>;

/// Build a fmt layer honoring the format flags; logs go to stderr so they
/// never mix with converted text on stdout.
fn fmt_layer<W>(config: &LoggerConfig, writer: W, ansi: bool) -> BoxedLayer
where
    W: for<'w> fmt::MakeWriter<'w> + Send + Sync + 'static,
{
    let layer = fmt::layer()
        .with_ansi(ansi)
        .with_writer(writer)
        .with_target(config.with_caller);

    match (config.json_format, config.with_timestamps) {
        (true, true) => layer.json().boxed(),
        (true, false) => layer.json().without_time().boxed(),
        (false, true) => layer.boxed(),
        (false, false) => layer.without_time().boxed(),
    }
}

/// Initialize logging system
pub fn init(config: LoggerConfig) -> Result<Option<WorkerGuard>> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.level));

    let mut layers: Vec<BoxedLayer> = vec![fmt_layer(&config, std::io::stderr, true)];
    let mut guard = None;

    if let Some(file_path) = &config.file_path {
        let dir = file_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        let file_name = file_path
            .file_name()
            .context("Log file path has no file name")?;

        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create log directory {:?}", dir))?;

        let file_appender = tracing_appender::rolling::daily(&dir, file_name);
        let (non_blocking, file_guard) = tracing_appender::non_blocking(file_appender);
        guard = Some(file_guard);

        layers.push(fmt_layer(&config, non_blocking, false));
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(env_filter)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(guard)
}

pub fn parse_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" | "warning" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

/// Raise `base` by `verbosity` steps (-v, -vv...), capped at TRACE.
pub fn bump_level(base: &str, verbosity: u8) -> Level {
    const ORDER: [Level; 5] = [Level::ERROR, Level::WARN, Level::INFO, Level::DEBUG, Level::TRACE];
    let base = parse_level(base);
    let index = ORDER.iter().position(|l| *l == base).unwrap_or(2);
    ORDER[(index + verbosity as usize).min(ORDER.len() - 1)]
}
