//! Tracing setup for the desktop app: console output plus optional JSON files.
use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const LOG_FILE_PREFIX: &str = "overhoren";
const KEPT_LOG_FILES: usize = 30;

/// Windowing and GPU crates log every frame at debug level.
const UI_CRATE_DIRECTIVES: &[&str] = &["eframe=warn", "egui_winit=warn", "egui_glow=warn", "wgpu=warn", "winit=warn"];

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub log_level: String,
    pub enable_file_logs: bool,
    pub log_dir: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            enable_file_logs: false,
            log_dir: "./logs".to_string(),
        }
    }
}

/// `RUST_LOG` wins; otherwise the configured level with the UI crates turned down.
fn build_filter(log_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives(log_level)))
}

fn default_directives(log_level: &str) -> String {
    std::iter::once(log_level)
        .chain(UI_CRATE_DIRECTIVES.iter().copied())
        .collect::<Vec<_>>()
        .join(",")
}

fn file_appender(log_dir: &str) -> Result<RollingFileAppender, InitError> {
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .filename_suffix("log")
        .max_log_files(KEPT_LOG_FILES)
        .build(log_dir)
}

/// Installs the global subscriber. Returns `false` if one was already installed.
///
/// An unusable log directory only disables the file output.
pub fn init_tracing(config: &LogConfig) -> bool {
    let appender = config.enable_file_logs.then(|| file_appender(&config.log_dir));
    let (appender, file_error) = match appender {
        Some(Ok(appender)) => (Some(appender), None),
        Some(Err(e)) => (None, Some(e)),
        None => (None, None),
    };
    let file_layer =
        appender.map(|appender| fmt::layer().with_writer(appender).with_ansi(false).json().boxed());

    let installed = Registry::default()
        .with(build_filter(&config.log_level))
        .with(fmt::layer().with_target(true))
        .with(file_layer)
        .try_init()
        .is_ok();

    if let Some(e) = file_error {
        tracing::warn!(error = %e, dir = %config.log_dir, "File logging disabled");
    }
    installed
}
