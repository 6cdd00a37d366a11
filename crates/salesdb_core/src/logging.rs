//! Logging bootstrap and the injected logging capability.
//!
//! # Responsibility
//! - Start the process file logger once, from an explicit `LoggingConfig`.
//! - Provide `EventLogger`, the capability components log through instead of
//!   reaching for the process-wide logger themselves.
//!
//! # Invariants
//! - `init_logging` is idempotent for an identical config and never panics.
//! - A second init with a different level or directory is rejected.
//! - Log lines carry metadata `key=value` pairs, never row contents.

use flexi_logger::{Cleanup, Criterion, FileSpec, Logger, LoggerHandle, Naming, WriteMode};
use log::{error, info, Level, Log, Metadata, Record};
use once_cell::sync::OnceCell;
use std::error::Error;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const LOG_FILE_BASENAME: &str = "salesdb";
const EVENT_TARGET: &str = "salesdb";
const DEFAULT_MAX_FILE_BYTES: u64 = 10 * 1024 * 1024;
const DEFAULT_MAX_FILES: usize = 5;
const MAX_PANIC_PAYLOAD_CHARS: usize = 160;

static ACTIVE: OnceCell<ActiveLogger> = OnceCell::new();
static PANIC_HOOK_INSTALLED: OnceCell<()> = OnceCell::new();

struct ActiveLogger {
    config: LoggingConfig,
    _handle: LoggerHandle,
}

/// File logger settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    pub level: Level,
    /// Absolute directory for rolling log files. Created if missing.
    pub log_dir: PathBuf,
    pub max_file_bytes: u64,
    pub max_files: usize,
}

impl LoggingConfig {
    pub fn new(level: Level, log_dir: impl AsRef<Path>) -> Self {
        Self {
            level,
            log_dir: log_dir.as_ref().to_path_buf(),
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
            max_files: DEFAULT_MAX_FILES,
        }
    }

    /// Parses a textual level (`trace|debug|info|warn|error`, any case).
    pub fn parse(level: &str, log_dir: impl AsRef<Path>) -> Result<Self, LoggingError> {
        Ok(Self::new(parse_level(level)?, log_dir))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoggingError {
    UnsupportedLevel(String),
    RelativeLogDir(PathBuf),
    CreateDir { path: PathBuf, message: String },
    AlreadyInitialized { active: String, requested: String },
    Backend(String),
}

impl fmt::Display for LoggingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedLevel(level) => write!(
                f,
                "unsupported log level `{level}`; expected trace|debug|info|warn|error"
            ),
            Self::RelativeLogDir(path) => {
                write!(f, "log_dir must be an absolute path, got `{}`", path.display())
            }
            Self::CreateDir { path, message } => {
                write!(f, "failed to create log directory `{}`: {message}", path.display())
            }
            Self::AlreadyInitialized { active, requested } => write!(
                f,
                "logging already initialized with `{active}`; refusing to switch to `{requested}`"
            ),
            Self::Backend(message) => write!(f, "failed to start logger: {message}"),
        }
    }
}

impl Error for LoggingError {}

/// Starts the rolling file logger and installs the panic hook.
///
/// # Errors
/// - `RelativeLogDir` when `log_dir` is empty or not absolute.
/// - `AlreadyInitialized` when a different level, directory or rotation
///   setting is active.
/// - `CreateDir` / `Backend` when the file backend cannot start.
pub fn init_logging(config: &LoggingConfig) -> Result<(), LoggingError> {
    if config.log_dir.as_os_str().is_empty() || !config.log_dir.is_absolute() {
        return Err(LoggingError::RelativeLogDir(config.log_dir.clone()));
    }

    let active = &ACTIVE.get_or_try_init(|| start_backend(config))?.config;
    if active.log_dir != config.log_dir {
        return Err(LoggingError::AlreadyInitialized {
            active: active.log_dir.display().to_string(),
            requested: config.log_dir.display().to_string(),
        });
    }
    if active.level != config.level {
        return Err(LoggingError::AlreadyInitialized {
            active: active.level.as_str().to_ascii_lowercase(),
            requested: config.level.as_str().to_ascii_lowercase(),
        });
    }
    if active.max_file_bytes != config.max_file_bytes || active.max_files != config.max_files {
        return Err(LoggingError::AlreadyInitialized {
            active: rotation_summary(active),
            requested: rotation_summary(config),
        });
    }

    Ok(())
}

/// Returns `(level, log_dir)` of the active file logger, if any.
pub fn logging_status() -> Option<(Level, PathBuf)> {
    ACTIVE
        .get()
        .map(|active| (active.config.level, active.config.log_dir.clone()))
}

/// `Debug` for debug builds, `Info` for release builds.
pub fn default_log_level() -> Level {
    if cfg!(debug_assertions) {
        Level::Debug
    } else {
        Level::Info
    }
}

fn start_backend(config: &LoggingConfig) -> Result<ActiveLogger, LoggingError> {
    std::fs::create_dir_all(&config.log_dir).map_err(|err| LoggingError::CreateDir {
        path: config.log_dir.clone(),
        message: err.to_string(),
    })?;

    let level_filter = config.level.as_str().to_ascii_lowercase();
    let handle = Logger::try_with_str(&level_filter)
        .map_err(|err| LoggingError::Backend(err.to_string()))?
        .log_to_file(
            FileSpec::default()
                .directory(config.log_dir.as_path())
                .basename(LOG_FILE_BASENAME),
        )
        .rotate(
            Criterion::Size(config.max_file_bytes),
            Naming::Numbers,
            Cleanup::KeepLogFiles(config.max_files),
        )
        .write_mode(WriteMode::BufferAndFlush)
        .append()
        // [YYYY-MM-DD HH:MM:SS.ffffff TZ] LEVEL [module] file:line: message
        .format_for_files(flexi_logger::detailed_format)
        .start()
        .map_err(|err| LoggingError::Backend(err.to_string()))?;

    install_panic_hook_once();

    info!(
        "event=logging_init module=logging status=ok level={} log_dir={} version={}",
        level_filter,
        config.log_dir.display(),
        env!("CARGO_PKG_VERSION")
    );

    Ok(ActiveLogger {
        config: config.clone(),
        _handle: handle,
    })
}

fn rotation_summary(config: &LoggingConfig) -> String {
    format!(
        "max_file_bytes={} max_files={}",
        config.max_file_bytes, config.max_files
    )
}

/// Logging capability handed to components at construction.
///
/// Wraps any `log::Log` implementation. `EventLogger::global()` forwards to
/// the backend installed for the process (for example by `init_logging`).
#[derive(Clone)]
pub struct EventLogger {
    sink: Arc<dyn Log>,
}

impl EventLogger {
    pub fn new(sink: Arc<dyn Log>) -> Self {
        Self { sink }
    }

    /// Forwards to the process-wide `log` backend.
    pub fn global() -> Self {
        Self::new(Arc::new(GlobalSink))
    }

    pub fn error(&self, args: fmt::Arguments<'_>) {
        self.emit(Level::Error, args);
    }

    pub fn debug(&self, args: fmt::Arguments<'_>) {
        self.emit(Level::Debug, args);
    }

    fn emit(&self, level: Level, args: fmt::Arguments<'_>) {
        let record = Record::builder()
            .level(level)
            .target(EVENT_TARGET)
            .args(args)
            .build();
        if self.sink.enabled(record.metadata()) {
            self.sink.log(&record);
        }
    }
}

impl fmt::Debug for EventLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventLogger").finish_non_exhaustive()
    }
}

struct GlobalSink;

impl Log for GlobalSink {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= log::max_level() && log::logger().enabled(metadata)
    }

    fn log(&self, record: &Record<'_>) {
        log::logger().log(record);
    }

    fn flush(&self) {
        log::logger().flush();
    }
}

fn parse_level(level: &str) -> Result<Level, LoggingError> {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => Ok(Level::Trace),
        "debug" => Ok(Level::Debug),
        "info" => Ok(Level::Info),
        "warn" | "warning" => Ok(Level::Warn),
        "error" => Ok(Level::Error),
        other => Err(LoggingError::UnsupportedLevel(other.to_string())),
    }
}

fn install_panic_hook_once() {
    if PANIC_HOOK_INSTALLED.set(()).is_err() {
        return;
    }

    let previous_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        // Payload may contain row data; cap and flatten it.
        let location = panic_info
            .location()
            .map(|loc| format!("{}:{}", loc.file(), loc.line()))
            .unwrap_or_else(|| "unknown".to_string());
        let payload = if let Some(message) = panic_info.payload().downcast_ref::<&str>() {
            (*message).to_string()
        } else if let Some(message) = panic_info.payload().downcast_ref::<String>() {
            message.clone()
        } else {
            "non-string panic payload".to_string()
        };
        error!(
            "event=panic_captured module=logging status=error location={} payload={}",
            location,
            sanitize_message(&payload, MAX_PANIC_PAYLOAD_CHARS)
        );
        previous_hook(panic_info);
    }));
}

fn sanitize_message(value: &str, max_chars: usize) -> String {
    let flattened = value.replace(['\n', '\r'], " ");
    let mut truncated = flattened.chars().take(max_chars).collect::<String>();
    if flattened.chars().count() > max_chars {
        truncated.push_str("...");
    }
    truncated
}
