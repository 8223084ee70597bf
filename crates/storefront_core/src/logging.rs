//! Rolling file logs for the storefront process.
//!
//! # Responsibility
//! - Start the `flexi_logger` file backend once per process.
//! - Route panics into the log as one sanitized line.
//!
//! # Invariants
//! - A `LogTarget` always holds a supported level and an absolute directory.
//! - Starting again with the active target is a no-op; any other target is
//!   rejected with `LoggingError::AlreadyActive`.
//! - Nothing here panics.

use flexi_logger::{
    Cleanup, Criterion, FileSpec, FlexiLoggerError, Logger, LoggerHandle, Naming, WriteMode,
};
use log::{error, info};
use once_cell::sync::OnceCell;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

const LOG_FILE_BASENAME: &str = "storefront";
const MAX_LOG_FILE_SIZE_BYTES: u64 = 10 * 1024 * 1024;
const MAX_LOG_FILES: usize = 5;
const MAX_PANIC_PAYLOAD_CHARS: usize = 160;
const SUPPORTED_LEVELS: &str = "trace|debug|info|warn|error";

static ACTIVE_LOGGER: OnceCell<ActiveLogger> = OnceCell::new();
static PANIC_HOOK_INSTALLED: OnceCell<()> = OnceCell::new();

struct ActiveLogger {
    target: LogTarget,
    _handle: LoggerHandle,
}

/// Failures while validating a log target or starting the backend.
#[derive(Debug)]
pub enum LoggingError {
    UnsupportedLevel(String),
    EmptyDir,
    RelativeDir(PathBuf),
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    Backend(FlexiLoggerError),
    /// The process already logs somewhere else.
    AlreadyActive {
        active: LogTarget,
        requested: LogTarget,
    },
}

impl Display for LoggingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedLevel(level) => {
                write!(f, "unsupported log level `{level}`; expected {SUPPORTED_LEVELS}")
            }
            Self::EmptyDir => write!(f, "log directory cannot be empty"),
            Self::RelativeDir(path) => write!(
                f,
                "log directory must be an absolute path, got `{}`",
                path.display()
            ),
            Self::CreateDir { path, source } => write!(
                f,
                "failed to create log directory `{}`: {source}",
                path.display()
            ),
            Self::Backend(err) => write!(f, "failed to start logger: {err}"),
            Self::AlreadyActive { active, requested } => write!(
                f,
                "logging already active as {active}; refusing to switch to {requested}"
            ),
        }
    }
}

impl Error for LoggingError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::CreateDir { source, .. } => Some(source),
            Self::Backend(err) => Some(err),
            _ => None,
        }
    }
}

impl From<FlexiLoggerError> for LoggingError {
    fn from(value: FlexiLoggerError) -> Self {
        Self::Backend(value)
    }
}

/// Validated level and directory for the rolling log files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogTarget {
    level: &'static str,
    dir: PathBuf,
}

impl LogTarget {
    /// Normalizes `level` (case-insensitive, `warning` means `warn`) and
    /// checks that `dir` is absolute.
    pub fn new(level: &str, dir: impl Into<PathBuf>) -> Result<Self, LoggingError> {
        let level = normalize_level(level)?;
        let dir = dir.into();
        if dir.as_os_str().is_empty() {
            return Err(LoggingError::EmptyDir);
        }
        if !dir.is_absolute() {
            return Err(LoggingError::RelativeDir(dir));
        }
        Ok(Self { level, dir })
    }

    pub fn level(&self) -> &'static str {
        self.level
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl Display for LogTarget {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "level={} dir={}", self.level, self.dir.display())
    }
}

/// Starts file logging for `target`.
///
/// # Errors
/// - `CreateDir` when the directory cannot be created.
/// - `Backend` when `flexi_logger` refuses to start.
/// - `AlreadyActive` when an earlier call started a different target.
pub fn init_logging(target: &LogTarget) -> Result<(), LoggingError> {
    let active = ACTIVE_LOGGER.get_or_try_init(|| start_logger(target))?;
    if active.target != *target {
        return Err(LoggingError::AlreadyActive {
            active: active.target.clone(),
            requested: target.clone(),
        });
    }
    Ok(())
}

/// Returns the active log target.
///
/// Returns `None` when logging has not been initialized.
pub fn logging_status() -> Option<LogTarget> {
    ACTIVE_LOGGER.get().map(|active| active.target.clone())
}

/// `debug` in debug builds, `info` in release builds.
pub fn default_log_level() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    }
}

fn start_logger(target: &LogTarget) -> Result<ActiveLogger, LoggingError> {
    std::fs::create_dir_all(&target.dir).map_err(|source| LoggingError::CreateDir {
        path: target.dir.clone(),
        source,
    })?;

    let handle = Logger::try_with_str(target.level)?
        .log_to_file(
            FileSpec::default()
                .directory(&target.dir)
                .basename(LOG_FILE_BASENAME),
        )
        .rotate(
            Criterion::Size(MAX_LOG_FILE_SIZE_BYTES),
            Naming::Numbers,
            Cleanup::KeepLogFiles(MAX_LOG_FILES),
        )
        .write_mode(WriteMode::BufferAndFlush)
        .append()
        .format_for_files(flexi_logger::detailed_format)
        .start()?;

    install_panic_hook_once();

    info!(
        "event=app_start module=core status=ok platform={} build_mode={} version={}",
        std::env::consts::OS,
        if cfg!(debug_assertions) { "debug" } else { "release" },
        env!("CARGO_PKG_VERSION")
    );
    info!(
        "event=logging_init module=core status=ok level={} log_dir={}",
        target.level,
        target.dir.display()
    );

    Ok(ActiveLogger {
        target: target.clone(),
        _handle: handle,
    })
}

fn normalize_level(level: &str) -> Result<&'static str, LoggingError> {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => Ok("trace"),
        "debug" => Ok("debug"),
        "info" => Ok("info"),
        "warn" | "warning" => Ok("warn"),
        "error" => Ok("error"),
        other => Err(LoggingError::UnsupportedLevel(other.to_string())),
    }
}

fn install_panic_hook_once() {
    if PANIC_HOOK_INSTALLED.set(()).is_err() {
        return;
    }

    let previous_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let location = panic_info
            .location()
            .map(|loc| format!("{}:{}", loc.file(), loc.line()))
            .unwrap_or_else(|| "unknown".to_string());
        let payload = panic_info
            .payload()
            .downcast_ref::<&str>()
            .map(|message| (*message).to_string())
            .or_else(|| panic_info.payload().downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_string());
        error!(
            "event=panic_captured module=core status=error location={} payload={}",
            location,
            one_line(&payload, MAX_PANIC_PAYLOAD_CHARS)
        );
        previous_hook(panic_info);
    }));
}

/// Flattens newlines and caps length so one panic stays one log line.
fn one_line(value: &str, max_chars: usize) -> String {
    let flattened = value.replace(['\n', '\r'], " ");
    let mut line: String = flattened.chars().take(max_chars).collect();
    if flattened.chars().count() > max_chars {
        line.push_str("...");
    }
    line
}

#[cfg(test)]
mod tests {
    use super::{init_logging, logging_status, one_line, LogTarget, LoggingError};

    #[test]
    fn log_target_normalizes_level_names() {
        let dir = std::env::temp_dir();

        assert_eq!(LogTarget::new("INFO", &dir).unwrap().level(), "info");
        assert_eq!(LogTarget::new(" warning ", &dir).unwrap().level(), "warn");
        assert!(matches!(
            LogTarget::new("verbose", &dir),
            Err(LoggingError::UnsupportedLevel(level)) if level == "verbose"
        ));
    }

    #[test]
    fn log_target_rejects_relative_and_empty_dirs() {
        assert!(matches!(
            LogTarget::new("info", "logs/dev"),
            Err(LoggingError::RelativeDir(_))
        ));
        assert!(matches!(
            LogTarget::new("info", ""),
            Err(LoggingError::EmptyDir)
        ));
    }

    #[test]
    fn one_line_flattens_and_truncates() {
        let line = one_line("line1\nline2\rline3", 8);
        assert_eq!(line, "line1 li...");
        assert_eq!(one_line("short", 8), "short");
    }

    #[test]
    fn init_logging_is_idempotent_for_same_target_and_rejects_others() {
        let log_dir = tempfile::tempdir().unwrap();
        let other_dir = tempfile::tempdir().unwrap();
        let target = LogTarget::new("info", log_dir.path()).unwrap();

        init_logging(&target).unwrap();
        init_logging(&target).unwrap();

        let louder = LogTarget::new("debug", log_dir.path()).unwrap();
        assert!(matches!(
            init_logging(&louder),
            Err(LoggingError::AlreadyActive { requested, .. }) if requested == louder
        ));

        let moved = LogTarget::new("info", other_dir.path()).unwrap();
        let err = init_logging(&moved).unwrap_err();
        assert!(err.to_string().contains("refusing to switch"));

        assert_eq!(logging_status(), Some(target));
    }
}
