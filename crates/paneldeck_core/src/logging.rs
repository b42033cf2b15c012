//! Process-wide log sink for the dashboard engine.
//!
//! # Responsibility
//! - Start exactly one `flexi_logger` backend (rolling files or stderr).
//! - Report producer panics isolated by the registry, and any other panic,
//!   as single-line metadata events.
//!
//! # Invariants
//! - Repeating the same [`LogTarget`] and level is a no-op.
//! - A different target or level after startup is refused with
//!   [`LoggingError::AlreadyActive`]; the running sink is kept.
//! - Startup failures are returned, never panicked.
//!
//! Lines look like `event=<name> module=<module> status=<status> ...`.

use flexi_logger::{Cleanup, Criterion, FileSpec, Logger, LoggerHandle, Naming, WriteMode};
use log::{error, info};
use once_cell::sync::OnceCell;
use std::any::Any;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

const LOG_BASENAME: &str = "paneldeck";
const ROTATE_AT_BYTES: u64 = 8 * 1024 * 1024;
const KEEP_ROTATED_FILES: usize = 4;
const PANIC_TEXT_LIMIT: usize = 160;
const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

static ACTIVE_SINK: OnceCell<ActiveSink> = OnceCell::new();
static PANIC_REPORTER: OnceCell<()> = OnceCell::new();

/// Destination of engine log lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    /// Rolling files under an absolute directory.
    Directory(PathBuf),
    Stderr,
}

impl Display for LogTarget {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Directory(dir) => write!(f, "{}", dir.display()),
            Self::Stderr => write!(f, "stderr"),
        }
    }
}

/// Why the log sink could not be started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoggingError {
    UnknownLevel(String),
    /// Directory argument was blank.
    EmptyDirectory,
    RelativeDirectory(String),
    /// Directory creation or logger startup failed.
    Backend(String),
    /// A sink is running with a different configuration.
    AlreadyActive {
        active: String,
        requested: String,
    },
}

impl Display for LoggingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownLevel(level) => write!(
                f,
                "unknown log level `{level}`; use one of {}",
                LEVELS.join("|")
            ),
            Self::EmptyDirectory => write!(f, "log directory must not be blank"),
            Self::RelativeDirectory(dir) => {
                write!(f, "log directory must be absolute, got `{dir}`")
            }
            Self::Backend(details) => write!(f, "log backend failed: {details}"),
            Self::AlreadyActive { active, requested } => write!(
                f,
                "logging already active as {active}; refusing to switch to {requested}"
            ),
        }
    }
}

impl Error for LoggingError {}

struct ActiveSink {
    level: &'static str,
    target: LogTarget,
    _handle: LoggerHandle,
}

impl ActiveSink {
    fn describe(&self) -> String {
        describe(self.level, &self.target)
    }
}

/// Writes rolling log files into `log_dir`, which must be absolute.
///
/// # Errors
/// Unknown level, blank or relative directory, backend failure, or a sink
/// already running with another level or target.
pub fn init_logging(level: &str, log_dir: &str) -> Result<(), LoggingError> {
    let level = parse_level(level)?;
    let dir = parse_directory(log_dir)?;
    activate(level, LogTarget::Directory(dir))
}

/// Writes log lines to stderr.
pub fn init_stderr_logging(level: &str) -> Result<(), LoggingError> {
    activate(parse_level(level)?, LogTarget::Stderr)
}

/// Level and target of the running sink, if any.
pub fn logging_status() -> Option<(&'static str, LogTarget)> {
    ACTIVE_SINK
        .get()
        .map(|sink| (sink.level, sink.target.clone()))
}

pub fn default_log_level() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    }
}

fn activate(level: &'static str, target: LogTarget) -> Result<(), LoggingError> {
    let sink = ACTIVE_SINK.get_or_try_init(|| {
        let handle = start_backend(level, &target)?;
        install_panic_reporter();
        info!(
            "event=logging_start module=logging status=ok version={} os={} level={} target={}",
            env!("CARGO_PKG_VERSION"),
            std::env::consts::OS,
            level,
            target
        );
        Ok::<_, LoggingError>(ActiveSink {
            level,
            target: target.clone(),
            _handle: handle,
        })
    })?;

    if sink.level == level && sink.target == target {
        return Ok(());
    }
    Err(LoggingError::AlreadyActive {
        active: sink.describe(),
        requested: describe(level, &target),
    })
}

fn start_backend(level: &str, target: &LogTarget) -> Result<LoggerHandle, LoggingError> {
    let logger =
        Logger::try_with_str(level).map_err(|err| LoggingError::Backend(err.to_string()))?;
    let started = match target {
        LogTarget::Stderr => logger.format(flexi_logger::default_format).start(),
        LogTarget::Directory(dir) => {
            std::fs::create_dir_all(dir).map_err(|err| {
                LoggingError::Backend(format!("cannot create `{}`: {err}", dir.display()))
            })?;
            logger
                .log_to_file(FileSpec::default().directory(dir).basename(LOG_BASENAME))
                .rotate(
                    Criterion::Size(ROTATE_AT_BYTES),
                    Naming::Numbers,
                    Cleanup::KeepLogFiles(KEEP_ROTATED_FILES),
                )
                .write_mode(WriteMode::BufferAndFlush)
                .append()
                .format_for_files(flexi_logger::detailed_format)
                .start()
        }
    };
    started.map_err(|err| LoggingError::Backend(err.to_string()))
}

fn describe(level: &str, target: &LogTarget) -> String {
    format!("level={level} target={target}")
}

fn parse_level(raw: &str) -> Result<&'static str, LoggingError> {
    let wanted = raw.trim().to_ascii_lowercase();
    let wanted = if wanted == "warning" { "warn" } else { wanted.as_str() };
    LEVELS
        .iter()
        .copied()
        .find(|level| *level == wanted)
        .ok_or_else(|| LoggingError::UnknownLevel(raw.trim().to_string()))
}

fn parse_directory(raw: &str) -> Result<PathBuf, LoggingError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(LoggingError::EmptyDirectory);
    }
    let path = Path::new(raw);
    if path.is_relative() {
        return Err(LoggingError::RelativeDirectory(raw.to_string()));
    }
    Ok(path.to_path_buf())
}

fn install_panic_reporter() {
    if PANIC_REPORTER.set(()).is_err() {
        return;
    }
    let chained = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let location = match info.location() {
            Some(loc) => format!("{}:{}", loc.file(), loc.line()),
            None => "unknown".to_string(),
        };
        error!(
            "event=panic module=logging status=error location={} message={}",
            location,
            panic_message(info.payload())
        );
        chained(info);
    }));
}

/// Single-line, length-capped text of a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    let text = payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("<opaque panic payload>");
    single_line(text, PANIC_TEXT_LIMIT)
}

/// Folds line breaks into spaces and cuts after `limit` chars.
pub(crate) fn single_line(text: &str, limit: usize) -> String {
    let mut out = String::with_capacity(text.len().min(limit + 3));
    for (index, ch) in text.chars().enumerate() {
        if index == limit {
            out.push_str("...");
            break;
        }
        out.push(if ch == '\n' || ch == '\r' { ' ' } else { ch });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{
        init_logging, logging_status, panic_message, parse_directory, parse_level, single_line,
        LogTarget, LoggingError,
    };

    #[test]
    fn levels_are_case_insensitive_and_accept_warning() {
        assert_eq!(parse_level(" DEBUG ").expect("debug level"), "debug");
        assert_eq!(parse_level("Warning").expect("warning alias"), "warn");
        assert_eq!(
            parse_level("loud"),
            Err(LoggingError::UnknownLevel("loud".to_string()))
        );
    }

    #[test]
    fn directories_must_be_absolute_and_non_blank() {
        assert_eq!(parse_directory(" "), Err(LoggingError::EmptyDirectory));
        assert_eq!(
            parse_directory("var/log"),
            Err(LoggingError::RelativeDirectory("var/log".to_string()))
        );
    }

    #[test]
    fn single_line_folds_breaks_and_caps_length() {
        assert_eq!(single_line("a\nb\rc", 10), "a b c");
        assert_eq!(single_line("abcdef", 3), "abc...");
        assert_eq!(single_line("abc", 3), "abc");
    }

    #[test]
    fn panic_message_handles_each_payload_kind() {
        let borrowed: Box<dyn std::any::Any + Send> = Box::new("producer exploded");
        assert_eq!(panic_message(borrowed.as_ref()), "producer exploded");
        let owned: Box<dyn std::any::Any + Send> = Box::new(String::from("tab\nfailed"));
        assert_eq!(panic_message(owned.as_ref()), "tab failed");
        let opaque: Box<dyn std::any::Any + Send> = Box::new(42_u32);
        assert_eq!(panic_message(opaque.as_ref()), "<opaque panic payload>");
    }

    #[test]
    fn second_start_must_match_the_running_sink() {
        let dir = tempfile::tempdir().expect("temp dir");
        let other = tempfile::tempdir().expect("temp dir");
        let dir_str = dir.path().to_str().expect("utf-8 path").to_string();
        let other_str = other.path().to_str().expect("utf-8 path").to_string();

        init_logging("info", &dir_str).expect("first start");
        init_logging("INFO", &dir_str).expect("identical restart is a no-op");

        assert!(matches!(
            init_logging("trace", &dir_str),
            Err(LoggingError::AlreadyActive { .. })
        ));
        assert!(matches!(
            init_logging("info", &other_str),
            Err(LoggingError::AlreadyActive { .. })
        ));

        let (level, target) = logging_status().expect("sink running");
        assert_eq!(level, "info");
        assert_eq!(target, LogTarget::Directory(dir.path().to_path_buf()));
    }
}
