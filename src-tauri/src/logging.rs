use std::{
    error::Error,
    ffi::OsString,
    fmt::Display,
    fs::{self, OpenOptions},
    io::{self, Write},
    path::{Path, PathBuf},
    sync::Mutex,
};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::{app_config::BuildMode, DESKTOP_LOG_DIR, DESKTOP_LOG_FILE, DESKTOP_LOG_MAX_BYTES};

const UNSERIALIZABLE_PLACEHOLDER: &str = "[object]";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LogLevel {
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
        }
    }
}

/// One argument of a log entry. Arguments are stringified individually and
/// joined with a single space.
pub(crate) enum LogArg<'a> {
    Text(&'a str),
    Bytes(&'a [u8]),
    Error(&'a (dyn Error + 'a)),
    Structured(Option<String>),
    Display(String),
}

impl<'a> LogArg<'a> {
    pub(crate) fn structured<T>(value: &T) -> Self
    where
        T: Serialize + ?Sized,
    {
        Self::Structured(serde_json::to_string(value).ok())
    }

    pub(crate) fn display<T>(value: &T) -> Self
    where
        T: Display + ?Sized,
    {
        Self::Display(value.to_string())
    }

    pub(crate) fn stringify(&self) -> String {
        match self {
            Self::Text(text) => (*text).to_string(),
            Self::Bytes(bytes) => String::from_utf8_lossy(bytes).into_owned(),
            Self::Error(error) => describe_error(*error),
            Self::Structured(Some(json)) => json.clone(),
            Self::Structured(None) => UNSERIALIZABLE_PLACEHOLDER.to_string(),
            Self::Display(text) => text.clone(),
        }
    }
}

impl<'a> From<&'a str> for LogArg<'a> {
    fn from(value: &'a str) -> Self {
        Self::Text(value)
    }
}

impl<'a> From<&'a String> for LogArg<'a> {
    fn from(value: &'a String) -> Self {
        Self::Text(value.as_str())
    }
}

impl<'a> From<&'a [u8]> for LogArg<'a> {
    fn from(value: &'a [u8]) -> Self {
        Self::Bytes(value)
    }
}

fn describe_error(error: &dyn Error) -> String {
    let mut text = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        text.push_str("\n    caused by: ");
        text.push_str(&cause.to_string());
        source = cause.source();
    }
    text
}

pub(crate) fn join_log_args(args: &[LogArg<'_>]) -> String {
    args.iter()
        .map(LogArg::stringify)
        .collect::<Vec<_>>()
        .join(" ")
}

pub(crate) fn format_log_line(
    timestamp: DateTime<Utc>,
    level: LogLevel,
    args: &[LogArg<'_>],
) -> String {
    format!(
        "[{}] [{}] {}",
        timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
        level.as_str(),
        join_log_args(args)
    )
}

/// Writes one line to a console stream, surfacing failures instead of panicking.
fn write_console_line(out: &mut dyn Write, message: &str) -> io::Result<()> {
    writeln!(out, "{message}")?;
    out.flush()
}

fn report_to_stderr(message: &str) {
    // Nothing is left to report to once stderr itself is gone.
    let _ = write_console_line(&mut io::stderr(), message);
}

pub(crate) fn backup_path_for(path: &Path, epoch_millis: i64) -> PathBuf {
    let mut raw: OsString = path.as_os_str().to_os_string();
    raw.push(format!(".{epoch_millis}.bak"));
    PathBuf::from(raw)
}

/// Renames `path` aside once it has reached `max_bytes`. Returns the backup
/// path when a rotation happened.
pub(crate) fn rotate_log_file_if_needed(
    path: &Path,
    max_bytes: u64,
    epoch_millis: i64,
) -> Result<Option<PathBuf>, String> {
    let metadata = match fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(error) => {
            return Err(format!(
                "Failed to read log file size {}: {}",
                path.display(),
                error
            ));
        }
    };
    if metadata.len() < max_bytes {
        return Ok(None);
    }

    let mut millis = epoch_millis;
    let mut backup_path = backup_path_for(path, millis);
    while backup_path.exists() {
        millis += 1;
        backup_path = backup_path_for(path, millis);
    }

    fs::rename(path, &backup_path).map_err(|error| {
        format!(
            "Failed to rotate log file {} to {}: {}",
            path.display(),
            backup_path.display(),
            error
        )
    })?;
    Ok(Some(backup_path))
}

fn append_line(path: &Path, line: &str) -> Result<(), String> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|error| format!("Failed to open log file {}: {}", path.display(), error))?;
    writeln!(file, "{line}")
        .map_err(|error| format!("Failed to append log file {}: {}", path.display(), error))
}

#[derive(Debug)]
pub(crate) struct LogFileSink {
    path: PathBuf,
    max_bytes: u64,
    write_lock: Mutex<()>,
}

impl LogFileSink {
    pub(crate) fn new(path: PathBuf, max_bytes: u64) -> Self {
        Self {
            path,
            max_bytes,
            write_lock: Mutex::new(()),
        }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn append(&self, line: &str) -> Result<(), String> {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        rotate_log_file_if_needed(&self.path, self.max_bytes, Utc::now().timestamp_millis())?;
        append_line(&self.path, line)
    }
}

pub(crate) fn should_persist_logs(mode: BuildMode, windows_host: bool) -> bool {
    windows_host && !mode.is_development()
}

pub(crate) fn resolve_desktop_log_path(app_data_dir: &Path) -> PathBuf {
    app_data_dir.join(DESKTOP_LOG_DIR).join(DESKTOP_LOG_FILE)
}

/// Console logger that can additionally mirror every entry to a rotating file.
#[derive(Debug)]
pub(crate) struct DesktopLogger {
    file: Option<LogFileSink>,
}

impl DesktopLogger {
    pub(crate) fn console_only() -> Self {
        Self { file: None }
    }

    pub(crate) fn with_file(path: PathBuf, max_bytes: u64) -> Self {
        Self {
            file: Some(LogFileSink::new(path, max_bytes)),
        }
    }

    pub(crate) fn initialize(mode: BuildMode, app_data_dir: Option<&Path>) -> Self {
        if !should_persist_logs(mode, cfg!(target_os = "windows")) {
            return Self::console_only();
        }
        let Some(app_data_dir) = app_data_dir else {
            report_to_stderr("desktop log directory is unavailable; logging to console only");
            return Self::console_only();
        };

        let log_path = resolve_desktop_log_path(app_data_dir);
        if let Some(log_dir) = log_path.parent() {
            if let Err(error) = fs::create_dir_all(log_dir) {
                report_to_stderr(&format!(
                    "Failed to create desktop log directory {}: {}",
                    log_dir.display(),
                    error
                ));
                return Self::console_only();
            }
        }
        Self::with_file(log_path, DESKTOP_LOG_MAX_BYTES)
    }

    pub(crate) fn log_path(&self) -> Option<&Path> {
        self.file.as_ref().map(LogFileSink::path)
    }

    pub(crate) fn log(&self, level: LogLevel, args: &[LogArg<'_>]) {
        self.write_entry(level, args, &mut io::stdout(), &mut io::stderr());
    }

    /// Console failures (closed pipe, detached terminal) are dropped; the file
    /// sink still receives the entry.
    fn write_entry(
        &self,
        level: LogLevel,
        args: &[LogArg<'_>],
        out: &mut dyn Write,
        err: &mut dyn Write,
    ) {
        let message = join_log_args(args);
        let console: &mut dyn Write = match level {
            LogLevel::Info => &mut *out,
            LogLevel::Warn | LogLevel::Error => &mut *err,
        };
        let _ = write_console_line(console, &message);

        let Some(file) = &self.file else {
            return;
        };
        let line = format_log_line(Utc::now(), level, args);
        if let Err(error) = file.append(&line) {
            let _ = write_console_line(err, &error);
        }
    }

    pub(crate) fn info(&self, message: &str) {
        self.log(LogLevel::Info, &[LogArg::Text(message)]);
    }

    pub(crate) fn warn(&self, message: &str) {
        self.log(LogLevel::Warn, &[LogArg::Text(message)]);
    }

    pub(crate) fn error(&self, message: &str) {
        self.log(LogLevel::Error, &[LogArg::Text(message)]);
    }
}

#[cfg(test)]
pub(crate) fn read_log_lines(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .unwrap_or_default()
        .lines()
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, fmt, io};

    use chrono::TimeZone;

    use super::*;

    #[derive(Debug)]
    struct ConfigError {
        source: io::Error,
    }

    impl fmt::Display for ConfigError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "config could not be loaded")
        }
    }

    impl Error for ConfigError {
        fn source(&self) -> Option<&(dyn Error + 'static)> {
            Some(&self.source)
        }
    }

    #[test]
    fn format_log_line_uses_iso_timestamp_and_level() {
        let timestamp = Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        let line = format_log_line(
            timestamp,
            LogLevel::Warn,
            &[LogArg::from("backend"), LogArg::display(&42)],
        );
        assert_eq!(line, "[2024-03-09T07:05:01.000Z] [WARN] backend 42");
    }

    #[test]
    fn bytes_are_decoded_as_utf8() {
        let raw = "检测完成\n".as_bytes();
        assert_eq!(LogArg::from(raw).stringify(), "检测完成\n");
    }

    #[test]
    fn error_argument_logs_its_cause_chain() {
        let error = ConfigError {
            source: io::Error::new(io::ErrorKind::PermissionDenied, "access denied"),
        };
        assert_eq!(
            LogArg::Error(&error).stringify(),
            "config could not be loaded\n    caused by: access denied"
        );
    }

    #[test]
    fn error_without_source_logs_message_only() {
        let error = io::Error::new(io::ErrorKind::NotFound, "python not found");
        assert_eq!(LogArg::Error(&error).stringify(), "python not found");
    }

    #[test]
    fn structured_argument_logs_json() {
        let mut value = HashMap::new();
        value.insert("port", 8001);
        assert_eq!(LogArg::structured(&value).stringify(), r#"{"port":8001}"#);
    }

    #[test]
    fn unserializable_structured_argument_falls_back_to_placeholder() {
        let mut value = HashMap::new();
        value.insert((1, 2), "tuple keys are not valid JSON object keys");
        assert_eq!(LogArg::structured(&value).stringify(), "[object]");
    }

    #[test]
    fn rotation_is_skipped_below_threshold_and_for_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("main.log");
        assert_eq!(rotate_log_file_if_needed(&path, 10, 1).unwrap(), None);

        fs::write(&path, b"123456789").unwrap();
        assert_eq!(rotate_log_file_if_needed(&path, 10, 1).unwrap(), None);
        assert!(path.is_file());
    }

    #[test]
    fn rotation_renames_file_at_threshold() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("main.log");
        fs::write(&path, b"0123456789").unwrap();

        let backup = rotate_log_file_if_needed(&path, 10, 1_700_000_000_123)
            .unwrap()
            .expect("file at threshold should rotate");
        assert_eq!(backup, dir.path().join("main.log.1700000000123.bak"));
        assert!(!path.exists());
        assert_eq!(fs::read(&backup).unwrap(), b"0123456789");
    }

    #[test]
    fn rotation_never_reuses_a_backup_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("main.log");

        fs::write(&path, b"first").unwrap();
        let first = rotate_log_file_if_needed(&path, 1, 500).unwrap().unwrap();
        fs::write(&path, b"second").unwrap();
        let second = rotate_log_file_if_needed(&path, 1, 500).unwrap().unwrap();

        assert_ne!(first, second);
        assert_eq!(fs::read(&first).unwrap(), b"first");
        assert_eq!(fs::read(&second).unwrap(), b"second");
    }

    #[test]
    fn logger_rotates_before_the_append_that_crosses_the_limit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("main.log");
        fs::write(&path, vec![b'x'; DESKTOP_LOG_MAX_BYTES as usize]).unwrap();

        let logger = DesktopLogger::with_file(path.clone(), DESKTOP_LOG_MAX_BYTES);
        logger.info("fresh start");

        let backups: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .filter(|name| name.starts_with("main.log.") && name.ends_with(".bak"))
            .collect();
        assert_eq!(backups.len(), 1);

        let lines = read_log_lines(&path);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].ends_with("[INFO] fresh start"));
    }

    #[test]
    fn logger_appends_in_call_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("main.log");
        let logger = DesktopLogger::with_file(path.clone(), DESKTOP_LOG_MAX_BYTES);

        logger.info("one");
        logger.warn("two");
        logger.error("three");

        let lines = read_log_lines(&path);
        assert_eq!(lines.len(), 3);
        assert!(lines[0].ends_with("[INFO] one"));
        assert!(lines[1].ends_with("[WARN] two"));
        assert!(lines[2].ends_with("[ERROR] three"));
    }

    #[test]
    fn logger_swallows_io_failures() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("main.log");
        let logger = DesktopLogger::with_file(path.clone(), DESKTOP_LOG_MAX_BYTES);

        logger.error("cannot be written");
        assert!(!path.exists());
    }

    #[cfg(unix)]
    fn closed_pipe_writer() -> fs::File {
        use std::os::unix::io::FromRawFd;

        let mut fds: [libc::c_int; 2] = [0; 2];
        // SAFETY: `fds` has room for the two descriptors pipe(2) fills in.
        assert_eq!(unsafe { libc::pipe(fds.as_mut_ptr()) }, 0);
        // SAFETY: both descriptors were just created and are owned by this test.
        unsafe {
            libc::close(fds[0]);
            fs::File::from_raw_fd(fds[1])
        }
    }

    #[cfg(unix)]
    #[test]
    fn console_write_to_closed_pipe_returns_error() {
        let mut out = closed_pipe_writer();
        let error = write_console_line(&mut out, "hello").unwrap_err();
        assert_eq!(error.kind(), io::ErrorKind::BrokenPipe);
    }

    #[cfg(unix)]
    #[test]
    fn closed_console_does_not_stop_file_logging() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("main.log");
        let logger = DesktopLogger::with_file(path.clone(), DESKTOP_LOG_MAX_BYTES);
        let mut out = closed_pipe_writer();
        let mut err = closed_pipe_writer();

        logger.write_entry(LogLevel::Info, &[LogArg::from("hello")], &mut out, &mut err);
        logger.write_entry(LogLevel::Error, &[LogArg::from("boom")], &mut out, &mut err);

        let lines = read_log_lines(&path);
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("[INFO] hello"));
        assert!(lines[1].ends_with("[ERROR] boom"));
    }

    #[cfg(unix)]
    #[test]
    fn closed_console_and_unwritable_file_are_both_swallowed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("main.log");
        let logger = DesktopLogger::with_file(path.clone(), DESKTOP_LOG_MAX_BYTES);
        let mut out = closed_pipe_writer();
        let mut err = closed_pipe_writer();

        logger.write_entry(LogLevel::Warn, &[LogArg::from("lost")], &mut out, &mut err);
        assert!(!path.exists());
    }

    #[test]
    fn logs_persist_only_for_production_on_windows() {
        assert!(should_persist_logs(BuildMode::Production, true));
        assert!(!should_persist_logs(BuildMode::Development, true));
        assert!(!should_persist_logs(BuildMode::Production, false));
    }

    #[test]
    fn development_logger_has_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let logger = DesktopLogger::initialize(BuildMode::Development, Some(dir.path()));
        assert!(logger.log_path().is_none());
        assert!(!dir.path().join(DESKTOP_LOG_DIR).exists());
    }

    #[test]
    fn desktop_log_path_lives_under_logs_dir() {
        assert_eq!(
            resolve_desktop_log_path(Path::new("data")),
            Path::new("data").join("logs").join("main.log")
        );
    }
}
