//! Process-wide `log` backends.
//!
//! Lines look like `2025-06-01T12:00:03 [INFO] [thread:ThreadId(4)] coordinator.rs:104 - ...`.
//! The file backend writes one `YYYY-MM-DD.log` per UTC day.

use {
    log::{Level, LevelFilter, Log, Metadata, Record},
    std::{
        fmt,
        fs::{self, File, OpenOptions},
        io::Write,
        path::{Path, PathBuf},
        sync::Mutex,
        time::{SystemTime, UNIX_EPOCH},
    },
};

/// Environment variable that overrides the build-mode default level.
pub const LOG_LEVEL_ENV: &str = "VISION_LOG_LEVEL";

// dependency targets that only get through at Info and above
const QUIET_TARGETS: &[&str] = &["tokio_websockets", "mio"];

fn passes_target_filter(metadata: &Metadata) -> bool {
    metadata.level() <= Level::Info
        || !QUIET_TARGETS
            .iter()
            .any(|quiet| metadata.target().starts_with(quiet))
}

/// UTC wall-clock reading, second resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UtcStamp {
    pub year: i64,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
}

impl UtcStamp {
    pub fn now() -> Self {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs())
            .unwrap_or(0);
        Self::from_unix(secs)
    }

    pub fn from_unix(secs: u64) -> Self {
        let (year, month, day) = civil_from_days((secs / 86_400) as i64);
        let in_day = (secs % 86_400) as u32;
        Self {
            year,
            month,
            day,
            hour: in_day / 3600,
            minute: in_day % 3600 / 60,
            second: in_day % 60,
        }
    }

    /// `YYYY-MM-DD`
    pub fn date(&self) -> String {
        format!("{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

impl fmt::Display for UtcStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}T{:02}:{:02}:{:02}",
            self.date(),
            self.hour,
            self.minute,
            self.second
        )
    }
}

/// Current time as `YYYY-MM-DDTHH:MM:SS` (UTC).
pub fn format_timestamp() -> String {
    UtcStamp::now().to_string()
}

/// Current date as `YYYY-MM-DD` (UTC).
pub fn format_today() -> String {
    UtcStamp::now().date()
}

// days since 1970-01-01 to (year, month, day), Hinnant's civil_from_days
fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097) as u32;
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = doy - (153 * mp + 2) / 5 + 1;
    let month = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = yoe as i64 + era * 400 + i64::from(month <= 2);
    (year, month, day)
}

fn format_record(record: &Record) -> String {
    format!(
        "{} [{}] [thread:{:?}] {}:{} - {}",
        UtcStamp::now(),
        record.level(),
        std::thread::current().id(),
        record.file().unwrap_or("unknown"),
        record.line().unwrap_or(0),
        record.args()
    )
}

/// Writes every record to stdout.
pub struct StdoutLogger;

impl Log for StdoutLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        passes_target_filter(metadata)
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            println!("{}", format_record(record));
        }
    }

    fn flush(&self) {
        std::io::stdout().flush().ok();
    }
}

/// Appends records to `<dir>/<YYYY-MM-DD>.log`, switching files when the UTC
/// day changes.
pub struct FileLogger {
    dir: PathBuf,
    current: Mutex<DayFile>,
}

struct DayFile {
    date: String,
    file: File,
}

fn open_day(dir: &Path, date: &str) -> std::io::Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join(format!("{date}.log")))
}

impl FileLogger {
    /// Create the directory if needed and open today's file.
    pub fn new(dir: impl Into<PathBuf>) -> std::io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        let date = format_today();
        let file = open_day(&dir, &date)?;
        Ok(Self {
            dir,
            current: Mutex::new(DayFile { date, file }),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl Log for FileLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        passes_target_filter(metadata)
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format_record(record);
        let mut current = self.current.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        let today = format_today();
        if today != current.date {
            match open_day(&self.dir, &today) {
                Ok(file) => *current = DayFile { date: today, file },
                Err(error) => eprintln!("Failed to roll log file over to {}: {}", today, error),
            }
        }

        if let Err(error) = writeln!(current.file, "{}", line) {
            eprintln!("Failed to write to log file: {}", error);
            eprintln!("{}", line);
        }
    }

    fn flush(&self) {
        let mut current = self.current.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        current.file.flush().ok();
    }
}

fn parse_level(raw: &str) -> Option<LevelFilter> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "off" => Some(LevelFilter::Off),
        "error" => Some(LevelFilter::Error),
        "warn" | "warning" => Some(LevelFilter::Warn),
        "info" => Some(LevelFilter::Info),
        "debug" => Some(LevelFilter::Debug),
        "trace" => Some(LevelFilter::Trace),
        _ => None,
    }
}

/// Resolve the max level for the global logger.
///
/// `VISION_LOG_LEVEL` wins when it names a valid level. Otherwise debug builds
/// log at Debug and release builds at Info.
pub fn max_level() -> LevelFilter {
    std::env::var(LOG_LEVEL_ENV)
        .ok()
        .as_deref()
        .and_then(parse_level)
        .unwrap_or(if cfg!(debug_assertions) {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        })
}

/// Install `StdoutLogger` as the global logger. Only the first call in a
/// process has any effect.
pub fn init_stdout_logger() {
    static LOGGER: StdoutLogger = StdoutLogger;

    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(max_level());
    }
}

/// Install a `FileLogger` writing under `dir` as the global logger. Only the
/// first call in a process has any effect.
pub fn init_file_logger(dir: impl Into<PathBuf>) -> std::io::Result<()> {
    let logger = FileLogger::new(dir)?;

    // set_logger needs a &'static reference
    if log::set_logger(Box::leak(Box::new(logger))).is_ok() {
        log::set_max_level(max_level());
    }

    Ok(())
}
