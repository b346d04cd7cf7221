//! Session logger — backs the `log` facade with a single file in the OS data
//! directory, plus an stderr echo for the messages a terminal user cares about.
//!
//! The file is **truncated (overwritten) at each launch**, so it only ever
//! contains output from the most-recent session.
//!
//! Log location:
//!   Windows:  `%APPDATA%\scanfill\scanfill.log`
//!   Linux:    `~/.local/share/scanfill/scanfill.log`
//!   macOS:    `~/Library/Application Support/scanfill/scanfill.log`

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};
use std::time::{SystemTime, UNIX_EPOCH};

use log::{Level, LevelFilter, Log, Metadata, Record};

static LOGGER: OnceLock<SessionLogger> = OnceLock::new();

pub struct SessionLogger {
    file: Option<Mutex<File>>,
    path: Option<PathBuf>,
    /// Most verbose level mirrored to stderr.
    echo: LevelFilter,
}

impl SessionLogger {
    fn open(echo: LevelFilter) -> Self {
        let path = log_file_path();

        if let Some(parent) = path.parent() {
            let _ = fs::create_dir_all(parent);
        }

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path);

        match file {
            Ok(f) => Self {
                file: Some(Mutex::new(f)),
                path: Some(path),
                echo,
            },
            Err(e) => {
                // Can't open log file — not fatal, keep the stderr echo
                eprintln!("[logger] Failed to open log file {:?}: {}", path, e);
                Self {
                    file: None,
                    path: None,
                    echo,
                }
            }
        }
    }

    /// Write a raw line to the session file.  I/O errors are ignored so that
    /// logging never takes the process down.
    fn write_line(&self, line: &str) {
        if let Some(mutex) = &self.file
            && let Ok(mut file) = mutex.lock()
        {
            let _ = writeln!(file, "{}", line);
        }
    }
}

impl Log for SessionLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= Level::Debug || metadata.level() <= self.echo
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        if record.level() <= Level::Debug {
            self.write_line(&format!(
                "[{}] [{}] {}: {}",
                timestamp(),
                record.level(),
                record.target(),
                record.args()
            ));
        }
        if record.level() <= self.echo {
            eprintln!("{}: {}", record.level().as_str().to_lowercase(), record.args());
        }
    }

    fn flush(&self) {
        if let Some(mutex) = &self.file
            && let Ok(mut file) = mutex.lock()
        {
            let _ = file.flush();
        }
    }
}

/// Install the session logger.  Later calls are no-ops.
///
/// * Creates (or truncates) the log file.
/// * Echoes warnings and errors to stderr, and info too when `verbose`.
/// * Installs a panic hook that writes the panic message to the log before
///   propagating to the default handler.
pub fn init(verbose: bool) {
    if LOGGER.get().is_some() {
        return;
    }
    let echo = if verbose { LevelFilter::Info } else { LevelFilter::Warn };
    let logger = LOGGER.get_or_init(|| SessionLogger::open(echo));

    if log::set_logger(logger).is_err() {
        return;
    }
    log::set_max_level(LevelFilter::Debug.max(echo));

    logger.write_line(&format!(
        "=== scanfill session started {} ===",
        human_timestamp()
    ));
    if let Some(path) = &logger.path {
        logger.write_line(&format!("Log file: {}", path.display()));
    }
    logger.write_line("");

    let prev = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        if let Some(logger) = LOGGER.get() {
            logger.write_line(&format!("[{}] [PANIC] {}", timestamp(), info));
        }
        prev(info);
    }));
}

/// Path of the current session log, once [`init`] has opened it.
pub fn log_path() -> Option<&'static PathBuf> {
    LOGGER.get().and_then(|l| l.path.as_ref())
}

fn log_file_path() -> PathBuf {
    data_dir().join("scanfill").join("scanfill.log")
}

/// Platform data directory (without the app sub-folder).
fn data_dir() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Ok(appdata) = std::env::var("APPDATA") {
            return PathBuf::from(appdata);
        }
    }
    #[cfg(target_os = "macos")]
    {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home)
                .join("Library")
                .join("Application Support");
        }
    }
    // Linux / fallback
    if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
        return PathBuf::from(xdg);
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".local").join("share");
    }
    // Last resort: current working directory
    PathBuf::from(".")
}

/// HH:MM:SS within the current (UTC) day.
fn timestamp() -> String {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(d) => {
            let secs = d.as_secs();
            let h = (secs % 86400) / 3600;
            let m = (secs % 3600) / 60;
            let s = secs % 60;
            format!("{:02}:{:02}:{:02}", h, m, s)
        }
        Err(_) => "??:??:??".to_string(),
    }
}

fn human_timestamp() -> String {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(d) => format!("(unix {})", d.as_secs()),
        Err(_) => "(unknown time)".to_string(),
    }
}
