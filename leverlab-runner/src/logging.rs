//! Log sinks injected into the sweep driver.
//!
//! One trait, three implementations: no-op, console (through the `log`
//! facade), and a timestamped file. The sink is chosen from configuration,
//! opened before a sweep and flushed after it.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }

    fn to_log(self) -> log::Level {
        match self {
            LogLevel::Debug => log::Level::Debug,
            LogLevel::Info => log::Level::Info,
            LogLevel::Warn => log::Level::Warn,
            LogLevel::Error => log::Level::Error,
        }
    }
}

/// Destination for sweep diagnostics. Shared across worker threads.
pub trait LogSink: Send + Sync {
    fn log(&self, level: LogLevel, msg: &str);

    /// Messages below the sink's level are dropped; callers may skip formatting.
    fn enabled(&self, _level: LogLevel) -> bool {
        true
    }

    fn flush(&self) -> io::Result<()> {
        Ok(())
    }

    fn debug(&self, msg: &str) {
        self.log(LogLevel::Debug, msg);
    }

    fn info(&self, msg: &str) {
        self.log(LogLevel::Info, msg);
    }

    fn warn(&self, msg: &str) {
        self.log(LogLevel::Warn, msg);
    }

    fn error(&self, msg: &str) {
        self.log(LogLevel::Error, msg);
    }
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpSink;

impl LogSink for NoOpSink {
    fn log(&self, _level: LogLevel, _msg: &str) {}

    fn enabled(&self, _level: LogLevel) -> bool {
        false
    }
}

/// Forwards to the `log` facade; the binary decides where it goes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleSink;

impl LogSink for ConsoleSink {
    fn log(&self, level: LogLevel, msg: &str) {
        log::log!(target: "leverlab::sweep", level.to_log(), "{msg}");
    }

    fn enabled(&self, level: LogLevel) -> bool {
        log::log_enabled!(target: "leverlab::sweep", level.to_log())
    }
}

/// Appends UTC-timestamped lines to `<dir>/logs/info_<timestamp>.log`.
#[derive(Debug)]
pub struct FileSink {
    path: PathBuf,
    level: LogLevel,
    writer: Mutex<BufWriter<File>>,
}

impl FileSink {
    /// Create `<dir>/logs/` and open a new log file named after `now`.
    pub fn open(dir: &Path, level: LogLevel) -> io::Result<Self> {
        Self::open_at(dir, level, Utc::now())
    }

    pub fn open_at(dir: &Path, level: LogLevel, now: DateTime<Utc>) -> io::Result<Self> {
        let logs = dir.join("logs");
        fs::create_dir_all(&logs)?;
        let path = logs.join(format!("info_{}.log", now.format("%m-%d-%Y_%H-%M-%S")));
        let file = fs::OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            level,
            writer: Mutex::new(BufWriter::new(file)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LogSink for FileSink {
    fn log(&self, level: LogLevel, msg: &str) {
        if level < self.level {
            return;
        }
        let ts = Utc::now().format("%Y-%m-%d %H:%M:%S%.3f");
        if let Ok(mut w) = self.writer.lock() {
            // A failed diagnostic write must not fail the sweep.
            let _ = writeln!(w, "{ts} UTC {:<5} {msg}", level.as_str());
        }
    }

    fn enabled(&self, level: LogLevel) -> bool {
        level >= self.level
    }

    fn flush(&self) -> io::Result<()> {
        match self.writer.lock() {
            Ok(mut w) => w.flush(),
            Err(_) => Err(io::Error::new(io::ErrorKind::Other, "log writer poisoned")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    #[default]
    None,
    Console,
    File,
}

/// `[logging]` section of the sweep config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub sink: SinkKind,
    pub level: LogLevel,
    /// Parent directory of `logs/` for the file sink.
    pub dir: PathBuf,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            sink: SinkKind::None,
            level: LogLevel::Info,
            dir: PathBuf::from("."),
        }
    }
}

/// The sink selected by a [`LoggingConfig`].
#[derive(Debug)]
pub enum Logger {
    NoOp(NoOpSink),
    Console(ConsoleSink),
    File(FileSink),
}

impl Logger {
    pub fn from_config(config: &LoggingConfig) -> io::Result<Self> {
        Ok(match config.sink {
            SinkKind::None => Logger::NoOp(NoOpSink),
            SinkKind::Console => Logger::Console(ConsoleSink),
            SinkKind::File => Logger::File(FileSink::open(&config.dir, config.level)?),
        })
    }

    fn inner(&self) -> &dyn LogSink {
        match self {
            Logger::NoOp(s) => s,
            Logger::Console(s) => s,
            Logger::File(s) => s,
        }
    }
}

impl Default for Logger {
    fn default() -> Self {
        Logger::NoOp(NoOpSink)
    }
}

impl LogSink for Logger {
    fn log(&self, level: LogLevel, msg: &str) {
        self.inner().log(level, msg);
    }

    fn enabled(&self, level: LogLevel) -> bool {
        self.inner().enabled(level)
    }

    fn flush(&self) -> io::Result<()> {
        self.inner().flush()
    }
}
