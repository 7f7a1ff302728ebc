//! Logging setup for proxywatch binaries.
//!
//! Two `tracing-subscriber` fmt layers: a size-rotated plain-text file under
//! `~/.proxywatch/logs/` and stderr. The terminal UI owns the screen, so in
//! TUI mode stderr only carries warnings unless `--verbose` is given.

use anyhow::{Context, Result};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const DEFAULT_LOG_FILTER: &str = "proxywatch=info,proxywatch_live=info";
const KEEP_ARCHIVES: usize = 4;
const MAX_FILE_BYTES: u64 = 10 * 1024 * 1024;

/// Logging configuration shared by proxywatch binaries.
pub struct LogConfig<'a> {
    pub app_name: &'a str,
    pub verbose: bool,
    pub tui_mode: bool,
    /// Overrides `~/.proxywatch/logs`.
    pub log_dir: Option<PathBuf>,
}

/// Install the global subscriber. Safe to call once per process.
pub fn init_logging(config: LogConfig<'_>) -> Result<()> {
    let log_dir = match config.log_dir {
        Some(dir) => dir,
        None => proxywatch_protocol::paths::default_logs_dir(),
    };
    fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create logs directory: {}", log_dir.display()))?;

    let file_writer = SharedLogFile::open(&log_dir, config.app_name)
        .context("Failed to initialize rotating log file")?;

    let file_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let console_filter = if config.tui_mode && !config.verbose {
        EnvFilter::new("warn")
    } else {
        file_filter.clone()
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_writer)
                .with_ansi(false)
                .with_filter(file_filter),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(console_filter),
        )
        .try_init()
        .context("A global tracing subscriber is already installed")?;

    Ok(())
}

/// Append-only log file that moves itself aside once it grows past a size
/// limit. `<name>.log` is live; `<name>.log.1` is the most recent archive.
struct SizeRotatingFile {
    dir: PathBuf,
    stem: String,
    keep_archives: usize,
    max_bytes: u64,
    file: Option<File>,
    written: u64,
}

impl SizeRotatingFile {
    fn open(dir: &Path, name: &str, keep_archives: usize, max_bytes: u64) -> io::Result<Self> {
        fs::create_dir_all(dir)?;
        let mut log = Self {
            dir: dir.to_path_buf(),
            stem: file_stem(name),
            keep_archives,
            max_bytes,
            file: None,
            written: 0,
        };
        log.reopen()?;
        if log.written > log.max_bytes {
            log.roll()?;
        }
        Ok(log)
    }

    fn live_path(&self) -> PathBuf {
        self.dir.join(format!("{}.log", self.stem))
    }

    fn archive_path(&self, generation: usize) -> PathBuf {
        self.dir.join(format!("{}.log.{}", self.stem, generation))
    }

    fn reopen(&mut self) -> io::Result<()> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.live_path())?;
        self.written = file.metadata()?.len();
        self.file = Some(file);
        Ok(())
    }

    fn roll(&mut self) -> io::Result<()> {
        if let Some(mut file) = self.file.take() {
            let _ = file.flush();
        }
        self.shift_archives()?;
        self.reopen()
    }

    /// `.log.N-1 -> .log.N`, ..., `.log -> .log.1`; the oldest is dropped.
    fn shift_archives(&self) -> io::Result<()> {
        let live = self.live_path();
        if self.keep_archives == 0 {
            if live.exists() {
                fs::remove_file(live)?;
            }
            return Ok(());
        }

        let oldest = self.archive_path(self.keep_archives);
        if oldest.exists() {
            fs::remove_file(&oldest)?;
        }
        for generation in (1..self.keep_archives).rev() {
            let from = self.archive_path(generation);
            if from.exists() {
                fs::rename(&from, self.archive_path(generation + 1))?;
            }
        }
        if live.exists() {
            fs::rename(live, self.archive_path(1))?;
        }
        Ok(())
    }
}

impl Write for SizeRotatingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.written > 0 && self.written + buf.len() as u64 > self.max_bytes {
            self.roll()?;
        }
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "log file unavailable"))?;
        let n = file.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.file.as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }
}

/// `MakeWriter` handle; every event locks the shared file for its write.
#[derive(Clone)]
struct SharedLogFile {
    inner: Arc<Mutex<SizeRotatingFile>>,
}

impl SharedLogFile {
    fn open(dir: &Path, app_name: &str) -> Result<Self> {
        let file = SizeRotatingFile::open(dir, app_name, KEEP_ARCHIVES, MAX_FILE_BYTES)
            .with_context(|| format!("Failed to open log file for {}", app_name))?;
        Ok(Self {
            inner: Arc::new(Mutex::new(file)),
        })
    }

    fn with_file<R>(&self, f: impl FnOnce(&mut SizeRotatingFile) -> io::Result<R>) -> io::Result<R> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "log writer lock poisoned"))?;
        f(&mut guard)
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for SharedLogFile {
    type Writer = SharedLogFile;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

impl Write for SharedLogFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.with_file(|file| file.write(buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        self.with_file(|file| file.flush())
    }
}

fn file_stem(name: &str) -> String {
    let stem: String = name
        .chars()
        .map(|ch| if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' { ch } else { '_' })
        .collect();
    if stem.is_empty() {
        "proxywatch".to_string()
    } else {
        stem
    }
}
