//! Log sinks and the tracing subscriber built on them.
//!
//! # Sinks
//! Each log category owns one [`LogSink`].  A file sink appends to a
//! [`RotatingFile`]: once the live file would grow past `max_bytes` it is
//! renamed to `<name>.1`, older backups shift up one slot, and anything past
//! `backups` is deleted.  A discard sink swallows everything and never
//! touches the filesystem, which is what embedded use gets.
//!
//! # Categories
//! | Category | File | Level | Events |
//! |----------|------|-------|--------|
//! | general | `logs/HTOS.log` | ERROR | everything not on [`ACCESS_TARGET`] |
//! | access  | `logs/BLACKLIST.log` | INFO | target [`ACCESS_TARGET`] only |

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{Level, Metadata, Subscriber};
use tracing_subscriber::filter::filter_fn;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{Layer, Registry};

/// Target for access-denial events, e.g.
/// `tracing::info!(target: ACCESS_TARGET, user = %id, "denied")`.
pub const ACCESS_TARGET: &str = "savepolicy::access";

pub const LOG_DIR:          &str = "logs";
pub const GENERAL_LOG_NAME: &str = "HTOS.log";
pub const ACCESS_LOG_NAME:  &str = "BLACKLIST.log";

/// 25 MiB per file before rotation.
pub const LOG_MAX_BYTES: u64 = 25 * 1024 * 1024;
pub const LOG_BACKUPS:   usize = 3;

// ── RotatingFile ─────────────────────────────────────────────────────────────

/// Size-bounded, backup-bounded append-only log file.
#[derive(Debug)]
pub struct RotatingFile {
    path:      PathBuf,
    file:      File,
    len:       u64,
    max_bytes: u64,
    backups:   usize,
}

impl RotatingFile {
    /// Open (creating parent directories and the file) for appending.
    pub fn open<P: AsRef<Path>>(path: P, max_bytes: u64, backups: usize) -> io::Result<Self> {
        let path = path.as_ref().to_owned();
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let len = file.metadata()?.len();
        Ok(Self { path, file, len, max_bytes, backups })
    }

    pub fn path(&self) -> &Path { &self.path }

    fn backup_path(&self, slot: usize) -> PathBuf {
        let mut name = self.path.clone().into_os_string();
        name.push(format!(".{slot}"));
        PathBuf::from(name)
    }

    fn rotate(&mut self) -> io::Result<()> {
        self.file.flush()?;
        if self.backups == 0 {
            self.file = OpenOptions::new().create(true).write(true).truncate(true).open(&self.path)?;
        } else {
            let oldest = self.backup_path(self.backups);
            if oldest.exists() { fs::remove_file(&oldest)?; }
            for slot in (1..self.backups).rev() {
                let from = self.backup_path(slot);
                if from.exists() { fs::rename(&from, self.backup_path(slot + 1))?; }
            }
            fs::rename(&self.path, self.backup_path(1))?;
            self.file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        }
        self.len = 0;
        Ok(())
    }
}

impl Write for RotatingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        // A record larger than the bound still lands whole in a fresh file.
        if self.len > 0 && self.len + buf.len() as u64 > self.max_bytes {
            self.rotate()?;
        }
        let n = self.file.write(buf)?;
        self.len += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

// ── LogSink ──────────────────────────────────────────────────────────────────

/// Where one log category goes.  Cheap to clone; clones share the file.
#[derive(Debug, Clone)]
pub enum LogSink {
    File(Arc<Mutex<RotatingFile>>),
    Discard,
}

impl LogSink {
    pub fn file<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let file = RotatingFile::open(path, LOG_MAX_BYTES, LOG_BACKUPS)?;
        Ok(LogSink::File(Arc::new(Mutex::new(file))))
    }

    pub fn is_discard(&self) -> bool { matches!(self, LogSink::Discard) }

    pub fn path(&self) -> Option<PathBuf> {
        match self {
            LogSink::File(f) => Some(lock(f).path().to_owned()),
            LogSink::Discard => None,
        }
    }
}

/// Writer handed to the fmt layer for one event.
pub enum SinkWriter<'a> {
    File(MutexGuard<'a, RotatingFile>),
    Discard(io::Sink),
}

impl Write for SinkWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            SinkWriter::File(f)    => f.write(buf),
            SinkWriter::Discard(s) => s.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            SinkWriter::File(f)    => f.flush(),
            SinkWriter::Discard(s) => s.flush(),
        }
    }
}

impl<'a> MakeWriter<'a> for LogSink {
    type Writer = SinkWriter<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        match self {
            LogSink::File(f) => SinkWriter::File(lock(f)),
            LogSink::Discard => SinkWriter::Discard(io::sink()),
        }
    }
}

// A panic while holding the lock leaves the file usable; keep logging.
fn lock(f: &Mutex<RotatingFile>) -> MutexGuard<'_, RotatingFile> {
    f.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ── LogHandles ───────────────────────────────────────────────────────────────

/// Local-time stamp in the `2024-05-01 - 13:37:00+0200` shape.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogTimer;

impl FormatTime for LogTimer {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", chrono::Local::now().format("%Y-%m-%d - %H:%M:%S%z"))
    }
}

/// One sink per log category.
#[derive(Debug, Clone)]
pub struct LogHandles {
    pub general: LogSink,
    pub access:  LogSink,
}

impl LogHandles {
    /// File sinks under `dir`.
    pub fn files<P: AsRef<Path>>(dir: P) -> io::Result<Self> {
        let dir = dir.as_ref();
        Ok(Self {
            general: LogSink::file(dir.join(GENERAL_LOG_NAME))?,
            access:  LogSink::file(dir.join(ACCESS_LOG_NAME))?,
        })
    }

    pub fn discard() -> Self {
        Self { general: LogSink::Discard, access: LogSink::Discard }
    }

    /// A subscriber routing general events at ERROR and above to the general
    /// sink and access events at INFO and above to the access sink.
    pub fn subscriber(&self) -> impl Subscriber + Send + Sync {
        let general = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_timer(LogTimer)
            .with_writer(self.general.clone())
            .with_filter(filter_fn(|meta: &Metadata<'_>| {
                meta.target() != ACCESS_TARGET && *meta.level() <= Level::ERROR
            }));
        let access = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_timer(LogTimer)
            .with_writer(self.access.clone())
            .with_filter(filter_fn(|meta: &Metadata<'_>| {
                meta.target() == ACCESS_TARGET && *meta.level() <= Level::INFO
            }));
        Registry::default().with(general).with(access)
    }
}
