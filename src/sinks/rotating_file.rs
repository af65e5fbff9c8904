//! Rotating file writer
//!
//! Appends lines to a single active file and swaps it for a fresh one when
//! its [`RotationPolicy`] asks for it. The retired file is renamed to a
//! stamped archive next to the active one:
//!
//! ```text
//! logs/app.log                                   (active)
//! logs/app.2026-10-18_00-00-00_000000.log        (archive)
//! logs/app.2026-10-19_00-00-00_000000.log.gz     (archive, compressed)
//! ```
//!
//! Archives beyond the [`RetentionPolicy`] count are deleted oldest first,
//! ordered by the stamp embedded in their names.

use crate::core::error::{LoggerError, Result};
use crate::core::metrics::LoggerMetrics;
use crate::core::record::LogRecord;
use crate::core::rotation::{RetentionPolicy, RotationPolicy, RotationTrigger};
use crate::core::writer::SinkWriter;
use chrono::{DateTime, Local, NaiveDateTime, Timelike};
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

const STAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S_%6f";
const STAMP_LEN: usize = 26;
const CHUNK_SIZE: usize = 64 * 1024;

/// File writer with size/time rotation and archive retention
///
/// A rotation failure of any kind (rename, compress, delete, reopen) is
/// fatal: the writer reports it once as [`LoggerError::FileRotation`]
/// and rejects every later write with [`LoggerError::SinkPoisoned`].
///
/// # Examples
///
/// ```no_run
/// use rust_log_loader::core::{RetentionPolicy, RotationPolicy};
/// use rust_log_loader::sinks::RotatingFileWriter;
///
/// let writer = RotatingFileWriter::new(
///     "logs/app.log",
///     RotationPolicy::size(10 * 1024 * 1024),
///     RetentionPolicy::new(7).with_compression(true),
/// )?;
/// # Ok::<(), rust_log_loader::core::LoggerError>(())
/// ```
pub struct RotatingFileWriter {
    path: PathBuf,
    rotation: RotationPolicy,
    retention: RetentionPolicy,
    writer: Option<BufWriter<File>>,
    current_size: u64,
    last_stamp: Option<NaiveDateTime>,
    last_trigger: Option<RotationTrigger>,
    poisoned: bool,
    metrics: Option<Arc<LoggerMetrics>>,
}

impl RotatingFileWriter {
    /// Open (or create) the active file in append mode
    ///
    /// Missing parent directories are created. The starting size is read
    /// from the file, so an existing log keeps counting towards the limit.
    pub fn new(
        path: impl AsRef<Path>,
        rotation: RotationPolicy,
        retention: RetentionPolicy,
    ) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| LoggerError::directory_creation(parent, e))?;
        }

        let (file, current_size) = open_append(&path).map_err(|e| {
            LoggerError::file_appender(
                path.display().to_string(),
                format!("Failed to open log file: {}", e),
            )
        })?;

        Ok(Self {
            path,
            rotation,
            retention,
            writer: Some(BufWriter::new(file)),
            current_size,
            last_stamp: None,
            last_trigger: None,
            poisoned: false,
            metrics: None,
        })
    }

    /// Count rotations in `metrics`
    #[must_use]
    pub fn with_metrics(mut self, metrics: Arc<LoggerMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Bytes in the active file
    #[must_use]
    pub fn current_size(&self) -> u64 {
        self.current_size
    }

    #[must_use]
    pub fn rotation(&self) -> &RotationPolicy {
        &self.rotation
    }

    #[must_use]
    pub fn retention(&self) -> &RetentionPolicy {
        &self.retention
    }

    /// Trigger of the most recent rotation
    #[must_use]
    pub fn last_trigger(&self) -> Option<RotationTrigger> {
        self.last_trigger
    }

    #[must_use]
    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    fn display_path(&self) -> String {
        self.path.display().to_string()
    }

    fn rotate(&mut self, time: &DateTime<Local>) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush().map_err(|e| {
                LoggerError::file_rotation(
                    self.display_path(),
                    format!("Failed to flush before rotation: {}", e),
                )
            })?;
        }

        let archive = self.next_archive_path(time);
        fs::rename(&self.path, &archive).map_err(|e| {
            LoggerError::file_rotation(
                self.display_path(),
                format!("Failed to rename to {}: {}", archive.display(), e),
            )
        })?;

        if self.retention.compress {
            compress_file(&archive)?;
        }

        self.enforce_retention()?;

        let (file, size) = open_append(&self.path).map_err(|e| {
            LoggerError::file_rotation(
                self.display_path(),
                format!("Failed to create new log file: {}", e),
            )
        })?;
        self.writer = Some(BufWriter::new(file));
        self.current_size = size;

        if let Some(metrics) = &self.metrics {
            metrics.record_rotation();
        }
        Ok(())
    }

    /// Archive path stamped with `time`, strictly after the previous stamp
    /// and not colliding with any file already on disk
    fn next_archive_path(&mut self, time: &DateTime<Local>) -> PathBuf {
        let naive = time.naive_local();
        let mut stamp = naive
            .with_nanosecond(naive.nanosecond() / 1_000 * 1_000)
            .unwrap_or(naive);

        if let Some(last) = self.last_stamp {
            if stamp <= last {
                stamp = last + chrono::Duration::microseconds(1);
            }
        }

        loop {
            let candidate = archive_path(&self.path, &stamp);
            if !candidate.exists() && !gz_path(&candidate).exists() {
                self.last_stamp = Some(stamp);
                return candidate;
            }
            stamp += chrono::Duration::microseconds(1);
        }
    }

    fn enforce_retention(&self) -> Result<()> {
        let archives = list_archives(&self.path).map_err(|e| {
            LoggerError::file_rotation(
                self.display_path(),
                format!("Failed to list archives: {}", e),
            )
        })?;

        let excess = archives.len().saturating_sub(self.retention.backup_count);
        for (_, old) in archives.into_iter().take(excess) {
            fs::remove_file(&old).map_err(|e| {
                LoggerError::file_rotation(
                    self.display_path(),
                    format!("Failed to remove old archive {}: {}", old.display(), e),
                )
            })?;
        }
        Ok(())
    }
}

impl SinkWriter for RotatingFileWriter {
    fn write(&mut self, record: &LogRecord, line: &str) -> Result<()> {
        if self.poisoned {
            return Err(LoggerError::sink_poisoned(self.display_path()));
        }

        let pending = line.len() as u64 + 1;
        if let Some(trigger) = self
            .rotation
            .should_rotate(self.current_size, pending, record.time())
        {
            if let Err(e) = self.rotate(record.time()) {
                self.poisoned = true;
                self.writer = None;
                return Err(match e {
                    e @ LoggerError::FileRotation { .. } => e,
                    other => LoggerError::file_rotation(self.display_path(), other.to_string()),
                });
            }
            self.last_trigger = Some(trigger);
        }

        let path = self.display_path();
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| LoggerError::writer("Writer not initialized"))?;

        writer
            .write_all(line.as_bytes())
            .and_then(|_| writer.write_all(b"\n"))
            .and_then(|_| writer.flush())
            .map_err(|e| {
                LoggerError::file_appender(path, format!("Failed to write log entry: {}", e))
            })?;

        self.current_size += pending;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        if let Some(ref mut writer) = self.writer {
            writer.flush().map_err(|e| {
                LoggerError::file_appender(
                    self.path.display().to_string(),
                    format!("Failed to flush: {}", e),
                )
            })?;
        }
        Ok(())
    }

    fn kind(&self) -> &str {
        "rotating_file"
    }
}

impl Drop for RotatingFileWriter {
    fn drop(&mut self) {
        if let Some(mut writer) = self.writer.take() {
            let _ = writer.flush();
        }
    }
}

/// Archives of the active file at `path`, oldest first
///
/// Only files named `<stem>.<stamp>[.<ext>][.gz]` in the same directory are
/// returned; anything else sharing the prefix is left alone.
pub fn list_archives(path: &Path) -> std::io::Result<Vec<(NaiveDateTime, PathBuf)>> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let (stem, ext) = split_name(path);
    let prefix = format!("{}.", stem);

    let mut archives = Vec::new();
    for entry in fs::read_dir(&dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        let Some(rest) = name.strip_prefix(&prefix) else { continue };
        if rest.len() < STAMP_LEN || !rest.is_char_boundary(STAMP_LEN) {
            continue;
        }

        let (stamp, suffix) = rest.split_at(STAMP_LEN);
        let suffix = suffix.strip_suffix(".gz").unwrap_or(suffix);
        let expected = ext.as_deref().map(|e| format!(".{}", e)).unwrap_or_default();
        if suffix != expected {
            continue;
        }

        if let Some(parsed) = parse_stamp(stamp) {
            archives.push((parsed, entry.path()));
        }
    }

    archives.sort();
    Ok(archives)
}

fn split_name(path: &Path) -> (String, Option<String>) {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("app")
        .to_string();
    let ext = path.extension().and_then(|e| e.to_str()).map(String::from);
    (stem, ext)
}

fn archive_path(path: &Path, stamp: &NaiveDateTime) -> PathBuf {
    let (stem, ext) = split_name(path);
    let name = match ext {
        Some(ext) => format!("{}.{}.{}", stem, stamp.format(STAMP_FORMAT), ext),
        None => format!("{}.{}", stem, stamp.format(STAMP_FORMAT)),
    };
    path.with_file_name(name)
}

fn parse_stamp(stamp: &str) -> Option<NaiveDateTime> {
    // YYYY-MM-DD_HH-MM-SS_ffffff
    if stamp.len() != STAMP_LEN || !stamp.is_char_boundary(19) {
        return None;
    }
    let (seconds, micros) = stamp.split_at(19);
    let micros = micros.strip_prefix('_')?;
    if micros.len() != 6 || !micros.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let micros: u32 = micros.parse().ok()?;
    NaiveDateTime::parse_from_str(seconds, "%Y-%m-%d_%H-%M-%S")
        .ok()?
        .with_nanosecond(micros * 1_000)
}

fn gz_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".gz");
    PathBuf::from(name)
}

fn open_append(path: &Path) -> std::io::Result<(File, u64)> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let size = file.metadata()?.len();
    Ok((file, size))
}

/// Gzip `path` to `<path>.gz`, removing the original only once the
/// compressed copy is complete
fn compress_file(path: &Path) -> Result<()> {
    use std::io::{BufReader, Read};

    let gz = gz_path(path);
    let mut tmp = OsString::from(gz.as_os_str());
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    let input = File::open(path).map_err(|e| {
        LoggerError::io_operation(
            "compress log file",
            format!("Failed to open file for compression: {}", path.display()),
            e,
        )
    })?;
    let mut reader = BufReader::with_capacity(CHUNK_SIZE, input);

    let output = File::create(&tmp).map_err(|e| {
        LoggerError::io_operation(
            "compress log file",
            format!("Failed to create temporary compressed file: {}", tmp.display()),
            e,
        )
    })?;
    let mut encoder = flate2::write::GzEncoder::new(
        BufWriter::with_capacity(CHUNK_SIZE, output),
        flate2::Compression::default(),
    );

    let mut buffer = vec![0u8; CHUNK_SIZE];
    loop {
        let bytes_read = reader.read(&mut buffer).map_err(|e| {
            let _ = fs::remove_file(&tmp);
            LoggerError::io_operation(
                "compress log file",
                format!("Failed to read from file: {}", path.display()),
                e,
            )
        })?;
        if bytes_read == 0 {
            break;
        }
        encoder.write_all(&buffer[..bytes_read]).map_err(|e| {
            let _ = fs::remove_file(&tmp);
            LoggerError::io_operation("compress log file", "Failed to compress data chunk", e)
        })?;
    }

    encoder
        .finish()
        .and_then(|mut inner| inner.flush())
        .map_err(|e| {
            let _ = fs::remove_file(&tmp);
            LoggerError::io_operation("compress log file", "Failed to finish compression", e)
        })?;

    fs::rename(&tmp, &gz).map_err(|e| {
        let _ = fs::remove_file(&tmp);
        LoggerError::io_operation(
            "compress log file",
            format!("Failed to rename compressed file to: {}", gz.display()),
            e,
        )
    })?;

    fs::remove_file(path).map_err(|e| {
        LoggerError::io_operation(
            "compress log file",
            format!("Failed to remove original after compression: {}", path.display()),
            e,
        )
    })
}
