use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Log file name inside the data directory
pub const LOG_FILE: &str = "whatif.log";
/// Cap before the log is truncated (5 MB)
const MAX_LOG_SIZE: u64 = 5 * 1024 * 1024;
/// Tail kept on truncation (1 MB)
const KEEP_SIZE: u64 = 1024 * 1024;

/// Truncate `log_path` to its newest `keep` bytes once it grows past `max`.
///
/// The kept tail starts at the first full line. Returns whether the file
/// was truncated.
pub fn rotate_log(log_path: &Path, max: u64, keep: u64) -> io::Result<bool> {
    let len = match fs::metadata(log_path) {
        Ok(meta) => meta.len(),
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e),
    };
    if len <= max {
        return Ok(false);
    }

    let mut tail = Vec::new();
    {
        let mut file = File::open(log_path)?;
        file.seek(SeekFrom::Start(len.saturating_sub(keep)))?;
        file.read_to_end(&mut tail)?;
    }

    let first_line = tail
        .iter()
        .position(|&b| b == b'\n')
        .map_or(0, |i| i + 1);

    let mut file = File::create(log_path)?;
    file.write_all(b"--- whatif.log truncated, older runs removed ---\n")?;
    file.write_all(&tail[first_line..])?;
    Ok(true)
}

/// Hands out writers that share one append handle
#[derive(Clone)]
struct SharedLog {
    file: Arc<Mutex<File>>,
}

struct SharedLogWriter {
    file: Arc<Mutex<File>>,
}

impl SharedLogWriter {
    fn with_file<T>(&self, f: impl FnOnce(&mut File) -> io::Result<T>) -> io::Result<T> {
        let mut guard = self
            .file
            .lock()
            .map_err(|_| io::Error::other("log file lock poisoned"))?;
        f(&mut guard)
    }
}

impl Write for SharedLogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.with_file(|file| file.write(buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        self.with_file(|file| file.flush())
    }
}

impl<'a> MakeWriter<'a> for SharedLog {
    type Writer = SharedLogWriter;

    fn make_writer(&'a self) -> Self::Writer {
        SharedLogWriter {
            file: Arc::clone(&self.file),
        }
    }
}

/// Default filter directive for both crates at `level`
pub fn default_filter(level: &str) -> String {
    format!("whatif={level},whatif_core={level}")
}

/// Send tracing output to `{data_dir}/whatif.log`.
///
/// `RUST_LOG` takes precedence over `level`. Stdout is left to the report.
pub fn init_logging(data_dir: &Path, level: &str) -> color_eyre::Result<PathBuf> {
    fs::create_dir_all(data_dir)?;
    let log_path = data_dir.join(LOG_FILE);

    if let Err(e) = rotate_log(&log_path, MAX_LOG_SIZE, KEEP_SIZE) {
        eprintln!("warning: could not truncate {}: {e}", log_path.display());
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;
    let writer = SharedLog {
        file: Arc::new(Mutex::new(file)),
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(level)));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true),
        )
        .try_init()?;

    tracing::info!(log_path = %log_path.display(), "logging initialized");
    Ok(log_path)
}
