use env_logger::{Logger, Target};
use log::{Log, Metadata, Record, SetLoggerError};
use std::collections::VecDeque;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::{LazyLock, Mutex};

#[derive(Debug, Clone)]
pub struct ClientLogEntry {
    pub timestamp_ms: u64,
    pub level: String,
    pub target: String,
    pub message: String,
}

struct ClientLogFile {
    path: PathBuf,
    file: Mutex<Option<File>>,
}

impl ClientLogFile {
    fn new() -> Self {
        let path = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("taskboard")
            .join("logs")
            .join("client.log");
        let file = Self::open(&path).ok();
        Self {
            path,
            file: Mutex::new(file),
        }
    }

    fn open(path: &Path) -> io::Result<File> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        OpenOptions::new().create(true).append(true).open(path)
    }

    fn append_entry(&self, entry: &ClientLogEntry) {
        let mut guard = match self.file.lock() {
            Ok(guard) => guard,
            Err(_) => return,
        };
        if guard.is_none() {
            if let Ok(file) = Self::open(&self.path) {
                *guard = Some(file);
            } else {
                return;
            }
        }
        if let Some(file) = guard.as_mut() {
            let line = format_log_line(entry);
            let _ = file.write_all(line.as_bytes());
            let _ = file.write_all(b"\n");
            let _ = file.flush();
        }
    }
}

static LOG_FILE: LazyLock<ClientLogFile> = LazyLock::new(ClientLogFile::new);

fn format_log_line(entry: &ClientLogEntry) -> String {
    format!(
        "{} [{}] [{}] {}",
        entry.timestamp_ms,
        entry.level.to_uppercase(),
        entry.target,
        entry.message.replace('\n', "\\n")
    )
}

fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Writes to stderr through env_logger and mirrors every enabled record
/// into the log file.
struct FileMirrorLogger {
    inner: Logger,
}

impl Log for FileMirrorLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        self.inner.enabled(metadata)
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        self.inner.log(record);

        let entry = ClientLogEntry {
            timestamp_ms: now_ms(),
            level: record.level().to_string().to_lowercase(),
            target: record.target().to_string(),
            message: record.args().to_string(),
        };
        LOG_FILE.append_entry(&entry);
    }

    fn flush(&self) {
        self.inner.flush();
    }
}

pub fn init() -> Result<(), SetLoggerError> {
    let _ = &*LOG_FILE;
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    builder.target(Target::Stderr);
    let inner = builder.build();
    let max_level = inner.filter();
    let logger = Box::leak(Box::new(FileMirrorLogger { inner }));
    log::set_logger(logger)?;
    log::set_max_level(max_level);
    Ok(())
}

pub fn log_file_path() -> PathBuf {
    LOG_FILE.path.clone()
}

/// Last `count` lines of a log file. A missing file reads as empty.
pub fn tail_lines(path: &Path, count: usize) -> io::Result<Vec<String>> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };
    let mut lines = VecDeque::with_capacity(count);
    for line in BufReader::new(file).lines() {
        let line = line?;
        if lines.len() == count {
            lines.pop_front();
        }
        if count > 0 {
            lines.push_back(line);
        }
    }
    Ok(lines.into_iter().collect())
}

pub fn write_fallback_line(message: &str) {
    let entry = ClientLogEntry {
        timestamp_ms: now_ms(),
        level: "error".to_string(),
        target: "taskboard.log_bridge".to_string(),
        message: message.to_string(),
    };
    LOG_FILE.append_entry(&entry);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_log_line_escapes_newlines() {
        let entry = ClientLogEntry {
            timestamp_ms: 42,
            level: "warn".to_string(),
            target: "taskboard.rest".to_string(),
            message: "first\nsecond".to_string(),
        };
        assert_eq!(
            format_log_line(&entry),
            "42 [WARN] [taskboard.rest] first\\nsecond"
        );
    }

    #[test]
    fn test_tail_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("client.log");
        assert!(tail_lines(&path, 5).unwrap().is_empty());

        fs::write(&path, "a\nb\nc\nd\n").unwrap();
        assert_eq!(tail_lines(&path, 2).unwrap(), vec!["c", "d"]);
        assert_eq!(tail_lines(&path, 10).unwrap().len(), 4);
        assert!(tail_lines(&path, 0).unwrap().is_empty());
    }
}
