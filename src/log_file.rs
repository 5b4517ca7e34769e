//! Simple log file writer with timestamps
//!
//! Library diagnostics go through the `log` facade. `LogFile` is a separate,
//! caller-owned record of the operations run in one session; see
//! [`crate::Command::run_logged`].

use crate::{Error, Result};
use chrono::{Local, Utc};
use std::env;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Instant;

#[derive(Clone)]
pub struct LogFile {
    inner: Arc<LogFileInner>,
}

struct LogFileInner {
    path: PathBuf,
    state: Mutex<LogState>,
    start: Instant,
    output_to_console: bool,
}

struct LogState {
    writer: BufWriter<File>,
    last_seconds: f32,
}

impl LogFile {
    /// Create a log file at `path`
    ///
    /// Without a path, a file named `stlkit_<date>_<time>.log` is created in
    /// the system temp directory.
    pub fn new(path: Option<&Path>, output_to_console: bool) -> Result<Self> {
        let path = match path {
            Some(path) if !path.as_os_str().is_empty() => path.to_path_buf(),
            _ => env::temp_dir().join(date_time_filename("stlkit_", ".log")),
        };

        let file = File::create(&path).map_err(|e| {
            Error::FileSave(format!("Unable to create file {}: {}", path.display(), e))
        })?;

        let inner = LogFileInner {
            path: path.clone(),
            state: Mutex::new(LogState {
                writer: BufWriter::new(file),
                last_seconds: 0.0,
            }),
            start: Instant::now(),
            output_to_console,
        };

        let log = Self {
            inner: Arc::new(inner),
        };

        log.log(format!("Opened {}", path.display()))?;
        log.log_time()?;
        log.log(format!(
            "stlkit {} on {}/{}",
            env!("CARGO_PKG_VERSION"),
            env::consts::OS,
            env::consts::ARCH
        ))?;
        log.log("\n----------------------------------------\n")?;

        Ok(log)
    }

    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    pub fn log(&self, message: impl AsRef<str>) -> Result<()> {
        self.inner.log_lines(message.as_ref())
    }

    pub fn log_time(&self) -> Result<()> {
        let utc = Utc::now();
        let local = Local::now();
        self.log(format!(
            "Current time (UTC): {}",
            utc.format("%Y-%m-%d %H:%M:%S (UTC)")
        ))?;
        self.log(format!(
            "Current local time: {}",
            local.format("%Y-%m-%d %H:%M:%S (%z)")
        ))?;
        Ok(())
    }
}

impl LogFileInner {
    fn log_lines(&self, message: &str) -> Result<()> {
        let seconds = self.start.elapsed().as_secs_f32();

        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let diff = seconds - state.last_seconds;
        let prefix = format!("{:7.0}s {:6.1}+ ", seconds, diff);

        for line in message.split('\n') {
            if self.output_to_console {
                println!("{}{}", prefix, line);
            }
            state.writer.write_all(prefix.as_bytes())?;
            state.writer.write_all(line.as_bytes())?;
            state.writer.write_all(b"\n")?;
        }
        state.writer.flush()?;
        state.last_seconds = seconds;

        Ok(())
    }
}

impl Drop for LogFileInner {
    fn drop(&mut self) {
        let _ = self.log_lines("\n----------------------------------------\n");
        let _ = self.log_lines("Closing log file.");
        let _ = self.log_lines(&format!(
            "Current time (UTC): {}",
            Utc::now().format("%Y-%m-%d %H:%M:%S (UTC)")
        ));
        let _ = self.log_lines("Done.");
    }
}

fn date_time_filename(prefix: &str, postfix: &str) -> String {
    let now = Local::now();
    format!("{}{}{}", prefix, now.format("%Y%m%d_%H%M%S"), postfix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_log_file_writes_and_closes() {
        let path = env::temp_dir().join(format!("stlkit_log_test_{}.log", std::process::id()));
        {
            let log = LogFile::new(Some(&path), false).unwrap();
            assert_eq!(log.path(), path.as_path());
            log.log("first line\nsecond line").unwrap();
        }

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("Opened"));
        assert!(text.contains("Current time (UTC)"));
        assert!(text.contains("first line"));
        assert!(text.contains("second line"));
        assert!(text.trim_end().ends_with("Done."));
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_date_time_filename() {
        let name = date_time_filename("stlkit_", ".log");
        assert!(name.starts_with("stlkit_"));
        assert!(name.ends_with(".log"));
        assert_eq!(name.len(), "stlkit_".len() + 15 + ".log".len());
    }
}
