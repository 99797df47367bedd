//! Best-effort external outputs: the breath scalar sink and the
//! per-window CSV log.

use std::io::Write;
use std::path::PathBuf;

/// Destination for the smoothed breath value.
///
/// Implementations must be best-effort: a failing sink logs and keeps
/// the pipeline running.
pub trait BreathSink: Send {
    /// Writes the latest smoothed breath value.
    fn write(&mut self, value: i32);
}

/// Writes the value as four little-endian bytes into a fixed file,
/// overwriting in place. Stands in for a shared-memory region.
pub struct FileSink {
    path: PathBuf,
    warned: bool,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            warned: false,
        }
    }
}

impl BreathSink for FileSink {
    fn write(&mut self, value: i32) {
        if let Err(e) = std::fs::write(&self.path, value.to_le_bytes()) {
            if !self.warned {
                tracing::warn!(path = %self.path.display(), error = %e, "Breath sink write failed");
                self.warned = true;
            }
        }
    }
}

/// Discards every value.
#[derive(Debug, Default)]
pub struct NoopSink;

impl BreathSink for NoopSink {
    fn write(&mut self, _value: i32) {}
}

/// Records smoothed breath values each time one is written.
/// Test double for the sink seam.
#[derive(Debug, Default)]
pub struct RecordingSink {
    /// Every value written, in order.
    pub values: std::sync::Arc<std::sync::Mutex<Vec<i32>>>,
}

impl BreathSink for RecordingSink {
    fn write(&mut self, value: i32) {
        self.values.lock().expect("sink lock poisoned").push(value);
    }
}

/// Best-effort appender of `frame,breath` lines.
pub struct CsvLogger {
    path: PathBuf,
    warned: bool,
}

impl CsvLogger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            warned: false,
        }
    }

    /// Appends one line; failures are logged once and swallowed.
    pub fn append(&mut self, frame_num: u64, breath: f32) {
        let result = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .and_then(|mut file| writeln!(file, "{frame_num},{breath}"));
        if let Err(e) = result {
            if !self.warned {
                tracing::warn!(path = %self.path.display(), error = %e, "CSV append failed");
                self.warned = true;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_sink_writes_le_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("breath.bin");
        let mut sink = FileSink::new(&path);

        sink.write(0x01020304);
        assert_eq!(std::fs::read(&path).unwrap(), vec![0x04, 0x03, 0x02, 0x01]);

        // Overwrites in place, stays four bytes
        sink.write(-1);
        assert_eq!(std::fs::read(&path).unwrap(), vec![0xFF; 4]);
    }

    #[test]
    fn test_file_sink_failure_is_silent() {
        let mut sink = FileSink::new("/nonexistent-dir/breath.bin");
        sink.write(1);
        sink.write(2); // no panic, pipeline would continue
    }

    #[test]
    fn test_csv_appends_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let mut logger = CsvLogger::new(&path);

        logger.append(3, 10.0);
        logger.append(6, 60.0);

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "3,10\n6,60\n");
    }

    #[test]
    fn test_recording_sink_collects() {
        let mut sink = RecordingSink::default();
        let values = std::sync::Arc::clone(&sink.values);
        sink.write(5);
        sink.write(9);
        assert_eq!(*values.lock().unwrap(), vec![5, 9]);
    }
}
