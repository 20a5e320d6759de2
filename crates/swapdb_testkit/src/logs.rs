//! Capture of `tracing` output.

use parking_lot::Mutex;
use std::io;
use std::sync::Arc;

/// Shared buffer that formatted events are written into.
#[derive(Clone, Default)]
struct Buffer(Arc<Mutex<Vec<u8>>>);

impl io::Write for Buffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Log lines captured by [`capture_logs`].
#[derive(Debug, Clone, Default)]
pub struct CapturedLogs {
    lines: Vec<String>,
}

impl CapturedLogs {
    /// All captured lines, in emission order.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Returns true if some line contains every one of `needles`.
    pub fn contains_all(&self, needles: &[&str]) -> bool {
        self.lines
            .iter()
            .any(|line| needles.iter().all(|n| line.contains(n)))
    }

    /// Returns true if any line contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.contains_all(&[needle])
    }
}

/// Runs `f` with a thread-local subscriber that records events at `DEBUG`
/// and above, returning its result and the captured lines.
pub fn capture_logs<T>(f: impl FnOnce() -> T) -> (T, CapturedLogs) {
    let buffer = Buffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .finish();

    let value = tracing::subscriber::with_default(subscriber, f);

    let text = String::from_utf8_lossy(&buffer.0.lock()).into_owned();
    let lines = text.lines().map(str::to_string).collect();
    (value, CapturedLogs { lines })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn captures_fields_and_messages() {
        let ((), logs) = capture_logs(|| {
            tracing::info!(backend = "sqlite", "Using SQLite driver");
            tracing::debug!("detail");
        });
        assert!(logs.contains_all(&["INFO", "Using SQLite driver", "backend", "sqlite"]));
        assert!(logs.contains("detail"));
        assert_eq!(logs.lines().len(), 2);
    }

    #[test]
    fn nothing_outside_closure() {
        tracing::info!("before");
        let (value, logs) = capture_logs(|| 7);
        assert_eq!(value, 7);
        assert!(logs.lines().is_empty());
    }
}
