//! The build log: a line-atomic sink shared by the driver and workers.

use std::io::Write;
use std::sync::Mutex;

/// A thread-safe build progress sink.
///
/// All output funnels through one mutex so lines from concurrent cooks never
/// interleave mid-line. The lock is held only for the duration of a single
/// write, never across a cook.
pub struct BuildLog {
    out: Mutex<Box<dyn Write + Send>>,
    quiet: bool,
}

impl BuildLog {
    /// Creates a log writing to the given sink.
    pub fn new(out: Box<dyn Write + Send>) -> BuildLog {
        BuildLog {
            out: Mutex::new(out),
            quiet: false,
        }
    }

    /// Creates a log writing to standard output.
    pub fn stdout() -> BuildLog {
        BuildLog::new(Box::new(std::io::stdout()))
    }

    /// Creates a log that discards everything.
    pub fn sink() -> BuildLog {
        BuildLog::new(Box::new(std::io::sink()))
    }

    /// Suppresses per-asset lines, keeping section banners and errors.
    pub fn set_quiet(&mut self, quiet: bool) {
        self.quiet = quiet;
    }

    /// Writes one log line.
    pub fn line(&self, msg: &str) {
        if self.quiet {
            return;
        }
        self.write_line(msg);
    }

    /// Writes a section banner.
    pub fn section(&self, title: &str) {
        self.write_line(&format!("------ {title} ------"));
    }

    /// Writes an error line, ignoring quiet mode.
    pub fn error(&self, msg: &str) {
        self.write_line(&format!("ERROR {msg}"));
    }

    /// Writes a warning line, ignoring quiet mode.
    pub fn warn(&self, msg: &str) {
        self.write_line(&format!("WARNING {msg}"));
    }

    /// Runs a closure against the raw sink under the lock. Used by the
    /// packager, which streams partial lines while compressing entries.
    pub fn with_raw<R>(&self, f: impl FnOnce(&mut dyn Write) -> R) -> R {
        let mut out = self.out.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut **out)
    }

    fn write_line(&self, msg: &str) {
        let mut out = self.out.lock().unwrap_or_else(|e| e.into_inner());
        let _ = writeln!(out, "{msg}");
        let _ = out.flush();
    }
}
