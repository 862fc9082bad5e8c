//! Run-scoped logging context
//!
//! Every pipeline call takes a `&RunContext`. It carries the run id, the
//! logger name and the sink records go to, so nothing about logging lives in
//! process-wide state. Records are single-line JSON objects:
//!
//! ```text
//! {"level":"INFO","message":"...","time":"2024-05-01 10:00:00","logger":"pipeline","run_id":"..."}
//! ```

use serde::Serialize;
use std::cell::RefCell;
use std::fmt;
use std::io::{self, Write};

/// Severity of a log record
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Level {
    Debug,
    Info,
    Warning,
    Error,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warning => "WARNING",
            Level::Error => "ERROR",
        };
        f.write_str(s)
    }
}

#[derive(Serialize)]
struct LogRecord<'a> {
    level: Level,
    message: &'a str,
    time: String,
    logger: &'a str,
    run_id: &'a str,
}

/// Logging context for one pipeline run
pub struct RunContext {
    run_id: String,
    logger: String,
    min_level: Level,
    sink: RefCell<Box<dyn Write>>,
}

impl RunContext {
    /// Context writing to stdout with a fresh run id
    pub fn stdout(logger: impl Into<String>) -> Self {
        Self::with_writer(logger, Box::new(io::stdout()))
    }

    /// Context that discards every record
    pub fn silent() -> Self {
        Self::with_writer("pipeline", Box::new(io::sink()))
    }

    /// Context writing to an arbitrary sink with a fresh run id
    pub fn with_writer(logger: impl Into<String>, sink: Box<dyn Write>) -> Self {
        RunContext {
            run_id: uuid::Uuid::new_v4().to_string(),
            logger: logger.into(),
            min_level: Level::Info,
            sink: RefCell::new(sink),
        }
    }

    /// Override the generated run id
    pub fn with_run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = run_id.into();
        self
    }

    pub fn with_min_level(mut self, level: Level) -> Self {
        self.min_level = level;
        self
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn log(&self, level: Level, message: &str) {
        if level < self.min_level {
            return;
        }

        let record = LogRecord {
            level,
            message,
            time: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            logger: &self.logger,
            run_id: &self.run_id,
        };

        // A broken sink must not take the run down with it
        if let Ok(line) = serde_json::to_string(&record) {
            let mut sink = self.sink.borrow_mut();
            let _ = writeln!(sink, "{}", line);
            let _ = sink.flush();
        }
    }

    pub fn debug(&self, message: &str) {
        self.log(Level::Debug, message);
    }

    pub fn info(&self, message: &str) {
        self.log(Level::Info, message);
    }

    pub fn warn(&self, message: &str) {
        self.log(Level::Warning, message);
    }

    pub fn error(&self, message: &str) {
        self.log(Level::Error, message);
    }
}

impl fmt::Debug for RunContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunContext")
            .field("run_id", &self.run_id)
            .field("logger", &self.logger)
            .field("min_level", &self.min_level)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct SharedBuf(Rc<RefCell<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuf {
        fn lines(&self) -> Vec<serde_json::Value> {
            String::from_utf8(self.0.borrow().clone())
                .unwrap()
                .lines()
                .map(|l| serde_json::from_str(l).unwrap())
                .collect()
        }
    }

    #[test]
    fn test_records_are_json_lines() {
        let buf = SharedBuf::default();
        let ctx = RunContext::with_writer("ingest", Box::new(buf.clone())).with_run_id("run-1");

        ctx.info("saved sheet");
        ctx.warn("sheet is empty");

        let lines = buf.lines();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["level"], "INFO");
        assert_eq!(lines[0]["message"], "saved sheet");
        assert_eq!(lines[0]["logger"], "ingest");
        assert_eq!(lines[0]["run_id"], "run-1");
        assert_eq!(lines[1]["level"], "WARNING");
        assert_eq!(lines[1]["time"].as_str().unwrap().len(), 19);
    }

    #[test]
    fn test_min_level_filters() {
        let buf = SharedBuf::default();
        let ctx = RunContext::with_writer("ingest", Box::new(buf.clone()))
            .with_min_level(Level::Warning);

        ctx.debug("hidden");
        ctx.info("hidden");
        ctx.error("shown");

        let lines = buf.lines();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["level"], "ERROR");
    }

    #[test]
    fn test_run_ids_are_unique() {
        assert_ne!(RunContext::silent().run_id(), RunContext::silent().run_id());
    }
}
