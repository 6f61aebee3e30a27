//! Event log writer
//!
//! Persists every summary verbatim, stamped with wall time and global step,
//! as newline-delimited JSON in `<log_dir>/events.out.jsonl`. The file is
//! opened in append mode so resumed runs extend the same log.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::traits::{NoOpMonitor, TrainingMonitor};
use crate::config::MonitorConfig;
use crate::context::TrainerContext;
use crate::error::{MonitorError, Result};
use crate::summary::Summary;

/// File name of the event log inside the log directory
pub const EVENT_FILE: &str = "events.out.jsonl";

/// Version tag written as the first event of every session
pub const FILE_VERSION: &str = "entrenar.Event:1";

/// One line of the event log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Seconds since the Unix epoch
    pub wall_time: f64,
    pub step: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<Summary>,
}

impl Event {
    fn now(step: u64) -> Self {
        let wall_time = Utc::now().timestamp_micros() as f64 / 1e6;
        Self {
            wall_time,
            step,
            file_version: None,
            summary: None,
        }
    }
}

/// Writes summaries to the event log
#[derive(Debug)]
pub struct EventWriter {
    dir: PathBuf,
    writer: Option<BufWriter<File>>,
}

impl EventWriter {
    /// Writer logging under `dir`; the file is opened at setup
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            writer: None,
        }
    }

    /// Build the writer, or a no-op monitor when no log directory is configured
    pub fn create(config: &MonitorConfig) -> Box<dyn TrainingMonitor> {
        match &config.log_dir {
            Some(dir) => Box::new(Self::new(dir)),
            None => {
                log::warn!("Log directory was not set. Ignoring EventWriter.");
                Box::new(NoOpMonitor)
            }
        }
    }

    /// Path of the event log
    pub fn path(&self) -> PathBuf {
        self.dir.join(EVENT_FILE)
    }

    /// Whether the log file is currently open
    pub fn is_open(&self) -> bool {
        self.writer.is_some()
    }

    fn write_event(&mut self, event: &Event) -> Result<()> {
        let Some(writer) = self.writer.as_mut() else {
            return Ok(());
        };
        serde_json::to_writer(&mut *writer, event)?;
        writer.write_all(b"\n").map_err(|e| MonitorError::io("writing event log", e))
    }

    fn flush(&mut self) -> Result<()> {
        match self.writer.as_mut() {
            Some(writer) => writer
                .flush()
                .map_err(|e| MonitorError::io("flushing event log", e)),
            None => Ok(()),
        }
    }
}

/// Read back every event of a log file
pub fn read_events<P: AsRef<Path>>(path: P) -> Result<Vec<Event>> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .map_err(|e| MonitorError::io(format!("reading {}", path.display()), e))?;
    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str(line).map_err(MonitorError::from))
        .collect()
}

impl TrainingMonitor for EventWriter {
    fn setup_graph(&mut self, ctx: &TrainerContext) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .map_err(|e| MonitorError::io(format!("creating {}", self.dir.display()), e))?;
        let path = self.path();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| MonitorError::io(format!("opening {}", path.display()), e))?;
        self.writer = Some(BufWriter::new(file));

        let mut header = Event::now(ctx.global_step);
        header.file_version = Some(FILE_VERSION.to_string());
        self.write_event(&header)
    }

    fn put_summary(&mut self, ctx: &TrainerContext, summary: &Summary) -> Result<()> {
        let mut event = Event::now(ctx.global_step);
        event.summary = Some(summary.clone());
        self.write_event(&event)
    }

    fn trigger_epoch(&mut self, _ctx: &TrainerContext) -> Result<()> {
        self.flush()
    }

    fn teardown(&mut self) -> Result<()> {
        let result = self.flush();
        self.writer = None;
        result
    }

    fn name(&self) -> &'static str {
        "EventWriter"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summary::SummaryData;

    #[test]
    fn test_create_without_log_dir_is_noop() {
        let mut monitor = EventWriter::create(&MonitorConfig::default());
        assert_eq!(monitor.name(), "NoOpMonitor");
        let ctx = TrainerContext::new(1);
        assert!(monitor.setup_graph(&ctx).is_ok());
        assert!(monitor.put_summary(&ctx, &Summary::scalar("loss", 1.0)).is_ok());
        assert!(monitor.teardown().is_ok());
    }

    #[test]
    fn test_setup_writes_header() {
        let dir = tempfile::tempdir().expect("temp dir creation should succeed");
        let mut writer = EventWriter::new(dir.path().join("nested"));
        writer.setup_graph(&TrainerContext::new(1)).expect("setup should succeed");
        assert!(writer.is_open());
        writer.teardown().expect("teardown should succeed");

        let events = read_events(writer.path()).expect("events should load");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].file_version.as_deref(), Some(FILE_VERSION));
        assert!(events[0].summary.is_none());
    }

    #[test]
    fn test_summaries_are_stamped_with_global_step() {
        let dir = tempfile::tempdir().expect("temp dir creation should succeed");
        let mut writer = EventWriter::new(dir.path());
        let mut ctx = TrainerContext::new(4);
        writer.setup_graph(&ctx).expect("setup should succeed");

        let mut summary = Summary::scalar("tower0/loss-summary", 0.5);
        summary.push("note", SummaryData::Text("warmup".into()));
        ctx.begin_step(0);
        ctx.begin_step(1);
        writer.put_summary(&ctx, &summary).expect("put should succeed");
        writer.trigger_epoch(&ctx).expect("flush should succeed");

        let events = read_events(writer.path()).expect("events should load");
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].step, 2);
        assert_eq!(events[1].summary.as_ref(), Some(&summary));
        assert!(events[1].wall_time > 0.0);
    }

    #[test]
    fn test_non_finite_scalars_read_back() {
        let dir = tempfile::tempdir().expect("temp dir creation should succeed");
        let mut writer = EventWriter::new(dir.path());
        let ctx = TrainerContext::new(1);
        writer.setup_graph(&ctx).expect("setup should succeed");

        let mut summary = Summary::scalar("loss", f64::NAN);
        summary.push_scalar("grad_norm", f64::NEG_INFINITY);
        writer.put_summary(&ctx, &summary).expect("put should succeed");
        writer.teardown().expect("teardown should succeed");

        let events = read_events(writer.path()).expect("events should load");
        let logged = events[1].summary.as_ref().expect("summary event");
        let scalars: Vec<_> = logged.scalars().collect();
        assert!(scalars[0].1.is_nan());
        assert_eq!(scalars[1], ("grad_norm", f64::NEG_INFINITY));
    }

    #[test]
    fn test_reopen_appends() {
        let dir = tempfile::tempdir().expect("temp dir creation should succeed");
        let ctx = TrainerContext::new(1);
        for _ in 0..2 {
            let mut writer = EventWriter::new(dir.path());
            writer.setup_graph(&ctx).expect("setup should succeed");
            writer
                .put_summary(&ctx, &Summary::scalar("loss", 1.0))
                .expect("put should succeed");
            writer.teardown().expect("teardown should succeed");
        }
        let events = read_events(dir.path().join(EVENT_FILE)).expect("events should load");
        assert_eq!(events.len(), 4);
    }

    #[test]
    fn test_put_after_teardown_is_ignored() {
        let dir = tempfile::tempdir().expect("temp dir creation should succeed");
        let mut writer = EventWriter::new(dir.path());
        let ctx = TrainerContext::new(1);
        writer.setup_graph(&ctx).expect("setup should succeed");
        writer.teardown().expect("teardown should succeed");
        assert!(!writer.is_open());

        writer
            .put_summary(&ctx, &Summary::scalar("loss", 1.0))
            .expect("put should be ignored");
        writer.teardown().expect("second teardown should be a no-op");
        assert_eq!(read_events(writer.path()).expect("events should load").len(), 1);
    }

    #[test]
    fn test_read_events_missing_file() {
        let err = read_events("/nonexistent/events.out.jsonl").unwrap_err();
        assert!(matches!(err, MonitorError::Io { .. }));
    }
}
