//! JSON stat writer
//!
//! Groups scalars by the step or epoch boundary they were flushed at and
//! keeps the whole row sequence in `<log_dir>/stat.json`.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use super::traits::{NoOpMonitor, TrainingMonitor};
use crate::config::MonitorConfig;
use crate::context::TrainerContext;
use crate::error::{MonitorError, Result};
use crate::summary::scalar_to_json;

/// File name of the stat file inside the log directory
pub const STAT_FILE: &str = "stat.json";

/// One flushed group of scalars
pub type StatRow = Map<String, Value>;

/// Writes every scalar to a JSON array of rows, one row per flush
#[derive(Debug)]
pub struct JsonWriter {
    path: PathBuf,
    rows: Vec<StatRow>,
    pending: StatRow,
}

impl JsonWriter {
    /// Writer persisting to `<dir>/stat.json`
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            path: dir.as_ref().join(STAT_FILE),
            rows: Vec::new(),
            pending: Map::new(),
        }
    }

    /// Build the writer, or a no-op monitor when no log directory is configured
    pub fn create(config: &MonitorConfig) -> Box<dyn TrainingMonitor> {
        match &config.log_dir {
            Some(dir) => Box::new(Self::new(dir)),
            None => {
                log::warn!("Log directory was not set. Ignoring JsonWriter.");
                Box::new(NoOpMonitor)
            }
        }
    }

    /// Path of the stat file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rows flushed so far, including resumed ones
    pub fn rows(&self) -> &[StatRow] {
        &self.rows
    }

    /// Scalars waiting for the next flush
    pub fn pending(&self) -> &StatRow {
        &self.pending
    }

    fn load_existing(&mut self) -> Result<()> {
        if !self.path.is_file() {
            return Ok(());
        }
        log::info!("Found existing JSON at {}, will append to it.", self.path.display());
        let content = fs::read_to_string(&self.path)
            .map_err(|e| MonitorError::io(format!("reading {}", self.path.display()), e))?;
        let corrupt = |message: String| MonitorError::CorruptStats {
            path: self.path.clone(),
            message,
        };

        let parsed: Value = serde_json::from_str(&content).map_err(|e| corrupt(e.to_string()))?;
        let items = match parsed {
            Value::Array(items) => items,
            other => {
                return Err(corrupt(format!(
                    "expected an array of rows, found {}",
                    kind_of(&other)
                )))
            }
        };
        let mut rows = Vec::with_capacity(items.len());
        for (i, item) in items.into_iter().enumerate() {
            match item {
                Value::Object(row) => rows.push(row),
                other => {
                    return Err(corrupt(format!(
                        "row {i} is {}, not an object",
                        kind_of(&other)
                    )))
                }
            }
        }
        self.rows = rows;
        Ok(())
    }

    /// Move the pending row into the stat file
    ///
    /// Idempotent: nothing happens while no scalar is pending.
    pub fn push(&mut self, ctx: &TrainerContext) {
        if self.pending.is_empty() {
            return;
        }
        let mut row = std::mem::take(&mut self.pending);
        row.insert("epoch_num".to_string(), Value::from(ctx.epoch_num));
        row.insert("global_step".to_string(), Value::from(ctx.global_step));
        self.rows.push(row);

        if let Err(e) = self.write_stats() {
            log::error!("Exception in JsonWriter::write_stats: {e}");
        }
    }

    fn write_stats(&self) -> Result<()> {
        let tmp_path = self.path.with_file_name(format!("{STAT_FILE}.tmp"));
        let json = serde_json::to_string(&self.rows)?;
        fs::write(&tmp_path, json)
            .map_err(|e| MonitorError::io(format!("writing {}", tmp_path.display()), e))?;
        fs::rename(&tmp_path, &self.path)
            .map_err(|e| MonitorError::io(format!("replacing {}", self.path.display()), e))
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

impl TrainingMonitor for JsonWriter {
    fn setup_graph(&mut self, _ctx: &TrainerContext) -> Result<()> {
        self.load_existing()
    }

    fn put_scalar(&mut self, _ctx: &TrainerContext, name: &str, value: f64) -> Result<()> {
        self.pending.insert(name.to_string(), scalar_to_json(value));
        Ok(())
    }

    fn trigger_step(&mut self, ctx: &TrainerContext) -> Result<()> {
        // the epoch trigger right after the last step flushes instead
        if !ctx.is_last_step() {
            self.push(ctx);
        }
        Ok(())
    }

    fn trigger_epoch(&mut self, ctx: &TrainerContext) -> Result<()> {
        self.push(ctx);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "JsonWriter"
    }
}
