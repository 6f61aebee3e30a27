//! Monitor hub for dispatching training statistics to multiple sinks

use serde_json::Value;

use super::event_writer::EventWriter;
use super::history::ScalarHistory;
use super::json_writer::JsonWriter;
use super::printer::ScalarPrinter;
use super::traits::TrainingMonitor;
use crate::config::MonitorConfig;
use crate::context::TrainerContext;
use crate::error::{MonitorError, Result};
use crate::summary::{normalize_tag, Summary, SummaryInput};

/// Merges monitors together for the trainer to use
///
/// Every summary and scalar is delivered to the registered monitors in
/// registration order and then to an internal [`ScalarHistory`], which backs
/// [`get_latest`](Self::get_latest) and [`get_history`](Self::get_history).
///
/// # Example
///
/// ```
/// use entrenar_monitors::{Monitors, TrainerContext};
///
/// # fn main() -> entrenar_monitors::Result<()> {
/// let mut monitors = Monitors::new(Vec::new());
/// monitors.setup(TrainerContext::new(2))?;
///
/// monitors.context_mut()?.begin_step(0);
/// monitors.put_scalar("loss", 0.5)?;
/// monitors.trigger_step()?;
///
/// assert_eq!(monitors.get_latest("loss")?, 0.5);
/// monitors.teardown()?;
/// # Ok(())
/// # }
/// ```
pub struct Monitors {
    monitors: Vec<Box<dyn TrainingMonitor>>,
    history: ScalarHistory,
    context: Option<TrainerContext>,
    /// Monitors whose `setup_graph` already succeeded
    set_up: usize,
    torn_down: bool,
}

impl Monitors {
    /// Create a hub over `monitors`
    pub fn new(monitors: Vec<Box<dyn TrainingMonitor>>) -> Self {
        Self {
            monitors,
            history: ScalarHistory::new(),
            context: None,
            set_up: 0,
            torn_down: false,
        }
    }

    /// Create a hub with the default monitors: event log, JSON stats, console printer
    ///
    /// File-backed monitors fall back to no-ops when `config.log_dir` is unset.
    pub fn from_config(config: &MonitorConfig) -> Self {
        Self::new(vec![
            EventWriter::create(config),
            JsonWriter::create(config),
            Box::new(ScalarPrinter::from_config(&config.printer)),
        ])
    }

    /// Number of registered monitors, not counting the internal history
    pub fn len(&self) -> usize {
        self.monitors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.monitors.is_empty()
    }

    /// Names of the registered monitors in dispatch order
    pub fn names(&self) -> Vec<&'static str> {
        self.monitors.iter().map(|m| m.name()).collect()
    }

    /// Bind the hub to the trainer and set up every monitor
    ///
    /// If a monitor fails, calling this again resumes with that monitor;
    /// the ones before it are not set up twice.
    pub fn setup(&mut self, ctx: TrainerContext) -> Result<()> {
        if self.context.is_some() {
            return Err(MonitorError::AlreadySetUp);
        }
        for m in &mut self.monitors[self.set_up..] {
            m.setup_graph(&ctx)?;
            self.set_up += 1;
        }
        self.history.setup_graph(&ctx)?;
        self.context = Some(ctx);
        Ok(())
    }

    /// Current trainer context
    pub fn context(&self) -> Result<&TrainerContext> {
        self.context.as_ref().ok_or(MonitorError::NotSetUp)
    }

    /// Mutable trainer context, for the loop to advance its counters
    pub fn context_mut(&mut self) -> Result<&mut TrainerContext> {
        self.context.as_mut().ok_or(MonitorError::NotSetUp)
    }

    /// Replace the trainer context wholesale
    pub fn set_context(&mut self, ctx: TrainerContext) -> Result<()> {
        let current = self.context.as_mut().ok_or(MonitorError::NotSetUp)?;
        *current = ctx;
        Ok(())
    }

    /// Process a summary, decoding it first if it is still serialized
    ///
    /// The summary goes to every monitor unchanged; its scalar values are
    /// then dispatched under their normalized names.
    pub fn put_summary(&mut self, summary: impl Into<SummaryInput>) -> Result<()> {
        let summary = summary.into().into_summary()?;
        self.dispatch_summary(&summary)?;
        for (tag, value) in summary.scalars() {
            self.dispatch_scalar(&normalize_tag(tag), value)?;
        }
        Ok(())
    }

    /// Process a key-value pair, coercing the value to a scalar
    pub fn put(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        let value = coerce_scalar(name, &value.into())?;
        self.put_scalar(name, value)
    }

    /// Process a scalar
    ///
    /// Monitors see it on both channels: as a scalar, then as a one-value summary.
    pub fn put_scalar(&mut self, name: &str, value: f64) -> Result<()> {
        self.dispatch_scalar(name, value)?;
        self.dispatch_summary(&Summary::scalar(name, value))
    }

    /// Forward a step boundary to every monitor
    pub fn trigger_step(&mut self) -> Result<()> {
        let ctx = self.context.as_ref().ok_or(MonitorError::NotSetUp)?;
        for m in &mut self.monitors {
            m.trigger_step(ctx)?;
        }
        self.history.trigger_step(ctx)
    }

    /// Forward an epoch boundary to every monitor
    pub fn trigger_epoch(&mut self) -> Result<()> {
        let ctx = self.context.as_ref().ok_or(MonitorError::NotSetUp)?;
        for m in &mut self.monitors {
            m.trigger_epoch(ctx)?;
        }
        self.history.trigger_epoch(ctx)
    }

    /// Latest value of a scalar series
    pub fn get_latest(&self, name: &str) -> Result<f64> {
        self.history.latest(name)
    }

    /// All values of a scalar series in the order they arrived
    pub fn get_history(&self, name: &str) -> &[f64] {
        self.history.history(name)
    }

    /// The internal scalar history
    pub fn history(&self) -> &ScalarHistory {
        &self.history
    }

    /// Tear down every monitor
    ///
    /// A failing monitor does not stop the others from being torn down;
    /// all failures are reported together. Calling this again does nothing.
    pub fn teardown(&mut self) -> Result<()> {
        if self.torn_down {
            return Ok(());
        }
        self.torn_down = true;

        let mut failures = Vec::new();
        for m in &mut self.monitors {
            if let Err(e) = m.teardown() {
                log::error!("Monitor {} failed during teardown: {e}", m.name());
                failures.push(e);
            }
        }
        if let Err(e) = self.history.teardown() {
            failures.push(e);
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(MonitorError::Teardown { failures })
        }
    }

    fn dispatch_summary(&mut self, summary: &Summary) -> Result<()> {
        let ctx = self.context.as_ref().ok_or(MonitorError::NotSetUp)?;
        for m in &mut self.monitors {
            m.put_summary(ctx, summary)?;
        }
        self.history.put_summary(ctx, summary)
    }

    fn dispatch_scalar(&mut self, name: &str, value: f64) -> Result<()> {
        let ctx = self.context.as_ref().ok_or(MonitorError::NotSetUp)?;
        for m in &mut self.monitors {
            m.put_scalar(ctx, name, value)?;
        }
        self.history.put_scalar(ctx, name, value)
    }
}

impl std::fmt::Debug for Monitors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Monitors")
            .field("monitors", &self.names())
            .field("history", &self.history)
            .field("context", &self.context)
            .field("torn_down", &self.torn_down)
            .finish()
    }
}

/// Coerce a loosely typed value to `f64`
///
/// Numbers, booleans and numeric strings are accepted; anything else is a
/// [`MonitorError::NonNumeric`].
pub fn coerce_scalar(name: &str, value: &Value) -> Result<f64> {
    let scalar = match value {
        Value::Number(n) => n.as_f64(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    };
    scalar.ok_or_else(|| MonitorError::NonNumeric {
        name: name.to_string(),
        value: value.to_string(),
    })
}
