//! Monitors for training statistics
//!
//! A [`Monitors`] hub receives scalars and summaries from the training loop
//! and fans them out to its sinks:
//! - [`EventWriter`] - every summary, verbatim, to an event log
//! - [`JsonWriter`] - scalars grouped per step/epoch into `stat.json`
//! - [`ScalarPrinter`] - scalars to the console
//! - [`ScalarHistory`] - the hub's own record, queried via `get_latest`/`get_history`
//!
//! # Example
//!
//! ```rust
//! use entrenar_monitors::monitor::{Monitors, ScalarPrinter, TrainingMonitor};
//! use entrenar_monitors::TrainerContext;
//!
//! # fn main() -> entrenar_monitors::Result<()> {
//! let sinks: Vec<Box<dyn TrainingMonitor>> = vec![Box::new(ScalarPrinter::new(false, true))];
//! let mut monitors = Monitors::new(sinks);
//! monitors.setup(TrainerContext::new(100))?;
//! monitors.put_scalar("loss", 0.25)?;
//! monitors.trigger_epoch()?;
//! # Ok(())
//! # }
//! ```

mod event_writer;
mod history;
mod hub;
mod json_writer;
mod printer;
mod traits;

pub use event_writer::{read_events, Event, EventWriter, EVENT_FILE, FILE_VERSION};
pub use history::ScalarHistory;
pub use hub::{coerce_scalar, Monitors};
pub use json_writer::{JsonWriter, StatRow, STAT_FILE};
pub use printer::{format_general, ScalarPrinter};
pub use traits::{NoOpMonitor, TrainingMonitor};
