//! Entrenar monitors: fan-out of training statistics to pluggable sinks
//!
//! The training loop pushes scalars and structured summaries into a single
//! [`Monitors`] hub. The hub hands everything, synchronously and in
//! registration order, to its sinks and keeps a scalar history that can be
//! queried for the latest value or the full series of any metric.
//!
//! # Example
//!
//! ```no_run
//! use entrenar_monitors::{MonitorConfig, Monitors, TrainerContext};
//!
//! # fn main() -> entrenar_monitors::Result<()> {
//! let config = MonitorConfig::default().with_log_dir("train_log/run-1");
//! let mut monitors = Monitors::from_config(&config);
//! monitors.setup(TrainerContext::new(2))?;
//!
//! for step in 0..2 {
//!     monitors.context_mut()?.begin_step(step);
//!     monitors.put_scalar("loss", 0.5 - 0.1 * step as f64)?;
//!     monitors.trigger_step()?;
//! }
//! monitors.trigger_epoch()?;
//! monitors.teardown()?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod monitor;
pub mod summary;

pub use config::{MonitorConfig, PrinterConfig};
pub use context::TrainerContext;
pub use error::{MonitorError, Result};
pub use monitor::{Monitors, TrainingMonitor};
pub use summary::{Summary, SummaryData, SummaryInput, SummaryValue};
