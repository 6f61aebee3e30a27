//! Core trait for training monitors
//!
//! - `TrainingMonitor` - The lifecycle every sink implements
//! - `NoOpMonitor` - Stand-in for sinks whose output resource is unset

use crate::context::TrainerContext;
use crate::error::Result;
use crate::summary::Summary;

/// Trait for sinks of training statistics
///
/// All methods have default no-op implementations, so a sink only
/// implements the events it cares about. The hub calls them synchronously,
/// one sink at a time, in registration order.
pub trait TrainingMonitor: Send {
    /// Called once before training starts
    fn setup_graph(&mut self, _ctx: &TrainerContext) -> Result<()> {
        Ok(())
    }

    /// Called with every structured summary, unchanged
    fn put_summary(&mut self, _ctx: &TrainerContext, _summary: &Summary) -> Result<()> {
        Ok(())
    }

    /// Called with every scalar, after tag normalization
    fn put_scalar(&mut self, _ctx: &TrainerContext, _name: &str, _value: f64) -> Result<()> {
        Ok(())
    }

    /// Called after each training step
    fn trigger_step(&mut self, _ctx: &TrainerContext) -> Result<()> {
        Ok(())
    }

    /// Called after each epoch
    fn trigger_epoch(&mut self, _ctx: &TrainerContext) -> Result<()> {
        Ok(())
    }

    /// Called once after training ends; release files and flush buffers
    fn teardown(&mut self) -> Result<()> {
        Ok(())
    }

    /// Get monitor name for logging
    fn name(&self) -> &'static str {
        "TrainingMonitor"
    }
}

/// Monitor that ignores everything
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NoOpMonitor;

impl TrainingMonitor for NoOpMonitor {
    fn name(&self) -> &'static str {
        "NoOpMonitor"
    }
}
