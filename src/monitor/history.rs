//! In-memory scalar history kept by the hub

use std::collections::HashMap;

use super::traits::TrainingMonitor;
use crate::context::TrainerContext;
use crate::error::{MonitorError, Result};

/// Append-only history of every scalar series seen by the hub
#[derive(Debug, Default)]
pub struct ScalarHistory {
    series: HashMap<String, Vec<f64>>,
}

impl ScalarHistory {
    /// Create an empty history
    pub fn new() -> Self {
        Self {
            series: HashMap::new(),
        }
    }

    /// Append `value` to the series `name`, creating it on first use
    pub fn record(&mut self, name: &str, value: f64) {
        match self.series.get_mut(name) {
            Some(values) => values.push(value),
            None => {
                self.series.insert(name.to_string(), vec![value]);
            }
        }
    }

    /// Most recent value of `name`
    ///
    /// Fails with [`MonitorError::NotFound`] when nothing was recorded.
    pub fn latest(&self, name: &str) -> Result<f64> {
        self.series
            .get(name)
            .and_then(|values| values.last().copied())
            .ok_or_else(|| MonitorError::NotFound {
                name: name.to_string(),
            })
    }

    /// All values of `name` in the order they were recorded
    ///
    /// Unseen names yield an empty slice.
    pub fn history(&self, name: &str) -> &[f64] {
        self.series.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Names of all series, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.series.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of series
    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

impl TrainingMonitor for ScalarHistory {
    fn put_scalar(&mut self, _ctx: &TrainerContext, name: &str, value: f64) -> Result<()> {
        self.record(name, value);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "ScalarHistory"
    }
}
