//! Trainer state visible to monitors
//!
//! The training loop owns the counters; the hub keeps a copy that the loop
//! advances between steps and hands it to every monitor hook.

/// Counters of the training run a monitor may stamp its output with
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrainerContext {
    /// Current epoch (1-indexed)
    pub epoch_num: usize,
    /// Current step within the epoch (0-indexed)
    pub local_step: usize,
    /// Steps run so far, including the current one
    pub global_step: u64,
    /// Total steps in an epoch
    pub steps_per_epoch: usize,
}

impl TrainerContext {
    /// Context for a fresh run, before the first step
    pub fn new(steps_per_epoch: usize) -> Self {
        Self {
            epoch_num: 1,
            local_step: 0,
            global_step: 0,
            steps_per_epoch,
        }
    }

    /// Context for a run resumed at `epoch_num` with `global_step` steps done
    pub fn resume(epoch_num: usize, global_step: u64, steps_per_epoch: usize) -> Self {
        Self {
            epoch_num,
            local_step: 0,
            global_step,
            steps_per_epoch,
        }
    }

    /// Enter step `local_step` of the current epoch
    pub fn begin_step(&mut self, local_step: usize) {
        self.local_step = local_step;
        self.global_step += 1;
    }

    /// Enter epoch `epoch_num`
    pub fn begin_epoch(&mut self, epoch_num: usize) {
        self.epoch_num = epoch_num;
        self.local_step = 0;
    }

    /// Whether the current step is the last one of its epoch
    ///
    /// The epoch trigger fires right after this step, so step-level sinks
    /// use it to avoid emitting the same data twice.
    pub fn is_last_step(&self) -> bool {
        self.steps_per_epoch > 0 && self.local_step + 1 == self.steps_per_epoch
    }
}

impl Default for TrainerContext {
    fn default() -> Self {
        Self::new(0)
    }
}
