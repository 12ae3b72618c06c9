// Copyright Kani Contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Progress reporting. Progress is advisory: nothing depends on it being reported.

use std::sync::Mutex;

/// Receives progress of a task, in percent of the whole task.
pub trait ProgressSink: Send + Sync {
    fn add_progress(&self, amount: f64);
}

/// Discards all progress.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn add_progress(&self, _amount: f64) {}
}

/// A part of a larger task that accounts for `weight` percent of it.
///
/// The subtask counts from 0 to 100 on its own and forwards the scaled amounts to its
/// parent. Progress past 100 is dropped.
pub struct SubtaskProgress<'a> {
    parent: &'a dyn ProgressSink,
    weight: f64,
    done: Mutex<f64>,
}

impl<'a> SubtaskProgress<'a> {
    pub fn new(parent: &'a dyn ProgressSink, weight: f64) -> Self {
        SubtaskProgress { parent, weight, done: Mutex::new(0.0) }
    }

    /// How much of the subtask is done, in percent.
    pub fn done(&self) -> f64 {
        *self.done.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ProgressSink for SubtaskProgress<'_> {
    fn add_progress(&self, amount: f64) {
        let mut done = self.done.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let amount = amount.clamp(0.0, 100.0 - *done);
        *done += amount;
        self.parent.add_progress(amount * self.weight / 100.0);
    }
}
