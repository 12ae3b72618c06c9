// Copyright Kani Contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use cdict_model::ProgressSink;
use std::sync::Mutex;
use tracing::info;

/// Logs the progress of a read each time it crosses a multiple of `step` percent.
pub struct LogProgress {
    step: f64,
    state: Mutex<State>,
}

struct State {
    done: f64,
    next_mark: f64,
}

impl LogProgress {
    pub fn new(step: f64) -> Self {
        LogProgress { step, state: Mutex::new(State { done: 0.0, next_mark: step }) }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for LogProgress {
    fn default() -> Self {
        LogProgress::new(10.0)
    }
}

impl ProgressSink for LogProgress {
    fn add_progress(&self, amount: f64) {
        let mut state = self.lock();
        state.done = (state.done + amount).min(100.0);
        // Rounding may leave the total a hair below 100.
        while state.next_mark <= 100.0 && state.done + 1e-6 >= state.next_mark {
            info!(percent = state.next_mark, "read_progress");
            state.next_mark += self.step;
        }
    }
}
