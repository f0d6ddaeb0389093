// Copyright 2025 dentsusoken
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use super::ProgressReporter;

/// Percentage of a download, `-1` when the total size is unknown. Never
/// above 100, even when the server announced too small a length.
pub fn percent(bytes: u64, total: u64) -> i32 {
    if total == 0 {
        return -1;
    }
    (bytes.saturating_mul(100) / total).min(100) as i32
}

type PercentCallback = Box<dyn FnMut(i32) + Send + Sync>;

/// Turns byte counts into percentage callbacks, skipping repeated values.
pub struct PercentProgressReporter {
    total: u64,
    last: Option<i32>,
    callback: PercentCallback,
}

impl PercentProgressReporter {
    pub fn new(callback: impl FnMut(i32) + Send + Sync + 'static) -> Self {
        Self {
            total: 0,
            last: None,
            callback: Box::new(callback),
        }
    }

    fn emit(&mut self, value: i32) {
        if self.last != Some(value) {
            self.last = Some(value);
            (self.callback)(value);
        }
    }
}

impl ProgressReporter for PercentProgressReporter {
    fn on_start(&mut self, total_bytes: u64) {
        self.total = total_bytes;
        self.last = None;
        self.emit(percent(0, total_bytes));
    }

    fn on_progress(&mut self, bytes_downloaded: u64) {
        self.emit(percent(bytes_downloaded, self.total));
    }

    fn on_complete(&mut self) {
        if self.total > 0 {
            self.emit(100);
        }
    }
}
