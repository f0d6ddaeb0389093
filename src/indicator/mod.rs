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

//! Progress indicator module for sync feedback
//!
//! This module provides a consistent interface for displaying the progress of
//! repository syncs. It supports animated progress bars, plain text lines, or
//! no output at all, depending on the environment and user preferences.

mod factory;
mod indicatif;
mod silent;
mod simple;
pub mod types;

pub use factory::ProgressFactory;
pub use indicatif::IndicatifProgress;
pub use silent::SilentProgress;
pub use simple::SimpleProgress;
pub use types::{ProgressConfig, ProgressRendererKind, ProgressStyle};

/// Core trait for progress indicator implementations
///
/// Implementations include:
/// - `IndicatifProgress` - Animated progress bars for terminal environments
/// - `SimpleProgress` - One line per finished operation for CI and logs
/// - `SilentProgress` - No output for the --no-progress flag
pub trait ProgressIndicator: Send + Sync {
    /// Start a new progress operation
    ///
    /// For determinate operations (with total), a progress bar is shown.
    /// For indeterminate operations (without total), a spinner is shown.
    fn start(&mut self, config: ProgressConfig);

    /// Update progress for determinate operations
    fn update(&mut self, current: u64, total: Option<u64>);

    fn set_message(&mut self, message: String);

    /// Complete the progress operation successfully
    ///
    /// `message` defaults to "Complete".
    fn complete(&mut self, message: Option<String>);

    /// Marks the operation as failed and displays an error message.
    fn error(&mut self, message: String);

    /// Creates an indicator rendered alongside this one, one per repository.
    fn create_child(&mut self) -> Box<dyn ProgressIndicator>;

    fn renderer_kind(&self) -> ProgressRendererKind;
}
