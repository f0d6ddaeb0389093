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

/// Configuration for a progress indicator operation
#[derive(Debug, Clone)]
pub struct ProgressConfig {
    /// Operation name (e.g., "Syncing")
    pub operation: String,

    /// Context-specific message, usually the repository name
    pub context: String,

    /// Total units for determinate operations (None for indeterminate/spinner)
    pub total: Option<u64>,

    pub style: ProgressStyle,
}

impl ProgressConfig {
    pub fn new(
        operation: impl Into<String>,
        context: impl Into<String>,
        style: ProgressStyle,
    ) -> Self {
        Self {
            operation: operation.into(),
            context: context.into(),
            total: None,
            style,
        }
    }

    /// Sets the total for determinate operations
    pub fn with_total(mut self, total: u64) -> Self {
        self.total = Some(total);
        self
    }
}

/// Progress display style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProgressStyle {
    /// Progress bar showing a percentage (downloads)
    Percent,
    /// Progress bar with count display (batches of repositories)
    #[default]
    Count,
}

impl std::fmt::Display for ProgressStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Percent => write!(f, "percent"),
            Self::Count => write!(f, "count"),
        }
    }
}

/// Which renderer a [`ProgressFactory`](super::ProgressFactory) picked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressRendererKind {
    Tty,
    NonTty,
    Silent,
}
