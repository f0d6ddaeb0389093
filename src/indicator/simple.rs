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

use crate::indicator::{ProgressConfig, ProgressIndicator, ProgressRendererKind};

/// Prints one line when an operation finishes, nothing while it runs.
pub struct SimpleProgress {
    operation: String,
    context: String,
}

impl SimpleProgress {
    pub fn new() -> Self {
        Self {
            operation: String::new(),
            context: String::new(),
        }
    }

    fn line(&self, symbol: char, message: &str) -> String {
        format!("{symbol} {} {} - {message}", self.operation, self.context)
    }
}

impl Default for SimpleProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressIndicator for SimpleProgress {
    fn start(&mut self, config: ProgressConfig) {
        self.operation = config.operation;
        self.context = config.context;
    }

    fn update(&mut self, _current: u64, _total: Option<u64>) {
        // No update output in simple mode to avoid log spam
    }

    fn set_message(&mut self, _message: String) {}

    fn complete(&mut self, message: Option<String>) {
        let msg = message.unwrap_or_else(|| "Complete".to_string());
        println!("{}", self.line('✓', &msg));
    }

    fn error(&mut self, message: String) {
        eprintln!("{}", self.line('✗', &message));
    }

    fn create_child(&mut self) -> Box<dyn ProgressIndicator> {
        Box::new(SimpleProgress::new())
    }

    fn renderer_kind(&self) -> ProgressRendererKind {
        ProgressRendererKind::NonTty
    }
}
