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

pub struct SilentProgress;

impl SilentProgress {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SilentProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressIndicator for SilentProgress {
    fn start(&mut self, _config: ProgressConfig) {}

    fn update(&mut self, _current: u64, _total: Option<u64>) {}

    fn set_message(&mut self, _message: String) {}

    fn complete(&mut self, _message: Option<String>) {}

    fn error(&mut self, _message: String) {
        // Errors are reported by the command's exit path.
    }

    fn create_child(&mut self) -> Box<dyn ProgressIndicator> {
        Box::new(SilentProgress::new())
    }

    fn renderer_kind(&self) -> ProgressRendererKind {
        ProgressRendererKind::Silent
    }
}
