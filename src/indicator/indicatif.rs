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

use crate::indicator::{ProgressConfig, ProgressIndicator, ProgressRendererKind, ProgressStyle};
use indicatif::{MultiProgress, ProgressBar};
use std::sync::Arc;
use std::time::Duration;

pub struct IndicatifProgress {
    progress_bar: Option<ProgressBar>,
    multi_progress: Arc<MultiProgress>,
}

impl IndicatifProgress {
    pub fn new() -> Self {
        Self {
            progress_bar: None,
            multi_progress: Arc::new(MultiProgress::new()),
        }
    }

    fn new_with_parent(multi_progress: Arc<MultiProgress>) -> Self {
        Self {
            progress_bar: None,
            multi_progress,
        }
    }

    fn create_template(&self, config: &ProgressConfig) -> String {
        match (&config.total, &config.style) {
            (Some(_), ProgressStyle::Percent) => {
                "{spinner:.green} {prefix} [{bar:40.cyan/blue}] {percent:>3}% {msg}"
            }
            (Some(_), ProgressStyle::Count) => {
                "{spinner:.green} {prefix} [{bar:40.cyan/blue}] {pos}/{len} {msg}"
            }
            (None, _) => "{spinner:.green} {prefix} {msg}",
        }
        .to_string()
    }

    fn bar_style(&self, config: &ProgressConfig) -> indicatif::ProgressStyle {
        // Templates are fixed strings, a parse failure only loses the layout.
        indicatif::ProgressStyle::default_bar()
            .template(&self.create_template(config))
            .unwrap_or_else(|_| indicatif::ProgressStyle::default_bar())
            .progress_chars("█▓░")
            .tick_chars("⣾⣽⣻⢿⡿⣟⣯⣷")
    }
}

impl Default for IndicatifProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressIndicator for IndicatifProgress {
    fn start(&mut self, config: ProgressConfig) {
        let pb = match config.total {
            Some(total) => ProgressBar::new(total),
            None => ProgressBar::new_spinner(),
        };

        pb.set_style(self.bar_style(&config));
        pb.set_prefix(format!("{} {}", config.operation, config.context));
        pb.enable_steady_tick(Duration::from_millis(100));

        let pb = self.multi_progress.add(pb);
        self.progress_bar = Some(pb);
    }

    fn update(&mut self, current: u64, total: Option<u64>) {
        if let Some(pb) = &self.progress_bar {
            if let Some(total) = total {
                pb.set_length(total);
            }
            pb.set_position(current);
        }
    }

    fn set_message(&mut self, message: String) {
        if let Some(pb) = &self.progress_bar {
            pb.set_message(message);
        }
    }

    fn complete(&mut self, message: Option<String>) {
        if let Some(pb) = &self.progress_bar {
            let msg = message.unwrap_or_else(|| "Complete".to_string());
            pb.finish_with_message(msg);
        }
    }

    fn error(&mut self, message: String) {
        if let Some(pb) = &self.progress_bar {
            pb.abandon_with_message(format!("✗ {message}"));
        }
    }

    fn create_child(&mut self) -> Box<dyn ProgressIndicator> {
        Box::new(IndicatifProgress::new_with_parent(Arc::clone(
            &self.multi_progress,
        )))
    }

    fn renderer_kind(&self) -> ProgressRendererKind {
        ProgressRendererKind::Tty
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_bar_creation() {
        let mut progress = IndicatifProgress::new();
        let config =
            ProgressConfig::new("Syncing", "fdroid", ProgressStyle::Percent).with_total(100);
        progress.start(config);

        assert!(progress.progress_bar.is_some());
    }

    #[test]
    fn test_template_selection_percent_with_total() {
        let progress = IndicatifProgress::new();
        let config = ProgressConfig::new("Syncing", "repo", ProgressStyle::Percent).with_total(100);

        let template = progress.create_template(&config);
        assert!(template.contains("{percent"));
        assert!(template.contains("{bar:"));
    }

    #[test]
    fn test_template_selection_count_with_total() {
        let progress = IndicatifProgress::new();
        let config = ProgressConfig::new("Syncing", "repos", ProgressStyle::Count).with_total(3);

        let template = progress.create_template(&config);
        assert!(template.contains("{pos}"));
        assert!(template.contains("{len}"));
    }

    #[test]
    fn test_template_selection_indeterminate() {
        let progress = IndicatifProgress::new();
        let config = ProgressConfig::new("Syncing", "repo", ProgressStyle::Percent);

        let template = progress.create_template(&config);
        assert!(!template.contains("{bar:"));
        assert!(template.contains("{spinner"));
    }

    #[test]
    fn test_lifecycle_does_not_panic() {
        let mut progress = IndicatifProgress::new();
        progress.start(ProgressConfig::new("Syncing", "repo", ProgressStyle::Percent).with_total(100));
        progress.update(25, None);
        progress.set_message("downloading".to_string());
        progress.update(100, Some(100));
        progress.complete(Some("updated".to_string()));
        assert!(progress.progress_bar.is_some());

        let mut failed = IndicatifProgress::new();
        failed.start(ProgressConfig::new("Syncing", "other", ProgressStyle::Percent));
        failed.error("fingerprint mismatch".to_string());
    }

    #[test]
    fn test_create_child_shares_multiprogress() {
        let mut parent = IndicatifProgress::new();
        let mut child = parent.create_child();
        child.start(ProgressConfig::new("Syncing", "child", ProgressStyle::Percent).with_total(100));
        child.update(50, None);
        child.complete(None);
        assert_eq!(child.renderer_kind(), ProgressRendererKind::Tty);
    }
}
