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

use crate::indicator::{IndicatifProgress, ProgressIndicator, SilentProgress, SimpleProgress};
use std::env;
use std::io::IsTerminal;

pub struct ProgressFactory;

impl ProgressFactory {
    pub fn create(no_progress: bool) -> Box<dyn ProgressIndicator> {
        if no_progress {
            Box::new(SilentProgress)
        } else if Self::env_flag("FDSYNC_FORCE_TTY_PROGRESS") {
            Box::new(IndicatifProgress::new())
        } else if Self::env_flag("FDSYNC_NO_TTY_PROGRESS") || Self::should_use_simple_progress() {
            Box::new(SimpleProgress::new())
        } else {
            Box::new(IndicatifProgress::new())
        }
    }

    fn env_flag(name: &str) -> bool {
        env::var(name)
            .map(|value| match value.trim() {
                "" => true,
                v if v.eq_ignore_ascii_case("0") => false,
                v if v.eq_ignore_ascii_case("false") => false,
                _ => true,
            })
            .unwrap_or(false)
    }

    fn should_use_simple_progress() -> bool {
        if !std::io::stderr().is_terminal() {
            return true;
        }

        if env::var("CI").is_ok() {
            return true;
        }

        if let Ok(term) = env::var("TERM")
            && term == "dumb"
        {
            return true;
        }

        // https://no-color.org/
        env::var("NO_COLOR").is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicator::ProgressRendererKind;
    use serial_test::serial;

    struct EnvGuard {
        vars: Vec<(String, Option<String>)>,
    }

    impl EnvGuard {
        fn new() -> Self {
            Self { vars: Vec::new() }
        }

        fn set(&mut self, key: &str, value: &str) {
            let old = env::var(key).ok();
            self.vars.push((key.to_string(), old));
            unsafe {
                env::set_var(key, value);
            }
        }

        fn remove(&mut self, key: &str) {
            let old = env::var(key).ok();
            self.vars.push((key.to_string(), old));
            unsafe {
                env::remove_var(key);
            }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            for (key, value) in self.vars.iter().rev() {
                match value {
                    Some(v) => unsafe { env::set_var(key, v) },
                    None => unsafe { env::remove_var(key) },
                }
            }
        }
    }

    #[test]
    #[serial]
    fn test_no_progress_flag_takes_precedence() {
        let mut env_guard = EnvGuard::new();
        env_guard.set("FDSYNC_FORCE_TTY_PROGRESS", "1");
        env_guard.set("CI", "true");

        let progress = ProgressFactory::create(true);
        assert_eq!(progress.renderer_kind(), ProgressRendererKind::Silent);
    }

    #[test]
    #[serial]
    fn test_force_tty_progress_flag_overrides_detection() {
        let mut env_guard = EnvGuard::new();
        env_guard.set("FDSYNC_FORCE_TTY_PROGRESS", "1");
        env_guard.remove("FDSYNC_NO_TTY_PROGRESS");
        env_guard.set("CI", "true");

        let progress = ProgressFactory::create(false);
        assert_eq!(progress.renderer_kind(), ProgressRendererKind::Tty);
    }

    #[test]
    #[serial]
    fn test_no_tty_flag_forces_simple_progress() {
        let mut env_guard = EnvGuard::new();
        env_guard.set("FDSYNC_NO_TTY_PROGRESS", "1");
        env_guard.remove("FDSYNC_FORCE_TTY_PROGRESS");
        env_guard.remove("CI");

        let progress = ProgressFactory::create(false);
        assert_eq!(progress.renderer_kind(), ProgressRendererKind::NonTty);
    }

    #[test]
    #[serial]
    fn test_false_flag_values_are_ignored() {
        let mut env_guard = EnvGuard::new();
        env_guard.set("FDSYNC_FORCE_TTY_PROGRESS", "false");
        env_guard.set("FDSYNC_NO_TTY_PROGRESS", "0");
        env_guard.set("CI", "true");

        let progress = ProgressFactory::create(false);
        assert_eq!(progress.renderer_kind(), ProgressRendererKind::NonTty);
    }

    #[test]
    #[serial]
    fn test_should_use_simple_progress_in_ci() {
        let mut env_guard = EnvGuard::new();
        env_guard.set("CI", "true");

        assert!(ProgressFactory::should_use_simple_progress());
    }

    #[test]
    #[serial]
    fn test_should_use_simple_progress_with_dumb_term() {
        let mut env_guard = EnvGuard::new();
        env_guard.set("TERM", "dumb");
        env_guard.remove("CI");

        assert!(ProgressFactory::should_use_simple_progress());
    }
}
