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

use crate::config::{FdsyncConfig, RepoConfig};
use crate::download::{AttohttpcClient, HttpClient};
use crate::error::Result;
use crate::indicator::{
    ProgressConfig, ProgressFactory, ProgressIndicator, ProgressRendererKind, ProgressStyle,
};
use crate::models::{Repo, RepoId};
use crate::sync::{FileIndexStore, SyncObserver, SyncReport, SyncState, Syncer, signal_token};
use colored::Colorize;
use log::{debug, warn};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub struct SyncCommand<'a> {
    config: &'a FdsyncConfig,
    no_progress: bool,
}

impl<'a> SyncCommand<'a> {
    pub fn new(config: &'a FdsyncConfig, no_progress: bool) -> Result<Self> {
        Ok(Self {
            config,
            no_progress,
        })
    }

    /// Syncs the named repositories, or all of them when `names` is empty.
    ///
    /// With `force` the stored sync cursor is ignored and every repository
    /// downloads its full index. Pins are always kept.
    pub fn execute(&self, names: &[String], jobs: Option<usize>, force: bool) -> Result<()> {
        let selected = self.select(names)?;
        if selected.is_empty() {
            println!("No repositories configured");
            println!("Use 'fdsync repo add <NAME> <ADDRESS>' to add one");
            return Ok(());
        }

        let store = Arc::new(FileIndexStore::new(self.config.home()));
        let repos = selected
            .iter()
            .map(|repo| prepare_repo(&store, repo, force))
            .collect::<Result<Vec<_>>>()?;

        let mut client = AttohttpcClient::new();
        client.set_timeout(self.config.sync.timeout());

        let mut progress = ProgressFactory::create(self.no_progress);
        let observer = Arc::new(ProgressObserver::start(progress.as_mut(), &repos));
        let syncer = Syncer::new(Arc::new(client), store)
            .with_observer(observer.clone())
            .with_cancellation(signal_token())
            .with_max_download_size(self.config.sync.max_download_size)
            .with_concurrency(jobs.unwrap_or(self.config.sync.concurrency));

        let results = syncer.sync_all(&repos);
        let silent = progress.renderer_kind() == ProgressRendererKind::Silent;

        let total = results.len();
        let mut reports = Vec::new();
        let mut failures = Vec::new();
        for (id, result) in results {
            match result {
                Ok(report) => {
                    if silent {
                        println!("{} {id}: {}", "✓".green(), report.outcome);
                    }
                    reports.push(report);
                }
                Err(e) => {
                    if silent {
                        eprintln!("{} {id}: {e}", "✗".red());
                    }
                    failures.push((id, e));
                }
            }
        }

        let summary = format!("{} of {total} repositories synced", reports.len());
        observer.finish(&summary, failures.is_empty());
        self.persist_pins(&reports)?;

        if silent {
            println!("{summary}");
        }

        let mut failures = failures.into_iter();
        match failures.next() {
            None => Ok(()),
            Some((id, first)) => {
                for (other, e) in failures {
                    warn!("{other}: {e}");
                }
                debug!("First failure was {id}");
                Err(first)
            }
        }
    }

    fn select(&self, names: &[String]) -> Result<Vec<RepoConfig>> {
        if names.is_empty() {
            return Ok(self.config.repos.clone());
        }
        names
            .iter()
            .map(|name| self.config.find_repo(name).cloned())
            .collect()
    }

    /// Writes signers accepted on first use and format fallbacks back to the
    /// configuration, so the next sync checks against them.
    fn persist_pins(&self, reports: &[SyncReport]) -> Result<()> {
        let mut config = self.config.clone();
        let mut changed = false;

        for report in reports {
            let Some(entry) = config
                .repos
                .iter_mut()
                .find(|repo| repo.name == report.repo.id.as_str())
            else {
                continue;
            };

            if let Some(fingerprint) = report.fingerprint()
                && entry.pinned_fingerprint()?.is_none()
            {
                println!(
                    "Pinned signer of {} to {}",
                    entry.name.bold(),
                    fingerprint.formatted().cyan()
                );
                entry.fingerprint = Some(fingerprint.to_string());
                changed = true;
            }

            if entry.format != report.format() {
                debug!("{} now uses the {} format", entry.name, report.format());
                entry.format = report.format();
                changed = true;
            }
        }

        if changed {
            config.save()?;
        }
        Ok(())
    }
}

/// Combines a configured repository with what the last sync stored for it.
///
/// The configured pin always wins. A stored cursor is only reused when the
/// stored index was signed by the same key and `force` is not set.
fn prepare_repo(store: &FileIndexStore, config: &RepoConfig, force: bool) -> Result<Repo> {
    let repo = config.to_repo()?;
    let Some(state) = store.load_state(&repo.id)? else {
        return Ok(repo);
    };

    match &repo.fingerprint {
        Some(pinned) if *pinned != state.fingerprint => {
            warn!(
                "{}: stored index was signed by {}, not the pinned {pinned}; fetching it again",
                repo.id, state.fingerprint
            );
            Ok(repo)
        }
        Some(_) if force => Ok(repo),
        Some(_) => Ok(repo.with_version_info(state.version_info)),
        None if force => Ok(repo.with_fingerprint(Some(state.fingerprint))),
        None => Ok(repo
            .with_fingerprint(Some(state.fingerprint))
            .with_version_info(state.version_info)),
    }
}

/// Renders the state stream of a batch as one bar per repository plus an
/// overall counter.
struct ProgressObserver {
    bars: Mutex<HashMap<RepoId, Box<dyn ProgressIndicator>>>,
    overall: Mutex<Box<dyn ProgressIndicator>>,
    total: u64,
    finished: Mutex<u64>,
}

impl ProgressObserver {
    fn start(parent: &mut dyn ProgressIndicator, repos: &[Repo]) -> Self {
        let total = repos.len() as u64;

        let mut overall = parent.create_child();
        overall.start(
            ProgressConfig::new("Syncing", "repositories", ProgressStyle::Count).with_total(total),
        );

        let bars = repos
            .iter()
            .map(|repo| {
                let mut bar = parent.create_child();
                bar.start(
                    ProgressConfig::new("Syncing", repo.id.as_str(), ProgressStyle::Percent)
                        .with_total(100),
                );
                (repo.id.clone(), bar)
            })
            .collect();

        Self {
            bars: Mutex::new(bars),
            overall: Mutex::new(overall),
            total,
            finished: Mutex::new(0),
        }
    }

    fn finish(&self, summary: &str, success: bool) {
        if let Ok(mut overall) = self.overall.lock() {
            if success {
                overall.complete(Some(summary.to_string()));
            } else {
                overall.error(summary.to_string());
            }
        }
    }
}

impl SyncObserver for ProgressObserver {
    fn on_state(&self, repo: &RepoId, state: &SyncState) {
        let Ok(mut bars) = self.bars.lock() else {
            return;
        };
        let Some(bar) = bars.get_mut(repo) else {
            return;
        };

        match state {
            SyncState::DownloadProgress(percent) if *percent >= 0 => {
                bar.update(*percent as u64, Some(100));
            }
            SyncState::DownloadProgress(_) => bar.set_message("downloading".to_string()),
            SyncState::Completed(outcome) => bar.complete(Some(outcome.to_string())),
            SyncState::VerificationFailed(message) => {
                bar.error(format!("verification failed: {message}"));
            }
            SyncState::ParseFailed(message) | SyncState::Failed(message) => {
                bar.error(message.clone());
            }
        }

        if state.is_terminal()
            && let Ok(mut finished) = self.finished.lock()
        {
            *finished += 1;
            if let Ok(mut overall) = self.overall.lock() {
                overall.update(*finished, Some(self.total));
            }
        }
    }
}
