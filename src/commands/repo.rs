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
use crate::models::{IndexFormat, RepoId};
use crate::sync::{FileIndexStore, RepoState, resolve_address};
use crate::user_agent;
use clap::Subcommand;
use colored::*;
use comfy_table::{Cell, Color, Table};
use log::debug;

#[derive(Subcommand, Debug)]
pub enum RepoCommand {
    /// List configured repositories
    #[command(visible_alias = "ls")]
    List,
    /// Add a repository
    Add {
        /// Name used to refer to the repository
        name: String,
        /// Repository address (e.g., "https://f-droid.org/repo")
        address: String,
        /// SHA-256 fingerprint of the signing certificate; pinned on first sync when omitted
        #[arg(long)]
        fingerprint: Option<String>,
        /// The repository only publishes the monolithic index-v1.jar
        #[arg(long)]
        legacy: bool,
        /// User name for HTTP basic authentication
        #[arg(long, requires = "password")]
        username: Option<String>,
        /// Password for HTTP basic authentication
        #[arg(long, requires = "username")]
        password: Option<String>,
        /// Look for the repository root under the address before adding it
        #[arg(long)]
        probe: bool,
    },
    /// Remove a repository and its synced index
    #[command(visible_alias = "rm")]
    Remove {
        /// Name of the repository
        name: String,
        /// Keep the synced index on disk
        #[arg(long)]
        keep_index: bool,
    },
}

impl RepoCommand {
    pub fn execute(self, config: &FdsyncConfig) -> Result<()> {
        match self {
            RepoCommand::List => list_repos(config),
            RepoCommand::Add {
                name,
                address,
                fingerprint,
                legacy,
                username,
                password,
                probe,
            } => {
                let mut repo = RepoConfig::new(name, address);
                repo.fingerprint = fingerprint;
                repo.username = username;
                repo.password = password;
                if legacy {
                    repo.format = IndexFormat::Legacy;
                }
                add_repo(config, repo, probe)
            }
            RepoCommand::Remove { name, keep_index } => remove_repo(config, &name, keep_index),
        }
    }
}

fn list_repos(config: &FdsyncConfig) -> Result<()> {
    if config.repos.is_empty() {
        println!("No repositories configured");
        println!("Use 'fdsync repo add <NAME> <ADDRESS>' to add one");
        return Ok(());
    }

    let store = FileIndexStore::new(config.home());

    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_BORDERS_ONLY);
    table.set_header(vec![
        Cell::new("Name"),
        Cell::new("Address"),
        Cell::new("Format"),
        Cell::new("Fingerprint"),
        Cell::new("Synced"),
    ]);

    for repo in &config.repos {
        let state = RepoId::new(&repo.name)
            .ok()
            .and_then(|id| store.load_state(&id).ok().flatten());

        let fingerprint = match repo.pinned_fingerprint() {
            Ok(Some(fingerprint)) => Cell::new(short_fingerprint(fingerprint.as_str())),
            Ok(None) => Cell::new("not pinned").fg(Color::Yellow),
            Err(_) => Cell::new("invalid").fg(Color::Red),
        };

        table.add_row(vec![
            Cell::new(&repo.name),
            Cell::new(&repo.address),
            Cell::new(repo.format.to_string()),
            fingerprint,
            Cell::new(synced_label(state.as_ref())),
        ]);
    }

    println!("{table}");
    Ok(())
}

fn add_repo(config: &FdsyncConfig, mut repo: RepoConfig, probe: bool) -> Result<()> {
    if probe {
        let mut client = AttohttpcClient::new().with_user_agent(user_agent::probe_client());
        client.set_timeout(config.sync.timeout());

        let resolved = resolve_address(&client, &repo.address, repo.authentication().as_ref())?;
        debug!("Probe resolved {} to {}", repo.address, resolved.address);
        repo.address = resolved.address;
        repo.format = resolved.format;
    }

    let mut config = config.clone();
    let pinned = repo.pinned_fingerprint()?;
    let name = repo.name.clone();
    let address = repo.address.clone();
    config.add_repo(repo)?;
    config.save()?;

    println!("{} repository {} at {address}", "Added".green().bold(), name.bold());
    match pinned {
        Some(fingerprint) => println!("Signer pinned to {}", fingerprint.formatted().cyan()),
        None => println!(
            "{} the signer will be trusted on first sync",
            "No fingerprint given:".yellow()
        ),
    }
    Ok(())
}

fn remove_repo(config: &FdsyncConfig, name: &str, keep_index: bool) -> Result<()> {
    let mut config = config.clone();
    let removed = config.remove_repo(name)?;
    config.save()?;

    if !keep_index {
        let id = RepoId::new(&removed.name)?;
        FileIndexStore::new(config.home()).remove(&id)?;
    }

    println!("{} repository {}", "Removed".green().bold(), removed.name.bold());
    Ok(())
}

fn short_fingerprint(fingerprint: &str) -> String {
    match (fingerprint.get(..8), fingerprint.get(fingerprint.len().saturating_sub(8)..)) {
        (Some(head), Some(tail)) => format!("{head}…{tail}"),
        _ => fingerprint.to_string(),
    }
}

fn synced_label(state: Option<&RepoState>) -> String {
    match state.and_then(|state| state.version_info.timestamp) {
        Some(timestamp) => chrono::DateTime::from_timestamp_millis(timestamp)
            .map(|time| time.format("%Y-%m-%d %H:%M UTC").to_string())
            .unwrap_or_else(|| timestamp.to_string()),
        None => "never".to_string(),
    }
}
