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

use clap::{Parser, Subcommand};
use fdsync::commands::fingerprint::FingerprintCommand;
use fdsync::commands::repo::RepoCommand;
use fdsync::commands::sync::SyncCommand;
use fdsync::config::new_fdsync_config;
use fdsync::error::{Result, format_error_chain, get_exit_code};
use fdsync::logging;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "fdsync")]
#[command(author, version, about = "F-Droid repository index sync", long_about = None)]
struct Cli {
    /// Increase verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sync repository indexes
    #[command(visible_alias = "s")]
    Sync {
        /// Repositories to sync (defaults to all configured repositories)
        repos: Vec<String>,

        /// Disable progress indicators
        #[arg(long)]
        no_progress: bool,

        /// Number of repositories synced at the same time
        #[arg(short, long, value_name = "N")]
        jobs: Option<usize>,

        /// Ignore the stored sync state and download full indexes
        #[arg(short, long)]
        force: bool,
    },

    /// Manage configured repositories
    Repo {
        #[command(subcommand)]
        command: RepoCommand,
    },

    /// Print the signer fingerprint of a signed index container
    #[command(visible_alias = "fp")]
    Fingerprint {
        /// Path to entry.jar or index-v1.jar
        file: PathBuf,

        /// Signed member to check (defaults to the one matching the file name)
        #[arg(long, value_name = "NAME")]
        entry: Option<String>,

        /// Print space separated byte pairs
        #[arg(long)]
        formatted: bool,
    },
}

fn setup_logger(cli: &Cli) {
    logging::setup_logger(cli.verbose);
}

fn main() {
    let cli = Cli::parse();

    setup_logger(&cli);

    let config = match new_fdsync_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", format_error_chain(&e));
            std::process::exit(get_exit_code(&e));
        }
    };

    let result: Result<()> = (|| match cli.command {
        Commands::Sync {
            repos,
            no_progress,
            jobs,
            force,
        } => {
            let command = SyncCommand::new(&config, no_progress)?;
            command.execute(&repos, jobs, force)
        }
        Commands::Repo { command } => command.execute(&config),
        Commands::Fingerprint {
            file,
            entry,
            formatted,
        } => {
            let command = FingerprintCommand::new()?;
            command.execute(&file, entry.as_deref(), formatted)
        }
    })();

    if let Err(e) = result {
        eprintln!("{}", format_error_chain(&e));
        std::process::exit(get_exit_code(&e));
    }
}
