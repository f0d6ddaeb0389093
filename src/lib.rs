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

//! Sync engine for F-Droid style repository indexes.
//!
//! A sync downloads the signed container of a repository, checks its signer
//! against a pinned certificate fingerprint, fetches the full index or a diff
//! and commits the reconciled index to an [`sync::IndexStore`].

pub mod commands;
pub mod config;
pub mod container;
pub mod download;
pub mod error;
pub mod fingerprint;
pub mod indicator;
pub mod logging;
pub mod models;
pub mod negotiate;
pub mod parser;
pub mod patch;
pub mod sync;
pub mod trust;
pub mod user_agent;
