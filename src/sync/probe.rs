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

//! Discovery of the repository root behind a user supplied address.

use crate::download::HttpClient;
use crate::error::{Result, SyncError};
use crate::models::{Authentication, IndexFormat, normalize_address};
use log::{debug, info};

const CANDIDATE_PATHS: [&str; 3] = ["", "fdroid/repo", "repo"];

/// A repository root that answered for one of the index containers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAddress {
    pub address: String,
    pub format: IndexFormat,
}

/// Candidate roots for `address`, in probing order.
pub fn candidates(address: &str) -> Vec<String> {
    let base = normalize_address(address);
    CANDIDATE_PATHS
        .iter()
        .map(|path| {
            if path.is_empty() {
                base.clone()
            } else {
                format!("{base}/{path}")
            }
        })
        .collect()
}

/// Finds the first candidate root that serves `entry.jar` or, failing that,
/// `index-v1.jar`
///
/// Each candidate is probed with `HEAD` requests. A `200` wins, anything
/// else moves on to the next candidate.
pub fn resolve_address(
    client: &dyn HttpClient,
    address: &str,
    authentication: Option<&Authentication>,
) -> Result<ResolvedAddress> {
    let headers: Vec<(String, String)> = authentication
        .map(|auth| vec![("Authorization".to_string(), auth.header_value())])
        .unwrap_or_default();

    for candidate in candidates(address) {
        for format in [IndexFormat::Current, IndexFormat::Legacy] {
            let url = format!("{candidate}/{}", format.container_name());
            match client.head(&url, headers.clone()) {
                Ok(response) if response.status() == 200 => {
                    info!("Found {format} repository at {candidate}");
                    return Ok(ResolvedAddress {
                        address: candidate,
                        format,
                    });
                }
                Ok(response) => debug!("{url} answered {}", response.status()),
                Err(e) => debug!("Probing {url} failed: {e}"),
            }
        }
    }

    Err(SyncError::ValidationError(format!(
        "No repository found at {address}"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::download::HttpResponse;
    use std::io::Read;
    use std::sync::Mutex;
    use std::time::Duration;

    struct StatusResponse(u16);

    impl Read for StatusResponse {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Ok(0)
        }
    }

    impl HttpResponse for StatusResponse {
        fn status(&self) -> u16 {
            self.0
        }

        fn header(&self, _name: &str) -> Option<&str> {
            None
        }

        fn final_url(&self) -> Option<&str> {
            None
        }
    }

    /// Answers 200 for the listed URLs and 404 otherwise.
    struct ProbeClient {
        found: Vec<&'static str>,
        requests: Mutex<Vec<(String, Vec<(String, String)>)>>,
    }

    impl ProbeClient {
        fn new(found: Vec<&'static str>) -> Self {
            Self {
                found,
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    impl HttpClient for ProbeClient {
        fn get(&self, url: &str, _headers: Vec<(String, String)>) -> Result<Box<dyn HttpResponse>> {
            Err(SyncError::NetworkError(format!("unexpected GET {url}")))
        }

        fn head(&self, url: &str, headers: Vec<(String, String)>) -> Result<Box<dyn HttpResponse>> {
            self.requests
                .lock()
                .unwrap()
                .push((url.to_string(), headers));
            let status = if self.found.iter().any(|found| *found == url) {
                200
            } else {
                404
            };
            Ok(Box::new(StatusResponse(status)))
        }

        fn set_timeout(&mut self, _timeout: Duration) {}
    }

    #[test]
    fn test_candidates_order() {
        assert_eq!(
            candidates("https://example.org/"),
            vec![
                "https://example.org",
                "https://example.org/fdroid/repo",
                "https://example.org/repo",
            ]
        );
    }

    #[test]
    fn test_resolves_nested_current_repository() {
        let client = ProbeClient::new(vec!["https://example.org/fdroid/repo/entry.jar"]);
        let resolved = resolve_address(&client, "https://example.org", None).unwrap();
        assert_eq!(
            resolved,
            ResolvedAddress {
                address: "https://example.org/fdroid/repo".to_string(),
                format: IndexFormat::Current,
            }
        );
    }

    #[test]
    fn test_prefers_current_format_at_same_root() {
        let client = ProbeClient::new(vec![
            "https://example.org/repo/index-v1.jar",
            "https://example.org/repo/entry.jar",
        ]);
        let resolved = resolve_address(&client, "https://example.org", None).unwrap();
        assert_eq!(resolved.format, IndexFormat::Current);
    }

    #[test]
    fn test_legacy_only_repository() {
        let client = ProbeClient::new(vec!["https://example.org/index-v1.jar"]);
        let resolved = resolve_address(&client, "https://example.org", None).unwrap();
        assert_eq!(resolved.address, "https://example.org");
        assert_eq!(resolved.format, IndexFormat::Legacy);
    }

    #[test]
    fn test_credentials_are_sent_with_probes() {
        let client = ProbeClient::new(vec!["https://example.org/entry.jar"]);
        let auth = Authentication::new("user", "secret");
        resolve_address(&client, "https://example.org", Some(&auth)).unwrap();

        let requests = client.requests.lock().unwrap();
        assert_eq!(
            requests[0].1,
            vec![("Authorization".to_string(), "Basic dXNlcjpzZWNyZXQ=".to_string())]
        );
    }

    #[test]
    fn test_nothing_found_is_an_error() {
        let client = ProbeClient::new(Vec::new());
        let result = resolve_address(&client, "https://example.org", None);
        assert!(matches!(result, Err(SyncError::ValidationError(_))));
        assert_eq!(client.requests.lock().unwrap().len(), 6);
    }
}
