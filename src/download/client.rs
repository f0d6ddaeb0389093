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

use super::options::DEFAULT_TIMEOUT;
use crate::error::{Result, SyncError};
use crate::user_agent;
use attohttpc::header::HeaderName;
use attohttpc::{ErrorKind, Method, Response, Session};
use log::{debug, warn};
use retry::{OperationResult, delay::Exponential, retry_with_index};
use std::io::{self, Read};
use std::time::Duration;

const MAX_CONNECT_ATTEMPTS: usize = 3;
const INITIAL_BACKOFF_MS: u64 = 500;

pub trait HttpClient: Send + Sync {
    fn get(&self, url: &str, headers: Vec<(String, String)>) -> Result<Box<dyn HttpResponse>>;

    fn head(&self, url: &str, headers: Vec<(String, String)>) -> Result<Box<dyn HttpResponse>>;

    fn set_timeout(&mut self, timeout: Duration);
}

pub trait HttpResponse: Read + Send {
    fn status(&self) -> u16;

    fn header(&self, name: &str) -> Option<&str>;

    fn final_url(&self) -> Option<&str>;
}

pub struct AttohttpcClient {
    timeout: Duration,
    user_agent: String,
}

impl AttohttpcClient {
    pub fn new() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            user_agent: user_agent::sync_client(),
        }
    }

    pub fn with_user_agent(mut self, user_agent: String) -> Self {
        self.user_agent = user_agent;
        self
    }

    fn send(
        &self,
        method: Method,
        url: &str,
        headers: &[(String, String)],
    ) -> Result<Box<dyn HttpResponse>> {
        let result = retry_with_index(
            Exponential::from_millis(INITIAL_BACKOFF_MS).take(MAX_CONNECT_ATTEMPTS - 1),
            |current_try| match self.send_once(&method, url, headers) {
                Ok(response) => OperationResult::Ok(response),
                Err(SyncError::Http(e)) if is_connect_failure(&e) => {
                    let error = SyncError::NetworkError(format!("Failed to connect to {url}: {e}"));
                    if current_try < MAX_CONNECT_ATTEMPTS as u64 {
                        warn!("Connecting to {url} failed (attempt {current_try}): {e}");
                        OperationResult::Retry(error)
                    } else {
                        OperationResult::Err(error)
                    }
                }
                Err(e) => OperationResult::Err(e),
            },
        );

        result
            .map(|response| Box::new(AttohttpcResponse { response }) as Box<dyn HttpResponse>)
            .map_err(|e| e.error)
    }

    fn send_once(
        &self,
        method: &Method,
        url: &str,
        headers: &[(String, String)],
    ) -> Result<Response> {
        let mut session = Session::new();
        session.proxy_settings(attohttpc::ProxySettings::from_env());

        let request_builder = if *method == Method::HEAD {
            session.head(url)
        } else {
            session.get(url)
        };
        let mut request_builder = request_builder
            .timeout(self.timeout)
            .header("User-Agent", &self.user_agent)
            .follow_redirects(true);

        for (key, value) in headers {
            let name = HeaderName::from_bytes(key.as_bytes()).map_err(|_| {
                SyncError::ValidationError(format!("Invalid HTTP header name '{key}'"))
            })?;
            request_builder = request_builder.try_header(name, value.as_str())?;
        }

        debug!("Requesting {url}");
        Ok(request_builder.send()?)
    }
}

impl Default for AttohttpcClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient for AttohttpcClient {
    fn get(&self, url: &str, headers: Vec<(String, String)>) -> Result<Box<dyn HttpResponse>> {
        self.send(Method::GET, url, &headers)
    }

    fn head(&self, url: &str, headers: Vec<(String, String)>) -> Result<Box<dyn HttpResponse>> {
        self.send(Method::HEAD, url, &headers)
    }

    fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }
}

/// True when no connection was established, so nothing was exchanged.
fn is_connect_failure(error: &attohttpc::Error) -> bool {
    match error.kind() {
        ErrorKind::Io(e) => matches!(
            e.kind(),
            io::ErrorKind::ConnectionRefused
                | io::ErrorKind::ConnectionReset
                | io::ErrorKind::ConnectionAborted
                | io::ErrorKind::NotConnected
                | io::ErrorKind::AddrNotAvailable
        ),
        _ => false,
    }
}

struct AttohttpcResponse {
    response: Response,
}

impl Read for AttohttpcResponse {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.response.read(buf)
    }
}

impl HttpResponse for AttohttpcResponse {
    fn status(&self) -> u16 {
        self.response.status().as_u16()
    }

    fn header(&self, name: &str) -> Option<&str> {
        self.response.headers().get(name)?.to_str().ok()
    }

    fn final_url(&self) -> Option<&str> {
        Some(self.response.url().as_ref())
    }
}
