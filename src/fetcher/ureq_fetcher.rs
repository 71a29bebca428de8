//! Blocking HTTP downloads backed by `ureq`.

use std::io::Read;
use std::time::Duration;

use log::debug;

use crate::config::SourceConfig;
use crate::fetcher::HttpFetcher;

const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Fetcher sharing one agent, identity headers, and request timeout across calls.
pub struct UreqFetcher {
    http_client: ureq::Agent,
    user_agent: String,
    accept: String,
}

impl UreqFetcher {
    pub fn new(source: &SourceConfig) -> Self {
        let timeout = Duration::from_secs(source.timeout_secs.max(1));
        let http_client = ureq::AgentBuilder::new()
            .timeout_connect(Duration::from_secs(CONNECT_TIMEOUT_SECS).min(timeout))
            .timeout_read(timeout)
            .timeout_write(timeout)
            .timeout(timeout)
            .build();
        Self {
            http_client,
            user_agent: source.user_agent.clone(),
            accept: source.accept.clone(),
        }
    }

    fn get(&self, url: &str, referer: Option<&str>) -> Result<ureq::Response, String> {
        let mut request = self
            .http_client
            .get(url)
            .set("User-Agent", &self.user_agent)
            .set("Accept", &self.accept);
        if let Some(referer) = referer {
            request = request.set("Referer", referer);
        }
        let response = request.call().map_err(|err| describe_ureq_failure(url, &err))?;
        let status = response.status();
        if !(200..300).contains(&status) {
            return Err(format!("Request failed: {url} returned HTTP {status}"));
        }
        debug!("GET {} -> {}", url, status);
        Ok(response)
    }
}

fn describe_ureq_failure(url: &str, error: &ureq::Error) -> String {
    match error {
        ureq::Error::Status(code, response) => format!(
            "Request failed: {url} returned HTTP {code} {}",
            response.status_text()
        ),
        ureq::Error::Transport(transport) => {
            let lowered = transport.to_string().to_ascii_lowercase();
            if lowered.contains("timed out") || lowered.contains("timeout") {
                format!("Request timed out: {url}: {transport}")
            } else {
                format!("Request failed: {url}: {transport}")
            }
        }
    }
}

impl HttpFetcher for UreqFetcher {
    fn fetch_text(&self, url: &str) -> Result<String, String> {
        self.get(url, None)?
            .into_string()
            .map_err(|err| format!("Failed to read response from {url}: {err}"))
    }

    fn fetch_bytes(&self, url: &str, referer: &str) -> Result<Vec<u8>, String> {
        let mut reader = self.get(url, Some(referer))?.into_reader();
        let mut bytes = Vec::new();
        reader
            .read_to_end(&mut bytes)
            .map_err(|err| format!("Failed to read response from {url}: {err}"))?;
        if bytes.is_empty() {
            return Err(format!("Request failed: {url} returned an empty body"));
        }
        Ok(bytes)
    }
}
