// Copyright 2025 Chris Custine
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

//! HTTP station source.
//!
//! Issues `GET {base_url}/{number}` and decodes the body with
//! [`parse_station_payload`](super::parse_station_payload). Every failure is
//! reported as [`OverlayError::RemoteUnavailable`] so the resolver can fall
//! back to simulated data.

use std::time::Duration;

use log::debug;
use reqwest::Url;

use super::payload::{parse_station_payload, RawStation};
use super::StationSource;
use crate::error::OverlayError;

/// Default station service endpoint.
pub const DEFAULT_STATION_API_URL: &str = "http://gistapis.etufor.ce.gov.br:8081/api/postoControle";

/// Largest response body accepted from the station service.
pub const MAX_BODY_BYTES: usize = 64 * 1024;

/// Configuration for [`HttpStationSource`].
#[derive(Debug, Clone)]
pub struct HttpSourceConfig {
    /// Base URL; the station number is appended as the last path segment.
    pub base_url: String,
    /// Whole-request timeout.
    pub timeout: Duration,
}

impl Default for HttpSourceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_STATION_API_URL.to_string(),
            timeout: Duration::from_secs(5),
        }
    }
}

/// Station source backed by the remote station service.
#[derive(Debug, Clone)]
pub struct HttpStationSource {
    client: reqwest::Client,
    base_url: Url,
}

fn remote_error(e: impl std::fmt::Display) -> OverlayError {
    OverlayError::RemoteUnavailable(e.to_string())
}

/// Station numbers go into the URL path, so only plain identifiers are sent.
fn is_plain_identifier(number: &str) -> bool {
    !number.is_empty()
        && number
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

impl HttpStationSource {
    pub fn new(config: HttpSourceConfig) -> Result<Self, OverlayError> {
        let base_url = Url::parse(config.base_url.trim()).map_err(|e| {
            OverlayError::InvalidInput(format!("station service URL {}: {e}", config.base_url))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(OverlayError::InvalidInput(format!(
                "station service URL {} cannot take a path",
                config.base_url
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("station-overlay/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| OverlayError::RemoteUnavailable(format!("HTTP client setup failed: {e}")))?;

        Ok(Self { client, base_url })
    }

    /// Full request URL for a station number, appended as one encoded path segment.
    #[must_use]
    pub fn station_url(&self, number: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(number.trim());
        }
        url
    }

    async fn fetch_body(&self, url: Url) -> Result<String, OverlayError> {
        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(remote_error)?;

        if response
            .content_length()
            .is_some_and(|len| len > MAX_BODY_BYTES as u64)
        {
            return Err(OverlayError::RemoteUnavailable(format!(
                "response larger than {MAX_BODY_BYTES} bytes"
            )));
        }

        // Chunked bodies carry no length up front, so the limit is enforced while reading.
        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(remote_error)? {
            if body.len() + chunk.len() > MAX_BODY_BYTES {
                return Err(OverlayError::RemoteUnavailable(format!(
                    "response larger than {MAX_BODY_BYTES} bytes"
                )));
            }
            body.extend_from_slice(&chunk);
        }

        Ok(String::from_utf8_lossy(&body).into_owned())
    }
}

impl StationSource for HttpStationSource {
    async fn fetch(&self, number: &str) -> Result<RawStation, OverlayError> {
        let number = number.trim();
        if !is_plain_identifier(number) {
            return Err(OverlayError::RemoteUnavailable(format!(
                "station number {number:?} is not a plain identifier"
            )));
        }

        let url = self.station_url(number);
        debug!("Fetching station {number} from {url}");

        let body = self.fetch_body(url).await?;
        parse_station_payload(&body).map_err(remote_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::StationOrigin;
    use crate::resolver::{ResolverConfig, StationResolver};
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::sync::mpsc;

    /// Serve one canned HTTP response; the request line is sent back on the channel.
    fn serve_once(status: &str, body: String) -> (String, mpsc::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let mut buf = [0u8; 4096];
                let read = stream.read(&mut buf).unwrap_or(0);
                let request = String::from_utf8_lossy(&buf[..read]);
                let _ = tx.send(request.lines().next().unwrap_or_default().to_string());
                let _ = stream.write_all(response.as_bytes());
            }
        });

        (format!("http://{addr}/api/postoControle"), rx)
    }

    fn source(base_url: String) -> HttpStationSource {
        HttpStationSource::new(HttpSourceConfig {
            base_url,
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[test]
    fn test_station_url_joins_segments() {
        let source = source("http://localhost:8081/api/postoControle/".to_string());
        assert_eq!(
            source.station_url(" 12 ").as_str(),
            "http://localhost:8081/api/postoControle/12"
        );
    }

    #[test]
    fn test_station_url_encodes_separators() {
        let source = source("http://localhost:8081/api/postoControle".to_string());
        let url = source.station_url("1/x?a=b");
        assert_eq!(url.path(), "/api/postoControle/1%2Fx%3Fa=b");
        assert_eq!(url.query(), None);
    }

    #[test]
    fn test_invalid_base_url_is_rejected() {
        let result = HttpStationSource::new(HttpSourceConfig {
            base_url: "not a url".to_string(),
            ..Default::default()
        });
        assert!(matches!(result, Err(OverlayError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_remote_unavailable() {
        let source = HttpStationSource::new(HttpSourceConfig {
            // Nothing listens on the loopback discard port.
            base_url: "http://127.0.0.1:9/api".to_string(),
            timeout: Duration::from_millis(500),
        })
        .unwrap();
        let result = source.fetch("1").await;
        assert!(matches!(result, Err(OverlayError::RemoteUnavailable(_))));
    }

    #[tokio::test]
    async fn test_non_plain_number_is_never_requested() {
        let source = source("http://127.0.0.1:9/api".to_string());
        for number in ["1/../x", "1?a=b", ".."] {
            let result = source.fetch(number).await;
            assert!(matches!(result, Err(OverlayError::RemoteUnavailable(ref m)) if m.contains("plain identifier")));
        }
    }

    #[tokio::test]
    async fn test_error_status_falls_back_to_simulated_station() {
        let body = r#"{"latitude": -3.1, "longitude": -38.2, "nome": "Remoto"}"#.to_string();
        let (base_url, _requests) = serve_once("404 Not Found", body);
        let resolver = StationResolver::new(source(base_url), ResolverConfig::default());

        let record = resolver.resolve("1").await.unwrap();
        assert_eq!(record.origin, StationOrigin::Simulated);
        assert_eq!(record.name, "Posto Simulado 1 (GIST)");
    }

    #[tokio::test]
    async fn test_ok_tagged_body_resolves_as_remote() {
        let body = "<posto><lat>-3.1</lat><lng>-38.2</lng></posto>".to_string();
        let (base_url, requests) = serve_once("200 OK", body);
        let resolver = StationResolver::new(source(base_url), ResolverConfig::default());

        let record = resolver.resolve("7").await.unwrap();
        assert_eq!(record.origin, StationOrigin::Remote);
        assert_eq!(record.name, "Posto 7");
        assert_eq!(record.api_radius_m, 100);
        assert!((record.position.latitude() - -3.1).abs() < 1e-9);
        assert_eq!(
            requests.recv().unwrap(),
            "GET /api/postoControle/7 HTTP/1.1"
        );
    }

    #[tokio::test]
    async fn test_oversized_body_is_remote_unavailable() {
        let body = format!("<posto><nome>{}</nome></posto>", "x".repeat(MAX_BODY_BYTES));
        let (base_url, _requests) = serve_once("200 OK", body);

        let result = source(base_url).fetch("1").await;
        assert!(matches!(result, Err(OverlayError::RemoteUnavailable(ref m)) if m.contains("larger than")));
    }
}
