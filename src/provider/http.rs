//! Reader text from an HTTP service.

use super::command::DEFAULT_PADDING_MS;
use super::WindowTextProvider;
use crate::error::{Result, TandemError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};
use url::Url;

#[derive(Debug, Serialize)]
struct ReadRequest<'a> {
    audio: &'a str,
    start_ms: u64,
    end_ms: u64,
}

#[derive(Debug, Deserialize)]
struct ReadResponse {
    text: String,
}

/// POSTs `{audio, start_ms, end_ms}` to an endpoint that answers `{text}`.
#[derive(Debug, Clone)]
pub struct HttpProvider {
    client: reqwest::Client,
    endpoint: Url,
    audio: PathBuf,
    padding_ms: u64,
}

impl HttpProvider {
    pub fn new(endpoint: &str, audio: &Path) -> Result<Self> {
        let endpoint = Url::parse(endpoint)?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(TandemError::Config(format!(
                "provider endpoint must be http or https, got {}",
                endpoint.scheme()
            )));
        }

        Ok(Self {
            client: reqwest::Client::builder().build()?,
            endpoint,
            audio: audio.to_path_buf(),
            padding_ms: DEFAULT_PADDING_MS,
        })
    }

    pub fn with_padding_ms(mut self, padding_ms: u64) -> Self {
        self.padding_ms = padding_ms;
        self
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl WindowTextProvider for HttpProvider {
    #[instrument(skip(self), fields(endpoint = %self.endpoint))]
    async fn provide(&self, window_start_ms: u64, window_end_ms: u64) -> Result<String> {
        let audio = self.audio.to_string_lossy();
        let request = ReadRequest {
            audio: &audio,
            start_ms: window_start_ms.saturating_sub(self.padding_ms),
            end_ms: window_end_ms.saturating_add(self.padding_ms),
        };
        debug!("POST {} {}-{}ms", self.endpoint, request.start_ms, request.end_ms);

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(TandemError::Provider(format!(
                "{} returned {status}: {}",
                self.endpoint,
                body.trim()
            )));
        }

        let body: ReadResponse = response.json().await?;
        Ok(body.text)
    }

    fn name(&self) -> &str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_validation() {
        assert!(HttpProvider::new("http://localhost:8000/read", Path::new("a.wav")).is_ok());
        assert!(matches!(
            HttpProvider::new("not a url", Path::new("a.wav")),
            Err(TandemError::Url(_))
        ));
        assert!(matches!(
            HttpProvider::new("ftp://host/read", Path::new("a.wav")),
            Err(TandemError::Config(_))
        ));
    }

    #[test]
    fn test_request_shape() {
        let request = ReadRequest {
            audio: "talk.wav",
            start_ms: 0,
            end_ms: 1100,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["audio"], "talk.wav");
        assert_eq!(json["start_ms"], 0);
        assert_eq!(json["end_ms"], 1100);

        let response: ReadResponse = serde_json::from_str(r#"{"text": "你好", "lang": "zh"}"#).unwrap();
        assert_eq!(response.text, "你好");
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_recoverable() {
        let provider = HttpProvider::new("http://127.0.0.1:9/read", Path::new("a.wav")).unwrap();
        let err = provider.provide(0, 1000).await.unwrap_err();
        assert!(err.is_recoverable());
    }
}
