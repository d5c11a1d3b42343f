//! Text-to-image generation client.
//!
//! A stateless proxy to a remote inference endpoint: the prompt goes out as
//! `{"inputs": prompt}`, raw image bytes come back. There is no retry; a
//! failed upstream call surfaces as [`LikenessError::Generation`].

use std::io::Cursor;
use std::time::Duration;

use async_trait::async_trait;
use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::error::{LikenessError, Result};

/// Default hosted inference endpoint (FLUX.1-dev).
pub const DEFAULT_API_URL: &str =
    "https://api-inference.huggingface.co/models/black-forest-labs/FLUX.1-dev";

/// Default timeout for generation requests; diffusion models are slow.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Produces an encoded image for a text prompt.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Generate an image and return its encoded bytes.
    async fn generate(&self, prompt: &str) -> Result<Vec<u8>>;

    /// Short identifier used in logs.
    fn name(&self) -> &'static str;
}

/// Configuration for [`HuggingFaceGenerator`].
#[derive(Clone)]
pub struct GenerationConfig {
    /// Bearer token for the inference API.
    pub api_token: String,
    /// Endpoint URL.
    pub api_url: String,
    /// Request timeout.
    pub timeout: Duration,
}

impl std::fmt::Debug for GenerationConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationConfig")
            .field("api_token", &"<redacted>")
            .field("api_url", &self.api_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl GenerationConfig {
    pub fn new(api_token: impl Into<String>) -> Self {
        Self {
            api_token: api_token.into(),
            api_url: DEFAULT_API_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Load from `HUGGINGFACE_TOKEN` (required) and `HUGGINGFACE_API_URL`.
    pub fn from_env() -> Result<Self> {
        let api_token = std::env::var("HUGGINGFACE_TOKEN")
            .ok()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| {
                LikenessError::Configuration(
                    "HUGGINGFACE_TOKEN environment variable not set.".into(),
                )
            })?;

        let mut config = Self::new(api_token);
        if let Ok(url) = std::env::var("HUGGINGFACE_API_URL") {
            config.api_url = url;
        }
        if let Some(secs) = std::env::var("HUGGINGFACE_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            config.timeout = Duration::from_secs(secs);
        }
        Ok(config)
    }
}

#[derive(Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
}

/// Client for the hosted inference API.
pub struct HuggingFaceGenerator {
    client: Client,
    config: GenerationConfig,
}

impl HuggingFaceGenerator {
    #[instrument(level = "debug", skip_all, fields(api_url = %config.api_url))]
    pub fn new(config: GenerationConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                LikenessError::Configuration(format!("Failed to create HTTP client: {e}"))
            })?;

        Ok(Self { client, config })
    }
}

#[async_trait]
impl ImageGenerator for HuggingFaceGenerator {
    #[instrument(level = "info", skip(self, prompt), fields(prompt_len = prompt.len()))]
    async fn generate(&self, prompt: &str) -> Result<Vec<u8>> {
        debug!(api_url = %self.config.api_url, "Sending generation request");

        let response = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(&self.config.api_token)
            .json(&InferenceRequest { inputs: prompt })
            .send()
            .await?;

        let status = response.status();
        debug!(status = %status, "Received generation response");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "Generation request failed");
            return Err(LikenessError::Generation(format!(
                "Upstream returned status {status}"
            )));
        }

        let bytes = response.bytes().await?.to_vec();
        info!(bytes = bytes.len(), "Image generated");
        Ok(bytes)
    }

    fn name(&self) -> &'static str {
        "huggingface"
    }
}

/// Offline generator producing a deterministic PNG derived from the prompt.
///
/// Suitable for tests and local development only.
#[derive(Debug, Clone)]
pub struct MockGenerator {
    size: u32,
}

impl Default for MockGenerator {
    fn default() -> Self {
        Self { size: 64 }
    }
}

impl MockGenerator {
    pub fn with_size(size: u32) -> Self {
        Self { size: size.max(1) }
    }
}

#[async_trait]
impl ImageGenerator for MockGenerator {
    async fn generate(&self, prompt: &str) -> Result<Vec<u8>> {
        let seed = prompt
            .bytes()
            .fold(0u32, |acc, b| acc.wrapping_mul(31).wrapping_add(u32::from(b)));
        let size = self.size;
        let img = ImageBuffer::from_fn(size, size, |x, y| {
            let v = seed.wrapping_add(x * 7).wrapping_add(y * 13);
            Rgb([(v & 0xFF) as u8, ((v >> 8) & 0xFF) as u8, ((x + y) * 255 / (2 * size)) as u8])
        });

        let mut buffer = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut buffer, ImageFormat::Png)
            .map_err(|e| LikenessError::Generation(format!("Failed to encode PNG: {e}")))?;
        Ok(buffer.into_inner())
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
