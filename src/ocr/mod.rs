//! OCR pipeline
//!
//! Turns a frozen frame into a structured word list:
//! 1. Preprocess: scale to the target height, JPEG, base64
//! 2. Recognize: POST to the text detection endpoint
//! 3. Parse: strict walk of blocks → paragraphs → words
//!
//! In dev mode a content-keyed cache sits in front of step 2.

mod cache;
mod parse;
mod preprocess;
mod vision;

pub(crate) use cache::OcrCache;
pub(crate) use vision::DEFAULT_ENDPOINT;

use crate::config::OcrConfig;
use crate::error::OcrError;
use crate::settings::SettingsStore;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use vision::VisionClient;
use zeroize::Zeroize;

/// A corner of a word's bounding box, in source-image pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vertex {
    #[serde(default)]
    pub x: i32,
    #[serde(default)]
    pub y: i32,
}

/// A recognized word
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Word {
    /// Zero-based position across the whole result
    pub id: usize,
    pub text: String,
    pub bounding_box: Vec<Vertex>,
}

/// Words found in one capture
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OcrResult {
    pub detected_language: String,
    pub words: Vec<Word>,
}

impl OcrResult {
    /// Words joined with single spaces
    pub fn text(&self) -> String {
        self.words
            .iter()
            .map(|w| w.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Anything that can read text out of a PNG capture
#[async_trait]
pub trait TextRecognizer: Send + Sync {
    async fn run_ocr(&self, capture: Arc<[u8]>) -> Result<OcrResult, OcrError>;
}

/// Remote text detection with preprocessing and optional caching
pub(crate) struct OcrPipeline {
    client: VisionClient,
    settings: SettingsStore,
    target_height: u32,
    cache: Option<OcrCache>,
}

impl OcrPipeline {
    pub(crate) fn new(
        config: &OcrConfig,
        settings: SettingsStore,
        cache: Option<OcrCache>,
    ) -> anyhow::Result<Self> {
        let client = VisionClient::new(
            config.endpoint.clone(),
            Duration::from_secs(config.request_timeout_secs),
            Duration::from_secs(config.connect_timeout_secs),
        )?;
        if let Some(cache) = &cache {
            info!("OCR cache enabled at {:?}", cache.dir());
        }
        Ok(Self {
            client,
            settings,
            target_height: config.target_height,
            cache,
        })
    }
}

#[async_trait]
impl TextRecognizer for OcrPipeline {
    async fn run_ocr(&self, capture: Arc<[u8]>) -> Result<OcrResult, OcrError> {
        let cache_key = self.cache.as_ref().map(|_| OcrCache::key(&capture));
        if let (Some(cache), Some(key)) = (&self.cache, &cache_key) {
            if let Some(body) = cache.get(key) {
                return parse::parse_annotation(&body);
            }
        }

        // Re-read on every run so a key entered mid-session is used
        let mut api_key = self
            .settings
            .google_cloud_api_key()
            .ok_or(OcrError::CredentialMissing)?;

        let target_height = self.target_height;
        let encoded = tokio::task::spawn_blocking(move || {
            preprocess::prepare_screenshot_for_ocr(&capture, target_height)
        })
        .await
        .map_err(|e| OcrError::Image(format!("preprocessing task failed: {}", e)))??;

        let response = self.client.annotate(&api_key, &encoded).await;
        api_key.zeroize();
        let body = response?;

        if let (Some(cache), Some(key)) = (&self.cache, &cache_key) {
            if let Err(e) = cache.put(key, &body) {
                warn!("Failed to cache OCR response: {}", e);
            }
        }

        let result = parse::parse_annotation(&body)?;
        info!(
            language = %result.detected_language,
            words = result.words.len(),
            "OCR complete"
        );
        Ok(result)
    }
}
