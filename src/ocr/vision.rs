//! Google Cloud Vision `images:annotate` client.
//!
//! Sends one base64 image per request with the `TEXT_DETECTION` feature and
//! returns the raw response body; parsing happens in [`super::parse`].
//! Failures are surfaced to the session as-is, with no automatic retry.

use crate::error::OcrError;
use anyhow::Context;
use serde::Serialize;
use std::time::Duration;
use tracing::{info, instrument};

/// Default text detection endpoint
pub(crate) const DEFAULT_ENDPOINT: &str = "https://vision.googleapis.com/v1/images:annotate";

/// Header carrying the API key
const API_KEY_HEADER: &str = "X-goog-api-key";

/// Client for the text detection endpoint.
pub(crate) struct VisionClient {
    endpoint: String,
    client: reqwest::Client,
}

/// Request body for `images:annotate`.
#[derive(Debug, Serialize)]
struct AnnotateRequest<'a> {
    requests: Vec<AnnotateImageRequest<'a>>,
}

#[derive(Debug, Serialize)]
struct AnnotateImageRequest<'a> {
    image: ImageContent<'a>,
    features: Feature,
}

#[derive(Debug, Serialize)]
struct ImageContent<'a> {
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct Feature {
    #[serde(rename = "type")]
    kind: &'static str,
}

impl<'a> AnnotateRequest<'a> {
    fn text_detection(image_base64: &'a str) -> Self {
        Self {
            requests: vec![AnnotateImageRequest {
                image: ImageContent {
                    content: image_base64,
                },
                features: Feature {
                    kind: "TEXT_DETECTION",
                },
            }],
        }
    }
}

impl VisionClient {
    /// Create a client for `endpoint`.
    pub(crate) fn new(
        endpoint: impl Into<String>,
        request_timeout: Duration,
        connect_timeout: Duration,
    ) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .connect_timeout(connect_timeout)
            .build()
            .context("Failed to create HTTP client for VisionClient")?;

        Ok(Self {
            endpoint: endpoint.into(),
            client,
        })
    }

    /// POST the image and return the response body on a success status.
    #[instrument(skip(self, api_key, image_base64), fields(image_len = image_base64.len()))]
    pub(crate) async fn annotate(
        &self,
        api_key: &str,
        image_base64: &str,
    ) -> Result<String, OcrError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header(API_KEY_HEADER, api_key)
            .header("Content-Type", "application/json; charset=utf-8")
            .json(&AnnotateRequest::text_detection(image_base64))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(OcrError::Provider {
                status: status.as_u16(),
                body,
            });
        }

        info!(status = status.as_u16(), body_len = body.len(), "Text detection succeeded");
        Ok(body)
    }
}
