//! Image recognition backed by AWS Rekognition.
//!
//! # Responsibilities
//! - Resolve the image from inline base64 or a caller-supplied URL
//! - Validate the label detection tuning
//! - Call Rekognition through the SDK and relay the answer
//!
//! # Design Decisions
//! - Everything the caller can get wrong is checked before the AWS
//!   credentials, and the credentials before the image is downloaded
//! - Images are capped at `upstreams.max_image_bytes`, inline or downloaded
//! - A failed image download is a 502; the image host's body is never relayed

use axum::{body::Bytes, extract::State, routing::post, Router};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::Method;
use serde::Deserialize;
use url::Url;

use crate::gateway::{
    relay, DetectOptions, GatewayError, GatewayResult, OperationResult, OperationResultExt, UpstreamRequest,
};
use crate::http::AppState;
use crate::providers::{non_blank, parse_json_body, Numeric};

const DEFAULT_MIN_CONFIDENCE: f64 = 70.0;
const DEFAULT_MAX_LABELS: f64 = 50.0;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/detect", post(detect))
        .route("/recognize", post(recognize))
}

/// Body accepted by both routes. `recognize` ignores the tuning fields.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecognitionRequest {
    pub image_url: Option<String>,
    pub base64: Option<String>,
    pub min_confidence: Option<Numeric>,
    pub max_labels: Option<Numeric>,
}

/// Where the image bytes come from.
#[derive(Debug, PartialEq)]
pub enum ImageSource {
    Inline(Vec<u8>),
    Remote(Url),
}

impl ImageSource {
    /// Pick the image source. Inline data wins over a URL.
    pub fn from_request(request: &RecognitionRequest, limit: usize) -> GatewayResult<Self> {
        if let Some(data) = non_blank(request.base64.clone()) {
            let image = decode_inline(&data)?;
            if image.len() > limit {
                return Err(GatewayError::ImageTooLarge { limit });
            }
            return Ok(ImageSource::Inline(image));
        }
        let Some(raw) = non_blank(request.image_url.clone()) else {
            return Err(GatewayError::validation("imageUrl or base64 required"));
        };
        let url = Url::parse(&raw).map_err(|_| GatewayError::validation("invalid imageUrl"))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(GatewayError::validation("invalid imageUrl"));
        }
        Ok(ImageSource::Remote(url))
    }

    async fn into_bytes(self, state: &AppState, limit: usize) -> GatewayResult<Vec<u8>> {
        match self {
            ImageSource::Inline(bytes) => Ok(bytes),
            ImageSource::Remote(url) => {
                let request = UpstreamRequest::new(Method::GET, url);
                state.gateway.fetch_image(request, limit).await
            }
        }
    }
}

/// Decode inline image data, tolerating a `data:` URL prefix and line breaks.
fn decode_inline(data: &str) -> GatewayResult<Vec<u8>> {
    let encoded = match data.split_once(";base64,") {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest,
        _ => data,
    };
    let compact: String = encoded.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    STANDARD
        .decode(compact)
        .ok()
        .filter(|bytes| !bytes.is_empty())
        .ok_or_else(|| GatewayError::validation("invalid base64 image"))
}

/// Label detection tuning with defaults applied.
fn detect_options(request: &RecognitionRequest) -> GatewayResult<DetectOptions> {
    let min_confidence =
        Numeric::resolve(request.min_confidence.as_ref(), DEFAULT_MIN_CONFIDENCE, "invalid minConfidence")?;
    let max_labels = Numeric::resolve(request.max_labels.as_ref(), DEFAULT_MAX_LABELS, "invalid maxLabels")?;
    if max_labels < 0.0 || max_labels.fract() != 0.0 || max_labels > f64::from(i32::MAX) {
        return Err(GatewayError::validation("invalid maxLabels"));
    }
    Ok(DetectOptions {
        min_confidence: min_confidence as f32,
        max_labels: max_labels as i32,
    })
}

/// The two Rekognition actions exposed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    DetectLabels,
    RecognizeCelebrities,
}

impl Action {
    fn operation(self) -> &'static str {
        match self {
            Action::DetectLabels => "rekognition-detect-failed",
            Action::RecognizeCelebrities => "rekognition-recognize-failed",
        }
    }

    fn name(self) -> &'static str {
        match self {
            Action::DetectLabels => "DetectLabels",
            Action::RecognizeCelebrities => "RecognizeCelebrities",
        }
    }
}

async fn detect(State(state): State<AppState>, body: Bytes) -> OperationResult {
    run(&state, Action::DetectLabels, &body).await
}

async fn recognize(State(state): State<AppState>, body: Bytes) -> OperationResult {
    run(&state, Action::RecognizeCelebrities, &body).await
}

async fn run(state: &AppState, action: Action, body: &Bytes) -> OperationResult {
    let op = action.operation();
    let limit = state.gateway.upstreams().max_image_bytes;

    let request: RecognitionRequest = parse_json_body(body).during(op)?;
    let source = ImageSource::from_request(&request, limit).during(op)?;
    let options = match action {
        Action::DetectLabels => Some(detect_options(&request).during(op)?),
        Action::RecognizeCelebrities => None,
    };

    let client = state.gateway.rekognition().during(op)?;
    let image = source.into_bytes(state, limit).await.during(op)?;

    tracing::debug!(action = action.name(), image_bytes = image.len(), "Calling Rekognition");
    let response = match options {
        Some(options) => client.detect_labels(image, options).await,
        None => client.recognize_celebrities(image).await,
    }
    .during(op)?;
    Ok(relay(response))
}
