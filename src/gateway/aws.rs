//! Image recognition client on the AWS SDK.
//!
//! The SDK signs and sends each call. A per-call interceptor keeps the raw
//! HTTP answer so callers receive exactly what Rekognition returned, error
//! documents included.

use std::sync::{Arc, Mutex};
use std::time::Instant;

use aws_sdk_rekognition::config::interceptors::AfterDeserializationInterceptorContextRef;
use aws_sdk_rekognition::config::retry::RetryConfig;
use aws_sdk_rekognition::config::{
    BehaviorVersion, ConfigBag, Credentials as SdkCredentials, Intercept, Region, RuntimeComponents,
};
use aws_sdk_rekognition::error::{BoxError, DisplayErrorContext};
use aws_sdk_rekognition::primitives::Blob;
use aws_sdk_rekognition::types::Image;
use aws_sdk_rekognition::{Client, Config};
use reqwest::StatusCode;

use crate::gateway::credential::AwsCredentials;
use crate::gateway::error::{GatewayError, GatewayResult};
use crate::gateway::response::UpstreamResponse;
use crate::gateway::Upstream;
use crate::observability::metrics;

const PROVIDER_NAME: &str = "gateway-environment";

/// Label detection tuning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectOptions {
    pub min_confidence: f32,
    pub max_labels: i32,
}

/// Rekognition client built from the credentials resolved at startup.
#[derive(Debug, Clone)]
pub struct RekognitionClient {
    client: Client,
}

impl RekognitionClient {
    /// Build the client. No retries: one inbound request, one upstream call.
    pub fn new(credentials: &AwsCredentials, endpoint: Option<&str>) -> Self {
        let provider = SdkCredentials::new(
            credentials.access_key_id.clone(),
            credentials.secret_access_key.clone(),
            credentials.session_token.clone(),
            None,
            PROVIDER_NAME,
        );

        let mut builder = Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(credentials.region.clone()))
            .credentials_provider(provider)
            .retry_config(RetryConfig::disabled());
        if let Some(endpoint) = endpoint {
            builder = builder.endpoint_url(endpoint);
        }

        Self {
            client: Client::from_conf(builder.build()),
        }
    }

    pub async fn detect_labels(&self, image: Vec<u8>, options: DetectOptions) -> GatewayResult<UpstreamResponse> {
        let start = Instant::now();
        let capture = CaptureResponse::default();
        let result = self
            .client
            .detect_labels()
            .image(Image::builder().bytes(Blob::new(image)).build())
            .min_confidence(options.min_confidence)
            .max_labels(options.max_labels)
            .customize()
            .interceptor(capture.clone())
            .send()
            .await;
        capture.finish(result, start)
    }

    pub async fn recognize_celebrities(&self, image: Vec<u8>) -> GatewayResult<UpstreamResponse> {
        let start = Instant::now();
        let capture = CaptureResponse::default();
        let result = self
            .client
            .recognize_celebrities()
            .image(Image::builder().bytes(Blob::new(image)).build())
            .customize()
            .interceptor(capture.clone())
            .send()
            .await;
        capture.finish(result, start)
    }
}

/// Holds the raw HTTP answer of one call.
#[derive(Debug, Clone, Default)]
struct CaptureResponse(Arc<Mutex<Option<UpstreamResponse>>>);

impl CaptureResponse {
    fn take(&self) -> Option<UpstreamResponse> {
        self.0.lock().ok().and_then(|mut slot| slot.take())
    }

    /// Any captured answer is relayed as-is, whatever the SDK made of it.
    /// Without one the call never reached Rekognition.
    fn finish<T, E>(&self, result: Result<T, E>, start: Instant) -> GatewayResult<UpstreamResponse>
    where
        E: std::error::Error,
    {
        let label = Upstream::Rekognition.as_str();
        if let Some(response) = self.take() {
            metrics::record_upstream(label, response.status().as_u16(), start);
            tracing::debug!(upstream = label, status = response.status().as_u16(), "Upstream responded");
            return Ok(response);
        }

        metrics::record_upstream_error(label);
        let message = match result {
            Ok(_) => "no response captured".to_string(),
            Err(e) => DisplayErrorContext(&e).to_string(),
        };
        tracing::error!(upstream = label, error = %message, "Upstream unreachable");
        Err(GatewayError::Sdk { upstream: label, message })
    }
}

impl Intercept for CaptureResponse {
    fn name(&self) -> &'static str {
        "CaptureResponse"
    }

    fn read_after_deserialization(
        &self,
        context: &AfterDeserializationInterceptorContextRef<'_>,
        _runtime_components: &RuntimeComponents,
        _cfg: &mut ConfigBag,
    ) -> Result<(), BoxError> {
        let response = context.response();
        let status = StatusCode::from_u16(response.status().as_u16())?;
        let content_type = response.headers().get("content-type").map(str::to_owned);
        let body = response
            .body()
            .bytes()
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
            .unwrap_or_default();

        let mut slot = self.0.lock().map_err(|e| e.to_string())?;
        *slot = Some(UpstreamResponse::new(status, content_type, body));
        Ok(())
    }
}
