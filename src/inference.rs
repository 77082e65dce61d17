use std::time::{Duration, Instant};

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::model::tensor::Nested;
use crate::model::{InferenceTensor, Tensor};
use crate::utils::truncate;

const MAX_BODY_EXCERPT: usize = 200;

#[derive(Serialize)]
struct PredictRequest<'a> {
    inputs: Nested<'a>,
}

#[derive(Deserialize)]
struct PredictResponse {
    outputs: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InferenceResult {
    pub outputs: Tensor,
    pub elapsed: Duration,
}

impl InferenceResult {
    pub fn elapsed_seconds(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }
}

/// Client for a model server `:predict` REST endpoint. Every call is a single attempt.
pub struct InferenceClient {
    client: Client,
}

impl InferenceClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| Error::transport("inference client", err))?;
        Ok(Self { client })
    }

    pub fn predict(&self, endpoint_url: &str, tensor: &InferenceTensor) -> Result<InferenceResult> {
        let request = PredictRequest {
            inputs: tensor.nested(),
        };
        let body = serde_json::to_vec(&request).map_err(|err| {
            Error::invalid_response(endpoint_url, format!("failed to encode request ({err})"))
        })?;
        log::debug!(
            "POST {endpoint_url} with {} bytes for input shape {:?}",
            body.len(),
            tensor.shape()
        );

        let start = Instant::now();
        let response = self
            .client
            .post(endpoint_url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .map_err(|err| Error::transport(endpoint_url, err))?;
        let status = response.status();
        let text = response
            .text()
            .map_err(|err| Error::transport(endpoint_url, err))?;
        let elapsed = start.elapsed();

        if !status.is_success() {
            return Err(Error::invalid_response(
                endpoint_url,
                format!("HTTP {status}: {}", truncate(text, MAX_BODY_EXCERPT)),
            ));
        }

        let parsed: PredictResponse = serde_json::from_str(&text).map_err(|err| {
            Error::invalid_response(endpoint_url, format!("body is not a prediction ({err})"))
        })?;
        let outputs = Tensor::from_nested(&parsed.outputs)
            .map_err(|reason| Error::invalid_response(endpoint_url, format!("outputs: {reason}")))?;

        log::info!(
            "Inference answered in {:.3}s with output shape {:?}",
            elapsed.as_secs_f64(),
            outputs.shape()
        );
        Ok(InferenceResult { outputs, elapsed })
    }
}

/// One-shot form of [`InferenceClient::predict`].
pub fn predict(
    endpoint_url: &str,
    tensor: &InferenceTensor,
    timeout: Duration,
) -> Result<InferenceResult> {
    InferenceClient::new(timeout)?.predict(endpoint_url, tensor)
}
