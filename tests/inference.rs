mod common;

use std::time::{Duration, Instant};

use common::{json, MockHttp};
use dicomferry::{predict, Error, InferenceClient, Tensor};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, ResponseTemplate};

const PREDICT_PATH: &str = "/v1/models/unet:predict";

fn model_server(response: ResponseTemplate) -> MockHttp {
    let server = MockHttp::start();
    server.mount(
        Mock::given(method("POST"))
            .and(path(PREDICT_PATH))
            .respond_with(response),
    );
    server
}

#[test]
fn returns_outputs_and_latency() {
    let server = model_server(json(r#"{"outputs":[[1,2],[3,4]]}"#));
    let tensor = Tensor::zeros(vec![1, 4, 2, 2]);

    let result = predict(&server.url(PREDICT_PATH), &tensor, Duration::from_secs(5)).unwrap();

    assert_eq!(result.outputs.shape(), &[2, 2]);
    assert_eq!(result.outputs.data(), &[1.0, 2.0, 3.0, 4.0]);
    assert!(result.elapsed_seconds() >= 0.0);
}

#[test]
fn posts_json_inputs() {
    let server = MockHttp::start();
    server.mount(
        Mock::given(method("POST"))
            .and(path(PREDICT_PATH))
            .and(header("content-type", "application/json"))
            .and(body_json(serde_json::json!({"inputs": [[[0.5, 1.5]]]})))
            .respond_with(json(r#"{"outputs":[0]}"#))
            .expect(1),
    );
    let tensor = Tensor::new(vec![1, 1, 2], vec![0.5, 1.5]).unwrap();

    let client = InferenceClient::new(Duration::from_secs(5)).unwrap();
    let result = client.predict(&server.url(PREDICT_PATH), &tensor).unwrap();
    assert_eq!(result.outputs.shape(), &[1]);
}

#[test]
fn times_out_within_bound() {
    let server = model_server(json(r#"{"outputs":[1]}"#).set_delay(Duration::from_secs(5)));
    let tensor = Tensor::zeros(vec![1, 1]);

    let timeout = Duration::from_millis(300);
    let start = Instant::now();
    let err = predict(&server.url(PREDICT_PATH), &tensor, timeout).unwrap_err();
    let waited = start.elapsed();

    assert!(matches!(err, Error::Transport { .. }), "{err}");
    assert!(waited >= Duration::from_millis(250), "returned after {waited:?}");
    assert!(waited < Duration::from_secs(3), "returned after {waited:?}");
}

#[test]
fn body_without_outputs_is_invalid() {
    let server = model_server(json(r#"{"predictions":[[1]]}"#));
    let err = predict(
        &server.url(PREDICT_PATH),
        &Tensor::zeros(vec![1]),
        Duration::from_secs(5),
    )
    .unwrap_err();
    assert!(matches!(err, Error::InvalidResponse { .. }), "{err}");
}

#[test]
fn non_json_body_is_invalid() {
    let server = model_server(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"));
    let err = predict(
        &server.url(PREDICT_PATH),
        &Tensor::zeros(vec![1]),
        Duration::from_secs(5),
    )
    .unwrap_err();
    assert!(matches!(err, Error::InvalidResponse { .. }), "{err}");
}

#[test]
fn ragged_outputs_are_invalid() {
    let server = model_server(json(r#"{"outputs":[[1,2],[3]]}"#));
    let err = predict(
        &server.url(PREDICT_PATH),
        &Tensor::zeros(vec![1]),
        Duration::from_secs(5),
    )
    .unwrap_err();
    assert!(matches!(err, Error::InvalidResponse { .. }), "{err}");
}

#[test]
fn error_status_is_invalid_and_keeps_the_message() {
    let server = model_server(
        ResponseTemplate::new(404)
            .set_body_string(r#"{"error":"Model with requested name is not found"}"#),
    );
    let err = predict(
        &server.url(PREDICT_PATH),
        &Tensor::zeros(vec![1]),
        Duration::from_secs(5),
    )
    .unwrap_err();
    assert!(matches!(err, Error::InvalidResponse { .. }), "{err}");
    assert!(err.to_string().contains("404"), "{err}");
    assert!(err.to_string().contains("not found"), "{err}");
}
