//! HTTP behaviour of the prediction server, driven through the router without a socket.

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use rainfall::{create_app, FeatureVector, ForestConfig, PredictionService, RainModel, TrainingSet};
use serde_json::{json, Value};
use tower::ServiceExt;

fn trained_model() -> RainModel {
    let features = (0..60)
        .map(|i| FeatureVector::new(285.0, 30.0 + i as f64, 1010.0, 2.0, 6, (i % 24) as u32))
        .collect();
    let labels = (0..60).map(|i| u8::from(i >= 40)).collect();
    RainModel::train(
        &TrainingSet::new(features, labels).unwrap(),
        ForestConfig::builder().n_trees(10).build(),
    )
    .unwrap()
}

fn loaded_app() -> Router {
    create_app(PredictionService::with_model(trained_model()))
}

async fn post_json(app: Router, body: String) -> (StatusCode, Value) {
    post(app, body, Some("application/json")).await
}

async fn post(app: Router, body: String, content_type: Option<&str>) -> (StatusCode, Value) {
    let mut request = Request::builder().method("POST").uri("/predict-rain-ml");
    if let Some(content_type) = content_type {
        request = request.header(header::CONTENT_TYPE, content_type);
    }
    let response = app
        .oneshot(request.body(Body::from(body)).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn test_prediction_with_loaded_model() {
    let body = json!({
        "temp": 290.0,
        "humidity": 95.0,
        "pressure": 1014.0,
        "wind_speed": 3.2,
        "timestampISO": "2015-06-01T12:00:00Z"
    });
    let (status, value) = post_json(loaded_app(), body.to_string()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(value["source"], "ml");
    let pred = value["pred"].as_u64().unwrap();
    assert!(pred == 0 || pred == 1);
    let prob = value["prob"].as_f64().unwrap();
    assert!((0.0..=1.0).contains(&prob));
    assert_eq!(prob, (prob * 100.0).round() / 100.0);
    assert_eq!(pred, 1);
}

#[tokio::test]
async fn test_optional_fields_can_be_omitted() {
    let body = json!({ "temp": 280.0, "humidity": 35.0, "pressure": 1020.0 });
    let (status, value) = post_json(loaded_app(), body.to_string()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(value["pred"], 0);
}

#[tokio::test]
async fn test_no_model_is_service_unavailable() {
    let app = create_app(PredictionService::unavailable());
    let body = json!({ "temp": 290.0, "humidity": 70.0, "pressure": 1014.0 });
    let (status, value) = post_json(app, body.to_string()).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(value, json!({ "error": "ML model not loaded" }));
}

#[tokio::test]
async fn test_missing_field_is_bad_request() {
    let body = json!({ "temp": 290.0, "humidity": 70.0 });
    let (status, value) = post_json(loaded_app(), body.to_string()).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(value["error"].as_str().unwrap().contains("pressure"));
}

#[tokio::test]
async fn test_bad_timestamp_is_bad_request() {
    let body = json!({
        "temp": 290.0,
        "humidity": 70.0,
        "pressure": 1014.0,
        "timestampISO": "next tuesday"
    });
    let (status, value) = post_json(loaded_app(), body.to_string()).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(value["error"].as_str().unwrap().contains("next tuesday"));
}

#[tokio::test]
async fn test_blank_timestamp_is_accepted() {
    let body = json!({ "temp": 290.0, "humidity": 70.0, "pressure": 1014.0, "timestampISO": "" });
    let (status, value) = post_json(loaded_app(), body.to_string()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(value["source"], "ml");
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let (status, value) = post_json(loaded_app(), "{not json".to_string()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(value["error"].as_str().unwrap().contains("not a valid prediction request"));

    let (status, _) = post_json(loaded_app(), json!({ "temp": "hot" }).to_string()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unloaded_model_wins_over_bad_body() {
    for body in ["{not json".to_string(), json!({ "temp": "hot" }).to_string(), String::new()] {
        let (status, value) = post_json(create_app(PredictionService::unavailable()), body).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(value, json!({ "error": "ML model not loaded" }));
    }
}

#[tokio::test]
async fn test_content_type_is_not_required() {
    let body = json!({ "temp": 280.0, "humidity": 35.0, "pressure": 1020.0 }).to_string();

    let (status, value) = post(loaded_app(), body.clone(), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(value["source"], "ml");

    let (status, _) = post(loaded_app(), body, Some("text/plain")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_health_reports_model_state() {
    for (service, loaded) in [
        (PredictionService::with_model(trained_model()), true),
        (PredictionService::unavailable(), false),
    ] {
        let response = create_app(service)
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["status"], "ok");
        assert_eq!(value["model_loaded"], loaded);
    }
}

#[tokio::test]
async fn test_cors_allows_any_origin() {
    let response = loaded_app()
        .oneshot(
            Request::builder()
                .uri("/health")
                .header(header::ORIGIN, "http://localhost:3000")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(
        response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "*"
    );
}
