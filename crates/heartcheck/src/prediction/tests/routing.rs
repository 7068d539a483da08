use super::common::*;
use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{header, Request, StatusCode};
use serde_json::json;
use std::sync::Arc;
use tower::ServiceExt;

use crate::prediction::router::{model_info_handler, predict_handler};
use crate::prediction::{prediction_router, RuleProfile, FEATURE_COUNT};

fn predict_request(body: impl Into<Body>) -> Request<Body> {
    Request::post("/predict")
        .header(header::CONTENT_TYPE, "application/json")
        .body(body.into())
        .expect("request builds")
}

#[tokio::test]
async fn predict_route_returns_heuristic_payload() {
    let router = prediction_router(Arc::new(heuristic_router(RuleProfile::Full)));
    let body = serde_json::to_vec(&high_risk_record()).expect("record serializes");

    let response = router
        .oneshot(predict_request(body))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["riskScore"], 100);
    assert_eq!(payload["hasHeartDisease"], true);
    assert_eq!(payload["modelUsed"], false);
    assert_eq!(
        payload["message"],
        "Prediction from heuristic rules (model not available)"
    );
    assert!(payload.get("error").is_none());
}

#[tokio::test]
async fn response_shape_is_identical_across_paths() {
    let body = serde_json::to_vec(&low_risk_record()).expect("record serializes");

    let heuristic = prediction_router(Arc::new(heuristic_router(RuleProfile::Lite)))
        .oneshot(predict_request(body.clone()))
        .await
        .expect("route executes");
    let model = prediction_router(Arc::new(model_router(
        FixedProbability(0.12),
        RuleProfile::Lite,
    )))
    .oneshot(predict_request(body))
    .await
    .expect("route executes");

    assert_eq!(heuristic.status(), StatusCode::OK);
    assert_eq!(model.status(), StatusCode::OK);
    let heuristic = read_json_body(heuristic).await;
    let model = read_json_body(model).await;
    assert_eq!(keys(&heuristic), keys(&model));
    assert_eq!(model["modelUsed"], true);
    assert_eq!(model["riskScore"], 12);
    assert_eq!(model["message"], "Prediction from trained model");
}

#[tokio::test]
async fn invalid_json_returns_fail_safe_with_server_error() {
    let router = prediction_router(Arc::new(heuristic_router(RuleProfile::Full)));

    let response = router
        .oneshot(predict_request("{\"Age\": "))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let payload = read_json_body(response).await;
    assert_eq!(payload["riskScore"], 50);
    assert_eq!(payload["hasHeartDisease"], false);
    assert_eq!(
        payload["riskFactors"],
        json!(["Error occurred during prediction"])
    );
    assert_eq!(payload["modelUsed"], false);
    assert!(payload["error"].as_str().is_some());
    assert!(payload.get("message").is_none());
}

#[tokio::test]
async fn predict_handler_rejects_malformed_fields() {
    let router = Arc::new(heuristic_router(RuleProfile::Lite));
    let body = Bytes::from_static(br#"{"Age": "sixty"}"#);

    let response = predict_handler(State(router), body).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let payload = read_json_body(response).await;
    assert!(payload["error"]
        .as_str()
        .is_some_and(|error| error.contains("Age")));
}

#[tokio::test]
async fn failing_model_still_answers_with_heuristic_payload() {
    let router = prediction_router(Arc::new(model_router(Failing, RuleProfile::Full)));

    let response = router
        .oneshot(predict_request("{}"))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["riskScore"], 15);
    assert_eq!(payload["riskFactors"], json!(["Poor exercise capacity"]));
    assert_eq!(payload["modelUsed"], false);
}

#[tokio::test]
async fn model_info_reports_missing_model() {
    let router = prediction_router(Arc::new(heuristic_router(RuleProfile::Full)));

    let response = router
        .oneshot(
            Request::get("/model-info")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        read_json_body(response).await,
        json!({ "error": "Model not loaded" })
    );
}

#[tokio::test]
async fn model_info_describes_loaded_model() {
    let raw = json!({
        "model_type": "LogisticRegression",
        "coefficients": vec![0.0; FEATURE_COUNT],
        "intercept": 0.0,
    })
    .to_string();
    let model = crate::prediction::LogisticModel::from_json(&raw).expect("model loads");
    let router = Arc::new(model_router(model, RuleProfile::Full));

    let response = model_info_handler(State(router)).await;

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["status"], "loaded");
    assert_eq!(payload["model_type"], "LogisticRegression");
    assert_eq!(payload["has_probability"], true);
    assert_eq!(
        payload["feature_names"]
            .as_array()
            .map(|names| names.len()),
        Some(FEATURE_COUNT)
    );
}
