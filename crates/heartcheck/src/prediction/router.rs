use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde_json::json;

use super::decision::DecisionRouter;

/// Router builder exposing the prediction and model metadata endpoints.
pub fn prediction_router(router: Arc<DecisionRouter>) -> Router {
    Router::new()
        .route("/predict", post(predict_handler))
        .route("/model-info", get(model_info_handler))
        .with_state(router)
}

// The raw body is taken so malformed JSON still receives the fail-safe payload.
pub(crate) async fn predict_handler(
    State(router): State<Arc<DecisionRouter>>,
    body: Bytes,
) -> Response {
    let prediction = router.predict_payload(&body);
    let status = if prediction.is_fail_safe() {
        StatusCode::INTERNAL_SERVER_ERROR
    } else {
        StatusCode::OK
    };
    (status, axum::Json(prediction.into_payload())).into_response()
}

pub(crate) async fn model_info_handler(State(router): State<Arc<DecisionRouter>>) -> Response {
    let payload = match router.configuration().classifier() {
        Some(adapter) => {
            let description = adapter.describe();
            json!({
                "model_type": description.model_type,
                "has_probability": description.has_probability,
                "feature_names": description.feature_names,
                "status": "loaded",
            })
        }
        None => json!({ "error": "Model not loaded" }),
    };
    (StatusCode::OK, axum::Json(payload)).into_response()
}
