use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use heartcheck::prediction::{prediction_router, DecisionRouter};
use serde_json::json;
use std::sync::atomic::Ordering;
use std::sync::Arc;

pub(crate) fn with_prediction_routes(router: Arc<DecisionRouter>) -> axum::Router {
    prediction_router(router)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn healthcheck(Extension(state): Extension<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "model_loaded": state.configuration.model_loaded(),
        "rule_profile": state.configuration.profile(),
    }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use heartcheck::prediction::{Configuration, RuleProfile};
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::sync::atomic::AtomicBool;
    use tower::ServiceExt;

    fn app(ready: bool, profile: RuleProfile) -> axum::Router {
        let configuration = Arc::new(Configuration::heuristic_only(profile));
        let state = AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
            configuration: configuration.clone(),
        };
        with_prediction_routes(Arc::new(DecisionRouter::new(configuration))).layer(Extension(state))
    }

    async fn read_json(response: axum::response::Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .expect("read body");
        serde_json::from_slice(&body).expect("json payload")
    }

    #[tokio::test]
    async fn health_reports_model_status() {
        let response = app(true, RuleProfile::Lite)
            .oneshot(Request::get("/health").body(Body::empty()).expect("request"))
            .await
            .expect("route executes");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            read_json(response).await,
            json!({ "status": "ok", "model_loaded": false, "rule_profile": "lite" })
        );
    }

    #[tokio::test]
    async fn readiness_tracks_the_startup_flag() {
        let pending = app(false, RuleProfile::Full)
            .oneshot(Request::get("/ready").body(Body::empty()).expect("request"))
            .await
            .expect("route executes");
        assert_eq!(pending.status(), StatusCode::SERVICE_UNAVAILABLE);

        let ready = app(true, RuleProfile::Full)
            .oneshot(Request::get("/ready").body(Body::empty()).expect("request"))
            .await
            .expect("route executes");
        assert_eq!(ready.status(), StatusCode::OK);
        assert_eq!(read_json(ready).await, json!({ "status": "ready" }));
    }

    #[tokio::test]
    async fn metrics_render_as_prometheus_text() {
        let response = app(true, RuleProfile::Full)
            .oneshot(Request::get("/metrics").body(Body::empty()).expect("request"))
            .await
            .expect("route executes");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/plain; version=0.0.4"
        );
    }

    #[tokio::test]
    async fn predict_route_is_mounted_alongside_ops_routes() {
        let response = app(true, RuleProfile::Full)
            .oneshot(
                Request::post("/predict")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"Age": 70, "ExerciseAngina": "Y"}"#))
                    .expect("request"),
            )
            .await
            .expect("route executes");

        assert_eq!(response.status(), StatusCode::OK);
        let payload = read_json(response).await;
        assert_eq!(payload["modelUsed"], false);
        assert_eq!(payload["riskScore"], 20 + 20 + 15);
        assert_eq!(
            payload["riskFactors"],
            json!([
                "Advanced age (>65)",
                "Poor exercise capacity",
                "Exercise-induced chest pain"
            ])
        );
    }
}
