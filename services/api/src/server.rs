use crate::cli::ServeArgs;
use crate::infra::AppState;
use crate::routes::with_prediction_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use heartcheck::config::AppConfig;
use heartcheck::error::AppError;
use heartcheck::prediction::{Configuration, DecisionRouter};
use heartcheck::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }
    if let Some(model) = args.model.take() {
        config.prediction.model_path = Some(model);
    }
    if args.no_model {
        config.prediction.model_path = None;
    }
    if let Some(profile) = args.profile.take() {
        config.prediction.rule_profile = profile;
    }

    telemetry::init(&config.telemetry)?;

    let configuration = Arc::new(Configuration::load(
        config.prediction.rule_profile,
        config.prediction.model_path.as_deref(),
    ));
    let decision_router = Arc::new(DecisionRouter::new(configuration.clone()));

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
        configuration: configuration.clone(),
    };

    let mut app = with_prediction_routes(decision_router);
    if let Some(static_dir) = &config.server.static_dir {
        info!(path = %static_dir.display(), "serving static assets");
        app = app.fallback_service(ServeDir::new(static_dir));
    }
    let mut app = app.layer(Extension(app_state));
    if config.server.cors_permissive {
        app = app.layer(CorsLayer::permissive());
    }
    let app = app.layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        model_loaded = configuration.model_loaded(),
        rule_profile = %configuration.profile(),
        "heartcheck risk service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
