use crate::cli::ServeArgs;
use crate::infra::AppState;
use crate::routes::router;
use axum_prometheus::PrometheusMetricLayer;
use estate_desk::api::BackendClient;
use estate_desk::auth::SessionCache;
use estate_desk::config::AppConfig;
use estate_desk::error::AppError;
use estate_desk::notifications::{NotificationFeed, NotificationPoller};
use estate_desk::telemetry;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry, config.environment)?;

    let backend = BackendClient::new(&config.backend)?;
    if config.backend.service_token.is_none() {
        warn!("PORTAL_SERVICE_TOKEN is not set; the notification feed will poll anonymously");
    }

    let notifications = NotificationPoller::new(
        Arc::new(backend.clone()),
        NotificationFeed::All,
        &config.polling,
    )
    .spawn();

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
        backend,
        notifications: Arc::new(notifications),
        sessions: Arc::new(SessionCache::new(config.backend.session_ttl)),
    };

    let app = router(app_state).layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        backend = %config.backend.base_url,
        poll_interval_secs = config.polling.interval.as_secs(),
        "estate desk service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
