use crate::cli::ServeArgs;
use crate::infra::{
    seed_demo_board, AppState, BroadcastPublisher, InMemoryApplyRepository,
    InMemoryNotificationStore,
};
use crate::routes::with_apply_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use job_board::config::AppConfig;
use job_board::error::AppError;
use job_board::telemetry;
use job_board::workflows::applies::ApplyWorkflowService;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let repository = Arc::new(InMemoryApplyRepository::default());
    if args.seed_demo_data {
        let seeded = seed_demo_board(&repository)?;
        info!(seeded, "loaded sample applies");
    }
    let inbox = Arc::new(InMemoryNotificationStore::default());
    let publisher = Arc::new(BroadcastPublisher::new(config.realtime.channel_capacity));
    let apply_service = Arc::new(ApplyWorkflowService::new(
        repository,
        inbox.clone(),
        publisher,
    ));

    let app = with_apply_routes(apply_service, inbox)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "job board agent service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
