use crate::infra::{AppState, InMemoryNotificationStore};
use axum::extract::Path;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use job_board::workflows::applies::{
    apply_router, ApplyRepository, ApplyWorkflowService, EventPublisher, NotificationStore, UserId,
};
use serde_json::json;
use std::sync::Arc;

pub(crate) fn with_apply_routes<R, N, P>(
    service: Arc<ApplyWorkflowService<R, N, P>>,
    inbox: Arc<InMemoryNotificationStore>,
) -> axum::Router
where
    R: ApplyRepository + 'static,
    N: NotificationStore + 'static,
    P: EventPublisher + 'static,
{
    apply_router(service)
        .route(
            "/api/v1/users/:user_id/notifications",
            axum::routing::get(notifications_endpoint),
        )
        .layer(Extension(inbox))
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Acquire);
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

/// Notifications addressed to a candidate, newest first.
pub(crate) async fn notifications_endpoint(
    Extension(inbox): Extension<Arc<InMemoryNotificationStore>>,
    Path(user_id): Path<u64>,
) -> impl IntoResponse {
    let mut notifications = inbox.for_receiver(UserId(user_id));
    notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
    Json(json!({ "notifications": notifications }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::{
        seed_demo_board, BroadcastPublisher, InMemoryApplyRepository, DEMO_AGENT, DEMO_COMPANY,
    };
    use axum::body::Body;
    use axum::http::Request;
    use job_board::workflows::applies::{Agent, ApplyId};
    use metrics_exporter_prometheus::PrometheusBuilder;
    use tower::ServiceExt;

    type DemoService =
        ApplyWorkflowService<InMemoryApplyRepository, InMemoryNotificationStore, BroadcastPublisher>;

    fn app() -> (axum::Router, Arc<DemoService>) {
        let repository = Arc::new(InMemoryApplyRepository::default());
        seed_demo_board(&repository).expect("seed");
        let inbox = Arc::new(InMemoryNotificationStore::default());
        let service = Arc::new(ApplyWorkflowService::new(
            repository,
            inbox.clone(),
            Arc::new(BroadcastPublisher::new(16)),
        ));
        (with_apply_routes(service.clone(), inbox), service)
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .expect("read body");
        serde_json::from_slice(&bytes).expect("json payload")
    }

    #[tokio::test]
    async fn healthcheck_reports_ok() {
        let Json(body) = healthcheck().await;
        assert_eq!(body, json!({ "status": "ok" }));
    }

    #[tokio::test]
    async fn readiness_follows_startup_flag() {
        let readiness = Arc::new(std::sync::atomic::AtomicBool::new(false));
        let state = AppState {
            readiness: readiness.clone(),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
        };

        let starting = readiness_endpoint(Extension(state.clone()))
            .await
            .into_response();
        assert_eq!(starting.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body_json(starting).await["status"], json!("initializing"));

        readiness.store(true, std::sync::atomic::Ordering::Release);
        let ready = readiness_endpoint(Extension(state)).await.into_response();
        assert_eq!(ready.status(), StatusCode::OK);
        assert_eq!(body_json(ready).await["status"], json!("ready"));
    }

    #[tokio::test]
    async fn candidate_inbox_lists_transition_notifications() {
        let (router, service) = app();
        let agent = Agent {
            user_id: DEMO_AGENT,
            company_id: DEMO_COMPANY,
        };
        service
            .advance(agent, ApplyId(1), Some("Phone screen next week".to_string()))
            .expect("advance succeeds");

        let response = router
            .oneshot(
                Request::get("/api/v1/users/21/notifications")
                    .body(Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("route executes");

        assert_eq!(response.status(), StatusCode::OK);
        let payload = body_json(response).await;
        let notifications = payload["notifications"].as_array().expect("array");
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0]["type"], json!("job_accept"));
        assert_eq!(notifications[0]["sender_id"], json!(DEMO_AGENT.0));
    }

    #[tokio::test]
    async fn dashboard_route_is_mounted() {
        let (router, _) = app();

        let response = router
            .oneshot(
                Request::get("/api/v1/companies/1/applies?per_page=25")
                    .body(Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("route executes");

        assert_eq!(response.status(), StatusCode::OK);
        let payload = body_json(response).await;
        assert_eq!(payload["total"], json!(4));
    }
}
