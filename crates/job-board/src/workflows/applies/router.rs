use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;

use crate::error::AppError;

use super::domain::{Agent, ApplyId, CompanyId, UserId};
use super::listing::{PageRequest, StatusFilter, DEFAULT_ROWS_PER_PAGE};
use super::repository::{ApplyRepository, EventPublisher, NotificationStore};
use super::service::{ApplyWorkflowError, ApplyWorkflowService};

/// Router builder exposing the agent dashboard endpoints.
pub fn apply_router<R, N, P>(service: Arc<ApplyWorkflowService<R, N, P>>) -> Router
where
    R: ApplyRepository + 'static,
    N: NotificationStore + 'static,
    P: EventPublisher + 'static,
{
    Router::new()
        .route(
            "/api/v1/companies/:company_id/applies",
            get(list_handler::<R, N, P>),
        )
        .route(
            "/api/v1/companies/:company_id/applies/:apply_id",
            get(detail_handler::<R, N, P>),
        )
        .route(
            "/api/v1/applies/:apply_id/advance",
            post(advance_handler::<R, N, P>),
        )
        .route(
            "/api/v1/applies/:apply_id/reject",
            post(reject_handler::<R, N, P>),
        )
        .with_state(service)
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub page: Option<usize>,
    #[serde(default)]
    pub per_page: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdvanceRequest {
    pub agent_id: UserId,
    pub company_id: CompanyId,
    #[serde(default)]
    pub response: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RejectRequest {
    pub agent_id: UserId,
    pub company_id: CompanyId,
}

pub(crate) async fn list_handler<R, N, P>(
    State(service): State<Arc<ApplyWorkflowService<R, N, P>>>,
    Path(company_id): Path<u64>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Response, AppError>
where
    R: ApplyRepository + 'static,
    N: NotificationStore + 'static,
    P: EventPublisher + 'static,
{
    let Query(query) =
        query.map_err(|rejection| ApplyWorkflowError::Validation(rejection.body_text()))?;
    let filter = StatusFilter::parse(query.status.as_deref()).map_err(ApplyWorkflowError::from)?;
    let page = PageRequest::new(
        query.page.unwrap_or(0),
        query.per_page.unwrap_or(DEFAULT_ROWS_PER_PAGE),
    )
    .map_err(ApplyWorkflowError::from)?;

    let page = service.list(CompanyId(company_id), filter, page)?;
    Ok((StatusCode::OK, axum::Json(page)).into_response())
}

pub(crate) async fn detail_handler<R, N, P>(
    State(service): State<Arc<ApplyWorkflowService<R, N, P>>>,
    Path((company_id, apply_id)): Path<(u64, u64)>,
) -> Result<Response, AppError>
where
    R: ApplyRepository + 'static,
    N: NotificationStore + 'static,
    P: EventPublisher + 'static,
{
    let view = service.get(CompanyId(company_id), ApplyId(apply_id))?;
    Ok((StatusCode::OK, axum::Json(view)).into_response())
}

pub(crate) async fn advance_handler<R, N, P>(
    State(service): State<Arc<ApplyWorkflowService<R, N, P>>>,
    Path(apply_id): Path<u64>,
    axum::Json(request): axum::Json<AdvanceRequest>,
) -> Result<Response, AppError>
where
    R: ApplyRepository + 'static,
    N: NotificationStore + 'static,
    P: EventPublisher + 'static,
{
    let agent = Agent {
        user_id: request.agent_id,
        company_id: request.company_id,
    };
    let outcome = service.advance(agent, ApplyId(apply_id), request.response)?;
    Ok((StatusCode::OK, axum::Json(outcome)).into_response())
}

pub(crate) async fn reject_handler<R, N, P>(
    State(service): State<Arc<ApplyWorkflowService<R, N, P>>>,
    Path(apply_id): Path<u64>,
    axum::Json(request): axum::Json<RejectRequest>,
) -> Result<Response, AppError>
where
    R: ApplyRepository + 'static,
    N: NotificationStore + 'static,
    P: EventPublisher + 'static,
{
    let agent = Agent {
        user_id: request.agent_id,
        company_id: request.company_id,
    };
    let outcome = service.reject(agent, ApplyId(apply_id))?;
    Ok((StatusCode::OK, axum::Json(outcome)).into_response())
}
