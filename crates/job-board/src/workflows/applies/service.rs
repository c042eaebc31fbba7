use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use super::domain::{
    Agent, Apply, ApplyId, ApplyStatus, ChannelEvent, CompanyId, NewNotification, Notification,
    StatusChange, UnknownStatus,
};
use super::listing::{paginate, ApplyPage, PageRequest, PageSizeError, StatusFilter};
use super::repository::{
    ApplyRepository, ApplyView, EventPublisher, NotificationError, NotificationStore,
    RepositoryError,
};
use super::transition::{plan, ApplyAction, TransitionError};

/// Service driving agent decisions: persist the status, record the notification, push the event.
pub struct ApplyWorkflowService<R, N, P> {
    repository: Arc<R>,
    notifications: Arc<N>,
    publisher: Arc<P>,
    in_flight: Mutex<HashSet<ApplyId>>,
}

/// Result of a completed transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransitionOutcome {
    pub apply: Apply,
    pub previous_status: ApplyStatus,
    pub notification: Notification,
    pub event: ChannelEvent,
}

impl<R, N, P> ApplyWorkflowService<R, N, P>
where
    R: ApplyRepository + 'static,
    N: NotificationStore + 'static,
    P: EventPublisher + 'static,
{
    pub fn new(repository: Arc<R>, notifications: Arc<N>, publisher: Arc<P>) -> Self {
        Self {
            repository,
            notifications,
            publisher,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    /// Move a pending or résumé-accepted apply one stage forward.
    pub fn advance(
        &self,
        agent: Agent,
        apply_id: ApplyId,
        response: Option<String>,
    ) -> Result<TransitionOutcome, ApplyWorkflowError> {
        self.transition(
            agent,
            apply_id,
            ApplyAction::Advance,
            normalize_response(response),
        )
    }

    /// Reject a non-terminal apply. The stored response is left untouched.
    pub fn reject(
        &self,
        agent: Agent,
        apply_id: ApplyId,
    ) -> Result<TransitionOutcome, ApplyWorkflowError> {
        self.transition(agent, apply_id, ApplyAction::Reject, None)
    }

    /// Fetch a single dashboard row for the agent's company.
    pub fn get(
        &self,
        company_id: CompanyId,
        apply_id: ApplyId,
    ) -> Result<ApplyView, ApplyWorkflowError> {
        let record = self
            .repository
            .fetch(apply_id)
            .map_err(|err| ApplyWorkflowError::from_repository(apply_id, err))?
            .filter(|record| record.company_id == company_id)
            .ok_or(ApplyWorkflowError::NotFound(apply_id))?;
        Ok(record.view(self.is_in_flight(apply_id)))
    }

    /// List the company's applies for the dashboard table.
    pub fn list(
        &self,
        company_id: CompanyId,
        filter: StatusFilter,
        page: PageRequest,
    ) -> Result<ApplyPage, ApplyWorkflowError> {
        let records = self
            .repository
            .list_for_company(company_id)
            .map_err(ApplyWorkflowError::from_listing)?;
        let in_flight = lock(&self.in_flight).clone();
        Ok(paginate(records, filter, page, |id| in_flight.contains(&id)))
    }

    pub fn is_in_flight(&self, apply_id: ApplyId) -> bool {
        lock(&self.in_flight).contains(&apply_id)
    }

    fn transition(
        &self,
        agent: Agent,
        apply_id: ApplyId,
        action: ApplyAction,
        response: Option<String>,
    ) -> Result<TransitionOutcome, ApplyWorkflowError> {
        let _claim = self.claim(apply_id)?;

        let record = self
            .repository
            .fetch(apply_id)
            .map_err(|err| ApplyWorkflowError::from_repository(apply_id, err))?
            .filter(|record| record.company_id == agent.company_id)
            .ok_or(ApplyWorkflowError::NotFound(apply_id))?;

        let transition = plan(record.apply.status, action).inspect_err(|err| {
            warn!(apply_id = %apply_id, error = %err, "apply transition refused");
        })?;

        let payload = NewNotification {
            sender_id: agent.user_id,
            receiver_id: record.apply.user_id,
            kind: transition.notification,
            message: transition
                .template
                .render(&record.company_name, &record.job_title),
            created_at: Utc::now(),
        };
        let change = StatusChange {
            status: transition.to,
            response: if transition.carries_response() {
                response
            } else {
                None
            },
        };

        let apply = self
            .repository
            .update_status(apply_id, transition.from, change)
            .map_err(|err| ApplyWorkflowError::from_repository(apply_id, err))?;

        let created = self.notifications.create(payload.clone());

        let event = ChannelEvent {
            name: transition.event_name,
            payload,
        };
        self.publisher.publish(&event);

        match created {
            Ok(notification) => {
                info!(
                    apply_id = %apply_id,
                    from = %transition.from,
                    to = %transition.to,
                    event = transition.event_name,
                    "apply transition applied"
                );
                Ok(TransitionOutcome {
                    apply,
                    previous_status: transition.from,
                    notification,
                    event,
                })
            }
            Err(source) => {
                warn!(
                    apply_id = %apply_id,
                    to = %transition.to,
                    error = %source,
                    "apply status updated but notification was not recorded"
                );
                Err(ApplyWorkflowError::NotificationFailed {
                    apply: Box::new(apply),
                    source,
                })
            }
        }
    }

    fn claim(&self, apply_id: ApplyId) -> Result<InFlightClaim<'_>, ApplyWorkflowError> {
        if !lock(&self.in_flight).insert(apply_id) {
            warn!(apply_id = %apply_id, "apply transition already in flight");
            return Err(ApplyWorkflowError::InFlight(apply_id));
        }
        Ok(InFlightClaim {
            registry: &self.in_flight,
            apply_id,
        })
    }
}

/// Marks an apply as busy until dropped.
struct InFlightClaim<'a> {
    registry: &'a Mutex<HashSet<ApplyId>>,
    apply_id: ApplyId,
}

impl Drop for InFlightClaim<'_> {
    fn drop(&mut self) {
        lock(self.registry).remove(&self.apply_id);
    }
}

fn lock(registry: &Mutex<HashSet<ApplyId>>) -> MutexGuard<'_, HashSet<ApplyId>> {
    registry.lock().unwrap_or_else(PoisonError::into_inner)
}

fn normalize_response(response: Option<String>) -> Option<String> {
    response
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

/// Coarse failure classes surfaced to operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Precondition,
    Transient,
}

/// Error raised by the apply workflow service.
#[derive(Debug, thiserror::Error)]
pub enum ApplyWorkflowError {
    #[error(transparent)]
    Ineligible(#[from] TransitionError),
    #[error("apply {0} already has a status update in flight")]
    InFlight(ApplyId),
    #[error("apply {apply_id} changed concurrently: expected {expected}, found {actual}")]
    StaleStatus {
        apply_id: ApplyId,
        expected: ApplyStatus,
        actual: ApplyStatus,
    },
    #[error("apply {0} not found")]
    NotFound(ApplyId),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("collaborator unavailable: {0}")]
    Unavailable(String),
    #[error(
        "apply {} moved to {} but the notification was not recorded: {source}",
        .apply.id,
        .apply.status
    )]
    NotificationFailed {
        apply: Box<Apply>,
        source: NotificationError,
    },
}

impl ApplyWorkflowError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApplyWorkflowError::Ineligible(_)
            | ApplyWorkflowError::InFlight(_)
            | ApplyWorkflowError::StaleStatus { .. } => ErrorKind::Precondition,
            ApplyWorkflowError::NotFound(_) => ErrorKind::NotFound,
            ApplyWorkflowError::Validation(_) => ErrorKind::Validation,
            ApplyWorkflowError::Unavailable(_) => ErrorKind::Transient,
            ApplyWorkflowError::NotificationFailed { source, .. } => match source {
                NotificationError::Validation(_) => ErrorKind::Validation,
                NotificationError::Unavailable(_) => ErrorKind::Transient,
            },
        }
    }

    fn from_repository(apply_id: ApplyId, err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => Self::NotFound(apply_id),
            RepositoryError::StatusConflict { expected, actual } => Self::StaleStatus {
                apply_id,
                expected,
                actual,
            },
            RepositoryError::Validation(message) => Self::Validation(message),
            RepositoryError::Unavailable(message) => Self::Unavailable(message),
        }
    }

    fn from_listing(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Validation(message) => Self::Validation(message),
            other => Self::Unavailable(other.to_string()),
        }
    }
}

impl From<PageSizeError> for ApplyWorkflowError {
    fn from(value: PageSizeError) -> Self {
        Self::Validation(value.to_string())
    }
}

impl From<UnknownStatus> for ApplyWorkflowError {
    fn from(value: UnknownStatus) -> Self {
        Self::Validation(value.to_string())
    }
}
