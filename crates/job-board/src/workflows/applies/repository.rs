use serde::Serialize;

use super::domain::{
    Apply, ApplyId, ApplyRecord, ApplyStatus, ChannelEvent, CompanyId, JobId, NewNotification,
    Notification, StatusChange, UserId,
};
use super::transition::actions_available;

/// Storage abstraction for applies so the workflow can be exercised in isolation.
pub trait ApplyRepository: Send + Sync {
    fn fetch(&self, id: ApplyId) -> Result<Option<ApplyRecord>, RepositoryError>;

    /// Write `change` only if the stored status still equals `expected`.
    fn update_status(
        &self,
        id: ApplyId,
        expected: ApplyStatus,
        change: StatusChange,
    ) -> Result<Apply, RepositoryError>;

    fn list_for_company(&self, company: CompanyId) -> Result<Vec<ApplyRecord>, RepositoryError>;
}

/// Error enumeration for apply storage failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("apply not found")]
    NotFound,
    #[error("apply status changed concurrently: expected {expected}, found {actual}")]
    StatusConflict {
        expected: ApplyStatus,
        actual: ApplyStatus,
    },
    #[error("invalid apply update: {0}")]
    Validation(String),
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Persistence hook for user-facing notifications.
pub trait NotificationStore: Send + Sync {
    fn create(&self, notification: NewNotification) -> Result<Notification, NotificationError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NotificationError {
    #[error("invalid notification: {0}")]
    Validation(String),
    #[error("notification service unavailable: {0}")]
    Unavailable(String),
}

/// Outbound real-time channel. Publishing is fire-and-forget.
pub trait EventPublisher: Send + Sync {
    fn publish(&self, event: &ChannelEvent);
}

/// Dashboard row for one application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplyView {
    pub id: ApplyId,
    pub job_id: JobId,
    pub user_id: UserId,
    pub applicant_name: String,
    pub job_title: String,
    pub company_name: String,
    pub status: &'static str,
    pub status_label: &'static str,
    pub updated_at: chrono::DateTime<chrono::Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    pub actions_enabled: bool,
}

impl ApplyRecord {
    /// Build the dashboard row. Responses are only shown once the apply has been accepted.
    pub fn view(&self, in_flight: bool) -> ApplyView {
        let status = self.apply.status;
        ApplyView {
            id: self.apply.id,
            job_id: self.apply.job_id,
            user_id: self.apply.user_id,
            applicant_name: self.applicant_name.clone(),
            job_title: self.job_title.clone(),
            company_name: self.company_name.clone(),
            status: status.label(),
            status_label: status.display_label(),
            updated_at: self.apply.updated_at,
            response: if status.is_accepted() {
                self.apply.response.clone()
            } else {
                None
            },
            actions_enabled: actions_available(status) && !in_flight,
        }
    }
}
