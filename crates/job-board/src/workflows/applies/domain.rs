use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of a candidate's application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ApplyId(pub u64);

/// Identifier of a job board user (candidate or agent).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UserId(pub u64);

/// Identifier of a job posting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct JobId(pub u64);

/// Identifier of a hiring company.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CompanyId(pub u64);

/// Identifier assigned to a stored notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NotificationId(pub u64);

impl fmt::Display for ApplyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Review stage of an application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ApplyStatus {
    Pending,
    AcceptedCvRound,
    AcceptedInterviewRound,
    Rejected,
}

impl ApplyStatus {
    pub const ALL: [ApplyStatus; 4] = [
        ApplyStatus::Pending,
        ApplyStatus::AcceptedCvRound,
        ApplyStatus::AcceptedInterviewRound,
        ApplyStatus::Rejected,
    ];

    /// Wire value shared with the API and the persisted row.
    pub const fn label(self) -> &'static str {
        match self {
            ApplyStatus::Pending => "pending",
            ApplyStatus::AcceptedCvRound => "accepted-cv-round",
            ApplyStatus::AcceptedInterviewRound => "accepted-interview-round",
            ApplyStatus::Rejected => "rejected",
        }
    }

    /// Human readable stage name for the agent dashboard.
    pub const fn display_label(self) -> &'static str {
        match self {
            ApplyStatus::Pending => "Awaiting review",
            ApplyStatus::AcceptedCvRound => "Passed résumé round",
            ApplyStatus::AcceptedInterviewRound => "Hired",
            ApplyStatus::Rejected => "Rejected",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            ApplyStatus::AcceptedInterviewRound | ApplyStatus::Rejected
        )
    }

    /// Accepted stages are the only ones carrying an agent response.
    pub const fn is_accepted(self) -> bool {
        matches!(
            self,
            ApplyStatus::AcceptedCvRound | ApplyStatus::AcceptedInterviewRound
        )
    }
}

impl fmt::Display for ApplyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown apply status '{0}'")]
pub struct UnknownStatus(pub String);

impl FromStr for ApplyStatus {
    type Err = UnknownStatus;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        ApplyStatus::ALL
            .into_iter()
            .find(|status| status.label().eq_ignore_ascii_case(value))
            .ok_or_else(|| UnknownStatus(value.to_string()))
    }
}

/// One candidate's application to one job posting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Apply {
    pub id: ApplyId,
    pub job_id: JobId,
    pub user_id: UserId,
    pub status: ApplyStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// An apply joined with the applicant, job, and company context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyRecord {
    pub apply: Apply,
    pub applicant_name: String,
    pub job_title: String,
    pub company_id: CompanyId,
    pub company_name: String,
}

/// Fields written by a status transition. `response: None` leaves the stored response as is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
    pub status: ApplyStatus,
    pub response: Option<String>,
}

/// Operator acting on behalf of a hiring company.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    pub user_id: UserId,
    pub company_id: CompanyId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    JobAccept,
    JobReject,
}

impl NotificationType {
    pub const fn label(self) -> &'static str {
        match self {
            NotificationType::JobAccept => "job_accept",
            NotificationType::JobReject => "job_reject",
        }
    }
}

/// Notification payload before persistence. Also the body of the real-time event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewNotification {
    pub sender_id: UserId,
    pub receiver_id: UserId,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub message: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

/// Persisted, immutable user-facing notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub sender_id: UserId,
    pub receiver_id: UserId,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub message: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn from_new(id: NotificationId, new: NewNotification) -> Self {
        Self {
            id,
            sender_id: new.sender_id,
            receiver_id: new.receiver_id,
            kind: new.kind,
            message: new.message,
            created_at: new.created_at,
        }
    }
}

/// Event pushed on the real-time channel after a transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelEvent {
    pub name: &'static str,
    pub payload: NewNotification,
}
