//! Pure status transition rules for the agent review workflow.
//!
//! Nothing here performs I/O: [`plan`] inspects the current status and returns the full
//! description of what a transition must write, notify, and publish.

use std::fmt;

use super::domain::{ApplyStatus, NotificationType};

/// Real-time event emitted when an agent advances an application.
pub const ACCEPT_EVENT: &str = "agentAcceptJobApply";
/// Real-time event emitted when an agent rejects an application.
pub const REJECT_EVENT: &str = "agentDenyJobApply";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyAction {
    Advance,
    Reject,
}

impl fmt::Display for ApplyAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApplyAction::Advance => f.write_str("advance"),
            ApplyAction::Reject => f.write_str("reject"),
        }
    }
}

/// Candidate-facing message chosen by the transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageTemplate {
    ResumeAccepted,
    Hired,
    Rejected,
}

impl MessageTemplate {
    pub fn render(self, company_name: &str, job_title: &str) -> String {
        match self {
            MessageTemplate::ResumeAccepted => format!(
                "✅ {company_name} has accepted your application résumé for the {job_title} position"
            ),
            MessageTemplate::Hired => format!(
                "✅ Congratulations! {company_name} has hired you for the {job_title} position"
            ),
            MessageTemplate::Rejected => format!(
                "❌ {company_name} has declined your application for the {job_title} position"
            ),
        }
    }
}

/// Everything a single status change must write, notify, and publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub action: ApplyAction,
    pub from: ApplyStatus,
    pub to: ApplyStatus,
    pub notification: NotificationType,
    pub template: MessageTemplate,
    pub event_name: &'static str,
}

impl Transition {
    /// Only advancing writes the agent's response text.
    pub const fn carries_response(&self) -> bool {
        matches!(self.action, ApplyAction::Advance)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("cannot {action} an application that is {status}")]
pub struct TransitionError {
    pub action: ApplyAction,
    pub status: ApplyStatus,
}

/// Compute the transition for `action` from `status`.
pub fn plan(status: ApplyStatus, action: ApplyAction) -> Result<Transition, TransitionError> {
    let ineligible = TransitionError { action, status };

    match (action, status) {
        (ApplyAction::Advance, ApplyStatus::Pending) => Ok(Transition {
            action,
            from: status,
            to: ApplyStatus::AcceptedCvRound,
            notification: NotificationType::JobAccept,
            template: MessageTemplate::ResumeAccepted,
            event_name: ACCEPT_EVENT,
        }),
        (ApplyAction::Advance, ApplyStatus::AcceptedCvRound) => Ok(Transition {
            action,
            from: status,
            to: ApplyStatus::AcceptedInterviewRound,
            notification: NotificationType::JobAccept,
            template: MessageTemplate::Hired,
            event_name: ACCEPT_EVENT,
        }),
        (ApplyAction::Reject, ApplyStatus::Pending | ApplyStatus::AcceptedCvRound) => {
            Ok(Transition {
                action,
                from: status,
                to: ApplyStatus::Rejected,
                notification: NotificationType::JobReject,
                template: MessageTemplate::Rejected,
                event_name: REJECT_EVENT,
            })
        }
        (_, ApplyStatus::AcceptedInterviewRound | ApplyStatus::Rejected) => Err(ineligible),
    }
}

/// Whether any agent action is currently allowed from `status`.
pub fn actions_available(status: ApplyStatus) -> bool {
    !status.is_terminal()
}
