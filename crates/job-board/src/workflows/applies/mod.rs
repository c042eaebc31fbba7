//! Agent review workflow for job applications.
//!
//! An agent advances an application through the résumé and interview rounds or rejects it.
//! Each accepted change writes the new status, records one notification for the candidate,
//! and pushes one event on the real-time channel, always in that order.

pub mod domain;
pub mod listing;
pub mod repository;
pub mod router;
pub mod service;
pub mod transition;

#[cfg(test)]
mod tests;

pub use domain::{
    Agent, Apply, ApplyId, ApplyRecord, ApplyStatus, ChannelEvent, CompanyId, JobId,
    NewNotification, Notification, NotificationId, NotificationType, StatusChange, UnknownStatus,
    UserId,
};
pub use listing::{
    ApplyPage, PageRequest, PageSizeError, StatusFilter, DEFAULT_ROWS_PER_PAGE,
    ROWS_PER_PAGE_OPTIONS,
};
pub use repository::{
    ApplyRepository, ApplyView, EventPublisher, NotificationError, NotificationStore,
    RepositoryError,
};
pub use router::apply_router;
pub use service::{ApplyWorkflowError, ApplyWorkflowService, ErrorKind, TransitionOutcome};
pub use transition::{
    plan, ApplyAction, MessageTemplate, Transition, TransitionError, ACCEPT_EVENT, REJECT_EVENT,
};
