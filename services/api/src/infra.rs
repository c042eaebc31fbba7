use chrono::{DateTime, Duration, Utc};
use job_board::workflows::applies::{
    Apply, ApplyId, ApplyRecord, ApplyRepository, ApplyStatus, ChannelEvent, CompanyId,
    EventPublisher, JobId, NewNotification, Notification, NotificationError, NotificationId,
    NotificationStore, RepositoryError, StatusChange, UserId,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;
use tracing::debug;

/// Longest agent response accepted by the store.
pub(crate) const MAX_RESPONSE_LEN: usize = 10_000;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryApplyRepository {
    records: Arc<Mutex<HashMap<ApplyId, ApplyRecord>>>,
}

impl InMemoryApplyRepository {
    pub(crate) fn insert(&self, record: ApplyRecord) -> Result<(), RepositoryError> {
        let mut guard = self
            .records
            .lock()
            .map_err(|_| RepositoryError::Unavailable("apply store poisoned".to_string()))?;
        guard.insert(record.apply.id, record);
        Ok(())
    }
}

impl ApplyRepository for InMemoryApplyRepository {
    fn fetch(&self, id: ApplyId) -> Result<Option<ApplyRecord>, RepositoryError> {
        let guard = self
            .records
            .lock()
            .map_err(|_| RepositoryError::Unavailable("apply store poisoned".to_string()))?;
        Ok(guard.get(&id).cloned())
    }

    fn update_status(
        &self,
        id: ApplyId,
        expected: ApplyStatus,
        change: StatusChange,
    ) -> Result<Apply, RepositoryError> {
        if let Some(response) = &change.response {
            if response.chars().count() > MAX_RESPONSE_LEN {
                return Err(RepositoryError::Validation(format!(
                    "response exceeds {MAX_RESPONSE_LEN} characters"
                )));
            }
        }

        let mut guard = self
            .records
            .lock()
            .map_err(|_| RepositoryError::Unavailable("apply store poisoned".to_string()))?;
        let record = guard.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        if record.apply.status != expected {
            return Err(RepositoryError::StatusConflict {
                expected,
                actual: record.apply.status,
            });
        }

        record.apply.status = change.status;
        if let Some(response) = change.response {
            record.apply.response = Some(response);
        }
        record.apply.updated_at = Utc::now();
        Ok(record.apply.clone())
    }

    fn list_for_company(&self, company: CompanyId) -> Result<Vec<ApplyRecord>, RepositoryError> {
        let guard = self
            .records
            .lock()
            .map_err(|_| RepositoryError::Unavailable("apply store poisoned".to_string()))?;
        Ok(guard
            .values()
            .filter(|record| record.company_id == company)
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub(crate) struct InMemoryNotificationStore {
    sequence: AtomicU64,
    notifications: Mutex<Vec<Notification>>,
}

impl InMemoryNotificationStore {
    pub(crate) fn for_receiver(&self, receiver: UserId) -> Vec<Notification> {
        match self.notifications.lock() {
            Ok(guard) => guard
                .iter()
                .filter(|notification| notification.receiver_id == receiver)
                .cloned()
                .collect(),
            Err(_) => Vec::new(),
        }
    }
}

impl NotificationStore for InMemoryNotificationStore {
    fn create(&self, notification: NewNotification) -> Result<Notification, NotificationError> {
        if notification.message.trim().is_empty() {
            return Err(NotificationError::Validation(
                "message must not be empty".to_string(),
            ));
        }
        if notification.sender_id == notification.receiver_id {
            return Err(NotificationError::Validation(
                "sender and receiver must differ".to_string(),
            ));
        }

        let id = NotificationId(self.sequence.fetch_add(1, Ordering::Relaxed) + 1);
        let stored = Notification::from_new(id, notification);
        self.notifications
            .lock()
            .map_err(|_| NotificationError::Unavailable("notification store poisoned".to_string()))?
            .push(stored.clone());
        Ok(stored)
    }
}

/// In-process real-time channel. Events sent while nobody listens are dropped.
#[derive(Clone)]
pub(crate) struct BroadcastPublisher {
    sender: broadcast::Sender<ChannelEvent>,
}

impl BroadcastPublisher {
    pub(crate) fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub(crate) fn subscribe(&self) -> broadcast::Receiver<ChannelEvent> {
        self.sender.subscribe()
    }
}

impl EventPublisher for BroadcastPublisher {
    fn publish(&self, event: &ChannelEvent) {
        match self.sender.send(event.clone()) {
            Ok(receivers) => debug!(event = event.name, receivers, "event published"),
            Err(_) => debug!(event = event.name, "event dropped without subscribers"),
        }
    }
}

pub(crate) const DEMO_COMPANY: CompanyId = CompanyId(1);
pub(crate) const DEMO_AGENT: UserId = UserId(10);

/// Sample board: one company, two postings, four candidates at different stages.
pub(crate) fn demo_records(now: DateTime<Utc>) -> Vec<ApplyRecord> {
    let entry = |id: u64, job: (u64, &str), user: (u64, &str), status, hours_ago: i64| {
        ApplyRecord {
            apply: Apply {
                id: ApplyId(id),
                job_id: JobId(job.0),
                user_id: UserId(user.0),
                status,
                response: None,
                updated_at: now - Duration::hours(hours_ago),
            },
            applicant_name: user.1.to_string(),
            job_title: job.1.to_string(),
            company_id: DEMO_COMPANY,
            company_name: "Riverside Logistics".to_string(),
        }
    };

    vec![
        entry(1, (100, "Warehouse Supervisor"), (21, "Mai Nguyen"), ApplyStatus::Pending, 2),
        entry(2, (100, "Warehouse Supervisor"), (22, "Duc Pham"), ApplyStatus::AcceptedCvRound, 30),
        entry(3, (101, "Fleet Coordinator"), (23, "Hana Le"), ApplyStatus::Pending, 5),
        entry(4, (101, "Fleet Coordinator"), (24, "Quang Vo"), ApplyStatus::Rejected, 72),
    ]
}

pub(crate) fn seed_demo_board(repository: &InMemoryApplyRepository) -> Result<usize, RepositoryError> {
    let records = demo_records(Utc::now());
    let count = records.len();
    for record in records {
        repository.insert(record)?;
    }
    Ok(count)
}
