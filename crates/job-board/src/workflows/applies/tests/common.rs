use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use crate::workflows::applies::domain::{
    Agent, Apply, ApplyId, ApplyRecord, ApplyStatus, ChannelEvent, CompanyId, JobId,
    NewNotification, Notification, NotificationId, StatusChange, UserId,
};
use crate::workflows::applies::repository::{
    ApplyRepository, EventPublisher, NotificationError, NotificationStore, RepositoryError,
};
use crate::workflows::applies::{apply_router, ApplyWorkflowService};

pub(super) const COMPANY: CompanyId = CompanyId(7);
pub(super) const AGENT_USER: UserId = UserId(900);

pub(super) fn agent() -> Agent {
    Agent {
        user_id: AGENT_USER,
        company_id: COMPANY,
    }
}

pub(super) fn timestamp(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, day, 9, 30, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn record(id: u64, status: ApplyStatus) -> ApplyRecord {
    ApplyRecord {
        apply: Apply {
            id: ApplyId(id),
            job_id: JobId(40),
            user_id: UserId(100 + id),
            status,
            response: None,
            updated_at: timestamp(1),
        },
        applicant_name: format!("Candidate {id}"),
        job_title: "Backend Engineer".to_string(),
        company_id: COMPANY,
        company_name: "Northwind".to_string(),
    }
}

pub(super) type TestService =
    ApplyWorkflowService<MemoryRepository, MemoryNotifications, RecordingPublisher>;

pub(super) fn build_service(
    records: Vec<ApplyRecord>,
) -> (
    TestService,
    Arc<MemoryRepository>,
    Arc<MemoryNotifications>,
    Arc<RecordingPublisher>,
) {
    let repository = Arc::new(MemoryRepository::with_records(records));
    let notifications = Arc::new(MemoryNotifications::default());
    let publisher = Arc::new(RecordingPublisher::default());
    let service =
        ApplyWorkflowService::new(repository.clone(), notifications.clone(), publisher.clone());
    (service, repository, notifications, publisher)
}

#[derive(Default)]
pub(super) struct MemoryRepository {
    records: Mutex<HashMap<ApplyId, ApplyRecord>>,
}

impl MemoryRepository {
    pub(super) fn with_records(records: Vec<ApplyRecord>) -> Self {
        let records = records
            .into_iter()
            .map(|record| (record.apply.id, record))
            .collect();
        Self {
            records: Mutex::new(records),
        }
    }

    pub(super) fn status(&self, id: u64) -> ApplyStatus {
        self.records
            .lock()
            .expect("repository mutex poisoned")
            .get(&ApplyId(id))
            .map(|record| record.apply.status)
            .expect("record present")
    }

    pub(super) fn stored(&self, id: u64) -> ApplyRecord {
        self.records
            .lock()
            .expect("repository mutex poisoned")
            .get(&ApplyId(id))
            .cloned()
            .expect("record present")
    }

    pub(super) fn force_status(&self, id: u64, status: ApplyStatus) {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if let Some(record) = guard.get_mut(&ApplyId(id)) {
            record.apply.status = status;
        }
    }
}

impl ApplyRepository for MemoryRepository {
    fn fetch(&self, id: ApplyId) -> Result<Option<ApplyRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(&id).cloned())
    }

    fn update_status(
        &self,
        id: ApplyId,
        expected: ApplyStatus,
        change: StatusChange,
    ) -> Result<Apply, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
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
        record.apply.updated_at = timestamp(20);
        Ok(record.apply.clone())
    }

    fn list_for_company(&self, company: CompanyId) -> Result<Vec<ApplyRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard
            .values()
            .filter(|record| record.company_id == company)
            .cloned()
            .collect())
    }
}

/// Serves reads from a fixed record but fails every write.
pub(super) struct UnavailableRepository {
    pub(super) record: ApplyRecord,
    pub(super) error: RepositoryError,
}

impl ApplyRepository for UnavailableRepository {
    fn fetch(&self, id: ApplyId) -> Result<Option<ApplyRecord>, RepositoryError> {
        Ok((self.record.apply.id == id).then(|| self.record.clone()))
    }

    fn update_status(
        &self,
        _id: ApplyId,
        _expected: ApplyStatus,
        _change: StatusChange,
    ) -> Result<Apply, RepositoryError> {
        Err(self.error.clone())
    }

    fn list_for_company(&self, _company: CompanyId) -> Result<Vec<ApplyRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

/// Pauses inside `update_status` until the test releases it.
pub(super) struct GatedRepository {
    pub(super) inner: MemoryRepository,
    entered: Mutex<Sender<()>>,
    release: Mutex<Receiver<()>>,
}

impl GatedRepository {
    pub(super) fn new(inner: MemoryRepository) -> (Self, Receiver<()>, Sender<()>) {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let repository = Self {
            inner,
            entered: Mutex::new(entered_tx),
            release: Mutex::new(release_rx),
        };
        (repository, entered_rx, release_tx)
    }
}

impl ApplyRepository for GatedRepository {
    fn fetch(&self, id: ApplyId) -> Result<Option<ApplyRecord>, RepositoryError> {
        self.inner.fetch(id)
    }

    fn update_status(
        &self,
        id: ApplyId,
        expected: ApplyStatus,
        change: StatusChange,
    ) -> Result<Apply, RepositoryError> {
        self.entered
            .lock()
            .expect("gate mutex poisoned")
            .send(())
            .expect("test waits for the gate");
        self.release
            .lock()
            .expect("gate mutex poisoned")
            .recv()
            .expect("test releases the gate");
        self.inner.update_status(id, expected, change)
    }

    fn list_for_company(&self, company: CompanyId) -> Result<Vec<ApplyRecord>, RepositoryError> {
        self.inner.list_for_company(company)
    }
}

#[derive(Default)]
pub(super) struct MemoryNotifications {
    created: Mutex<Vec<Notification>>,
    failure: Mutex<Option<NotificationError>>,
}

impl MemoryNotifications {
    pub(super) fn failing(error: NotificationError) -> Self {
        Self {
            created: Mutex::new(Vec::new()),
            failure: Mutex::new(Some(error)),
        }
    }

    pub(super) fn created(&self) -> Vec<Notification> {
        self.created
            .lock()
            .expect("notification mutex poisoned")
            .clone()
    }
}

impl NotificationStore for MemoryNotifications {
    fn create(&self, notification: NewNotification) -> Result<Notification, NotificationError> {
        if let Some(error) = self
            .failure
            .lock()
            .expect("notification mutex poisoned")
            .clone()
        {
            return Err(error);
        }
        let mut guard = self.created.lock().expect("notification mutex poisoned");
        let stored = Notification::from_new(NotificationId(guard.len() as u64 + 1), notification);
        guard.push(stored.clone());
        Ok(stored)
    }
}

#[derive(Default)]
pub(super) struct RecordingPublisher {
    events: Mutex<Vec<ChannelEvent>>,
}

impl RecordingPublisher {
    pub(super) fn events(&self) -> Vec<ChannelEvent> {
        self.events.lock().expect("publisher mutex poisoned").clone()
    }
}

impl EventPublisher for RecordingPublisher {
    fn publish(&self, event: &ChannelEvent) {
        self.events
            .lock()
            .expect("publisher mutex poisoned")
            .push(event.clone());
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) fn router_with_service(service: TestService) -> axum::Router {
    apply_router(Arc::new(service))
}
