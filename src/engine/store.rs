use async_trait::async_trait;
use dashmap::DashMap;
use ulid::Ulid;

use crate::model::*;
use crate::policy::CalendarPolicy;

use super::EngineError;

/// Read-only lookups the engine consumes from the business profile.
#[async_trait]
pub trait Directory: Send + Sync {
    /// The tenant's calendar policy. A missing policy is an error — the
    /// engine never guesses working hours.
    async fn calendar_policy(&self, tenant: &str) -> Result<CalendarPolicy, EngineError>;

    /// The service's current duration in minutes, looked up at evaluation
    /// time — never frozen onto appointment records.
    async fn service_duration(&self, service_id: Ulid) -> Result<u32, EngineError>;
}

/// Appointment persistence. The admission gate is the sole mutator; the read
/// side never writes through this port.
#[async_trait]
pub trait AppointmentStore: Send + Sync {
    /// Every appointment starting inside the day window, any status — the
    /// engine filters canceled records itself.
    async fn list_day(&self, tenant: &str, day: Span) -> Result<Vec<Appointment>, EngineError>;

    async fn get(&self, tenant: &str, id: Ulid) -> Result<Option<Appointment>, EngineError>;

    async fn insert(&self, tenant: &str, appointment: Appointment) -> Result<(), EngineError>;

    async fn update(
        &self,
        tenant: &str,
        id: Ulid,
        patch: AppointmentPatch,
    ) -> Result<Appointment, EngineError>;

    async fn set_status(
        &self,
        tenant: &str,
        id: Ulid,
        status: AppointmentStatus,
    ) -> Result<(), EngineError>;
}

// ── In-memory implementations ────────────────────────────────────

/// Policy and service catalog backed by `DashMap`s. Used by the test suite
/// and by embedders that keep profile data in process.
#[derive(Default)]
pub struct InMemoryDirectory {
    policies: DashMap<String, CalendarPolicy>,
    services: DashMap<Ulid, u32>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_policy(&self, tenant: &str, policy: CalendarPolicy) {
        self.policies.insert(tenant.to_string(), policy);
    }

    /// Register a service and return its id.
    pub fn add_service(&self, duration_min: u32) -> Ulid {
        let id = Ulid::new();
        self.services.insert(id, duration_min);
        id
    }

    /// Change a service's duration. Existing appointments resolve against
    /// the new value on their next evaluation.
    pub fn set_service_duration(&self, service_id: Ulid, duration_min: u32) {
        self.services.insert(service_id, duration_min);
    }
}

#[async_trait]
impl Directory for InMemoryDirectory {
    async fn calendar_policy(&self, tenant: &str) -> Result<CalendarPolicy, EngineError> {
        self.policies
            .get(tenant)
            .map(|e| e.value().clone())
            .ok_or_else(|| EngineError::PolicyUnavailable(tenant.to_string()))
    }

    async fn service_duration(&self, service_id: Ulid) -> Result<u32, EngineError> {
        self.services
            .get(&service_id)
            .map(|e| *e.value())
            .ok_or(EngineError::UnknownService(service_id))
    }
}

struct StoredRow {
    tenant: String,
    appointment: Appointment,
}

/// Appointment storage backed by a `DashMap`. Canceled rows persist — they
/// just stop counting.
#[derive(Default)]
pub struct InMemoryAppointments {
    rows: DashMap<Ulid, StoredRow>,
}

impl InMemoryAppointments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[async_trait]
impl AppointmentStore for InMemoryAppointments {
    async fn list_day(&self, tenant: &str, day: Span) -> Result<Vec<Appointment>, EngineError> {
        let mut out: Vec<Appointment> = self
            .rows
            .iter()
            .filter(|e| e.tenant == tenant && day.contains_instant(e.appointment.start))
            .map(|e| e.appointment.clone())
            .collect();
        out.sort_by_key(|a| a.start);
        Ok(out)
    }

    async fn get(&self, tenant: &str, id: Ulid) -> Result<Option<Appointment>, EngineError> {
        Ok(self
            .rows
            .get(&id)
            .filter(|e| e.tenant == tenant)
            .map(|e| e.appointment.clone()))
    }

    async fn insert(&self, tenant: &str, appointment: Appointment) -> Result<(), EngineError> {
        self.rows.insert(
            appointment.id,
            StoredRow { tenant: tenant.to_string(), appointment },
        );
        Ok(())
    }

    async fn update(
        &self,
        tenant: &str,
        id: Ulid,
        patch: AppointmentPatch,
    ) -> Result<Appointment, EngineError> {
        let mut row = self
            .rows
            .get_mut(&id)
            .filter(|e| e.tenant == tenant)
            .ok_or(EngineError::NotFound(id))?;
        if let Some(start) = patch.start {
            row.appointment.start = start;
        }
        if let Some(service_id) = patch.service_id {
            row.appointment.service_id = service_id;
        }
        Ok(row.appointment.clone())
    }

    async fn set_status(
        &self,
        tenant: &str,
        id: Ulid,
        status: AppointmentStatus,
    ) -> Result<(), EngineError> {
        let mut row = self
            .rows
            .get_mut(&id)
            .filter(|e| e.tenant == tenant)
            .ok_or(EngineError::NotFound(id))?;
        row.appointment.status = status;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::DayHours;
    use chrono_tz::America::Sao_Paulo;

    fn any_policy() -> CalendarPolicy {
        CalendarPolicy::new(Sao_Paulo, [DayHours::closed(); 7], None, 1).unwrap()
    }

    #[tokio::test]
    async fn missing_policy_is_unavailable() {
        let dir = InMemoryDirectory::new();
        let result = dir.calendar_policy("nobody").await;
        assert!(matches!(result, Err(EngineError::PolicyUnavailable(_))));

        dir.set_policy("petshop", any_policy());
        assert!(dir.calendar_policy("petshop").await.is_ok());
    }

    #[tokio::test]
    async fn unknown_service_is_an_error() {
        let dir = InMemoryDirectory::new();
        let result = dir.service_duration(Ulid::new()).await;
        assert!(matches!(result, Err(EngineError::UnknownService(_))));

        let id = dir.add_service(45);
        assert_eq!(dir.service_duration(id).await.unwrap(), 45);
    }

    #[tokio::test]
    async fn list_day_filters_tenant_and_window() {
        let store = InMemoryAppointments::new();
        let svc = Ulid::new();
        let mk = |start| Appointment {
            id: Ulid::new(),
            start,
            service_id: svc,
            status: AppointmentStatus::Scheduled,
        };
        store.insert("a", mk(1_000)).await.unwrap();
        store.insert("a", mk(5_000)).await.unwrap();
        store.insert("b", mk(1_000)).await.unwrap();

        let day = Span::new(0, 2_000);
        let listed = store.list_day("a", day).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].start, 1_000);
    }

    #[tokio::test]
    async fn update_patches_only_given_fields() {
        let store = InMemoryAppointments::new();
        let svc = Ulid::new();
        let appt = Appointment {
            id: Ulid::new(),
            start: 1_000,
            service_id: svc,
            status: AppointmentStatus::Scheduled,
        };
        store.insert("a", appt.clone()).await.unwrap();

        let updated = store
            .update("a", appt.id, AppointmentPatch { start: Some(2_000), service_id: None })
            .await
            .unwrap();
        assert_eq!(updated.start, 2_000);
        assert_eq!(updated.service_id, svc);

        // Wrong tenant never sees the row.
        let result = store
            .update("b", appt.id, AppointmentPatch::default())
            .await;
        assert!(matches!(result, Err(EngineError::NotFound(_))));
    }

    #[tokio::test]
    async fn set_status_keeps_record() {
        let store = InMemoryAppointments::new();
        let appt = Appointment {
            id: Ulid::new(),
            start: 1_000,
            service_id: Ulid::new(),
            status: AppointmentStatus::Scheduled,
        };
        store.insert("a", appt.clone()).await.unwrap();
        store.set_status("a", appt.id, AppointmentStatus::Canceled).await.unwrap();

        let row = store.get("a", appt.id).await.unwrap().unwrap();
        assert_eq!(row.status, AppointmentStatus::Canceled);
        assert_eq!(store.len(), 1); // soft state, not deleted
    }
}
