mod admission;
mod availability;
mod conflict;
mod error;
mod queries;
mod slots;
pub mod store;

pub use availability::{annotate_slots, available_starts};
pub use error::EngineError;
pub use slots::slot_starts;
pub use store::{AppointmentStore, Directory, InMemoryAppointments, InMemoryDirectory};

use std::sync::Arc;

use chrono::NaiveDate;
use dashmap::DashMap;
use tokio::sync::RwLock;
use ulid::Ulid;

use crate::limits::*;
use crate::model::*;
use crate::observability;
use crate::policy::CalendarPolicy;

/// Serialization point for one tenant-day's admissions.
type DayGate = Arc<RwLock<()>>;

type DayKey = (String, NaiveDate);

/// The scheduling engine. Evaluation is pure computation over data fetched
/// through the ports; writes go through the admission gate, which holds the
/// tenant-day lock across re-fetch → validate → persist so two concurrent
/// commits can never both land on an over-booked slot.
pub struct Engine {
    directory: Arc<dyn Directory>,
    store: Arc<dyn AppointmentStore>,
    /// Admission locks, lazily created per (tenant, local date).
    day_gates: DashMap<DayKey, DayGate>,
    /// Slot grid step in minutes — explicit, never a hidden literal.
    granularity_min: u32,
}

impl Engine {
    pub fn new(directory: Arc<dyn Directory>, store: Arc<dyn AppointmentStore>) -> Self {
        Self {
            directory,
            store,
            day_gates: DashMap::new(),
            granularity_min: DEFAULT_SLOT_GRANULARITY_MIN,
        }
    }

    pub fn with_granularity(
        directory: Arc<dyn Directory>,
        store: Arc<dyn AppointmentStore>,
        granularity_min: u32,
    ) -> Result<Self, EngineError> {
        if !(MIN_SLOT_GRANULARITY_MIN..=MAX_SLOT_GRANULARITY_MIN).contains(&granularity_min) {
            return Err(EngineError::LimitExceeded("slot granularity out of range"));
        }
        let mut engine = Self::new(directory, store);
        engine.granularity_min = granularity_min;
        Ok(engine)
    }

    pub fn granularity_ms(&self) -> Ms {
        self.granularity_min as Ms * MINUTE_MS
    }

    pub(super) fn validate_tenant(tenant: &str) -> Result<(), EngineError> {
        if tenant.is_empty() || tenant.len() > MAX_TENANT_NAME_LEN {
            return Err(EngineError::LimitExceeded("tenant name empty or too long"));
        }
        Ok(())
    }

    pub(super) async fn policy(&self, tenant: &str) -> Result<CalendarPolicy, EngineError> {
        Self::validate_tenant(tenant)?;
        self.directory.calendar_policy(tenant).await
    }

    /// Resolve the date's non-canceled appointments to their occupied
    /// intervals. Durations come from the service catalog at evaluation
    /// time, so a service edit shifts existing intervals on the very next
    /// evaluation. `exclude` drops one record by id (self-conflict exclusion
    /// when re-admitting an update).
    pub(super) async fn day_load(
        &self,
        tenant: &str,
        policy: &CalendarPolicy,
        date: NaiveDate,
        exclude: Option<Ulid>,
    ) -> Result<DayLoad, EngineError> {
        let bounds = policy.day_bounds(date)?;
        let appointments = self.store.list_day(tenant, bounds).await?;

        let mut load = DayLoad::new(policy.appointment_capacity);
        for appt in appointments {
            if !appt.status.occupies() || exclude == Some(appt.id) {
                continue;
            }
            let minutes = self.directory.service_duration(appt.service_id).await?;
            load.insert(OccupiedSlot {
                id: appt.id,
                span: Span::from_minutes(appt.start, minutes),
            });
        }
        Ok(load)
    }

    /// Get or lazily create the admission gate for a tenant-day.
    pub(super) fn day_gate(&self, tenant: &str, date: NaiveDate) -> DayGate {
        let gate = self
            .day_gates
            .entry((tenant.to_string(), date))
            .or_insert_with(|| Arc::new(RwLock::new(())))
            .value()
            .clone();
        metrics::gauge!(observability::DAY_GATES_ACTIVE).set(self.day_gates.len() as f64);
        gate
    }
}
