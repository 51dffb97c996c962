use tracing::{info, warn};
use ulid::Ulid;

use crate::model::*;
use crate::observability;

use super::conflict::{check_admissible, validate_duration, validate_span};
use super::{Engine, EngineError};

/// Write-side admission. Each attempt runs requested → validating →
/// {accepted, rejected}: the tenant-day write gate is held across
/// re-fetch → validate → persist, so the validation read and the write are
/// one atomic admission — the classic check-then-act gap is closed here.
/// Rejections surface to the caller and are never retried internally.
impl Engine {
    pub async fn book_appointment(
        &self,
        tenant: &str,
        start: Ms,
        service_id: Ulid,
    ) -> Result<Appointment, EngineError> {
        let policy = self.policy(tenant).await?;
        let minutes = self.directory.service_duration(service_id).await?;
        validate_duration(minutes)?;
        let span = Span::from_minutes(start, minutes);
        validate_span(&span)?;
        let date = policy.local_date_of(start)?;

        let gate = self.day_gate(tenant, date);
        let _guard = gate.write().await;

        // Re-fetch under the gate: validation must see the latest stored state.
        let load = self.day_load(tenant, &policy, date, None).await?;
        if let Err(rejection) = check_admissible(&load, &span) {
            metrics::counter!(observability::ADMISSIONS_REJECTED_TOTAL).increment(1);
            warn!(%tenant, %service_id, start, "booking rejected: {rejection}");
            return Err(rejection);
        }

        let appointment = Appointment {
            id: Ulid::new(),
            start,
            service_id,
            status: AppointmentStatus::Scheduled,
        };
        self.store.insert(tenant, appointment.clone()).await?;

        metrics::counter!(observability::ADMISSIONS_TOTAL).increment(1);
        info!(%tenant, id = %appointment.id, start, "appointment booked");
        Ok(appointment)
    }

    /// Re-admit an existing appointment with a new time and/or service. The
    /// appointment's own record is excluded from the conflict set.
    pub async fn reschedule_appointment(
        &self,
        tenant: &str,
        id: Ulid,
        patch: AppointmentPatch,
    ) -> Result<Appointment, EngineError> {
        let current = self
            .store
            .get(tenant, id)
            .await?
            .ok_or(EngineError::NotFound(id))?;
        if current.status == AppointmentStatus::Canceled {
            return Err(EngineError::AlreadyCanceled(id));
        }

        let start = patch.start.unwrap_or(current.start);
        let service_id = patch.service_id.unwrap_or(current.service_id);

        let policy = self.policy(tenant).await?;
        let minutes = self.directory.service_duration(service_id).await?;
        validate_duration(minutes)?;
        let span = Span::from_minutes(start, minutes);
        validate_span(&span)?;
        let date = policy.local_date_of(start)?;

        // Only the target day needs serializing: shrinking the source day's
        // load can never violate its capacity invariant.
        let gate = self.day_gate(tenant, date);
        let _guard = gate.write().await;

        let load = self.day_load(tenant, &policy, date, Some(id)).await?;
        if let Err(rejection) = check_admissible(&load, &span) {
            metrics::counter!(observability::ADMISSIONS_REJECTED_TOTAL).increment(1);
            warn!(%tenant, %id, start, "reschedule rejected: {rejection}");
            return Err(rejection);
        }

        let updated = self
            .store
            .update(
                tenant,
                id,
                AppointmentPatch { start: Some(start), service_id: Some(service_id) },
            )
            .await?;

        metrics::counter!(observability::ADMISSIONS_TOTAL).increment(1);
        info!(%tenant, %id, start, "appointment rescheduled");
        Ok(updated)
    }

    /// Flip to canceled, freeing the interval for future evaluations. No
    /// re-validation — dropping load cannot violate capacity. The record
    /// persists (soft state). Idempotent.
    pub async fn cancel_appointment(&self, tenant: &str, id: Ulid) -> Result<(), EngineError> {
        Self::validate_tenant(tenant)?;
        let current = self
            .store
            .get(tenant, id)
            .await?
            .ok_or(EngineError::NotFound(id))?;
        if current.status == AppointmentStatus::Canceled {
            return Ok(());
        }

        self.store
            .set_status(tenant, id, AppointmentStatus::Canceled)
            .await?;
        metrics::counter!(observability::CANCELLATIONS_TOTAL).increment(1);
        info!(%tenant, %id, "appointment canceled");
        Ok(())
    }

    /// Mark the appointment completed. It keeps occupying its interval —
    /// only cancellation frees capacity.
    pub async fn complete_appointment(&self, tenant: &str, id: Ulid) -> Result<(), EngineError> {
        Self::validate_tenant(tenant)?;
        let current = self
            .store
            .get(tenant, id)
            .await?
            .ok_or(EngineError::NotFound(id))?;
        if current.status == AppointmentStatus::Canceled {
            return Err(EngineError::AlreadyCanceled(id));
        }

        self.store
            .set_status(tenant, id, AppointmentStatus::Completed)
            .await?;
        info!(%tenant, %id, "appointment completed");
        Ok(())
    }
}
