use std::time::Instant;

use chrono::NaiveDate;
use ulid::Ulid;

use crate::model::*;
use crate::observability;

use super::availability::annotate_slots;
use super::conflict::{check_admissible, validate_duration, validate_span};
use super::slots::slot_starts;
use super::{Engine, EngineError};

impl Engine {
    /// Read-side availability: the full annotated slot sequence for a date
    /// and service. A closed day yields an empty list — that is not an
    /// error, and callers must keep it distinct from a failed fetch.
    ///
    /// `exclude` omits one appointment by id, for "pick a new time" flows.
    pub async fn compute_availability(
        &self,
        tenant: &str,
        date: NaiveDate,
        service_id: Ulid,
        exclude: Option<Ulid>,
    ) -> Result<Vec<SlotInfo>, EngineError> {
        metrics::counter!(observability::AVAILABILITY_QUERIES_TOTAL).increment(1);
        let started = Instant::now();

        let policy = self.policy(tenant).await?;
        let Some(open) = policy.open_span(date)? else {
            return Ok(Vec::new());
        };

        let minutes = self.directory.service_duration(service_id).await?;
        validate_duration(minutes)?;
        let duration = minutes as Ms * MINUTE_MS;

        let starts = slot_starts(open, duration, self.granularity_ms());
        let load = self.day_load(tenant, &policy, date, exclude).await?;
        let lunch = policy.lunch_span(date)?;
        let slots = annotate_slots(&starts, duration, lunch, &load);

        metrics::histogram!(observability::AVAILABILITY_DURATION_SECONDS)
            .record(started.elapsed().as_secs_f64());
        tracing::debug!(
            %tenant,
            %service_id,
            %date,
            candidates = slots.len(),
            open = slots.iter().filter(|s| s.available).count(),
            "availability computed"
        );
        Ok(slots)
    }

    /// Pre-flight check for one proposed interval: the unified
    /// conflict/capacity rule, evaluated against current state. Takes no
    /// lock — only the admission gate's answer is authoritative.
    pub async fn is_slot_available(
        &self,
        tenant: &str,
        proposed: Span,
        exclude: Option<Ulid>,
    ) -> Result<bool, EngineError> {
        validate_span(&proposed)?;
        let policy = self.policy(tenant).await?;
        let date = policy.local_date_of(proposed.start)?;
        let load = self.day_load(tenant, &policy, date, exclude).await?;
        Ok(check_admissible(&load, &proposed).is_ok())
    }
}
