use crate::limits::*;
use crate::model::*;

use super::EngineError;

pub(crate) fn validate_span(span: &Span) -> Result<(), EngineError> {
    if span.start < MIN_VALID_TIMESTAMP_MS || span.end > MAX_VALID_TIMESTAMP_MS {
        return Err(EngineError::LimitExceeded("timestamp out of range"));
    }
    if span.duration_ms() > MAX_SPAN_DURATION_MS {
        return Err(EngineError::LimitExceeded("span too wide"));
    }
    Ok(())
}

pub(crate) fn validate_duration(minutes: u32) -> Result<(), EngineError> {
    if minutes == 0 {
        return Err(EngineError::LimitExceeded("service duration must be positive"));
    }
    if minutes > MAX_SERVICE_DURATION_MIN {
        return Err(EngineError::LimitExceeded("service duration too long"));
    }
    Ok(())
}

/// The unified admission rule (same rule the read side annotates with):
/// an interval is admissible iff the number of overlapping, non-canceled
/// appointments is strictly less than the day's capacity.
///
/// Self-exclusion on update happens upstream — the caller builds the
/// `DayLoad` without the appointment being moved.
pub(crate) fn check_admissible(load: &DayLoad, span: &Span) -> Result<(), EngineError> {
    if load.capacity <= 1 {
        // Fast path: any overlapping occupation is a conflict, and the
        // offending appointment id is worth reporting.
        if let Some(hit) = load.overlapping(span).next() {
            return Err(EngineError::SlotTaken(hit.id));
        }
    } else if load.overlap_count(span) >= load.capacity {
        return Err(EngineError::CapacityExceeded(load.capacity));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ulid::Ulid;

    const H: Ms = 3_600_000;

    fn load_with(capacity: u32, spans: &[Span]) -> (DayLoad, Vec<Ulid>) {
        let mut load = DayLoad::new(capacity);
        let mut ids = Vec::new();
        for &span in spans {
            let id = Ulid::new();
            ids.push(id);
            load.insert(OccupiedSlot { id, span });
        }
        (load, ids)
    }

    #[test]
    fn empty_day_admits() {
        let (load, _) = load_with(1, &[]);
        assert!(check_admissible(&load, &Span::new(9 * H, 10 * H)).is_ok());
    }

    #[test]
    fn capacity_one_reports_offending_id() {
        let (load, ids) = load_with(1, &[Span::new(9 * H, 10 * H)]);
        let result = check_admissible(&load, &Span::new(9 * H, 10 * H));
        match result {
            Err(EngineError::SlotTaken(id)) => assert_eq!(id, ids[0]),
            other => panic!("expected SlotTaken, got {other:?}"),
        }
    }

    #[test]
    fn touching_endpoints_admit() {
        let (load, _) = load_with(1, &[Span::new(9 * H, 10 * H)]);
        assert!(check_admissible(&load, &Span::new(8 * H, 9 * H)).is_ok());
        assert!(check_admissible(&load, &Span::new(10 * H, 11 * H)).is_ok());
    }

    #[test]
    fn capacity_boundary() {
        // capacity 3: two overlapping admits, three rejects.
        let booked = [Span::new(9 * H, 10 * H), Span::new(9 * H, 10 * H)];
        let (load, _) = load_with(3, &booked);
        assert!(check_admissible(&load, &Span::new(9 * H, 10 * H)).is_ok());

        let full = [booked[0], booked[1], Span::new(9 * H, 10 * H)];
        let (load, _) = load_with(3, &full);
        let result = check_admissible(&load, &Span::new(9 * H, 10 * H));
        assert!(matches!(result, Err(EngineError::CapacityExceeded(3))));
    }

    #[test]
    fn validate_span_bounds() {
        assert!(validate_span(&Span::new(0, 1000)).is_ok());
        assert!(validate_span(&Span::new(-1, 1000)).is_err());
        assert!(validate_span(&Span::new(0, MAX_VALID_TIMESTAMP_MS + 1)).is_err());
        let wide = Span::new(0, MAX_SPAN_DURATION_MS + 1);
        assert!(matches!(validate_span(&wide), Err(EngineError::LimitExceeded(_))));
    }

    #[test]
    fn validate_duration_bounds() {
        assert!(validate_duration(30).is_ok());
        assert!(validate_duration(0).is_err());
        assert!(validate_duration(MAX_SERVICE_DURATION_MIN + 1).is_err());
    }
}
