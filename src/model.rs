use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Unix milliseconds — the only time type.
pub type Ms = i64;

pub const MINUTE_MS: Ms = 60_000;

/// Half-open interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: Ms,
    pub end: Ms,
}

impl Span {
    pub fn new(start: Ms, end: Ms) -> Self {
        debug_assert!(start < end, "Span start must be before end");
        Self { start, end }
    }

    /// Interval starting at `start` and lasting `minutes`.
    pub fn from_minutes(start: Ms, minutes: u32) -> Self {
        Self::new(start, start + minutes as Ms * MINUTE_MS)
    }

    pub fn duration_ms(&self) -> Ms {
        self.end - self.start
    }

    /// Half-open overlap: touching endpoints do not count.
    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn contains_instant(&self, t: Ms) -> bool {
        self.start <= t && t < self.end
    }
}

/// Lifecycle state of an appointment. Canceled records persist but stop
/// counting toward conflicts and capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AppointmentStatus {
    Scheduled,
    Completed,
    Canceled,
}

impl AppointmentStatus {
    /// Whether the appointment still occupies its interval.
    pub fn occupies(&self) -> bool {
        !matches!(self, AppointmentStatus::Canceled)
    }
}

/// A booked appointment. The occupied interval is derived at evaluation time
/// from the service's current duration, not stored on the record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Ulid,
    /// Start instant; carries both the day and the time of day.
    pub start: Ms,
    pub service_id: Ulid,
    pub status: AppointmentStatus,
}

/// Fields a reschedule may change. `None` keeps the current value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppointmentPatch {
    pub start: Option<Ms>,
    pub service_id: Option<Ulid>,
}

/// Why a candidate slot is not bookable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlotBlock {
    LunchBreak,
    CapacityReached,
}

/// One annotated candidate slot. Ephemeral — produced fresh on every
/// evaluation, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotInfo {
    pub start: Ms,
    pub available: bool,
    pub reason: Option<SlotBlock>,
}

impl SlotInfo {
    pub fn open(start: Ms) -> Self {
        Self { start, available: true, reason: None }
    }

    pub fn blocked(start: Ms, reason: SlotBlock) -> Self {
        Self { start, available: false, reason: Some(reason) }
    }
}

/// An appointment's resolved interval on a given day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OccupiedSlot {
    pub id: Ulid,
    pub span: Span,
}

/// The evaluated state of one tenant-day: every non-canceled appointment with
/// its interval resolved, sorted by `span.start`, plus the day's capacity.
#[derive(Debug, Clone)]
pub struct DayLoad {
    /// Max appointments allowed to overlap any instant.
    pub capacity: u32,
    /// Sorted by `span.start`.
    occupied: Vec<OccupiedSlot>,
}

impl DayLoad {
    pub fn new(capacity: u32) -> Self {
        Self { capacity, occupied: Vec::new() }
    }

    /// Insert maintaining sort order by span.start.
    pub fn insert(&mut self, slot: OccupiedSlot) {
        let pos = self
            .occupied
            .binary_search_by_key(&slot.span.start, |o| o.span.start)
            .unwrap_or_else(|e| e);
        self.occupied.insert(pos, slot);
    }

    pub fn is_empty(&self) -> bool {
        self.occupied.is_empty()
    }

    pub fn len(&self) -> usize {
        self.occupied.len()
    }

    /// Only occupations whose span overlaps the query window.
    /// Uses binary search to skip occupations starting at or after `query.end`.
    pub fn overlapping(&self, query: &Span) -> impl Iterator<Item = &OccupiedSlot> {
        // Everything at index >= right_bound starts at or after query.end → can't overlap.
        let right_bound = self
            .occupied
            .partition_point(|o| o.span.start < query.end);
        self.occupied[..right_bound]
            .iter()
            .filter(move |o| o.span.end > query.start)
    }

    /// How many occupations overlap the query window.
    pub fn overlap_count(&self, query: &Span) -> u32 {
        self.overlapping(query).count() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn occ(start: Ms, end: Ms) -> OccupiedSlot {
        OccupiedSlot { id: Ulid::new(), span: Span::new(start, end) }
    }

    #[test]
    fn span_basics() {
        let s = Span::new(100, 200);
        assert_eq!(s.duration_ms(), 100);
        assert!(s.contains_instant(100));
        assert!(s.contains_instant(199));
        assert!(!s.contains_instant(200)); // half-open
    }

    #[test]
    fn span_from_minutes() {
        let s = Span::from_minutes(1_000, 60);
        assert_eq!(s.end, 1_000 + 60 * MINUTE_MS);
    }

    #[test]
    fn span_overlap_symmetry() {
        let a = Span::new(100, 200);
        let b = Span::new(150, 250);
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
        assert!(a.overlaps(&a)); // any non-empty interval overlaps itself
    }

    #[test]
    fn span_adjacent_not_overlapping() {
        let a = Span::new(100, 200);
        let c = Span::new(200, 300);
        assert!(!a.overlaps(&c));
        assert!(!c.overlaps(&a));
    }

    #[test]
    fn status_occupies() {
        assert!(AppointmentStatus::Scheduled.occupies());
        assert!(AppointmentStatus::Completed.occupies());
        assert!(!AppointmentStatus::Canceled.occupies());
    }

    #[test]
    fn day_load_keeps_sort_order() {
        let mut load = DayLoad::new(1);
        load.insert(occ(300, 400));
        load.insert(occ(100, 200));
        load.insert(occ(200, 300));
        let starts: Vec<Ms> = load.occupied.iter().map(|o| o.span.start).collect();
        assert_eq!(starts, vec![100, 200, 300]);
    }

    #[test]
    fn overlapping_skips_past_and_future() {
        let mut load = DayLoad::new(1);
        load.insert(occ(100, 200));
        load.insert(occ(450, 600));
        load.insert(occ(1000, 1100));

        let query = Span::new(500, 800);
        let hits: Vec<_> = load.overlapping(&query).collect();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].span, Span::new(450, 600));
    }

    #[test]
    fn overlapping_adjacent_not_included() {
        // Occupation ending exactly at query.start is NOT overlapping (half-open)
        let mut load = DayLoad::new(1);
        load.insert(occ(100, 200));
        let query = Span::new(200, 300);
        assert_eq!(load.overlap_count(&query), 0);
    }

    #[test]
    fn overlapping_large_interval_spanning_query() {
        let mut load = DayLoad::new(1);
        load.insert(occ(0, 10_000));
        let query = Span::new(500, 600);
        assert_eq!(load.overlap_count(&query), 1);
    }

    #[test]
    fn overlapping_empty_load() {
        let load = DayLoad::new(3);
        assert_eq!(load.overlap_count(&Span::new(0, 1000)), 0);
        assert!(load.is_empty());
    }

    #[test]
    fn serde_roundtrip() {
        let appt = Appointment {
            id: Ulid::new(),
            start: 1_700_000_000_000,
            service_id: Ulid::new(),
            status: AppointmentStatus::Scheduled,
        };
        let json = serde_json::to_string(&appt).unwrap();
        let back: Appointment = serde_json::from_str(&json).unwrap();
        assert_eq!(appt, back);
    }
}
