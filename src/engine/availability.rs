use crate::model::*;

// ── Availability Algorithm ────────────────────────────────────────

/// Annotate every candidate slot of a day, in order.
///
/// Lunch wins over capacity: a slot touching the lunch window is reported as
/// `LunchBreak` even when it is also fully booked. Capacity follows the one
/// unified rule shared with the admission path: a slot is available iff the
/// number of overlapping, non-canceled appointments is strictly less than
/// the day's capacity. Pure — identical inputs always yield the identical
/// sequence.
pub fn annotate_slots(
    starts: &[Ms],
    service_duration: Ms,
    lunch: Option<Span>,
    load: &DayLoad,
) -> Vec<SlotInfo> {
    starts
        .iter()
        .map(|&start| {
            let candidate = Span::new(start, start + service_duration);
            if let Some(lunch) = lunch
                && candidate.overlaps(&lunch) {
                    return SlotInfo::blocked(start, SlotBlock::LunchBreak);
                }
            if load.overlap_count(&candidate) >= load.capacity {
                return SlotInfo::blocked(start, SlotBlock::CapacityReached);
            }
            SlotInfo::open(start)
        })
        .collect()
}

/// The bookable subsequence — what a booking UI presents as choices.
pub fn available_starts(slots: &[SlotInfo]) -> Vec<Ms> {
    slots.iter().filter(|s| s.available).map(|s| s.start).collect()
}
