use crate::model::{Ms, Span};

/// Candidate start instants for one day: a fixed-step grid beginning at the
/// day's open instant, kept while the whole service interval fits before
/// close. Regenerated on every call — policy or duration edits are reflected
/// immediately, nothing is cached.
pub fn slot_starts(open: Span, service_duration: Ms, granularity: Ms) -> Vec<Ms> {
    debug_assert!(service_duration > 0, "service duration must be positive");
    debug_assert!(granularity > 0, "granularity must be positive");

    let mut starts = Vec::new();
    let mut candidate = open.start;
    while candidate + service_duration <= open.end {
        starts.push(candidate);
        candidate += granularity;
    }
    starts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MINUTE_MS;

    const H: Ms = 3_600_000;

    #[test]
    fn grid_fits_service_before_close() {
        // 08:00–12:00, 60-min service, 30-min grid → last start 11:00 fits exactly.
        let open = Span::new(8 * H, 12 * H);
        let starts = slot_starts(open, 60 * MINUTE_MS, 30 * MINUTE_MS);
        let expected: Vec<Ms> = (0..7).map(|i| 8 * H + i * 30 * MINUTE_MS).collect();
        assert_eq!(starts, expected);
        assert_eq!(*starts.last().unwrap(), 11 * H);
    }

    #[test]
    fn service_longer_than_window_yields_nothing() {
        let open = Span::new(8 * H, 9 * H);
        let starts = slot_starts(open, 2 * H, 30 * MINUTE_MS);
        assert!(starts.is_empty());
    }

    #[test]
    fn exact_fit_single_slot() {
        let open = Span::new(8 * H, 9 * H);
        let starts = slot_starts(open, H, 30 * MINUTE_MS);
        assert_eq!(starts, vec![8 * H]);
    }

    #[test]
    fn granularity_independent_of_duration() {
        // 15-min service on a 30-min grid still steps by 30.
        let open = Span::new(8 * H, 10 * H);
        let starts = slot_starts(open, 15 * MINUTE_MS, 30 * MINUTE_MS);
        assert_eq!(starts.len(), 4);
        assert_eq!(starts[1] - starts[0], 30 * MINUTE_MS);
    }

    #[test]
    fn ordered_ascending() {
        let open = Span::new(8 * H, 18 * H);
        let starts = slot_starts(open, 45 * MINUTE_MS, 30 * MINUTE_MS);
        assert!(starts.windows(2).all(|w| w[0] < w[1]));
    }
}
