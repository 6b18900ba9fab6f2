use chrono::NaiveDate;

use crate::catalog::Catalog;
use crate::model::{DayAvailability, SlotId, TimeRange};

// ── Availability Algorithm ────────────────────────────────────────

/// Which of `candidates` can still be sold on `date`, given the merged busy
/// spans (live reservations plus partner windows).
///
/// A slot is blocked iff its resolved range overlaps at least one busy span.
/// Exclusivity between slots needs no per-code rules: a whole-day sale blocks
/// the half days because their wall-clock ranges overlap, and nothing else.
pub fn day_availability(
    catalog: &Catalog,
    candidates: &[SlotId],
    date: NaiveDate,
    busy: &[TimeRange],
) -> DayAvailability {
    let mut blocked = Vec::new();
    let mut available = Vec::new();

    for slot_id in candidates {
        let def = catalog
            .slot(slot_id)
            .expect("candidate slots come from the catalog");
        let span = catalog.resolve(date, def);
        if busy.iter().any(|b| b.overlaps(&span)) {
            blocked.push(slot_id.clone());
        } else {
            available.push(slot_id.clone());
        }
    }

    let sold_out = available.is_empty();
    DayAvailability {
        date,
        blocked,
        available,
        sold_out,
    }
}

/// Merge sorted overlapping/adjacent intervals into disjoint intervals.
pub fn merge_overlapping(sorted: &[TimeRange]) -> Vec<TimeRange> {
    let mut merged: Vec<TimeRange> = Vec::new();
    for &span in sorted {
        if let Some(last) = merged.last_mut()
            && span.start <= last.end
        {
            last.end = last.end.max(span.end);
            continue;
        }
        merged.push(span);
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SlotId;

    fn catalog() -> Catalog {
        Catalog::default()
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 10).unwrap()
    }

    fn slot(code: &str) -> SlotId {
        SlotId::new(code)
    }

    fn resolve(catalog: &Catalog, code: &str) -> TimeRange {
        catalog.resolve(date(), catalog.slot(&slot(code)).unwrap())
    }

    #[test]
    fn merge_overlapping_basic() {
        let spans = vec![
            TimeRange::new(100, 300),
            TimeRange::new(200, 400),
            TimeRange::new(500, 600),
        ];
        let merged = merge_overlapping(&spans);
        assert_eq!(merged, vec![TimeRange::new(100, 400), TimeRange::new(500, 600)]);
    }

    #[test]
    fn merge_overlapping_adjacent() {
        let spans = vec![TimeRange::new(100, 200), TimeRange::new(200, 300)];
        assert_eq!(merge_overlapping(&spans), vec![TimeRange::new(100, 300)]);
    }

    #[test]
    fn empty_busy_leaves_every_slot_available() {
        let catalog = catalog();
        let day = day_availability(&catalog, &catalog.all_slot_ids(), date(), &[]);
        assert!(day.blocked.is_empty());
        assert_eq!(day.available.len(), 4);
        assert!(!day.sold_out);
    }

    #[test]
    fn whole_day_booking_blocks_everything() {
        let catalog = catalog();
        let busy = vec![resolve(&catalog, "DAY")];
        let day = day_availability(&catalog, &catalog.all_slot_ids(), date(), &busy);
        assert!(day.available.is_empty());
        assert!(day.sold_out);
    }

    #[test]
    fn morning_booking_blocks_only_overlapping_slots() {
        let catalog = catalog();
        let busy = vec![resolve(&catalog, "HALF_AM")];
        let day = day_availability(&catalog, &catalog.all_slot_ids(), date(), &busy);
        assert_eq!(day.blocked, vec![slot("DAY"), slot("HALF_AM")]);
        assert_eq!(day.available, vec![slot("HALF_PM"), slot("SUNSET")]);
        assert!(!day.sold_out);
    }

    #[test]
    fn afternoon_booking_blocks_sunset_by_overlap() {
        // 14:00–17:00 and 16:30–18:30 share half an hour; no rule table needed.
        let catalog = catalog();
        let busy = vec![resolve(&catalog, "HALF_PM")];
        let day = day_availability(&catalog, &catalog.all_slot_ids(), date(), &busy);
        assert_eq!(day.blocked, vec![slot("DAY"), slot("HALF_PM"), slot("SUNSET")]);
        assert_eq!(day.available, vec![slot("HALF_AM")]);
    }

    #[test]
    fn candidate_subset_is_respected() {
        let catalog = catalog();
        let busy = vec![resolve(&catalog, "HALF_AM")];
        let candidates = vec![slot("HALF_AM"), slot("HALF_PM")];
        let day = day_availability(&catalog, &candidates, date(), &busy);
        assert_eq!(day.blocked, vec![slot("HALF_AM")]);
        assert_eq!(day.available, vec![slot("HALF_PM")]);
    }

    #[test]
    fn busy_on_other_day_does_not_block() {
        let catalog = catalog();
        let other = NaiveDate::from_ymd_opt(2025, 6, 11).unwrap();
        let busy = vec![catalog.resolve(other, catalog.slot(&slot("DAY")).unwrap())];
        let day = day_availability(&catalog, &catalog.all_slot_ids(), date(), &busy);
        assert!(day.blocked.is_empty());
    }
}
