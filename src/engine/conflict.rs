use crate::limits::*;
use crate::model::{Ms, Schedule, TimeRange};

use super::EngineError;

pub(crate) fn now_ms() -> Ms {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("system clock before unix epoch")
        .as_millis() as Ms
}

pub(crate) fn validate_range(span: &TimeRange) -> Result<(), EngineError> {
    if span.start < MIN_VALID_TIMESTAMP_MS || span.end > MAX_VALID_TIMESTAMP_MS {
        return Err(EngineError::LimitExceeded("timestamp out of range"));
    }
    if span.duration_ms() > MAX_SPAN_DURATION_MS {
        return Err(EngineError::LimitExceeded("range too wide"));
    }
    Ok(())
}

/// Write-time guard: the requested range must not overlap any live
/// reservation or partner busy window. Runs under the schedule write lock,
/// so check + insert are atomic with respect to concurrent hold attempts.
pub(crate) fn check_no_conflict(
    schedule: &Schedule,
    span: &TimeRange,
    partner_busy: &[TimeRange],
    now: Ms,
) -> Result<(), EngineError> {
    for reservation in schedule.overlapping(span) {
        if reservation.is_live(now) {
            return Err(EngineError::Conflict(reservation.id));
        }
    }
    if partner_busy.iter().any(|b| b.overlaps(span)) {
        return Err(EngineError::PartnerBusy);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::tests::sample_reservation;
    use crate::model::ReservationStatus;

    #[test]
    fn live_hold_conflicts() {
        let mut schedule = Schedule::new();
        let mut hold = sample_reservation(1_000, 2_000, ReservationStatus::Hold);
        hold.hold_expires_at = Some(10_000);
        let id = hold.id;
        schedule.insert(hold);

        let err = check_no_conflict(&schedule, &TimeRange::new(1_500, 2_500), &[], 5_000);
        assert!(matches!(err, Err(EngineError::Conflict(c)) if c == id));
    }

    #[test]
    fn expired_hold_does_not_block() {
        let mut schedule = Schedule::new();
        let mut hold = sample_reservation(1_000, 2_000, ReservationStatus::Hold);
        hold.hold_expires_at = Some(4_000);
        schedule.insert(hold);

        assert!(check_no_conflict(&schedule, &TimeRange::new(1_500, 2_500), &[], 5_000).is_ok());
    }

    #[test]
    fn cancelled_does_not_block() {
        let mut schedule = Schedule::new();
        schedule.insert(sample_reservation(1_000, 2_000, ReservationStatus::Cancelled));
        assert!(check_no_conflict(&schedule, &TimeRange::new(1_000, 2_000), &[], 0).is_ok());
    }

    #[test]
    fn adjacent_ranges_do_not_conflict() {
        let mut schedule = Schedule::new();
        schedule.insert(sample_reservation(1_000, 2_000, ReservationStatus::Confirmed));
        assert!(check_no_conflict(&schedule, &TimeRange::new(2_000, 3_000), &[], 0).is_ok());
    }

    #[test]
    fn partner_busy_window_conflicts() {
        let schedule = Schedule::new();
        let busy = vec![TimeRange::new(1_000, 2_000)];
        let err = check_no_conflict(&schedule, &TimeRange::new(1_500, 2_500), &busy, 0);
        assert!(matches!(err, Err(EngineError::PartnerBusy)));
        assert!(check_no_conflict(&schedule, &TimeRange::new(2_000, 3_000), &busy, 0).is_ok());
    }

    #[test]
    fn range_validation_bounds() {
        assert!(validate_range(&TimeRange::new(1_000, 2_000)).is_ok());
        assert!(matches!(
            validate_range(&TimeRange::new(-5, 100)),
            Err(EngineError::LimitExceeded(_))
        ));
        assert!(matches!(
            validate_range(&TimeRange::new(0, MAX_SPAN_DURATION_MS + 1)),
            Err(EngineError::LimitExceeded(_))
        ));
    }
}
