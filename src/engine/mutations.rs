use chrono::NaiveDate;
use tokio::sync::oneshot;
use ulid::Ulid;

use crate::limits::*;
use crate::model::{
    CustomerDetails, Event, Ms, ProductId, QuoteOptions, Reservation, ReservationStatus, SlotId,
};

use super::conflict::{check_no_conflict, now_ms, validate_range};
use super::quote::compute_quote;
use super::{Engine, EngineError, WalCommand};

/// Everything needed to place a hold.
#[derive(Debug, Clone)]
pub struct HoldRequest {
    pub product: ProductId,
    pub slot: SlotId,
    pub date: NaiveDate,
    pub guests: u32,
    pub options: QuoteOptions,
    pub customer: CustomerDetails,
    pub notes: Option<String>,
}

impl Engine {
    /// Place a time-boxed hold on a slot. The availability check re-runs at
    /// write time under the schedule write lock, so two concurrent callers
    /// cannot both hold overlapping ranges.
    pub async fn create_hold(&self, req: HoldRequest) -> Result<Reservation, EngineError> {
        // The quote engine validates product, slot, guest bounds and option
        // legality, and prices the hold.
        let quote = compute_quote(
            &self.config.pricing,
            &self.config.catalog,
            &req.product,
            &req.slot,
            req.guests,
            &req.options,
        )?;

        if req.customer.name.trim().is_empty() || req.customer.email.trim().is_empty() {
            return Err(EngineError::Validation(
                "customer name and email are required".into(),
            ));
        }
        if req.customer.name.len() > MAX_NAME_LEN
            || req.customer.email.len() > MAX_NAME_LEN
            || req.customer.phone.as_ref().is_some_and(|p| p.len() > MAX_NAME_LEN)
        {
            return Err(EngineError::LimitExceeded("customer field too long"));
        }
        if req.notes.as_ref().is_some_and(|n| n.len() > MAX_NOTES_LEN) {
            return Err(EngineError::LimitExceeded("notes too long"));
        }

        let slot_def = self
            .config
            .catalog
            .slot(&req.slot)
            .ok_or_else(|| EngineError::UnknownSlot(req.slot.clone()))?;
        let span = self.config.catalog.resolve(req.date, slot_def);
        validate_range(&span)?;

        // Partner busy windows are advisory; fetch them before taking the
        // write lock so the critical section never waits on the network.
        let partner_busy = self.partner_busy(&span).await;

        let mut schedule = self.schedule.write().await;
        if schedule.len() >= MAX_RESERVATIONS {
            return Err(EngineError::LimitExceeded("too many reservations"));
        }
        let now = now_ms();
        if let Err(e) = check_no_conflict(&schedule, &span, &partner_busy, now) {
            metrics::counter!(crate::observability::HOLD_CONFLICTS_TOTAL).increment(1);
            return Err(e);
        }

        let reservation = Reservation {
            id: Ulid::new(),
            product: req.product,
            slot: req.slot,
            date: req.date,
            span,
            status: ReservationStatus::Hold,
            hold_expires_at: Some(now + self.config.hold_duration_ms),
            guests: req.guests,
            options: req.options,
            total_cents: quote.total_cents,
            currency: quote.currency,
            customer: req.customer,
            notes: req.notes,
            created_at: now,
            updated_at: now,
            cancelled_at: None,
            cancel_reason: None,
            refund_pending_cents: None,
        };

        let event = Event::ReservationRecorded {
            reservation: reservation.clone(),
        };
        self.persist_and_apply(&mut schedule, &event).await?;
        metrics::counter!(crate::observability::HOLDS_PLACED_TOTAL).increment(1);
        Ok(reservation)
    }

    /// HOLD → CONFIRMED, only while the hold is unexpired. Retrying on an
    /// already-confirmed reservation reports `AlreadyConfirmed` and changes
    /// nothing.
    pub async fn confirm(&self, id: Ulid) -> Result<Reservation, EngineError> {
        let mut schedule = self.schedule.write().await;
        let now = now_ms();

        let (status, live) = {
            let r = schedule.get(&id).ok_or(EngineError::NotFound(id))?;
            (r.status, r.is_live(now))
        };
        match status {
            ReservationStatus::Confirmed => return Err(EngineError::AlreadyConfirmed),
            ReservationStatus::Cancelled => {
                return Err(EngineError::InvalidState { from: status });
            }
            ReservationStatus::Hold if !live => return Err(EngineError::HoldExpired),
            ReservationStatus::Hold => {}
        }

        let event = Event::ReservationConfirmed { id, at: now };
        self.persist_and_apply(&mut schedule, &event).await?;
        metrics::counter!(crate::observability::BOOKINGS_CONFIRMED_TOTAL).increment(1);
        Ok(schedule.get(&id).cloned().expect("reservation just confirmed"))
    }

    /// CONFIRMED → CANCELLED (admin action, terminal). Records a mock refund
    /// as pending for the full original amount and frees the slot.
    pub async fn cancel(&self, id: Ulid, reason: Option<String>) -> Result<Reservation, EngineError> {
        if reason.as_ref().is_some_and(|r| r.len() > MAX_REASON_LEN) {
            return Err(EngineError::LimitExceeded("cancel reason too long"));
        }

        let mut schedule = self.schedule.write().await;
        let now = now_ms();

        let (status, total_cents) = {
            let r = schedule.get(&id).ok_or(EngineError::NotFound(id))?;
            (r.status, r.total_cents)
        };
        if status != ReservationStatus::Confirmed {
            return Err(EngineError::InvalidState { from: status });
        }

        let event = Event::ReservationCancelled {
            id,
            reason,
            refund_cents: total_cents,
            at: now,
        };
        self.persist_and_apply(&mut schedule, &event).await?;
        metrics::counter!(crate::observability::BOOKINGS_CANCELLED_TOTAL).increment(1);
        Ok(schedule.get(&id).cloned().expect("reservation just cancelled"))
    }

    /// Holds whose expiry is older than `cutoff`. Skips the scan entirely if
    /// the schedule is write-locked right now — the sweeper tries again on
    /// its next tick.
    pub fn collect_sweepable_holds(&self, cutoff: Ms) -> Vec<Ulid> {
        let Ok(schedule) = self.schedule.try_read() else {
            return Vec::new();
        };
        schedule
            .iter()
            .filter(|r| {
                r.status == ReservationStatus::Hold
                    && r.hold_expires_at.is_some_and(|exp| exp <= cutoff)
            })
            .map(|r| r.id)
            .collect()
    }

    /// Physically remove a hold if it is still expired past `cutoff` at write
    /// time. Storage hygiene only: an expired hold already stopped blocking
    /// availability the moment it expired.
    pub async fn sweep_hold(&self, id: Ulid, cutoff: Ms) -> Result<bool, EngineError> {
        let mut schedule = self.schedule.write().await;
        let sweepable = schedule.get(&id).is_some_and(|r| {
            r.status == ReservationStatus::Hold
                && r.hold_expires_at.is_some_and(|exp| exp <= cutoff)
        });
        if !sweepable {
            return Ok(false);
        }

        let event = Event::HoldSwept { id };
        self.persist_and_apply(&mut schedule, &event).await?;
        metrics::counter!(crate::observability::HOLDS_SWEPT_TOTAL).increment(1);
        Ok(true)
    }

    /// Rewrite the WAL with one snapshot event per surviving reservation.
    pub async fn compact_wal(&self) -> Result<(), EngineError> {
        let events: Vec<Event> = {
            let schedule = self.schedule.read().await;
            schedule
                .iter()
                .map(|r| Event::ReservationRecorded {
                    reservation: r.clone(),
                })
                .collect()
        };

        let (tx, rx) = oneshot::channel();
        self.wal_tx
            .send(WalCommand::Compact {
                events,
                response: tx,
            })
            .await
            .map_err(|_| EngineError::WalError("WAL writer shut down".into()))?;
        rx.await
            .map_err(|_| EngineError::WalError("WAL writer dropped response".into()))?
            .map_err(|e| EngineError::WalError(e.to_string()))
    }

    pub async fn wal_appends_since_compact(&self) -> u64 {
        let (tx, rx) = oneshot::channel();
        if self
            .wal_tx
            .send(WalCommand::AppendsSinceCompact { response: tx })
            .await
            .is_err()
        {
            return 0;
        }
        rx.await.unwrap_or(0)
    }
}
