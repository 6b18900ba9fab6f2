use chrono::NaiveDate;
use ulid::Ulid;

use crate::limits::*;
use crate::model::{DayAvailability, ProductId, Reservation, SlotId, TimeRange};

use super::availability::{day_availability, merge_overlapping};
use super::conflict::now_ms;
use super::{Engine, EngineError};

impl Engine {
    /// Per-day availability over an inclusive date range, optionally narrowed
    /// to one product's slots.
    ///
    /// Pure read: no writes, safe to call unboundedly often. Results reflect
    /// the reservations visible at the instant of the schedule read; holds
    /// re-validate at confirmation time, so no stronger isolation is needed.
    pub async fn get_availability(
        &self,
        product: Option<&ProductId>,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<DayAvailability>, EngineError> {
        if from > to {
            return Err(EngineError::Validation(
                "from must be on or before to".into(),
            ));
        }
        let days = (to - from).num_days() + 1;
        if days > MAX_QUERY_DAYS {
            return Err(EngineError::LimitExceeded("date range too wide"));
        }

        let catalog = &self.config.catalog;
        let candidates: Vec<SlotId> = match product {
            Some(id) => {
                let product = catalog
                    .product(id)
                    .ok_or_else(|| EngineError::UnknownProduct(id.clone()))?;
                product.slots.clone()
            }
            None => catalog.all_slot_ids(),
        };

        let window = catalog.range_window(from, to);
        if window.start < MIN_VALID_TIMESTAMP_MS || window.end > MAX_VALID_TIMESTAMP_MS {
            return Err(EngineError::LimitExceeded("date out of range"));
        }

        let partner_busy = self.partner_busy(&window).await;

        let now = now_ms();
        let mut busy: Vec<TimeRange> = {
            let schedule = self.schedule.read().await;
            schedule
                .overlapping(&window)
                .filter(|r| r.is_live(now))
                .map(|r| r.span)
                .collect()
        };
        busy.extend(partner_busy);
        busy.sort_by_key(|s| s.start);
        let busy = merge_overlapping(&busy);

        Ok(from
            .iter_days()
            .take(days as usize)
            .map(|date| day_availability(catalog, &candidates, date, &busy))
            .collect())
    }

    pub async fn get_reservation(&self, id: &Ulid) -> Result<Reservation, EngineError> {
        let schedule = self.schedule.read().await;
        schedule.get(id).cloned().ok_or(EngineError::NotFound(*id))
    }

    /// All reservations, newest first (the admin bookings view).
    pub async fn list_reservations(&self) -> Vec<Reservation> {
        let schedule = self.schedule.read().await;
        let mut all: Vec<Reservation> = schedule.iter().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        all
    }
}
