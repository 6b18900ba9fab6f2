use chrono::{FixedOffset, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::model::{Ms, ProductId, SlotId, TimeRange};

const DAY_MS: Ms = 24 * 3_600_000;
const MINUTE_MS: Ms = 60_000;

/// A sellable time-of-day window. Wall-clock minutes are interpreted in the
/// vessel's reference timezone; slots do not cross midnight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotDef {
    pub id: SlotId,
    pub label: String,
    /// Minutes since midnight, reference timezone.
    pub start_minute: u32,
    pub end_minute: u32,
}

/// A charter product and the ordered set of slots it is allowed to sell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub label: String,
    pub slots: Vec<SlotId>,
    /// Guests covered by the base price.
    pub included_guests: u32,
    pub max_guests: u32,
}

/// Static slot/product catalog plus the vessel's fixed reference offset.
/// Loaded from configuration once; never mutated at runtime.
///
/// All day-bucketing and wall-clock resolution happens in the reference
/// offset, so a booking can never shift to a neighbouring calendar day
/// because of the server's or the client's timezone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    pub slots: Vec<SlotDef>,
    pub products: Vec<Product>,
    /// Minutes east of UTC, e.g. -240 for the vessel's home waters (UTC-04:00).
    pub utc_offset_minutes: i32,
}

impl Catalog {
    pub fn slot(&self, id: &SlotId) -> Option<&SlotDef> {
        self.slots.iter().find(|s| s.id == *id)
    }

    pub fn product(&self, id: &ProductId) -> Option<&Product> {
        self.products.iter().find(|p| p.id == *id)
    }

    pub fn all_slot_ids(&self) -> Vec<SlotId> {
        self.slots.iter().map(|s| s.id.clone()).collect()
    }

    fn offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_minutes * 60)
            .expect("offset validated at construction")
    }

    /// Midnight of `date` in the reference timezone, as unix milliseconds.
    pub fn day_start_ms(&self, date: NaiveDate) -> Ms {
        date.and_time(NaiveTime::MIN)
            .and_local_timezone(self.offset())
            .single()
            .expect("fixed offsets are unambiguous")
            .timestamp_millis()
    }

    /// Resolve a slot on a given calendar day to a concrete time range.
    pub fn resolve(&self, date: NaiveDate, def: &SlotDef) -> TimeRange {
        let base = self.day_start_ms(date);
        TimeRange::new(
            base + def.start_minute as Ms * MINUTE_MS,
            base + def.end_minute as Ms * MINUTE_MS,
        )
    }

    /// `[from 00:00, to+1day 00:00)` in the reference timezone. Fixed offsets
    /// have no DST, so every day is exactly 24 h long.
    pub fn range_window(&self, from: NaiveDate, to: NaiveDate) -> TimeRange {
        TimeRange::new(self.day_start_ms(from), self.day_start_ms(to) + DAY_MS)
    }

    /// Structural checks, run once when the configuration is assembled.
    pub fn validate(&self) -> Result<(), String> {
        if FixedOffset::east_opt(self.utc_offset_minutes * 60).is_none() {
            return Err(format!(
                "utc_offset_minutes {} out of range",
                self.utc_offset_minutes
            ));
        }
        if self.slots.is_empty() {
            return Err("catalog has no slots".into());
        }
        for (i, slot) in self.slots.iter().enumerate() {
            if slot.start_minute >= slot.end_minute {
                return Err(format!("slot {} has start >= end", slot.id));
            }
            if slot.end_minute > 24 * 60 {
                return Err(format!("slot {} ends past midnight", slot.id));
            }
            if self.slots[..i].iter().any(|s| s.id == slot.id) {
                return Err(format!("duplicate slot id {}", slot.id));
            }
        }
        for (i, product) in self.products.iter().enumerate() {
            if self.products[..i].iter().any(|p| p.id == product.id) {
                return Err(format!("duplicate product id {}", product.id));
            }
            if product.slots.is_empty() {
                return Err(format!("product {} sells no slots", product.id));
            }
            for slot in &product.slots {
                if self.slot(slot).is_none() {
                    return Err(format!(
                        "product {} references unknown slot {}",
                        product.id, slot
                    ));
                }
            }
            if product.max_guests == 0 || product.included_guests > product.max_guests {
                return Err(format!("product {} has bad guest bounds", product.id));
            }
        }
        Ok(())
    }
}

fn hm(hours: u32, minutes: u32) -> u32 {
    hours * 60 + minutes
}

/// The production timetable: one vessel, four windows, three charter products.
impl Default for Catalog {
    fn default() -> Self {
        let slot = |code: &str, label: &str, start: u32, end: u32| SlotDef {
            id: SlotId::new(code),
            label: label.into(),
            start_minute: start,
            end_minute: end,
        };
        let product = |slug: &str, label: &str, slots: &[&str]| Product {
            id: ProductId::new(slug),
            label: label.into(),
            slots: slots.iter().map(|s| SlotId::new(*s)).collect(),
            included_guests: 6,
            max_guests: 8,
        };
        Self {
            slots: vec![
                slot("DAY", "Day Charter", hm(10, 0), hm(17, 0)),
                slot("HALF_AM", "Half Day (AM)", hm(10, 0), hm(13, 0)),
                slot("HALF_PM", "Half Day (PM)", hm(14, 0), hm(17, 0)),
                slot("SUNSET", "Sunset Cruise", hm(16, 30), hm(18, 30)),
            ],
            products: vec![
                product("day", "Day Charter", &["DAY"]),
                product("half-day", "Half Day Charter", &["HALF_AM", "HALF_PM"]),
                product("sunset", "Sunset Cruise", &["SUNSET"]),
            ],
            utc_offset_minutes: -240,
        }
    }
}
