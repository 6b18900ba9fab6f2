use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Unix milliseconds — the only time type used inside the engine.
pub type Ms = i64;

/// Half-open interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: Ms,
    pub end: Ms,
}

impl TimeRange {
    pub fn new(start: Ms, end: Ms) -> Self {
        debug_assert!(start < end, "TimeRange start must be before end");
        Self { start, end }
    }

    pub fn duration_ms(&self) -> Ms {
        self.end - self.start
    }

    /// Touching endpoints do not overlap.
    pub fn overlaps(&self, other: &TimeRange) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Catalog code for a sellable time-of-day window, e.g. `DAY` or `HALF_AM`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotId(String);

impl SlotId {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SlotId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Charter product slug, e.g. `day` or `half-day`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    pub fn new(slug: impl Into<String>) -> Self {
        Self(slug.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReservationStatus {
    Hold,
    Confirmed,
    Cancelled,
}

impl std::fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReservationStatus::Hold => f.write_str("HOLD"),
            ReservationStatus::Confirmed => f.write_str("CONFIRMED"),
            ReservationStatus::Cancelled => f.write_str("CANCELLED"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerDetails {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}

/// Add-on selection for a quote or a hold.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteOptions {
    #[serde(default)]
    pub excursion: bool,
    #[serde(default)]
    pub catering: bool,
    /// Sub-split of the catering head count; fulfillment note only, no price effect.
    #[serde(default)]
    pub vegan_meals: u32,
}

/// One booking of the vessel. Created as a HOLD, confirmed into a booking or
/// cancelled by an admin; confirmed and cancelled records are kept, never deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: Ulid,
    pub product: ProductId,
    pub slot: SlotId,
    pub date: NaiveDate,
    pub span: TimeRange,
    pub status: ReservationStatus,
    pub hold_expires_at: Option<Ms>,
    pub guests: u32,
    pub options: QuoteOptions,
    pub total_cents: i64,
    pub currency: String,
    pub customer: CustomerDetails,
    pub notes: Option<String>,
    pub created_at: Ms,
    pub updated_at: Ms,
    pub cancelled_at: Option<Ms>,
    pub cancel_reason: Option<String>,
    pub refund_pending_cents: Option<i64>,
}

impl Reservation {
    /// A live reservation blocks its time range: CONFIRMED, or HOLD whose
    /// expiry is still in the future. Expired holds stop blocking the moment
    /// they expire, whether or not they have been swept yet.
    pub fn is_live(&self, now: Ms) -> bool {
        match self.status {
            ReservationStatus::Confirmed => true,
            ReservationStatus::Hold => self.hold_expires_at.is_some_and(|exp| exp > now),
            ReservationStatus::Cancelled => false,
        }
    }
}

/// The single vessel's reservation book, sorted by `span.start`.
#[derive(Debug, Default)]
pub struct Schedule {
    reservations: Vec<Reservation>,
}

impl Schedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert maintaining sort order by span start.
    pub fn insert(&mut self, reservation: Reservation) {
        let pos = self
            .reservations
            .binary_search_by_key(&reservation.span.start, |r| r.span.start)
            .unwrap_or_else(|e| e);
        self.reservations.insert(pos, reservation);
    }

    pub fn get(&self, id: &Ulid) -> Option<&Reservation> {
        self.reservations.iter().find(|r| r.id == *id)
    }

    pub fn get_mut(&mut self, id: &Ulid) -> Option<&mut Reservation> {
        self.reservations.iter_mut().find(|r| r.id == *id)
    }

    pub fn remove(&mut self, id: &Ulid) -> Option<Reservation> {
        let pos = self.reservations.iter().position(|r| r.id == *id)?;
        Some(self.reservations.remove(pos))
    }

    /// Return only reservations whose span overlaps the query window.
    /// Uses binary search to skip reservations starting at or after `query.end`.
    pub fn overlapping(&self, query: &TimeRange) -> impl Iterator<Item = &Reservation> {
        let right_bound = self
            .reservations
            .partition_point(|r| r.span.start < query.end);
        self.reservations[..right_bound]
            .iter()
            .filter(move |r| r.span.end > query.start)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Reservation> {
        self.reservations.iter()
    }

    pub fn len(&self) -> usize {
        self.reservations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reservations.is_empty()
    }
}

/// WAL record format — one entry per state change.
///
/// `ReservationRecorded` carries the full record so that hold creation and
/// compaction snapshots replay through the same variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    ReservationRecorded {
        reservation: Reservation,
    },
    ReservationConfirmed {
        id: Ulid,
        at: Ms,
    },
    ReservationCancelled {
        id: Ulid,
        reason: Option<String>,
        refund_cents: i64,
        at: Ms,
    },
    HoldSwept {
        id: Ulid,
    },
}

// ── Query result types ───────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayAvailability {
    pub date: NaiveDate,
    pub blocked: Vec<SlotId>,
    pub available: Vec<SlotId>,
    pub sold_out: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteLine {
    pub label: String,
    pub amount_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub currency: String,
    pub breakdown: Vec<QuoteLine>,
    pub total_cents: i64,
}
