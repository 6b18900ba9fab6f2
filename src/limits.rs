use crate::model::Ms;

/// Engine-wide bounds. These protect the in-memory schedule and the WAL from
/// absurd inputs; the real business rules live in the catalog and pricing
/// configuration.
pub const MAX_QUERY_DAYS: i64 = 366;

pub const MAX_RESERVATIONS: usize = 100_000;

pub const MAX_NAME_LEN: usize = 200;
pub const MAX_NOTES_LEN: usize = 2_000;
pub const MAX_REASON_LEN: usize = 500;

pub const MIN_VALID_TIMESTAMP_MS: Ms = 0;
/// 2100-01-01T00:00:00Z.
pub const MAX_VALID_TIMESTAMP_MS: Ms = 4_102_444_800_000;

/// No sellable window is longer than a day.
pub const MAX_SPAN_DURATION_MS: Ms = 24 * 3_600_000;
