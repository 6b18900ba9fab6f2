use ulid::Ulid;

use crate::model::{ProductId, ReservationStatus, SlotId};

#[derive(Debug)]
pub enum EngineError {
    /// Bad caller input: date range, guest count, option/slot combination.
    Validation(String),
    UnknownProduct(ProductId),
    UnknownSlot(SlotId),
    NotFound(Ulid),
    /// The requested range overlaps a live reservation.
    Conflict(Ulid),
    /// The requested range overlaps a partner busy window.
    PartnerBusy,
    /// Transition attempted from a state that does not permit it.
    InvalidState { from: ReservationStatus },
    /// Confirm attempted after the hold's expiry.
    HoldExpired,
    /// Confirm retried on an already-confirmed reservation. Callers may treat
    /// this as a no-op success; the engine never double-transitions.
    AlreadyConfirmed,
    LimitExceeded(&'static str),
    WalError(String),
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::Validation(msg) => write!(f, "invalid request: {msg}"),
            EngineError::UnknownProduct(id) => write!(f, "unknown charter product: {id}"),
            EngineError::UnknownSlot(id) => write!(f, "unknown slot: {id}"),
            EngineError::NotFound(id) => write!(f, "reservation not found: {id}"),
            EngineError::Conflict(id) => {
                write!(f, "slot no longer available (taken by reservation {id})")
            }
            EngineError::PartnerBusy => {
                write!(f, "slot no longer available (partner calendar)")
            }
            EngineError::InvalidState { from } => {
                write!(f, "operation not permitted from status {from}")
            }
            EngineError::HoldExpired => write!(f, "hold has expired"),
            EngineError::AlreadyConfirmed => write!(f, "reservation is already confirmed"),
            EngineError::LimitExceeded(msg) => write!(f, "limit exceeded: {msg}"),
            EngineError::WalError(e) => write!(f, "WAL error: {e}"),
        }
    }
}

impl std::error::Error for EngineError {}
