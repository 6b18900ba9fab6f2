//! Booking and availability engine for a single charter vessel.
//!
//! Reservation state lives in memory behind one RwLock and is made durable
//! through an append-only WAL; availability is derived purely from interval
//! overlap against the slot catalog, and hold expiry is a read-time fact.

pub mod catalog;
pub mod config;
pub mod engine;
pub mod http;
pub mod limits;
pub mod model;
pub mod observability;
pub mod partner;
pub mod sweeper;
pub mod wal;
