mod availability;
mod conflict;
mod error;
mod mutations;
mod queries;
mod quote;

pub use availability::{day_availability, merge_overlapping};
pub use error::EngineError;
pub use mutations::HoldRequest;
pub use quote::compute_quote;

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::{RwLock, mpsc, oneshot};

use crate::config::EngineConfig;
use crate::model::{Event, ReservationStatus, Schedule, TimeRange};
use crate::partner::BusyCalendar;
use crate::wal::Wal;

// ── Group-commit WAL channel ─────────────────────────────

pub(super) enum WalCommand {
    Append {
        event: Event,
        response: oneshot::Sender<io::Result<()>>,
    },
    Compact {
        events: Vec<Event>,
        response: oneshot::Sender<io::Result<()>>,
    },
    AppendsSinceCompact {
        response: oneshot::Sender<u64>,
    },
}

/// Background task that owns the WAL and batches appends for group commit.
/// 1. Block until the first Append arrives.
/// 2. Buffer it (no fsync).
/// 3. Drain all immediately available Appends (the batch window).
/// 4. Single flush_sync for the whole batch.
/// 5. Respond to all senders.
async fn wal_writer_loop(mut wal: Wal, mut rx: mpsc::Receiver<WalCommand>) {
    while let Some(cmd) = rx.recv().await {
        match cmd {
            WalCommand::Append { event, response } => {
                let mut batch = vec![(event, response)];

                // Drain all immediately available appends
                loop {
                    match rx.try_recv() {
                        Ok(WalCommand::Append { event, response }) => {
                            batch.push((event, response));
                        }
                        Ok(other) => {
                            // Flush the batch first, then handle the non-append command
                            flush_and_respond(&mut wal, &mut batch);
                            handle_non_append(&mut wal, other);
                            break;
                        }
                        Err(_) => break, // channel empty — flush batch
                    }
                }

                if !batch.is_empty() {
                    flush_and_respond(&mut wal, &mut batch);
                }
            }
            other => handle_non_append(&mut wal, other),
        }
    }
}

fn flush_and_respond(wal: &mut Wal, batch: &mut Vec<(Event, oneshot::Sender<io::Result<()>>)>) {
    metrics::histogram!(crate::observability::WAL_FLUSH_BATCH_SIZE).record(batch.len() as f64);
    let flush_start = std::time::Instant::now();

    let mut append_err: Option<io::Error> = None;
    for (event, _) in batch.iter() {
        if let Err(e) = wal.append_buffered(event) {
            append_err = Some(e);
            break;
        }
    }
    // Always flush — even on append error — so partially buffered bytes
    // don't leak into the next batch (callers were told this batch failed).
    let flush_err = wal.flush_sync().err();
    let result: io::Result<()> = match (append_err, flush_err) {
        (Some(e), _) | (None, Some(e)) => Err(e),
        (None, None) => Ok(()),
    };

    metrics::histogram!(crate::observability::WAL_FLUSH_DURATION_SECONDS)
        .record(flush_start.elapsed().as_secs_f64());

    for (_, tx) in batch.drain(..) {
        let r = match &result {
            Ok(()) => Ok(()),
            Err(e) => Err(io::Error::new(e.kind(), e.to_string())),
        };
        let _ = tx.send(r);
    }
}

fn handle_non_append(wal: &mut Wal, cmd: WalCommand) {
    match cmd {
        WalCommand::Compact { events, response } => {
            let result = Wal::write_compact_file(wal.path(), &events)
                .and_then(|()| wal.swap_compact_file());
            let _ = response.send(result);
        }
        WalCommand::AppendsSinceCompact { response } => {
            let _ = response.send(wal.appends_since_compact());
        }
        WalCommand::Append { .. } => unreachable!(),
    }
}

/// The booking engine: the single vessel's schedule behind one RwLock, the
/// injected configuration, the partner busy-calendar seam, and the WAL
/// writer channel. All mutations run under the write guard, which makes the
/// conflict check and the insert atomic with respect to concurrent callers.
pub struct Engine {
    schedule: RwLock<Schedule>,
    config: EngineConfig,
    partner: Arc<dyn BusyCalendar>,
    wal_tx: mpsc::Sender<WalCommand>,
}

/// Apply an event directly to the schedule (no locking — caller holds the lock).
fn apply_to_schedule(schedule: &mut Schedule, event: &Event) {
    match event {
        Event::ReservationRecorded { reservation } => {
            schedule.insert(reservation.clone());
        }
        Event::ReservationConfirmed { id, at } => {
            if let Some(r) = schedule.get_mut(id) {
                r.status = ReservationStatus::Confirmed;
                r.hold_expires_at = None;
                r.updated_at = *at;
            }
        }
        Event::ReservationCancelled {
            id,
            reason,
            refund_cents,
            at,
        } => {
            if let Some(r) = schedule.get_mut(id) {
                r.status = ReservationStatus::Cancelled;
                r.hold_expires_at = None;
                r.cancelled_at = Some(*at);
                r.cancel_reason = reason.clone();
                r.refund_pending_cents = Some(*refund_cents);
                r.updated_at = *at;
            }
        }
        Event::HoldSwept { id } => {
            schedule.remove(id);
        }
    }
}

impl Engine {
    /// Replay the WAL and start the group-commit writer. The rebuilt schedule
    /// is exactly the state at the last durable event.
    pub fn new(
        wal_path: PathBuf,
        config: EngineConfig,
        partner: Arc<dyn BusyCalendar>,
    ) -> io::Result<Self> {
        let events = Wal::replay(&wal_path)?;
        let wal = Wal::open(&wal_path)?;
        let (wal_tx, wal_rx) = mpsc::channel(4096);
        tokio::spawn(wal_writer_loop(wal, wal_rx));

        let mut schedule = Schedule::new();
        for event in &events {
            apply_to_schedule(&mut schedule, event);
        }

        Ok(Self {
            schedule: RwLock::new(schedule),
            config,
            partner,
            wal_tx,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Write an event to the WAL via the background group-commit writer.
    async fn wal_append(&self, event: &Event) -> Result<(), EngineError> {
        let (tx, rx) = oneshot::channel();
        self.wal_tx
            .send(WalCommand::Append {
                event: event.clone(),
                response: tx,
            })
            .await
            .map_err(|_| EngineError::WalError("WAL writer shut down".into()))?;
        rx.await
            .map_err(|_| EngineError::WalError("WAL writer dropped response".into()))?
            .map_err(|e| EngineError::WalError(e.to_string()))
    }

    /// WAL-append + apply in one call: the schedule only ever reflects
    /// durable events.
    pub(super) async fn persist_and_apply(
        &self,
        schedule: &mut Schedule,
        event: &Event,
    ) -> Result<(), EngineError> {
        self.wal_append(event).await?;
        apply_to_schedule(schedule, event);
        Ok(())
    }

    /// Partner busy ranges for a window, degraded gracefully: an outage
    /// contributes an empty set and never fails the booking flow.
    pub(super) async fn partner_busy(&self, window: &TimeRange) -> Vec<TimeRange> {
        match self.partner.busy_ranges(window).await {
            Ok(ranges) => ranges,
            Err(e) => {
                tracing::warn!("partner feed degraded to empty busy set: {e}");
                metrics::counter!(crate::observability::PARTNER_FEED_FAILURES_TOTAL).increment(1);
                Vec::new()
            }
        }
    }
}
