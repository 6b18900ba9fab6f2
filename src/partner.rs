use async_trait::async_trait;

use crate::model::TimeRange;

/// The partner feed is advisory: callers must degrade an error to "no busy
/// ranges" rather than fail the booking flow (see `Engine::partner_busy`).
#[derive(Debug)]
pub struct PartnerFeedError(pub String);

impl std::fmt::Display for PartnerFeedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "partner feed unavailable: {}", self.0)
    }
}

impl std::error::Error for PartnerFeedError {}

/// External source of additional busy time for the vessel — the shuttle
/// partner's schedule. One method, so the engine stays fully testable
/// without any network.
#[async_trait]
pub trait BusyCalendar: Send + Sync {
    async fn busy_ranges(&self, window: &TimeRange) -> Result<Vec<TimeRange>, PartnerFeedError>;
}

/// Always-available null feed: no partner, no busy time.
pub struct NoPartnerFeed;

#[async_trait]
impl BusyCalendar for NoPartnerFeed {
    async fn busy_ranges(&self, _window: &TimeRange) -> Result<Vec<TimeRange>, PartnerFeedError> {
        Ok(Vec::new())
    }
}

/// A fixed set of busy ranges. Serves operator-entered blackout windows and
/// the test suite.
pub struct FixedBusyFeed {
    ranges: Vec<TimeRange>,
}

impl FixedBusyFeed {
    pub fn new(ranges: Vec<TimeRange>) -> Self {
        Self { ranges }
    }
}

#[async_trait]
impl BusyCalendar for FixedBusyFeed {
    async fn busy_ranges(&self, window: &TimeRange) -> Result<Vec<TimeRange>, PartnerFeedError> {
        Ok(self
            .ranges
            .iter()
            .filter(|r| r.overlaps(window))
            .copied()
            .collect())
    }
}
