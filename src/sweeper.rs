use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::engine::Engine;

fn now_ms() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("system clock before unix epoch")
        .as_millis() as i64
}

/// Background task that physically removes long-expired holds.
///
/// Hygiene only: availability and confirm re-check expiry on every read, so
/// correctness never depends on this loop running. Holds are kept for the
/// configured retention after expiry so a late confirm attempt still gets
/// the "hold expired" answer instead of "not found".
pub async fn run_sweeper(engine: Arc<Engine>) {
    let interval_ms = engine.config().sweep_interval_ms.max(1_000) as u64;
    let retention_ms = engine.config().hold_retention_ms;
    let mut interval = tokio::time::interval(Duration::from_millis(interval_ms));
    loop {
        interval.tick().await;
        let cutoff = now_ms() - retention_ms;
        for id in engine.collect_sweepable_holds(cutoff) {
            match engine.sweep_hold(id, cutoff).await {
                Ok(true) => info!("swept expired hold {id}"),
                Ok(false) => {} // confirmed or already swept meanwhile
                Err(e) => tracing::debug!("sweep skip {id}: {e}"),
            }
        }
    }
}

/// Background task that compacts the WAL once enough appends accumulate.
pub async fn run_compactor(engine: Arc<Engine>, threshold: u64) {
    if threshold == 0 {
        return; // compaction disabled
    }
    let mut interval = tokio::time::interval(Duration::from_secs(60));
    loop {
        interval.tick().await;
        let appends = engine.wal_appends_since_compact().await;
        if appends >= threshold {
            match engine.compact_wal().await {
                Ok(()) => info!("compacted WAL after {appends} appends"),
                Err(e) => tracing::warn!("WAL compaction failed: {e}"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::engine::HoldRequest;
    use crate::model::{CustomerDetails, ProductId, QuoteOptions, SlotId};
    use crate::partner::NoPartnerFeed;
    use chrono::NaiveDate;
    use std::path::PathBuf;

    fn test_wal_path(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join("slipway_test_sweeper");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        let _ = std::fs::remove_file(&path);
        path
    }

    fn hold_request() -> HoldRequest {
        HoldRequest {
            product: ProductId::new("day"),
            slot: SlotId::new("DAY"),
            date: NaiveDate::from_ymd_opt(2030, 6, 10).unwrap(),
            guests: 4,
            options: QuoteOptions::default(),
            customer: CustomerDetails {
                name: "Test Guest".into(),
                email: "guest@example.com".into(),
                phone: None,
            },
            notes: None,
        }
    }

    #[tokio::test]
    async fn sweeper_collects_only_expired_holds() {
        let path = test_wal_path("collect.wal");
        let config = EngineConfig {
            hold_duration_ms: 1,
            hold_retention_ms: 0,
            ..EngineConfig::default()
        };
        let engine = Arc::new(Engine::new(path, config, Arc::new(NoPartnerFeed)).unwrap());

        let hold = engine.create_hold(hold_request()).await.unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;

        let expired = engine.collect_sweepable_holds(now_ms());
        assert_eq!(expired, vec![hold.id]);

        assert!(engine.sweep_hold(hold.id, now_ms()).await.unwrap());
        assert!(engine.collect_sweepable_holds(now_ms()).is_empty());
        // Second sweep of the same id is a no-op.
        assert!(!engine.sweep_hold(hold.id, now_ms()).await.unwrap());
    }

    #[tokio::test]
    async fn retention_keeps_freshly_expired_holds() {
        let path = test_wal_path("retention.wal");
        let config = EngineConfig {
            hold_duration_ms: 1,
            hold_retention_ms: 3_600_000,
            ..EngineConfig::default()
        };
        let engine = Arc::new(Engine::new(path, config, Arc::new(NoPartnerFeed)).unwrap());

        engine.create_hold(hold_request()).await.unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;

        // Expired, but inside the retention window — not sweepable yet.
        let cutoff = now_ms() - engine.config().hold_retention_ms;
        assert!(engine.collect_sweepable_holds(cutoff).is_empty());
    }
}
