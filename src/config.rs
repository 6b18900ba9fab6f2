use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::model::{Ms, SlotId};

/// A flat add-on surcharge, legal only on the configured slots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionPricing {
    pub label: String,
    pub amount_cents: i64,
    pub allowed_slots: Vec<SlotId>,
}

/// Per-head catering. The vegan sub-count is validated against the guest
/// count but never changes the price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CateringPricing {
    pub label: String,
    pub per_head_cents: i64,
    pub allowed_slots: Vec<SlotId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingTable {
    pub currency: String,
    /// Base price per slot, minor units.
    pub base_cents: HashMap<SlotId, i64>,
    /// Charged per guest above a product's included count, up to its cap.
    pub extra_guest_cents: i64,
    pub excursion: OptionPricing,
    pub catering: CateringPricing,
}

impl PricingTable {
    pub fn validate(&self, catalog: &Catalog) -> Result<(), String> {
        for slot in &catalog.slots {
            if !self.base_cents.contains_key(&slot.id) {
                return Err(format!("no base price for slot {}", slot.id));
            }
        }
        if self.base_cents.values().any(|c| *c <= 0) {
            return Err("base prices must be positive".into());
        }
        if self.extra_guest_cents < 0
            || self.excursion.amount_cents < 0
            || self.catering.per_head_cents < 0
        {
            return Err("surcharges must be non-negative".into());
        }
        for id in self
            .excursion
            .allowed_slots
            .iter()
            .chain(&self.catering.allowed_slots)
        {
            if catalog.slot(id).is_none() {
                return Err(format!("pricing references unknown slot {id}"));
            }
        }
        Ok(())
    }
}

impl Default for PricingTable {
    fn default() -> Self {
        Self {
            currency: "USD".into(),
            base_cents: HashMap::from([
                (SlotId::new("DAY"), 220_000),
                (SlotId::new("HALF_AM"), 140_000),
                (SlotId::new("HALF_PM"), 140_000),
                (SlotId::new("SUNSET"), 80_000),
            ]),
            extra_guest_cents: 10_000,
            excursion: OptionPricing {
                label: "Restaurant excursion fuel surcharge".into(),
                amount_cents: 25_000,
                allowed_slots: vec![SlotId::new("DAY")],
            },
            catering: CateringPricing {
                label: "Onboard catering".into(),
                per_head_cents: 9_500,
                allowed_slots: vec![SlotId::new("DAY")],
            },
        }
    }
}

/// Everything the engine needs, injected once at construction. The algorithms
/// never read ambient state.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub hold_duration_ms: Ms,
    /// How long an expired hold is kept before the sweeper may remove it.
    /// While retained it still reports `HoldExpired` on confirm attempts.
    pub hold_retention_ms: Ms,
    pub sweep_interval_ms: Ms,
    pub compact_threshold: u64,
    pub catalog: Catalog,
    pub pricing: PricingTable,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            hold_duration_ms: 15 * 60_000,
            hold_retention_ms: 60 * 60_000,
            sweep_interval_ms: 60_000,
            compact_threshold: 1_000,
            catalog: Catalog::default(),
            pricing: PricingTable::default(),
        }
    }
}

/// Optional JSON file overrides for the static tables.
#[derive(Debug, Deserialize)]
struct FileOverrides {
    catalog: Option<Catalog>,
    pricing: Option<PricingTable>,
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|s| s.parse().ok())
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.hold_duration_ms <= 0 {
            return Err("hold duration must be positive".into());
        }
        if self.hold_retention_ms < 0 {
            return Err("hold retention must be non-negative".into());
        }
        self.catalog.validate()?;
        self.pricing.validate(&self.catalog)
    }

    pub fn apply_overrides_json(&mut self, json: &str) -> Result<(), String> {
        let overrides: FileOverrides =
            serde_json::from_str(json).map_err(|e| format!("bad config file: {e}"))?;
        if let Some(catalog) = overrides.catalog {
            self.catalog = catalog;
        }
        if let Some(pricing) = overrides.pricing {
            self.pricing = pricing;
        }
        Ok(())
    }

    /// Defaults, then the optional `SLIPWAY_CONFIG_FILE` JSON, then scalar
    /// env overrides. Malformed env values fall back to defaults, matching
    /// the rest of the env surface parsed in `main`.
    pub fn from_env() -> Result<Self, String> {
        let mut config = Self::default();

        if let Ok(path) = std::env::var("SLIPWAY_CONFIG_FILE") {
            let json = std::fs::read_to_string(Path::new(&path))
                .map_err(|e| format!("cannot read {path}: {e}"))?;
            config.apply_overrides_json(&json)?;
        }

        if let Some(minutes) = env_parse::<i64>("SLIPWAY_HOLD_MINUTES") {
            config.hold_duration_ms = minutes * 60_000;
        }
        if let Some(minutes) = env_parse::<i64>("SLIPWAY_HOLD_RETENTION_MINUTES") {
            config.hold_retention_ms = minutes * 60_000;
        }
        if let Some(seconds) = env_parse::<i64>("SLIPWAY_SWEEP_SECONDS") {
            config.sweep_interval_ms = seconds * 1_000;
        }
        if let Some(threshold) = env_parse::<u64>("SLIPWAY_COMPACT_THRESHOLD") {
            config.compact_threshold = threshold;
        }
        if let Some(offset) = env_parse::<i32>("SLIPWAY_UTC_OFFSET_MINUTES") {
            config.catalog.utc_offset_minutes = offset;
        }

        config.validate()?;
        Ok(config)
    }
}
