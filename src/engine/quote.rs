use crate::catalog::Catalog;
use crate::config::PricingTable;
use crate::model::{ProductId, Quote, QuoteLine, QuoteOptions, SlotId};

use super::{Engine, EngineError};

impl Engine {
    /// Price a selection without touching the schedule.
    pub fn quote(
        &self,
        product: &ProductId,
        slot: &SlotId,
        guests: u32,
        options: &QuoteOptions,
    ) -> Result<Quote, EngineError> {
        compute_quote(
            &self.config.pricing,
            &self.config.catalog,
            product,
            slot,
            guests,
            options,
        )
    }
}

// ── Quote Algorithm ───────────────────────────────────────────────

/// Deterministic priced breakdown for `(product, slot, guests, options)`.
///
/// Pure function of its inputs and the pricing configuration — the UI
/// re-quotes on every option change, so identical inputs must always produce
/// identical totals. Lines are appended in a fixed order: base, extra guests,
/// excursion, catering.
pub fn compute_quote(
    pricing: &PricingTable,
    catalog: &Catalog,
    product_id: &ProductId,
    slot_id: &SlotId,
    guests: u32,
    options: &QuoteOptions,
) -> Result<Quote, EngineError> {
    let product = catalog
        .product(product_id)
        .ok_or_else(|| EngineError::UnknownProduct(product_id.clone()))?;
    let slot = catalog
        .slot(slot_id)
        .ok_or_else(|| EngineError::UnknownSlot(slot_id.clone()))?;
    if !product.slots.contains(slot_id) {
        return Err(EngineError::Validation(format!(
            "slot {slot_id} is not offered by product {product_id}"
        )));
    }
    if guests < 1 || guests > product.max_guests {
        return Err(EngineError::Validation(format!(
            "guests must be 1-{}",
            product.max_guests
        )));
    }
    if options.excursion && !pricing.excursion.allowed_slots.contains(slot_id) {
        return Err(EngineError::Validation(format!(
            "{} is not available on slot {slot_id}",
            pricing.excursion.label
        )));
    }
    if options.catering && !pricing.catering.allowed_slots.contains(slot_id) {
        return Err(EngineError::Validation(format!(
            "{} is not available on slot {slot_id}",
            pricing.catering.label
        )));
    }
    if options.vegan_meals > 0 && !options.catering {
        return Err(EngineError::Validation(
            "vegan meal count requires catering".into(),
        ));
    }
    if options.vegan_meals > guests {
        return Err(EngineError::Validation(
            "vegan meal count exceeds guest count".into(),
        ));
    }

    let base = *pricing
        .base_cents
        .get(slot_id)
        .ok_or_else(|| EngineError::UnknownSlot(slot_id.clone()))?;
    let mut breakdown = vec![QuoteLine {
        label: slot.label.clone(),
        amount_cents: base,
    }];

    if guests > product.included_guests {
        let extra = guests.min(product.max_guests) - product.included_guests;
        let amount = extra as i64 * pricing.extra_guest_cents;
        if amount > 0 {
            breakdown.push(QuoteLine {
                label: format!(
                    "Extra guests ({extra} × ${})",
                    pricing.extra_guest_cents / 100
                ),
                amount_cents: amount,
            });
        }
    }

    if options.excursion && pricing.excursion.amount_cents > 0 {
        breakdown.push(QuoteLine {
            label: pricing.excursion.label.clone(),
            amount_cents: pricing.excursion.amount_cents,
        });
    }

    if options.catering && pricing.catering.per_head_cents > 0 {
        breakdown.push(QuoteLine {
            label: format!(
                "{} ({guests} × ${})",
                pricing.catering.label,
                pricing.catering.per_head_cents / 100
            ),
            amount_cents: guests as i64 * pricing.catering.per_head_cents,
        });
    }

    let total_cents = breakdown.iter().map(|l| l.amount_cents).sum();
    Ok(Quote {
        currency: pricing.currency.clone(),
        breakdown,
        total_cents,
    })
}
