use crate::catalog::Category;
use crate::extract::{Match, dedupe_matches};
use crate::state::IdGen;
use serde::{Deserialize, Serialize};

/// One quantity-bearing entry in the working offer.
///
/// Identity for merge purposes is the (requestId, productId) pair: document
/// extraction maintains at most one line per pair. Manual form submissions
/// are exempt; each one creates a new line.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DemandLine {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub category: Category,
    pub product_id: String,
    pub product_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_code: Option<String>,
    pub unit: String,
    pub unit_price: f64,
    pub quantity: u32,
}

/// Quantities are positive integers; anything non-finite or ≤ 0 resets
/// to 1, anything beyond the integer range clamps to the ceiling.
pub fn sanitise_quantity(value: f64) -> u32 {
    if !value.is_finite() || value <= 0.0 {
        return 1;
    }
    value.round().clamp(1.0, u32::MAX as f64) as u32
}

#[derive(Debug, Default)]
pub struct ApplyOutcome {
    pub added: usize,
    pub updated: usize,
    pub total: usize,
    /// The deduplicated match list, used by the caller for the request
    /// document's extracted-product snapshot.
    pub matches: Vec<Match>,
}

/// Merge extraction matches into the demand list.
///
/// Existing (request, product) lines get their display fields refreshed
/// from the current catalog item and their quantity raised (never
/// lowered), counting as updated only when it actually increased. New
/// products get a fresh line.
pub fn apply_matches(
    demand: &mut Vec<DemandLine>,
    ids: &mut IdGen,
    request_id: Option<&str>,
    matches: Vec<Match>,
) -> ApplyOutcome {
    let total = matches.len();
    let normalised = dedupe_matches(matches);
    let mut added = 0;
    let mut updated = 0;

    for m in &normalised {
        if let Some(existing) = demand
            .iter_mut()
            .find(|line| line.request_id.as_deref() == request_id && line.product_id == m.item.id)
        {
            existing.product_name = m.item.name.clone();
            existing.product_code = m.item.code.clone();
            existing.unit = m.item.unit.clone();
            existing.unit_price = m.item.unit_price;
            if m.quantity > existing.quantity {
                existing.quantity = m.quantity;
                updated += 1;
            }
            continue;
        }
        demand.push(DemandLine {
            id: ids.next("demand"),
            request_id: request_id.map(str::to_string),
            category: m.item.category,
            product_id: m.item.id.clone(),
            product_name: m.item.name.clone(),
            product_code: m.item.code.clone(),
            unit: m.item.unit.clone(),
            unit_price: m.item.unit_price,
            quantity: m.quantity,
        });
        added += 1;
    }

    ApplyOutcome {
        added,
        updated,
        total,
        matches: normalised,
    }
}
