use crate::catalog::{Catalog, Category};
use crate::demand::DemandLine;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// Versioned key the full state snapshot is stored under.
pub const SNAPSHOT_KEY: &str = "teklif-state-v1";

/// Request files at or below this size keep their raw bytes as a preview
/// payload; anything larger stores metadata only.
pub const PREVIEW_CEILING: u64 = 2 * 1024 * 1024;

pub fn now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_default()
}

/// Generator for opaque stable identifiers ("item-af93c2…"). Hashes a
/// monotonic counter with the wall clock so ids stay unique across
/// snapshot reloads.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdGen {
    counter: u64,
}

impl IdGen {
    pub fn next(&mut self, prefix: &str) -> String {
        self.counter += 1;
        let mut hasher = Sha256::new();
        hasher.update(prefix.as_bytes());
        hasher.update(self.counter.to_le_bytes());
        hasher.update(
            OffsetDateTime::now_utc()
                .unix_timestamp_nanos()
                .to_le_bytes(),
        );
        let digest = hasher.finalize();
        let hex: String = digest.iter().take(8).map(|b| format!("{b:02x}")).collect();
        format!("{prefix}-{hex}")
    }
}

/// Point-in-time snapshot of one product extracted from a request
/// document. Does not auto-update; catalog maintenance propagates
/// renames explicitly.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedProduct {
    pub product_id: String,
    pub product_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_code: Option<String>,
    pub category: Category,
    pub quantity: u32,
}

/// One uploaded customer request document. Append-only: created on
/// upload, never auto-deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestDocument {
    pub id: String,
    pub name: String,
    pub size: u64,
    pub mime_type: String,
    pub uploaded_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_payload: Option<Vec<u8>>,
    #[serde(default)]
    pub extracted_products: Vec<ExtractedProduct>,
    #[serde(default)]
    pub extraction_note: String,
}

/// Upload metadata for one category's price list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceMeta {
    pub file_name: String,
    pub uploaded_at: String,
}

fn clamp_rate(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 100.0)
    } else {
        0.0
    }
}

/// Per-category discounts, the VAT rate and freeform notes. Rates are
/// always held clamped to [0, 100].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub discounts: BTreeMap<Category, f64>,
    pub vat_rate: f64,
    pub notes: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            discounts: Category::ALL.iter().map(|c| (*c, 0.0)).collect(),
            vat_rate: 20.0,
            notes: String::new(),
        }
    }
}

impl Settings {
    pub fn discount_for(&self, category: Category) -> f64 {
        self.discounts.get(&category).copied().unwrap_or(0.0)
    }

    pub fn set_discount(&mut self, category: Category, value: f64) {
        self.discounts.insert(category, clamp_rate(value));
    }

    pub fn set_vat_rate(&mut self, value: f64) {
        self.vat_rate = clamp_rate(value);
    }
}

/// The whole application state, persisted as one snapshot after every
/// mutation. Single owner, no locking: exactly one logical thread of
/// control mutates it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppState {
    pub catalog: Catalog,
    pub price_meta: BTreeMap<Category, PriceMeta>,
    pub requests: Vec<RequestDocument>,
    pub demand: Vec<DemandLine>,
    pub settings: Settings,
    pub ids: IdGen,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique_and_prefixed() {
        let mut ids = IdGen::default();
        let a = ids.next("item");
        let b = ids.next("item");
        assert!(a.starts_with("item-"));
        assert_ne!(a, b);
    }

    #[test]
    fn rates_clamp_to_percent_range() {
        let mut settings = Settings::default();
        settings.set_discount(Category::Metal, 150.0);
        assert_eq!(settings.discount_for(Category::Metal), 100.0);
        settings.set_discount(Category::Metal, -5.0);
        assert_eq!(settings.discount_for(Category::Metal), 0.0);
        settings.set_vat_rate(f64::NAN);
        assert_eq!(settings.vat_rate, 0.0);
    }

    #[test]
    fn fresh_state_defaults() {
        let state = AppState::default();
        assert_eq!(state.settings.vat_rate, 20.0);
        assert!(state.catalog.is_empty());
        assert!(state.demand.is_empty());
        assert!(state.requests.is_empty());
    }

    #[test]
    fn state_survives_a_json_round_trip() {
        let mut state = AppState::default();
        state.settings.notes = "ödeme 30 gün".into();
        let raw = serde_json::to_string(&state).unwrap();
        let back: AppState = serde_json::from_str(&raw).unwrap();
        assert_eq!(back.settings.notes, "ödeme 30 gün");
        assert_eq!(back.settings.vat_rate, 20.0);
    }
}
