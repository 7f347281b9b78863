use crate::catalog::Category;
use crate::demand::DemandLine;
use crate::state::Settings;

/// Export column order is fixed; downstream templates rely on it.
pub const EXPORT_HEADER: [&str; 10] = [
    "Kategori",
    "Ürün",
    "Kod",
    "Adet",
    "Birim",
    "Birim Fiyatı",
    "İskonto (%)",
    "İskontolu Birim",
    "KDV Dahil Birim",
    "Satır Toplamı",
];

/// One priced offer row, derived from a demand line. Never persisted;
/// recomputed on every read.
#[derive(Debug, Clone)]
pub struct OfferRow {
    pub category: Category,
    pub product_name: String,
    pub product_code: Option<String>,
    pub quantity: u32,
    pub unit: String,
    pub unit_price: f64,
    pub discount_rate: f64,
    pub discounted_unit: f64,
    pub vat_inclusive_unit: f64,
    pub line_subtotal: f64,
    pub line_vat: f64,
    pub line_total: f64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OfferTotals {
    pub subtotal: f64,
    pub vat_total: f64,
    pub grand_total: f64,
}

#[derive(Debug, Clone, Default)]
pub struct Offer {
    pub rows: Vec<OfferRow>,
    pub totals: OfferTotals,
}

/// Price the demand list: per-category discount, then VAT. Pure function
/// of its inputs.
pub fn compute_offer(demand: &[DemandLine], settings: &Settings) -> Offer {
    let vat_rate = settings.vat_rate / 100.0;
    let mut rows = Vec::with_capacity(demand.len());
    let mut totals = OfferTotals::default();

    for line in demand {
        let discount_rate = settings.discount_for(line.category);
        let discounted_unit = line.unit_price * (1.0 - discount_rate / 100.0);
        let line_subtotal = discounted_unit * line.quantity as f64;
        let line_vat = line_subtotal * vat_rate;
        let line_total = line_subtotal + line_vat;

        totals.subtotal += line_subtotal;
        totals.vat_total += line_vat;

        rows.push(OfferRow {
            category: line.category,
            product_name: line.product_name.clone(),
            product_code: line.product_code.clone(),
            quantity: line.quantity,
            unit: line.unit.clone(),
            unit_price: line.unit_price,
            discount_rate,
            discounted_unit,
            vat_inclusive_unit: discounted_unit * (1.0 + vat_rate),
            line_subtotal,
            line_vat,
            line_total,
        });
    }

    totals.grand_total = totals.subtotal + totals.vat_total;
    Offer { rows, totals }
}
