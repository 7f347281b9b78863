use crate::normalize::{field_number, looks_like_sku, normalise_for_match, parse_number};
use crate::record::Record;
use regex::Regex;
use std::sync::LazyLock;

// ---------------------------------------------------------------------------
// Header synonym tables
//
// Real price lists from suppliers disagree wildly on column naming; these
// lists are scanned in order, so the earlier entries win. Exact-key lookups
// are deliberate: matching is on the header as typed.
// ---------------------------------------------------------------------------

const PRICE_KEYS: &[&str] = &[
    "Birim Fiyatı",
    "BirimFiyatı",
    "Birim Fiyat",
    "Birim fiyat",
    "Fiyat",
    "BirimFiyat",
    "Unit Price",
    "UnitPrice",
    "Price",
    "Fiyat (TL)",
    "Net Fiyat",
    "Satış Fiyatı",
];

const NAME_KEYS: &[&str] = &[
    "Ürün",
    "Ürün Adı",
    "Urun",
    "Urun Adı",
    "Malzeme",
    "Stok Adı",
    "Stok",
    "Product",
    "Name",
];

const EXTRA_NAME_KEYS: &[&str] = &["Cinsi", "Model", "Marka"];

const DESCRIPTION_KEYS: &[&str] = &[
    "Açıklama",
    "Aciklama",
    "Ürün Açıklaması",
    "Ürün Açiklaması",
    "Urun Açıklaması",
    "Urun Aciklamasi",
    "Description",
    "Detay",
    "Özellik",
    "Notes",
];

const UNIT_KEYS: &[&str] = &["Birim", "Unit", "Ölçü", "Olcu", "Measure"];

const QUANTITY_KEYS: &[&str] = &[
    "Adet",
    "Adedi",
    "Adet Sayısı",
    "Miktar",
    "Mıktar",
    "Miktarı",
    "Qty",
    "Quantity",
    "Quantity Requested",
];

const QUANTITY_KEY_TOKENS: &[&str] = &["adet", "miktar", "qty"];

const CODE_KEY_TOKENS: &[&str] = &["kod", "code", "sku"];

/// Default display unit when no unit column is present.
pub const DEFAULT_UNIT: &str = "Adet";

/// Does this header label a product-code column?
fn is_code_header(key: &str) -> bool {
    let normalised = normalise_for_match(key);
    CODE_KEY_TOKENS
        .iter()
        .any(|token| normalised.contains(token))
}

// ---------------------------------------------------------------------------
// Per-field detectors
// ---------------------------------------------------------------------------

/// Unit price of a row. Preferred headers first, then the first numeric
/// value anywhere in the row (in column order). A row with no detectable
/// price is unusable; this is the only hard rejection gate for price-list
/// ingestion. Negative values are skipped so the catalog invariant
/// (unit price ≥ 0) can never be violated at ingest time.
pub fn detect_price(record: &Record) -> Option<f64> {
    for key in PRICE_KEYS {
        if let Some(field) = record.get(key) {
            if let Some(value) = field_number(field) {
                if value >= 0.0 {
                    return Some(value);
                }
            }
        }
    }
    for (_key, field) in record.iter() {
        if let Some(value) = field_number(field) {
            if value >= 0.0 {
                return Some(value);
            }
        }
    }
    None
}

/// Product code: any non-empty value under a code-labelled header wins
/// verbatim, otherwise the first textual value that is SKU-shaped.
pub fn detect_code(record: &Record) -> Option<String> {
    for (key, field) in record.iter() {
        if is_code_header(key) {
            let text = field.display();
            if !text.is_empty() {
                return Some(text);
            }
        }
    }
    for (_key, field) in record.iter() {
        if let Some(text) = field.text() {
            if looks_like_sku(text) {
                return Some(text.to_string());
            }
        }
    }
    None
}

fn scan_name_keys(
    record: &Record,
    code: Option<&str>,
    keys: &[&str],
    sku_candidate: &mut Option<String>,
) -> Option<String> {
    for key in keys {
        if is_code_header(key) {
            continue;
        }
        let Some(text) = record.get(key).and_then(|f| f.text()) else {
            continue;
        };
        if code == Some(text) {
            continue;
        }
        if looks_like_sku(text) {
            sku_candidate.get_or_insert_with(|| text.to_string());
            continue;
        }
        return Some(text.to_string());
    }
    None
}

/// Product name, given the already-detected code (to keep the two from
/// triaging into each other). Priority: the primary name headers, then
/// description text, then the secondary headers (Cinsi/Model/Marka), then
/// any textual value. SKU-shaped values are remembered but only used when
/// nothing better turns up.
pub fn detect_name(record: &Record, code: Option<&str>) -> Option<String> {
    let mut sku_candidate: Option<String> = None;

    if let Some(name) = scan_name_keys(record, code, NAME_KEYS, &mut sku_candidate) {
        return Some(name);
    }

    if let Some(description) = detect_description(record, code) {
        return Some(description);
    }

    if let Some(name) = scan_name_keys(record, code, EXTRA_NAME_KEYS, &mut sku_candidate) {
        return Some(name);
    }

    // Last resort: any textual value in the row, favouring non-SKU text.
    for (key, field) in record.iter() {
        if is_code_header(key) {
            continue;
        }
        let Some(text) = field.text() else { continue };
        if code == Some(text) {
            continue;
        }
        if looks_like_sku(text) {
            sku_candidate.get_or_insert_with(|| text.to_string());
            continue;
        }
        return Some(text.to_string());
    }

    sku_candidate
}

/// Secondary descriptive text. Excludes code columns, the detected code
/// itself, and SKU-shaped values.
pub fn detect_description(record: &Record, code: Option<&str>) -> Option<String> {
    for key in DESCRIPTION_KEYS {
        if is_code_header(key) {
            continue;
        }
        let Some(text) = record.get(key).and_then(|f| f.text()) else {
            continue;
        };
        if code == Some(text) || looks_like_sku(text) {
            continue;
        }
        return Some(text.to_string());
    }
    None
}

pub fn detect_unit(record: &Record) -> String {
    for key in UNIT_KEYS {
        if let Some(text) = record.get(key).and_then(|f| f.text()) {
            return text.to_string();
        }
    }
    DEFAULT_UNIT.to_string()
}

/// Quantity from a tabular row: preferred headers first, then any header
/// containing a quantity-related token. Only finite values > 0 count.
pub fn detect_quantity(record: &Record) -> Option<f64> {
    for key in QUANTITY_KEYS {
        if let Some(field) = record.get(key) {
            if let Some(value) = field_number(field) {
                if value > 0.0 {
                    return Some(value);
                }
            }
        }
    }
    for (key, field) in record.iter() {
        let lower = normalise_for_match(key);
        if QUANTITY_KEY_TOKENS.iter().any(|token| lower.contains(token)) {
            if let Some(value) = field_number(field) {
                if value > 0.0 {
                    return Some(value);
                }
            }
        }
    }
    None
}

static QTY_UNIT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+(?:[.,]\d+)?)\s*(adet|pcs|paket|kutu|kg|mt|metre|set|takım|pair)")
        .unwrap()
});
static QTY_MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:x|×|\*)\s*(\d{1,4})").unwrap());
static QTY_LEADING_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d{1,4})\b").unwrap());

/// Quantity from one free-text line. Three patterns, first hit wins:
/// a number followed by a unit word ("5 adet", "12 kutu"), a number after
/// a multiplication marker ("x3", "× 10"), a number opening the line.
pub fn detect_quantity_from_line(line: &str) -> Option<f64> {
    if line.is_empty() {
        return None;
    }
    for re in [&*QTY_UNIT_RE, &*QTY_MARKER_RE, &*QTY_LEADING_RE] {
        if let Some(caps) = re.captures(line) {
            if let Some(value) = parse_number(&caps[1]) {
                if value > 0.0 {
                    return Some(value);
                }
            }
        }
    }
    None
}

// ---------------------------------------------------------------------------
// Row classification
// ---------------------------------------------------------------------------

/// Name/description/code/unit of one price-list row, after the swap rule.
#[derive(Debug, Clone, PartialEq)]
pub struct RowFields {
    pub name: String,
    pub description: Option<String>,
    pub code: Option<String>,
    pub unit: String,
}

/// Classify one row into its display fields.
///
/// The post-processing swap exists because spreadsheet producers order
/// "code" and "name" columns inconsistently; the rule sequence below is
/// order-sensitive and must stay exactly as written:
///   1. SKU-shaped name with a non-SKU description → swap them.
///   2. SKU-shaped name with no description → copy the name down.
///   3. Description equal to the name, or still SKU-shaped → cleared.
///   4. Pre-swap name was SKU-shaped, final name is not, description
///      empty → keep the original name as description.
pub fn classify_row(record: &Record, fallback_name: &str) -> RowFields {
    let code = detect_code(record);
    let original_name =
        detect_name(record, code.as_deref()).unwrap_or_else(|| fallback_name.to_string());
    let mut name = original_name.clone();
    let mut description = detect_description(record, code.as_deref());

    if looks_like_sku(&name) {
        match description.clone() {
            Some(desc) if !looks_like_sku(&desc) => {
                description = Some(name);
                name = desc;
            }
            Some(_) => {}
            None => description = Some(name.clone()),
        }
    }
    if let Some(desc) = &description {
        if *desc == name || looks_like_sku(desc) {
            description = None;
        }
    }
    if looks_like_sku(&original_name) && !looks_like_sku(&name) && description.is_none() {
        description = Some(original_name);
    }

    RowFields {
        name,
        description,
        code,
        unit: detect_unit(record),
    }
}
