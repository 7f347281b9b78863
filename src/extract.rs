use crate::catalog::{Catalog, CatalogItem};
use crate::classify::{detect_code, detect_name, detect_quantity, detect_quantity_from_line};
use crate::demand::sanitise_quantity;
use crate::normalize::normalise_for_match;
use crate::ocr::{OcrText, TextRecognizer};
use crate::pdf_text::{self, PdfText};
use crate::tabular::{self, Sheet, file_extension};
use indexmap::IndexMap;
use std::collections::HashSet;
use tracing::{info, warn};

// Extraction outcome notes shown to the user alongside each request
// document. Fixed strings; tests rely on them.
pub const NOTE_NO_PRICE_LIST: &str = "Fiyat listesi olmadan otomatik çıkarım yapılamıyor.";
pub const NOTE_NO_MATCH: &str = "Belgeden ürün eşleştirilemedi.";
pub const NOTE_PROCESS_ERROR: &str = "Belge işlenirken hata oluştu. Ürün çıkarılamadı.";
pub const NOTE_PDF_UNREADABLE: &str = "PDF metni okunamadı.";
pub const NOTE_IMAGE_UNREADABLE: &str = "Görüntüden metin okunamadı.";
pub const NOTE_OCR_UNAVAILABLE: &str = "Görüntüden metin çıkarma desteği bulunmuyor.";
pub const NOTE_UNSUPPORTED: &str = "Dosya formatı otomatik çıkartma için desteklenmiyor.";

/// One candidate (item, quantity) pairing produced by extraction.
#[derive(Debug, Clone)]
pub struct Match {
    pub item: CatalogItem,
    pub quantity: u32,
    /// The text that triggered the match, for diagnostics.
    pub source: String,
}

/// Result of running extraction over one document: candidate matches plus
/// an optional capability/outcome note.
#[derive(Debug, Default)]
pub struct Extraction {
    pub matches: Vec<Match>,
    pub note: Option<String>,
}

impl Extraction {
    fn noted(note: &str) -> Self {
        Self {
            matches: Vec::new(),
            note: Some(note.to_string()),
        }
    }

    fn matched(matches: Vec<Match>) -> Self {
        Self {
            matches,
            note: None,
        }
    }
}

/// Collapse matches to at most one entry per catalog item, keeping the
/// maximum quantity seen. First-seen order is preserved.
pub fn dedupe_matches(matches: Vec<Match>) -> Vec<Match> {
    let mut by_item: IndexMap<String, Match> = IndexMap::new();
    for m in matches {
        match by_item.get_mut(&m.item.id) {
            Some(existing) => {
                if m.quantity > existing.quantity {
                    existing.quantity = m.quantity;
                }
            }
            None => {
                by_item.insert(m.item.id.clone(), m);
            }
        }
    }
    by_item.into_values().collect()
}

/// Tabular extraction: every row of every sheet is classified, the
/// detected name is matched against the catalog, and a quantity is pulled
/// from the row fields (falling back to treating the whole row as one
/// free-text line, then to 1).
pub fn matches_from_sheets(catalog: &Catalog, sheets: &[Sheet]) -> Vec<Match> {
    let mut matches = Vec::new();
    for sheet in sheets {
        for record in &sheet.records {
            let code = detect_code(record);
            let Some(candidate) = detect_name(record, code.as_deref()) else {
                continue;
            };
            let Some(item) = catalog.match_product_by_name(&candidate) else {
                continue;
            };
            let quantity = detect_quantity(record)
                .or_else(|| detect_quantity_from_line(&record.values_joined()))
                .unwrap_or(1.0);
            matches.push(Match {
                item: item.clone(),
                quantity: sanitise_quantity(quantity),
                source: candidate,
            });
        }
    }
    matches
}

/// Free-text extraction: every distinct non-empty line is matched on its
/// own. When no line matches at all, a whole-document pass checks each
/// catalog alias for space-delimited containment in the normalized text,
/// since request documents are often prose, not line-per-item.
pub fn matches_from_text(catalog: &Catalog, text: &str) -> Vec<Match> {
    let mut matches = Vec::new();
    let mut seen_lines: HashSet<&str> = HashSet::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || !seen_lines.insert(line) {
            continue;
        }
        if let Some(item) = catalog.match_product_by_name(line) {
            let quantity = detect_quantity_from_line(line).unwrap_or(1.0);
            matches.push(Match {
                item: item.clone(),
                quantity: sanitise_quantity(quantity),
                source: line.to_string(),
            });
        }
    }
    if !matches.is_empty() {
        return matches;
    }

    let normalised_text = format!(" {} ", normalise_for_match(text));
    if normalised_text.trim().is_empty() {
        return matches;
    }
    for item in catalog.iter_all() {
        for alias in &item.aliases {
            let alias_key = normalise_for_match(alias);
            if alias_key.is_empty() {
                continue;
            }
            if normalised_text.contains(&format!(" {alias_key} ")) {
                matches.push(Match {
                    item: item.clone(),
                    quantity: 1,
                    source: alias.clone(),
                });
            }
        }
    }
    matches
}

/// Run extraction over one uploaded document, dispatching on extension
/// and MIME type. Never fails: every decode/OCR problem is downgraded to
/// a note, and an empty catalog short-circuits before any decode work.
pub async fn extract_from_document(
    catalog: &Catalog,
    file_name: &str,
    mime_type: &str,
    bytes: &[u8],
    recognizer: &dyn TextRecognizer,
    language_hints: &str,
) -> Extraction {
    if catalog.is_empty() {
        return Extraction::noted(NOTE_NO_PRICE_LIST);
    }

    let extension = file_extension(file_name);
    match extension.as_str() {
        "xlsx" | "xls" | "xlsm" | "csv" => match tabular::decode_tabular(file_name, bytes) {
            Ok(sheets) => Extraction::matched(matches_from_sheets(catalog, &sheets)),
            Err(e) => {
                warn!(file = %file_name, error = %e, "request document could not be decoded");
                Extraction::noted(NOTE_PROCESS_ERROR)
            }
        },
        "pdf" => match pdf_text::extract_text(bytes) {
            PdfText::Extracted(text) => Extraction::matched(matches_from_text(catalog, &text)),
            PdfText::Scanned => {
                info!(file = %file_name, "PDF is scanned, no text to match");
                Extraction::noted(NOTE_PDF_UNREADABLE)
            }
            PdfText::Failed(e) => {
                warn!(file = %file_name, error = %e, "PDF extraction failed");
                Extraction::noted(NOTE_PDF_UNREADABLE)
            }
        },
        _ if mime_type.starts_with("image/") => {
            match recognizer.recognize(bytes, language_hints).await {
                OcrText::Recognized(text) if !text.trim().is_empty() => {
                    Extraction::matched(matches_from_text(catalog, &text))
                }
                OcrText::Recognized(_) => Extraction::noted(NOTE_IMAGE_UNREADABLE),
                OcrText::Unavailable => Extraction::noted(NOTE_OCR_UNAVAILABLE),
                OcrText::Failed(e) => {
                    warn!(file = %file_name, error = %e, "OCR failed");
                    Extraction::noted(NOTE_IMAGE_UNREADABLE)
                }
            }
        }
        _ if mime_type.starts_with("text/") => match std::str::from_utf8(bytes) {
            Ok(text) => Extraction::matched(matches_from_text(catalog, text)),
            Err(_) => Extraction::noted(NOTE_PROCESS_ERROR),
        },
        _ => match std::str::from_utf8(bytes) {
            // unknown format: a best-effort attempt to read it as text
            Ok(text) if !text.trim().is_empty() => {
                Extraction::matched(matches_from_text(catalog, text))
            }
            _ => Extraction::noted(NOTE_UNSUPPORTED),
        },
    }
}
