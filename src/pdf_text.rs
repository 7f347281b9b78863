// src/pdf_text.rs

use lopdf::Document;
use tracing::{info, warn};

/// Result of attempting to pull text out of a PDF request document.
#[derive(Debug)]
pub enum PdfText {
    /// The PDF contains extractable text.
    Extracted(String),
    /// The PDF appears to be scanned / image-only.
    Scanned,
    /// Something went wrong during extraction.
    Failed(String),
}

/// Minimum number of non-whitespace characters expected from a "real"
/// text PDF. Below this threshold the document is treated as scanned.
const MIN_TEXT_CHARS: usize = 30;

/// Takes raw PDF bytes and classifies/extracts in two phases: a cheap
/// structural check for image-only pages, then full text extraction.
pub fn extract_text(pdf_bytes: &[u8]) -> PdfText {
    let doc = match Document::load_mem(pdf_bytes) {
        Ok(d) => d,
        Err(e) => return PdfText::Failed(format!("PDF could not be parsed: {e}")),
    };

    if looks_like_scanned(&doc) {
        info!("PDF structural check: likely scanned / image-only");
        return PdfText::Scanned;
    }

    match pdf_extract::extract_text_from_mem(pdf_bytes) {
        Ok(text) => {
            let meaningful = text.chars().filter(|c| !c.is_whitespace()).count();
            if meaningful < MIN_TEXT_CHARS {
                info!(chars = meaningful, "extracted text too short, treating as scanned");
                PdfText::Scanned
            } else {
                info!(chars = meaningful, "text extracted from PDF");
                PdfText::Extracted(text)
            }
        }
        Err(e) => {
            warn!(error = %e, "pdf-extract failed, may be scanned or corrupted");
            PdfText::Scanned
        }
    }
}

/// Inspect the PDF object tree for pages that carry XObject images but no
/// Font resources; such pages are almost certainly scans. When ≥ 80% of
/// pages are image-only the whole document counts as scanned.
fn looks_like_scanned(doc: &Document) -> bool {
    let pages = doc.get_pages();
    if pages.is_empty() {
        return false; // can't tell, let text extraction try
    }

    let mut image_only_pages = 0;

    for (_page_num, object_id) in &pages {
        let Ok(page_obj) = doc.get_object(*object_id) else {
            continue;
        };
        let Ok(page_dict) = page_obj.as_dict() else {
            continue;
        };

        let resource = |key: &[u8]| {
            page_dict
                .get(b"Resources")
                .ok()
                .and_then(|r| doc.dereference(r).ok())
                .and_then(|(_, resolved)| resolved.as_dict().ok())
                .and_then(|res| res.get(key).ok())
                .and_then(|entry| doc.dereference(entry).ok())
                .and_then(|(_, resolved)| resolved.as_dict().ok())
                .is_some_and(|dict| !dict.is_empty())
        };

        if resource(b"XObject") && !resource(b"Font") {
            image_only_pages += 1;
        }
    }

    let total = pages.len();
    let ratio = image_only_pages as f64 / total as f64;
    info!(
        total_pages = total,
        image_only = image_only_pages,
        ratio = format!("{ratio:.2}"),
        "scanned-page analysis"
    );

    ratio >= 0.8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn garbage_bytes_fail_cleanly() {
        let result = extract_text(b"this is not a pdf");
        assert!(matches!(result, PdfText::Failed(_)));
    }
}
