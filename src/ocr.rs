use async_trait::async_trait;

/// Outcome of an OCR attempt over raw image bytes.
#[derive(Debug)]
pub enum OcrText {
    Recognized(String),
    /// No OCR engine is wired in at all.
    Unavailable,
    /// The engine ran and failed.
    Failed(String),
}

/// Pluggable OCR capability. Image uploads (and nothing else) go through
/// this seam; failures never abort an ingest, they become per-document
/// extraction notes.
#[async_trait]
pub trait TextRecognizer: Send + Sync {
    async fn recognize(&self, image: &[u8], language_hints: &str) -> OcrText;
}

/// Default recognizer: reports the capability as unavailable.
pub struct NoOcr;

#[async_trait]
impl TextRecognizer for NoOcr {
    async fn recognize(&self, _image: &[u8], _language_hints: &str) -> OcrText {
        OcrText::Unavailable
    }
}

#[cfg(test)]
pub mod test_support {
    use super::*;

    /// Recognizer returning a canned text, for pipeline tests.
    pub struct FixedText(pub String);

    #[async_trait]
    impl TextRecognizer for FixedText {
        async fn recognize(&self, _image: &[u8], _language_hints: &str) -> OcrText {
            OcrText::Recognized(self.0.clone())
        }
    }
}
