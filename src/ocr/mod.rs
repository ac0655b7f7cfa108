//! Modular OCR engine abstraction.
//!
//! Defines the [`OcrEngine`] trait and unified types so the production
//! Tesseract backend can be swapped for a fake recognizer in tests.

pub mod tesseract;

/// Axis-aligned bounding region of a recognized line, in image pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// One recognized line of text, in reading order.
#[derive(Debug, Clone)]
pub struct OcrLine {
    pub region: Region,
    pub text: String,
    /// Mean word confidence for the line, 0-100.
    pub confidence: f32,
}

/// Async trait implemented by each OCR backend.
#[async_trait::async_trait]
pub trait OcrEngine: Send + Sync {
    fn name(&self) -> &str;

    /// Recognize text lines in raw image bytes.
    async fn recognize(&self, image: &[u8]) -> anyhow::Result<Vec<OcrLine>>;
}

/// Join recognized lines into the single text blob the extractor consumes.
pub fn joined_text(lines: &[OcrLine]) -> String {
    lines
        .iter()
        .map(|l| l.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}
