//! Tesseract OCR backend.

use anyhow::{Context, Result};
use tesseract::Tesseract;
use tracing::debug;

use super::{OcrEngine, OcrLine, Region};

/// Local Tesseract backend.
///
/// A Tesseract handle is not safe for concurrent use, so `recognize` builds
/// a fresh handle per call on the blocking pool instead of sharing one
/// behind a lock. Configuration is resolved and validated once at startup.
pub struct TesseractEngine {
    datapath: Option<String>,
    lang: String,
}

impl TesseractEngine {
    /// Build the engine from `TESSDATA_DIR` / `OCR_LANG` (default `eng`),
    /// probing once so a missing installation or language pack fails at
    /// startup rather than on the first request.
    pub fn from_env() -> Result<Self> {
        let datapath = std::env::var("TESSDATA_DIR").ok();
        let lang = std::env::var("OCR_LANG").unwrap_or_else(|_| "eng".to_string());

        let engine = Self { datapath, lang };
        engine.probe()?;
        Ok(engine)
    }

    fn probe(&self) -> Result<()> {
        Tesseract::new(self.datapath.as_deref(), Some(&self.lang))
            .with_context(|| format!("failed to initialize tesseract (lang: {})", self.lang))?;
        Ok(())
    }

    fn recognize_blocking(
        datapath: Option<&str>,
        lang: &str,
        image: &[u8],
    ) -> Result<Vec<OcrLine>> {
        let mut tess = Tesseract::new(datapath, Some(lang))
            .context("tesseract init failed")?
            .set_image_from_mem(image)
            .context("tesseract rejected image")?;

        let tsv = tess
            .get_tsv_text(0)
            .context("tesseract recognition failed")?;

        Ok(parse_tsv(&tsv))
    }
}

#[async_trait::async_trait]
impl OcrEngine for TesseractEngine {
    fn name(&self) -> &str {
        "tesseract"
    }

    async fn recognize(&self, image: &[u8]) -> Result<Vec<OcrLine>> {
        let datapath = self.datapath.clone();
        let lang = self.lang.clone();
        let image = image.to_vec();

        let lines = tokio::task::spawn_blocking(move || {
            Self::recognize_blocking(datapath.as_deref(), &lang, &image)
        })
        .await
        .context("ocr task panicked")??;

        debug!("tesseract recognized {} lines", lines.len());
        Ok(lines)
    }
}

/// Parse Tesseract TSV output into line tuples.
///
/// Word rows (level 5) are grouped by their block/paragraph/line numbers;
/// each line's region is the union of its word boxes and its confidence is
/// the mean of the word confidences.
fn parse_tsv(tsv: &str) -> Vec<OcrLine> {
    struct LineAcc {
        key: (u32, u32, u32),
        left: u32,
        top: u32,
        right: u32,
        bottom: u32,
        words: Vec<String>,
        conf_sum: f32,
    }

    let mut acc: Vec<LineAcc> = Vec::new();

    for row in tsv.lines() {
        let cols: Vec<&str> = row.split('\t').collect();
        if cols.len() < 12 || cols[0] != "5" {
            continue;
        }

        let num = |s: &str| s.trim().parse::<u32>().ok();
        let (Some(block), Some(par), Some(line)) = (num(cols[2]), num(cols[3]), num(cols[4]))
        else {
            continue;
        };
        let (Some(left), Some(top), Some(width), Some(height)) =
            (num(cols[6]), num(cols[7]), num(cols[8]), num(cols[9]))
        else {
            continue;
        };
        let Ok(conf) = cols[10].trim().parse::<f32>() else {
            continue;
        };
        let word = cols[11].trim();
        if word.is_empty() {
            continue;
        }

        let key = (block, par, line);
        match acc.last_mut() {
            Some(l) if l.key == key => {
                l.left = l.left.min(left);
                l.top = l.top.min(top);
                l.right = l.right.max(left + width);
                l.bottom = l.bottom.max(top + height);
                l.words.push(word.to_string());
                l.conf_sum += conf;
            }
            _ => acc.push(LineAcc {
                key,
                left,
                top,
                right: left + width,
                bottom: top + height,
                words: vec![word.to_string()],
                conf_sum: conf,
            }),
        }
    }

    acc.into_iter()
        .map(|l| OcrLine {
            region: Region {
                x: l.left,
                y: l.top,
                width: l.right - l.left,
                height: l.bottom - l.top,
            },
            confidence: l.conf_sum / l.words.len() as f32,
            text: l.words.join(" "),
        })
        .collect()
}
