use crate::utils::{Result, ScanError};
use log::debug;
use std::io::Write;
use tempfile::NamedTempFile;
use tesseract::Tesseract;

pub const MRZ_CHAR_WHITELIST: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789<";

/// What an OCR engine hands back: the recognized text and, when the engine
/// reports one, an error message.
#[derive(Debug, Clone, Default)]
pub struct OcrOutput {
    pub text: String,
    pub error: Option<String>,
}

impl OcrOutput {
    pub fn text(text: impl Into<String>) -> Self {
        OcrOutput {
            text: text.into(),
            error: None,
        }
    }

    /// Any reported error, or text with nothing but whitespace, stops the
    /// scan before sanitizing.
    pub fn into_text(self) -> Result<String> {
        if let Some(error) = self.error.filter(|e| !e.trim().is_empty()) {
            return Err(ScanError::OcrFailure(error));
        }
        if self.text.trim().is_empty() {
            return Err(ScanError::OcrFailure("OCR returned no text".to_string()));
        }
        Ok(self.text)
    }
}

/// Anything that can turn an encoded image into raw text.
pub trait OcrProvider: Send + Sync {
    fn name(&self) -> &'static str;

    fn recognize(&self, image_data: &[u8]) -> Result<OcrOutput>;
}

/// Local Tesseract engine restricted to the MRZ alphabet.
pub struct TesseractProvider {
    language: String,
    datapath: Option<String>,
}

impl TesseractProvider {
    pub fn new(language: impl Into<String>) -> Self {
        TesseractProvider {
            language: language.into(),
            datapath: None,
        }
    }

    pub fn with_datapath(mut self, datapath: impl Into<String>) -> Self {
        self.datapath = Some(datapath.into());
        self
    }
}

impl Default for TesseractProvider {
    fn default() -> Self {
        Self::new("eng")
    }
}

impl OcrProvider for TesseractProvider {
    fn name(&self) -> &'static str {
        "tesseract"
    }

    fn recognize(&self, image_data: &[u8]) -> Result<OcrOutput> {
        // Tesseract reads from disk, so stage the image in a temporary file
        let mut temp_file = tempfile::Builder::new().suffix(".png").tempfile()?;
        temp_file.write_all(image_data)?;
        let image_path_str = temp_path_str(&temp_file)?;

        // Engine failures are reported through the output, not as hard errors
        let text = Tesseract::new(self.datapath.as_deref(), Some(self.language.as_str()))
            .map_err(|e| format!("Tesseract init error: {}", e))
            .and_then(|tess| {
                tess.set_image(image_path_str)
                    .map_err(|e| format!("Tesseract set image error: {}", e))
            })
            .and_then(|tess| {
                tess.set_variable("tessedit_char_whitelist", MRZ_CHAR_WHITELIST)
                    .map_err(|e| format!("Tesseract set variable error: {}", e))
            })
            .and_then(|mut tess| {
                tess.get_text()
                    .map_err(|e| format!("Tesseract error: {}", e))
            });

        match text {
            Ok(text) => {
                debug!("Tesseract OCR result:\n{}", text);
                Ok(OcrOutput::text(text))
            }
            Err(error) => Ok(OcrOutput {
                text: String::new(),
                error: Some(error),
            }),
        }
    }
}

fn temp_path_str(temp_file: &NamedTempFile) -> Result<&str> {
    temp_file
        .path()
        .to_str()
        .ok_or_else(|| ScanError::OcrFailure("Failed to convert path to string".to_string()))
}
