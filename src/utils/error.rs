use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("OCR failure: {0}")]
    OcrFailure(String),

    #[error("Insufficient MRZ lines: found {found}, need at least 2")]
    InsufficientLines { found: usize },

    #[error("Invalid MRZ: {0}")]
    InvalidMrz(String),

    #[error("MRZ checksum mismatch: {}", .0.join(", "))]
    ChecksumMismatch(Vec<String>),

    #[error("Image processing error: {0}")]
    ImageProcessing(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ScanError {
    // Short text suitable for showing to whoever is holding the passport
    pub fn user_message(&self) -> &'static str {
        match self {
            ScanError::OcrFailure(_) => "Could not read image",
            ScanError::InsufficientLines { .. } | ScanError::InvalidMrz(_) => {
                "No MRZ detected, please retry with a clearer image"
            }
            ScanError::ChecksumMismatch(_) => "MRZ check digits do not match",
            ScanError::ImageProcessing(_) => "Could not process image",
            ScanError::Config(_) => "Invalid configuration",
            ScanError::Io(_) => "Could not read file",
        }
    }
}

pub type Result<T> = std::result::Result<T, ScanError>;
