use log::warn;
use serde::Deserialize;
use std::env;
use std::fmt::Display;
use std::path::Path;
use std::str::FromStr;

use crate::processing::{
    GivenNamePolicy, OcrProvider, OcrSpaceProvider, TesseractProvider, DEFAULT_CENTURY_PIVOT,
};
use crate::utils::{Result, ScanError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum OcrProviderKind {
    #[default]
    Tesseract,
    OcrSpace,
}

impl FromStr for OcrProviderKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tesseract" => Ok(OcrProviderKind::Tesseract),
            "ocr_space" | "ocr-space" | "ocrspace" => Ok(OcrProviderKind::OcrSpace),
            other => Err(format!("unknown OCR provider '{}'", other)),
        }
    }
}

impl FromStr for GivenNamePolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "first_token" | "first" => Ok(GivenNamePolicy::FirstToken),
            "full" => Ok(GivenNamePolicy::Full),
            other => Err(format!("unknown given name policy '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    pub provider: OcrProviderKind,
    pub language: String,
    pub api_key: Option<String>,
    pub endpoint: Option<String>,
    pub timeout_secs: u64,
    pub tessdata: Option<String>,
}

impl Default for OcrConfig {
    fn default() -> Self {
        OcrConfig {
            provider: OcrProviderKind::Tesseract,
            language: "eng".to_string(),
            api_key: None,
            endpoint: None,
            timeout_secs: 30,
            tessdata: None,
        }
    }
}

/// Settings for one scanner. Defaults, then a TOML file, then `MRZSCAN_*`
/// environment variables, then command line flags.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub century_pivot: u8,
    pub given_names: GivenNamePolicy,
    pub require_valid_checksums: bool,
    pub preprocess: bool,
    pub binarize: bool,
    pub ocr: OcrConfig,
}

impl Default for ScanConfig {
    fn default() -> Self {
        ScanConfig {
            century_pivot: DEFAULT_CENTURY_PIVOT,
            given_names: GivenNamePolicy::FirstToken,
            require_valid_checksums: false,
            preprocess: true,
            binarize: false,
            ocr: OcrConfig::default(),
        }
    }
}

impl ScanConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: ScanConfig = toml::from_str(&contents)
            .map_err(|e| ScanError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load `.env`, the optional config file and the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenvy::dotenv().ok();

        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => ScanConfig::default(),
        };
        config.apply_overrides(|key| env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        override_parsed(&lookup, "MRZSCAN_CENTURY_PIVOT", &mut self.century_pivot);
        override_parsed(&lookup, "MRZSCAN_GIVEN_NAMES", &mut self.given_names);
        override_parsed(&lookup, "MRZSCAN_STRICT", &mut self.require_valid_checksums);
        override_parsed(&lookup, "MRZSCAN_PREPROCESS", &mut self.preprocess);
        override_parsed(&lookup, "MRZSCAN_BINARIZE", &mut self.binarize);
        override_parsed(&lookup, "MRZSCAN_OCR_PROVIDER", &mut self.ocr.provider);
        override_parsed(&lookup, "MRZSCAN_OCR_TIMEOUT", &mut self.ocr.timeout_secs);

        if let Some(language) = lookup("MRZSCAN_OCR_LANGUAGE") {
            self.ocr.language = language;
        }
        if let Some(endpoint) = lookup("MRZSCAN_OCR_ENDPOINT") {
            self.ocr.endpoint = Some(endpoint);
        }
        if let Some(key) = lookup("OCR_SPACE_KEY").filter(|key| !key.is_empty()) {
            self.ocr.api_key = Some(key);
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.century_pivot > 100 {
            return Err(ScanError::Config(format!(
                "century_pivot must be between 0 and 100, got {}",
                self.century_pivot
            )));
        }
        if self.ocr.timeout_secs == 0 {
            return Err(ScanError::Config("ocr.timeout_secs must be positive".to_string()));
        }
        Ok(())
    }

    pub fn build_provider(&self) -> Result<Box<dyn OcrProvider>> {
        match self.ocr.provider {
            OcrProviderKind::Tesseract => {
                let mut provider = TesseractProvider::new(self.ocr.language.clone());
                if let Some(tessdata) = &self.ocr.tessdata {
                    provider = provider.with_datapath(tessdata.clone());
                }
                Ok(Box::new(provider))
            }
            OcrProviderKind::OcrSpace => {
                let api_key = self.ocr.api_key.clone().unwrap_or_default();
                let mut provider = OcrSpaceProvider::new(api_key, self.ocr.timeout_secs)?
                    .with_language(self.ocr.language.clone());
                if let Some(endpoint) = &self.ocr.endpoint {
                    provider = provider.with_endpoint(endpoint.clone());
                }
                Ok(Box::new(provider))
            }
        }
    }
}

fn override_parsed<T, F>(lookup: &F, key: &str, target: &mut T)
where
    T: FromStr,
    T::Err: Display,
    F: Fn(&str) -> Option<String>,
{
    if let Some(val) = lookup(key) {
        match val.parse() {
            Ok(parsed) => *target = parsed,
            Err(e) => warn!("Invalid value '{}' for {}: {}. Ignoring.", val, key, e),
        }
    }
}
