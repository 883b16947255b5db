// Remote OCR through the OCR.space REST API

use base64::{engine::general_purpose::STANDARD, Engine};
use image::ImageFormat;
use log::{debug, info};
use reqwest::blocking::{multipart::Form, Client};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

use super::ocr::{OcrOutput, OcrProvider};
use crate::utils::{Result, ScanError};

pub const DEFAULT_ENDPOINT: &str = "https://api.ocr.space/parse/image";

pub struct OcrSpaceProvider {
    client: Client,
    api_key: String,
    endpoint: String,
    language: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct OcrSpaceResponse {
    #[serde(default)]
    parsed_results: Vec<ParsedResult>,
    #[serde(default)]
    is_errored_on_processing: bool,
    // A string or a list of strings, depending on the failure
    #[serde(default)]
    error_message: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ParsedResult {
    #[serde(default)]
    parsed_text: String,
    #[serde(default)]
    error_message: Value,
}

impl OcrSpaceProvider {
    pub fn new(api_key: impl Into<String>, timeout_secs: u64) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(ScanError::Config(
                "OCR.space API key required (set OCR_SPACE_KEY)".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ScanError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(OcrSpaceProvider {
            client,
            api_key,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            language: "eng".to_string(),
        })
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    fn data_uri(image_data: &[u8]) -> String {
        let mime = match image::guess_format(image_data) {
            Ok(ImageFormat::Png) => "image/png",
            Ok(ImageFormat::Jpeg) => "image/jpeg",
            Ok(ImageFormat::Gif) => "image/gif",
            Ok(ImageFormat::Bmp) => "image/bmp",
            Ok(ImageFormat::Tiff) => "image/tiff",
            Ok(ImageFormat::WebP) => "image/webp",
            _ => "application/octet-stream",
        };
        format!("data:{};base64,{}", mime, STANDARD.encode(image_data))
    }

    fn into_output(response: OcrSpaceResponse) -> OcrOutput {
        let mut errors = Vec::new();
        if response.is_errored_on_processing {
            errors.extend(error_messages(&response.error_message));
            if errors.is_empty() {
                errors.push("OCR.space reported a processing error".to_string());
            }
        }

        let mut pages = Vec::new();
        for result in response.parsed_results {
            errors.extend(error_messages(&result.error_message));
            pages.push(result.parsed_text);
        }

        OcrOutput {
            // OCR.space separates lines with CRLF
            text: pages.join("\n").replace("\r\n", "\n"),
            error: if errors.is_empty() {
                None
            } else {
                Some(errors.join("; "))
            },
        }
    }
}

impl OcrProvider for OcrSpaceProvider {
    fn name(&self) -> &'static str {
        "ocr_space"
    }

    fn recognize(&self, image_data: &[u8]) -> Result<OcrOutput> {
        info!("Sending {} bytes to {}", image_data.len(), self.endpoint);

        let form = Form::new()
            .text("apikey", self.api_key.clone())
            .text("language", self.language.clone())
            .text("base64Image", Self::data_uri(image_data));

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .map_err(|e| ScanError::OcrFailure(format!("OCR.space request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ScanError::OcrFailure(format!(
                "OCR.space API error ({}): {}",
                status, body
            )));
        }

        let parsed: OcrSpaceResponse = response.json().map_err(|e| {
            ScanError::OcrFailure(format!("Failed to parse OCR.space response: {}", e))
        })?;

        let output = Self::into_output(parsed);
        debug!("OCR.space result:\n{}", output.text);
        Ok(output)
    }
}

fn error_messages(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => vec![s.clone()],
        Value::Array(items) => items
            .iter()
            .filter_map(|item| item.as_str())
            .filter(|s| !s.trim().is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}
