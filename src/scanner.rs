use crate::config::ScanConfig;
use crate::models::*;
use crate::processing::*;
use crate::utils::{Result, ScanError};
use crate::validation::FormatValidator;
use log::{debug, info};
use std::path::Path;

pub struct PassportScanner {
    config: ScanConfig,
    normalizer: FieldNormalizer,
}

impl Default for PassportScanner {
    fn default() -> Self {
        Self::new(ScanConfig::default())
    }
}

impl PassportScanner {
    pub fn new(config: ScanConfig) -> Self {
        let normalizer = FieldNormalizer::new(config.century_pivot, config.given_names);
        PassportScanner { config, normalizer }
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    // Main entry point: raw OCR text in, display record out
    pub fn scan(&self, raw_ocr_text: &str) -> Result<NormalizedRecord> {
        // Step 1: Sanitize and decode
        let fields = self.decode_text(raw_ocr_text)?;

        // Step 2: Checksum policy
        if self.config.require_valid_checksums && !fields.valid {
            let failed = fields
                .check_digits
                .failed()
                .into_iter()
                .map(str::to_string)
                .collect();
            return Err(ScanError::ChecksumMismatch(failed));
        }

        // Step 3: Normalize for display
        Ok(self.normalize(&fields))
    }

    /// Display record for an already decoded field map. No checksum policy
    /// is applied here.
    pub fn normalize(&self, fields: &MrzFieldMap) -> NormalizedRecord {
        self.normalizer.normalize(fields)
    }

    /// Sanitize raw OCR text and decode the MRZ block it contains.
    pub fn decode_text(&self, raw_ocr_text: &str) -> Result<MrzFieldMap> {
        debug!("Raw OCR text:\n{}", raw_ocr_text);

        let (format, lines) = match LineSanitizer::detect(raw_ocr_text) {
            Some(found) => found,
            None => {
                let found = DocumentFormat::ALL
                    .iter()
                    .map(|format| LineSanitizer::sanitize(raw_ocr_text, *format).len())
                    .max()
                    .unwrap_or(0);
                return Err(ScanError::InsufficientLines { found });
            }
        };

        info!("Found {} candidate {} MRZ lines", lines.len(), format.name());
        let mut fields =
            Self::decode_best_window(&lines, format.mrz_lines(), self.config.century_pivot)?;
        fields.candidate_lines = lines;
        Ok(fields)
    }

    // The MRZ is printed at the foot of the page, so stray lines that happen
    // to have the right length usually sit above it. Walk windows upwards
    // and keep the first one whose check digits hold. Failing that, keep the
    // most plausible block, the lowest one on ties.
    fn decode_best_window(
        lines: &[String],
        block_len: usize,
        century_pivot: u8,
    ) -> Result<MrzFieldMap> {
        let mut fallback: Option<((bool, usize), MrzFieldMap)> = None;
        let mut last_error = None;

        for start in (0..=lines.len().saturating_sub(block_len)).rev() {
            let Some(window) = lines.get(start..start + block_len) else {
                break;
            };
            match MrzDecoder::decode_with_pivot(window, century_pivot) {
                Ok(fields) if fields.valid => return Ok(fields),
                Ok(fields) => {
                    let rank = Self::implausibility(&fields);
                    debug!("Window at line {} failed its checks, rank {:?}", start, rank);
                    if fallback.as_ref().map_or(true, |(best, _)| rank < *best) {
                        fallback = Some((rank, fields));
                    }
                }
                Err(e) => last_error = Some(e),
            }
        }

        match (fallback, last_error) {
            (Some((_, fields)), _) => Ok(fields),
            (None, Some(e)) => Err(e),
            (None, None) => Err(ScanError::InsufficientLines { found: lines.len() }),
        }
    }

    // Lower is better: a missing document code outweighs any number of
    // failed check digits
    fn implausibility(fields: &MrzFieldMap) -> (bool, usize) {
        (
            !FormatValidator::has_document_code(fields.format, &fields.document_code),
            fields.check_digits.failed().len(),
        )
    }

    pub fn scan_image(&self, image_data: &[u8], provider: &dyn OcrProvider) -> Result<NormalizedRecord> {
        // Step 1: Process the image
        let prepared = if self.config.preprocess {
            ImageProcessor::preprocess(image_data, self.config.binarize)?
        } else {
            image_data.to_vec()
        };

        // Step 2: OCR, any reported error ends the scan here
        info!("Running OCR with {}", provider.name());
        let text = provider.recognize(&prepared)?.into_text()?;

        // Step 3: Extract MRZ data
        self.scan(&text)
    }

    pub fn scan_file(&self, image_path: &Path, provider: &dyn OcrProvider) -> Result<NormalizedRecord> {
        let image_data = std::fs::read(image_path)?;
        self.scan_image(&image_data, provider)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LINE1: &str = "P<UTOERIKSSON<<ANNA<MARIA<<<<<<<<<<<<<<<<<<<";
    const LINE2: &str = "L898902C36UTO7408122F1204159ZE184226B<<<<<10";
    const BAD_LINE2: &str = "L898902C36UTO7408122F1204159ZE184226B<<<<<19";

    #[test]
    fn test_scan_specimen() {
        let text = format!("REPUBLIC OF UTOPIA\nPassport\n{}\n{}\n", LINE1, LINE2);
        let record = PassportScanner::default().scan(&text).unwrap();
        assert_eq!(record.surname, "ERIKSSON");
        assert_eq!(record.given_names, "ANNA");
        assert_eq!(record.date_of_birth, "Aug 12, 1974");
        assert!(record.valid);
    }

    #[test]
    fn test_single_line_is_insufficient() {
        let err = PassportScanner::default().scan(LINE1).unwrap_err();
        assert!(matches!(err, ScanError::InsufficientLines { found: 1 }));

        let err = PassportScanner::default().scan("no mrz here").unwrap_err();
        assert!(matches!(err, ScanError::InsufficientLines { found: 0 }));
    }

    #[test]
    fn test_checksum_failure_is_surfaced_not_fatal() {
        let text = format!("{}\n{}", LINE1, BAD_LINE2);
        let record = PassportScanner::default().scan(&text).unwrap();
        assert!(!record.valid);
        assert_eq!(record.failed_checks, vec!["composite"]);
        assert_eq!(record.document_number, "L898902C3");
    }

    #[test]
    fn test_strict_mode_rejects_checksum_failure() {
        let config = ScanConfig {
            require_valid_checksums: true,
            ..ScanConfig::default()
        };
        let text = format!("{}\n{}", LINE1, BAD_LINE2);
        match PassportScanner::new(config).scan(&text) {
            Err(ScanError::ChecksumMismatch(failed)) => assert_eq!(failed, vec!["composite"]),
            other => panic!("expected ChecksumMismatch, got {:?}", other.map(|r| r.valid)),
        }
    }

    #[test]
    fn test_strict_mode_still_decodes_and_normalizes() {
        let config = ScanConfig {
            require_valid_checksums: true,
            century_pivot: 10,
            ..ScanConfig::default()
        };
        let scanner = PassportScanner::new(config);
        let text = format!("{}\n{}", LINE1, BAD_LINE2);

        let fields = scanner.decode_text(&text).unwrap();
        let record = scanner.normalize(&fields);
        assert!(!record.valid);
        assert_eq!(record.surname, "ERIKSSON");
        assert_eq!(record.date_of_expiry, "Apr 15, 1912");
    }

    #[test]
    fn test_window_prefers_valid_block_nearest_the_bottom() {
        // A garbage 44-char line below the MRZ, and a broken copy above it
        let noise = "X".repeat(44);
        let text = format!("{}\n{}\n{}\n{}\n{}", LINE1, BAD_LINE2, LINE1, LINE2, noise);
        let fields = PassportScanner::default().decode_text(&text).unwrap();
        assert!(fields.valid);
        assert_eq!(fields.raw_mrz_lines, vec![LINE1.to_string(), LINE2.to_string()]);
    }

    #[test]
    fn test_window_falls_back_to_bottom_block() {
        let text = format!("{}\n{}\n{}", LINE1, LINE1, BAD_LINE2);
        let fields = PassportScanner::default().decode_text(&text).unwrap();
        assert!(!fields.valid);
        assert_eq!(fields.raw_mrz_lines[1], BAD_LINE2);
    }

    #[test]
    fn test_fallback_skips_junk_line_below_mrz() {
        // One misread composite digit, then a junk line of the right length
        let noise = "X".repeat(44);
        let text = format!("{}\n{}\n{}", LINE1, BAD_LINE2, noise);
        let record = PassportScanner::default().scan(&text).unwrap();

        assert!(!record.valid);
        assert_eq!(record.document_type, "P");
        assert_eq!(record.surname, "ERIKSSON");
        assert_eq!(record.document_number, "L898902C3");
        assert_eq!(record.failed_checks, vec!["composite"]);
    }

    #[test]
    fn test_fallback_prefers_fewer_failed_checks() {
        // Both blocks start with P; the upper one only has a bad composite
        let worse = LINE2.replacen("740812", "740813", 1);
        let text = format!("{}\n{}\n{}\n{}", LINE1, BAD_LINE2, LINE1, worse);
        let fields = PassportScanner::default().decode_text(&text).unwrap();
        assert_eq!(fields.raw_mrz_lines[1], BAD_LINE2);
        assert_eq!(fields.check_digits.failed(), vec!["composite"]);
    }

    #[test]
    fn test_full_mrz_line_joins_every_candidate() {
        let stray = "Z".repeat(44);
        let text = format!("{}\n{}\n{}", stray, LINE1, LINE2);
        let record = PassportScanner::default().scan(&text).unwrap();

        assert!(record.valid);
        assert_eq!(record.surname, "ERIKSSON");
        assert_eq!(record.full_mrz_line, format!("{}{}{}", stray, LINE1, LINE2));
        assert_eq!(record.full_mrz_line.len(), 132);
    }
}
