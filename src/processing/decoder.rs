use log::{debug, warn};

use crate::models::{DocumentFormat, MrzFieldMap, ValidationIssue, ValidationIssueType};
use crate::processing::normalizer::DEFAULT_CENTURY_PIVOT;
use crate::utils::{Result, ScanError};
use crate::validation::{FormatValidator, MrzValidator};

/// Decodes a two-line MRZ block (TD3 passport or TD2 card) into raw fields.
pub struct MrzDecoder;

impl MrzDecoder {
    pub fn decode(lines: &[String]) -> Result<MrzFieldMap> {
        Self::decode_with_pivot(lines, DEFAULT_CENTURY_PIVOT)
    }

    /// Like [`MrzDecoder::decode`], with date plausibility checked under the
    /// given century pivot.
    pub fn decode_with_pivot(lines: &[String], century_pivot: u8) -> Result<MrzFieldMap> {
        if lines.len() < 2 {
            return Err(ScanError::InsufficientLines { found: lines.len() });
        }

        let format = Self::layout_of(lines)?;
        let line1 = lines[0].as_str();
        let line2 = lines[1].as_str();

        // Line 1: positions 1-2 document code, 3-5 issuing country, 6-end name
        let document_code = strip_fillers(&line1[0..2]);
        let country_code = strip_fillers(&line1[2..5]);
        let (last_name, first_name) = Self::split_name(&line1[5..]);

        // Line 2: 1-9 document number, 10 check, 11-13 nationality,
        // 14-19 birth date, 20 check, 21 sex, 22-27 expiry, 28 check
        let document_number = strip_fillers(&line2[0..9]);
        let nationality = strip_fillers(&line2[10..13]);
        let birth_date = line2[13..19].to_string();
        let sex = line2[20..21].to_string();
        let expiration_date = line2[21..27].to_string();

        let (personal_number, optional_data) = match format {
            // 29-42 personal number, 43 check, 44 composite
            DocumentFormat::TD3 => (non_empty(strip_fillers(&line2[28..42])), None),
            // 29-35 optional data, 36 composite
            DocumentFormat::TD2 => (None, non_empty(strip_fillers(&line2[28..35]))),
        };

        let check_digits = MrzValidator::check_digits(format, line2);
        let valid = check_digits.all_valid();
        let checksum_issues: Vec<ValidationIssue> = check_digits
            .iter()
            .filter(|check| !check.valid)
            .map(|check| ValidationIssue {
                issue_type: ValidationIssueType::Checksum,
                message: format!(
                    "{} check digit is '{}', expected '{}'",
                    check.field.as_str(),
                    check.embedded,
                    check.computed
                ),
            })
            .collect();

        let mut fields = MrzFieldMap {
            format,
            document_code,
            country_code,
            document_number,
            last_name,
            first_name,
            nationality,
            birth_date,
            sex,
            expiration_date,
            personal_number,
            optional_data,
            issue_date: None,
            check_digits,
            valid,
            issues: checksum_issues,
            raw_mrz_lines: lines.to_vec(),
            candidate_lines: lines.to_vec(),
        };

        let format_issues = FormatValidator::validate(&fields, century_pivot);
        fields.issues.extend(format_issues);

        if valid {
            debug!("Decoded {} MRZ, all check digits match", format.name());
        } else {
            warn!(
                "Decoded {} MRZ with failed check digits: {:?}",
                format.name(),
                fields.check_digits.failed()
            );
        }

        Ok(fields)
    }

    fn layout_of(lines: &[String]) -> Result<DocumentFormat> {
        let format = DocumentFormat::from_line_length(lines[0].len()).ok_or_else(|| {
            ScanError::InvalidMrz(format!("unsupported line length {}", lines[0].len()))
        })?;

        if lines.len() != format.mrz_lines() {
            return Err(ScanError::InvalidMrz(format!(
                "{} expects {} lines, got {}",
                format.name(),
                format.mrz_lines(),
                lines.len()
            )));
        }

        for (i, line) in lines.iter().enumerate() {
            if line.len() != format.mrz_chars_per_line() {
                return Err(ScanError::InvalidMrz(format!(
                    "line {} has {} characters, {} expects {}",
                    i + 1,
                    line.len(),
                    format.name(),
                    format.mrz_chars_per_line()
                )));
            }
            if let Some(c) = line.chars().find(|&c| MrzValidator::char_value(c).is_none()) {
                return Err(ScanError::InvalidMrz(format!(
                    "line {} contains '{}' outside the MRZ alphabet",
                    i + 1,
                    c
                )));
            }
        }

        Ok(format)
    }

    // Surname and given names are separated by the first double filler
    fn split_name(name_field: &str) -> (String, String) {
        match name_field.split_once("<<") {
            Some((surname, given)) => (fillers_to_spaces(surname), fillers_to_spaces(given)),
            None => (fillers_to_spaces(name_field), String::new()),
        }
    }
}

fn strip_fillers(field: &str) -> String {
    field.trim_end_matches('<').to_string()
}

fn fillers_to_spaces(field: &str) -> String {
    field
        .split('<')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}
