use crate::models::{DocumentFormat, MrzFieldMap, ValidationIssue, ValidationIssueType};
use crate::processing::normalizer::FieldNormalizer;

pub struct FormatValidator;

impl FormatValidator {
    /// Field-level plausibility checks. These never change the checksum
    /// verdict; they only describe what looks wrong. Dates are read with
    /// the same century pivot the normalizer displays them with.
    pub fn validate(fields: &MrzFieldMap, century_pivot: u8) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();

        if !Self::has_document_code(fields.format, &fields.document_code) {
            issues.push(ValidationIssue {
                issue_type: ValidationIssueType::Format,
                message: format!(
                    "Invalid document code '{}' for format {}",
                    fields.document_code,
                    fields.format.name()
                ),
            });
        }

        for (label, code) in [
            ("Issuing country", &fields.country_code),
            ("Nationality", &fields.nationality),
        ] {
            if code.is_empty() || !code.chars().all(|c| c.is_ascii_uppercase()) {
                issues.push(ValidationIssue {
                    issue_type: ValidationIssueType::Format,
                    message: format!("{} code '{}' is not alphabetic", label, code),
                });
            }
        }

        if fields.document_number.is_empty() {
            issues.push(ValidationIssue {
                issue_type: ValidationIssueType::Format,
                message: "Document number is missing".to_string(),
            });
        }

        if fields.last_name.is_empty() {
            issues.push(ValidationIssue {
                issue_type: ValidationIssueType::Format,
                message: "Surname is missing".to_string(),
            });
        }

        if !matches!(fields.sex.as_str(), "M" | "F" | "<") {
            issues.push(ValidationIssue {
                issue_type: ValidationIssueType::Format,
                message: format!("Invalid sex '{}'", fields.sex),
            });
        }

        for (label, date) in [
            ("Birth date", &fields.birth_date),
            ("Expiration date", &fields.expiration_date),
        ] {
            if FieldNormalizer::parse_mrz_date(date, century_pivot).is_none() {
                issues.push(ValidationIssue {
                    issue_type: ValidationIssueType::Date,
                    message: format!("{} '{}' is not a calendar date", label, date),
                });
            }
        }

        issues
    }

    pub fn has_document_code(format: DocumentFormat, document_code: &str) -> bool {
        document_code
            .chars()
            .next()
            .is_some_and(|c| format.document_codes().contains(&c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::{MrzDecoder, DEFAULT_CENTURY_PIVOT};

    fn specimen() -> MrzFieldMap {
        MrzDecoder::decode(&[
            "P<UTOERIKSSON<<ANNA<MARIA<<<<<<<<<<<<<<<<<<<".to_string(),
            "L898902C36UTO7408122F1204159ZE184226B<<<<<10".to_string(),
        ])
        .unwrap()
    }

    fn date_issues(fields: &MrzFieldMap, century_pivot: u8) -> usize {
        FormatValidator::validate(fields, century_pivot)
            .iter()
            .filter(|issue| issue.issue_type == ValidationIssueType::Date)
            .count()
    }

    #[test]
    fn test_specimen_has_no_issues() {
        assert!(FormatValidator::validate(&specimen(), DEFAULT_CENTURY_PIVOT).is_empty());
    }

    #[test]
    fn test_leap_day_follows_century_pivot() {
        // 29 Feb 2000 exists, 29 Feb 1900 does not
        let mut fields = specimen();
        fields.birth_date = "000229".to_string();

        assert_eq!(date_issues(&fields, DEFAULT_CENTURY_PIVOT), 0);
        assert_eq!(date_issues(&fields, 0), 1);
    }

    #[test]
    fn test_document_code_per_format() {
        assert!(FormatValidator::has_document_code(DocumentFormat::TD3, "P"));
        assert!(FormatValidator::has_document_code(DocumentFormat::TD2, "ID"));
        assert!(!FormatValidator::has_document_code(DocumentFormat::TD3, "L8"));
        assert!(!FormatValidator::has_document_code(DocumentFormat::TD2, ""));
    }
}
