use chrono::NaiveDate;
use serde::Deserialize;

use crate::models::{MrzFieldMap, NormalizedRecord};

/// Two-digit years below this pivot are read as 20YY, the rest as 19YY.
pub const DEFAULT_CENTURY_PIVOT: u8 = 50;

const DISPLAY_DATE_FORMAT: &str = "%b %d, %Y";

/// How much of the given names ends up in the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GivenNamePolicy {
    /// Only the first given name ("ANNA MARIA" becomes "ANNA").
    #[default]
    FirstToken,
    /// Every given name, space separated.
    Full,
}

pub struct FieldNormalizer {
    century_pivot: u8,
    given_names: GivenNamePolicy,
}

impl Default for FieldNormalizer {
    fn default() -> Self {
        Self::new(DEFAULT_CENTURY_PIVOT, GivenNamePolicy::FirstToken)
    }
}

impl FieldNormalizer {
    pub fn new(century_pivot: u8, given_names: GivenNamePolicy) -> Self {
        FieldNormalizer {
            century_pivot,
            given_names,
        }
    }

    pub fn normalize(&self, fields: &MrzFieldMap) -> NormalizedRecord {
        NormalizedRecord {
            format: fields.format,
            document_type: fields.document_code.clone(),
            country_code: fields.country_code.clone(),
            document_number: fields.document_number.clone(),
            surname: fields.last_name.clone(),
            given_names: self.given_names(&fields.first_name),
            nationality: fields.nationality.clone(),
            personal_number: fields.personal_number.clone(),
            optional_data: fields.optional_data.clone(),
            sex: Self::display_sex(&fields.sex),
            date_of_expiry: self.format_date(&fields.expiration_date),
            date_of_birth: self.format_date(&fields.birth_date),
            date_of_issue: fields.issue_date.as_deref().map(|date| self.format_date(date)),
            valid: fields.valid,
            failed_checks: fields.check_digits.failed(),
            issues: fields.issues.clone(),
            full_mrz_line: fields.candidate_lines.concat(),
        }
    }

    fn given_names(&self, first_name: &str) -> String {
        let cleaned = first_name.replace('<', " ");
        match self.given_names {
            GivenNamePolicy::FirstToken => cleaned
                .split_whitespace()
                .next()
                .unwrap_or_default()
                .to_string(),
            GivenNamePolicy::Full => cleaned.split_whitespace().collect::<Vec<_>>().join(" "),
        }
    }

    fn display_sex(sex: &str) -> String {
        match sex {
            "<" => "X".to_string(),
            other => other.to_string(),
        }
    }

    /// `YYMMDD` to e.g. `Aug 12, 1974`. Anything that is not a six digit
    /// calendar date comes back unchanged.
    pub fn format_date(&self, raw: &str) -> String {
        match Self::parse_mrz_date(raw, self.century_pivot) {
            Some(date) => date.format(DISPLAY_DATE_FORMAT).to_string(),
            None => raw.to_string(),
        }
    }

    pub fn parse_mrz_date(raw: &str, century_pivot: u8) -> Option<NaiveDate> {
        if raw.len() != 6 || !raw.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }

        let year: i32 = raw[0..2].parse().ok()?;
        let month: u32 = raw[2..4].parse().ok()?;
        let day: u32 = raw[4..6].parse().ok()?;

        let full_year = if year < i32::from(century_pivot) {
            2000 + year
        } else {
            1900 + year
        };

        NaiveDate::from_ymd_opt(full_year, month, day)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::MrzDecoder;
    use chrono::Datelike;

    fn specimen() -> MrzFieldMap {
        MrzDecoder::decode(&[
            "P<UTOERIKSSON<<ANNA<MARIA<<<<<<<<<<<<<<<<<<<".to_string(),
            "L898902C36UTO7408122F1204159ZE184226B<<<<<10".to_string(),
        ])
        .unwrap()
    }

    #[test]
    fn test_birth_date_1900s() {
        let date = FieldNormalizer::parse_mrz_date("740812", DEFAULT_CENTURY_PIVOT).unwrap();
        assert_eq!((date.year(), date.month(), date.day()), (1974, 8, 12));
        assert_eq!(FieldNormalizer::default().format_date("740812"), "Aug 12, 1974");
    }

    #[test]
    fn test_birth_date_2000s() {
        let date = FieldNormalizer::parse_mrz_date("050101", DEFAULT_CENTURY_PIVOT).unwrap();
        assert_eq!((date.year(), date.month()), (2005, 1));
        assert_eq!(FieldNormalizer::default().format_date("050101"), "Jan 01, 2005");
    }

    #[test]
    fn test_century_pivot_boundary() {
        let normalizer = FieldNormalizer::default();
        assert_eq!(normalizer.format_date("491231"), "Dec 31, 2049");
        assert_eq!(normalizer.format_date("500101"), "Jan 01, 1950");

        let custom = FieldNormalizer::new(30, GivenNamePolicy::FirstToken);
        assert_eq!(custom.format_date("350101"), "Jan 01, 1935");
    }

    #[test]
    fn test_unparseable_dates_pass_through() {
        let normalizer = FieldNormalizer::default();
        assert_eq!(normalizer.format_date("7408"), "7408");
        assert_eq!(normalizer.format_date("74O812"), "74O812");
        assert_eq!(normalizer.format_date("741312"), "741312");
        assert_eq!(normalizer.format_date(""), "");
    }

    #[test]
    fn test_normalize_specimen() {
        let record = FieldNormalizer::default().normalize(&specimen());

        assert_eq!(record.document_type, "P");
        assert_eq!(record.surname, "ERIKSSON");
        assert_eq!(record.given_names, "ANNA");
        assert_eq!(record.document_number, "L898902C3");
        assert_eq!(record.sex, "F");
        assert_eq!(record.date_of_birth, "Aug 12, 1974");
        assert_eq!(record.date_of_expiry, "Apr 15, 2012");
        assert_eq!(record.date_of_issue, None);
        assert_eq!(record.personal_number.as_deref(), Some("ZE184226B"));
        assert!(record.valid);
        assert!(record.failed_checks.is_empty());
        assert_eq!(
            record.full_mrz_line,
            "P<UTOERIKSSON<<ANNA<MARIA<<<<<<<<<<<<<<<<<<<L898902C36UTO7408122F1204159ZE184226B<<<<<10"
        );
    }

    #[test]
    fn test_full_given_names_policy() {
        let normalizer = FieldNormalizer::new(DEFAULT_CENTURY_PIVOT, GivenNamePolicy::Full);
        assert_eq!(normalizer.normalize(&specimen()).given_names, "ANNA MARIA");
    }

    #[test]
    fn test_issue_date_is_formatted_when_present() {
        let mut fields = specimen();
        fields.issue_date = Some("020415".to_string());
        let record = FieldNormalizer::default().normalize(&fields);
        assert_eq!(record.date_of_issue.as_deref(), Some("Apr 15, 2002"));
    }

    #[test]
    fn test_unspecified_sex_and_grid_excludes_mrz_line() {
        let mut fields = specimen();
        fields.sex = "<".to_string();
        let record = FieldNormalizer::default().normalize(&fields);
        assert_eq!(record.sex, "X");

        let grid = record.fields();
        assert!(grid.iter().any(|(label, value)| *label == "Passport No"
            && *value == Some("L898902C3")));
        assert!(grid.iter().all(|(label, _)| *label != "Full MRZ Line"));
    }
}
