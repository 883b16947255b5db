use lazy_static::lazy_static;
use log::debug;
use regex::Regex;

use crate::models::DocumentFormat;

lazy_static! {
    // Everything outside the MRZ alphabet, case-sensitive
    static ref NON_MRZ_CHARS: Regex = Regex::new(r"[^A-Z0-9<]").unwrap();
}

pub struct LineSanitizer;

impl LineSanitizer {
    /// Strip each line of raw OCR text down to the MRZ alphabet and keep the
    /// lines whose cleaned length is exactly the line length of `format`.
    /// Order is preserved and duplicates are kept.
    pub fn sanitize(raw_text: &str, format: DocumentFormat) -> Vec<String> {
        let line_length = format.mrz_chars_per_line();

        raw_text
            .split('\n')
            .map(Self::clean_line)
            .filter(|line| line.len() == line_length)
            .collect()
    }

    /// Try each supported format, passports first, and return the first one
    /// for which at least two candidate lines survive.
    pub fn detect(raw_text: &str) -> Option<(DocumentFormat, Vec<String>)> {
        for format in DocumentFormat::ALL {
            let lines = Self::sanitize(raw_text, format);
            debug!("{} candidate lines: {:?}", format.name(), lines);
            if lines.len() >= format.mrz_lines() {
                return Some((format, lines));
            }
        }
        None
    }

    fn clean_line(line: &str) -> String {
        NON_MRZ_CHARS.replace_all(line, "").into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOISY_PASSPORT: &str = "PASSPORT  PASSEPORT\n\
        Surname / Nom  ERIKSSON\n\
        P<UTOERIKSSON<<ANNA<MARIA<<<<<<<<<<<<<<<<<<<  \r\n\
        L898902C36 UTO7408122F1204159ZE184226B<<<<<10.\n";

    #[test]
    fn test_sanitize_strips_noise_and_filters_length() {
        let lines = LineSanitizer::sanitize(NOISY_PASSPORT, DocumentFormat::TD3);
        assert_eq!(
            lines,
            vec![
                "P<UTOERIKSSON<<ANNA<MARIA<<<<<<<<<<<<<<<<<<<".to_string(),
                "L898902C36UTO7408122F1204159ZE184226B<<<<<10".to_string(),
            ]
        );
    }

    #[test]
    fn test_sanitize_output_is_mrz_alphabet_with_exact_length() {
        let raw = "ab<<CD12\n\u{00c9}L\u{00e8}ve  <<<<\nP<UTO\u{2014}ERIKSSON<<ANNA<MARIA<<<<<<<<<<<<<<<<<<<xyz\n\t\n";
        for format in DocumentFormat::ALL {
            for line in LineSanitizer::sanitize(raw, format) {
                assert_eq!(line.len(), format.mrz_chars_per_line());
                assert!(line
                    .chars()
                    .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '<'));
            }
        }
    }

    #[test]
    fn test_lowercase_is_dropped_per_character() {
        // Lowercase letters vanish, shortening the line below 44
        let raw = "P<UTOEriksson<<ANNA<MARIA<<<<<<<<<<<<<<<<<<<";
        assert!(LineSanitizer::sanitize(raw, DocumentFormat::TD3).is_empty());
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        let once = LineSanitizer::sanitize(NOISY_PASSPORT, DocumentFormat::TD3);
        let twice = LineSanitizer::sanitize(&once.join("\n"), DocumentFormat::TD3);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_duplicates_are_kept_in_order() {
        let line = "L898902C36UTO7408122F1204159ZE184226B<<<<<10";
        let raw = format!("{line}\nnoise\n{line}");
        assert_eq!(LineSanitizer::sanitize(&raw, DocumentFormat::TD3).len(), 2);
    }

    #[test]
    fn test_no_qualifying_lines_is_empty() {
        assert!(LineSanitizer::sanitize("", DocumentFormat::TD3).is_empty());
        assert!(LineSanitizer::sanitize("hello world", DocumentFormat::TD2).is_empty());
    }

    #[test]
    fn test_detect_prefers_passport_then_card() {
        let (format, lines) = LineSanitizer::detect(NOISY_PASSPORT).unwrap();
        assert_eq!(format, DocumentFormat::TD3);
        assert_eq!(lines.len(), 2);

        let card = "I<UTOERIKSSON<<ANNA<MARIA<<<<<<<<<<<\nD231458907UTO7408122F1204159<<<<<<<6";
        let (format, _) = LineSanitizer::detect(card).unwrap();
        assert_eq!(format, DocumentFormat::TD2);

        assert!(LineSanitizer::detect("P<UTOERIKSSON<<ANNA<MARIA<<<<<<<<<<<<<<<<<<<").is_none());
    }
}
