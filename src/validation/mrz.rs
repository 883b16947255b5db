use crate::models::{CheckDigitResult, CheckDigits, CheckedField, DocumentFormat};

// ICAO Doc 9303 part 3, 4.9: weights repeat 7, 3, 1 from the first character
const WEIGHTS: [u32; 3] = [7, 3, 1];

pub struct MrzValidator;

impl MrzValidator {
    /// Numeric value of an MRZ character: digits as themselves, `A`-`Z` as
    /// 10-35, the filler as 0. Anything else has no value.
    pub fn char_value(c: char) -> Option<u32> {
        match c {
            '0'..='9' => c.to_digit(10),
            'A'..='Z' => Some(c as u32 - 'A' as u32 + 10),
            '<' => Some(0),
            _ => None,
        }
    }

    pub fn compute_check_digit(data: &str) -> u8 {
        let sum: u32 = data
            .chars()
            .zip(WEIGHTS.iter().cycle())
            .map(|(c, weight)| Self::char_value(c).unwrap_or(0) * weight)
            .sum();

        (sum % 10) as u8
    }

    pub fn verify(field: CheckedField, data: &str, embedded: char) -> CheckDigitResult {
        let computed = Self::compute_check_digit(data);

        let valid = match embedded.to_digit(10) {
            Some(digit) => digit == computed as u32,
            // An unused optional field may carry a filler instead of a zero
            None => embedded == '<' && computed == 0 && data.chars().all(|c| c == '<'),
        };

        CheckDigitResult {
            field,
            embedded,
            computed,
            valid,
        }
    }

    /// Verify every check digit on the second MRZ line. The line must
    /// already have the exact length of `format`.
    pub fn check_digits(format: DocumentFormat, line2: &str) -> CheckDigits {
        let chars: Vec<char> = line2.chars().collect();
        let digit_at = |pos: usize| chars.get(pos).copied().unwrap_or('<');

        let document_number = Self::verify(CheckedField::DocumentNumber, &line2[0..9], digit_at(9));
        let birth_date = Self::verify(CheckedField::BirthDate, &line2[13..19], digit_at(19));
        let expiration_date =
            Self::verify(CheckedField::ExpirationDate, &line2[21..27], digit_at(27));

        let (personal_number, composite_end) = match format {
            DocumentFormat::TD3 => (
                Some(Self::verify(
                    CheckedField::PersonalNumber,
                    &line2[28..42],
                    digit_at(42),
                )),
                43,
            ),
            DocumentFormat::TD2 => (None, 35),
        };

        let composite_data = format!(
            "{}{}{}",
            &line2[0..10],
            &line2[13..20],
            &line2[21..composite_end]
        );
        let composite = Self::verify(CheckedField::Composite, &composite_data, digit_at(composite_end));

        CheckDigits {
            document_number,
            birth_date,
            expiration_date,
            personal_number,
            composite,
        }
    }
}
