use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentFormat {
    TD2, // ID card, 2 x 36
    TD3, // Passport, 2 x 44
}

impl DocumentFormat {
    // Detection order: passports first, the 36-char card layout second
    pub const ALL: [DocumentFormat; 2] = [DocumentFormat::TD3, DocumentFormat::TD2];

    /// Leading document code letters allowed on line 1.
    pub fn document_codes(&self) -> &'static [char] {
        match self {
            DocumentFormat::TD2 => &['A', 'C', 'I'],
            DocumentFormat::TD3 => &['P'],
        }
    }

    pub fn mrz_lines(&self) -> usize {
        match self {
            DocumentFormat::TD2 => 2,
            DocumentFormat::TD3 => 2,
        }
    }

    pub fn mrz_chars_per_line(&self) -> usize {
        match self {
            DocumentFormat::TD2 => 36,
            DocumentFormat::TD3 => 44,
        }
    }

    pub fn from_line_length(len: usize) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|format| format.mrz_chars_per_line() == len)
    }

    pub fn name(&self) -> &'static str {
        match self {
            DocumentFormat::TD2 => "TD2",
            DocumentFormat::TD3 => "TD3",
        }
    }
}

/// The fields protected by a check digit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckedField {
    DocumentNumber,
    BirthDate,
    ExpirationDate,
    PersonalNumber,
    Composite,
}

impl CheckedField {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckedField::DocumentNumber => "document_number",
            CheckedField::BirthDate => "birth_date",
            CheckedField::ExpirationDate => "expiration_date",
            CheckedField::PersonalNumber => "personal_number",
            CheckedField::Composite => "composite",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckDigitResult {
    pub field: CheckedField,
    /// The digit printed in the MRZ (may be `<` or a misread letter).
    pub embedded: char,
    pub computed: u8,
    pub valid: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckDigits {
    pub document_number: CheckDigitResult,
    pub birth_date: CheckDigitResult,
    pub expiration_date: CheckDigitResult,
    // TD2 has no personal number check digit
    pub personal_number: Option<CheckDigitResult>,
    pub composite: CheckDigitResult,
}

impl CheckDigits {
    pub fn iter(&self) -> impl Iterator<Item = &CheckDigitResult> {
        [
            Some(&self.document_number),
            Some(&self.birth_date),
            Some(&self.expiration_date),
            self.personal_number.as_ref(),
            Some(&self.composite),
        ]
        .into_iter()
        .flatten()
    }

    pub fn all_valid(&self) -> bool {
        self.iter().all(|check| check.valid)
    }

    pub fn failed(&self) -> Vec<&'static str> {
        self.iter()
            .filter(|check| !check.valid)
            .map(|check| check.field.as_str())
            .collect()
    }
}

/// Raw fields decoded from an MRZ block, still in their fixed-width encodings
/// (dates as `YYMMDD`, sex as a single character).
#[derive(Debug, Clone, Serialize)]
pub struct MrzFieldMap {
    pub format: DocumentFormat,
    pub document_code: String,
    pub country_code: String,
    pub document_number: String,
    pub last_name: String,
    /// All given names, fillers turned into single spaces.
    pub first_name: String,
    pub nationality: String,
    pub birth_date: String,
    pub sex: String,
    pub expiration_date: String,
    pub personal_number: Option<String>,
    pub optional_data: Option<String>,
    // Neither TD2 nor TD3 encodes an issue date
    pub issue_date: Option<String>,
    pub check_digits: CheckDigits,
    pub valid: bool,
    pub issues: Vec<ValidationIssue>,
    /// The two lines this map was decoded from.
    pub raw_mrz_lines: Vec<String>,
    /// Every sanitized candidate line in reading order, including any that
    /// were not part of the decoded block.
    pub candidate_lines: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationIssue {
    pub issue_type: ValidationIssueType,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ValidationIssueType {
    Checksum,
    Format,
    Date,
}

impl ValidationIssueType {
    pub fn label(&self) -> &'static str {
        match self {
            ValidationIssueType::Checksum => "CHECKSUM",
            ValidationIssueType::Format => "FORMAT",
            ValidationIssueType::Date => "DATE",
        }
    }
}

/// Display-ready record produced from an [`MrzFieldMap`].
#[derive(Debug, Clone, Serialize)]
pub struct NormalizedRecord {
    pub format: DocumentFormat,
    pub document_type: String,
    pub country_code: String,
    pub document_number: String,
    pub surname: String,
    pub given_names: String,
    pub nationality: String,
    pub personal_number: Option<String>,
    pub optional_data: Option<String>,
    pub sex: String,
    pub date_of_expiry: String,
    pub date_of_birth: String,
    pub date_of_issue: Option<String>,
    pub valid: bool,
    pub failed_checks: Vec<&'static str>,
    pub issues: Vec<ValidationIssue>,
    pub full_mrz_line: String,
}

impl NormalizedRecord {
    /// Labelled fields for the primary display grid. The full MRZ line is
    /// left out and shown separately.
    pub fn fields(&self) -> Vec<(&'static str, Option<&str>)> {
        let number_label = match self.format {
            DocumentFormat::TD3 => "Passport No",
            DocumentFormat::TD2 => "Document No",
        };

        let mut fields = vec![
            ("Type", Some(self.document_type.as_str())),
            ("Country Code", Some(self.country_code.as_str())),
            (number_label, Some(self.document_number.as_str())),
            ("Surname", Some(self.surname.as_str())),
            ("Given Names", Some(self.given_names.as_str())),
            ("Nationality", Some(self.nationality.as_str())),
        ];

        match self.format {
            DocumentFormat::TD3 => fields.push(("Personal No", self.personal_number.as_deref())),
            DocumentFormat::TD2 => fields.push(("Optional Data", self.optional_data.as_deref())),
        }

        fields.extend([
            ("Sex", Some(self.sex.as_str())),
            ("Date of Expiry", Some(self.date_of_expiry.as_str())),
            ("Date of Birth", Some(self.date_of_birth.as_str())),
            ("Date of Issue", self.date_of_issue.as_deref()),
        ]);

        fields
    }
}
