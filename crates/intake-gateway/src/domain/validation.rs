//! Submission validation.
//!
//! Checks run in a fixed order and stop at the first failure:
//!
//! 1. Required-field presence
//! 2. Email shape (`local@domain.tld`)
//! 3. Phone number (10 digits after stripping formatting)
//! 4. Birth date is a real date and the applicant is of age
//! 5. Postal code (5 digits)
//! 6. SSN (9 digits, no separators)
//! 7. Birth date written as zero-padded `YYYY-MM-DD`
//! 8. State (2 uppercase letters)
//! 9. Country (`US` only)
//!
//! A birth date that is not a date at all (`1990-13-01`, `05/20/1990`) is a
//! malformed body rather than a rule violation. One that is a date but not
//! zero-padded (`1990-1-1`) is reported by step 7.
//!
//! Everything here is pure: the current date is passed in by the caller.

use super::fields::{
    required_fields, ADDRESS_COUNTRY_CODE, ADDRESS_POSTAL_CODE, ADDRESS_STATE, BIRTH_DATE,
    DOCUMENT_SSN, EMAIL_ADDRESS, PHONE_NUMBER,
};
use super::submission::Submission;
use chrono::{Datelike, NaiveDate};

/// Minimum applicant age in whole years
pub const MIN_AGE_YEARS: i32 = 18;
/// Digits in a US phone number
pub const PHONE_DIGITS: usize = 10;
/// Digits in a US ZIP code
pub const POSTAL_CODE_DIGITS: usize = 5;
/// Digits in an SSN
pub const SSN_DIGITS: usize = 9;
/// Only accepted country code
pub const SUPPORTED_COUNTRY: &str = "US";

/// Reason a submission was rejected. `Display` is the caller-facing message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Missing required field: {label}")]
    MissingField { key: &'static str, label: &'static str },

    #[error("Invalid email format")]
    InvalidEmail,

    #[error("Phone number must be 10 digits")]
    InvalidPhone,

    #[error("Invalid data format")]
    UnparsableBirthDate,

    #[error("Date of Birth must be in YYYY-MM-DD format")]
    InvalidBirthDate,

    #[error("Must be at least 18 years old")]
    Underage,

    #[error("Postal code must be 5 digits")]
    InvalidPostalCode,

    #[error("SSN must be exactly 9 digits with no dashes")]
    InvalidSsn,

    #[error("State must be a 2-letter code (e.g., NY, CA)")]
    InvalidState,

    #[error("Country must be 'US'")]
    InvalidCountry,
}

/// Validate a submission against all rules, as of `today`
pub fn validate_submission(
    submission: &Submission,
    today: NaiveDate,
) -> Result<(), ValidationError> {
    for field in required_fields() {
        if submission.get_non_empty(field.key).is_none() {
            return Err(ValidationError::MissingField {
                key: field.key,
                label: field.label,
            });
        }
    }

    if let Some(email) = submission.get(EMAIL_ADDRESS) {
        if !is_valid_email(email) {
            return Err(ValidationError::InvalidEmail);
        }
    }

    if let Some(phone) = submission.get(PHONE_NUMBER) {
        if normalize_phone(phone).len() != PHONE_DIGITS {
            return Err(ValidationError::InvalidPhone);
        }
    }

    if let Some(raw) = submission.get(BIRTH_DATE) {
        let birth = parse_birth_date(raw)?;
        if age_on(birth, today) < MIN_AGE_YEARS {
            return Err(ValidationError::Underage);
        }
    }

    if let Some(postal) = submission.get(ADDRESS_POSTAL_CODE) {
        if !is_digits(postal, POSTAL_CODE_DIGITS) {
            return Err(ValidationError::InvalidPostalCode);
        }
    }

    if let Some(ssn) = submission.get(DOCUMENT_SSN) {
        if !is_digits(ssn, SSN_DIGITS) {
            return Err(ValidationError::InvalidSsn);
        }
    }

    if let Some(raw) = submission.get(BIRTH_DATE) {
        if !is_canonical_date(raw) {
            return Err(ValidationError::InvalidBirthDate);
        }
    }

    if let Some(state) = submission.get(ADDRESS_STATE) {
        if !is_state_code(state) {
            return Err(ValidationError::InvalidState);
        }
    }

    if let Some(country) = submission.get(ADDRESS_COUNTRY_CODE) {
        if country != SUPPORTED_COUNTRY {
            return Err(ValidationError::InvalidCountry);
        }
    }

    Ok(())
}

/// `local@domain.tld`: no whitespace, exactly one `@`, and a dot in the
/// domain with at least one character on each side.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }

    let chars: Vec<char> = domain.chars().collect();
    chars.len() >= 3 && chars[1..chars.len() - 1].contains(&'.')
}

/// Keep only the ASCII digits of a phone number
pub fn normalize_phone(phone: &str) -> String {
    phone.chars().filter(char::is_ascii_digit).collect()
}

/// Parse `YYYY-M-D`: four-digit year, one- or two-digit month and day
pub fn parse_birth_date(raw: &str) -> Result<NaiveDate, ValidationError> {
    let mut parts = raw.split('-');
    let (Some(year), Some(month), Some(day), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(ValidationError::UnparsableBirthDate);
    };

    let digits = |part: &str, min: usize, max: usize| {
        (min..=max).contains(&part.len()) && part.bytes().all(|b| b.is_ascii_digit())
    };
    if !(digits(year, 4, 4) && digits(month, 1, 2) && digits(day, 1, 2)) {
        return Err(ValidationError::UnparsableBirthDate);
    }

    let (Ok(year), Ok(month), Ok(day)) = (year.parse::<i32>(), month.parse::<u32>(), day.parse::<u32>()) else {
        return Err(ValidationError::UnparsableBirthDate);
    };
    NaiveDate::from_ymd_opt(year, month, day).ok_or(ValidationError::UnparsableBirthDate)
}

/// Zero-padded `YYYY-MM-DD` shape
pub fn is_canonical_date(raw: &str) -> bool {
    let bytes = raw.as_bytes();
    bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        })
}

/// Age in completed years on `today`
pub fn age_on(birth: NaiveDate, today: NaiveDate) -> i32 {
    let mut age = today.year() - birth.year();
    if (today.month(), today.day()) < (birth.month(), birth.day()) {
        age -= 1;
    }
    age
}

fn is_digits(value: &str, len: usize) -> bool {
    value.len() == len && value.bytes().all(|b| b.is_ascii_digit())
}

fn is_state_code(value: &str) -> bool {
    value.len() == 2 && value.bytes().all(|b| b.is_ascii_uppercase())
}
