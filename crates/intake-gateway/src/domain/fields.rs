//! Submission field registry.
//!
//! Every key the gateway knows about lives in [`FIELDS`], in the order the
//! presence check walks them. Display labels in validation messages come from
//! the same table.

use std::collections::HashMap;
use std::sync::LazyLock;

/// Metadata for one submission field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldInfo {
    /// Key in the inbound JSON object (and in the provider payload)
    pub key: &'static str,
    /// Human-readable label used in error messages
    pub label: &'static str,
    /// Whether the field must be present and non-empty
    pub required: bool,
}

impl FieldInfo {
    const fn required(key: &'static str, label: &'static str) -> Self {
        Self {
            key,
            label,
            required: true,
        }
    }

    const fn optional(key: &'static str, label: &'static str) -> Self {
        Self {
            key,
            label,
            required: false,
        }
    }
}

pub const NAME_FIRST: &str = "name_first";
pub const NAME_LAST: &str = "name_last";
pub const EMAIL_ADDRESS: &str = "email_address";
pub const PHONE_NUMBER: &str = "phone_number";
pub const ADDRESS_LINE_1: &str = "address_line_1";
pub const ADDRESS_LINE_2: &str = "address_line_2";
pub const ADDRESS_CITY: &str = "address_city";
pub const ADDRESS_STATE: &str = "address_state";
pub const ADDRESS_POSTAL_CODE: &str = "address_postal_code";
pub const ADDRESS_COUNTRY_CODE: &str = "address_country_code";
pub const DOCUMENT_SSN: &str = "document_ssn";
pub const BIRTH_DATE: &str = "birth_date";

/// All known fields, in presence-check order
pub static FIELDS: &[FieldInfo] = &[
    FieldInfo::required(NAME_FIRST, "First Name"),
    FieldInfo::required(NAME_LAST, "Last Name"),
    FieldInfo::required(EMAIL_ADDRESS, "Email Address"),
    FieldInfo::required(PHONE_NUMBER, "Phone Number"),
    FieldInfo::required(ADDRESS_LINE_1, "Address Line 1"),
    FieldInfo::optional(ADDRESS_LINE_2, "Address Line 2"),
    FieldInfo::required(ADDRESS_CITY, "City"),
    FieldInfo::required(ADDRESS_STATE, "State"),
    FieldInfo::required(ADDRESS_POSTAL_CODE, "Postal Code"),
    FieldInfo::required(ADDRESS_COUNTRY_CODE, "Country"),
    FieldInfo::required(DOCUMENT_SSN, "Social Security Number"),
    FieldInfo::required(BIRTH_DATE, "Date of Birth"),
];

static FIELD_INDEX: LazyLock<HashMap<&'static str, &'static FieldInfo>> =
    LazyLock::new(|| FIELDS.iter().map(|f| (f.key, f)).collect());

/// Look up a field by key
pub fn get_field_info(key: &str) -> Option<&'static FieldInfo> {
    FIELD_INDEX.get(key).copied()
}

/// Check if the key is a known submission field
pub fn is_known_field(key: &str) -> bool {
    get_field_info(key).is_some()
}

/// Required fields, in check order
pub fn required_fields() -> impl Iterator<Item = &'static FieldInfo> {
    FIELDS.iter().filter(|f| f.required)
}
