//! Field registry: the ordered profile fields collected before the
//! technical interview, with their prompts, validators and error messages.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@]+@[^@]+\.[^@]+").expect("valid email regex"));

static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[0-9\s\-()]{7,}$").expect("valid phone regex"));

static YEARS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+$").expect("valid years regex"));

/// A candidate profile field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileField {
    FullName,
    Email,
    Phone,
    YearsExperience,
    DesiredPosition,
    CurrentLocation,
    TechStack,
}

/// Scalar fields in collection order. `TechStack` is gathered separately
/// once all of these are filled.
pub const SCALAR_FIELDS: [ProfileField; 6] = [
    ProfileField::FullName,
    ProfileField::Email,
    ProfileField::Phone,
    ProfileField::YearsExperience,
    ProfileField::DesiredPosition,
    ProfileField::CurrentLocation,
];

impl ProfileField {
    /// Stable snake_case key.
    pub fn key(&self) -> &'static str {
        match self {
            Self::FullName => "full_name",
            Self::Email => "email",
            Self::Phone => "phone",
            Self::YearsExperience => "years_experience",
            Self::DesiredPosition => "desired_position",
            Self::CurrentLocation => "current_location",
            Self::TechStack => "tech_stack",
        }
    }

    /// Lowercase human-readable label used in summaries.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::FullName => "full name",
            Self::Email => "email address",
            Self::Phone => "phone number",
            Self::YearsExperience => "years of professional experience",
            Self::DesiredPosition => "desired position",
            Self::CurrentLocation => "current location",
            Self::TechStack => "tech stack",
        }
    }

    /// Question shown to the candidate when this field is requested.
    pub fn prompt(&self) -> &'static str {
        match self {
            Self::FullName => "What is your full name?",
            Self::Email => "What is your email address?",
            Self::Phone => "What is your phone number?",
            Self::YearsExperience => "How many years of professional experience do you have?",
            Self::DesiredPosition => "What is your desired position?",
            Self::CurrentLocation => "What is your current location?",
            Self::TechStack => "Please list your technical skills (comma-separated):",
        }
    }

    /// Whether `input` is acceptable for this field.
    ///
    /// Email, phone and years have format checks; every other field only
    /// needs to be non-blank.
    pub fn validate(&self, input: &str) -> bool {
        match self {
            Self::Email => EMAIL_RE.is_match(input),
            Self::Phone => PHONE_RE.is_match(input),
            Self::YearsExperience => YEARS_RE.is_match(input),
            _ => !input.trim().is_empty(),
        }
    }

    /// Message returned when `validate` rejects an input.
    pub fn error_message(&self) -> &'static str {
        match self {
            Self::Email => "Please enter a valid email address (e.g., name@example.com).",
            Self::Phone => "Please enter a valid phone number (e.g., +1 123-456-7890).",
            Self::YearsExperience => "Please enter a valid number of years (e.g., 5).",
            Self::FullName => "Please tell me your full name.",
            Self::DesiredPosition => "Please tell me which position you are applying for.",
            Self::CurrentLocation => "Please tell me where you are currently located.",
            Self::TechStack => "Please list at least one technology.",
        }
    }
}

impl std::fmt::Display for ProfileField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_order_is_fixed() {
        let keys: Vec<&str> = SCALAR_FIELDS.iter().map(|f| f.key()).collect();
        assert_eq!(
            keys,
            [
                "full_name",
                "email",
                "phone",
                "years_experience",
                "desired_position",
                "current_location"
            ]
        );
    }

    #[test]
    fn email_validation() {
        let f = ProfileField::Email;
        assert!(f.validate("name@example.com"));
        assert!(f.validate("a.b@c.d.e"));
        assert!(!f.validate("not-an-email"));
        assert!(!f.validate("@example.com"));
        assert!(!f.validate("name@example"));
        assert!(!f.validate("name@.com"));
    }

    #[test]
    fn phone_validation() {
        let f = ProfileField::Phone;
        assert!(f.validate("+1 123-456-7890"));
        assert!(f.validate("(555) 123 4567"));
        assert!(f.validate("1234567"));
        assert!(!f.validate("123456"));
        assert!(!f.validate("++1234567"));
        assert!(!f.validate("555-CALL-NOW"));
    }

    #[test]
    fn years_validation() {
        let f = ProfileField::YearsExperience;
        assert!(f.validate("5"));
        assert!(f.validate("12"));
        assert!(!f.validate("-3"));
        assert!(!f.validate("2.5"));
        assert!(!f.validate("five"));
        assert!(!f.validate(""));
    }

    #[test]
    fn free_text_fields_only_require_content() {
        assert!(ProfileField::FullName.validate("Ada Lovelace"));
        assert!(ProfileField::CurrentLocation.validate("x"));
        assert!(!ProfileField::DesiredPosition.validate("   "));
    }

    #[test]
    fn display_matches_serde() {
        for field in SCALAR_FIELDS {
            let json = serde_json::to_string(&field).unwrap();
            assert_eq!(format!("\"{field}\""), json);
        }
    }
}
