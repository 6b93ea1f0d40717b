use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Member details collected in phase one, in the order they are asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserField {
    FirstName,
    LastName,
    IdNumber,
    Gender,
    Age,
    HmoName,
    HmoCardNumber,
    InsuranceMembershipTier,
}

impl UserField {
    pub const ALL: [UserField; 8] = [
        UserField::FirstName,
        UserField::LastName,
        UserField::IdNumber,
        UserField::Gender,
        UserField::Age,
        UserField::HmoName,
        UserField::HmoCardNumber,
        UserField::InsuranceMembershipTier,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            UserField::FirstName => "first_name",
            UserField::LastName => "last_name",
            UserField::IdNumber => "id_number",
            UserField::Gender => "gender",
            UserField::Age => "age",
            UserField::HmoName => "hmo_name",
            UserField::HmoCardNumber => "hmo_card_number",
            UserField::InsuranceMembershipTier => "insurance_membership_tier",
        }
    }

    /// Sentence-case label used in error messages ("First name").
    pub fn label(&self) -> String {
        let spaced = self.as_str().replace('_', " ");
        let mut chars = spaced.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => spaced,
        }
    }
}

impl fmt::Display for UserField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserField {
    type Err = FieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim();
        UserField::ALL
            .into_iter()
            .find(|f| f.as_str() == key)
            .ok_or_else(|| FieldError(format!("Unknown field '{key}'.")))
    }
}

/// Validation failure, worded for the member.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct FieldError(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Hmo {
    Maccabi,
    Meuhedet,
    Clalit,
}

impl Hmo {
    /// Accepts the English or Hebrew name, any case.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "maccabi" | "מכבי" => Some(Hmo::Maccabi),
            "meuhedet" | "מאוחדת" => Some(Hmo::Meuhedet),
            "clalit" | "כללית" => Some(Hmo::Clalit),
            _ => None,
        }
    }

    pub fn hebrew_name(&self) -> &'static str {
        match self {
            Hmo::Maccabi => "מכבי",
            Hmo::Meuhedet => "מאוחדת",
            Hmo::Clalit => "כללית",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MembershipTier {
    Gold,
    Silver,
    Bronze,
}

impl MembershipTier {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "gold" | "זהב" => Some(MembershipTier::Gold),
            "silver" | "כסף" => Some(MembershipTier::Silver),
            "bronze" | "ארד" => Some(MembershipTier::Bronze),
            _ => None,
        }
    }

    pub fn hebrew_name(&self) -> &'static str {
        match self {
            MembershipTier::Gold => "זהב",
            MembershipTier::Silver => "כסף",
            MembershipTier::Bronze => "ארד",
        }
    }
}

const GENDERS: [&str; 6] = ["male", "female", "other", "זכר", "נקבה", "אחר"];

fn is_nine_digits(value: &str) -> bool {
    value.len() == 9 && value.bytes().all(|b| b.is_ascii_digit())
}

/// Check a value for `field`, returning it trimmed when accepted.
pub fn validate_field(field: UserField, value: &str) -> Result<String, FieldError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(FieldError(format!("{} cannot be empty.", field.label())));
    }

    let error = match field {
        UserField::FirstName | UserField::LastName if !value.chars().all(char::is_alphabetic) => {
            Some(format!("{} must contain only alphabetic characters.", field.label()))
        }
        UserField::IdNumber if !is_nine_digits(value) => Some("ID number must be exactly 9 digits.".into()),
        UserField::HmoCardNumber if !is_nine_digits(value) => {
            Some("HMO card number must be exactly 9 digits.".into())
        }
        UserField::Gender if !GENDERS.contains(&value.to_lowercase().as_str()) => {
            Some("Gender must be male, female, or other.".into())
        }
        UserField::Age => match value.parse::<i64>() {
            Ok(age) if (0..=120).contains(&age) => None,
            Ok(_) => Some("Age must be a number between 0 and 120.".into()),
            Err(_) => Some("Age must be a valid number.".into()),
        },
        UserField::HmoName if Hmo::parse(value).is_none() => {
            Some("HMO name must be one of: Maccabi, Meuhedet, Clalit.".into())
        }
        UserField::InsuranceMembershipTier if MembershipTier::parse(value).is_none() => {
            Some("Insurance membership tier must be gold, silver, or bronze.".into())
        }
        _ => None,
    };

    match error {
        Some(message) => Err(FieldError(message)),
        None => Ok(value.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_names_round_trip() {
        for field in UserField::ALL {
            assert_eq!(field.as_str().parse::<UserField>().unwrap(), field);
            assert_eq!(serde_json::to_value(field).unwrap(), field.as_str());
        }
        assert!("favourite_color".parse::<UserField>().is_err());
        assert_eq!(UserField::HmoCardNumber.label(), "Hmo card number");
    }

    #[test]
    fn test_names() {
        assert_eq!(validate_field(UserField::FirstName, "  Dana ").unwrap(), "Dana");
        assert_eq!(validate_field(UserField::LastName, "כהן").unwrap(), "כהן");
        assert_eq!(
            validate_field(UserField::FirstName, "R2D2").unwrap_err().to_string(),
            "First name must contain only alphabetic characters."
        );
        assert_eq!(
            validate_field(UserField::LastName, "   ").unwrap_err().to_string(),
            "Last name cannot be empty."
        );
    }

    #[test]
    fn test_nine_digit_numbers() {
        assert!(validate_field(UserField::IdNumber, "123456789").is_ok());
        assert_eq!(
            validate_field(UserField::IdNumber, "12345678").unwrap_err().0,
            "ID number must be exactly 9 digits."
        );
        assert!(validate_field(UserField::IdNumber, "12345678a").is_err());
        assert!(validate_field(UserField::HmoCardNumber, "987654321").is_ok());
        assert!(validate_field(UserField::HmoCardNumber, "９８７６５４３２１").is_err());
    }

    #[test]
    fn test_gender() {
        assert!(validate_field(UserField::Gender, "Female").is_ok());
        assert!(validate_field(UserField::Gender, "זכר").is_ok());
        assert!(validate_field(UserField::Gender, "unknown").is_err());
    }

    #[test]
    fn test_age_bounds() {
        assert!(validate_field(UserField::Age, "0").is_ok());
        assert!(validate_field(UserField::Age, "120").is_ok());
        assert_eq!(
            validate_field(UserField::Age, "121").unwrap_err().0,
            "Age must be a number between 0 and 120."
        );
        assert_eq!(validate_field(UserField::Age, "-1").unwrap_err().0, "Age must be a number between 0 and 120.");
        assert_eq!(validate_field(UserField::Age, "thirty").unwrap_err().0, "Age must be a valid number.");
    }

    #[test]
    fn test_hmo_and_tier() {
        assert!(validate_field(UserField::HmoName, "MACCABI").is_ok());
        assert!(validate_field(UserField::HmoName, "מאוחדת").is_ok());
        assert!(validate_field(UserField::HmoName, "leumit").is_err());
        assert!(validate_field(UserField::InsuranceMembershipTier, "Gold").is_ok());
        assert!(validate_field(UserField::InsuranceMembershipTier, "ארד").is_ok());
        assert!(validate_field(UserField::InsuranceMembershipTier, "platinum").is_err());

        assert_eq!(Hmo::parse("כללית"), Some(Hmo::Clalit));
        assert_eq!(MembershipTier::parse(" silver "), Some(MembershipTier::Silver));
        assert_eq!(Hmo::Maccabi.hebrew_name(), "מכבי");
    }
}
