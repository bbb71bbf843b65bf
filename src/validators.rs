/// Client-side form validation, run before a request leaves the client
/// Features:
/// 1. Email format and length checks
/// 2. Password length rules shared by registration and password change
/// 3. Required text fields (name, address, city, description)
/// 4. Numeric ranges for quantities and GPS coordinates

use regex::Regex;
use lazy_static::lazy_static;

use crate::error::ValidationError;

const MAX_EMAIL_LENGTH: usize = 254; // RFC 5321
const MIN_EMAIL_LENGTH: usize = 5;
const MIN_PASSWORD_LENGTH: usize = 6;
const MAX_PASSWORD_LENGTH: usize = 128;
const MAX_TEXT_LENGTH: usize = 256;
const MAX_DESCRIPTION_LENGTH: usize = 2000;

lazy_static! {
    // RFC 5322 simplified email regex (practical validation)
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$"
    ).expect("email pattern is valid");

    static ref PHONE_REGEX: Regex = Regex::new(r"^\+?[0-9][0-9 .-]{5,19}$")
        .expect("phone pattern is valid");
}

/// Validates an email address and returns it trimmed
pub fn is_valid_email(email: &str) -> Result<String, ValidationError> {
    let trimmed = email.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField("email"));
    }

    if trimmed.len() < MIN_EMAIL_LENGTH {
        return Err(ValidationError::TooShort("email", MIN_EMAIL_LENGTH));
    }

    if trimmed.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::TooLong("email", MAX_EMAIL_LENGTH));
    }

    if !EMAIL_REGEX.is_match(trimmed) {
        return Err(ValidationError::InvalidFormat("email"));
    }

    if has_suspicious_email_patterns(trimmed) {
        return Err(ValidationError::SuspiciousContent("email"));
    }

    Ok(trimmed.to_string())
}

/// Password rules for new passwords. Existing passwords are only checked for presence.
pub fn is_valid_password(field: &'static str, password: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::EmptyField(field));
    }

    let length = password.chars().count();
    if length < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::TooShort(field, MIN_PASSWORD_LENGTH));
    }

    if length > MAX_PASSWORD_LENGTH {
        return Err(ValidationError::TooLong(field, MAX_PASSWORD_LENGTH));
    }

    Ok(())
}

/// Validates a required single-line text field and returns it trimmed
pub fn required_text(field: &'static str, value: &str) -> Result<String, ValidationError> {
    bounded_text(field, value, MAX_TEXT_LENGTH)
}

/// Like `required_text` but allows the longer free-form description of a report
pub fn required_description(value: &str) -> Result<String, ValidationError> {
    bounded_text("description", value, MAX_DESCRIPTION_LENGTH)
}

fn bounded_text(field: &'static str, value: &str, max: usize) -> Result<String, ValidationError> {
    let trimmed = value.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField(field));
    }

    if trimmed.chars().count() > max {
        return Err(ValidationError::TooLong(field, max));
    }

    // Newlines are fine in descriptions, other control characters are not
    if trimmed
        .chars()
        .any(|c| c.is_control() && c != '\n' && c != '\r' && c != '\t')
    {
        return Err(ValidationError::SuspiciousContent(field));
    }

    Ok(trimmed.to_string())
}

pub fn is_valid_phone(phone: &str) -> Result<String, ValidationError> {
    let trimmed = phone.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField("telephone"));
    }

    if !PHONE_REGEX.is_match(trimmed) {
        return Err(ValidationError::InvalidFormat("telephone"));
    }

    Ok(trimmed.to_string())
}

/// Waste quantities are counted in whole units, at least one
pub fn is_valid_quantity(quantity: f64) -> Result<(), ValidationError> {
    if !quantity.is_finite() || quantity < 1.0 {
        return Err(ValidationError::OutOfRange("quantite"));
    }
    Ok(())
}

/// Both coordinates are optional, but each one given must be in range
pub fn is_valid_coordinates(
    latitude: Option<f64>,
    longitude: Option<f64>,
) -> Result<(), ValidationError> {
    if let Some(lat) = latitude {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(ValidationError::OutOfRange("latitude"));
        }
    }
    if let Some(lon) = longitude {
        if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
            return Err(ValidationError::OutOfRange("longitude"));
        }
    }
    Ok(())
}

fn has_suspicious_email_patterns(email: &str) -> bool {
    // Local part longer than 64 characters is not deliverable
    if let Some(at_pos) = email.find('@') {
        if email[..at_pos].len() > 64 {
            return true;
        }
    }

    if email.matches('@').count() != 1 {
        return true;
    }

    email.contains('\0')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_email() {
        assert!(is_valid_email("user@example.com").is_ok());
        assert!(is_valid_email("test.email@domain.co.uk").is_ok());
        assert_eq!(is_valid_email("  user@example.cm ").unwrap(), "user@example.cm");
    }

    #[test]
    fn test_invalid_email_format() {
        assert!(is_valid_email("invalid").is_err());
        assert!(is_valid_email("user@").is_err());
        assert!(is_valid_email("@example.com").is_err());
        assert!(is_valid_email("user@@example.com").is_err());
        assert_eq!(is_valid_email("   "), Err(ValidationError::EmptyField("email")));
    }

    #[test]
    fn test_email_length_limits() {
        let too_long = format!("{}@example.com", "a".repeat(250));
        assert!(is_valid_email(&too_long).is_err());
        assert_eq!(is_valid_email("a@b"), Err(ValidationError::TooShort("email", 5)));
    }

    #[test]
    fn test_password_rules() {
        assert!(is_valid_password("password", "secret1").is_ok());
        assert_eq!(
            is_valid_password("password", "abc"),
            Err(ValidationError::TooShort("password", 6))
        );
        assert_eq!(
            is_valid_password("password", ""),
            Err(ValidationError::EmptyField("password"))
        );
        assert!(is_valid_password("password", &"a".repeat(129)).is_err());
    }

    #[test]
    fn test_required_text() {
        assert_eq!(required_text("ville", "  Douala ").unwrap(), "Douala");
        assert_eq!(required_text("ville", ""), Err(ValidationError::EmptyField("ville")));
        assert!(required_text("adresse", &"a".repeat(257)).is_err());
        assert!(required_text("nom", "Name\0with\0null").is_err());
        assert!(required_description("Bac plein\ndepuis trois jours").is_ok());
    }

    #[test]
    fn test_phone() {
        assert!(is_valid_phone("+237 6 99 12 34 56").is_ok());
        assert!(is_valid_phone("699123456").is_ok());
        assert!(is_valid_phone("call me").is_err());
    }

    #[test]
    fn test_quantity_and_coordinates() {
        assert!(is_valid_quantity(1.0).is_ok());
        assert!(is_valid_quantity(0.0).is_err());
        assert!(is_valid_quantity(f64::NAN).is_err());

        assert!(is_valid_coordinates(Some(4.05), Some(9.7)).is_ok());
        assert!(is_valid_coordinates(None, None).is_ok());
        assert_eq!(
            is_valid_coordinates(Some(91.0), None),
            Err(ValidationError::OutOfRange("latitude"))
        );
        assert_eq!(
            is_valid_coordinates(None, Some(-181.0)),
            Err(ValidationError::OutOfRange("longitude"))
        );
    }
}
