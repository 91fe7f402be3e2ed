//! Common validation utilities.

use validator::ValidationError;

lazy_static::lazy_static! {
    /// Phone numbers as stored by the user directory: optional `+`, 9-15 digits.
    pub static ref PHONE_REGEX: regex::Regex = regex::Regex::new(r"^\+?1?\d{9,15}$").unwrap();
}

/// Maximum length of item group names and attribute names/values.
pub const MAX_NAME_LENGTH: usize = 100;

/// Returns true if the value looks like a phone number on file.
pub fn is_phone_number(value: &str) -> bool {
    PHONE_REGEX.is_match(value.trim())
}

/// Validates a phone number string.
pub fn validate_phone(value: &str) -> Result<(), ValidationError> {
    if is_phone_number(value) {
        Ok(())
    } else {
        let mut err = ValidationError::new("phone_format");
        err.message = Some(
            "Phone number must be entered in the format: '+999999999'. Up to 15 digits allowed."
                .into(),
        );
        Err(err)
    }
}

/// Validates that a name is non-blank and within [`MAX_NAME_LENGTH`].
pub fn validate_name(value: &str) -> Result<(), ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        let mut err = ValidationError::new("name_blank");
        err.message = Some("Name cannot be blank".into());
        return Err(err);
    }
    if trimmed.chars().count() > MAX_NAME_LENGTH {
        let mut err = ValidationError::new("name_length");
        err.message = Some(format!("Name cannot exceed {} characters", MAX_NAME_LENGTH).into());
        return Err(err);
    }
    Ok(())
}
