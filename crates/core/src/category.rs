//! Zone category validation.
//!
//! Categories are a runtime-managed reference table, so codes are validated
//! by shape rather than against a hardcoded list.

use crate::error::CoreError;

/// Maximum length for a category code.
pub const MAX_CODE_LEN: usize = 32;

/// Maximum length for a category display name.
pub const MAX_NAME_LEN: usize = 100;

/// Returns `true` for a well-formed category code: a lowercase letter
/// followed by lowercase letters, digits, or underscores.
pub fn is_valid_category_code(code: &str) -> bool {
    if code.is_empty() || code.len() > MAX_CODE_LEN {
        return false;
    }
    let mut chars = code.chars();
    match chars.next() {
        Some(c) if c.is_ascii_lowercase() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

/// Returns `true` for a `#rrggbb` hex color.
pub fn is_valid_color_hex(value: &str) -> bool {
    let Some(digits) = value.strip_prefix('#') else {
        return false;
    };
    digits.len() == 6 && digits.chars().all(|c| c.is_ascii_hexdigit())
}

/// Validate the fields of a new category.
pub fn validate_new_category(code: &str, name: &str, color_hex: &str) -> Result<(), CoreError> {
    if !is_valid_category_code(code) {
        return Err(CoreError::Validation(format!(
            "Invalid category code '{code}': must be lowercase [a-z][a-z0-9_]*, at most {MAX_CODE_LEN} characters"
        )));
    }
    if name.trim().is_empty() {
        return Err(CoreError::Validation(
            "Category name must not be empty".to_string(),
        ));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(CoreError::Validation(format!(
            "Category name exceeds maximum length of {MAX_NAME_LEN} characters"
        )));
    }
    if !is_valid_color_hex(color_hex) {
        return Err(CoreError::Validation(format!(
            "Invalid color '{color_hex}': expected #rrggbb"
        )));
    }
    Ok(())
}
