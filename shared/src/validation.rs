//! Validation utilities for the Warehouse Management System
//!
//! Includes Indonesia-specific checks for contact data.

use std::collections::HashSet;

use uuid::Uuid;

use crate::models::{CountLineInput, MovementLineInput};

/// Maximum number of lines accepted on one document
pub const MAX_DOCUMENT_LINES: usize = 500;

// ============================================================================
// Master Data Validations
// ============================================================================

/// Validate a master-data code (item code, warehouse code, shelf code)
///
/// 1-50 characters, no whitespace.
pub fn validate_code(code: &str) -> Result<(), &'static str> {
    if code.is_empty() {
        return Err("Code is required");
    }
    if code.chars().count() > 50 {
        return Err("Code must be at most 50 characters");
    }
    if code.chars().any(char::is_whitespace) {
        return Err("Code must not contain spaces");
    }
    Ok(())
}

/// Validate a display name
pub fn validate_name(name: &str) -> Result<(), &'static str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err("Name is required");
    }
    if trimmed.chars().count() > 200 {
        return Err("Name must be at most 200 characters");
    }
    Ok(())
}

/// Validate a minimum stock threshold
pub fn validate_min_stock(min_stock: i32) -> Result<(), &'static str> {
    if min_stock < 0 {
        return Err("Minimum stock cannot be negative");
    }
    Ok(())
}

// ============================================================================
// Movement Validations
// ============================================================================

/// Validate the lines of an inbound, outbound or transfer document
pub fn validate_movement_lines(lines: &[MovementLineInput]) -> Result<(), &'static str> {
    if lines.is_empty() {
        return Err("At least one line is required");
    }
    if lines.len() > MAX_DOCUMENT_LINES {
        return Err("Too many lines on one document");
    }
    for line in lines {
        if line.quantity <= 0 {
            return Err("Quantity must be positive");
        }
        if let Some(price) = line.unit_price {
            if price.is_sign_negative() {
                return Err("Unit price cannot be negative");
            }
        }
    }
    Ok(())
}

/// Validate the lines of a stock count document
pub fn validate_count_lines(lines: &[CountLineInput]) -> Result<(), &'static str> {
    if lines.is_empty() {
        return Err("At least one line is required");
    }
    if lines.len() > MAX_DOCUMENT_LINES {
        return Err("Too many lines on one document");
    }
    let mut seen: HashSet<Uuid> = HashSet::with_capacity(lines.len());
    for line in lines {
        if line.counted_quantity < 0 {
            return Err("Counted quantity cannot be negative");
        }
        if !seen.insert(line.item_id) {
            return Err("An item may only be counted once per document");
        }
    }
    Ok(())
}

/// Validate transfer endpoints
pub fn validate_transfer_warehouses(source: Uuid, destination: Uuid) -> Result<(), &'static str> {
    if source == destination {
        return Err("Source and destination warehouse must differ");
    }
    Ok(())
}

// ============================================================================
// General Validations
// ============================================================================

/// Validate email format (basic check)
pub fn validate_email(email: &str) -> Result<(), &'static str> {
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') && email.len() >= 5 => {
            Ok(())
        }
        _ => Err("Invalid email format"),
    }
}

/// Validate a login username: 3-50 lowercase letters, digits, `.`, `_` or `-`
pub fn validate_username(username: &str) -> Result<(), &'static str> {
    if username.len() < 3 || username.len() > 50 {
        return Err("Username must be 3-50 characters");
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '.' | '_' | '-'))
    {
        return Err("Username may only contain lowercase letters, digits, '.', '_' and '-'");
    }
    Ok(())
}

/// Validate password strength
pub fn validate_password(password: &str) -> Result<(), &'static str> {
    if password.len() < 8 {
        return Err("Password must be at least 8 characters");
    }
    Ok(())
}

// ============================================================================
// Indonesia-Specific Validations
// ============================================================================

/// Validate Indonesian phone number format
/// Accepts: 081234567890, 0812-3456-7890, +6281234567890, (021) 5551234
pub fn validate_indonesian_phone(phone: &str) -> Result<(), &'static str> {
    if phone
        .chars()
        .any(|c| !(c.is_ascii_digit() || matches!(c, '+' | '-' | ' ' | '(' | ')')))
    {
        return Err("Phone number contains invalid characters");
    }

    let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();

    // Domestic format: leading 0, 9-13 digits (landline or mobile)
    if digits.starts_with('0') && (9..=13).contains(&digits.len()) {
        return Ok(());
    }
    // International format with country code 62
    if digits.starts_with("62") && (10..=14).contains(&digits.len()) {
        return Ok(());
    }

    Err("Invalid Indonesian phone number format")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn test_validate_code() {
        assert!(validate_code("BRG-001").is_ok());
        assert!(validate_code("").is_err());
        assert!(validate_code("A B").is_err());
        assert!(validate_code(&"X".repeat(51)).is_err());
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("Gudang Utama").is_ok());
        assert!(validate_name("   ").is_err());
    }

    #[test]
    fn test_validate_movement_lines() {
        let item = Uuid::new_v4();
        assert!(validate_movement_lines(&[]).is_err());
        assert!(validate_movement_lines(&[MovementLineInput::new(item, 0)]).is_err());
        assert!(validate_movement_lines(&[MovementLineInput::new(item, 3)]).is_ok());

        let mut priced = MovementLineInput::new(item, 1);
        priced.unit_price = Some(Decimal::from(-1));
        assert!(validate_movement_lines(&[priced]).is_err());
    }

    #[test]
    fn test_validate_count_lines_rejects_duplicates() {
        let item = Uuid::new_v4();
        let line = CountLineInput {
            item_id: item,
            counted_quantity: 4,
            notes: None,
        };
        assert!(validate_count_lines(&[line.clone()]).is_ok());
        assert!(validate_count_lines(&[line.clone(), line]).is_err());
    }

    #[test]
    fn test_validate_count_lines_allows_zero() {
        let line = CountLineInput {
            item_id: Uuid::new_v4(),
            counted_quantity: 0,
            notes: None,
        };
        assert!(validate_count_lines(&[line]).is_ok());
    }

    #[test]
    fn test_validate_transfer_warehouses() {
        let a = Uuid::new_v4();
        assert!(validate_transfer_warehouses(a, a).is_err());
        assert!(validate_transfer_warehouses(a, Uuid::new_v4()).is_ok());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("gudang@contoh.co.id").is_ok());
        assert!(validate_email("@contoh.com").is_err());
        assert!(validate_email("nodomain").is_err());
    }

    #[test]
    fn test_validate_username() {
        assert!(validate_username("admin").is_ok());
        assert!(validate_username("budi.santoso").is_ok());
        assert!(validate_username("Admin").is_err());
        assert!(validate_username("ab").is_err());
    }

    #[test]
    fn test_validate_indonesian_phone() {
        assert!(validate_indonesian_phone("081234567890").is_ok());
        assert!(validate_indonesian_phone("0812-3456-7890").is_ok());
        assert!(validate_indonesian_phone("+6281234567890").is_ok());
        assert!(validate_indonesian_phone("(021) 5551234").is_ok());
        assert!(validate_indonesian_phone("12345").is_err());
        assert!(validate_indonesian_phone("0812abc").is_err());
    }
}
