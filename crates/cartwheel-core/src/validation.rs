//! # Validation Module
//!
//! Field validation shared by every Cartwheel service.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Transport (external)                                         │
//! │  └── Shape checks (JSON types, required fields)                        │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Services (cartwheel-service)                                 │
//! │  └── THIS MODULE: identifier, quantity, product and card rules         │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Stores                                                       │
//! │  └── Existence and stock conflicts                                     │
//! │                                                                         │
//! │  Every check here runs before any store is touched.                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use cartwheel_core::validation::{validate_card_number, validate_quantity};
//!
//! validate_quantity(5).unwrap();
//! validate_card_number("4111111111111111").unwrap();
//! assert!(validate_card_number("4111-1111").is_err());
//! ```

use crate::error::ValidationError;
use crate::types::Product;
use crate::{CARD_NUMBER_MAX_DIGITS, CARD_NUMBER_MIN_DIGITS, MAX_MANUFACTURER_LEN, MAX_SKU_LEN};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates that an identifier is at least 1.
pub fn validate_positive_id(field: &str, id: i64) -> ValidationResult<()> {
    if id < 1 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Validates an item or stock quantity.
///
/// ## Example
/// ```rust
/// use cartwheel_core::validation::validate_quantity;
///
/// assert!(validate_quantity(1).is_ok());
/// assert!(validate_quantity(0).is_err());
/// assert!(validate_quantity(-3).is_err());
/// ```
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    validate_positive_id("quantity", qty)
}

/// Validates a product weight. Zero is allowed.
pub fn validate_weight(weight: i64) -> ValidationResult<()> {
    if weight < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: "weight".to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// String Validators
// =============================================================================

fn validate_bounded_text(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

/// Validates a SKU: non-empty, at most 100 characters.
pub fn validate_sku(sku: &str) -> ValidationResult<()> {
    validate_bounded_text("sku", sku, MAX_SKU_LEN)
}

/// Validates a manufacturer name: non-empty, at most 200 characters.
pub fn validate_manufacturer(manufacturer: &str) -> ValidationResult<()> {
    validate_bounded_text("manufacturer", manufacturer, MAX_MANUFACTURER_LEN)
}

// =============================================================================
// Record Validators
// =============================================================================

/// Validates every field of a product record.
///
/// ## Rules
/// - `product_id`, `category_id`, `some_other_id` >= 1
/// - `sku` 1-100 characters, `manufacturer` 1-200 characters
/// - `weight` >= 0
pub fn validate_product(product: &Product) -> ValidationResult<()> {
    validate_positive_id("product_id", product.product_id)?;
    validate_sku(&product.sku)?;
    validate_manufacturer(&product.manufacturer)?;
    validate_positive_id("category_id", product.category_id)?;
    validate_weight(product.weight)?;
    validate_positive_id("some_other_id", product.some_other_id)?;
    Ok(())
}

/// Validates that the identifier addressed by the caller matches the one in
/// the record body.
pub fn validate_id_match(field: &str, expected: i64, actual: i64) -> ValidationResult<()> {
    if expected != actual {
        return Err(ValidationError::Mismatch {
            field: field.to_string(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Card Validators
// =============================================================================

/// Validates a card number: 13 to 19 ASCII digits, nothing else.
pub fn validate_card_number(number: &str) -> ValidationResult<()> {
    if number.is_empty() {
        return Err(ValidationError::Required {
            field: "card_number".to_string(),
        });
    }

    if !number.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ValidationError::InvalidFormat {
            field: "card_number".to_string(),
            reason: "must contain only digits".to_string(),
        });
    }

    if !(CARD_NUMBER_MIN_DIGITS..=CARD_NUMBER_MAX_DIGITS).contains(&number.len()) {
        return Err(ValidationError::InvalidFormat {
            field: "card_number".to_string(),
            reason: format!(
                "must be {}-{} digits",
                CARD_NUMBER_MIN_DIGITS, CARD_NUMBER_MAX_DIGITS
            ),
        });
    }

    Ok(())
}

/// Masks all but the last four digits of a card number.
///
/// ```rust
/// use cartwheel_core::validation::mask_card_number;
///
/// assert_eq!(mask_card_number("4111111111111110"), "************1110");
/// ```
pub fn mask_card_number(number: &str) -> String {
    let visible = number.len().saturating_sub(4);
    number
        .char_indices()
        .map(|(i, c)| if i < visible { '*' } else { c })
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn product() -> Product {
        Product {
            product_id: 1,
            sku: "SKU-1".to_string(),
            manufacturer: "Acme".to_string(),
            category_id: 2,
            weight: 0,
            some_other_id: 3,
        }
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(i64::MAX).is_ok());
        assert_eq!(
            validate_quantity(0),
            Err(ValidationError::MustBePositive {
                field: "quantity".to_string()
            })
        );
    }

    #[test]
    fn test_validate_product() {
        assert!(validate_product(&product()).is_ok());

        let mut p = product();
        p.sku = "   ".to_string();
        assert!(matches!(
            validate_product(&p),
            Err(ValidationError::Required { .. })
        ));

        let mut p = product();
        p.sku = "A".repeat(101);
        assert!(matches!(
            validate_product(&p),
            Err(ValidationError::TooLong { max: 100, .. })
        ));

        let mut p = product();
        p.manufacturer = "M".repeat(200);
        assert!(validate_product(&p).is_ok());
        p.manufacturer.push('M');
        assert!(validate_product(&p).is_err());

        let mut p = product();
        p.weight = -1;
        assert!(matches!(
            validate_product(&p),
            Err(ValidationError::MustNotBeNegative { .. })
        ));

        let mut p = product();
        p.some_other_id = 0;
        assert!(validate_product(&p).is_err());
    }

    #[test]
    fn test_validate_id_match() {
        assert!(validate_id_match("product_id", 4, 4).is_ok());
        assert!(validate_id_match("product_id", 4, 5).is_err());
    }

    #[test]
    fn test_validate_card_number() {
        assert!(validate_card_number("4111111111111").is_ok());
        assert!(validate_card_number("4111111111111111111").is_ok());

        assert!(validate_card_number("").is_err());
        assert!(validate_card_number("411111111111").is_err());
        assert!(validate_card_number("41111111111111111111").is_err());
        assert!(validate_card_number("4111 1111 1111 1111").is_err());
        assert!(validate_card_number("٤١١١١١١١١١١١١١").is_err());
    }

    #[test]
    fn test_mask_card_number() {
        assert_eq!(mask_card_number("4111111111111111"), "************1111");
        assert_eq!(mask_card_number("123"), "123");
    }
}
