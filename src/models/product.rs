use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::{Validate, ValidationError};

/// A product entity as stored in the database and returned by the API.
#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub description: String,
    /// Unit price with two decimal places. Stored as NUMERIC(10, 2).
    pub price: Decimal,
    pub stock: i32,
    pub featured: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input structure for creating a product.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct ProductInput {
    #[validate(length(min = 1, max = 255, message = "The name must be between 1 and 255 characters."))]
    pub name: String,

    #[validate(length(min = 1, max = 1000, message = "The description must be between 1 and 1000 characters."))]
    pub description: String,

    #[validate(custom = "validate_price")]
    pub price: Decimal,

    /// A stock of zero is rejected on create. That matches the published
    /// contract even though it forbids creating an out-of-stock product.
    #[validate(range(min = 1, message = "The stock must be at least 1."))]
    pub stock: i32,

    /// Defaults to false when omitted.
    pub featured: Option<bool>,
}

/// Input structure for partially updating a product. Absent fields are left
/// untouched; no other fields are updatable.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct ProductUpdate {
    #[validate(length(min = 1, max = 255, message = "The name must be between 1 and 255 characters."))]
    pub name: Option<String>,

    #[validate(length(min = 1, max = 1000, message = "The description must be between 1 and 1000 characters."))]
    pub description: Option<String>,

    #[validate(custom = "validate_price")]
    pub price: Option<Decimal>,

    #[validate(range(min = 1, message = "The stock must be at least 1."))]
    pub stock: Option<i32>,

    pub featured: Option<bool>,
}

fn validate_price(price: &Decimal) -> Result<(), ValidationError> {
    if price.is_sign_negative() {
        let mut error = ValidationError::new("min");
        error.message = Some("The price must be at least 0.".into());
        return Err(error);
    }
    Ok(())
}
