//! Product domain types and form validation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use cellarbook_core::{Price, PriceError, ProductId, UserId};

const MAX_NAME_LENGTH: usize = 100;
const MAX_CATEGORY_LENGTH: usize = 50;
const MAX_KIND_LENGTH: usize = 50;
const MAX_STRENGTH: f64 = 100.0;

/// A product record owned by exactly one user.
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub category: String,
    /// Beverage type ("Vodka", "Lager", ...). Named `kind` since `type` is reserved.
    pub kind: String,
    /// Bottle volume in litres.
    pub volume: f64,
    /// Alcohol by volume, in percent.
    pub strength: f64,
    pub quantity: i64,
    pub price: Price,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub owner_id: UserId,
}

/// Validated product fields, as written by create and edit.
///
/// Edit always replaces every field; there is no partial update.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductInput {
    pub name: String,
    pub category: String,
    pub kind: String,
    pub volume: f64,
    pub strength: f64,
    pub quantity: i64,
    pub price: Price,
}

/// A product field that failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("{0} must be at most {1} characters")]
    TooLong(&'static str, usize),

    #[error("{0} must be a number")]
    NotANumber(&'static str),

    #[error("{0} must be a whole number")]
    NotAnInteger(&'static str),

    #[error("{0} cannot be negative")]
    Negative(&'static str),

    #[error("{0} must be between 0 and 100")]
    OutOfRange(&'static str),
}

/// Raw product form as submitted by the browser.
///
/// Every field defaults to empty so a missing input surfaces as a
/// `ValidationError` rather than a form rejection.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ProductForm {
    pub name: String,
    pub category: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub volume: String,
    pub strength: String,
    pub quantity: String,
    pub price: String,
}

impl ProductForm {
    /// Validate and convert the submitted strings.
    ///
    /// # Errors
    ///
    /// Returns the first `ValidationError`, checking fields in form order.
    pub fn validate(&self) -> Result<ProductInput, ValidationError> {
        let name = required_text("Name", &self.name, MAX_NAME_LENGTH)?;
        let category = required_text("Category", &self.category, MAX_CATEGORY_LENGTH)?;
        let kind = required_text("Type", &self.kind, MAX_KIND_LENGTH)?;

        let volume = parse_non_negative("Volume", &self.volume)?;

        let strength = parse_number("Strength", &self.strength)?;
        if !(0.0..=MAX_STRENGTH).contains(&strength) {
            return Err(ValidationError::OutOfRange("Strength"));
        }

        let quantity = self.quantity.trim();
        if quantity.is_empty() {
            return Err(ValidationError::Missing("Quantity"));
        }
        let quantity: i64 = quantity
            .parse()
            .map_err(|_| ValidationError::NotAnInteger("Quantity"))?;
        if quantity < 0 {
            return Err(ValidationError::Negative("Quantity"));
        }

        if self.price.trim().is_empty() {
            return Err(ValidationError::Missing("Price"));
        }
        let price = Price::parse(&self.price).map_err(|e| match e {
            PriceError::NotANumber => ValidationError::NotANumber("Price"),
            PriceError::Negative => ValidationError::Negative("Price"),
        })?;

        Ok(ProductInput {
            name,
            category,
            kind,
            volume,
            strength,
            quantity,
            price,
        })
    }
}

impl From<&Product> for ProductForm {
    fn from(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            category: product.category.clone(),
            kind: product.kind.clone(),
            volume: product.volume.to_string(),
            strength: product.strength.to_string(),
            quantity: product.quantity.to_string(),
            price: product.price.amount().normalize().to_string(),
        }
    }
}

fn required_text(
    field: &'static str,
    value: &str,
    max_len: usize,
) -> Result<String, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::Missing(field));
    }
    if value.chars().count() > max_len {
        return Err(ValidationError::TooLong(field, max_len));
    }
    Ok(value.to_owned())
}

fn parse_number(field: &'static str, value: &str) -> Result<f64, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::Missing(field));
    }
    match value.parse::<f64>() {
        Ok(n) if n.is_finite() => Ok(n),
        _ => Err(ValidationError::NotANumber(field)),
    }
}

fn parse_non_negative(field: &'static str, value: &str) -> Result<f64, ValidationError> {
    let n = parse_number(field, value)?;
    if n < 0.0 {
        return Err(ValidationError::Negative(field));
    }
    Ok(n)
}
