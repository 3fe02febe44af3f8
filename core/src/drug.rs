//! Drug inventory records and their field validation.

use crate::error::{PharmacyError, Result};
use crate::money::validate_price;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use uuid::Uuid;

/// Drug identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DrugId(pub Uuid);

impl DrugId {
    /// Generate a fresh random identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for DrugId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DrugId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// An inventory line item.
///
/// `price` and `quantity` are never negative; the store enforces this with
/// check constraints as well.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Drug {
    /// Identifier
    pub id: DrugId,
    /// Display name
    pub name: String,
    /// Free-form category ("Antibiotic", "Analgesic", ...)
    pub category: Option<String>,
    /// Unit price, two fraction digits
    pub price: Decimal,
    /// Units on hand
    pub quantity: i32,
    /// Expiry as a calendar date
    pub expiry_date: Option<NaiveDate>,
    /// Free-form notes
    pub description: Option<String>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last modification time
    pub updated_at: DateTime<Utc>,
}

/// Request body for creating a drug.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewDrug {
    /// Display name (required, non-blank)
    pub name: String,
    /// Category
    #[serde(default)]
    pub category: Option<String>,
    /// Unit price
    pub price: Decimal,
    /// Initial stock
    pub quantity: i64,
    /// `YYYY-MM-DD` or an RFC 3339 timestamp
    #[serde(default)]
    pub expiry_date: Option<String>,
    /// Notes
    #[serde(default)]
    pub description: Option<String>,
}

impl NewDrug {
    /// Validate the fields and build the record to insert.
    ///
    /// # Errors
    ///
    /// Returns [`PharmacyError::InvalidInput`] for a blank name, a negative
    /// or over-precise price, a negative or oversized quantity, or an
    /// unparseable expiry date.
    pub fn into_drug(self, id: DrugId, now: DateTime<Utc>) -> Result<Drug> {
        Ok(Drug {
            id,
            name: validate_name(self.name)?,
            category: normalize_text(self.category),
            price: validate_price(self.price)?,
            quantity: validate_stock(self.quantity)?,
            expiry_date: self.expiry_date.as_deref().map(parse_calendar_date).transpose()?,
            description: normalize_text(self.description),
            created_at: now,
            updated_at: now,
        })
    }
}

/// Request body for a partial drug update.
///
/// Absent fields are left unchanged. The nullable fields distinguish
/// "absent" (`None`) from an explicit JSON `null` (`Some(None)`), which
/// clears the stored value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DrugPatch {
    /// New name
    #[serde(default)]
    pub name: Option<String>,
    /// New category, or `null` to clear
    #[serde(default, deserialize_with = "double_option")]
    pub category: Option<Option<String>>,
    /// New price
    #[serde(default)]
    pub price: Option<Decimal>,
    /// New stock level
    #[serde(default)]
    pub quantity: Option<i64>,
    /// New expiry date, or `null` to clear
    #[serde(default, deserialize_with = "double_option")]
    pub expiry_date: Option<Option<String>>,
    /// New notes, or `null` to clear
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
}

/// A [`DrugPatch`] whose fields have passed validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidDrugPatch {
    name: Option<String>,
    category: Option<Option<String>>,
    price: Option<Decimal>,
    quantity: Option<i32>,
    expiry_date: Option<Option<NaiveDate>>,
    description: Option<Option<String>>,
}

impl DrugPatch {
    /// Validate every present field.
    ///
    /// # Errors
    ///
    /// Same rules as [`NewDrug::into_drug`], applied only to present fields.
    pub fn validate(self) -> Result<ValidDrugPatch> {
        Ok(ValidDrugPatch {
            name: self.name.map(validate_name).transpose()?,
            category: self.category.map(normalize_text),
            price: self.price.map(validate_price).transpose()?,
            quantity: self.quantity.map(validate_stock).transpose()?,
            expiry_date: self
                .expiry_date
                .map(|date| date.as_deref().map(parse_calendar_date).transpose())
                .transpose()?,
            description: self.description.map(normalize_text),
        })
    }
}

impl ValidDrugPatch {
    /// Apply the patch to a drug read from the store.
    pub fn apply(&self, drug: &mut Drug, now: DateTime<Utc>) {
        if let Some(name) = &self.name {
            drug.name.clone_from(name);
        }
        if let Some(category) = &self.category {
            drug.category.clone_from(category);
        }
        if let Some(price) = self.price {
            drug.price = price;
        }
        if let Some(quantity) = self.quantity {
            drug.quantity = quantity;
        }
        if let Some(expiry_date) = self.expiry_date {
            drug.expiry_date = expiry_date;
        }
        if let Some(description) = &self.description {
            drug.description.clone_from(description);
        }
        drug.updated_at = now;
    }
}

/// Outcome of deleting a drug.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DrugDeletion {
    /// The deleted drug
    pub drug_id: DrugId,
    /// Sale item rows removed along with it
    pub deleted_sale_items: u64,
}

fn validate_name(name: String) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(PharmacyError::invalid("Drug name is required"));
    }
    Ok(trimmed.to_string())
}

fn validate_stock(quantity: i64) -> Result<i32> {
    if quantity < 0 {
        return Err(PharmacyError::invalid("Quantity must not be negative"));
    }
    i32::try_from(quantity)
        .map_err(|_| PharmacyError::invalid(format!("Quantity {quantity} is too large")))
}

/// Blank strings are stored as absent.
fn normalize_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse a calendar date from `YYYY-MM-DD` or an RFC 3339 timestamp.
///
/// # Errors
///
/// Returns [`PharmacyError::InvalidInput`] if neither form parses.
///
/// # Examples
///
/// ```
/// # use pharmacy_core::drug::parse_calendar_date;
/// assert_eq!(parse_calendar_date("2027-03-31").map(|d| d.to_string()), Ok("2027-03-31".into()));
/// assert_eq!(
///     parse_calendar_date("2027-03-31T00:00:00Z").map(|d| d.to_string()),
///     Ok("2027-03-31".into())
/// );
/// assert!(parse_calendar_date("next tuesday").is_err());
/// ```
pub fn parse_calendar_date(raw: &str) -> Result<NaiveDate> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date);
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc).date_naive())
        .map_err(|_| PharmacyError::invalid(format!("Invalid date: {raw}")))
}

/// Deserialize a present field (including `null`) as `Some(..)`.
fn double_option<'de, D, T>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
