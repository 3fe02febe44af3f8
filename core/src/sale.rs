//! Sales, their line items, and the pure sale planner.
//!
//! Creating a sale is a read-validate-write sequence. The read and the
//! write belong to the store (inside one transaction); the validation and
//! arithmetic in between live here as [`plan_sale`], so that every store
//! implementation applies exactly the same rules to the rows it has locked.

use crate::drug::{Drug, DrugId};
use crate::error::{PharmacyError, Result};
use crate::money;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

/// Sale identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SaleId(pub Uuid);

impl SaleId {
    /// Generate a fresh random identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SaleId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SaleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Sale item identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SaleItemId(pub Uuid);

impl SaleItemId {
    /// Generate a fresh random identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SaleItemId {
    fn default() -> Self {
        Self::new()
    }
}

/// An immutable record of a completed transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    /// Identifier
    pub id: SaleId,
    /// Sum of item subtotals at creation time; never recomputed
    pub total: Decimal,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Line items
    pub items: Vec<SaleItem>,
}

/// One line of a sale.
///
/// `drug_name` and `price` are snapshots taken when the sale was created;
/// later edits to the drug do not touch them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleItem {
    /// Identifier
    pub id: SaleItemId,
    /// Owning sale
    pub sale_id: SaleId,
    /// Drug sold
    pub drug_id: DrugId,
    /// Drug name at time of sale
    pub drug_name: String,
    /// Units sold (> 0)
    pub quantity: i32,
    /// Unit price at time of sale
    pub price: Decimal,
    /// `price × quantity`
    pub subtotal: Decimal,
}

/// One requested line of a new sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SaleLine {
    /// Drug to sell
    pub drug_id: DrugId,
    /// Units requested; must be a positive integer
    pub quantity: i64,
}

/// Request body for `POST /sales`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateSale {
    /// Requested lines, validated in order
    pub items: Vec<SaleLine>,
}

/// A sale ready to be persisted: everything the store needs except the rows.
#[derive(Debug, Clone)]
pub struct NewSale {
    /// Identifier to assign
    pub id: SaleId,
    /// Creation time to record
    pub created_at: DateTime<Utc>,
    /// Requested lines
    pub lines: Vec<SaleLine>,
}

/// A validated line with its snapshot and subtotal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedItem {
    /// Drug sold
    pub drug_id: DrugId,
    /// Name snapshot
    pub drug_name: String,
    /// Units sold
    pub quantity: i32,
    /// Unit price snapshot
    pub price: Decimal,
    /// `price × quantity`
    pub subtotal: Decimal,
}

/// The validated outcome of [`plan_sale`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SalePlan {
    /// Lines in request order
    pub items: Vec<PlannedItem>,
    /// Stock decrement per drug, in first-encounter order
    pub decrements: Vec<(DrugId, i32)>,
    /// Σ subtotal
    pub total: Decimal,
}

impl SalePlan {
    /// Materialize the sale record for the given identity.
    #[must_use]
    pub fn into_sale(self, id: SaleId, created_at: DateTime<Utc>) -> Sale {
        let items = self
            .items
            .into_iter()
            .map(|item| SaleItem {
                id: SaleItemId::new(),
                sale_id: id,
                drug_id: item.drug_id,
                drug_name: item.drug_name,
                quantity: item.quantity,
                price: item.price,
                subtotal: item.subtotal,
            })
            .collect();

        Sale {
            id,
            total: self.total,
            created_at,
            items,
        }
    }
}

/// Reject an empty sale before touching the store.
///
/// # Errors
///
/// Returns [`PharmacyError::InvalidInput`] if `lines` is empty.
pub fn ensure_not_empty(lines: &[SaleLine]) -> Result<()> {
    if lines.is_empty() {
        return Err(PharmacyError::invalid("Sale items are required"));
    }
    Ok(())
}

/// Validate requested lines against current stock and price them.
///
/// `drugs` holds the current rows for (at least) every referenced drug, as
/// read by the caller inside its transaction. Lines are checked in order and
/// the first violation wins:
///
/// 1. the drug must exist → [`PharmacyError::NotFound`]
/// 2. the cumulative quantity requested for that drug must not exceed its
///    stock → [`PharmacyError::InsufficientStock`]
/// 3. the quantity must be a positive integer → [`PharmacyError::InvalidInput`]
///
/// # Errors
///
/// See above; an empty `lines`, or a subtotal or total above
/// [`money::MAX_AMOUNT`], is also [`PharmacyError::InvalidInput`].
pub fn plan_sale(lines: &[SaleLine], drugs: &HashMap<DrugId, Drug>) -> Result<SalePlan> {
    ensure_not_empty(lines)?;

    let mut items = Vec::with_capacity(lines.len());
    let mut decrements: Vec<(DrugId, i32)> = Vec::new();
    let mut requested_so_far: HashMap<DrugId, i64> = HashMap::new();

    for line in lines {
        let drug = drugs
            .get(&line.drug_id)
            .ok_or_else(|| PharmacyError::not_found("Drug", line.drug_id))?;

        let requested = requested_so_far
            .get(&drug.id)
            .copied()
            .unwrap_or(0)
            .saturating_add(line.quantity);
        if requested > i64::from(drug.quantity) {
            return Err(PharmacyError::InsufficientStock {
                drug_name: drug.name.clone(),
                available: i64::from(drug.quantity),
                requested,
            });
        }

        if line.quantity < 1 {
            return Err(PharmacyError::invalid(format!(
                "Quantity for {} must be a positive integer",
                drug.name
            )));
        }
        // bounded by drug.quantity above, so this cannot fail
        let quantity = i32::try_from(line.quantity)
            .map_err(|_| PharmacyError::invalid("Quantity is too large"))?;

        requested_so_far.insert(drug.id, requested);
        match decrements.iter_mut().find(|(id, _)| *id == drug.id) {
            Some((_, total)) => *total += quantity,
            None => decrements.push((drug.id, quantity)),
        }

        items.push(PlannedItem {
            drug_id: drug.id,
            drug_name: drug.name.clone(),
            quantity,
            price: drug.price,
            subtotal: money::subtotal(drug.price, quantity)?,
        });
    }

    let total = money::ensure_storable(
        "Sale total",
        money::sum(items.iter().map(|item| item.subtotal)),
    )?;

    Ok(SalePlan {
        items,
        decrements,
        total,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::str::FromStr;

    fn drug(name: &str, price: &str, quantity: i32) -> Drug {
        let now = Utc::now();
        Drug {
            id: DrugId::new(),
            name: name.to_string(),
            category: None,
            price: Decimal::from_str(price).unwrap(),
            quantity,
            expiry_date: None,
            description: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn catalog(drugs: &[Drug]) -> HashMap<DrugId, Drug> {
        drugs.iter().map(|d| (d.id, d.clone())).collect()
    }

    fn line(drug: &Drug, quantity: i64) -> SaleLine {
        SaleLine {
            drug_id: drug.id,
            quantity,
        }
    }

    #[test]
    fn test_worked_example() {
        let a = drug("A", "10.00", 5);
        let b = drug("B", "4.50", 2);
        let plan = plan_sale(&[line(&a, 3), line(&b, 2)], &catalog(&[a.clone(), b.clone()])).unwrap();

        let subtotals: Vec<String> = plan.items.iter().map(|i| i.subtotal.to_string()).collect();
        assert_eq!(subtotals, vec!["30.00", "9.00"]);
        assert_eq!(plan.total.to_string(), "39.00");
        assert_eq!(plan.decrements, vec![(a.id, 3), (b.id, 2)]);
    }

    #[test]
    fn test_empty_sale_is_invalid() {
        assert!(matches!(
            plan_sale(&[], &HashMap::new()),
            Err(PharmacyError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_unknown_drug_is_not_found() {
        let a = drug("A", "1.00", 5);
        let missing = DrugId::new();
        let result = plan_sale(
            &[line(&a, 1), SaleLine { drug_id: missing, quantity: 1 }],
            &catalog(&[a]),
        );
        assert_eq!(result, Err(PharmacyError::not_found("Drug", missing)));
    }

    #[test]
    fn test_insufficient_stock_reports_available_and_requested() {
        let a = drug("Ibuprofen", "1.00", 2);
        let result = plan_sale(&[line(&a, 3)], &catalog(&[a]));
        assert_eq!(
            result,
            Err(PharmacyError::InsufficientStock {
                drug_name: "Ibuprofen".to_string(),
                available: 2,
                requested: 3,
            })
        );
    }

    #[test]
    fn test_repeated_lines_are_checked_cumulatively() {
        let a = drug("A", "1.00", 5);
        let result = plan_sale(&[line(&a, 3), line(&a, 3)], &catalog(&[a.clone()]));
        assert!(matches!(
            result,
            Err(PharmacyError::InsufficientStock { requested: 6, available: 5, .. })
        ));

        let plan = plan_sale(&[line(&a, 2), line(&a, 3)], &catalog(&[a.clone()])).unwrap();
        assert_eq!(plan.items.len(), 2);
        assert_eq!(plan.decrements, vec![(a.id, 5)]);
    }

    #[test]
    fn test_non_positive_quantity_is_invalid() {
        let a = drug("A", "1.00", 5);
        assert!(matches!(
            plan_sale(&[line(&a, 0)], &catalog(&[a.clone()])),
            Err(PharmacyError::InvalidInput(_))
        ));
        assert!(matches!(
            plan_sale(&[line(&a, -2)], &catalog(&[a])),
            Err(PharmacyError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_first_offending_line_wins() {
        let a = drug("A", "1.00", 1);
        let missing = DrugId::new();
        // stock violation on line 1 is reported before the unknown drug on line 2
        let result = plan_sale(
            &[line(&a, 2), SaleLine { drug_id: missing, quantity: 1 }],
            &catalog(&[a]),
        );
        assert!(matches!(result, Err(PharmacyError::InsufficientStock { .. })));
    }

    #[test]
    fn test_into_sale_links_items_to_sale() {
        let a = drug("A", "2.00", 3);
        let plan = plan_sale(&[line(&a, 1)], &catalog(&[a])).unwrap();
        let id = SaleId::new();
        let sale = plan.into_sale(id, Utc::now());
        assert_eq!(sale.items.len(), 1);
        assert_eq!(sale.items[0].sale_id, id);
        assert_eq!(sale.items[0].drug_name, "A");
    }

    #[test]
    fn test_amounts_beyond_the_store_are_invalid() {
        // seeded rows bypass price validation
        let huge = drug("Huge", "39614081257132168796771975168", 5);
        assert!(matches!(
            plan_sale(&[line(&huge, 3)], &catalog(&[huge.clone()])),
            Err(PharmacyError::InvalidInput(_))
        ));

        let a = drug("A", "6000000000.00", 1);
        let b = drug("B", "6000000000.00", 1);
        let result = plan_sale(&[line(&a, 1), line(&b, 1)], &catalog(&[a, b]));
        assert!(matches!(result, Err(PharmacyError::InvalidInput(msg)) if msg.contains("Sale total")));
    }

    #[test]
    fn test_create_sale_rejects_fractional_quantity() {
        let id = Uuid::new_v4();
        let body = format!(r#"{{"items":[{{"drugId":"{id}","quantity":1.5}}]}}"#);
        assert!(serde_json::from_str::<CreateSale>(&body).is_err());
    }

    proptest! {
        #[test]
        fn prop_total_is_sum_of_subtotals(
            stock in prop::collection::vec((1i64..100_000, 1i32..500), 1..8),
            pick in prop::collection::vec((0usize..8, 1i64..20), 1..12),
        ) {
            let drugs: Vec<Drug> = stock
                .iter()
                .enumerate()
                .map(|(i, (cents, qty))| drug(&format!("D{i}"), &format!("{}.{:02}", cents / 100, cents % 100), *qty))
                .collect();
            let lines: Vec<SaleLine> = pick
                .iter()
                .map(|(idx, qty)| line(&drugs[idx % drugs.len()], *qty))
                .collect();

            if let Ok(plan) = plan_sale(&lines, &catalog(&drugs)) {
                let sum: Decimal = plan.items.iter().map(|i| i.subtotal).sum();
                prop_assert_eq!(plan.total, sum);
                for item in &plan.items {
                    prop_assert_eq!(item.subtotal, item.price * Decimal::from(item.quantity));
                }
                for (id, decrement) in &plan.decrements {
                    let on_hand = drugs.iter().find(|d| d.id == *id).map(|d| d.quantity).unwrap();
                    prop_assert!(on_hand - decrement >= 0);
                }
            }
        }
    }
}
