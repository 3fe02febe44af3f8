use crate::environment::Clock;
use crate::error::Result;
use crate::repository::SaleRepository;
use crate::sale::{ensure_not_empty, CreateSale, NewSale, Sale, SaleId};
use crate::user::Principal;
use std::sync::Arc;

/// Recording and listing sales. Open to every signed-in role.
#[derive(Clone)]
pub struct SalesService<R> {
    sales: R,
    clock: Arc<dyn Clock>,
}

impl<R: SaleRepository> SalesService<R> {
    /// Create a service over the given store.
    pub fn new(sales: R, clock: Arc<dyn Clock>) -> Self {
        Self { sales, clock }
    }

    /// Record a sale and decrement stock, all or nothing.
    ///
    /// # Errors
    ///
    /// - No lines, or a non-positive quantity → [`PharmacyError::InvalidInput`](crate::PharmacyError::InvalidInput)
    /// - Unknown drug → [`PharmacyError::NotFound`](crate::PharmacyError::NotFound)
    /// - Not enough stock → [`PharmacyError::InsufficientStock`](crate::PharmacyError::InsufficientStock)
    #[tracing::instrument(skip_all, fields(user_id = %principal.user_id, lines = request.items.len()))]
    pub async fn create(&self, principal: &Principal, request: CreateSale) -> Result<Sale> {
        if let Err(e) = ensure_not_empty(&request.items) {
            metrics::counter!("pharmacy_sales_rejected_total", "reason" => e.reason()).increment(1);
            return Err(e);
        }

        let new_sale = NewSale {
            id: SaleId::new(),
            created_at: self.clock.now(),
            lines: request.items,
        };

        match self.sales.create_sale(&new_sale).await {
            Ok(sale) => {
                let units: u64 = sale
                    .items
                    .iter()
                    .map(|item| u64::try_from(item.quantity).unwrap_or(0))
                    .sum();
                metrics::counter!("pharmacy_sales_created_total").increment(1);
                metrics::counter!("pharmacy_units_sold_total").increment(units);
                tracing::info!(sale_id = %sale.id, total = %sale.total, units, "Sale recorded");
                Ok(sale)
            }
            Err(e) => {
                metrics::counter!("pharmacy_sales_rejected_total", "reason" => e.reason()).increment(1);
                if e.is_user_error() {
                    tracing::info!(reason = e.reason(), error = %e, "Sale rejected");
                } else {
                    tracing::error!(error = %e, "Sale failed");
                }
                Err(e)
            }
        }
    }

    /// All sales with their items, newest first.
    ///
    /// # Errors
    ///
    /// Store failures.
    pub async fn list(&self, _principal: &Principal) -> Result<Vec<Sale>> {
        self.sales.list_sales().await
    }
}
