use crate::analytics::{resolve_range, summarize, AnalyticsQuery, AnalyticsReport, DateRange, QuickStats};
use crate::environment::Clock;
use crate::error::Result;
use crate::repository::{DrugRepository, SaleRepository};
use crate::user::Principal;
use std::sync::Arc;

/// Revenue reporting.
#[derive(Clone)]
pub struct AnalyticsService<R> {
    store: R,
    clock: Arc<dyn Clock>,
}

impl<R: DrugRepository + SaleRepository> AnalyticsService<R> {
    /// Create a service over the given store.
    pub fn new(store: R, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Aggregate sales inside the requested window. Administrators only.
    ///
    /// # Errors
    ///
    /// - Caller is not an administrator → [`PharmacyError::Forbidden`](crate::PharmacyError::Forbidden)
    /// - Unparseable custom bounds → [`PharmacyError::InvalidInput`](crate::PharmacyError::InvalidInput)
    pub async fn report(&self, principal: &Principal, query: &AnalyticsQuery) -> Result<AnalyticsReport> {
        principal.require_admin("Viewing analytics")?;

        let (period, range) = resolve_range(query, self.clock.now())?;
        let sales = self.store.sales_between(range).await?;
        tracing::debug!(?period, from = %range.from, to = %range.to, sales = sales.len(), "Analytics window");

        Ok(AnalyticsReport {
            summary: summarize(&sales),
            period,
            from_date: range.from,
            to_date: range.to,
        })
    }

    /// Inventory size plus today's sales count and revenue (UTC day).
    ///
    /// # Errors
    ///
    /// Store failures.
    pub async fn quick_stats(&self, _principal: &Principal) -> Result<QuickStats> {
        let today = DateRange::day_of(self.clock.now());
        let total_drugs = self.store.count_drugs().await?;
        let sales = self.store.sales_between(today).await?;
        let summary = summarize(&sales);

        Ok(QuickStats {
            total_drugs,
            sales_today: summary.sales_count,
            revenue_today: summary.total_revenue,
        })
    }
}
