//! Read-side revenue aggregation over existing sales.

use crate::drug::{parse_calendar_date, DrugId};
use crate::error::{PharmacyError, Result};
use crate::money;
use crate::sale::Sale;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// How many drugs the ranking keeps.
pub const TOP_DRUGS_LIMIT: usize = 5;

/// Reporting window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Period {
    /// Last 24 hours
    #[serde(rename = "24h")]
    Last24Hours,
    /// Last 7 days
    #[serde(rename = "7d")]
    Last7Days,
    /// Last 30 days
    #[serde(rename = "30d")]
    Last30Days,
    /// Last 365 days
    #[serde(rename = "12m")]
    Last12Months,
    /// Explicit `[startDate, endDate]`
    #[serde(rename = "custom")]
    Custom,
}

impl Period {
    /// Parse the `period` query value. Unknown or missing values mean the last 24 hours.
    #[must_use]
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("7d") => Self::Last7Days,
            Some("30d") => Self::Last30Days,
            Some("12m") => Self::Last12Months,
            Some("custom") => Self::Custom,
            _ => Self::Last24Hours,
        }
    }

    /// Length of a rolling window; `None` for [`Period::Custom`].
    #[must_use]
    pub fn lookback(&self) -> Option<Duration> {
        match self {
            Self::Last24Hours => Some(Duration::hours(24)),
            Self::Last7Days => Some(Duration::days(7)),
            Self::Last30Days => Some(Duration::days(30)),
            Self::Last12Months => Some(Duration::days(365)),
            Self::Custom => None,
        }
    }
}

/// Query string of `GET /analytics`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsQuery {
    /// `24h`, `7d`, `30d`, `12m` or `custom`
    pub period: Option<String>,
    /// Start of a custom window
    pub start_date: Option<String>,
    /// End of a custom window
    pub end_date: Option<String>,
}

/// Inclusive time window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    /// Lower bound (inclusive)
    pub from: DateTime<Utc>,
    /// Upper bound (inclusive)
    pub to: DateTime<Utc>,
}

impl DateRange {
    /// Returns `true` if `at` falls inside the window.
    #[must_use]
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.from <= at && at <= self.to
    }

    /// The UTC calendar day containing `now`, midnight to 23:59:59.999.
    #[must_use]
    pub fn day_of(now: DateTime<Utc>) -> Self {
        let day = now.date_naive();
        Self {
            from: start_of_day(day),
            to: end_of_day(day).unwrap_or(DateTime::<Utc>::MAX_UTC),
        }
    }
}

/// Resolve the query into a concrete period and window.
///
/// A `custom` period missing either bound falls back to the last 24 hours.
///
/// # Errors
///
/// Returns [`PharmacyError::InvalidInput`] if a custom bound does not parse
/// or the start lies after the end.
pub fn resolve_range(query: &AnalyticsQuery, now: DateTime<Utc>) -> Result<(Period, DateRange)> {
    let period = Period::parse(query.period.as_deref());

    if period == Period::Custom {
        if let (Some(start), Some(end)) = (query.start_date.as_deref(), query.end_date.as_deref()) {
            let range = DateRange {
                from: parse_bound(start, Bound::Start)?,
                to: parse_bound(end, Bound::End)?,
            };
            if range.from > range.to {
                return Err(PharmacyError::invalid("startDate must not be after endDate"));
            }
            return Ok((Period::Custom, range));
        }
        let fallback = Period::Last24Hours;
        return Ok((fallback, rolling(fallback, now)));
    }

    Ok((period, rolling(period, now)))
}

fn rolling(period: Period, now: DateTime<Utc>) -> DateRange {
    let lookback = period.lookback().unwrap_or_else(|| Duration::hours(24));
    DateRange {
        from: now - lookback,
        to: now,
    }
}

#[derive(Clone, Copy)]
enum Bound {
    Start,
    End,
}

/// RFC 3339 timestamps are taken as-is; bare dates cover the whole day.
fn parse_bound(raw: &str, bound: Bound) -> Result<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw.trim()) {
        return Ok(ts.with_timezone(&Utc));
    }
    let day = parse_calendar_date(raw)?;
    Ok(match bound {
        Bound::Start => start_of_day(day),
        Bound::End => end_of_day(day)
            .ok_or_else(|| PharmacyError::invalid(format!("Invalid date: {}", raw.trim())))?,
    })
}

fn start_of_day(day: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&day.and_time(NaiveTime::MIN))
}

/// Last millisecond of `day`; `None` past the end of the calendar.
fn end_of_day(day: NaiveDate) -> Option<DateTime<Utc>> {
    start_of_day(day)
        .checked_add_signed(Duration::days(1))?
        .checked_sub_signed(Duration::milliseconds(1))
}

/// One entry of the top-drugs ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopDrug {
    /// Drug sold
    pub drug_id: DrugId,
    /// Snapshot name from the first matching sale item
    pub name: String,
    /// Units sold in the window
    pub quantity: i64,
    /// Σ subtotal in the window
    pub revenue: Decimal,
}

/// Aggregate figures over a set of sales.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesSummary {
    /// Σ sale.total
    pub total_revenue: Decimal,
    /// Σ item.quantity
    pub total_drugs_sold: i64,
    /// Number of sales
    pub sales_count: usize,
    /// Best sellers by quantity, at most [`TOP_DRUGS_LIMIT`]
    pub top_selling_drugs: Vec<TopDrug>,
}

/// Response body of `GET /analytics`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsReport {
    /// Aggregates
    #[serde(flatten)]
    pub summary: SalesSummary,
    /// Resolved period
    pub period: Period,
    /// Window start
    pub from_date: DateTime<Utc>,
    /// Window end
    pub to_date: DateTime<Utc>,
}

/// Response body of `GET /quick-stats`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuickStats {
    /// Drugs in inventory
    pub total_drugs: u64,
    /// Sales since midnight UTC
    pub sales_today: usize,
    /// Revenue since midnight UTC
    pub revenue_today: Decimal,
}

/// Aggregate the given sales.
///
/// Ties in the ranking keep first-encounter order, but callers should treat
/// the order among equal quantities as unspecified.
#[must_use]
pub fn summarize(sales: &[Sale]) -> SalesSummary {
    let mut ranking: Vec<TopDrug> = Vec::new();
    let mut index: HashMap<DrugId, usize> = HashMap::new();
    let mut total_drugs_sold = 0i64;

    for item in sales.iter().flat_map(|sale| &sale.items) {
        total_drugs_sold += i64::from(item.quantity);
        match index.get(&item.drug_id) {
            Some(&slot) => {
                let entry = &mut ranking[slot];
                entry.quantity += i64::from(item.quantity);
                entry.revenue += item.subtotal;
            }
            None => {
                index.insert(item.drug_id, ranking.len());
                ranking.push(TopDrug {
                    drug_id: item.drug_id,
                    name: item.drug_name.clone(),
                    quantity: i64::from(item.quantity),
                    revenue: item.subtotal,
                });
            }
        }
    }

    // stable sort keeps encounter order among ties
    ranking.sort_by(|a, b| b.quantity.cmp(&a.quantity));
    ranking.truncate(TOP_DRUGS_LIMIT);
    for entry in &mut ranking {
        entry.revenue = money::to_currency(entry.revenue);
    }

    SalesSummary {
        total_revenue: money::sum(sales.iter().map(|sale| sale.total)),
        total_drugs_sold,
        sales_count: sales.len(),
        top_selling_drugs: ranking,
    }
}
