//! # Report Service
//!
//! Finance totals, per-month series and product rankings for a period.
//! Every call reads through one pooled connection; nothing is locked.

use rental_core::{
    FinanceReport, MonthlyMetric, RankedProduct, RentalFinanceRow, ReportPeriod, ValidationError,
};
use tracing::debug;

use super::error::ServiceResult;
use crate::pool::Database;
use crate::repository::report::ReportRepository;

#[derive(Debug, Clone)]
pub struct ReportService {
    db: Database,
}

impl ReportService {
    pub fn new(db: Database) -> Self {
        ReportService { db }
    }

    /// Received, to-receive and rental count for `period`.
    pub async fn finance_report(&self, period: ReportPeriod) -> ServiceResult<FinanceReport> {
        let mut conn = self.db.acquire().await?;
        let mut reports = ReportRepository::new(&mut conn);

        let received_cents = reports.received(period).await?;
        let (to_receive_cents, rentals_count) = reports.open_balance_and_count(period).await?;

        let report = FinanceReport {
            received_cents,
            to_receive_cents,
            rentals_count,
        };
        debug!(
            from = %period.first_day(),
            to = %period.last_day(),
            received = %report.received(),
            to_receive = %report.to_receive(),
            rentals = rentals_count,
            "Finance report"
        );
        Ok(report)
    }

    pub async fn rentals_in_period(
        &self,
        period: ReportPeriod,
    ) -> ServiceResult<Vec<RentalFinanceRow>> {
        let mut conn = self.db.acquire().await?;
        Ok(ReportRepository::new(&mut conn).rentals(period).await?)
    }

    // =========================================================================
    // Monthly Series
    // =========================================================================

    pub async fn monthly_revenue(&self, period: ReportPeriod) -> ServiceResult<Vec<MonthlyMetric>> {
        let mut conn = self.db.acquire().await?;
        Ok(ReportRepository::new(&mut conn).monthly_revenue(period).await?)
    }

    pub async fn monthly_rentals(&self, period: ReportPeriod) -> ServiceResult<Vec<MonthlyMetric>> {
        let mut conn = self.db.acquire().await?;
        Ok(ReportRepository::new(&mut conn).monthly_rentals(period).await?)
    }

    /// Grouped by the month of each payment's `paid_at`.
    pub async fn monthly_received(&self, period: ReportPeriod) -> ServiceResult<Vec<MonthlyMetric>> {
        let mut conn = self.db.acquire().await?;
        Ok(ReportRepository::new(&mut conn).monthly_received(period).await?)
    }

    pub async fn monthly_to_receive(
        &self,
        period: ReportPeriod,
    ) -> ServiceResult<Vec<MonthlyMetric>> {
        let mut conn = self.db.acquire().await?;
        Ok(ReportRepository::new(&mut conn)
            .monthly_to_receive(period)
            .await?)
    }

    // =========================================================================
    // Rankings
    // =========================================================================

    pub async fn top_products_by_qty(
        &self,
        period: ReportPeriod,
        limit: i64,
    ) -> ServiceResult<Vec<RankedProduct>> {
        check_limit(limit)?;
        let mut conn = self.db.acquire().await?;
        Ok(ReportRepository::new(&mut conn)
            .top_products_by_qty(period, limit)
            .await?)
    }

    pub async fn top_products_by_revenue(
        &self,
        period: ReportPeriod,
        limit: i64,
    ) -> ServiceResult<Vec<RankedProduct>> {
        check_limit(limit)?;
        let mut conn = self.db.acquire().await?;
        Ok(ReportRepository::new(&mut conn)
            .top_products_by_revenue(period, limit)
            .await?)
    }
}

fn check_limit(limit: i64) -> Result<(), ValidationError> {
    if limit <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "limit".to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
