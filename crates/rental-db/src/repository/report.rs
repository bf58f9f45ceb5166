//! # Report Repository
//!
//! Aggregations for finance reports. Read-only: nothing here writes, and
//! every figure comes from the reconciled `paid_cents`/`payment_status`
//! columns or from the payment rows themselves.
//!
//! Rentals are placed in a period by their order date,
//! `COALESCE(start_date, event_date)`; canceled rentals never count.

use rental_core::{MonthlyMetric, RankedProduct, RentalFinanceRow, ReportPeriod};
use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::DbResult;

const ORDER_DATE: &str = "COALESCE(r.start_date, r.event_date)";

/// Outstanding balance of a CONFIRMED rental, floored at zero.
const OPEN_BALANCE: &str = "CASE WHEN r.status = 'confirmed' \
                            THEN MAX(r.total_cents - r.paid_cents, 0) ELSE 0 END";

#[derive(Debug)]
pub struct ReportRepository<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> ReportRepository<'c> {
    pub fn new(conn: &'c mut SqliteConnection) -> Self {
        ReportRepository { conn }
    }

    // =========================================================================
    // Totals
    // =========================================================================

    /// Σ payments with `paid_at` in the period.
    pub async fn received(&mut self, period: ReportPeriod) -> DbResult<i64> {
        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COALESCE(SUM(amount_cents), 0)
            FROM payments
            WHERE paid_at IS NOT NULL AND paid_at >= ?1 AND paid_at <= ?2
            "#,
        )
        .bind(period.first_day())
        .bind(period.last_day())
        .fetch_one(&mut *self.conn)
        .await?;

        Ok(total)
    }

    /// `(Σ open balance, rental count)` for the period.
    pub async fn open_balance_and_count(&mut self, period: ReportPeriod) -> DbResult<(i64, i64)> {
        let sql = format!(
            "SELECT COALESCE(SUM({OPEN_BALANCE}), 0), COUNT(*) \
             FROM rentals r \
             WHERE {ORDER_DATE} >= ?1 AND {ORDER_DATE} <= ?2 AND r.status != 'canceled'"
        );
        let totals = sqlx::query_as::<_, (i64, i64)>(&sql)
            .bind(period.first_day())
            .bind(period.last_day())
            .fetch_one(&mut *self.conn)
            .await?;

        Ok(totals)
    }

    /// Rentals in the period with their customer's name, by order date.
    pub async fn rentals(&mut self, period: ReportPeriod) -> DbResult<Vec<RentalFinanceRow>> {
        let sql = format!(
            "SELECT r.id AS rental_id, c.name AS customer_name, r.event_date, r.start_date, \
                    r.end_date, r.status, r.payment_status, r.total_cents, r.paid_cents \
             FROM rentals r JOIN customers c ON c.id = r.customer_id \
             WHERE {ORDER_DATE} >= ?1 AND {ORDER_DATE} <= ?2 AND r.status != 'canceled' \
             ORDER BY {ORDER_DATE}, r.event_date, r.created_at"
        );
        let rows = sqlx::query_as::<_, RentalFinanceRow>(&sql)
            .bind(period.first_day())
            .bind(period.last_day())
            .fetch_all(&mut *self.conn)
            .await?;

        debug!(count = rows.len(), "Listed rentals for finance report");
        Ok(rows)
    }

    // =========================================================================
    // Monthly Series
    // =========================================================================

    /// Σ `total_cents` per month.
    pub async fn monthly_revenue(&mut self, period: ReportPeriod) -> DbResult<Vec<MonthlyMetric>> {
        self.monthly_rentals_metric(period, "SUM(r.total_cents)").await
    }

    /// Rental count per month.
    pub async fn monthly_rentals(&mut self, period: ReportPeriod) -> DbResult<Vec<MonthlyMetric>> {
        self.monthly_rentals_metric(period, "COUNT(*)").await
    }

    /// Σ open balance per month.
    pub async fn monthly_to_receive(
        &mut self,
        period: ReportPeriod,
    ) -> DbResult<Vec<MonthlyMetric>> {
        self.monthly_rentals_metric(period, &format!("SUM({OPEN_BALANCE})"))
            .await
    }

    /// Σ payments per month of `paid_at`.
    pub async fn monthly_received(&mut self, period: ReportPeriod) -> DbResult<Vec<MonthlyMetric>> {
        let rows = sqlx::query_as::<_, (String, i64)>(
            r#"
            SELECT strftime('%Y-%m', paid_at) AS month, COALESCE(SUM(amount_cents), 0)
            FROM payments
            WHERE paid_at IS NOT NULL AND paid_at >= ?1 AND paid_at <= ?2
            GROUP BY month
            ORDER BY month
            "#,
        )
        .bind(period.first_day())
        .bind(period.last_day())
        .fetch_all(&mut *self.conn)
        .await?;

        Ok(to_metrics(rows))
    }

    async fn monthly_rentals_metric(
        &mut self,
        period: ReportPeriod,
        aggregate: &str,
    ) -> DbResult<Vec<MonthlyMetric>> {
        let sql = format!(
            "SELECT strftime('%Y-%m', {ORDER_DATE}) AS month, COALESCE({aggregate}, 0) \
             FROM rentals r \
             WHERE {ORDER_DATE} >= ?1 AND {ORDER_DATE} <= ?2 AND r.status != 'canceled' \
             GROUP BY month \
             ORDER BY month"
        );
        let rows = sqlx::query_as::<_, (String, i64)>(&sql)
            .bind(period.first_day())
            .bind(period.last_day())
            .fetch_all(&mut *self.conn)
            .await?;

        Ok(to_metrics(rows))
    }

    // =========================================================================
    // Rankings
    // =========================================================================

    /// Products by Σ quantity, largest first.
    pub async fn top_products_by_qty(
        &mut self,
        period: ReportPeriod,
        limit: i64,
    ) -> DbResult<Vec<RankedProduct>> {
        self.top_products(period, "SUM(ri.qty)", limit).await
    }

    /// Products by Σ line totals, largest first.
    pub async fn top_products_by_revenue(
        &mut self,
        period: ReportPeriod,
        limit: i64,
    ) -> DbResult<Vec<RankedProduct>> {
        self.top_products(period, "SUM(ri.line_total_cents)", limit).await
    }

    async fn top_products(
        &mut self,
        period: ReportPeriod,
        aggregate: &str,
        limit: i64,
    ) -> DbResult<Vec<RankedProduct>> {
        let sql = format!(
            "SELECT ri.product_id, p.name, COALESCE({aggregate}, 0) AS value \
             FROM rental_items ri \
             JOIN rentals r ON r.id = ri.rental_id \
             JOIN products p ON p.id = ri.product_id \
             WHERE {ORDER_DATE} >= ?1 AND {ORDER_DATE} <= ?2 AND r.status != 'canceled' \
             GROUP BY ri.product_id, p.name \
             ORDER BY value DESC, p.name \
             LIMIT ?3"
        );
        let rows = sqlx::query_as::<_, (String, String, i64)>(&sql)
            .bind(period.first_day())
            .bind(period.last_day())
            .bind(limit)
            .fetch_all(&mut *self.conn)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(product_id, name, value)| RankedProduct {
                product_id,
                name,
                value,
            })
            .collect())
    }
}

fn to_metrics(rows: Vec<(String, i64)>) -> Vec<MonthlyMetric> {
    rows.into_iter()
        .map(|(month, value)| MonthlyMetric { month, value })
        .collect()
}
