// src/db/report_repo.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{Acquire, Executor, PgPool, Postgres, QueryBuilder};

use crate::{
    common::error::AppError,
    models::report::{
        ConsumptionDetail, ConsumptionWindow, DailyStats, DestinationConsumption, SpendEntry, StockStats,
    },
};

#[derive(Clone)]
pub struct ReportRepository {
    pool: PgPool,
}

impl ReportRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    // 1. Cards do topo
    pub async fn stock_stats<'e, E>(&self, executor: E) -> Result<StockStats, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let (total_products, low_stock, out_of_stock) = sqlx::query_as::<_, (i64, i64, i64)>(
            r#"
            SELECT
                COUNT(*),
                COUNT(*) FILTER (WHERE quantity <= min_stock AND quantity > 0),
                COUNT(*) FILTER (WHERE quantity = 0)
            FROM products
            "#,
        )
        .fetch_one(executor)
        .await?;

        Ok(StockStats { total_products, low_stock, out_of_stock })
    }

    // 2. Movimento de hoje
    pub async fn daily_stats<'e, E>(&self, executor: E) -> Result<DailyStats, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        // Snapshot consistente das duas tabelas
        let mut tx = executor.begin().await?;

        let (entries_today, exits_today) = sqlx::query_as::<_, (i64, i64)>(
            r#"
            SELECT
                COALESCE(SUM(quantity) FILTER (WHERE kind = 'ENTRY'), 0)::BIGINT,
                COALESCE(SUM(quantity) FILTER (WHERE kind = 'EXIT'), 0)::BIGINT
            FROM stock_movements
            WHERE occurred_at::date = CURRENT_DATE
            "#,
        )
        .fetch_one(&mut *tx)
        .await?;

        let spend_today = sqlx::query_scalar::<_, Decimal>(
            "SELECT COALESCE(SUM(total_value), 0) FROM invoices WHERE received_date = CURRENT_DATE",
        )
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(DailyStats { entries_today, exits_today, spend_today })
    }

    // 3. Gastos (NFs recebidas no intervalo fechado)
    pub async fn spend<'e, E>(
        &self,
        executor: E,
        start: NaiveDate,
        end: NaiveDate,
        supplier: Option<&str>,
    ) -> Result<Vec<SpendEntry>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let mut qb = QueryBuilder::<Postgres>::new(
            "SELECT id, invoice_number, supplier, received_date, total_value FROM invoices WHERE received_date BETWEEN ",
        );
        qb.push_bind(start).push(" AND ").push_bind(end);

        if let Some(supplier) = supplier {
            qb.push(" AND supplier = ").push_bind(supplier.to_string());
        }
        qb.push(" ORDER BY received_date DESC");

        let rows = qb.build_query_as::<SpendEntry>().fetch_all(executor).await?;
        Ok(rows)
    }

    // 4. Consumo por destino
    pub async fn consumption_by_destination<'e, E>(
        &self,
        executor: E,
        start: NaiveDate,
        end: NaiveDate,
        category: Option<&str>,
    ) -> Result<Vec<DestinationConsumption>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let mut qb = QueryBuilder::<Postgres>::new(
            r#"
            SELECT
                m.destination AS destination,
                COUNT(m.id) AS total_movements,
                COALESCE(SUM(m.quantity), 0)::BIGINT AS total_units
            FROM stock_movements AS m
            JOIN products AS p ON m.product_sku = p.sku
            WHERE m.kind = 'EXIT'
              AND m.destination IS NOT NULL AND m.destination <> ''"#,
        );
        push_exit_range(&mut qb, start, end, category);
        qb.push(" GROUP BY m.destination ORDER BY total_units DESC");

        let rows = qb.build_query_as::<DestinationConsumption>().fetch_all(executor).await?;
        Ok(rows)
    }

    pub async fn consumption_detail<'e, E>(
        &self,
        executor: E,
        start: NaiveDate,
        end: NaiveDate,
        destination: &str,
        category: Option<&str>,
    ) -> Result<Vec<ConsumptionDetail>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let mut qb = QueryBuilder::<Postgres>::new(
            r#"
            SELECT m.occurred_at, p.sku, p.name, m.quantity, m.responsible
            FROM stock_movements AS m
            JOIN products AS p ON m.product_sku = p.sku
            WHERE m.kind = 'EXIT'"#,
        );
        qb.push(" AND m.destination = ").push_bind(destination.to_string());
        push_exit_range(&mut qb, start, end, category);
        qb.push(" ORDER BY m.occurred_at DESC");

        let rows = qb.build_query_as::<ConsumptionDetail>().fetch_all(executor).await?;
        Ok(rows)
    }

    // 5. Provisionamento: saídas somadas na janela de `period` dias, por produto.
    // A conta dos dias restantes é feita no serviço.
    pub async fn consumption_window<'e, E>(&self, executor: E, period: i32) -> Result<Vec<ConsumptionWindow>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, ConsumptionWindow>(
            r#"
            SELECT
                p.sku, p.name, p.quantity, p.min_stock,
                COALESCE(cons.consumed, 0)::BIGINT AS consumed
            FROM products AS p
            LEFT JOIN (
                SELECT product_sku, SUM(quantity) AS consumed
                FROM stock_movements
                WHERE kind = 'EXIT' AND occurred_at >= (CURRENT_DATE - $1::int)
                GROUP BY product_sku
            ) AS cons ON p.sku = cons.product_sku
            "#,
        )
        .bind(period)
        .fetch_all(executor)
        .await?;

        Ok(rows)
    }
}

fn push_exit_range(qb: &mut QueryBuilder<'_, Postgres>, start: NaiveDate, end: NaiveDate, category: Option<&str>) {
    qb.push(" AND m.occurred_at::date BETWEEN ")
        .push_bind(start)
        .push(" AND ")
        .push_bind(end);

    if let Some(category) = category {
        qb.push(" AND p.category = ").push_bind(category.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    #[test]
    fn exit_range_without_category() {
        let mut qb = QueryBuilder::<Postgres>::new("");
        push_exit_range(&mut qb, day(1), day(31), None);
        assert_eq!(qb.sql().trim(), "AND m.occurred_at::date BETWEEN $1 AND $2");
    }

    #[test]
    fn exit_range_with_category() {
        let mut qb = QueryBuilder::<Postgres>::new("");
        push_exit_range(&mut qb, day(1), day(31), Some("Papelaria"));
        assert_eq!(
            qb.sql().trim(),
            "AND m.occurred_at::date BETWEEN $1 AND $2 AND p.category = $3"
        );
    }
}
