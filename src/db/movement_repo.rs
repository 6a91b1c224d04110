// src/db/movement_repo.rs

use sqlx::{Executor, PgPool, Postgres, QueryBuilder};

use crate::{
    common::{error::AppError, pagination::PageParams},
    db::product_repo::like_pattern,
    models::movement::{MovementFilter, MovementRecord, NewMovement, StockMovement},
};

const RECORD_SELECT: &str = r#"
    SELECT
        m.id, m.kind, m.quantity, m.responsible, m.occurred_at,
        m.destination, m.collector, m.withdrawn_by,
        p.sku, p.name AS product_name
    FROM stock_movements AS m
    JOIN products AS p ON m.product_sku = p.sku"#;

#[derive(Clone)]
pub struct MovementRepository {
    pool: PgPool,
}

impl MovementRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Registra uma linha no livro-razão. Nunca é atualizada depois.
    pub async fn record<'e, E>(&self, executor: E, movement: &NewMovement) -> Result<StockMovement, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let recorded = sqlx::query_as::<_, StockMovement>(
            r#"
            INSERT INTO stock_movements
                (product_sku, quantity, kind, responsible, destination, collector, withdrawn_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, product_sku, quantity, kind, responsible, occurred_at,
                      destination, collector, withdrawn_by
            "#,
        )
        .bind(&movement.product_sku)
        .bind(movement.quantity)
        .bind(movement.kind)
        .bind(&movement.responsible)
        .bind(movement.destination.as_deref())
        .bind(movement.collector.as_deref())
        .bind(movement.withdrawn_by.as_deref())
        .fetch_one(executor)
        .await?;

        Ok(recorded)
    }

    pub async fn list_page<'e, E>(
        &self,
        executor: E,
        filter: &MovementFilter,
        page: &PageParams,
    ) -> Result<Vec<MovementRecord>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let mut qb = QueryBuilder::<Postgres>::new(RECORD_SELECT);
        push_movement_filters(&mut qb, filter);
        qb.push(" ORDER BY m.occurred_at DESC, m.id DESC");
        qb.push(" LIMIT ").push_bind(page.limit());
        qb.push(" OFFSET ").push_bind(page.offset());

        let records = qb.build_query_as::<MovementRecord>().fetch_all(executor).await?;
        Ok(records)
    }

    pub async fn count<'e, E>(&self, executor: E, filter: &MovementFilter) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let mut qb = QueryBuilder::<Postgres>::new(
            "SELECT COUNT(m.id) FROM stock_movements AS m JOIN products AS p ON m.product_sku = p.sku",
        );
        push_movement_filters(&mut qb, filter);

        let total = qb.build_query_scalar::<i64>().fetch_one(executor).await?;
        Ok(total)
    }

    /// Mesmo filtro do histórico, sem paginação (exportação CSV no front).
    pub async fn list_all<'e, E>(&self, executor: E, filter: &MovementFilter) -> Result<Vec<MovementRecord>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let mut qb = QueryBuilder::<Postgres>::new(RECORD_SELECT);
        push_movement_filters(&mut qb, filter);
        qb.push(" ORDER BY m.occurred_at DESC, m.id DESC");

        let records = qb.build_query_as::<MovementRecord>().fetch_all(executor).await?;
        Ok(records)
    }
}

pub(crate) fn push_movement_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &MovementFilter) {
    let mut prefix = " WHERE ";

    if let Some(kind) = filter.kind {
        qb.push(prefix).push("m.kind = ").push_bind(kind);
        prefix = " AND ";
    }

    if let Some(product) = non_blank(&filter.product) {
        let pattern = like_pattern(product);
        qb.push(prefix)
            .push("(p.name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR p.sku ILIKE ")
            .push_bind(pattern)
            .push(")");
        prefix = " AND ";
    }

    if let Some(responsible) = non_blank(&filter.responsible) {
        qb.push(prefix).push("m.responsible ILIKE ").push_bind(like_pattern(responsible));
        prefix = " AND ";
    }

    if let Some(details) = non_blank(&filter.details) {
        let pattern = like_pattern(details);
        qb.push(prefix)
            .push("(m.destination ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR m.collector ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR m.withdrawn_by ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::movement::MovementKind;

    fn where_clause(filter: &MovementFilter) -> String {
        let mut qb = QueryBuilder::<Postgres>::new("");
        push_movement_filters(&mut qb, filter);
        qb.sql().trim().to_string()
    }

    #[test]
    fn empty_filter_has_no_where() {
        assert_eq!(where_clause(&MovementFilter::default()), "");
    }

    #[test]
    fn all_filters_bind_in_order() {
        let filter = MovementFilter {
            kind: Some(MovementKind::Exit),
            product: Some("papel".into()),
            responsible: Some("ana".into()),
            details: Some("TI".into()),
        };

        assert_eq!(
            where_clause(&filter),
            "WHERE m.kind = $1 AND (p.name ILIKE $2 OR p.sku ILIKE $3) AND m.responsible ILIKE $4 \
             AND (m.destination ILIKE $5 OR m.collector ILIKE $6 OR m.withdrawn_by ILIKE $7)"
        );
    }

    #[test]
    fn blank_text_filters_are_skipped() {
        let filter = MovementFilter {
            kind: None,
            product: Some(" ".into()),
            responsible: None,
            details: Some("almox".into()),
        };

        assert_eq!(
            where_clause(&filter),
            "WHERE (m.destination ILIKE $1 OR m.collector ILIKE $2 OR m.withdrawn_by ILIKE $3)"
        );
    }
}
