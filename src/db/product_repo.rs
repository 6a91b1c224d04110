// src/db/product_repo.rs

use sqlx::{Executor, PgPool, Postgres, QueryBuilder};

use crate::{
    common::{error::AppError, pagination::PageParams},
    models::product::{CreateProductPayload, Product, ProductFilter, ProductOption, UpdateProductPayload},
};

const PRODUCT_COLUMNS: &str =
    "sku, name, category, description, quantity, min_stock, packaging_factor, created_at, updated_at";

/// Padrão para ILIKE com os curingas do usuário escapados.
pub(crate) fn like_pattern(term: &str) -> String {
    let escaped = term
        .trim()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

#[derive(Clone)]
pub struct ProductRepository {
    pool: PgPool,
}

impl ProductRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    // ---
    // Funções de "Leitura"
    // ---

    pub async fn find_by_sku<'e, E>(&self, executor: E, sku: &str) -> Result<Option<Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE sku = $1"
        ))
        .bind(sku)
        .fetch_optional(executor)
        .await?;

        Ok(product)
    }

    /// SELECT ... FOR UPDATE: a linha fica bloqueada até o fim da transação.
    pub async fn find_for_update<'e, E>(&self, executor: E, sku: &str) -> Result<Option<Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE sku = $1 FOR UPDATE"
        ))
        .bind(sku)
        .fetch_optional(executor)
        .await?;

        Ok(product)
    }

    pub async fn find_packaging_factors<'e, E>(
        &self,
        executor: E,
        skus: &[String],
    ) -> Result<Vec<(String, i32)>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, (String, i32)>(
            "SELECT sku, packaging_factor FROM products WHERE sku = ANY($1)",
        )
        .bind(skus)
        .fetch_all(executor)
        .await?;

        Ok(rows)
    }

    pub async fn list_page<'e, E>(
        &self,
        executor: E,
        filter: &ProductFilter,
        page: &PageParams,
    ) -> Result<Vec<Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {PRODUCT_COLUMNS} FROM products"));
        push_product_filters(&mut qb, filter);
        push_product_order(&mut qb, filter);
        qb.push(" LIMIT ").push_bind(page.limit());
        qb.push(" OFFSET ").push_bind(page.offset());

        let products = qb.build_query_as::<Product>().fetch_all(executor).await?;
        Ok(products)
    }

    pub async fn count<'e, E>(&self, executor: E, filter: &ProductFilter) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM products");
        push_product_filters(&mut qb, filter);

        let total = qb.build_query_scalar::<i64>().fetch_one(executor).await?;
        Ok(total)
    }

    pub async fn list_options<'e, E>(&self, executor: E) -> Result<Vec<ProductOption>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let options = sqlx::query_as::<_, ProductOption>(
            "SELECT sku, name, quantity FROM products ORDER BY name ASC",
        )
        .fetch_all(executor)
        .await?;

        Ok(options)
    }

    pub async fn list_categories<'e, E>(&self, executor: E) -> Result<Vec<String>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let categories = sqlx::query_scalar::<_, String>(
            r#"
            SELECT DISTINCT category
            FROM products
            WHERE category <> ''
            ORDER BY category ASC
            "#,
        )
        .fetch_all(executor)
        .await?;

        Ok(categories)
    }

    // ---
    // Funções de "Escrita"
    // ---

    /// Cadastra um produto com estoque zero. O SKU já deve vir normalizado.
    pub async fn create<'e, E>(&self, executor: E, payload: &CreateProductPayload) -> Result<Product, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Product>(&format!(
            r#"
            INSERT INTO products (sku, name, category, description, min_stock, packaging_factor)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(&payload.sku)
        .bind(payload.name.trim())
        .bind(payload.category.trim())
        .bind(payload.description.as_deref())
        .bind(payload.min_stock)
        .bind(payload.packaging_factor)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AppError::SkuAlreadyExists(payload.sku.clone());
                }
            }
            e.into()
        })
    }

    pub async fn update<'e, E>(
        &self,
        executor: E,
        sku: &str,
        changes: &UpdateProductPayload,
    ) -> Result<Option<Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let product = sqlx::query_as::<_, Product>(&format!(
            r#"
            UPDATE products
            SET name = $2, category = $3, description = $4,
                min_stock = $5, packaging_factor = $6, updated_at = NOW()
            WHERE sku = $1
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(sku)
        .bind(changes.name.trim())
        .bind(changes.category.trim())
        .bind(changes.description.as_deref())
        .bind(changes.min_stock)
        .bind(changes.packaging_factor)
        .fetch_optional(executor)
        .await?;

        Ok(product)
    }

    /// As FKs com ON DELETE RESTRICT barram a exclusão de produtos com histórico.
    pub async fn delete<'e, E>(&self, executor: E, sku: &str) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM products WHERE sku = $1")
            .bind(sku)
            .execute(executor)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(db_err) = &e {
                    if db_err.is_foreign_key_violation() {
                        return AppError::ProductInUse(sku.to_string());
                    }
                }
                AppError::from(e)
            })?;

        Ok(result.rows_affected() > 0)
    }

    /// Soma (ou subtrai) da quantidade atual. O CHECK (quantity >= 0) do banco é a última barreira.
    pub async fn adjust_quantity<'e, E>(
        &self,
        executor: E,
        sku: &str,
        delta: i32,
    ) -> Result<Option<Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let product = sqlx::query_as::<_, Product>(&format!(
            r#"
            UPDATE products
            SET quantity = quantity + $2, updated_at = NOW()
            WHERE sku = $1
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(sku)
        .bind(delta)
        .fetch_optional(executor)
        .await?;

        Ok(product)
    }
}

pub(crate) fn push_product_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &ProductFilter) {
    let mut prefix = " WHERE ";

    if let Some(search) = filter.search.as_deref().filter(|s| !s.trim().is_empty()) {
        let pattern = like_pattern(search);
        qb.push(prefix)
            .push("(name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR sku ILIKE ")
            .push_bind(pattern)
            .push(")");
        prefix = " AND ";
    }

    if filter.low_stock {
        qb.push(prefix).push("quantity <= min_stock");
    }
}

fn push_product_order(qb: &mut QueryBuilder<'_, Postgres>, filter: &ProductFilter) {
    if filter.low_stock {
        // Os mais baixos primeiro
        qb.push(" ORDER BY quantity ASC, name ASC");
    } else {
        qb.push(" ORDER BY name ASC");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sql_for(filter: &ProductFilter) -> String {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM products");
        push_product_filters(&mut qb, filter);
        push_product_order(&mut qb, filter);
        qb.sql().to_string()
    }

    #[test]
    fn no_filters_orders_by_name() {
        assert_eq!(sql_for(&ProductFilter::default()), "SELECT * FROM products ORDER BY name ASC");
    }

    #[test]
    fn search_and_low_stock_are_combined() {
        let filter = ProductFilter { search: Some("papel".into()), low_stock: true };
        assert_eq!(
            sql_for(&filter),
            "SELECT * FROM products WHERE (name ILIKE $1 OR sku ILIKE $2) AND quantity <= min_stock \
             ORDER BY quantity ASC, name ASC"
        );
    }

    #[test]
    fn blank_search_is_ignored() {
        let filter = ProductFilter { search: Some("   ".into()), low_stock: false };
        assert!(!sql_for(&filter).contains("WHERE"));
    }

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern(" 50%_off "), "%50\\%\\_off%");
    }
}
