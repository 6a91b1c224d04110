// src/db/invoice_repo.rs

use sqlx::{Executor, PgPool, Postgres};

use crate::{
    common::error::AppError,
    models::invoice::{Invoice, InvoiceItem, InvoiceItemDetail, NewInvoice, NewInvoiceItem},
};

const INVOICE_COLUMNS: &str =
    "id, invoice_number, supplier, issue_date, received_date, total_value, notes, created_at";

#[derive(Clone)]
pub struct InvoiceRepository {
    pool: PgPool,
}

impl InvoiceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    // ---
    // Escrita (sempre dentro da transação da entrada de NF)
    // ---

    pub async fn insert<'e, E>(&self, executor: E, invoice: &NewInvoice) -> Result<Invoice, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Invoice>(&format!(
            r#"
            INSERT INTO invoices
                (invoice_number, supplier, issue_date, received_date, total_value, notes)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {INVOICE_COLUMNS}
            "#
        ))
        .bind(&invoice.invoice_number)
        .bind(&invoice.supplier)
        .bind(invoice.issue_date)
        .bind(invoice.received_date)
        .bind(invoice.total_value)
        .bind(invoice.notes.as_deref())
        .fetch_one(executor)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AppError::InvoiceAlreadyExists(invoice.invoice_number.clone());
                }
            }
            e.into()
        })
    }

    pub async fn insert_item<'e, E>(&self, executor: E, item: &NewInvoiceItem) -> Result<InvoiceItem, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let item = sqlx::query_as::<_, InvoiceItem>(
            r#"
            INSERT INTO invoice_items (invoice_id, product_sku, quantity, unit_price, total)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, invoice_id, product_sku, quantity, unit_price, total
            "#,
        )
        .bind(item.invoice_id)
        .bind(&item.product_sku)
        .bind(item.quantity)
        .bind(item.unit_price)
        .bind(item.total)
        .fetch_one(executor)
        .await?;

        Ok(item)
    }

    // ---
    // Leitura
    // ---

    pub async fn list<'e, E>(&self, executor: E) -> Result<Vec<Invoice>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let invoices = sqlx::query_as::<_, Invoice>(&format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices ORDER BY received_date DESC, id DESC"
        ))
        .fetch_all(executor)
        .await?;

        Ok(invoices)
    }

    /// Itens de várias NFs de uma vez, já com o nome do produto.
    pub async fn list_items<'e, E>(&self, executor: E, invoice_ids: &[i64]) -> Result<Vec<InvoiceItemDetail>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let items = sqlx::query_as::<_, InvoiceItemDetail>(
            r#"
            SELECT
                i.id, i.invoice_id, i.product_sku, p.name AS product_name,
                i.quantity, i.unit_price, i.total
            FROM invoice_items AS i
            JOIN products AS p ON i.product_sku = p.sku
            WHERE i.invoice_id = ANY($1)
            ORDER BY i.invoice_id, i.id
            "#,
        )
        .bind(invoice_ids)
        .fetch_all(executor)
        .await?;

        Ok(items)
    }

    pub async fn list_suppliers<'e, E>(&self, executor: E) -> Result<Vec<String>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let suppliers = sqlx::query_scalar::<_, String>(
            r#"
            SELECT DISTINCT supplier
            FROM invoices
            WHERE supplier <> ''
            ORDER BY supplier ASC
            "#,
        )
        .fetch_all(executor)
        .await?;

        Ok(suppliers)
    }
}
