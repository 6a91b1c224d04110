// src/db/pg_store.rs

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};

use crate::{
    common::error::AppError,
    db::{
        invoice_repo::InvoiceRepository,
        movement_repo::MovementRepository,
        product_repo::ProductRepository,
        store::{InventoryStore, StockUnit},
    },
    models::{
        invoice::{Invoice, InvoiceItem, NewInvoice, NewInvoiceItem},
        movement::{NewMovement, StockMovement},
        product::{CreateProductPayload, Product, UpdateProductPayload},
    },
};

/// Implementação Postgres: cada unidade é uma transação e o bloqueio é um `FOR UPDATE`.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
    product_repo: ProductRepository,
    movement_repo: MovementRepository,
    invoice_repo: InvoiceRepository,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            product_repo: ProductRepository::new(pool.clone()),
            movement_repo: MovementRepository::new(pool.clone()),
            invoice_repo: InvoiceRepository::new(pool.clone()),
            pool,
        }
    }
}

#[async_trait]
impl InventoryStore for PgStore {
    async fn begin(&self) -> Result<Box<dyn StockUnit>, AppError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgUnit {
            tx,
            product_repo: self.product_repo.clone(),
            movement_repo: self.movement_repo.clone(),
            invoice_repo: self.invoice_repo.clone(),
        }))
    }

    async fn find_product(&self, sku: &str) -> Result<Option<Product>, AppError> {
        self.product_repo.find_by_sku(&self.pool, sku).await
    }

    async fn find_packaging_factors(&self, skus: &[String]) -> Result<HashMap<String, i32>, AppError> {
        let rows = self.product_repo.find_packaging_factors(&self.pool, skus).await?;
        Ok(rows.into_iter().collect())
    }

    async fn insert_product(&self, product: &CreateProductPayload) -> Result<Product, AppError> {
        self.product_repo.create(&self.pool, product).await
    }

    async fn update_product(
        &self,
        sku: &str,
        changes: &UpdateProductPayload,
    ) -> Result<Option<Product>, AppError> {
        self.product_repo.update(&self.pool, sku, changes).await
    }

    async fn delete_product(&self, sku: &str) -> Result<bool, AppError> {
        self.product_repo.delete(&self.pool, sku).await
    }
}

pub struct PgUnit {
    tx: Transaction<'static, Postgres>,
    product_repo: ProductRepository,
    movement_repo: MovementRepository,
    invoice_repo: InvoiceRepository,
}

#[async_trait]
impl StockUnit for PgUnit {
    async fn lock_product(&mut self, sku: &str) -> Result<Option<Product>, AppError> {
        self.product_repo.find_for_update(&mut *self.tx, sku).await
    }

    async fn apply_quantity_delta(&mut self, sku: &str, delta: i32) -> Result<Product, AppError> {
        self.product_repo
            .adjust_quantity(&mut *self.tx, sku, delta)
            .await?
            .ok_or_else(|| AppError::ProductNotFound(sku.to_string()))
    }

    async fn append_movement(&mut self, movement: &NewMovement) -> Result<StockMovement, AppError> {
        self.movement_repo.record(&mut *self.tx, movement).await
    }

    async fn insert_invoice(&mut self, invoice: &NewInvoice) -> Result<Invoice, AppError> {
        self.invoice_repo.insert(&mut *self.tx, invoice).await
    }

    async fn insert_invoice_item(&mut self, item: &NewInvoiceItem) -> Result<InvoiceItem, AppError> {
        self.invoice_repo.insert_item(&mut *self.tx, item).await
    }

    async fn commit(self: Box<Self>) -> Result<(), AppError> {
        // Sem commit, o Drop da Transaction faz o rollback
        self.tx.commit().await?;
        Ok(())
    }
}
