// src/services/catalog_service.rs

use std::sync::Arc;

use chrono::Utc;
use validator::Validate;

use crate::{
    common::{
        error::AppError,
        sku::{generate_sku, normalize_sku},
    },
    db::InventoryStore,
    models::product::{CreateProductPayload, Product, UpdateProductPayload},
};

#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn InventoryStore>,
}

impl CatalogService {
    pub fn new(store: Arc<dyn InventoryStore>) -> Self {
        Self { store }
    }

    pub async fn get_product(&self, sku: &str) -> Result<Product, AppError> {
        let sku = normalize_sku(sku);
        self.store
            .find_product(&sku)
            .await?
            .ok_or(AppError::ProductNotFound(sku))
    }

    /// Cadastra o produto com quantidade zero; o estoque só muda pelo livro-razão.
    pub async fn create_product(&self, payload: CreateProductPayload) -> Result<Product, AppError> {
        payload.validate()?;

        let payload = CreateProductPayload {
            sku: normalize_sku(&payload.sku),
            ..payload
        };
        let product = self.store.insert_product(&payload).await?;

        tracing::info!("📦 Produto {} cadastrado ({})", product.sku, product.name);
        Ok(product)
    }

    pub async fn update_product(&self, sku: &str, payload: UpdateProductPayload) -> Result<Product, AppError> {
        payload.validate()?;

        let sku = normalize_sku(sku);
        self.store
            .update_product(&sku, &payload)
            .await?
            .ok_or(AppError::ProductNotFound(sku))
    }

    pub async fn delete_product(&self, sku: &str) -> Result<(), AppError> {
        let sku = normalize_sku(sku);

        match self.store.delete_product(&sku).await {
            Ok(true) => {
                tracing::info!("🗑️ Produto {} excluído", sku);
                Ok(())
            }
            Ok(false) => Err(AppError::ProductNotFound(sku)),
            Err(AppError::ProductInUse(sku)) => {
                tracing::warn!("Exclusão recusada: {} tem histórico", sku);
                Err(AppError::ProductInUse(sku))
            }
            Err(e) => Err(e),
        }
    }

    pub fn generate_sku(&self, category: Option<&str>) -> String {
        generate_sku(category, Utc::now(), &mut rand::thread_rng())
    }
}
