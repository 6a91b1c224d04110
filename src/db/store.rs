// src/db/store.rs

use std::collections::HashMap;

use async_trait::async_trait;

use crate::{
    common::error::AppError,
    models::{
        invoice::{Invoice, InvoiceItem, NewInvoice, NewInvoiceItem},
        movement::{NewMovement, StockMovement},
        product::{CreateProductPayload, Product, UpdateProductPayload},
    },
};

/// Capacidade de armazenamento do catálogo + livro-razão.
///
/// Toda escrita que envolve mais de uma linha passa por uma [`StockUnit`]
/// obtida com [`InventoryStore::begin`]. Os SKUs recebidos aqui já estão normalizados.
#[async_trait]
pub trait InventoryStore: Send + Sync {
    /// Abre uma unidade de trabalho (transação).
    async fn begin(&self) -> Result<Box<dyn StockUnit>, AppError>;

    async fn find_product(&self, sku: &str) -> Result<Option<Product>, AppError>;

    /// Fator de embalagem dos SKUs que existem no catálogo. Os ausentes não aparecem no mapa.
    async fn find_packaging_factors(&self, skus: &[String]) -> Result<HashMap<String, i32>, AppError>;

    /// Falha com `SkuAlreadyExists` se o SKU já estiver cadastrado.
    async fn insert_product(&self, product: &CreateProductPayload) -> Result<Product, AppError>;

    /// `None` quando o SKU não existe.
    async fn update_product(
        &self,
        sku: &str,
        changes: &UpdateProductPayload,
    ) -> Result<Option<Product>, AppError>;

    /// `false` quando o SKU não existe; `ProductInUse` quando há movimentações ou itens de NF.
    async fn delete_product(&self, sku: &str) -> Result<bool, AppError>;
}

/// Unidade de trabalho atômica.
///
/// Tudo o que foi feito só se torna visível em `commit`. Descartar a unidade
/// sem `commit` desfaz todas as escritas e libera os bloqueios.
#[async_trait]
pub trait StockUnit: Send {
    /// Aquisição exclusiva da linha do produto, mantida até o fim da unidade.
    /// Retorna o produto já com as alterações feitas nesta unidade.
    async fn lock_product(&mut self, sku: &str) -> Result<Option<Product>, AppError>;

    /// Soma `delta` à quantidade e retorna o produto atualizado.
    async fn apply_quantity_delta(&mut self, sku: &str, delta: i32) -> Result<Product, AppError>;

    async fn append_movement(&mut self, movement: &NewMovement) -> Result<StockMovement, AppError>;

    /// Falha com `InvoiceAlreadyExists` se o número já foi registrado.
    async fn insert_invoice(&mut self, invoice: &NewInvoice) -> Result<Invoice, AppError>;

    async fn insert_invoice_item(&mut self, item: &NewInvoiceItem) -> Result<InvoiceItem, AppError>;

    async fn commit(self: Box<Self>) -> Result<(), AppError>;
}
