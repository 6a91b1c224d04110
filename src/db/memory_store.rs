// src/db/memory_store.rs
//
// Store em memória para os testes dos serviços. Imita o que o Postgres garante:
// bloqueio exclusivo por SKU (mutex tokio por linha), escritas só visíveis no
// commit, unicidade do número da NF e as FKs RESTRICT.

use std::{
    collections::{BTreeMap, HashMap},
    sync::{
        atomic::{AtomicI64, Ordering},
        Arc, Mutex, MutexGuard,
    },
};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::OwnedMutexGuard;

use crate::{
    common::error::AppError,
    db::store::{InventoryStore, StockUnit},
    models::{
        invoice::{Invoice, InvoiceItem, NewInvoice, NewInvoiceItem},
        movement::{NewMovement, StockMovement},
        product::{CreateProductPayload, Product, UpdateProductPayload},
    },
};

type RowLocks = Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>;

#[derive(Default)]
struct MemState {
    products: BTreeMap<String, Product>,
    movements: Vec<StockMovement>,
    invoices: Vec<Invoice>,
    items: Vec<InvoiceItem>,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemState>>,
    row_locks: Arc<RowLocks>,
    next_id: Arc<AtomicI64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MemState> {
        self.state.lock().expect("estado do MemoryStore envenenado")
    }

    // --- Inspeção para os testes ---

    pub fn product(&self, sku: &str) -> Option<Product> {
        self.state().products.get(sku).cloned()
    }

    pub fn movements(&self) -> Vec<StockMovement> {
        self.state().movements.clone()
    }

    pub fn invoices(&self) -> Vec<Invoice> {
        self.state().invoices.clone()
    }

    pub fn invoice_items(&self) -> Vec<InvoiceItem> {
        self.state().items.clone()
    }
}

fn new_product(payload: &CreateProductPayload) -> Product {
    let now = Utc::now();
    Product {
        sku: payload.sku.clone(),
        name: payload.name.trim().to_string(),
        category: payload.category.trim().to_string(),
        description: payload.description.clone(),
        quantity: 0,
        min_stock: payload.min_stock,
        packaging_factor: payload.packaging_factor,
        created_at: now,
        updated_at: now,
    }
}

// Violação do CHECK (quantity >= 0), como o banco devolveria
fn negative_quantity(sku: &str) -> AppError {
    AppError::InternalServerError(anyhow::anyhow!(
        "violação de CHECK: quantidade negativa para {sku}"
    ))
}

#[async_trait]
impl InventoryStore for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn StockUnit>, AppError> {
        Ok(Box::new(MemoryUnit {
            store: self.clone(),
            held: HashMap::new(),
            deltas: HashMap::new(),
            movements: Vec::new(),
            invoices: Vec::new(),
            items: Vec::new(),
        }))
    }

    async fn find_product(&self, sku: &str) -> Result<Option<Product>, AppError> {
        Ok(self.product(sku))
    }

    async fn find_packaging_factors(&self, skus: &[String]) -> Result<HashMap<String, i32>, AppError> {
        let state = self.state();
        Ok(skus
            .iter()
            .filter_map(|sku| state.products.get(sku).map(|p| (sku.clone(), p.packaging_factor)))
            .collect())
    }

    async fn insert_product(&self, product: &CreateProductPayload) -> Result<Product, AppError> {
        let mut state = self.state();
        if state.products.contains_key(&product.sku) {
            return Err(AppError::SkuAlreadyExists(product.sku.clone()));
        }
        let created = new_product(product);
        state.products.insert(created.sku.clone(), created.clone());
        Ok(created)
    }

    async fn update_product(
        &self,
        sku: &str,
        changes: &UpdateProductPayload,
    ) -> Result<Option<Product>, AppError> {
        let mut state = self.state();
        let Some(product) = state.products.get_mut(sku) else {
            return Ok(None);
        };
        product.name = changes.name.trim().to_string();
        product.category = changes.category.trim().to_string();
        product.description = changes.description.clone();
        product.min_stock = changes.min_stock;
        product.packaging_factor = changes.packaging_factor;
        product.updated_at = Utc::now();
        Ok(Some(product.clone()))
    }

    async fn delete_product(&self, sku: &str) -> Result<bool, AppError> {
        let mut state = self.state();
        if !state.products.contains_key(sku) {
            return Ok(false);
        }
        let referenced = state.movements.iter().any(|m| m.product_sku == sku)
            || state.items.iter().any(|i| i.product_sku == sku);
        if referenced {
            return Err(AppError::ProductInUse(sku.to_string()));
        }
        state.products.remove(sku);
        Ok(true)
    }
}

pub struct MemoryUnit {
    store: MemoryStore,
    held: HashMap<String, OwnedMutexGuard<()>>,
    deltas: HashMap<String, i32>,
    movements: Vec<StockMovement>,
    invoices: Vec<Invoice>,
    items: Vec<InvoiceItem>,
}

impl MemoryUnit {
    fn next_id(&self) -> i64 {
        self.store.next_id.fetch_add(1, Ordering::SeqCst) + 1
    }

    // Produto como esta unidade o enxerga (commitado + deltas pendentes)
    fn current(&self, sku: &str) -> Option<Product> {
        let mut product = self.store.product(sku)?;
        product.quantity += self.deltas.get(sku).copied().unwrap_or(0);
        Some(product)
    }
}

#[async_trait]
impl StockUnit for MemoryUnit {
    async fn lock_product(&mut self, sku: &str) -> Result<Option<Product>, AppError> {
        if !self.held.contains_key(sku) {
            let row_lock = {
                let mut locks = self.store.row_locks.lock().expect("locks envenenados");
                locks.entry(sku.to_string()).or_default().clone()
            };
            let guard = row_lock.lock_owned().await;
            self.held.insert(sku.to_string(), guard);
        }
        Ok(self.current(sku))
    }

    async fn apply_quantity_delta(&mut self, sku: &str, delta: i32) -> Result<Product, AppError> {
        let mut product = self
            .current(sku)
            .ok_or_else(|| AppError::ProductNotFound(sku.to_string()))?;
        if product.quantity + delta < 0 {
            return Err(negative_quantity(sku));
        }
        *self.deltas.entry(sku.to_string()).or_insert(0) += delta;
        product.quantity += delta;
        product.updated_at = Utc::now();
        Ok(product)
    }

    async fn append_movement(&mut self, movement: &NewMovement) -> Result<StockMovement, AppError> {
        if self.current(&movement.product_sku).is_none() {
            return Err(AppError::ProductNotFound(movement.product_sku.clone()));
        }
        let recorded = StockMovement {
            id: self.next_id(),
            product_sku: movement.product_sku.clone(),
            quantity: movement.quantity,
            kind: movement.kind,
            responsible: movement.responsible.clone(),
            occurred_at: Utc::now(),
            destination: movement.destination.clone(),
            collector: movement.collector.clone(),
            withdrawn_by: movement.withdrawn_by.clone(),
        };
        self.movements.push(recorded.clone());
        Ok(recorded)
    }

    async fn insert_invoice(&mut self, invoice: &NewInvoice) -> Result<Invoice, AppError> {
        let duplicated = self.invoices.iter().any(|i| i.invoice_number == invoice.invoice_number)
            || self
                .store
                .state()
                .invoices
                .iter()
                .any(|i| i.invoice_number == invoice.invoice_number);
        if duplicated {
            return Err(AppError::InvoiceAlreadyExists(invoice.invoice_number.clone()));
        }
        let created = Invoice {
            id: self.next_id(),
            invoice_number: invoice.invoice_number.clone(),
            supplier: invoice.supplier.clone(),
            issue_date: invoice.issue_date,
            received_date: invoice.received_date,
            total_value: invoice.total_value,
            notes: invoice.notes.clone(),
            created_at: Utc::now(),
        };
        self.invoices.push(created.clone());
        Ok(created)
    }

    async fn insert_invoice_item(&mut self, item: &NewInvoiceItem) -> Result<InvoiceItem, AppError> {
        if self.current(&item.product_sku).is_none() {
            return Err(AppError::ProductNotFound(item.product_sku.clone()));
        }
        let created = InvoiceItem {
            id: self.next_id(),
            invoice_id: item.invoice_id,
            product_sku: item.product_sku.clone(),
            quantity: item.quantity,
            unit_price: item.unit_price,
            total: item.total,
        };
        self.items.push(created.clone());
        Ok(created)
    }

    async fn commit(self: Box<Self>) -> Result<(), AppError> {
        let unit = *self;
        let mut state = unit.store.state();

        // Duas unidades concorrentes com a mesma NF: só a primeira passa
        for invoice in &unit.invoices {
            if state.invoices.iter().any(|i| i.invoice_number == invoice.invoice_number) {
                return Err(AppError::InvoiceAlreadyExists(invoice.invoice_number.clone()));
            }
        }
        for (sku, delta) in &unit.deltas {
            let product = state
                .products
                .get(sku)
                .ok_or_else(|| AppError::ProductNotFound(sku.clone()))?;
            if product.quantity + delta < 0 {
                return Err(negative_quantity(sku));
            }
        }

        let now = Utc::now();
        for (sku, delta) in &unit.deltas {
            if let Some(product) = state.products.get_mut(sku) {
                product.quantity += delta;
                product.updated_at = now;
            }
        }
        state.movements.extend(unit.movements.iter().cloned());
        state.invoices.extend(unit.invoices.iter().cloned());
        state.items.extend(unit.items.iter().cloned());

        // `held` cai junto com `unit`, depois do estado já gravado
        drop(state);
        Ok(())
    }
}
