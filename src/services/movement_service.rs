// src/services/movement_service.rs

use std::sync::Arc;

use validator::Validate;

use crate::{
    common::{error::AppError, sku::normalize_sku},
    db::InventoryStore,
    models::{
        movement::{MovementKind, NewMovement, RecordMovementPayload},
        product::Product,
    },
};

#[derive(Clone)]
pub struct MovementService {
    store: Arc<dyn InventoryStore>,
}

// Texto vazio nos campos de saída vira NULL
fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl MovementService {
    pub fn new(store: Arc<dyn InventoryStore>) -> Self {
        Self { store }
    }

    /// Registra uma entrada ou saída e devolve o produto já atualizado.
    ///
    /// A linha do produto fica bloqueada do começo ao fim: a conferência do saldo
    /// de uma saída e a baixa acontecem sob o mesmo bloqueio, então duas saídas
    /// concorrentes nunca deixam o estoque negativo.
    pub async fn record_movement(&self, payload: RecordMovementPayload) -> Result<Product, AppError> {
        payload.validate()?;

        let sku = normalize_sku(&payload.product_sku);
        let quantity = payload.quantity;

        let mut unit = self.store.begin().await?;

        // Se sair daqui com erro, a unidade é descartada e nada é gravado
        let current = unit
            .lock_product(&sku)
            .await?
            .ok_or_else(|| AppError::ProductNotFound(sku.clone()))?;

        if payload.kind == MovementKind::Exit && quantity > current.quantity {
            tracing::warn!(
                "Saída recusada para {}: disponível {}, solicitado {}",
                sku,
                current.quantity,
                quantity
            );
            return Err(AppError::InsufficientStock {
                sku,
                available: current.quantity,
                requested: quantity,
            });
        }

        // O saldo é INTEGER no banco
        if payload.kind == MovementKind::Entry && current.quantity.checked_add(quantity).is_none() {
            return Err(AppError::field(
                "quantity",
                "range",
                "O saldo resultante excede o limite permitido.",
            ));
        }

        let (delta, destination, collector, withdrawn_by) = match payload.kind {
            MovementKind::Entry => (quantity, None, None, None),
            MovementKind::Exit => (
                -quantity,
                optional_text(payload.destination),
                optional_text(payload.collector),
                optional_text(payload.withdrawn_by),
            ),
        };

        unit.append_movement(&NewMovement {
            product_sku: sku.clone(),
            quantity,
            kind: payload.kind,
            responsible: payload.responsible.trim().to_string(),
            destination,
            collector,
            withdrawn_by,
        })
        .await?;

        let updated = unit.apply_quantity_delta(&sku, delta).await?;
        unit.commit().await?;

        tracing::info!(
            "🔄 Movimentação {:?} de {} un. em {} por {} (saldo {})",
            payload.kind,
            quantity,
            sku,
            payload.responsible.trim(),
            updated.quantity
        );

        Ok(updated)
    }
}
