// src/models/movement.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::common::sku::not_blank;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "movement_kind", rename_all = "SCREAMING_SNAKE_CASE")] // Banco
#[serde(rename_all = "SCREAMING_SNAKE_CASE")] // JSON
pub enum MovementKind {
    Entry, // Vira "ENTRY" (entrada)
    Exit,  // Vira "EXIT" (saída)
}

// --- STOCK MOVEMENT (Livro-razão) ---
// Imutável depois de gravado.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockMovement {
    pub id: i64,
    pub product_sku: String,
    pub quantity: i32,
    pub kind: MovementKind,
    pub responsible: String,
    pub occurred_at: DateTime<Utc>,
    // Campos exclusivos de saída
    pub destination: Option<String>,
    pub collector: Option<String>,
    pub withdrawn_by: Option<String>,
}

// O que o livro-razão precisa para gravar uma linha nova
#[derive(Debug, Clone)]
pub struct NewMovement {
    pub product_sku: String,
    pub quantity: i32,
    pub kind: MovementKind,
    pub responsible: String,
    pub destination: Option<String>,
    pub collector: Option<String>,
    pub withdrawn_by: Option<String>,
}

// Linha do histórico (join com o nome do produto)
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MovementRecord {
    pub id: i64,
    pub kind: MovementKind,
    pub quantity: i32,
    pub responsible: String,
    pub occurred_at: DateTime<Utc>,
    pub destination: Option<String>,
    pub collector: Option<String>,
    pub withdrawn_by: Option<String>,
    pub sku: String,
    pub product_name: String,
}

// Comando de movimentação (também é o payload do POST)
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecordMovementPayload {
    #[validate(custom(function = "not_blank", message = "O SKU do produto é obrigatório."))]
    pub product_sku: String,

    #[validate(range(min = 1, message = "A quantidade deve ser maior que zero."))]
    pub quantity: i32,

    pub kind: MovementKind,

    #[validate(custom(function = "not_blank", message = "O responsável é obrigatório."))]
    pub responsible: String,

    pub destination: Option<String>,
    pub collector: Option<String>,
    pub withdrawn_by: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct MovementFilter {
    /// ENTRY ou EXIT (ausente = todos)
    pub kind: Option<MovementKind>,
    /// Trecho do nome ou do SKU do produto
    pub product: Option<String>,
    pub responsible: Option<String>,
    /// Trecho do destino, de quem coletou ou de quem retirou
    pub details: Option<String>,
}
