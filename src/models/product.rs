// src/models/product.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::common::sku::not_blank;

// --- Produto (Catálogo) ---
// A quantidade é sempre o saldo líquido do livro-razão para este SKU.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[schema(example = "PAP-A4-500")]
    pub sku: String,
    #[schema(example = "Papel A4 (resma)")]
    pub name: String,
    #[schema(example = "Papelaria")]
    pub category: String,
    pub description: Option<String>,
    #[schema(example = 120)]
    pub quantity: i32,
    #[schema(example = 10)]
    pub min_stock: i32,
    // Unidades em estoque por unidade comprada (ex: caixa com 12)
    #[schema(example = 1)]
    pub packaging_factor: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Linha "leve" para dropdowns
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductOption {
    pub sku: String,
    pub name: String,
    pub quantity: i32,
}

fn default_min_stock() -> i32 {
    10
}

fn default_packaging_factor() -> i32 {
    1
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductPayload {
    #[validate(custom(function = "not_blank", message = "O SKU é obrigatório."))]
    pub sku: String,

    #[validate(custom(function = "not_blank", message = "O nome é obrigatório."))]
    pub name: String,

    #[validate(custom(function = "not_blank", message = "A categoria é obrigatória."))]
    pub category: String,

    pub description: Option<String>,

    #[serde(default = "default_min_stock")]
    #[validate(range(min = 0, message = "O estoque mínimo não pode ser negativo."))]
    pub min_stock: i32,

    #[serde(default = "default_packaging_factor")]
    #[validate(range(min = 1, message = "O fator de embalagem deve ser maior ou igual a 1."))]
    pub packaging_factor: i32,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductPayload {
    #[validate(custom(function = "not_blank", message = "O nome é obrigatório."))]
    pub name: String,

    #[validate(custom(function = "not_blank", message = "A categoria é obrigatória."))]
    pub category: String,

    pub description: Option<String>,

    #[validate(range(min = 0, message = "O estoque mínimo não pode ser negativo."))]
    pub min_stock: i32,

    #[validate(range(min = 1, message = "O fator de embalagem deve ser maior ou igual a 1."))]
    pub packaging_factor: i32,
}

// Filtros da listagem paginada
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ProductFilter {
    /// Trecho do nome ou do SKU
    pub search: Option<String>,
    /// Somente itens com quantidade <= estoque mínimo
    #[serde(default)]
    pub low_stock: bool,
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct GenerateSkuQuery {
    pub category: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct GeneratedSku {
    #[schema(example = "PAP-483920-071")]
    pub sku: String,
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LabelQuery {
    /// Número de etiquetas (1 a 100)
    pub copies: Option<u32>,
}
