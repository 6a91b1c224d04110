// src/models/invoice.rs

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::common::sku::not_blank;

fn positive_decimal(value: &Decimal) -> Result<(), ValidationError> {
    if *value <= Decimal::ZERO {
        let mut err = ValidationError::new("range");
        err.message = Some("O valor deve ser maior que zero.".into());
        return Err(err);
    }
    Ok(())
}

// --- Nota Fiscal ---
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: i64,
    #[schema(example = "000123456")]
    pub invoice_number: String,
    #[schema(example = "Distribuidora Papel & Cia")]
    pub supplier: String,
    pub issue_date: NaiveDate,
    pub received_date: NaiveDate,
    // Soma de (quantidade x preço unitário) dos itens
    #[schema(example = "150.00")]
    pub total_value: Decimal,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

// Item como foi gravado: preço por unidade de ESTOQUE (já dividido pelo fator)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceItem {
    pub id: i64,
    pub invoice_id: i64,
    pub product_sku: String,
    pub quantity: i32,
    #[schema(example = "5.00")]
    pub unit_price: Decimal,
    #[schema(example = "50.00")]
    pub total: Decimal,
}

#[derive(Debug, Clone)]
pub struct NewInvoice {
    pub invoice_number: String,
    pub supplier: String,
    pub issue_date: NaiveDate,
    pub received_date: NaiveDate,
    pub total_value: Decimal,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewInvoiceItem {
    pub invoice_id: i64,
    pub product_sku: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub total: Decimal,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceItemDetail {
    pub id: i64,
    pub invoice_id: i64,
    pub product_sku: String,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub total: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceDetail {
    #[serde(flatten)]
    pub header: Invoice,
    pub items: Vec<InvoiceItemDetail>,
}

// --- Payload de entrada da NF ---

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceLine {
    #[validate(custom(function = "not_blank", message = "O SKU do item é obrigatório."))]
    pub product_sku: String,

    // Quantidade COMPRADA (em embalagens)
    #[validate(range(min = 1, message = "A quantidade deve ser maior que zero."))]
    pub quantity: i32,

    // Preço por embalagem, como veio na nota
    #[validate(custom(function = "positive_decimal"))]
    pub unit_price: Decimal,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterInvoicePayload {
    #[validate(custom(function = "not_blank", message = "O número da NF é obrigatório."))]
    pub invoice_number: String,

    #[validate(custom(function = "not_blank", message = "O fornecedor é obrigatório."))]
    pub supplier: String,

    pub issue_date: NaiveDate,
    pub received_date: NaiveDate,

    pub notes: Option<String>,

    #[validate(length(min = 1, message = "A NF precisa ter pelo menos um item."), nested)]
    pub items: Vec<InvoiceLine>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisteredInvoice {
    pub invoice_id: i64,
    pub invoice_number: String,
    pub total_value: Decimal,
}

// --- NF-e importada (XML) ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ParsedInvoiceItem {
    pub product_sku: String,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ParsedInvoice {
    pub invoice_number: String,
    pub supplier: String,
    pub issue_date: NaiveDate,
    pub items: Vec<ParsedInvoiceItem>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckSkusPayload {
    #[validate(length(min = 1, message = "Informe ao menos um item."))]
    pub items: Vec<ParsedInvoiceItem>,
    /// SKU do fornecedor -> nosso SKU
    #[serde(default)]
    pub mapping: HashMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Reconciliation {
    pub matched: Vec<ParsedInvoiceItem>,
    pub unmatched: Vec<ParsedInvoiceItem>,
    pub missing_skus: Vec<String>,
}
