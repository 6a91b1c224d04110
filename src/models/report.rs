// src/models/report.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

// 1. Cards do topo
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockStats {
    pub total_products: i64,
    pub low_stock: i64,    // 0 < quantidade <= mínimo
    pub out_of_stock: i64, // quantidade = 0
}

// 2. Movimento do dia
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DailyStats {
    pub entries_today: i64,
    pub exits_today: i64,
    pub spend_today: Decimal,
}

// 3. Gastos no período (NFs recebidas)
#[derive(Debug, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SpendEntry {
    pub id: i64,
    pub invoice_number: String,
    pub supplier: String,
    pub received_date: NaiveDate,
    pub total_value: Decimal,
}

// 4. Consumo por destino
#[derive(Debug, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DestinationConsumption {
    pub destination: String,
    pub total_movements: i64,
    pub total_units: i64,
}

#[derive(Debug, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConsumptionDetail {
    pub occurred_at: DateTime<Utc>,
    pub sku: String,
    pub name: String,
    pub quantity: i32,
    pub responsible: String,
}

// 5. Provisionamento
// Linha crua do banco: saídas somadas na janela
#[derive(Debug, Clone, FromRow)]
pub struct ConsumptionWindow {
    pub sku: String,
    pub name: String,
    pub quantity: i32,
    pub min_stock: i32,
    pub consumed: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProvisioningEntry {
    pub sku: String,
    pub name: String,
    pub quantity: i32,
    pub min_stock: i32,
    #[schema(example = "20.00")]
    pub average_daily_consumption: Decimal,
    #[schema(example = "20.00")]
    pub remaining_days: Decimal,
}

// --- Query params ---

#[derive(Debug, Clone, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct SpendQuery {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub supplier: Option<String>,
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ConsumptionQuery {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub category: Option<String>,
    /// Obrigatório apenas no relatório detalhado
    pub destination: Option<String>,
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProvisioningQuery {
    /// Janela em dias (padrão 30, máximo 3650)
    pub period: Option<i32>,
}
