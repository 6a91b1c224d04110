// src/services/report_service.rs

use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::{
    common::{
        error::AppError,
        pagination::{Page, PageParams},
    },
    db::{InvoiceRepository, MovementRepository, ProductRepository, ReportRepository},
    models::{
        invoice::{Invoice, InvoiceDetail, InvoiceItemDetail},
        movement::{MovementFilter, MovementRecord},
        product::{Product, ProductFilter, ProductOption},
        report::{
            ConsumptionDetail, ConsumptionQuery, ConsumptionWindow, DailyStats, DestinationConsumption,
            ProvisioningEntry, SpendEntry, SpendQuery, StockStats,
        },
    },
};

pub const DEFAULT_PROVISIONING_PERIOD: i32 = 30;
pub const MAX_PROVISIONING_PERIOD: i32 = 3650;

/// Consultas somente leitura: listagens, cards e relatórios.
#[derive(Clone)]
pub struct ReportService {
    product_repo: ProductRepository,
    movement_repo: MovementRepository,
    invoice_repo: InvoiceRepository,
    report_repo: ReportRepository,
}

impl ReportService {
    pub fn new(
        product_repo: ProductRepository,
        movement_repo: MovementRepository,
        invoice_repo: InvoiceRepository,
        report_repo: ReportRepository,
    ) -> Self {
        Self { product_repo, movement_repo, invoice_repo, report_repo }
    }

    // ---
    // Catálogo
    // ---

    pub async fn list_products(&self, filter: &ProductFilter, page: &PageParams) -> Result<Page<Product>, AppError> {
        let pool = self.product_repo.pool();
        let total = self.product_repo.count(pool, filter).await?;
        let items = self.product_repo.list_page(pool, filter, page).await?;
        Ok(Page::new(items, total, page))
    }

    pub async fn product_options(&self) -> Result<Vec<ProductOption>, AppError> {
        self.product_repo.list_options(self.product_repo.pool()).await
    }

    pub async fn categories(&self) -> Result<Vec<String>, AppError> {
        self.product_repo.list_categories(self.product_repo.pool()).await
    }

    // ---
    // Livro-razão
    // ---

    pub async fn list_movements(
        &self,
        filter: &MovementFilter,
        page: &PageParams,
    ) -> Result<Page<MovementRecord>, AppError> {
        let pool = self.movement_repo.pool();
        let total = self.movement_repo.count(pool, filter).await?;
        let items = self.movement_repo.list_page(pool, filter, page).await?;
        Ok(Page::new(items, total, page))
    }

    pub async fn export_movements(&self, filter: &MovementFilter) -> Result<Vec<MovementRecord>, AppError> {
        self.movement_repo.list_all(self.movement_repo.pool(), filter).await
    }

    // ---
    // Notas fiscais
    // ---

    pub async fn list_invoices(&self) -> Result<Vec<InvoiceDetail>, AppError> {
        let pool = self.invoice_repo.pool();
        let invoices = self.invoice_repo.list(pool).await?;
        let ids: Vec<i64> = invoices.iter().map(|i| i.id).collect();
        let items = self.invoice_repo.list_items(pool, &ids).await?;
        Ok(attach_items(invoices, items))
    }

    pub async fn suppliers(&self) -> Result<Vec<String>, AppError> {
        self.invoice_repo.list_suppliers(self.invoice_repo.pool()).await
    }

    // ---
    // Relatórios
    // ---

    pub async fn stock_stats(&self) -> Result<StockStats, AppError> {
        self.report_repo.stock_stats(self.report_repo.pool()).await
    }

    pub async fn daily_stats(&self) -> Result<DailyStats, AppError> {
        self.report_repo.daily_stats(self.report_repo.pool()).await
    }

    pub async fn spend(&self, query: &SpendQuery) -> Result<Vec<SpendEntry>, AppError> {
        let (start, end) = date_range(query.start, query.end)?;
        self.report_repo
            .spend(self.report_repo.pool(), start, end, non_blank(&query.supplier))
            .await
    }

    pub async fn consumption_by_destination(
        &self,
        query: &ConsumptionQuery,
    ) -> Result<Vec<DestinationConsumption>, AppError> {
        let (start, end) = date_range(query.start, query.end)?;
        self.report_repo
            .consumption_by_destination(self.report_repo.pool(), start, end, non_blank(&query.category))
            .await
    }

    pub async fn consumption_detail(&self, query: &ConsumptionQuery) -> Result<Vec<ConsumptionDetail>, AppError> {
        let (start, end) = date_range(query.start, query.end)?;
        let destination = non_blank(&query.destination)
            .ok_or_else(|| AppError::field("destination", "required", "O destino é obrigatório."))?;

        self.report_repo
            .consumption_detail(self.report_repo.pool(), start, end, destination, non_blank(&query.category))
            .await
    }

    pub async fn provisioning(&self, period: Option<i32>) -> Result<Vec<ProvisioningEntry>, AppError> {
        let period = provisioning_period(period)?;
        let rows = self.report_repo.consumption_window(self.report_repo.pool(), period).await?;
        Ok(build_forecast(rows, period))
    }
}

// Janela em dias: padrão 30, de 1 até MAX_PROVISIONING_PERIOD
fn provisioning_period(period: Option<i32>) -> Result<i32, AppError> {
    let period = period.unwrap_or(DEFAULT_PROVISIONING_PERIOD);
    if period <= 0 {
        return Err(AppError::field("period", "range", "O período deve ser maior que zero."));
    }
    if period > MAX_PROVISIONING_PERIOD {
        return Err(AppError::field("period", "range", "O período máximo é de 3650 dias."));
    }
    Ok(period)
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

// Relatórios por período exigem as duas datas e início <= fim
fn date_range(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Result<(NaiveDate, NaiveDate), AppError> {
    let start = start.ok_or_else(|| AppError::field("start", "required", "A data de início é obrigatória."))?;
    let end = end.ok_or_else(|| AppError::field("end", "required", "A data de fim é obrigatória."))?;
    if start > end {
        return Err(AppError::field("start", "range", "A data de início deve ser anterior à data de fim."));
    }
    Ok((start, end))
}

fn attach_items(invoices: Vec<Invoice>, items: Vec<InvoiceItemDetail>) -> Vec<InvoiceDetail> {
    let mut by_invoice: HashMap<i64, Vec<InvoiceItemDetail>> = HashMap::new();
    for item in items {
        by_invoice.entry(item.invoice_id).or_default().push(item);
    }

    invoices
        .into_iter()
        .map(|header| {
            let items = by_invoice.remove(&header.id).unwrap_or_default();
            InvoiceDetail { header, items }
        })
        .collect()
}

/// Dias até o estoque chegar ao mínimo no ritmo atual.
///
/// Já no mínimo (ou abaixo) => 0. Sem consumo => `None` (não entra na previsão).
pub fn remaining_days(quantity: i32, min_stock: i32, average_daily: Decimal) -> Option<Decimal> {
    if quantity <= min_stock {
        return Some(Decimal::ZERO);
    }
    if average_daily <= Decimal::ZERO {
        return None;
    }
    Some(Decimal::from(quantity - min_stock) / average_daily)
}

/// Monta a previsão: descarta itens sem consumo e ordena pelos mais críticos.
pub fn build_forecast(rows: Vec<ConsumptionWindow>, period: i32) -> Vec<ProvisioningEntry> {
    let days = Decimal::from(period.max(1));

    let mut entries: Vec<ProvisioningEntry> = rows
        .into_iter()
        .filter_map(|row| {
            let average = Decimal::from(row.consumed) / days;
            let remaining = remaining_days(row.quantity, row.min_stock, average)?;
            Some(ProvisioningEntry {
                sku: row.sku,
                name: row.name,
                quantity: row.quantity,
                min_stock: row.min_stock,
                average_daily_consumption: average.round_dp(2),
                remaining_days: remaining.round_dp(2),
            })
        })
        .collect();

    entries.sort_by(|a, b| a.remaining_days.cmp(&b.remaining_days).then_with(|| a.name.cmp(&b.name)));
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(sku: &str, quantity: i32, min_stock: i32, consumed: i64) -> ConsumptionWindow {
        ConsumptionWindow {
            sku: sku.into(),
            name: format!("Produto {sku}"),
            quantity,
            min_stock,
            consumed,
        }
    }

    #[test]
    fn forecast_matches_daily_average() {
        let forecast = build_forecast(vec![window("A", 500, 100, 600)], 30);

        assert_eq!(forecast.len(), 1);
        assert_eq!(forecast[0].average_daily_consumption, Decimal::new(20, 0));
        assert_eq!(forecast[0].remaining_days, Decimal::new(20, 0));
    }

    #[test]
    fn forecast_skips_idle_items_and_sorts_critical_first() {
        let forecast = build_forecast(
            vec![
                window("LENTO", 100, 10, 30),  // 1/dia -> 90 dias
                window("PARADO", 50, 10, 0),   // sem consumo -> fora
                window("CRITICO", 5, 10, 0),   // abaixo do mínimo -> 0
                window("RAPIDO", 70, 10, 300), // 10/dia -> 6 dias
            ],
            30,
        );

        let skus: Vec<_> = forecast.iter().map(|e| e.sku.as_str()).collect();
        assert_eq!(skus, ["CRITICO", "RAPIDO", "LENTO"]);
        assert_eq!(forecast[0].remaining_days, Decimal::ZERO);
    }

    #[test]
    fn remaining_days_edges() {
        assert_eq!(remaining_days(10, 10, Decimal::ONE), Some(Decimal::ZERO));
        assert_eq!(remaining_days(11, 10, Decimal::ZERO), None);
        assert_eq!(remaining_days(40, 10, Decimal::new(15, 1)), Some(Decimal::new(20, 0)));
    }

    #[test]
    fn provisioning_period_defaults_and_bounds() {
        assert_eq!(provisioning_period(None).unwrap(), 30);
        assert_eq!(provisioning_period(Some(1)).unwrap(), 1);
        assert_eq!(provisioning_period(Some(3650)).unwrap(), 3650);

        for bad in [0, -5, 3651, i32::MAX] {
            let Err(AppError::ValidationError(errors)) = provisioning_period(Some(bad)) else {
                panic!("período {bad} deveria ser recusado");
            };
            assert!(errors.field_errors().contains_key("period"));
        }
    }

    #[test]
    fn ranged_reports_require_ordered_dates() {
        let d = |day| NaiveDate::from_ymd_opt(2025, 3, day).unwrap();

        assert!(date_range(Some(d(1)), Some(d(31))).is_ok());
        assert!(date_range(Some(d(5)), Some(d(5))).is_ok());
        assert!(matches!(date_range(None, Some(d(1))), Err(AppError::ValidationError(_))));
        assert!(matches!(date_range(Some(d(2)), Some(d(1))), Err(AppError::ValidationError(_))));
    }

    #[test]
    fn items_are_attached_to_their_invoice() {
        use chrono::Utc;

        let header = |id| Invoice {
            id,
            invoice_number: format!("{id}"),
            supplier: "F".into(),
            issue_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            received_date: NaiveDate::from_ymd_opt(2025, 1, 2).unwrap(),
            total_value: Decimal::ONE,
            notes: None,
            created_at: Utc::now(),
        };
        let item = |id, invoice_id| InvoiceItemDetail {
            id,
            invoice_id,
            product_sku: "A".into(),
            product_name: "Produto A".into(),
            quantity: 1,
            unit_price: Decimal::ONE,
            total: Decimal::ONE,
        };

        let details = attach_items(vec![header(2), header(1)], vec![item(10, 1), item(11, 2), item(12, 1)]);

        assert_eq!(details[0].header.id, 2);
        assert_eq!(details[0].items.len(), 1);
        assert_eq!(details[1].items.len(), 2);
    }
}
