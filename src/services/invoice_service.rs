// src/services/invoice_service.rs

use std::{
    collections::{BTreeSet, HashMap, HashSet},
    sync::Arc,
};

use rust_decimal::Decimal;
use validator::Validate;

use crate::{
    common::{error::AppError, sku::normalize_sku},
    db::InventoryStore,
    models::{
        invoice::{
            CheckSkusPayload, InvoiceLine, NewInvoice, NewInvoiceItem, Reconciliation,
            RegisterInvoicePayload, RegisteredInvoice,
        },
        movement::{MovementKind, NewMovement},
    },
    services::nfe,
};

// Casas decimais do preço unitário gravado (preço da embalagem / fator)
const UNIT_PRICE_SCALE: u32 = 4;

// Maior valor que cabe em NUMERIC(14, 4): 9_999_999_999.9999
fn max_money() -> Decimal {
    Decimal::new(99_999_999_999_999, UNIT_PRICE_SCALE)
}

fn money_out_of_range() -> AppError {
    AppError::field("items", "range", "O valor da NF excede o limite permitido.")
}

fn stock_out_of_range() -> AppError {
    AppError::field("items", "range", "Quantidade convertida excede o limite permitido.")
}

/// Total de cada linha (quantidade x preço) e o total da nota, sem estourar.
fn invoice_totals(items: &[InvoiceLine]) -> Result<(Vec<Decimal>, Decimal), AppError> {
    let mut line_totals = Vec::with_capacity(items.len());
    let mut total = Decimal::ZERO;

    for line in items {
        let line_total = Decimal::from(line.quantity)
            .checked_mul(line.unit_price)
            .ok_or_else(money_out_of_range)?;
        total = total.checked_add(line_total).ok_or_else(money_out_of_range)?;
        line_totals.push(line_total);
    }

    if total > max_money() {
        return Err(money_out_of_range());
    }
    Ok((line_totals, total))
}

#[derive(Clone)]
pub struct InvoiceService {
    store: Arc<dyn InventoryStore>,
}

impl InvoiceService {
    pub fn new(store: Arc<dyn InventoryStore>) -> Self {
        Self { store }
    }

    /// Registra a NF, seus itens, as entradas no livro-razão e o novo saldo de cada produto.
    ///
    /// Tudo ou nada: qualquer falha (SKU desconhecido, NF duplicada, erro de banco)
    /// desfaz a unidade inteira.
    pub async fn register_invoice(
        &self,
        payload: RegisterInvoicePayload,
        responsible: &str,
    ) -> Result<RegisteredInvoice, AppError> {
        payload.validate()?;

        let invoice_number = payload.invoice_number.trim().to_string();
        let items: Vec<_> = payload
            .items
            .into_iter()
            .map(|mut line| {
                line.product_sku = normalize_sku(&line.product_sku);
                line
            })
            .collect();

        let (line_totals, total_value) = invoice_totals(&items)?;

        // Passo 1: pré-checagem, somente leitura
        let distinct: Vec<String> = items
            .iter()
            .map(|line| line.product_sku.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let factors = self.store.find_packaging_factors(&distinct).await?;
        let missing: Vec<String> = distinct
            .iter()
            .filter(|sku| !factors.contains_key(*sku))
            .cloned()
            .collect();
        if !missing.is_empty() {
            tracing::warn!("NF {} recusada: SKUs não cadastrados {:?}", invoice_number, missing);
            return Err(AppError::UnknownSkus(missing));
        }

        // Passo 2: unidade atômica
        let mut unit = self.store.begin().await?;

        // Bloqueia os produtos em ordem fixa (evita deadlock entre NFs) e lê o fator da linha bloqueada
        let mut locked = HashMap::with_capacity(distinct.len());
        for sku in &distinct {
            let product = unit
                .lock_product(sku)
                .await?
                .ok_or_else(|| AppError::UnknownSkus(vec![sku.clone()]))?;
            locked.insert(sku.clone(), (product.packaging_factor.max(1), product.quantity));
        }

        // Converte tudo antes de gravar: o saldo final de cada SKU precisa caber em INTEGER
        let mut stocked_per_line = Vec::with_capacity(items.len());
        for line in &items {
            let (factor, projected) = locked
                .get_mut(&line.product_sku)
                .ok_or_else(|| AppError::UnknownSkus(vec![line.product_sku.clone()]))?;
            let stocked = line.quantity.checked_mul(*factor).ok_or_else(stock_out_of_range)?;
            *projected = projected.checked_add(stocked).ok_or_else(stock_out_of_range)?;
            stocked_per_line.push((*factor, stocked));
        }

        let invoice = unit
            .insert_invoice(&NewInvoice {
                invoice_number: invoice_number.clone(),
                supplier: payload.supplier.trim().to_string(),
                issue_date: payload.issue_date,
                received_date: payload.received_date,
                total_value,
                notes: payload.notes.filter(|n| !n.trim().is_empty()),
            })
            .await?;

        let origin = format!("NF: {invoice_number}");

        for ((line, line_total), (factor, stocked)) in items.iter().zip(line_totals).zip(stocked_per_line) {
            unit.insert_invoice_item(&NewInvoiceItem {
                invoice_id: invoice.id,
                product_sku: line.product_sku.clone(),
                quantity: line.quantity,
                unit_price: (line.unit_price / Decimal::from(factor)).round_dp(UNIT_PRICE_SCALE),
                total: line_total,
            })
            .await?;

            unit.apply_quantity_delta(&line.product_sku, stocked).await?;

            unit.append_movement(&NewMovement {
                product_sku: line.product_sku.clone(),
                quantity: stocked,
                kind: MovementKind::Entry,
                responsible: responsible.to_string(),
                destination: Some(origin.clone()),
                collector: None,
                withdrawn_by: None,
            })
            .await?;
        }

        unit.commit().await?;

        tracing::info!(
            "🧾 NF {} registrada por {}: {} itens, total {}",
            invoice_number,
            responsible,
            items.len(),
            total_value
        );

        Ok(RegisteredInvoice {
            invoice_id: invoice.id,
            invoice_number,
            total_value,
        })
    }

    /// Conciliação sem estado: aplica o mapeamento do usuário e separa os itens
    /// entre cadastrados e faltantes.
    pub async fn check_skus(&self, payload: CheckSkusPayload) -> Result<Reconciliation, AppError> {
        payload.validate()?;

        let items = nfe::translate_skus(payload.items, &payload.mapping);
        let skus: Vec<String> = items
            .iter()
            .map(|item| item.product_sku.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let known: HashSet<String> = self
            .store
            .find_packaging_factors(&skus)
            .await?
            .into_keys()
            .collect();

        Ok(nfe::reconcile(items, &known))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    use crate::{
        db::memory_store::MemoryStore,
        models::{
            invoice::ParsedInvoiceItem,
            product::CreateProductPayload,
        },
    };

    async fn seed(store: &MemoryStore, sku: &str, factor: i32) {
        store
            .insert_product(&CreateProductPayload {
                sku: sku.to_string(),
                name: format!("Produto {sku}"),
                category: "Papelaria".into(),
                description: None,
                min_stock: 10,
                packaging_factor: factor,
            })
            .await
            .unwrap();
    }

    fn line(sku: &str, quantity: i32, unit_price: Decimal) -> InvoiceLine {
        InvoiceLine { product_sku: sku.into(), quantity, unit_price }
    }

    fn invoice(number: &str, items: Vec<InvoiceLine>) -> RegisterInvoicePayload {
        RegisterInvoicePayload {
            invoice_number: number.into(),
            supplier: "Distribuidora Papel & Cia".into(),
            issue_date: NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
            received_date: NaiveDate::from_ymd_opt(2025, 3, 12).unwrap(),
            notes: None,
            items,
        }
    }

    #[tokio::test]
    async fn packaging_factor_converts_quantity_and_price() {
        let store = MemoryStore::new();
        seed(&store, "A", 2).await;
        let service = InvoiceService::new(Arc::new(store.clone()));

        let registered = service
            .register_invoice(invoice("100", vec![line("a", 5, Decimal::new(100, 1))]), "Ana")
            .await
            .unwrap();

        assert_eq!(registered.total_value, Decimal::new(50, 0));
        assert_eq!(store.product("A").unwrap().quantity, 10);

        let items = store.invoice_items();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity, 5);
        assert_eq!(items[0].unit_price, Decimal::new(50, 1));
        assert_eq!(items[0].total, Decimal::new(50, 0));

        let movements = store.movements();
        assert_eq!(movements.len(), 1);
        assert_eq!(movements[0].kind, MovementKind::Entry);
        assert_eq!(movements[0].quantity, 10);
        assert_eq!(movements[0].responsible, "Ana");
        assert_eq!(movements[0].destination.as_deref(), Some("NF: 100"));
    }

    #[tokio::test]
    async fn repeated_sku_lines_each_add_stock() {
        let store = MemoryStore::new();
        seed(&store, "CX-12", 12).await;
        let service = InvoiceService::new(Arc::new(store.clone()));

        service
            .register_invoice(
                invoice(
                    "200",
                    vec![line("CX-12", 1, Decimal::new(30, 0)), line("cx/12", 2, Decimal::new(30, 0))],
                ),
                "Ana",
            )
            .await
            .unwrap();

        assert_eq!(store.product("CX-12").unwrap().quantity, 36);
        // 30 / 12 = 2.5 por unidade de estoque
        assert!(store.invoice_items().iter().all(|i| i.unit_price == Decimal::new(25, 1)));
        assert_eq!(store.invoices()[0].total_value, Decimal::new(90, 0));
    }

    #[tokio::test]
    async fn unknown_sku_rejects_everything() {
        let store = MemoryStore::new();
        seed(&store, "A", 1).await;
        let service = InvoiceService::new(Arc::new(store.clone()));

        let err = service
            .register_invoice(
                invoice(
                    "300",
                    vec![
                        line("A", 1, Decimal::ONE),
                        line("Z-9", 1, Decimal::ONE),
                        line("b", 1, Decimal::ONE),
                    ],
                ),
                "Ana",
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::UnknownSkus(ref skus) if skus == &["B", "Z-9"]));
        assert!(store.invoices().is_empty());
        assert!(store.invoice_items().is_empty());
        assert!(store.movements().is_empty());
        assert_eq!(store.product("A").unwrap().quantity, 0);
    }

    #[tokio::test]
    async fn duplicate_invoice_keeps_first_intact() {
        let store = MemoryStore::new();
        seed(&store, "A", 1).await;
        let service = InvoiceService::new(Arc::new(store.clone()));

        service
            .register_invoice(invoice("400", vec![line("A", 3, Decimal::ONE)]), "Ana")
            .await
            .unwrap();

        let err = service
            .register_invoice(invoice("400", vec![line("A", 7, Decimal::TEN)]), "Bruno")
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::InvoiceAlreadyExists(number) if number == "400"));
        assert_eq!(store.invoices().len(), 1);
        assert_eq!(store.invoices()[0].total_value, Decimal::new(3, 0));
        assert_eq!(store.invoice_items().len(), 1);
        assert_eq!(store.movements().len(), 1);
        assert_eq!(store.product("A").unwrap().quantity, 3);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_duplicate_invoices_apply_once() {
        let store = MemoryStore::new();
        seed(&store, "A", 1).await;
        let service = InvoiceService::new(Arc::new(store.clone()));

        let mut tasks = vec![];
        for _ in 0..4 {
            let service = service.clone();
            tasks.push(tokio::spawn(async move {
                service
                    .register_invoice(invoice("500", vec![line("A", 2, Decimal::ONE)]), "Ana")
                    .await
                    .is_ok()
            }));
        }

        let mut successes = 0;
        for task in tasks {
            if task.await.unwrap() {
                successes += 1;
            }
        }

        assert_eq!(successes, 1);
        assert_eq!(store.product("A").unwrap().quantity, 2);
        assert_eq!(store.movements().len(), 1);
    }

    #[tokio::test]
    async fn empty_or_invalid_items_are_validation_errors() {
        let store = MemoryStore::new();
        let service = InvoiceService::new(Arc::new(store.clone()));

        let err = service.register_invoice(invoice("600", vec![]), "Ana").await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));

        let err = service
            .register_invoice(invoice("601", vec![line("A", 1, Decimal::ZERO)]), "Ana")
            .await
            .unwrap_err();
        let AppError::ValidationError(errors) = err else {
            panic!("esperava erro de validação");
        };
        assert!(errors.errors().contains_key("items"));
        assert!(store.invoices().is_empty());
    }

    fn assert_items_range_error(err: AppError) {
        let AppError::ValidationError(errors) = err else {
            panic!("esperava erro de validação, veio {err:?}");
        };
        assert!(errors.field_errors().contains_key("items"));
    }

    #[tokio::test]
    async fn oversized_price_is_a_validation_error_and_writes_nothing() {
        let store = MemoryStore::new();
        seed(&store, "A", 1).await;
        let service = InvoiceService::new(Arc::new(store.clone()));

        // 1000 x 10^28 não cabe em Decimal
        let huge = Decimal::from_i128_with_scale(10_i128.pow(28), 0);
        let err = service
            .register_invoice(invoice("700", vec![line("A", 1000, huge)]), "Ana")
            .await
            .unwrap_err();
        assert_items_range_error(err);

        // Cabe em Decimal, mas não em NUMERIC(14, 4)
        let err = service
            .register_invoice(invoice("701", vec![line("A", 1, Decimal::new(10_000_000_000, 0))]), "Ana")
            .await
            .unwrap_err();
        assert_items_range_error(err);

        assert!(store.invoices().is_empty());
        assert!(store.invoice_items().is_empty());
        assert!(store.movements().is_empty());
        assert_eq!(store.product("A").unwrap().quantity, 0);
    }

    #[tokio::test]
    async fn total_at_the_column_limit_is_accepted() {
        let store = MemoryStore::new();
        seed(&store, "A", 1).await;
        let service = InvoiceService::new(Arc::new(store.clone()));

        let registered = service
            .register_invoice(invoice("702", vec![line("A", 1, Decimal::new(99_999_999_999_999, 4))]), "Ana")
            .await
            .unwrap();

        assert_eq!(registered.total_value, Decimal::new(99_999_999_999_999, 4));
    }

    #[tokio::test]
    async fn stock_beyond_integer_range_is_rejected_before_writing() {
        let store = MemoryStore::new();
        seed(&store, "A", 1).await;
        seed(&store, "B", 1000).await;
        let service = InvoiceService::new(Arc::new(store.clone()));

        service
            .register_invoice(invoice("800", vec![line("A", i32::MAX, Decimal::new(1, 4))]), "Ana")
            .await
            .unwrap();

        // Saldo já no máximo: qualquer entrada estoura
        let err = service
            .register_invoice(invoice("801", vec![line("A", 1, Decimal::ONE)]), "Ana")
            .await
            .unwrap_err();
        assert_items_range_error(err);

        // Quantidade x fator estoura sozinha
        let err = service
            .register_invoice(invoice("802", vec![line("B", 3_000_000, Decimal::ONE)]), "Ana")
            .await
            .unwrap_err();
        assert_items_range_error(err);

        assert_eq!(store.invoices().len(), 1);
        assert_eq!(store.movements().len(), 1);
        assert_eq!(store.product("A").unwrap().quantity, i32::MAX);
        assert_eq!(store.product("B").unwrap().quantity, 0);
    }

    #[tokio::test]
    async fn check_skus_translates_then_reconciles() {
        let store = MemoryStore::new();
        seed(&store, "PAP-A4", 10).await;
        let service = InvoiceService::new(Arc::new(store.clone()));

        let parsed = |sku: &str| ParsedInvoiceItem {
            product_sku: sku.into(),
            product_name: "Item".into(),
            quantity: 1,
            unit_price: Decimal::ONE,
        };
        let payload = CheckSkusPayload {
            items: vec![parsed("FORN-001"), parsed("NOVO/1")],
            mapping: HashMap::from([("FORN-001".to_string(), "pap-a4".to_string())]),
        };

        let result = service.check_skus(payload).await.unwrap();

        assert_eq!(result.matched.len(), 1);
        assert_eq!(result.matched[0].product_sku, "PAP-A4");
        assert_eq!(result.missing_skus, ["NOVO-1"]);
    }
}
