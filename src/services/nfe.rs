// src/services/nfe.rs
//
// Leitura do XML da NF-e e conciliação dos itens com o catálogo.
// Nada aqui toca no banco.

use std::{
    collections::{BTreeSet, HashMap, HashSet},
    str::FromStr,
};

use chrono::NaiveDate;
use quick_xml::{events::Event, Reader};
use rust_decimal::{prelude::ToPrimitive, Decimal};
use serde::Deserialize;

use crate::{
    common::{error::AppError, sku::normalize_sku},
    models::invoice::{ParsedInvoice, ParsedInvoiceItem, Reconciliation},
};

// --- Estrutura do XML (nfeProc > NFe > infNFe) ---
// Atributos (versao, Id, xmlns...) e tags que não usamos são ignorados.

#[derive(Debug, Deserialize)]
struct NfeProc {
    #[serde(rename = "NFe")]
    nfe: Nfe,
}

#[derive(Debug, Deserialize)]
struct Nfe {
    #[serde(rename = "infNFe")]
    inf_nfe: InfNfe,
}

#[derive(Debug, Deserialize)]
struct InfNfe {
    ide: Ide,
    emit: Emit,
    #[serde(default)]
    det: Vec<Det>,
}

#[derive(Debug, Deserialize)]
struct Ide {
    #[serde(rename = "nNF")]
    number: String,
    // Layout 4.0 usa dhEmi (data/hora); layouts antigos, dEmi
    #[serde(rename = "dhEmi")]
    issued_at: Option<String>,
    #[serde(rename = "dEmi")]
    issued_on: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Emit {
    #[serde(rename = "xNome")]
    name: String,
}

#[derive(Debug, Deserialize)]
struct Det {
    prod: Prod,
}

#[derive(Debug, Deserialize)]
struct Prod {
    #[serde(rename = "cProd")]
    code: String,
    #[serde(rename = "xProd")]
    description: String,
    #[serde(rename = "qCom")]
    quantity: String,
    #[serde(rename = "vUnCom")]
    unit_price: String,
}

fn invalid(reason: impl Into<String>) -> AppError {
    AppError::InvalidInvoiceDocument(reason.into())
}

fn root_element(xml: &str) -> Result<String, AppError> {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event() {
            Ok(Event::Start(tag)) | Ok(Event::Empty(tag)) => {
                return Ok(String::from_utf8_lossy(tag.local_name().as_ref()).into_owned());
            }
            Ok(Event::Eof) => return Err(invalid("documento vazio")),
            Err(e) => return Err(invalid(e.to_string())),
            Ok(_) => {}
        }
    }
}

fn parse_issue_date(ide: &Ide) -> Result<NaiveDate, AppError> {
    let raw = ide
        .issued_at
        .as_deref()
        .or(ide.issued_on.as_deref())
        .ok_or_else(|| invalid("data de emissão ausente"))?;

    // "2025-03-10T14:32:00-03:00" -> "2025-03-10"
    let date_part = raw.trim().split('T').next().unwrap_or_default();
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .map_err(|_| invalid(format!("data de emissão inválida: {raw}")))
}

fn parse_decimal(field: &str, raw: &str) -> Result<Decimal, AppError> {
    Decimal::from_str(raw.trim()).map_err(|_| invalid(format!("{field} inválido: {raw}")))
}

fn parse_item(prod: Prod) -> Result<ParsedInvoiceItem, AppError> {
    let product_sku = normalize_sku(&prod.code);
    let quantity = parse_decimal("qCom", &prod.quantity)?;

    // Estoque é contado em unidades inteiras
    if !quantity.fract().is_zero() {
        return Err(invalid(format!(
            "quantidade fracionada no item {product_sku}: {}",
            prod.quantity.trim()
        )));
    }
    let quantity = quantity
        .to_i32()
        .ok_or_else(|| invalid(format!("quantidade fora do limite no item {product_sku}")))?;

    Ok(ParsedInvoiceItem {
        product_sku,
        product_name: prod.description.trim().to_string(),
        quantity,
        unit_price: parse_decimal("vUnCom", &prod.unit_price)?.normalize(),
    })
}

/// Extrai cabeçalho e itens de um XML de NF-e autorizada (`nfeProc`).
pub fn extract_invoice(xml: &str) -> Result<ParsedInvoice, AppError> {
    if root_element(xml)? != "nfeProc" {
        return Err(invalid("estrutura nfeProc não encontrada"));
    }

    let document: NfeProc = quick_xml::de::from_str(xml).map_err(|e| invalid(e.to_string()))?;
    let inf = document.nfe.inf_nfe;

    if inf.det.is_empty() {
        return Err(invalid("a nota não possui itens"));
    }

    let issue_date = parse_issue_date(&inf.ide)?;
    let items = inf
        .det
        .into_iter()
        .map(|det| parse_item(det.prod))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ParsedInvoice {
        invoice_number: inf.ide.number.trim().to_string(),
        supplier: inf.emit.name.trim().to_string(),
        issue_date,
        items,
    })
}

/// Troca o SKU do fornecedor pelo nosso quando há um mapeamento para ele.
pub fn translate_skus(items: Vec<ParsedInvoiceItem>, mapping: &HashMap<String, String>) -> Vec<ParsedInvoiceItem> {
    let mapping: HashMap<String, String> = mapping
        .iter()
        .filter(|(_, ours)| !ours.trim().is_empty())
        .map(|(theirs, ours)| (normalize_sku(theirs), normalize_sku(ours)))
        .collect();

    items
        .into_iter()
        .map(|mut item| {
            let sku = normalize_sku(&item.product_sku);
            item.product_sku = mapping.get(&sku).cloned().unwrap_or(sku);
            item
        })
        .collect()
}

/// Separa os itens entre os que existem no catálogo e os que precisam ser cadastrados.
pub fn reconcile(items: Vec<ParsedInvoiceItem>, known_skus: &HashSet<String>) -> Reconciliation {
    let (matched, unmatched): (Vec<_>, Vec<_>) = items
        .into_iter()
        .partition(|item| known_skus.contains(&item.product_sku));

    let missing_skus = unmatched
        .iter()
        .map(|item| item.product_sku.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    Reconciliation { matched, unmatched, missing_skus }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SINGLE_ITEM: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<nfeProc versao="4.00" xmlns="http://www.portalfiscal.inf.br/nfe">
  <NFe>
    <infNFe Id="NFe35250300000000000000550010000012341000012345" versao="4.00">
      <ide><cUF>35</cUF><nNF>1234</nNF><dhEmi>2025-03-10T14:32:00-03:00</dhEmi></ide>
      <emit><CNPJ>00000000000000</CNPJ><xNome>Distribuidora Papel &amp; Cia</xNome></emit>
      <det nItem="1">
        <prod><cProd>pap/a4</cProd><xProd>Papel A4 caixa c/ 10</xProd><qCom>5.0000</qCom><vUnCom>10.5000000000</vUnCom></prod>
      </det>
    </infNFe>
  </NFe>
</nfeProc>"#;

    const TWO_ITEMS: &str = r#"<nfeProc><NFe><infNFe>
      <ide><nNF>77</nNF><dEmi>2024-12-01</dEmi></ide>
      <emit><xNome>Limpa Tudo</xNome></emit>
      <det nItem="1"><prod><cProd>DET-1</cProd><xProd>Detergente</xProd><qCom>12</qCom><vUnCom>2.5</vUnCom></prod></det>
      <det nItem="2"><prod><cProd>ESP-2</cProd><xProd>Esponja</xProd><qCom>30</qCom><vUnCom>0.9</vUnCom></prod></det>
    </infNFe></NFe></nfeProc>"#;

    fn item(sku: &str) -> ParsedInvoiceItem {
        ParsedInvoiceItem {
            product_sku: sku.into(),
            product_name: "x".into(),
            quantity: 1,
            unit_price: Decimal::ONE,
        }
    }

    #[test]
    fn extracts_header_and_single_item() {
        let parsed = extract_invoice(SINGLE_ITEM).unwrap();

        assert_eq!(parsed.invoice_number, "1234");
        assert_eq!(parsed.supplier, "Distribuidora Papel & Cia");
        assert_eq!(parsed.issue_date, NaiveDate::from_ymd_opt(2025, 3, 10).unwrap());
        assert_eq!(parsed.items.len(), 1);
        assert_eq!(parsed.items[0].product_sku, "PAP-A4");
        assert_eq!(parsed.items[0].quantity, 5);
        assert_eq!(parsed.items[0].unit_price, Decimal::new(105, 1));
    }

    #[test]
    fn extracts_every_det_and_old_issue_date() {
        let parsed = extract_invoice(TWO_ITEMS).unwrap();

        assert_eq!(parsed.issue_date, NaiveDate::from_ymd_opt(2024, 12, 1).unwrap());
        let skus: Vec<_> = parsed.items.iter().map(|i| i.product_sku.as_str()).collect();
        assert_eq!(skus, ["DET-1", "ESP-2"]);
    }

    #[test]
    fn document_without_nfe_proc_is_invalid() {
        let bare = "<NFe><infNFe><ide><nNF>1</nNF></ide></infNFe></NFe>";
        let err = extract_invoice(bare).unwrap_err();
        assert!(matches!(err, AppError::InvalidInvoiceDocument(_)));
    }

    #[test]
    fn fractional_quantity_is_rejected() {
        let xml = TWO_ITEMS.replace("<qCom>12</qCom>", "<qCom>1.5</qCom>");
        let err = extract_invoice(&xml).unwrap_err();
        assert!(matches!(err, AppError::InvalidInvoiceDocument(reason) if reason.contains("DET-1")));
    }

    #[test]
    fn garbage_is_invalid_not_internal() {
        assert!(matches!(extract_invoice("não é xml"), Err(AppError::InvalidInvoiceDocument(_))));
    }

    #[test]
    fn translate_applies_mapping_on_normalized_skus() {
        let mapping = HashMap::from([
            ("forn/01".to_string(), "pap-a4".to_string()),
            ("FORN-02".to_string(), " ".to_string()),
        ]);

        let translated = translate_skus(vec![item("FORN-01"), item("forn/02"), item("x/9")], &mapping);

        let skus: Vec<_> = translated.iter().map(|i| i.product_sku.as_str()).collect();
        assert_eq!(skus, ["PAP-A4", "FORN-02", "X-9"]);
    }

    #[test]
    fn reconcile_partitions_and_lists_distinct_missing() {
        let known = HashSet::from(["A".to_string()]);

        let result = reconcile(vec![item("B"), item("A"), item("C"), item("B")], &known);

        assert_eq!(result.matched, vec![item("A")]);
        assert_eq!(result.unmatched.len(), 3);
        assert_eq!(result.missing_skus, ["B", "C"]);
    }
}
