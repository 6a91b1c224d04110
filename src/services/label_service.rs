// src/services/label_service.rs

use std::{path::PathBuf, sync::Arc};

use genpdf::{elements, style, Element};
use image::Luma;
use qrcode::QrCode;

use crate::{
    common::{error::AppError, sku::normalize_sku},
    db::InventoryStore,
    models::product::Product,
};

pub const MAX_COPIES: u32 = 100;
const FONT_FAMILY: &str = "Roboto";

#[derive(Clone)]
pub struct LabelService {
    store: Arc<dyn InventoryStore>,
    fonts_dir: PathBuf,
}

impl LabelService {
    pub fn new(store: Arc<dyn InventoryStore>, fonts_dir: PathBuf) -> Self {
        Self { store, fonts_dir }
    }

    /// PDF com `copies` etiquetas do produto (nome, SKU e QR code do SKU).
    pub async fn product_label(&self, sku: &str, copies: Option<u32>) -> Result<Vec<u8>, AppError> {
        let copies = label_copies(copies)?;
        let sku = normalize_sku(sku);
        let product = self
            .store
            .find_product(&sku)
            .await?
            .ok_or(AppError::ProductNotFound(sku))?;

        self.render(&product, copies)
    }

    fn render(&self, product: &Product, copies: u32) -> Result<Vec<u8>, AppError> {
        // Carrega a fonte da pasta configurada (FONTS_DIR)
        let font_family = genpdf::fonts::from_files(&self.fonts_dir, FONT_FAMILY, None)
            .map_err(|_| AppError::FontNotFound(self.fonts_dir.display().to_string()))?;

        let mut doc = genpdf::Document::new(font_family);
        doc.set_title(format!("Etiqueta {}", product.sku));
        // Uma etiqueta por página, no tamanho do rolo (100 x 70 mm)
        doc.set_paper_size(genpdf::Size::new(100, 70));
        let mut decorator = genpdf::SimplePageDecorator::new();
        decorator.set_margins(5);
        doc.set_page_decorator(decorator);

        let code = QrCode::new(product.sku.as_bytes())
            .map_err(|e| AppError::InternalServerError(anyhow::Error::msg(e.to_string())))?;
        let qr_image = image::DynamicImage::ImageLuma8(code.render::<Luma<u8>>().build());

        for copy in 0..copies {
            if copy > 0 {
                doc.push(elements::PageBreak::new());
            }

            doc.push(
                elements::Paragraph::new(product.name.clone())
                    .styled(style::Style::new().bold().with_font_size(12)),
            );
            doc.push(
                elements::Paragraph::new(format!("SKU: {}", product.sku))
                    .styled(style::Style::new().with_font_size(10)),
            );
            doc.push(elements::Break::new(0.5));

            let pdf_image = elements::Image::from_dynamic_image(qr_image.clone())
                .map_err(|e| AppError::InternalServerError(anyhow::Error::msg(e.to_string())))?
                .with_scale(genpdf::Scale::new(0.4, 0.4));
            doc.push(pdf_image);
        }

        // Renderiza para Buffer (Memória)
        let mut buffer = Vec::new();
        doc.render(&mut buffer)
            .map_err(|e| AppError::InternalServerError(anyhow::Error::msg(e.to_string())))?;

        Ok(buffer)
    }
}

fn label_copies(copies: Option<u32>) -> Result<u32, AppError> {
    let copies = copies.unwrap_or(1);
    if !(1..=MAX_COPIES).contains(&copies) {
        return Err(AppError::field("copies", "range", "O número de etiquetas deve estar entre 1 e 100."));
    }
    Ok(copies)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{db::memory_store::MemoryStore, models::product::CreateProductPayload};

    fn service(store: &MemoryStore) -> LabelService {
        LabelService::new(Arc::new(store.clone()), PathBuf::from("/caminho/que/nao/existe"))
    }

    #[test]
    fn copies_default_to_one_and_are_bounded() {
        assert_eq!(label_copies(None).unwrap(), 1);
        assert_eq!(label_copies(Some(100)).unwrap(), 100);
        assert!(matches!(label_copies(Some(0)), Err(AppError::ValidationError(_))));
        assert!(matches!(label_copies(Some(101)), Err(AppError::ValidationError(_))));
    }

    #[tokio::test]
    async fn unknown_product_is_not_found() {
        let store = MemoryStore::new();
        let err = service(&store).product_label("nada", None).await.unwrap_err();
        assert!(matches!(err, AppError::ProductNotFound(sku) if sku == "NADA"));
    }

    #[tokio::test]
    async fn missing_fonts_are_reported() {
        let store = MemoryStore::new();
        store
            .insert_product(&CreateProductPayload {
                sku: "PAP-A4".into(),
                name: "Papel A4".into(),
                category: "Papelaria".into(),
                description: None,
                min_stock: 10,
                packaging_factor: 1,
            })
            .await
            .unwrap();

        let err = service(&store).product_label("pap/a4", Some(2)).await.unwrap_err();
        assert!(matches!(err, AppError::FontNotFound(_)));
    }
}
