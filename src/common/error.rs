use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::{common::i18n::I18nStore, middleware::i18n::Locale};

// Nosso tipo de erro de domínio, com `thiserror` para melhor ergonomia.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Usuário não encontrado")]
    UserNotFound,

    #[error("Produto não encontrado: {0}")]
    ProductNotFound(String),

    #[error("SKU já existe: {0}")]
    SkuAlreadyExists(String),

    #[error("Estoque insuficiente para {sku}: disponível {available}, solicitado {requested}")]
    InsufficientStock {
        sku: String,
        available: i32,
        requested: i32,
    },

    #[error("SKUs não cadastrados: {0:?}")]
    UnknownSkus(Vec<String>),

    #[error("NF já registrada: {0}")]
    InvoiceAlreadyExists(String),

    #[error("Produto referenciado por movimentações ou NFs: {0}")]
    ProductInUse(String),

    #[error("Documento de NF-e inválido: {0}")]
    InvalidInvoiceDocument(String),

    #[error("Fonte não encontrada: {0}")]
    FontNotFound(String),

    // Variante para erros de banco de dados
    #[error("Erro de banco de dados: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno do servidor: {0}")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl AppError {
    /// Erro de validação de um único campo, no mesmo formato do `validator`.
    pub fn field(field: &'static str, code: &'static str, message: &str) -> Self {
        let mut err = validator::ValidationError::new(code);
        err.message = Some(message.to_string().into());
        let mut errors = validator::ValidationErrors::new();
        errors.add(field, err);
        AppError::ValidationError(errors)
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidCredentials | AppError::InvalidToken | AppError::UserNotFound => {
                StatusCode::UNAUTHORIZED
            }
            AppError::ProductNotFound(_) => StatusCode::NOT_FOUND,
            AppError::EmailAlreadyExists
            | AppError::SkuAlreadyExists(_)
            | AppError::InsufficientStock { .. }
            | AppError::UnknownSkus(_)
            | AppError::InvoiceAlreadyExists(_)
            | AppError::ProductInUse(_) => StatusCode::CONFLICT,
            AppError::InvalidInvoiceDocument(_) => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Converte o erro de domínio na resposta HTTP, traduzida para o idioma do cliente.
    pub fn to_api_error(&self, locale: &Locale, i18n: &I18nStore) -> ApiError {
        let status = self.status();
        let t = |key: &str, args: &[(&str, String)]| i18n.translate(locale, key, args);

        let (error, details) = match self {
            AppError::ValidationError(errors) => {
                let mut details = serde_json::Map::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .map(|e| {
                            e.message
                                .as_ref()
                                .map(|m| m.to_string())
                                .unwrap_or_else(|| e.code.to_string())
                        })
                        .collect();
                    details.insert(field.to_string(), json!(messages));
                }
                // Erros de itens aninhados (ex: items[2].quantity)
                for (field, kind) in errors.errors() {
                    if let validator::ValidationErrorsKind::List(list) = kind {
                        for (index, nested) in list {
                            for (nested_field, nested_errors) in nested.field_errors() {
                                let messages: Vec<String> = nested_errors
                                    .iter()
                                    .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                                    .collect();
                                details.insert(format!("{field}[{index}].{nested_field}"), json!(messages));
                            }
                        }
                    }
                }
                (t("validation", &[]), Some(Value::Object(details)))
            }
            AppError::EmailAlreadyExists => (t("email_exists", &[]), None),
            AppError::InvalidCredentials => (t("invalid_credentials", &[]), None),
            AppError::InvalidToken => (t("invalid_token", &[]), None),
            AppError::UserNotFound => (t("user_not_found", &[]), None),
            AppError::ProductNotFound(sku) => (
                t("product_not_found", &[("sku", sku.clone())]),
                Some(json!({ "sku": sku })),
            ),
            AppError::SkuAlreadyExists(sku) => (
                t("sku_exists", &[("sku", sku.clone())]),
                Some(json!({ "sku": sku })),
            ),
            AppError::InsufficientStock { sku, available, requested } => (
                t(
                    "insufficient_stock",
                    &[
                        ("sku", sku.clone()),
                        ("available", available.to_string()),
                        ("requested", requested.to_string()),
                    ],
                ),
                Some(json!({ "sku": sku, "available": available, "requested": requested })),
            ),
            AppError::UnknownSkus(skus) => (
                t("unknown_skus", &[("skus", skus.join(", "))]),
                Some(json!({ "missingSkus": skus })),
            ),
            AppError::InvoiceAlreadyExists(number) => (
                t("invoice_exists", &[("number", number.clone())]),
                Some(json!({ "invoiceNumber": number })),
            ),
            AppError::ProductInUse(sku) => (
                t("product_in_use", &[("sku", sku.clone())]),
                Some(json!({ "sku": sku })),
            ),
            AppError::InvalidInvoiceDocument(reason) => {
                (t("invalid_invoice_document", &[("reason", reason.clone())]), None)
            }
            AppError::FontNotFound(path) => {
                tracing::error!("Fonte das etiquetas não encontrada: {}", path);
                (t("font_not_found", &[]), None)
            }

            // Todos os outros erros (DatabaseError, InternalServerError...) viram 500.
            // O detalhe fica só no log.
            e => {
                tracing::error!("Erro Interno do Servidor: {}", e);
                (t("internal", &[]), None)
            }
        };

        ApiError { status, error, details }
    }
}

// Resposta de erro já traduzida, pronta para o cliente.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub details: Option<Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({ "error": self.error, "details": details }),
            None => json!({ "error": self.error }),
        };
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt() -> Locale {
        Locale("pt".into())
    }

    #[test]
    fn business_errors_map_to_conflict() {
        let err = AppError::InsufficientStock { sku: "A".into(), available: 2, requested: 8 };
        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert_eq!(AppError::UnknownSkus(vec!["X".into()]).status(), StatusCode::CONFLICT);
        assert_eq!(AppError::ProductInUse("A".into()).status(), StatusCode::CONFLICT);
        assert_eq!(AppError::ProductNotFound("A".into()).status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn insufficient_stock_carries_quantities() {
        let err = AppError::InsufficientStock { sku: "CX-01".into(), available: 2, requested: 8 };
        let api = err.to_api_error(&pt(), &I18nStore::new());

        assert!(api.error.contains("Disponível: 2"));
        let details = api.details.expect("details");
        assert_eq!(details["available"], 2);
        assert_eq!(details["requested"], 8);
    }

    #[test]
    fn unknown_skus_lists_every_missing_sku() {
        let err = AppError::UnknownSkus(vec!["A-1".into(), "B-2".into()]);
        let api = err.to_api_error(&pt(), &I18nStore::new());

        assert!(api.error.contains("[A-1, B-2]"));
        assert_eq!(api.details.expect("details")["missingSkus"], json!(["A-1", "B-2"]));
    }

    #[test]
    fn field_helper_builds_validation_details() {
        let err = AppError::field("period", "range", "O período deve ser maior que zero.");
        let api = err.to_api_error(&pt(), &I18nStore::new());

        assert_eq!(api.status, StatusCode::BAD_REQUEST);
        assert_eq!(api.details.expect("details")["period"], json!(["O período deve ser maior que zero."]));
    }

    #[test]
    fn internal_errors_hide_details() {
        let err = AppError::InternalServerError(anyhow::anyhow!("conexão caiu"));
        let api = err.to_api_error(&pt(), &I18nStore::new());

        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(api.error, "Ocorreu um erro inesperado.");
        assert!(api.details.is_none());
    }
}
