// src/common/i18n.rs

use std::collections::HashMap;

use crate::middleware::i18n::Locale;

pub const DEFAULT_LANG: &str = "pt";

// (chave, português, inglês)
const MESSAGES: &[(&str, &str, &str)] = &[
    ("validation", "Um ou mais campos são inválidos.", "One or more fields are invalid."),
    ("invalid_credentials", "E-mail ou senha inválidos.", "Invalid e-mail or password."),
    ("invalid_token", "Token de autenticação inválido ou ausente.", "Missing or invalid authentication token."),
    ("user_not_found", "Usuário não encontrado ou inativo.", "User not found or inactive."),
    ("email_exists", "Este e-mail já está em uso.", "This e-mail is already in use."),
    ("product_not_found", "Produto (SKU {sku}) não encontrado.", "Product (SKU {sku}) not found."),
    ("sku_exists", "O SKU '{sku}' já existe no banco de dados.", "SKU '{sku}' already exists."),
    (
        "insufficient_stock",
        "Estoque insuficiente para {sku}. Disponível: {available}, Solicitado: {requested}.",
        "Insufficient stock for {sku}. Available: {available}, requested: {requested}.",
    ),
    (
        "unknown_skus",
        "Os seguintes SKUs não foram encontrados: [{skus}]. Cadastre-os e reenvie a NF.",
        "The following SKUs were not found: [{skus}]. Register them and resubmit the invoice.",
    ),
    ("invoice_exists", "A Nota Fiscal Nº {number} já foi registrada.", "Invoice {number} has already been registered."),
    (
        "product_in_use",
        "O produto {sku} não pode ser excluído pois possui histórico de movimentações ou está vinculado a uma Nota Fiscal.",
        "Product {sku} cannot be deleted because it has stock movements or invoice items.",
    ),
    ("invalid_invoice_document", "XML de NF-e inválido: {reason}", "Invalid NF-e XML: {reason}"),
    ("font_not_found", "Fonte para etiquetas não encontrada.", "Label font not found."),
    ("internal", "Ocorreu um erro inesperado.", "An unexpected error occurred."),
];

/// Catálogo de mensagens de erro por idioma.
/// Idiomas desconhecidos caem no português.
#[derive(Debug, Clone)]
pub struct I18nStore {
    messages: HashMap<String, HashMap<&'static str, &'static str>>,
}

impl I18nStore {
    pub fn new() -> Self {
        let mut pt = HashMap::new();
        let mut en = HashMap::new();
        for (key, pt_msg, en_msg) in MESSAGES {
            pt.insert(*key, *pt_msg);
            en.insert(*key, *en_msg);
        }

        let mut messages = HashMap::new();
        messages.insert("pt".to_string(), pt);
        messages.insert("en".to_string(), en);
        Self { messages }
    }

    /// Traduz `key` substituindo os `{placeholders}` por `args`.
    pub fn translate(&self, locale: &Locale, key: &str, args: &[(&str, String)]) -> String {
        let template = self
            .messages
            .get(locale.0.as_str())
            .and_then(|m| m.get(key))
            .or_else(|| self.messages.get(DEFAULT_LANG).and_then(|m| m.get(key)))
            .copied()
            .unwrap_or(key);

        args.iter().fold(template.to_string(), |msg, (name, value)| {
            msg.replace(&format!("{{{name}}}"), value)
        })
    }
}

impl Default for I18nStore {
    fn default() -> Self {
        Self::new()
    }
}
