// src/middleware/i18n.rs

use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};

use crate::common::i18n::DEFAULT_LANG;

// Extrator de idioma (Accept-Language)
#[derive(Debug, Clone)]
pub struct Locale(pub String);

impl<S> FromRequestParts<S> for Locale
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        Ok(Locale(
            parts
                .headers
                .get(header::ACCEPT_LANGUAGE)
                .and_then(|header_value| header_value.to_str().ok())
                .and_then(primary_language)
                .unwrap_or_else(|| DEFAULT_LANG.to_string()),
        ))
    }
}

// "pt-BR,pt;q=0.9,en;q=0.8" -> "pt"
fn primary_language(header_str: &str) -> Option<String> {
    accept_language::parse(header_str)
        .first()
        .map(|tag| tag.split('-').next().unwrap_or(tag).trim().to_lowercase())
        .filter(|lang| !lang.is_empty())
}
