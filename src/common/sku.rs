// src/common/sku.rs

use chrono::{DateTime, Utc};
use rand::Rng;
use validator::ValidationError;

/// Forma canônica de um SKU: sem espaços nas pontas, maiúsculo e com '/' trocada por '-'.
/// Aplicada em toda fronteira de escrita e em toda busca por SKU.
pub fn normalize_sku(raw: &str) -> String {
    raw.trim().to_uppercase().replace('/', "-")
}

/// Gera um SKU no formato `PRE-123456-042`:
/// prefixo = 3 primeiras letras da categoria (ou "OUT"),
/// meio = 6 últimos dígitos do timestamp em ms, sufixo = aleatório de 3 dígitos.
pub fn generate_sku<R: Rng>(category: Option<&str>, now: DateTime<Utc>, rng: &mut R) -> String {
    let prefix: String = match category.map(str::trim).filter(|c| !c.is_empty()) {
        Some(c) => c.chars().take(3).collect::<String>().to_uppercase(),
        None => "OUT".to_string(),
    };

    let millis = now.timestamp_millis().unsigned_abs() % 1_000_000;
    let suffix: u16 = rng.gen_range(0..1000);

    normalize_sku(&format!("{prefix}-{millis:06}-{suffix:03}"))
}

// Validação customizada compartilhada pelos payloads
pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("required");
        err.message = Some("O campo é obrigatório.".into());
        return Err(err);
    }
    Ok(())
}
