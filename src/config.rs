// src/config.rs

use std::{env, path::PathBuf, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    common::i18n::I18nStore,
    db::{InventoryStore, InvoiceRepository, MovementRepository, PgStore, ProductRepository, ReportRepository, UserRepository},
    services::{AuthService, CatalogService, InvoiceService, LabelService, MovementService, ReportService},
};

const DEFAULT_SERVER_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_CORS_ORIGIN: &str = "http://localhost:5173";
const DEFAULT_FONTS_DIR: &str = "./fonts";
const DEFAULT_JWT_TTL_HOURS: i64 = 8;

/// Usuário criado na subida quando ainda não existe nenhum com esse e-mail.
#[derive(Debug, Clone)]
pub struct AdminBootstrap {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,
    pub database_max_connections: u32,
    pub cors_origin: String,
    pub fonts_dir: PathBuf,
    pub jwt_ttl_hours: i64,
    pub admin: Option<AdminBootstrap>,
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    // Separado do ambiente real para poder testar sem mexer em variáveis globais
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .with_context(|| format!("{key} deve ser definida"))
        };

        let database_max_connections = match lookup("DATABASE_MAX_CONNECTIONS") {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("DATABASE_MAX_CONNECTIONS inválido: {raw}"))?,
            None => DEFAULT_MAX_CONNECTIONS,
        };

        let jwt_ttl_hours = match lookup("JWT_TTL_HOURS") {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("JWT_TTL_HOURS inválido: {raw}"))?,
            None => DEFAULT_JWT_TTL_HOURS,
        };

        let admin = match (lookup("ADMIN_NAME"), lookup("ADMIN_EMAIL"), lookup("ADMIN_PASSWORD")) {
            (Some(name), Some(email), Some(password)) => Some(AdminBootstrap { name, email, password }),
            _ => None,
        };

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            server_addr: lookup("SERVER_ADDR").unwrap_or_else(|| DEFAULT_SERVER_ADDR.to_string()),
            database_max_connections,
            cors_origin: lookup("CORS_ORIGIN").unwrap_or_else(|| DEFAULT_CORS_ORIGIN.to_string()),
            fonts_dir: lookup("FONTS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_FONTS_DIR)),
            jwt_ttl_hours,
            admin,
        })
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub settings: Arc<Settings>,
    pub i18n_store: Arc<I18nStore>,
    pub auth_service: AuthService,
    pub catalog_service: CatalogService,
    pub movement_service: MovementService,
    pub invoice_service: InvoiceService,
    pub report_service: ReportService,
    pub label_service: LabelService,
}

impl AppState {
    pub async fn new(settings: Settings) -> anyhow::Result<Self> {
        let db_pool = PgPoolOptions::new()
            .max_connections(settings.database_max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&settings.database_url)
            .await
            .context("Falha ao conectar ao banco de dados")?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        // --- Monta o gráfico de dependências ---
        let store: Arc<dyn InventoryStore> = Arc::new(PgStore::new(db_pool.clone()));

        let auth_service = AuthService::new(
            UserRepository::new(db_pool.clone()),
            settings.jwt_secret.clone(),
            settings.jwt_ttl_hours,
            db_pool.clone(),
        );
        let report_service = ReportService::new(
            ProductRepository::new(db_pool.clone()),
            MovementRepository::new(db_pool.clone()),
            InvoiceRepository::new(db_pool.clone()),
            ReportRepository::new(db_pool.clone()),
        );

        Ok(Self {
            auth_service,
            catalog_service: CatalogService::new(store.clone()),
            movement_service: MovementService::new(store.clone()),
            invoice_service: InvoiceService::new(store.clone()),
            label_service: LabelService::new(store, settings.fonts_dir.clone()),
            report_service,
            i18n_store: Arc::new(I18nStore::new()),
            settings: Arc::new(settings),
            db_pool,
        })
    }
}
