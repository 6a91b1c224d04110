//src/main.rs

use anyhow::Context;
use axum::{
    http::HeaderValue,
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod services;

use crate::config::{AppState, Settings};
use crate::docs::ApiDoc;
use crate::middleware::auth::auth_guard;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn")))
        .with_target(false)
        .compact()
        .init();

    let settings = Settings::from_env()?;
    let app_state = AppState::new(settings).await?;

    // Faz o app rodar as migrações do SQLx na inicialização
    sqlx::migrate!()
        .run(&app_state.db_pool)
        .await
        .context("Falha ao rodar as migrações do banco de dados.")?;

    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    if let Some(admin) = &app_state.settings.admin {
        app_state
            .auth_service
            .ensure_admin(&admin.name, &admin.email, &admin.password)
            .await
            .context("Falha ao criar o usuário administrador inicial.")?;
    }

    let auth_routes = Router::new()
        .route("/me", get(handlers::auth::get_me))
        .route("/register", post(handlers::auth::register));

    // "/options" e "/generate-sku" têm prioridade sobre "/{sku}"
    let product_routes = Router::new()
        .route(
            "/",
            get(handlers::products::list_products).post(handlers::products::create_product),
        )
        .route("/options", get(handlers::products::product_options))
        .route("/generate-sku", get(handlers::products::generate_sku))
        .route(
            "/{sku}",
            get(handlers::products::get_product)
                .put(handlers::products::update_product)
                .delete(handlers::products::delete_product),
        )
        .route("/{sku}/label", get(handlers::products::product_label));

    let movement_routes = Router::new()
        .route(
            "/",
            get(handlers::movements::list_movements).post(handlers::movements::record_movement),
        )
        .route("/export", get(handlers::movements::export_movements));

    let invoice_routes = Router::new()
        .route(
            "/",
            get(handlers::invoices::list_invoices).post(handlers::invoices::register_invoice),
        )
        .route("/check-skus", post(handlers::invoices::check_skus))
        .route("/parse", post(handlers::invoices::parse_invoice));

    let report_routes = Router::new()
        .route("/stats", get(handlers::reports::stock_stats))
        .route("/stats/today", get(handlers::reports::daily_stats))
        .route("/spend", get(handlers::reports::spend))
        .route(
            "/consumption-by-destination",
            get(handlers::reports::consumption_by_destination),
        )
        .route("/consumption-detail", get(handlers::reports::consumption_detail))
        .route("/provisioning", get(handlers::reports::provisioning))
        .route("/lists/categories", get(handlers::reports::categories))
        .route("/lists/suppliers", get(handlers::reports::suppliers));

    // Tudo aqui dentro exige token válido
    let protected_routes = Router::new()
        .nest("/auth", auth_routes)
        .nest("/products", product_routes)
        .nest("/movements", movement_routes)
        .nest("/invoices", invoice_routes)
        .nest("/reports", report_routes)
        .route_layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    let cors = CorsLayer::new()
        .allow_origin(
            app_state
                .settings
                .cors_origin
                .parse::<HeaderValue>()
                .context("CORS_ORIGIN inválido")?,
        )
        .allow_methods(Any)
        .allow_headers(Any);

    let addr = app_state.settings.server_addr.clone();

    // Combina tudo no router principal
    let app = Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .route("/api/auth/login", post(handlers::auth::login))
        .nest("/api", protected_routes)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    // Inicia o servidor
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Falha ao iniciar o listener TCP em {addr}"))?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);
    axum::serve(listener, app).await.context("Erro no servidor Axum")?;

    Ok(())
}
