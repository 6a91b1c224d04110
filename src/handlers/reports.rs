// src/handlers/reports.rs

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::report::{
        ConsumptionDetail, ConsumptionQuery, DailyStats, DestinationConsumption, ProvisioningEntry,
        ProvisioningQuery, SpendEntry, SpendQuery, StockStats,
    },
};

// GET /api/reports/stats
#[utoipa::path(
    get,
    path = "/api/reports/stats",
    tag = "Reports",
    responses(
        (status = 200, description = "Total de produtos, estoque baixo e zerados", body = StockStats)
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn stock_stats(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let stats = app_state
        .report_service
        .stock_stats()
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(stats)))
}

// GET /api/reports/stats/today
#[utoipa::path(
    get,
    path = "/api/reports/stats/today",
    tag = "Reports",
    responses(
        (status = 200, description = "Entradas, saídas e gastos de hoje", body = DailyStats)
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn daily_stats(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let stats = app_state
        .report_service
        .daily_stats()
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(stats)))
}

// GET /api/reports/spend
#[utoipa::path(
    get,
    path = "/api/reports/spend",
    tag = "Reports",
    params(SpendQuery),
    responses(
        (status = 200, description = "NFs recebidas no período", body = Vec<SpendEntry>),
        (status = 400, description = "Período ausente ou inválido")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn spend(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Query(query): Query<SpendQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = app_state
        .report_service
        .spend(&query)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(rows)))
}

// GET /api/reports/consumption-by-destination
#[utoipa::path(
    get,
    path = "/api/reports/consumption-by-destination",
    tag = "Reports",
    params(ConsumptionQuery),
    responses(
        (status = 200, description = "Saídas agrupadas por destino", body = Vec<DestinationConsumption>),
        (status = 400, description = "Período ausente ou inválido")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn consumption_by_destination(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Query(query): Query<ConsumptionQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = app_state
        .report_service
        .consumption_by_destination(&query)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(rows)))
}

// GET /api/reports/consumption-detail
#[utoipa::path(
    get,
    path = "/api/reports/consumption-detail",
    tag = "Reports",
    params(ConsumptionQuery),
    responses(
        (status = 200, description = "Saídas de um destino no período", body = Vec<ConsumptionDetail>),
        (status = 400, description = "Período ou destino ausente")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn consumption_detail(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Query(query): Query<ConsumptionQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = app_state
        .report_service
        .consumption_detail(&query)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(rows)))
}

// GET /api/reports/provisioning
#[utoipa::path(
    get,
    path = "/api/reports/provisioning",
    tag = "Reports",
    params(ProvisioningQuery),
    responses(
        (status = 200, description = "Dias restantes até o estoque mínimo, mais críticos primeiro", body = Vec<ProvisioningEntry>),
        (status = 400, description = "Período fora de 1..=3650")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn provisioning(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Query(query): Query<ProvisioningQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let forecast = app_state
        .report_service
        .provisioning(query.period)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(forecast)))
}

// GET /api/reports/lists/categories
#[utoipa::path(
    get,
    path = "/api/reports/lists/categories",
    tag = "Reports",
    responses(
        (status = 200, description = "Categorias distintas, em ordem alfabética", body = Vec<String>)
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn categories(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let categories = app_state
        .report_service
        .categories()
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(categories)))
}

// GET /api/reports/lists/suppliers
#[utoipa::path(
    get,
    path = "/api/reports/lists/suppliers",
    tag = "Reports",
    responses(
        (status = 200, description = "Fornecedores distintos, em ordem alfabética", body = Vec<String>)
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn suppliers(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let suppliers = app_state
        .report_service
        .suppliers()
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(suppliers)))
}
