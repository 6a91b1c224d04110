// src/handlers/movements.rs

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::{
    common::{error::ApiError, pagination::PageParams},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::{
        movement::{MovementFilter, MovementRecord, RecordMovementPayload},
        product::Product,
    },
};

// GET /api/movements
#[utoipa::path(
    get,
    path = "/api/movements",
    tag = "Movements",
    params(MovementFilter, PageParams),
    responses(
        (status = 200, description = "Histórico paginado, mais recentes primeiro", body = Object)
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn list_movements(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Query(filter): Query<MovementFilter>,
    Query(page): Query<PageParams>,
) -> Result<impl IntoResponse, ApiError> {
    let movements = app_state
        .report_service
        .list_movements(&filter, &page)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(movements)))
}

// GET /api/movements/export
#[utoipa::path(
    get,
    path = "/api/movements/export",
    tag = "Movements",
    params(MovementFilter),
    responses(
        (status = 200, description = "Histórico completo com o mesmo filtro, sem paginação", body = Vec<MovementRecord>)
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn export_movements(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Query(filter): Query<MovementFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let movements = app_state
        .report_service
        .export_movements(&filter)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(movements)))
}

// POST /api/movements
#[utoipa::path(
    post,
    path = "/api/movements",
    tag = "Movements",
    request_body = RecordMovementPayload,
    responses(
        (status = 201, description = "Movimentação registrada; devolve o produto atualizado", body = Product),
        (status = 400, description = "Dados inválidos"),
        (status = 404, description = "Produto não encontrado"),
        (status = 409, description = "Estoque insuficiente")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn record_movement(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Json(payload): Json<RecordMovementPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let product = app_state
        .movement_service
        .record_movement(payload)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(product)))
}
