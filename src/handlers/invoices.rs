// src/handlers/invoices.rs

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::invoice::{
        CheckSkusPayload, InvoiceDetail, ParsedInvoice, Reconciliation, RegisterInvoicePayload, RegisteredInvoice,
    },
    services::nfe,
};

// GET /api/invoices
#[utoipa::path(
    get,
    path = "/api/invoices",
    tag = "Invoices",
    responses(
        (status = 200, description = "NFs recebidas, mais recentes primeiro, com itens", body = Vec<InvoiceDetail>)
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn list_invoices(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let invoices = app_state
        .report_service
        .list_invoices()
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(invoices)))
}

// POST /api/invoices
#[utoipa::path(
    post,
    path = "/api/invoices",
    tag = "Invoices",
    request_body = RegisterInvoicePayload,
    responses(
        (status = 201, description = "NF registrada e estoque atualizado", body = RegisteredInvoice),
        (status = 400, description = "Dados inválidos"),
        (status = 409, description = "SKUs não cadastrados ou NF já registrada")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn register_invoice(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<RegisterInvoicePayload>,
) -> Result<impl IntoResponse, ApiError> {
    // Quem está logado é o responsável pelas entradas
    let registered = app_state
        .invoice_service
        .register_invoice(payload, &user.name)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(registered)))
}

// POST /api/invoices/check-skus
#[utoipa::path(
    post,
    path = "/api/invoices/check-skus",
    tag = "Invoices",
    request_body = CheckSkusPayload,
    responses(
        (status = 200, description = "Itens separados entre cadastrados e faltantes", body = Reconciliation)
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn check_skus(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Json(payload): Json<CheckSkusPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let reconciliation = app_state
        .invoice_service
        .check_skus(payload)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(reconciliation)))
}

// POST /api/invoices/parse (multipart, campo "file")
#[utoipa::path(
    post,
    path = "/api/invoices/parse",
    tag = "Invoices",
    request_body(content_type = "multipart/form-data", description = "Campo `file` com o XML da NF-e"),
    responses(
        (status = 200, description = "Cabeçalho e itens extraídos (nada é gravado)", body = ParsedInvoice),
        (status = 400, description = "Nenhum arquivo enviado"),
        (status = 422, description = "XML de NF-e inválido")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn parse_invoice(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let parsed = read_xml_field(multipart)
        .await
        .and_then(|xml| nfe::extract_invoice(&xml))
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(parsed)))
}

async fn read_xml_field(mut multipart: Multipart) -> Result<String, AppError> {
    let missing = || AppError::field("file", "required", "Nenhum arquivo XML enviado.");

    while let Some(field) = multipart.next_field().await.map_err(|_| missing())? {
        if field.name() != Some("file") {
            continue;
        }
        let bytes = field.bytes().await.map_err(|_| missing())?;
        return String::from_utf8(bytes.to_vec())
            .map_err(|_| AppError::InvalidInvoiceDocument("o arquivo não está em UTF-8".to_string()));
    }

    Err(missing())
}
