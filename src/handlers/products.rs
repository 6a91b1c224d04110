// src/handlers/products.rs

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use crate::{
    common::{error::ApiError, pagination::PageParams},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::product::{
        CreateProductPayload, GenerateSkuQuery, GeneratedSku, LabelQuery, Product, ProductFilter, ProductOption,
        UpdateProductPayload,
    },
};

// GET /api/products
#[utoipa::path(
    get,
    path = "/api/products",
    tag = "Products",
    params(ProductFilter, PageParams),
    responses(
        (status = 200, description = "Página de produtos ({items, totalPages, currentPage, totalItems})", body = Object),
        (status = 401, description = "Não autorizado")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn list_products(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Query(filter): Query<ProductFilter>,
    Query(page): Query<PageParams>,
) -> Result<impl IntoResponse, ApiError> {
    let products = app_state
        .report_service
        .list_products(&filter, &page)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(products)))
}

// GET /api/products/options
#[utoipa::path(
    get,
    path = "/api/products/options",
    tag = "Products",
    responses(
        (status = 200, description = "SKU, nome e saldo de todos os produtos", body = Vec<ProductOption>)
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn product_options(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let options = app_state
        .report_service
        .product_options()
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(options)))
}

// GET /api/products/generate-sku
#[utoipa::path(
    get,
    path = "/api/products/generate-sku",
    tag = "Products",
    params(GenerateSkuQuery),
    responses(
        (status = 200, description = "Sugestão de SKU", body = GeneratedSku)
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn generate_sku(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Query(query): Query<GenerateSkuQuery>,
) -> Json<GeneratedSku> {
    let sku = app_state.catalog_service.generate_sku(query.category.as_deref());
    Json(GeneratedSku { sku })
}

// GET /api/products/{sku}
#[utoipa::path(
    get,
    path = "/api/products/{sku}",
    tag = "Products",
    params(
        ("sku" = String, Path, description = "SKU do produto")
    ),
    responses(
        (status = 200, description = "Produto", body = Product),
        (status = 404, description = "Produto não encontrado")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn get_product(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Path(sku): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let product = app_state
        .catalog_service
        .get_product(&sku)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(product)))
}

// POST /api/products
#[utoipa::path(
    post,
    path = "/api/products",
    tag = "Products",
    request_body = CreateProductPayload,
    responses(
        (status = 201, description = "Produto cadastrado com estoque zero", body = Product),
        (status = 400, description = "Dados inválidos"),
        (status = 409, description = "SKU já existe")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn create_product(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Json(payload): Json<CreateProductPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let product = app_state
        .catalog_service
        .create_product(payload)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(product)))
}

// PUT /api/products/{sku}
#[utoipa::path(
    put,
    path = "/api/products/{sku}",
    tag = "Products",
    params(
        ("sku" = String, Path, description = "SKU do produto")
    ),
    request_body = UpdateProductPayload,
    responses(
        (status = 200, description = "Produto atualizado", body = Product),
        (status = 400, description = "Dados inválidos"),
        (status = 404, description = "Produto não encontrado")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn update_product(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Path(sku): Path<String>,
    Json(payload): Json<UpdateProductPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let product = app_state
        .catalog_service
        .update_product(&sku, payload)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(product)))
}

// DELETE /api/products/{sku}
#[utoipa::path(
    delete,
    path = "/api/products/{sku}",
    tag = "Products",
    params(
        ("sku" = String, Path, description = "SKU do produto")
    ),
    responses(
        (status = 204, description = "Produto excluído"),
        (status = 404, description = "Produto não encontrado"),
        (status = 409, description = "Produto com movimentações ou itens de NF")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn delete_product(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Path(sku): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .catalog_service
        .delete_product(&sku)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// GET /api/products/{sku}/label
#[utoipa::path(
    get,
    path = "/api/products/{sku}/label",
    tag = "Products",
    params(
        ("sku" = String, Path, description = "SKU do produto"),
        LabelQuery
    ),
    responses(
        (status = 200, description = "PDF com as etiquetas", content_type = "application/pdf"),
        (status = 404, description = "Produto não encontrado")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn product_label(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Path(sku): Path<String>,
    Query(query): Query<LabelQuery>,
) -> Result<Response, ApiError> {
    let pdf_bytes = app_state
        .label_service
        .product_label(&sku, query.copies)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    // Mostra o PDF no navegador (pronto para imprimir)
    let headers = [
        (header::CONTENT_TYPE, "application/pdf".to_string()),
        (header::CONTENT_DISPOSITION, format!("inline; filename=\"etiqueta_{sku}.pdf\"")),
    ];

    Ok((headers, pdf_bytes).into_response())
}
