// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::login,
        handlers::auth::register,
        handlers::auth::get_me,

        // --- Products ---
        handlers::products::list_products,
        handlers::products::product_options,
        handlers::products::generate_sku,
        handlers::products::get_product,
        handlers::products::create_product,
        handlers::products::update_product,
        handlers::products::delete_product,
        handlers::products::product_label,

        // --- Movements ---
        handlers::movements::list_movements,
        handlers::movements::export_movements,
        handlers::movements::record_movement,

        // --- Invoices ---
        handlers::invoices::list_invoices,
        handlers::invoices::register_invoice,
        handlers::invoices::check_skus,
        handlers::invoices::parse_invoice,

        // --- Reports ---
        handlers::reports::stock_stats,
        handlers::reports::daily_stats,
        handlers::reports::spend,
        handlers::reports::consumption_by_destination,
        handlers::reports::consumption_detail,
        handlers::reports::provisioning,
        handlers::reports::categories,
        handlers::reports::suppliers,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::User,
            models::auth::RegisterUserPayload,
            models::auth::LoginUserPayload,
            models::auth::AuthResponse,

            // --- Products ---
            models::product::Product,
            models::product::ProductOption,
            models::product::CreateProductPayload,
            models::product::UpdateProductPayload,
            models::product::GeneratedSku,

            // --- Movements ---
            models::movement::MovementKind,
            models::movement::StockMovement,
            models::movement::MovementRecord,
            models::movement::RecordMovementPayload,

            // --- Invoices ---
            models::invoice::Invoice,
            models::invoice::InvoiceItem,
            models::invoice::InvoiceItemDetail,
            models::invoice::InvoiceDetail,
            models::invoice::InvoiceLine,
            models::invoice::RegisterInvoicePayload,
            models::invoice::RegisteredInvoice,
            models::invoice::ParsedInvoiceItem,
            models::invoice::ParsedInvoice,
            models::invoice::CheckSkusPayload,
            models::invoice::Reconciliation,

            // --- Reports ---
            models::report::StockStats,
            models::report::DailyStats,
            models::report::SpendEntry,
            models::report::DestinationConsumption,
            models::report::ConsumptionDetail,
            models::report::ProvisioningEntry,
        )
    ),
    tags(
        (name = "Auth", description = "Autenticação e cadastro de funcionários"),
        (name = "Products", description = "Catálogo de produtos e etiquetas"),
        (name = "Movements", description = "Entradas e saídas do almoxarifado"),
        (name = "Invoices", description = "Recebimento de notas fiscais"),
        (name = "Reports", description = "Indicadores, gastos, consumo e provisionamento")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}
