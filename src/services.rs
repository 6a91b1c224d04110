pub mod auth;
pub mod catalog_service;
pub mod invoice_service;
pub mod label_service;
pub mod movement_service;
pub mod nfe;
pub mod report_service;

pub use auth::AuthService;
pub use catalog_service::CatalogService;
pub use invoice_service::InvoiceService;
pub use label_service::LabelService;
pub use movement_service::MovementService;
pub use report_service::ReportService;
