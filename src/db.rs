pub mod store;
pub use store::{InventoryStore, StockUnit};
pub mod pg_store;
pub use pg_store::PgStore;
#[cfg(test)]
pub mod memory_store;

pub mod product_repo;
pub use product_repo::ProductRepository;
pub mod movement_repo;
pub use movement_repo::MovementRepository;
pub mod invoice_repo;
pub use invoice_repo::InvoiceRepository;
pub mod report_repo;
pub use report_repo::ReportRepository;
pub mod user_repo;
pub use user_repo::UserRepository;
