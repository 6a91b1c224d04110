pub mod auth;
pub mod invoices;
pub mod movements;
pub mod products;
pub mod reports;
