pub mod auth;
pub mod invoice;
pub mod movement;
pub mod product;
pub mod report;
