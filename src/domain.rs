//! Domain module - product entities and URL identifier parsing

pub mod product;
pub mod product_url;

pub use product::{BatchRow, ProductSnapshot, Review, SpecEntry};
pub use product_url::{Marketplace, ProductRef};
