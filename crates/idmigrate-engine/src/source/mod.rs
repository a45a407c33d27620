//! Source API adapters

mod http_client;
mod pagination;

pub use http_client::{HttpSourceClient, USER_AGENT};
pub use pagination::collect_pages;
