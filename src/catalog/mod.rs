//! Product catalog: storage, the mock HTTP API over it, and the client the
//! consumer writes through.

pub mod api;
pub mod client;
pub mod store;

pub use api::{CATALOG_PREFIX, router};
pub use client::{CatalogClient, HttpCatalogClient};
pub use store::{CatalogStore, MemoryCatalogStore, RedisCatalogStore};
