//! Catalog access: wire records, HTTP transport, the shared cache, and the
//! browsing helpers (filtering, sorting, pagination).

pub mod cache;
pub mod filter;
pub mod http;
pub mod pagination;
pub mod records;
pub mod transport;

pub use self::cache::CatalogCache;
pub use self::filter::FilterSortEngine;
pub use self::http::HttpCatalogTransport;
pub use self::pagination::PaginationController;
pub use self::records::{Item, ItemKind, ReferenceKind, ReferenceRecord};
pub use self::transport::{CatalogTransport, ItemQuery};
