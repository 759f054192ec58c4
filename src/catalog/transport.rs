//! Abstraction over the catalog fetch collaborator.
//!
//! The cache only ever talks to the server through [`CatalogTransport`], so
//! tests can substitute an in-memory fake and the HTTP client stays an
//! implementation detail of [`http`](super::http).

use futures::future::BoxFuture;
use std::error::Error;
use thiserror::Error;

use super::records::{ItemRecord, Page, ReferenceKind, ReferenceRecord};

/// Result alias for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Failure raised by a catalog transport, regardless of the underlying
/// client.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The request could not be sent or the connection dropped mid-flight.
    #[error("failed to reach catalog endpoint `{path}`")]
    Request {
        /// Endpoint path or URL of the failed request.
        path: String,
        /// Underlying client failure.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// The server answered with a non-success status code.
    #[error("catalog endpoint `{path}` answered status {status}")]
    Status {
        /// Endpoint path or URL of the failed request.
        path: String,
        /// HTTP status code returned by the server.
        status: u16,
    },
    /// The response body could not be decoded into the expected record.
    #[error("failed to decode catalog response from `{path}`")]
    Decode {
        /// Endpoint path or URL of the failed request.
        path: String,
        /// Underlying decode failure.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
}

impl TransportError {
    /// Build a [`TransportError::Request`] from any client failure.
    pub fn request(path: impl Into<String>, source: impl Error + Send + Sync + 'static) -> Self {
        TransportError::Request {
            path: path.into(),
            source: Box::new(source),
        }
    }

    /// Build a [`TransportError::Decode`] from any decode failure.
    pub fn decode(path: impl Into<String>, source: impl Error + Send + Sync + 'static) -> Self {
        TransportError::Decode {
            path: path.into(),
            source: Box::new(source),
        }
    }
}

/// Query parameters for a paginated item fetch.
///
/// `filter_params` carries one entry per filter property, its value being the
/// comma-joined list of that property's filter values.
#[derive(Debug, Clone, Default)]
pub struct ItemQuery {
    /// Locale the server should translate names into.
    pub locale: String,
    /// Per-property CSV filter parameters.
    pub filter_params: Vec<(String, String)>,
    /// Ordering token, e.g. `-tier_type`.
    pub ordering: String,
    /// 1-based page number; `None` asks for the first page.
    pub page: Option<u32>,
    /// Server-side page size override.
    pub page_size: Option<u32>,
    /// Free-text search term; omitted when empty.
    pub search: Option<String>,
}

impl ItemQuery {
    /// Flatten the query into URL parameter pairs, skipping empty parts.
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![("lang".to_owned(), self.locale.clone())];
        if let Some(page) = self.page {
            pairs.push(("page".to_owned(), page.to_string()));
        }
        pairs.extend(self.filter_params.iter().cloned());
        if !self.ordering.is_empty() {
            pairs.push(("ordering".to_owned(), self.ordering.clone()));
        }
        if let Some(page_size) = self.page_size {
            pairs.push(("page_size".to_owned(), page_size.to_string()));
        }
        if let Some(search) = self.search.as_deref().filter(|term| !term.is_empty()) {
            pairs.push(("search".to_owned(), search.to_owned()));
        }
        pairs
    }
}

/// Fetch contract consumed by [`CatalogCache`](super::cache::CatalogCache).
pub trait CatalogTransport: Send + Sync {
    /// Fetch one page of items matching `query`.
    fn fetch_items(&self, query: ItemQuery) -> BoxFuture<'static, TransportResult<Page<ItemRecord>>>;

    /// Follow a `next` URL returned by a previous page.
    fn fetch_items_at(&self, url: String) -> BoxFuture<'static, TransportResult<Page<ItemRecord>>>;

    /// Fetch a single item by id.
    fn fetch_item(&self, id: u64, locale: String) -> BoxFuture<'static, TransportResult<ItemRecord>>;

    /// Fetch one page of a reference collection.
    fn fetch_references(
        &self,
        kind: ReferenceKind,
        locale: String,
    ) -> BoxFuture<'static, TransportResult<Page<ReferenceRecord>>>;

    /// Follow a `next` URL of a reference collection page.
    fn fetch_references_at(
        &self,
        url: String,
    ) -> BoxFuture<'static, TransportResult<Page<ReferenceRecord>>>;
}
