//! Reqwest-backed implementation of [`CatalogTransport`].

use std::sync::Arc;

use futures::future::BoxFuture;
use reqwest::Client;
use serde::de::DeserializeOwned;

use super::records::{ItemRecord, Page, ReferenceKind, ReferenceRecord};
use super::transport::{CatalogTransport, ItemQuery, TransportError, TransportResult};

/// HTTP client for the catalog REST API.
///
/// Paths are resolved against a base URL such as
/// `https://example.net/api/v1`. The client itself is cheap to clone; all
/// state lives behind [`Arc`]s.
#[derive(Clone)]
pub struct HttpCatalogTransport {
    client: Client,
    base_url: Arc<str>,
}

impl HttpCatalogTransport {
    /// Build a transport for the API rooted at `base_url`.
    pub fn new(base_url: &str) -> TransportResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(|source| TransportError::request(base_url, source))?;

        Ok(Self {
            client,
            base_url: Arc::from(base_url.trim_end_matches('/')),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn get_json<T>(client: Client, url: String, pairs: Vec<(String, String)>) -> TransportResult<T>
    where
        T: DeserializeOwned,
    {
        let response = client
            .get(&url)
            .query(&pairs)
            .send()
            .await
            .map_err(|source| TransportError::request(url.clone(), source))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                path: url,
                status: status.as_u16(),
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|source| TransportError::decode(url, source))
    }
}

impl CatalogTransport for HttpCatalogTransport {
    fn fetch_items(&self, query: ItemQuery) -> BoxFuture<'static, TransportResult<Page<ItemRecord>>> {
        let client = self.client.clone();
        let url = self.endpoint("items/");
        Box::pin(async move { Self::get_json(client, url, query.to_pairs()).await })
    }

    fn fetch_items_at(&self, url: String) -> BoxFuture<'static, TransportResult<Page<ItemRecord>>> {
        let client = self.client.clone();
        Box::pin(async move { Self::get_json(client, url, Vec::new()).await })
    }

    fn fetch_item(&self, id: u64, locale: String) -> BoxFuture<'static, TransportResult<ItemRecord>> {
        let client = self.client.clone();
        let url = self.endpoint(&format!("items/{id}/"));
        Box::pin(async move {
            Self::get_json(client, url, vec![("lang".to_owned(), locale)]).await
        })
    }

    fn fetch_references(
        &self,
        kind: ReferenceKind,
        locale: String,
    ) -> BoxFuture<'static, TransportResult<Page<ReferenceRecord>>> {
        let client = self.client.clone();
        let url = self.endpoint(kind.path());
        Box::pin(async move {
            Self::get_json(client, url, vec![("lang".to_owned(), locale)]).await
        })
    }

    fn fetch_references_at(
        &self,
        url: String,
    ) -> BoxFuture<'static, TransportResult<Page<ReferenceRecord>>> {
        let client = self.client.clone();
        Box::pin(async move { Self::get_json(client, url, Vec::new()).await })
    }
}
