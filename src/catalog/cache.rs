//! Memoizing front of the catalog transport.
//!
//! Full-collection fetches are assembled by following the server's `next`
//! links and cached per `(locale, filters, ordering)` key. Entries are
//! read-only after insertion and shared across sessions and browsing views;
//! eviction happens only through [`CatalogCache::reset`].

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tracing::{debug, error, warn};

use crate::cancel::Cancellation;
use crate::error::{CatalogError, CatalogResult};

use super::filter::Ordering;
use super::records::{Item, Page, ReferenceKind, ReferenceRecord};
use super::transport::{CatalogTransport, ItemQuery, TransportResult};

/// One page of items together with the query's total match count.
#[derive(Debug, Clone)]
pub struct ItemPage {
    /// Items carried by the requested page, in server order.
    pub items: Vec<Item>,
    /// Total number of items matching the query across all pages.
    pub total_count: u64,
}

/// Caching catalog reader shared by browsing views and game sessions.
pub struct CatalogCache {
    transport: Arc<dyn CatalogTransport>,
    items: DashMap<String, Arc<Vec<Item>>>,
    references: DashMap<String, Arc<Vec<ReferenceRecord>>>,
    fetch_timeout: Duration,
}

impl CatalogCache {
    /// Wrap a transport with empty caches.
    pub fn new(transport: Arc<dyn CatalogTransport>, fetch_timeout: Duration) -> Self {
        Self {
            transport,
            items: DashMap::new(),
            references: DashMap::new(),
            fetch_timeout,
        }
    }

    /// Fetch every item matching `filter_params` under `ordering`, following
    /// pagination until exhausted. The assembled array is cached; repeat
    /// calls with the same key return it without touching the transport.
    pub async fn get_all_items(
        &self,
        locale: &str,
        filter_params: &[(String, String)],
        ordering: Ordering,
        cancel: &Cancellation,
    ) -> CatalogResult<Arc<Vec<Item>>> {
        let key = item_cache_key(locale, filter_params, ordering);
        if let Some(entry) = self.items.get(&key) {
            debug!(key, "item cache hit");
            return Ok(entry.clone());
        }

        let query = ItemQuery {
            locale: locale.to_owned(),
            filter_params: filter_params.to_vec(),
            ordering: ordering.query_token(),
            ..ItemQuery::default()
        };

        let mut page = self.bounded(cancel, self.transport.fetch_items(query)).await?;
        let mut records = page.results;
        while let Some(next) = page.next.take() {
            page = self
                .bounded(cancel, self.transport.fetch_items_at(next))
                .await?;
            records.extend(page.results);
        }

        let assembled: Arc<Vec<Item>> =
            Arc::new(records.into_iter().map(Into::into).collect());
        self.items.insert(key, assembled.clone());
        Ok(assembled)
    }

    /// Like [`get_all_items`](Self::get_all_items) but degrades to an empty
    /// array on failure, logging the cause.
    pub async fn get_all_items_or_empty(
        &self,
        locale: &str,
        filter_params: &[(String, String)],
        ordering: Ordering,
        cancel: &Cancellation,
    ) -> Arc<Vec<Item>> {
        match self
            .get_all_items(locale, filter_params, ordering, cancel)
            .await
        {
            Ok(items) => items,
            Err(err) => {
                error!(error = %err, locale, "item fetch failed; degrading to empty set");
                Arc::new(Vec::new())
            }
        }
    }

    /// Fetch a single page of items. Never cached: the page/result set is
    /// tied to live filter state and considered volatile.
    pub async fn get_page(
        &self,
        locale: &str,
        filter_params: &[(String, String)],
        ordering: Ordering,
        page: u32,
        page_size: u32,
        search: &str,
        cancel: &Cancellation,
    ) -> CatalogResult<ItemPage> {
        let query = ItemQuery {
            locale: locale.to_owned(),
            filter_params: filter_params.to_vec(),
            ordering: ordering.query_token(),
            page: Some(page),
            page_size: Some(page_size),
            search: Some(search.to_owned()),
        };

        let page = self.bounded(cancel, self.transport.fetch_items(query)).await?;
        Ok(ItemPage {
            total_count: page.count,
            items: page.results.into_iter().map(Into::into).collect(),
        })
    }

    /// Look up a single item by id.
    ///
    /// Cached collections are scanned first; a cached entry only counts when
    /// its screenshot is populated, the marker of a full single-item record.
    /// On a miss the entity is fetched and inserted into the locale's item
    /// collection, replacing any stale entry with the same id.
    pub async fn get_single_item(
        &self,
        id: u64,
        locale: &str,
        cancel: &Cancellation,
    ) -> CatalogResult<Item> {
        for entry in self.items.iter() {
            if let Some(item) = entry
                .value()
                .iter()
                .find(|item| item.id == id && item.screenshot_url.is_some())
            {
                return Ok(item.clone());
            }
        }

        let record = self
            .bounded(cancel, self.transport.fetch_item(id, locale.to_owned()))
            .await?;
        let item: Item = record.into();

        let key = single_item_cache_key(locale);
        let mut collection: Vec<Item> = self
            .items
            .get(&key)
            .map(|entry| entry.value().as_ref().clone())
            .unwrap_or_default();
        collection.retain(|existing| existing.id != id);
        collection.push(item.clone());
        self.items.insert(key, Arc::new(collection));

        Ok(item)
    }

    /// Fetch a full reference collection (tiers, categories, …), cached per
    /// kind and locale.
    pub async fn get_references(
        &self,
        kind: ReferenceKind,
        locale: &str,
        cancel: &Cancellation,
    ) -> CatalogResult<Arc<Vec<ReferenceRecord>>> {
        let key = format!("{}_{locale}", kind.label());
        if let Some(entry) = self.references.get(&key) {
            return Ok(entry.clone());
        }

        let mut page = self
            .bounded(cancel, self.transport.fetch_references(kind, locale.to_owned()))
            .await?;
        let mut records = page.results;
        while let Some(next) = page.next.take() {
            page = self
                .bounded(cancel, self.transport.fetch_references_at(next))
                .await?;
            records.extend(page.results);
        }

        let assembled = Arc::new(records);
        self.references.insert(key, assembled.clone());
        Ok(assembled)
    }

    /// Drop every cached entry (locale change or explicit refresh).
    pub fn reset(&self) {
        self.items.clear();
        self.references.clear();
    }

    /// Run a transport future under the configured timeout and the caller's
    /// cancellation token. Undelivered results after cancellation are
    /// dropped, never applied.
    async fn bounded<T>(
        &self,
        cancel: &Cancellation,
        fetch: impl Future<Output = TransportResult<T>>,
    ) -> CatalogResult<T> {
        if cancel.is_cancelled() {
            return Err(CatalogError::Cancelled);
        }

        tokio::select! {
            _ = cancel.cancelled() => Err(CatalogError::Cancelled),
            outcome = tokio::time::timeout(self.fetch_timeout, fetch) => match outcome {
                Ok(Ok(value)) => Ok(value),
                Ok(Err(err)) => {
                    warn!(error = %err, "catalog transport failure");
                    Err(err.into())
                }
                Err(_) => {
                    warn!(timeout = ?self.fetch_timeout, "catalog fetch timed out");
                    Err(CatalogError::Timeout)
                }
            },
        }
    }
}

/// Cache key for an assembled full-collection fetch.
fn item_cache_key(locale: &str, filter_params: &[(String, String)], ordering: Ordering) -> String {
    let mut key = format!("items_{locale}_{}", ordering.query_token());
    for (property, csv) in filter_params {
        key.push('_');
        key.push_str(property);
        key.push('=');
        key.push_str(csv);
    }
    key
}

/// Cache key of the per-locale collection that single-item fetches land in.
fn single_item_cache_key(locale: &str) -> String {
    format!("items_{locale}")
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

    use futures::future::BoxFuture;

    use super::*;
    use crate::catalog::records::ItemRecord;
    use crate::catalog::transport::TransportError;

    /// In-memory transport serving two fixed pages of items and counting
    /// calls.
    struct FakeTransport {
        calls: AtomicUsize,
        fail: bool,
        hang: bool,
    }

    impl FakeTransport {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail: false,
                hang: false,
            }
        }

        fn record(id: u64, name: &str, screenshot: Option<&str>) -> ItemRecord {
            serde_json::from_value(serde_json::json!({
                "id": id,
                "item_type": 1,
                "localized_name": name,
                "tier_type": 2,
                "category": 9,
                "screenshot_url": screenshot,
            }))
            .unwrap()
        }
    }

    impl CatalogTransport for FakeTransport {
        fn fetch_items(
            &self,
            _query: ItemQuery,
        ) -> BoxFuture<'static, TransportResult<Page<ItemRecord>>> {
            self.calls.fetch_add(1, AtomicOrdering::SeqCst);
            let fail = self.fail;
            let hang = self.hang;
            Box::pin(async move {
                if hang {
                    futures::future::pending::<()>().await;
                }
                if fail {
                    return Err(TransportError::Status {
                        path: "items/".into(),
                        status: 500,
                    });
                }
                Ok(Page {
                    count: 3,
                    results: vec![
                        FakeTransport::record(1, "Ace of Spades", None),
                        FakeTransport::record(2, "Thorn", None),
                    ],
                    next: Some("https://example.net/api/v1/items/?page=2".into()),
                })
            })
        }

        fn fetch_items_at(
            &self,
            _url: String,
        ) -> BoxFuture<'static, TransportResult<Page<ItemRecord>>> {
            self.calls.fetch_add(1, AtomicOrdering::SeqCst);
            Box::pin(async move {
                Ok(Page {
                    count: 3,
                    results: vec![FakeTransport::record(3, "Hawkmoon", None)],
                    next: None,
                })
            })
        }

        fn fetch_item(
            &self,
            id: u64,
            _locale: String,
        ) -> BoxFuture<'static, TransportResult<ItemRecord>> {
            self.calls.fetch_add(1, AtomicOrdering::SeqCst);
            Box::pin(async move { Ok(FakeTransport::record(id, "Hawkmoon", Some("shot.jpg"))) })
        }

        fn fetch_references(
            &self,
            _kind: ReferenceKind,
            _locale: String,
        ) -> BoxFuture<'static, TransportResult<Page<ReferenceRecord>>> {
            self.calls.fetch_add(1, AtomicOrdering::SeqCst);
            Box::pin(async move {
                Ok(Page {
                    count: 1,
                    results: vec![ReferenceRecord {
                        id: 2,
                        id_upstream: "6".into(),
                        name: "Exotic".into(),
                        localized_name: "Exotique".into(),
                        icon_url: None,
                        localized_desc: None,
                    }],
                    next: None,
                })
            })
        }

        fn fetch_references_at(
            &self,
            _url: String,
        ) -> BoxFuture<'static, TransportResult<Page<ReferenceRecord>>> {
            Box::pin(async move {
                Ok(Page {
                    count: 0,
                    results: Vec::new(),
                    next: None,
                })
            })
        }
    }

    fn cache_with(transport: FakeTransport) -> (Arc<FakeTransport>, CatalogCache) {
        let transport = Arc::new(transport);
        let cache = CatalogCache::new(transport.clone(), Duration::from_secs(65));
        (transport, cache)
    }

    #[tokio::test]
    async fn get_all_follows_next_and_caches_the_assembly() {
        let (transport, cache) = cache_with(FakeTransport::new());
        let cancel = Cancellation::new();

        let items = cache
            .get_all_items("en", &[], Ordering::default(), &cancel)
            .await
            .unwrap();
        assert_eq!(
            items.iter().map(|item| item.id).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert_eq!(transport.calls.load(AtomicOrdering::SeqCst), 2);

        // Second call is served from the cache.
        cache
            .get_all_items("en", &[], Ordering::default(), &cancel)
            .await
            .unwrap();
        assert_eq!(transport.calls.load(AtomicOrdering::SeqCst), 2);

        // A different key fetches again.
        cache
            .get_all_items("fr", &[], Ordering::default(), &cancel)
            .await
            .unwrap();
        assert_eq!(transport.calls.load(AtomicOrdering::SeqCst), 4);
    }

    #[tokio::test]
    async fn single_item_miss_fetches_and_replaces_stale_entry() {
        let (transport, cache) = cache_with(FakeTransport::new());
        let cancel = Cancellation::new();

        // Populate the cache with a thin (no screenshot) record for id 3.
        cache
            .get_all_items("en", &[], Ordering::default(), &cancel)
            .await
            .unwrap();
        let before = transport.calls.load(AtomicOrdering::SeqCst);

        let item = cache.get_single_item(3, "en", &cancel).await.unwrap();
        assert_eq!(item.screenshot_url.as_deref(), Some("shot.jpg"));
        assert_eq!(transport.calls.load(AtomicOrdering::SeqCst), before + 1);

        // Now the full record is cached; no further fetch, no duplicate id.
        let again = cache.get_single_item(3, "en", &cancel).await.unwrap();
        assert_eq!(again.id, 3);
        assert_eq!(transport.calls.load(AtomicOrdering::SeqCst), before + 1);
    }

    #[tokio::test]
    async fn transport_failure_degrades_to_empty() {
        let mut transport = FakeTransport::new();
        transport.fail = true;
        let (_, cache) = cache_with(transport);
        let cancel = Cancellation::new();

        let items = cache
            .get_all_items_or_empty("en", &[], Ordering::default(), &cancel)
            .await;
        assert!(items.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn hung_fetch_times_out() {
        let mut transport = FakeTransport::new();
        transport.hang = true;
        let (_, cache) = cache_with(transport);
        let cancel = Cancellation::new();

        let err = cache
            .get_all_items("en", &[], Ordering::default(), &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Timeout));
    }

    #[tokio::test]
    async fn cancelled_fetch_is_dropped() {
        let (_, cache) = cache_with(FakeTransport::new());
        let cancel = Cancellation::new();
        cancel.cancel();

        let err = cache
            .get_all_items("en", &[], Ordering::default(), &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Cancelled));
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_aborts_an_in_flight_fetch() {
        let mut transport = FakeTransport::new();
        transport.hang = true;
        let (_, cache) = cache_with(transport);
        let cancel = Cancellation::new();

        // Fire the token while the fetch hangs, well before the timeout.
        let token = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            token.cancel();
        });

        let err = cache
            .get_all_items("en", &[], Ordering::default(), &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Cancelled));
    }

    #[tokio::test]
    async fn references_are_cached_per_kind_and_locale() {
        let (transport, cache) = cache_with(FakeTransport::new());
        let cancel = Cancellation::new();

        let tiers = cache
            .get_references(ReferenceKind::Tiers, "fr", &cancel)
            .await
            .unwrap();
        assert_eq!(tiers[0].localized_name, "Exotique");
        let calls = transport.calls.load(AtomicOrdering::SeqCst);

        cache
            .get_references(ReferenceKind::Tiers, "fr", &cancel)
            .await
            .unwrap();
        assert_eq!(transport.calls.load(AtomicOrdering::SeqCst), calls);

        cache.reset();
        cache
            .get_references(ReferenceKind::Tiers, "fr", &cancel)
            .await
            .unwrap();
        assert_eq!(transport.calls.load(AtomicOrdering::SeqCst), calls + 1);
    }
}
