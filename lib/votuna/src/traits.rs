use async_trait::async_trait;
use serde::Serialize;
use shared::{
    collection::{
        CollectionRef, FacetSuggestions, ManagedCollection, ProviderCollection, SourceItemsPage,
    },
    transfer::{ExecutionResult, PreviewResult, TransferRequest},
};

use crate::error::Result;

/// How counterparty candidates are discovered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryScope {
    /// Everything the viewer owns: provider collections plus managed collections.
    Owned,
    /// Provider-side search by free text (or a pasted collection link).
    Search(String),
}

/// Raw discovery listing, before filtering against the current collection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Discovery {
    pub provider: Vec<ProviderCollection>,
    pub managed: Vec<ManagedCollection>,
}

/// Remote operations the transfer engine depends on.
///
/// `current_id` is the managed collection the panel is opened on; the management API scopes
/// every call to it.
#[async_trait]
pub trait TransferBackend: Send + Sync {
    fn id(&self) -> &'static str;

    async fn list_provider_collections(&self, provider: &str) -> Result<Vec<ProviderCollection>>;

    async fn search_provider_collections(
        &self,
        provider: &str,
        query: &str,
        limit: u32,
    ) -> Result<Vec<ProviderCollection>>;

    async fn list_managed_collections(&self) -> Result<Vec<ManagedCollection>>;

    async fn suggest_facets(
        &self,
        current_id: i64,
        source: &CollectionRef,
    ) -> Result<FacetSuggestions>;

    async fn browse_source_items(
        &self,
        current_id: i64,
        source: &CollectionRef,
        search: Option<&str>,
        limit: u32,
        offset: u32,
    ) -> Result<SourceItemsPage>;

    async fn preview_transfer(
        &self,
        current_id: i64,
        request: &TransferRequest,
    ) -> Result<PreviewResult>;

    async fn execute_transfer(
        &self,
        current_id: i64,
        request: &TransferRequest,
    ) -> Result<ExecutionResult>;

    async fn discover_counterparties(
        &self,
        provider: &str,
        scope: &DiscoveryScope,
        search_limit: u32,
    ) -> Result<Discovery> {
        match scope {
            DiscoveryScope::Owned => {
                let (provider, managed) = tokio::try_join!(
                    self.list_provider_collections(provider),
                    self.list_managed_collections()
                )?;
                Ok(Discovery { provider, managed })
            }
            DiscoveryScope::Search(text) => {
                let provider = self
                    .search_provider_collections(provider, text, search_limit)
                    .await?;
                Ok(Discovery {
                    provider,
                    managed: Vec::new(),
                })
            }
        }
    }
}

/// Something other screens read from, keyed per collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CacheKey {
    CollectionItems { collection: CollectionRef },
    ProviderCollections { provider: String },
}

/// Receives invalidations after a transfer changed collection contents. Best effort.
#[async_trait]
pub trait CollectionCache: Send + Sync {
    fn id(&self) -> &'static str;

    async fn invalidate(&self, key: &CacheKey);
}
