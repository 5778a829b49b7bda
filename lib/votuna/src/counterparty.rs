use serde::Serialize;
use shared::collection::{
    CollectionRef, CounterpartyCandidate, CurrentCollection, ManagedCollection, ProviderCollection,
};
use tracing::{debug, warn};

use crate::error::TransferError;
use crate::traits::{Discovery, DiscoveryScope};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscoveryMode {
    #[default]
    Owned,
    Search,
}

/// Loading state of one discovery set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiscoveryStatus {
    pub loading: bool,
    pub error: Option<String>,
}

/// Finds the collections a transfer can pair with the current one and resolves the
/// selected option key to a [`CollectionRef`].
///
/// The selection is re-checked every time a discovery set changes; a key that no longer
/// appears in either set is dropped instead of left dangling.
#[derive(Debug, Clone)]
pub struct CounterpartyResolver {
    current: CurrentCollection,
    viewer_id: i64,
    mode: DiscoveryMode,
    owned: Vec<CounterpartyCandidate>,
    search_results: Vec<CounterpartyCandidate>,
    selected_key: Option<String>,
    owned_generation: u64,
    search_generation: u64,
    owned_status: DiscoveryStatus,
    search_status: DiscoveryStatus,
    search_text: String,
}

impl CounterpartyResolver {
    pub fn new(current: CurrentCollection, viewer_id: i64) -> Self {
        Self {
            current,
            viewer_id,
            mode: DiscoveryMode::Owned,
            owned: Vec::new(),
            search_results: Vec::new(),
            selected_key: None,
            owned_generation: 0,
            search_generation: 0,
            owned_status: DiscoveryStatus::default(),
            search_status: DiscoveryStatus::default(),
            search_text: String::new(),
        }
    }

    pub fn current(&self) -> &CurrentCollection {
        &self.current
    }

    pub fn mode(&self) -> DiscoveryMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: DiscoveryMode) {
        self.mode = mode;
    }

    pub fn search_text(&self) -> &str {
        &self.search_text
    }

    pub fn set_search_text(&mut self, text: &str) {
        self.search_text = text.to_string();
    }

    /// Options for the active discovery mode.
    pub fn options(&self) -> &[CounterpartyCandidate] {
        match self.mode {
            DiscoveryMode::Owned => &self.owned,
            DiscoveryMode::Search => &self.search_results,
        }
    }

    pub fn owned_status(&self) -> &DiscoveryStatus {
        &self.owned_status
    }

    pub fn search_status(&self) -> &DiscoveryStatus {
        &self.search_status
    }

    fn all_candidates(&self) -> impl Iterator<Item = &CounterpartyCandidate> {
        self.owned.iter().chain(self.search_results.iter())
    }

    pub fn selected_key(&self) -> Option<&str> {
        self.selected_key.as_deref()
    }

    pub fn selected(&self) -> Option<&CounterpartyCandidate> {
        let key = self.selected_key.as_deref()?;
        self.all_candidates().find(|c| c.key() == key)
    }

    pub fn selected_ref(&self) -> Option<&CollectionRef> {
        self.selected().map(|c| &c.collection)
    }

    /// Selects an option by key. Unknown or blank keys clear the selection.
    /// Returns true when the selection changed.
    pub fn select(&mut self, key: &str) -> bool {
        let next = if key.trim().is_empty() {
            None
        } else if self.all_candidates().any(|c| c.key() == key) {
            Some(key.to_string())
        } else {
            debug!("Ignoring unknown counterparty key {}", key);
            None
        };
        let changed = next != self.selected_key;
        self.selected_key = next;
        changed
    }

    pub fn clear_selection(&mut self) -> bool {
        self.selected_key.take().is_some()
    }

    /// Starts an owned-collections refresh; the returned generation must accompany the result.
    pub fn begin_owned(&mut self) -> (u64, DiscoveryScope) {
        self.owned_generation += 1;
        self.owned_status = DiscoveryStatus {
            loading: true,
            error: None,
        };
        (self.owned_generation, DiscoveryScope::Owned)
    }

    /// Starts a provider search. Blank text is rejected without a call.
    pub fn begin_search(&mut self) -> Option<(u64, DiscoveryScope)> {
        let text = self.search_text.trim();
        if text.is_empty() {
            return None;
        }
        let scope = DiscoveryScope::Search(text.to_string());
        self.search_generation += 1;
        self.search_status = DiscoveryStatus {
            loading: true,
            error: None,
        };
        Some((self.search_generation, scope))
    }

    /// Applies a discovery response. Returns true when the resolved counterparty changed.
    pub fn apply(
        &mut self,
        scope: &DiscoveryScope,
        generation: u64,
        result: Result<Discovery, TransferError>,
    ) -> bool {
        let before = self.selected_ref().cloned();
        match scope {
            DiscoveryScope::Owned => {
                if generation != self.owned_generation {
                    debug!("Dropping stale owned discovery (generation {})", generation);
                    return false;
                }
                self.owned_status.loading = false;
                match result {
                    Ok(discovery) => self.owned = self.filter(discovery),
                    Err(e) => {
                        warn!("Failed to load owned playlists: {}", e);
                        self.owned_status.error = Some(e.to_string());
                    }
                }
            }
            DiscoveryScope::Search(_) => {
                if generation != self.search_generation {
                    debug!("Dropping stale search results (generation {})", generation);
                    return false;
                }
                self.search_status.loading = false;
                match result {
                    Ok(discovery) => self.search_results = self.filter(discovery),
                    Err(e) => {
                        warn!("Playlist search failed: {}", e);
                        self.search_status.error = Some(e.to_string());
                    }
                }
            }
        }
        self.revalidate();
        before.as_ref() != self.selected_ref()
    }

    /// Replaces the owned set directly. Any in-flight owned refresh becomes stale.
    pub fn set_owned(
        &mut self,
        provider: Vec<ProviderCollection>,
        managed: Vec<ManagedCollection>,
    ) -> bool {
        let before = self.selected_ref().cloned();
        self.owned_generation += 1;
        self.owned_status = DiscoveryStatus::default();
        self.owned = self.filter(Discovery { provider, managed });
        self.revalidate();
        before.as_ref() != self.selected_ref()
    }

    /// Replaces the search results directly. Any in-flight search becomes stale.
    pub fn set_search_results(&mut self, provider: Vec<ProviderCollection>) -> bool {
        let before = self.selected_ref().cloned();
        self.search_generation += 1;
        self.search_status = DiscoveryStatus::default();
        self.search_results = self.filter(Discovery {
            provider,
            managed: Vec::new(),
        });
        self.revalidate();
        before.as_ref() != self.selected_ref()
    }

    fn revalidate(&mut self) {
        let Some(key) = self.selected_key.as_deref() else {
            return;
        };
        if !self.all_candidates().any(|c| c.key() == key) {
            debug!("Selected counterparty {} disappeared, clearing", key);
            self.selected_key = None;
        }
    }

    /// Keeps collections on the same provider as the current one, minus the current one itself.
    /// Managed collections must also be owned by the viewer.
    fn filter(&self, discovery: Discovery) -> Vec<CounterpartyCandidate> {
        let current = &self.current;
        let provider = discovery
            .provider
            .into_iter()
            .filter(|c| {
                c.provider == current.provider && c.provider_item_id != current.provider_item_id
            })
            .map(CounterpartyCandidate::from);
        let managed = discovery
            .managed
            .into_iter()
            .filter(|c| {
                c.id != current.collection_id
                    && c.owner_user_id == self.viewer_id
                    && c.provider == current.provider
            })
            .map(CounterpartyCandidate::from);
        provider.chain(managed).collect()
    }
}
