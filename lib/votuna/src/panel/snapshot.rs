use serde::Serialize;
use shared::collection::{CollectionRef, CounterpartyCandidate, CurrentCollection, ItemSummary};
use shared::transfer::TransferRequest;
use uuid::Uuid;

use crate::browser::SourceItemBrowser;
use crate::counterparty::{CounterpartyResolver, DiscoveryMode, DiscoveryStatus};
use crate::execution::ExecutionState;
use crate::facets::FacetSuggestionState;
use crate::request::TransferDraft;
use crate::review::ReviewState;

/// Everything a front end needs to render one transfer panel.
#[derive(Debug, Clone, Serialize)]
pub struct PanelSnapshot {
    pub panel_id: Uuid,
    pub current: CurrentCollection,
    pub draft: TransferDraft,
    pub counterparty: CounterpartySnapshot,
    pub genres: Vec<String>,
    pub artists: Vec<String>,
    pub facets: FacetSuggestionState,
    pub source_items: SourceItemsSnapshot,
    /// The request built from the current input, when it is complete.
    pub request: Option<TransferRequest>,
    pub review: ReviewState,
    pub execution: ExecutionState,
}

#[derive(Debug, Clone, Serialize)]
pub struct CounterpartySnapshot {
    pub mode: DiscoveryMode,
    pub search_text: String,
    pub options: Vec<CounterpartyCandidate>,
    pub selected_key: Option<String>,
    pub selected: Option<CollectionRef>,
    pub owned_status: DiscoveryStatus,
    pub search_status: DiscoveryStatus,
}

impl From<&CounterpartyResolver> for CounterpartySnapshot {
    fn from(resolver: &CounterpartyResolver) -> Self {
        Self {
            mode: resolver.mode(),
            search_text: resolver.search_text().to_string(),
            options: resolver.options().to_vec(),
            selected_key: resolver.selected_key().map(str::to_string),
            selected: resolver.selected_ref().cloned(),
            owned_status: resolver.owned_status().clone(),
            search_status: resolver.search_status().clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceItemsSnapshot {
    pub source: Option<CollectionRef>,
    pub search: String,
    pub items: Vec<ItemSummary>,
    pub total_count: u32,
    pub limit: u32,
    pub offset: u32,
    pub page_range: (u32, u32),
    pub can_page_back: bool,
    pub can_page_forward: bool,
    pub selected_ids: Vec<String>,
    pub loading: bool,
    pub error: Option<String>,
}

impl From<&SourceItemBrowser> for SourceItemsSnapshot {
    fn from(browser: &SourceItemBrowser) -> Self {
        Self {
            source: browser.source().cloned(),
            search: browser.search().to_string(),
            items: browser.items().to_vec(),
            total_count: browser.total_count(),
            limit: browser.limit(),
            offset: browser.offset(),
            page_range: browser.page_range(),
            can_page_back: browser.can_page_back(),
            can_page_forward: browser.can_page_forward(),
            selected_ids: browser.selected_ids().to_vec(),
            loading: browser.is_loading(),
            error: browser.error().map(str::to_string),
        }
    }
}
