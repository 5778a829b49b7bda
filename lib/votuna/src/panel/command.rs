use shared::collection::{CollectionRef, FacetSuggestions, SourceItemsPage};
use shared::transfer::{Direction, ExecutionResult, PreviewResult, SelectionMode};

use crate::browser::PageQuery;
use crate::counterparty::DiscoveryMode;
use crate::error::TransferError;
use crate::execution::ExecutionTicket;
use crate::request::ExportTarget;
use crate::review::PreviewTicket;
use crate::traits::{Discovery, DiscoveryScope};

/// Commands sent to a transfer panel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelCommand {
    SetDirection(Direction),
    SetExportTarget(ExportTarget),
    SetDestinationTitle(String),
    SetDestinationDescription(String),
    SetDestinationPublic(bool),
    SetSelectionMode(SelectionMode),
    AddGenre(String),
    RemoveGenre(String),
    ToggleGenre(String),
    AddArtist(String),
    RemoveArtist(String),
    ToggleArtist(String),
    /// Option key from the counterparty list. A blank key clears the selection.
    SelectCounterparty(String),
    SetDiscoveryMode(DiscoveryMode),
    /// Provider-side search; switches the resolver to search mode.
    SearchCounterparties(String),
    RefreshOwned,
    SetSourceSearch(String),
    SetSourceOffset(u32),
    NextPage,
    PrevPage,
    ToggleItem(String),
    /// Select every item on the visible page, or clear them when all are selected.
    ToggleVisibleItems,
    RetryPreview,
    Execute,
    /// Import everything from an existing collection.
    ApplyMergePreset,
    Shutdown,
}

/// Completions of remote calls, delivered back to the panel task.
#[derive(Debug)]
pub(crate) enum PanelEvent {
    Discovery {
        scope: DiscoveryScope,
        generation: u64,
        result: Result<Discovery, TransferError>,
    },
    Facets {
        source: CollectionRef,
        result: Result<FacetSuggestions, TransferError>,
    },
    Page {
        query: PageQuery,
        result: Result<SourceItemsPage, TransferError>,
    },
    Preview {
        ticket: PreviewTicket,
        result: Result<PreviewResult, TransferError>,
    },
    Executed {
        ticket: ExecutionTicket,
        result: Result<ExecutionResult, TransferError>,
    },
}
