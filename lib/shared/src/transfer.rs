use std::fmt;

use serde::{Deserialize, Serialize};

use crate::collection::{CollectionRef, ItemSummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    ImportToCurrent,
    ExportFromCurrent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SelectionMode {
    #[serde(rename = "all")]
    All,
    #[serde(rename = "genre")]
    ByGenre,
    #[serde(rename = "artist")]
    ByArtist,
    #[serde(rename = "songs")]
    ByExplicitItems,
}

impl SelectionMode {
    pub fn is_facet(self) -> bool {
        matches!(self, SelectionMode::ByGenre | SelectionMode::ByArtist)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestinationCreate {
    pub title: String,
    pub description: Option<String>,
    pub is_public: bool,
}

/// Why a transfer request cannot be built yet. Not an error: the panel is waiting for input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Incomplete {
    NoCounterparty,
    NoDestinationTitle,
    ConflictingDestination,
    NoSelectionValues(SelectionMode),
}

impl fmt::Display for Incomplete {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Incomplete::NoCounterparty => write!(f, "Choose the other playlist to continue."),
            Incomplete::NoDestinationTitle => write!(f, "Name the new playlist to continue."),
            Incomplete::ConflictingDestination => {
                write!(f, "Pick an existing playlist or create a new one, not both.")
            }
            Incomplete::NoSelectionValues(SelectionMode::ByGenre) => {
                write!(f, "Add at least one genre.")
            }
            Incomplete::NoSelectionValues(SelectionMode::ByArtist) => {
                write!(f, "Add at least one artist.")
            }
            Incomplete::NoSelectionValues(_) => write!(f, "Pick at least one song."),
        }
    }
}

impl std::error::Error for Incomplete {}

/// A complete, valid description of one copy operation.
///
/// Immutable once built; the only way to get one is [`TransferRequest::new`] (or deserializing,
/// which runs the same checks).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawTransferRequest")]
pub struct TransferRequest {
    direction: Direction,
    counterparty: Option<CollectionRef>,
    destination_create: Option<DestinationCreate>,
    selection_mode: SelectionMode,
    selection_values: Vec<String>,
}

#[derive(Deserialize)]
struct RawTransferRequest {
    direction: Direction,
    counterparty: Option<CollectionRef>,
    #[serde(default)]
    destination_create: Option<DestinationCreate>,
    selection_mode: SelectionMode,
    #[serde(default)]
    selection_values: Vec<String>,
}

impl TryFrom<RawTransferRequest> for TransferRequest {
    type Error = Incomplete;

    fn try_from(raw: RawTransferRequest) -> Result<Self, Self::Error> {
        TransferRequest::new(
            raw.direction,
            raw.counterparty,
            raw.destination_create,
            raw.selection_mode,
            raw.selection_values,
        )
    }
}

impl TransferRequest {
    /// Validates the field combination.
    ///
    /// Imports need a counterparty. Exports need exactly one of a counterparty or a destination
    /// to create (with a non-blank title). Every mode other than `All` needs at least one value;
    /// `All` carries none.
    pub fn new(
        direction: Direction,
        counterparty: Option<CollectionRef>,
        destination_create: Option<DestinationCreate>,
        selection_mode: SelectionMode,
        selection_values: Vec<String>,
    ) -> Result<Self, Incomplete> {
        match direction {
            Direction::ImportToCurrent => {
                if counterparty.is_none() {
                    return Err(Incomplete::NoCounterparty);
                }
                if destination_create.is_some() {
                    return Err(Incomplete::ConflictingDestination);
                }
            }
            Direction::ExportFromCurrent => match (&counterparty, &destination_create) {
                (Some(_), Some(_)) => return Err(Incomplete::ConflictingDestination),
                (None, None) => return Err(Incomplete::NoCounterparty),
                (None, Some(create)) if create.title.trim().is_empty() => {
                    return Err(Incomplete::NoDestinationTitle)
                }
                _ => {}
            },
        }

        let selection_values = match selection_mode {
            SelectionMode::All => Vec::new(),
            mode => {
                if selection_values.iter().all(|v| v.trim().is_empty()) {
                    return Err(Incomplete::NoSelectionValues(mode));
                }
                selection_values
            }
        };

        Ok(Self {
            direction,
            counterparty,
            destination_create,
            selection_mode,
            selection_values,
        })
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn counterparty(&self) -> Option<&CollectionRef> {
        self.counterparty.as_ref()
    }

    pub fn destination_create(&self) -> Option<&DestinationCreate> {
        self.destination_create.as_ref()
    }

    pub fn selection_mode(&self) -> SelectionMode {
        self.selection_mode
    }

    pub fn selection_values(&self) -> &[String] {
        &self.selection_values
    }

    /// Resolves (source, destination) against the collection the panel is opened on.
    /// The destination is `None` when it is yet to be created.
    pub fn endpoints(&self, current: &CollectionRef) -> (CollectionRef, Option<CollectionRef>) {
        match self.direction {
            Direction::ImportToCurrent => (
                self.counterparty.clone().unwrap_or_else(|| current.clone()),
                Some(current.clone()),
            ),
            Direction::ExportFromCurrent => (current.clone(), self.counterparty.clone()),
        }
    }
}

/// Server-computed effect of a transfer, without side effects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewResult {
    pub matched_count: u32,
    pub to_add_count: u32,
    pub duplicate_count: u32,
    #[serde(default)]
    pub matched_sample: Vec<ItemSummary>,
    #[serde(default)]
    pub duplicate_sample: Vec<ItemSummary>,
    #[serde(rename = "max_tracks_per_action")]
    pub max_items_per_action: u32,
}

impl PreviewResult {
    pub fn exceeds_limit(&self) -> bool {
        self.matched_count > self.max_items_per_action
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedItem {
    #[serde(rename = "provider_track_id")]
    pub item_id: String,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub matched_count: u32,
    pub added_count: u32,
    pub skipped_duplicate_count: u32,
    pub failed_count: u32,
    #[serde(default)]
    pub failed_items: Vec<FailedItem>,
}

impl ExecutionResult {
    pub fn is_partial(&self) -> bool {
        self.failed_count > 0
    }
}
