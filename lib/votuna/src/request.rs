use itertools::Itertools;
use serde::Serialize;
use shared::collection::CollectionRef;
use shared::transfer::{
    DestinationCreate, Direction, Incomplete, SelectionMode, TransferRequest,
};

use crate::selection::{unique_trimmed_values, FacetSelection};

/// Where an export goes: an existing collection or a new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportTarget {
    #[default]
    Existing,
    Create,
}

/// The editable form behind a transfer request.
///
/// Holds raw user input; [`TransferDraft::build`] turns it into a validated request together
/// with the counterparty and selections owned by the other panel components.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferDraft {
    pub direction: Direction,
    pub export_target: ExportTarget,
    pub destination_title: String,
    pub destination_description: String,
    pub destination_is_public: bool,
    pub selection_mode: SelectionMode,
}

impl Default for TransferDraft {
    fn default() -> Self {
        Self {
            direction: Direction::ImportToCurrent,
            export_target: ExportTarget::Existing,
            destination_title: String::new(),
            destination_description: String::new(),
            destination_is_public: false,
            selection_mode: SelectionMode::All,
        }
    }
}

impl TransferDraft {
    pub fn is_creating_destination(&self) -> bool {
        self.direction == Direction::ExportFromCurrent && self.export_target == ExportTarget::Create
    }

    pub fn build(
        &self,
        counterparty: Option<&CollectionRef>,
        genres: &FacetSelection,
        artists: &FacetSelection,
        item_ids: &[String],
    ) -> Result<TransferRequest, Incomplete> {
        let selection_values = match self.selection_mode {
            SelectionMode::All => Vec::new(),
            SelectionMode::ByGenre => unique_trimmed_values(genres.values()),
            SelectionMode::ByArtist => unique_trimmed_values(artists.values()),
            SelectionMode::ByExplicitItems => item_ids
                .iter()
                .map(|id| id.trim())
                .filter(|id| !id.is_empty())
                .unique()
                .map(str::to_string)
                .collect(),
        };

        if self.is_creating_destination() {
            let description = self.destination_description.trim();
            let create = DestinationCreate {
                title: self.destination_title.trim().to_string(),
                description: (!description.is_empty()).then(|| description.to_string()),
                is_public: self.destination_is_public,
            };
            return TransferRequest::new(
                self.direction,
                None,
                Some(create),
                self.selection_mode,
                selection_values,
            );
        }

        TransferRequest::new(
            self.direction,
            counterparty.cloned(),
            None,
            self.selection_mode,
            selection_values,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spotify() -> CollectionRef {
        CollectionRef::provider("spotify", "p1")
    }

    #[test]
    fn test_default_draft_needs_counterparty() {
        let draft = TransferDraft::default();
        let err = draft
            .build(None, &FacetSelection::new(), &FacetSelection::new(), &[])
            .unwrap_err();
        assert_eq!(err, Incomplete::NoCounterparty);
    }

    #[test]
    fn test_genre_mode_uses_genre_values_only() {
        let draft = TransferDraft {
            selection_mode: SelectionMode::ByGenre,
            ..Default::default()
        };
        let genres = FacetSelection::from_values(["house"]);
        let artists = FacetSelection::from_values(["Burial"]);
        let request = draft
            .build(Some(&spotify()), &genres, &artists, &[])
            .unwrap();
        assert_eq!(request.selection_values(), ["house"]);
    }

    #[test]
    fn test_artist_mode_without_values_is_incomplete() {
        let draft = TransferDraft {
            selection_mode: SelectionMode::ByArtist,
            ..Default::default()
        };
        let genres = FacetSelection::from_values(["house"]);
        let err = draft
            .build(Some(&spotify()), &genres, &FacetSelection::new(), &[])
            .unwrap_err();
        assert_eq!(err, Incomplete::NoSelectionValues(SelectionMode::ByArtist));
    }

    #[test]
    fn test_explicit_items_are_trimmed_and_unique() {
        let draft = TransferDraft {
            selection_mode: SelectionMode::ByExplicitItems,
            ..Default::default()
        };
        let ids = vec!["t1".to_string(), " t1 ".to_string(), "T1".to_string()];
        let request = draft
            .build(
                Some(&spotify()),
                &FacetSelection::new(),
                &FacetSelection::new(),
                &ids,
            )
            .unwrap();
        assert_eq!(request.selection_values(), ["t1", "T1"]);
    }

    #[test]
    fn test_create_target_ignores_counterparty() {
        let draft = TransferDraft {
            direction: Direction::ExportFromCurrent,
            export_target: ExportTarget::Create,
            destination_title: "  Late night  ".to_string(),
            destination_description: "   ".to_string(),
            destination_is_public: true,
            ..Default::default()
        };
        let request = draft
            .build(
                Some(&spotify()),
                &FacetSelection::new(),
                &FacetSelection::new(),
                &[],
            )
            .unwrap();
        assert!(request.counterparty().is_none());
        let create = request.destination_create().unwrap();
        assert_eq!(create.title, "Late night");
        assert_eq!(create.description, None);
        assert!(create.is_public);
    }
}
