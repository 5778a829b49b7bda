use serde::Serialize;
use shared::collection::{CollectionRef, FacetSuggestions};
use tracing::warn;

use crate::error::TransferError;

/// Advisory genre/artist suggestions for the resolved source collection.
///
/// Failures only set a status message. Custom facet values can always be added by hand.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FacetSuggestionState {
    source: Option<CollectionRef>,
    suggestions: FacetSuggestions,
    loading: bool,
    status: Option<String>,
}

impl FacetSuggestionState {
    pub fn source(&self) -> Option<&CollectionRef> {
        self.source.as_ref()
    }

    pub fn suggestions(&self) -> &FacetSuggestions {
        &self.suggestions
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    /// Switches to a new source. Returns the source to fetch when it changed.
    pub fn begin(&mut self, source: Option<&CollectionRef>) -> Option<CollectionRef> {
        if source == self.source.as_ref() {
            return None;
        }
        self.source = source.cloned();
        self.suggestions = FacetSuggestions::default();
        self.status = None;
        self.loading = self.source.is_some();
        self.source.clone()
    }

    /// Applies a response, unless it belongs to a source that is no longer current.
    pub fn apply(
        &mut self,
        source: &CollectionRef,
        result: Result<FacetSuggestions, TransferError>,
    ) -> bool {
        if self.source.as_ref() != Some(source) {
            return false;
        }
        self.loading = false;
        match result {
            Ok(suggestions) => {
                self.suggestions = suggestions;
                self.status = None;
            }
            Err(e) => {
                warn!("Failed to load facet suggestions for {}: {}", source, e);
                self.suggestions = FacetSuggestions::default();
                self.status = Some(format!("Unable to load genre/artist suggestions: {e}"));
            }
        }
        true
    }
}
