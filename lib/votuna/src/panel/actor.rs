use shared::collection::{CollectionRef, CurrentCollection};
use shared::transfer::{Direction, SelectionMode};
use tokio::sync::{mpsc, watch};
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info};
use uuid::Uuid;

use super::command::{PanelCommand, PanelEvent};
use super::handle::PanelHandle;
use super::snapshot::PanelSnapshot;
use crate::browser::{browse, PageQuery, SourceItemBrowser};
use crate::config::PanelConfig;
use crate::counterparty::{CounterpartyResolver, DiscoveryMode};
use crate::execution::{invalidation_keys, ExecutionController, ExecutionTicket};
use crate::facets::FacetSuggestionState;
use crate::request::{ExportTarget, TransferDraft};
use crate::review::{PreviewTicket, ReviewPipeline};
use crate::selection::FacetSelection;
use crate::services::Services;
use crate::traits::DiscoveryScope;

/// State owned by a single panel task.
pub struct TransferPanel {
    id: Uuid,
    services: Services,
    config: PanelConfig,
    current: CurrentCollection,
    draft: TransferDraft,
    genres: FacetSelection,
    artists: FacetSelection,
    resolver: CounterpartyResolver,
    facets: FacetSuggestionState,
    browser: SourceItemBrowser,
    review: ReviewPipeline,
    execution: ExecutionController,
    events: mpsc::UnboundedSender<PanelEvent>,
}

impl TransferPanel {
    /// Starts a panel for `current` on the running tokio runtime and loads the viewer's
    /// collections right away.
    pub fn spawn(
        services: Services,
        current: CurrentCollection,
        viewer_id: i64,
        config: PanelConfig,
    ) -> PanelHandle {
        let (command_tx, command_rx) = mpsc::channel(config.command_buffer.max(1));
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let id = Uuid::new_v4();

        let mut panel = TransferPanel {
            id,
            services,
            resolver: CounterpartyResolver::new(current.clone(), viewer_id),
            browser: SourceItemBrowser::new(config.source_page_size),
            review: ReviewPipeline::new(config.debounce),
            config,
            current,
            draft: TransferDraft::default(),
            genres: FacetSelection::new(),
            artists: FacetSelection::new(),
            facets: FacetSuggestionState::default(),
            execution: ExecutionController::default(),
            events: event_tx,
        };
        let (generation, scope) = panel.resolver.begin_owned();
        panel.spawn_discovery(generation, scope);
        panel.sync();

        let (snapshot_tx, snapshot_rx) = watch::channel(panel.snapshot());
        tokio::spawn(panel.run(command_rx, event_rx, snapshot_tx));
        PanelHandle::new(id, command_tx, snapshot_rx)
    }

    async fn run(
        mut self,
        mut commands: mpsc::Receiver<PanelCommand>,
        mut events: mpsc::UnboundedReceiver<PanelEvent>,
        snapshots: watch::Sender<PanelSnapshot>,
    ) {
        info!(panel = %self.id, "Transfer panel opened on {}", self.current.title);
        loop {
            let deadline = self.review.next_deadline();
            tokio::select! {
                command = commands.recv() => match command {
                    Some(PanelCommand::Shutdown) | None => break,
                    Some(command) => self.handle_command(command),
                },
                Some(event) = events.recv() => self.handle_event(event),
                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    if let Some(ticket) = self.review.poll_due(Instant::now()) {
                        self.spawn_preview(ticket);
                    }
                }
            }
            self.sync();
            snapshots.send_replace(self.snapshot());
        }
        info!(panel = %self.id, "Transfer panel closed");
    }

    fn handle_command(&mut self, command: PanelCommand) {
        debug!(panel = %self.id, "Command: {:?}", command);
        match command {
            PanelCommand::SetDirection(direction) => {
                if self.draft.direction != direction {
                    self.draft.direction = direction;
                    self.drop_counterparty_if_creating();
                    self.browser.reset();
                }
            }
            PanelCommand::SetExportTarget(target) => {
                if self.draft.export_target != target {
                    self.draft.export_target = target;
                    self.drop_counterparty_if_creating();
                    self.browser.reset();
                }
            }
            PanelCommand::SetDestinationTitle(title) => self.draft.destination_title = title,
            PanelCommand::SetDestinationDescription(description) => {
                self.draft.destination_description = description
            }
            PanelCommand::SetDestinationPublic(is_public) => {
                self.draft.destination_is_public = is_public
            }
            PanelCommand::SetSelectionMode(mode) => self.draft.selection_mode = mode,
            PanelCommand::AddGenre(value) => {
                self.genres.add(&value);
            }
            PanelCommand::RemoveGenre(value) => {
                self.genres.remove(&value);
            }
            PanelCommand::ToggleGenre(value) => self.genres.toggle(&value),
            PanelCommand::AddArtist(value) => {
                self.artists.add(&value);
            }
            PanelCommand::RemoveArtist(value) => {
                self.artists.remove(&value);
            }
            PanelCommand::ToggleArtist(value) => self.artists.toggle(&value),
            PanelCommand::SelectCounterparty(key) => {
                if self.resolver.select(&key) {
                    self.browser.reset();
                }
            }
            PanelCommand::SetDiscoveryMode(mode) => self.resolver.set_mode(mode),
            PanelCommand::SearchCounterparties(text) => {
                self.resolver.set_search_text(&text);
                self.resolver.set_mode(DiscoveryMode::Search);
                match self.resolver.begin_search() {
                    Some((generation, scope)) => self.spawn_discovery(generation, scope),
                    None => debug!(panel = %self.id, "Ignoring blank playlist search"),
                }
            }
            PanelCommand::RefreshOwned => {
                let (generation, scope) = self.resolver.begin_owned();
                self.spawn_discovery(generation, scope);
            }
            PanelCommand::SetSourceSearch(text) => self.browser.set_search(&text),
            PanelCommand::SetSourceOffset(offset) => self.browser.set_offset(offset),
            PanelCommand::NextPage => {
                self.browser.next_page();
            }
            PanelCommand::PrevPage => {
                self.browser.prev_page();
            }
            PanelCommand::ToggleItem(item_id) => self.browser.toggle_item(&item_id),
            PanelCommand::ToggleVisibleItems => self.browser.toggle_visible(),
            PanelCommand::RetryPreview => {
                if let Some(ticket) = self.review.retry() {
                    self.spawn_preview(ticket);
                }
            }
            PanelCommand::Execute => match self.execution.begin(&self.review) {
                Ok(Some(ticket)) => self.spawn_execute(ticket),
                Ok(None) => {}
                Err(e) => debug!(panel = %self.id, "Execution refused: {}", e),
            },
            PanelCommand::ApplyMergePreset => {
                self.draft.direction = Direction::ImportToCurrent;
                self.draft.export_target = ExportTarget::Existing;
                self.draft.selection_mode = SelectionMode::All;
                self.genres.clear();
                self.artists.clear();
                self.browser.reset();
            }
            PanelCommand::Shutdown => {}
        }
    }

    fn handle_event(&mut self, event: PanelEvent) {
        match event {
            PanelEvent::Discovery {
                scope,
                generation,
                result,
            } => {
                if self.resolver.apply(&scope, generation, result) {
                    self.browser.reset();
                }
            }
            PanelEvent::Facets { source, result } => {
                self.facets.apply(&source, result);
            }
            PanelEvent::Page { query, result } => {
                self.browser.apply(query, result);
            }
            PanelEvent::Preview { ticket, result } => {
                self.review.complete(ticket, result);
            }
            PanelEvent::Executed { ticket, result } => {
                if self.execution.finish(&ticket, result) {
                    self.spawn_invalidation(&ticket);
                }
            }
        }
    }

    /// A new destination has no counterparty.
    fn drop_counterparty_if_creating(&mut self) {
        if self.draft.is_creating_destination() {
            self.resolver.clear_selection();
        }
    }

    /// The collection items are read from, as far as the current input tells.
    fn source(&self) -> Option<CollectionRef> {
        match self.draft.direction {
            Direction::ImportToCurrent => self.resolver.selected_ref().cloned(),
            Direction::ExportFromCurrent => Some(self.current.collection_ref()),
        }
    }

    /// Brings the derived components in line with the current input.
    fn sync(&mut self) {
        let source = self.source();
        if self.browser.set_source(source.clone()) {
            debug!(panel = %self.id, "Source changed to {:?}", source);
        }
        if let Some(source) = self.facets.begin(source.as_ref()) {
            self.spawn_facets(source);
        }
        if self.draft.selection_mode == SelectionMode::ByExplicitItems {
            if let Some(query) = self.browser.begin_load() {
                self.spawn_browse(query);
            }
        }

        let request = self.draft.build(
            self.resolver.selected_ref(),
            &self.genres,
            &self.artists,
            self.browser.selected_ids(),
        );
        if self.review.update(request, Instant::now()) {
            self.execution
                .on_request_changed(self.review.current_fingerprint());
        }
    }

    fn snapshot(&self) -> PanelSnapshot {
        PanelSnapshot {
            panel_id: self.id,
            current: self.current.clone(),
            draft: self.draft.clone(),
            counterparty: (&self.resolver).into(),
            genres: self.genres.values().to_vec(),
            artists: self.artists.values().to_vec(),
            facets: self.facets.clone(),
            source_items: (&self.browser).into(),
            request: self.review.current_request().cloned(),
            review: self.review.state(),
            execution: self.execution.state(&self.review),
        }
    }

    fn spawn_discovery(&self, generation: u64, scope: DiscoveryScope) {
        let backend = self.services.backend().clone();
        let events = self.events.clone();
        let provider = self.current.provider.clone();
        let limit = self.config.search_limit;
        tokio::spawn(async move {
            let result = backend
                .discover_counterparties(&provider, &scope, limit)
                .await;
            let _ = events.send(PanelEvent::Discovery {
                scope,
                generation,
                result,
            });
        });
    }

    fn spawn_facets(&self, source: CollectionRef) {
        let backend = self.services.backend().clone();
        let events = self.events.clone();
        let current_id = self.current.collection_id;
        tokio::spawn(async move {
            let result = backend.suggest_facets(current_id, &source).await;
            let _ = events.send(PanelEvent::Facets { source, result });
        });
    }

    fn spawn_browse(&self, query: PageQuery) {
        let backend = self.services.backend().clone();
        let events = self.events.clone();
        let current_id = self.current.collection_id;
        tokio::spawn(async move {
            let result = browse(backend.as_ref(), current_id, &query).await;
            let _ = events.send(PanelEvent::Page { query, result });
        });
    }

    fn spawn_preview(&self, ticket: PreviewTicket) {
        let backend = self.services.backend().clone();
        let events = self.events.clone();
        let current_id = self.current.collection_id;
        tokio::spawn(async move {
            let result = backend.preview_transfer(current_id, &ticket.request).await;
            let _ = events.send(PanelEvent::Preview { ticket, result });
        });
    }

    fn spawn_execute(&self, ticket: ExecutionTicket) {
        let backend = self.services.backend().clone();
        let events = self.events.clone();
        let current_id = self.current.collection_id;
        tokio::spawn(async move {
            let result = backend.execute_transfer(current_id, &ticket.request).await;
            let _ = events.send(PanelEvent::Executed { ticket, result });
        });
    }

    fn spawn_invalidation(&self, ticket: &ExecutionTicket) {
        let keys = invalidation_keys(&self.current, &ticket.request);
        if self.services.list_caches().is_empty() {
            debug!(panel = %self.id, "No caches registered, skipping {} invalidations", keys.len());
            return;
        }
        let services = self.services.clone();
        tokio::spawn(async move {
            services.invalidate(&keys).await;
        });
    }
}
