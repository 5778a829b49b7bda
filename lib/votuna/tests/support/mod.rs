//! Scripted in-memory collaborators for driving a panel end to end.

#![allow(dead_code)]

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use shared::collection::{
    CollectionRef, CurrentCollection, FacetCount, FacetSuggestions, ItemSummary,
    ManagedCollection, ProviderCollection, SourceItemsPage,
};
use shared::transfer::{ExecutionResult, PreviewResult, TransferRequest};
use votuna::error::{Result, TransferError};
use votuna::traits::{CacheKey, CollectionCache, TransferBackend};
use votuna::{PanelConfig, PanelHandle, PanelSnapshot, ServicesBuilder, TransferPanel};

pub const VIEWER_ID: i64 = 10;

type PreviewFn = Box<dyn Fn(&TransferRequest) -> Result<PreviewResult> + Send + Sync>;
type ExecuteFn = Box<dyn Fn(&TransferRequest) -> Result<ExecutionResult> + Send + Sync>;
type DelayFn = Box<dyn Fn(&TransferRequest) -> Duration + Send + Sync>;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    ListProvider(String),
    Search(String),
    ListManaged,
    Facets(CollectionRef),
    Browse {
        source: CollectionRef,
        search: Option<String>,
        offset: u32,
    },
    Preview(TransferRequest),
    Execute(TransferRequest),
}

pub struct ScriptedBackend {
    pub provider_collections: Mutex<Vec<ProviderCollection>>,
    pub managed_collections: Mutex<Vec<ManagedCollection>>,
    pub search_results: Mutex<Vec<ProviderCollection>>,
    pub facets: Mutex<FacetSuggestions>,
    pub source_items: Mutex<Vec<ItemSummary>>,
    preview: Mutex<PreviewFn>,
    preview_delay: Mutex<DelayFn>,
    execute: Mutex<ExecuteFn>,
    execute_delay: Mutex<Duration>,
    /// Number of upcoming preview calls that fail with a transport error.
    pub failing_previews: AtomicUsize,
    calls: Mutex<Vec<Call>>,
}

impl Default for ScriptedBackend {
    fn default() -> Self {
        Self {
            provider_collections: Mutex::new(vec![
                provider_collection("soundcloud", "sc-1"),
                provider_collection("soundcloud", "sc-2"),
                provider_collection("spotify", "sp-1"),
            ]),
            managed_collections: Mutex::new(vec![
                managed_collection(1, VIEWER_ID),
                managed_collection(2, VIEWER_ID),
                managed_collection(3, 99),
            ]),
            search_results: Mutex::new(Vec::new()),
            facets: Mutex::new(FacetSuggestions {
                genres: vec![facet("house", 12), facet("techno", 4)],
                artists: vec![facet("Burial", 3)],
                total_items_considered: 16,
            }),
            source_items: Mutex::new((0..25).map(|i| item(&format!("t{i}"))).collect()),
            preview: Mutex::new(Box::new(|request| Ok(preview_for(request, 500)))),
            preview_delay: Mutex::new(Box::new(|_| Duration::from_millis(50))),
            execute: Mutex::new(Box::new(|request| {
                let count = request.selection_values().len().max(1) as u32;
                Ok(ExecutionResult {
                    matched_count: count,
                    added_count: count,
                    skipped_duplicate_count: 0,
                    failed_count: 0,
                    failed_items: vec![],
                })
            })),
            execute_delay: Mutex::new(Duration::from_millis(50)),
            failing_previews: AtomicUsize::new(0),
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl ScriptedBackend {
    pub fn on_preview(
        &self,
        f: impl Fn(&TransferRequest) -> Result<PreviewResult> + Send + Sync + 'static,
    ) {
        *self.preview.lock().unwrap() = Box::new(f);
    }

    pub fn delay_preview(&self, f: impl Fn(&TransferRequest) -> Duration + Send + Sync + 'static) {
        *self.preview_delay.lock().unwrap() = Box::new(f);
    }

    pub fn on_execute(
        &self,
        f: impl Fn(&TransferRequest) -> Result<ExecutionResult> + Send + Sync + 'static,
    ) {
        *self.execute.lock().unwrap() = Box::new(f);
    }

    pub fn delay_execute(&self, delay: Duration) {
        *self.execute_delay.lock().unwrap() = delay;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn previews(&self) -> Vec<TransferRequest> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Preview(request) => Some(request),
                _ => None,
            })
            .collect()
    }

    pub fn executions(&self) -> Vec<TransferRequest> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Execute(request) => Some(request),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl TransferBackend for ScriptedBackend {
    fn id(&self) -> &'static str {
        "scripted"
    }

    async fn list_provider_collections(&self, provider: &str) -> Result<Vec<ProviderCollection>> {
        self.record(Call::ListProvider(provider.to_string()));
        Ok(self.provider_collections.lock().unwrap().clone())
    }

    async fn search_provider_collections(
        &self,
        _provider: &str,
        query: &str,
        limit: u32,
    ) -> Result<Vec<ProviderCollection>> {
        self.record(Call::Search(query.to_string()));
        let results = self.search_results.lock().unwrap().clone();
        Ok(results.into_iter().take(limit as usize).collect())
    }

    async fn list_managed_collections(&self) -> Result<Vec<ManagedCollection>> {
        self.record(Call::ListManaged);
        Ok(self.managed_collections.lock().unwrap().clone())
    }

    async fn suggest_facets(
        &self,
        _current_id: i64,
        source: &CollectionRef,
    ) -> Result<FacetSuggestions> {
        self.record(Call::Facets(source.clone()));
        Ok(self.facets.lock().unwrap().clone())
    }

    async fn browse_source_items(
        &self,
        _current_id: i64,
        source: &CollectionRef,
        search: Option<&str>,
        limit: u32,
        offset: u32,
    ) -> Result<SourceItemsPage> {
        self.record(Call::Browse {
            source: source.clone(),
            search: search.map(str::to_string),
            offset,
        });
        let items: Vec<ItemSummary> = self
            .source_items
            .lock()
            .unwrap()
            .iter()
            .filter(|i| search.map_or(true, |s| i.title.contains(s)))
            .cloned()
            .collect();
        Ok(SourceItemsPage {
            total_count: items.len() as u32,
            items: items
                .into_iter()
                .skip(offset as usize)
                .take(limit as usize)
                .collect(),
        })
    }

    async fn preview_transfer(
        &self,
        _current_id: i64,
        request: &TransferRequest,
    ) -> Result<PreviewResult> {
        self.record(Call::Preview(request.clone()));
        let delay = (*self.preview_delay.lock().unwrap())(request);
        tokio::time::sleep(delay).await;
        if self
            .failing_previews
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(TransferError::Transport("connection reset".to_string()));
        }
        let result = (*self.preview.lock().unwrap())(request);
        result
    }

    async fn execute_transfer(
        &self,
        _current_id: i64,
        request: &TransferRequest,
    ) -> Result<ExecutionResult> {
        self.record(Call::Execute(request.clone()));
        let delay = *self.execute_delay.lock().unwrap();
        tokio::time::sleep(delay).await;
        let result = (*self.execute.lock().unwrap())(request);
        result
    }
}

#[derive(Default)]
pub struct RecordingCache {
    keys: Mutex<Vec<CacheKey>>,
}

impl RecordingCache {
    pub fn keys(&self) -> Vec<CacheKey> {
        self.keys.lock().unwrap().clone()
    }
}

#[async_trait]
impl CollectionCache for RecordingCache {
    fn id(&self) -> &'static str {
        "recording"
    }

    async fn invalidate(&self, key: &CacheKey) {
        self.keys.lock().unwrap().push(key.clone());
    }
}

pub struct Harness {
    pub backend: Arc<ScriptedBackend>,
    pub cache: Arc<RecordingCache>,
    pub panel: PanelHandle,
}

impl Harness {
    pub fn start(backend: ScriptedBackend) -> Self {
        Self::start_with(backend, PanelConfig::default())
    }

    pub fn start_with(backend: ScriptedBackend, config: PanelConfig) -> Self {
        let backend = Arc::new(backend);
        let cache = Arc::new(RecordingCache::default());
        let services = ServicesBuilder::new()
            .shared_backend(backend.clone())
            .add_shared_cache(cache.clone())
            .build()
            .unwrap();
        let panel = TransferPanel::spawn(services, current(), VIEWER_ID, config);
        Self {
            backend,
            cache,
            panel,
        }
    }

    /// Waits, in virtual time, for a snapshot that satisfies `predicate`.
    pub async fn until(&self, predicate: impl FnMut(&PanelSnapshot) -> bool) -> PanelSnapshot {
        within(self.panel.wait_for(predicate)).await.unwrap()
    }

    pub async fn send_all(&self, commands: impl IntoIterator<Item = votuna::PanelCommand>) {
        for command in commands {
            self.panel.send(command).await.unwrap();
        }
    }
}

pub async fn within<F: Future>(future: F) -> F::Output {
    tokio::time::timeout(Duration::from_secs(60), future)
        .await
        .expect("timed out waiting for the panel")
}

/// Polls `condition` until it holds, in virtual time.
pub async fn eventually(mut condition: impl FnMut() -> bool) {
    within(async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn current() -> CurrentCollection {
    CurrentCollection {
        collection_id: 1,
        owner_user_id: VIEWER_ID,
        provider: "soundcloud".to_string(),
        provider_item_id: "sc-1".to_string(),
        title: "Party".to_string(),
    }
}

pub fn provider_collection(provider: &str, id: &str) -> ProviderCollection {
    ProviderCollection {
        provider: provider.to_string(),
        provider_item_id: id.to_string(),
        title: format!("Playlist {id}"),
        description: None,
        image_url: None,
        item_count: Some(25),
        is_public: Some(true),
    }
}

pub fn managed_collection(id: i64, owner: i64) -> ManagedCollection {
    ManagedCollection {
        id,
        owner_user_id: owner,
        provider: "soundcloud".to_string(),
        provider_item_id: format!("sc-m{id}"),
        title: format!("Managed {id}"),
        image_url: None,
    }
}

pub fn item(id: &str) -> ItemSummary {
    ItemSummary {
        item_id: id.to_string(),
        title: format!("Song {id}"),
        artist: Some("Burial".to_string()),
        genre: Some("house".to_string()),
        artwork_url: None,
        url: None,
    }
}

pub fn facet(value: &str, count: u32) -> FacetCount {
    FacetCount {
        value: value.to_string(),
        count,
    }
}

/// Everything matches and nothing is a duplicate. Explicit selections match one song per id.
pub fn preview_for(request: &TransferRequest, limit: u32) -> PreviewResult {
    let matched = match request.selection_values().len() {
        0 => 25,
        n => n as u32,
    };
    PreviewResult {
        matched_count: matched,
        to_add_count: matched,
        duplicate_count: 0,
        matched_sample: vec![],
        duplicate_sample: vec![],
        max_items_per_action: limit,
    }
}
