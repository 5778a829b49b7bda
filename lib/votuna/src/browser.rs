use serde::Serialize;
use shared::collection::{CollectionRef, ItemSummary, SourceItemsPage};
use tracing::{debug, warn};

use crate::error::{Result, TransferError};
use crate::traits::TransferBackend;

pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// One page request against the source collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageQuery {
    pub source: CollectionRef,
    pub search: Option<String>,
    pub limit: u32,
    pub offset: u32,
}

/// Fetches one page of the source collection.
pub async fn browse(
    backend: &dyn TransferBackend,
    current_id: i64,
    query: &PageQuery,
) -> Result<SourceItemsPage> {
    debug!(
        "Browsing {} (search: {:?}, limit {}, offset {})",
        query.source, query.search, query.limit, query.offset
    );
    backend
        .browse_source_items(
            current_id,
            &query.source,
            query.search.as_deref(),
            query.limit,
            query.offset,
        )
        .await
}

/// Paginated, searchable view of the source collection plus the explicit item selection.
///
/// The selection is an ordered set of item ids kept across pages and searches; only a new
/// source (or [`SourceItemBrowser::reset`]) clears it.
#[derive(Debug, Clone)]
pub struct SourceItemBrowser {
    source: Option<CollectionRef>,
    search: String,
    limit: u32,
    offset: u32,
    page: SourceItemsPage,
    loaded: Option<PageQuery>,
    pending: Option<PageQuery>,
    error: Option<String>,
    selected: Vec<String>,
}

impl SourceItemBrowser {
    pub fn new(limit: u32) -> Self {
        Self {
            source: None,
            search: String::new(),
            limit: limit.max(1),
            offset: 0,
            page: SourceItemsPage::default(),
            loaded: None,
            pending: None,
            error: None,
            selected: Vec::new(),
        }
    }

    pub fn source(&self) -> Option<&CollectionRef> {
        self.source.as_ref()
    }

    /// Points the browser at a new source. A different source resets everything.
    pub fn set_source(&mut self, source: Option<CollectionRef>) -> bool {
        if source == self.source {
            return false;
        }
        self.source = source;
        self.clear_state();
        true
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    /// Changing the search text always rewinds to the first page.
    pub fn set_search(&mut self, text: &str) {
        if text == self.search {
            return;
        }
        self.search = text.to_string();
        self.offset = 0;
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn offset(&self) -> u32 {
        self.offset
    }

    pub fn set_offset(&mut self, offset: u32) {
        self.offset = offset;
    }

    pub fn total_count(&self) -> u32 {
        self.page.total_count
    }

    pub fn can_page_forward(&self) -> bool {
        self.offset.saturating_add(self.limit) < self.page.total_count
    }

    pub fn can_page_back(&self) -> bool {
        self.offset > 0
    }

    pub fn next_page(&mut self) -> bool {
        if !self.can_page_forward() {
            return false;
        }
        self.offset = self.offset.saturating_add(self.limit);
        true
    }

    pub fn prev_page(&mut self) -> bool {
        if !self.can_page_back() {
            return false;
        }
        self.offset = self.offset.saturating_sub(self.limit);
        true
    }

    /// 1-based (start, end) of the visible page, or (0, 0) when there is nothing to show.
    pub fn page_range(&self) -> (u32, u32) {
        let total = self.page.total_count;
        if self.offset >= total {
            return (0, 0);
        }
        (self.offset + 1, self.offset.saturating_add(self.limit).min(total))
    }

    pub fn items(&self) -> &[ItemSummary] {
        &self.page.items
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    /// The query the browser currently wants on screen.
    pub fn query(&self) -> Option<PageQuery> {
        let source = self.source.clone()?;
        let search = self.search.trim();
        Some(PageQuery {
            source,
            search: (!search.is_empty()).then(|| search.to_string()),
            limit: self.limit,
            offset: self.offset,
        })
    }

    /// Returns the query to fetch, if the current one is neither loaded nor in flight.
    pub fn begin_load(&mut self) -> Option<PageQuery> {
        let query = self.query()?;
        if self.loaded.as_ref() == Some(&query) || self.pending.as_ref() == Some(&query) {
            return None;
        }
        self.pending = Some(query.clone());
        Some(query)
    }

    /// Applies a page response. Responses for any query other than the current one are dropped.
    pub fn apply(
        &mut self,
        query: PageQuery,
        result: std::result::Result<SourceItemsPage, TransferError>,
    ) -> bool {
        if self.pending.as_ref() == Some(&query) {
            self.pending = None;
        }
        if self.query().as_ref() != Some(&query) {
            debug!("Dropping stale source page at offset {}", query.offset);
            return false;
        }
        match result {
            Ok(page) => {
                self.page = page;
                self.error = None;
            }
            Err(e) => {
                warn!("Failed to load source songs: {}", e);
                self.page = SourceItemsPage::default();
                self.error = Some(e.to_string());
            }
        }
        self.loaded = Some(query);
        true
    }

    pub fn selected_ids(&self) -> &[String] {
        &self.selected
    }

    pub fn is_selected(&self, item_id: &str) -> bool {
        self.selected.iter().any(|id| id == item_id)
    }

    pub fn toggle_item(&mut self, item_id: &str) {
        if self.is_selected(item_id) {
            self.selected.retain(|id| id != item_id);
        } else if !item_id.trim().is_empty() {
            self.selected.push(item_id.to_string());
        }
    }

    /// Selects every visible item, or deselects them all when they already are.
    pub fn toggle_visible(&mut self) {
        let visible: Vec<String> = self.page.items.iter().map(|i| i.item_id.clone()).collect();
        if visible.is_empty() {
            return;
        }
        let all_selected = visible.iter().all(|id| self.is_selected(id));
        for id in &visible {
            if self.is_selected(id) == all_selected {
                self.toggle_item(id);
            }
        }
    }

    pub fn reset(&mut self) {
        self.clear_state();
    }

    fn clear_state(&mut self) {
        self.search.clear();
        self.offset = 0;
        self.page = SourceItemsPage::default();
        self.loaded = None;
        self.pending = None;
        self.error = None;
        self.selected.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str) -> ItemSummary {
        ItemSummary {
            item_id: id.to_string(),
            title: format!("Track {id}"),
            artist: None,
            genre: None,
            artwork_url: None,
            url: None,
        }
    }

    fn page(range: std::ops::Range<u32>, total: u32) -> SourceItemsPage {
        SourceItemsPage {
            items: range.map(|i| item(&format!("t{i}"))).collect(),
            total_count: total,
        }
    }

    fn browser() -> SourceItemBrowser {
        let mut browser = SourceItemBrowser::new(50);
        browser.set_source(Some(CollectionRef::provider("spotify", "src")));
        browser
    }

    fn load(browser: &mut SourceItemBrowser, total: u32) {
        let query = browser.begin_load().unwrap();
        let start = query.offset;
        let end = (start + query.limit).min(total);
        browser.apply(query, Ok(page(start..end, total)));
    }

    #[test]
    fn test_selection_survives_paging() {
        let mut browser = browser();
        load(&mut browser, 120);
        browser.toggle_item("t3");

        assert!(browser.next_page());
        assert_eq!(browser.offset(), 50);
        load(&mut browser, 120);
        assert!(browser.is_selected("t3"));

        assert!(browser.prev_page());
        assert_eq!(browser.offset(), 0);
        load(&mut browser, 120);
        assert!(browser.is_selected("t3"));
        assert_eq!(browser.selected_ids(), ["t3"]);
    }

    #[test]
    fn test_search_resets_offset_and_keeps_selection() {
        let mut browser = browser();
        load(&mut browser, 120);
        browser.toggle_item("t1");
        browser.set_offset(100);
        browser.set_search("burial");
        assert_eq!(browser.offset(), 0);
        assert_eq!(browser.query().unwrap().search.as_deref(), Some("burial"));
        assert!(browser.is_selected("t1"));
    }

    #[test]
    fn test_new_source_clears_selection() {
        let mut browser = browser();
        browser.toggle_item("t1");
        assert!(browser.set_source(Some(CollectionRef::managed(4))));
        assert!(browser.selected_ids().is_empty());
        assert!(!browser.set_source(Some(CollectionRef::managed(4))));
    }

    #[test]
    fn test_stale_page_is_dropped() {
        let mut browser = browser();
        let first = browser.begin_load().unwrap();
        browser.set_search("late");
        let second = browser.begin_load().unwrap();

        assert!(!browser.apply(first, Ok(page(0..50, 120))));
        assert!(browser.items().is_empty());
        assert!(browser.apply(second, Ok(page(0..3, 3))));
        assert_eq!(browser.items().len(), 3);
        assert!(!browser.is_loading());
    }

    #[test]
    fn test_loaded_query_is_not_refetched() {
        let mut browser = browser();
        load(&mut browser, 10);
        assert!(browser.begin_load().is_none());
    }

    #[test]
    fn test_page_range_and_bounds() {
        let mut browser = browser();
        assert_eq!(browser.page_range(), (0, 0));
        load(&mut browser, 120);
        assert_eq!(browser.page_range(), (1, 50));
        browser.next_page();
        browser.next_page();
        assert_eq!(browser.page_range(), (101, 120));
        assert!(!browser.next_page());
        assert_eq!(browser.offset(), 100);
    }

    #[test]
    fn test_offset_near_max_does_not_overflow() {
        let mut browser = browser();
        browser.set_offset(u32::MAX - 3);
        let query = browser.begin_load().unwrap();
        assert_eq!(query.offset, u32::MAX - 3);
        browser.apply(query, Ok(page(0..0, 120)));

        assert!(!browser.can_page_forward());
        assert!(!browser.next_page());
        assert_eq!(browser.page_range(), (0, 0));
        assert!(browser.items().is_empty());

        browser.set_offset(u32::MAX);
        assert!(!browser.can_page_forward());
        assert_eq!(browser.page_range(), (0, 0));
        assert!(browser.prev_page());
        assert_eq!(browser.offset(), u32::MAX - 50);
    }

    #[test]
    fn test_toggle_visible() {
        let mut browser = SourceItemBrowser::new(3);
        browser.set_source(Some(CollectionRef::managed(1)));
        load(&mut browser, 3);
        browser.toggle_item("t1");
        browser.toggle_visible();
        assert_eq!(browser.selected_ids(), ["t1", "t0", "t2"]);
        browser.toggle_visible();
        assert!(browser.selected_ids().is_empty());
    }

    #[test]
    fn test_error_is_reported() {
        let mut browser = browser();
        let query = browser.begin_load().unwrap();
        browser.apply(query, Err(TransferError::NotFound("Playlist not found".into())));
        assert_eq!(browser.error(), Some("Playlist not found"));
    }
}
