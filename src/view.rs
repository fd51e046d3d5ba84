use crate::catalog::{DiscoverFilters, MediaType};

pub const PAGE_SIZES: [usize; 3] = [10, 20, 50];
pub const DEFAULT_PAGE_SIZE: usize = 20;

// Minimum query length before a search is issued; shorter input leaves the
// current mode untouched.
pub const MIN_QUERY_LEN: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BrowseMode {
    Trending,
    Search,
    Discover,
    Watchlist,
}

impl BrowseMode {
    pub fn label(&self) -> &'static str {
        match self {
            BrowseMode::Trending => "Trending",
            BrowseMode::Search => "Search",
            BrowseMode::Discover => "Discover",
            BrowseMode::Watchlist => "Watchlist",
        }
    }
}

// Ephemeral browse state. Holds no rendering concerns and is never
// persisted; the UI layer drives it and refetches whenever a transition
// reports that the result set changed.
#[derive(Debug, Clone)]
pub struct ViewState {
    pub media_type: MediaType,
    pub mode: BrowseMode,
    pub query: String,
    pub filters: DiscoverFilters,
    pub page: usize,
    pub items_per_page: usize,
    pub total_pages: usize,
    pub total_results: usize,
}

impl ViewState {
    pub fn new(items_per_page: usize) -> Self {
        let items_per_page = if PAGE_SIZES.contains(&items_per_page) {
            items_per_page
        } else {
            DEFAULT_PAGE_SIZE
        };
        ViewState {
            media_type: MediaType::Movie,
            mode: BrowseMode::Trending,
            query: String::new(),
            filters: DiscoverFilters::default(),
            page: 1,
            items_per_page,
            total_pages: 1,
            total_results: 0,
        }
    }

    pub fn set_media_type(&mut self, media: MediaType) -> bool {
        if self.media_type == media {
            return false;
        }
        self.media_type = media;
        self.reset_page();
        true
    }

    // Applies the search field. Returns true when the transition changed
    // the result set and a refetch is due.
    pub fn submit_query(&mut self, query: &str) -> bool {
        let trimmed = query.trim();
        if trimmed.is_empty() {
            self.query.clear();
            if self.mode == BrowseMode::Search || self.mode == BrowseMode::Watchlist {
                self.mode = BrowseMode::Trending;
                self.reset_page();
                return true;
            }
            return false;
        }
        if trimmed.len() < MIN_QUERY_LEN {
            return false;
        }
        if self.mode == BrowseMode::Search && self.query == trimmed {
            return false;
        }
        self.query = trimmed.to_string();
        self.mode = BrowseMode::Search;
        self.reset_page();
        true
    }

    pub fn apply_filters(&mut self, filters: DiscoverFilters) -> bool {
        if filters.is_empty() {
            return self.clear_filters();
        }
        self.filters = filters;
        self.query.clear();
        self.mode = BrowseMode::Discover;
        self.reset_page();
        true
    }

    pub fn clear_filters(&mut self) -> bool {
        self.filters.clear();
        if self.mode == BrowseMode::Discover {
            self.mode = BrowseMode::Trending;
            self.reset_page();
            return true;
        }
        false
    }

    pub fn open_watchlist(&mut self) -> bool {
        if self.mode == BrowseMode::Watchlist {
            return false;
        }
        self.mode = BrowseMode::Watchlist;
        self.reset_page();
        true
    }

    // The source has no explicit "back" from the watchlist: whichever of
    // search/filter/trending is still armed wins, query over filters.
    pub fn leave_watchlist(&mut self) -> bool {
        if self.mode != BrowseMode::Watchlist {
            return false;
        }
        self.mode = if self.query.len() >= MIN_QUERY_LEN {
            BrowseMode::Search
        } else if !self.filters.is_empty() {
            BrowseMode::Discover
        } else {
            BrowseMode::Trending
        };
        self.reset_page();
        true
    }

    pub fn record_totals(&mut self, total_pages: usize, total_results: usize) {
        self.total_pages = total_pages.max(1);
        self.total_results = total_results;
        if self.page > self.total_pages {
            self.page = self.total_pages;
        }
    }

    pub fn next_page(&mut self) -> bool {
        if self.page < self.total_pages {
            self.page += 1;
            return true;
        }
        false
    }

    pub fn prev_page(&mut self) -> bool {
        if self.page > 1 {
            self.page -= 1;
            return true;
        }
        false
    }

    pub fn set_items_per_page(&mut self, size: usize) -> bool {
        if !PAGE_SIZES.contains(&size) || size == self.items_per_page {
            return false;
        }
        self.items_per_page = size;
        self.reset_page();
        true
    }

    pub fn cycle_items_per_page(&mut self) -> bool {
        let idx = PAGE_SIZES
            .iter()
            .position(|size| *size == self.items_per_page)
            .unwrap_or(0);
        let next = PAGE_SIZES[(idx + 1) % PAGE_SIZES.len()];
        self.set_items_per_page(next)
    }

    fn reset_page(&mut self) {
        self.page = 1;
        self.total_pages = 1;
        self.total_results = 0;
    }
}

pub type Generation = u64;

// Serializes fetches: a request observed while one is outstanding is
// dropped, not queued, and a completion for a superseded generation is
// reported stale so a late response can never overwrite the current view.
#[derive(Debug, Default)]
pub struct FetchGate {
    busy: bool,
    generation: Generation,
}

impl FetchGate {
    pub fn begin(&mut self) -> Option<Generation> {
        if self.busy {
            return None;
        }
        self.generation += 1;
        self.busy = true;
        Some(self.generation)
    }

    pub fn complete(&mut self, generation: Generation) -> bool {
        if generation == self.generation {
            self.busy = false;
            true
        } else {
            false
        }
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn current(&self) -> Generation {
        self.generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_over_two_chars_enters_search() {
        let mut state = ViewState::new(20);
        state.page = 4;
        state.total_pages = 9;
        assert!(state.submit_query("heat"));
        assert_eq!(state.mode, BrowseMode::Search);
        assert_eq!(state.query, "heat");
        assert_eq!(state.page, 1);
    }

    #[test]
    fn short_query_is_ignored() {
        let mut state = ViewState::new(20);
        assert!(!state.submit_query("he"));
        assert_eq!(state.mode, BrowseMode::Trending);
        assert!(state.query.is_empty());
    }

    #[test]
    fn clearing_query_returns_to_trending() {
        let mut state = ViewState::new(20);
        state.submit_query("heat");
        assert!(state.submit_query(""));
        assert_eq!(state.mode, BrowseMode::Trending);
        assert_eq!(state.page, 1);
    }

    #[test]
    fn repeating_the_same_query_does_not_refetch() {
        let mut state = ViewState::new(20);
        assert!(state.submit_query("heat"));
        assert!(!state.submit_query("heat"));
    }

    #[test]
    fn filters_enter_discover_and_clear_query() {
        let mut state = ViewState::new(20);
        state.submit_query("heat");
        let filters = DiscoverFilters {
            genre: Some("18".into()),
            ..DiscoverFilters::default()
        };
        assert!(state.apply_filters(filters));
        assert_eq!(state.mode, BrowseMode::Discover);
        assert!(state.query.is_empty());
        assert_eq!(state.page, 1);
    }

    #[test]
    fn clearing_filters_returns_to_trending() {
        let mut state = ViewState::new(20);
        state.apply_filters(DiscoverFilters {
            year: Some("1995".into()),
            ..DiscoverFilters::default()
        });
        assert!(state.clear_filters());
        assert_eq!(state.mode, BrowseMode::Trending);
        assert!(state.filters.is_empty());
    }

    #[test]
    fn media_type_change_resets_page() {
        let mut state = ViewState::new(20);
        state.page = 3;
        state.total_pages = 5;
        assert!(state.set_media_type(MediaType::Tv));
        assert_eq!(state.page, 1);
        assert!(!state.set_media_type(MediaType::Tv));
    }

    #[test]
    fn page_navigation_clamps_to_totals() {
        let mut state = ViewState::new(20);
        state.record_totals(2, 25);
        assert!(!state.prev_page());
        assert!(state.next_page());
        assert_eq!(state.page, 2);
        assert!(!state.next_page());
        assert!(state.prev_page());
        assert_eq!(state.page, 1);
    }

    #[test]
    fn record_totals_clamps_current_page() {
        let mut state = ViewState::new(20);
        state.record_totals(10, 200);
        state.page = 8;
        state.record_totals(3, 45);
        assert_eq!(state.page, 3);
    }

    #[test]
    fn items_per_page_resets_page_and_rejects_unknown_sizes() {
        let mut state = ViewState::new(20);
        state.record_totals(4, 80);
        state.page = 4;
        assert!(state.set_items_per_page(50));
        assert_eq!(state.page, 1);
        assert!(!state.set_items_per_page(37));
        assert_eq!(state.items_per_page, 50);
    }

    #[test]
    fn unknown_configured_size_falls_back_to_default() {
        let state = ViewState::new(37);
        assert_eq!(state.items_per_page, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn cycle_items_per_page_walks_the_fixed_set() {
        let mut state = ViewState::new(10);
        assert!(state.cycle_items_per_page());
        assert_eq!(state.items_per_page, 20);
        assert!(state.cycle_items_per_page());
        assert_eq!(state.items_per_page, 50);
        assert!(state.cycle_items_per_page());
        assert_eq!(state.items_per_page, 10);
    }

    #[test]
    fn watchlist_round_trip_prefers_query_then_filters() {
        let mut state = ViewState::new(20);
        state.submit_query("heat");
        state.open_watchlist();
        assert!(state.leave_watchlist());
        assert_eq!(state.mode, BrowseMode::Search);

        let mut state = ViewState::new(20);
        state.apply_filters(DiscoverFilters {
            genre: Some("80".into()),
            ..DiscoverFilters::default()
        });
        state.open_watchlist();
        state.leave_watchlist();
        assert_eq!(state.mode, BrowseMode::Discover);

        let mut state = ViewState::new(20);
        state.open_watchlist();
        state.leave_watchlist();
        assert_eq!(state.mode, BrowseMode::Trending);
    }

    #[test]
    fn searching_from_watchlist_reenters_search() {
        let mut state = ViewState::new(20);
        state.open_watchlist();
        assert!(state.submit_query("alien"));
        assert_eq!(state.mode, BrowseMode::Search);
    }

    #[test]
    fn gate_drops_overlapping_fetches() {
        let mut gate = FetchGate::default();
        let first = gate.begin().unwrap();
        assert!(gate.begin().is_none());
        assert!(gate.complete(first));
        assert!(!gate.is_busy());
        assert!(gate.begin().is_some());
    }

    #[test]
    fn gate_discards_stale_completions() {
        let mut gate = FetchGate::default();
        let first = gate.begin().unwrap();
        gate.complete(first);
        let second = gate.begin().unwrap();
        assert!(!gate.complete(first));
        assert!(gate.is_busy());
        assert!(gate.complete(second));
        assert!(!gate.is_busy());
    }
}
