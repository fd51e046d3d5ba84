use std::collections::HashMap;
use std::io::{self, Stdout};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossbeam_channel::{unbounded, Receiver, Sender};
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use once_cell::sync::Lazy;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::{Frame, Terminal};
use textwrap::wrap;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::catalog::{ContentDetail, ContentSummary, DiscoverFilters, MediaType, Page};
use crate::data::CatalogService;
use crate::export;
use crate::view::{BrowseMode, FetchGate, Generation, ViewState};
use crate::watchlist::{Membership, NewItem, WatchToggle, Watchlist};

const COLOR_BG: Color = Color::Rgb(30, 30, 46);
const COLOR_PANEL_BG: Color = Color::Rgb(24, 24, 36);
const COLOR_PANEL_SELECTED_BG: Color = Color::Rgb(69, 71, 90);
const COLOR_BORDER_IDLE: Color = Color::Rgb(49, 50, 68);
const COLOR_BORDER_FOCUSED: Color = Color::Rgb(137, 180, 250);
const COLOR_TEXT_PRIMARY: Color = Color::Rgb(205, 214, 244);
const COLOR_TEXT_SECONDARY: Color = Color::Rgb(166, 173, 200);
const COLOR_ACCENT: Color = Color::Rgb(137, 180, 250);
const COLOR_SUCCESS: Color = Color::Rgb(166, 227, 161);
const COLOR_ERROR: Color = Color::Rgb(243, 139, 168);
const COLOR_WARN: Color = Color::Rgb(249, 226, 175);

const SPINNER_FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
const EVENT_POLL_INTERVAL: Duration = Duration::from_millis(100);
const SPINNER_TICK: Duration = Duration::from_millis(120);

const CSV_EXPORT_FILE: &str = "watchlist.csv";
const REPORT_EXPORT_FILE: &str = "watchlist-report.html";

// Fallback genre names for when the genre endpoint is unreachable.
static GENRE_FALLBACK: Lazy<HashMap<i64, &'static str>> = Lazy::new(|| {
    HashMap::from([
        (28, "Action"),
        (12, "Adventure"),
        (16, "Animation"),
        (35, "Comedy"),
        (80, "Crime"),
        (99, "Documentary"),
        (18, "Drama"),
        (10751, "Family"),
        (14, "Fantasy"),
        (36, "History"),
        (27, "Horror"),
        (10402, "Music"),
        (9648, "Mystery"),
        (10749, "Romance"),
        (878, "Science Fiction"),
        (10770, "TV Movie"),
        (53, "Thriller"),
        (10752, "War"),
        (37, "Western"),
    ])
});

pub struct Options {
    pub status_message: String,
    pub catalog: Option<Arc<dyn CatalogService>>,
    pub watchlist: Watchlist,
    pub items_per_page: usize,
    pub config_path: String,
}

#[derive(Clone)]
struct Card {
    id: i64,
    media_type: MediaType,
    title: String,
    year: String,
    rating: String,
    rating_value: f64,
    genre: String,
    overview: String,
    poster: String,
    release_date: String,
    watched: Option<bool>,
    added_at: String,
    notes: String,
}

impl Card {
    fn from_summary(summary: &ContentSummary, media: MediaType, genres: &HashMap<i64, String>) -> Self {
        let genre = summary
            .genre_ids
            .iter()
            .map(|id| genre_name(*id, genres))
            .collect::<Vec<_>>()
            .join(", ");
        Card {
            id: summary.id,
            media_type: media,
            title: summary.display_title().to_string(),
            year: summary.year().unwrap_or("N/A").to_string(),
            rating: summary.rating_display(),
            rating_value: summary.vote_average.unwrap_or(0.0),
            genre,
            overview: summary.overview.clone(),
            poster: summary.poster_path.clone().unwrap_or_default(),
            release_date: summary.date().unwrap_or_default().to_string(),
            watched: None,
            added_at: String::new(),
            notes: String::new(),
        }
    }

    fn from_watchlist(item: &crate::watchlist::WatchlistItem) -> Self {
        Card {
            id: item.id,
            media_type: item.media_type,
            title: item.title.clone(),
            year: item
                .release_date
                .split('-')
                .next()
                .filter(|y| y.len() == 4)
                .unwrap_or("N/A")
                .to_string(),
            rating: if item.rating > 0.0 {
                format!("{:.1}", item.rating)
            } else {
                "N/A".to_string()
            },
            rating_value: item.rating,
            genre: item.genre.clone(),
            overview: item.overview.clone(),
            poster: item.poster.clone(),
            release_date: item.release_date.clone(),
            watched: Some(item.is_watched),
            added_at: item.added_at.format("%Y-%m-%d").to_string(),
            notes: item.user_notes.clone(),
        }
    }

    fn as_new_item(&self) -> NewItem {
        NewItem {
            id: self.id,
            title: self.title.clone(),
            poster: self.poster.clone(),
            media_type: self.media_type,
            release_date: self.release_date.clone(),
            genre: self.genre.clone(),
            rating: self.rating_value,
            overview: self.overview.clone(),
        }
    }
}

fn genre_name(id: i64, genres: &HashMap<i64, String>) -> String {
    if let Some(name) = genres.get(&id) {
        return name.clone();
    }
    GENRE_FALLBACK
        .get(&id)
        .map(|name| name.to_string())
        .unwrap_or_else(|| "Unknown".to_string())
}

enum UiEvent {
    Listing {
        generation: Generation,
        outcome: Result<Page<ContentSummary>>,
    },
    Detail {
        generation: Generation,
        outcome: Result<ContentDetail>,
    },
    Genres {
        media: MediaType,
        outcome: Result<Vec<crate::catalog::Genre>>,
    },
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Focus {
    Results,
    Search,
    Filters,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum FilterField {
    Genre,
    Year,
    Rating,
    Runtime,
}

const FILTER_FIELDS: [FilterField; 4] = [
    FilterField::Genre,
    FilterField::Year,
    FilterField::Rating,
    FilterField::Runtime,
];

impl FilterField {
    fn label(&self) -> &'static str {
        match self {
            FilterField::Genre => "Genre",
            FilterField::Year => "Year",
            FilterField::Rating => "Min rating",
            FilterField::Runtime => "Max runtime",
        }
    }
}

enum Overlay {
    None,
    DetailLoading,
    Detail(ContentDetail),
    Notes { id: i64, buffer: String },
}

pub struct Model {
    catalog: Option<Arc<dyn CatalogService>>,
    watchlist: Watchlist,
    state: ViewState,
    gate: FetchGate,
    detail_gate: FetchGate,
    cards: Vec<Card>,
    genres: HashMap<MediaType, HashMap<i64, String>>,
    list_state: ListState,
    focus: Focus,
    overlay: Overlay,
    search_input: String,
    filter_inputs: [String; 4],
    active_filter: usize,
    status: String,
    status_is_error: bool,
    config_path: String,
    events_tx: Sender<UiEvent>,
    events_rx: Receiver<UiEvent>,
    spinner_frame: usize,
    last_spinner_tick: Instant,
    should_quit: bool,
}

impl Model {
    pub fn new(options: Options) -> Self {
        let (events_tx, events_rx) = unbounded();
        let mut list_state = ListState::default();
        list_state.select(Some(0));

        Model {
            catalog: options.catalog,
            watchlist: options.watchlist,
            state: ViewState::new(options.items_per_page),
            gate: FetchGate::default(),
            detail_gate: FetchGate::default(),
            cards: Vec::new(),
            genres: HashMap::new(),
            list_state,
            focus: Focus::Results,
            overlay: Overlay::None,
            search_input: String::new(),
            filter_inputs: Default::default(),
            active_filter: 0,
            status: options.status_message,
            status_is_error: false,
            config_path: options.config_path,
            events_tx,
            events_rx,
            spinner_frame: 0,
            last_spinner_tick: Instant::now(),
            should_quit: false,
        }
    }

    pub fn run(&mut self) -> Result<()> {
        enable_raw_mode().context("enable raw mode")?;
        let mut stdout = io::stdout();
        stdout
            .execute(EnterAlternateScreen)
            .context("enter alternate screen")?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).context("create terminal")?;

        self.request_genres(self.state.media_type);
        self.trigger_fetch();

        let result = self.event_loop(&mut terminal);

        disable_raw_mode().ok();
        terminal
            .backend_mut()
            .execute(LeaveAlternateScreen)
            .context("leave alternate screen")?;
        terminal.show_cursor().ok();

        result
    }

    fn event_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    ) -> Result<()> {
        loop {
            self.drain_events();
            self.tick_spinner();
            terminal.draw(|frame| self.draw(frame)).context("draw frame")?;

            if event::poll(EVENT_POLL_INTERVAL).context("poll terminal events")? {
                if let Event::Key(key) = event::read().context("read terminal event")? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key.code, key.modifiers);
                    }
                }
            }

            if self.should_quit {
                return Ok(());
            }
        }
    }

    fn tick_spinner(&mut self) {
        if self.last_spinner_tick.elapsed() >= SPINNER_TICK {
            self.spinner_frame = (self.spinner_frame + 1) % SPINNER_FRAMES.len();
            self.last_spinner_tick = Instant::now();
        }
    }

    // ----- events from the fetch workers -----

    fn drain_events(&mut self) {
        while let Ok(event) = self.events_rx.try_recv() {
            match event {
                UiEvent::Listing {
                    generation,
                    outcome,
                } => self.on_listing(generation, outcome),
                UiEvent::Detail {
                    generation,
                    outcome,
                } => self.on_detail(generation, outcome),
                UiEvent::Genres { media, outcome } => self.on_genres(media, outcome),
            }
        }
    }

    fn on_listing(&mut self, generation: Generation, outcome: Result<Page<ContentSummary>>) {
        // A stale response must never overwrite the current view.
        if !self.gate.complete(generation) {
            return;
        }
        match outcome {
            Ok(page) => {
                self.state.record_totals(page.total_pages, page.total_results);
                let media = self.state.media_type;
                let genre_map = self.genres.get(&media).cloned().unwrap_or_default();
                self.cards = page
                    .results
                    .iter()
                    .map(|summary| Card::from_summary(summary, media, &genre_map))
                    .collect();
                self.clamp_selection();
                self.set_status(
                    format!(
                        "{} {} - page {}/{} ({} results)",
                        self.state.mode.label(),
                        self.state.media_type.display_name(),
                        self.state.page,
                        self.state.total_pages,
                        self.state.total_results
                    ),
                    false,
                );
            }
            Err(err) => {
                self.cards.clear();
                self.set_status(
                    format!("Failed to load results. Please try again later. ({err:#})"),
                    true,
                );
            }
        }
    }

    fn on_detail(&mut self, generation: Generation, outcome: Result<ContentDetail>) {
        if !self.detail_gate.complete(generation) {
            return;
        }
        if !matches!(self.overlay, Overlay::DetailLoading) {
            return;
        }
        match outcome {
            Ok(detail) => self.overlay = Overlay::Detail(detail),
            Err(err) => {
                self.overlay = Overlay::None;
                self.set_status(
                    format!("Failed to load details. Please try again later. ({err:#})"),
                    true,
                );
            }
        }
    }

    fn on_genres(&mut self, media: MediaType, outcome: Result<Vec<crate::catalog::Genre>>) {
        if let Ok(genres) = outcome {
            let map = genres
                .into_iter()
                .map(|genre| (genre.id, genre.name))
                .collect();
            self.genres.insert(media, map);
        }
    }

    // ----- fetch triggers -----

    fn trigger_fetch(&mut self) {
        if self.state.mode == BrowseMode::Watchlist {
            self.rebuild_watchlist_cards();
            return;
        }

        let Some(catalog) = self.catalog.clone() else {
            self.set_status(
                "Catalog unavailable. Check your connection and config.".to_string(),
                true,
            );
            return;
        };

        // Overlapping requests are dropped, not queued.
        let Some(generation) = self.gate.begin() else {
            return;
        };

        let mode = self.state.mode;
        let media = self.state.media_type;
        let query = self.state.query.clone();
        let filters = self.state.filters.clone();
        let page = self.state.page;
        let page_size = self.state.items_per_page;
        let tx = self.events_tx.clone();

        thread::spawn(move || {
            let outcome = match mode {
                BrowseMode::Trending => catalog.trending(media, page, page_size),
                BrowseMode::Search => catalog.search(&query, media, page, page_size),
                BrowseMode::Discover => catalog.discover(media, filters, page, page_size),
                BrowseMode::Watchlist => unreachable!("watchlist pages are local"),
            };
            let _ = tx.send(UiEvent::Listing {
                generation,
                outcome,
            });
        });
    }

    fn trigger_detail(&mut self, id: i64, media: MediaType) {
        let Some(catalog) = self.catalog.clone() else {
            self.set_status("Catalog unavailable.".to_string(), true);
            return;
        };
        let Some(generation) = self.detail_gate.begin() else {
            return;
        };
        self.overlay = Overlay::DetailLoading;
        let tx = self.events_tx.clone();
        thread::spawn(move || {
            let outcome = catalog.detail(id, media);
            let _ = tx.send(UiEvent::Detail {
                generation,
                outcome,
            });
        });
    }

    fn request_genres(&mut self, media: MediaType) {
        if self.genres.contains_key(&media) {
            return;
        }
        let Some(catalog) = self.catalog.clone() else {
            return;
        };
        let tx = self.events_tx.clone();
        thread::spawn(move || {
            let outcome = catalog.genres(media);
            let _ = tx.send(UiEvent::Genres { media, outcome });
        });
    }

    fn rebuild_watchlist_cards(&mut self) {
        let page = self
            .watchlist
            .paginate(self.state.page, self.state.items_per_page);
        self.state.page = page.page;
        self.state.record_totals(page.total_pages, page.total_results);
        self.cards = page.items.iter().map(Card::from_watchlist).collect();
        self.clamp_selection();
        self.set_status(
            format!(
                "Watchlist - page {}/{} ({} saved)",
                page.page, page.total_pages, page.total_results
            ),
            false,
        );
    }

    // ----- key handling -----

    fn handle_key(&mut self, code: KeyCode, modifiers: KeyModifiers) {
        if !matches!(self.overlay, Overlay::None) {
            self.handle_overlay_key(code);
            return;
        }
        match self.focus {
            Focus::Search => self.handle_search_key(code),
            Focus::Filters => self.handle_filter_key(code, modifiers),
            Focus::Results => self.handle_results_key(code),
        }
    }

    fn handle_overlay_key(&mut self, code: KeyCode) {
        match &mut self.overlay {
            Overlay::Notes { id, buffer } => match code {
                KeyCode::Esc => self.overlay = Overlay::None,
                KeyCode::Enter => {
                    let id = *id;
                    let notes = buffer.clone();
                    self.overlay = Overlay::None;
                    self.toggle_watched(id, Some(notes));
                }
                KeyCode::Backspace => {
                    buffer.pop();
                }
                KeyCode::Char(ch) => buffer.push(ch),
                _ => {}
            },
            Overlay::Detail(detail) => match code {
                KeyCode::Esc | KeyCode::Char('q') | KeyCode::Enter => {
                    self.overlay = Overlay::None;
                }
                KeyCode::Char('o') => {
                    if let Some(url) = detail.external_url() {
                        if webbrowser::open(&url).is_err() {
                            self.set_status(format!("Could not open {url}"), true);
                        }
                    }
                }
                _ => {}
            },
            Overlay::DetailLoading => {
                if matches!(code, KeyCode::Esc | KeyCode::Char('q')) {
                    self.overlay = Overlay::None;
                }
            }
            Overlay::None => {}
        }
    }

    fn handle_search_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Esc => {
                self.focus = Focus::Results;
            }
            KeyCode::Enter => {
                self.focus = Focus::Results;
                let query = self.search_input.clone();
                if self.state.submit_query(&query) {
                    self.trigger_fetch();
                }
            }
            KeyCode::Backspace => {
                self.search_input.pop();
            }
            KeyCode::Char(ch) => self.search_input.push(ch),
            _ => {}
        }
    }

    fn handle_filter_key(&mut self, code: KeyCode, modifiers: KeyModifiers) {
        match code {
            KeyCode::Esc => {
                self.focus = Focus::Results;
            }
            KeyCode::Tab | KeyCode::Down => {
                self.active_filter = (self.active_filter + 1) % FILTER_FIELDS.len();
            }
            KeyCode::BackTab | KeyCode::Up => {
                self.active_filter =
                    (self.active_filter + FILTER_FIELDS.len() - 1) % FILTER_FIELDS.len();
            }
            KeyCode::Enter => {
                self.focus = Focus::Results;
                let filters = self.build_filters();
                if self.state.apply_filters(filters) {
                    self.trigger_fetch();
                }
            }
            KeyCode::Char('u') if modifiers.contains(KeyModifiers::CONTROL) => {
                self.filter_inputs[self.active_filter].clear();
            }
            KeyCode::Char('x') if modifiers.contains(KeyModifiers::CONTROL) => {
                self.filter_inputs = Default::default();
                self.focus = Focus::Results;
                if self.state.clear_filters() {
                    self.trigger_fetch();
                }
            }
            KeyCode::Backspace => {
                self.filter_inputs[self.active_filter].pop();
            }
            KeyCode::Char(ch) => self.filter_inputs[self.active_filter].push(ch),
            _ => {}
        }
    }

    fn handle_results_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('j') | KeyCode::Down => self.select_next(),
            KeyCode::Char('k') | KeyCode::Up => self.select_prev(),
            KeyCode::Char('h') | KeyCode::Left => {
                if self.state.prev_page() {
                    self.trigger_fetch();
                }
            }
            KeyCode::Char('l') | KeyCode::Right => {
                if self.state.next_page() {
                    self.trigger_fetch();
                }
            }
            KeyCode::Char('/') => {
                self.focus = Focus::Search;
            }
            KeyCode::Char('f') => {
                self.focus = Focus::Filters;
            }
            KeyCode::Char('t') => {
                let media = self.state.media_type.toggled();
                self.request_genres(media);
                if self.state.set_media_type(media) {
                    self.trigger_fetch();
                }
            }
            KeyCode::Char('g') => {
                self.search_input.clear();
                self.filter_inputs = Default::default();
                let query_cleared = self.state.submit_query("");
                let filters_cleared = self.state.clear_filters();
                let left = self.state.leave_watchlist();
                if query_cleared || filters_cleared || left {
                    self.trigger_fetch();
                }
            }
            KeyCode::Char('w') => {
                let changed = if self.state.mode == BrowseMode::Watchlist {
                    self.state.leave_watchlist()
                } else {
                    self.state.open_watchlist()
                };
                if changed {
                    self.trigger_fetch();
                }
            }
            KeyCode::Char('p') => {
                if self.state.cycle_items_per_page() {
                    self.trigger_fetch();
                }
            }
            KeyCode::Char('r') => {
                self.trigger_fetch();
            }
            KeyCode::Char('s') => self.toggle_membership(),
            KeyCode::Char('x') => {
                if let Some(card) = self.selected_card().cloned() {
                    self.toggle_watched(card.id, None);
                }
            }
            KeyCode::Char('N') => {
                if let Some(card) = self.selected_card().cloned() {
                    if self.watchlist.get(card.id).map(|item| item.is_watched) == Some(false) {
                        self.overlay = Overlay::Notes {
                            id: card.id,
                            buffer: String::new(),
                        };
                    }
                }
            }
            KeyCode::Char('e') => self.export_csv(),
            KeyCode::Char('E') => self.export_report(),
            KeyCode::Enter => {
                if let Some(card) = self.selected_card().cloned() {
                    self.trigger_detail(card.id, card.media_type);
                }
            }
            _ => {}
        }
    }

    fn build_filters(&self) -> DiscoverFilters {
        let mut filters = DiscoverFilters::default();
        for (idx, field) in FILTER_FIELDS.iter().enumerate() {
            let value = self.filter_inputs[idx].trim();
            if value.is_empty() {
                continue;
            }
            let value = match field {
                // Genres may be typed by name; the API wants the id.
                FilterField::Genre => self.resolve_genre(value),
                _ => value.to_string(),
            };
            match field {
                FilterField::Genre => filters.genre = Some(value),
                FilterField::Year => filters.year = Some(value),
                FilterField::Rating => filters.rating = Some(value),
                FilterField::Runtime => filters.runtime = Some(value),
            }
        }
        filters
    }

    fn resolve_genre(&self, input: &str) -> String {
        if input.chars().all(|ch| ch.is_ascii_digit()) {
            return input.to_string();
        }
        let lowered = input.to_lowercase();
        if let Some(map) = self.genres.get(&self.state.media_type) {
            if let Some((id, _)) = map
                .iter()
                .find(|(_, name)| name.to_lowercase() == lowered)
            {
                return id.to_string();
            }
        }
        if let Some((id, _)) = GENRE_FALLBACK
            .iter()
            .find(|(_, name)| name.to_lowercase() == lowered)
        {
            return id.to_string();
        }
        input.to_string()
    }

    // ----- watchlist actions -----

    fn toggle_membership(&mut self) {
        let Some(card) = self.selected_card().cloned() else {
            return;
        };
        match self.watchlist.toggle_membership(card.as_new_item()) {
            Ok(Membership::Added) => {
                self.set_status(format!("Added \"{}\" to watchlist", card.title), false);
            }
            Ok(Membership::Removed) => {
                self.set_status(format!("Removed \"{}\" from watchlist", card.title), false);
            }
            Err(err) => {
                self.set_status(format!("Failed to update watchlist: {err:#}"), true);
            }
        }
        if self.state.mode == BrowseMode::Watchlist {
            self.rebuild_watchlist_cards();
        }
    }

    fn toggle_watched(&mut self, id: i64, notes: Option<String>) {
        match self.watchlist.toggle_watched(id, notes.as_deref()) {
            Ok(WatchToggle::Watched) => self.set_status("Marked as watched".to_string(), false),
            Ok(WatchToggle::Unwatched) => {
                self.set_status("Marked as unwatched".to_string(), false)
            }
            Ok(WatchToggle::NotFound) => {
                self.set_status("Not in watchlist - press s to save it first".to_string(), true)
            }
            Err(err) => self.set_status(format!("Failed to update watchlist: {err:#}"), true),
        }
        if self.state.mode == BrowseMode::Watchlist {
            self.rebuild_watchlist_cards();
        }
    }

    fn export_csv(&mut self) {
        let rows = self.watchlist.export_rows();
        match export::write_csv(std::path::Path::new(CSV_EXPORT_FILE), &rows) {
            Ok(()) => self.set_status(
                format!("Exported {} entries to {CSV_EXPORT_FILE}", rows.len()),
                false,
            ),
            Err(err) => self.set_status(format!("Export failed: {err:#}"), true),
        }
    }

    fn export_report(&mut self) {
        let rows = self.watchlist.export_rows();
        let stats = self.watchlist.stats();
        match export::write_html_report(
            std::path::Path::new(REPORT_EXPORT_FILE),
            &rows,
            &stats,
        ) {
            Ok(()) => self.set_status(
                format!("Exported report to {REPORT_EXPORT_FILE}"),
                false,
            ),
            Err(err) => self.set_status(format!("Export failed: {err:#}"), true),
        }
    }

    // ----- selection helpers -----

    fn selected_card(&self) -> Option<&Card> {
        self.list_state.selected().and_then(|idx| self.cards.get(idx))
    }

    fn select_next(&mut self) {
        if self.cards.is_empty() {
            return;
        }
        let next = match self.list_state.selected() {
            Some(idx) if idx + 1 < self.cards.len() => idx + 1,
            Some(idx) => idx,
            None => 0,
        };
        self.list_state.select(Some(next));
    }

    fn select_prev(&mut self) {
        if self.cards.is_empty() {
            return;
        }
        let prev = match self.list_state.selected() {
            Some(idx) if idx > 0 => idx - 1,
            _ => 0,
        };
        self.list_state.select(Some(prev));
    }

    fn clamp_selection(&mut self) {
        if self.cards.is_empty() {
            self.list_state.select(Some(0));
            return;
        }
        let idx = self.list_state.selected().unwrap_or(0);
        self.list_state.select(Some(idx.min(self.cards.len() - 1)));
    }

    fn set_status(&mut self, message: String, is_error: bool) {
        self.status = message;
        self.status_is_error = is_error;
    }

    // ----- rendering -----

    fn draw(&mut self, frame: &mut Frame) {
        let area = frame.size();
        frame.render_widget(
            Block::default().style(Style::default().bg(COLOR_BG)),
            area,
        );

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(5),
                Constraint::Length(3),
            ])
            .split(area);

        self.draw_header(frame, rows[0]);

        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(62), Constraint::Percentage(38)])
            .split(rows[1]);

        self.draw_results(frame, body[0]);
        self.draw_side_pane(frame, body[1]);
        self.draw_footer(frame, rows[2]);

        match &self.overlay {
            Overlay::None => {}
            Overlay::DetailLoading => self.draw_detail_loading(frame, area),
            Overlay::Detail(detail) => draw_detail(frame, area, detail),
            Overlay::Notes { buffer, .. } => draw_notes_prompt(frame, area, buffer),
        }
    }

    fn draw_header(&self, frame: &mut Frame, area: Rect) {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(area);

        let mode = Span::styled(
            format!(" {} ", self.state.mode.label()),
            Style::default()
                .fg(COLOR_BG)
                .bg(COLOR_ACCENT)
                .add_modifier(Modifier::BOLD),
        );
        let media = Span::styled(
            format!(" {} ", self.state.media_type.display_name()),
            Style::default().fg(COLOR_TEXT_PRIMARY),
        );
        let filters = if self.state.filters.is_empty() {
            Span::raw(String::new())
        } else {
            Span::styled(
                format!(" [{}] ", self.state.filters.summary()),
                Style::default().fg(COLOR_WARN),
            )
        };
        let title = Paragraph::new(Line::from(vec![mode, media, filters])).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(COLOR_BORDER_IDLE)),
        );
        frame.render_widget(title, columns[0]);

        let search_style = if self.focus == Focus::Search {
            Style::default().fg(COLOR_BORDER_FOCUSED)
        } else {
            Style::default().fg(COLOR_BORDER_IDLE)
        };
        let search_text = if self.search_input.is_empty() && self.focus != Focus::Search {
            Span::styled("press / to search", Style::default().fg(COLOR_TEXT_SECONDARY))
        } else {
            Span::styled(
                self.search_input.clone(),
                Style::default().fg(COLOR_TEXT_PRIMARY),
            )
        };
        let search = Paragraph::new(Line::from(search_text)).block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Search ")
                .border_style(search_style),
        );
        frame.render_widget(search, columns[1]);
    }

    fn draw_results(&mut self, frame: &mut Frame, area: Rect) {
        let border_style = if self.focus == Focus::Results {
            Style::default().fg(COLOR_BORDER_FOCUSED)
        } else {
            Style::default().fg(COLOR_BORDER_IDLE)
        };

        let items: Vec<ListItem> = if self.cards.is_empty() {
            let message = if self.gate.is_busy() {
                format!("{} Loading...", SPINNER_FRAMES[self.spinner_frame])
            } else if self.state.mode == BrowseMode::Watchlist {
                "Watchlist is empty. Press s on a result to save it.".to_string()
            } else {
                "No results found.".to_string()
            };
            vec![ListItem::new(Line::from(Span::styled(
                message,
                Style::default().fg(COLOR_TEXT_SECONDARY),
            )))]
        } else {
            self.cards
                .iter()
                .map(|card| self.card_row(card, area.width.saturating_sub(4) as usize))
                .collect()
        };

        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!(
                        " Results ({} of {}) ",
                        self.cards.len(),
                        self.state.total_results
                    ))
                    .border_style(border_style)
                    .style(Style::default().bg(COLOR_PANEL_BG)),
            )
            .highlight_style(
                Style::default()
                    .bg(COLOR_PANEL_SELECTED_BG)
                    .add_modifier(Modifier::BOLD),
            );

        frame.render_stateful_widget(list, area, &mut self.list_state);
    }

    fn card_row(&self, card: &Card, width: usize) -> ListItem<'static> {
        let saved = self.watchlist.contains(card.id);
        let marker = match card.watched {
            Some(true) => Span::styled("[watched] ", Style::default().fg(COLOR_SUCCESS)),
            Some(false) => Span::styled("[to watch] ", Style::default().fg(COLOR_WARN)),
            None if saved => Span::styled("[saved] ", Style::default().fg(COLOR_ACCENT)),
            None => Span::raw(""),
        };
        let title = truncate_to_width(&card.title, width.saturating_sub(24));
        let line = Line::from(vec![
            marker,
            Span::styled(title, Style::default().fg(COLOR_TEXT_PRIMARY)),
            Span::styled(
                format!("  ({})", card.year),
                Style::default().fg(COLOR_TEXT_SECONDARY),
            ),
            Span::styled(
                format!("  * {}", card.rating),
                Style::default().fg(COLOR_WARN),
            ),
        ]);
        ListItem::new(line)
    }

    fn draw_side_pane(&self, frame: &mut Frame, area: Rect) {
        let mut lines: Vec<Line> = Vec::new();

        if let Some(card) = self.selected_card() {
            lines.push(Line::from(Span::styled(
                card.title.clone(),
                Style::default()
                    .fg(COLOR_TEXT_PRIMARY)
                    .add_modifier(Modifier::BOLD),
            )));
            lines.push(Line::from(Span::styled(
                format!("{} | {} | * {}", card.year, card.genre, card.rating),
                Style::default().fg(COLOR_TEXT_SECONDARY),
            )));
            if !card.added_at.is_empty() {
                lines.push(Line::from(Span::styled(
                    format!("Added {}", card.added_at),
                    Style::default().fg(COLOR_TEXT_SECONDARY),
                )));
            }
            if !card.notes.is_empty() {
                lines.push(Line::from(Span::styled(
                    format!("Notes: {}", card.notes),
                    Style::default().fg(COLOR_SUCCESS),
                )));
            }
            lines.push(Line::from(""));
            let wrap_width = area.width.saturating_sub(4).max(16) as usize;
            for piece in wrap(&card.overview, wrap_width) {
                lines.push(Line::from(Span::styled(
                    piece.into_owned(),
                    Style::default().fg(COLOR_TEXT_PRIMARY),
                )));
            }
        }

        if self.state.mode == BrowseMode::Watchlist {
            let stats = self.watchlist.stats();
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                format!(
                    "{} saved | {} watched | {} to watch",
                    stats.total_items, stats.watched_items, stats.unwatched_items
                ),
                Style::default().fg(COLOR_ACCENT),
            )));
            if stats.average_rating > 0.0 {
                lines.push(Line::from(Span::styled(
                    format!("Average rating {:.1}", stats.average_rating),
                    Style::default().fg(COLOR_TEXT_SECONDARY),
                )));
            }
            if !stats.top_genres.is_empty() {
                let genres = stats
                    .top_genres
                    .iter()
                    .map(|(name, count)| format!("{name} ({count})"))
                    .collect::<Vec<_>>()
                    .join(", ");
                lines.push(Line::from(Span::styled(
                    format!("Top genres: {genres}"),
                    Style::default().fg(COLOR_TEXT_SECONDARY),
                )));
            }
        }

        if self.focus == Focus::Filters {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                "Filters (Tab to move, Enter to apply, Ctrl-x to clear)",
                Style::default().fg(COLOR_ACCENT),
            )));
            for (idx, field) in FILTER_FIELDS.iter().enumerate() {
                let active = idx == self.active_filter;
                let style = if active {
                    Style::default()
                        .fg(COLOR_BORDER_FOCUSED)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(COLOR_TEXT_SECONDARY)
                };
                let cursor = if active { "_" } else { "" };
                lines.push(Line::from(Span::styled(
                    format!("{}: {}{}", field.label(), self.filter_inputs[idx], cursor),
                    style,
                )));
            }
        }

        let pane = Paragraph::new(Text::from(lines)).wrap(Wrap { trim: false }).block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Details ")
                .border_style(Style::default().fg(if self.focus == Focus::Filters {
                    COLOR_BORDER_FOCUSED
                } else {
                    COLOR_BORDER_IDLE
                }))
                .style(Style::default().bg(COLOR_PANEL_BG)),
        );
        frame.render_widget(pane, area);
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let spinner = if self.gate.is_busy() || self.detail_gate.is_busy() {
            format!("{} ", SPINNER_FRAMES[self.spinner_frame])
        } else {
            String::new()
        };
        let status_style = if self.status_is_error {
            Style::default().fg(COLOR_ERROR)
        } else {
            Style::default().fg(COLOR_TEXT_SECONDARY)
        };
        let left = Span::styled(format!("{spinner}{}", self.status), status_style);
        let right = Span::styled(
            format!(
                "page {}/{} | {} per page | {} ",
                self.state.page, self.state.total_pages, self.state.items_per_page, self.config_path
            ),
            Style::default().fg(COLOR_TEXT_SECONDARY),
        );

        let footer = Paragraph::new(Line::from(vec![left]))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(" j/k move | h/l page | / search | f filter | t movie/tv | w watchlist | s save | x watched | e/E export | q quit ")
                    .border_style(Style::default().fg(COLOR_BORDER_IDLE)),
            );
        frame.render_widget(footer, area);

        let width = right.content.width() as u16;
        if area.width > width + 2 {
            let right_area = Rect {
                x: area.x + area.width - width - 1,
                y: area.y + 1,
                width,
                height: 1,
            };
            frame.render_widget(Paragraph::new(Line::from(vec![right])), right_area);
        }
    }

    fn draw_detail_loading(&self, frame: &mut Frame, area: Rect) {
        let popup = centered_rect(40, 20, area);
        frame.render_widget(Clear, popup);
        let body = Paragraph::new(format!(
            "{} Loading details...",
            SPINNER_FRAMES[self.spinner_frame]
        ))
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(COLOR_BORDER_FOCUSED))
                .style(Style::default().bg(COLOR_PANEL_BG)),
        );
        frame.render_widget(body, popup);
    }
}

fn draw_detail(frame: &mut Frame, area: Rect, detail: &ContentDetail) {
    let popup = centered_rect(72, 80, area);
    frame.render_widget(Clear, popup);

    let mut lines = vec![
        Line::from(Span::styled(
            detail.title.clone(),
            Style::default()
                .fg(COLOR_TEXT_PRIMARY)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];
    for (label, value) in [
        ("Year", &detail.year),
        ("Rated", &detail.rated),
        ("Released", &detail.released),
        ("Runtime", &detail.runtime),
        ("Genre", &detail.genre),
        ("Director", &detail.director),
        ("Writer", &detail.writer),
        ("Actors", &detail.actors),
        ("Language", &detail.language),
        ("Country", &detail.country),
        ("Awards", &detail.awards),
        ("IMDB Rating", &detail.imdb_rating),
        ("Box Office", &detail.box_office),
    ] {
        lines.push(Line::from(vec![
            Span::styled(
                format!("{label}: "),
                Style::default()
                    .fg(COLOR_TEXT_SECONDARY)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(value.clone(), Style::default().fg(COLOR_TEXT_PRIMARY)),
        ]));
    }
    lines.push(Line::from(""));
    let wrap_width = popup.width.saturating_sub(4).max(20) as usize;
    for piece in wrap(&detail.plot, wrap_width) {
        lines.push(Line::from(Span::styled(
            piece.into_owned(),
            Style::default().fg(COLOR_TEXT_PRIMARY),
        )));
    }

    let body = Paragraph::new(Text::from(lines)).wrap(Wrap { trim: false }).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Details (o open page, Esc close) ")
            .border_style(Style::default().fg(COLOR_BORDER_FOCUSED))
            .style(Style::default().bg(COLOR_PANEL_BG)),
    );
    frame.render_widget(body, popup);
}

fn draw_notes_prompt(frame: &mut Frame, area: Rect, buffer: &str) {
    let popup = centered_rect(50, 20, area);
    frame.render_widget(Clear, popup);
    let body = Paragraph::new(Text::from(vec![
        Line::from(Span::styled(
            "Notes for this title (Enter to mark watched, Esc to cancel)",
            Style::default().fg(COLOR_TEXT_SECONDARY),
        )),
        Line::from(""),
        Line::from(Span::styled(
            format!("{buffer}_"),
            Style::default().fg(COLOR_TEXT_PRIMARY),
        )),
    ]))
    .wrap(Wrap { trim: false })
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Mark watched ")
            .border_style(Style::default().fg(COLOR_BORDER_FOCUSED))
            .style(Style::default().bg(COLOR_PANEL_BG)),
    );
    frame.render_widget(body, popup);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);
    horizontal[1]
}

fn truncate_to_width(input: &str, max_width: usize) -> String {
    if input.width() <= max_width {
        return input.to_string();
    }
    let mut out = String::new();
    let mut used = 0usize;
    for ch in input.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w + 1 > max_width {
            break;
        }
        used += w;
        out.push(ch);
    }
    out.push('\u{2026}');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_keeps_short_strings() {
        assert_eq!(truncate_to_width("Heat", 20), "Heat");
    }

    #[test]
    fn truncate_appends_ellipsis() {
        let out = truncate_to_width("A very long movie title indeed", 10);
        assert!(out.ends_with('\u{2026}'));
        assert!(out.width() <= 10);
    }

    #[test]
    fn genre_name_falls_back_to_static_table() {
        let empty = HashMap::new();
        assert_eq!(genre_name(18, &empty), "Drama");
        assert_eq!(genre_name(999_999, &empty), "Unknown");
    }
}
