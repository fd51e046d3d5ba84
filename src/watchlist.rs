use std::collections::HashMap;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::{pages_for, MediaType};
use crate::storage::{Store, WATCHLIST_KEY};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WatchlistItem {
    pub id: i64,
    pub title: String,
    pub poster: String,
    pub media_type: MediaType,
    #[serde(default)]
    pub release_date: String,
    #[serde(default)]
    pub genre: String,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub overview: String,
    pub added_at: DateTime<Utc>,
    pub is_watched: bool,
    pub watched_at: Option<DateTime<Utc>>,
    pub user_notes: String,
}

// Metadata captured at the moment an entry is added; everything else is
// stamped by the store.
#[derive(Debug, Clone, Default)]
pub struct NewItem {
    pub id: i64,
    pub title: String,
    pub poster: String,
    pub media_type: MediaType,
    pub release_date: String,
    pub genre: String,
    pub rating: f64,
    pub overview: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Membership {
    Added,
    Removed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchToggle {
    Watched,
    Unwatched,
    NotFound,
}

#[derive(Debug, Clone)]
pub struct WatchlistPage {
    pub items: Vec<WatchlistItem>,
    pub page: usize,
    pub total_pages: usize,
    pub total_results: usize,
}

#[derive(Debug, Clone)]
pub struct ExportRow {
    pub title: String,
    pub media_type: MediaType,
    pub status: &'static str,
    pub added_at: String,
    pub watched_at: String,
    pub notes: String,
    pub release_date: String,
    pub genre: String,
    pub rating: f64,
    pub overview: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WatchlistStats {
    pub total_items: usize,
    pub watched_items: usize,
    pub unwatched_items: usize,
    pub average_rating: f64,
    pub top_genres: Vec<(String, usize)>,
}

// Records written before watched-state tracking existed carry only the
// identity fields; the watched fields deserialize as None and are
// defaulted by the one-time upgrade below.
#[derive(Debug, Deserialize)]
struct StoredItem {
    id: i64,
    #[serde(default)]
    title: String,
    #[serde(default)]
    poster: String,
    #[serde(default)]
    media_type: MediaType,
    #[serde(default)]
    release_date: String,
    #[serde(default)]
    genre: String,
    #[serde(default)]
    rating: f64,
    #[serde(default)]
    overview: String,
    #[serde(default)]
    added_at: Option<DateTime<Utc>>,
    #[serde(default)]
    is_watched: Option<bool>,
    #[serde(default)]
    watched_at: Option<DateTime<Utc>>,
    #[serde(default)]
    user_notes: Option<String>,
}

impl StoredItem {
    fn upgrade(self, now: DateTime<Utc>) -> (WatchlistItem, bool) {
        let mut changed =
            self.added_at.is_none() || self.is_watched.is_none() || self.user_notes.is_none();

        let is_watched = self.is_watched.unwrap_or(false);
        // watched_at is Some iff is_watched; repair either direction.
        let watched_at = match (is_watched, self.watched_at) {
            (true, Some(at)) => Some(at),
            (true, None) => {
                changed = true;
                Some(now)
            }
            (false, Some(_)) => {
                changed = true;
                None
            }
            (false, None) => None,
        };

        let item = WatchlistItem {
            id: self.id,
            title: self.title,
            poster: self.poster,
            media_type: self.media_type,
            release_date: self.release_date,
            genre: self.genre,
            rating: self.rating,
            overview: self.overview,
            added_at: self.added_at.unwrap_or(now),
            is_watched,
            watched_at,
            user_notes: self.user_notes.unwrap_or_default(),
        };
        (item, changed)
    }
}

#[derive(Debug, Clone)]
pub struct Watchlist {
    store: Store,
    items: Vec<WatchlistItem>,
}

impl Watchlist {
    // Reads the persisted collection, upgrading legacy records in place.
    // An absent or unparseable payload degrades to an empty list rather
    // than failing startup.
    pub fn load(store: Store) -> Watchlist {
        let raw = match store.get(WATCHLIST_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                return Watchlist {
                    store,
                    items: Vec::new(),
                }
            }
            Err(_) => {
                return Watchlist {
                    store,
                    items: Vec::new(),
                }
            }
        };

        let stored: Vec<StoredItem> = match serde_json::from_str(&raw) {
            Ok(stored) => stored,
            Err(_) => Vec::new(),
        };

        let now = Utc::now();
        let mut changed = false;
        let mut items = Vec::with_capacity(stored.len());
        for record in stored {
            let (item, upgraded) = record.upgrade(now);
            changed = changed || upgraded;
            items.push(item);
        }

        let list = Watchlist { store, items };
        if changed {
            // Persist the upgraded collection once; re-running the load on
            // an already-migrated payload is a no-op.
            let _ = list.persist();
        }
        list
    }

    pub fn items(&self) -> &[WatchlistItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, id: i64) -> bool {
        self.items.iter().any(|item| item.id == id)
    }

    pub fn get(&self, id: i64) -> Option<&WatchlistItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn toggle_membership(&mut self, candidate: NewItem) -> Result<Membership> {
        if let Some(pos) = self.items.iter().position(|item| item.id == candidate.id) {
            self.items.remove(pos);
            self.persist()?;
            return Ok(Membership::Removed);
        }

        self.items.push(WatchlistItem {
            id: candidate.id,
            title: candidate.title,
            poster: candidate.poster,
            media_type: candidate.media_type,
            release_date: candidate.release_date,
            genre: candidate.genre,
            rating: candidate.rating,
            overview: candidate.overview,
            added_at: Utc::now(),
            is_watched: false,
            watched_at: None,
            user_notes: String::new(),
        });
        self.persist()?;
        Ok(Membership::Added)
    }

    pub fn toggle_watched(&mut self, id: i64, notes: Option<&str>) -> Result<WatchToggle> {
        let Some(item) = self.items.iter_mut().find(|item| item.id == id) else {
            return Ok(WatchToggle::NotFound);
        };

        let toggle = if item.is_watched {
            item.is_watched = false;
            item.watched_at = None;
            item.user_notes.clear();
            WatchToggle::Unwatched
        } else {
            item.is_watched = true;
            item.watched_at = Some(Utc::now());
            item.user_notes = notes.unwrap_or_default().to_string();
            WatchToggle::Watched
        };

        self.persist()?;
        Ok(toggle)
    }

    pub fn paginate(&self, page: usize, page_size: usize) -> WatchlistPage {
        let page_size = page_size.max(1);
        let total_results = self.items.len();
        let total_pages = pages_for(total_results, page_size);
        let page = page.clamp(1, total_pages);

        let start = (page - 1) * page_size;
        let items = self
            .items
            .iter()
            .skip(start)
            .take(page_size)
            .cloned()
            .collect();

        WatchlistPage {
            items,
            page,
            total_pages,
            total_results,
        }
    }

    pub fn export_rows(&self) -> Vec<ExportRow> {
        self.items
            .iter()
            .map(|item| ExportRow {
                title: item.title.clone(),
                media_type: item.media_type,
                status: if item.is_watched {
                    "Watched"
                } else {
                    "Unwatched"
                },
                added_at: item.added_at.format("%Y-%m-%d").to_string(),
                watched_at: item
                    .watched_at
                    .map(|at| at.format("%Y-%m-%d").to_string())
                    .unwrap_or_default(),
                notes: item.user_notes.clone(),
                release_date: item.release_date.clone(),
                genre: item.genre.clone(),
                rating: item.rating,
                overview: item.overview.clone(),
            })
            .collect()
    }

    pub fn stats(&self) -> WatchlistStats {
        let mut stats = WatchlistStats {
            total_items: self.items.len(),
            ..WatchlistStats::default()
        };

        let mut total_rating = 0.0;
        let mut rating_count = 0usize;
        let mut genre_count: HashMap<String, usize> = HashMap::new();

        for item in &self.items {
            if item.is_watched {
                stats.watched_items += 1;
            } else {
                stats.unwatched_items += 1;
            }

            if item.rating > 0.0 {
                total_rating += item.rating;
                rating_count += 1;
            }

            for genre in item.genre.split(',') {
                let genre = genre.trim();
                if !genre.is_empty() {
                    *genre_count.entry(genre.to_string()).or_default() += 1;
                }
            }
        }

        if rating_count > 0 {
            stats.average_rating = total_rating / rating_count as f64;
        }

        let mut genres: Vec<(String, usize)> = genre_count.into_iter().collect();
        genres.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        genres.truncate(5);
        stats.top_genres = genres;

        stats
    }

    fn persist(&self) -> Result<()> {
        let payload =
            serde_json::to_string(&self.items).context("watchlist: serialize collection")?;
        self.store
            .put(WATCHLIST_KEY, &payload)
            .context("watchlist: persist collection")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{Options, Store};
    use tempfile::{tempdir, TempDir};

    fn open_store() -> (TempDir, Store) {
        let dir = tempdir().unwrap();
        let store = Store::open(Options {
            path: Some(dir.path().join("state.db")),
        })
        .unwrap();
        (dir, store)
    }

    fn candidate(id: i64, title: &str) -> NewItem {
        NewItem {
            id,
            title: title.to_string(),
            poster: format!("/poster-{id}.jpg"),
            media_type: MediaType::Movie,
            ..NewItem::default()
        }
    }

    #[test]
    fn toggle_membership_alternates() {
        let (_dir, store) = open_store();
        let mut list = Watchlist::load(store);

        assert_eq!(
            list.toggle_membership(candidate(42, "Heat")).unwrap(),
            Membership::Added
        );
        assert!(list.contains(42));
        let added = list.get(42).unwrap();
        assert!(!added.is_watched);
        assert!(added.watched_at.is_none());
        assert!(added.user_notes.is_empty());

        assert_eq!(
            list.toggle_membership(candidate(42, "Heat")).unwrap(),
            Membership::Removed
        );
        assert!(!list.contains(42));
        assert!(list.is_empty());
    }

    #[test]
    fn membership_survives_reload() {
        let (_dir, store) = open_store();
        {
            let mut list = Watchlist::load(store.clone());
            list.toggle_membership(candidate(7, "Ronin")).unwrap();
        }
        let list = Watchlist::load(store);
        assert!(list.contains(7));
        assert_eq!(list.get(7).unwrap().title, "Ronin");
    }

    #[test]
    fn toggle_watched_round_trip_clears_fields() {
        let (_dir, store) = open_store();
        let mut list = Watchlist::load(store);
        list.toggle_membership(candidate(1, "Alien")).unwrap();

        assert_eq!(
            list.toggle_watched(1, Some("great")).unwrap(),
            WatchToggle::Watched
        );
        let item = list.get(1).unwrap();
        assert!(item.is_watched);
        assert!(item.watched_at.is_some());
        assert_eq!(item.user_notes, "great");

        assert_eq!(list.toggle_watched(1, None).unwrap(), WatchToggle::Unwatched);
        let item = list.get(1).unwrap();
        assert!(!item.is_watched);
        assert!(item.watched_at.is_none());
        assert!(item.user_notes.is_empty());
    }

    #[test]
    fn toggle_watched_unknown_id_is_noop() {
        let (_dir, store) = open_store();
        let mut list = Watchlist::load(store);
        list.toggle_membership(candidate(1, "Alien")).unwrap();
        let before = list.items().to_vec();

        assert_eq!(list.toggle_watched(99, None).unwrap(), WatchToggle::NotFound);
        assert_eq!(list.items(), before.as_slice());
    }

    #[test]
    fn paginate_splits_and_clamps() {
        let (_dir, store) = open_store();
        let mut list = Watchlist::load(store);
        for id in 0..25 {
            list.toggle_membership(candidate(id, &format!("Movie {id}")))
                .unwrap();
        }

        let first = list.paginate(1, 20);
        assert_eq!(first.items.len(), 20);
        assert_eq!(first.total_pages, 2);
        assert_eq!(first.total_results, 25);
        assert_eq!(first.items[0].id, 0);

        let second = list.paginate(2, 20);
        assert_eq!(second.items.len(), 5);
        assert_eq!(second.items[0].id, 20);

        // Out-of-range pages clamp instead of returning nothing.
        let clamped = list.paginate(9, 20);
        assert_eq!(clamped.page, 2);
        assert_eq!(clamped.items.len(), 5);
    }

    #[test]
    fn paginate_empty_reports_one_page() {
        let (_dir, store) = open_store();
        let list = Watchlist::load(store);
        let page = list.paginate(1, 20);
        assert!(page.items.is_empty());
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.total_results, 0);
    }

    #[test]
    fn export_rows_reflect_watched_state() {
        let (_dir, store) = open_store();
        let mut list = Watchlist::load(store);
        list.toggle_membership(candidate(5, "Stalker")).unwrap();
        list.toggle_watched(5, Some("great")).unwrap();

        let rows = list.export_rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].title, "Stalker");
        assert_eq!(rows[0].status, "Watched");
        assert_eq!(rows[0].notes, "great");
        assert!(!rows[0].watched_at.is_empty());
    }

    #[test]
    fn legacy_records_upgrade_in_place() {
        let (_dir, store) = open_store();
        store
            .put(
                WATCHLIST_KEY,
                r#"[{"id": 12, "title": "Old Entry", "poster": "/old.jpg", "media_type": "tv"}]"#,
            )
            .unwrap();

        let list = Watchlist::load(store.clone());
        let item = list.get(12).unwrap();
        assert_eq!(item.title, "Old Entry");
        assert_eq!(item.media_type, MediaType::Tv);
        assert!(!item.is_watched);
        assert!(item.watched_at.is_none());
        assert!(item.user_notes.is_empty());

        // Upgrade was persisted with the full schema.
        let raw = store.get(WATCHLIST_KEY).unwrap().unwrap();
        assert!(raw.contains("added_at"));

        // Re-running the migration is a field-for-field no-op.
        let again = Watchlist::load(store);
        assert_eq!(again.items(), list.items());
    }

    #[test]
    fn watched_without_timestamp_is_repaired() {
        let (_dir, store) = open_store();
        store
            .put(
                WATCHLIST_KEY,
                r#"[{"id": 3, "title": "Odd", "poster": "", "media_type": "movie", "is_watched": true}]"#,
            )
            .unwrap();
        let list = Watchlist::load(store);
        let item = list.get(3).unwrap();
        assert!(item.is_watched);
        assert!(item.watched_at.is_some());
    }

    #[test]
    fn malformed_payload_degrades_to_empty() {
        let (_dir, store) = open_store();
        store.put(WATCHLIST_KEY, "{not json").unwrap();
        let list = Watchlist::load(store);
        assert!(list.is_empty());
    }

    #[test]
    fn stats_counts_and_top_genres() {
        let (_dir, store) = open_store();
        let mut list = Watchlist::load(store);
        for (id, genre, rating) in [
            (1, "Crime, Drama", 8.0),
            (2, "Drama", 7.0),
            (3, "Comedy", 0.0),
        ] {
            let mut item = candidate(id, &format!("Item {id}"));
            item.genre = genre.to_string();
            item.rating = rating;
            list.toggle_membership(item).unwrap();
        }
        list.toggle_watched(1, None).unwrap();

        let stats = list.stats();
        assert_eq!(stats.total_items, 3);
        assert_eq!(stats.watched_items, 1);
        assert_eq!(stats.unwatched_items, 2);
        assert!((stats.average_rating - 7.5).abs() < f64::EPSILON);
        assert_eq!(stats.top_genres[0], ("Drama".to_string(), 2));
    }
}
