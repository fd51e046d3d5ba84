use anyhow::{Context, Result};
use rand::seq::SliceRandom;
use std::sync::Arc;

use crate::catalog::{
    self, ContentDetail, ContentSummary, DiscoverFilters, Genre, MediaType, Page,
};

pub trait CatalogService: Send + Sync {
    fn trending(
        &self,
        media: MediaType,
        page: usize,
        page_size: usize,
    ) -> Result<Page<ContentSummary>>;
    fn search(
        &self,
        query: &str,
        media: MediaType,
        page: usize,
        page_size: usize,
    ) -> Result<Page<ContentSummary>>;
    fn discover(
        &self,
        media: MediaType,
        filters: DiscoverFilters,
        page: usize,
        page_size: usize,
    ) -> Result<Page<ContentSummary>>;
    fn genres(&self, media: MediaType) -> Result<Vec<Genre>>;
    fn detail(&self, id: i64, media: MediaType) -> Result<ContentDetail>;
}

pub struct HttpCatalogService {
    client: Arc<catalog::Client>,
}

impl HttpCatalogService {
    pub fn new(client: Arc<catalog::Client>) -> Self {
        Self { client }
    }
}

impl CatalogService for HttpCatalogService {
    fn trending(
        &self,
        media: MediaType,
        page: usize,
        page_size: usize,
    ) -> Result<Page<ContentSummary>> {
        self.client
            .trending(media, page, page_size)
            .context("fetch trending listing")
    }

    fn search(
        &self,
        query: &str,
        media: MediaType,
        page: usize,
        page_size: usize,
    ) -> Result<Page<ContentSummary>> {
        self.client
            .search(query, media, page, page_size)
            .context("search catalog")
    }

    fn discover(
        &self,
        media: MediaType,
        filters: DiscoverFilters,
        page: usize,
        page_size: usize,
    ) -> Result<Page<ContentSummary>> {
        self.client
            .discover(media, filters, page, page_size)
            .context("discover listing")
    }

    fn genres(&self, media: MediaType) -> Result<Vec<Genre>> {
        self.client.genres(media).context("fetch genre list")
    }

    fn detail(&self, id: i64, media: MediaType) -> Result<ContentDetail> {
        self.client
            .detail(id, media)
            .with_context(|| format!("fetch detail for id {id}"))
    }
}

#[derive(Default)]
pub struct MockCatalogService;

impl CatalogService for MockCatalogService {
    fn trending(
        &self,
        media: MediaType,
        _page: usize,
        page_size: usize,
    ) -> Result<Page<ContentSummary>> {
        Ok(mock_page(media, page_size))
    }

    fn search(
        &self,
        _query: &str,
        media: MediaType,
        _page: usize,
        page_size: usize,
    ) -> Result<Page<ContentSummary>> {
        Ok(mock_page(media, page_size))
    }

    fn discover(
        &self,
        media: MediaType,
        _filters: DiscoverFilters,
        _page: usize,
        page_size: usize,
    ) -> Result<Page<ContentSummary>> {
        Ok(mock_page(media, page_size))
    }

    fn genres(&self, _media: MediaType) -> Result<Vec<Genre>> {
        Ok(vec![
            Genre {
                id: 18,
                name: "Drama".into(),
            },
            Genre {
                id: 35,
                name: "Comedy".into(),
            },
        ])
    }

    fn detail(&self, id: i64, _media: MediaType) -> Result<ContentDetail> {
        Ok(ContentDetail {
            title: format!("Sample title {id}"),
            plot: "Sample content provided for offline browsing.".into(),
            ..ContentDetail::default()
        })
    }
}

fn mock_page(media: MediaType, page_size: usize) -> Page<ContentSummary> {
    let mut rng = rand::thread_rng();
    let mut results = vec![
        mock_summary(1, media, "Welcome to Reelix", "2024-01-01"),
        mock_summary(2, media, "Sample results", "2023-06-15"),
    ];
    results.shuffle(&mut rng);

    Page {
        total_pages: catalog::pages_for(results.len(), page_size),
        total_results: results.len(),
        results,
    }
}

fn mock_summary(id: i64, media: MediaType, title: &str, date: &str) -> ContentSummary {
    let (title_field, name_field) = match media {
        MediaType::Movie => (Some(title.to_string()), None),
        MediaType::Tv => (None, Some(title.to_string())),
    };
    ContentSummary {
        id,
        title: title_field,
        name: name_field,
        poster_path: None,
        release_date: Some(date.to_string()),
        first_air_date: None,
        vote_average: Some(7.5),
        genre_ids: vec![18],
        overview: "Sample content provided for offline browsing.".into(),
    }
}
