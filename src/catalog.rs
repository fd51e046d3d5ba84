use std::time::Duration;

use reqwest::blocking::Client as HttpClient;
use reqwest::header::USER_AGENT;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8080";

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog: invalid base url: {0}")]
    BaseUrl(#[from] url::ParseError),
    #[error("catalog: request to {url} failed with status {status}")]
    Status { status: StatusCode, url: String },
    #[error("catalog: transport failure: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("catalog: decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("catalog: user agent required")]
    UserAgentRequired,
}

#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    pub base_url: Option<String>,
    pub user_agent: String,
    pub timeout: Option<Duration>,
    pub http_client: Option<HttpClient>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    #[default]
    Movie,
    Tv,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Movie => "movie",
            MediaType::Tv => "tv",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            MediaType::Movie => "Movies",
            MediaType::Tv => "TV Shows",
        }
    }

    pub fn toggled(&self) -> MediaType {
        match self {
            MediaType::Movie => MediaType::Tv,
            MediaType::Tv => MediaType::Movie,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentSummary {
    pub id: i64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub first_air_date: Option<String>,
    #[serde(default)]
    pub vote_average: Option<f64>,
    #[serde(default)]
    pub genre_ids: Vec<i64>,
    #[serde(default)]
    pub overview: String,
}

impl ContentSummary {
    pub fn display_title(&self) -> &str {
        self.title
            .as_deref()
            .or(self.name.as_deref())
            .filter(|s| !s.is_empty())
            .unwrap_or("Untitled")
    }

    pub fn date(&self) -> Option<&str> {
        self.release_date
            .as_deref()
            .or(self.first_air_date.as_deref())
            .filter(|s| !s.is_empty())
    }

    pub fn year(&self) -> Option<&str> {
        self.date().map(|d| d.split('-').next().unwrap_or(d))
    }

    pub fn rating_display(&self) -> String {
        match self.vote_average {
            Some(avg) => format!("{avg:.1}"),
            None => "N/A".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Genre {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Default)]
pub struct Page<T> {
    pub results: Vec<T>,
    pub total_pages: usize,
    pub total_results: usize,
}

// The proxy answers either with a TMDB-style envelope or, on older
// endpoints, with a bare array of results.
#[derive(Deserialize)]
#[serde(untagged)]
enum ListingPayload<T> {
    Envelope {
        results: Vec<T>,
        #[serde(default)]
        total_pages: Option<usize>,
        #[serde(default)]
        total_results: Option<usize>,
    },
    Bare(Vec<T>),
}

fn normalize_listing<T>(payload: ListingPayload<T>, page_size: usize) -> Page<T> {
    let (results, total_pages, total_results) = match payload {
        ListingPayload::Envelope {
            results,
            total_pages,
            total_results,
        } => (results, total_pages, total_results),
        ListingPayload::Bare(results) => (results, None, None),
    };

    let total_results = total_results.unwrap_or(results.len());
    let total_pages = total_pages.unwrap_or_else(|| pages_for(total_results, page_size));

    Page {
        results,
        total_pages: total_pages.max(1),
        total_results,
    }
}

pub fn pages_for(total_results: usize, page_size: usize) -> usize {
    let size = page_size.max(1);
    (total_results.div_ceil(size)).max(1)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum GenresPayload {
    Envelope { genres: Vec<Genre> },
    Bare(Vec<Genre>),
}

#[derive(Debug, Clone, Default)]
pub struct DiscoverFilters {
    pub genre: Option<String>,
    pub year: Option<String>,
    pub rating: Option<String>,
    pub runtime: Option<String>,
    pub sort_by: Option<String>,
}

impl DiscoverFilters {
    pub fn is_empty(&self) -> bool {
        self.genre.is_none()
            && self.year.is_none()
            && self.rating.is_none()
            && self.runtime.is_none()
            && self.sort_by.is_none()
    }

    pub fn clear(&mut self) {
        *self = DiscoverFilters::default();
    }

    fn into_params(self) -> Vec<(String, String)> {
        let mut params = Vec::new();
        if let Some(genre) = self.genre {
            params.push(("genre".into(), genre));
        }
        if let Some(year) = self.year {
            params.push(("year".into(), year));
        }
        if let Some(rating) = self.rating {
            params.push(("rating".into(), rating));
        }
        if let Some(runtime) = self.runtime {
            params.push(("runtime".into(), runtime));
        }
        if let Some(sort_by) = self.sort_by {
            params.push(("sort_by".into(), sort_by));
        }
        params
    }

    pub fn summary(&self) -> String {
        let mut parts = Vec::new();
        if let Some(genre) = &self.genre {
            parts.push(format!("genre {genre}"));
        }
        if let Some(year) = &self.year {
            parts.push(format!("year {year}"));
        }
        if let Some(rating) = &self.rating {
            parts.push(format!("rating {rating}+"));
        }
        if let Some(runtime) = &self.runtime {
            parts.push(format!("runtime {runtime}"));
        }
        parts.join(", ")
    }
}

// Raw `/api/movie/{id}` body: the proxy forwards both upstream documents
// untouched, so each side stays loosely typed until the merge.
#[derive(Debug, Clone, Deserialize)]
pub struct DetailPayload {
    #[serde(rename = "TMDBData", default)]
    pub tmdb: Value,
    #[serde(rename = "OMDBData", default)]
    pub omdb: Value,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContentDetail {
    pub title: String,
    pub year: String,
    pub rated: String,
    pub released: String,
    pub runtime: String,
    pub genre: String,
    pub director: String,
    pub writer: String,
    pub actors: String,
    pub plot: String,
    pub language: String,
    pub country: String,
    pub awards: String,
    pub imdb_rating: String,
    pub box_office: String,
    pub poster_path: Option<String>,
    pub imdb_id: Option<String>,
    pub homepage: Option<String>,
}

fn str_field(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty() && *s != "N/A")
        .map(str::to_string)
}

fn year_of(date: &str) -> Option<String> {
    let year = date.split('-').next().unwrap_or_default();
    if year.len() == 4 {
        Some(year.to_string())
    } else {
        None
    }
}

impl ContentDetail {
    // OMDB wins for descriptive text, TMDB fills the gaps; mirrors the
    // precedence the detail endpoint consumers rely on.
    pub fn from_payload(payload: &DetailPayload) -> Self {
        let tmdb = &payload.tmdb;
        let omdb = &payload.omdb;

        let tmdb_title = str_field(tmdb, "title").or_else(|| str_field(tmdb, "name"));
        let tmdb_date =
            str_field(tmdb, "release_date").or_else(|| str_field(tmdb, "first_air_date"));

        let title = str_field(omdb, "Title")
            .or(tmdb_title)
            .unwrap_or_else(|| "Unknown Title".to_string());
        let year = str_field(omdb, "Year")
            .or_else(|| tmdb_date.as_deref().and_then(year_of))
            .unwrap_or_else(|| "N/A".to_string());
        let released = str_field(omdb, "Released")
            .or_else(|| tmdb_date.clone())
            .unwrap_or_else(|| "N/A".to_string());
        let runtime = str_field(omdb, "Runtime")
            .or_else(|| {
                tmdb.get("runtime")
                    .and_then(Value::as_i64)
                    .filter(|minutes| *minutes > 0)
                    .map(|minutes| format!("{minutes} min"))
            })
            .unwrap_or_else(|| "N/A".to_string());
        let genre = str_field(omdb, "Genre")
            .or_else(|| {
                tmdb.get("genres").and_then(Value::as_array).map(|genres| {
                    genres
                        .iter()
                        .filter_map(|g| g.get("name").and_then(Value::as_str))
                        .collect::<Vec<_>>()
                        .join(", ")
                })
            })
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "N/A".to_string());
        let plot = str_field(omdb, "Plot")
            .or_else(|| str_field(tmdb, "overview"))
            .unwrap_or_else(|| "No plot available".to_string());
        let language = str_field(omdb, "Language")
            .or_else(|| str_field(tmdb, "original_language"))
            .unwrap_or_else(|| "N/A".to_string());
        let country = str_field(omdb, "Country")
            .or_else(|| {
                tmdb.get("production_countries")
                    .and_then(Value::as_array)
                    .map(|countries| {
                        countries
                            .iter()
                            .filter_map(|c| c.get("name").and_then(Value::as_str))
                            .collect::<Vec<_>>()
                            .join(", ")
                    })
                    .filter(|s| !s.is_empty())
            })
            .unwrap_or_else(|| "N/A".to_string());
        let imdb_rating = str_field(omdb, "imdbRating")
            .or_else(|| {
                tmdb.get("vote_average")
                    .and_then(Value::as_f64)
                    .map(|avg| format!("{avg:.1}"))
            })
            .unwrap_or_else(|| "N/A".to_string());

        ContentDetail {
            title,
            year,
            rated: str_field(omdb, "Rated").unwrap_or_else(|| "N/A".to_string()),
            released,
            runtime,
            genre,
            director: str_field(omdb, "Director").unwrap_or_else(|| "N/A".to_string()),
            writer: str_field(omdb, "Writer").unwrap_or_else(|| "N/A".to_string()),
            actors: str_field(omdb, "Actors").unwrap_or_else(|| "N/A".to_string()),
            plot,
            language,
            country,
            awards: str_field(omdb, "Awards").unwrap_or_else(|| "N/A".to_string()),
            imdb_rating,
            box_office: str_field(omdb, "BoxOffice").unwrap_or_else(|| "N/A".to_string()),
            poster_path: str_field(tmdb, "poster_path"),
            imdb_id: str_field(tmdb, "imdb_id").or_else(|| str_field(omdb, "imdbID")),
            homepage: str_field(tmdb, "homepage"),
        }
    }

    pub fn external_url(&self) -> Option<String> {
        self.imdb_id
            .as_ref()
            .map(|id| format!("https://www.imdb.com/title/{id}/"))
            .or_else(|| self.homepage.clone())
    }
}

pub struct Client {
    http: HttpClient,
    user_agent: String,
    base_url: Url,
}

impl Client {
    pub fn new(config: ClientConfig) -> Result<Self, CatalogError> {
        if config.user_agent.trim().is_empty() {
            return Err(CatalogError::UserAgentRequired);
        }
        let base = config
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let base_url = Url::parse(&base)?;

        let http = match config.http_client {
            Some(client) => client,
            None => HttpClient::builder()
                .timeout(config.timeout.unwrap_or(Duration::from_secs(20)))
                .build()?,
        };

        Ok(Client {
            http,
            user_agent: config.user_agent,
            base_url,
        })
    }

    pub fn trending(
        &self,
        media: MediaType,
        page: usize,
        page_size: usize,
    ) -> Result<Page<ContentSummary>, CatalogError> {
        let params = vec![
            ("type".to_string(), media.as_str().to_string()),
            ("page".to_string(), page.max(1).to_string()),
        ];
        let payload = self.get_json("/api/trending", &params)?;
        Ok(normalize_listing(payload, page_size))
    }

    pub fn search(
        &self,
        query: &str,
        media: MediaType,
        page: usize,
        page_size: usize,
    ) -> Result<Page<ContentSummary>, CatalogError> {
        let params = vec![
            ("q".to_string(), query.to_string()),
            ("type".to_string(), media.as_str().to_string()),
            ("page".to_string(), page.max(1).to_string()),
        ];
        let payload = self.get_json("/api/search", &params)?;
        Ok(normalize_listing(payload, page_size))
    }

    pub fn discover(
        &self,
        media: MediaType,
        filters: DiscoverFilters,
        page: usize,
        page_size: usize,
    ) -> Result<Page<ContentSummary>, CatalogError> {
        let mut params = vec![
            ("type".to_string(), media.as_str().to_string()),
            ("page".to_string(), page.max(1).to_string()),
        ];
        params.extend(filters.into_params());
        let payload = self.get_json("/api/discover", &params)?;
        Ok(normalize_listing(payload, page_size))
    }

    pub fn genres(&self, media: MediaType) -> Result<Vec<Genre>, CatalogError> {
        let params = vec![("type".to_string(), media.as_str().to_string())];
        let payload: GenresPayload = self.get_json("/api/genres", &params)?;
        Ok(match payload {
            GenresPayload::Envelope { genres } => genres,
            GenresPayload::Bare(genres) => genres,
        })
    }

    pub fn detail(&self, id: i64, media: MediaType) -> Result<ContentDetail, CatalogError> {
        let path = format!("/api/movie/{id}");
        let mut params = Vec::new();
        if media == MediaType::Tv {
            params.push(("type".to_string(), "tv".to_string()));
        }
        let payload: DetailPayload = self.get_json(&path, &params)?;
        Ok(ContentDetail::from_payload(&payload))
    }

    fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(String, String)],
    ) -> Result<T, CatalogError> {
        let url = self
            .base_url
            .join(path.trim_start_matches('/'))
            .map_err(CatalogError::BaseUrl)?;

        let response = self
            .http
            .get(url.clone())
            .header(USER_AGENT, &self.user_agent)
            .query(params)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::Status {
                status,
                url: url.to_string(),
            });
        }

        let body = response.text()?;
        serde_json::from_str(&body).map_err(|source| CatalogError::Decode {
            url: url.to_string(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn listing_envelope_keeps_reported_totals() {
        let raw = json!({
            "results": [{"id": 1, "title": "Heat"}],
            "total_pages": 7,
            "total_results": 131
        });
        let payload: ListingPayload<ContentSummary> = serde_json::from_value(raw).unwrap();
        let page = normalize_listing(payload, 20);
        assert_eq!(page.results.len(), 1);
        assert_eq!(page.total_pages, 7);
        assert_eq!(page.total_results, 131);
    }

    #[test]
    fn bare_array_derives_totals_from_length() {
        let raw = json!([
            {"id": 1, "title": "Heat"},
            {"id": 2, "title": "Ronin"},
            {"id": 3, "name": "The Wire"}
        ]);
        let payload: ListingPayload<ContentSummary> = serde_json::from_value(raw).unwrap();
        let page = normalize_listing(payload, 2);
        assert_eq!(page.total_results, 3);
        assert_eq!(page.total_pages, 2);
    }

    #[test]
    fn empty_bare_array_still_reports_one_page() {
        let payload: ListingPayload<ContentSummary> = serde_json::from_value(json!([])).unwrap();
        let page = normalize_listing(payload, 20);
        assert_eq!(page.total_results, 0);
        assert_eq!(page.total_pages, 1);
    }

    #[test]
    fn envelope_without_totals_derives_them() {
        let raw = json!({"results": [{"id": 9, "title": "Alien"}]});
        let payload: ListingPayload<ContentSummary> = serde_json::from_value(raw).unwrap();
        let page = normalize_listing(payload, 20);
        assert_eq!(page.total_results, 1);
        assert_eq!(page.total_pages, 1);
    }

    #[test]
    fn genres_accepts_both_shapes() {
        let enveloped: GenresPayload =
            serde_json::from_value(json!({"genres": [{"id": 18, "name": "Drama"}]})).unwrap();
        let bare: GenresPayload =
            serde_json::from_value(json!([{"id": 35, "name": "Comedy"}])).unwrap();
        let first = match enveloped {
            GenresPayload::Envelope { genres } => genres,
            GenresPayload::Bare(genres) => genres,
        };
        let second = match bare {
            GenresPayload::Envelope { genres } => genres,
            GenresPayload::Bare(genres) => genres,
        };
        assert_eq!(first[0].name, "Drama");
        assert_eq!(second[0].name, "Comedy");
    }

    #[test]
    fn summary_title_falls_back_through_name() {
        let movie: ContentSummary =
            serde_json::from_value(json!({"id": 1, "title": "Heat"})).unwrap();
        let show: ContentSummary =
            serde_json::from_value(json!({"id": 2, "name": "The Wire"})).unwrap();
        let unnamed: ContentSummary = serde_json::from_value(json!({"id": 3})).unwrap();
        assert_eq!(movie.display_title(), "Heat");
        assert_eq!(show.display_title(), "The Wire");
        assert_eq!(unnamed.display_title(), "Untitled");
    }

    #[test]
    fn detail_merge_prefers_omdb_text() {
        let payload: DetailPayload = serde_json::from_value(json!({
            "TMDBData": {
                "title": "Heat",
                "overview": "tmdb overview",
                "release_date": "1995-12-15",
                "runtime": 170,
                "vote_average": 8.234,
                "poster_path": "/heat.jpg",
                "imdb_id": "tt0113277"
            },
            "OMDBData": {
                "Title": "Heat",
                "Plot": "omdb plot",
                "Director": "Michael Mann",
                "imdbRating": "8.3"
            }
        }))
        .unwrap();
        let detail = ContentDetail::from_payload(&payload);
        assert_eq!(detail.plot, "omdb plot");
        assert_eq!(detail.director, "Michael Mann");
        assert_eq!(detail.imdb_rating, "8.3");
        assert_eq!(detail.year, "1995");
        assert_eq!(detail.runtime, "170 min");
        assert_eq!(detail.poster_path.as_deref(), Some("/heat.jpg"));
        assert_eq!(
            detail.external_url().as_deref(),
            Some("https://www.imdb.com/title/tt0113277/")
        );
    }

    #[test]
    fn detail_merge_falls_back_to_tmdb() {
        let payload: DetailPayload = serde_json::from_value(json!({
            "TMDBData": {
                "name": "The Wire",
                "overview": "Baltimore drama",
                "first_air_date": "2002-06-02",
                "genres": [{"id": 80, "name": "Crime"}, {"id": 18, "name": "Drama"}],
                "vote_average": 8.6
            },
            "OMDBData": {}
        }))
        .unwrap();
        let detail = ContentDetail::from_payload(&payload);
        assert_eq!(detail.title, "The Wire");
        assert_eq!(detail.plot, "Baltimore drama");
        assert_eq!(detail.genre, "Crime, Drama");
        assert_eq!(detail.imdb_rating, "8.6");
        assert_eq!(detail.year, "2002");
    }

    #[test]
    fn omdb_na_values_do_not_shadow_tmdb() {
        let payload: DetailPayload = serde_json::from_value(json!({
            "TMDBData": {"title": "Solaris", "overview": "slow space"},
            "OMDBData": {"Plot": "N/A", "Title": "N/A"}
        }))
        .unwrap();
        let detail = ContentDetail::from_payload(&payload);
        assert_eq!(detail.title, "Solaris");
        assert_eq!(detail.plot, "slow space");
    }
}
