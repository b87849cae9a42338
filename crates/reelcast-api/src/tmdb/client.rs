use chrono::Datelike;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::error::TmdbError;
use super::types::{
    image_url, rank, ErrorBody, MovieResult, SearchHit, SearchResponse, SeasonDetails, TvResult,
};
use crate::traits::{Candidate, MediaKind, MetadataSearch};

const BASE_URL: &str = "https://api.themoviedb.org/3";

/// Poster size used when none is configured.
pub const DEFAULT_IMAGE_SIZE: &str = "w500";

/// The Movie Database (TMDB) v3 client.
pub struct TmdbClient {
    api_key: String,
    image_size: String,
    http: Client,
}

impl TmdbClient {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            image_size: DEFAULT_IMAGE_SIZE.into(),
            http: Client::new(),
        }
    }

    /// Poster size segment, e.g. `w342` or `original`.
    pub fn with_image_size(mut self, size: impl Into<String>) -> Self {
        self.image_size = size.into();
        self
    }

    async fn check_response(resp: reqwest::Response) -> Result<reqwest::Response, TmdbError> {
        if resp.status().is_success() {
            Ok(resp)
        } else {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .and_then(|b| b.status_message)
                .unwrap_or(body);
            Err(TmdbError::Api { status, message })
        }
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, TmdbError> {
        let resp = self
            .http
            .get(format!("{BASE_URL}{path}"))
            .query(&[("api_key", self.api_key.as_str())])
            .query(query)
            .send()
            .await?;

        let resp = Self::check_response(resp).await?;
        resp.json().await.map_err(|e| TmdbError::Parse(e.to_string()))
    }

    /// Search one media type and normalize the results.
    pub async fn search_kind(&self, kind: MediaKind, query: &str) -> Result<Vec<SearchHit>, TmdbError> {
        let params = [("query", query), ("include_adult", "false")];
        let hits: Vec<SearchHit> = match kind {
            MediaKind::Tv => self
                .get::<SearchResponse<TvResult>>("/search/tv", &params)
                .await?
                .results
                .into_iter()
                .map(SearchHit::from)
                .collect(),
            MediaKind::Movie => self
                .get::<SearchResponse<MovieResult>>("/search/movie", &params)
                .await?
                .results
                .into_iter()
                .map(SearchHit::from)
                .collect(),
        };
        Ok(hits)
    }

    /// Poster URL for one season of a show, if TMDB has one.
    pub async fn season_poster(&self, show_id: u64, season: u32) -> Result<Option<String>, TmdbError> {
        let details: SeasonDetails = self
            .get(&format!("/tv/{show_id}/season/{season}"), &[])
            .await?;
        Ok(details
            .poster_path
            .filter(|p| !p.is_empty())
            .map(|p| image_url(&self.image_size, &p)))
    }
}

/// Lookup order: shows first when a season is known, films first otherwise.
pub fn search_order(hint_season: Option<u32>) -> [MediaKind; 2] {
    if hint_season.is_some() {
        [MediaKind::Tv, MediaKind::Movie]
    } else {
        [MediaKind::Movie, MediaKind::Tv]
    }
}

impl MetadataSearch for TmdbClient {
    type Error = TmdbError;

    async fn search(
        &self,
        title: &str,
        hint_season: Option<u32>,
    ) -> Result<Vec<Candidate>, TmdbError> {
        let current_year = chrono::Utc::now().year();
        let mut last_err = None;

        for kind in search_order(hint_season) {
            let hits = match self.search_kind(kind, title).await {
                Ok(hits) => hits,
                Err(e) => {
                    warn!(?kind, error = %e, "TMDB search failed");
                    last_err = Some(e);
                    continue;
                }
            };

            let mut candidates = rank(title, hits, &self.image_size, current_year);
            let Some(best) = candidates.first_mut() else {
                continue;
            };
            debug!(?kind, title = %best.title, score = best.score, "TMDB best match");

            if let (MediaKind::Tv, Some(season)) = (best.kind, hint_season) {
                match self.season_poster(best.id, season).await {
                    Ok(Some(url)) => best.image_ref = Some(url),
                    Ok(None) => {}
                    Err(e) => warn!(show_id = best.id, season, error = %e, "Season poster lookup failed"),
                }
            }
            return Ok(candidates);
        }

        match last_err {
            Some(e) => Err(e),
            None => Ok(Vec::new()),
        }
    }
}
