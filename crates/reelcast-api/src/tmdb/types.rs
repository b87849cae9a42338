use serde::Deserialize;

use crate::traits::{Candidate, MediaKind};

// ── Response types ───────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SearchResponse<T> {
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
}

#[derive(Debug, Deserialize)]
pub struct TvResult {
    pub id: u64,
    pub name: String,
    pub poster_path: Option<String>,
    #[serde(default)]
    pub popularity: f64,
    pub first_air_date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MovieResult {
    pub id: u64,
    pub title: String,
    pub poster_path: Option<String>,
    #[serde(default)]
    pub popularity: f64,
    pub release_date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SeasonDetails {
    pub poster_path: Option<String>,
}

/// Body TMDB sends with non-2xx responses.
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub status_message: Option<String>,
}

// ── Normalized result ────────────────────────────────────────────

/// A TV or movie result reduced to the fields ranking needs.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub id: u64,
    pub kind: MediaKind,
    pub title: String,
    pub poster_path: Option<String>,
    pub popularity: f64,
    pub year: Option<i32>,
}

impl From<TvResult> for SearchHit {
    fn from(r: TvResult) -> Self {
        Self {
            id: r.id,
            kind: MediaKind::Tv,
            title: r.name,
            poster_path: non_empty(r.poster_path),
            popularity: r.popularity,
            year: r.first_air_date.as_deref().and_then(parse_year),
        }
    }
}

impl From<MovieResult> for SearchHit {
    fn from(r: MovieResult) -> Self {
        Self {
            id: r.id,
            kind: MediaKind::Movie,
            title: r.title,
            poster_path: non_empty(r.poster_path),
            popularity: r.popularity,
            year: r.release_date.as_deref().and_then(parse_year),
        }
    }
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.filter(|s| !s.is_empty())
}

/// Year from a TMDB date string ("2016-07-15"). Empty dates are common.
pub fn parse_year(date: &str) -> Option<i32> {
    date.get(..4)?.parse().ok()
}

/// How closely a result title matches the query; 0 means unrelated.
pub fn relevance(query: &str, title: &str) -> f64 {
    let query = query.to_lowercase();
    let title = title.to_lowercase();

    if title == query {
        100.0
    } else if title.contains(&query) {
        50.0
    } else if query.contains(&title) {
        40.0
    } else {
        0.0
    }
}

/// Relevance of a result title to the query, plus popularity and recency.
pub fn score(query: &str, hit: &SearchHit, current_year: i32) -> f64 {
    let mut score = relevance(query, &hit.title);
    score += hit.popularity / 10.0;

    if let Some(year) = hit.year {
        let span = f64::from((current_year - 2000).max(1));
        let bonus = f64::from(year - 2000) / span * 20.0;
        score += bonus.clamp(0.0, 20.0);
    }

    score
}

/// Build a full image URL from a poster path.
pub fn image_url(size: &str, path: &str) -> String {
    format!("https://image.tmdb.org/t/p/{size}{path}")
}

/// Score hits, drop unrelated ones and those without a poster, and sort
/// best-first.
pub fn rank(query: &str, hits: Vec<SearchHit>, image_size: &str, current_year: i32) -> Vec<Candidate> {
    let mut candidates: Vec<Candidate> = hits
        .into_iter()
        .filter(|hit| relevance(query, &hit.title) > 0.0)
        .filter_map(|hit| {
            let poster = hit.poster_path.as_deref()?;
            Some(Candidate {
                id: hit.id,
                kind: hit.kind,
                image_ref: Some(image_url(image_size, poster)),
                year: hit.year,
                score: score(query, &hit, current_year),
                title: hit.title,
            })
        })
        .collect();

    candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
    candidates
}
