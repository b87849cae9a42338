//! Trait definitions for metadata services.
//!
//! The resolver only talks to [`MetadataSearch`], so tests can swap the TMDB
//! client for an in-memory fake.

use std::future::Future;

use serde::{Deserialize, Serialize};

/// A media database that can look up a work by title.
pub trait MetadataSearch: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Search for a title, best match first.
    ///
    /// `hint_season` marks the title as a TV show. No match is `Ok(vec![])`;
    /// `Err` is reserved for transport, auth and decoding failures.
    fn search(
        &self,
        title: &str,
        hint_season: Option<u32>,
    ) -> impl Future<Output = Result<Vec<Candidate>, Self::Error>> + Send;
}

/// Whether a candidate is a series or a film.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Tv,
    Movie,
}

/// A ranked search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: u64,
    pub kind: MediaKind,
    pub title: String,
    /// Full artwork URL, usable directly as a presence image.
    pub image_ref: Option<String>,
    pub year: Option<i32>,
    pub score: f64,
}
