use serde::{Deserialize, Serialize};

pub use reelcast_api::Candidate;
pub use reelcast_parse::{EpisodeNumber, RawTitle, Service, TitleSource, WatchFact};

/// Artwork and canonical title for a watch fact.
///
/// The empty value means "no metadata": lookup failed or found nothing.
/// Presence is still published without it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResolvedMetadata {
    /// Image reference usable directly in a presence payload.
    pub poster_image_key: Option<String>,
    pub canonical_title: Option<String>,
}

impl ResolvedMetadata {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_none(&self) -> bool {
        self.poster_image_key.is_none() && self.canonical_title.is_none()
    }
}

impl From<Candidate> for ResolvedMetadata {
    fn from(c: Candidate) -> Self {
        Self {
            poster_image_key: c.image_ref,
            canonical_title: Some(c.title),
        }
    }
}

/// Where the session state machine is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Nothing published yet.
    Idle,
    /// A fact is published.
    Watching,
    /// Detection stopped finding anything and presence was cleared.
    Degraded,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Watching => write!(f, "watching"),
            Self::Degraded => write!(f, "degraded"),
        }
    }
}
