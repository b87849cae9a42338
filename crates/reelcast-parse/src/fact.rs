use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::Service;

/// Season and episode of a TV episode. Both are always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EpisodeNumber {
    pub season: u32,
    pub episode: u32,
}

impl EpisodeNumber {
    /// Returns `None` unless both numbers are positive.
    pub fn new(season: u32, episode: u32) -> Option<Self> {
        (season > 0 && episode > 0).then_some(Self { season, episode })
    }
}

impl std::fmt::Display for EpisodeNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "S{} E{}", self.season, self.episode)
    }
}

/// What is currently being watched, as read from a window or tab title.
///
/// Season and episode live together in [`EpisodeNumber`], so a fact can't
/// carry one without the other. Equality and hashing use the service, the
/// case-folded title and the episode number; `episode_title` is cosmetic and
/// ignored so that descriptive text updates don't look like a new episode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchFact {
    pub service: Service,
    /// Show or movie name.
    pub display_title: String,
    /// Present for TV episodes, absent for movies and unknown content.
    pub number: Option<EpisodeNumber>,
    pub episode_title: Option<String>,
}

impl WatchFact {
    /// A movie or content of unknown type.
    pub fn movie(service: Service, display_title: impl Into<String>) -> Self {
        Self {
            service,
            display_title: display_title.into(),
            number: None,
            episode_title: None,
        }
    }

    /// A TV episode.
    pub fn episode(
        service: Service,
        display_title: impl Into<String>,
        number: EpisodeNumber,
        episode_title: Option<String>,
    ) -> Self {
        Self {
            service,
            display_title: display_title.into(),
            number: Some(number),
            episode_title,
        }
    }

    pub fn season(&self) -> Option<u32> {
        self.number.map(|n| n.season)
    }

    pub fn episode_no(&self) -> Option<u32> {
        self.number.map(|n| n.episode)
    }

    /// A service app that is open but not on a title, shown as "<Service> Content".
    pub fn placeholder(service: Service) -> Self {
        Self::movie(service, format!("{} Content", service.display_name()))
    }

    pub fn is_placeholder(&self) -> bool {
        *self == Self::placeholder(self.service)
    }

    /// Whether `newer` is the same fact with an episode title worth showing
    /// instead of this one's. A missing title is never new text.
    pub fn refreshed_by(&self, newer: &WatchFact) -> bool {
        self == newer
            && newer.episode_title.is_some()
            && newer.episode_title != self.episode_title
    }

    fn folded_title(&self) -> String {
        self.display_title.to_lowercase()
    }
}

impl PartialEq for WatchFact {
    fn eq(&self, other: &Self) -> bool {
        self.service == other.service
            && self.number == other.number
            && self.folded_title() == other.folded_title()
    }
}

impl Eq for WatchFact {}

impl Hash for WatchFact {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.service.hash(state);
        self.folded_title().hash(state);
        self.number.hash(state);
    }
}

impl std::fmt::Display for WatchFact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} - {}", self.service, self.display_title)?;
        if let Some(number) = self.number {
            write!(f, " {number}")?;
        }
        Ok(())
    }
}
