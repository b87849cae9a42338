//! Ordered pattern rules that turn a cleaned title into show/episode parts.
//!
//! Rules are tried in [`RULES`] order and the first match wins. Each rule is
//! independent, so a new layout is a new variant plus an entry in the list.

use std::sync::LazyLock;

use regex::{Captures, Regex};

/// Season/episode token: "S4E9", "S4 E9", "S1:E1", "Season 2 Episode 5", "Season 2, Ep. 5".
const SEASON_EPISODE: &str =
    r"S(?:eason)?\s*(?P<season>\d{1,9})\s*[:,.]?\s*E(?:p(?:isode)?\.?)?\s*(?P<episode>\d{1,9})\b";

// "<Show> - S4E9 - <Episode Title>", "<Show>: S1:E1 <Episode Title>", "<Show> - S4 E9 · <Episode Title>"
static RE_EPISODE_WITH_TITLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)^(?P<show>.+?)\s*[-–—|:]\s*{SEASON_EPISODE}(?:(?:\s*[-–—|:·]\s*|\s+)(?P<title>.+))?$"
    ))
    .unwrap()
});

// "<Show> - 2x05"
static RE_SEASON_BY_EPISODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?P<show>.+?)\s*[-–—|:]\s*(?P<season>\d{1,9})x(?P<episode>\d{1,9})$")
        .unwrap()
});

/// What a rule extracted. Numbers are raw: validation happens in the classifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleMatch {
    pub title: String,
    pub season: Option<u32>,
    pub episode: Option<u32>,
    pub episode_title: Option<String>,
}

/// A single title layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TitleRule {
    /// `"<Show> - S<season>E<episode> - <EpisodeTitle>"`; the episode title may be absent.
    EpisodeWithTitle,
    /// `"<Show> - <season>x<episode>"`.
    SeasonByEpisode,
    /// The whole text is the title (movie or unknown type).
    Plain,
}

/// Rules in the order they're tried.
pub const RULES: &[TitleRule] = &[
    TitleRule::EpisodeWithTitle,
    TitleRule::SeasonByEpisode,
    TitleRule::Plain,
];

impl TitleRule {
    pub fn apply(self, text: &str) -> Option<RuleMatch> {
        match self {
            Self::EpisodeWithTitle => RE_EPISODE_WITH_TITLE
                .captures(text)
                .and_then(|caps| from_captures(&caps)),
            Self::SeasonByEpisode => RE_SEASON_BY_EPISODE
                .captures(text)
                .and_then(|caps| from_captures(&caps)),
            Self::Plain => {
                let title = text.trim();
                (!title.is_empty()).then(|| RuleMatch {
                    title: title.to_string(),
                    season: None,
                    episode: None,
                    episode_title: None,
                })
            }
        }
    }
}

/// Apply [`RULES`] in order and return the first match.
pub fn apply_rules(text: &str) -> Option<(TitleRule, RuleMatch)> {
    RULES
        .iter()
        .find_map(|rule| rule.apply(text).map(|m| (*rule, m)))
}

fn from_captures(caps: &Captures<'_>) -> Option<RuleMatch> {
    let title = caps.name("show")?.as_str().trim();
    if title.is_empty() {
        return None;
    }
    let episode_title = caps
        .name("title")
        .map(|m| m.as_str().trim().to_string())
        .filter(|t| !t.is_empty());

    Some(RuleMatch {
        title: title.to_string(),
        season: caps.name("season").and_then(|m| m.as_str().parse().ok()),
        episode: caps.name("episode").and_then(|m| m.as_str().parse().ok()),
        episode_title,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(text: &str) -> (TitleRule, RuleMatch) {
        apply_rules(text).unwrap()
    }

    #[test]
    fn test_episode_with_title() {
        let (rule, m) = apply("Stranger Things - S4E9 - The Piggyback");
        assert_eq!(rule, TitleRule::EpisodeWithTitle);
        assert_eq!(m.title, "Stranger Things");
        assert_eq!(m.season, Some(4));
        assert_eq!(m.episode, Some(9));
        assert_eq!(m.episode_title.as_deref(), Some("The Piggyback"));
    }

    #[test]
    fn test_netflix_player_layout() {
        let (_, m) = apply("Stranger Things: S4:E9 Chapter Nine: The Piggyback");
        assert_eq!(m.title, "Stranger Things");
        assert_eq!((m.season, m.episode), (Some(4), Some(9)));
        assert_eq!(m.episode_title.as_deref(), Some("Chapter Nine: The Piggyback"));
    }

    #[test]
    fn test_spaced_and_long_forms() {
        let (_, m) = apply("Andor - S1 E3 - Reckoning");
        assert_eq!((m.season, m.episode), (Some(1), Some(3)));

        let (_, m) = apply("Bluey - Season 2 Episode 5");
        assert_eq!(m.title, "Bluey");
        assert_eq!((m.season, m.episode), (Some(2), Some(5)));
        assert_eq!(m.episode_title, None);

        let (_, m) = apply("Stranger Things - S4 E9 · The Piggyback");
        assert_eq!(m.title, "Stranger Things");
        assert_eq!((m.season, m.episode), (Some(4), Some(9)));
        assert_eq!(m.episode_title.as_deref(), Some("The Piggyback"));
    }

    #[test]
    fn test_colon_in_show_name() {
        let (_, m) = apply("Star Wars: Skeleton Crew - S01E02 - Way, Way Out Past the Barrier");
        assert_eq!(m.title, "Star Wars: Skeleton Crew");
        assert_eq!((m.season, m.episode), (Some(1), Some(2)));
    }

    #[test]
    fn test_season_by_episode() {
        let (rule, m) = apply("Daredevil - 2x05");
        assert_eq!(rule, TitleRule::SeasonByEpisode);
        assert_eq!(m.title, "Daredevil");
        assert_eq!((m.season, m.episode), (Some(2), Some(5)));
        assert_eq!(m.episode_title, None);
    }

    #[test]
    fn test_plain() {
        let (rule, m) = apply("Glass Onion: A Knives Out Mystery");
        assert_eq!(rule, TitleRule::Plain);
        assert_eq!(m.title, "Glass Onion: A Knives Out Mystery");
        assert_eq!(m.season, None);
    }

    #[test]
    fn test_word_starting_with_s_is_not_a_season() {
        let (rule, _) = apply("Star Wars: Skeleton Crew");
        assert_eq!(rule, TitleRule::Plain);
    }

    #[test]
    fn test_empty_text_matches_nothing() {
        assert!(apply_rules("   ").is_none());
    }

    #[test]
    fn test_long_numbers() {
        let (_, m) = apply("Show - S999999999E1");
        assert_eq!(m.season, Some(999_999_999));
        let (_, m) = apply("Show - S1E99999999999");
        // Too many digits for the token: falls through to the plain rule.
        assert_eq!(m.season, None);
    }
}
