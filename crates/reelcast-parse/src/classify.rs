use phf::phf_set;
use tracing::trace;

use crate::clean::{normalize_title, strip_browser_chrome, strip_invisible, tidy};
use crate::fact::{EpisodeNumber, WatchFact};
use crate::rules::{apply_rules, RuleMatch};
use crate::{marker, RawTitle, Service, TitleSource};

/// Keywords that mark a window as *about* a service rather than playing it
/// (editors, docs, repositories). Checked case-insensitively, and only for
/// titles that don't come from a service's own app.
pub const DEFAULT_IGNORE_KEYWORDS: &[&str] = &[
    "readme",
    ".md",
    ".txt",
    ".env",
    "github",
    "gitlab",
    "documentation",
    "visual studio code",
    "notepad",
    "file explorer",
    "discord",
];

/// Service pages that aren't content (lowercase, after cleanup).
static NON_CONTENT_PAGES: phf::Set<&'static str> = phf_set! {
    "",
    "home",
    "browse",
    "my list",
    "watchlist",
    "search",
    "new & popular",
    "tv shows",
    "movies",
    "series",
    "originals",
    "account",
    "profiles",
    "who's watching?",
    "settings",
};

/// Title classifier with a configurable false-positive filter.
#[derive(Debug, Clone)]
pub struct Classifier {
    ignore_keywords: Vec<String>,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(DEFAULT_IGNORE_KEYWORDS.iter().copied())
    }
}

impl Classifier {
    pub fn new<I, S>(ignore_keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            ignore_keywords: ignore_keywords
                .into_iter()
                .map(|k| k.as_ref().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }

    /// Classify a single title.
    ///
    /// Native-app titles are attributed to their app's service outright;
    /// everything else needs a service marker in the text or the page URL.
    pub fn classify(&self, raw: &RawTitle) -> Option<WatchFact> {
        let text = strip_invisible(&raw.text);

        let service = match &raw.source {
            TitleSource::NativeApp(service) => *service,
            _ => {
                let service = marker::find_in_title(&text)
                    .or_else(|| raw.url.as_deref().and_then(marker::find_in_url))?;
                if let Some(keyword) = self.ignored_keyword(&text) {
                    trace!(keyword, "Ignoring title with non-content keyword");
                    return None;
                }
                service
            }
        };

        let cleaned = strip_browser_chrome(&text);
        let cleaned = tidy(&marker::strip(service, &cleaned));

        if NON_CONTENT_PAGES.contains(cleaned.to_lowercase().as_str()) {
            return match raw.source {
                // The app (or an app host window) is open but not on a title.
                TitleSource::NativeApp(_) | TitleSource::Window => {
                    Some(WatchFact::placeholder(service))
                }
                TitleSource::Browser(_) => None,
            };
        }

        let (_, matched) = apply_rules(&cleaned)?;
        Some(build_fact(service, matched, &cleaned))
    }

    /// Classify titles in order and return the first fact found.
    pub fn first_match<'a, I>(&self, titles: I) -> Option<WatchFact>
    where
        I: IntoIterator<Item = &'a RawTitle>,
    {
        titles.into_iter().find_map(|raw| self.classify(raw))
    }

    fn ignored_keyword(&self, text: &str) -> Option<&str> {
        let lower = text.to_lowercase();
        self.ignore_keywords
            .iter()
            .find(|k| lower.contains(k.as_str()))
            .map(String::as_str)
    }
}

/// Classify a title with the default ignore list.
pub fn classify(raw: &RawTitle) -> Option<WatchFact> {
    Classifier::default().classify(raw)
}

/// Turn a rule match into a fact, degrading invalid episode numbers to a
/// plain title made of the whole cleaned text.
fn build_fact(service: Service, matched: RuleMatch, cleaned: &str) -> WatchFact {
    let number = match (matched.season, matched.episode) {
        (None, None) => None,
        (Some(season), Some(episode)) => match EpisodeNumber::new(season, episode) {
            Some(number) => Some(number),
            None => return WatchFact::movie(service, normalize_title(cleaned)),
        },
        _ => return WatchFact::movie(service, normalize_title(cleaned)),
    };

    let display_title = normalize_title(&matched.title);
    match number {
        Some(number) => WatchFact::episode(
            service,
            display_title,
            number,
            matched.episode_title.map(|t| normalize_title(&t)),
        ),
        None => WatchFact::movie(service, display_title),
    }
}
