//! Service marker tokens: brand strings and domains that attribute a title
//! to a streaming service.

use std::sync::LazyLock;

use regex::Regex;

use crate::Service;

/// Lowercase substrings that identify a service in a title.
pub fn markers(service: Service) -> &'static [&'static str] {
    match service {
        Service::Netflix => &["netflix"],
        Service::DisneyPlus => &["disney+", "disneyplus", "disney plus"],
    }
}

/// Domains that identify a service in a page URL.
pub fn domains(service: Service) -> &'static [&'static str] {
    match service {
        Service::Netflix => &["netflix.com"],
        Service::DisneyPlus => &["disneyplus.com"],
    }
}

/// First service (in [`Service::ALL`] order) whose marker appears in `text`.
pub fn find_in_title(text: &str) -> Option<Service> {
    let lower = text.to_lowercase();
    Service::ALL
        .iter()
        .copied()
        .find(|s| markers(*s).iter().any(|m| lower.contains(m)))
}

/// Service whose domain is the host (or a parent of the host) of `url`.
pub fn find_in_url(url: &str) -> Option<Service> {
    let host = url_host(url)?.to_lowercase();
    Service::ALL.iter().copied().find(|s| {
        domains(*s)
            .iter()
            .any(|d| host == *d || host.ends_with(&format!(".{d}")))
    })
}

fn url_host(url: &str) -> Option<&str> {
    let rest = url.split_once("://").map_or(url, |(_, rest)| rest);
    let host = rest.split(['/', '?', '#']).next()?;
    let host = host.rsplit_once('@').map_or(host, |(_, h)| h);
    let host = host.split(':').next()?;
    (!host.is_empty()).then_some(host)
}

// "Netflix - Title", "Disney+ | Title"
static RE_NETFLIX_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:www\.)?netflix(?:\.com)?\s*[-–—|:]\s*").unwrap()
});
static RE_DISNEY_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:www\.)?(?:disney\s?\+|disneyplus(?:\.com)?|disney plus)\s*[-–—|:]\s*")
        .unwrap()
});

// "Title - Netflix", "Title on Disney+", "Title | Disney+"
static RE_NETFLIX_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:\s+on)?\s*[-–—|:]?\s*(?:www\.)?netflix(?:\.com)?\s*$").unwrap()
});
static RE_DISNEY_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:\s+on)?\s*[-–—|:]?\s*(?:www\.)?(?:disney\s?\+|disneyplus(?:\.com)?|disney plus)\s*$",
    )
    .unwrap()
});

// A bare marker between words: "Loki on Disney+ - S1E1"
static RE_NETFLIX_INNER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:\s+on)?\s+netflix(?:\.com)?\s+").unwrap());
static RE_DISNEY_INNER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:\s+on)?\s+(?:disney\s?\+|disneyplus(?:\.com)?|disney plus)\s+").unwrap()
});

/// Remove the service's brand string from a title.
///
/// A preceding "on" goes with it, so "Loki on Disney+" becomes "Loki".
pub fn strip(service: Service, text: &str) -> String {
    let (prefix, suffix, inner) = match service {
        Service::Netflix => (&*RE_NETFLIX_PREFIX, &*RE_NETFLIX_SUFFIX, &*RE_NETFLIX_INNER),
        Service::DisneyPlus => (&*RE_DISNEY_PREFIX, &*RE_DISNEY_SUFFIX, &*RE_DISNEY_INNER),
    };

    let text = prefix.replace(text, "");
    let text = suffix.replace(&text, "");
    let text = inner.replace_all(&text, " ");
    text.into_owned()
}
