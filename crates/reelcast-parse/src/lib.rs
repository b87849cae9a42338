//! Window/tab title classification for streaming services.
//!
//! [`classify`] decides whether a sampled title belongs to a supported
//! service and extracts a [`WatchFact`] from it. Everything here is pure:
//! no I/O, no clock, no shared state.

pub mod classify;
pub mod clean;
pub mod fact;
pub mod marker;
pub mod rules;

pub use classify::{classify, Classifier, DEFAULT_IGNORE_KEYWORDS};
pub use clean::{normalize_key, normalize_title, sanitize_for_log};
pub use fact::{EpisodeNumber, WatchFact};
pub use rules::{RuleMatch, TitleRule, RULES};

pub use reelcast_detect::{RawTitle, Service, TitleSource};
