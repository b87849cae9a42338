pub mod platform;
pub mod service;
pub mod source_db;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use service::Service;
pub use source_db::{AppDef, BrowserDef, SourceDatabase};

/// Where a window or tab title was read from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "name", rename_all = "snake_case")]
pub enum TitleSource {
    /// A streaming service's dedicated desktop app.
    NativeApp(Service),
    /// A web browser window or tab (display name, e.g. "Chrome").
    Browser(String),
    /// Any other top-level window.
    Window,
}

/// A window or tab title sampled during one detection pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTitle {
    /// The title text as reported by the OS.
    pub text: String,
    /// Which kind of source produced the title.
    pub source: TitleSource,
    /// Page URL, when the source exposes one (MPRIS `xesam:url`).
    pub url: Option<String>,
}

impl RawTitle {
    pub fn native(service: Service, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source: TitleSource::NativeApp(service),
            url: None,
        }
    }

    pub fn browser(browser: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source: TitleSource::Browser(browser.into()),
            url: None,
        }
    }

    pub fn window(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source: TitleSource::Window,
            url: None,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }
}

/// Errors from a single platform title source.
///
/// These never escape [`list_titles`]: a failing source is logged and the
/// remaining sources still contribute.
#[derive(Debug, Error)]
pub enum DetectError {
    #[error("D-Bus error: {0}")]
    Dbus(String),

    #[error("window enumeration failed: {0}")]
    Enumerate(String),
}

/// Anything that can produce the titles currently visible on the desktop.
pub trait TitleProvider: Send + Sync {
    fn list_titles(&self) -> Vec<RawTitle>;
}

/// The OS-backed title provider.
#[derive(Debug, Clone)]
pub struct SystemTitles {
    db: SourceDatabase,
}

impl SystemTitles {
    pub fn new(db: SourceDatabase) -> Self {
        Self { db }
    }
}

impl TitleProvider for SystemTitles {
    fn list_titles(&self) -> Vec<RawTitle> {
        list_titles_with_db(&self.db)
    }
}

/// List every visible title using the embedded source database.
pub fn list_titles() -> Vec<RawTitle> {
    let db = SourceDatabase::embedded();
    list_titles_with_db(&db)
}

/// List every visible title, tagging sources with a custom database.
///
/// Native apps come first, then browsers, then other windows; within each
/// group the OS enumeration order is kept.
pub fn list_titles_with_db(db: &SourceDatabase) -> Vec<RawTitle> {
    let mut titles = platform::collect(db);
    titles.sort_by_key(|t| source_rank(&t.source));
    titles
}

fn source_rank(source: &TitleSource) -> u8 {
    match source {
        TitleSource::NativeApp(_) => 0,
        TitleSource::Browser(_) => 1,
        TitleSource::Window => 2,
    }
}
