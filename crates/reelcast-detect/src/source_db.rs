use serde::{Deserialize, Serialize};

use crate::{Service, TitleSource};

/// Embedded title source database.
const EMBEDDED_DB: &str = include_str!("../data/sources.toml");

/// A dedicated streaming app whose windows belong to one service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppDef {
    /// Display name (e.g., "Netflix").
    pub name: String,
    /// The service every window of this app is attributed to.
    pub service: Service,
    /// Executable names to match against process names.
    #[serde(default)]
    pub executables: Vec<String>,
    /// MPRIS identity substrings (Linux D-Bus detection).
    #[serde(default)]
    pub mpris_identities: Vec<String>,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// A web browser whose tab titles are inspected for service markers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserDef {
    /// Display name (e.g., "Chrome", "Firefox").
    pub name: String,
    #[serde(default)]
    pub executables: Vec<String>,
    #[serde(default)]
    pub mpris_identities: Vec<String>,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

/// Wrapper for TOML deserialization.
#[derive(Debug, Deserialize)]
struct SourceDbFile {
    #[serde(default, rename = "app")]
    apps: Vec<AppDef>,
    #[serde(default, rename = "browser")]
    browsers: Vec<BrowserDef>,
}

/// Database of known native apps and browsers.
#[derive(Debug, Clone, Default)]
pub struct SourceDatabase {
    pub apps: Vec<AppDef>,
    pub browsers: Vec<BrowserDef>,
}

impl SourceDatabase {
    /// Load the embedded source database.
    pub fn embedded() -> Self {
        Self::from_toml(EMBEDDED_DB).expect("embedded sources.toml should be valid")
    }

    /// Load a source database from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        let db: SourceDbFile = toml::from_str(toml_str)?;
        Ok(Self {
            apps: db.apps,
            browsers: db.browsers,
        })
    }

    /// Merge a user database into this one.
    /// Entries with matching names are replaced; new entries are appended.
    pub fn merge_user(&mut self, user_db: &SourceDatabase) {
        for user_app in &user_db.apps {
            match self.apps.iter_mut().find(|a| a.name == user_app.name) {
                Some(existing) => *existing = user_app.clone(),
                None => self.apps.push(user_app.clone()),
            }
        }
        for user_browser in &user_db.browsers {
            match self.browsers.iter_mut().find(|b| b.name == user_browser.name) {
                Some(existing) => *existing = user_browser.clone(),
                None => self.browsers.push(user_browser.clone()),
            }
        }
    }

    /// Find a native app by executable name (case-insensitive).
    pub fn find_app_by_executable(&self, exe_name: &str) -> Option<&AppDef> {
        self.apps
            .iter()
            .find(|a| a.enabled && a.executables.iter().any(|e| e.eq_ignore_ascii_case(exe_name)))
    }

    /// Find a browser by executable name (case-insensitive).
    pub fn find_browser_by_executable(&self, exe_name: &str) -> Option<&BrowserDef> {
        self.browsers
            .iter()
            .find(|b| b.enabled && b.executables.iter().any(|e| e.eq_ignore_ascii_case(exe_name)))
    }

    /// Find a native app by MPRIS identity (case-insensitive substring match).
    pub fn find_app_by_mpris(&self, identity: &str) -> Option<&AppDef> {
        let identity_lower = identity.to_lowercase();
        self.apps.iter().find(|a| {
            a.enabled
                && a.mpris_identities
                    .iter()
                    .any(|id| identity_lower.contains(&id.to_lowercase()))
        })
    }

    /// Find a browser by MPRIS identity (case-insensitive substring match).
    pub fn find_browser_by_mpris(&self, identity: &str) -> Option<&BrowserDef> {
        let identity_lower = identity.to_lowercase();
        self.browsers.iter().find(|b| {
            b.enabled
                && b.mpris_identities
                    .iter()
                    .any(|id| identity_lower.contains(&id.to_lowercase()))
        })
    }

    /// Tag a window by the executable that owns it.
    pub fn source_for_executable(&self, exe_name: &str) -> TitleSource {
        if let Some(app) = self.find_app_by_executable(exe_name) {
            return TitleSource::NativeApp(app.service);
        }
        if let Some(browser) = self.find_browser_by_executable(exe_name) {
            return TitleSource::Browser(browser.name.clone());
        }
        TitleSource::Window
    }

    /// Tag an MPRIS player by its identity.
    pub fn source_for_mpris(&self, identity: &str) -> TitleSource {
        if let Some(app) = self.find_app_by_mpris(identity) {
            return TitleSource::NativeApp(app.service);
        }
        if let Some(browser) = self.find_browser_by_mpris(identity) {
            return TitleSource::Browser(browser.name.clone());
        }
        TitleSource::Window
    }
}
