//! Presence publishing: connection lifecycle and payload mapping.
//!
//! The [`Publisher`] connects lazily, picks the presence identity per
//! service, and bounds every client call with a timeout. A failed call drops
//! the connection; the next call reconnects.

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::PresenceConfig;
use crate::error::PresenceError;
use crate::models::{ResolvedMetadata, Service, WatchFact};

/// Longest text the presence card shows without cutting.
pub const MAX_TEXT_LEN: usize = 100;

/// A rich-presence backend (Discord IPC in the app, fakes in tests).
pub trait PresenceClient: Send {
    fn connect(&mut self, identity: &str) -> impl Future<Output = Result<(), PresenceError>> + Send;

    fn set_status(
        &mut self,
        payload: &PresencePayload,
    ) -> impl Future<Output = Result<(), PresenceError>> + Send;

    fn clear_status(&mut self) -> impl Future<Output = Result<(), PresenceError>> + Send;

    fn disconnect(&mut self) -> impl Future<Output = Result<(), PresenceError>> + Send;
}

/// What the presence card shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PresencePayload {
    /// First line: show or movie title.
    pub details: String,
    /// Second line: episode or service.
    pub state: String,
    pub large_image: String,
    pub large_text: String,
    pub small_image: Option<String>,
    pub small_text: Option<String>,
    /// Unix seconds; the card counts up from here.
    pub started_at: i64,
    pub button: Option<PresenceButton>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PresenceButton {
    pub label: String,
    pub url: String,
}

/// Presence application ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identities {
    pub default: String,
    pub netflix: Option<String>,
    pub disney_plus: Option<String>,
}

impl Identities {
    /// The identity to publish under: the service's own if configured,
    /// otherwise the default.
    pub fn for_service(&self, service: Service) -> &str {
        let dedicated = match service {
            Service::Netflix => self.netflix.as_deref(),
            Service::DisneyPlus => self.disney_plus.as_deref(),
        };
        dedicated.unwrap_or(&self.default)
    }
}

#[derive(Debug, Clone)]
pub struct PublisherSettings {
    pub identities: Identities,
    pub show_buttons: bool,
    pub timeout: Duration,
}

impl From<&PresenceConfig> for PublisherSettings {
    fn from(config: &PresenceConfig) -> Self {
        Self {
            identities: Identities {
                default: config.client_id.clone().unwrap_or_default(),
                netflix: config.service_client_id(Service::Netflix).map(str::to_string),
                disney_plus: config
                    .service_client_id(Service::DisneyPlus)
                    .map(str::to_string),
            },
            show_buttons: config.show_buttons,
            timeout: config.timeout(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected { identity: String },
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected { .. })
    }
}

pub struct Publisher<C> {
    client: C,
    settings: PublisherSettings,
    state: ConnectionState,
    /// Identity of the last successful connection, reused by `clear`.
    last_identity: Option<String>,
}

impl<C: PresenceClient> Publisher<C> {
    pub fn new(client: C, settings: PublisherSettings) -> Self {
        Self {
            client,
            settings,
            state: ConnectionState::Disconnected,
            last_identity: None,
        }
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    /// Show a fact on the presence card.
    pub async fn publish(
        &mut self,
        fact: &WatchFact,
        metadata: &ResolvedMetadata,
        started_at: DateTime<Utc>,
    ) -> Result<(), PresenceError> {
        let identity = self.settings.identities.for_service(fact.service).to_string();
        self.ensure_identity(&identity).await?;

        let payload = build_payload(fact, metadata, started_at, self.settings.show_buttons);
        debug!(details = %payload.details, state = %payload.state, "Publishing presence");
        let result = bounded(self.settings.timeout, self.client.set_status(&payload)).await;
        self.settle("publish", result).await
    }

    /// Remove the presence card.
    ///
    /// A no-op if nothing was ever connected in this process.
    pub async fn clear(&mut self) -> Result<(), PresenceError> {
        let Some(identity) = self.last_identity.clone() else {
            return Ok(());
        };
        if !self.state.is_connected() {
            self.connect(&identity).await?;
        }
        let result = bounded(self.settings.timeout, self.client.clear_status()).await;
        self.settle("clear", result).await
    }

    /// Close the connection if one is open.
    pub async fn disconnect(&mut self) -> Result<(), PresenceError> {
        if !self.state.is_connected() {
            return Ok(());
        }
        let result = bounded(self.settings.timeout, self.client.disconnect()).await;
        self.state = ConnectionState::Disconnected;
        result
    }

    async fn ensure_identity(&mut self, identity: &str) -> Result<(), PresenceError> {
        if let ConnectionState::Connected { identity: current } = &self.state {
            if current == identity {
                return Ok(());
            }
            debug!(from = %current, to = %identity, "Switching presence identity");
            self.drop_connection().await;
        }
        self.connect(identity).await
    }

    async fn connect(&mut self, identity: &str) -> Result<(), PresenceError> {
        self.state = ConnectionState::Connecting;
        match bounded(self.settings.timeout, self.client.connect(identity)).await {
            Ok(()) => {
                info!(identity, "Connected to presence service");
                self.state = ConnectionState::Connected {
                    identity: identity.to_string(),
                };
                self.last_identity = Some(identity.to_string());
                Ok(())
            }
            Err(e) => {
                debug!(identity, error = %e, "Presence service not available");
                self.state = ConnectionState::Disconnected;
                Err(e)
            }
        }
    }

    /// On failure, drop the connection so the next call starts fresh.
    async fn settle(
        &mut self,
        op: &'static str,
        result: Result<(), PresenceError>,
    ) -> Result<(), PresenceError> {
        if let Err(e) = &result {
            warn!(op, error = %e, "Presence call failed, will reconnect");
            self.drop_connection().await;
        }
        result
    }

    async fn drop_connection(&mut self) {
        if let Err(e) = bounded(self.settings.timeout, self.client.disconnect()).await {
            debug!(error = %e, "Disconnect failed");
        }
        self.state = ConnectionState::Disconnected;
    }
}

async fn bounded<F>(limit: Duration, call: F) -> Result<(), PresenceError>
where
    F: Future<Output = Result<(), PresenceError>>,
{
    tokio::time::timeout(limit, call)
        .await
        .unwrap_or(Err(PresenceError::Timeout))
}

// ── Payload mapping ──────────────────────────────────────────────

/// Artwork key uploaded to the presence application for each service.
pub fn asset_key(service: Service) -> &'static str {
    match service {
        Service::Netflix => "netflix",
        Service::DisneyPlus => "disney",
    }
}

pub fn home_url(service: Service) -> &'static str {
    match service {
        Service::Netflix => "https://www.netflix.com",
        Service::DisneyPlus => "https://www.disneyplus.com",
    }
}

/// Second line of the card: `"S4 E9 · The Piggyback"` for episodes,
/// `"Watching on Netflix"` otherwise.
pub fn state_line(fact: &WatchFact) -> String {
    match fact.number {
        Some(number) => match fact.episode_title.as_deref().filter(|t| !t.is_empty()) {
            Some(title) => format!("{number} · {title}"),
            None => number.to_string(),
        },
        None => format!("Watching on {}", fact.service),
    }
}

/// Cut text to [`MAX_TEXT_LEN`] characters, ending in `...` when cut.
pub fn truncate(text: &str) -> String {
    if text.chars().count() <= MAX_TEXT_LEN {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(MAX_TEXT_LEN - 3).collect();
    cut.push_str("...");
    cut
}

pub fn build_payload(
    fact: &WatchFact,
    metadata: &ResolvedMetadata,
    started_at: DateTime<Utc>,
    show_buttons: bool,
) -> PresencePayload {
    let service = fact.service;
    let watching_on = format!("Watching on {service}");

    let (large_image, small_image, small_text) = match &metadata.poster_image_key {
        Some(poster) => (
            poster.clone(),
            Some(asset_key(service).to_string()),
            Some(service.display_name().to_string()),
        ),
        None => (asset_key(service).to_string(), None, None),
    };

    PresencePayload {
        details: truncate(&fact.display_title),
        state: truncate(&state_line(fact)),
        large_image,
        large_text: truncate(metadata.canonical_title.as_deref().unwrap_or(&watching_on)),
        small_image,
        small_text,
        started_at: started_at.timestamp(),
        button: show_buttons.then(|| PresenceButton {
            label: format!("Watch on {service}"),
            url: home_url(service).to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use reelcast_parse::{classify, RawTitle};

    use super::*;
    use crate::models::EpisodeNumber;
    use crate::testing::{ClientCall, FakeClient};

    fn settings() -> PublisherSettings {
        PublisherSettings {
            identities: Identities {
                default: "default-app".into(),
                netflix: None,
                disney_plus: Some("disney-app".into()),
            },
            show_buttons: true,
            timeout: Duration::from_secs(5),
        }
    }

    fn started() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 17, 20, 0, 0).unwrap()
    }

    fn piggyback() -> WatchFact {
        WatchFact::episode(
            Service::Netflix,
            "Stranger Things",
            EpisodeNumber::new(4, 9).unwrap(),
            Some("The Piggyback".into()),
        )
    }

    fn poster() -> ResolvedMetadata {
        ResolvedMetadata {
            poster_image_key: Some("https://image.tmdb.org/t/p/w500/st4.jpg".into()),
            canonical_title: Some("Stranger Things".into()),
        }
    }

    #[test]
    fn test_episode_payload() {
        let payload = build_payload(&piggyback(), &poster(), started(), true);
        assert_eq!(payload.details, "Stranger Things");
        assert_eq!(payload.state, "S4 E9 · The Piggyback");
        assert_eq!(payload.large_image, "https://image.tmdb.org/t/p/w500/st4.jpg");
        assert_eq!(payload.large_text, "Stranger Things");
        assert_eq!(payload.small_image.as_deref(), Some("netflix"));
        assert_eq!(payload.started_at, started().timestamp());
        let button = payload.button.unwrap();
        assert_eq!(button.label, "Watch on Netflix");
        assert_eq!(button.url, "https://www.netflix.com");
    }

    #[test]
    fn test_movie_payload_without_metadata() {
        let fact = WatchFact::movie(Service::DisneyPlus, "The Mandalorian");
        let payload = build_payload(&fact, &ResolvedMetadata::none(), started(), false);
        assert_eq!(payload.details, "The Mandalorian");
        assert_eq!(payload.state, "Watching on Disney+");
        assert_eq!(payload.large_image, "disney");
        assert_eq!(payload.large_text, "Watching on Disney+");
        assert_eq!(payload.small_image, None);
        assert_eq!(payload.button, None);
    }

    #[test]
    fn test_episode_without_title() {
        let fact = WatchFact::episode(Service::Netflix, "Dark", EpisodeNumber::new(1, 2).unwrap(), None);
        assert_eq!(state_line(&fact), "S1 E2");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Loki"), "Loki");
        let exact = "x".repeat(MAX_TEXT_LEN);
        assert_eq!(truncate(&exact), exact);

        let long = "é".repeat(150);
        let cut = truncate(&long);
        assert_eq!(cut.chars().count(), MAX_TEXT_LEN);
        assert!(cut.ends_with("..."));
    }

    #[test]
    fn test_rendered_episode_reparses() {
        for (season, episode) in [(1, 1), (4, 9), (12, 104)] {
            let fact = WatchFact::episode(
                Service::Netflix,
                "Stranger Things",
                EpisodeNumber::new(season, episode).unwrap(),
                Some("Chapter One".into()),
            );
            let payload = build_payload(&fact, &ResolvedMetadata::none(), started(), false);
            let title = format!("{} - {} - Netflix", payload.details, payload.state);

            let reparsed = classify(&RawTitle::browser("Chrome", title)).unwrap();
            assert_eq!(reparsed.number, fact.number);
            assert_eq!(reparsed.episode_title.as_deref(), Some("Chapter One"));
            assert_eq!(reparsed, fact);
        }
    }

    #[test]
    fn test_identity_selection() {
        let ids = settings().identities;
        assert_eq!(ids.for_service(Service::Netflix), "default-app");
        assert_eq!(ids.for_service(Service::DisneyPlus), "disney-app");
    }

    #[tokio::test]
    async fn test_publish_connects_lazily_once() {
        let client = FakeClient::default();
        let mut publisher = Publisher::new(client.clone(), settings());
        assert_eq!(publisher.state(), &ConnectionState::Disconnected);

        publisher.publish(&piggyback(), &poster(), started()).await.unwrap();
        publisher.publish(&piggyback(), &poster(), started()).await.unwrap();

        assert_eq!(client.connects(), vec!["default-app".to_string()]);
        assert_eq!(client.publishes().len(), 2);
        assert_eq!(
            publisher.state(),
            &ConnectionState::Connected { identity: "default-app".into() }
        );
    }

    #[tokio::test]
    async fn test_service_switch_changes_identity() {
        let client = FakeClient::default();
        let mut publisher = Publisher::new(client.clone(), settings());

        publisher.publish(&piggyback(), &poster(), started()).await.unwrap();
        let loki = WatchFact::movie(Service::DisneyPlus, "Loki");
        publisher.publish(&loki, &ResolvedMetadata::none(), started()).await.unwrap();

        let lifecycle: Vec<ClientCall> = client
            .calls()
            .into_iter()
            .filter(|c| !matches!(c, ClientCall::SetStatus(_)))
            .collect();
        assert_eq!(
            lifecycle,
            vec![
                ClientCall::Connect("default-app".into()),
                ClientCall::Disconnect,
                ClientCall::Connect("disney-app".into()),
            ]
        );
        assert_eq!(
            publisher.state(),
            &ConnectionState::Connected { identity: "disney-app".into() }
        );
    }

    #[tokio::test]
    async fn test_send_failure_disconnects_then_reconnects() {
        let client = FakeClient::default();
        let mut publisher = Publisher::new(client.clone(), settings());

        client.fail_send(true);
        let err = publisher.publish(&piggyback(), &poster(), started()).await.unwrap_err();
        assert!(matches!(err, PresenceError::Send(_)));
        assert_eq!(publisher.state(), &ConnectionState::Disconnected);

        client.fail_send(false);
        publisher.publish(&piggyback(), &poster(), started()).await.unwrap();
        assert_eq!(client.connects().len(), 2);
        assert!(publisher.state().is_connected());
    }

    #[tokio::test]
    async fn test_connect_failure_is_reported() {
        let client = FakeClient::default();
        client.fail_connect(true);
        let mut publisher = Publisher::new(client.clone(), settings());

        let err = publisher.publish(&piggyback(), &poster(), started()).await.unwrap_err();
        assert!(matches!(err, PresenceError::Connect(_)));
        assert_eq!(publisher.state(), &ConnectionState::Disconnected);
        assert!(client.publishes().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_call_times_out() {
        let client = FakeClient::default();
        let mut publisher = Publisher::new(client.clone(), settings());
        publisher.publish(&piggyback(), &poster(), started()).await.unwrap();

        client.hang(true);
        let err = publisher.publish(&piggyback(), &poster(), started()).await.unwrap_err();
        assert_eq!(err, PresenceError::Timeout);
        assert_eq!(publisher.state(), &ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_clear_without_connection_is_noop() {
        let client = FakeClient::default();
        let mut publisher = Publisher::new(client.clone(), settings());

        publisher.clear().await.unwrap();
        publisher.disconnect().await.unwrap();
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn test_clear_reconnects_with_last_identity() {
        let client = FakeClient::default();
        let mut publisher = Publisher::new(client.clone(), settings());
        let loki = WatchFact::movie(Service::DisneyPlus, "Loki");

        publisher.publish(&loki, &ResolvedMetadata::none(), started()).await.unwrap();
        publisher.disconnect().await.unwrap();
        publisher.clear().await.unwrap();

        let calls = client.calls();
        assert_eq!(calls[calls.len() - 2], ClientCall::Connect("disney-app".into()));
        assert_eq!(calls[calls.len() - 1], ClientCall::Clear);
    }
}
