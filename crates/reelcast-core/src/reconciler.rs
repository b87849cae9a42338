//! The watch-session state machine and poll loop.
//!
//! Each tick feeds the first classified title (or nothing) into
//! [`Reconciler::tick`], which decides whether to publish, refresh, hold or
//! clear presence. The [`PresenceSession`] is owned here and nowhere else.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reelcast_api::MetadataSearch;
use reelcast_detect::TitleProvider;
use reelcast_parse::{sanitize_for_log, Classifier};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, trace, warn};

use crate::config::AppConfig;
use crate::models::{RawTitle, ResolvedMetadata, SessionState, WatchFact};
use crate::publisher::{PresenceClient, Publisher};
use crate::resolver::MetadataResolver;

#[derive(Debug, Clone, Copy)]
pub struct ReconcilerSettings {
    pub poll_interval: Duration,
    /// Consecutive empty ticks before presence is cleared.
    pub miss_threshold: u32,
    /// Upper bound on one title sampling pass.
    pub sample_timeout: Duration,
}

impl Default for ReconcilerSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            miss_threshold: 3,
            sample_timeout: Duration::from_secs(3),
        }
    }
}

impl From<&AppConfig> for ReconcilerSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            poll_interval: config.general.poll_interval(),
            miss_threshold: config.general.miss_threshold,
            sample_timeout: config.detection.timeout(),
        }
    }
}

/// What the reconciler currently shows.
#[derive(Debug, Clone)]
pub struct PresenceSession {
    pub state: SessionState,
    pub current: Option<WatchFact>,
    pub current_metadata: Option<ResolvedMetadata>,
    /// When the current fact was first published.
    pub last_change_at: DateTime<Utc>,
    pub consecutive_misses: u32,
}

impl PresenceSession {
    pub fn new() -> Self {
        Self {
            state: SessionState::Idle,
            current: None,
            current_metadata: None,
            last_change_at: Utc::now(),
            consecutive_misses: 0,
        }
    }
}

impl Default for PresenceSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of one tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// A new or different fact was published.
    Published,
    /// Same fact with new descriptive text; republished, timestamp kept.
    Refreshed,
    /// Nothing to do.
    Unchanged,
    /// No fact this tick, but below the miss threshold.
    Held { misses: u32 },
    /// Miss threshold reached; presence cleared.
    Cleared,
    /// Publishing failed; the session is unchanged and the next tick retries.
    PublishFailed,
}

pub struct Reconciler<S, C> {
    classifier: Classifier,
    resolver: MetadataResolver<S>,
    publisher: Publisher<C>,
    settings: ReconcilerSettings,
    session: PresenceSession,
}

impl<S, C> Reconciler<S, C>
where
    S: MetadataSearch,
    C: PresenceClient,
{
    pub fn new(
        classifier: Classifier,
        resolver: MetadataResolver<S>,
        publisher: Publisher<C>,
        settings: ReconcilerSettings,
    ) -> Self {
        Self {
            classifier,
            resolver,
            publisher,
            settings,
            session: PresenceSession::new(),
        }
    }

    pub fn session(&self) -> &PresenceSession {
        &self.session
    }

    pub fn resolver(&self) -> &MetadataResolver<S> {
        &self.resolver
    }

    pub fn publisher(&self) -> &Publisher<C> {
        &self.publisher
    }

    /// Classify titles in enumeration order; the first match wins.
    pub fn classify(&self, titles: &[RawTitle]) -> Option<WatchFact> {
        self.classifier.first_match(titles)
    }

    /// Advance the state machine by one observation.
    pub async fn tick(&mut self, observed: Option<WatchFact>) -> TickOutcome {
        match observed {
            Some(fact) => self.observe(fact).await,
            None => self.miss().await,
        }
    }

    async fn observe(&mut self, fact: WatchFact) -> TickOutcome {
        if self.session.state == SessionState::Watching {
            if let Some(current) = &self.session.current {
                if *current == fact {
                    self.session.consecutive_misses = 0;
                    if current.refreshed_by(&fact) {
                        return self.refresh(fact).await;
                    }
                    return TickOutcome::Unchanged;
                }
            }
        }

        let metadata = self.resolver.resolve(&fact).await;
        let now = Utc::now();
        if let Err(e) = self.publisher.publish(&fact, &metadata, now).await {
            warn!(fact = %fact, error = %e, "Publish failed, retrying next tick");
            return TickOutcome::PublishFailed;
        }

        self.commit(PresenceSession {
            state: SessionState::Watching,
            current: Some(fact),
            current_metadata: Some(metadata),
            last_change_at: now,
            consecutive_misses: 0,
        });
        TickOutcome::Published
    }

    /// Same fact, new episode title: republish the text only.
    async fn refresh(&mut self, fact: WatchFact) -> TickOutcome {
        let metadata = self.session.current_metadata.clone().unwrap_or_default();
        let started_at = self.session.last_change_at;
        if let Err(e) = self.publisher.publish(&fact, &metadata, started_at).await {
            warn!(fact = %fact, error = %e, "Refresh failed, retrying next tick");
            return TickOutcome::PublishFailed;
        }
        debug!(
            fact = %fact,
            episode_title = ?fact.episode_title,
            "Refreshed presence text"
        );
        self.session.current = Some(fact);
        TickOutcome::Refreshed
    }

    async fn miss(&mut self) -> TickOutcome {
        if self.session.state != SessionState::Watching {
            return TickOutcome::Unchanged;
        }

        self.session.consecutive_misses += 1;
        let misses = self.session.consecutive_misses;
        if misses < self.settings.miss_threshold {
            debug!(misses, threshold = self.settings.miss_threshold, "Detection miss, holding presence");
            return TickOutcome::Held { misses };
        }

        if let Err(e) = self.publisher.clear().await {
            warn!(error = %e, "Clearing presence failed");
        }
        self.commit(PresenceSession {
            state: SessionState::Degraded,
            current: None,
            current_metadata: None,
            last_change_at: Utc::now(),
            consecutive_misses: misses,
        });
        TickOutcome::Cleared
    }

    /// Replace the session and log the transition.
    fn commit(&mut self, next: PresenceSession) {
        let prev = std::mem::replace(&mut self.session, next);
        info!(
            from = %prev.state,
            to = %self.session.state,
            before = %describe(prev.current.as_ref()),
            after = %describe(self.session.current.as_ref()),
            "Session transition"
        );
    }

    /// Poll until `shutdown` completes, then clear and disconnect.
    pub async fn run<P, F>(&mut self, source: Arc<P>, shutdown: F)
    where
        P: TitleProvider + 'static,
        F: Future<Output = ()>,
    {
        let mut sampler = TitleSampler::new(source, self.settings.sample_timeout);
        let mut ticker = tokio::time::interval(self.settings.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        info!(
            interval = ?self.settings.poll_interval,
            miss_threshold = self.settings.miss_threshold,
            "Watching for playback"
        );

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = ticker.tick() => {
                    let titles = sampler.sample().await;
                    let observed = self.classify(&titles);
                    self.tick(observed).await;
                }
            }
        }

        self.shutdown().await;
    }

    /// Best-effort clear and disconnect.
    pub async fn shutdown(&mut self) {
        info!("Shutting down, clearing presence");
        if let Err(e) = self.publisher.clear().await {
            warn!(error = %e, "Final presence clear failed");
        }
        if let Err(e) = self.publisher.disconnect().await {
            debug!(error = %e, "Disconnect failed");
        }
    }
}

/// Samples titles on a blocking thread, bounded by a timeout.
///
/// A pass that times out keeps running on its thread; until it finishes,
/// later passes are skipped instead of piling up more blocked threads.
pub struct TitleSampler<P> {
    source: Arc<P>,
    limit: Duration,
    pending: Option<JoinHandle<Vec<RawTitle>>>,
}

impl<P> TitleSampler<P>
where
    P: TitleProvider + 'static,
{
    pub fn new(source: Arc<P>, limit: Duration) -> Self {
        Self {
            source,
            limit,
            pending: None,
        }
    }

    /// Whether an earlier timed-out pass is still running.
    pub fn is_busy(&self) -> bool {
        self.pending.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// One sampling pass. A timeout, panic or busy sampler yields no titles.
    pub async fn sample(&mut self) -> Vec<RawTitle> {
        if self.is_busy() {
            debug!("Previous title sampling still running, skipping this pass");
            return Vec::new();
        }
        // Finished late; its titles are stale by now.
        self.pending = None;

        let source = self.source.clone();
        let mut task = tokio::task::spawn_blocking(move || source.list_titles());
        match tokio::time::timeout(self.limit, &mut task).await {
            Ok(Ok(titles)) => {
                for title in &titles {
                    trace!(source = ?title.source, title = %sanitize_for_log(&title.text), "Sampled title");
                }
                titles
            }
            Ok(Err(e)) => {
                warn!(error = %e, "Title sampling failed");
                Vec::new()
            }
            Err(_) => {
                warn!(timeout = ?self.limit, "Title sampling timed out");
                self.pending = Some(task);
                Vec::new()
            }
        }
    }
}

fn describe(fact: Option<&WatchFact>) -> String {
    fact.map_or_else(|| "none".to_string(), ToString::to_string)
}
