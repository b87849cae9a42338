//! In-memory fakes for the metadata and presence capabilities.

use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use reelcast_api::{Candidate, MediaKind, MetadataSearch};

use crate::error::PresenceError;
use crate::publisher::{PresenceClient, PresencePayload};

pub fn candidate(title: &str, poster: &str) -> Candidate {
    Candidate {
        id: 1,
        kind: MediaKind::Tv,
        title: title.into(),
        image_ref: Some(format!("https://image.tmdb.org/t/p/w500{poster}")),
        year: None,
        score: 100.0,
    }
}

#[derive(Debug, thiserror::Error)]
#[error("metadata service unavailable")]
pub struct FakeSearchError;

#[derive(Default)]
struct SearchState {
    calls: AtomicUsize,
    results: Mutex<Option<Vec<Candidate>>>,
    last_query: Mutex<Option<(String, Option<u32>)>>,
}

/// Counts calls and answers with canned results (`None` = error).
#[derive(Clone, Default)]
pub struct FakeSearch {
    state: Arc<SearchState>,
    delay: Option<Duration>,
}

impl FakeSearch {
    pub fn returning(results: Vec<Candidate>) -> Self {
        let search = Self::default();
        search.set_results(results);
        search
    }

    pub fn failing() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn set_results(&self, results: Vec<Candidate>) {
        *self.state.results.lock().unwrap() = Some(results);
    }

    pub fn calls(&self) -> usize {
        self.state.calls.load(Ordering::SeqCst)
    }

    pub fn last_query(&self) -> Option<(String, Option<u32>)> {
        self.state.last_query.lock().unwrap().clone()
    }
}

impl MetadataSearch for FakeSearch {
    type Error = FakeSearchError;

    fn search(
        &self,
        title: &str,
        hint_season: Option<u32>,
    ) -> impl Future<Output = Result<Vec<Candidate>, FakeSearchError>> + Send {
        self.state.calls.fetch_add(1, Ordering::SeqCst);
        *self.state.last_query.lock().unwrap() = Some((title.to_string(), hint_season));
        let results = self.state.results.lock().unwrap().clone();
        let delay = self.delay;

        async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            results.ok_or(FakeSearchError)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientCall {
    Connect(String),
    SetStatus(PresencePayload),
    Clear,
    Disconnect,
}

#[derive(Default)]
struct ClientState {
    calls: Mutex<Vec<ClientCall>>,
    fail_connect: AtomicBool,
    fail_send: AtomicBool,
    fail_clear: AtomicBool,
    hang: AtomicBool,
}

/// Records every presence call; failures are switched on per call kind.
#[derive(Clone, Default)]
pub struct FakeClient {
    state: Arc<ClientState>,
}

impl FakeClient {
    pub fn calls(&self) -> Vec<ClientCall> {
        self.state.calls.lock().unwrap().clone()
    }

    pub fn publishes(&self) -> Vec<PresencePayload> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                ClientCall::SetStatus(p) => Some(p),
                _ => None,
            })
            .collect()
    }

    pub fn connects(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                ClientCall::Connect(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    pub fn clears(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, ClientCall::Clear))
            .count()
    }

    pub fn fail_connect(&self, on: bool) {
        self.state.fail_connect.store(on, Ordering::SeqCst);
    }

    pub fn fail_send(&self, on: bool) {
        self.state.fail_send.store(on, Ordering::SeqCst);
    }

    pub fn fail_clear(&self, on: bool) {
        self.state.fail_clear.store(on, Ordering::SeqCst);
    }

    /// Make every later call never complete.
    pub fn hang(&self, on: bool) {
        self.state.hang.store(on, Ordering::SeqCst);
    }

    fn record(
        &self,
        call: ClientCall,
        fail: Option<PresenceError>,
    ) -> impl Future<Output = Result<(), PresenceError>> + Send {
        self.state.calls.lock().unwrap().push(call);
        let hang = self.state.hang.load(Ordering::SeqCst);

        async move {
            if hang {
                std::future::pending::<()>().await;
            }
            fail.map_or(Ok(()), Err)
        }
    }
}

impl PresenceClient for FakeClient {
    fn connect(&mut self, identity: &str) -> impl Future<Output = Result<(), PresenceError>> + Send {
        let fail = self
            .state
            .fail_connect
            .load(Ordering::SeqCst)
            .then(|| PresenceError::Connect("client not running".into()));
        self.record(ClientCall::Connect(identity.to_string()), fail)
    }

    fn set_status(
        &mut self,
        payload: &PresencePayload,
    ) -> impl Future<Output = Result<(), PresenceError>> + Send {
        let fail = self
            .state
            .fail_send
            .load(Ordering::SeqCst)
            .then(|| PresenceError::Send("pipe closed".into()));
        self.record(ClientCall::SetStatus(payload.clone()), fail)
    }

    fn clear_status(&mut self) -> impl Future<Output = Result<(), PresenceError>> + Send {
        let fail = self
            .state
            .fail_clear
            .load(Ordering::SeqCst)
            .then(|| PresenceError::Send("pipe closed".into()));
        self.record(ClientCall::Clear, fail)
    }

    fn disconnect(&mut self) -> impl Future<Output = Result<(), PresenceError>> + Send {
        self.record(ClientCall::Disconnect, None)
    }
}
