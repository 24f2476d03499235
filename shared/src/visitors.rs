//! Visitor registry - a record of the display names that have used the widget
//!
//! The remote side is a swappable [`VisitorRegistry`]. Remote calls run on a
//! worker thread and report back through [`VisitorSync::poll`]; when they fail
//! the caller keeps the same records in the local store instead.

use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::{read_json, write_json, ConfigError, KeyValueStore};

pub const LOCAL_VISITORS_KEY: &str = "timezonebuddy-all-visitors";

const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Visitor {
    pub name: String,
    /// RFC 3339
    pub timestamp: String,
    /// e.g. "6/1/2024"
    pub date: String,
}

impl Visitor {
    pub fn new(name: &str, now: DateTime<Utc>, zone: Tz) -> Self {
        Self {
            name: name.to_string(),
            timestamp: now.to_rfc3339_opts(SecondsFormat::Millis, true),
            date: now.with_timezone(&zone).format("%-m/%-d/%Y").to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("HTTP error: {0}")]
    Http(#[from] Box<ureq::Error>),
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },
    #[error("Response error: {0}")]
    Io(#[from] std::io::Error),
    #[error("No visitor registry configured")]
    NotConfigured,
}

impl From<ureq::Error> for RegistryError {
    fn from(e: ureq::Error) -> Self {
        match e {
            ureq::Error::Status(status, resp) => RegistryError::Api {
                status,
                message: resp.into_string().unwrap_or_default(),
            },
            other => RegistryError::Http(Box::new(other)),
        }
    }
}

/// Remote list of visitors, replaced wholesale on publish
pub trait VisitorRegistry: Send + Sync {
    fn fetch_all(&self) -> Result<Vec<Visitor>, RegistryError>;
    fn publish_all(&self, visitors: &[Visitor]) -> Result<(), RegistryError>;
}

/// JSON bin over HTTP
///
/// `GET <url>/latest` answers `{"record": {"visitors": [...]}}`;
/// `PUT <url>` takes `{"visitors": [...]}`.
pub struct HttpRegistry {
    agent: ureq::Agent,
    url: String,
    key: Option<String>,
}

#[derive(Deserialize)]
struct BinResponse {
    record: BinRecord,
}

#[derive(Serialize, Deserialize, Default)]
struct BinRecord {
    #[serde(default)]
    visitors: Vec<Visitor>,
}

#[derive(Serialize)]
struct BinUpdate<'a> {
    visitors: &'a [Visitor],
}

impl HttpRegistry {
    pub fn new(url: impl Into<String>, key: Option<String>) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().timeout(HTTP_TIMEOUT).build(),
            url: url.into().trim_end_matches('/').to_string(),
            key,
        }
    }

    fn with_key(&self, request: ureq::Request) -> ureq::Request {
        match &self.key {
            Some(key) => request.set("X-Master-Key", key),
            None => request,
        }
    }
}

impl VisitorRegistry for HttpRegistry {
    fn fetch_all(&self) -> Result<Vec<Visitor>, RegistryError> {
        let request = self.with_key(self.agent.get(&format!("{}/latest", self.url)));
        let response: BinResponse = request.call()?.into_json()?;
        Ok(response.record.visitors)
    }

    fn publish_all(&self, visitors: &[Visitor]) -> Result<(), RegistryError> {
        let request = self.with_key(self.agent.put(&self.url));
        request.send_json(BinUpdate { visitors })?;
        Ok(())
    }
}

/// Visitors kept in the local store
pub fn local_visitors(store: &dyn KeyValueStore) -> Vec<Visitor> {
    match read_json::<Vec<Visitor>>(store, LOCAL_VISITORS_KEY) {
        Ok(list) => list.unwrap_or_default(),
        Err(e) => {
            warn!("Discarding unreadable local visitor list: {}", e);
            Vec::new()
        }
    }
}

/// Store a visitor locally unless one with the same name is already there
pub fn save_visitor_locally(
    store: &mut dyn KeyValueStore,
    visitor: &Visitor,
) -> Result<bool, ConfigError> {
    let mut list = local_visitors(store);
    if list.iter().any(|v| v.name == visitor.name) {
        return Ok(false);
    }
    list.push(visitor.clone());
    write_json(store, LOCAL_VISITORS_KEY, &list)?;
    Ok(true)
}

/// Fetch the remote list (or `fallback` if that fails), append and publish
pub fn register_with(
    registry: &dyn VisitorRegistry,
    fallback: Vec<Visitor>,
    visitor: &Visitor,
) -> Result<(), RegistryError> {
    let mut visitors = registry.fetch_all().unwrap_or_else(|e| {
        debug!("Could not fetch visitors, using local list: {}", e);
        fallback
    });
    visitors.push(visitor.clone());
    registry.publish_all(&visitors)
}

/// Remote list, or `fallback` if the registry can't be reached
pub fn list_with(registry: &dyn VisitorRegistry, fallback: Vec<Visitor>) -> Vec<Visitor> {
    match registry.fetch_all() {
        Ok(list) => list,
        Err(e) => {
            warn!("Could not fetch visitors, using local list: {}", e);
            fallback
        }
    }
}

/// Result of a background registry call
#[derive(Debug)]
pub enum SyncEvent {
    Registered(Visitor),
    /// Registration didn't reach the registry; keep it locally
    RegisterFailed(Visitor, RegistryError),
    Listed(Vec<Visitor>),
}

/// Fire-and-forget front for a registry
#[derive(Clone, Default)]
pub struct VisitorSync {
    registry: Option<Arc<dyn VisitorRegistry>>,
    results: Arc<Mutex<Vec<SyncEvent>>>,
}

impl VisitorSync {
    pub fn new(registry: Option<Arc<dyn VisitorRegistry>>) -> Self {
        Self {
            registry,
            results: Arc::default(),
        }
    }

    pub fn is_remote(&self) -> bool {
        self.registry.is_some()
    }

    fn push(results: &Arc<Mutex<Vec<SyncEvent>>>, event: SyncEvent) {
        if let Ok(mut guard) = results.lock() {
            guard.push(event);
        }
    }

    /// Register a visitor in the background
    ///
    /// `local` is the current local list, used as the base if the remote
    /// list can't be fetched.
    pub fn register(&self, visitor: Visitor, local: Vec<Visitor>) {
        let Some(registry) = self.registry.clone() else {
            Self::push(
                &self.results,
                SyncEvent::RegisterFailed(visitor, RegistryError::NotConfigured),
            );
            return;
        };

        let results = self.results.clone();
        thread::spawn(move || {
            let event = match register_with(registry.as_ref(), local, &visitor) {
                Ok(()) => SyncEvent::Registered(visitor),
                Err(e) => SyncEvent::RegisterFailed(visitor, e),
            };
            Self::push(&results, event);
        });
    }

    /// Fetch the visitor list in the background
    pub fn refresh(&self, local: Vec<Visitor>) {
        let Some(registry) = self.registry.clone() else {
            Self::push(&self.results, SyncEvent::Listed(local));
            return;
        };

        let results = self.results.clone();
        thread::spawn(move || {
            let list = list_with(registry.as_ref(), local);
            Self::push(&results, SyncEvent::Listed(list));
        });
    }

    /// Drain finished background calls
    pub fn poll(&self) -> Vec<SyncEvent> {
        match self.results.try_lock() {
            Ok(mut guard) => std::mem::take(&mut *guard),
            Err(_) => Vec::new(),
        }
    }
}
