//! Activity log and usage counters kept in the local store

use chrono::{DateTime, SecondsFormat, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::{read_json, write_json, ConfigError, KeyValueStore};

pub const ACTIVITY_KEY: &str = "timezoneBuddy-activity";
pub const THEME_TOGGLES_KEY: &str = "timezoneBuddy-themeToggles";
pub const USER_NAME_KEY: &str = "timezoneBuddy-userName";

/// Oldest entries are dropped past this many
pub const MAX_ACTIVITY_ENTRIES: usize = 50;
/// Entries shown on the dashboard
pub const RECENT_ACTIVITY_COUNT: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityEntry {
    /// Local wall time, e.g. "3:04:05 PM"
    pub time: String,
    pub action: String,
    /// RFC 3339
    pub timestamp: String,
}

/// Capped, persisted list of user actions
#[derive(Debug, Clone)]
pub struct ActivityLog {
    entries: Vec<ActivityEntry>,
    zone: Tz,
}

impl ActivityLog {
    /// Load the persisted log; an unreadable log starts empty
    pub fn load(store: &dyn KeyValueStore, zone: Tz) -> Self {
        let entries = match read_json::<Vec<ActivityEntry>>(store, ACTIVITY_KEY) {
            Ok(entries) => entries.unwrap_or_default(),
            Err(e) => {
                warn!("Discarding unreadable activity log: {}", e);
                Vec::new()
            }
        };
        Self { entries, zone }
    }

    pub fn entries(&self) -> &[ActivityEntry] {
        &self.entries
    }

    /// Append an action, trim to the cap and persist
    pub fn record(&mut self, store: &mut dyn KeyValueStore, action: &str, now: DateTime<Utc>) {
        let local = now.with_timezone(&self.zone);
        self.entries.push(ActivityEntry {
            time: local.format("%-I:%M:%S %p").to_string(),
            action: action.to_string(),
            timestamp: now.to_rfc3339_opts(SecondsFormat::Millis, true),
        });

        if self.entries.len() > MAX_ACTIVITY_ENTRIES {
            let excess = self.entries.len() - MAX_ACTIVITY_ENTRIES;
            self.entries.drain(..excess);
        }

        if let Err(e) = write_json(store, ACTIVITY_KEY, &self.entries) {
            warn!("Failed to save activity log: {}", e);
        }
    }

    /// Newest first
    pub fn recent(&self, count: usize) -> Vec<ActivityEntry> {
        self.entries.iter().rev().take(count).cloned().collect()
    }
}

/// Theme toggles over the lifetime of the store
pub fn theme_toggle_count(store: &dyn KeyValueStore) -> u32 {
    read_json::<u32>(store, THEME_TOGGLES_KEY)
        .ok()
        .flatten()
        .unwrap_or(0)
}

pub fn bump_theme_toggles(store: &mut dyn KeyValueStore) -> Result<u32, ConfigError> {
    let count = theme_toggle_count(store).saturating_add(1);
    write_json(store, THEME_TOGGLES_KEY, &count)?;
    Ok(count)
}

/// Display name entered on first launch
///
/// Accepts a JSON string or the bare text the web widget stored.
pub fn user_name(store: &dyn KeyValueStore) -> Option<String> {
    let text = store.get(USER_NAME_KEY).ok().flatten()?;
    let name = serde_json::from_str::<String>(&text).unwrap_or(text);
    let name = name.trim();
    (!name.is_empty()).then(|| name.to_string())
}

pub fn set_user_name(store: &mut dyn KeyValueStore, name: &str) -> Result<(), ConfigError> {
    write_json(store, USER_NAME_KEY, name)
}
