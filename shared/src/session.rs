//! Session - single owner of the selection, its storage and the usage log
//!
//! The UI turns gestures into [`Command`]s and hands them to
//! [`Session::dispatch`]; everything that must happen after a mutation
//! (persisting, logging, notices) happens here in one place.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use tracing::{info, warn};

use crate::activity::{self, ActivityEntry, ActivityLog, RECENT_ACTIVITY_COUNT};
use crate::catalog::{Catalog, TimezoneRecord};
use crate::codec::{CodecError, Location, StateCodec};
use crate::config::KeyValueStore;
use crate::selection::{Command, Effect, SelectionModel};
use crate::visitors::{self, SyncEvent, Visitor, VisitorSync};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
    Info,
}

/// Transient message for the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Info,
            message: message.into(),
        }
    }
}

/// Result of dispatching a command
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub effect: Effect,
    pub notice: Option<Notice>,
}

/// Snapshot shown in the dashboard
#[derive(Debug, Clone, PartialEq)]
pub struct Dashboard {
    pub user_name: String,
    pub session_minutes: i64,
    pub cities: usize,
    pub theme_toggles: u32,
    pub recent: Vec<ActivityEntry>,
}

pub struct Session {
    model: SelectionModel,
    codec: StateCodec,
    store: Box<dyn KeyValueStore>,
    location: Box<dyn Location>,
    activity: ActivityLog,
    host_tz: Tz,
    started_at: DateTime<Utc>,
    visitors: VisitorSync,
    visitor_list: Option<Vec<Visitor>>,
}

impl Session {
    /// Restore state and open the session
    ///
    /// Returns the notices produced while starting (the host zone being
    /// added to an empty selection).
    pub fn start(
        codec: StateCodec,
        store: Box<dyn KeyValueStore>,
        location: Box<dyn Location>,
        visitors: VisitorSync,
        now: DateTime<Utc>,
    ) -> (Self, Vec<Notice>) {
        let host_tz: Tz = codec.host_zone().parse().unwrap_or(Tz::UTC);
        let model = codec.load(store.as_ref(), location.as_ref());
        let activity = ActivityLog::load(store.as_ref(), host_tz);

        let mut session = Self {
            model,
            codec,
            store,
            location,
            activity,
            host_tz,
            started_at: now,
            visitors,
            visitor_list: None,
        };

        let mut notices = Vec::new();
        if session.model.is_empty() {
            let home = session.codec.user_zone_record();
            if let Some(notice) = session.dispatch(Command::AddZone(home), now).notice {
                notices.push(notice);
            }
        }
        session.log("Started session", now);
        info!(
            zones = session.model.len(),
            offset = session.model.hour_offset,
            theme = %session.model.theme,
            "Session started"
        );

        (session, notices)
    }

    pub fn model(&self) -> &SelectionModel {
        &self.model
    }

    pub fn catalog(&self) -> &Catalog {
        self.codec.catalog()
    }

    pub fn host_zone(&self) -> &str {
        self.codec.host_zone()
    }

    /// Current fragment token, as it would appear after `#`
    pub fn fragment(&self) -> Option<String> {
        self.location.fragment()
    }

    /// Catalog matches not already selected
    pub fn search(&self, query: &str, limit: usize) -> Vec<TimezoneRecord> {
        self.catalog()
            .search(query, self.model.zones(), limit)
            .into_iter()
            .cloned()
            .collect()
    }

    fn log(&mut self, action: &str, now: DateTime<Utc>) {
        self.activity.record(self.store.as_mut(), action, now);
    }

    fn persist(&mut self) {
        self.codec
            .save(&self.model, self.store.as_mut(), self.location.as_mut());
    }

    pub fn dispatch(&mut self, command: Command, now: DateTime<Utc>) -> Outcome {
        let mut notice = None;
        let action = match &command {
            Command::AddZone(record) if !self.model.contains(&record.id) => {
                notice = Some(Notice::success(format!("Added {}", record.city)));
                Some(format!("Added city: {}", record.city))
            }
            Command::RemoveZone(id) => self
                .model
                .get(id)
                .map(|zone| format!("Removed city: {}", zone.city)),
            _ => None,
        };
        let toggles_theme = command == Command::ToggleTheme;

        let effect = self.model.apply(command);
        if !effect.changed() {
            return Outcome {
                effect,
                notice: None,
            };
        }

        self.persist();

        if toggles_theme {
            if let Err(e) = activity::bump_theme_toggles(self.store.as_mut()) {
                warn!("Failed to save theme toggle count: {}", e);
            }
            let action = format!("Toggled theme to {}", self.model.theme);
            self.log(&action, now);
        }
        if let Some(action) = action {
            self.log(&action, now);
        }

        Outcome { effect, notice }
    }

    pub fn share_link(&self, base_url: &str) -> Result<String, CodecError> {
        self.codec.share_link(base_url, &self.model)
    }

    pub fn user_name(&self) -> Option<String> {
        activity::user_name(self.store.as_ref())
    }

    pub fn needs_user_name(&self) -> bool {
        self.user_name().is_none()
    }

    /// Save the first-launch name and register it as a visitor
    pub fn submit_user_name(&mut self, name: &str, now: DateTime<Utc>) -> Notice {
        let name = name.trim();
        if name.is_empty() {
            return Notice::error("Please enter your name");
        }

        if let Err(e) = activity::set_user_name(self.store.as_mut(), name) {
            warn!("Failed to save user name: {}", e);
        }
        self.log(
            &format!("User \"{}\" started using TimeZoneBuddy", name),
            now,
        );

        let visitor = Visitor::new(name, now, self.host_tz);
        let local = visitors::local_visitors(self.store.as_ref());
        self.visitors.register(visitor, local);

        Notice::success(format!("Welcome, {}!", name))
    }

    /// Snapshot for the dashboard; also starts a visitor list refresh
    pub fn open_dashboard(&mut self, now: DateTime<Utc>) -> Dashboard {
        self.log("Opened dashboard", now);
        self.visitors
            .refresh(visitors::local_visitors(self.store.as_ref()));
        self.dashboard(now)
    }

    pub fn dashboard(&self, now: DateTime<Utc>) -> Dashboard {
        Dashboard {
            user_name: self.user_name().unwrap_or_else(|| "Unknown".to_string()),
            session_minutes: (now - self.started_at).num_minutes(),
            cities: self.model.len(),
            theme_toggles: activity::theme_toggle_count(self.store.as_ref()),
            recent: self.activity.recent(RECENT_ACTIVITY_COUNT),
        }
    }

    /// Latest visitor list, once a refresh has come back
    pub fn visitor_list(&self) -> Option<&[Visitor]> {
        self.visitor_list.as_deref()
    }

    /// Apply finished background registry calls
    pub fn poll_visitors(&mut self) {
        for event in self.visitors.poll() {
            match event {
                SyncEvent::Registered(visitor) => {
                    info!(name = %visitor.name, "Visitor registered");
                }
                SyncEvent::RegisterFailed(visitor, e) => {
                    warn!("Could not save visitor data: {}", e);
                    if let Err(e) = visitors::save_visitor_locally(self.store.as_mut(), &visitor) {
                        warn!("Failed to save visitor locally: {}", e);
                    }
                }
                SyncEvent::Listed(list) => self.visitor_list = Some(list),
            }
        }
    }
}
