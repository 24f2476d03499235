//! Shared core for the TimeZone Buddy widget
//!
//! Selection model, state codec, render math and local persistence. The
//! window and panels live in the `timezone_buddy` crate.

pub mod activity;
pub mod catalog;
pub mod clock;
pub mod codec;
pub mod config;
pub mod selection;
pub mod session;
pub mod time_engine;
pub mod visitors;

pub use activity::{ActivityEntry, ActivityLog};
pub use catalog::{Catalog, TimezoneRecord, DEFAULT_SEARCH_LIMIT, USER_ZONE_ID};
pub use clock::{Clock, FixedClock, SystemClock, Ticker};
pub use codec::{
    decode_fragment, encode_fragment, CodecError, LaunchLocation, Location, SharedSelection,
    StateCodec,
};
pub use config::{
    config_dir, config_path, data_dir, load_config, save_config, ConfigError, FileStore,
    KeyValueStore, MemoryStore,
};
pub use selection::{Command, Effect, SelectionModel, Theme};
pub use session::{Dashboard, Notice, NoticeKind, Outcome, Session};
pub use time_engine::{
    offset_banner, render_zone, system_timezone, DayPhase, RenderCache, ZoneDisplay,
};
pub use visitors::{HttpRegistry, RegistryError, Visitor, VisitorRegistry, VisitorSync};
