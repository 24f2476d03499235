//! Time Engine - per-zone display fields for a single clock tick
//!
//! Everything here is a pure function of the selected zones, the tick instant
//! and the hour offset. [`RenderCache`] diffs successive ticks so the UI only
//! animates cards whose text actually changed.

use std::collections::{HashMap, HashSet};
use std::fs;

use chrono::{DateTime, Duration, Local, Timelike, Utc};
use chrono_tz::Tz;
use tracing::warn;

use crate::catalog::TimezoneRecord;

/// Time-of-day band picked from the local hour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DayPhase {
    /// 06:00 - 11:59
    Sunrise,
    /// 12:00 - 16:59
    Sun,
    /// 17:00 - 19:59
    Sunset,
    /// 20:00 - 01:59
    Moon,
    /// 02:00 - 05:59
    LateNight,
}

impl DayPhase {
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            6..=11 => DayPhase::Sunrise,
            12..=16 => DayPhase::Sun,
            17..=19 => DayPhase::Sunset,
            2..=5 => DayPhase::LateNight,
            _ => DayPhase::Moon,
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            DayPhase::Sunrise => "🌅",
            DayPhase::Sun => "☀️",
            DayPhase::Sunset => "🌇",
            DayPhase::Moon => "🌙",
            DayPhase::LateNight => "🌌",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DayPhase::Sunrise => "Morning",
            DayPhase::Sun => "Afternoon",
            DayPhase::Sunset => "Evening",
            DayPhase::Moon => "Night",
            DayPhase::LateNight => "Late night",
        }
    }
}

/// First and last working hour, both inclusive
pub const WORKING_HOURS: (u32, u32) = (9, 18);

pub fn is_working_hour(hour: u32) -> bool {
    (WORKING_HOURS.0..=WORKING_HOURS.1).contains(&hour)
}

/// Display fields for one card
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneDisplay {
    pub zone_id: String,
    /// Two-digit 12-hour clock, e.g. "03:00 PM"
    pub time: String,
    /// e.g. "Mon, Jan 15"
    pub date: String,
    pub phase: DayPhase,
    /// Local hour (0-23)
    pub hour: u32,
    /// Local second (0-59)
    pub second: u32,
    pub is_working_hours: bool,
    pub is_user_zone: bool,
    /// Animation delay for the seconds indicator, in milliseconds
    pub seconds_phase_ms: f64,
}

impl ZoneDisplay {
    fn text_differs(&self, other: &ZoneDisplay) -> bool {
        self.time != other.time || self.date != other.date || self.phase != other.phase
    }
}

/// Shift an instant by whole hours, saturating at chrono's representable range
pub fn adjusted_instant(now: DateTime<Utc>, hour_offset: i32) -> DateTime<Utc> {
    now.checked_add_signed(Duration::hours(hour_offset as i64))
        .unwrap_or(if hour_offset < 0 {
            DateTime::<Utc>::MIN_UTC
        } else {
            DateTime::<Utc>::MAX_UTC
        })
}

/// Compute the display fields for a zone at a tick
///
/// A record whose zone name doesn't parse is shown in UTC.
pub fn render_zone(
    zone: &TimezoneRecord,
    now: DateTime<Utc>,
    hour_offset: i32,
    host_zone: &str,
) -> ZoneDisplay {
    let tz: Tz = zone.timezone.parse().unwrap_or(Tz::UTC);
    let local = adjusted_instant(now, hour_offset).with_timezone(&tz);

    let hour = local.hour();
    let second = local.second();

    ZoneDisplay {
        zone_id: zone.id.clone(),
        time: local.format("%I:%M %p").to_string(),
        date: local.format("%a, %b %-d").to_string(),
        phase: DayPhase::from_hour(hour),
        hour,
        second,
        is_working_hours: is_working_hour(hour),
        is_user_zone: zone.timezone == host_zone,
        seconds_phase_ms: second as f64 * (1000.0 / 60.0),
    }
}

/// Banner shown above the grid while a positive offset is active
pub fn offset_banner(hour_offset: i32) -> Option<String> {
    (hour_offset > 0).then(|| format!("⏰ Times shown with +{}h offset", hour_offset))
}

/// Last rendered fields per zone, for recompute-and-diff
#[derive(Debug, Default)]
pub struct RenderCache {
    displays: Vec<ZoneDisplay>,
    warned: HashSet<String>,
}

impl RenderCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recompute every zone and return the ids whose text changed
    ///
    /// Zones new since the last refresh count as changed.
    pub fn refresh(
        &mut self,
        zones: &[TimezoneRecord],
        now: DateTime<Utc>,
        hour_offset: i32,
        host_zone: &str,
    ) -> Vec<String> {
        let previous: HashMap<&str, &ZoneDisplay> = self
            .displays
            .iter()
            .map(|d| (d.zone_id.as_str(), d))
            .collect();

        let mut changed = Vec::new();
        let mut next = Vec::with_capacity(zones.len());
        for zone in zones {
            if zone.timezone.parse::<Tz>().is_err() && self.warned.insert(zone.id.clone()) {
                warn!(zone = %zone.timezone, "Unknown time zone, showing UTC");
            }

            let display = render_zone(zone, now, hour_offset, host_zone);
            let differs = previous
                .get(zone.id.as_str())
                .map_or(true, |prev| display.text_differs(prev));
            if differs {
                changed.push(zone.id.clone());
            }
            next.push(display);
        }

        self.displays = next;
        changed
    }

    pub fn displays(&self) -> &[ZoneDisplay] {
        &self.displays
    }

    pub fn get(&self, zone_id: &str) -> Option<&ZoneDisplay> {
        self.displays.iter().find(|d| d.zone_id == zone_id)
    }

    /// Forget the previous tick so the next refresh reports every zone
    pub fn invalidate(&mut self) {
        self.displays.clear();
    }
}

/// Detect the host's IANA zone
///
/// Tries `TZ`, then the `/etc/localtime` link target, then `/etc/timezone`,
/// then the abbreviation chrono reports, falling back to UTC.
pub fn system_timezone() -> Tz {
    if let Some(tz) = std::env::var("TZ")
        .ok()
        .and_then(|v| v.trim_start_matches(':').parse::<Tz>().ok())
    {
        return tz;
    }

    if let Some(tz) = fs::read_link("/etc/localtime").ok().and_then(|target| {
        let target = target.to_string_lossy().into_owned();
        let (_, name) = target.split_once("zoneinfo/")?;
        name.parse::<Tz>().ok()
    }) {
        return tz;
    }

    if let Some(tz) = fs::read_to_string("/etc/timezone")
        .ok()
        .and_then(|s| s.trim().parse::<Tz>().ok())
    {
        return tz;
    }

    Local::now()
        .format("%Z")
        .to_string()
        .parse::<Tz>()
        .unwrap_or(Tz::UTC)
}
