//! Selection model - the zones on screen, the hour offset and the theme
//!
//! All mutation goes through [`SelectionModel::apply`] with a [`Command`],
//! which keeps the model independent of whichever UI produces the gestures.

use serde::{Deserialize, Serialize};

use crate::catalog::TimezoneRecord;

/// Color scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    #[default]
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    /// Parse the stored name, ignoring case and surrounding whitespace
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A user gesture, translated
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    AddZone(TimezoneRecord),
    RemoveZone(String),
    Reorder { dragged: String, target: String },
    SetOffset(i32),
    ToggleTheme,
}

/// What the UI has to refresh after a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// The command was a no-op
    Unchanged,
    /// Card set or order changed
    Rebuild,
    /// Only the displayed times moved
    TimesOnly,
    /// Only the colors changed
    Reskin,
}

impl Effect {
    pub fn changed(self) -> bool {
        self != Effect::Unchanged
    }
}

/// Ordered, duplicate-free zone list plus display preferences
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SelectionModel {
    zones: Vec<TimezoneRecord>,
    pub hour_offset: i32,
    pub theme: Theme,
}

impl SelectionModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from restored parts, dropping later duplicates of an id
    pub fn from_parts(zones: Vec<TimezoneRecord>, hour_offset: i32, theme: Theme) -> Self {
        let mut model = Self {
            zones: Vec::with_capacity(zones.len()),
            hour_offset,
            theme,
        };
        for zone in zones {
            model.add_zone(zone);
        }
        model
    }

    pub fn zones(&self) -> &[TimezoneRecord] {
        &self.zones
    }

    pub fn zone_ids(&self) -> Vec<String> {
        self.zones.iter().map(|z| z.id.clone()).collect()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.position(id).is_some()
    }

    pub fn get(&self, id: &str) -> Option<&TimezoneRecord> {
        self.zones.iter().find(|z| z.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.zones.iter().position(|z| z.id == id)
    }

    /// Append a zone unless its id is already present
    pub fn add_zone(&mut self, record: TimezoneRecord) -> bool {
        if self.contains(&record.id) {
            return false;
        }
        self.zones.push(record);
        true
    }

    /// Remove the zone with `id`, returning it if it was present
    pub fn remove_zone(&mut self, id: &str) -> Option<TimezoneRecord> {
        self.position(id).map(|idx| self.zones.remove(idx))
    }

    /// Move `dragged` into the slot `target` occupies
    ///
    /// Splice out, then splice in at the target's original index. This is a
    /// positional move, not a swap.
    pub fn reorder(&mut self, dragged: &str, target: &str) -> bool {
        if dragged == target {
            return false;
        }
        let (Some(from), Some(to)) = (self.position(dragged), self.position(target)) else {
            return false;
        };
        let zone = self.zones.remove(from);
        self.zones.insert(to, zone);
        true
    }

    pub fn set_hour_offset(&mut self, offset: i32) -> bool {
        let changed = self.hour_offset != offset;
        self.hour_offset = offset;
        changed
    }

    pub fn toggle_theme(&mut self) -> Theme {
        self.theme = self.theme.toggled();
        self.theme
    }

    /// Insert the host zone if nothing is selected
    pub fn ensure_user_zone(&mut self, record: TimezoneRecord) -> bool {
        if !self.zones.is_empty() {
            return false;
        }
        self.add_zone(record)
    }

    pub fn apply(&mut self, command: Command) -> Effect {
        match command {
            Command::AddZone(record) => {
                if self.add_zone(record) {
                    Effect::Rebuild
                } else {
                    Effect::Unchanged
                }
            }
            Command::RemoveZone(id) => {
                if self.remove_zone(&id).is_some() {
                    Effect::Rebuild
                } else {
                    Effect::Unchanged
                }
            }
            Command::Reorder { dragged, target } => {
                if self.reorder(&dragged, &target) {
                    Effect::Rebuild
                } else {
                    Effect::Unchanged
                }
            }
            Command::SetOffset(offset) => {
                if self.set_hour_offset(offset) {
                    Effect::TimesOnly
                } else {
                    Effect::Unchanged
                }
            }
            Command::ToggleTheme => {
                self.toggle_theme();
                Effect::Reskin
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;

    fn record(id: &str) -> TimezoneRecord {
        TimezoneRecord::new(id, id, "Testland", "UTC")
    }

    fn model_with(ids: &[&str]) -> SelectionModel {
        let mut model = SelectionModel::new();
        for id in ids {
            model.add_zone(record(id));
        }
        model
    }

    fn ids(model: &SelectionModel) -> Vec<String> {
        model.zone_ids()
    }

    #[test]
    fn test_add_remove_never_duplicates() {
        let catalog = Catalog::builtin();
        let picks = ["tokyo", "paris", "tokyo", "london", "paris", "sydney"];
        let mut model = SelectionModel::new();

        for (step, id) in picks.iter().cycle().take(40).enumerate() {
            let zone = catalog.by_id(id).unwrap().clone();
            if step % 3 == 2 {
                model.apply(Command::RemoveZone(zone.id));
            } else {
                model.apply(Command::AddZone(zone));
            }

            let mut seen = model.zone_ids();
            let before = seen.len();
            seen.sort();
            seen.dedup();
            assert_eq!(seen.len(), before);
        }
    }

    #[test]
    fn test_add_duplicate_is_noop() {
        let mut model = model_with(&["a"]);
        assert_eq!(model.apply(Command::AddZone(record("a"))), Effect::Unchanged);
        assert_eq!(model.len(), 1);
    }

    #[test]
    fn test_remove_missing_is_noop() {
        let mut model = model_with(&["a", "b"]);
        assert_eq!(
            model.apply(Command::RemoveZone("zz".to_string())),
            Effect::Unchanged
        );
        assert_eq!(ids(&model), vec!["a", "b"]);
        assert_eq!(model.apply(Command::RemoveZone("a".to_string())), Effect::Rebuild);
        assert_eq!(ids(&model), vec!["b"]);
    }

    #[test]
    fn test_reorder_three_is_a_move() {
        let mut model = model_with(&["a", "b", "c"]);
        assert!(model.reorder("a", "c"));
        assert_eq!(ids(&model), vec!["b", "c", "a"]);

        let mut model = model_with(&["a", "b", "c"]);
        assert!(model.reorder("c", "a"));
        assert_eq!(ids(&model), vec!["c", "a", "b"]);
    }

    #[test]
    fn test_reorder_five_is_a_move() {
        let mut model = model_with(&["a", "b", "c", "d", "e"]);
        assert!(model.reorder("b", "d"));
        assert_eq!(ids(&model), vec!["a", "c", "d", "b", "e"]);

        assert!(model.reorder("e", "a"));
        assert_eq!(ids(&model), vec!["e", "a", "c", "d", "b"]);

        // Reversing a non-adjacent move does not restore the order
        let mut model = model_with(&["a", "b", "c", "d", "e"]);
        model.reorder("a", "d");
        model.reorder("d", "a");
        assert_eq!(ids(&model), vec!["b", "c", "a", "d", "e"]);
        assert_ne!(ids(&model), vec!["a", "b", "c", "d", "e"]);
    }

    #[test]
    fn test_reorder_adjacent_reverses() {
        let mut model = model_with(&["a", "b", "c"]);
        model.reorder("a", "b");
        assert_eq!(ids(&model), vec!["b", "a", "c"]);
        model.reorder("b", "a");
        assert_eq!(ids(&model), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_reorder_noops() {
        let mut model = model_with(&["a", "b", "c"]);
        assert!(!model.reorder("a", "a"));
        assert!(!model.reorder("a", "zz"));
        assert!(!model.reorder("zz", "a"));
        assert_eq!(ids(&model), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_offset_and_theme_leave_zones_alone() {
        let mut model = model_with(&["a", "b"]);
        let zones_before = model.zones().to_vec();

        assert_eq!(model.apply(Command::SetOffset(5)), Effect::TimesOnly);
        assert_eq!(model.zones(), zones_before.as_slice());
        assert_eq!(model.hour_offset, 5);
        assert_eq!(model.apply(Command::SetOffset(5)), Effect::Unchanged);

        assert_eq!(model.apply(Command::ToggleTheme), Effect::Reskin);
        assert_eq!(model.theme, Theme::Light);
        assert_eq!(model.zones(), zones_before.as_slice());
        assert_eq!(model.hour_offset, 5);
    }

    #[test]
    fn test_ensure_user_zone_only_when_empty() {
        let mut model = SelectionModel::new();
        assert!(model.ensure_user_zone(record("me")));
        assert!(!model.ensure_user_zone(record("me")));
        assert!(!model.ensure_user_zone(record("other")));
        assert_eq!(ids(&model), vec!["me"]);
    }

    #[test]
    fn test_from_parts_drops_duplicates() {
        let model = SelectionModel::from_parts(
            vec![record("a"), record("b"), record("a")],
            -3,
            Theme::Light,
        );
        assert_eq!(ids(&model), vec!["a", "b"]);
        assert_eq!(model.hour_offset, -3);
    }

    #[test]
    fn test_theme_names() {
        assert_eq!(Theme::from_name(" Light "), Some(Theme::Light));
        assert_eq!(Theme::from_name("sepia"), None);
        assert_eq!(Theme::Dark.toggled().to_string(), "light");
    }
}
