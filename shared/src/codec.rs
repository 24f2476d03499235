//! State codec - restores and persists the selection
//!
//! Two sources feed [`StateCodec::load`]: the local key-value store and the
//! fragment token of the share link. The token wins field by field for the zone
//! list and the offset; the theme only ever comes from the store. A malformed
//! source is logged and skipped, never surfaced.

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::catalog::{Catalog, TimezoneRecord};
use crate::config::{ConfigError, KeyValueStore};
use crate::selection::{SelectionModel, Theme};

/// Consolidated state blob
pub const STATE_KEY: &str = "timezoneBuddy";
/// Theme, duplicated out of the blob
pub const THEME_KEY: &str = "timezoneBuddy-theme";

/// Standard alphabet, padding optional on decode
const TOKEN_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("Token is not UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Store error: {0}")]
    Store(#[from] ConfigError),
}

/// Where the fragment token lives
pub trait Location {
    /// Current token, without the leading `#`
    fn fragment(&self) -> Option<String>;
    /// Replace the token in place, without adding a history entry
    fn replace_fragment(&mut self, token: &str);
}

/// Location seeded from the link the app was launched with
#[derive(Debug, Clone, Default)]
pub struct LaunchLocation {
    fragment: Option<String>,
}

impl LaunchLocation {
    /// Accepts a full share link (`https://host/#token`) or a bare token
    pub fn from_link(link: Option<&str>) -> Self {
        let fragment = link.map(str::trim).and_then(|link| {
            if let Some((_, token)) = link.split_once('#') {
                Some(token.to_string())
            } else if link.contains("://") {
                None
            } else {
                Some(link.to_string())
            }
        });
        Self {
            fragment: fragment.filter(|t| !t.is_empty()),
        }
    }
}

impl Location for LaunchLocation {
    fn fragment(&self) -> Option<String> {
        self.fragment.clone()
    }

    fn replace_fragment(&mut self, token: &str) {
        self.fragment = Some(token.to_string());
    }
}

/// What a share token carried; absent fields leave local values alone
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SharedSelection {
    pub zones: Option<Vec<String>>,
    pub offset: Option<i32>,
}

#[derive(Serialize)]
struct TokenOut<'a> {
    zones: Vec<&'a str>,
    offset: i32,
}

#[derive(Deserialize)]
struct TokenIn {
    #[serde(default)]
    zones: Option<Vec<serde_json::Value>>,
    #[serde(default)]
    offset: Option<serde_json::Value>,
}

/// Encode an ordered id list and offset as a fragment token
pub fn encode_fragment<S: AsRef<str>>(zone_ids: &[S], offset: i32) -> Result<String, CodecError> {
    let payload = TokenOut {
        zones: zone_ids.iter().map(AsRef::as_ref).collect(),
        offset,
    };
    let json = serde_json::to_string(&payload)?;
    Ok(TOKEN_ENGINE.encode(json))
}

/// Decode a fragment token
///
/// Non-string zone entries are skipped; an offset that is not an integer is
/// treated as absent.
pub fn decode_fragment(token: &str) -> Result<SharedSelection, CodecError> {
    let token = token.trim().trim_start_matches('#');
    let bytes = TOKEN_ENGINE.decode(token)?;
    let json = String::from_utf8(bytes)?;
    let raw: TokenIn = serde_json::from_str(&json)?;

    let zones = raw.zones.map(|values| {
        values
            .into_iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect()
    });
    let offset = raw
        .offset
        .and_then(|v| v.as_i64())
        .and_then(|n| i32::try_from(n).ok());

    Ok(SharedSelection { zones, offset })
}

/// Accepts both bare ids and full records, as older blobs stored records
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredZone {
    Id(String),
    Record { id: String },
}

impl StoredZone {
    fn into_id(self) -> String {
        match self {
            StoredZone::Id(id) | StoredZone::Record { id } => id,
        }
    }
}

#[derive(Deserialize)]
struct StoredStateIn {
    #[serde(rename = "selectedZones", default)]
    selected_zones: Option<Vec<StoredZone>>,
    #[serde(rename = "hourOffset", default)]
    hour_offset: Option<serde_json::Value>,
    #[serde(default)]
    theme: Option<serde_json::Value>,
}

#[derive(Serialize)]
struct StoredStateOut<'a> {
    #[serde(rename = "selectedZones")]
    selected_zones: Vec<&'a str>,
    #[serde(rename = "hourOffset")]
    hour_offset: i32,
    theme: Theme,
}

/// Loads and saves the selection against a store and a location
#[derive(Debug, Clone)]
pub struct StateCodec {
    catalog: Catalog,
    host_zone: String,
}

impl StateCodec {
    pub fn new(catalog: Catalog, host_zone: impl Into<String>) -> Self {
        Self {
            catalog,
            host_zone: host_zone.into(),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn host_zone(&self) -> &str {
        &self.host_zone
    }

    /// Record shown for the host zone
    pub fn user_zone_record(&self) -> TimezoneRecord {
        self.catalog.user_zone_record(&self.host_zone)
    }

    /// Map ids to records, dropping any the catalog doesn't know
    fn resolve_ids<I: IntoIterator<Item = String>>(&self, ids: I) -> Vec<TimezoneRecord> {
        ids.into_iter()
            .filter_map(|id| {
                let record = self.catalog.resolve(&id, &self.host_zone);
                if record.is_none() {
                    debug!(id = %id, "Dropping unknown zone id");
                }
                record
            })
            .collect()
    }

    pub fn load(&self, store: &dyn KeyValueStore, location: &dyn Location) -> SelectionModel {
        let mut zones = Vec::new();
        let mut hour_offset = 0;
        let mut theme = None;

        match store.get(STATE_KEY) {
            Ok(Some(text)) => match serde_json::from_str::<StoredStateIn>(&text) {
                Ok(state) => {
                    zones = self.resolve_ids(
                        state
                            .selected_zones
                            .unwrap_or_default()
                            .into_iter()
                            .map(StoredZone::into_id),
                    );
                    // A malformed field falls back alone; the zones still load
                    hour_offset = state
                        .hour_offset
                        .and_then(|v| v.as_i64())
                        .and_then(|n| i32::try_from(n).ok())
                        .unwrap_or(0);
                    theme = state
                        .theme
                        .as_ref()
                        .and_then(|v| v.as_str())
                        .and_then(Theme::from_name);
                }
                Err(e) => warn!("Failed to load saved state: {}", e),
            },
            Ok(None) => {}
            Err(e) => warn!("Failed to read saved state: {}", e),
        }

        match store.get(THEME_KEY) {
            Ok(Some(text)) => {
                let name = serde_json::from_str::<String>(&text).unwrap_or(text);
                if let Some(saved) = Theme::from_name(&name) {
                    theme = Some(saved);
                }
            }
            Ok(None) => {}
            Err(e) => warn!("Failed to read saved theme: {}", e),
        }

        if let Some(token) = location.fragment().filter(|t| !t.trim().is_empty()) {
            match decode_fragment(&token) {
                Ok(shared) => {
                    if let Some(ids) = shared.zones {
                        zones = self.resolve_ids(ids);
                    }
                    if let Some(offset) = shared.offset {
                        hour_offset = offset;
                    }
                }
                Err(e) => warn!("Failed to load from share link: {}", e),
            }
        }

        SelectionModel::from_parts(zones, hour_offset, theme.unwrap_or_default())
    }

    /// Persist to the store and the location; failures are logged only
    pub fn save(
        &self,
        model: &SelectionModel,
        store: &mut dyn KeyValueStore,
        location: &mut dyn Location,
    ) {
        if let Err(e) = self.save_store(model, store) {
            error!("Failed to save state: {}", e);
        }

        let ids: Vec<&str> = model.zones().iter().map(|z| z.id.as_str()).collect();
        match encode_fragment(&ids, model.hour_offset) {
            Ok(token) => location.replace_fragment(&token),
            Err(e) => error!("Failed to save to share link: {}", e),
        }
    }

    fn save_store(
        &self,
        model: &SelectionModel,
        store: &mut dyn KeyValueStore,
    ) -> Result<(), CodecError> {
        let state = StoredStateOut {
            selected_zones: model.zones().iter().map(|z| z.id.as_str()).collect(),
            hour_offset: model.hour_offset,
            theme: model.theme,
        };
        store.set(STATE_KEY, &serde_json::to_string(&state)?)?;
        store.set(THEME_KEY, &serde_json::to_string(&model.theme)?)?;
        Ok(())
    }

    /// `<base_url>#<token>` for the current selection
    pub fn share_link(&self, base_url: &str, model: &SelectionModel) -> Result<String, CodecError> {
        let ids = model.zone_ids();
        let token = encode_fragment(&ids, model.hour_offset)?;
        Ok(format!("{}#{}", base_url.trim_end_matches('#'), token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MemoryStore;

    fn codec() -> StateCodec {
        StateCodec::new(Catalog::builtin(), "Europe/Berlin")
    }

    fn stored(store: &mut MemoryStore, ids: &[&str], offset: i32, theme: &str) {
        let json = serde_json::json!({
            "selectedZones": ids,
            "hourOffset": offset,
            "theme": theme,
        });
        store.set(STATE_KEY, &json.to_string()).unwrap();
    }

    #[test]
    fn test_fragment_roundtrip() {
        let lists: [&[&str]; 3] = [
            &[],
            &["tokyo"],
            &["tokyo", "paris", "new-york", "sydney", "london"],
        ];
        for ids in lists {
            for offset in [-12, 0, 12] {
                let token = encode_fragment(ids, offset).unwrap();
                let decoded = decode_fragment(&token).unwrap();
                let expected: Vec<String> = ids.iter().map(|s| s.to_string()).collect();
                assert_eq!(decoded.zones, Some(expected));
                assert_eq!(decoded.offset, Some(offset));
            }
        }
    }

    #[test]
    fn test_token_matches_web_format() {
        // btoa('{"zones":["tokyo"],"offset":3}')
        let token = encode_fragment(&["tokyo"], 3).unwrap();
        assert_eq!(token, "eyJ6b25lcyI6WyJ0b2t5byJdLCJvZmZzZXQiOjN9");
    }

    #[test]
    fn test_decode_tolerates_missing_padding_and_hash() {
        let token = TOKEN_ENGINE.encode(r#"{"zones":["paris"]}"#);
        let unpadded = token.trim_end_matches('=');
        let decoded = decode_fragment(&format!("#{}", unpadded)).unwrap();
        assert_eq!(decoded.zones, Some(vec!["paris".to_string()]));
        assert_eq!(decoded.offset, None);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(
            decode_fragment("%%%not-base64%%%"),
            Err(CodecError::Base64(_))
        ));
        let not_json = TOKEN_ENGINE.encode("zones: tokyo");
        assert!(matches!(decode_fragment(&not_json), Err(CodecError::Json(_))));
    }

    #[test]
    fn test_decode_skips_odd_values() {
        let token = TOKEN_ENGINE.encode(r#"{"zones":["paris",7,null],"offset":"3"}"#);
        let decoded = decode_fragment(&token).unwrap();
        assert_eq!(decoded.zones, Some(vec!["paris".to_string()]));
        assert_eq!(decoded.offset, None);
    }

    #[test]
    fn test_load_defaults_when_empty() {
        let store = MemoryStore::new();
        let model = codec().load(&store, &LaunchLocation::default());
        assert!(model.is_empty());
        assert_eq!(model.hour_offset, 0);
        assert_eq!(model.theme, Theme::Dark);
    }

    #[test]
    fn test_load_from_store() {
        let mut store = MemoryStore::new();
        stored(&mut store, &["tokyo", "paris"], 4, "light");

        let model = codec().load(&store, &LaunchLocation::default());
        assert_eq!(model.zone_ids(), vec!["tokyo", "paris"]);
        assert_eq!(model.hour_offset, 4);
        assert_eq!(model.theme, Theme::Light);
    }

    #[test]
    fn test_load_accepts_record_objects() {
        let mut store = MemoryStore::new();
        store
            .set(
                STATE_KEY,
                r#"{"selectedZones":[{"id":"tokyo","city":"Tokyo","country":"Japan","timezone":"Asia/Tokyo"}],"hourOffset":null}"#,
            )
            .unwrap();
        let model = codec().load(&store, &LaunchLocation::default());
        assert_eq!(model.zone_ids(), vec!["tokyo"]);
        assert_eq!(model.hour_offset, 0);
    }

    #[test]
    fn test_theme_key_wins_over_blob() {
        let mut store = MemoryStore::new();
        stored(&mut store, &["tokyo"], 0, "light");
        store.set(THEME_KEY, "\"dark\"").unwrap();
        assert_eq!(codec().load(&store, &LaunchLocation::default()).theme, Theme::Dark);

        // Bare names written by the web widget are accepted too
        store.set(THEME_KEY, "light").unwrap();
        assert_eq!(codec().load(&store, &LaunchLocation::default()).theme, Theme::Light);
    }

    #[test]
    fn test_fragment_overrides_store_field_by_field() {
        let mut store = MemoryStore::new();
        stored(&mut store, &["tokyo", "paris"], 4, "light");

        let token = encode_fragment(&["london"], -2).unwrap();
        let model = codec().load(&store, &LaunchLocation::from_link(Some(&token)));
        assert_eq!(model.zone_ids(), vec!["london"]);
        assert_eq!(model.hour_offset, -2);
        assert_eq!(model.theme, Theme::Light);

        let zones_only = TOKEN_ENGINE.encode(r#"{"zones":["sydney"]}"#);
        let model = codec().load(&store, &LaunchLocation::from_link(Some(&zones_only)));
        assert_eq!(model.zone_ids(), vec!["sydney"]);
        assert_eq!(model.hour_offset, 4);
    }

    #[test]
    fn test_corrupt_fragment_leaves_store_values() {
        let mut store = MemoryStore::new();
        stored(&mut store, &["tokyo", "paris"], 4, "light");
        let from_store = codec().load(&store, &LaunchLocation::default());

        for bad in ["!!!", "e30", "bm90IGpzb24=", "WzEsMiwzXQ=="] {
            let model = codec().load(&store, &LaunchLocation::from_link(Some(bad)));
            assert_eq!(model, from_store, "token {:?}", bad);
        }
    }

    #[test]
    fn test_corrupt_store_falls_back_to_defaults() {
        let mut store = MemoryStore::new();
        store.set(STATE_KEY, "{broken").unwrap();
        let model = codec().load(&store, &LaunchLocation::default());
        assert_eq!(model, SelectionModel::default());
    }

    #[test]
    fn test_unknown_ids_dropped() {
        let mut store = MemoryStore::new();
        stored(&mut store, &["tokyo", "atlantis", "paris"], 0, "dark");
        let model = codec().load(&store, &LaunchLocation::default());
        assert_eq!(model.zone_ids(), vec!["tokyo", "paris"]);

        let token = encode_fragment(&["el-dorado", "london"], 1).unwrap();
        let model = codec().load(&store, &LaunchLocation::from_link(Some(&token)));
        assert_eq!(model.zone_ids(), vec!["london"]);
    }

    #[test]
    fn test_user_zone_sentinel_resolves_to_host() {
        let codec = StateCodec::new(Catalog::builtin(), "America/Boise");
        let token = encode_fragment(&["user-timezone"], 0).unwrap();
        let model = codec.load(&MemoryStore::new(), &LaunchLocation::from_link(Some(&token)));
        assert_eq!(model.zones()[0].timezone, "America/Boise");
    }

    #[test]
    fn test_save_then_load_roundtrip() {
        let codec = codec();
        let catalog = Catalog::builtin();
        let mut model = SelectionModel::new();
        model.add_zone(catalog.by_id("sydney").unwrap().clone());
        model.add_zone(catalog.by_id("lima").unwrap().clone());
        model.hour_offset = 7;
        model.toggle_theme();

        let mut store = MemoryStore::new();
        let mut location = LaunchLocation::default();
        codec.save(&model, &mut store, &mut location);

        assert!(store.get(STATE_KEY).unwrap().is_some());
        assert_eq!(store.get(THEME_KEY).unwrap().as_deref(), Some("\"light\""));

        let token = location.fragment().unwrap();
        let shared = decode_fragment(&token).unwrap();
        assert_eq!(shared.zones, Some(vec!["sydney".to_string(), "lima".to_string()]));
        assert_eq!(shared.offset, Some(7));

        assert_eq!(codec.load(&store, &location), model);
        assert_eq!(codec.load(&store, &LaunchLocation::default()), model);
    }

    #[test]
    fn test_malformed_offset_keeps_zones() {
        let mut store = MemoryStore::new();
        let json = r#"{"selectedZones":["tokyo","paris"],"hourOffset":2.5,"theme":"light"}"#;
        store.set(STATE_KEY, json).unwrap();

        let model = codec().load(&store, &LaunchLocation::default());
        assert_eq!(model.zone_ids(), vec!["tokyo", "paris"]);
        assert_eq!(model.hour_offset, 0);
        assert_eq!(model.theme, Theme::Light);

        store
            .set(STATE_KEY, r#"{"selectedZones":["lima"],"hourOffset":"3","theme":7}"#)
            .unwrap();
        let model = codec().load(&store, &LaunchLocation::default());
        assert_eq!(model.zone_ids(), vec!["lima"]);
        assert_eq!(model.hour_offset, 0);
        assert_eq!(model.theme, Theme::Dark);
    }

    /// Store whose writes always fail
    struct ReadOnlyStore;

    impl KeyValueStore for ReadOnlyStore {
        fn get(&self, _key: &str) -> Result<Option<String>, ConfigError> {
            Ok(None)
        }
        fn set(&mut self, key: &str, _value: &str) -> Result<(), ConfigError> {
            Err(ConfigError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                format!("{} is read-only", key),
            )))
        }
        fn remove(&mut self, _key: &str) -> Result<(), ConfigError> {
            Ok(())
        }
    }

    #[test]
    fn test_save_failure_still_updates_fragment() {
        let mut model = SelectionModel::new();
        model.add_zone(Catalog::builtin().by_id("paris").unwrap().clone());
        model.hour_offset = -4;

        let mut location = LaunchLocation::default();
        codec().save(&model, &mut ReadOnlyStore, &mut location);

        let shared = decode_fragment(&location.fragment().unwrap()).unwrap();
        assert_eq!(shared.zones, Some(vec!["paris".to_string()]));
        assert_eq!(shared.offset, Some(-4));
    }

    #[test]
    fn test_launch_location_parsing() {
        assert_eq!(
            LaunchLocation::from_link(Some("https://example.com/buddy/#abc")).fragment(),
            Some("abc".to_string())
        );
        assert_eq!(LaunchLocation::from_link(Some("abc")).fragment(), Some("abc".to_string()));
        assert_eq!(LaunchLocation::from_link(Some("https://example.com/")).fragment(), None);
        assert_eq!(LaunchLocation::from_link(Some("https://example.com/#")).fragment(), None);
        assert_eq!(LaunchLocation::from_link(None).fragment(), None);
    }

    #[test]
    fn test_share_link() {
        let mut model = SelectionModel::new();
        model.add_zone(Catalog::builtin().by_id("tokyo").unwrap().clone());
        model.hour_offset = 3;
        let link = codec().share_link("https://example.com/", &model).unwrap();
        assert_eq!(link, "https://example.com/#eyJ6b25lcyI6WyJ0b2t5byJdLCJvZmZzZXQiOjN9");
    }
}
