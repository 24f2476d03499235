//! Application settings, read from `timezone_buddy.toml` in the config directory

use serde::{Deserialize, Serialize};
use shared::DEFAULT_SEARCH_LIMIT;

/// Remote visitor registry endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrySettings {
    /// Base URL of the JSON bin
    pub url: String,
    /// Environment variable holding the write key
    pub key_env: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Matches shown under the search box
    pub search_limit: usize,
    /// Hour offset slider range
    pub offset_min: i32,
    pub offset_max: i32,
    /// Link prefix the share token is appended to
    pub share_base_url: String,
    pub registry: Option<RegistrySettings>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            search_limit: DEFAULT_SEARCH_LIMIT,
            offset_min: -12,
            offset_max: 12,
            share_base_url: "https://timezonebuddy.app/".to_string(),
            registry: None,
        }
    }
}

impl Settings {
    /// Slider bounds, widened to include the current offset
    ///
    /// A shared link may carry an offset outside the configured range; the
    /// slider must still be able to show it.
    pub fn offset_range(&self, current: i32) -> std::ops::RangeInclusive<i32> {
        let (lo, hi) = if self.offset_min <= self.offset_max {
            (self.offset_min, self.offset_max)
        } else {
            (self.offset_max, self.offset_min)
        };
        lo.min(current)..=hi.max(current)
    }

    /// Write key for the registry, if configured and present in the environment
    pub fn registry_key(&self) -> Option<String> {
        let registry = self.registry.as_ref()?;
        std::env::var(&registry.key_env).ok().filter(|k| !k.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_fills_defaults() {
        let settings: Settings = toml::from_str("search_limit = 5\n").unwrap();
        assert_eq!(settings.search_limit, 5);
        assert_eq!(settings.offset_min, -12);
        assert!(settings.registry.is_none());
    }

    #[test]
    fn test_registry_section() {
        let text = r#"
            [registry]
            url = "https://api.example.com/v3/b/abc"
            key_env = "BUDDY_REGISTRY_KEY"
        "#;
        let settings: Settings = toml::from_str(text).unwrap();
        let registry = settings.registry.unwrap();
        assert_eq!(registry.url, "https://api.example.com/v3/b/abc");
        assert_eq!(registry.key_env, "BUDDY_REGISTRY_KEY");
    }

    #[test]
    fn test_roundtrip() {
        let settings = Settings::default();
        let text = toml::to_string_pretty(&settings).unwrap();
        let back: Settings = toml::from_str(&text).unwrap();
        assert_eq!(back, settings);
    }

    #[test]
    fn test_offset_range_includes_current() {
        let settings = Settings::default();
        assert_eq!(settings.offset_range(3), -12..=12);
        assert_eq!(settings.offset_range(30), -12..=30);
        assert_eq!(settings.offset_range(-40), -40..=12);
    }
}
