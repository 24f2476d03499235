//! Timezone catalog - the static table of cities offered for selection

use serde::{Deserialize, Serialize};

/// Id of the synthetic record used when the host zone is not in the catalog
pub const USER_ZONE_ID: &str = "user-timezone";

/// Default number of search matches offered
pub const DEFAULT_SEARCH_LIMIT: usize = 8;

/// A city and the IANA zone it keeps time in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimezoneRecord {
    pub id: String,
    pub city: String,
    pub country: String,
    pub timezone: String,
}

impl TimezoneRecord {
    pub fn new(id: &str, city: &str, country: &str, timezone: &str) -> Self {
        Self {
            id: id.to_string(),
            city: city.to_string(),
            country: country.to_string(),
            timezone: timezone.to_string(),
        }
    }

    /// The stand-in record for a host zone with no catalog entry
    pub fn user_location(timezone: &str) -> Self {
        Self::new(USER_ZONE_ID, "Your Location", "Local", timezone)
    }
}

/// (id, city, country, timezone)
const BUILTIN: &[(&str, &str, &str, &str)] = &[
    ("new-york", "New York", "United States", "America/New_York"),
    ("los-angeles", "Los Angeles", "United States", "America/Los_Angeles"),
    ("chicago", "Chicago", "United States", "America/Chicago"),
    ("denver", "Denver", "United States", "America/Denver"),
    ("phoenix", "Phoenix", "United States", "America/Phoenix"),
    ("anchorage", "Anchorage", "United States", "America/Anchorage"),
    ("honolulu", "Honolulu", "United States", "Pacific/Honolulu"),
    ("toronto", "Toronto", "Canada", "America/Toronto"),
    ("vancouver", "Vancouver", "Canada", "America/Vancouver"),
    ("mexico-city", "Mexico City", "Mexico", "America/Mexico_City"),
    ("bogota", "Bogotá", "Colombia", "America/Bogota"),
    ("lima", "Lima", "Peru", "America/Lima"),
    ("santiago", "Santiago", "Chile", "America/Santiago"),
    ("buenos-aires", "Buenos Aires", "Argentina", "America/Argentina/Buenos_Aires"),
    ("sao-paulo", "São Paulo", "Brazil", "America/Sao_Paulo"),
    ("london", "London", "United Kingdom", "Europe/London"),
    ("dublin", "Dublin", "Ireland", "Europe/Dublin"),
    ("lisbon", "Lisbon", "Portugal", "Europe/Lisbon"),
    ("madrid", "Madrid", "Spain", "Europe/Madrid"),
    ("paris", "Paris", "France", "Europe/Paris"),
    ("amsterdam", "Amsterdam", "Netherlands", "Europe/Amsterdam"),
    ("brussels", "Brussels", "Belgium", "Europe/Brussels"),
    ("berlin", "Berlin", "Germany", "Europe/Berlin"),
    ("zurich", "Zurich", "Switzerland", "Europe/Zurich"),
    ("rome", "Rome", "Italy", "Europe/Rome"),
    ("vienna", "Vienna", "Austria", "Europe/Vienna"),
    ("stockholm", "Stockholm", "Sweden", "Europe/Stockholm"),
    ("oslo", "Oslo", "Norway", "Europe/Oslo"),
    ("helsinki", "Helsinki", "Finland", "Europe/Helsinki"),
    ("warsaw", "Warsaw", "Poland", "Europe/Warsaw"),
    ("athens", "Athens", "Greece", "Europe/Athens"),
    ("istanbul", "Istanbul", "Turkey", "Europe/Istanbul"),
    ("kyiv", "Kyiv", "Ukraine", "Europe/Kyiv"),
    ("moscow", "Moscow", "Russia", "Europe/Moscow"),
    ("cairo", "Cairo", "Egypt", "Africa/Cairo"),
    ("lagos", "Lagos", "Nigeria", "Africa/Lagos"),
    ("nairobi", "Nairobi", "Kenya", "Africa/Nairobi"),
    ("johannesburg", "Johannesburg", "South Africa", "Africa/Johannesburg"),
    ("casablanca", "Casablanca", "Morocco", "Africa/Casablanca"),
    ("dubai", "Dubai", "United Arab Emirates", "Asia/Dubai"),
    ("riyadh", "Riyadh", "Saudi Arabia", "Asia/Riyadh"),
    ("tehran", "Tehran", "Iran", "Asia/Tehran"),
    ("karachi", "Karachi", "Pakistan", "Asia/Karachi"),
    ("mumbai", "Mumbai", "India", "Asia/Kolkata"),
    ("delhi", "New Delhi", "India", "Asia/Kolkata"),
    ("kathmandu", "Kathmandu", "Nepal", "Asia/Kathmandu"),
    ("dhaka", "Dhaka", "Bangladesh", "Asia/Dhaka"),
    ("bangkok", "Bangkok", "Thailand", "Asia/Bangkok"),
    ("jakarta", "Jakarta", "Indonesia", "Asia/Jakarta"),
    ("singapore", "Singapore", "Singapore", "Asia/Singapore"),
    ("kuala-lumpur", "Kuala Lumpur", "Malaysia", "Asia/Kuala_Lumpur"),
    ("manila", "Manila", "Philippines", "Asia/Manila"),
    ("hong-kong", "Hong Kong", "China", "Asia/Hong_Kong"),
    ("shanghai", "Shanghai", "China", "Asia/Shanghai"),
    ("beijing", "Beijing", "China", "Asia/Shanghai"),
    ("taipei", "Taipei", "Taiwan", "Asia/Taipei"),
    ("seoul", "Seoul", "South Korea", "Asia/Seoul"),
    ("tokyo", "Tokyo", "Japan", "Asia/Tokyo"),
    ("perth", "Perth", "Australia", "Australia/Perth"),
    ("adelaide", "Adelaide", "Australia", "Australia/Adelaide"),
    ("sydney", "Sydney", "Australia", "Australia/Sydney"),
    ("melbourne", "Melbourne", "Australia", "Australia/Melbourne"),
    ("brisbane", "Brisbane", "Australia", "Australia/Brisbane"),
    ("auckland", "Auckland", "New Zealand", "Pacific/Auckland"),
    ("reykjavik", "Reykjavik", "Iceland", "Atlantic/Reykjavik"),
    ("utc", "UTC", "Coordinated Universal Time", "UTC"),
];

/// Read-only lookup and search over timezone records
#[derive(Debug, Clone)]
pub struct Catalog {
    records: Vec<TimezoneRecord>,
}

impl Catalog {
    /// The built-in city table
    pub fn builtin() -> Self {
        Self::new(
            BUILTIN
                .iter()
                .map(|&(id, city, country, tz)| TimezoneRecord::new(id, city, country, tz))
                .collect(),
        )
    }

    pub fn new(records: Vec<TimezoneRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[TimezoneRecord] {
        &self.records
    }

    pub fn by_id(&self, id: &str) -> Option<&TimezoneRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    /// First record keeping time in the given IANA zone
    pub fn by_timezone(&self, timezone: &str) -> Option<&TimezoneRecord> {
        self.records.iter().find(|r| r.timezone == timezone)
    }

    /// Record to show for the host's own zone
    pub fn user_zone_record(&self, host_zone: &str) -> TimezoneRecord {
        self.by_timezone(host_zone)
            .cloned()
            .unwrap_or_else(|| TimezoneRecord::user_location(host_zone))
    }

    /// Resolve a persisted or shared id back into a record
    pub fn resolve(&self, id: &str, host_zone: &str) -> Option<TimezoneRecord> {
        if let Some(record) = self.by_id(id) {
            return Some(record.clone());
        }
        if id == USER_ZONE_ID {
            return Some(TimezoneRecord::user_location(host_zone));
        }
        None
    }

    /// Case-insensitive substring search over city and country
    ///
    /// Records already in `selected` are skipped. An empty query matches nothing.
    pub fn search<'a>(
        &'a self,
        query: &str,
        selected: &[TimezoneRecord],
        limit: usize,
    ) -> Vec<&'a TimezoneRecord> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return Vec::new();
        }

        self.records
            .iter()
            .filter(|r| !selected.iter().any(|s| s.id == r.id))
            .filter(|r| {
                r.city.to_lowercase().contains(&query) || r.country.to_lowercase().contains(&query)
            })
            .take(limit)
            .collect()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::Tz;
    use std::collections::HashSet;

    #[test]
    fn test_builtin_ids_unique_and_zones_valid() {
        let catalog = Catalog::builtin();
        let mut seen = HashSet::new();
        for record in catalog.records() {
            assert!(seen.insert(record.id.clone()), "duplicate id {}", record.id);
            assert!(
                record.timezone.parse::<Tz>().is_ok(),
                "bad zone {}",
                record.timezone
            );
        }
    }

    #[test]
    fn test_lookup() {
        let catalog = Catalog::builtin();
        assert_eq!(catalog.by_id("tokyo").unwrap().timezone, "Asia/Tokyo");
        assert_eq!(catalog.by_timezone("Europe/Paris").unwrap().id, "paris");
        assert!(catalog.by_id("atlantis").is_none());
    }

    #[test]
    fn test_search_is_case_insensitive_over_city_and_country() {
        let catalog = Catalog::builtin();

        let by_city = catalog.search("LONDON", &[], DEFAULT_SEARCH_LIMIT);
        assert_eq!(by_city.len(), 1);
        assert_eq!(by_city[0].id, "london");

        let by_country = catalog.search("australia", &[], DEFAULT_SEARCH_LIMIT);
        assert!(by_country.len() >= 5);
        assert!(by_country.iter().all(|r| r.country == "Australia"));
    }

    #[test]
    fn test_search_is_bounded_and_skips_selected() {
        let catalog = Catalog::builtin();
        let all = catalog.search("a", &[], 100);
        assert!(all.len() > DEFAULT_SEARCH_LIMIT);
        assert_eq!(catalog.search("a", &[], DEFAULT_SEARCH_LIMIT).len(), DEFAULT_SEARCH_LIMIT);

        let selected = vec![catalog.by_id("london").unwrap().clone()];
        assert!(catalog.search("london", &selected, DEFAULT_SEARCH_LIMIT).is_empty());
        assert!(catalog.search("   ", &[], DEFAULT_SEARCH_LIMIT).is_empty());
    }

    #[test]
    fn test_user_zone_record() {
        let catalog = Catalog::builtin();
        assert_eq!(catalog.user_zone_record("Asia/Tokyo").id, "tokyo");

        let synthetic = catalog.user_zone_record("America/Boise");
        assert_eq!(synthetic.id, USER_ZONE_ID);
        assert_eq!(synthetic.city, "Your Location");
        assert_eq!(synthetic.timezone, "America/Boise");
    }

    #[test]
    fn test_resolve() {
        let catalog = Catalog::builtin();
        assert_eq!(catalog.resolve("paris", "UTC").unwrap().city, "Paris");
        assert_eq!(
            catalog.resolve(USER_ZONE_ID, "America/Boise").unwrap().timezone,
            "America/Boise"
        );
        assert!(catalog.resolve("nowhere", "UTC").is_none());
    }
}
