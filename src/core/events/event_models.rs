use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub const DEFAULT_EMBED_COLOR: u32 = 0x5865F2;
pub const EVENT_ID_PREFIX: &str = "evt_";
const MAX_CODE_LEN: usize = 20;
const MAX_NAME_LEN: usize = 100;
const MAX_DESCRIPTION_LEN: usize = 2000;

/// A time-bounded campaign that links a curated set of rewards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub event_id: String,
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub coordinator_id: Option<u64>,
    #[serde(default)]
    pub banner_url: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub info_url: Option<String>,
    #[serde(default)]
    pub priority: i64,
    #[serde(default = "default_color")]
    pub embed_color: u32,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub rewards: Vec<String>,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default = "default_true")]
    pub visible: bool,
    pub created_by: u64,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_by: Option<u64>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

fn default_color() -> u32 {
    DEFAULT_EMBED_COLOR
}

fn default_true() -> bool {
    true
}

/// Where an event sits relative to a given day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventPhase {
    Upcoming,
    Ongoing,
    Ended,
}

impl EventPhase {
    pub fn label(&self) -> &'static str {
        match self {
            EventPhase::Upcoming => "Upcoming",
            EventPhase::Ongoing => "Ongoing",
            EventPhase::Ended => "Ended",
        }
    }
}

impl Event {
    pub fn phase(&self, today: NaiveDate) -> EventPhase {
        if today < self.start_date {
            EventPhase::Upcoming
        } else if today > self.end_date {
            EventPhase::Ended
        } else {
            EventPhase::Ongoing
        }
    }

    pub fn links(&self, reward_id: &str) -> bool {
        self.rewards.iter().any(|r| r == reward_id)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        let tag = tag.trim().to_lowercase();
        self.tags.contains(&tag)
    }
}

/// Raw input for a new event, as typed by an admin.
#[derive(Debug, Clone, Default)]
pub struct EventDraft {
    pub code: String,
    pub name: String,
    pub description: String,
    pub start_date: String,
    pub end_date: String,
    pub coordinator_id: Option<u64>,
    pub banner_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub info_url: Option<String>,
    pub priority: Option<i64>,
    pub embed_color: Option<String>,
    pub tags: Option<String>,
    pub active: Option<bool>,
    pub visible: Option<bool>,
}

/// Partial event update. For the URL fields an empty string or `none`
/// clears the value; `coordinator_id: Some(None)` removes the coordinator.
#[derive(Debug, Clone, Default)]
pub struct EventPatch {
    pub code: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub coordinator_id: Option<Option<u64>>,
    pub banner_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub info_url: Option<String>,
    pub priority: Option<i64>,
    pub embed_color: Option<String>,
    pub tags: Option<String>,
}

impl EventPatch {
    pub fn is_empty(&self) -> bool {
        self.code.is_none()
            && self.name.is_none()
            && self.description.is_none()
            && self.start_date.is_none()
            && self.end_date.is_none()
            && self.coordinator_id.is_none()
            && self.banner_url.is_none()
            && self.thumbnail_url.is_none()
            && self.info_url.is_none()
            && self.priority.is_none()
            && self.embed_color.is_none()
            && self.tags.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct EventChange {
    pub before: Event,
    pub after: Event,
}

/// Result of linking or unlinking rewards.
#[derive(Debug, Clone)]
pub struct LinkOutcome {
    pub event: Event,
    /// Ids whose link state actually changed.
    pub changed: Vec<String>,
    /// Ids that were already in (or already absent from) the event.
    pub unchanged: Vec<String>,
}

// ============================================================================
// INPUT PARSING
// ============================================================================
// Every parser returns a user-facing message on failure.

pub fn parse_date(label: &str, input: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d").map_err(|_| {
        format!(
            "{} `{}` is not a valid date, use YYYY-MM-DD (e.g. 2024-07-01)",
            label,
            input.trim()
        )
    })
}

/// Accepts `#RRGGBB`, `RRGGBB` and `0xRRGGBB`.
pub fn parse_hex_color(input: &str) -> Result<u32, String> {
    let trimmed = input.trim();
    let hex = trimmed
        .strip_prefix('#')
        .or_else(|| trimmed.strip_prefix("0x"))
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(format!(
            "`{}` is not a hex color, use #RRGGBB (e.g. #FFAA00)",
            trimmed
        ));
    }
    u32::from_str_radix(hex, 16).map_err(|e| e.to_string())
}

/// Comma separated, trimmed, lowercased, de-duplicated.
pub fn parse_tags(input: &str) -> BTreeSet<String> {
    input
        .split(',')
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}

pub fn validate_code(code: &str) -> Result<String, String> {
    let code = code.trim();
    if code.is_empty() || code.len() > MAX_CODE_LEN {
        return Err(format!(
            "Event code must be 1-{} characters long",
            MAX_CODE_LEN
        ));
    }
    if !code
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err("Event code may only contain letters, digits, `-` and `_`".to_string());
    }
    // `evt_` is reserved for generated ids, which lookups try before codes.
    if code.to_ascii_lowercase().starts_with(EVENT_ID_PREFIX) {
        return Err(format!("Event codes may not start with `{}`", EVENT_ID_PREFIX));
    }
    Ok(code.to_string())
}

pub fn validate_name(name: &str) -> Result<String, String> {
    let name = name.trim();
    if name.is_empty() || name.chars().count() > MAX_NAME_LEN {
        return Err(format!("Event name must be 1-{} characters long", MAX_NAME_LEN));
    }
    Ok(name.to_string())
}

pub fn validate_description(description: &str) -> Result<String, String> {
    let description = description.trim();
    if description.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(format!(
            "Event description must be at most {} characters",
            MAX_DESCRIPTION_LEN
        ));
    }
    Ok(description.to_string())
}

/// `Ok(None)` for an empty value or `none`, which clears the URL.
pub fn parse_optional_url(label: &str, input: &str) -> Result<Option<String>, String> {
    let url = input.trim();
    if url.is_empty() || url.eq_ignore_ascii_case("none") {
        return Ok(None);
    }
    if url.starts_with("https://") || url.starts_with("http://") {
        Ok(Some(url.to_string()))
    } else {
        Err(format!("{} must start with http:// or https://", label))
    }
}

pub fn check_date_range(start: NaiveDate, end: NaiveDate) -> Result<(), String> {
    if end < start {
        return Err(format!(
            "End date {} is before start date {}",
            end.format("%Y-%m-%d"),
            start.format("%Y-%m-%d")
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_colors() {
        assert_eq!(parse_hex_color("#FFAA00"), Ok(0xFFAA00));
        assert_eq!(parse_hex_color("ffaa00"), Ok(0xFFAA00));
        assert_eq!(parse_hex_color("0x00ff00"), Ok(0x00FF00));
        assert!(parse_hex_color("#FFF").is_err());
        assert!(parse_hex_color("#GGGGGG").is_err());
    }

    #[test]
    fn parses_dates_and_ranges() {
        let start = parse_date("Start date", "2024-07-01").unwrap();
        let end = parse_date("End date", "2024-07-31").unwrap();
        assert!(check_date_range(start, end).is_ok());
        assert!(check_date_range(end, start).is_err());
        assert!(parse_date("Start date", "07/01/2024").is_err());
        assert!(parse_date("Start date", "2024-02-30").is_err());
    }

    #[test]
    fn normalises_tags() {
        let tags = parse_tags(" PvP, summer,,pvp , Raid ");
        assert_eq!(
            tags.into_iter().collect::<Vec<_>>(),
            vec!["pvp", "raid", "summer"]
        );
    }

    #[test]
    fn validates_codes_and_urls() {
        assert_eq!(validate_code(" SUMMER-24 "), Ok("SUMMER-24".to_string()));
        assert!(validate_code("has space").is_err());
        assert!(validate_code("").is_err());
        assert!(validate_code("evt_abc12345").is_err());
        assert!(validate_code("EVT_launch").is_err());
        assert!(validate_code("event_2024").is_ok());
        assert_eq!(parse_optional_url("Banner", "none"), Ok(None));
        assert!(parse_optional_url("Banner", "ftp://x").is_err());
    }

    #[test]
    fn phase_follows_dates() {
        let event = Event {
            event_id: "evt_test".to_string(),
            code: "T".to_string(),
            name: "Test".to_string(),
            description: String::new(),
            start_date: NaiveDate::from_ymd_opt(2024, 7, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 7, 31).unwrap(),
            coordinator_id: None,
            banner_url: None,
            thumbnail_url: None,
            info_url: None,
            priority: 0,
            embed_color: DEFAULT_EMBED_COLOR,
            tags: BTreeSet::new(),
            rewards: vec![],
            active: true,
            visible: true,
            created_by: 1,
            created_at: Utc::now(),
            updated_by: None,
            updated_at: None,
        };
        let day = |d| NaiveDate::from_ymd_opt(2024, 7, d).unwrap();
        assert_eq!(event.phase(day(1)), EventPhase::Ongoing);
        assert_eq!(event.phase(day(31)), EventPhase::Ongoing);
        assert_eq!(
            event.phase(NaiveDate::from_ymd_opt(2024, 6, 30).unwrap()),
            EventPhase::Upcoming
        );
        assert_eq!(
            event.phase(NaiveDate::from_ymd_opt(2024, 8, 1).unwrap()),
            EventPhase::Ended
        );
    }
}
