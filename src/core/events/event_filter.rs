use super::event_models::Event;
use crate::core::filters::{contains_ci, eq_ci, matches_opt, YearMonth};
use std::cmp::Ordering;

/// Criteria for `/event list`. Every field is optional and all present
/// criteria must hold.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    pub name: Option<String>,
    pub code: Option<String>,
    /// Matches the month of the start date.
    pub month: Option<YearMonth>,
    pub tag: Option<String>,
    pub creator_id: Option<u64>,
    pub coordinator_id: Option<u64>,
    pub active: Option<bool>,
    pub visible: Option<bool>,
    pub reward_id: Option<String>,
}

impl EventFilter {
    pub fn matches(&self, event: &Event) -> bool {
        self.name
            .as_deref()
            .map_or(true, |n| contains_ci(&event.name, n))
            && self.code.as_deref().map_or(true, |c| eq_ci(&event.code, c))
            && self.month.map_or(true, |m| m.contains(event.start_date))
            && self.tag.as_deref().map_or(true, |t| event.has_tag(t))
            && matches_opt(self.creator_id.as_ref(), &event.created_by)
            && self
                .coordinator_id
                .map_or(true, |c| event.coordinator_id == Some(c))
            && matches_opt(self.active.as_ref(), &event.active)
            && matches_opt(self.visible.as_ref(), &event.visible)
            && self.reward_id.as_deref().map_or(true, |r| event.links(r))
    }

    /// Filter and sort: priority descending, then start date, then name.
    pub fn apply(&self, events: Vec<Event>) -> Vec<Event> {
        let mut matched: Vec<Event> = events.into_iter().filter(|e| self.matches(e)).collect();
        matched.sort_by(display_order);
        matched
    }
}

pub fn display_order(a: &Event, b: &Event) -> Ordering {
    b.priority
        .cmp(&a.priority)
        .then(a.start_date.cmp(&b.start_date))
        .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::events::event_models::{parse_tags, DEFAULT_EMBED_COLOR};
    use chrono::{NaiveDate, Utc};

    fn event(
        code: &str,
        name: &str,
        start: (i32, u32, u32),
        tags: &str,
        creator: u64,
        coordinator: Option<u64>,
        active: bool,
        visible: bool,
    ) -> Event {
        let start_date = NaiveDate::from_ymd_opt(start.0, start.1, start.2).unwrap();
        Event {
            event_id: format!("evt_{}", code.to_lowercase()),
            code: code.to_string(),
            name: name.to_string(),
            description: String::new(),
            start_date,
            end_date: start_date + chrono::Duration::days(7),
            coordinator_id: coordinator,
            banner_url: None,
            thumbnail_url: None,
            info_url: None,
            priority: 0,
            embed_color: DEFAULT_EMBED_COLOR,
            tags: parse_tags(tags),
            rewards: vec![],
            active,
            visible,
            created_by: creator,
            created_at: Utc::now(),
            updated_by: None,
            updated_at: None,
        }
    }

    fn fixtures() -> Vec<Event> {
        let mut summer = event("SUM24", "Summer Festival", (2024, 7, 1), "summer,pvp", 1, Some(10), true, true);
        summer.rewards = vec!["badge_sun".to_string()];
        summer.priority = 5;
        vec![
            summer,
            event("WIN24", "Winter Gala", (2024, 12, 20), "winter", 2, Some(11), true, false),
            event("RAID", "Raid Night", (2024, 7, 15), "pvp,raid", 2, None, false, true),
            event("SPRING", "Spring Hunt", (2025, 3, 10), "", 1, Some(10), false, false),
        ]
    }

    fn codes(filter: &EventFilter) -> Vec<String> {
        filter
            .apply(fixtures())
            .into_iter()
            .map(|e| e.code)
            .collect()
    }

    #[test]
    fn empty_filter_returns_all_in_display_order() {
        assert_eq!(
            codes(&EventFilter::default()),
            vec!["SUM24", "RAID", "WIN24", "SPRING"]
        );
    }

    #[test]
    fn name_and_code_narrow() {
        let by_name = EventFilter {
            name: Some("fest".to_string()),
            ..Default::default()
        };
        assert_eq!(codes(&by_name), vec!["SUM24"]);

        let by_code = EventFilter {
            code: Some("win24".to_string()),
            ..Default::default()
        };
        assert_eq!(codes(&by_code), vec!["WIN24"]);
    }

    #[test]
    fn month_and_tag_narrow() {
        let july = EventFilter {
            month: Some("2024-07".parse().unwrap()),
            ..Default::default()
        };
        assert_eq!(codes(&july), vec!["SUM24", "RAID"]);

        let pvp = EventFilter {
            tag: Some("PvP".to_string()),
            ..Default::default()
        };
        assert_eq!(codes(&pvp), vec!["SUM24", "RAID"]);
    }

    #[test]
    fn people_narrow() {
        let creator = EventFilter {
            creator_id: Some(2),
            ..Default::default()
        };
        assert_eq!(codes(&creator), vec!["RAID", "WIN24"]);

        let coordinator = EventFilter {
            coordinator_id: Some(10),
            ..Default::default()
        };
        assert_eq!(codes(&coordinator), vec!["SUM24", "SPRING"]);
    }

    #[test]
    fn flags_narrow() {
        let active = EventFilter {
            active: Some(true),
            ..Default::default()
        };
        assert_eq!(codes(&active), vec!["SUM24", "WIN24"]);

        let hidden = EventFilter {
            visible: Some(false),
            ..Default::default()
        };
        assert_eq!(codes(&hidden), vec!["WIN24", "SPRING"]);

        let both = EventFilter {
            active: Some(false),
            visible: Some(true),
            ..Default::default()
        };
        assert_eq!(codes(&both), vec!["RAID"]);
    }

    #[test]
    fn reward_link_narrows() {
        let linked = EventFilter {
            reward_id: Some("badge_sun".to_string()),
            ..Default::default()
        };
        assert_eq!(codes(&linked), vec!["SUM24"]);
    }
}
