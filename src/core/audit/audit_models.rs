use crate::core::filters::YearMonth;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Fields that change on every edit and would only add noise to a diff.
const BOOKKEEPING_FIELDS: &[&str] = &["updated_at", "updated_by"];

/// The three append-only logs kept on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogKind {
    Rewards,
    Events,
    Deletions,
}

impl LogKind {
    pub fn file_name(&self) -> &'static str {
        match self {
            LogKind::Rewards => "reward_log.json",
            LogKind::Events => "event_log.json",
            LogKind::Deletions => "deletion_log.json",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            LogKind::Rewards => "reward",
            LogKind::Events => "event",
            LogKind::Deletions => "deletion",
        }
    }
}

impl fmt::Display for LogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardAction {
    Created,
    Updated,
    Deleted,
    Granted,
    Revoked,
    PointsAdded,
    PointsRemoved,
    Purchased,
    TitleEquipped,
    TitleUnequipped,
}

impl RewardAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            RewardAction::Created => "created",
            RewardAction::Updated => "updated",
            RewardAction::Deleted => "deleted",
            RewardAction::Granted => "granted",
            RewardAction::Revoked => "revoked",
            RewardAction::PointsAdded => "points_added",
            RewardAction::PointsRemoved => "points_removed",
            RewardAction::Purchased => "purchased",
            RewardAction::TitleEquipped => "title_equipped",
            RewardAction::TitleUnequipped => "title_unequipped",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventAction {
    Created,
    Updated,
    Deleted,
    RewardsLinked,
    RewardsUnlinked,
    FlagsChanged,
    Awarded,
}

impl EventAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventAction::Created => "created",
            EventAction::Updated => "updated",
            EventAction::Deleted => "deleted",
            EventAction::RewardsLinked => "rewards_linked",
            EventAction::RewardsUnlinked => "rewards_unlinked",
            EventAction::FlagsChanged => "flags_changed",
            EventAction::Awarded => "awarded",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardLogEntry {
    pub action: RewardAction,
    pub actor_id: u64,
    /// The member the action was applied to, if any.
    #[serde(default)]
    pub target_id: Option<u64>,
    #[serde(default)]
    pub reward_id: Option<String>,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl RewardLogEntry {
    pub fn new(action: RewardAction, actor_id: u64) -> Self {
        Self {
            action,
            actor_id,
            target_id: None,
            reward_id: None,
            timestamp: Utc::now(),
            reason: String::new(),
            details: None,
        }
    }

    pub fn target(mut self, user_id: u64) -> Self {
        self.target_id = Some(user_id);
        self
    }

    pub fn reward(mut self, reward_id: impl Into<String>) -> Self {
        self.reward_id = Some(reward_id.into());
        self
    }

    pub fn reason(mut self, reason: Option<&str>) -> Self {
        self.reason = reason.unwrap_or_default().trim().to_string();
        self
    }

    pub fn details(mut self, details: Option<Value>) -> Self {
        self.details = details;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub action: EventAction,
    pub actor_id: u64,
    pub event_id: String,
    #[serde(default)]
    pub target_id: Option<u64>,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl EventLogEntry {
    pub fn new(action: EventAction, actor_id: u64, event_id: impl Into<String>) -> Self {
        Self {
            action,
            actor_id,
            event_id: event_id.into(),
            target_id: None,
            timestamp: Utc::now(),
            reason: String::new(),
            details: None,
        }
    }

    pub fn target(mut self, user_id: u64) -> Self {
        self.target_id = Some(user_id);
        self
    }

    pub fn reason(mut self, reason: Option<&str>) -> Self {
        self.reason = reason.unwrap_or_default().trim().to_string();
        self
    }

    pub fn details(mut self, details: Option<Value>) -> Self {
        self.details = details;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeletedKind {
    Reward,
    Event,
}

/// Snapshot of a deleted reward or event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeletionLogEntry {
    pub kind: DeletedKind,
    pub object_id: String,
    pub name: String,
    pub actor_id: u64,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub reason: String,
    pub snapshot: Value,
    #[serde(default)]
    pub unlinked_users: usize,
    #[serde(default)]
    pub unlinked_events: usize,
}

/// Optional criteria for browsing a log. All given criteria must hold.
#[derive(Debug, Clone, Default)]
pub struct LogQuery {
    pub actor_id: Option<u64>,
    pub target_id: Option<u64>,
    /// Reward id, event id or deleted object id depending on the log.
    pub subject_id: Option<String>,
    pub action: Option<String>,
    pub month: Option<YearMonth>,
}

impl LogQuery {
    fn matches(
        &self,
        actor_id: u64,
        target_id: Option<u64>,
        subject_id: Option<&str>,
        action: &str,
        timestamp: DateTime<Utc>,
    ) -> bool {
        if self.actor_id.is_some_and(|a| a != actor_id) {
            return false;
        }
        if self.target_id.is_some() && self.target_id != target_id {
            return false;
        }
        if let Some(subject) = &self.subject_id {
            if !subject_id.is_some_and(|s| s.eq_ignore_ascii_case(subject.trim())) {
                return false;
            }
        }
        if let Some(wanted) = &self.action {
            if !wanted.trim().eq_ignore_ascii_case(action) {
                return false;
            }
        }
        if let Some(month) = self.month {
            if !month.contains(timestamp.date_naive()) {
                return false;
            }
        }
        true
    }

    pub fn matches_reward(&self, entry: &RewardLogEntry) -> bool {
        self.matches(
            entry.actor_id,
            entry.target_id,
            entry.reward_id.as_deref(),
            entry.action.as_str(),
            entry.timestamp,
        )
    }

    pub fn matches_event(&self, entry: &EventLogEntry) -> bool {
        self.matches(
            entry.actor_id,
            entry.target_id,
            Some(&entry.event_id),
            entry.action.as_str(),
            entry.timestamp,
        )
    }

    pub fn matches_deletion(&self, entry: &DeletionLogEntry) -> bool {
        let kind = match entry.kind {
            DeletedKind::Reward => "reward",
            DeletedKind::Event => "event",
        };
        self.matches(
            entry.actor_id,
            None,
            Some(&entry.object_id),
            kind,
            entry.timestamp,
        )
    }
}

/// Compare the JSON forms of two records and report every top-level field
/// that differs as `{field: {"old": .., "new": ..}}`. `None` when nothing
/// but bookkeeping changed.
pub fn field_diff<T: Serialize>(before: &T, after: &T) -> Option<Value> {
    let before = serde_json::to_value(before).ok()?;
    let after = serde_json::to_value(after).ok()?;
    let (Value::Object(old), Value::Object(new)) = (before, after) else {
        return None;
    };

    let mut keys: Vec<&String> = old.keys().chain(new.keys()).collect();
    keys.sort();
    keys.dedup();

    let mut diff = Map::new();
    for key in keys {
        if BOOKKEEPING_FIELDS.contains(&key.as_str()) {
            continue;
        }
        let old_value = old.get(key).cloned().unwrap_or(Value::Null);
        let new_value = new.get(key).cloned().unwrap_or(Value::Null);
        if old_value != new_value {
            diff.insert(
                key.clone(),
                serde_json::json!({ "old": old_value, "new": new_value }),
            );
        }
    }

    if diff.is_empty() {
        None
    } else {
        Some(Value::Object(diff))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[derive(Serialize, Clone)]
    struct Record {
        name: String,
        price: u64,
        updated_at: Option<String>,
        emoji: Option<String>,
    }

    #[test]
    fn diff_reports_only_changed_fields() {
        let before = Record {
            name: "Sun".to_string(),
            price: 10,
            updated_at: None,
            emoji: None,
        };
        let after = Record {
            name: "Sun".to_string(),
            price: 25,
            updated_at: Some("2024-07-01".to_string()),
            emoji: Some(":sunny:".to_string()),
        };
        let diff = field_diff(&before, &after).unwrap();
        assert_eq!(
            diff,
            json!({
                "emoji": { "old": null, "new": ":sunny:" },
                "price": { "old": 10, "new": 25 },
            })
        );
    }

    #[test]
    fn diff_is_none_for_bookkeeping_only_changes() {
        let before = Record {
            name: "Sun".to_string(),
            price: 10,
            updated_at: None,
            emoji: None,
        };
        let after = Record {
            updated_at: Some("2024-07-01".to_string()),
            ..before.clone()
        };
        assert!(field_diff(&before, &after).is_none());
    }

    #[test]
    fn query_combines_criteria() {
        let mut entry = RewardLogEntry::new(RewardAction::Granted, 7)
            .target(42)
            .reward("badge_sun")
            .reason(Some("  contest winner "));
        entry.timestamp = Utc.with_ymd_and_hms(2024, 7, 15, 12, 0, 0).unwrap();
        assert_eq!(entry.reason, "contest winner");

        assert!(LogQuery::default().matches_reward(&entry));
        assert!(LogQuery {
            actor_id: Some(7),
            target_id: Some(42),
            subject_id: Some("BADGE_SUN".to_string()),
            action: Some("granted".to_string()),
            month: "2024-07".parse().ok(),
        }
        .matches_reward(&entry));

        assert!(!LogQuery {
            actor_id: Some(8),
            ..Default::default()
        }
        .matches_reward(&entry));
        assert!(!LogQuery {
            action: Some("revoked".to_string()),
            ..Default::default()
        }
        .matches_reward(&entry));
        assert!(!LogQuery {
            month: "2024-08".parse().ok(),
            ..Default::default()
        }
        .matches_reward(&entry));
    }

    #[test]
    fn actions_serialize_in_snake_case() {
        let value = serde_json::to_value(RewardAction::PointsRemoved).unwrap();
        assert_eq!(value, json!("points_removed"));
        assert_eq!(RewardAction::PointsRemoved.as_str(), "points_removed");
        assert_eq!(
            serde_json::to_value(EventAction::RewardsLinked).unwrap(),
            json!(EventAction::RewardsLinked.as_str())
        );
    }
}
