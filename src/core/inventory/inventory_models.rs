use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Everything a single user owns.
///
/// Titles and badges are sets; items are a multiset, so a stackable item
/// appears once per copy held.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserData {
    #[serde(default)]
    pub points: u64,
    #[serde(default)]
    pub titles: BTreeSet<String>,
    #[serde(default)]
    pub badges: BTreeSet<String>,
    #[serde(default)]
    pub items: Vec<String>,
    #[serde(default)]
    pub equipped_title: Option<String>,
}

impl UserData {
    pub fn owns(&self, reward_id: &str) -> bool {
        self.titles.contains(reward_id)
            || self.badges.contains(reward_id)
            || self.items.iter().any(|i| i == reward_id)
    }

    pub fn item_count(&self, reward_id: &str) -> usize {
        self.items.iter().filter(|i| *i == reward_id).count()
    }

    /// Items grouped into `(id, copies)` pairs, ordered by id.
    pub fn item_stacks(&self) -> Vec<(String, usize)> {
        let mut stacks: BTreeMap<&str, usize> = BTreeMap::new();
        for item in &self.items {
            *stacks.entry(item.as_str()).or_default() += 1;
        }
        stacks
            .into_iter()
            .map(|(id, count)| (id.to_string(), count))
            .collect()
    }

    /// Drop every reward id for which `keep` returns false. Clears the
    /// equipped title if it no longer points into `titles`. Returns whether
    /// anything changed.
    pub fn retain_rewards(&mut self, keep: impl Fn(&str) -> bool) -> bool {
        let before = (self.titles.len(), self.badges.len(), self.items.len());
        self.titles.retain(|id| keep(id));
        self.badges.retain(|id| keep(id));
        self.items.retain(|id| keep(id));
        let mut changed = before != (self.titles.len(), self.badges.len(), self.items.len());

        if let Some(equipped) = &self.equipped_title {
            if !self.titles.contains(equipped) {
                self.equipped_title = None;
                changed = true;
            }
        }
        changed
    }

    /// Remove all references to one reward.
    pub fn strip_reward(&mut self, reward_id: &str) -> bool {
        self.retain_rewards(|id| id != reward_id)
    }
}

/// What a grant did to the user's inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantOutcome {
    Granted { copies: u32, total_held: usize },
    /// Non-stackable reward the user already had; nothing was written.
    AlreadyOwned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevokeOutcome {
    pub removed: u32,
    pub remaining: usize,
}

/// Balance before and after a points adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointsChange {
    pub before: u64,
    pub after: u64,
}

impl PointsChange {
    /// How many points actually moved, whichever direction.
    pub fn moved(&self) -> u64 {
        self.before.abs_diff(self.after)
    }
}

/// One line of an event bundle award.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BundleLine {
    Granted(String),
    AlreadyOwned(String),
    /// The event still referenced a reward that is gone from the warehouse.
    Missing(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> UserData {
        UserData {
            points: 10,
            titles: ["title_champion".to_string(), "title_rookie".to_string()].into(),
            badges: ["badge_early".to_string()].into(),
            items: vec![
                "item_potion".to_string(),
                "item_potion".to_string(),
                "item_key".to_string(),
            ],
            equipped_title: Some("title_champion".to_string()),
        }
    }

    #[test]
    fn counts_and_stacks_items() {
        let user = sample();
        assert_eq!(user.item_count("item_potion"), 2);
        assert_eq!(
            user.item_stacks(),
            vec![("item_key".to_string(), 1), ("item_potion".to_string(), 2)]
        );
        assert!(user.owns("badge_early"));
        assert!(!user.owns("badge_late"));
    }

    #[test]
    fn stripping_equipped_title_unequips_it() {
        let mut user = sample();
        assert!(user.strip_reward("title_champion"));
        assert!(user.equipped_title.is_none());
        assert!(!user.strip_reward("title_champion"));
    }

    #[test]
    fn stripping_item_removes_every_copy() {
        let mut user = sample();
        assert!(user.strip_reward("item_potion"));
        assert_eq!(user.item_count("item_potion"), 0);
        assert_eq!(user.items, vec!["item_key".to_string()]);
    }
}
