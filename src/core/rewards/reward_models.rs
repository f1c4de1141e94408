use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::core::filters::contains_ci;

// ============================================================================
// DOMAIN MODELS
// ============================================================================

/// The three kinds of reward the warehouse can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RewardKind {
    Badge,
    Title,
    Item,
}

impl RewardKind {
    pub const ALL: [RewardKind; 3] = [RewardKind::Badge, RewardKind::Title, RewardKind::Item];

    /// Ids are prefixed with the kind so they can be told apart at a glance.
    pub fn id_prefix(&self) -> &'static str {
        match self {
            RewardKind::Badge => "badge",
            RewardKind::Title => "title",
            RewardKind::Item => "item",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RewardKind::Badge => "Badge",
            RewardKind::Title => "Title",
            RewardKind::Item => "Item",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            RewardKind::Badge => "🏅",
            RewardKind::Title => "🎖️",
            RewardKind::Item => "📦",
        }
    }

    /// Recover the kind from a prefixed id such as `badge_early_bird`.
    pub fn from_id(id: &str) -> Option<Self> {
        let (prefix, _) = id.split_once('_')?;
        Self::ALL.into_iter().find(|k| k.id_prefix() == prefix)
    }
}

impl fmt::Display for RewardKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id_prefix())
    }
}

impl FromStr for RewardKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "badge" => Ok(RewardKind::Badge),
            "title" => Ok(RewardKind::Title),
            "item" => Ok(RewardKind::Item),
            other => Err(format!("Unknown reward type: {}", other)),
        }
    }
}

/// A reward record as persisted in the warehouse file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reward {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: RewardKind,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price: u64,
    #[serde(default)]
    pub times_bought: u64,
    /// Items only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stackable: Option<bool>,
    /// Badges only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emoji: Option<String>,
    /// Items only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_url: Option<String>,
    pub created_by: u64,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_by: Option<u64>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Reward {
    pub fn is_stackable(&self) -> bool {
        self.kind == RewardKind::Item && self.stackable.unwrap_or(false)
    }

    /// Price 0 means the reward can only be granted by an admin.
    pub fn is_for_sale(&self) -> bool {
        self.price > 0
    }

    /// Name with the badge emoji (or kind icon) in front, for embeds.
    pub fn display_name(&self) -> String {
        let icon = self.emoji.as_deref().unwrap_or(self.kind.icon());
        format!("{} {}", icon, self.name)
    }
}

/// Input for creating a reward. Validated by the warehouse service.
#[derive(Debug, Clone)]
pub struct RewardDraft {
    pub kind: RewardKind,
    pub name: String,
    pub description: String,
    pub price: u64,
    pub stackable: Option<bool>,
    pub emoji: Option<String>,
    pub media_url: Option<String>,
}

/// Partial update. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct RewardPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<u64>,
    pub stackable: Option<bool>,
    pub emoji: Option<String>,
    pub media_url: Option<String>,
}

impl RewardPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.price.is_none()
            && self.stackable.is_none()
            && self.emoji.is_none()
            && self.media_url.is_none()
    }
}

/// Before/after pair returned by updates so callers can log a diff.
#[derive(Debug, Clone)]
pub struct RewardChange {
    pub before: Reward,
    pub after: Reward,
}

/// Result of deleting a reward and unlinking it everywhere.
#[derive(Debug, Clone)]
pub struct RewardDeletion {
    pub reward: Reward,
    pub unlinked_users: usize,
    pub unlinked_events: usize,
}

/// Counts from a reference reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub users_repaired: usize,
    pub events_repaired: usize,
}

/// Criteria for `/reward list`.
#[derive(Debug, Clone, Default)]
pub struct RewardFilter {
    pub kind: Option<RewardKind>,
    pub name: Option<String>,
    pub stackable: Option<bool>,
    pub for_sale: Option<bool>,
}

impl RewardFilter {
    pub fn matches(&self, reward: &Reward) -> bool {
        self.kind.map_or(true, |k| reward.kind == k)
            && self
                .name
                .as_deref()
                .map_or(true, |n| contains_ci(&reward.name, n) || contains_ci(&reward.id, n))
            && self.stackable.map_or(true, |s| reward.is_stackable() == s)
            && self.for_sale.map_or(true, |s| reward.is_for_sale() == s)
    }
}

// ============================================================================
// ID GENERATION
// ============================================================================

const MAX_SLUG_LEN: usize = 32;

/// Lowercase ASCII slug with `_` separators, e.g. "Early Bird!" -> "early_bird".
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_sep = false;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_sep && !slug.is_empty() {
                slug.push('_');
            }
            pending_sep = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_sep = true;
        }
        if slug.len() >= MAX_SLUG_LEN {
            break;
        }
    }
    slug.truncate(MAX_SLUG_LEN);
    let slug = slug.trim_end_matches('_').to_string();
    if slug.is_empty() {
        "reward".to_string()
    } else {
        slug
    }
}

/// Build `<kind>_<slug>`, appending `_2`, `_3`, ... until `taken` says no.
pub fn generate_reward_id(kind: RewardKind, name: &str, taken: impl Fn(&str) -> bool) -> String {
    let base = format!("{}_{}", kind.id_prefix(), slugify(name));
    if !taken(&base) {
        return base;
    }
    (2..)
        .map(|n| format!("{}_{}", base, n))
        .find(|candidate| !taken(candidate))
        .unwrap_or(base)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_normalises_names() {
        assert_eq!(slugify("Early Bird!"), "early_bird");
        assert_eq!(slugify("  ***  "), "reward");
        assert_eq!(slugify("Gold -- Coin x10"), "gold_coin_x10");
        assert!(slugify(&"a".repeat(100)).len() <= MAX_SLUG_LEN);
    }

    #[test]
    fn generated_ids_are_prefixed_and_unique() {
        let existing = ["badge_early_bird".to_string(), "badge_early_bird_2".to_string()];
        let id = generate_reward_id(RewardKind::Badge, "Early Bird", |c| {
            existing.iter().any(|e| e == c)
        });
        assert_eq!(id, "badge_early_bird_3");

        let id = generate_reward_id(RewardKind::Item, "Potion", |_| false);
        assert_eq!(id, "item_potion");
        assert_eq!(RewardKind::from_id(&id), Some(RewardKind::Item));
    }

    #[test]
    fn serializes_kind_as_type_field() {
        let reward = Reward {
            id: "title_champion".to_string(),
            kind: RewardKind::Title,
            name: "Champion".to_string(),
            description: String::new(),
            price: 0,
            times_bought: 0,
            stackable: None,
            emoji: None,
            media_url: None,
            created_by: 1,
            created_at: Utc::now(),
            updated_by: None,
            updated_at: None,
        };
        let json = serde_json::to_value(&reward).unwrap();
        assert_eq!(json["type"], "title");
        assert!(json.get("emoji").is_none());
    }
}
