// Warehouse service - the catalog of every reward the bot can hand out.
//
// Creating, editing and listing rewards only touches the warehouse store.
// Deleting a reward (and the startup reconciliation pass) also walks the
// user and event stores so no inventory or event keeps pointing at an id
// that no longer exists.

use super::reward_models::{
    generate_reward_id, ReconcileReport, Reward, RewardChange, RewardDeletion, RewardDraft,
    RewardFilter, RewardKind, RewardPatch,
};
use super::reward_store::WarehouseStore;
use crate::core::events::EventStore;
use crate::core::inventory::UserStore;
use crate::core::storage::{StoreError, WriteGate};
use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;

const MAX_NAME_LEN: usize = 64;
const MAX_DESCRIPTION_LEN: usize = 1024;
const MAX_EMOJI_LEN: usize = 64;

#[derive(Debug, thiserror::Error)]
pub enum WarehouseError {
    #[error("{0}")]
    Validation(String),
    #[error("Reward `{0}` does not exist")]
    NotFound(String),
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

pub struct WarehouseService<W: WarehouseStore, U: UserStore, E: EventStore> {
    rewards: Arc<W>,
    users: Arc<U>,
    events: Arc<E>,
    gate: WriteGate,
}

impl<W: WarehouseStore, U: UserStore, E: EventStore> WarehouseService<W, U, E> {
    pub fn new(rewards: Arc<W>, users: Arc<U>, events: Arc<E>, gate: WriteGate) -> Self {
        Self {
            rewards,
            users,
            events,
            gate,
        }
    }

    pub async fn get_reward(&self, id: &str) -> Result<Option<Reward>, WarehouseError> {
        Ok(self.rewards.get_reward(id.trim()).await?)
    }

    pub async fn require_reward(&self, id: &str) -> Result<Reward, WarehouseError> {
        self.get_reward(id)
            .await?
            .ok_or_else(|| WarehouseError::NotFound(id.trim().to_string()))
    }

    /// Rewards matching `filter`, grouped by kind and sorted by name.
    pub async fn list_rewards(&self, filter: &RewardFilter) -> Result<Vec<Reward>, WarehouseError> {
        let mut rewards: Vec<Reward> = self
            .rewards
            .list_rewards()
            .await?
            .into_iter()
            .filter(|r| filter.matches(r))
            .collect();
        rewards.sort_by(|a, b| {
            a.kind
                .cmp(&b.kind)
                .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
        });
        Ok(rewards)
    }

    /// Autocomplete lookup by name or id, narrowed by `filter` before the limit
    /// is applied.
    pub async fn search_rewards(
        &self,
        partial: &str,
        mut filter: RewardFilter,
        limit: usize,
    ) -> Result<Vec<Reward>, WarehouseError> {
        filter.name = Some(partial.to_string());
        let mut rewards = self.list_rewards(&filter).await?;
        rewards.truncate(limit);
        Ok(rewards)
    }

    pub async fn create_reward(
        &self,
        draft: RewardDraft,
        actor_id: u64,
    ) -> Result<Reward, WarehouseError> {
        let name = clean_name(&draft.name)?;
        let description = clean_description(&draft.description)?;
        let emoji = normalize_optional(draft.emoji);
        let media_url = normalize_optional(draft.media_url);
        check_kind_fields(
            draft.kind,
            draft.stackable,
            emoji.as_deref(),
            media_url.as_deref(),
        )?;

        let stackable = match draft.kind {
            RewardKind::Item => Some(draft.stackable.unwrap_or(false)),
            _ => None,
        };

        let _guard = self.gate.enter().await;
        let taken: HashSet<String> = self
            .rewards
            .list_rewards()
            .await?
            .into_iter()
            .map(|r| r.id)
            .collect();
        let id = generate_reward_id(draft.kind, &name, |candidate| taken.contains(candidate));

        let reward = Reward {
            id,
            kind: draft.kind,
            name,
            description,
            price: draft.price,
            times_bought: 0,
            stackable,
            emoji,
            media_url,
            created_by: actor_id,
            created_at: Utc::now(),
            updated_by: None,
            updated_at: None,
        };
        self.rewards.insert_reward(reward.clone()).await?;

        tracing::info!(reward_id = %reward.id, actor = actor_id, "Reward created");
        Ok(reward)
    }

    pub async fn update_reward(
        &self,
        id: &str,
        patch: RewardPatch,
        actor_id: u64,
    ) -> Result<RewardChange, WarehouseError> {
        if patch.is_empty() {
            return Err(WarehouseError::Validation(
                "Provide at least one field to change".to_string(),
            ));
        }

        let _guard = self.gate.enter().await;
        let before = self.require_reward(id).await?;
        let mut after = before.clone();

        if let Some(name) = &patch.name {
            after.name = clean_name(name)?;
        }
        if let Some(description) = &patch.description {
            after.description = clean_description(description)?;
        }
        if let Some(price) = patch.price {
            after.price = price;
        }

        // Applicability is checked against what the admin typed, so asking to
        // give a title an emoji is rejected even when it would clear a value.
        check_kind_fields(
            before.kind,
            patch.stackable,
            patch.emoji.as_deref().filter(|e| !is_clear(e)),
            patch.media_url.as_deref().filter(|u| !is_clear(u)),
        )?;
        if patch.emoji.is_some() && before.kind != RewardKind::Badge {
            return Err(WarehouseError::Validation(
                "Only badges have an emoji".to_string(),
            ));
        }
        if patch.media_url.is_some() && before.kind != RewardKind::Item {
            return Err(WarehouseError::Validation(
                "Only items have a media URL".to_string(),
            ));
        }
        if let Some(stackable) = patch.stackable {
            after.stackable = Some(stackable);
        }
        if before.is_stackable() && !after.is_stackable() {
            let stacked_holders = self
                .users
                .all_users()
                .await?
                .iter()
                .filter(|(_, data)| data.item_count(&before.id) > 1)
                .count();
            if stacked_holders > 0 {
                return Err(WarehouseError::Validation(format!(
                    "{} user(s) hold several copies of this item; revoke the extras before making it non-stackable",
                    stacked_holders
                )));
            }
        }
        if let Some(emoji) = patch.emoji {
            after.emoji = normalize_optional(Some(emoji));
        }
        if let Some(url) = patch.media_url {
            after.media_url = normalize_optional(Some(url));
        }

        if after == before {
            return Err(WarehouseError::Validation(
                "Those values match the current reward, nothing changed".to_string(),
            ));
        }

        after.updated_by = Some(actor_id);
        after.updated_at = Some(Utc::now());
        self.rewards.save_reward(after.clone()).await?;

        tracing::info!(reward_id = %after.id, actor = actor_id, "Reward updated");
        Ok(RewardChange { before, after })
    }

    /// Remove a reward and every reference to it.
    ///
    /// The warehouse is written first. If a later write fails the dangling
    /// references are cleaned up by the next `reconcile_references` pass.
    pub async fn delete_reward(&self, id: &str) -> Result<RewardDeletion, WarehouseError> {
        let _guard = self.gate.enter().await;
        let reward = self
            .rewards
            .remove_reward(id.trim())
            .await?
            .ok_or_else(|| WarehouseError::NotFound(id.trim().to_string()))?;

        let mut touched_users = Vec::new();
        for (user_id, mut data) in self.users.all_users().await? {
            if data.strip_reward(&reward.id) {
                touched_users.push((user_id, data));
            }
        }
        let unlinked_users = touched_users.len();
        if !touched_users.is_empty() {
            self.users.save_users(touched_users).await?;
        }

        let mut touched_events = Vec::new();
        for mut event in self.events.list_events().await? {
            if event.links(&reward.id) {
                event.rewards.retain(|r| r != &reward.id);
                touched_events.push(event);
            }
        }
        let unlinked_events = touched_events.len();
        if !touched_events.is_empty() {
            self.events.save_events(touched_events).await?;
        }

        tracing::info!(
            reward_id = %reward.id,
            unlinked_users,
            unlinked_events,
            "Reward deleted"
        );
        Ok(RewardDeletion {
            reward,
            unlinked_users,
            unlinked_events,
        })
    }

    /// Strip ids that are no longer in the warehouse from users and events.
    pub async fn reconcile_references(&self) -> Result<ReconcileReport, WarehouseError> {
        let _guard = self.gate.enter().await;
        let known: HashSet<String> = self
            .rewards
            .list_rewards()
            .await?
            .into_iter()
            .map(|r| r.id)
            .collect();

        let mut repaired_users = Vec::new();
        for (user_id, mut data) in self.users.all_users().await? {
            if data.retain_rewards(|id| known.contains(id)) {
                repaired_users.push((user_id, data));
            }
        }

        let mut repaired_events = Vec::new();
        for mut event in self.events.list_events().await? {
            let before = event.rewards.len();
            event.rewards.retain(|id| known.contains(id));
            if event.rewards.len() != before {
                repaired_events.push(event);
            }
        }

        let report = ReconcileReport {
            users_repaired: repaired_users.len(),
            events_repaired: repaired_events.len(),
        };
        if !repaired_users.is_empty() {
            self.users.save_users(repaired_users).await?;
        }
        if !repaired_events.is_empty() {
            self.events.save_events(repaired_events).await?;
        }
        Ok(report)
    }
}

// ============================================================================
// VALIDATION
// ============================================================================

fn clean_name(name: &str) -> Result<String, WarehouseError> {
    let name = name.trim();
    if name.is_empty() || name.chars().count() > MAX_NAME_LEN {
        return Err(WarehouseError::Validation(format!(
            "Reward name must be 1-{} characters long",
            MAX_NAME_LEN
        )));
    }
    Ok(name.to_string())
}

fn clean_description(description: &str) -> Result<String, WarehouseError> {
    let description = description.trim();
    if description.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(WarehouseError::Validation(format!(
            "Reward description must be at most {} characters",
            MAX_DESCRIPTION_LEN
        )));
    }
    Ok(description.to_string())
}

fn is_clear(value: &str) -> bool {
    let value = value.trim();
    value.is_empty() || value.eq_ignore_ascii_case("none")
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !is_clear(v))
}

/// Type-specific fields may only be set on the matching reward type.
fn check_kind_fields(
    kind: RewardKind,
    stackable: Option<bool>,
    emoji: Option<&str>,
    media_url: Option<&str>,
) -> Result<(), WarehouseError> {
    if stackable.is_some() && kind != RewardKind::Item {
        return Err(WarehouseError::Validation(
            "Only items can be stackable".to_string(),
        ));
    }
    if let Some(emoji) = emoji {
        if kind != RewardKind::Badge {
            return Err(WarehouseError::Validation(
                "Only badges have an emoji".to_string(),
            ));
        }
        if emoji.chars().count() > MAX_EMOJI_LEN {
            return Err(WarehouseError::Validation(
                "Badge emoji is too long".to_string(),
            ));
        }
    }
    if let Some(url) = media_url {
        if kind != RewardKind::Item {
            return Err(WarehouseError::Validation(
                "Only items have a media URL".to_string(),
            ));
        }
        if !(url.starts_with("https://") || url.starts_with("http://")) {
            return Err(WarehouseError::Validation(
                "Media URL must start with http:// or https://".to_string(),
            ));
        }
    }
    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::events::Event;
    use crate::core::inventory::UserData;
    use crate::infra::memory::{InMemoryEventStore, InMemoryUserStore, InMemoryWarehouseStore};
    use chrono::NaiveDate;

    type Service = WarehouseService<InMemoryWarehouseStore, InMemoryUserStore, InMemoryEventStore>;

    struct Fixture {
        service: Service,
        users: Arc<InMemoryUserStore>,
        events: Arc<InMemoryEventStore>,
    }

    fn fixture() -> Fixture {
        let users = Arc::new(InMemoryUserStore::new());
        let events = Arc::new(InMemoryEventStore::new());
        let service = WarehouseService::new(
            Arc::new(InMemoryWarehouseStore::new()),
            Arc::clone(&users),
            Arc::clone(&events),
            WriteGate::new(),
        );
        Fixture {
            service,
            users,
            events,
        }
    }

    fn draft(kind: RewardKind, name: &str) -> RewardDraft {
        RewardDraft {
            kind,
            name: name.to_string(),
            description: "test reward".to_string(),
            price: 100,
            stackable: None,
            emoji: None,
            media_url: None,
        }
    }

    fn event_linking(event_id: &str, rewards: &[&str]) -> Event {
        Event {
            event_id: event_id.to_string(),
            code: event_id.to_uppercase(),
            name: event_id.to_string(),
            description: String::new(),
            start_date: NaiveDate::from_ymd_opt(2024, 7, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 7, 2).unwrap(),
            coordinator_id: None,
            banner_url: None,
            thumbnail_url: None,
            info_url: None,
            priority: 0,
            embed_color: 0,
            tags: Default::default(),
            rewards: rewards.iter().map(|r| r.to_string()).collect(),
            active: true,
            visible: true,
            created_by: 1,
            created_at: Utc::now(),
            updated_by: None,
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn create_assigns_unique_prefixed_ids() {
        let f = fixture();
        let first = f
            .service
            .create_reward(draft(RewardKind::Badge, "Early Bird"), 1)
            .await
            .unwrap();
        let second = f
            .service
            .create_reward(draft(RewardKind::Badge, "Early Bird"), 1)
            .await
            .unwrap();
        assert_eq!(first.id, "badge_early_bird");
        assert_eq!(second.id, "badge_early_bird_2");
    }

    #[tokio::test]
    async fn create_rejects_fields_of_other_types() {
        let f = fixture();
        let mut title = draft(RewardKind::Title, "Champion");
        title.emoji = Some("🏆".to_string());
        let err = f.service.create_reward(title, 1).await.unwrap_err();
        assert!(matches!(err, WarehouseError::Validation(_)));

        let mut badge = draft(RewardKind::Badge, "Shiny");
        badge.stackable = Some(true);
        assert!(f.service.create_reward(badge, 1).await.is_err());

        let mut item = draft(RewardKind::Item, "Potion");
        item.media_url = Some("not-a-url".to_string());
        assert!(f.service.create_reward(item, 1).await.is_err());
    }

    #[tokio::test]
    async fn items_default_to_non_stackable() {
        let f = fixture();
        let item = f
            .service
            .create_reward(draft(RewardKind::Item, "Key"), 1)
            .await
            .unwrap();
        assert_eq!(item.stackable, Some(false));
        assert!(!item.is_stackable());
    }

    #[tokio::test]
    async fn update_records_before_and_after() {
        let f = fixture();
        let reward = f
            .service
            .create_reward(draft(RewardKind::Item, "Potion"), 1)
            .await
            .unwrap();

        let change = f
            .service
            .update_reward(
                &reward.id,
                RewardPatch {
                    price: Some(250),
                    stackable: Some(true),
                    ..Default::default()
                },
                2,
            )
            .await
            .unwrap();
        assert_eq!(change.before.price, 100);
        assert_eq!(change.after.price, 250);
        assert!(change.after.is_stackable());
        assert_eq!(change.after.updated_by, Some(2));

        let same = f
            .service
            .update_reward(
                &reward.id,
                RewardPatch {
                    price: Some(250),
                    ..Default::default()
                },
                2,
            )
            .await;
        assert!(matches!(same, Err(WarehouseError::Validation(_))));
    }

    #[tokio::test]
    async fn update_rejects_emoji_on_items() {
        let f = fixture();
        let reward = f
            .service
            .create_reward(draft(RewardKind::Item, "Potion"), 1)
            .await
            .unwrap();
        let result = f
            .service
            .update_reward(
                &reward.id,
                RewardPatch {
                    emoji: Some("none".to_string()),
                    ..Default::default()
                },
                1,
            )
            .await;
        assert!(matches!(result, Err(WarehouseError::Validation(_))));
    }

    #[tokio::test]
    async fn delete_unlinks_from_users_and_events() {
        let f = fixture();
        let title = f
            .service
            .create_reward(draft(RewardKind::Title, "Champion"), 1)
            .await
            .unwrap();
        let mut potion = draft(RewardKind::Item, "Potion");
        potion.stackable = Some(true);
        let potion = f.service.create_reward(potion, 1).await.unwrap();

        let holder = UserData {
            titles: [title.id.clone()].into(),
            items: vec![potion.id.clone(), potion.id.clone()],
            equipped_title: Some(title.id.clone()),
            ..Default::default()
        };
        f.users.save_user(7, holder).await.unwrap();
        f.users
            .save_user(8, UserData {
                points: 5,
                ..Default::default()
            })
            .await
            .unwrap();
        f.events
            .insert_event(event_linking("evt_a", &[&title.id, &potion.id]))
            .await
            .unwrap();
        f.events
            .insert_event(event_linking("evt_b", &[&potion.id]))
            .await
            .unwrap();

        let deletion = f.service.delete_reward(&title.id).await.unwrap();
        assert_eq!(deletion.unlinked_users, 1);
        assert_eq!(deletion.unlinked_events, 1);

        let user = f.users.get_user(7).await.unwrap().unwrap();
        assert!(user.titles.is_empty());
        assert!(user.equipped_title.is_none());
        assert_eq!(user.item_count(&potion.id), 2);

        let deletion = f.service.delete_reward(&potion.id).await.unwrap();
        assert_eq!(deletion.unlinked_users, 1);
        assert_eq!(deletion.unlinked_events, 2);
        for event in f.events.list_events().await.unwrap() {
            assert!(event.rewards.is_empty());
        }
        assert!(f.service.get_reward(&potion.id).await.unwrap().is_none());

        let missing = f.service.delete_reward(&potion.id).await;
        assert!(matches!(missing, Err(WarehouseError::NotFound(_))));
    }

    #[tokio::test]
    async fn stackable_flag_stays_while_copies_are_stacked() {
        let f = fixture();
        let mut potion = draft(RewardKind::Item, "Potion");
        potion.stackable = Some(true);
        let potion = f.service.create_reward(potion, 1).await.unwrap();
        f.users
            .save_user(7, UserData {
                items: vec![potion.id.clone(); 3],
                ..Default::default()
            })
            .await
            .unwrap();

        let flip = || RewardPatch {
            stackable: Some(false),
            ..Default::default()
        };
        let refused = f.service.update_reward(&potion.id, flip(), 1).await;
        assert!(matches!(refused, Err(WarehouseError::Validation(_))));
        let stored = f.service.require_reward(&potion.id).await.unwrap();
        assert_eq!(stored.stackable, Some(true));

        f.users
            .save_user(7, UserData {
                items: vec![potion.id.clone()],
                ..Default::default()
            })
            .await
            .unwrap();
        let change = f.service.update_reward(&potion.id, flip(), 1).await.unwrap();
        assert!(!change.after.is_stackable());
    }

    #[tokio::test]
    async fn reconcile_removes_dangling_ids() {
        let f = fixture();
        let badge = f
            .service
            .create_reward(draft(RewardKind::Badge, "Kept"), 1)
            .await
            .unwrap();
        f.users
            .save_user(
                1,
                UserData {
                    badges: [badge.id.clone(), "badge_gone".to_string()].into(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        f.users
            .save_user(
                2,
                UserData {
                    badges: [badge.id.clone()].into(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        f.events
            .insert_event(event_linking("evt_a", &[&badge.id, "item_gone"]))
            .await
            .unwrap();

        let report = f.service.reconcile_references().await.unwrap();
        assert_eq!(
            report,
            ReconcileReport {
                users_repaired: 1,
                events_repaired: 1
            }
        );
        let user = f.users.get_user(1).await.unwrap().unwrap();
        assert_eq!(user.badges.len(), 1);

        let again = f.service.reconcile_references().await.unwrap();
        assert_eq!(again, ReconcileReport::default());
    }

    #[tokio::test]
    async fn list_filters_and_sorts() {
        let f = fixture();
        for (kind, name) in [
            (RewardKind::Item, "Zeta"),
            (RewardKind::Badge, "Beta"),
            (RewardKind::Badge, "Alpha"),
        ] {
            f.service.create_reward(draft(kind, name), 1).await.unwrap();
        }
        let all = f.service.list_rewards(&RewardFilter::default()).await.unwrap();
        let names: Vec<_> = all.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Alpha", "Beta", "Zeta"]);

        let badges = f
            .service
            .list_rewards(&RewardFilter {
                kind: Some(RewardKind::Badge),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(badges.len(), 2);

        let found = f
            .service
            .search_rewards("zet", RewardFilter::default(), 10)
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
    }

    #[tokio::test]
    async fn search_for_sale_skips_unpriced_rewards() {
        let f = fixture();
        let mut free = draft(RewardKind::Badge, "Alpha Gift");
        free.price = 0;
        f.service.create_reward(free, 1).await.unwrap();
        f.service
            .create_reward(draft(RewardKind::Badge, "Alpha Star"), 1)
            .await
            .unwrap();

        let for_sale = RewardFilter {
            for_sale: Some(true),
            ..Default::default()
        };
        let found = f.service.search_rewards("alpha", for_sale, 1).await.unwrap();
        let names: Vec<_> = found.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Alpha Star"]);
    }
}
