// Event service - CRUD over events plus their reward links.
//
// Events are addressed by either their generated `event_id` or their
// human-facing `code`; `find_event` accepts both so commands can take
// whatever the admin typed.

use super::event_filter::EventFilter;
use super::event_models::{
    check_date_range, parse_date, parse_hex_color, parse_optional_url, parse_tags,
    validate_code, validate_description, validate_name, Event, EventChange, EventDraft,
    EventPatch, LinkOutcome, DEFAULT_EMBED_COLOR, EVENT_ID_PREFIX,
};
use super::event_store::EventStore;
use crate::core::filters::{contains_ci, eq_ci};
use crate::core::rewards::WarehouseStore;
use crate::core::storage::{StoreError, WriteGate};
use chrono::Utc;
use rand::distributions::Alphanumeric;
use rand::Rng;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum EventError {
    #[error("{0}")]
    Validation(String),
    #[error("No event matches `{0}`")]
    NotFound(String),
    #[error("An event with code `{0}` already exists")]
    DuplicateCode(String),
    #[error("Reward `{0}` does not exist")]
    UnknownReward(String),
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl From<String> for EventError {
    fn from(message: String) -> Self {
        EventError::Validation(message)
    }
}

pub struct EventService<W: WarehouseStore, E: EventStore> {
    rewards: Arc<W>,
    events: Arc<E>,
    gate: WriteGate,
}

impl<W: WarehouseStore, E: EventStore> EventService<W, E> {
    pub fn new(rewards: Arc<W>, events: Arc<E>, gate: WriteGate) -> Self {
        Self {
            rewards,
            events,
            gate,
        }
    }

    /// Look an event up by id, then by code (case-insensitive).
    pub async fn find_event(&self, key: &str) -> Result<Option<Event>, EventError> {
        let key = key.trim();
        if let Some(event) = self.events.get_event(key).await? {
            return Ok(Some(event));
        }
        Ok(self
            .events
            .list_events()
            .await?
            .into_iter()
            .find(|e| eq_ci(&e.code, key)))
    }

    pub async fn require_event(&self, key: &str) -> Result<Event, EventError> {
        self.find_event(key)
            .await?
            .ok_or_else(|| EventError::NotFound(key.trim().to_string()))
    }

    pub async fn list_events(&self, filter: &EventFilter) -> Result<Vec<Event>, EventError> {
        Ok(filter.apply(self.events.list_events().await?))
    }

    /// Autocomplete over codes and names. Hidden events are dropped before
    /// the limit unless `include_hidden` is set.
    pub async fn search_events(
        &self,
        partial: &str,
        include_hidden: bool,
        limit: usize,
    ) -> Result<Vec<Event>, EventError> {
        let mut events: Vec<Event> = self
            .list_events(&EventFilter::default())
            .await?
            .into_iter()
            .filter(|e| include_hidden || e.visible)
            .filter(|e| contains_ci(&e.code, partial) || contains_ci(&e.name, partial))
            .collect();
        events.truncate(limit);
        Ok(events)
    }

    pub async fn create_event(&self, draft: EventDraft, actor_id: u64) -> Result<Event, EventError> {
        let code = validate_code(&draft.code)?;
        let name = validate_name(&draft.name)?;
        let description = validate_description(&draft.description)?;
        let start_date = parse_date("Start date", &draft.start_date)?;
        let end_date = parse_date("End date", &draft.end_date)?;
        check_date_range(start_date, end_date)?;
        let embed_color = match draft.embed_color.as_deref() {
            Some(color) => parse_hex_color(color)?,
            None => DEFAULT_EMBED_COLOR,
        };
        let banner_url = parse_url_field("Banner URL", draft.banner_url.as_deref())?;
        let thumbnail_url = parse_url_field("Thumbnail URL", draft.thumbnail_url.as_deref())?;
        let info_url = parse_url_field("Info URL", draft.info_url.as_deref())?;

        let _guard = self.gate.enter().await;
        let existing = self.events.list_events().await?;
        if existing.iter().any(|e| eq_ci(&e.code, &code)) {
            return Err(EventError::DuplicateCode(code));
        }
        let event_id = loop {
            let candidate = generate_event_id();
            if !existing.iter().any(|e| e.event_id == candidate) {
                break candidate;
            }
        };

        let event = Event {
            event_id,
            code,
            name,
            description,
            start_date,
            end_date,
            coordinator_id: draft.coordinator_id,
            banner_url,
            thumbnail_url,
            info_url,
            priority: draft.priority.unwrap_or(0),
            embed_color,
            tags: draft.tags.as_deref().map(parse_tags).unwrap_or_default(),
            rewards: Vec::new(),
            active: draft.active.unwrap_or(true),
            visible: draft.visible.unwrap_or(true),
            created_by: actor_id,
            created_at: Utc::now(),
            updated_by: None,
            updated_at: None,
        };
        self.events.insert_event(event.clone()).await?;

        tracing::info!(event_id = %event.event_id, code = %event.code, actor = actor_id, "Event created");
        Ok(event)
    }

    pub async fn update_event(
        &self,
        key: &str,
        patch: EventPatch,
        actor_id: u64,
    ) -> Result<EventChange, EventError> {
        if patch.is_empty() {
            return Err(EventError::Validation(
                "Provide at least one field to change".to_string(),
            ));
        }

        let _guard = self.gate.enter().await;
        let before = self.require_event(key).await?;
        let mut after = before.clone();

        if let Some(code) = &patch.code {
            let code = validate_code(code)?;
            let taken = self
                .events
                .list_events()
                .await?
                .iter()
                .any(|e| e.event_id != before.event_id && eq_ci(&e.code, &code));
            if taken {
                return Err(EventError::DuplicateCode(code));
            }
            after.code = code;
        }
        if let Some(name) = &patch.name {
            after.name = validate_name(name)?;
        }
        if let Some(description) = &patch.description {
            after.description = validate_description(description)?;
        }
        if let Some(start) = &patch.start_date {
            after.start_date = parse_date("Start date", start)?;
        }
        if let Some(end) = &patch.end_date {
            after.end_date = parse_date("End date", end)?;
        }
        check_date_range(after.start_date, after.end_date)?;
        if let Some(coordinator) = patch.coordinator_id {
            after.coordinator_id = coordinator;
        }
        if let Some(url) = &patch.banner_url {
            after.banner_url = parse_optional_url("Banner URL", url)?;
        }
        if let Some(url) = &patch.thumbnail_url {
            after.thumbnail_url = parse_optional_url("Thumbnail URL", url)?;
        }
        if let Some(url) = &patch.info_url {
            after.info_url = parse_optional_url("Info URL", url)?;
        }
        if let Some(priority) = patch.priority {
            after.priority = priority;
        }
        if let Some(color) = &patch.embed_color {
            after.embed_color = parse_hex_color(color)?;
        }
        if let Some(tags) = &patch.tags {
            after.tags = parse_tags(tags);
        }

        if after == before {
            return Err(EventError::Validation(
                "Those values match the current event, nothing changed".to_string(),
            ));
        }
        let after = self.save_updated(after, actor_id).await?;

        tracing::info!(event_id = %after.event_id, actor = actor_id, "Event updated");
        Ok(EventChange { before, after })
    }

    pub async fn delete_event(&self, key: &str) -> Result<Event, EventError> {
        let _guard = self.gate.enter().await;
        let event = self.require_event(key).await?;
        let removed = self
            .events
            .remove_event(&event.event_id)
            .await?
            .ok_or_else(|| EventError::NotFound(key.trim().to_string()))?;
        tracing::info!(event_id = %removed.event_id, "Event deleted");
        Ok(removed)
    }

    /// Link rewards to an event. Every id must exist in the warehouse;
    /// ids that are already linked are reported as unchanged.
    pub async fn link_rewards(
        &self,
        key: &str,
        reward_ids: &[String],
        actor_id: u64,
    ) -> Result<LinkOutcome, EventError> {
        let _guard = self.gate.enter().await;
        let mut event = self.require_event(key).await?;

        for id in reward_ids {
            if self.rewards.get_reward(id).await?.is_none() {
                return Err(EventError::UnknownReward(id.clone()));
            }
        }

        let mut changed = Vec::new();
        let mut unchanged = Vec::new();
        for id in reward_ids {
            if event.links(id) || changed.contains(id) {
                unchanged.push(id.clone());
            } else {
                event.rewards.push(id.clone());
                changed.push(id.clone());
            }
        }

        if !changed.is_empty() {
            event = self.save_updated(event, actor_id).await?;
        }
        Ok(LinkOutcome {
            event,
            changed,
            unchanged,
        })
    }

    pub async fn unlink_rewards(
        &self,
        key: &str,
        reward_ids: &[String],
        actor_id: u64,
    ) -> Result<LinkOutcome, EventError> {
        let _guard = self.gate.enter().await;
        let mut event = self.require_event(key).await?;

        let (changed, unchanged): (Vec<String>, Vec<String>) =
            reward_ids.iter().cloned().partition(|id| event.links(id));
        event.rewards.retain(|r| !changed.contains(r));

        if !changed.is_empty() {
            event = self.save_updated(event, actor_id).await?;
        }
        Ok(LinkOutcome {
            event,
            changed,
            unchanged,
        })
    }

    /// Flip the active and/or visible flags.
    pub async fn set_flags(
        &self,
        key: &str,
        active: Option<bool>,
        visible: Option<bool>,
        actor_id: u64,
    ) -> Result<EventChange, EventError> {
        if active.is_none() && visible.is_none() {
            return Err(EventError::Validation(
                "Choose `active`, `visible` or both".to_string(),
            ));
        }
        let _guard = self.gate.enter().await;
        let before = self.require_event(key).await?;
        let mut after = before.clone();
        if let Some(active) = active {
            after.active = active;
        }
        if let Some(visible) = visible {
            after.visible = visible;
        }
        if after == before {
            return Err(EventError::Validation(
                "The event already has those flags".to_string(),
            ));
        }
        let after = self.save_updated(after, actor_id).await?;
        Ok(EventChange { before, after })
    }

    async fn save_updated(&self, mut event: Event, actor_id: u64) -> Result<Event, EventError> {
        event.updated_by = Some(actor_id);
        event.updated_at = Some(Utc::now());
        self.events.save_event(event.clone()).await?;
        Ok(event)
    }
}

fn parse_url_field(label: &str, value: Option<&str>) -> Result<Option<String>, EventError> {
    match value {
        Some(url) => Ok(parse_optional_url(label, url)?),
        None => Ok(None),
    }
}

/// `evt_` followed by 8 random lowercase alphanumerics.
fn generate_event_id() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect();
    format!("{}{}", EVENT_ID_PREFIX, suffix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rewards::{Reward, RewardKind};
    use crate::infra::memory::{InMemoryEventStore, InMemoryWarehouseStore};

    type Service = EventService<InMemoryWarehouseStore, InMemoryEventStore>;

    async fn service() -> Service {
        let rewards = Arc::new(InMemoryWarehouseStore::new());
        for id in ["badge_sun", "item_shell"] {
            rewards
                .insert_reward(Reward {
                    id: id.to_string(),
                    kind: RewardKind::from_id(id).unwrap(),
                    name: id.to_string(),
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
                })
                .await
                .unwrap();
        }
        EventService::new(rewards, Arc::new(InMemoryEventStore::new()), WriteGate::new())
    }

    fn draft(code: &str) -> EventDraft {
        EventDraft {
            code: code.to_string(),
            name: "Summer Festival".to_string(),
            description: "Sun and sand".to_string(),
            start_date: "2024-07-01".to_string(),
            end_date: "2024-07-31".to_string(),
            embed_color: Some("#FFAA00".to_string()),
            tags: Some("Summer, PvP".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn create_validates_and_defaults() {
        let service = service().await;
        let event = service.create_event(draft("SUM24"), 9).await.unwrap();
        assert!(event.event_id.starts_with("evt_"));
        assert_eq!(event.event_id.len(), 12);
        assert_eq!(event.embed_color, 0xFFAA00);
        assert!(event.active && event.visible);
        assert!(event.has_tag("pvp"));

        let duplicate = service.create_event(draft("sum24"), 9).await;
        assert!(matches!(duplicate, Err(EventError::DuplicateCode(_))));

        let mut backwards = draft("BACK");
        backwards.end_date = "2024-06-01".to_string();
        assert!(matches!(
            service.create_event(backwards, 9).await,
            Err(EventError::Validation(_))
        ));

        let mut bad_color = draft("COLOR");
        bad_color.embed_color = Some("orange".to_string());
        assert!(matches!(
            service.create_event(bad_color, 9).await,
            Err(EventError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn find_accepts_id_or_code() {
        let service = service().await;
        let event = service.create_event(draft("SUM24"), 9).await.unwrap();
        let by_id = service.find_event(&event.event_id).await.unwrap();
        let by_code = service.find_event("sum24").await.unwrap();
        assert_eq!(by_id, by_code);
        assert!(service.find_event("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_checks_date_range_and_code() {
        let service = service().await;
        service.create_event(draft("SUM24"), 9).await.unwrap();
        service.create_event(draft("WIN24"), 9).await.unwrap();

        let backwards = EventPatch {
            end_date: Some("2024-06-30".to_string()),
            ..Default::default()
        };
        assert!(service.update_event("SUM24", backwards, 9).await.is_err());

        let clash = EventPatch {
            code: Some("win24".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            service.update_event("SUM24", clash, 9).await,
            Err(EventError::DuplicateCode(_))
        ));

        let change = service
            .update_event(
                "SUM24",
                EventPatch {
                    priority: Some(3),
                    banner_url: Some("https://example.com/b.png".to_string()),
                    ..Default::default()
                },
                7,
            )
            .await
            .unwrap();
        assert_eq!(change.before.priority, 0);
        assert_eq!(change.after.priority, 3);
        assert_eq!(change.after.updated_by, Some(7));
        assert!(change.after.updated_at.is_some());
        assert_eq!(Some(change.after), service.find_event("SUM24").await.unwrap());
    }

    #[tokio::test]
    async fn codes_cannot_shadow_event_ids() {
        let service = service().await;
        let first = service.create_event(draft("SUM24"), 9).await.unwrap();

        let shadow = service.create_event(draft(&first.event_id), 9).await;
        assert!(matches!(shadow, Err(EventError::Validation(_))));

        service.create_event(draft("WIN24"), 9).await.unwrap();
        let rename = EventPatch {
            code: Some(first.event_id.to_uppercase()),
            ..Default::default()
        };
        assert!(matches!(
            service.update_event("WIN24", rename, 9).await,
            Err(EventError::Validation(_))
        ));
        assert_eq!(
            service.find_event("WIN24").await.unwrap().map(|e| e.code),
            Some("WIN24".to_string())
        );
    }

    #[tokio::test]
    async fn search_hides_hidden_events_before_limiting() {
        let service = service().await;
        service
            .create_event(
                EventDraft {
                    priority: Some(5),
                    visible: Some(false),
                    ..draft("SUMSECRET")
                },
                9,
            )
            .await
            .unwrap();
        service.create_event(draft("SUM24"), 9).await.unwrap();

        let public = service.search_events("sum", false, 1).await.unwrap();
        assert_eq!(public.len(), 1);
        assert_eq!(public[0].code, "SUM24");

        let all = service.search_events("sum", true, 1).await.unwrap();
        assert_eq!(all[0].code, "SUMSECRET");
    }

    #[tokio::test]
    async fn coordinator_can_be_cleared() {
        let service = service().await;
        service
            .create_event(
                EventDraft {
                    coordinator_id: Some(42),
                    ..draft("SUM24")
                },
                9,
            )
            .await
            .unwrap();

        let change = service
            .update_event(
                "SUM24",
                EventPatch {
                    coordinator_id: Some(None),
                    ..Default::default()
                },
                9,
            )
            .await
            .unwrap();
        assert_eq!(change.before.coordinator_id, Some(42));
        assert_eq!(change.after.coordinator_id, None);
    }

    #[tokio::test]
    async fn link_requires_existing_rewards() {
        let service = service().await;
        service.create_event(draft("SUM24"), 9).await.unwrap();

        let unknown = service
            .link_rewards("SUM24", &["badge_moon".to_string()], 9)
            .await;
        assert!(matches!(unknown, Err(EventError::UnknownReward(_))));

        let ids = vec!["badge_sun".to_string(), "item_shell".to_string()];
        let outcome = service.link_rewards("SUM24", &ids, 9).await.unwrap();
        assert_eq!(outcome.changed, ids);

        let again = service.link_rewards("SUM24", &ids[..1], 9).await.unwrap();
        assert!(again.changed.is_empty());
        assert_eq!(again.unchanged, vec!["badge_sun".to_string()]);
        assert_eq!(again.event.rewards.len(), 2);

        let unlinked = service
            .unlink_rewards("SUM24", &["badge_sun".to_string(), "badge_moon".to_string()], 9)
            .await
            .unwrap();
        assert_eq!(unlinked.changed, vec!["badge_sun".to_string()]);
        assert_eq!(unlinked.unchanged, vec!["badge_moon".to_string()]);
        assert_eq!(unlinked.event.rewards, vec!["item_shell".to_string()]);
    }

    #[tokio::test]
    async fn flags_and_delete() {
        let service = service().await;
        service.create_event(draft("SUM24"), 9).await.unwrap();

        let change = service
            .set_flags("SUM24", Some(false), None, 9)
            .await
            .unwrap();
        assert!(change.before.active);
        assert!(!change.after.active);
        assert!(service.set_flags("SUM24", Some(false), None, 9).await.is_err());

        let hidden = service
            .list_events(&EventFilter {
                active: Some(false),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(hidden.len(), 1);

        service.delete_event("sum24").await.unwrap();
        assert!(matches!(
            service.delete_event("SUM24").await,
            Err(EventError::NotFound(_))
        ));
    }
}
