// Discord commands for events: CRUD, reward links, flags and bundle awards.

use super::autocomplete::autocomplete_event;
use crate::core::audit::{
    field_diff, DeletedKind, DeletionLogEntry, EventAction, EventLogEntry, RewardAction,
    RewardLogEntry,
};
use crate::core::events::{Event, EventDraft, EventFilter, EventPatch, LinkOutcome};
use crate::core::filters::YearMonth;
use crate::core::inventory::BundleLine;
use crate::core::rewards::{Reward, RewardFilter};
use crate::discord::render::{event_embed, event_list_pages, COLOR_SUCCESS, COLOR_WARNING};
use crate::discord::views::{confirm, paginate, select_many, SelectOption, MAX_OPTIONS};
use crate::discord::{
    audit_warning, economy_admin, is_admin, reply_private, respond, settle, Context, Error,
};
use poise::serenity_prelude as serenity;
use serde_json::json;
use std::collections::HashMap;

/// Manage events
#[poise::command(
    slash_command,
    guild_only,
    subcommands(
        "create", "edit", "delete", "info", "list", "link", "unlink", "toggle", "award"
    )
)]
pub async fn event(_ctx: Context<'_>) -> Result<(), Error> {
    Ok(())
}

/// Load an event the caller is allowed to see. Hidden events look missing
/// to non-admins.
async fn visible_event(ctx: Context<'_>, key: &str) -> Result<Option<Event>, Error> {
    let Some(found) = settle(ctx, ctx.data().events.find_event(key).await).await? else {
        return Ok(None);
    };
    match found {
        Some(event) if event.visible || is_admin(ctx).await => Ok(Some(event)),
        _ => {
            reply_private(ctx, format!("❌ Event not found: {}", key.trim())).await?;
            Ok(None)
        }
    }
}

async fn warehouse_index(ctx: Context<'_>) -> Result<Option<HashMap<String, Reward>>, Error> {
    let rewards = settle(
        ctx,
        ctx.data()
            .warehouse
            .list_rewards(&RewardFilter::default())
            .await,
    )
    .await?;
    Ok(rewards.map(|rewards| rewards.into_iter().map(|r| (r.id.clone(), r)).collect()))
}

/// Create an event
#[poise::command(slash_command, guild_only, check = "economy_admin")]
pub async fn create(
    ctx: Context<'_>,
    #[description = "Short unique code, e.g. SUMMER24"]
    #[max_length = 20]
    code: String,
    #[description = "Event name"]
    #[max_length = 100]
    name: String,
    #[description = "Start date (YYYY-MM-DD)"] start_date: String,
    #[description = "End date (YYYY-MM-DD)"] end_date: String,
    #[description = "What the event is about"]
    #[max_length = 2000]
    description: Option<String>,
    #[description = "Who runs the event"] coordinator: Option<serenity::User>,
    #[description = "Banner image URL"] banner_url: Option<String>,
    #[description = "Thumbnail image URL"] thumbnail_url: Option<String>,
    #[description = "Link with more information"] info_url: Option<String>,
    #[description = "Higher is listed first (default 0)"] priority: Option<i64>,
    #[description = "Embed color, e.g. #FF8800"] color: Option<String>,
    #[description = "Comma-separated tags"] tags: Option<String>,
    #[description = "Active right away (default true)"] active: Option<bool>,
    #[description = "Visible to members (default true)"] visible: Option<bool>,
) -> Result<(), Error> {
    let data = ctx.data();
    let actor = ctx.author().id.get();
    let draft = EventDraft {
        code,
        name,
        description: description.unwrap_or_default(),
        start_date,
        end_date,
        coordinator_id: coordinator.map(|u| u.id.get()),
        banner_url,
        thumbnail_url,
        info_url,
        priority,
        embed_color: color,
        tags,
        active,
        visible,
    };

    let Some(event) = settle(ctx, data.events.create_event(draft, actor).await).await? else {
        return Ok(());
    };

    let warning = audit_warning(
        data.audit
            .record_event(
                EventLogEntry::new(EventAction::Created, actor, &event.event_id)
                    .details(serde_json::to_value(&event).ok()),
            )
            .await,
    );
    let embed = event_embed(&event, data.today(), &HashMap::new())
        .title(format!("✅ Created event {} ({})", event.name, event.code));
    respond(ctx, embed, warning).await
}

/// Edit an event. Empty options are left unchanged.
#[poise::command(slash_command, guild_only, check = "economy_admin")]
pub async fn edit(
    ctx: Context<'_>,
    #[description = "Event code or id"]
    #[autocomplete = "autocomplete_event"]
    event: String,
    #[description = "New code"]
    #[max_length = 20]
    code: Option<String>,
    #[description = "New name"]
    #[max_length = 100]
    name: Option<String>,
    #[description = "New description"]
    #[max_length = 2000]
    description: Option<String>,
    #[description = "New start date (YYYY-MM-DD)"] start_date: Option<String>,
    #[description = "New end date (YYYY-MM-DD)"] end_date: Option<String>,
    #[description = "New coordinator"] coordinator: Option<serenity::User>,
    #[description = "Remove the coordinator"] clear_coordinator: Option<bool>,
    #[description = "Banner URL, `none` clears it"] banner_url: Option<String>,
    #[description = "Thumbnail URL, `none` clears it"] thumbnail_url: Option<String>,
    #[description = "Info URL, `none` clears it"] info_url: Option<String>,
    #[description = "New priority"] priority: Option<i64>,
    #[description = "New embed color"] color: Option<String>,
    #[description = "Replace the tags (comma-separated)"] tags: Option<String>,
    #[description = "Why the change was made"] reason: Option<String>,
) -> Result<(), Error> {
    let data = ctx.data();
    let actor = ctx.author().id.get();
    let patch = EventPatch {
        code,
        name,
        description,
        start_date,
        end_date,
        coordinator_id: match (coordinator, clear_coordinator) {
            (Some(user), _) => Some(Some(user.id.get())),
            (None, Some(true)) => Some(None),
            (None, _) => None,
        },
        banner_url,
        thumbnail_url,
        info_url,
        priority,
        embed_color: color,
        tags,
    };

    let Some(change) = settle(ctx, data.events.update_event(&event, patch, actor).await).await?
    else {
        return Ok(());
    };

    let warning = audit_warning(
        data.audit
            .record_event(
                EventLogEntry::new(EventAction::Updated, actor, &change.after.event_id)
                    .reason(reason.as_deref())
                    .details(field_diff(&change.before, &change.after)),
            )
            .await,
    );
    let Some(index) = warehouse_index(ctx).await? else {
        return Ok(());
    };
    let embed = event_embed(&change.after, data.today(), &index)
        .title(format!("✏️ Updated {} ({})", change.after.name, change.after.code));
    respond(ctx, embed, warning).await
}

/// Delete an event
#[poise::command(slash_command, guild_only, check = "economy_admin")]
pub async fn delete(
    ctx: Context<'_>,
    #[description = "Event code or id"]
    #[autocomplete = "autocomplete_event"]
    event: String,
    #[description = "Why it is being deleted"] reason: Option<String>,
) -> Result<(), Error> {
    let data = ctx.data();
    let actor = ctx.author().id.get();

    let Some(found) = settle(ctx, data.events.require_event(&event).await).await? else {
        return Ok(());
    };
    let prompt = format!(
        "Delete event **{}** (`{}`)? Rewards already granted stay with their owners.",
        found.name, found.code
    );
    if !confirm(ctx, prompt).await? {
        return Ok(());
    }

    let Some(removed) = settle(ctx, data.events.delete_event(&found.event_id).await).await? else {
        return Ok(());
    };

    let warning = audit_warning(
        data.audit
            .record_deletion(DeletionLogEntry {
                kind: DeletedKind::Event,
                object_id: removed.event_id.clone(),
                name: removed.name.clone(),
                actor_id: actor,
                timestamp: chrono::Utc::now(),
                reason: reason.unwrap_or_default().trim().to_string(),
                snapshot: serde_json::to_value(&removed)?,
                unlinked_users: 0,
                unlinked_events: 0,
            })
            .await,
    );
    let embed = serenity::CreateEmbed::new()
        .title(format!("🗑️ Deleted event {}", removed.name))
        .description(format!("`{}` ({}) is gone.", removed.code, removed.event_id))
        .color(COLOR_SUCCESS);
    respond(ctx, embed, warning).await
}

/// Show one event
#[poise::command(slash_command, guild_only)]
pub async fn info(
    ctx: Context<'_>,
    #[description = "Event code or id"]
    #[autocomplete = "autocomplete_event"]
    event: String,
) -> Result<(), Error> {
    let Some(event) = visible_event(ctx, &event).await? else {
        return Ok(());
    };
    let Some(index) = warehouse_index(ctx).await? else {
        return Ok(());
    };
    respond(ctx, event_embed(&event, ctx.data().today(), &index), None).await
}

/// Browse events
#[poise::command(slash_command, guild_only)]
pub async fn list(
    ctx: Context<'_>,
    #[description = "Name contains"] name: Option<String>,
    #[description = "Exact code"] code: Option<String>,
    #[description = "Starting in month (YYYY-MM)"] month: Option<String>,
    #[description = "Has tag"] tag: Option<String>,
    #[description = "Created by"] creator: Option<serenity::User>,
    #[description = "Coordinated by"] coordinator: Option<serenity::User>,
    #[description = "Only active (or inactive) events"] active: Option<bool>,
    #[description = "Admins only: visible (or hidden) events"] visible: Option<bool>,
    #[description = "Links this reward id"] reward: Option<String>,
) -> Result<(), Error> {
    let data = ctx.data();
    let month = match month.as_deref().map(str::parse::<YearMonth>).transpose() {
        Ok(month) => month,
        Err(message) => return reply_private(ctx, format!("❌ {}", message)).await,
    };
    let visible = if is_admin(ctx).await { visible } else { Some(true) };

    let filter = EventFilter {
        name,
        code,
        month,
        tag,
        creator_id: creator.map(|u| u.id.get()),
        coordinator_id: coordinator.map(|u| u.id.get()),
        active,
        visible,
        reward_id: reward,
    };
    let Some(events) = settle(ctx, data.events.list_events(&filter).await).await? else {
        return Ok(());
    };
    if events.is_empty() {
        return reply_private(ctx, "No events match those filters.").await;
    }
    let pages = event_list_pages(&events, data.today(), data.views.page_size);
    paginate(ctx, pages, false).await
}

fn link_summary(verb: &str, outcome: &LinkOutcome) -> String {
    let mut lines = Vec::new();
    if !outcome.changed.is_empty() {
        lines.push(format!(
            "{}: {}",
            verb,
            outcome
                .changed
                .iter()
                .map(|id| format!("`{}`", id))
                .collect::<Vec<_>>()
                .join(", ")
        ));
    }
    if !outcome.unchanged.is_empty() {
        lines.push(format!(
            "Unchanged: {}",
            outcome
                .unchanged
                .iter()
                .map(|id| format!("`{}`", id))
                .collect::<Vec<_>>()
                .join(", ")
        ));
    }
    lines.join("\n")
}

fn reward_options<'a>(rewards: impl Iterator<Item = &'a Reward>) -> Vec<SelectOption> {
    rewards
        .map(|r| SelectOption {
            label: r.display_name(),
            value: r.id.clone(),
            description: Some(format!("{} · {}", r.kind.label(), r.id)),
        })
        .collect()
}

/// Attach rewards to an event
#[poise::command(slash_command, guild_only, check = "economy_admin")]
pub async fn link(
    ctx: Context<'_>,
    #[description = "Event code or id"]
    #[autocomplete = "autocomplete_event"]
    event: String,
    #[description = "Only offer rewards whose name contains this"] search: Option<String>,
) -> Result<(), Error> {
    let data = ctx.data();
    let actor = ctx.author().id.get();

    let Some(found) = settle(ctx, data.events.require_event(&event).await).await? else {
        return Ok(());
    };
    let filter = RewardFilter {
        name: search,
        ..Default::default()
    };
    let Some(rewards) = settle(ctx, data.warehouse.list_rewards(&filter).await).await? else {
        return Ok(());
    };
    let options = reward_options(rewards.iter().filter(|r| !found.links(&r.id)));
    if options.is_empty() {
        return reply_private(ctx, "There are no unlinked rewards to offer.").await;
    }

    let mut prompt = format!("Pick the rewards to link to **{}**.", found.name);
    if options.len() > MAX_OPTIONS {
        prompt.push_str(&format!(
            "\nOnly the first {} are shown; narrow it down with `search`.",
            MAX_OPTIONS
        ));
    }
    let Some(picked) = select_many(ctx, &prompt, options).await? else {
        return Ok(());
    };

    let Some(outcome) = settle(
        ctx,
        data.events
            .link_rewards(&found.event_id, &picked, actor)
            .await,
    )
    .await?
    else {
        return Ok(());
    };

    let warning = if outcome.changed.is_empty() {
        None
    } else {
        audit_warning(
            data.audit
                .record_event(
                    EventLogEntry::new(EventAction::RewardsLinked, actor, &outcome.event.event_id)
                        .details(Some(json!({ "rewards": outcome.changed }))),
                )
                .await,
        )
    };
    let embed = serenity::CreateEmbed::new()
        .title(format!("🔗 {}", outcome.event.name))
        .description(link_summary("Linked", &outcome))
        .color(COLOR_SUCCESS);
    respond(ctx, embed, warning).await
}

/// Detach rewards from an event
#[poise::command(slash_command, guild_only, check = "economy_admin")]
pub async fn unlink(
    ctx: Context<'_>,
    #[description = "Event code or id"]
    #[autocomplete = "autocomplete_event"]
    event: String,
) -> Result<(), Error> {
    let data = ctx.data();
    let actor = ctx.author().id.get();

    let Some(found) = settle(ctx, data.events.require_event(&event).await).await? else {
        return Ok(());
    };
    if found.rewards.is_empty() {
        return reply_private(ctx, format!("**{}** has no linked rewards.", found.name)).await;
    }
    let Some(index) = warehouse_index(ctx).await? else {
        return Ok(());
    };
    let options: Vec<SelectOption> = found
        .rewards
        .iter()
        .map(|id| match index.get(id) {
            Some(reward) => reward_options(std::iter::once(reward)).remove(0),
            None => SelectOption {
                label: id.clone(),
                value: id.clone(),
                description: Some("Missing from the warehouse".to_string()),
            },
        })
        .collect();

    let prompt = format!("Pick the rewards to unlink from **{}**.", found.name);
    let Some(picked) = select_many(ctx, &prompt, options).await? else {
        return Ok(());
    };

    let Some(outcome) = settle(
        ctx,
        data.events
            .unlink_rewards(&found.event_id, &picked, actor)
            .await,
    )
    .await?
    else {
        return Ok(());
    };

    let warning = if outcome.changed.is_empty() {
        None
    } else {
        audit_warning(
            data.audit
                .record_event(
                    EventLogEntry::new(
                        EventAction::RewardsUnlinked,
                        actor,
                        &outcome.event.event_id,
                    )
                    .details(Some(json!({ "rewards": outcome.changed }))),
                )
                .await,
        )
    };
    let embed = serenity::CreateEmbed::new()
        .title(format!("✂️ {}", outcome.event.name))
        .description(link_summary("Unlinked", &outcome))
        .color(COLOR_WARNING);
    respond(ctx, embed, warning).await
}

/// Turn an event on or off, or hide it from members
#[poise::command(slash_command, guild_only, check = "economy_admin")]
pub async fn toggle(
    ctx: Context<'_>,
    #[description = "Event code or id"]
    #[autocomplete = "autocomplete_event"]
    event: String,
    #[description = "Is the event running?"] active: Option<bool>,
    #[description = "Can members see it?"] visible: Option<bool>,
) -> Result<(), Error> {
    let data = ctx.data();
    let actor = ctx.author().id.get();

    let Some(change) = settle(
        ctx,
        data.events.set_flags(&event, active, visible, actor).await,
    )
    .await?
    else {
        return Ok(());
    };

    let warning = audit_warning(
        data.audit
            .record_event(
                EventLogEntry::new(EventAction::FlagsChanged, actor, &change.after.event_id)
                    .details(field_diff(&change.before, &change.after)),
            )
            .await,
    );
    let flag = |on: bool, yes: &str, no: &str| if on { yes.to_string() } else { no.to_string() };
    let embed = serenity::CreateEmbed::new()
        .title(format!("⚙️ {}", change.after.name))
        .field("Active", flag(change.after.active, "✅ Yes", "❌ No"), true)
        .field("Visible", flag(change.after.visible, "👁️ Yes", "🙈 No"), true)
        .color(COLOR_SUCCESS);
    respond(ctx, embed, warning).await
}

/// Give a member every reward linked to an event
#[poise::command(slash_command, guild_only, check = "economy_admin")]
pub async fn award(
    ctx: Context<'_>,
    #[description = "Event code or id"]
    #[autocomplete = "autocomplete_event"]
    event: String,
    #[description = "Who receives the bundle"] user: serenity::User,
    #[description = "Why it is being awarded"] reason: Option<String>,
) -> Result<(), Error> {
    if user.bot {
        return reply_private(ctx, "Bots can't hold rewards! 🤖").await;
    }
    let data = ctx.data();
    let actor = ctx.author().id.get();
    let target = user.id.get();

    let Some(found) = settle(ctx, data.events.require_event(&event).await).await? else {
        return Ok(());
    };
    if found.rewards.is_empty() {
        return reply_private(ctx, format!("**{}** has no linked rewards.", found.name)).await;
    }

    let Some(lines) = settle(ctx, data.inventory.grant_bundle(target, &found.rewards).await).await?
    else {
        return Ok(());
    };

    let mut granted = Vec::new();
    let mut skipped = Vec::new();
    let mut missing = Vec::new();
    for line in &lines {
        match line {
            BundleLine::Granted(id) => granted.push(id.clone()),
            BundleLine::AlreadyOwned(id) => skipped.push(id.clone()),
            BundleLine::Missing(id) => missing.push(id.clone()),
        }
    }

    let mut results = vec![
        data.audit
            .record_event(
                EventLogEntry::new(EventAction::Awarded, actor, &found.event_id)
                    .target(target)
                    .reason(reason.as_deref())
                    .details(Some(json!({
                        "granted": granted,
                        "already_owned": skipped,
                        "missing": missing
                    }))),
            )
            .await,
    ];
    for id in &granted {
        results.push(
            data.audit
                .record_reward(
                    RewardLogEntry::new(RewardAction::Granted, actor)
                        .target(target)
                        .reward(id)
                        .reason(reason.as_deref())
                        .details(Some(json!({ "copies": 1, "event": found.code }))),
                )
                .await,
        );
    }
    let warning = results.into_iter().filter_map(audit_warning).next();

    let mut description = format!("<@{}> received the **{}** bundle.", user.id, found.name);
    if !granted.is_empty() {
        description.push_str(&format!("\n🎁 Granted: {}", granted.join(", ")));
    }
    if !skipped.is_empty() {
        description.push_str(&format!("\n⏭️ Already owned: {}", skipped.join(", ")));
    }
    if !missing.is_empty() {
        description.push_str(&format!("\n⚠️ No longer in the warehouse: {}", missing.join(", ")));
    }
    let embed = serenity::CreateEmbed::new()
        .title(format!("🏆 {} awarded", found.code))
        .description(description)
        .color(if granted.is_empty() { COLOR_WARNING } else { COLOR_SUCCESS });
    respond(ctx, embed, warning).await
}
