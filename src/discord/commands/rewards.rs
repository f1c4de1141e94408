// Discord commands for the reward warehouse.
//
// Same pattern as every other command file:
// 1. Extract primitive data from Discord types
// 2. Call core service
// 3. Record the audit entry and format the response

use super::autocomplete::autocomplete_reward;
use crate::core::audit::{
    field_diff, DeletedKind, DeletionLogEntry, RewardAction, RewardLogEntry,
};
use crate::core::rewards::{RewardDraft, RewardFilter, RewardKind, RewardPatch};
use crate::discord::render::{reward_embed, reward_list_pages, COLOR_SUCCESS};
use crate::discord::views::{confirm, paginate};
use crate::discord::{
    audit_warning, economy_admin, reply_private, respond, settle, Context, Error,
};

#[derive(Debug, Clone, Copy, poise::ChoiceParameter)]
pub enum RewardKindChoice {
    #[name = "Badge"]
    Badge,
    #[name = "Title"]
    Title,
    #[name = "Item"]
    Item,
}

impl From<RewardKindChoice> for RewardKind {
    fn from(choice: RewardKindChoice) -> Self {
        match choice {
            RewardKindChoice::Badge => RewardKind::Badge,
            RewardKindChoice::Title => RewardKind::Title,
            RewardKindChoice::Item => RewardKind::Item,
        }
    }
}

/// Manage the reward warehouse
#[poise::command(
    slash_command,
    guild_only,
    subcommands("create", "edit", "delete", "info", "list")
)]
pub async fn reward(_ctx: Context<'_>) -> Result<(), Error> {
    Ok(())
}

/// Create a new badge, title or item
#[poise::command(slash_command, guild_only, check = "economy_admin")]
pub async fn create(
    ctx: Context<'_>,
    #[description = "Reward type"] kind: RewardKindChoice,
    #[description = "Display name"]
    #[max_length = 64]
    name: String,
    #[description = "What the reward is for"]
    #[max_length = 1024]
    description: Option<String>,
    #[description = "Price in points (0 or empty = not for sale)"] price: Option<u64>,
    #[description = "Items only: can a user hold several copies?"] stackable: Option<bool>,
    #[description = "Badges only: emoji shown next to the name"] emoji: Option<String>,
    #[description = "Items only: image URL"] media_url: Option<String>,
) -> Result<(), Error> {
    let data = ctx.data();
    let actor = ctx.author().id.get();
    let draft = RewardDraft {
        kind: kind.into(),
        name,
        description: description.unwrap_or_default(),
        price: price.unwrap_or(0),
        stackable,
        emoji,
        media_url,
    };

    let Some(reward) = settle(ctx, data.warehouse.create_reward(draft, actor).await).await? else {
        return Ok(());
    };

    let warning = audit_warning(
        data.audit
            .record_reward(
                RewardLogEntry::new(RewardAction::Created, actor)
                    .reward(&reward.id)
                    .details(serde_json::to_value(&reward).ok()),
            )
            .await,
    );

    let embed = reward_embed(&reward)
        .title(format!("✅ Created {}", reward.display_name()))
        .color(COLOR_SUCCESS);
    respond(ctx, embed, warning).await
}

/// Edit an existing reward. Empty options are left unchanged.
#[poise::command(slash_command, guild_only, check = "economy_admin")]
pub async fn edit(
    ctx: Context<'_>,
    #[description = "Reward to edit"]
    #[autocomplete = "autocomplete_reward"]
    id: String,
    #[description = "New name"]
    #[max_length = 64]
    name: Option<String>,
    #[description = "New description"]
    #[max_length = 1024]
    description: Option<String>,
    #[description = "New price (0 = not for sale)"] price: Option<u64>,
    #[description = "Items only"] stackable: Option<bool>,
    #[description = "Badges only, `none` clears it"] emoji: Option<String>,
    #[description = "Items only, `none` clears it"] media_url: Option<String>,
    #[description = "Why the change was made"] reason: Option<String>,
) -> Result<(), Error> {
    let data = ctx.data();
    let actor = ctx.author().id.get();
    let patch = RewardPatch {
        name,
        description,
        price,
        stackable,
        emoji,
        media_url,
    };

    let Some(change) = settle(ctx, data.warehouse.update_reward(&id, patch, actor).await).await?
    else {
        return Ok(());
    };

    let warning = audit_warning(
        data.audit
            .record_reward(
                RewardLogEntry::new(RewardAction::Updated, actor)
                    .reward(&change.after.id)
                    .reason(reason.as_deref())
                    .details(field_diff(&change.before, &change.after)),
            )
            .await,
    );

    let embed = reward_embed(&change.after)
        .title(format!("✏️ Updated {}", change.after.display_name()))
        .color(COLOR_SUCCESS);
    respond(ctx, embed, warning).await
}

/// Delete a reward and remove it from every inventory and event
#[poise::command(slash_command, guild_only, check = "economy_admin")]
pub async fn delete(
    ctx: Context<'_>,
    #[description = "Reward to delete"]
    #[autocomplete = "autocomplete_reward"]
    id: String,
    #[description = "Why it is being deleted"] reason: Option<String>,
) -> Result<(), Error> {
    let data = ctx.data();
    let actor = ctx.author().id.get();

    let Some(reward) = settle(ctx, data.warehouse.require_reward(&id).await).await? else {
        return Ok(());
    };
    let prompt = format!(
        "Delete **{}** (`{}`)? It will be removed from every inventory and event.",
        reward.display_name(),
        reward.id
    );
    if !confirm(ctx, prompt).await? {
        return Ok(());
    }

    let Some(deletion) = settle(ctx, data.warehouse.delete_reward(&reward.id).await).await? else {
        return Ok(());
    };

    let warning = audit_warning(
        data.audit
            .record_deletion(DeletionLogEntry {
                kind: DeletedKind::Reward,
                object_id: deletion.reward.id.clone(),
                name: deletion.reward.name.clone(),
                actor_id: actor,
                timestamp: chrono::Utc::now(),
                reason: reason.unwrap_or_default().trim().to_string(),
                snapshot: serde_json::to_value(&deletion.reward)?,
                unlinked_users: deletion.unlinked_users,
                unlinked_events: deletion.unlinked_events,
            })
            .await,
    );

    let embed = poise::serenity_prelude::CreateEmbed::new()
        .title(format!("🗑️ Deleted {}", deletion.reward.display_name()))
        .description(format!(
            "Removed from **{}** inventories and **{}** events.",
            deletion.unlinked_users, deletion.unlinked_events
        ))
        .color(COLOR_SUCCESS);
    respond(ctx, embed, warning).await
}

/// Show one reward
#[poise::command(slash_command, guild_only)]
pub async fn info(
    ctx: Context<'_>,
    #[description = "Reward to show"]
    #[autocomplete = "autocomplete_reward"]
    id: String,
) -> Result<(), Error> {
    let Some(reward) = settle(ctx, ctx.data().warehouse.require_reward(&id).await).await? else {
        return Ok(());
    };
    respond(ctx, reward_embed(&reward), None).await
}

/// Browse the warehouse
#[poise::command(slash_command, guild_only)]
pub async fn list(
    ctx: Context<'_>,
    #[description = "Only this type"] kind: Option<RewardKindChoice>,
    #[description = "Name contains"] name: Option<String>,
    #[description = "Only stackable (or non-stackable) items"] stackable: Option<bool>,
    #[description = "Only rewards that are (or are not) for sale"] for_sale: Option<bool>,
) -> Result<(), Error> {
    let data = ctx.data();
    let filter = RewardFilter {
        kind: kind.map(RewardKind::from),
        name,
        stackable,
        for_sale,
    };
    let Some(rewards) = settle(ctx, data.warehouse.list_rewards(&filter).await).await? else {
        return Ok(());
    };
    if rewards.is_empty() {
        return reply_private(ctx, "No rewards match those filters.").await;
    }
    let pages = reward_list_pages("🏪 Warehouse", &rewards, data.views.page_size);
    paginate(ctx, pages, false).await
}
