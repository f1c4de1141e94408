// Admin commands that hand out or take back rewards and points.

use super::autocomplete::autocomplete_reward;
use crate::core::audit::{RewardAction, RewardLogEntry};
use crate::core::inventory::GrantOutcome;
use crate::discord::render::{format_points, COLOR_SUCCESS, COLOR_WARNING};
use crate::discord::views::confirm;
use crate::discord::{
    audit_warning, economy_admin, reply_private, respond, settle, Context, Error,
};
use poise::serenity_prelude as serenity;
use serde_json::json;

/// Give a reward to a member
#[poise::command(slash_command, guild_only, check = "economy_admin")]
pub async fn grant(
    ctx: Context<'_>,
    #[description = "Who receives the reward"] user: serenity::User,
    #[description = "Reward to grant"]
    #[autocomplete = "autocomplete_reward"]
    reward: String,
    #[description = "Copies to grant (stackable items only, default 1)"]
    #[min = 1]
    #[max = 1000]
    quantity: Option<u32>,
    #[description = "Why it is being granted"] reason: Option<String>,
) -> Result<(), Error> {
    if user.bot {
        return reply_private(ctx, "Bots can't hold rewards! 🤖").await;
    }
    let data = ctx.data();
    let actor = ctx.author().id.get();
    let quantity = quantity.unwrap_or(1);

    let Some((reward, outcome)) =
        settle(ctx, data.inventory.grant(user.id.get(), &reward, quantity).await).await?
    else {
        return Ok(());
    };

    let (copies, total_held) = match outcome {
        GrantOutcome::Granted { copies, total_held } => (copies, total_held),
        GrantOutcome::AlreadyOwned => {
            return reply_private(
                ctx,
                format!("{} already owns **{}**.", user.name, reward.display_name()),
            )
            .await;
        }
    };

    let warning = audit_warning(
        data.audit
            .record_reward(
                RewardLogEntry::new(RewardAction::Granted, actor)
                    .target(user.id.get())
                    .reward(&reward.id)
                    .reason(reason.as_deref())
                    .details(Some(json!({ "copies": copies }))),
            )
            .await,
    );

    let mut description = format!("<@{}> received **{}**", user.id, reward.display_name());
    if copies > 1 {
        description.push_str(&format!(" ×{}", copies));
    }
    if reward.is_stackable() {
        description.push_str(&format!("\nThey now hold **{}**.", total_held));
    }
    let embed = serenity::CreateEmbed::new()
        .title("🎁 Reward granted")
        .description(description)
        .color(COLOR_SUCCESS);
    respond(ctx, embed, warning).await
}

/// Take a reward away from a member
#[poise::command(slash_command, guild_only, check = "economy_admin")]
pub async fn revoke(
    ctx: Context<'_>,
    #[description = "Who loses the reward"] user: serenity::User,
    #[description = "Reward to revoke"]
    #[autocomplete = "autocomplete_reward"]
    reward: String,
    #[description = "Copies to remove (default 1)"]
    #[min = 1]
    quantity: Option<u32>,
    #[description = "Why it is being revoked"] reason: Option<String>,
) -> Result<(), Error> {
    let data = ctx.data();
    let actor = ctx.author().id.get();
    let quantity = quantity.unwrap_or(1);

    let prompt = format!(
        "Remove {} × `{}` from <@{}>?",
        quantity,
        reward.trim(),
        user.id
    );
    if !confirm(ctx, prompt).await? {
        return Ok(());
    }

    let Some((found, outcome)) =
        settle(ctx, data.inventory.revoke(user.id.get(), &reward, quantity).await).await?
    else {
        return Ok(());
    };

    let reward_id = reward.trim().to_string();
    let warning = audit_warning(
        data.audit
            .record_reward(
                RewardLogEntry::new(RewardAction::Revoked, actor)
                    .target(user.id.get())
                    .reward(&reward_id)
                    .reason(reason.as_deref())
                    .details(Some(json!({ "copies": outcome.removed }))),
            )
            .await,
    );

    let name = found
        .map(|r| r.display_name())
        .unwrap_or_else(|| format!("`{}`", reward_id));
    let mut description = format!("Removed **{}** from <@{}>", name, user.id);
    if outcome.removed > 1 {
        description.push_str(&format!(" ×{}", outcome.removed));
    }
    if outcome.remaining > 0 {
        description.push_str(&format!("\n**{}** left.", outcome.remaining));
    }
    let embed = serenity::CreateEmbed::new()
        .title("📤 Reward revoked")
        .description(description)
        .color(COLOR_WARNING);
    respond(ctx, embed, warning).await
}

/// Adjust a member's point balance
#[poise::command(slash_command, guild_only, subcommands("add", "remove"))]
pub async fn points(_ctx: Context<'_>) -> Result<(), Error> {
    Ok(())
}

/// Add points to a member
#[poise::command(slash_command, guild_only, check = "economy_admin")]
pub async fn add(
    ctx: Context<'_>,
    #[description = "Who receives the points"] user: serenity::User,
    #[description = "Amount to add"]
    #[min = 1]
    amount: u64,
    #[description = "Why"] reason: Option<String>,
) -> Result<(), Error> {
    if user.bot {
        return reply_private(ctx, "Bots don't have wallets! 🤖").await;
    }
    let data = ctx.data();
    let actor = ctx.author().id.get();

    let Some(change) = settle(ctx, data.inventory.add_points(user.id.get(), amount).await).await?
    else {
        return Ok(());
    };

    let warning = audit_warning(
        data.audit
            .record_reward(
                RewardLogEntry::new(RewardAction::PointsAdded, actor)
                    .target(user.id.get())
                    .reason(reason.as_deref())
                    .details(Some(json!({
                        "points": { "old": change.before, "new": change.after }
                    }))),
            )
            .await,
    );

    let embed = serenity::CreateEmbed::new()
        .title("💰 Points added")
        .description(format!(
            "<@{}>: {} → **{}** points",
            user.id,
            format_points(change.before),
            format_points(change.after)
        ))
        .color(COLOR_SUCCESS);
    respond(ctx, embed, warning).await
}

/// Remove points from a member (never below zero)
#[poise::command(slash_command, guild_only, check = "economy_admin")]
pub async fn remove(
    ctx: Context<'_>,
    #[description = "Who loses the points"] user: serenity::User,
    #[description = "Amount to remove"]
    #[min = 1]
    amount: u64,
    #[description = "Why"] reason: Option<String>,
) -> Result<(), Error> {
    let data = ctx.data();
    let actor = ctx.author().id.get();

    let prompt = format!("Remove {} points from <@{}>?", format_points(amount), user.id);
    if !confirm(ctx, prompt).await? {
        return Ok(());
    }

    let Some(change) =
        settle(ctx, data.inventory.remove_points(user.id.get(), amount).await).await?
    else {
        return Ok(());
    };

    let removed = change.moved();
    let warning = audit_warning(
        data.audit
            .record_reward(
                RewardLogEntry::new(RewardAction::PointsRemoved, actor)
                    .target(user.id.get())
                    .reason(reason.as_deref())
                    .details(Some(json!({
                        "points": { "old": change.before, "new": change.after }
                    }))),
            )
            .await,
    );

    let mut description = format!(
        "<@{}>: {} → **{}** points",
        user.id,
        format_points(change.before),
        format_points(change.after)
    );
    if removed < amount {
        description.push_str(&format!(
            "\nOnly {} could be removed; the balance stops at zero.",
            format_points(removed)
        ));
    }
    let embed = serenity::CreateEmbed::new()
        .title("💸 Points removed")
        .description(description)
        .color(COLOR_WARNING);
    respond(ctx, embed, warning).await
}
