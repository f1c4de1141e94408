// Member-facing commands: inventories, titles and the points shop.

use super::autocomplete::{autocomplete_for_sale, autocomplete_title};
use crate::core::audit::{RewardAction, RewardLogEntry};
use crate::core::rewards::{Reward, RewardFilter};
use crate::discord::render::{
    format_points, inventory_pages, reward_list_pages, COLOR_SUCCESS,
};
use crate::discord::views::paginate;
use crate::discord::{audit_warning, reply_private, respond, settle, Context, Error};
use poise::serenity_prelude as serenity;
use serde_json::json;
use std::collections::HashMap;

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

/// Show the rewards and points a member holds
#[poise::command(slash_command, guild_only)]
pub async fn inventory(
    ctx: Context<'_>,
    #[description = "User to check (defaults to you)"] user: Option<serenity::User>,
) -> Result<(), Error> {
    let target_user = user.as_ref().unwrap_or_else(|| ctx.author());
    if target_user.bot {
        return reply_private(ctx, "Bots don't have inventories! 🤖").await;
    }
    let data = ctx.data();

    let Some(profile) = settle(ctx, data.inventory.profile(target_user.id.get()).await).await?
    else {
        return Ok(());
    };
    let Some(index) = warehouse_index(ctx).await? else {
        return Ok(());
    };

    let pages = inventory_pages(target_user, &profile, &index, data.views.page_size);
    paginate(ctx, pages, false).await
}

/// Manage your displayed title
#[poise::command(slash_command, guild_only, subcommands("equip", "unequip"))]
pub async fn title(_ctx: Context<'_>) -> Result<(), Error> {
    Ok(())
}

/// Display one of your titles
#[poise::command(slash_command, guild_only)]
pub async fn equip(
    ctx: Context<'_>,
    #[description = "Title to equip"]
    #[autocomplete = "autocomplete_title"]
    title: String,
) -> Result<(), Error> {
    let data = ctx.data();
    let user_id = ctx.author().id.get();

    let Some(reward) = settle(ctx, data.inventory.equip_title(user_id, &title).await).await? else {
        return Ok(());
    };

    let warning = audit_warning(
        data.audit
            .record_reward(
                RewardLogEntry::new(RewardAction::TitleEquipped, user_id)
                    .target(user_id)
                    .reward(&reward.id),
            )
            .await,
    );
    let embed = serenity::CreateEmbed::new()
        .title("🎖️ Title equipped")
        .description(format!("You are now known as **{}**.", reward.name))
        .color(COLOR_SUCCESS);
    respond(ctx, embed, warning).await
}

/// Stop displaying your title
#[poise::command(slash_command, guild_only)]
pub async fn unequip(ctx: Context<'_>) -> Result<(), Error> {
    let data = ctx.data();
    let user_id = ctx.author().id.get();

    let Some(previous) = settle(ctx, data.inventory.unequip_title(user_id).await).await? else {
        return Ok(());
    };
    let Some(previous) = previous else {
        return reply_private(ctx, "You don't have a title equipped.").await;
    };

    let warning = audit_warning(
        data.audit
            .record_reward(
                RewardLogEntry::new(RewardAction::TitleUnequipped, user_id)
                    .target(user_id)
                    .reward(previous),
            )
            .await,
    );
    let embed = serenity::CreateEmbed::new()
        .title("Title removed")
        .description("You no longer display a title.")
        .color(COLOR_SUCCESS);
    respond(ctx, embed, warning).await
}

/// View the shop or buy rewards with points
#[poise::command(slash_command, guild_only, subcommands("list", "buy"))]
pub async fn shop(_ctx: Context<'_>) -> Result<(), Error> {
    Ok(())
}

/// View rewards that can be bought
#[poise::command(slash_command, guild_only)]
pub async fn list(ctx: Context<'_>) -> Result<(), Error> {
    let data = ctx.data();
    let filter = RewardFilter {
        for_sale: Some(true),
        ..Default::default()
    };
    let Some(mut rewards) = settle(ctx, data.warehouse.list_rewards(&filter).await).await? else {
        return Ok(());
    };
    if rewards.is_empty() {
        return reply_private(ctx, "The shop is empty right now.").await;
    }
    rewards.sort_by(|a, b| a.price.cmp(&b.price).then_with(|| a.name.cmp(&b.name)));

    let pages = reward_list_pages("🛒 Shop", &rewards, data.views.page_size);
    paginate(ctx, pages, false).await
}

/// Purchase a reward from the shop
#[poise::command(slash_command, guild_only)]
pub async fn buy(
    ctx: Context<'_>,
    #[description = "Reward to purchase"]
    #[autocomplete = "autocomplete_for_sale"]
    reward: String,
) -> Result<(), Error> {
    let user = ctx.author();
    if user.bot {
        return reply_private(ctx, "Bots can't buy items! 🤖").await;
    }
    let data = ctx.data();
    let user_id = user.id.get();

    let Some(receipt) = settle(ctx, data.inventory.purchase(user_id, &reward).await).await? else {
        return Ok(());
    };

    let warning = audit_warning(
        data.audit
            .record_reward(
                RewardLogEntry::new(RewardAction::Purchased, user_id)
                    .target(user_id)
                    .reward(&receipt.reward.id)
                    .details(Some(json!({
                        "price": receipt.reward.price,
                        "points": { "old": receipt.points.before, "new": receipt.points.after }
                    }))),
            )
            .await,
    );

    let embed = serenity::CreateEmbed::new()
        .title("✅ Purchase Successful!")
        .description(format!(
            "**{}** purchased for **{}** points!\n\n💰 New balance: **{}** points",
            receipt.reward.display_name(),
            format_points(receipt.reward.price),
            format_points(receipt.points.after)
        ))
        .color(COLOR_SUCCESS);
    respond(ctx, embed, warning).await
}
