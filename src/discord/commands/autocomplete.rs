// Autocomplete callbacks shared by the command groups.

use crate::core::rewards::{RewardFilter, RewardKind};
use crate::discord::{is_admin, Context};

const MAX_SUGGESTIONS: usize = 25;

async fn reward_ids(ctx: Context<'_>, partial: &str, filter: RewardFilter) -> Vec<String> {
    match ctx
        .data()
        .warehouse
        .search_rewards(partial, filter, MAX_SUGGESTIONS)
        .await
    {
        Ok(rewards) => rewards.into_iter().map(|r| r.id).collect(),
        Err(e) => {
            tracing::warn!("Reward autocomplete failed: {}", e);
            Vec::new()
        }
    }
}

/// Autocomplete function for reward ids
pub async fn autocomplete_reward<'a>(
    ctx: Context<'_>,
    partial: &'a str,
) -> impl Iterator<Item = String> + 'a {
    reward_ids(ctx, partial, RewardFilter::default())
        .await
        .into_iter()
}

/// Rewards with a price, for the shop.
pub async fn autocomplete_for_sale<'a>(
    ctx: Context<'_>,
    partial: &'a str,
) -> impl Iterator<Item = String> + 'a {
    let filter = RewardFilter {
        for_sale: Some(true),
        ..Default::default()
    };
    reward_ids(ctx, partial, filter).await.into_iter()
}

pub async fn autocomplete_title<'a>(
    ctx: Context<'_>,
    partial: &'a str,
) -> impl Iterator<Item = String> + 'a {
    let filter = RewardFilter {
        kind: Some(RewardKind::Title),
        ..Default::default()
    };
    reward_ids(ctx, partial, filter)
        .await
        .into_iter()
}

/// Event codes. Hidden events are only suggested to admins.
pub async fn autocomplete_event<'a>(
    ctx: Context<'_>,
    partial: &'a str,
) -> impl Iterator<Item = String> + 'a {
    let show_hidden = is_admin(ctx).await;
    let codes: Vec<String> = match ctx
        .data()
        .events
        .search_events(partial, show_hidden, MAX_SUGGESTIONS)
        .await
    {
        Ok(events) => events.into_iter().map(|e| e.code).collect(),
        Err(e) => {
            tracing::warn!("Event autocomplete failed: {}", e);
            Vec::new()
        }
    };
    codes.into_iter()
}
