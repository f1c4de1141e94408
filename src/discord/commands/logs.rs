// Admin views over the audit logs.

use crate::core::audit::LogQuery;
use crate::core::filters::YearMonth;
use crate::discord::render::{deletion_log_pages, event_log_pages, reward_log_pages};
use crate::discord::views::paginate;
use crate::discord::{economy_admin, reply_private, settle, Context, Error};
use poise::serenity_prelude as serenity;

#[derive(Debug, Clone, Copy, poise::ChoiceParameter)]
pub enum DeletedKindChoice {
    #[name = "Reward"]
    Reward,
    #[name = "Event"]
    Event,
}

impl DeletedKindChoice {
    fn as_action(&self) -> &'static str {
        match self {
            DeletedKindChoice::Reward => "reward",
            DeletedKindChoice::Event => "event",
        }
    }
}

/// Browse the audit logs
#[poise::command(
    slash_command,
    guild_only,
    subcommands("rewards", "events", "deletions")
)]
pub async fn logs(_ctx: Context<'_>) -> Result<(), Error> {
    Ok(())
}

/// Build the query, answering privately when the month does not parse.
async fn build_query(
    ctx: Context<'_>,
    actor: Option<serenity::User>,
    target: Option<serenity::User>,
    subject_id: Option<String>,
    action: Option<String>,
    month: Option<String>,
) -> Result<Option<LogQuery>, Error> {
    let month = match month.as_deref().map(str::parse::<YearMonth>).transpose() {
        Ok(month) => month,
        Err(message) => {
            reply_private(ctx, format!("❌ {}", message)).await?;
            return Ok(None);
        }
    };
    Ok(Some(LogQuery {
        actor_id: actor.map(|u| u.id.get()),
        target_id: target.map(|u| u.id.get()),
        subject_id,
        action,
        month,
    }))
}

/// Reward changes, grants, points and purchases
#[poise::command(slash_command, guild_only, check = "economy_admin")]
pub async fn rewards(
    ctx: Context<'_>,
    #[description = "Who made the change"] actor: Option<serenity::User>,
    #[description = "Who was affected"] target: Option<serenity::User>,
    #[description = "Reward id"] reward: Option<String>,
    #[description = "Action, e.g. granted or points_added"] action: Option<String>,
    #[description = "Month (YYYY-MM)"] month: Option<String>,
) -> Result<(), Error> {
    let Some(query) = build_query(ctx, actor, target, reward, action, month).await? else {
        return Ok(());
    };
    let Some(entries) = settle(ctx, ctx.data().audit.reward_history(&query).await).await? else {
        return Ok(());
    };
    if entries.is_empty() {
        return reply_private(ctx, "No reward log entries match.").await;
    }
    let pages = reward_log_pages(&entries, ctx.data().views.page_size);
    paginate(ctx, pages, true).await
}

/// Event changes and bundle awards
#[poise::command(slash_command, guild_only, check = "economy_admin")]
pub async fn events(
    ctx: Context<'_>,
    #[description = "Who made the change"] actor: Option<serenity::User>,
    #[description = "Who was affected"] target: Option<serenity::User>,
    #[description = "Event id"] event: Option<String>,
    #[description = "Action, e.g. updated or awarded"] action: Option<String>,
    #[description = "Month (YYYY-MM)"] month: Option<String>,
) -> Result<(), Error> {
    let Some(query) = build_query(ctx, actor, target, event, action, month).await? else {
        return Ok(());
    };
    let Some(entries) = settle(ctx, ctx.data().audit.event_history(&query).await).await? else {
        return Ok(());
    };
    if entries.is_empty() {
        return reply_private(ctx, "No event log entries match.").await;
    }
    let pages = event_log_pages(&entries, ctx.data().views.page_size);
    paginate(ctx, pages, true).await
}

/// Deleted rewards and events
#[poise::command(slash_command, guild_only, check = "economy_admin")]
pub async fn deletions(
    ctx: Context<'_>,
    #[description = "Who deleted it"] actor: Option<serenity::User>,
    #[description = "Id of the deleted reward or event"] id: Option<String>,
    #[description = "Only rewards or only events"] kind: Option<DeletedKindChoice>,
    #[description = "Month (YYYY-MM)"] month: Option<String>,
) -> Result<(), Error> {
    let action = kind.map(|k| k.as_action().to_string());
    let Some(query) = build_query(ctx, actor, None, id, action, month).await? else {
        return Ok(());
    };
    let Some(entries) = settle(ctx, ctx.data().audit.deletion_history(&query).await).await? else {
        return Ok(());
    };
    if entries.is_empty() {
        return reply_private(ctx, "No deletions match.").await;
    }
    let pages = deletion_log_pages(&entries, ctx.data().views.page_size);
    paginate(ctx, pages, true).await
}
