// Shared state handed to every command, plus the glue every command needs:
// the admin check, private replies and turning domain errors into messages.

use crate::core::access::{AccessPolicy, MemberAccess};
use crate::core::audit::{AuditError, AuditService};
use crate::core::events::{EventError, EventService};
use crate::core::inventory::{InventoryError, InventoryService};
use crate::core::rewards::{WarehouseError, WarehouseService};
use crate::infra::{JsonAuditStore, JsonEventStore, JsonUserStore, JsonWarehouseStore};
use chrono_tz::Tz;
use poise::serenity_prelude as serenity;
use std::sync::Arc;
use std::time::Duration;

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;

pub type Warehouse = WarehouseService<JsonWarehouseStore, JsonUserStore, JsonEventStore>;
pub type Inventory = InventoryService<JsonWarehouseStore, JsonUserStore>;
pub type Events = EventService<JsonWarehouseStore, JsonEventStore>;
pub type Audit = AuditService<JsonAuditStore>;

/// Timeouts and sizes for the interactive views.
#[derive(Debug, Clone)]
pub struct ViewSettings {
    pub confirm_timeout: Duration,
    pub pagination_timeout: Duration,
    pub page_size: usize,
    pub timezone: Tz,
}

pub struct Data {
    pub warehouse: Arc<Warehouse>,
    pub inventory: Arc<Inventory>,
    pub events: Arc<Events>,
    pub audit: Arc<Audit>,
    pub access: AccessPolicy,
    pub views: ViewSettings,
}

impl Data {
    /// Today's date in the configured timezone.
    pub fn today(&self) -> chrono::NaiveDate {
        chrono::Utc::now()
            .with_timezone(&self.views.timezone)
            .date_naive()
    }
}

// ============================================================================
// ACCESS
// ============================================================================

async fn member_access(ctx: Context<'_>) -> Option<MemberAccess> {
    let member = ctx.author_member().await?;
    let permissions = member.permissions.unwrap_or_else(serenity::Permissions::empty);
    Some(MemberAccess {
        is_administrator: permissions.administrator(),
        can_manage_guild: permissions.manage_guild(),
        role_ids: member.roles.iter().map(|r| r.get()).collect(),
    })
}

pub async fn is_admin(ctx: Context<'_>) -> bool {
    match member_access(ctx).await {
        Some(access) => ctx.data().access.is_economy_admin(&access),
        None => false,
    }
}

/// Command check for the admin-gated commands. Rejections are answered
/// privately here, so the error hook stays quiet about them.
pub async fn economy_admin(ctx: Context<'_>) -> Result<bool, Error> {
    if is_admin(ctx).await {
        return Ok(true);
    }
    tracing::info!(
        user_id = ctx.author().id.get(),
        command = %ctx.command().qualified_name,
        "Rejected non-admin command"
    );
    reply_private(
        ctx,
        "🔒 You need the Administrator or Manage Server permission, or an economy admin role, to use this command.",
    )
    .await?;
    Ok(false)
}

// ============================================================================
// REPLIES
// ============================================================================

pub async fn reply_private(ctx: Context<'_>, content: impl Into<String>) -> Result<(), Error> {
    ctx.send(
        poise::CreateReply::default()
            .content(content)
            .ephemeral(true),
    )
    .await?;
    Ok(())
}

/// Public reply with an embed, carrying the audit warning when there is one.
pub async fn respond(
    ctx: Context<'_>,
    embed: serenity::CreateEmbed,
    warning: Option<String>,
) -> Result<(), Error> {
    let mut reply = poise::CreateReply::default().embed(embed);
    if let Some(warning) = warning {
        reply = reply.content(warning);
    }
    ctx.send(reply).await?;
    Ok(())
}

/// Domain errors that should be shown to the invoking user instead of being
/// treated as a bot failure.
pub trait UserFacing {
    fn user_message(&self) -> Option<String>;
}

impl UserFacing for WarehouseError {
    fn user_message(&self) -> Option<String> {
        match self {
            WarehouseError::Store(_) => None,
            other => Some(other.to_string()),
        }
    }
}

impl UserFacing for InventoryError {
    fn user_message(&self) -> Option<String> {
        match self {
            InventoryError::Store(_) => None,
            other => Some(other.to_string()),
        }
    }
}

impl UserFacing for EventError {
    fn user_message(&self) -> Option<String> {
        match self {
            EventError::Store(_) => None,
            other => Some(other.to_string()),
        }
    }
}

impl UserFacing for AuditError {
    fn user_message(&self) -> Option<String> {
        match self {
            AuditError::Read { log, source } => {
                tracing::error!(log = log.label(), error = %source, "Audit log unreadable");
                Some(format!("Failed to read the {} log.", log))
            }
            AuditError::Write { .. } => None,
        }
    }
}

/// Unwrap a service result. User-facing failures are answered privately and
/// yield `None`; anything else is handed to the error hook.
pub async fn settle<T, E>(ctx: Context<'_>, result: Result<T, E>) -> Result<Option<T>, Error>
where
    E: UserFacing + std::error::Error + Send + Sync + 'static,
{
    match result {
        Ok(value) => Ok(Some(value)),
        Err(err) => match err.user_message() {
            Some(message) => {
                reply_private(ctx, format!("❌ {}", message)).await?;
                Ok(None)
            }
            None => Err(err.into()),
        },
    }
}

/// A failed audit write never undoes the change; the reply just says so.
pub fn audit_warning(result: Result<(), AuditError>) -> Option<String> {
    match result {
        Ok(()) => None,
        Err(err) => {
            tracing::warn!(error = %err, "Change saved but audit entry was not written");
            Some("⚠️ The change was saved, but writing the audit log failed.".to_string())
        }
    }
}

// ============================================================================
// ERROR HOOK
// ============================================================================

pub async fn on_error(error: poise::FrameworkError<'_, Data, Error>) {
    match error {
        poise::FrameworkError::Command { error, ctx, .. } => {
            tracing::error!(
                command = %ctx.command().qualified_name,
                user_id = ctx.author().id.get(),
                error = %error,
                "Command failed"
            );
            let _ = reply_private(ctx, "⚠️ Something went wrong while running this command.").await;
        }
        // `economy_admin` already told the user.
        poise::FrameworkError::CommandCheckFailed { error: None, .. } => {}
        other => {
            if let Err(e) = poise::builtins::on_error(other).await {
                tracing::error!("Error while handling error: {}", e);
            }
        }
    }
}
