// Embed formatting for rewards, inventories, events and audit entries.
//
// Pure functions from domain values to serenity builders; the commands
// decide where the embeds go.

use crate::core::audit::{DeletedKind, DeletionLogEntry, EventLogEntry, RewardLogEntry};
use crate::core::events::Event;
use crate::core::inventory::UserData;
use crate::core::pagination::chunk_pages;
use crate::core::rewards::{Reward, RewardKind};
use chrono::NaiveDate;
use poise::serenity_prelude as serenity;
use serde_json::Value;
use std::collections::HashMap;

pub const COLOR_REWARD: u32 = 0x5865F2; // Blurple
pub const COLOR_SUCCESS: u32 = 0x00FF00;
pub const COLOR_WARNING: u32 = 0xFFA500;
pub const COLOR_LOG: u32 = 0x95A5A6;

const FIELD_LIMIT: usize = 1024;

/// Format a number with commas for readability
pub fn format_points(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.insert(0, ',');
        }
        result.insert(0, c);
    }
    result
}

fn clip(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

fn price_label(reward: &Reward) -> String {
    if reward.is_for_sale() {
        format!("{} points", format_points(reward.price))
    } else {
        "Not for sale".to_string()
    }
}

fn date(d: NaiveDate) -> String {
    d.format("%Y-%m-%d").to_string()
}

// ============================================================================
// REWARDS
// ============================================================================

pub fn reward_embed(reward: &Reward) -> serenity::CreateEmbed {
    let description = if reward.description.is_empty() {
        "*No description*".to_string()
    } else {
        reward.description.clone()
    };

    let mut embed = serenity::CreateEmbed::new()
        .title(reward.display_name())
        .description(description)
        .color(COLOR_REWARD)
        .field("ID", format!("`{}`", reward.id), true)
        .field("Type", reward.kind.label(), true)
        .field("Price", price_label(reward), true)
        .field("Times granted", reward.times_bought.to_string(), true)
        .field("Created by", format!("<@{}>", reward.created_by), true);

    if reward.kind == RewardKind::Item {
        embed = embed.field(
            "Stackable",
            if reward.is_stackable() { "Yes" } else { "No" },
            true,
        );
    }
    if let Some(url) = &reward.media_url {
        embed = embed.image(url);
    }
    if let Some(updated_by) = reward.updated_by {
        embed = embed.footer(serenity::CreateEmbedFooter::new(format!(
            "Last edited by user {}",
            updated_by
        )));
    }
    embed
}

fn reward_line(reward: &Reward) -> String {
    let stack = if reward.is_stackable() { " · stackable" } else { "" };
    format!(
        "**{}** `{}`\n{} · {}{}",
        reward.display_name(),
        reward.id,
        reward.kind.label(),
        price_label(reward),
        stack
    )
}

pub fn reward_list_pages(
    title: &str,
    rewards: &[Reward],
    per_page: usize,
) -> Vec<serenity::CreateEmbed> {
    if rewards.is_empty() {
        return vec![serenity::CreateEmbed::new()
            .title(title)
            .description("No rewards match.")
            .color(COLOR_WARNING)];
    }
    chunk_pages(rewards, per_page)
        .into_iter()
        .map(|page| {
            let body = page.iter().map(reward_line).collect::<Vec<_>>().join("\n\n");
            serenity::CreateEmbed::new()
                .title(format!("{} ({})", title, rewards.len()))
                .description(body)
                .color(COLOR_REWARD)
        })
        .collect()
}

// ============================================================================
// INVENTORY
// ============================================================================

/// One line per owned reward, resolved against the warehouse. Ids the
/// warehouse no longer knows are shown raw.
pub fn inventory_lines(user: &UserData, warehouse: &HashMap<String, Reward>) -> Vec<String> {
    let name = |id: &str| {
        warehouse
            .get(id)
            .map(|r| r.display_name())
            .unwrap_or_else(|| format!("`{}`", id))
    };

    let mut lines = Vec::new();
    for id in &user.titles {
        let marker = if user.equipped_title.as_deref() == Some(id.as_str()) {
            " *(equipped)*"
        } else {
            ""
        };
        lines.push(format!("{} Title · {}{}", RewardKind::Title.icon(), name(id), marker));
    }
    for id in &user.badges {
        lines.push(format!("{} Badge · {}", RewardKind::Badge.icon(), name(id)));
    }
    for (id, count) in user.item_stacks() {
        if count > 1 {
            lines.push(format!("{} Item · {} ×{}", RewardKind::Item.icon(), name(&id), count));
        } else {
            lines.push(format!("{} Item · {}", RewardKind::Item.icon(), name(&id)));
        }
    }
    lines
}

pub fn inventory_pages(
    owner: &serenity::User,
    user: &UserData,
    warehouse: &HashMap<String, Reward>,
    per_page: usize,
) -> Vec<serenity::CreateEmbed> {
    let lines = inventory_lines(user, warehouse);
    let equipped = user
        .equipped_title
        .as_deref()
        .and_then(|id| warehouse.get(id))
        .map(|r| r.name.clone())
        .unwrap_or_else(|| "None".to_string());

    chunk_pages(&lines, per_page)
        .into_iter()
        .map(|page| {
            let body = if page.is_empty() {
                "Nothing here yet.".to_string()
            } else {
                page.join("\n")
            };
            serenity::CreateEmbed::new()
                .title(format!("🎒 {}'s Inventory", owner.name))
                .thumbnail(owner.face())
                .color(COLOR_REWARD)
                .field("Points", format_points(user.points), true)
                .field("Title", equipped.clone(), true)
                .description(body)
        })
        .collect()
}

// ============================================================================
// EVENTS
// ============================================================================

fn tags_text(event: &Event) -> String {
    if event.tags.is_empty() {
        "None".to_string()
    } else {
        let joined = event.tags.iter().cloned().collect::<Vec<_>>().join(", ");
        clip(&joined, FIELD_LIMIT)
    }
}

pub fn event_embed(
    event: &Event,
    today: NaiveDate,
    warehouse: &HashMap<String, Reward>,
) -> serenity::CreateEmbed {
    let description = if event.description.is_empty() {
        "*No description*".to_string()
    } else {
        event.description.clone()
    };
    let rewards = if event.rewards.is_empty() {
        "None linked".to_string()
    } else {
        event
            .rewards
            .iter()
            .map(|id| {
                warehouse
                    .get(id)
                    .map(|r| format!("{} `{}`", r.display_name(), id))
                    .unwrap_or_else(|| format!("`{}`", id))
            })
            .collect::<Vec<_>>()
            .join("\n")
    };
    let flags = format!(
        "{} · {}",
        if event.active { "Active" } else { "Inactive" },
        if event.visible { "Visible" } else { "Hidden" }
    );

    let mut embed = serenity::CreateEmbed::new()
        .title(format!("{} [{}]", event.name, event.code))
        .description(description)
        .color(event.embed_color)
        .field(
            "Dates",
            format!("{} → {}", date(event.start_date), date(event.end_date)),
            true,
        )
        .field("Status", event.phase(today).label(), true)
        .field("Flags", flags, true)
        .field("Priority", event.priority.to_string(), true)
        .field("Tags", tags_text(event), true)
        .field(
            "Coordinator",
            event
                .coordinator_id
                .map(|id| format!("<@{}>", id))
                .unwrap_or_else(|| "None".to_string()),
            true,
        )
        .field("Rewards", clip(&rewards, FIELD_LIMIT), false)
        .footer(serenity::CreateEmbedFooter::new(format!(
            "ID {}",
            event.event_id
        )));

    if let Some(url) = &event.banner_url {
        embed = embed.image(url);
    }
    if let Some(url) = &event.thumbnail_url {
        embed = embed.thumbnail(url);
    }
    if let Some(url) = &event.info_url {
        embed = embed.url(url);
    }
    embed
}

fn event_line(event: &Event, today: NaiveDate) -> String {
    let hidden = if event.visible { "" } else { " · hidden" };
    let inactive = if event.active { "" } else { " · inactive" };
    format!(
        "**{}** `{}`\n{} → {} · {}{}{} · {} reward(s)",
        event.name,
        event.code,
        date(event.start_date),
        date(event.end_date),
        event.phase(today).label(),
        inactive,
        hidden,
        event.rewards.len()
    )
}

pub fn event_list_pages(
    events: &[Event],
    today: NaiveDate,
    per_page: usize,
) -> Vec<serenity::CreateEmbed> {
    if events.is_empty() {
        return vec![serenity::CreateEmbed::new()
            .title("📅 Events")
            .description("No events match.")
            .color(COLOR_WARNING)];
    }
    chunk_pages(events, per_page)
        .into_iter()
        .map(|page| {
            let body = page
                .iter()
                .map(|e| event_line(e, today))
                .collect::<Vec<_>>()
                .join("\n\n");
            serenity::CreateEmbed::new()
                .title(format!("📅 Events ({})", events.len()))
                .description(body)
                .color(COLOR_REWARD)
        })
        .collect()
}

// ============================================================================
// AUDIT LOGS
// ============================================================================

fn compact(value: &Value) -> String {
    match value {
        Value::Null => "none".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// `field: old → new` lines from a `{field: {old, new}}` diff. Anything
/// else is shown as compact JSON.
pub fn describe_details(details: &Value) -> String {
    let Some(fields) = details.as_object() else {
        return compact(details);
    };
    fields
        .iter()
        .map(|(field, change)| match (change.get("old"), change.get("new")) {
            (Some(old), Some(new)) => format!("{}: {} → {}", field, compact(old), compact(new)),
            _ => format!("{}: {}", field, compact(change)),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn timestamp(ts: chrono::DateTime<chrono::Utc>) -> String {
    format!("<t:{}:f>", ts.timestamp())
}

fn reward_log_line(entry: &RewardLogEntry) -> String {
    let mut line = format!(
        "{} **{}** by <@{}>",
        timestamp(entry.timestamp),
        entry.action.as_str(),
        entry.actor_id
    );
    if let Some(reward_id) = &entry.reward_id {
        line.push_str(&format!(" · `{}`", reward_id));
    }
    if let Some(target) = entry.target_id {
        line.push_str(&format!(" → <@{}>", target));
    }
    if !entry.reason.is_empty() {
        line.push_str(&format!("\n> {}", entry.reason));
    }
    if let Some(details) = &entry.details {
        line.push_str(&format!("\n```{}```", clip(&describe_details(details), 300)));
    }
    line
}

fn event_log_line(entry: &EventLogEntry) -> String {
    let mut line = format!(
        "{} **{}** by <@{}> · `{}`",
        timestamp(entry.timestamp),
        entry.action.as_str(),
        entry.actor_id,
        entry.event_id
    );
    if let Some(target) = entry.target_id {
        line.push_str(&format!(" → <@{}>", target));
    }
    if !entry.reason.is_empty() {
        line.push_str(&format!("\n> {}", entry.reason));
    }
    if let Some(details) = &entry.details {
        line.push_str(&format!("\n```{}```", clip(&describe_details(details), 300)));
    }
    line
}

fn deletion_log_line(entry: &DeletionLogEntry) -> String {
    let kind = match entry.kind {
        DeletedKind::Reward => "Reward",
        DeletedKind::Event => "Event",
    };
    let mut line = format!(
        "{} **{}** `{}` ({}) deleted by <@{}>",
        timestamp(entry.timestamp),
        kind,
        entry.object_id,
        entry.name,
        entry.actor_id
    );
    if entry.unlinked_users > 0 || entry.unlinked_events > 0 {
        line.push_str(&format!(
            "\nUnlinked from {} inventories and {} events",
            entry.unlinked_users, entry.unlinked_events
        ));
    }
    if !entry.reason.is_empty() {
        line.push_str(&format!("\n> {}", entry.reason));
    }
    line
}

fn log_pages(title: &str, lines: Vec<String>, per_page: usize) -> Vec<serenity::CreateEmbed> {
    if lines.is_empty() {
        return vec![serenity::CreateEmbed::new()
            .title(title)
            .description("No entries match.")
            .color(COLOR_WARNING)];
    }
    let total = lines.len();
    chunk_pages(&lines, per_page)
        .into_iter()
        .map(|page| {
            serenity::CreateEmbed::new()
                .title(format!("{} ({})", title, total))
                .description(clip(&page.join("\n\n"), 4000))
                .color(COLOR_LOG)
        })
        .collect()
}

pub fn reward_log_pages(entries: &[RewardLogEntry], per_page: usize) -> Vec<serenity::CreateEmbed> {
    log_pages(
        "🧾 Reward log",
        entries.iter().map(reward_log_line).collect(),
        per_page,
    )
}

pub fn event_log_pages(entries: &[EventLogEntry], per_page: usize) -> Vec<serenity::CreateEmbed> {
    log_pages(
        "🧾 Event log",
        entries.iter().map(event_log_line).collect(),
        per_page,
    )
}

pub fn deletion_log_pages(
    entries: &[DeletionLogEntry],
    per_page: usize,
) -> Vec<serenity::CreateEmbed> {
    log_pages(
        "🗑️ Deletion log",
        entries.iter().map(deletion_log_line).collect(),
        per_page,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn long_tag_lists_fit_in_a_field() {
        let event = Event {
            event_id: "evt_abcd1234".to_string(),
            code: "SUM24".to_string(),
            name: "Summer".to_string(),
            description: String::new(),
            start_date: NaiveDate::from_ymd_opt(2024, 7, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 7, 31).unwrap(),
            coordinator_id: None,
            banner_url: None,
            thumbnail_url: None,
            info_url: None,
            priority: 0,
            embed_color: 0,
            tags: (0..400).map(|n| format!("tag{}", n)).collect(),
            rewards: Vec::new(),
            active: true,
            visible: true,
            created_by: 1,
            created_at: chrono::Utc::now(),
            updated_by: None,
            updated_at: None,
        };
        let text = tags_text(&event);
        assert_eq!(text.chars().count(), FIELD_LIMIT);
        assert!(text.ends_with('…'));
    }

    #[test]
    fn formats_points_with_commas() {
        assert_eq!(format_points(0), "0");
        assert_eq!(format_points(999), "999");
        assert_eq!(format_points(1_000), "1,000");
        assert_eq!(format_points(12_345_678), "12,345,678");
    }

    #[test]
    fn describes_field_diffs() {
        let details = json!({
            "price": { "old": 10, "new": 25 },
            "emoji": { "old": null, "new": ":sunny:" },
        });
        assert_eq!(
            describe_details(&details),
            "emoji: none → :sunny:\nprice: 10 → 25"
        );
        assert_eq!(describe_details(&json!({ "copies": 3 })), "copies: 3");
    }

    #[test]
    fn inventory_lines_mark_equipped_and_stacks() {
        let mut user = UserData::default();
        user.titles.insert("title_captain".to_string());
        user.equipped_title = Some("title_captain".to_string());
        user.items = vec!["item_shell".to_string(); 3];
        user.badges.insert("badge_gone".to_string());

        let lines = inventory_lines(&user, &HashMap::new());
        assert_eq!(
            lines,
            vec![
                "🎖️ Title · `title_captain` *(equipped)*".to_string(),
                "🏅 Badge · `badge_gone`".to_string(),
                "📦 Item · `item_shell` ×3".to_string(),
            ]
        );
    }
}
