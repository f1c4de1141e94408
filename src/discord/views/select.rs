use crate::discord::{Context, Error};
use poise::serenity_prelude as serenity;

/// Discord caps a string select menu at 25 options.
pub const MAX_OPTIONS: usize = 25;

/// One entry of a multi-select dropdown.
#[derive(Debug, Clone)]
pub struct SelectOption {
    pub label: String,
    pub value: String,
    pub description: Option<String>,
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let mut cut: String = text.chars().take(max.saturating_sub(1)).collect();
        cut.push('…');
        cut
    }
}

/// Let the invoking user pick one or more options from a private dropdown.
///
/// Returns `None` when there is nothing to pick or the pagination timeout
/// runs out before a choice is made. Options past the 25th are dropped;
/// callers mention that in `prompt` if it matters.
pub async fn select_many(
    ctx: Context<'_>,
    prompt: &str,
    options: Vec<SelectOption>,
) -> Result<Option<Vec<String>>, Error> {
    if options.is_empty() {
        return Ok(None);
    }

    let menu_id = format!("{}:select", ctx.id());
    let menu_options: Vec<serenity::CreateSelectMenuOption> = options
        .iter()
        .take(MAX_OPTIONS)
        .map(|o| {
            let option = serenity::CreateSelectMenuOption::new(truncate(&o.label, 100), &o.value);
            match &o.description {
                Some(d) => option.description(truncate(d, 100)),
                None => option,
            }
        })
        .collect();
    let max_values = menu_options.len() as u8;

    let menu = serenity::CreateSelectMenu::new(
        &menu_id,
        serenity::CreateSelectMenuKind::String {
            options: menu_options,
        },
    )
    .placeholder("Choose rewards")
    .min_values(1)
    .max_values(max_values);

    let msg = ctx
        .send(
            poise::CreateReply::default()
                .content(prompt)
                .components(vec![serenity::CreateActionRow::SelectMenu(menu)])
                .ephemeral(true),
        )
        .await?;

    let wanted = menu_id.clone();
    let interaction = serenity::ComponentInteractionCollector::new(ctx)
        .author_id(ctx.author().id)
        .channel_id(ctx.channel_id())
        .timeout(ctx.data().views.pagination_timeout)
        .filter(move |mci| mci.data.custom_id == wanted)
        .await;

    let Some(mci) = interaction else {
        msg.edit(
            ctx,
            poise::CreateReply::default()
                .content("⌛ Selection timed out, nothing was changed.")
                .components(vec![]),
        )
        .await?;
        return Ok(None);
    };

    let picked = match &mci.data.kind {
        serenity::ComponentInteractionDataKind::StringSelect { values } => values.clone(),
        _ => Vec::new(),
    };

    mci.create_response(
        ctx,
        serenity::CreateInteractionResponse::UpdateMessage(
            serenity::CreateInteractionResponseMessage::new()
                .content(format!("Selected {} reward(s).", picked.len()))
                .components(vec![]),
        ),
    )
    .await?;

    Ok(if picked.is_empty() { None } else { Some(picked) })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncates_long_labels() {
        assert_eq!(truncate("short", 100), "short");
        let long = "x".repeat(120);
        let cut = truncate(&long, 100);
        assert_eq!(cut.chars().count(), 100);
        assert!(cut.ends_with('…'));
    }
}
