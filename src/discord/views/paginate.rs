use crate::core::pagination::PageWindow;
use crate::discord::{Context, Error};
use poise::serenity_prelude as serenity;

fn page_buttons(prefix: &str, window: PageWindow) -> Vec<serenity::CreateActionRow> {
    vec![serenity::CreateActionRow::Buttons(vec![
        serenity::CreateButton::new(format!("{}prev", prefix))
            .label("◀ Previous")
            .style(serenity::ButtonStyle::Primary)
            .disabled(!window.has_prev()),
        serenity::CreateButton::new(format!("{}next", prefix))
            .label("Next ▶")
            .style(serenity::ButtonStyle::Primary)
            .disabled(!window.has_next()),
    ])]
}

/// Where a click on `custom_id` moves the window, or `None` when the
/// button belongs to another list.
fn turn_page(window: PageWindow, prefix: &str, custom_id: &str) -> Option<PageWindow> {
    match custom_id.strip_prefix(prefix) {
        Some("prev") => Some(window.prev()),
        Some("next") => Some(window.next()),
        _ => None,
    }
}

fn with_footer(embed: &serenity::CreateEmbed, window: PageWindow) -> serenity::CreateEmbed {
    embed
        .clone()
        .footer(serenity::CreateEmbedFooter::new(format!(
            "Page {}/{}",
            window.page, window.total_pages
        )))
}

/// Show pre-rendered pages with Previous/Next buttons. Only the invoking
/// user can flip pages; the buttons go away once nobody has clicked for
/// the configured timeout.
pub async fn paginate(
    ctx: Context<'_>,
    pages: Vec<serenity::CreateEmbed>,
    ephemeral: bool,
) -> Result<(), Error> {
    if pages.is_empty() {
        return Ok(());
    }
    let mut window = PageWindow::new(pages.len(), 1, 1);

    // A single page needs no buttons.
    if pages.len() == 1 {
        ctx.send(
            poise::CreateReply::default()
                .embed(pages[0].clone())
                .ephemeral(ephemeral),
        )
        .await?;
        return Ok(());
    }

    // Custom ids are unique per invocation so two open lists never react
    // to each other's buttons.
    let prefix = format!("{}:", ctx.id());
    let msg = ctx
        .send(
            poise::CreateReply::default()
                .embed(with_footer(&pages[0], window))
                .components(page_buttons(&prefix, window))
                .ephemeral(ephemeral),
        )
        .await?;

    let timeout = ctx.data().views.pagination_timeout;
    while let Some(mci) = serenity::ComponentInteractionCollector::new(ctx)
        .author_id(ctx.author().id)
        .channel_id(ctx.channel_id())
        .timeout(timeout)
        .filter({
            let wanted = prefix.clone();
            move |mci| mci.data.custom_id.starts_with(&wanted)
        })
        .await
    {
        window = match turn_page(window, &prefix, &mci.data.custom_id) {
            Some(next) => next,
            None => continue,
        };

        // Defer the update to prevent "Unknown interaction" errors if processing takes > 3s
        if let Err(e) = mci.defer(ctx.http()).await {
            tracing::warn!("Error deferring page interaction: {:?}", e);
            continue;
        }

        let page = &pages[window.page - 1];
        if let Err(e) = msg
            .edit(
                ctx,
                poise::CreateReply::default()
                    .embed(with_footer(page, window))
                    .components(page_buttons(&prefix, window)),
            )
            .await
        {
            tracing::warn!("Error updating page: {:?}", e);
        }
    }

    // Remove components after timeout
    let _ = msg
        .edit(
            ctx,
            poise::CreateReply::default()
                .embed(with_footer(&pages[window.page - 1], window))
                .components(vec![]),
        )
        .await;
    Ok(())
}
