use crate::discord::{Context, Error};
use poise::serenity_prelude as serenity;

/// Ask the invoking user to confirm a destructive action.
///
/// Sends a private prompt with Confirm/Cancel buttons and waits for one
/// click. Returns `false` on cancel or when the confirm timeout runs out;
/// the prompt is edited to say which happened.
pub async fn confirm(ctx: Context<'_>, prompt: impl Into<String>) -> Result<bool, Error> {
    let confirm_id = format!("{}:confirm", ctx.id());
    let cancel_id = format!("{}:cancel", ctx.id());

    let buttons = vec![serenity::CreateActionRow::Buttons(vec![
        serenity::CreateButton::new(&confirm_id)
            .label("Confirm")
            .style(serenity::ButtonStyle::Danger),
        serenity::CreateButton::new(&cancel_id)
            .label("Cancel")
            .style(serenity::ButtonStyle::Secondary),
    ])];

    let prompt = prompt.into();
    let msg = ctx
        .send(
            poise::CreateReply::default()
                .content(&prompt)
                .components(buttons)
                .ephemeral(true),
        )
        .await?;

    let (wanted_confirm, wanted_cancel) = (confirm_id.clone(), cancel_id.clone());
    let interaction = serenity::ComponentInteractionCollector::new(ctx)
        .author_id(ctx.author().id)
        .channel_id(ctx.channel_id())
        .timeout(ctx.data().views.confirm_timeout)
        .filter(move |mci| {
            mci.data.custom_id == wanted_confirm || mci.data.custom_id == wanted_cancel
        })
        .await;

    let Some(mci) = interaction else {
        msg.edit(
            ctx,
            poise::CreateReply::default()
                .content(format!("{}\n\n⌛ Timed out, nothing was changed.", prompt))
                .components(vec![]),
        )
        .await?;
        return Ok(false);
    };

    let confirmed = mci.data.custom_id == confirm_id;
    let outcome = if confirmed {
        "✅ Confirmed."
    } else {
        "✖️ Cancelled, nothing was changed."
    };
    mci.create_response(
        ctx,
        serenity::CreateInteractionResponse::UpdateMessage(
            serenity::CreateInteractionResponseMessage::new()
                .content(format!("{}\n\n{}", prompt, outcome))
                .components(vec![]),
        ),
    )
    .await?;

    Ok(confirmed)
}
