// Discord commands module.
// Each feature gets its own command file.

pub mod autocomplete;

pub mod events;
pub mod grants;
pub mod inventory;
pub mod logs;
pub mod rewards;

use crate::discord::{Data, Error};

/// Every slash command the bot registers.
pub fn all() -> Vec<poise::Command<Data, Error>> {
    vec![
        rewards::reward(),
        grants::grant(),
        grants::revoke(),
        grants::points(),
        inventory::inventory(),
        inventory::title(),
        inventory::shop(),
        events::event(),
        logs::logs(),
    ]
}
