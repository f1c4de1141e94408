// Discord layer - commands, interactive views and embed rendering.

#[path = "commands/command_catalog.rs"]
pub mod commands;
#[path = "views/view_catalog.rs"]
pub mod views;

pub mod render;

mod bot_data;

pub use bot_data::{
    audit_warning, economy_admin, is_admin, on_error, reply_private, respond, settle, Context,
    Data, Error, ViewSettings,
};
