// Inventory module - points and owned rewards per user.

mod inventory_models;
mod inventory_service;
mod user_store;

pub use inventory_models::{BundleLine, GrantOutcome, UserData};
pub use inventory_service::{InventoryError, InventoryService};
pub use user_store::UserStore;
