// Rewards module - the warehouse of badges, titles and items.

pub mod reward_models;
mod reward_store;
mod warehouse_service;

pub use reward_models::{Reward, RewardDraft, RewardFilter, RewardKind, RewardPatch};
pub use reward_store::WarehouseStore;
pub use warehouse_service::{WarehouseError, WarehouseService};
