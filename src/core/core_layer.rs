// The core module contains all business logic.
// Each feature gets its own submodule; nothing in here knows about Discord.

#[path = "rewards/mod.rs"]
pub mod rewards;

#[path = "inventory/mod.rs"]
pub mod inventory;

#[path = "events/mod.rs"]
pub mod events;

#[path = "audit/mod.rs"]
pub mod audit;

#[path = "access/access_policy.rs"]
pub mod access;

pub mod filters;
pub mod pagination;
pub mod storage;
