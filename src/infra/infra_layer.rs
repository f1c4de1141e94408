// The infra module contains implementations of core traits.
// Each feature implementation goes in its own submodule.

pub mod json_file;

#[path = "rewards/json_store.rs"]
pub mod rewards;

#[path = "inventory/json_store.rs"]
pub mod inventory;

#[path = "events/json_store.rs"]
pub mod events;

#[path = "audit/json_store.rs"]
pub mod audit;

#[cfg(test)]
#[path = "memory/in_memory.rs"]
pub mod memory;

pub use audit::JsonAuditStore;
pub use events::JsonEventStore;
pub use inventory::JsonUserStore;
pub use rewards::JsonWarehouseStore;
