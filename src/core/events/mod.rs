// Events module - time-bounded campaigns that bundle rewards.

pub mod event_filter;
pub mod event_models;
mod event_service;
mod event_store;

pub use event_filter::EventFilter;
pub use event_models::{Event, EventDraft, EventPatch, LinkOutcome};
pub use event_service::{EventError, EventService};
pub use event_store::EventStore;
