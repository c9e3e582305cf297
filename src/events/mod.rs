// src/events/mod.rs
//
// Internal Event System - Public API
//
// CRITICAL: EventHandler is INTERNAL and must NOT be exported

pub mod bus;
pub mod resolution_events;
pub mod types;

pub use types::DomainEvent;

pub use types::{TargetUpdateFailed, TargetUpdated};

pub use bus::{EventBus, EventLogEntry, DEFAULT_EVENT_LOG_CAPACITY};

pub use resolution_events::{
    MappingConflictDetected, ResolutionFailed, ResolutionPassCompleted, TargetResolved,
};

/// Initialize a new event bus
pub fn create_event_bus() -> EventBus {
    EventBus::new()
}
