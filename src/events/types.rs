// src/events/types.rs
//
// Event trait plus the update-step events.
// Each event represents an immutable fact that has already occurred.
//
// CRITICAL RULES:
// - Events are facts, not commands
// - Events carry only the data needed to react
// - No business logic in event types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Trait that all domain events must implement
pub trait DomainEvent: std::fmt::Debug + Clone {
    /// Unique identifier for this event instance
    fn event_id(&self) -> Uuid;

    /// When this event occurred
    fn occurred_at(&self) -> DateTime<Utc>;

    /// Human-readable event type name
    fn event_type(&self) -> &'static str;
}

// ============================================================================
// UPDATE EVENTS
// ============================================================================

/// Emitted after a kept mapping was written to the destination catalog,
/// or would have been in dry-run mode
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetUpdated {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub source_id: u64,
    pub target_id: u64,
    pub title: String,
    pub dry_run: bool,
}

impl TargetUpdated {
    pub fn new(source_id: u64, target_id: u64, title: String, dry_run: bool) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            source_id,
            target_id,
            title,
            dry_run,
        }
    }
}

impl DomainEvent for TargetUpdated {
    fn event_id(&self) -> Uuid { self.event_id }
    fn occurred_at(&self) -> DateTime<Utc> { self.occurred_at }
    fn event_type(&self) -> &'static str { "TargetUpdated" }
}

/// Emitted when the destination rejected an update
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetUpdateFailed {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub source_id: u64,
    pub target_id: u64,
    pub error: String,
}

impl TargetUpdateFailed {
    pub fn new(source_id: u64, target_id: u64, error: String) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            source_id,
            target_id,
            error,
        }
    }
}

impl DomainEvent for TargetUpdateFailed {
    fn event_id(&self) -> Uuid { self.event_id }
    fn occurred_at(&self) -> DateTime<Utc> { self.occurred_at }
    fn event_type(&self) -> &'static str { "TargetUpdateFailed" }
}
