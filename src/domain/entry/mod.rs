pub mod entity;
pub mod invariants;

pub use entity::{
    EntryTitles, ListStatus, MediaEntry, MediaKind, MediaProgress, SourceEntry, TargetEntry,
};
pub use invariants::validate_entry;
