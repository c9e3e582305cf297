// src/integrations/mod.rs
//
// External Integrations Module
//
// Boundaries to the outside world: the destination catalog API and the
// crosswalk data sources. Strategies depend on the traits, never on the
// concrete clients.

pub mod anilist;
pub mod crosswalk;
pub mod destination;

pub use anilist::AniListClient;
pub use crosswalk::{
    CachedCrosswalk, CrosswalkSource, LiveCrosswalkService, OfflineCrosswalkTable,
};
pub use destination::DestinationService;

#[cfg(test)]
pub use crosswalk::MockCrosswalkSource;
#[cfg(test)]
pub use destination::MockDestinationService;
