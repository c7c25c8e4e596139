//! Shared types for the matchlog GSI recorder.

mod ids;
mod record;
mod roster;
mod snapshot;

pub use ids::*;
pub use record::*;
pub use roster::*;
pub use snapshot::*;
