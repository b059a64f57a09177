//! Pure computation for deterministic rollups.

pub mod apply;
pub mod rollup;

pub use apply::apply_event;
pub use rollup::{PairSide, TokenVolume};
