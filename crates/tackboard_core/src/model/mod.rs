//! Entity model for the board, outline, and acting identity.
//! These records are the single source of truth for board invariants.

pub mod column;
pub mod entry;
pub mod identity;
pub mod swimlane;
