//! Swimlane domain model.
//!
//! # Responsibility
//! - Define the horizontal board partition record.
//!
//! # Invariants
//! - `title` is unique among active swimlanes.
//! - `wip_limit` is never negative; 0 means unlimited.
//! - Target dates are either absent or valid calendar datetimes.

use crate::model::column::LaneStatus;
use serde::{Deserialize, Serialize};
use time::PrimitiveDateTime;

/// Stable integer identity of a swimlane row.
pub type SwimlaneId = i64;

/// One horizontal board partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Swimlane {
    /// Stable row identity.
    pub id: SwimlaneId,
    /// Unique among active swimlanes.
    pub title: String,
    /// Maximum active cards; 0 means unlimited.
    pub wip_limit: i64,
    pub status: LaneStatus,
    /// Planned start of the work this lane tracks.
    pub target_start: Option<PrimitiveDateTime>,
    /// Planned end of the work this lane tracks.
    pub target_end: Option<PrimitiveDateTime>,
}

impl Swimlane {
    pub fn is_active(&self) -> bool {
        self.status == LaneStatus::Active
    }
}
