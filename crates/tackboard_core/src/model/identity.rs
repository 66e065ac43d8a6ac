//! Acting identity model.
//!
//! Identities exist to attribute edits, not to gate access. The pair is
//! created lazily on first check-in and never deleted.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A durable `(uid, name)` pair identifying who performed an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Globally unique machine identity.
    pub uid: Uuid,
    /// Human-readable name; expected unique, enforced at check-in.
    pub name: String,
}
