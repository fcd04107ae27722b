//! Order and proposal lifecycle rules.
//!
//! Everything here is pure: callers load the current state, ask this crate
//! whether an event is allowed and what it leads to, persist the result, and
//! hand the returned [`Intent`](reels_types::events::Intent)s to the notifier.

pub mod error;
pub mod order;
pub mod policy;
pub mod proposal;
mod templates;

pub use error::{PolicyError, WorkflowError};

use reels_types::models::Role;

/// The two sides of a proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Party {
    Client,
    Creator,
}

/// The authenticated user performing an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user_id: i64,
    pub role: Role,
}

impl Actor {
    pub fn new(user_id: i64, role: Role) -> Self {
        Self { user_id, role }
    }
}
