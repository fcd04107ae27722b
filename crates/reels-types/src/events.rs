use serde::{Deserialize, Serialize};

/// Side effects requested by a workflow step. They are executed by the
/// notifier after the state change has been committed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Intent {
    /// Store an in-app notification for a user
    Notify { user_id: i64, message: String },

    /// Send an email to a user's registered address
    Email {
        user_id: i64,
        subject: String,
        html: String,
    },
}

impl Intent {
    /// The user this intent is addressed to.
    pub fn recipient(&self) -> i64 {
        match self {
            Self::Notify { user_id, .. } => *user_id,
            Self::Email { user_id, .. } => *user_id,
        }
    }
}
