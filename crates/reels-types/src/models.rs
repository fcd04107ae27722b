use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Returned when a stored or submitted status string is not one of the known values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{value}'")]
pub struct ParseStatusError {
    pub kind: &'static str,
    pub value: String,
}

/// Declares a closed string-backed enum: the serde name and the database
/// value are the same canonical label.
macro_rules! labelled_enum {
    ($(#[$meta:meta])* $name:ident, $kind:literal { $($variant:ident => $label:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $label)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ParseStatusError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($label => Ok($name::$variant),)+
                    other => Err(ParseStatusError {
                        kind: $kind,
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

labelled_enum!(
    /// Account role, fixed at registration.
    Role, "role" {
        Client => "client",
        Creator => "creator",
    }
);

labelled_enum!(
    OrderStatus, "order status" {
        Open => "Open",
        InProgress => "In Progress",
        Cancelled => "Cancelled",
    }
);

labelled_enum!(
    /// Lifecycle of a creator's bid, from submission to sign-off.
    ProposalStatus, "proposal status" {
        Pending => "Pending",
        Accepted => "Accepted",
        WaitingForPayment => "Waiting for Payment",
        Payed => "Payed",
        ProjectReadyForConfirmation => "Project Ready for Confirmation",
        NeedImprovements => "Need improvements",
        Complete => "Complete",
    }
);

impl OrderStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Cancelled | OrderStatus::InProgress)
    }
}

impl ProposalStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProposalStatus::Complete)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub verified: bool,
    pub payment_account_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub user_id: i64,
    pub category_id: Option<i64>,
    pub title: String,
    pub description: String,
    pub budget: f64,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Order listing entry with the number of bids received so far.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderSummary {
    #[serde(flatten)]
    pub order: Order,
    pub proposal_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Proposal {
    pub id: i64,
    pub order_id: i64,
    pub creator_id: i64,
    pub message: String,
    pub proposed_price: f64,
    pub delivery_days: i64,
    pub status: ProposalStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Proposal as shown to the order owner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProposalWithCreator {
    #[serde(flatten)]
    pub proposal: Proposal,
    pub creator_name: String,
}

/// Proposal as shown to its creator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatorProposal {
    #[serde(flatten)]
    pub proposal: Proposal,
    pub order_title: String,
    pub project_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub proposal_id: i64,
    pub description: String,
    pub file_links: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectDetail {
    #[serde(flatten)]
    pub project: Project,
    pub proposal_status: ProposalStatus,
    pub order_id: i64,
    pub order_title: String,
    pub client_id: i64,
    pub creator_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Improvement {
    pub id: i64,
    pub project_id: i64,
    pub author_id: i64,
    pub author_name: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: i64,
    pub user_id: i64,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioItem {
    pub id: i64,
    pub user_id: i64,
    pub category_id: Option<i64>,
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub instagram_link: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_labels_round_trip_through_from_str() {
        for status in ProposalStatus::ALL {
            assert_eq!(status.as_str().parse::<ProposalStatus>().unwrap(), *status);
        }
        assert_eq!("In Progress".parse::<OrderStatus>().unwrap(), OrderStatus::InProgress);
    }

    #[test]
    fn serde_uses_canonical_labels() {
        let json = serde_json::to_string(&ProposalStatus::WaitingForPayment).unwrap();
        assert_eq!(json, "\"Waiting for Payment\"");

        let status: ProposalStatus = serde_json::from_str("\"Need improvements\"").unwrap();
        assert_eq!(status, ProposalStatus::NeedImprovements);
    }

    #[test]
    fn unknown_label_is_rejected() {
        let err = "Paid".parse::<ProposalStatus>().unwrap_err();
        assert_eq!(err.kind, "proposal status");
        assert!("admin".parse::<Role>().is_err());
    }
}
