use reels_types::models::{OrderStatus, ProposalStatus, Role};
use thiserror::Error;

use crate::proposal::ProposalEvent;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    #[error("Cannot {event} a proposal that is '{from}'")]
    InvalidTransition {
        from: ProposalStatus,
        event: ProposalEvent,
    },

    #[error("Order {order_id} is '{status}'")]
    OrderNotActive { order_id: i64, status: OrderStatus },

    #[error("Unable to cancel order. Either the order does not exist or is already closed.")]
    OrderClosed { order_id: i64, status: OrderStatus },

    #[error("Status '{0}' cannot be set directly")]
    UnsupportedStatus(ProposalStatus),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    #[error("Access denied. Not a {required}.")]
    WrongRole { required: Role },

    #[error("Access denied. You do not own this resource.")]
    NotOwner,

    #[error("Access denied. You are not a party to this proposal.")]
    NotParty,
}
