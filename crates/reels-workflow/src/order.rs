use reels_types::models::OrderStatus;

use crate::error::WorkflowError;

/// Client-driven order events. Moving an order to `In Progress` happens only
/// as the effect of accepting one of its proposals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderEvent {
    Cancel,
}

pub fn apply(order_id: i64, current: OrderStatus, event: OrderEvent) -> Result<OrderStatus, WorkflowError> {
    if current.is_terminal() {
        return Err(WorkflowError::OrderClosed { order_id, status: current });
    }
    match event {
        OrderEvent::Cancel => Ok(OrderStatus::Cancelled),
    }
}

/// New proposals are only taken while the order is open.
pub fn accepts_proposals(order_id: i64, status: OrderStatus) -> Result<(), WorkflowError> {
    match status {
        OrderStatus::Open => Ok(()),
        status => Err(WorkflowError::OrderNotActive { order_id, status }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_open_orders_cancel() {
        assert_eq!(apply(1, OrderStatus::Open, OrderEvent::Cancel), Ok(OrderStatus::Cancelled));

        for status in OrderStatus::ALL.iter().copied().filter(OrderStatus::is_terminal) {
            assert_eq!(
                apply(1, status, OrderEvent::Cancel),
                Err(WorkflowError::OrderClosed { order_id: 1, status })
            );
        }
    }

    #[test]
    fn closed_orders_reject_proposals() {
        assert!(accepts_proposals(4, OrderStatus::Open).is_ok());
        assert!(accepts_proposals(4, OrderStatus::InProgress).is_err());
        assert!(accepts_proposals(4, OrderStatus::Cancelled).is_err());
    }
}
