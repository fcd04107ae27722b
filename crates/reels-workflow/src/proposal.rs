use std::fmt;

use reels_types::events::Intent;
use reels_types::models::{OrderStatus, ProposalStatus};

use crate::Party;
use crate::error::WorkflowError;
use crate::templates;

use ProposalStatus::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProposalEvent {
    Accept,
    RequestPayment,
    ConfirmPayment,
    DeliverProject,
    ReviseProject,
    ClientComment,
    CreatorComment,
    Complete,
}

impl fmt::Display for ProposalEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self {
            Self::Accept => "accept",
            Self::RequestPayment => "request payment for",
            Self::ConfirmPayment => "confirm payment for",
            Self::DeliverProject => "deliver a project for",
            Self::ReviseProject => "revise the project of",
            Self::ClientComment | Self::CreatorComment => "comment on",
            Self::Complete => "complete",
        };
        f.write_str(verb)
    }
}

impl ProposalEvent {
    /// Maps a status requested through the status endpoint to the event that
    /// produces it. Statuses driven by project uploads and comments are not
    /// directly settable.
    pub fn for_target(target: ProposalStatus) -> Result<Self, WorkflowError> {
        match target {
            Accepted => Ok(Self::Accept),
            WaitingForPayment => Ok(Self::RequestPayment),
            Payed => Ok(Self::ConfirmPayment),
            Complete => Ok(Self::Complete),
            other => Err(WorkflowError::UnsupportedStatus(other)),
        }
    }

    pub fn comment_by(party: Party) -> Self {
        match party {
            Party::Client => Self::ClientComment,
            Party::Creator => Self::CreatorComment,
        }
    }

    /// The side of the proposal allowed to raise this event.
    pub fn actor(&self) -> Party {
        rule(*self).actor
    }
}

/// Snapshot of a proposal and its order, loaded inside the transaction that
/// will apply the resulting step.
#[derive(Debug, Clone, PartialEq)]
pub struct ProposalContext {
    pub proposal_id: i64,
    pub status: ProposalStatus,
    pub order_id: i64,
    pub order_title: String,
    pub order_status: OrderStatus,
    pub client_id: i64,
    pub creator_id: i64,
}

impl ProposalContext {
    pub fn party_id(&self, party: Party) -> i64 {
        match party {
            Party::Client => self.client_id,
            Party::Creator => self.creator_id,
        }
    }
}

/// One row of the transition table.
struct Rule {
    from: &'static [ProposalStatus],
    to: ProposalStatus,
    actor: Party,
    order_requires: OrderStatus,
    order_becomes: Option<OrderStatus>,
    email: bool,
}

static ACCEPT: Rule = Rule {
    from: &[Pending],
    to: Accepted,
    actor: Party::Client,
    order_requires: OrderStatus::Open,
    order_becomes: Some(OrderStatus::InProgress),
    email: true,
};

static REQUEST_PAYMENT: Rule = Rule {
    from: &[Accepted],
    to: WaitingForPayment,
    actor: Party::Creator,
    order_requires: OrderStatus::InProgress,
    order_becomes: None,
    email: true,
};

static CONFIRM_PAYMENT: Rule = Rule {
    from: &[Accepted, WaitingForPayment],
    to: Payed,
    actor: Party::Client,
    order_requires: OrderStatus::InProgress,
    order_becomes: None,
    email: true,
};

static DELIVER_PROJECT: Rule = Rule {
    from: &[Payed],
    to: ProjectReadyForConfirmation,
    actor: Party::Creator,
    order_requires: OrderStatus::InProgress,
    order_becomes: None,
    email: true,
};

static REVISE_PROJECT: Rule = Rule {
    from: &[ProjectReadyForConfirmation, NeedImprovements],
    to: ProjectReadyForConfirmation,
    actor: Party::Creator,
    order_requires: OrderStatus::InProgress,
    order_becomes: None,
    email: true,
};

static CLIENT_COMMENT: Rule = Rule {
    from: &[ProjectReadyForConfirmation, NeedImprovements],
    to: NeedImprovements,
    actor: Party::Client,
    order_requires: OrderStatus::InProgress,
    order_becomes: None,
    email: false,
};

static CREATOR_COMMENT: Rule = Rule {
    from: &[ProjectReadyForConfirmation, NeedImprovements],
    to: ProjectReadyForConfirmation,
    actor: Party::Creator,
    order_requires: OrderStatus::InProgress,
    order_becomes: None,
    email: false,
};

static COMPLETE: Rule = Rule {
    from: &[ProjectReadyForConfirmation],
    to: Complete,
    actor: Party::Client,
    order_requires: OrderStatus::InProgress,
    order_becomes: None,
    email: true,
};

fn rule(event: ProposalEvent) -> &'static Rule {
    match event {
        ProposalEvent::Accept => &ACCEPT,
        ProposalEvent::RequestPayment => &REQUEST_PAYMENT,
        ProposalEvent::ConfirmPayment => &CONFIRM_PAYMENT,
        ProposalEvent::DeliverProject => &DELIVER_PROJECT,
        ProposalEvent::ReviseProject => &REVISE_PROJECT,
        ProposalEvent::ClientComment => &CLIENT_COMMENT,
        ProposalEvent::CreatorComment => &CREATOR_COMMENT,
        ProposalEvent::Complete => &COMPLETE,
    }
}

/// Outcome of a legal transition.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub event: ProposalEvent,
    pub from: ProposalStatus,
    pub to: ProposalStatus,
    /// New order status to write alongside the proposal, if any.
    pub order_status: Option<OrderStatus>,
    pub intents: Vec<Intent>,
}

impl Step {
    pub fn changes_status(&self) -> bool {
        self.from != self.to
    }
}

/// Evaluates `event` against the current state.
pub fn apply(ctx: &ProposalContext, event: ProposalEvent) -> Result<Step, WorkflowError> {
    let rule = rule(event);

    if !rule.from.contains(&ctx.status) {
        return Err(WorkflowError::InvalidTransition {
            from: ctx.status,
            event,
        });
    }

    if ctx.order_status != rule.order_requires {
        return Err(WorkflowError::OrderNotActive {
            order_id: ctx.order_id,
            status: ctx.order_status,
        });
    }

    let recipient = match rule.actor {
        Party::Client => Party::Creator,
        Party::Creator => Party::Client,
    };

    Ok(Step {
        event,
        from: ctx.status,
        to: rule.to,
        order_status: rule.order_becomes,
        intents: templates::render(event, ctx, ctx.party_id(recipient), rule.email),
    })
}

/// Moves the proposal to `target` through the status endpoint.
///
/// Returns `Ok(None)` when the proposal already holds `target`: the request
/// succeeds without a write or a notification.
pub fn request_status(
    ctx: &ProposalContext,
    target: ProposalStatus,
) -> Result<Option<Step>, WorkflowError> {
    let event = ProposalEvent::for_target(target)?;
    if ctx.status == target {
        return Ok(None);
    }
    apply(ctx, event).map(Some)
}

/// Intents raised when a creator submits a new proposal on an order.
pub fn submitted(order_title: &str, client_id: i64, creator_name: &str) -> Vec<Intent> {
    templates::proposal_submitted(order_title, client_id, creator_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reels_types::models::ProposalStatus::*;

    fn ctx(status: ProposalStatus, order_status: OrderStatus) -> ProposalContext {
        ProposalContext {
            proposal_id: 7,
            status,
            order_id: 3,
            order_title: "Promo reel".into(),
            order_status,
            client_id: 1,
            creator_id: 2,
        }
    }

    const EVENTS: [ProposalEvent; 8] = [
        ProposalEvent::Accept,
        ProposalEvent::RequestPayment,
        ProposalEvent::ConfirmPayment,
        ProposalEvent::DeliverProject,
        ProposalEvent::ReviseProject,
        ProposalEvent::ClientComment,
        ProposalEvent::CreatorComment,
        ProposalEvent::Complete,
    ];

    #[test]
    fn no_event_leaves_a_terminal_status() {
        for &status in ProposalStatus::ALL {
            for &order_status in OrderStatus::ALL {
                for event in EVENTS {
                    let result = apply(&ctx(status, order_status), event);
                    if status.is_terminal() {
                        assert!(result.is_err(), "{event:?} left {status}");
                    }
                    if let Ok(step) = result {
                        assert!(rule(event).from.contains(&step.from));
                        assert!(!step.from.is_terminal());
                    }
                }
            }
        }
        assert!(EVENTS.iter().any(|e| rule(*e).to.is_terminal()));
    }

    #[test]
    fn accept_moves_order_in_progress_and_notifies_creator() {
        let step = apply(&ctx(Pending, OrderStatus::Open), ProposalEvent::Accept).unwrap();
        assert_eq!(step.to, Accepted);
        assert_eq!(step.order_status, Some(OrderStatus::InProgress));
        assert!(step.intents.iter().all(|i| i.recipient() == 2));
        assert!(step.intents.iter().any(|i| matches!(i, Intent::Email { .. })));
    }

    #[test]
    fn accept_requires_open_order() {
        for status in [OrderStatus::Cancelled, OrderStatus::InProgress] {
            let err = apply(&ctx(Pending, status), ProposalEvent::Accept).unwrap_err();
            assert_eq!(err, WorkflowError::OrderNotActive { order_id: 3, status });
        }
    }

    #[test]
    fn later_events_require_order_in_progress() {
        let err = apply(&ctx(Accepted, OrderStatus::Cancelled), ProposalEvent::RequestPayment)
            .unwrap_err();
        assert!(matches!(err, WorkflowError::OrderNotActive { .. }));
    }

    #[test]
    fn skipping_states_is_rejected() {
        let err = apply(&ctx(Pending, OrderStatus::Open), ProposalEvent::ConfirmPayment).unwrap_err();
        assert_eq!(
            err,
            WorkflowError::InvalidTransition { from: Pending, event: ProposalEvent::ConfirmPayment }
        );

        let err = apply(&ctx(Payed, OrderStatus::InProgress), ProposalEvent::Complete).unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidTransition { .. }));
    }

    #[test]
    fn payment_may_skip_waiting_state() {
        let step = apply(&ctx(Accepted, OrderStatus::InProgress), ProposalEvent::ConfirmPayment)
            .unwrap();
        assert_eq!(step.to, Payed);
        assert_eq!(step.order_status, None);
    }

    #[test]
    fn comments_alternate_between_review_states() {
        let review = ctx(ProjectReadyForConfirmation, OrderStatus::InProgress);
        let step = apply(&review, ProposalEvent::ClientComment).unwrap();
        assert_eq!(step.to, NeedImprovements);
        assert_eq!(step.intents.len(), 1);
        assert_eq!(step.intents[0].recipient(), 2);

        let revising = ctx(NeedImprovements, OrderStatus::InProgress);
        let step = apply(&revising, ProposalEvent::CreatorComment).unwrap();
        assert_eq!(step.to, ProjectReadyForConfirmation);
        assert_eq!(step.intents[0].recipient(), 1);

        let step = apply(&revising, ProposalEvent::ClientComment).unwrap();
        assert!(!step.changes_status());
    }

    #[test]
    fn complete_is_terminal() {
        let done = ctx(Complete, OrderStatus::InProgress);
        for event in [ProposalEvent::ClientComment, ProposalEvent::ReviseProject, ProposalEvent::Complete] {
            assert!(apply(&done, event).is_err());
        }
    }

    #[test]
    fn requesting_current_status_is_a_no_op() {
        let accepted = ctx(Accepted, OrderStatus::InProgress);
        assert_eq!(request_status(&accepted, Accepted).unwrap(), None);

        let step = request_status(&accepted, WaitingForPayment).unwrap().unwrap();
        assert_eq!(step.event, ProposalEvent::RequestPayment);
    }

    #[test]
    fn review_states_cannot_be_requested_directly() {
        let paid = ctx(Payed, OrderStatus::InProgress);
        assert_eq!(
            request_status(&paid, NeedImprovements).unwrap_err(),
            WorkflowError::UnsupportedStatus(NeedImprovements)
        );
        assert!(request_status(&paid, Pending).is_err());
    }

    #[test]
    fn event_actors_follow_table() {
        assert_eq!(ProposalEvent::Accept.actor(), Party::Client);
        assert_eq!(ProposalEvent::RequestPayment.actor(), Party::Creator);
        assert_eq!(ProposalEvent::comment_by(Party::Creator).actor(), Party::Creator);
    }
}
