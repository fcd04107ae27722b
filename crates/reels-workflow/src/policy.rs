//! Authorization: the one place that decides whether an actor may perform an
//! action on a resource. Handlers call [`authorize`] before every mutation.

use reels_types::models::Role;

use crate::error::PolicyError;
use crate::proposal::ProposalEvent;
use crate::{Actor, Party};

/// What is being acted on, reduced to the ids that matter for access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    /// Collections and singletons with no owner (new orders, categories, own account)
    Global,
    Order { owner_id: i64 },
    Proposal { client_id: i64, creator_id: i64 },
    Project { client_id: i64, creator_id: i64 },
    PortfolioItem { owner_id: i64 },
    Notification { recipient_id: i64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    CreateOrder,
    CancelOrder,
    ListProposals,
    SubmitProposal,
    Transition(ProposalEvent),
    Checkout,
    ViewProject,
    Comment,
    CreatePortfolio,
    EditPortfolio,
    ManagePaymentAccount,
    ManageCategories,
    ReadNotification,
}

enum Relation {
    Anyone,
    Owner,
    AnyParty,
    Party(Party),
}

impl Action {
    fn required_role(&self) -> Option<Role> {
        match self {
            Self::CreateOrder => Some(Role::Client),
            Self::SubmitProposal
            | Self::CreatePortfolio
            | Self::EditPortfolio
            | Self::ManagePaymentAccount => Some(Role::Creator),
            _ => None,
        }
    }

    fn relation(&self) -> Relation {
        match self {
            Self::CreateOrder
            | Self::SubmitProposal
            | Self::CreatePortfolio
            | Self::ManagePaymentAccount
            | Self::ManageCategories => Relation::Anyone,
            Self::CancelOrder | Self::ListProposals | Self::EditPortfolio | Self::ReadNotification => {
                Relation::Owner
            }
            Self::ViewProject | Self::Comment => Relation::AnyParty,
            Self::Checkout => Relation::Party(Party::Client),
            Self::Transition(event) => Relation::Party(event.actor()),
        }
    }
}

/// Which side of a proposal or project the actor is on, if any.
pub fn party_of(actor: &Actor, resource: &Resource) -> Option<Party> {
    match *resource {
        Resource::Proposal { client_id, creator_id } | Resource::Project { client_id, creator_id } => {
            if actor.user_id == client_id {
                Some(Party::Client)
            } else if actor.user_id == creator_id {
                Some(Party::Creator)
            } else {
                None
            }
        }
        _ => None,
    }
}

fn owns(actor: &Actor, resource: &Resource) -> bool {
    match *resource {
        Resource::Order { owner_id }
        | Resource::PortfolioItem { owner_id }
        | Resource::Notification { recipient_id: owner_id } => actor.user_id == owner_id,
        _ => false,
    }
}

pub fn authorize(actor: &Actor, resource: &Resource, action: Action) -> Result<(), PolicyError> {
    if let Some(required) = action.required_role() {
        if actor.role != required {
            return Err(PolicyError::WrongRole { required });
        }
    }

    match action.relation() {
        Relation::Anyone => Ok(()),
        Relation::Owner if owns(actor, resource) => Ok(()),
        Relation::Owner => Err(PolicyError::NotOwner),
        Relation::AnyParty => party_of(actor, resource).map(|_| ()).ok_or(PolicyError::NotParty),
        Relation::Party(party) if party_of(actor, resource) == Some(party) => Ok(()),
        Relation::Party(_) => Err(PolicyError::NotParty),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLIENT: Actor = Actor { user_id: 1, role: Role::Client };
    const CREATOR: Actor = Actor { user_id: 2, role: Role::Creator };
    const STRANGER: Actor = Actor { user_id: 9, role: Role::Creator };
    const PROPOSAL: Resource = Resource::Proposal { client_id: 1, creator_id: 2 };

    #[test]
    fn roles_gate_creation() {
        assert!(authorize(&CLIENT, &Resource::Global, Action::CreateOrder).is_ok());
        assert_eq!(
            authorize(&CREATOR, &Resource::Global, Action::CreateOrder),
            Err(PolicyError::WrongRole { required: Role::Client })
        );
        assert_eq!(
            authorize(&CLIENT, &Resource::Global, Action::SubmitProposal),
            Err(PolicyError::WrongRole { required: Role::Creator })
        );
    }

    #[test]
    fn only_owner_cancels() {
        let order = Resource::Order { owner_id: 1 };
        assert!(authorize(&CLIENT, &order, Action::CancelOrder).is_ok());
        assert_eq!(authorize(&CREATOR, &order, Action::CancelOrder), Err(PolicyError::NotOwner));
    }

    #[test]
    fn transitions_follow_table_parties() {
        assert!(authorize(&CLIENT, &PROPOSAL, Action::Transition(ProposalEvent::Accept)).is_ok());
        assert_eq!(
            authorize(&CREATOR, &PROPOSAL, Action::Transition(ProposalEvent::Accept)),
            Err(PolicyError::NotParty)
        );
        assert!(authorize(&CREATOR, &PROPOSAL, Action::Transition(ProposalEvent::RequestPayment)).is_ok());
        assert_eq!(
            authorize(&STRANGER, &PROPOSAL, Action::Transition(ProposalEvent::DeliverProject)),
            Err(PolicyError::NotParty)
        );
    }

    #[test]
    fn both_parties_may_comment() {
        let project = Resource::Project { client_id: 1, creator_id: 2 };
        assert!(authorize(&CLIENT, &project, Action::Comment).is_ok());
        assert!(authorize(&CREATOR, &project, Action::Comment).is_ok());
        assert_eq!(authorize(&STRANGER, &project, Action::Comment), Err(PolicyError::NotParty));
        assert_eq!(party_of(&CREATOR, &project), Some(Party::Creator));
    }

    #[test]
    fn checkout_is_for_the_paying_client() {
        assert!(authorize(&CLIENT, &PROPOSAL, Action::Checkout).is_ok());
        assert!(authorize(&CREATOR, &PROPOSAL, Action::Checkout).is_err());
    }
}
