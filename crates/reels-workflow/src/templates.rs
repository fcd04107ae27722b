use reels_types::events::Intent;

use crate::proposal::{ProposalContext, ProposalEvent};

const SIGNATURE: &str = "<p>Best regards,<br><strong>Make me reels Team</strong></p>";

pub(crate) fn render(
    event: ProposalEvent,
    ctx: &ProposalContext,
    recipient: i64,
    email: bool,
) -> Vec<Intent> {
    let title = &ctx.order_title;
    let (notice, subject, body) = match event {
        ProposalEvent::Accept => (
            format!("Your proposal for \"{title}\" was accepted."),
            format!("Proposal accepted: \"{title}\""),
            "The client accepted your proposal. You can now request payment.",
        ),
        ProposalEvent::RequestPayment => (
            format!("The creator is waiting for payment for \"{title}\"."),
            format!("Payment requested: \"{title}\""),
            "The creator has requested payment for your order. Please log in to pay.",
        ),
        ProposalEvent::ConfirmPayment => (
            format!("Payment received for \"{title}\". You can start working."),
            format!("Payment received: \"{title}\""),
            "The client has paid for the order. You can upload the project when it is ready.",
        ),
        ProposalEvent::DeliverProject => (
            format!("Project files are ready for your order: \"{title}\"."),
            format!("Project Ready for Confirmation: \"{title}\""),
            "The creator has uploaded final project files for your order. Please log in to confirm or request changes.",
        ),
        ProposalEvent::ReviseProject => (
            format!("The project for \"{title}\" was updated."),
            format!("Project updated: \"{title}\""),
            "The creator has updated the project files. Please log in to review them.",
        ),
        ProposalEvent::ClientComment => (
            format!("Client requested improvements for \"{title}\""),
            format!("Improvements requested: \"{title}\""),
            "The client has requested improvements.",
        ),
        ProposalEvent::CreatorComment => (
            format!("Creator posted a new comment for \"{title}\""),
            format!("New comment: \"{title}\""),
            "The creator has posted a new comment.",
        ),
        ProposalEvent::Complete => (
            format!("The client marked \"{title}\" as complete."),
            format!("Order complete: \"{title}\""),
            "The client has confirmed the project. Thank you for your work!",
        ),
    };

    let mut intents = vec![Intent::Notify {
        user_id: recipient,
        message: notice,
    }];

    if email {
        intents.push(Intent::Email {
            user_id: recipient,
            subject,
            html: html_body(title, body),
        });
    }

    intents
}

pub(crate) fn proposal_submitted(order_title: &str, client_id: i64, creator_name: &str) -> Vec<Intent> {
    vec![
        Intent::Notify {
            user_id: client_id,
            message: format!("{creator_name} submitted a proposal for \"{order_title}\"."),
        },
        Intent::Email {
            user_id: client_id,
            subject: format!("New proposal: \"{order_title}\""),
            html: html_body(
                order_title,
                &format!("{} has submitted a proposal. Please log in to review it.", escape(creator_name)),
            ),
        },
    ]
}

fn html_body(title: &str, body: &str) -> String {
    format!(
        "<p>Hello,</p><p>Order: <strong>{}</strong></p><p>{}</p>{}",
        escape(title),
        body,
        SIGNATURE
    )
}

/// Minimal HTML escaping for user-supplied text placed into email bodies.
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn titles_are_escaped_in_email_bodies() {
        let intents = proposal_submitted("<b>Reel</b>", 1, "Ann & co");
        let Intent::Email { html, .. } = &intents[1] else {
            panic!("expected email intent");
        };
        assert!(html.contains("&lt;b&gt;Reel&lt;/b&gt;"));
        assert!(html.contains("Ann &amp; co"));
    }
}
