//! Delivery of workflow side effects: in-app notifications and email.

pub mod dispatcher;
pub mod mailer;

pub use dispatcher::Dispatcher;
pub use mailer::{HttpMailer, LogMailer, MailError, Mailer};
