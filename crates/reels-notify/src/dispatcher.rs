use std::sync::Arc;

use tracing::{debug, error, warn};

use reels_db::{Database, notifications, users};
use reels_types::events::Intent;

use crate::mailer::Mailer;

/// Executes workflow intents once the state change that produced them has
/// been committed.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<DispatcherInner>,
}

struct DispatcherInner {
    db: Arc<Database>,
    mailer: Arc<dyn Mailer>,
}

impl Dispatcher {
    pub fn new(db: Arc<Database>, mailer: Arc<dyn Mailer>) -> Self {
        Self {
            inner: Arc::new(DispatcherInner { db, mailer }),
        }
    }

    /// Writes notification rows before returning; emails are handed to a
    /// background task. Failures are logged and never reach the caller.
    pub async fn dispatch(&self, intents: Vec<Intent>) {
        let mut notices = Vec::new();
        for intent in intents {
            match intent {
                Intent::Notify { user_id, message } => notices.push((user_id, message)),
                Intent::Email {
                    user_id,
                    subject,
                    html,
                } => self.spawn_email(user_id, subject, html),
            }
        }

        if notices.is_empty() {
            return;
        }

        let db = self.inner.db.clone();
        let written = tokio::task::spawn_blocking(move || {
            db.with_conn(|conn| {
                for (user_id, message) in &notices {
                    notifications::insert(conn, *user_id, message)?;
                }
                Ok(notices.len())
            })
        })
        .await;

        match written {
            Ok(Ok(count)) => debug!("Stored {} notification(s)", count),
            Ok(Err(e)) => warn!("Failed to store notifications: {}", e),
            Err(e) => error!("spawn_blocking join error: {}", e),
        }
    }

    fn spawn_email(&self, user_id: i64, subject: String, html: String) {
        let inner = self.inner.clone();
        tokio::spawn(async move {
            let db = inner.db.clone();
            let user = tokio::task::spawn_blocking(move || db.with_conn(|conn| users::by_id(conn, user_id))).await;

            let address = match user {
                Ok(Ok(Some(user))) => user.email,
                Ok(Ok(None)) => {
                    warn!("Email for unknown user {} dropped", user_id);
                    return;
                }
                Ok(Err(e)) => {
                    warn!("Failed to look up email for user {}: {}", user_id, e);
                    return;
                }
                Err(e) => {
                    error!("spawn_blocking join error: {}", e);
                    return;
                }
            };

            if let Err(e) = inner.mailer.send(&address, &subject, &html).await {
                warn!("Error sending email to {}: {}", address, e);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use reels_types::models::Role;

    use super::*;
    use crate::mailer::MailError;

    #[derive(Default)]
    struct RecordingMailer {
        sent: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, to: &str, subject: &str, _html: &str) -> Result<(), MailError> {
            self.sent.lock().unwrap().push((to.to_string(), subject.to_string()));
            Ok(())
        }
    }

    struct FailingMailer;

    #[async_trait]
    impl Mailer for FailingMailer {
        async fn send(&self, _to: &str, _subject: &str, _html: &str) -> Result<(), MailError> {
            Err(MailError::Rejected { status: 503 })
        }
    }

    fn db_with_user() -> (Arc<Database>, i64) {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let id = db
            .with_conn(|conn| users::insert(conn, "Ann", "ann@example.com", "h", Role::Client, None))
            .unwrap();
        (db, id)
    }

    #[tokio::test]
    async fn stores_notifications_and_sends_email() {
        let (db, ann) = db_with_user();
        let mailer = Arc::new(RecordingMailer::default());
        let dispatcher = Dispatcher::new(db.clone(), mailer.clone());

        dispatcher
            .dispatch(vec![
                Intent::Notify { user_id: ann, message: "hello".into() },
                Intent::Email { user_id: ann, subject: "Hi".into(), html: "<p>hi</p>".into() },
            ])
            .await;

        let inbox = db.with_conn(|conn| notifications::list(conn, ann)).unwrap();
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].message, "hello");

        for _ in 0..100 {
            if !mailer.sent.lock().unwrap().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        let sent = mailer.sent.lock().unwrap().clone();
        assert_eq!(sent, vec![("ann@example.com".to_string(), "Hi".to_string())]);
    }

    #[tokio::test]
    async fn mail_failure_does_not_affect_notifications() {
        let (db, ann) = db_with_user();
        let dispatcher = Dispatcher::new(db.clone(), Arc::new(FailingMailer));

        dispatcher
            .dispatch(vec![
                Intent::Email { user_id: ann, subject: "Hi".into(), html: String::new() },
                Intent::Notify { user_id: ann, message: "still here".into() },
            ])
            .await;

        let inbox = db.with_conn(|conn| notifications::list(conn, ann)).unwrap();
        assert_eq!(inbox.len(), 1);
    }
}
