//! Notification dispatch
//!
//! The core hands finished notification payloads to a queue and moves
//! on; dispatch itself is the unit of success. Delivery, retries, and
//! templating belong to whatever worker drains the queue.

use serde::Serialize;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// One queued notification.
#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    /// Recipient population ("nurse", "client", "staff", ...).
    pub model: String,
    /// Recipient row id; `None` broadcasts to the population's inbox.
    pub recipient: Option<i64>,
    /// Delivery channel ("email", "push", ...).
    pub messenger: String,
    pub subject: String,
    /// Template the worker renders the body from.
    pub body_template: String,
    /// Template context.
    pub context: Value,
}

/// Fire-and-forget notification sink.
#[derive(Debug, Clone)]
pub enum Notifier {
    /// Drops notifications after logging them. Used when no worker is
    /// attached (tests, one-off tooling).
    Null,
    /// Queues notifications for an external worker.
    Channel(mpsc::UnboundedSender<Notification>),
}

impl Notifier {
    /// Create a channel-backed notifier plus the receiving end for the
    /// worker (or a test) to drain.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::Channel(tx), rx)
    }

    /// Dispatch a notification. Never fails and never blocks the
    /// request path; a closed queue is logged and dropped.
    pub fn dispatch(&self, notification: Notification) {
        match self {
            Notifier::Null => {
                debug!(
                    model = %notification.model,
                    messenger = %notification.messenger,
                    subject = %notification.subject,
                    "notification dropped (null notifier)"
                );
            }
            Notifier::Channel(tx) => {
                if tx.send(notification).is_err() {
                    warn!("notification queue receiver is gone; dropping notification");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn channel_notifier_enqueues() {
        let (notifier, mut rx) = Notifier::channel();

        notifier.dispatch(Notification {
            model: "nurse".to_string(),
            recipient: Some(3),
            messenger: "email".to_string(),
            subject: "Activate your account".to_string(),
            body_template: "nurse_set_password".to_string(),
            context: json!({"email": "nina@example.com"}),
        });

        let queued = rx.recv().await.unwrap();
        assert_eq!(queued.recipient, Some(3));
        assert_eq!(queued.body_template, "nurse_set_password");
    }

    #[tokio::test]
    async fn dispatch_survives_a_dropped_receiver() {
        let (notifier, rx) = Notifier::channel();
        drop(rx);

        notifier.dispatch(Notification {
            model: "staff".to_string(),
            recipient: None,
            messenger: "email".to_string(),
            subject: "New account".to_string(),
            body_template: "generic_body".to_string(),
            context: json!({}),
        });
    }
}
