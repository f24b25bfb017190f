//! Outbound delivery seam
//!
//! The scheduler and fanout only ever talk to a [`Notifier`]; the Discord
//! implementation lives in [`super::discord`] and tests substitute a
//! recording mock.

use crate::core::error::SendError;
use async_trait::async_trait;

/// The composed reminder for one event, ready for delivery
#[derive(Debug, Clone, PartialEq)]
pub struct ReminderMessage {
    /// Announce text plus the formatted start time
    pub text: String,

    /// Optional image shown with the text
    pub image_url: Option<String>,
}

/// Capability to deliver one message to one recipient
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver `message` to the recipient, classifying any failure as
    /// permanently unreachable or transient.
    async fn send(&self, recipient_id: &str, message: &ReminderMessage) -> Result<(), SendError>;
}

#[cfg(test)]
pub mod testing {
    //! Recording notifier shared by the delivery, scheduler, and service tests.

    use super::*;
    use std::collections::HashSet;
    use std::sync::Mutex;

    /// Records every send and fails configured recipients
    #[derive(Default)]
    pub struct RecordingNotifier {
        sent: Mutex<Vec<(String, ReminderMessage)>>,
        unreachable: Mutex<HashSet<String>>,
        transient: Mutex<HashSet<String>>,
    }

    impl RecordingNotifier {
        pub fn new() -> Self {
            Self::default()
        }

        /// Make sends to `recipient` fail as permanently unreachable
        pub fn mark_unreachable(&self, recipient: &str) {
            self.unreachable.lock().unwrap().insert(recipient.to_string());
        }

        /// Make sends to `recipient` fail transiently
        pub fn mark_transient(&self, recipient: &str) {
            self.transient.lock().unwrap().insert(recipient.to_string());
        }

        /// Every attempted send, in order, including failed ones
        pub fn attempts(&self) -> Vec<(String, ReminderMessage)> {
            self.sent.lock().unwrap().clone()
        }

        /// Recipients of attempted sends, in order
        pub fn recipients(&self) -> Vec<String> {
            self.attempts().into_iter().map(|(id, _)| id).collect()
        }

        pub fn attempt_count(&self) -> usize {
            self.sent.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn send(
            &self,
            recipient_id: &str,
            message: &ReminderMessage,
        ) -> Result<(), SendError> {
            self.sent
                .lock()
                .unwrap()
                .push((recipient_id.to_string(), message.clone()));
            if self.unreachable.lock().unwrap().contains(recipient_id) {
                return Err(SendError::Unreachable("marked unreachable".to_string()));
            }
            if self.transient.lock().unwrap().contains(recipient_id) {
                return Err(SendError::Transient("marked transient".to_string()));
            }
            Ok(())
        }
    }

    // The trait must stay object-safe; the scheduler holds an Arc<dyn Notifier>
    fn _assert_object_safe(_: &dyn Notifier) {}
}
