// Moderation service - the entry point for every inbound message.
//
// For each event it:
// - Skips senders that are above moderation (owner, admins, left members)
// - Asks the classifier for a verdict
// - Deletes single messages right away, or hands album parts to the
//   group aggregator so the album is judged as a whole
//
// NO Telegram dependencies here - just pure domain logic.

use super::content_classifier::ContentClassifier;
use super::group_aggregator::GroupAggregator;
use super::moderation_models::{ChatKind, ModerationEvent, ModerationOutcome};
use super::transport::{delete_tolerant, ExemptionPolicy, ModerationTransport, TransportError};
use std::sync::Arc;
use std::time::Duration;

pub struct ModerationService<T: ModerationTransport, E: ExemptionPolicy> {
    classifier: ContentClassifier,
    aggregator: GroupAggregator<T>,
    transport: Arc<T>,
    exemptions: E,
    owner_id: Option<u64>,
}

impl<T: ModerationTransport, E: ExemptionPolicy> ModerationService<T, E> {
    pub fn new(
        classifier: ContentClassifier,
        transport: Arc<T>,
        exemptions: E,
        owner_id: Option<u64>,
        group_quiet_period: Duration,
    ) -> Self {
        Self {
            classifier,
            aggregator: GroupAggregator::new(Arc::clone(&transport), group_quiet_period),
            transport,
            exemptions,
            owner_id,
        }
    }

    /// Moderate one message.
    ///
    /// Never fails: deletion problems are logged and reported through the
    /// returned outcome.
    pub async fn handle(&self, event: &ModerationEvent) -> ModerationOutcome {
        if self.is_exempt(event).await {
            return ModerationOutcome::Exempt;
        }

        let verdict = self.classifier.classify_event(event);

        if let Some(key) = event.group_key() {
            let violation = verdict.is_violation();
            if violation {
                tracing::info!(
                    chat_id = event.chat_id,
                    message_id = event.message_id,
                    group = %key,
                    verdict = %verdict,
                    "Flagged media group part"
                );
            }
            // Clean parts are tracked too, in case a sibling turns out bad
            self.aggregator
                .register_part(key, event.message_id, violation);

            return ModerationOutcome::Deferred(verdict);
        }

        if !verdict.is_violation() {
            tracing::debug!(chat_id = event.chat_id, message_id = event.message_id, "Message is clean");
            return ModerationOutcome::Clean;
        }

        match delete_tolerant(self.transport.as_ref(), event.chat_id, event.message_id).await {
            Ok(()) => {
                tracing::info!(
                    chat_id = event.chat_id,
                    message_id = event.message_id,
                    sender_id = event.sender_id,
                    verdict = %verdict,
                    "Deleted message"
                );
                ModerationOutcome::Deleted(verdict)
            }
            Err(TransportError::Forbidden(reason)) => {
                tracing::warn!(
                    chat_id = event.chat_id,
                    message_id = event.message_id,
                    verdict = %verdict,
                    "Not allowed to delete message: {}",
                    reason
                );
                ModerationOutcome::DeleteFailed(verdict)
            }
            Err(e) => {
                tracing::error!(
                    chat_id = event.chat_id,
                    message_id = event.message_id,
                    verdict = %verdict,
                    "Failed to delete message: {}",
                    e
                );
                ModerationOutcome::DeleteFailed(verdict)
            }
        }
    }

    async fn is_exempt(&self, event: &ModerationEvent) -> bool {
        if event.anonymous_admin {
            return true;
        }

        let Some(sender_id) = event.sender_id else {
            return false;
        };

        if self.owner_id == Some(sender_id) {
            return true;
        }

        // Roles only mean something in groups
        if event.chat_kind == ChatKind::Private {
            return false;
        }

        match self
            .exemptions
            .is_exempt(sender_id, event.chat_id, event.chat_kind)
            .await
        {
            Ok(exempt) => exempt,
            Err(e) => {
                // Moderate anyway rather than let content through unchecked
                tracing::warn!(
                    chat_id = event.chat_id,
                    sender_id,
                    "Role lookup failed, moderating anyway: {}",
                    e
                );
                false
            }
        }
    }

    pub fn pending_groups(&self) -> usize {
        self.aggregator.pending_groups()
    }
}

// ============================================================================
// TESTS
// ============================================================================
