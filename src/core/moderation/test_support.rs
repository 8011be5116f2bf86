// Test doubles shared by the moderation tests.

use super::moderation_models::ChatKind;
use super::transport::{ExemptionPolicy, ModerationTransport, TransportError};
use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub enum Failure {
    Forbidden,
    AlreadyGone,
    Request,
}

impl Failure {
    fn to_error(self, message_id: i32) -> TransportError {
        let detail = format!("message {}", message_id);
        match self {
            Failure::Forbidden => TransportError::Forbidden(detail),
            Failure::AlreadyGone => TransportError::AlreadyGone(detail),
            Failure::Request => TransportError::Request(detail),
        }
    }
}

/// Records every delete call; can be told to fail.
#[derive(Default)]
pub struct MockTransport {
    batch_calls: Mutex<Vec<(i64, Vec<i32>)>>,
    single_calls: Mutex<Vec<(i64, i32)>>,
    fail_batches: bool,
    failures: DashMap<i32, Failure>,
    batch_delay: Option<Duration>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_batches(mut self) -> Self {
        self.fail_batches = true;
        self
    }

    pub fn failing_message(self, message_id: i32, failure: Failure) -> Self {
        self.failures.insert(message_id, failure);
        self
    }

    pub fn with_batch_delay(mut self, delay: Duration) -> Self {
        self.batch_delay = Some(delay);
        self
    }

    pub fn batch_calls(&self) -> Vec<(i64, Vec<i32>)> {
        self.batch_calls.lock().unwrap().clone()
    }

    pub fn single_calls(&self) -> Vec<(i64, i32)> {
        self.single_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModerationTransport for MockTransport {
    async fn delete_message(&self, chat_id: i64, message_id: i32) -> Result<(), TransportError> {
        self.single_calls.lock().unwrap().push((chat_id, message_id));
        match self.failures.get(&message_id) {
            Some(failure) => Err(failure.to_error(message_id)),
            None => Ok(()),
        }
    }

    async fn delete_messages(
        &self,
        chat_id: i64,
        message_ids: &[i32],
    ) -> Result<(), TransportError> {
        self.batch_calls
            .lock()
            .unwrap()
            .push((chat_id, message_ids.to_vec()));

        if let Some(delay) = self.batch_delay {
            tokio::time::sleep(delay).await;
        }

        if self.fail_batches {
            Err(TransportError::Request("batch rejected".to_string()))
        } else {
            Ok(())
        }
    }
}

/// Exempts a fixed set of user ids; can simulate a failing role lookup.
#[derive(Default)]
pub struct MockExemptions {
    exempt: DashSet<u64>,
    lookups: Mutex<Vec<(u64, i64)>>,
    broken: bool,
}

impl MockExemptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn exempting(self, user_id: u64) -> Self {
        self.exempt.insert(user_id);
        self
    }

    pub fn broken(mut self) -> Self {
        self.broken = true;
        self
    }

    pub fn lookups(&self) -> Vec<(u64, i64)> {
        self.lookups.lock().unwrap().clone()
    }
}

#[async_trait]
impl ExemptionPolicy for MockExemptions {
    async fn is_exempt(
        &self,
        sender_id: u64,
        chat_id: i64,
        _chat_kind: ChatKind,
    ) -> Result<bool, TransportError> {
        self.lookups.lock().unwrap().push((sender_id, chat_id));
        if self.broken {
            return Err(TransportError::Request("lookup failed".to_string()));
        }
        Ok(self.exempt.contains(&sender_id))
    }
}
