// Grouped submission (album) handling.
//
// Telegram delivers each part of an album as its own message, with no
// guarantee about timing or which part carries the caption. We collect
// every part under its group key, and the first part arms a single timer.
// When the quiet window closes, the whole album is deleted in one batch if
// any part was flagged, otherwise it's just forgotten.
//
// States per key: Absent -> Open -> Closed (entry removed, key reusable).

use super::moderation_models::GroupKey;
use super::transport::{delete_tolerant, ModerationTransport};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

/// Telegram's `deleteMessages` accepts at most 100 ids per call.
pub const MAX_BATCH_SIZE: usize = 100;

#[derive(Debug)]
struct GroupState {
    members: BTreeSet<i32>,
    /// Only ever goes from false to true
    deletion_required: bool,
    timer_armed: bool,
    created_at: DateTime<Utc>,
}

impl GroupState {
    fn new() -> Self {
        Self {
            members: BTreeSet::new(),
            deletion_required: false,
            timer_armed: false,
            created_at: Utc::now(),
        }
    }
}

/// Result of deleting a batch of messages.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchReport {
    pub deleted: usize,
    pub failed: usize,
}

pub struct GroupAggregator<T: ModerationTransport> {
    groups: Arc<DashMap<GroupKey, GroupState>>,
    transport: Arc<T>,
    quiet_period: Duration,
}

impl<T: ModerationTransport> GroupAggregator<T> {
    pub fn new(transport: Arc<T>, quiet_period: Duration) -> Self {
        Self {
            groups: Arc::new(DashMap::new()),
            transport,
            quiet_period,
        }
    }

    /// Record one part of a group.
    ///
    /// Returns `true` if this call armed the group's timer. All mutation
    /// happens under the map entry lock, so two parts racing to be "first"
    /// still arm exactly one timer.
    pub fn register_part(&self, key: GroupKey, message_id: i32, violation: bool) -> bool {
        let arm_timer = {
            let mut state = self.groups.entry(key.clone()).or_insert_with(GroupState::new);
            state.members.insert(message_id);
            state.deletion_required |= violation;

            if state.timer_armed {
                false
            } else {
                state.timer_armed = true;
                true
            }
        };

        if arm_timer {
            tracing::debug!(group = %key, quiet_ms = self.quiet_period.as_millis() as u64, "Group timer armed");

            let groups = Arc::clone(&self.groups);
            let transport = Arc::clone(&self.transport);
            let quiet_period = self.quiet_period;
            tokio::spawn(async move {
                tokio::time::sleep(quiet_period).await;
                close_group(groups, transport, key).await;
            });
        }

        arm_timer
    }

    /// Number of groups still waiting for their timer.
    pub fn pending_groups(&self) -> usize {
        self.groups.len()
    }

    #[cfg(test)]
    pub fn is_pending(&self, key: &GroupKey) -> bool {
        self.groups.contains_key(key)
    }
}

/// Timer callback: delete the group if needed, then drop its state.
async fn close_group<T: ModerationTransport>(
    groups: Arc<DashMap<GroupKey, GroupState>>,
    transport: Arc<T>,
    key: GroupKey,
) {
    // Copy out under the lock; never hold a map guard across an await
    let snapshot = groups
        .get(&key)
        .map(|state| (state.members.clone(), state.deletion_required, state.created_at));

    let Some((members, deletion_required, created_at)) = snapshot else {
        return;
    };

    let attempted = if deletion_required {
        let ids: Vec<i32> = members.iter().copied().collect();
        let report = delete_batch(transport.as_ref(), key.chat_id, &ids).await;
        tracing::info!(
            group = %key,
            deleted = report.deleted,
            failed = report.failed,
            age_ms = (Utc::now() - created_at).num_milliseconds(),
            "Deleted flagged media group"
        );
        members
    } else {
        tracing::debug!(group = %key, parts = members.len(), "Media group closed clean");
        BTreeSet::new()
    };

    // The state outlives the deletion call so parts arriving meanwhile still
    // land here; sweep them up now.
    if let Some((_, state)) = groups.remove(&key) {
        if state.deletion_required {
            let late: Vec<i32> = state.members.difference(&attempted).copied().collect();
            if !late.is_empty() {
                let report = delete_batch(transport.as_ref(), key.chat_id, &late).await;
                tracing::info!(
                    group = %key,
                    deleted = report.deleted,
                    failed = report.failed,
                    "Deleted late media group parts"
                );
            }
        }
    }
}

/// Delete messages in batches, falling back to one-by-one when a batch fails.
///
/// A failure on one message never stops the rest.
pub async fn delete_batch<T: ModerationTransport + ?Sized>(
    transport: &T,
    chat_id: i64,
    message_ids: &[i32],
) -> BatchReport {
    let mut report = BatchReport::default();

    for chunk in message_ids.chunks(MAX_BATCH_SIZE) {
        match transport.delete_messages(chat_id, chunk).await {
            Ok(()) => report.deleted += chunk.len(),
            Err(e) => {
                tracing::warn!(
                    chat_id,
                    count = chunk.len(),
                    "Batch delete failed ({}), deleting one by one",
                    e
                );

                for &message_id in chunk {
                    match delete_tolerant(transport, chat_id, message_id).await {
                        Ok(()) => report.deleted += 1,
                        Err(e) => {
                            tracing::warn!(chat_id, message_id, "Failed to delete message: {}", e);
                            report.failed += 1;
                        }
                    }
                }
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::moderation::test_support::{Failure, MockTransport};

    const QUIET: Duration = Duration::from_secs(3);

    fn key(group: &str) -> GroupKey {
        GroupKey {
            chat_id: -100,
            group_id: group.to_string(),
        }
    }

    async fn after_window() {
        tokio::time::sleep(QUIET + Duration::from_millis(500)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_only_first_part_arms_timer() {
        let transport = Arc::new(MockTransport::new());
        let agg = GroupAggregator::new(Arc::clone(&transport), QUIET);

        assert!(agg.register_part(key("g"), 1, false));
        assert!(!agg.register_part(key("g"), 2, false));
        assert!(!agg.register_part(key("g"), 3, true));
        // A different group gets its own timer
        assert!(agg.register_part(key("h"), 4, false));
        assert_eq!(agg.pending_groups(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_racing_first_parts_arm_one_timer() {
        let transport = Arc::new(MockTransport::new());
        let agg = Arc::new(GroupAggregator::new(
            Arc::clone(&transport),
            Duration::from_secs(600),
        ));

        let mut tasks = Vec::new();
        for id in 0..64 {
            let agg = Arc::clone(&agg);
            tasks.push(tokio::spawn(async move {
                agg.register_part(key("race"), id, id == 10)
            }));
        }

        let mut armed = 0;
        for task in tasks {
            if task.await.unwrap() {
                armed += 1;
            }
        }

        assert_eq!(armed, 1);
        assert_eq!(agg.pending_groups(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_violation_on_middle_part_deletes_whole_group() {
        let transport = Arc::new(MockTransport::new());
        let agg = GroupAggregator::new(Arc::clone(&transport), QUIET);

        agg.register_part(key("g"), 11, false);
        tokio::time::sleep(Duration::from_millis(200)).await;
        agg.register_part(key("g"), 12, true);
        tokio::time::sleep(Duration::from_millis(200)).await;
        agg.register_part(key("g"), 13, false);

        // Nothing happens before the window closes
        assert!(transport.batch_calls().is_empty());

        after_window().await;

        assert_eq!(transport.batch_calls(), vec![(-100, vec![11, 12, 13])]);
        assert!(transport.single_calls().is_empty());
        assert!(!agg.is_pending(&key("g")));

        // Same group id later starts over with fresh state
        assert!(agg.register_part(key("g"), 14, false));
        assert_eq!(agg.pending_groups(), 1);
        after_window().await;
        assert_eq!(transport.batch_calls().len(), 1);
        assert_eq!(agg.pending_groups(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clean_group_is_never_deleted() {
        let transport = Arc::new(MockTransport::new());
        let agg = GroupAggregator::new(Arc::clone(&transport), QUIET);

        for id in 1..=3 {
            agg.register_part(key("h"), id, false);
        }
        after_window().await;

        assert!(transport.batch_calls().is_empty());
        assert!(transport.single_calls().is_empty());
        assert_eq!(agg.pending_groups(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_batch_failure_falls_back_to_single_deletes() {
        let transport = Arc::new(
            MockTransport::new()
                .failing_batches()
                .failing_message(2, Failure::Forbidden)
                .failing_message(3, Failure::AlreadyGone),
        );
        let agg = GroupAggregator::new(Arc::clone(&transport), QUIET);

        for id in 1..=4 {
            agg.register_part(key("g"), id, id == 1);
        }
        after_window().await;

        assert_eq!(transport.batch_calls().len(), 1);
        // Every member was attempted despite the failure on #2
        assert_eq!(
            transport.single_calls(),
            vec![(-100, 1), (-100, 2), (-100, 3), (-100, 4)]
        );
        assert_eq!(agg.pending_groups(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_parts_arriving_during_deletion_are_swept() {
        let transport = Arc::new(MockTransport::new().with_batch_delay(Duration::from_secs(2)));
        let agg = GroupAggregator::new(Arc::clone(&transport), QUIET);

        agg.register_part(key("g"), 1, true);
        // Window closes at 3s; the batch call is in flight until 5s
        after_window().await;
        assert!(agg.is_pending(&key("g")));
        assert!(!agg.register_part(key("g"), 2, false));

        tokio::time::sleep(Duration::from_secs(3)).await;

        assert_eq!(
            transport.batch_calls(),
            vec![(-100, vec![1]), (-100, vec![2])]
        );
        assert_eq!(agg.pending_groups(), 0);
    }

    #[tokio::test]
    async fn test_delete_batch_chunks_large_groups() {
        let transport = MockTransport::new();
        let ids: Vec<i32> = (1..=150).collect();

        let report = delete_batch(&transport, 5, &ids).await;

        let calls = transport.batch_calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].1.len(), MAX_BATCH_SIZE);
        assert_eq!(calls[1].1.len(), 50);
        assert_eq!(report, BatchReport { deleted: 150, failed: 0 });
    }

    #[tokio::test]
    async fn test_delete_batch_reports_failures() {
        let transport = MockTransport::new()
            .failing_batches()
            .failing_message(7, Failure::Request);

        let report = delete_batch(&transport, 5, &[6, 7, 8]).await;

        assert_eq!(report, BatchReport { deleted: 2, failed: 1 });
    }
}
