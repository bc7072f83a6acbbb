//! Background Indexing Pipeline (spec §4.7, §5): a single-writer work
//! queue drained on a fixed tick, rate-limited to roughly
//! `max_indexing_attempts_per_minute`, each call bounded by a timeout, plus
//! a 24h consistency reconciler comparing the locally indexed count
//! against the remote host-point count.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use convo_application::{decide, record_failure, record_success, DecisionAction};
use convo_domain::entities::RemoteErrorKind;
use convo_domain::error::Error;
use convo_domain::ports::{Clock, IndexableContent, SkeletonRepository, VectorStoreProvider};
use convo_domain::utils::id::compute_content_hash;
use convo_domain::value_objects::{HostId, TaskId};
use tokio::sync::Mutex;

use crate::config::RunnerConfig;

/// Insertion-ordered, deduplicated work queue. Owned exclusively by the
/// pipeline (spec §5: "single-writer rule").
#[derive(Debug, Default)]
struct WorkQueue {
    order: VecDeque<TaskId>,
    present: HashSet<TaskId>,
}

impl WorkQueue {
    fn push(&mut self, task_id: TaskId) {
        if self.present.insert(task_id.clone()) {
            self.order.push_back(task_id);
        }
    }

    fn pop_up_to(&mut self, max: usize) -> Vec<TaskId> {
        let mut batch = Vec::with_capacity(max.min(self.order.len()));
        while batch.len() < max {
            let Some(task_id) = self.order.pop_front() else { break };
            self.present.remove(&task_id);
            batch.push(task_id);
        }
        batch
    }

    fn len(&self) -> usize {
        self.order.len()
    }
}

/// Drives the background semantic-indexing loop for one host.
pub struct IndexingPipeline<R, V, C> {
    repository: Arc<R>,
    vector_store: Arc<V>,
    clock: Arc<C>,
    host_id: HostId,
    config: RunnerConfig,
    queue: Mutex<WorkQueue>,
    last_reconciled_at: Mutex<Option<i64>>,
}

impl<R, V, C> IndexingPipeline<R, V, C>
where
    R: SkeletonRepository + 'static,
    V: VectorStoreProvider + 'static,
    C: Clock + 'static,
{
    /// Build a pipeline over the given adapters and configuration.
    #[must_use]
    pub fn new(repository: Arc<R>, vector_store: Arc<V>, clock: Arc<C>, host_id: HostId, config: RunnerConfig) -> Self {
        Self {
            repository,
            vector_store,
            clock,
            host_id,
            config,
            queue: Mutex::new(WorkQueue::default()),
            last_reconciled_at: Mutex::new(None),
        }
    }

    /// Enqueues a task for (re)indexing consideration on the next tick.
    /// A task already queued is not duplicated.
    pub async fn enqueue(&self, task_id: TaskId) {
        let mut queue = self.queue.lock().await;
        queue.push(task_id);
        if queue.len() > convo_domain::constants::QUEUE_DRAIN_WARNING_THRESHOLD {
            tracing::warn!(
                queue_len = queue.len(),
                estimated_minutes = queue.len() as u64 / self.config.max_indexing_attempts_per_minute.max(1),
                "indexing queue backlog is large"
            );
        }
    }

    /// Runs one tick: scans the repository for skeletons the Decision
    /// Service says are now eligible and enqueues them, pops up to the
    /// per-tick rate-limited batch size off the queue, attempts to index
    /// each, and persists the resulting skeleton state. Also runs the
    /// consistency reconciler if its interval has elapsed. Intended to be
    /// called in a loop by [`Self::spawn`]; exposed directly so tests can
    /// drive ticks deterministically against a fake clock.
    ///
    /// # Errors
    ///
    /// Returns an error only if the clock itself fails.
    pub async fn tick(&self) -> convo_domain::error::Result<()> {
        let now_ms = self.clock.now_millis()?;
        self.scan(now_ms).await;

        let per_tick = self.per_tick_budget();

        let batch = {
            let mut queue = self.queue.lock().await;
            queue.pop_up_to(per_tick)
        };

        for task_id in batch {
            if let Err(err) = self.process_one(&task_id, now_ms).await {
                tracing::warn!(task_id = %task_id, error = %err, "indexing attempt failed");
            }
        }

        self.maybe_reconcile(now_ms).await?;
        Ok(())
    }

    /// Producer half of the pipeline (spec §4.7: "a periodic scan that,
    /// for every skeleton, asks the Decision Service; positive answers
    /// enqueue the task_id"). Consults every cached skeleton's
    /// `IndexingState` against [`decide`] and enqueues the ones eligible
    /// right now — already-queued ids are a no-op (`WorkQueue` is a set).
    async fn scan(&self, now_ms: i64) {
        for skeleton in self.repository.snapshot().await {
            let content_hash = indexable_content(&skeleton).content_hash;
            let decision = decide(&skeleton.indexing_state, now_ms, &content_hash);
            if decision.should_index {
                self.enqueue(skeleton.task_id).await;
            }
        }
    }

    /// Spawns the background tick loop on the current tokio runtime.
    /// Returns the `JoinHandle`; dropping or aborting it stops the loop.
    #[must_use]
    pub fn spawn(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        tokio::task::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(self.config.background_tick_secs));
            loop {
                interval.tick().await;
                if let Err(err) = self.tick().await {
                    tracing::warn!(error = %err, "indexing pipeline tick failed");
                }
            }
        })
    }

    fn per_tick_budget(&self) -> usize {
        let ticks_per_minute = (60 / self.config.background_tick_secs.max(1)).max(1);
        (self.config.max_indexing_attempts_per_minute / ticks_per_minute).max(1) as usize
    }

    async fn process_one(&self, task_id: &TaskId, now_ms: i64) -> convo_domain::error::Result<()> {
        let Some(mut skeleton) = self.repository.get(task_id).await else {
            return Ok(());
        };

        let content = indexable_content(&skeleton);
        let decision = decide(&skeleton.indexing_state, now_ms, &content.content_hash);

        if !decision.should_index {
            return Ok(());
        }

        let call = self.vector_store.index(task_id, &content);
        let timeout = Duration::from_secs(self.config.indexing_call_timeout_secs);

        skeleton.indexing_state = match tokio::time::timeout(timeout, call).await {
            Ok(Ok(())) => record_success(now_ms, content.content_hash.clone()),
            Ok(Err(Error::TransientRemote { message })) => {
                record_failure(&skeleton.indexing_state, now_ms, RemoteErrorKind::Network, message)
            }
            Ok(Err(Error::PermanentRemote { message })) => {
                record_failure(&skeleton.indexing_state, now_ms, RemoteErrorKind::InvalidFormat, message)
            }
            Ok(Err(other)) => {
                record_failure(&skeleton.indexing_state, now_ms, RemoteErrorKind::Network, other.to_string())
            }
            Err(_elapsed) => record_failure(
                &skeleton.indexing_state,
                now_ms,
                RemoteErrorKind::Timeout,
                format!("indexing call exceeded {}s timeout", self.config.indexing_call_timeout_secs),
            ),
        };

        let was_fresh = decision.action == DecisionAction::Fresh;
        tracing::info!(task_id = %task_id, fresh = was_fresh, status = ?skeleton.indexing_state.status, "indexing attempt complete");

        self.repository.put(skeleton).await
    }

    async fn maybe_reconcile(&self, now_ms: i64) -> convo_domain::error::Result<()> {
        let interval_ms = i64::try_from(self.config.consistency_check_interval_secs)
            .unwrap_or(i64::MAX)
            .saturating_mul(1000);

        let mut last = self.last_reconciled_at.lock().await;
        if let Some(previous) = *last {
            if now_ms - previous < interval_ms {
                return Ok(());
            }
        }
        *last = Some(now_ms);
        drop(last);

        let snapshot = self.repository.snapshot().await;
        let local_indexed = snapshot
            .iter()
            .filter(|s| s.indexing_state.status == convo_domain::entities::IndexingStatus::Indexed)
            .count() as u64;
        let remote_count = self.vector_store.count_points_by_host(&self.host_id).await?;

        let threshold = (local_indexed as f64 * convo_domain::constants::CONSISTENCY_WARNING_LOCAL_FRACTION)
            .max(convo_domain::constants::CONSISTENCY_WARNING_MIN_ABSOLUTE as f64) as u64;
        let discrepancy = local_indexed.abs_diff(remote_count);

        if discrepancy > threshold {
            tracing::warn!(
                local = local_indexed,
                remote = remote_count,
                threshold,
                "consistency check found a local/remote indexed-count discrepancy"
            );
        }

        Ok(())
    }
}

/// Builds the embeddable content and its hash for one skeleton: the
/// truncated instruction plus its delegated sub-task prefixes, joined.
fn indexable_content(skeleton: &convo_domain::entities::Skeleton) -> IndexableContent {
    let mut text = skeleton.truncated_instruction.clone();
    for prefix in &skeleton.child_task_instruction_prefixes {
        text.push('\n');
        text.push_str(prefix);
    }
    let content_hash = compute_content_hash(&text);
    IndexableContent { text, content_hash }
}
