//! Default operational parameters (spec §6). Every name here is overridable
//! through `RunnerConfig` in `convo-infrastructure`; these are the fallback
//! values when no override is configured.

/// Maximum characters kept for an instruction stored on a `Skeleton`
/// (`truncated_instruction`, `child_task_instruction_prefixes` entries).
pub const INSTRUCTION_STORAGE_CHARS: usize = 200;

/// Maximum characters used as an `InstructionIndex` key. Shorter than the
/// storage length so prefixes with small trailing differences still
/// coalesce in the radix tree.
pub const INSTRUCTION_INDEX_KEY_CHARS: usize = 192;

/// Default minimum confidence score for accepting a Pass 2 resolution.
pub const DEFAULT_MIN_CONFIDENCE: f64 = 0.3;

/// Default fuzzy-match similarity threshold.
pub const DEFAULT_FUZZY_THRESHOLD: f64 = 0.2;

/// Fixed confidence assigned to a metadata-fallback resolution.
pub const METADATA_FALLBACK_CONFIDENCE: f64 = 0.5;

/// Fixed confidence assigned to a temporal-proximity resolution.
pub const TEMPORAL_PROXIMITY_CONFIDENCE: f64 = 0.4;

/// Confidence assigned when a skeleton is declared root.
pub const ROOT_DETECTED_CONFIDENCE: f64 = 1.0;

/// Default temporal-proximity window, in milliseconds (5 minutes).
pub const DEFAULT_TEMPORAL_PROXIMITY_WINDOW_MS: i64 = 5 * 60 * 1000;

/// Default batch size for Pass 1 / Pass 2 reconstruction runs.
pub const DEFAULT_RECONSTRUCTION_BATCH_SIZE: usize = 20;

/// Default fixed concurrency for proactive metadata repair.
pub const DEFAULT_REPAIR_CONCURRENCY: usize = 5;

/// Default background indexing tick interval, in seconds.
pub const DEFAULT_BACKGROUND_TICK_SECS: u64 = 10;

/// Approximate throughput cap implied by the default tick interval
/// (~100 attempts/minute at one task per 10s tick).
pub const DEFAULT_MAX_INDEXING_ATTEMPTS_PER_MINUTE: u64 = 100;

/// Queue size above which the pipeline logs an estimated drain time.
pub const QUEUE_DRAIN_WARNING_THRESHOLD: usize = 1000;

/// Default consistency-reconciliation interval, in seconds (24h).
pub const DEFAULT_CONSISTENCY_CHECK_INTERVAL_SECS: u64 = 24 * 60 * 60;

/// Minimum absolute discrepancy that triggers a consistency warning
/// regardless of the locally-indexed count (spec §4.7).
pub const CONSISTENCY_WARNING_MIN_ABSOLUTE: u64 = 50;

/// Fraction of the locally-indexed count used as the other half of the
/// consistency-warning threshold (`max(50, 25% of local)`).
pub const CONSISTENCY_WARNING_LOCAL_FRACTION: f64 = 0.25;

/// Timeout applied to a single in-flight indexing call (spec §5).
pub const INDEXING_CALL_TIMEOUT_SECS: u64 = 30;

/// Base delay for the exponential backoff applied after a transient
/// indexing failure.
pub const RETRY_BACKOFF_BASE_SECS: u64 = 30;

/// Cap on the exponential backoff delay.
pub const RETRY_BACKOFF_MAX_SECS: u64 = 6 * 60 * 60;

/// Name of the on-disk skeleton-cache subdirectory under `<root>/tasks/`.
pub const SKELETON_CACHE_DIRNAME: &str = ".skeletons";

/// Name of the subdirectory under a storage root that holds task folders.
pub const TASKS_DIRNAME: &str = "tasks";

/// Metadata file name within a task directory.
pub const TASK_METADATA_FILENAME: &str = "task_metadata.json";

/// API call transcript file name within a task directory.
pub const API_HISTORY_FILENAME: &str = "api_conversation_history.json";

/// UI message transcript file name within a task directory.
pub const UI_MESSAGES_FILENAME: &str = "ui_messages.json";
