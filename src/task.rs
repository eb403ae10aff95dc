//! Background extraction tasks and their registry.
//!
//! [`TaskStore`] is the registry a service layer injects into its request
//! handlers: submit a video, poll its status, locate its output. Each
//! submitted task runs the whole pipeline on its own worker thread; tasks
//! share nothing but the registry.
//!
//! The registry's lock is taken for one read or write at a time and never
//! held across decoding, OCR, or disk I/O, so a slow task cannot stall the
//! others or the pollers.
//!
//! # Example
//!
//! ```no_run
//! use framesift::{ExtractionConfig, TaskStatus, TaskStore};
//!
//! let store = TaskStore::new();
//! let handle = store.submit("uploads/talk.mp4", "outputs", ExtractionConfig::new())?;
//! let id = handle.id().to_string();
//!
//! // From a status handler:
//! let snapshot = store.status(&id)?;
//! println!("{}", snapshot.to_json());
//!
//! handle.join();
//! assert_eq!(store.status(&id)?.status, TaskStatus::Completed);
//! # Ok::<(), framesift::FrameSiftError>(())
//! ```

use std::{
    collections::HashMap,
    fmt::{Display, Formatter, Result as FmtResult},
    panic::{AssertUnwindSafe, catch_unwind},
    path::{Path, PathBuf},
    sync::{
        Arc, Mutex, MutexGuard, PoisonError,
        atomic::{AtomicU64, Ordering},
    },
    thread::{self, JoinHandle},
    time::{SystemTime, UNIX_EPOCH},
};

use serde_json::{Value, json};

use crate::{
    configuration::ExtractionConfig,
    error::FrameSiftError,
    pipeline::{ExtractionResult, FrameVerdict, extract_frames, extract_frames_from},
    progress::{ProgressCallback, ProgressSnapshot},
    sampler::FrameSource,
};

/// Lifecycle of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    /// Registered, worker not yet started.
    Pending,
    /// The pipeline is running.
    Processing,
    /// Finished; the result is available.
    Completed,
    /// Aborted; the error message is available.
    Failed,
}

impl TaskStatus {
    /// Wire name used in status payloads.
    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Processing => "processing",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "error",
        }
    }
}

impl Display for TaskStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// A point-in-time copy of a task's registry entry.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskSnapshot {
    pub id: String,
    pub status: TaskStatus,
    /// Latest progress report, if any has arrived.
    pub progress: Option<ProgressSnapshot>,
    pub result: Option<ExtractionResult>,
    pub error: Option<String>,
    pub output_dir: PathBuf,
}

impl TaskSnapshot {
    /// Render the status payload a polling client receives.
    pub fn to_json(&self) -> Value {
        json!({
            "status": self.status.as_str(),
            "progress": self.progress.as_ref().map(ProgressSnapshot::to_json),
            "error": self.error,
            "result": self.result.as_ref().map(ExtractionResult::to_json),
        })
    }
}

#[derive(Debug)]
struct TaskRecord {
    status: TaskStatus,
    progress: Option<ProgressSnapshot>,
    result: Option<ExtractionResult>,
    error: Option<String>,
    output_dir: PathBuf,
}

type Registry = Arc<Mutex<HashMap<String, TaskRecord>>>;

/// Lock the registry, recovering the map if a holder panicked.
fn lock(registry: &Registry) -> MutexGuard<'_, HashMap<String, TaskRecord>> {
    registry.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Generate a process-unique task identifier.
fn next_task_id() -> String {
    static SEQUENCE: AtomicU64 = AtomicU64::new(0);
    let sequence = SEQUENCE.fetch_add(1, Ordering::Relaxed);
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos() as u64)
        .unwrap_or_default();
    format!("{nanos:016x}-{sequence:04x}")
}

/// A running task.
///
/// Dropping the handle detaches the worker; the task still runs to
/// completion and its outcome lands in the store.
#[derive(Debug)]
pub struct TaskHandle {
    id: String,
    worker: JoinHandle<()>,
}

impl TaskHandle {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Block until the worker has recorded the task's outcome.
    pub fn join(self) {
        // The worker catches pipeline panics itself.
        let _ = self.worker.join();
    }
}

/// Forwards progress into the registry and on to the caller's observer.
struct RegistryProgress {
    registry: Registry,
    id: String,
    inner: Arc<dyn ProgressCallback>,
}

impl ProgressCallback for RegistryProgress {
    fn on_progress(&self, snapshot: &ProgressSnapshot) {
        if let Some(record) = lock(&self.registry).get_mut(&self.id) {
            record.progress = Some(*snapshot);
        }
        self.inner.on_progress(snapshot);
    }

    fn on_frame(&self, frame_index: u64, verdict: &FrameVerdict) {
        self.inner.on_frame(frame_index, verdict);
    }
}

/// Thread-safe task registry. Clones share the same registry.
#[derive(Debug, Clone, Default)]
pub struct TaskStore {
    registry: Registry,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start extracting `video_path` on a new worker thread.
    ///
    /// Frames go to `output_root/<task id>`.
    ///
    /// # Errors
    ///
    /// Input errors are reported here and no task is registered:
    /// [`FrameSiftError::InvalidParameter`] for bad configuration and
    /// [`FrameSiftError::VideoNotFound`] for a missing video. Failures
    /// after the worker starts are recorded in the task instead.
    pub fn submit<P, Q>(
        &self,
        video_path: P,
        output_root: Q,
        config: ExtractionConfig,
    ) -> Result<TaskHandle, FrameSiftError>
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
    {
        config.validate()?;
        let video_path = video_path.as_ref().to_path_buf();
        if !video_path.exists() {
            return Err(FrameSiftError::VideoNotFound { path: video_path });
        }

        self.spawn(output_root.as_ref(), config, move |output_dir, config| {
            extract_frames(&video_path, output_dir, config)
        })
    }

    /// Start running the pipeline over `source` on a new worker thread.
    ///
    /// # Errors
    ///
    /// [`FrameSiftError::InvalidParameter`] for bad configuration.
    pub fn submit_source<Q: AsRef<Path>>(
        &self,
        mut source: Box<dyn FrameSource + Send>,
        output_root: Q,
        config: ExtractionConfig,
    ) -> Result<TaskHandle, FrameSiftError> {
        config.validate()?;
        self.spawn(output_root.as_ref(), config, move |output_dir, config| {
            extract_frames_from(source.as_mut(), output_dir, config)
        })
    }

    fn spawn<F>(
        &self,
        output_root: &Path,
        config: ExtractionConfig,
        run: F,
    ) -> Result<TaskHandle, FrameSiftError>
    where
        F: FnOnce(&Path, &ExtractionConfig) -> Result<ExtractionResult, FrameSiftError>
            + Send
            + 'static,
    {
        let id = next_task_id();
        let output_dir = output_root.join(&id);

        lock(&self.registry).insert(
            id.clone(),
            TaskRecord {
                status: TaskStatus::Pending,
                progress: None,
                result: None,
                error: None,
                output_dir: output_dir.clone(),
            },
        );

        let registry = Arc::clone(&self.registry);
        let task_id = id.clone();
        let spawned = thread::Builder::new()
            .name(format!("framesift-{id}"))
            .spawn(move || {
                if let Some(record) = lock(&registry).get_mut(&task_id) {
                    record.status = TaskStatus::Processing;
                }

                let progress = Arc::new(RegistryProgress {
                    registry: Arc::clone(&registry),
                    id: task_id.clone(),
                    inner: config.progress.clone(),
                });
                let config = config.with_progress(progress);

                log::info!("Task {task_id} started");
                let outcome = catch_unwind(AssertUnwindSafe(|| run(&output_dir, &config)))
                    .unwrap_or_else(|panic| {
                        let message = panic
                            .downcast_ref::<&str>()
                            .map(|s| s.to_string())
                            .or_else(|| panic.downcast_ref::<String>().cloned())
                            .unwrap_or_else(|| "unknown panic payload".to_string());
                        Err(FrameSiftError::TaskPanicked(message))
                    });

                let mut registry = lock(&registry);
                let Some(record) = registry.get_mut(&task_id) else {
                    return;
                };
                match outcome {
                    Ok(result) => {
                        log::info!("Task {task_id} completed: {} frames saved", result.saved_count);
                        record.status = TaskStatus::Completed;
                        record.result = Some(result);
                    }
                    Err(error) => {
                        log::warn!("Task {task_id} failed: {error}");
                        record.status = TaskStatus::Failed;
                        record.error = Some(error.to_string());
                    }
                }
            });

        match spawned {
            Ok(worker) => Ok(TaskHandle { id, worker }),
            Err(error) => {
                lock(&self.registry).remove(&id);
                Err(FrameSiftError::IoError(error))
            }
        }
    }

    /// Current state of task `id`.
    ///
    /// # Errors
    ///
    /// [`FrameSiftError::TaskNotFound`] for an unknown id.
    pub fn status(&self, id: &str) -> Result<TaskSnapshot, FrameSiftError> {
        let registry = lock(&self.registry);
        let record = registry
            .get(id)
            .ok_or_else(|| FrameSiftError::TaskNotFound(id.to_string()))?;
        Ok(TaskSnapshot {
            id: id.to_string(),
            status: record.status,
            progress: record.progress,
            result: record.result.clone(),
            error: record.error.clone(),
            output_dir: record.output_dir.clone(),
        })
    }

    /// Output directory of a completed task, for download.
    ///
    /// # Errors
    ///
    /// [`FrameSiftError::TaskNotFound`] for an unknown id,
    /// [`FrameSiftError::TaskNotCompleted`] while it is pending, running,
    /// or failed.
    pub fn output_dir_of(&self, id: &str) -> Result<PathBuf, FrameSiftError> {
        let registry = lock(&self.registry);
        let record = registry
            .get(id)
            .ok_or_else(|| FrameSiftError::TaskNotFound(id.to_string()))?;
        if record.status != TaskStatus::Completed {
            return Err(FrameSiftError::TaskNotCompleted(id.to_string()));
        }
        Ok(record.output_dir.clone())
    }

    /// Forget task `id`. Files on disk are left alone.
    pub fn remove(&self, id: &str) -> bool {
        lock(&self.registry).remove(id).is_some()
    }

    /// Identifiers of all registered tasks, in no particular order.
    pub fn task_ids(&self) -> Vec<String> {
        lock(&self.registry).keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        lock(&self.registry).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_ids_are_unique() {
        let ids: std::collections::HashSet<String> = (0..100).map(|_| next_task_id()).collect();
        assert_eq!(ids.len(), 100);
    }

    #[test]
    fn status_names_match_payload() {
        assert_eq!(TaskStatus::Pending.as_str(), "pending");
        assert_eq!(TaskStatus::Processing.to_string(), "processing");
        assert_eq!(TaskStatus::Completed.as_str(), "completed");
        assert_eq!(TaskStatus::Failed.as_str(), "error");
    }

    #[test]
    fn unknown_task_is_not_found() {
        let store = TaskStore::new();
        assert!(matches!(
            store.status("missing"),
            Err(FrameSiftError::TaskNotFound(_))
        ));
        assert!(matches!(
            store.output_dir_of("missing"),
            Err(FrameSiftError::TaskNotFound(_))
        ));
        assert!(!store.remove("missing"));
        assert!(store.is_empty());
    }
}
