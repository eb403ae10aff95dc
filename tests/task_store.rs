//! Background task registry integration tests.

use std::{
    sync::{Arc, Barrier},
    thread,
};

use framesift::{
    ExtractionConfig, FrameSiftError, FrameSource, MemorySource, TaskStatus, TaskStore,
};
use image::{Rgb, RgbImage};

fn slide(seed: u32) -> RgbImage {
    let mut state = seed.wrapping_mul(2_654_435_761).wrapping_add(0x9E37_79B9);
    RgbImage::from_fn(32, 24, |_, _| {
        state ^= state << 13;
        state ^= state >> 17;
        state ^= state << 5;
        let value = if state >> 31 == 0 { 20 } else { 235 };
        Rgb([value, value, value])
    })
}

fn config() -> ExtractionConfig {
    ExtractionConfig::new().with_require_text(false)
}

/// Blocks on a barrier before yielding its first frame.
struct GatedSource {
    gate: Arc<Barrier>,
    opened: bool,
    inner: MemorySource,
}

impl FrameSource for GatedSource {
    fn frames_per_second(&self) -> f64 {
        self.inner.frames_per_second()
    }

    fn total_frames(&self) -> u64 {
        self.inner.total_frames()
    }

    fn next_frame(&mut self) -> Result<Option<RgbImage>, FrameSiftError> {
        if !self.opened {
            self.gate.wait();
            self.opened = true;
        }
        self.inner.next_frame()
    }
}

struct BrokenSource;

impl FrameSource for BrokenSource {
    fn frames_per_second(&self) -> f64 {
        30.0
    }

    fn total_frames(&self) -> u64 {
        100
    }

    fn next_frame(&mut self) -> Result<Option<RgbImage>, FrameSiftError> {
        Err(FrameSiftError::VideoDecodeError("corrupt stream".to_string()))
    }
}

struct PanickingSource;

impl FrameSource for PanickingSource {
    fn frames_per_second(&self) -> f64 {
        30.0
    }

    fn total_frames(&self) -> u64 {
        100
    }

    fn next_frame(&mut self) -> Result<Option<RgbImage>, FrameSiftError> {
        panic!("frame buffer exhausted");
    }
}

#[test]
fn completed_task_exposes_result_and_output() {
    let temporary = tempfile::tempdir().unwrap();
    let store = TaskStore::new();
    let source = MemorySource::new((0..3).map(slide).collect(), 1.0);

    let handle = store
        .submit_source(Box::new(source), temporary.path(), config())
        .expect("Submit failed");
    let id = handle.id().to_string();
    handle.join();

    let snapshot = store.status(&id).unwrap();
    assert_eq!(snapshot.status, TaskStatus::Completed);
    let result = snapshot.result.as_ref().expect("Completed task has a result");
    assert_eq!(result.saved_count, 3);
    assert_eq!(snapshot.progress.unwrap().percentage(), 100);

    let output = store.output_dir_of(&id).unwrap();
    assert_eq!(output, temporary.path().join(&id));
    assert!(output.join("frame_0003.png").exists());

    let json = snapshot.to_json();
    assert_eq!(json["status"], "completed");
    assert_eq!(json["result"]["saved_count"], 3);
    assert_eq!(json["progress"]["percentage"], 100);
}

#[test]
fn running_task_is_processing_and_not_downloadable() {
    let temporary = tempfile::tempdir().unwrap();
    let store = TaskStore::new();
    let gate = Arc::new(Barrier::new(2));
    let source = GatedSource {
        gate: Arc::clone(&gate),
        opened: false,
        inner: MemorySource::new(vec![slide(1)], 1.0),
    };

    let handle = store
        .submit_source(Box::new(source), temporary.path(), config())
        .unwrap();
    let id = handle.id().to_string();

    // Poll until the worker has picked the task up.
    while store.status(&id).unwrap().status == TaskStatus::Pending {
        thread::yield_now();
    }
    assert_eq!(store.status(&id).unwrap().status, TaskStatus::Processing);
    assert!(matches!(
        store.output_dir_of(&id),
        Err(FrameSiftError::TaskNotCompleted(_))
    ));

    gate.wait();
    handle.join();
    assert_eq!(store.status(&id).unwrap().status, TaskStatus::Completed);
}

#[test]
fn failed_task_records_message() {
    let temporary = tempfile::tempdir().unwrap();
    let store = TaskStore::new();

    let handle = store
        .submit_source(Box::new(BrokenSource), temporary.path(), config())
        .unwrap();
    let id = handle.id().to_string();
    handle.join();

    let snapshot = store.status(&id).unwrap();
    assert_eq!(snapshot.status, TaskStatus::Failed);
    assert!(snapshot.error.as_deref().unwrap().contains("corrupt stream"));
    assert_eq!(snapshot.to_json()["status"], "error");
    assert!(matches!(
        store.output_dir_of(&id),
        Err(FrameSiftError::TaskNotCompleted(_))
    ));
}

#[test]
fn panicking_task_is_failed_without_decode_wording() {
    let temporary = tempfile::tempdir().unwrap();
    let store = TaskStore::new();

    let handle = store
        .submit_source(Box::new(PanickingSource), temporary.path(), config())
        .unwrap();
    let id = handle.id().to_string();
    handle.join();

    let snapshot = store.status(&id).unwrap();
    assert_eq!(snapshot.status, TaskStatus::Failed);
    let error = snapshot.error.unwrap();
    assert_eq!(error, "Extraction panicked: frame buffer exhausted");
    assert!(!error.contains("decode"));
}

#[test]
fn input_errors_are_not_registered() {
    let temporary = tempfile::tempdir().unwrap();
    let store = TaskStore::new();

    let missing = store.submit("no_such_upload.mp4", temporary.path(), config());
    assert!(matches!(missing, Err(FrameSiftError::VideoNotFound { .. })));

    let invalid = store.submit_source(
        Box::new(MemorySource::new(vec![slide(1)], 1.0)),
        temporary.path(),
        config().with_interval(-1.0),
    );
    assert!(matches!(invalid, Err(FrameSiftError::InvalidParameter(_))));

    assert!(store.is_empty());
}

#[test]
fn concurrent_tasks_are_isolated() {
    let temporary = tempfile::tempdir().unwrap();
    let store = TaskStore::new();

    let handles: Vec<_> = (0..4)
        .map(|task| {
            let frames = (0..=task).map(|i| slide(task * 10 + i)).collect();
            store
                .submit_source(
                    Box::new(MemorySource::new(frames, 1.0)),
                    temporary.path(),
                    config(),
                )
                .unwrap()
        })
        .collect();
    let ids: Vec<String> = handles.iter().map(|h| h.id().to_string()).collect();
    for handle in handles {
        handle.join();
    }

    assert_eq!(store.len(), 4);
    for (task, id) in ids.iter().enumerate() {
        let snapshot = store.status(id).unwrap();
        assert_eq!(snapshot.status, TaskStatus::Completed);
        assert_eq!(snapshot.result.unwrap().saved_count, task as u64 + 1);
    }
}

#[test]
fn clones_share_the_registry_and_remove_forgets() {
    let temporary = tempfile::tempdir().unwrap();
    let store = TaskStore::new();
    let poller = store.clone();

    let handle = store
        .submit_source(
            Box::new(MemorySource::new(vec![slide(1)], 1.0)),
            temporary.path(),
            config(),
        )
        .unwrap();
    let id = handle.id().to_string();
    handle.join();

    assert!(poller.status(&id).is_ok());
    assert_eq!(poller.task_ids(), vec![id.clone()]);
    assert!(poller.remove(&id));
    assert!(matches!(
        store.status(&id),
        Err(FrameSiftError::TaskNotFound(_))
    ));
    assert!(temporary.path().join(&id).join("frame_0001.png").exists());
}
