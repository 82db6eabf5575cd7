//! The observation contract: snapshot subscriptions, the progress model,
//! partial decodes and priority forwarding.

use std::sync::Arc;

use imgload::{ImageLoader, ImageRequest, LoadPhase, Priority, Progress};

use super::test_utils::{
    init_tracing, solid_image, wait_for, FetchPlan, ManualPipeline, ScriptedPipeline,
};

const FULL: &str = "https://x/full.jpg";
const OTHER: &str = "https://x/other.jpg";

#[tokio::test]
async fn test_initial_snapshot_is_idle() {
    let loader = ImageLoader::new(ManualPipeline::new());
    let updates = loader.subscribe();

    let snapshot = updates.borrow().clone();
    assert!(snapshot.image.is_none());
    assert!(snapshot.error.is_none());
    assert!(!snapshot.is_loading);
    assert_eq!(snapshot.progress, Progress::default());
    assert!(snapshot.request.is_none());
    assert_eq!(snapshot.phase, LoadPhase::NotStarted);
}

#[tokio::test]
async fn test_progress_is_monotonic_within_an_attempt() {
    init_tracing();
    let pipeline = ScriptedPipeline::new().with_plan(
        FULL,
        FetchPlan::Succeed {
            image: solid_image(8, 8, 128),
            steps: vec![(100, 1000), (400, 1000), (900, 1000), (1000, 1000)],
        },
    );
    let loader = ImageLoader::new(pipeline);
    let mut updates = loader.subscribe();

    loader.load(ImageRequest::new(FULL)).await;

    let mut seen = Vec::new();
    loop {
        updates.changed().await.expect("loader dropped");
        let snapshot = updates.borrow_and_update().clone();
        seen.push(snapshot.progress);
        if snapshot.phase.is_terminal() {
            break;
        }
    }

    // Snapshots may coalesce, but completed units never move backwards.
    for window in seen.windows(2) {
        assert!(window[1].completed >= window[0].completed);
    }
    let last = seen.last().unwrap();
    assert_eq!(last.fraction(), Some(1.0));
}

#[tokio::test]
async fn test_progress_zeroed_at_start_of_new_attempt() {
    let pipeline = ScriptedPipeline::new().with_plan(
        FULL,
        FetchPlan::Succeed {
            image: solid_image(8, 8, 128),
            steps: vec![(700, 700)],
        },
    );
    let loader = ImageLoader::new(pipeline);
    let mut updates = loader.subscribe();

    loader.load(ImageRequest::new(FULL)).await;
    let done = wait_for(&mut updates, |s| s.phase.is_terminal()).await;
    assert_eq!(done.progress.completed, 700);

    loader.reset().await;
    loader.load(ImageRequest::new(OTHER)).await;

    assert_eq!(loader.progress(), Progress::default());
    assert!(loader.is_loading());
}

#[tokio::test]
async fn test_partial_decode_updates_image_while_loading() {
    let loader = ImageLoader::new(ManualPipeline::new());
    let mut updates = loader.subscribe();

    loader.load(ImageRequest::new(FULL)).await;
    let pipeline = loader.pipeline().clone();
    pipeline.wait_for_fetch(FULL).await;
    let sink = pipeline.sink(FULL);

    let partial = solid_image(8, 8, 20);
    sink.progress(Some(partial.clone()), 500, 1000);

    let progressed = wait_for(&mut updates, |s| s.image.is_some()).await;
    assert!(Arc::ptr_eq(progressed.image.as_ref().unwrap(), &partial));
    assert!(progressed.is_loading, "a partial decode is not completion");
    assert_eq!(progressed.phase, LoadPhase::LoadingFull);

    let full = solid_image(8, 8, 240);
    sink.finish(Ok(full.clone()));
    let done = wait_for(&mut updates, |s| s.phase.is_terminal()).await;
    assert!(Arc::ptr_eq(done.image.as_ref().unwrap(), &full));
}

#[tokio::test]
async fn test_priority_change_reaches_inflight_task() {
    let loader = ImageLoader::new(ManualPipeline::new());

    loader.load(ImageRequest::new(FULL)).await;
    let pipeline = loader.pipeline().clone();
    pipeline.wait_for_fetch(FULL).await;
    let task = pipeline.task_state(FULL).unwrap();
    assert_eq!(task.last_priority(), None);

    loader.set_priority(Priority::VeryHigh).await;
    assert_eq!(task.last_priority(), Some(Priority::VeryHigh));
}

#[tokio::test]
async fn test_loader_priority_applied_when_fetch_starts() {
    let loader = ImageLoader::new(ManualPipeline::new());
    loader.set_priority(Priority::High).await;

    loader.load(ImageRequest::new(FULL)).await;
    let pipeline = loader.pipeline().clone();
    pipeline.wait_for_fetch(FULL).await;

    // The request hint was Normal; the loader priority differs and wins.
    let task = pipeline.task_state(FULL).unwrap();
    assert_eq!(task.last_priority(), Some(Priority::High));
}

#[tokio::test]
async fn test_matching_priority_not_redundantly_forwarded() {
    let loader = ImageLoader::new(ManualPipeline::new());
    loader.set_priority(Priority::High).await;

    loader
        .load(ImageRequest::with_priority(FULL, Priority::High))
        .await;
    let pipeline = loader.pipeline().clone();
    pipeline.wait_for_fetch(FULL).await;

    let task = pipeline.task_state(FULL).unwrap();
    assert_eq!(task.last_priority(), None);
}

#[tokio::test]
async fn test_renderable_view() {
    let pipeline = ScriptedPipeline::new().with_cached(FULL, solid_image(6, 3, 77));
    let loader = ImageLoader::new(pipeline);

    assert!(loader.renderable().is_none());
    loader.load(ImageRequest::new(FULL)).await;

    let rendered = loader.renderable().expect("image is displayed");
    assert_eq!(rendered.dimensions(), (6, 3));
    assert_eq!(rendered.get_pixel(0, 0).0, [77, 77, 77, 255]);
}

#[tokio::test]
async fn test_loader_works_without_subscribers() {
    let pipeline = ScriptedPipeline::new().with_cached(FULL, solid_image(2, 2, 5));
    let loader = ImageLoader::new(pipeline);

    loader.load(ImageRequest::new(FULL)).await;
    assert_eq!(loader.phase(), LoadPhase::FullComplete);
}
