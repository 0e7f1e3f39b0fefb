use pretty_assertions::assert_eq;
use upload_core::{
    AggregatorError, AggregatorId, AggregatorSignal, NotificationAggregator, TaskId, TaskState,
    UploadMessages,
};

fn init_logging() {
    upload_logging::initialize_for_tests();
}

fn aggregator() -> NotificationAggregator {
    let messages = UploadMessages::default();
    NotificationAggregator::new(AggregatorId(1), messages.upload_many, messages.upload_one)
}

fn finished_count(signals: &[AggregatorSignal]) -> usize {
    signals
        .iter()
        .filter(|signal| matches!(signal, AggregatorSignal::Finished { .. }))
        .count()
}

#[test]
fn finishes_only_after_every_task_resolves() {
    init_logging();
    let mut aggregator = aggregator();
    let (first, _) = aggregator.create_task(10).unwrap();
    let (second, _) = aggregator.create_task(20).unwrap();

    let signals = aggregator.update(first, 5).unwrap();
    assert_eq!(finished_count(&signals), 0);

    let signals = aggregator.update(second, 20).unwrap();
    assert_eq!(finished_count(&signals), 0);
    let signals = aggregator.done(second).unwrap();
    assert_eq!(finished_count(&signals), 0);
    assert!(!aggregator.is_finished());
    assert_eq!(aggregator.percentage(), 25.0 / 30.0);

    let signals = aggregator.done(first).unwrap();
    assert_eq!(signals.last(), Some(&AggregatorSignal::Finished { task_count: 2 }));
    assert!(aggregator.is_finished());

    // Resolving again never re-fires.
    assert!(aggregator.done(first).unwrap().is_empty());
    assert!(aggregator.cancel(second).unwrap().is_empty());
}

#[test]
fn cancelled_task_also_resolves_the_aggregate() {
    init_logging();
    let mut aggregator = aggregator();
    let (first, _) = aggregator.create_task(10).unwrap();
    let (second, _) = aggregator.create_task(20).unwrap();
    aggregator.done(second).unwrap();

    let signals = aggregator.cancel(first).unwrap();

    assert_eq!(finished_count(&signals), 1);
    assert_eq!(signals.last(), Some(&AggregatorSignal::Finished { task_count: 1 }));
    assert_eq!(aggregator.task(first).unwrap().state(), TaskState::Cancelled);
}

#[test]
fn all_cancelled_finishes_with_zero_tasks() {
    init_logging();
    let mut aggregator = aggregator();
    let (only, _) = aggregator.create_task(100).unwrap();
    aggregator.update(only, 40).unwrap();

    let signals = aggregator.cancel(only).unwrap();

    assert_eq!(signals.last(), Some(&AggregatorSignal::Finished { task_count: 0 }));
    assert_eq!(aggregator.task_count(), 0);
    assert_eq!(aggregator.percentage(), 0.0);
}

#[test]
fn finished_aggregator_rejects_new_tasks() {
    init_logging();
    let mut aggregator = aggregator();
    let (task, _) = aggregator.create_task(1).unwrap();
    aggregator.done(task).unwrap();

    assert_eq!(aggregator.create_task(5).unwrap_err(), AggregatorError::Finished);
}

#[test]
fn progress_is_clamped_and_ignored_after_resolution() {
    init_logging();
    let mut aggregator = aggregator();
    let (task, _) = aggregator.create_task(10).unwrap();
    let (_other, _) = aggregator.create_task(10).unwrap();

    aggregator.update(task, 50).unwrap();
    assert_eq!(aggregator.task(task).unwrap().progress(), 10);

    aggregator.cancel(task).unwrap();
    assert!(aggregator.update(task, 3).unwrap().is_empty());
    assert_eq!(aggregator.task(task).unwrap().progress(), 10);
}

#[test]
fn unchanged_progress_emits_nothing() {
    init_logging();
    let mut aggregator = aggregator();
    let (task, _) = aggregator.create_task(10).unwrap();
    assert_eq!(aggregator.update(task, 4).unwrap().len(), 1);
    assert!(aggregator.update(task, 4).unwrap().is_empty());
}

#[test]
fn unknown_task_is_an_error() {
    init_logging();
    let mut aggregator = aggregator();
    aggregator.create_task(1).unwrap();

    assert_eq!(
        aggregator.done(TaskId(99)).unwrap_err(),
        AggregatorError::UnknownTask(TaskId(99))
    );
}

#[test]
fn message_uses_singular_template_for_one_task() {
    init_logging();
    let mut aggregator = aggregator();
    let (task, signals) = aggregator.create_task(200).unwrap();
    assert_eq!(
        signals,
        vec![AggregatorSignal::Progress {
            message: "Uploading file (0%)...".to_string(),
            progress: 0.0,
        }]
    );

    aggregator.update(task, 50).unwrap();
    assert_eq!(aggregator.message(), "Uploading file (25%)...");

    let (second, _) = aggregator.create_task(200).unwrap();
    aggregator.done(second).unwrap();
    assert_eq!(aggregator.message(), "Uploading files, 1 of 2 done (62%)...");
}

#[test]
fn zero_weight_tasks_count_by_completion() {
    init_logging();
    let mut aggregator = aggregator();
    let (first, _) = aggregator.create_task(0).unwrap();
    aggregator.create_task(0).unwrap();

    aggregator.done(first).unwrap();

    assert_eq!(aggregator.percentage(), 0.5);
}
