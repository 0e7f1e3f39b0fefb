use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;
use upload_logging::upload_debug;

use crate::messages::render_progress;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AggregatorId(pub u64);

impl fmt::Display for AggregatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(pub u32);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AggregatorError {
    #[error("task {0} does not belong to this aggregator")]
    UnknownTask(TaskId),
    #[error("aggregator has already finished")]
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Pending,
    Done,
    Cancelled,
}

/// One unit of tracked progress, owned by a [`NotificationAggregator`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTask {
    id: TaskId,
    weight: u64,
    progress: u64,
    state: TaskState,
}

impl UploadTask {
    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn weight(&self) -> u64 {
        self.weight
    }

    pub fn progress(&self) -> u64 {
        self.progress
    }

    pub fn state(&self) -> TaskState {
        self.state
    }

    pub fn is_resolved(&self) -> bool {
        self.state != TaskState::Pending
    }
}

/// What the owner of an aggregator has to do with its notification.
#[derive(Debug, Clone, PartialEq)]
pub enum AggregatorSignal {
    /// Show or refresh the shared progress notification.
    Progress { message: String, progress: f64 },
    /// Every task resolved. Emitted exactly once; `task_count` excludes cancelled tasks.
    Finished { task_count: usize },
}

/// Merges the progress of many upload tasks into one notification.
///
/// Cancelled tasks stop counting towards the totals. The aggregator finishes
/// once every task it owns is done or cancelled and refuses new tasks from
/// then on.
#[derive(Debug, Clone)]
pub struct NotificationAggregator {
    id: AggregatorId,
    many: String,
    one: String,
    tasks: BTreeMap<TaskId, UploadTask>,
    next_task: u32,
    finished: bool,
}

impl NotificationAggregator {
    /// `many` is used while more than one task counts, `one` otherwise.
    pub fn new(id: AggregatorId, many: impl Into<String>, one: impl Into<String>) -> Self {
        Self {
            id,
            many: many.into(),
            one: one.into(),
            tasks: BTreeMap::new(),
            next_task: 1,
            finished: false,
        }
    }

    pub fn id(&self) -> AggregatorId {
        self.id
    }

    pub fn create_task(
        &mut self,
        weight: u64,
    ) -> Result<(TaskId, Vec<AggregatorSignal>), AggregatorError> {
        if self.finished {
            return Err(AggregatorError::Finished);
        }
        let id = TaskId(self.next_task);
        self.next_task += 1;
        self.tasks.insert(
            id,
            UploadTask {
                id,
                weight,
                progress: 0,
                state: TaskState::Pending,
            },
        );
        upload_debug!("aggregator {} created task {} with weight {}", self.id, id, weight);
        Ok((id, vec![self.progress_signal()]))
    }

    /// Records absolute progress of a pending task, clamped to its weight.
    pub fn update(
        &mut self,
        task: TaskId,
        progress: u64,
    ) -> Result<Vec<AggregatorSignal>, AggregatorError> {
        let entry = self.task_mut(task)?;
        if entry.is_resolved() {
            return Ok(Vec::new());
        }
        let progress = progress.min(entry.weight);
        if entry.progress == progress {
            return Ok(Vec::new());
        }
        entry.progress = progress;
        Ok(vec![self.progress_signal()])
    }

    pub fn done(&mut self, task: TaskId) -> Result<Vec<AggregatorSignal>, AggregatorError> {
        let entry = self.task_mut(task)?;
        if entry.is_resolved() {
            return Ok(Vec::new());
        }
        entry.progress = entry.weight;
        entry.state = TaskState::Done;
        Ok(self.after_resolution())
    }

    pub fn cancel(&mut self, task: TaskId) -> Result<Vec<AggregatorSignal>, AggregatorError> {
        let entry = self.task_mut(task)?;
        if entry.is_resolved() {
            return Ok(Vec::new());
        }
        entry.state = TaskState::Cancelled;
        Ok(self.after_resolution())
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn task(&self, task: TaskId) -> Option<&UploadTask> {
        self.tasks.get(&task)
    }

    pub fn tasks(&self) -> impl Iterator<Item = &UploadTask> {
        self.tasks.values()
    }

    /// Number of tasks that were not cancelled.
    pub fn task_count(&self) -> usize {
        self.counted().count()
    }

    pub fn done_task_count(&self) -> usize {
        self.counted()
            .filter(|task| task.state == TaskState::Done)
            .count()
    }

    /// Weight-normalised completion of all counted tasks in `0.0..=1.0`.
    ///
    /// When every counted task has zero weight the ratio of done tasks is used.
    pub fn percentage(&self) -> f64 {
        let total: u64 = self.counted().map(UploadTask::weight).sum();
        if total == 0 {
            let count = self.task_count();
            if count == 0 {
                return 0.0;
            }
            return self.done_task_count() as f64 / count as f64;
        }
        let progress: u64 = self.counted().map(UploadTask::progress).sum();
        progress as f64 / total as f64
    }

    /// Current progress text, singular while exactly one task counts.
    pub fn message(&self) -> String {
        let max = self.task_count();
        let template = if max == 1 { &self.one } else { &self.many };
        let percentage = (self.percentage() * 100.0).floor() as u32;
        render_progress(template, self.done_task_count(), max, percentage)
    }

    fn counted(&self) -> impl Iterator<Item = &UploadTask> {
        self.tasks
            .values()
            .filter(|task| task.state != TaskState::Cancelled)
    }

    fn task_mut(&mut self, task: TaskId) -> Result<&mut UploadTask, AggregatorError> {
        self.tasks
            .get_mut(&task)
            .ok_or(AggregatorError::UnknownTask(task))
    }

    fn progress_signal(&self) -> AggregatorSignal {
        AggregatorSignal::Progress {
            message: self.message(),
            progress: self.percentage(),
        }
    }

    fn after_resolution(&mut self) -> Vec<AggregatorSignal> {
        if self.finished || self.tasks.values().any(|task| !task.is_resolved()) {
            return vec![self.progress_signal()];
        }
        self.finished = true;
        let task_count = self.task_count();
        upload_debug!("aggregator {} finished with {} task(s)", self.id, task_count);
        vec![
            self.progress_signal(),
            AggregatorSignal::Finished { task_count },
        ]
    }
}
