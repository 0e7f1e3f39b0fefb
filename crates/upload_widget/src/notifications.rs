use std::collections::HashMap;

use upload_core::{
    AggregatorId, AggregatorSignal, LoaderEvent, LoaderId, LoaderSnapshot, LoaderStatus,
    Notification, NotificationAggregator, NotificationId, TaskId, UploadMessages,
};
use upload_logging::{upload_debug, upload_info, upload_warn};

use crate::host::EditorHost;
use crate::WidgetError;

/// The aggregator currently collecting uploads, with the notification it drives.
struct AggregatedNotification {
    aggregator: NotificationAggregator,
    notification: Option<NotificationId>,
}

/// A loader's task. Resolved bindings are kept so a later bind of the same
/// loader returns the original task instead of opening one that never ends.
#[derive(Debug, Clone, Copy)]
struct TaskBinding {
    aggregator: AggregatorId,
    task: TaskId,
    resolved: bool,
    quiet: bool,
}

/// Per-editor notification state for uploads.
///
/// Holds at most one live aggregator. A new one is started when the first
/// loader is bound while none exists or the previous one finished; finished
/// aggregators are simply dropped.
pub(crate) struct NotificationHub {
    messages: UploadMessages,
    current: Option<AggregatedNotification>,
    bindings: HashMap<LoaderId, TaskBinding>,
    next_aggregator: u64,
}

impl NotificationHub {
    pub(crate) fn new(messages: UploadMessages) -> Self {
        Self {
            messages,
            current: None,
            bindings: HashMap::new(),
            next_aggregator: 0,
        }
    }

    pub(crate) fn current(&self) -> Option<&NotificationAggregator> {
        self.current.as_ref().map(|entry| &entry.aggregator)
    }

    /// Whether `loader` still feeds a task that has not resolved.
    pub(crate) fn is_reporting(&self, loader: LoaderId) -> bool {
        self.bindings
            .get(&loader)
            .is_some_and(|binding| !binding.resolved)
    }

    /// The next abort of `loader` cancels its task without telling the user.
    pub(crate) fn silence(&mut self, loader: LoaderId) {
        if let Some(binding) = self.bindings.get_mut(&loader) {
            binding.quiet = true;
        }
    }

    /// Adds a task for `loader` to the current aggregator, starting a new
    /// aggregator when needed. Binding the same loader again returns its task.
    ///
    /// A loader that already settled would leave a task nothing resolves, so
    /// it is refused.
    pub(crate) fn bind(
        &mut self,
        host: &mut dyn EditorHost,
        loader: &LoaderSnapshot,
    ) -> Result<TaskId, WidgetError> {
        if let Some(binding) = self.bindings.get(&loader.id) {
            upload_debug!("loader {} already reports to aggregator {}", loader.id, binding.aggregator);
            return Ok(binding.task);
        }
        if loader.status.is_settled() {
            return Err(WidgetError::LoaderSettled {
                loader: loader.id,
                status: loader.status,
            });
        }

        if self
            .current
            .as_ref()
            .is_some_and(|entry| entry.aggregator.is_finished())
        {
            self.current = None;
        }

        let messages = &self.messages;
        let next_aggregator = &mut self.next_aggregator;
        let entry = self.current.get_or_insert_with(|| {
            *next_aggregator += 1;
            let id = AggregatorId(*next_aggregator);
            upload_info!("starting upload notification aggregator {}", id);
            AggregatedNotification {
                aggregator: NotificationAggregator::new(
                    id,
                    messages.upload_many.clone(),
                    messages.upload_one.clone(),
                ),
                notification: None,
            }
        });

        let (task, signals) = entry.aggregator.create_task(loader.total)?;
        apply_signals(entry, host, messages, signals);
        self.bindings.insert(
            loader.id,
            TaskBinding {
                aggregator: entry.aggregator.id(),
                task,
                resolved: false,
                quiet: false,
            },
        );
        Ok(task)
    }

    pub(crate) fn on_event(
        &mut self,
        host: &mut dyn EditorHost,
        loader: &LoaderSnapshot,
        event: LoaderEvent,
    ) {
        let Some(binding) = self
            .bindings
            .get_mut(&loader.id)
            .filter(|binding| !binding.resolved)
        else {
            return;
        };
        let Some(entry) = self
            .current
            .as_mut()
            .filter(|entry| entry.aggregator.id() == binding.aggregator)
        else {
            binding.resolved = true;
            return;
        };

        let result = match event {
            LoaderEvent::Update if loader.status == LoaderStatus::Uploading => {
                entry.aggregator.update(binding.task, loader.uploaded)
            }
            LoaderEvent::Update | LoaderEvent::Loaded => return,
            LoaderEvent::Uploaded => {
                binding.resolved = true;
                entry.aggregator.done(binding.task)
            }
            LoaderEvent::Error => {
                binding.resolved = true;
                let result = entry.aggregator.cancel(binding.task);
                let message = loader.message.clone().unwrap_or_default();
                upload_warn!("upload of {} failed: {}", loader.file_name, message);
                host.show_notification(Notification::warning(message));
                result
            }
            LoaderEvent::Abort => {
                binding.resolved = true;
                let result = entry.aggregator.cancel(binding.task);
                if binding.quiet {
                    upload_debug!("upload of {} dropped with its placeholder", loader.file_name);
                } else {
                    upload_info!("upload of {} aborted", loader.file_name);
                    host.show_notification(Notification::info(self.messages.abort.clone()));
                }
                result
            }
        };

        match result {
            Ok(signals) => apply_signals(entry, host, &self.messages, signals),
            Err(err) => upload_warn!("dropping progress of loader {}: {}", loader.id, err),
        }
    }
}

fn apply_signals(
    entry: &mut AggregatedNotification,
    host: &mut dyn EditorHost,
    messages: &UploadMessages,
    signals: Vec<AggregatorSignal>,
) {
    for signal in signals {
        match signal {
            AggregatorSignal::Progress { message, progress } => {
                let notification = Notification::progress(message, progress);
                match entry.notification {
                    Some(id) => host.update_notification(id, notification),
                    None => entry.notification = Some(host.show_notification(notification)),
                }
            }
            AggregatorSignal::Finished { task_count } => {
                let Some(id) = entry.notification else {
                    continue;
                };
                if task_count == 0 {
                    host.hide_notification(id);
                } else {
                    host.update_notification(
                        id,
                        Notification::success(messages.done_message(task_count)),
                    );
                }
            }
        }
    }
}
