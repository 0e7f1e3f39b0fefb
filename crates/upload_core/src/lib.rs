//! Upload core: loader states and the notification aggregator, free of any editor host.
mod aggregator;
mod messages;
mod notification;
mod status;

pub use aggregator::{
    AggregatorError, AggregatorId, AggregatorSignal, NotificationAggregator, TaskId, TaskState,
    UploadTask,
};
pub use messages::{render_progress, UploadMessages};
pub use notification::{Notification, NotificationId, NotificationKind};
pub use status::{LoadMethod, LoaderEvent, LoaderId, LoaderSnapshot, LoaderStatus};
