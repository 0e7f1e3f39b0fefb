use thiserror::Error;
use upload_core::{AggregatorError, LoaderId, LoaderStatus};

use crate::dom::WidgetId;

#[derive(Debug, Error)]
pub enum WidgetError {
    #[error("widget {0} has no element carrying an upload id")]
    MissingUploadId(WidgetId),
    #[error("no loader with id {0} in the uploads repository")]
    UnknownLoader(LoaderId),
    #[error("loader {loader} is already bound to widget {widget}")]
    AlreadyBound { loader: LoaderId, widget: WidgetId },
    #[error("loader {loader} already settled as {status}; nothing left to report")]
    LoaderSettled { loader: LoaderId, status: LoaderStatus },
    #[error("widget {0} is not an initialized upload widget")]
    UnknownWidget(WidgetId),
    #[error("no upload widget definition named {0:?}")]
    UnknownDefinition(String),
    #[error("an upload widget named {0:?} is already registered")]
    DuplicateDefinition(String),
    #[error("invalid supported types pattern: {0}")]
    InvalidSupportedTypes(#[from] regex::Error),
    #[error("notification aggregator: {0}")]
    Aggregator(#[from] AggregatorError),
}
