//! Upload widgets: placeholders bound to file loaders, their teardown, and
//! upload progress notifications.
mod controller;
mod definition;
mod dom;
mod error;
mod host;
mod loader;
pub mod memory;
mod notifications;
mod paste;
mod session;

pub use controller::UploadWidget;
pub use definition::{FileToElement, HookContext, HookOutcome, StatusHook, UploadWidgetDefinition};
pub use dom::{
    escape_text, Bookmark, DocRange, Element, InsertMode, NodeId, WidgetId, UPLOAD_ID_ATTRIBUTE,
    WIDGET_ATTRIBUTE,
};
pub use error::WidgetError;
pub use host::{EditorHost, WidgetInstance, WidgetScan};
pub use loader::{FileLoader, PastedFile, UploadRepository};
pub use paste::{is_type_supported, mark_element, PasteData};
pub use session::{SessionConfig, UploadSession, DEFAULT_CLASS_PREFIX};
