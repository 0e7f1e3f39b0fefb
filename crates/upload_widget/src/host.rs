use upload_core::{LoaderId, Notification, NotificationId};

use crate::dom::{Bookmark, DocRange, InsertMode, NodeId, WidgetId};

/// A widget instance created by the host's widget system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetInstance {
    pub id: WidgetId,
    pub name: String,
}

/// Result of re-scanning the document for widgets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WidgetScan {
    /// Instances created by this scan, in document order.
    pub created: Vec<WidgetInstance>,
    /// Instances torn down by this scan.
    pub destroyed: Vec<WidgetId>,
}

/// The editor the upload machinery runs inside.
///
/// Covers the editable document, the selection, the widget system, undo
/// snapshot announcements and notifications. Every method is called from the
/// editor's single event thread.
pub trait EditorHost {
    /// First live node carrying `loader` in its upload-id attribute.
    fn find_by_upload_id(&self, loader: LoaderId) -> Option<NodeId>;
    fn attribute(&self, node: NodeId, name: &str) -> Option<String>;
    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str);
    fn add_class(&mut self, node: NodeId, class: &str);
    fn remove_class(&mut self, node: NodeId, class: &str);

    /// Range starting right before `node` and ending right after it.
    fn range_around(&self, node: NodeId) -> Option<DocRange>;
    /// Bookmarks the current selection; restored by [`EditorHost::select_bookmarks`].
    fn create_selection_bookmarks(&mut self) -> Vec<Bookmark>;
    fn select_bookmarks(&mut self, bookmarks: Vec<Bookmark>);
    /// Bookmarks `range`, adjusting it so it still spans the same content.
    fn create_range_bookmark(&mut self, range: &mut DocRange) -> Bookmark;
    /// Resolves and removes a range bookmark.
    fn move_to_bookmark(&mut self, bookmark: Bookmark) -> Option<DocRange>;
    fn select_range(&mut self, range: &DocRange);
    fn insert_html_into_range(&mut self, html: &str, range: &DocRange, mode: InsertMode);

    /// Registers a widget type so marked elements of that name get upcast.
    fn add_widget_type(&mut self, name: &str);
    /// The widget's wrapper node while it is attached to the document.
    fn widget_wrapper(&self, widget: WidgetId) -> Option<NodeId>;
    fn focused_widget(&self) -> Option<WidgetId>;
    /// Upcasts marked elements into widget instances and drops instances whose
    /// wrapper left the document. Without `init_only_new` every instance is
    /// rebuilt.
    fn check_widgets(&mut self, init_only_new: bool) -> WidgetScan;
    /// Removes the widget together with its wrapper from the document.
    fn delete_widget(&mut self, widget: WidgetId);
    /// Destroys the instance, leaving the document untouched.
    fn destroy_widget(&mut self, widget: WidgetId, skip_remove_from_repository: bool);

    /// Opens an undo-snapshot transaction; nested calls must balance.
    fn lock_snapshot(&mut self);
    fn unlock_snapshot(&mut self);

    fn show_notification(&mut self, notification: Notification) -> NotificationId;
    fn update_notification(&mut self, id: NotificationId, notification: Notification);
    fn hide_notification(&mut self, id: NotificationId);
}
