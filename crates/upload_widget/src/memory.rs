//! In-memory editor host and scripted loaders.
//!
//! The document is a flat list of nodes; a position is an index into it.
//! Good enough to drive upload widgets without a browser, and what the
//! test suites and the demo run against.

use std::collections::{BTreeMap, BTreeSet};

use upload_core::{
    LoadMethod, LoaderId, LoaderSnapshot, LoaderStatus, Notification, NotificationId,
};

use crate::dom::{
    escape_text, Bookmark, DocRange, Element, InsertMode, NodeId, WidgetId, WIDGET_ATTRIBUTE,
};
use crate::host::{EditorHost, WidgetInstance, WidgetScan};
use crate::loader::{FileLoader, PastedFile, UploadRepository};
use crate::paste::PasteData;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeContent {
    Element(Element),
    /// Markup inserted verbatim.
    Html(String),
    Text(String),
    /// Invisible bookmark boundary.
    Marker(Bookmark, MarkerSide),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerSide {
    Start,
    End,
    Collapsed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    Caret(usize),
    Range { start: usize, end: usize },
}

impl Selection {
    fn from_range(range: &DocRange) -> Self {
        if range.is_collapsed() {
            Selection::Caret(range.start)
        } else {
            Selection::Range {
                start: range.start,
                end: range.end,
            }
        }
    }

    fn map(self, f: impl Fn(usize) -> usize) -> Self {
        match self {
            Selection::Caret(at) => Selection::Caret(f(at)),
            Selection::Range { start, end } => Selection::Range {
                start: f(start),
                end: f(end),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotEvent {
    Lock,
    Unlock,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShownNotification {
    pub id: NotificationId,
    pub notification: Notification,
    pub visible: bool,
    pub updates: usize,
}

#[derive(Debug, Clone)]
struct DocNode {
    id: NodeId,
    content: NodeContent,
}

#[derive(Debug, Clone)]
struct MemoryWidget {
    node: NodeId,
    name: String,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryEditor {
    nodes: Vec<DocNode>,
    selection: Option<Selection>,
    widget_types: BTreeSet<String>,
    widgets: BTreeMap<WidgetId, MemoryWidget>,
    focused: Option<WidgetId>,
    destroy_calls: Vec<WidgetId>,
    snapshot_depth: usize,
    snapshot_log: Vec<SnapshotEvent>,
    notifications: BTreeMap<NotificationId, ShownNotification>,
    next_id: u64,
}

impl MemoryEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_element(&mut self, element: Element) -> NodeId {
        self.insert_node(self.nodes.len(), NodeContent::Element(element))
    }

    pub fn push_text(&mut self, text: impl Into<String>) -> NodeId {
        self.insert_node(self.nodes.len(), NodeContent::Text(text.into()))
    }

    pub fn insert_elements(
        &mut self,
        at: usize,
        elements: impl IntoIterator<Item = Element>,
    ) -> Vec<NodeId> {
        let mut at = at.min(self.nodes.len());
        let mut inserted = Vec::new();
        for element in elements {
            inserted.push(self.insert_node(at, NodeContent::Element(element)));
            at += 1;
        }
        inserted
    }

    /// Inserts pasted placeholders at the caret (or the end) and puts the
    /// caret after them.
    pub fn paste(&mut self, data: &PasteData) -> Vec<NodeId> {
        let at = match self.selection {
            Some(Selection::Caret(at)) => at,
            Some(Selection::Range { end, .. }) => end,
            None => self.nodes.len(),
        }
        .min(self.nodes.len());
        let inserted = self.insert_elements(at, data.elements.iter().cloned());
        self.selection = Some(Selection::Caret(at + inserted.len()));
        inserted
    }

    /// Removes a node the way a user edit would, leaving widget instances
    /// for the next widget check.
    pub fn remove_node(&mut self, node: NodeId) -> Option<NodeContent> {
        let index = self.index_of(node)?;
        Some(self.remove_at(index).content)
    }

    pub fn index_of(&self, node: NodeId) -> Option<usize> {
        self.nodes.iter().position(|candidate| candidate.id == node)
    }

    pub fn content(&self, node: NodeId) -> Option<&NodeContent> {
        self.index_of(node).map(|index| &self.nodes[index].content)
    }

    pub fn content_at(&self, index: usize) -> Option<&NodeContent> {
        self.nodes.get(index).map(|node| &node.content)
    }

    pub fn element(&self, node: NodeId) -> Option<&Element> {
        match self.content(node)? {
            NodeContent::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn selection(&self) -> Option<Selection> {
        self.selection
    }

    pub fn set_selection(&mut self, selection: Option<Selection>) {
        self.selection = selection;
        self.focused = None;
    }

    /// Focuses the widget and selects its wrapper.
    pub fn focus_widget(&mut self, widget: WidgetId) -> bool {
        let Some(index) = self
            .widgets
            .get(&widget)
            .and_then(|instance| self.index_of(instance.node))
        else {
            return false;
        };
        self.focused = Some(widget);
        self.selection = Some(Selection::Range {
            start: index,
            end: index + 1,
        });
        true
    }

    pub fn widget_at(&self, node: NodeId) -> Option<WidgetId> {
        self.widgets
            .iter()
            .find(|(_, instance)| instance.node == node)
            .map(|(id, _)| *id)
    }

    pub fn widget_name(&self, widget: WidgetId) -> Option<&str> {
        self.widgets.get(&widget).map(|instance| instance.name.as_str())
    }

    pub fn widget_ids(&self) -> Vec<WidgetId> {
        self.widgets.keys().copied().collect()
    }

    /// Serialized document; bookmarks leave no trace.
    pub fn to_html(&self) -> String {
        self.nodes
            .iter()
            .map(|node| match &node.content {
                NodeContent::Element(element) => element.outer_html(),
                NodeContent::Html(html) => html.clone(),
                NodeContent::Text(text) => escape_text(text),
                NodeContent::Marker(..) => String::new(),
            })
            .collect()
    }

    pub fn has_markers(&self) -> bool {
        self.nodes
            .iter()
            .any(|node| matches!(node.content, NodeContent::Marker(..)))
    }

    pub fn snapshot_log(&self) -> &[SnapshotEvent] {
        &self.snapshot_log
    }

    pub fn snapshot_locked(&self) -> bool {
        self.snapshot_depth > 0
    }

    pub fn destroy_calls(&self) -> &[WidgetId] {
        &self.destroy_calls
    }

    pub fn notifications(&self) -> impl Iterator<Item = &ShownNotification> {
        self.notifications.values()
    }

    pub fn visible_notifications(&self) -> Vec<&ShownNotification> {
        self.notifications
            .values()
            .filter(|shown| shown.visible)
            .collect()
    }

    pub fn notification(&self, id: NotificationId) -> Option<&ShownNotification> {
        self.notifications.get(&id)
    }

    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn insert_node(&mut self, index: usize, content: NodeContent) -> NodeId {
        let id = NodeId(self.next_id());
        let index = index.min(self.nodes.len());
        self.nodes.insert(index, DocNode { id, content });
        self.selection = self
            .selection
            .map(|selection| selection.map(|at| if at > index { at + 1 } else { at }));
        id
    }

    fn remove_at(&mut self, index: usize) -> DocNode {
        let node = self.nodes.remove(index);
        self.selection = self
            .selection
            .map(|selection| selection.map(|at| if at > index { at - 1 } else { at }));
        node
    }

    fn element_mut(&mut self, node: NodeId) -> Option<&mut Element> {
        let index = self.index_of(node)?;
        match &mut self.nodes[index].content {
            NodeContent::Element(element) => Some(element),
            _ => None,
        }
    }

    fn marker_index(&self, bookmark: Bookmark, side: MarkerSide) -> Option<usize> {
        self.nodes
            .iter()
            .position(|node| node.content == NodeContent::Marker(bookmark, side))
    }

    /// Resolves a bookmark to the range between its markers and removes them.
    fn take_bookmark(&mut self, bookmark: Bookmark) -> Option<DocRange> {
        if let Some(at) = self.marker_index(bookmark, MarkerSide::Collapsed) {
            self.remove_at(at);
            return Some(DocRange { start: at, end: at });
        }
        let start = self.marker_index(bookmark, MarkerSide::Start)?;
        self.remove_at(start);
        let end = self.marker_index(bookmark, MarkerSide::End)?;
        self.remove_at(end);
        Some(DocRange { start, end })
    }
}

impl EditorHost for MemoryEditor {
    fn find_by_upload_id(&self, loader: LoaderId) -> Option<NodeId> {
        self.nodes.iter().find_map(|node| match &node.content {
            NodeContent::Element(element) if element.upload_id() == Some(loader) => Some(node.id),
            _ => None,
        })
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.element(node)?.attribute(name).map(str::to_owned)
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        if let Some(element) = self.element_mut(node) {
            element.set_attribute(name, value);
        }
    }

    fn add_class(&mut self, node: NodeId, class: &str) {
        if let Some(element) = self.element_mut(node) {
            element.add_class(class);
        }
    }

    fn remove_class(&mut self, node: NodeId, class: &str) {
        if let Some(element) = self.element_mut(node) {
            element.remove_class(class);
        }
    }

    fn range_around(&self, node: NodeId) -> Option<DocRange> {
        let index = self.index_of(node)?;
        Some(DocRange {
            start: index,
            end: index + 1,
        })
    }

    fn create_selection_bookmarks(&mut self) -> Vec<Bookmark> {
        let Some(selection) = self.selection.take() else {
            return Vec::new();
        };
        let bookmark = Bookmark(self.next_id());
        match selection {
            Selection::Caret(at) => {
                self.insert_node(at, NodeContent::Marker(bookmark, MarkerSide::Collapsed));
            }
            Selection::Range { start, end } => {
                self.insert_node(end, NodeContent::Marker(bookmark, MarkerSide::End));
                self.insert_node(start, NodeContent::Marker(bookmark, MarkerSide::Start));
            }
        }
        vec![bookmark]
    }

    fn select_bookmarks(&mut self, bookmarks: Vec<Bookmark>) {
        for bookmark in bookmarks {
            if let Some(range) = self.take_bookmark(bookmark) {
                self.selection = Some(Selection::from_range(&range));
            }
        }
    }

    fn create_range_bookmark(&mut self, range: &mut DocRange) -> Bookmark {
        let bookmark = Bookmark(self.next_id());
        self.insert_node(range.end, NodeContent::Marker(bookmark, MarkerSide::End));
        self.insert_node(range.start, NodeContent::Marker(bookmark, MarkerSide::Start));
        range.start += 1;
        range.end += 1;
        bookmark
    }

    fn move_to_bookmark(&mut self, bookmark: Bookmark) -> Option<DocRange> {
        self.take_bookmark(bookmark)
    }

    fn select_range(&mut self, range: &DocRange) {
        self.selection = Some(Selection::from_range(range));
    }

    fn insert_html_into_range(&mut self, html: &str, range: &DocRange, mode: InsertMode) {
        let start = range.start.min(self.nodes.len());
        let end = range.end.clamp(start, self.nodes.len());
        for _ in start..end {
            self.remove_at(start);
        }
        let content = match mode {
            InsertMode::Text => NodeContent::Text(html.to_string()),
            InsertMode::Html | InsertMode::UnfilteredHtml => NodeContent::Html(html.to_string()),
        };
        self.insert_node(start, content);
    }

    fn add_widget_type(&mut self, name: &str) {
        self.widget_types.insert(name.to_string());
    }

    fn widget_wrapper(&self, widget: WidgetId) -> Option<NodeId> {
        let node = self.widgets.get(&widget)?.node;
        self.index_of(node).map(|_| node)
    }

    fn focused_widget(&self) -> Option<WidgetId> {
        self.focused
            .filter(|widget| self.widget_wrapper(*widget).is_some())
    }

    fn check_widgets(&mut self, init_only_new: bool) -> WidgetScan {
        let mut scan = WidgetScan::default();

        let stale: Vec<WidgetId> = self
            .widgets
            .iter()
            .filter(|(_, instance)| !init_only_new || self.index_of(instance.node).is_none())
            .map(|(id, _)| *id)
            .collect();
        for widget in stale {
            self.widgets.remove(&widget);
            scan.destroyed.push(widget);
        }

        let wrapped: BTreeSet<NodeId> = self.widgets.values().map(|instance| instance.node).collect();
        let candidates: Vec<(NodeId, String)> = self
            .nodes
            .iter()
            .filter(|node| !wrapped.contains(&node.id))
            .filter_map(|node| match &node.content {
                NodeContent::Element(element) => element
                    .attribute(WIDGET_ATTRIBUTE)
                    .filter(|name| self.widget_types.contains(*name))
                    .map(|name| (node.id, name.to_string())),
                _ => None,
            })
            .collect();
        for (node, name) in candidates {
            let id = WidgetId(self.next_id());
            self.widgets.insert(
                id,
                MemoryWidget {
                    node,
                    name: name.clone(),
                },
            );
            scan.created.push(WidgetInstance { id, name });
        }
        scan
    }

    fn delete_widget(&mut self, widget: WidgetId) {
        if let Some(instance) = self.widgets.remove(&widget) {
            if let Some(index) = self.index_of(instance.node) {
                self.remove_at(index);
            }
        }
    }

    fn destroy_widget(&mut self, widget: WidgetId, _skip_remove_from_repository: bool) {
        self.widgets.remove(&widget);
        self.destroy_calls.push(widget);
    }

    fn lock_snapshot(&mut self) {
        self.snapshot_depth += 1;
        self.snapshot_log.push(SnapshotEvent::Lock);
    }

    fn unlock_snapshot(&mut self) {
        self.snapshot_depth = self.snapshot_depth.saturating_sub(1);
        self.snapshot_log.push(SnapshotEvent::Unlock);
    }

    fn show_notification(&mut self, notification: Notification) -> NotificationId {
        let id = NotificationId(self.next_id());
        self.notifications.insert(
            id,
            ShownNotification {
                id,
                notification,
                visible: true,
                updates: 0,
            },
        );
        id
    }

    fn update_notification(&mut self, id: NotificationId, notification: Notification) {
        if let Some(shown) = self.notifications.get_mut(&id) {
            shown.notification = notification;
            shown.updates += 1;
        }
    }

    fn hide_notification(&mut self, id: NotificationId) {
        if let Some(shown) = self.notifications.get_mut(&id) {
            shown.visible = false;
        }
    }
}

/// A loader whose progress is driven by hand through [`ScriptedLoaders`].
#[derive(Debug, Clone)]
pub struct ScriptedLoader {
    id: LoaderId,
    file: PastedFile,
    status: LoaderStatus,
    uploaded: u64,
    message: Option<String>,
    url: Option<String>,
    started: Option<(LoadMethod, Option<String>)>,
    abort_calls: usize,
}

impl ScriptedLoader {
    pub fn file(&self) -> &PastedFile {
        &self.file
    }

    pub fn abort_calls(&self) -> usize {
        self.abort_calls
    }

    /// How the loader was started, with the upload URL it was given.
    pub fn started(&self) -> Option<(LoadMethod, Option<&str>)> {
        self.started
            .as_ref()
            .map(|(method, url)| (*method, url.as_deref()))
    }

    fn begin(&mut self, method: LoadMethod, url: Option<&str>, status: LoaderStatus) {
        if self.status == LoaderStatus::Idle {
            self.started = Some((method, url.map(str::to_owned)));
            self.status = status;
        }
    }
}

impl FileLoader for ScriptedLoader {
    fn id(&self) -> LoaderId {
        self.id
    }

    fn snapshot(&self) -> LoaderSnapshot {
        LoaderSnapshot {
            id: self.id,
            status: self.status,
            file_name: self.file.name.clone(),
            total: self.file.size,
            uploaded: self.uploaded,
            message: self.message.clone(),
            url: self.url.clone(),
        }
    }

    fn load(&mut self, url: Option<&str>) {
        self.begin(LoadMethod::Load, url, LoaderStatus::Loading);
    }

    fn upload(&mut self, url: Option<&str>) {
        self.begin(LoadMethod::Upload, url, LoaderStatus::Uploading);
    }

    fn load_and_upload(&mut self, url: Option<&str>) {
        self.begin(LoadMethod::LoadAndUpload, url, LoaderStatus::Loading);
    }

    fn abort(&mut self) {
        self.abort_calls += 1;
        if !self.status.is_settled() {
            self.status = LoaderStatus::Abort;
        }
    }
}

/// Loader repository whose transfers never run on their own.
///
/// Setters return `false` when the change is refused: unknown loader or a
/// transition the status model forbids.
#[derive(Debug, Clone, Default)]
pub struct ScriptedLoaders {
    loaders: BTreeMap<LoaderId, ScriptedLoader>,
    next_id: u64,
}

impl ScriptedLoaders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: LoaderId) -> Option<&ScriptedLoader> {
        self.loaders.get(&id)
    }

    pub fn ids(&self) -> Vec<LoaderId> {
        self.loaders.keys().copied().collect()
    }

    pub fn set_status(&mut self, id: LoaderId, status: LoaderStatus) -> bool {
        match self.loaders.get_mut(&id) {
            Some(loader) if loader.status.can_advance_to(status) => {
                loader.status = status;
                true
            }
            _ => false,
        }
    }

    /// Sets uploaded bytes, clamped to the file size.
    pub fn set_progress(&mut self, id: LoaderId, uploaded: u64) -> bool {
        match self.loaders.get_mut(&id) {
            Some(loader) if !loader.status.is_settled() => {
                loader.uploaded = uploaded.min(loader.file.size);
                true
            }
            _ => false,
        }
    }

    pub fn fail(&mut self, id: LoaderId, message: impl Into<String>) -> bool {
        if !self.set_status(id, LoaderStatus::Error) {
            return false;
        }
        if let Some(loader) = self.loaders.get_mut(&id) {
            loader.message = Some(message.into());
        }
        true
    }

    /// Marks the upload finished with the server-reported `url`.
    pub fn complete(&mut self, id: LoaderId, url: impl Into<String>) -> bool {
        if !self.set_status(id, LoaderStatus::Uploaded) {
            return false;
        }
        if let Some(loader) = self.loaders.get_mut(&id) {
            loader.uploaded = loader.file.size;
            loader.url = Some(url.into());
        }
        true
    }
}

impl UploadRepository for ScriptedLoaders {
    fn create(&mut self, file: &PastedFile) -> LoaderId {
        self.next_id += 1;
        let id = LoaderId(self.next_id);
        self.loaders.insert(
            id,
            ScriptedLoader {
                id,
                file: file.clone(),
                status: LoaderStatus::Idle,
                uploaded: 0,
                message: None,
                url: None,
                started: None,
                abort_calls: 0,
            },
        );
        id
    }

    fn loader(&self, id: LoaderId) -> Option<&dyn FileLoader> {
        self.loaders.get(&id).map(|loader| loader as &dyn FileLoader)
    }

    fn loader_mut(&mut self, id: LoaderId) -> Option<&mut dyn FileLoader> {
        self.loaders
            .get_mut(&id)
            .map(|loader| loader as &mut dyn FileLoader)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn editor_with(texts: &[&str]) -> MemoryEditor {
        let mut editor = MemoryEditor::new();
        for text in texts {
            editor.push_text(*text);
        }
        editor
    }

    #[test]
    fn selection_bookmarks_survive_edits_before_them() {
        let mut editor = editor_with(&["a", "b", "c"]);
        let first = editor.content_at(0).cloned();
        editor.set_selection(Some(Selection::Range { start: 1, end: 2 }));

        let bookmarks = editor.create_selection_bookmarks();
        assert_eq!(editor.selection(), None);
        assert!(editor.has_markers());

        let range = DocRange { start: 0, end: 1 };
        editor.insert_html_into_range("<p>x</p><p>y</p>", &range, InsertMode::Html);
        assert_ne!(editor.content_at(0).cloned(), first);

        editor.select_bookmarks(bookmarks);
        assert!(!editor.has_markers());
        assert_eq!(editor.selection(), Some(Selection::Range { start: 1, end: 2 }));
        assert_eq!(editor.content_at(1), Some(&NodeContent::Text("b".into())));
    }

    #[test]
    fn range_bookmark_tracks_replaced_content() {
        let mut editor = editor_with(&["a", "b", "c"]);
        let mut range = DocRange { start: 1, end: 2 };

        let bookmark = editor.create_range_bookmark(&mut range);
        assert_eq!(editor.content_at(range.start), Some(&NodeContent::Text("b".into())));

        editor.insert_html_into_range("<b>B</b>", &range, InsertMode::Html);
        let restored = editor.move_to_bookmark(bookmark);

        assert_eq!(restored, Some(DocRange { start: 1, end: 2 }));
        assert_eq!(
            editor.content_at(1),
            Some(&NodeContent::Html("<b>B</b>".into()))
        );
        assert_eq!(editor.to_html(), "a<b>B</b>c");
    }

    #[test]
    fn caret_bookmark_restores_a_caret() {
        let mut editor = editor_with(&["a", "b"]);
        editor.set_selection(Some(Selection::Caret(2)));

        let bookmarks = editor.create_selection_bookmarks();
        editor.select_bookmarks(bookmarks);

        assert_eq!(editor.selection(), Some(Selection::Caret(2)));
        assert_eq!(editor.len(), 2);
    }

    #[test]
    fn scripted_loader_refuses_backwards_moves() {
        let mut loaders = ScriptedLoaders::new();
        let id = loaders.create(&PastedFile::new("a.txt", "text/plain", 10));

        assert!(loaders.set_status(id, LoaderStatus::Uploading));
        assert!(!loaders.set_status(id, LoaderStatus::Loading));
        assert!(loaders.complete(id, "/files/a.txt"));
        assert!(!loaders.fail(id, "too late"));
        assert_eq!(loaders.get(id).map(|l| l.snapshot().uploaded), Some(10));
    }
}
