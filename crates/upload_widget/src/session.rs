use std::collections::VecDeque;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use upload_core::{
    LoaderEvent, LoaderId, LoaderSnapshot, LoaderStatus, NotificationAggregator, TaskId,
    UploadMessages,
};
use upload_logging::{upload_debug, upload_info, upload_trace, upload_warn};

use crate::controller::{Controllers, Reaction, UploadWidget};
use crate::definition::{UploadScope, UploadWidgetDefinition};
use crate::dom::{InsertMode, WidgetId, UPLOAD_ID_ATTRIBUTE};
use crate::host::{EditorHost, WidgetInstance};
use crate::loader::{FileLoader, UploadRepository};
use crate::notifications::NotificationHub;
use crate::paste::{mark_element, PasteData};
use crate::WidgetError;

pub const DEFAULT_CLASS_PREFIX: &str = "cke_upload_";

/// Per-editor settings of the upload machinery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Prefix of the status class put on placeholder wrappers.
    pub class_prefix: String,
    pub messages: UploadMessages,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            class_prefix: DEFAULT_CLASS_PREFIX.to_string(),
            messages: UploadMessages::default(),
        }
    }
}

/// A loader change waiting to be delivered to listeners.
#[derive(Debug, Clone, Copy)]
struct Emission {
    loader: LoaderId,
    /// Status the loader entered; `None` for a plain progress update.
    status: Option<LoaderStatus>,
}

/// Upload widgets of one editor: definitions, live controllers and
/// notification bindings, wired to the editor host and the loaders.
///
/// Loader changes are delivered through [`UploadSession::loader_changed`] and
/// [`UploadSession::loader_update`]. Changes caused while listeners run are
/// queued and delivered after the current one, in order.
pub struct UploadSession<H, R> {
    host: H,
    loaders: R,
    class_prefix: String,
    definitions: Vec<Rc<UploadWidgetDefinition>>,
    controllers: Controllers,
    notifications: NotificationHub,
    pending: VecDeque<Emission>,
    draining: bool,
}

impl<H: EditorHost, R: UploadRepository> UploadSession<H, R> {
    pub fn new(host: H, loaders: R) -> Self {
        Self::with_config(host, loaders, SessionConfig::default())
    }

    pub fn with_config(host: H, loaders: R, config: SessionConfig) -> Self {
        Self {
            host,
            loaders,
            class_prefix: config.class_prefix,
            definitions: Vec::new(),
            controllers: Controllers::default(),
            notifications: NotificationHub::new(config.messages),
            pending: VecDeque::new(),
            draining: false,
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Direct access to the editor, e.g. to simulate user edits. Call
    /// [`UploadSession::check_widgets`] afterwards so widgets follow.
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn loaders(&self) -> &R {
        &self.loaders
    }

    /// Direct access to the loaders. Report every status change made through
    /// it with [`UploadSession::loader_changed`].
    pub fn loaders_mut(&mut self) -> &mut R {
        &mut self.loaders
    }

    pub fn into_parts(self) -> (H, R) {
        (self.host, self.loaders)
    }

    /// Registers an upload widget type with the host and, when the definition
    /// builds placeholders, with paste handling.
    pub fn add_upload_widget(
        &mut self,
        definition: UploadWidgetDefinition,
    ) -> Result<(), WidgetError> {
        if self.definition(definition.name()).is_some() {
            return Err(WidgetError::DuplicateDefinition(
                definition.name().to_string(),
            ));
        }
        self.host.add_widget_type(definition.name());
        upload_info!(
            "registered upload widget {:?} (paste: {}, priority {})",
            definition.name(),
            definition.intercepts_paste(),
            definition.priority()
        );
        self.definitions.push(Rc::new(definition));
        // Stable, so equal priorities keep registration order.
        self.definitions.sort_by_key(|definition| definition.priority());
        Ok(())
    }

    pub fn definition(&self, name: &str) -> Option<&UploadWidgetDefinition> {
        self.definition_rc(name).map(Rc::as_ref)
    }

    fn definition_rc(&self, name: &str) -> Option<&Rc<UploadWidgetDefinition>> {
        self.definitions
            .iter()
            .find(|definition| definition.name() == name)
    }

    /// Turns pasted files into marked placeholders with started loaders.
    ///
    /// Returns the loaders created, in placeholder order.
    pub fn handle_paste(&mut self, data: &mut PasteData) -> Vec<LoaderId> {
        let definitions: Vec<Rc<UploadWidgetDefinition>> = self
            .definitions
            .iter()
            .filter(|definition| definition.intercepts_paste())
            .cloned()
            .collect();
        let mut created = Vec::new();

        for definition in definitions {
            if !data.data_value.is_empty() || data.files.is_empty() {
                continue;
            }
            for file in &data.files {
                if !definition.accepts(file) {
                    upload_trace!(
                        "{:?} skips {} ({})",
                        definition.name(),
                        file.name,
                        file.mime_type
                    );
                    continue;
                }
                let Some(mut element) = definition.element_for(file) else {
                    continue;
                };

                let loader = self.loaders.create(file);
                let method = definition.method();
                self.run_loader(loader, |handle| handle.start(method, definition.url()));
                mark_element(&mut element, definition.name(), loader);
                if method.uploads() {
                    if let Err(err) = self.bind_notifications(loader) {
                        upload_warn!("no progress notification for {}: {}", file.name, err);
                    }
                }
                upload_debug!(
                    "pasted {} as {:?} placeholder bound to loader {}",
                    file.name,
                    definition.name(),
                    loader
                );

                data.data_value.push_str(&element.outer_html());
                data.elements.push(element);
                created.push(loader);
            }
        }

        self.drain();
        created
    }

    /// Lets the host upcast new placeholders and drops controllers of
    /// destroyed instances. Returns the widgets initialized by this call.
    pub fn check_widgets(&mut self, init_only_new: bool) -> Vec<WidgetId> {
        let initialized = self.scan_widgets(init_only_new);
        self.drain();
        initialized
    }

    /// Binds a widget instance of a registered upload type to its loader and
    /// syncs it with the loader's current status right away.
    pub fn init_widget(&mut self, instance: &WidgetInstance) -> Result<(), WidgetError> {
        let result = self.init_widget_quietly(instance);
        self.drain();
        result
    }

    /// Delivers a status change of `loader`: the status event, then `update`.
    pub fn loader_changed(&mut self, loader: LoaderId) {
        let Some(status) = self.loaders.loader(loader).map(|handle| handle.status()) else {
            upload_warn!("change reported for unknown loader {}", loader);
            return;
        };
        self.pending.push_back(Emission {
            loader,
            status: Some(status),
        });
        self.drain();
    }

    /// Delivers a progress change of `loader` without a status change.
    pub fn loader_update(&mut self, loader: LoaderId) {
        self.pending.push_back(Emission {
            loader,
            status: None,
        });
        self.drain();
    }

    /// Cancels `loader` on the user's behalf.
    pub fn abort_upload(&mut self, loader: LoaderId) {
        self.run_loader(loader, |handle| handle.abort());
        self.drain();
    }

    /// Reports progress of `loader` through the shared upload notification.
    pub fn bind_notifications(&mut self, loader: LoaderId) -> Result<TaskId, WidgetError> {
        let snapshot = self
            .loader_snapshot(loader)
            .ok_or(WidgetError::UnknownLoader(loader))?;
        self.notifications.bind(&mut self.host, &snapshot)
    }

    pub fn is_reporting_progress(&self, loader: LoaderId) -> bool {
        self.notifications.is_reporting(loader)
    }

    /// Replaces a placeholder with final content; see [`crate::HookContext::replace_with`].
    pub fn replace_with(&mut self, widget: WidgetId, content: &str, mode: InsertMode) {
        UploadScope::replace_widget(self, widget, content, mode);
        self.drain();
    }

    pub fn delete_widget(&mut self, widget: WidgetId) {
        UploadScope::remove_widget(self, widget);
        self.drain();
    }

    /// The controller of `widget`, unless it is reacting right now.
    pub fn widget(&self, widget: WidgetId) -> Option<&UploadWidget> {
        self.controllers.get(widget)
    }

    pub fn bound_widget(&self, loader: LoaderId) -> Option<WidgetId> {
        self.controllers.bound_widget(loader)
    }

    pub fn controller_count(&self) -> usize {
        self.controllers.len()
    }

    /// The aggregator currently driving the upload notification.
    pub fn notification_aggregator(&self) -> Option<&NotificationAggregator> {
        self.notifications.current()
    }

    fn scan_widgets(&mut self, init_only_new: bool) -> Vec<WidgetId> {
        let scan = self.host.check_widgets(init_only_new);
        // Controllers of destroyed instances keep listening; their next
        // reaction finds the wrapper gone and runs the orphan check.
        for widget in scan.destroyed {
            upload_trace!("widget {} destroyed by the host", widget);
        }

        let mut initialized = Vec::new();
        for instance in scan.created {
            if self.definition_rc(&instance.name).is_none() {
                continue;
            }
            match self.init_widget_quietly(&instance) {
                Ok(()) => initialized.push(instance.id),
                Err(err) => upload_warn!("upload widget {} left unbound: {}", instance.id, err),
            }
        }
        initialized
    }

    fn init_widget_quietly(&mut self, instance: &WidgetInstance) -> Result<(), WidgetError> {
        let definition = self
            .definition_rc(&instance.name)
            .cloned()
            .ok_or_else(|| WidgetError::UnknownDefinition(instance.name.clone()))?;
        let wrapper = self
            .host
            .widget_wrapper(instance.id)
            .ok_or(WidgetError::UnknownWidget(instance.id))?;
        let loader = self
            .host
            .attribute(wrapper, UPLOAD_ID_ATTRIBUTE)
            .and_then(|raw| LoaderId::parse(&raw))
            .ok_or(WidgetError::MissingUploadId(instance.id))?;
        if self.loaders.loader(loader).is_none() {
            return Err(WidgetError::UnknownLoader(loader));
        }
        match self.controllers.bound_widget(loader) {
            Some(widget) if widget == instance.id => return Ok(()),
            Some(widget) if self.host.widget_wrapper(widget).is_some() => {
                return Err(WidgetError::AlreadyBound { loader, widget });
            }
            Some(widget) => {
                // The placeholder moved, e.g. cut and pasted back.
                upload_debug!(
                    "widget {} takes loader {} over from detached widget {}",
                    instance.id,
                    loader,
                    widget
                );
                self.controllers.unbind(widget);
            }
            None => {}
        }

        self.controllers
            .bind(UploadWidget::new(instance.id, loader, definition));
        upload_debug!("widget {} bound to loader {}", instance.id, loader);
        self.sync_widget(instance.id);
        Ok(())
    }

    fn sync_widget(&mut self, widget: WidgetId) {
        let Some(mut controller) = self.controllers.detach(widget) else {
            return;
        };
        match controller.react(self) {
            Reaction::Listen => {
                if !self.controllers.reattach(controller) {
                    upload_trace!("widget {} was torn down while reacting", widget);
                }
            }
            Reaction::Unsubscribe => {
                self.controllers.unbind(widget);
                upload_debug!("widget {} stopped listening", widget);
            }
        }
    }

    /// Runs `op` on a loader and queues the status change it caused, if any.
    fn run_loader(&mut self, loader: LoaderId, op: impl FnOnce(&mut dyn FileLoader)) {
        let Some(handle) = self.loaders.loader_mut(loader) else {
            return;
        };
        let before = handle.status();
        op(&mut *handle);
        let after = handle.status();
        if before != after {
            self.pending.push_back(Emission {
                loader,
                status: Some(after),
            });
        }
    }

    fn drain(&mut self) {
        if self.draining {
            return;
        }
        self.draining = true;
        while let Some(emission) = self.pending.pop_front() {
            self.emit(emission);
        }
        self.draining = false;
    }

    /// Notification binding listens first, then the widget's controller.
    fn emit(&mut self, emission: Emission) {
        let Some(snapshot) = self.loader_snapshot(emission.loader) else {
            return;
        };
        if let Some(event) = emission.status.and_then(LoaderStatus::event) {
            self.notifications.on_event(&mut self.host, &snapshot, event);
        }
        self.notifications
            .on_event(&mut self.host, &snapshot, LoaderEvent::Update);

        if let Some(widget) = self.controllers.bound_widget(emission.loader) {
            self.sync_widget(widget);
        }
    }
}

impl<H: EditorHost, R: UploadRepository> UploadScope for UploadSession<H, R> {
    fn host(&mut self) -> &mut dyn EditorHost {
        &mut self.host
    }

    fn loader_snapshot(&self, loader: LoaderId) -> Option<LoaderSnapshot> {
        self.loaders.loader(loader).map(|handle| handle.snapshot())
    }

    fn abort_orphan(&mut self, loader: LoaderId) {
        self.notifications.silence(loader);
        self.run_loader(loader, |handle| handle.abort());
    }

    fn replace_widget(&mut self, widget: WidgetId, content: &str, mode: InsertMode) {
        if content.trim().is_empty() {
            UploadScope::remove_widget(self, widget);
            return;
        }
        let Some(wrapper) = self.host.widget_wrapper(widget) else {
            upload_warn!("cannot replace widget {}: not in the document", widget);
            return;
        };

        let focused = self.host.focused_widget() == Some(widget);
        let selection = if focused {
            None
        } else {
            Some(self.host.create_selection_bookmarks())
        };
        // Computed after the selection bookmarks, which edit the document.
        let Some(mut range) = self.host.range_around(wrapper) else {
            upload_warn!("cannot replace widget {}: no range around it", widget);
            if let Some(bookmarks) = selection {
                self.host.select_bookmarks(bookmarks);
            }
            return;
        };
        let range_bookmark = if focused {
            Some(self.host.create_range_bookmark(&mut range))
        } else {
            None
        };

        self.host.insert_html_into_range(content, &range, mode);
        self.scan_widgets(true);
        self.host.destroy_widget(widget, true);
        self.controllers.unbind(widget);

        if let Some(bookmark) = range_bookmark {
            match self.host.move_to_bookmark(bookmark) {
                Some(inserted) => self.host.select_range(&inserted),
                None => upload_warn!("lost the range of widget {} replacement", widget),
            }
        }
        if let Some(bookmarks) = selection {
            self.host.select_bookmarks(bookmarks);
        }
        upload_debug!("widget {} replaced with final content", widget);
    }

    fn remove_widget(&mut self, widget: WidgetId) {
        self.host.delete_widget(widget);
        if self.controllers.unbind(widget) {
            upload_debug!("widget {} deleted", widget);
        }
    }

    fn class_prefix(&self) -> &str {
        &self.class_prefix
    }
}
