use std::fmt;
use std::rc::Rc;

use regex::Regex;
use upload_core::{LoadMethod, LoaderId, LoaderSnapshot, LoaderStatus};

use crate::dom::{Element, InsertMode, WidgetId};
use crate::host::EditorHost;
use crate::loader::PastedFile;
use crate::WidgetError;

/// Definitions with a type filter intercept pastes before catch-all ones.
const TYPED_PRIORITY: u32 = 10;
const CATCH_ALL_PRIORITY: u32 = 20;

/// Whether the controller should carry on with its default reaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HookOutcome {
    #[default]
    Continue,
    /// Skip styling and the default removal on `error`/`abort` for this status change.
    Veto,
}

pub type StatusHook = Rc<dyn Fn(&mut HookContext<'_>, &LoaderSnapshot) -> HookOutcome>;
pub type FileToElement = Rc<dyn Fn(&PastedFile) -> Option<Element>>;

/// What a reacting controller may do to the editor it lives in.
pub(crate) trait UploadScope {
    fn host(&mut self) -> &mut dyn EditorHost;
    fn loader_snapshot(&self, loader: LoaderId) -> Option<LoaderSnapshot>;
    /// Aborts a loader whose placeholder is gone, without a user notification.
    fn abort_orphan(&mut self, loader: LoaderId);
    fn replace_widget(&mut self, widget: WidgetId, content: &str, mode: InsertMode);
    fn remove_widget(&mut self, widget: WidgetId);
    fn class_prefix(&self) -> &str;
}

/// Handed to status hooks while the widget's controller reacts.
pub struct HookContext<'a> {
    scope: &'a mut dyn UploadScope,
    widget: WidgetId,
}

impl<'a> HookContext<'a> {
    pub(crate) fn new(scope: &'a mut dyn UploadScope, widget: WidgetId) -> Self {
        Self { scope, widget }
    }

    pub fn widget(&self) -> WidgetId {
        self.widget
    }

    /// Replaces the placeholder with final content, ending the widget's life.
    ///
    /// Blank content deletes the widget instead.
    pub fn replace_with(&mut self, content: &str, mode: InsertMode) {
        self.scope.replace_widget(self.widget, content, mode);
    }

    /// Deletes the widget and its placeholder.
    pub fn remove(&mut self) {
        self.scope.remove_widget(self.widget);
    }

    pub fn host(&mut self) -> &mut dyn EditorHost {
        self.scope.host()
    }
}

#[derive(Clone, Default)]
struct StatusHooks {
    on_loading: Option<StatusHook>,
    on_loaded: Option<StatusHook>,
    on_uploading: Option<StatusHook>,
    on_uploaded: Option<StatusHook>,
    on_error: Option<StatusHook>,
    on_abort: Option<StatusHook>,
}

impl StatusHooks {
    fn slot(&mut self, status: LoaderStatus) -> Option<&mut Option<StatusHook>> {
        match status {
            LoaderStatus::Idle => None,
            LoaderStatus::Loading => Some(&mut self.on_loading),
            LoaderStatus::Loaded => Some(&mut self.on_loaded),
            LoaderStatus::Uploading => Some(&mut self.on_uploading),
            LoaderStatus::Uploaded => Some(&mut self.on_uploaded),
            LoaderStatus::Error => Some(&mut self.on_error),
            LoaderStatus::Abort => Some(&mut self.on_abort),
        }
    }

    fn get(&self, status: LoaderStatus) -> Option<&StatusHook> {
        match status {
            LoaderStatus::Idle => None,
            LoaderStatus::Loading => self.on_loading.as_ref(),
            LoaderStatus::Loaded => self.on_loaded.as_ref(),
            LoaderStatus::Uploading => self.on_uploading.as_ref(),
            LoaderStatus::Uploaded => self.on_uploaded.as_ref(),
            LoaderStatus::Error => self.on_error.as_ref(),
            LoaderStatus::Abort => self.on_abort.as_ref(),
        }
    }
}

/// Describes one kind of upload widget: how pasted files become placeholders
/// and how the placeholder reacts to its loader.
#[derive(Clone)]
pub struct UploadWidgetDefinition {
    name: String,
    supported_types: Option<Regex>,
    upload_url: Option<String>,
    load_method: LoadMethod,
    file_to_element: Option<FileToElement>,
    hooks: StatusHooks,
}

impl UploadWidgetDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            supported_types: None,
            upload_url: None,
            load_method: LoadMethod::default(),
            file_to_element: None,
            hooks: StatusHooks::default(),
        }
    }

    /// Restricts paste handling to files whose MIME type matches `pattern`.
    pub fn supported_types(mut self, pattern: &str) -> Result<Self, WidgetError> {
        self.supported_types = Some(Regex::new(pattern)?);
        Ok(self)
    }

    pub fn upload_url(mut self, url: impl Into<String>) -> Self {
        self.upload_url = Some(url.into());
        self
    }

    pub fn load_method(mut self, method: LoadMethod) -> Self {
        self.load_method = method;
        self
    }

    /// Enables paste interception; `None` from the callback skips the file.
    pub fn file_to_element<F>(mut self, f: F) -> Self
    where
        F: Fn(&PastedFile) -> Option<Element> + 'static,
    {
        self.file_to_element = Some(Rc::new(f));
        self
    }

    /// Installs the hook called when the loader enters `status`.
    ///
    /// `idle` has no hook; installing one is ignored.
    pub fn on_status<F>(mut self, status: LoaderStatus, hook: F) -> Self
    where
        F: Fn(&mut HookContext<'_>, &LoaderSnapshot) -> HookOutcome + 'static,
    {
        if let Some(slot) = self.hooks.slot(status) {
            *slot = Some(Rc::new(hook));
        }
        self
    }

    pub fn on_loading<F>(self, hook: F) -> Self
    where
        F: Fn(&mut HookContext<'_>, &LoaderSnapshot) -> HookOutcome + 'static,
    {
        self.on_status(LoaderStatus::Loading, hook)
    }

    pub fn on_loaded<F>(self, hook: F) -> Self
    where
        F: Fn(&mut HookContext<'_>, &LoaderSnapshot) -> HookOutcome + 'static,
    {
        self.on_status(LoaderStatus::Loaded, hook)
    }

    pub fn on_uploading<F>(self, hook: F) -> Self
    where
        F: Fn(&mut HookContext<'_>, &LoaderSnapshot) -> HookOutcome + 'static,
    {
        self.on_status(LoaderStatus::Uploading, hook)
    }

    pub fn on_uploaded<F>(self, hook: F) -> Self
    where
        F: Fn(&mut HookContext<'_>, &LoaderSnapshot) -> HookOutcome + 'static,
    {
        self.on_status(LoaderStatus::Uploaded, hook)
    }

    pub fn on_error<F>(self, hook: F) -> Self
    where
        F: Fn(&mut HookContext<'_>, &LoaderSnapshot) -> HookOutcome + 'static,
    {
        self.on_status(LoaderStatus::Error, hook)
    }

    pub fn on_abort<F>(self, hook: F) -> Self
    where
        F: Fn(&mut HookContext<'_>, &LoaderSnapshot) -> HookOutcome + 'static,
    {
        self.on_status(LoaderStatus::Abort, hook)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn url(&self) -> Option<&str> {
        self.upload_url.as_deref()
    }

    pub fn method(&self) -> LoadMethod {
        self.load_method
    }

    pub fn hook(&self, status: LoaderStatus) -> Option<&StatusHook> {
        self.hooks.get(status)
    }

    pub fn element_for(&self, file: &PastedFile) -> Option<Element> {
        self.file_to_element.as_ref().and_then(|f| f(file))
    }

    pub fn intercepts_paste(&self) -> bool {
        self.file_to_element.is_some()
    }

    /// Missing `supported_types` accepts every file.
    pub fn accepts(&self, file: &PastedFile) -> bool {
        self.supported_types
            .as_ref()
            .map_or(true, |pattern| crate::paste::is_type_supported(file, pattern))
    }

    pub fn priority(&self) -> u32 {
        if self.supported_types.is_some() {
            TYPED_PRIORITY
        } else {
            CATCH_ALL_PRIORITY
        }
    }

    /// Data representation of a placeholder: nothing, so unfinished uploads
    /// never leak into saved content.
    pub fn downcast(&self) -> String {
        String::new()
    }
}

impl fmt::Debug for UploadWidgetDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hooks: Vec<&str> = LoaderStatus::ALL
            .iter()
            .filter(|status| self.hooks.get(**status).is_some())
            .map(|status| status.as_str())
            .collect();
        f.debug_struct("UploadWidgetDefinition")
            .field("name", &self.name)
            .field(
                "supported_types",
                &self.supported_types.as_ref().map(Regex::as_str),
            )
            .field("upload_url", &self.upload_url)
            .field("load_method", &self.load_method)
            .field("file_to_element", &self.file_to_element.is_some())
            .field("hooks", &hooks)
            .finish()
    }
}
