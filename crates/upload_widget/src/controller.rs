use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use upload_core::LoaderId;
use upload_logging::{upload_debug, upload_info, upload_trace};

use crate::definition::{HookContext, HookOutcome, UploadScope, UploadWidgetDefinition};
use crate::dom::WidgetId;

/// Outcome of one reaction to a loader event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Reaction {
    /// Keep listening to the loader.
    Listen,
    /// Stop listening for good.
    Unsubscribe,
}

/// Binds one placeholder widget to one file loader.
///
/// The widget's wrapper belongs to the document and may disappear at any
/// moment, so every reaction first checks that it is still attached.
pub struct UploadWidget {
    id: WidgetId,
    loader: LoaderId,
    definition: Rc<UploadWidgetDefinition>,
    applied_class: Option<String>,
}

impl UploadWidget {
    pub(crate) fn new(
        id: WidgetId,
        loader: LoaderId,
        definition: Rc<UploadWidgetDefinition>,
    ) -> Self {
        Self {
            id,
            loader,
            definition,
            applied_class: None,
        }
    }

    pub fn id(&self) -> WidgetId {
        self.id
    }

    pub fn loader(&self) -> LoaderId {
        self.loader
    }

    pub fn definition(&self) -> &UploadWidgetDefinition {
        &self.definition
    }

    /// Last status class written to the wrapper.
    pub fn applied_class(&self) -> Option<&str> {
        self.applied_class.as_deref()
    }

    /// Syncs the placeholder with the loader's current status inside one
    /// undo-snapshot transaction.
    pub(crate) fn react(&mut self, scope: &mut dyn UploadScope) -> Reaction {
        scope.host().lock_snapshot();
        let reaction = self.react_locked(scope);
        scope.host().unlock_snapshot();
        reaction
    }

    fn react_locked(&mut self, scope: &mut dyn UploadScope) -> Reaction {
        let Some(loader) = scope.loader_snapshot(self.loader) else {
            upload_debug!(
                "loader {} vanished from the repository; widget {} stops listening",
                self.loader,
                self.id
            );
            return Reaction::Unsubscribe;
        };

        if scope.host().widget_wrapper(self.id).is_none() {
            return self.orphaned(scope);
        }

        upload_trace!(
            "widget {} syncing with loader {} ({})",
            self.id,
            self.loader,
            loader.status
        );

        if let Some(hook) = self.definition.hook(loader.status).cloned() {
            let outcome = {
                let mut cx = HookContext::new(&mut *scope, self.id);
                hook(&mut cx, &loader)
            };
            if outcome == HookOutcome::Veto {
                upload_debug!(
                    "hook for {} on widget {} vetoed the default reaction",
                    loader.status,
                    self.id
                );
                return Reaction::Listen;
            }
        }

        // The hook may have replaced or removed the widget.
        if let Some(wrapper) = scope.host().widget_wrapper(self.id) {
            let class = loader.status.class_name(scope.class_prefix());
            if self.applied_class.as_deref() != Some(class.as_str()) {
                if let Some(previous) = self.applied_class.take() {
                    scope.host().remove_class(wrapper, &previous);
                }
                scope.host().add_class(wrapper, &class);
                self.applied_class = Some(class);
            }

            if loader.status.is_failure() {
                upload_info!(
                    "removing widget {} after loader {} reported {}",
                    self.id,
                    self.loader,
                    loader.status
                );
                scope.remove_widget(self.id);
            }
        }

        Reaction::Listen
    }

    fn orphaned(&self, scope: &mut dyn UploadScope) -> Reaction {
        // A copy of the placeholder elsewhere in the document keeps the upload alive.
        if scope.host().find_by_upload_id(self.loader).is_none() {
            upload_info!(
                "placeholder of widget {} left the document; aborting loader {}",
                self.id,
                self.loader
            );
            scope.abort_orphan(self.loader);
        } else {
            upload_debug!(
                "widget {} detached but loader {} is still placed; unsubscribing",
                self.id,
                self.loader
            );
        }
        Reaction::Unsubscribe
    }
}

/// Live controllers of one editor, indexed both ways.
///
/// A controller is *bound* while its loader maps to its widget. A reacting
/// controller is detached from `widgets` but stays bound, so teardown that
/// happens during its own reaction is visible once it returns.
#[derive(Default)]
pub(crate) struct Controllers {
    widgets: BTreeMap<WidgetId, UploadWidget>,
    loaders: HashMap<LoaderId, WidgetId>,
}

impl Controllers {
    pub(crate) fn bind(&mut self, widget: UploadWidget) {
        self.loaders.insert(widget.loader(), widget.id());
        self.widgets.insert(widget.id(), widget);
    }

    pub(crate) fn bound_widget(&self, loader: LoaderId) -> Option<WidgetId> {
        self.loaders.get(&loader).copied()
    }

    pub(crate) fn is_bound(&self, widget: WidgetId, loader: LoaderId) -> bool {
        self.bound_widget(loader) == Some(widget)
    }

    pub(crate) fn get(&self, widget: WidgetId) -> Option<&UploadWidget> {
        self.widgets.get(&widget)
    }

    pub(crate) fn detach(&mut self, widget: WidgetId) -> Option<UploadWidget> {
        self.widgets.remove(&widget)
    }

    /// Puts a detached controller back unless it was unbound meanwhile.
    pub(crate) fn reattach(&mut self, widget: UploadWidget) -> bool {
        if !self.is_bound(widget.id(), widget.loader()) {
            return false;
        }
        self.widgets.insert(widget.id(), widget);
        true
    }

    pub(crate) fn unbind(&mut self, widget: WidgetId) -> bool {
        let removed = self.widgets.remove(&widget).is_some();
        let before = self.loaders.len();
        self.loaders.retain(|_, bound| *bound != widget);
        removed || self.loaders.len() != before
    }

    pub(crate) fn len(&self) -> usize {
        self.loaders.len()
    }
}
