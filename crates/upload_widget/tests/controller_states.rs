use std::cell::RefCell;
use std::rc::Rc;

use pretty_assertions::assert_eq;
use upload_core::{LoaderId, LoaderStatus};
use upload_widget::memory::{MemoryEditor, ScriptedLoaders, SnapshotEvent};
use upload_widget::{
    EditorHost, Element, HookOutcome, InsertMode, PasteData, PastedFile, SessionConfig,
    UploadSession, UploadWidgetDefinition, WidgetId,
};

type Session = UploadSession<MemoryEditor, ScriptedLoaders>;

fn init_logging() {
    upload_logging::initialize_for_tests();
}

fn placeholder(file: &PastedFile) -> Option<Element> {
    Some(Element::new("span").with_text(file.name.clone()))
}

fn definition() -> UploadWidgetDefinition {
    UploadWidgetDefinition::new("uploadfile").file_to_element(placeholder)
}

fn session_with(definition: UploadWidgetDefinition) -> Session {
    let mut session = UploadSession::new(MemoryEditor::new(), ScriptedLoaders::new());
    session.add_upload_widget(definition).unwrap();
    session
}

/// Pastes one file and lets the widget system upcast its placeholder.
fn paste_one(session: &mut Session, name: &str) -> (LoaderId, WidgetId) {
    let mut data = PasteData::with_files(vec![PastedFile::new(name, "text/plain", 100)]);
    let loaders = session.handle_paste(&mut data);
    session.host_mut().paste(&data);
    let widgets = session.check_widgets(true);
    assert_eq!(loaders.len(), 1);
    assert_eq!(widgets.len(), 1);
    (loaders[0], widgets[0])
}

fn advance(session: &mut Session, loader: LoaderId, status: LoaderStatus) {
    assert!(session.loaders_mut().set_status(loader, status));
    session.loader_changed(loader);
}

fn wrapper_classes(session: &Session, widget: WidgetId) -> Vec<String> {
    let node = session.host().widget_wrapper(widget).unwrap();
    session
        .host()
        .element(node)
        .unwrap()
        .classes()
        .map(str::to_owned)
        .collect()
}

#[test]
fn initial_sync_applies_the_current_status() {
    init_logging();
    let mut session = session_with(definition());
    let (loader, widget) = paste_one(&mut session, "a.txt");

    assert_eq!(session.bound_widget(loader), Some(widget));
    assert_eq!(wrapper_classes(&session, widget), vec!["cke_upload_loading"]);
    assert_eq!(
        session.widget(widget).and_then(|w| w.applied_class()),
        Some("cke_upload_loading")
    );
}

#[test]
fn status_class_follows_every_transition() {
    init_logging();
    let mut session = session_with(definition());
    let (loader, widget) = paste_one(&mut session, "a.txt");

    for status in [
        LoaderStatus::Loaded,
        LoaderStatus::Uploading,
        LoaderStatus::Uploaded,
    ] {
        advance(&mut session, loader, status);
        assert_eq!(
            wrapper_classes(&session, widget),
            vec![format!("cke_upload_{}", status)]
        );
    }
}

#[test]
fn class_prefix_is_configurable() {
    init_logging();
    let config = SessionConfig {
        class_prefix: "up-".to_string(),
        ..SessionConfig::default()
    };
    let mut session = UploadSession::with_config(MemoryEditor::new(), ScriptedLoaders::new(), config);
    session.add_upload_widget(definition()).unwrap();
    let (loader, widget) = paste_one(&mut session, "a.txt");
    advance(&mut session, loader, LoaderStatus::Uploading);

    assert_eq!(wrapper_classes(&session, widget), vec!["up-uploading"]);
}

#[test]
fn hooks_run_for_the_status_entered() {
    init_logging();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let uploading = Rc::clone(&seen);
    let loaded = Rc::clone(&seen);
    let mut session = session_with(
        definition()
            .on_loaded(move |_, loader| {
                loaded.borrow_mut().push((loader.status, loader.uploaded));
                HookOutcome::Continue
            })
            .on_uploading(move |_, loader| {
                uploading.borrow_mut().push((loader.status, loader.uploaded));
                HookOutcome::Continue
            }),
    );
    let (loader, _) = paste_one(&mut session, "a.txt");

    advance(&mut session, loader, LoaderStatus::Loaded);
    advance(&mut session, loader, LoaderStatus::Uploading);
    assert!(session.loaders_mut().set_progress(loader, 40));
    session.loader_update(loader);

    assert_eq!(
        *seen.borrow(),
        vec![
            (LoaderStatus::Loaded, 0),
            (LoaderStatus::Uploading, 0),
            (LoaderStatus::Uploading, 40),
        ]
    );
}

#[test]
fn uploaded_hook_replaces_the_placeholder() {
    init_logging();
    let mut session = session_with(definition().on_uploaded(|cx, loader| {
        let url = loader.url.clone().unwrap_or_default();
        cx.replace_with(
            &format!("<a href=\"{}\">{}</a>", url, loader.file_name),
            InsertMode::Html,
        );
        HookOutcome::Continue
    }));
    let (loader, widget) = paste_one(&mut session, "a.txt");
    advance(&mut session, loader, LoaderStatus::Uploading);

    assert!(session.loaders_mut().complete(loader, "/files/a.txt"));
    session.loader_changed(loader);

    assert_eq!(session.host().to_html(), "<a href=\"/files/a.txt\">a.txt</a>");
    assert_eq!(session.controller_count(), 0);
    assert_eq!(session.bound_widget(loader), None);
    assert_eq!(session.host().destroy_calls(), &[widget]);
}

#[test]
fn error_removes_the_widget() {
    init_logging();
    let mut session = session_with(definition());
    let (loader, widget) = paste_one(&mut session, "a.txt");
    session.host_mut().push_text("after");

    assert!(session.loaders_mut().fail(loader, "Server refused the file"));
    session.loader_changed(loader);

    assert_eq!(session.host().to_html(), "after");
    assert_eq!(session.host().widget_wrapper(widget), None);
    assert_eq!(session.controller_count(), 0);
}

#[test]
fn abort_removes_the_widget() {
    init_logging();
    let mut session = session_with(definition());
    let (loader, _) = paste_one(&mut session, "a.txt");

    session.abort_upload(loader);

    assert_eq!(
        session.loaders().get(loader).map(|l| l.abort_calls()),
        Some(1)
    );
    assert_eq!(session.host().to_html(), "");
    assert_eq!(session.controller_count(), 0);
}

#[test]
fn veto_skips_styling_and_removal() {
    init_logging();
    let mut session = session_with(definition().on_error(|_, _| HookOutcome::Veto));
    let (loader, widget) = paste_one(&mut session, "a.txt");
    advance(&mut session, loader, LoaderStatus::Uploading);

    assert!(session.loaders_mut().fail(loader, "Quota exceeded"));
    session.loader_changed(loader);

    assert_eq!(wrapper_classes(&session, widget), vec!["cke_upload_uploading"]);
    assert_eq!(session.bound_widget(loader), Some(widget));
    assert!(session.widget(widget).is_some());
}

#[test]
fn hook_may_remove_its_own_widget() {
    init_logging();
    let mut session = session_with(definition().on_loaded(|cx, _| {
        cx.remove();
        HookOutcome::Continue
    }));
    let (loader, _) = paste_one(&mut session, "a.txt");

    advance(&mut session, loader, LoaderStatus::Loaded);
    // Later events reach nobody.
    advance(&mut session, loader, LoaderStatus::Uploading);

    assert_eq!(session.host().to_html(), "");
    assert_eq!(session.controller_count(), 0);
    assert_eq!(
        session.loaders().get(loader).map(|l| l.abort_calls()),
        Some(0)
    );
}

#[test]
fn every_reaction_is_one_snapshot_transaction() {
    init_logging();
    let mut session = session_with(definition().on_uploading(|_, _| HookOutcome::Veto));
    let (loader, _) = paste_one(&mut session, "a.txt");
    advance(&mut session, loader, LoaderStatus::Loaded);
    advance(&mut session, loader, LoaderStatus::Uploading);
    assert!(session.loaders_mut().fail(loader, "boom"));
    session.loader_changed(loader);

    let log = session.host().snapshot_log();
    assert_eq!(log.len(), 8);
    assert!(log
        .chunks(2)
        .all(|pair| pair == [SnapshotEvent::Lock, SnapshotEvent::Unlock]));
    assert!(!session.host().snapshot_locked());
}

#[test]
fn second_placeholder_for_a_bound_loader_is_not_initialized() {
    init_logging();
    let mut session = session_with(definition());
    let (loader, widget) = paste_one(&mut session, "a.txt");
    let node = session.host().widget_wrapper(widget).unwrap();
    let copy = session.host().element(node).unwrap().clone();

    session.host_mut().push_element(copy);
    let initialized = session.check_widgets(true);

    assert!(initialized.is_empty());
    assert_eq!(session.bound_widget(loader), Some(widget));
    assert_eq!(session.controller_count(), 1);
}

#[test]
fn unregistered_widget_types_are_ignored() {
    init_logging();
    let mut session = session_with(definition());
    session.host_mut().add_widget_type("image");
    session
        .host_mut()
        .push_element(Element::new("img").with_attribute("data-widget", "image"));

    assert!(session.check_widgets(true).is_empty());
    assert_eq!(session.controller_count(), 0);
}
