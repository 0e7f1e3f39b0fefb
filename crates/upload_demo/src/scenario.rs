use anyhow::{Context, Result};
use upload_core::{LoaderId, LoaderStatus, NotificationKind};
use upload_logging::{upload_debug, upload_info, upload_warn};
use upload_widget::memory::{MemoryEditor, ScriptedLoaders};
use upload_widget::{
    escape_text, EditorHost, Element, FileLoader, HookOutcome, InsertMode, PasteData, PastedFile,
    SessionConfig, UploadSession, UploadWidgetDefinition, WidgetError,
};

use crate::config::{DemoConfig, ScriptStep, ScriptedFile};

pub const WIDGET_NAME: &str = "uploadfile";

type Session = UploadSession<MemoryEditor, ScriptedLoaders>;

#[derive(Debug, Clone, PartialEq)]
pub struct NotificationLine {
    pub kind: NotificationKind,
    pub message: String,
    pub visible: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderLine {
    pub file: String,
    pub status: LoaderStatus,
    pub abort_calls: usize,
}

/// Final state of the editor after every script ran.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioReport {
    pub html: String,
    pub notifications: Vec<NotificationLine>,
    pub loaders: Vec<LoaderLine>,
    pub live_widgets: usize,
}

impl ScenarioReport {
    pub fn log(&self) {
        upload_info!("document: {}", self.html);
        for line in &self.notifications {
            upload_info!(
                "notification [{:?}{}] {}",
                line.kind,
                if line.visible { "" } else { ", hidden" },
                line.message
            );
        }
        for line in &self.loaders {
            upload_info!(
                "loader for {}: {} (abort called {} time(s))",
                line.file,
                line.status,
                line.abort_calls
            );
        }
        upload_info!("{} upload widget(s) still live", self.live_widgets);
    }
}

/// The `uploadfile` widget: a span placeholder replaced by a link once uploaded.
pub fn upload_file_definition(config: &DemoConfig) -> Result<UploadWidgetDefinition, WidgetError> {
    let mut definition = UploadWidgetDefinition::new(WIDGET_NAME)
        .load_method(config.load_method)
        .file_to_element(|file| {
            Some(
                Element::new("span")
                    .with_attribute("class", "upload-placeholder")
                    .with_text(file.name.clone()),
            )
        })
        .on_uploaded(|cx, loader| {
            let url = loader.url.as_deref().unwrap_or("#");
            let link = format!(
                "<a href=\"{}\">{}</a>",
                escape_text(url).replace('"', "&quot;"),
                escape_text(&loader.file_name)
            );
            cx.replace_with(&link, InsertMode::Html);
            HookOutcome::Continue
        });
    if let Some(url) = &config.upload_url {
        definition = definition.upload_url(url.clone());
    }
    if let Some(pattern) = &config.supported_types {
        definition = definition.supported_types(pattern)?;
    }
    Ok(definition)
}

/// Pastes the configured files and plays their scripts round by round, so
/// uploads overlap the way concurrent transfers do.
pub fn run(config: &DemoConfig) -> Result<ScenarioReport> {
    let session_config = SessionConfig {
        class_prefix: config.class_prefix.clone(),
        messages: config.messages.clone(),
    };
    let mut session =
        UploadSession::with_config(MemoryEditor::new(), ScriptedLoaders::new(), session_config);
    session
        .add_upload_widget(upload_file_definition(config)?)
        .context("failed to register the upload widget")?;

    let files = config
        .files
        .iter()
        .map(|file| PastedFile::new(file.name.clone(), file.mime_type.clone(), file.size))
        .collect();
    let mut data = PasteData::with_files(files);
    let loaders = session.handle_paste(&mut data);
    session.host_mut().paste(&data);
    let widgets = session.check_widgets(true);
    upload_info!(
        "pasted {} file(s): {} loader(s), {} widget(s)",
        config.files.len(),
        loaders.len(),
        widgets.len()
    );

    let plans = plan(&session, &config.files, &loaders);
    let rounds = plans.iter().map(|(_, script)| script.len()).max().unwrap_or(0);
    for round in 0..rounds {
        for (loader, script) in &plans {
            if let Some(step) = script.get(round) {
                apply(&mut session, *loader, step);
            }
        }
    }

    Ok(report(&session, &loaders))
}

/// Pairs loaders with their scripts. Loaders come back in paste order, so
/// each one claims the next unclaimed file with its name.
fn plan<'a>(
    session: &Session,
    files: &'a [ScriptedFile],
    loaders: &[LoaderId],
) -> Vec<(LoaderId, &'a [ScriptStep])> {
    let mut remaining = files.iter();
    loaders
        .iter()
        .filter_map(|loader| {
            let name = &session.loaders().get(*loader)?.file().name;
            let file = remaining.find(|file| &file.name == name)?;
            Some((*loader, file.script.as_slice()))
        })
        .collect()
}

fn apply(session: &mut Session, loader: LoaderId, step: &ScriptStep) {
    upload_debug!("loader {}: {:?}", loader, step);
    let accepted = match step {
        ScriptStep::Status(status) => session.loaders_mut().set_status(loader, *status),
        ScriptStep::Progress(bytes) => {
            if session.loaders_mut().set_progress(loader, *bytes) {
                session.loader_update(loader);
            }
            return;
        }
        ScriptStep::Complete(url) => session.loaders_mut().complete(loader, url.clone()),
        ScriptStep::Fail(message) => session.loaders_mut().fail(loader, message.clone()),
        ScriptStep::Abort => {
            session.abort_upload(loader);
            return;
        }
        ScriptStep::DeletePlaceholder => {
            if let Some(node) = session.host().find_by_upload_id(loader) {
                session.host_mut().remove_node(node);
                session.check_widgets(true);
            }
            return;
        }
    };
    if accepted {
        session.loader_changed(loader);
    } else {
        upload_warn!("loader {} refused scripted step {:?}", loader, step);
    }
}

fn report(session: &Session, loaders: &[LoaderId]) -> ScenarioReport {
    let editor = session.host();
    ScenarioReport {
        html: editor.to_html(),
        notifications: editor
            .notifications()
            .map(|shown| NotificationLine {
                kind: shown.notification.kind,
                message: shown.notification.message.clone(),
                visible: shown.visible,
            })
            .collect(),
        loaders: loaders
            .iter()
            .filter_map(|id| session.loaders().get(*id))
            .map(|loader| LoaderLine {
                file: loader.file().name.clone(),
                status: loader.status(),
                abort_calls: loader.abort_calls(),
            })
            .collect(),
        live_widgets: session.controller_count(),
    }
}
