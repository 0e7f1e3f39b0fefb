use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use upload_core::{LoadMethod, LoaderStatus, UploadMessages};
use upload_logging::upload_info;
use upload_widget::DEFAULT_CLASS_PREFIX;

/// One thing that happens to a pasted file's loader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScriptStep {
    Status(LoaderStatus),
    /// Bytes uploaded so far.
    Progress(u64),
    /// Upload finished; the server answered with this URL.
    Complete(String),
    Fail(String),
    /// The user cancels the upload.
    Abort,
    /// The user deletes the placeholder from the document.
    DeletePlaceholder,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptedFile {
    pub name: String,
    pub mime_type: String,
    pub size: u64,
    #[serde(default)]
    pub script: Vec<ScriptStep>,
}

impl ScriptedFile {
    fn new(name: &str, mime_type: &str, size: u64, script: Vec<ScriptStep>) -> Self {
        Self {
            name: name.to_string(),
            mime_type: mime_type.to_string(),
            size,
            script,
        }
    }
}

/// Everything the demo scenario runs from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    pub upload_url: Option<String>,
    pub load_method: LoadMethod,
    /// MIME type pattern; `None` accepts every file.
    pub supported_types: Option<String>,
    pub class_prefix: String,
    pub messages: UploadMessages,
    pub files: Vec<ScriptedFile>,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            upload_url: Some("/uploader".to_string()),
            load_method: LoadMethod::LoadAndUpload,
            supported_types: None,
            class_prefix: DEFAULT_CLASS_PREFIX.to_string(),
            messages: UploadMessages::default(),
            files: vec![
                ScriptedFile::new(
                    "report.pdf",
                    "application/pdf",
                    4_000,
                    vec![
                        ScriptStep::Status(LoaderStatus::Loaded),
                        ScriptStep::Status(LoaderStatus::Uploading),
                        ScriptStep::Progress(1_000),
                        ScriptStep::Progress(3_000),
                        ScriptStep::Complete("/files/report.pdf".to_string()),
                    ],
                ),
                ScriptedFile::new(
                    "photo.png",
                    "image/png",
                    2_000,
                    vec![
                        ScriptStep::Status(LoaderStatus::Loaded),
                        ScriptStep::Status(LoaderStatus::Uploading),
                        ScriptStep::Fail("File is too big.".to_string()),
                    ],
                ),
                ScriptedFile::new(
                    "notes.txt",
                    "text/plain",
                    500,
                    vec![
                        ScriptStep::Status(LoaderStatus::Loaded),
                        ScriptStep::DeletePlaceholder,
                        ScriptStep::Status(LoaderStatus::Uploading),
                    ],
                ),
            ],
        }
    }
}

pub fn load_config(path: &Path) -> Result<DemoConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read demo config {:?}", path))?;
    let config: DemoConfig = ron::from_str(&content)
        .with_context(|| format!("failed to parse demo config {:?}", path))?;
    upload_info!(
        "loaded demo config {:?} with {} file(s)",
        path,
        config.files.len()
    );
    Ok(config)
}

/// The config at `path`, or the built-in scenario when no path is given.
pub fn load_or_default(path: Option<&Path>) -> Result<DemoConfig> {
    match path {
        Some(path) => load_config(path),
        None => Ok(DemoConfig::default()),
    }
}

pub fn save_config(path: &Path, config: &DemoConfig) -> Result<()> {
    let pretty = ron::ser::PrettyConfig::new();
    let content =
        ron::ser::to_string_pretty(config, pretty).context("failed to serialize demo config")?;
    fs::write(path, content).with_context(|| format!("failed to write demo config {:?}", path))?;
    Ok(())
}
