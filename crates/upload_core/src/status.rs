use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier handed out by the uploads repository.
///
/// Stable for the whole lifetime of a loader and written verbatim into the
/// placeholder's upload-id attribute.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct LoaderId(pub u64);

impl LoaderId {
    /// Parses the attribute form written by [`fmt::Display`].
    pub fn parse(raw: &str) -> Option<Self> {
        raw.trim().parse().ok().map(Self)
    }
}

impl fmt::Display for LoaderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Progress of a single file loader.
///
/// Statuses only move forward along `idle → loading → loaded → uploading →
/// uploaded`; `error` and `abort` can be entered from anywhere before
/// `uploaded` and are absorbing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoaderStatus {
    #[default]
    Idle,
    Loading,
    Loaded,
    Uploading,
    Uploaded,
    Error,
    Abort,
}

impl LoaderStatus {
    pub const ALL: [LoaderStatus; 7] = [
        LoaderStatus::Idle,
        LoaderStatus::Loading,
        LoaderStatus::Loaded,
        LoaderStatus::Uploading,
        LoaderStatus::Uploaded,
        LoaderStatus::Error,
        LoaderStatus::Abort,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LoaderStatus::Idle => "idle",
            LoaderStatus::Loading => "loading",
            LoaderStatus::Loaded => "loaded",
            LoaderStatus::Uploading => "uploading",
            LoaderStatus::Uploaded => "uploaded",
            LoaderStatus::Error => "error",
            LoaderStatus::Abort => "abort",
        }
    }

    /// `error` and `abort`: the statuses that remove a placeholder by default.
    pub fn is_failure(self) -> bool {
        matches!(self, LoaderStatus::Error | LoaderStatus::Abort)
    }

    /// Statuses after which the loader never changes again.
    pub fn is_settled(self) -> bool {
        matches!(
            self,
            LoaderStatus::Uploaded | LoaderStatus::Error | LoaderStatus::Abort
        )
    }

    /// Style class applied to a placeholder while its loader is in this status.
    pub fn class_name(self, prefix: &str) -> String {
        format!("{prefix}{}", self.as_str())
    }

    /// The dedicated event a loader fires when entering this status, if any.
    ///
    /// Every status change is additionally followed by [`LoaderEvent::Update`].
    pub fn event(self) -> Option<LoaderEvent> {
        match self {
            LoaderStatus::Loaded => Some(LoaderEvent::Loaded),
            LoaderStatus::Uploaded => Some(LoaderEvent::Uploaded),
            LoaderStatus::Error => Some(LoaderEvent::Error),
            LoaderStatus::Abort => Some(LoaderEvent::Abort),
            LoaderStatus::Idle | LoaderStatus::Loading | LoaderStatus::Uploading => None,
        }
    }

    /// Whether a loader currently in `self` may report `next`.
    pub fn can_advance_to(self, next: LoaderStatus) -> bool {
        if self.is_settled() {
            return self == next;
        }
        if next.is_failure() {
            return true;
        }
        next.rank() >= self.rank()
    }

    fn rank(self) -> u8 {
        match self {
            LoaderStatus::Idle => 0,
            LoaderStatus::Loading => 1,
            LoaderStatus::Loaded => 2,
            LoaderStatus::Uploading => 3,
            LoaderStatus::Uploaded => 4,
            LoaderStatus::Error | LoaderStatus::Abort => 5,
        }
    }
}

impl fmt::Display for LoaderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Events a loader emits to its listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoaderEvent {
    Update,
    Loaded,
    Uploaded,
    Error,
    Abort,
}

/// Which loader operation starts the transfer of a pasted file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LoadMethod {
    /// Read the file into memory only.
    Load,
    /// Stream the file to the server without reading it first.
    Upload,
    /// Read the file, then upload it.
    #[default]
    LoadAndUpload,
}

impl LoadMethod {
    /// Methods that transfer bytes to a server and therefore report upload progress.
    pub fn uploads(self) -> bool {
        matches!(self, LoadMethod::Upload | LoadMethod::LoadAndUpload)
    }
}

/// Point-in-time view of a loader, handed to hooks and listeners.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LoaderSnapshot {
    pub id: LoaderId,
    pub status: LoaderStatus,
    pub file_name: String,
    pub total: u64,
    pub uploaded: u64,
    /// Human readable failure text; set together with [`LoaderStatus::Error`].
    pub message: Option<String>,
    /// Location of the uploaded file as reported by the server.
    pub url: Option<String>,
}
