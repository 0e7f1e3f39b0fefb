use upload_core::{LoadMethod, LoaderId, LoaderSnapshot, LoaderStatus};

/// A file handed over by a paste or drop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PastedFile {
    pub name: String,
    pub mime_type: String,
    pub size: u64,
}

impl PastedFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            size,
        }
    }
}

/// Tracks reading and uploading of one file.
///
/// Transfers run elsewhere; the upload machinery only observes status and
/// counters and may request an abort.
pub trait FileLoader {
    fn id(&self) -> LoaderId;
    fn snapshot(&self) -> LoaderSnapshot;

    fn status(&self) -> LoaderStatus {
        self.snapshot().status
    }

    fn load(&mut self, url: Option<&str>);
    fn upload(&mut self, url: Option<&str>);
    fn load_and_upload(&mut self, url: Option<&str>);
    /// Cancels the transfer. Must be a no-op on a settled loader.
    fn abort(&mut self);

    fn start(&mut self, method: LoadMethod, url: Option<&str>) {
        match method {
            LoadMethod::Load => self.load(url),
            LoadMethod::Upload => self.upload(url),
            LoadMethod::LoadAndUpload => self.load_and_upload(url),
        }
    }
}

/// Owns every loader of an editor, keyed by id.
pub trait UploadRepository {
    fn create(&mut self, file: &PastedFile) -> LoaderId;
    fn loader(&self, id: LoaderId) -> Option<&dyn FileLoader>;
    fn loader_mut(&mut self, id: LoaderId) -> Option<&mut dyn FileLoader>;
}
