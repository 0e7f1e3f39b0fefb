use serde::{Deserialize, Serialize};

/// User-facing text shown by upload notifications.
///
/// `upload_many` understands `{current}`, `{max}` and `{percentage}`;
/// `upload_one` understands `{percentage}`; `done_many` replaces `%1` with
/// the number of uploaded files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadMessages {
    pub upload_many: String,
    pub upload_one: String,
    pub done_one: String,
    pub done_many: String,
    pub abort: String,
}

impl Default for UploadMessages {
    fn default() -> Self {
        Self {
            upload_many: "Uploading files, {current} of {max} done ({percentage}%)...".to_string(),
            upload_one: "Uploading file ({percentage}%)...".to_string(),
            done_one: "File successfully uploaded.".to_string(),
            done_many: "Successfully uploaded %1 files.".to_string(),
            abort: "Upload aborted by the user.".to_string(),
        }
    }
}

impl UploadMessages {
    /// Success text once `count` files have finished uploading.
    pub fn done_message(&self, count: usize) -> String {
        if count == 1 {
            self.done_one.clone()
        } else {
            self.done_many.replace("%1", &count.to_string())
        }
    }
}

/// Fills the `{current}`, `{max}` and `{percentage}` placeholders of a progress template.
pub fn render_progress(template: &str, current: usize, max: usize, percentage: u32) -> String {
    template
        .replace("{current}", &current.to_string())
        .replace("{max}", &max.to_string())
        .replace("{percentage}", &percentage.to_string())
}
