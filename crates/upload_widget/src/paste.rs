use regex::Regex;
use upload_core::LoaderId;

use crate::dom::{Element, UPLOAD_ID_ATTRIBUTE, WIDGET_ATTRIBUTE};
use crate::loader::PastedFile;

/// Payload of one paste or drop, as seen by upload definitions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PasteData {
    /// HTML about to be inserted. Non-empty means another handler already
    /// produced content and files are left alone.
    pub data_value: String,
    pub files: Vec<PastedFile>,
    /// Placeholders appended to `data_value`, in insertion order.
    pub elements: Vec<Element>,
}

impl PasteData {
    pub fn with_files(files: Vec<PastedFile>) -> Self {
        Self {
            files,
            ..Self::default()
        }
    }

    pub fn with_html(html: impl Into<String>) -> Self {
        Self {
            data_value: html.into(),
            ..Self::default()
        }
    }
}

/// Marks `element` so the widget system upcasts it into a `widget_name`
/// widget bound to `loader`.
pub fn mark_element(element: &mut Element, widget_name: &str, loader: LoaderId) {
    element.set_attribute(WIDGET_ATTRIBUTE, widget_name);
    element.set_attribute(UPLOAD_ID_ATTRIBUTE, loader.to_string());
}

/// Whether the file's MIME type matches `pattern` anywhere.
pub fn is_type_supported(file: &PastedFile, pattern: &Regex) -> bool {
    pattern.is_match(&file.mime_type)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marking_sets_widget_and_upload_id() {
        let mut element = Element::new("span").with_text("report.pdf");
        mark_element(&mut element, "uploadfile", LoaderId(7));

        assert_eq!(element.attribute(WIDGET_ATTRIBUTE), Some("uploadfile"));
        assert_eq!(element.upload_id(), Some(LoaderId(7)));
    }

    #[test]
    fn supported_types_match_the_mime_type() {
        let images = Regex::new("image/(jpeg|png|gif)").unwrap();

        assert!(is_type_supported(&PastedFile::new("a.png", "image/png", 1), &images));
        assert!(!is_type_supported(&PastedFile::new("a.bmp", "image/bmp", 1), &images));
        assert!(!is_type_supported(&PastedFile::new("a.png", "", 1), &images));
    }
}
