use std::collections::BTreeMap;
use std::fmt;

use upload_core::LoaderId;

/// Attribute carrying the id of the loader bound to a placeholder.
pub const UPLOAD_ID_ATTRIBUTE: &str = "data-cke-upload-id";
/// Attribute naming the widget type a placeholder turns into.
pub const WIDGET_ATTRIBUTE: &str = "data-widget";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WidgetId(pub u64);

impl fmt::Display for WidgetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Opaque selection or range marker that survives structural edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Bookmark(pub u64);

/// Half-open span of document positions, in the host's coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocRange {
    pub start: usize,
    pub end: usize,
}

impl DocRange {
    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }
}

/// How content handed to `insert_html_into_range` is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InsertMode {
    /// Filtered HTML, the editor's regular paste path.
    #[default]
    Html,
    UnfilteredHtml,
    /// Plain text; markup characters are escaped.
    Text,
}

/// Detached element built outside the document, e.g. a paste placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    pub attributes: BTreeMap<String, String>,
    pub text: String,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: BTreeMap::new(),
            text: String::new(),
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attribute(name, value);
        self
    }

    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(name.into(), value.into());
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attribute("class").unwrap_or("").split_whitespace()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes().any(|existing| existing == class)
    }

    pub fn add_class(&mut self, class: &str) {
        if self.has_class(class) {
            return;
        }
        let mut classes: Vec<&str> = self.classes().collect();
        classes.push(class);
        let joined = classes.join(" ");
        self.set_attribute("class", joined);
    }

    pub fn remove_class(&mut self, class: &str) {
        let remaining: Vec<&str> = self.classes().filter(|c| *c != class).collect();
        if remaining.is_empty() {
            self.attributes.remove("class");
        } else {
            let joined = remaining.join(" ");
            self.set_attribute("class", joined);
        }
    }

    /// The loader id from the upload-id attribute, if present and well formed.
    pub fn upload_id(&self) -> Option<LoaderId> {
        self.attribute(UPLOAD_ID_ATTRIBUTE).and_then(LoaderId::parse)
    }

    pub fn outer_html(&self) -> String {
        let mut html = format!("<{}", self.tag);
        for (name, value) in &self.attributes {
            html.push_str(&format!(" {}=\"{}\"", name, escape_attribute(value)));
        }
        html.push('>');
        html.push_str(&escape_text(&self.text));
        html.push_str(&format!("</{}>", self.tag));
        html
    }
}

pub fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_attribute(value: &str) -> String {
    escape_text(value).replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outer_html_escapes_text_and_attributes() {
        let element = Element::new("a")
            .with_attribute("href", "/f?a=1&b=\"2\"")
            .with_text("<file>");

        assert_eq!(
            element.outer_html(),
            "<a href=\"/f?a=1&amp;b=&quot;2&quot;\">&lt;file&gt;</a>"
        );
    }

    #[test]
    fn classes_are_added_once_and_removed_cleanly() {
        let mut element = Element::new("span");
        element.add_class("cke_upload_loading");
        element.add_class("cke_upload_loading");
        element.add_class("other");
        assert_eq!(element.attribute("class"), Some("cke_upload_loading other"));

        element.remove_class("cke_upload_loading");
        element.remove_class("other");
        assert_eq!(element.attribute("class"), None);
    }
}
