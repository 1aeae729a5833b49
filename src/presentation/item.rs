//! Units of bot-authored content

use serde::Serialize;

/// Separator used when a multi-line item is flattened into markup
const LINE_SEPARATOR: &str = "<br />";

/// Content of a presentation item
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Content {
    /// A single block of Markdown
    Text(String),
    /// Ordered lines rendered with a line break between each
    Lines(Vec<String>),
}

impl Content {
    /// Flatten into the markup string fed to the parser
    pub fn to_markup(&self) -> String {
        match self {
            Content::Text(text) => text.trim().to_string(),
            Content::Lines(lines) => lines.join(LINE_SEPARATOR).trim().to_string(),
        }
    }
}

impl From<&str> for Content {
    fn from(text: &str) -> Self {
        Content::Text(text.to_string())
    }
}

impl From<String> for Content {
    fn from(text: String) -> Self {
        Content::Text(text)
    }
}

impl From<Vec<String>> for Content {
    fn from(lines: Vec<String>) -> Self {
        Content::Lines(lines)
    }
}

/// One bot bubble waiting to be revealed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PresentationItem {
    pub content: Content,
}

impl PresentationItem {
    pub fn new(content: impl Into<Content>) -> Self {
        Self {
            content: content.into(),
        }
    }
}
