//! Rendering target abstraction
//!
//! The transcript surface is driven through this trait so the queue and the
//! runtime can be exercised against a recording mock.

use super::markup::MarkupTag;
use serde::Serialize;

/// Identifies one bot bubble in the transcript
pub type BubbleId = u64;

/// Text field shown under the transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InputField {
    pub label: String,
    pub placeholder: String,
}

/// Snapshot of the input area handed to the renderer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InputSurface {
    /// `None` hides the text field
    pub field: Option<InputField>,
    pub hint: Option<String>,
    /// Labels of the offered choices, in offer order
    pub choices: Vec<String>,
}

/// Rendering target for the transcript and input area
pub trait Renderer: Send + Sync {
    /// Append a user-authored bubble immediately
    fn append_user(&self, text: &str);

    /// Append an empty bot bubble showing the composing affordance
    fn begin_bubble(&self, bubble: BubbleId);

    /// Remove the composing affordance; content follows
    fn start_content(&self, bubble: BubbleId);

    fn open(&self, bubble: BubbleId, tag: &MarkupTag);

    fn close(&self, bubble: BubbleId, tag: &MarkupTag);

    fn line_break(&self, bubble: BubbleId);

    /// Append revealed text to the innermost open element
    fn push_text(&self, bubble: BubbleId, text: &str);

    fn finish_bubble(&self, bubble: BubbleId);

    fn scroll_to_bottom(&self);

    /// Redraw the input area from a fresh snapshot
    fn show_input(&self, surface: &InputSurface);

    fn focus_input(&self);
}
