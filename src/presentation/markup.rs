//! Markup flattening for the typewriter
//!
//! Bot content is Markdown with two honored inline HTML tags (`<br>` and
//! `<small>`). Parsing happens once, before the reveal starts, and yields a
//! flat node list: open/close markers carry their tag (and therefore their
//! block or inline display), text runs are already whitespace-normalized.

use pulldown_cmark::{Event, Parser, Tag};
use serde::Serialize;

/// How a node participates in layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Display {
    Block,
    Inline,
}

/// Structural element kinds the renderer knows how to draw
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "tag", rename_all = "snake_case")]
pub enum MarkupTag {
    Paragraph,
    Heading { level: u8 },
    BlockQuote,
    CodeBlock,
    List { ordered: bool },
    Item,
    Strong,
    Emphasis,
    Strikethrough,
    Code,
    Small,
    Link { href: String },
}

impl MarkupTag {
    pub fn display(&self) -> Display {
        match self {
            MarkupTag::Paragraph
            | MarkupTag::Heading { .. }
            | MarkupTag::BlockQuote
            | MarkupTag::CodeBlock
            | MarkupTag::List { .. }
            | MarkupTag::Item => Display::Block,
            MarkupTag::Strong
            | MarkupTag::Emphasis
            | MarkupTag::Strikethrough
            | MarkupTag::Code
            | MarkupTag::Small
            | MarkupTag::Link { .. } => Display::Inline,
        }
    }
}

/// A single step of the reveal walk
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum RevealNode {
    Open(MarkupTag),
    Close(MarkupTag),
    Text(String),
    LineBreak,
}

/// Parse bot markup into the flat, normalized node list
pub fn parse(markup: &str) -> Vec<RevealNode> {
    let mut nodes = Vec::new();
    // Tags we skip still need a slot so their End event pops the right entry
    let mut open: Vec<Option<MarkupTag>> = Vec::new();

    for event in Parser::new(markup) {
        match event {
            Event::Start(tag) => {
                let mapped = map_tag(&tag);
                if let Some(tag) = &mapped {
                    nodes.push(RevealNode::Open(tag.clone()));
                }
                open.push(mapped);
            }
            Event::End(_) => {
                if let Some(Some(tag)) = open.pop() {
                    nodes.push(RevealNode::Close(tag));
                }
            }
            Event::Text(text) => push_text(&mut nodes, &text),
            Event::Code(text) => {
                nodes.push(RevealNode::Open(MarkupTag::Code));
                nodes.push(RevealNode::Text(text.to_string()));
                nodes.push(RevealNode::Close(MarkupTag::Code));
            }
            Event::SoftBreak => push_text(&mut nodes, "\n"),
            Event::HardBreak => nodes.push(RevealNode::LineBreak),
            Event::Html(raw) | Event::InlineHtml(raw) => push_html(&mut nodes, &raw),
            other => {
                tracing::trace!(event = ?other, "Ignoring unsupported markup event");
            }
        }
    }

    normalize(unwrap_lone_paragraph(nodes))
}

fn map_tag(tag: &Tag<'_>) -> Option<MarkupTag> {
    match tag {
        Tag::Paragraph => Some(MarkupTag::Paragraph),
        Tag::Heading { level, .. } => Some(MarkupTag::Heading {
            level: *level as u8,
        }),
        Tag::BlockQuote(_) => Some(MarkupTag::BlockQuote),
        Tag::CodeBlock(_) => Some(MarkupTag::CodeBlock),
        Tag::List(start) => Some(MarkupTag::List {
            ordered: start.is_some(),
        }),
        Tag::Item => Some(MarkupTag::Item),
        Tag::Emphasis => Some(MarkupTag::Emphasis),
        Tag::Strong => Some(MarkupTag::Strong),
        Tag::Strikethrough => Some(MarkupTag::Strikethrough),
        Tag::Link { dest_url, .. } => Some(MarkupTag::Link {
            href: dest_url.to_string(),
        }),
        _ => None,
    }
}

/// Append text, merging with a preceding text run
fn push_text(nodes: &mut Vec<RevealNode>, text: &str) {
    if let Some(RevealNode::Text(existing)) = nodes.last_mut() {
        existing.push_str(text);
    } else {
        nodes.push(RevealNode::Text(text.to_string()));
    }
}

/// Map the raw HTML the parser hands through. Only `<br>` and `<small>`
/// survive; any other tag is dropped while its surrounding text is kept.
fn push_html(nodes: &mut Vec<RevealNode>, raw: &str) {
    let mut pieces = raw.split('<');
    if let Some(leading) = pieces.next() {
        if !leading.is_empty() {
            push_text(nodes, leading);
        }
    }
    for piece in pieces {
        let Some((tag, trailing)) = piece.split_once('>') else {
            push_text(nodes, piece);
            continue;
        };
        let name = tag.trim().trim_end_matches('/').trim().to_ascii_lowercase();
        match name.as_str() {
            "br" => nodes.push(RevealNode::LineBreak),
            "small" => nodes.push(RevealNode::Open(MarkupTag::Small)),
            "/small" => nodes.push(RevealNode::Close(MarkupTag::Small)),
            _ => tracing::trace!(tag = %name, "Dropping unsupported html tag"),
        }
        if !trailing.is_empty() {
            push_text(nodes, trailing);
        }
    }
}

/// A message made of one paragraph renders as bare text
fn unwrap_lone_paragraph(mut nodes: Vec<RevealNode>) -> Vec<RevealNode> {
    let starts_with_paragraph = matches!(nodes.first(), Some(RevealNode::Open(MarkupTag::Paragraph)));
    if !starts_with_paragraph || !closes_at_end(&nodes) {
        return nodes;
    }
    nodes.pop();
    nodes.remove(0);
    nodes
}

/// True when the first node's element spans the whole list
fn closes_at_end(nodes: &[RevealNode]) -> bool {
    let mut depth = 0usize;
    for (index, node) in nodes.iter().enumerate() {
        match node {
            RevealNode::Open(_) => depth += 1,
            RevealNode::Close(_) => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return index + 1 == nodes.len();
                }
            }
            RevealNode::Text(_) | RevealNode::LineBreak => {}
        }
    }
    false
}

#[derive(Debug, Clone, Copy)]
enum Direction {
    Before,
    After,
}

fn normalize(nodes: Vec<RevealNode>) -> Vec<RevealNode> {
    let mut normalized = Vec::with_capacity(nodes.len());
    for (index, node) in nodes.iter().enumerate() {
        match node {
            RevealNode::Text(text) if text.trim().is_empty() => {
                let before = sibling_display(nodes[..index].iter().rev(), Direction::Before);
                let after = sibling_display(nodes[index + 1..].iter(), Direction::After);
                if before == Some(Display::Inline) && after == Some(Display::Inline) {
                    normalized.push(RevealNode::Text(" ".to_string()));
                }
            }
            RevealNode::Text(text) => normalized.push(RevealNode::Text(collapse_whitespace(text))),
            other => normalized.push(other.clone()),
        }
    }
    normalized
}

/// Display of the nearest meaningful sibling, or `None` at the parent's edge
fn sibling_display<'a>(
    walk: impl Iterator<Item = &'a RevealNode>,
    direction: Direction,
) -> Option<Display> {
    for node in walk {
        match (node, direction) {
            (RevealNode::Text(text), _) if text.trim().is_empty() => {}
            (RevealNode::Text(_), _) => return Some(Display::Inline),
            (RevealNode::LineBreak, _) => return Some(Display::Block),
            (RevealNode::Close(tag), Direction::Before) | (RevealNode::Open(tag), Direction::After) => {
                return Some(tag.display());
            }
            (RevealNode::Open(_), Direction::Before) | (RevealNode::Close(_), Direction::After) => {
                return None;
            }
        }
    }
    None
}

fn collapse_whitespace(text: &str) -> String {
    let mut collapsed = String::with_capacity(text.len());
    let mut in_run = false;
    for ch in text.chars() {
        if ch.is_whitespace() {
            if !in_run {
                collapsed.push(' ');
            }
            in_run = true;
        } else {
            collapsed.push(ch);
            in_run = false;
        }
    }
    collapsed
}
