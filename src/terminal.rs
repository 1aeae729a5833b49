//! Terminal rendering target
//!
//! Draws the transcript on stdout with crossterm styling. Inline markup maps
//! to text attributes; block markup maps to line starts with a hanging
//! indent under the bot's name.

use crate::presentation::{BubbleId, InputSurface, MarkupTag, Renderer};
use crossterm::cursor::MoveToPreviousLine;
use crossterm::style::{Attribute, Print, PrintStyledContent, SetAttribute, Stylize};
use crossterm::queue;
use crossterm::terminal::{Clear, ClearType};
use std::io::{self, IsTerminal, Stdout, Write};
use std::sync::Mutex;

const BOT_NAME: &str = "Boxy";
const INDENT: &str = "       ";
const PROMPT: &str = "> ";

#[derive(Default)]
struct TerminalState {
    /// Open elements of the bubble being revealed, outermost first
    open: Vec<MarkupTag>,
    /// Next number for each open list; `None` for bullet lists
    lists: Vec<Option<u64>>,
    /// Whether anything has been written since the bubble's content began
    wrote_content: bool,
    /// The input prompt is the last thing on screen
    prompt_shown: bool,
}

pub struct TerminalRenderer {
    out: Mutex<(Stdout, TerminalState)>,
    /// The user's own keystrokes are on screen and get replaced by the echo
    interactive: bool,
}

impl TerminalRenderer {
    pub fn new() -> Self {
        Self {
            out: Mutex::new((io::stdout(), TerminalState::default())),
            interactive: io::stdin().is_terminal(),
        }
    }

    fn draw(&self, f: impl FnOnce(&mut Stdout, &mut TerminalState) -> io::Result<()>) {
        let Ok(mut guard) = self.out.lock() else {
            return;
        };
        let (out, state) = &mut *guard;
        state.prompt_shown = false;
        if let Err(e) = f(out, state) {
            tracing::warn!(error = %e, "Terminal write failed");
        }
    }
}

impl Default for TerminalRenderer {
    fn default() -> Self {
        Self::new()
    }
}

fn attribute(tag: &MarkupTag) -> Option<Attribute> {
    match tag {
        MarkupTag::Strong | MarkupTag::Heading { .. } => Some(Attribute::Bold),
        MarkupTag::Emphasis => Some(Attribute::Italic),
        MarkupTag::Strikethrough => Some(Attribute::CrossedOut),
        MarkupTag::Small | MarkupTag::Code | MarkupTag::CodeBlock => Some(Attribute::Dim),
        MarkupTag::Link { .. } => Some(Attribute::Underlined),
        MarkupTag::Paragraph | MarkupTag::BlockQuote | MarkupTag::List { .. } | MarkupTag::Item => None,
    }
}

/// Reset attributes and re-apply those of the still-open elements
fn restyle(out: &mut Stdout, open: &[MarkupTag]) -> io::Result<()> {
    queue!(out, SetAttribute(Attribute::Reset))?;
    for attr in open.iter().filter_map(attribute) {
        queue!(out, SetAttribute(attr))?;
    }
    Ok(())
}

/// Start a fresh line inside the bubble, keeping the hanging indent
fn new_line(out: &mut Stdout, state: &mut TerminalState) -> io::Result<()> {
    if state.wrote_content {
        queue!(out, Print("\n"), Print(INDENT))?;
        let depth = state.lists.len().saturating_sub(1);
        for _ in 0..depth {
            queue!(out, Print("  "))?;
        }
        if state.open.contains(&MarkupTag::BlockQuote) {
            queue!(out, PrintStyledContent("│ ".dark_grey()))?;
        }
    }
    Ok(())
}

impl Renderer for TerminalRenderer {
    fn append_user(&self, text: &str) {
        let interactive = self.interactive;
        self.draw(|out, _| {
            if interactive {
                queue!(out, MoveToPreviousLine(1), Clear(ClearType::CurrentLine))?;
            }
            queue!(
                out,
                PrintStyledContent("  you › ".dark_grey()),
                Print(text),
                Print("\n")
            )
        });
    }

    fn begin_bubble(&self, _bubble: BubbleId) {
        self.draw(|out, state| {
            *state = TerminalState::default();
            queue!(out, PrintStyledContent(format!("{BOT_NAME} is typing…").dark_grey().italic()))
        });
    }

    fn start_content(&self, _bubble: BubbleId) {
        self.draw(|out, _| {
            queue!(
                out,
                Print("\r"),
                Clear(ClearType::CurrentLine),
                PrintStyledContent(format!("{BOT_NAME} › ").cyan().bold())
            )
        });
    }

    fn open(&self, _bubble: BubbleId, tag: &MarkupTag) {
        self.draw(|out, state| {
            match tag {
                MarkupTag::List { ordered } => state.lists.push(ordered.then_some(1)),
                MarkupTag::Item => {
                    new_line(out, state)?;
                    let marker = match state.lists.last_mut() {
                        Some(Some(next)) => {
                            let marker = format!("{next}. ");
                            *next += 1;
                            marker
                        }
                        _ => "• ".to_string(),
                    };
                    queue!(out, Print(marker))?;
                }
                MarkupTag::Paragraph | MarkupTag::Heading { .. } | MarkupTag::CodeBlock => {
                    new_line(out, state)?;
                }
                MarkupTag::BlockQuote => {
                    state.open.push(tag.clone());
                    new_line(out, state)?;
                    return Ok(());
                }
                _ => {}
            }
            state.open.push(tag.clone());
            restyle(out, &state.open)
        });
    }

    fn close(&self, _bubble: BubbleId, tag: &MarkupTag) {
        self.draw(|out, state| {
            if let Some(index) = state.open.iter().rposition(|open| open == tag) {
                state.open.remove(index);
            }
            if matches!(tag, MarkupTag::List { .. }) {
                state.lists.pop();
            }
            restyle(out, &state.open)
        });
    }

    fn line_break(&self, _bubble: BubbleId) {
        self.draw(|out, state| new_line(out, state));
    }

    fn push_text(&self, _bubble: BubbleId, text: &str) {
        self.draw(|out, state| {
            for (index, line) in text.split('\n').enumerate() {
                if index > 0 {
                    new_line(out, state)?;
                }
                queue!(out, Print(line))?;
            }
            state.wrote_content = true;
            Ok(())
        });
    }

    fn finish_bubble(&self, _bubble: BubbleId) {
        self.draw(|out, state| {
            *state = TerminalState::default();
            queue!(out, SetAttribute(Attribute::Reset), Print("\n"))
        });
    }

    fn scroll_to_bottom(&self) {
        self.draw(|out, _| out.flush());
    }

    fn show_input(&self, surface: &InputSurface) {
        self.draw(|out, state| {
            if !surface.choices.is_empty() {
                queue!(out, Print(INDENT))?;
                for (index, label) in surface.choices.iter().enumerate() {
                    queue!(
                        out,
                        PrintStyledContent(format!("[{}]", index + 1).yellow()),
                        Print(format!(" {label}  "))
                    )?;
                }
                queue!(out, Print("\n"))?;
            }
            if let Some(field) = &surface.field {
                queue!(out, PrintStyledContent(format!("  {}", field.label).bold()))?;
                if !field.placeholder.is_empty() {
                    queue!(out, PrintStyledContent(format!(" ({})", field.placeholder).dark_grey()))?;
                }
                queue!(out, Print("\n"))?;
            }
            if let Some(hint) = &surface.hint {
                queue!(out, PrintStyledContent(format!("  {hint}").dark_grey().italic()), Print("\n"))?;
            }
            if surface.field.is_some() || !surface.choices.is_empty() {
                queue!(out, PrintStyledContent(PROMPT.green()))?;
                state.prompt_shown = true;
            }
            out.flush()
        });
    }

    fn focus_input(&self) {
        let Ok(mut guard) = self.out.lock() else {
            return;
        };
        let (out, state) = &mut *guard;
        if state.prompt_shown {
            return;
        }
        state.prompt_shown = true;
        if let Err(e) = queue!(out, PrintStyledContent(PROMPT.green())).and_then(|()| out.flush()) {
            tracing::warn!(error = %e, "Terminal write failed");
        }
    }
}
