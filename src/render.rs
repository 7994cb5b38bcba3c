//! Topic body rendering.
//!
//! Maps body markup to display widgets. The mapping is a flat dispatch on
//! top-level markdown blocks plus the `<Diagram>` MDX component:
//!
//! | Markup                          | Widget      |
//! |---------------------------------|-------------|
//! | ```` ```mermaid ```` fence      | `Diagram`   |
//! | `<Diagram>…</Diagram>`          | `Diagram`   |
//! | other code blocks               | `Code`      |
//! | list of `- [ ]` task items      | `Checklist` |
//! | headings                        | `Heading`   |
//! | block quotes                    | `Callout`   |
//! | everything else                 | `Prose`     |

use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag};
use serde::Serialize;
use thiserror::Error;

use crate::schema::is_absolute_url;

const DIAGRAM_OPEN: &str = "<Diagram";
const DIAGRAM_CLOSE: &str = "</Diagram>";

/// Errors rendering a topic body
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RenderError {
    #[error("<{component}> opened on line {line} is never closed")]
    UnclosedComponent { component: String, line: usize },
}

/// One checklist entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChecklistItem {
    pub text: String,
    pub checked: bool,
}

/// A display unit of a rendered body
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Widget {
    Heading {
        level: u8,
        text: String,
        /// Fragment id for in-page links
        anchor: String,
    },
    Prose {
        text: String,
    },
    Code {
        language: Option<String>,
        code: String,
    },
    /// Mermaid chart source
    Diagram {
        source: String,
    },
    Checklist {
        items: Vec<ChecklistItem>,
    },
    Callout {
        text: String,
    },
}

impl Widget {
    /// Short name used in outlines
    pub fn kind(&self) -> &'static str {
        match self {
            Widget::Heading { .. } => "heading",
            Widget::Prose { .. } => "prose",
            Widget::Code { .. } => "code",
            Widget::Diagram { .. } => "diagram",
            Widget::Checklist { .. } => "checklist",
            Widget::Callout { .. } => "callout",
        }
    }
}

/// Fragment id for a heading: lowercase, whitespace runs become `-`,
/// anything outside `[a-z0-9-]` is dropped.
pub fn heading_anchor(text: &str) -> String {
    let mut anchor = String::with_capacity(text.len());
    let mut in_space = false;

    for c in text.to_lowercase().chars() {
        if c.is_whitespace() {
            if !in_space {
                anchor.push('-');
            }
            in_space = true;
            continue;
        }
        in_space = false;
        if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' {
            anchor.push(c);
        }
    }

    anchor
}

fn options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_TASKLISTS);
    options
}

enum Segment {
    Markdown(String),
    Diagram(String),
}

fn is_fence(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.starts_with("```") || trimmed.starts_with("~~~")
}

fn opens_diagram(line: &str) -> bool {
    line.strip_prefix(DIAGRAM_OPEN)
        .and_then(|rest| rest.chars().next())
        .is_some_and(|c| c == '>' || c == '/' || c.is_whitespace())
}

/// Cut `<Diagram>` components out of the body, leaving markdown runs.
fn segments(body: &str) -> Result<Vec<Segment>, RenderError> {
    let mut segments = Vec::new();
    let mut markdown = String::new();
    let mut in_fence = false;
    let mut lines = body.lines().enumerate();

    while let Some((number, line)) = lines.next() {
        if is_fence(line) {
            in_fence = !in_fence;
        }

        let trimmed = line.trim_start();
        if in_fence || !opens_diagram(trimmed) {
            markdown.push_str(line);
            markdown.push('\n');
            continue;
        }

        // self-closing form carries no chart
        let Some(open_end) = trimmed.find('>') else {
            markdown.push_str(line);
            markdown.push('\n');
            continue;
        };
        if trimmed[..open_end].ends_with('/') {
            continue;
        }

        let mut source = String::new();
        let mut rest = &trimmed[open_end + 1..];
        let mut closed = false;

        loop {
            if let Some(close) = rest.find(DIAGRAM_CLOSE) {
                source.push_str(&rest[..close]);
                closed = true;
                break;
            }
            source.push_str(rest);
            source.push('\n');

            match lines.next() {
                Some((_, next)) => rest = next,
                None => break,
            }
        }

        if !closed {
            return Err(RenderError::UnclosedComponent {
                component: "Diagram".to_string(),
                line: number + 1,
            });
        }

        if !markdown.trim().is_empty() {
            segments.push(Segment::Markdown(std::mem::take(&mut markdown)));
        }
        markdown.clear();
        segments.push(Segment::Diagram(source.trim().to_string()));
    }

    if !markdown.trim().is_empty() {
        segments.push(Segment::Markdown(markdown));
    }

    Ok(segments)
}

/// Top-level block being collected
enum Block {
    Heading(u8),
    Code(Option<String>),
    List {
        items: Vec<ChecklistItem>,
        all_tasks: bool,
    },
    Quote,
    Prose,
    Skip,
}

fn block_for(tag: &Tag<'_>) -> Block {
    match tag {
        Tag::Heading { level, .. } => Block::Heading(*level as u8),
        Tag::CodeBlock(CodeBlockKind::Fenced(info)) => {
            let language = info.split_whitespace().next().map(str::to_string);
            Block::Code(language)
        }
        Tag::CodeBlock(CodeBlockKind::Indented) => Block::Code(None),
        Tag::List(_) => Block::List {
            items: Vec::new(),
            all_tasks: true,
        },
        Tag::BlockQuote(_) => Block::Quote,
        Tag::HtmlBlock => Block::Skip,
        _ => Block::Prose,
    }
}

fn finish(block: Block, text: String) -> Option<Widget> {
    match block {
        Block::Heading(level) => {
            let text = text.trim().to_string();
            Some(Widget::Heading {
                level,
                anchor: heading_anchor(&text),
                text,
            })
        }
        Block::Code(Some(language)) if language == "mermaid" => Some(Widget::Diagram {
            source: text.trim().to_string(),
        }),
        Block::Code(language) => Some(Widget::Code {
            language,
            code: text.trim_end_matches('\n').to_string(),
        }),
        Block::List { items, all_tasks } if all_tasks && !items.is_empty() => {
            Some(Widget::Checklist { items })
        }
        Block::List { items, .. } => {
            let text = items
                .iter()
                .map(|item| format!("- {}", item.text))
                .collect::<Vec<_>>()
                .join("\n");
            Some(Widget::Prose { text })
        }
        Block::Quote => Some(Widget::Callout {
            text: text.trim().to_string(),
        }),
        Block::Prose => {
            let text = text.trim().to_string();
            (!text.is_empty()).then_some(Widget::Prose { text })
        }
        Block::Skip => None,
    }
}

fn render_markdown(markdown: &str, widgets: &mut Vec<Widget>) {
    let mut depth = 0usize;
    let mut block = Block::Skip;
    let mut text = String::new();
    let mut item: Option<ChecklistItem> = None;
    let mut item_is_task = false;

    for event in Parser::new_ext(markdown, options()) {
        match event {
            Event::Start(tag) => {
                if depth == 0 {
                    block = block_for(&tag);
                    text.clear();
                } else if depth == 1 && matches!(tag, Tag::Item) {
                    item = Some(ChecklistItem {
                        text: String::new(),
                        checked: false,
                    });
                    item_is_task = false;
                } else if !text.is_empty() {
                    match tag {
                        Tag::Paragraph | Tag::Item | Tag::TableHead | Tag::TableRow => {
                            text.push('\n')
                        }
                        Tag::TableCell => text.push_str(" | "),
                        _ => {}
                    }
                }
                depth += 1;
            }
            Event::End(_) => {
                depth = depth.saturating_sub(1);
                if depth == 1 {
                    if let (Some(done), Block::List { items, all_tasks }) = (item.take(), &mut block)
                    {
                        *all_tasks &= item_is_task;
                        items.push(ChecklistItem {
                            text: done.text.trim().to_string(),
                            checked: done.checked,
                        });
                    }
                } else if depth == 0 {
                    let finished = std::mem::replace(&mut block, Block::Skip);
                    if let Some(widget) = finish(finished, std::mem::take(&mut text)) {
                        widgets.push(widget);
                    }
                }
            }
            Event::TaskListMarker(checked) => {
                if let Some(current) = item.as_mut() {
                    current.checked = checked;
                    item_is_task = true;
                }
            }
            Event::Text(t) | Event::Code(t) => push_text(&mut item, &mut text, &t),
            Event::SoftBreak => push_text(&mut item, &mut text, " "),
            Event::HardBreak => push_text(&mut item, &mut text, "\n"),
            _ => {}
        }
    }
}

fn push_text(item: &mut Option<ChecklistItem>, text: &mut String, s: &str) {
    match item {
        Some(current) => current.text.push_str(s),
        None => text.push_str(s),
    }
}

/// Render a topic body into widgets
pub fn render(body: &str) -> Result<Vec<Widget>, RenderError> {
    let mut widgets = Vec::new();

    for segment in segments(body)? {
        match segment {
            Segment::Markdown(markdown) => render_markdown(&markdown, &mut widgets),
            Segment::Diagram(source) => widgets.push(Widget::Diagram { source }),
        }
    }

    Ok(widgets)
}

/// Relative image and link targets in a body (query and fragment removed).
///
/// Absolute URLs, site-absolute paths and in-page anchors are not assets,
/// nor are links whose target has no file extension.
pub fn asset_references(body: &str) -> Vec<String> {
    let mut refs = Vec::new();

    for event in Parser::new_ext(body, options()) {
        let (dest, is_image) = match event {
            Event::Start(Tag::Image { dest_url, .. }) => (dest_url, true),
            Event::Start(Tag::Link { dest_url, .. }) => (dest_url, false),
            _ => continue,
        };

        let dest = dest.trim();
        if dest.is_empty() || dest.starts_with('#') || dest.starts_with('/') || is_absolute_url(dest)
        {
            continue;
        }

        let path = dest.split(['?', '#']).next().unwrap_or(dest).to_string();

        // links without a file extension point at pages, not files
        let has_extension = path.rsplit('/').next().is_some_and(|name| name.contains('.'));
        if !is_image && !has_extension {
            continue;
        }
        if !path.is_empty() && !refs.contains(&path) {
            refs.push(path);
        }
    }

    refs
}
