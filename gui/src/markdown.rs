//! Markdown rendering for the generated post.
//!
//! The post is parsed once into flat [`Block`]s and then laid out with plain
//! iced text widgets. Inline emphasis is dropped; links keep their URL in
//! parentheses so citations stay visible.

use iced::widget::{container, horizontal_rule, row, text, Column, Space};
use iced::{Element, Font};
use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Heading { level: u8, text: String },
    Paragraph(String),
    ListItem { marker: String, depth: usize, text: String },
    Code(String),
    Rule,
}

#[derive(Default)]
struct BlockBuilder {
    blocks: Vec<Block>,
    current: String,
    lists: Vec<Option<u64>>,
    markers: Vec<String>,
    links: Vec<String>,
    in_code: bool,
}

impl BlockBuilder {
    fn take_text(&mut self) -> String {
        let text = self.current.trim().to_string();
        self.current.clear();
        text
    }

    fn flush_paragraph(&mut self) {
        let text = self.take_text();
        if !text.is_empty() {
            self.blocks.push(Block::Paragraph(text));
        }
    }

    fn flush_item(&mut self) {
        let text = self.take_text();
        if text.is_empty() {
            return;
        }
        let depth = self.lists.len().saturating_sub(1);
        let marker = self.markers.last().cloned().unwrap_or_default();
        self.blocks.push(Block::ListItem {
            marker,
            depth,
            text,
        });
    }

    fn in_item(&self) -> bool {
        !self.markers.is_empty()
    }

    /// Text inside a list item keeps the item's marker.
    fn flush_block(&mut self) {
        if self.in_item() {
            self.flush_item();
        } else {
            self.flush_paragraph();
        }
    }

    fn start(&mut self, tag: Tag) {
        match tag {
            Tag::Paragraph => {
                if self.in_item() && !self.current.trim().is_empty() {
                    self.current.push(' ');
                }
            }
            Tag::Heading { .. } => self.flush_paragraph(),
            Tag::List(start) => {
                self.flush_block();
                self.lists.push(start);
            }
            Tag::Item => {
                let marker = match self.lists.last_mut() {
                    Some(Some(next)) => {
                        let marker = format!("{}.", next);
                        *next += 1;
                        marker
                    }
                    _ => "•".to_string(),
                };
                self.markers.push(marker);
            }
            Tag::CodeBlock(_) => {
                self.flush_block();
                self.in_code = true;
            }
            Tag::Link { dest_url, .. } => self.links.push(dest_url.into_string()),
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => {
                if !self.in_item() {
                    self.flush_paragraph();
                }
            }
            TagEnd::Heading(level) => {
                let text = self.take_text();
                self.blocks.push(Block::Heading {
                    level: level as u8,
                    text,
                });
            }
            TagEnd::List(_) => {
                self.lists.pop();
            }
            TagEnd::Item => {
                self.flush_item();
                self.markers.pop();
            }
            TagEnd::CodeBlock => {
                let code = self.current.trim_end_matches('\n').to_string();
                self.current.clear();
                self.in_code = false;
                self.blocks.push(Block::Code(code));
            }
            TagEnd::Link => {
                if let Some(url) = self.links.pop() {
                    // Autolinks already show the URL as their text.
                    if !self.current.ends_with(url.as_str()) {
                        self.current.push_str(&format!(" ({})", url));
                    }
                }
            }
            _ => {}
        }
    }

    fn finish(mut self) -> Vec<Block> {
        self.flush_block();
        self.blocks
    }
}

pub fn parse_blocks(markdown: &str) -> Vec<Block> {
    let mut builder = BlockBuilder::default();

    for event in Parser::new_ext(markdown, Options::ENABLE_STRIKETHROUGH) {
        match event {
            Event::Start(tag) => builder.start(tag),
            Event::End(tag) => builder.end(tag),
            Event::Text(value) | Event::Code(value) => builder.current.push_str(&value),
            Event::SoftBreak => {
                let separator = if builder.in_code { '\n' } else { ' ' };
                builder.current.push(separator);
            }
            Event::HardBreak => builder.current.push('\n'),
            Event::Rule => {
                builder.flush_block();
                builder.blocks.push(Block::Rule);
            }
            _ => {}
        }
    }

    builder.finish()
}

fn heading_size(level: u8) -> u16 {
    match level {
        1 => 28,
        2 => 24,
        3 => 20,
        _ => 18,
    }
}

pub fn view<'a, Message: 'a>(blocks: &'a [Block]) -> Element<'a, Message> {
    let mut content = Column::new().spacing(10);

    for block in blocks {
        let element: Element<'a, Message> = match block {
            Block::Heading { level, text: title } => {
                text(title).size(heading_size(*level)).into()
            }
            Block::Paragraph(body) => text(body).size(16).into(),
            Block::ListItem {
                marker,
                depth,
                text: body,
            } => row![
                Space::with_width(*depth as f32 * 20.0),
                text(marker).size(16),
                text(body).size(16)
            ]
            .spacing(6)
            .into(),
            Block::Code(code) => container(text(code).font(Font::MONOSPACE).size(14))
                .padding(8)
                .into(),
            Block::Rule => horizontal_rule(1).into(),
        };
        content = content.push(element);
    }

    content.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headings_and_paragraphs() {
        let blocks = parse_blocks("# Sourdough Secrets\n\nStart with a **lively** starter.\nFeed it daily.\n\n## Shaping\n\nBe gentle.");
        assert_eq!(
            blocks,
            vec![
                Block::Heading {
                    level: 1,
                    text: "Sourdough Secrets".to_string()
                },
                Block::Paragraph("Start with a lively starter. Feed it daily.".to_string()),
                Block::Heading {
                    level: 2,
                    text: "Shaping".to_string()
                },
                Block::Paragraph("Be gentle.".to_string()),
            ]
        );
    }

    #[test]
    fn test_reference_list_keeps_urls() {
        let blocks = parse_blocks(
            "## References\n\n1. [Tip A](https://www.reddit.com/r/Baking/a)\n2. [Tip B](https://www.reddit.com/r/Baking/b)\n",
        );
        assert_eq!(
            blocks[1..],
            [
                Block::ListItem {
                    marker: "1.".to_string(),
                    depth: 0,
                    text: "Tip A (https://www.reddit.com/r/Baking/a)".to_string()
                },
                Block::ListItem {
                    marker: "2.".to_string(),
                    depth: 0,
                    text: "Tip B (https://www.reddit.com/r/Baking/b)".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_nested_bullets() {
        let blocks = parse_blocks("- Flour\n  - Bread flour\n- Water\n");
        assert_eq!(
            blocks,
            vec![
                Block::ListItem {
                    marker: "•".to_string(),
                    depth: 0,
                    text: "Flour".to_string()
                },
                Block::ListItem {
                    marker: "•".to_string(),
                    depth: 1,
                    text: "Bread flour".to_string()
                },
                Block::ListItem {
                    marker: "•".to_string(),
                    depth: 0,
                    text: "Water".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_item_text_around_nested_list_keeps_marker() {
        let blocks = parse_blocks("1. Mix\n   - flour\n\n   Then rest.\n2. Bake\n");
        assert_eq!(
            blocks,
            vec![
                Block::ListItem {
                    marker: "1.".to_string(),
                    depth: 0,
                    text: "Mix".to_string()
                },
                Block::ListItem {
                    marker: "•".to_string(),
                    depth: 1,
                    text: "flour".to_string()
                },
                Block::ListItem {
                    marker: "1.".to_string(),
                    depth: 0,
                    text: "Then rest.".to_string()
                },
                Block::ListItem {
                    marker: "2.".to_string(),
                    depth: 0,
                    text: "Bake".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_code_inside_list_item() {
        let blocks = parse_blocks("- Mix:\n\n  ```\n  flour\n  ```\n- Bake\n");
        assert_eq!(
            blocks,
            vec![
                Block::ListItem {
                    marker: "•".to_string(),
                    depth: 0,
                    text: "Mix:".to_string()
                },
                Block::Code("flour".to_string()),
                Block::ListItem {
                    marker: "•".to_string(),
                    depth: 0,
                    text: "Bake".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_autolink_is_not_duplicated() {
        let blocks = parse_blocks("See <https://www.reddit.com/r/Baking>");
        assert_eq!(
            blocks,
            vec![Block::Paragraph(
                "See https://www.reddit.com/r/Baking".to_string()
            )]
        );
    }

    #[test]
    fn test_code_and_rule() {
        let blocks = parse_blocks("```\nflour: 500g\nwater: 350g\n```\n\n---\n\nDone");
        assert_eq!(
            blocks,
            vec![
                Block::Code("flour: 500g\nwater: 350g".to_string()),
                Block::Rule,
                Block::Paragraph("Done".to_string()),
            ]
        );
    }

    #[test]
    fn test_plain_text_passes_through() {
        assert_eq!(
            parse_blocks("Just a sentence."),
            vec![Block::Paragraph("Just a sentence.".to_string())]
        );
        assert!(parse_blocks("").is_empty());
    }
}
