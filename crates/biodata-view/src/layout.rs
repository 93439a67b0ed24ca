// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Box layout — turns a subtree of the view into an owned tree of positioned
// boxes that a rasterizer can paint without touching the live tree.
//
// Blocks stack their children along their main axis. Rows share the width
// left over after fixed-width children equally among the rest. Text is
// wrapped at an estimated average glyph width.

use biodata_core::Color;
use biodata_core::error::Result;

use crate::tree::{Border, Direction, NodeId, NodeKind, TextStyle, ViewTree};

/// Average glyph advance as a fraction of the font size.
const AVG_GLYPH_WIDTH: f32 = 0.5;

/// Line height as a multiple of the font size.
const LINE_HEIGHT: f32 = 1.4;

/// Aspect ratio used for images without an explicit height.
const DEFAULT_IMAGE_ASPECT: f32 = 0.75;

/// Axis-aligned rectangle in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Wrapped text ready to paint.
#[derive(Debug, Clone, PartialEq)]
pub struct TextBlock {
    pub lines: Vec<String>,
    pub style: TextStyle,
    pub line_height: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    None,
    Text(TextBlock),
    Image { src: String, alt: String },
}

/// One positioned box. Owns its children, so it can be moved to another
/// thread while the live tree keeps changing.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutBox {
    pub node: NodeId,
    pub rect: Rect,
    pub background: Option<Color>,
    pub border: Option<Border>,
    pub border_left: Option<Border>,
    /// Area inside padding and borders.
    pub content_rect: Rect,
    pub content: Content,
    pub children: Vec<LayoutBox>,
}

impl LayoutBox {
    /// Depth-first search for the box laid out for `node`.
    pub fn find(&self, node: NodeId) -> Option<&LayoutBox> {
        if self.node == node {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(node))
    }

    /// Number of boxes in this tree, including `self`.
    pub fn box_count(&self) -> usize {
        1 + self.children.iter().map(LayoutBox::box_count).sum::<usize>()
    }
}

/// Lay out the subtree rooted at `id` with its top-left corner at the origin.
pub fn layout_subtree(tree: &ViewTree, id: NodeId, available_width: f32) -> Result<LayoutBox> {
    layout_node(tree, id, 0.0, 0.0, available_width.max(0.0))
}

fn layout_node(tree: &ViewTree, id: NodeId, x: f32, y: f32, available: f32) -> Result<LayoutBox> {
    let node = tree.node(id)?;
    let style = &node.style;

    let mut width = style.width.map(|w| w as f32).unwrap_or(available);
    if let Some(max) = style.max_width {
        width = width.min(max as f32);
    }

    let border = style.border.map(|b| b.width as f32).unwrap_or(0.0);
    let accent = style.border_left.map(|b| b.width as f32).unwrap_or(0.0);
    let padding = style.padding as f32;
    let inset_left = border + accent + padding;
    let inset = border + padding;
    let inner_width = (width - inset_left - inset).max(0.0);
    let inner_x = x + inset_left;
    let inner_y = y + inset;

    let (content, children, inner_height) = match &node.kind {
        NodeKind::Block => {
            let (children, height) = layout_children(
                tree,
                node.children(),
                style.direction,
                style.gap,
                inner_x,
                inner_y,
                inner_width,
            )?;
            (Content::None, children, height)
        }
        NodeKind::Text { content, style: text } => {
            let block = wrap_block(content, *text, inner_width);
            let height = block.lines.len() as f32 * block.line_height;
            (Content::Text(block), Vec::new(), height)
        }
        NodeKind::Link { text, style: text_style, .. } => {
            let block = wrap_block(text, *text_style, inner_width);
            let height = block.lines.len() as f32 * block.line_height;
            (Content::Text(block), Vec::new(), height)
        }
        NodeKind::Button { label, style: text_style } => {
            let block = wrap_block(label, *text_style, inner_width);
            let height = block.lines.len() as f32 * block.line_height;
            (Content::Text(block), Vec::new(), height)
        }
        NodeKind::Image { src, alt } => {
            let height = inner_width * DEFAULT_IMAGE_ASPECT;
            (
                Content::Image {
                    src: src.clone(),
                    alt: alt.clone(),
                },
                Vec::new(),
                height,
            )
        }
    };

    let height = match style.height {
        Some(fixed) => fixed as f32,
        None => inner_height + 2.0 * inset,
    };
    let content_height = (height - 2.0 * inset).max(0.0);

    Ok(LayoutBox {
        node: id,
        rect: Rect {
            x,
            y,
            width,
            height,
        },
        background: style.background,
        border: style.border,
        border_left: style.border_left,
        content_rect: Rect {
            x: inner_x,
            y: inner_y,
            width: inner_width,
            height: content_height,
        },
        content,
        children,
    })
}

fn layout_children(
    tree: &ViewTree,
    children: &[NodeId],
    direction: Direction,
    gap: u32,
    x: f32,
    y: f32,
    width: f32,
) -> Result<(Vec<LayoutBox>, f32)> {
    if children.is_empty() {
        return Ok((Vec::new(), 0.0));
    }
    let gap = gap as f32;
    let total_gap = gap * (children.len() - 1) as f32;

    match direction {
        Direction::Column => {
            let mut boxes = Vec::with_capacity(children.len());
            let mut cursor = y;
            for child in children {
                let laid = layout_node(tree, *child, x, cursor, width)?;
                cursor += laid.rect.height + gap;
                boxes.push(laid);
            }
            Ok((boxes, cursor - y - gap))
        }
        Direction::Row => {
            let mut fixed = 0.0;
            let mut flexible = 0usize;
            for child in children {
                match tree.node(*child)?.style.width {
                    Some(w) => fixed += w as f32,
                    None => flexible += 1,
                }
            }
            let share = if flexible == 0 {
                0.0
            } else {
                ((width - fixed - total_gap) / flexible as f32).max(0.0)
            };

            let mut boxes = Vec::with_capacity(children.len());
            let mut cursor = x;
            let mut tallest: f32 = 0.0;
            for child in children {
                let laid = layout_node(tree, *child, cursor, y, share)?;
                cursor += laid.rect.width + gap;
                tallest = tallest.max(laid.rect.height);
                boxes.push(laid);
            }
            Ok((boxes, tallest))
        }
    }
}

fn wrap_block(text: &str, style: TextStyle, width: f32) -> TextBlock {
    let glyph = (style.size_px * AVG_GLYPH_WIDTH).max(1.0);
    let max_chars = ((width / glyph).floor() as usize).max(1);
    let content = if style.uppercase {
        text.to_uppercase()
    } else {
        text.to_owned()
    };
    TextBlock {
        lines: wrap_text(&content, max_chars),
        style,
        line_height: style.size_px * LINE_HEIGHT,
    }
}

/// Wrap a multi-line string so that no line exceeds `max_chars` characters.
///
/// Splits on existing newlines first, then word-wraps each paragraph. Words
/// longer than `max_chars` are force-broken on character boundaries.
pub fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut result = Vec::new();

    for paragraph in text.split('\n') {
        let words: Vec<&str> = paragraph.split_whitespace().collect();
        if words.is_empty() {
            result.push(String::new());
            continue;
        }

        let mut line = String::new();
        let mut line_len = 0usize;
        for word in words {
            let chars: Vec<char> = word.chars().collect();
            if chars.len() > max_chars {
                if !line.is_empty() {
                    result.push(std::mem::take(&mut line));
                }
                let mut chunks = chars.chunks(max_chars).peekable();
                while let Some(chunk) = chunks.next() {
                    if chunks.peek().is_some() {
                        result.push(chunk.iter().collect());
                    } else {
                        line = chunk.iter().collect();
                        line_len = chunk.len();
                    }
                }
            } else if line.is_empty() {
                line.push_str(word);
                line_len = chars.len();
            } else if line_len + 1 + chars.len() <= max_chars {
                line.push(' ');
                line.push_str(word);
                line_len += 1 + chars.len();
            } else {
                result.push(std::mem::replace(&mut line, word.to_owned()));
                line_len = chars.len();
            }
        }
        if !line.is_empty() {
            result.push(line);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{Node, Style};

    #[test]
    fn wrap_respects_width_and_force_breaks() {
        assert_eq!(wrap_text("one two three", 7), vec!["one two", "three"]);
        assert_eq!(wrap_text("abcdefghij", 4), vec!["abcd", "efgh", "ij"]);
        assert_eq!(wrap_text("a\n\nb", 10), vec!["a", "", "b"]);
    }

    #[test]
    fn wrap_counts_characters_not_bytes() {
        let lines = wrap_text("ठठठठ ठठ", 4);
        assert_eq!(lines, vec!["ठठठठ", "ठठ"]);
    }

    #[test]
    fn column_stacks_with_gap_and_padding() {
        let mut tree = ViewTree::new(400);
        let root = tree.root();
        let column = tree
            .append_child(
                root,
                Node::block().with_style(Style {
                    padding: 10,
                    gap: 5,
                    ..Default::default()
                }),
            )
            .unwrap();
        for _ in 0..2 {
            tree.append_child(
                column,
                Node::block().with_style(Style {
                    height: Some(20),
                    ..Default::default()
                }),
            )
            .unwrap();
        }

        let laid = layout_subtree(&tree, column, 400.0).unwrap();
        assert_eq!(laid.rect.height, 10.0 + 20.0 + 5.0 + 20.0 + 10.0);
        assert_eq!(laid.children[1].rect.y, 10.0 + 20.0 + 5.0);
        assert_eq!(laid.children[0].rect.width, 380.0);
    }

    #[test]
    fn row_shares_remaining_width() {
        let mut tree = ViewTree::new(500);
        let root = tree.root();
        let row = tree
            .append_child(
                root,
                Node::block().with_style(Style {
                    direction: Direction::Row,
                    gap: 10,
                    ..Default::default()
                }),
            )
            .unwrap();
        tree.append_child(
            row,
            Node::block().with_style(Style {
                width: Some(80),
                height: Some(40),
                ..Default::default()
            }),
        )
        .unwrap();
        tree.append_child(
            row,
            Node::block().with_style(Style {
                height: Some(60),
                ..Default::default()
            }),
        )
        .unwrap();

        let laid = layout_subtree(&tree, row, 500.0).unwrap();
        assert_eq!(laid.children[1].rect.width, 500.0 - 80.0 - 10.0);
        assert_eq!(laid.children[1].rect.x, 90.0);
        assert_eq!(laid.rect.height, 60.0);
    }

    #[test]
    fn text_height_follows_wrapped_lines() {
        let mut tree = ViewTree::new(100);
        let root = tree.root();
        let style = TextStyle::new(10.0, Color::BLACK);
        // 100px / 5px per glyph = 20 characters per line.
        let text = tree
            .append_child(root, Node::text("aaaaaaaaaa bbbbbbbbbb cccc", style))
            .unwrap();
        let laid = layout_subtree(&tree, text, 100.0).unwrap();
        match &laid.content {
            Content::Text(block) => assert_eq!(block.lines.len(), 2),
            other => panic!("unexpected content {other:?}"),
        }
        assert!((laid.rect.height - 28.0).abs() < 1e-3);
    }

    #[test]
    fn border_and_accent_shrink_content() {
        let mut tree = ViewTree::new(200);
        let root = tree.root();
        let section = tree
            .append_child(
                root,
                Node::block().with_style(Style {
                    padding: 4,
                    border: Some(Border::new(1, Color::BLACK)),
                    border_left: Some(Border::new(2, Color::BLACK)),
                    height: Some(50),
                    ..Default::default()
                }),
            )
            .unwrap();
        let laid = layout_subtree(&tree, section, 200.0).unwrap();
        assert_eq!(laid.content_rect.x, 7.0);
        assert_eq!(laid.content_rect.width, 200.0 - 7.0 - 5.0);
        assert_eq!(laid.content_rect.height, 40.0);
    }
}
