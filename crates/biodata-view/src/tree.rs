// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Live view tree — an arena of styled nodes rooted at the viewport, plus the
// off-screen containers that exports attach while they capture.

use std::sync::{Arc, Mutex, MutexGuard};

use biodata_core::Color;
use biodata_core::error::{BiodataError, Result};
use tracing::{debug, warn};

use crate::layout::layout_subtree;

/// Live tree shared between the view and in-flight exports.
pub type SharedTree = Arc<Mutex<ViewTree>>;

/// Lock a shared tree. A poisoned lock still yields the tree: every mutation
/// leaves the arena consistent before it can panic.
pub fn lock_tree(tree: &SharedTree) -> MutexGuard<'_, ViewTree> {
    match tree.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            warn!("view tree lock poisoned; continuing with inner value");
            poisoned.into_inner()
        }
    }
}

/// Slot in the arena plus the generation it was issued for. Slots are
/// reused after removal; an id from an older generation no longer resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    index: usize,
    generation: u32,
}

impl NodeId {
    pub fn index(self) -> usize {
        self.index
    }
}

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    node: Option<Node>,
}

/// Main axis of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Column,
    Row,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Border {
    pub width: u32,
    pub color: Color,
}

impl Border {
    pub const fn new(width: u32, color: Color) -> Self {
        Self { width, color }
    }
}

/// Box style shared by every node kind. Sizes are CSS pixels.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Style {
    pub direction: Direction,
    pub padding: u32,
    pub gap: u32,
    pub background: Option<Color>,
    pub border: Option<Border>,
    /// Accent bar drawn inside the left edge.
    pub border_left: Option<Border>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub max_width: Option<u32>,
}

/// Typography for text-bearing nodes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub size_px: f32,
    pub color: Color,
    pub bold: bool,
    pub uppercase: bool,
}

impl TextStyle {
    pub const fn new(size_px: f32, color: Color) -> Self {
        Self {
            size_px,
            color,
            bold: false,
            uppercase: false,
        }
    }

    pub const fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub const fn uppercase(mut self) -> Self {
        self.uppercase = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Block,
    Text { content: String, style: TextStyle },
    /// Image drawn contain-fit into its box.
    Image { src: String, alt: String },
    Link { text: String, href: String, style: TextStyle },
    Button { label: String, style: TextStyle },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub classes: Vec<String>,
    pub id_attr: Option<String>,
    pub style: Style,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            classes: Vec::new(),
            id_attr: None,
            style: Style::default(),
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn block() -> Self {
        Self::new(NodeKind::Block)
    }

    pub fn text(content: impl Into<String>, style: TextStyle) -> Self {
        Self::new(NodeKind::Text {
            content: content.into(),
            style,
        })
    }

    pub fn image(src: impl Into<String>, alt: impl Into<String>) -> Self {
        Self::new(NodeKind::Image {
            src: src.into(),
            alt: alt.into(),
        })
    }

    /// Add whitespace-separated classes.
    pub fn with_classes(mut self, classes: &str) -> Self {
        self.classes
            .extend(classes.split_whitespace().map(str::to_owned));
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id_attr = Some(id.into());
        self
    }

    pub fn with_style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// Compound selector: optional `#id` plus any number of `.class` parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    id: Option<String>,
    classes: Vec<String>,
}

impl Selector {
    pub fn parse(selector: &str) -> Result<Self> {
        let trimmed = selector.trim();
        if trimmed.is_empty() || trimmed.contains(char::is_whitespace) {
            return Err(BiodataError::InvalidSelector(selector.to_owned()));
        }

        let mut id = None;
        let mut classes = Vec::new();
        let mut rest = trimmed;
        while let Some(sigil) = rest.chars().next() {
            if sigil != '.' && sigil != '#' {
                return Err(BiodataError::InvalidSelector(selector.to_owned()));
            }
            let body = &rest[1..];
            let end = body.find(['.', '#']).unwrap_or(body.len());
            let (name, tail) = body.split_at(end);
            if name.is_empty() {
                return Err(BiodataError::InvalidSelector(selector.to_owned()));
            }
            match sigil {
                '.' => classes.push(name.to_owned()),
                '#' if id.is_none() => id = Some(name.to_owned()),
                _ => return Err(BiodataError::InvalidSelector(selector.to_owned())),
            }
            rest = tail;
        }

        Ok(Self { id, classes })
    }

    pub fn matches(&self, node: &Node) -> bool {
        if let Some(id) = &self.id {
            if node.id_attr.as_deref() != Some(id.as_str()) {
                return false;
            }
        }
        self.classes.iter().all(|class| node.has_class(class))
    }
}

/// The live document: one root sized to the viewport, plus off-screen
/// containers that take no part in the page layout.
#[derive(Debug, Clone)]
pub struct ViewTree {
    nodes: Vec<Slot>,
    free: Vec<usize>,
    root: NodeId,
    viewport_width: u32,
    offscreen: Vec<NodeId>,
}

impl ViewTree {
    pub fn new(viewport_width: u32) -> Self {
        let root = Node::block()
            .with_classes("viewport")
            .with_style(Style {
                width: Some(viewport_width),
                ..Default::default()
            });
        Self {
            nodes: vec![Slot {
                generation: 0,
                node: Some(root),
            }],
            free: Vec::new(),
            root: NodeId {
                index: 0,
                generation: 0,
            },
            viewport_width,
            offscreen: Vec::new(),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> Result<&Node> {
        self.nodes
            .get(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_ref())
            .ok_or(BiodataError::UnknownNode(id.index))
    }

    pub fn node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.nodes
            .get_mut(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_mut())
            .ok_or(BiodataError::UnknownNode(id.index))
    }

    /// Number of live nodes in the arena, attached or not.
    pub fn node_count(&self) -> usize {
        self.nodes.iter().filter(|slot| slot.node.is_some()).count()
    }

    pub fn offscreen_count(&self) -> usize {
        self.offscreen.len()
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.nodes[index];
            slot.node = Some(node);
            return NodeId {
                index,
                generation: slot.generation,
            };
        }
        self.nodes.push(Slot {
            generation: 0,
            node: Some(node),
        });
        NodeId {
            index: self.nodes.len() - 1,
            generation: 0,
        }
    }

    /// Insert `node` as the last child of `parent`.
    pub fn append_child(&mut self, parent: NodeId, mut node: Node) -> Result<NodeId> {
        self.node(parent)?;
        node.parent = Some(parent);
        node.children.clear();
        let id = self.alloc(node);
        self.node_mut(parent)?.children.push(id);
        Ok(id)
    }

    /// Move an unparented node under `parent`.
    pub fn adopt(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.node(parent)?;
        let node = self.node_mut(child)?;
        if node.parent.is_some() {
            return Err(BiodataError::InvalidTree(format!(
                "node {} already has a parent",
                child.index
            )));
        }
        node.parent = Some(parent);
        self.node_mut(parent)?.children.push(child);
        Ok(())
    }

    /// Ids of `id` and all its descendants, in document order.
    pub fn subtree(&self, id: NodeId) -> Result<Vec<NodeId>> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            let node = self.node(next)?;
            out.push(next);
            stack.extend(node.children.iter().rev().copied());
        }
        Ok(out)
    }

    /// Whether `id` hangs off the root or an attached off-screen container.
    pub fn is_attached(&self, id: NodeId) -> bool {
        let top = self.top_ancestor(id);
        top == Some(self.root) || top.is_some_and(|t| self.offscreen.contains(&t))
    }

    /// Whether `id` is part of the visible page, not an off-screen copy.
    pub fn is_on_page(&self, id: NodeId) -> bool {
        self.top_ancestor(id) == Some(self.root)
    }

    fn top_ancestor(&self, id: NodeId) -> Option<NodeId> {
        let mut current = id;
        loop {
            match self.node(current).ok()?.parent {
                Some(parent) => current = parent,
                None => return Some(current),
            }
        }
    }

    /// First attached node matching `selector`, in document order: the page
    /// first, then off-screen containers in attachment order.
    pub fn query_selector(&self, selector: &str) -> Result<Option<NodeId>> {
        let selector = Selector::parse(selector)?;
        let tops = std::iter::once(self.root).chain(self.offscreen.iter().copied());
        for top in tops {
            for id in self.subtree(top)? {
                if selector.matches(self.node(id)?) {
                    return Ok(Some(id));
                }
            }
        }
        Ok(None)
    }

    /// Copy the subtree at `id` into fresh, unparented nodes.
    pub fn deep_clone(&mut self, id: NodeId) -> Result<NodeId> {
        // Validates the whole subtree before allocating anything.
        self.subtree(id)?;
        self.clone_recursive(id, None)
    }

    fn clone_recursive(&mut self, id: NodeId, parent: Option<NodeId>) -> Result<NodeId> {
        let source = self.node(id)?;
        let children = source.children.clone();
        let mut copy = source.clone();
        copy.parent = parent;
        copy.children.clear();
        let copy_id = self.alloc(copy);
        for child in children {
            let child_copy = self.clone_recursive(child, Some(copy_id))?;
            self.node_mut(copy_id)?.children.push(child_copy);
        }
        Ok(copy_id)
    }

    /// Create an unattached holding block with a pinned width and an opaque
    /// background.
    pub fn create_container(&mut self, width: u32, background: Color) -> NodeId {
        let node = Node::block()
            .with_classes("export-container")
            .with_style(Style {
                width: Some(width),
                background: Some(background),
                ..Default::default()
            });
        self.alloc(node)
    }

    /// Attach an unparented node outside the page flow.
    pub fn attach_offscreen(&mut self, container: NodeId) -> Result<()> {
        if self.node(container)?.parent.is_some() || container == self.root {
            return Err(BiodataError::InvalidTree(format!(
                "node {} is already part of the page",
                container.index
            )));
        }
        if !self.offscreen.contains(&container) {
            self.offscreen.push(container);
        }
        debug!(container = container.index, "container attached off-screen");
        Ok(())
    }

    /// Detach `id` from wherever it hangs and free it with all descendants.
    /// Returns the number of nodes freed.
    pub fn remove_subtree(&mut self, id: NodeId) -> Result<usize> {
        if id == self.root {
            return Err(BiodataError::InvalidTree("cannot remove the root".into()));
        }
        let ids = self.subtree(id)?;
        if let Some(parent) = self.node(id)?.parent {
            self.node_mut(parent)?.children.retain(|c| *c != id);
        }
        self.offscreen.retain(|c| *c != id);
        for freed in &ids {
            let slot = &mut self.nodes[freed.index];
            slot.node = None;
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(freed.index);
        }
        debug!(node = id.index, freed = ids.len(), "subtree removed");
        Ok(ids.len())
    }

    /// Laid-out width of an attached node, in CSS pixels.
    pub fn rendered_width(&self, id: NodeId) -> Option<u32> {
        let top = self.top_ancestor(id)?;
        if !self.is_attached(id) {
            return None;
        }
        let available = self
            .node(top)
            .ok()?
            .style
            .width
            .unwrap_or(self.viewport_width);
        let layout = layout_subtree(self, top, available as f32).ok()?;
        layout
            .find(id)
            .map(|found| found.rect.width.round() as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tree() -> (ViewTree, NodeId, NodeId) {
        let mut tree = ViewTree::new(1280);
        let root = tree.root();
        let card = tree
            .append_child(
                root,
                Node::block()
                    .with_classes("w-full max-w-5xl")
                    .with_style(Style {
                        max_width: Some(1024),
                        ..Default::default()
                    }),
            )
            .unwrap();
        let title = tree
            .append_child(card, Node::text("Name", TextStyle::new(16.0, Color::BLACK)))
            .unwrap();
        (tree, card, title)
    }

    #[test]
    fn selector_parses_compound_classes() {
        let sel = Selector::parse(".w-full.max-w-5xl").unwrap();
        let node = Node::block().with_classes("w-full max-w-5xl bg-white");
        assert!(sel.matches(&node));
        assert!(!sel.matches(&Node::block().with_classes("w-full")));
    }

    #[test]
    fn selector_rejects_descendant_combinator() {
        assert!(Selector::parse(".card .title").is_err());
        assert!(Selector::parse("").is_err());
        assert!(Selector::parse("..x").is_err());
        assert!(Selector::parse("div").is_err());
    }

    #[test]
    fn query_finds_region() {
        let (tree, card, _) = sample_tree();
        assert_eq!(tree.query_selector(".w-full.max-w-5xl").unwrap(), Some(card));
        assert_eq!(tree.query_selector(".missing").unwrap(), None);
    }

    #[test]
    fn deep_clone_is_isolated() {
        let (mut tree, card, title) = sample_tree();
        let before = tree.node_count();
        let copy = tree.deep_clone(card).unwrap();
        assert_eq!(tree.node_count(), before + 2);
        assert!(tree.node(copy).unwrap().parent().is_none());
        assert!(!tree.is_attached(copy));

        // Mutating the copy leaves the original untouched.
        let copy_title = tree.node(copy).unwrap().children()[0];
        if let NodeKind::Text { content, .. } = &mut tree.node_mut(copy_title).unwrap().kind {
            content.push_str(" (copy)");
        }
        match &tree.node(title).unwrap().kind {
            NodeKind::Text { content, .. } => assert_eq!(content, "Name"),
            other => panic!("unexpected kind {other:?}"),
        }
    }

    #[test]
    fn container_lifecycle_restores_node_count() {
        let (mut tree, card, _) = sample_tree();
        let before = tree.node_count();
        let width = tree.rendered_width(card).unwrap();
        assert_eq!(width, 1024);

        let container = tree.create_container(width, Color::WHITE);
        let copy = tree.deep_clone(card).unwrap();
        tree.adopt(container, copy).unwrap();
        tree.attach_offscreen(container).unwrap();
        assert_eq!(tree.offscreen_count(), 1);
        assert!(tree.is_attached(copy));
        assert_eq!(tree.rendered_width(copy), Some(1024));

        assert_eq!(tree.remove_subtree(container).unwrap(), 3);
        assert_eq!(tree.offscreen_count(), 0);
        assert_eq!(tree.node_count(), before);
    }

    #[test]
    fn repeated_exports_reuse_freed_slots() {
        let (mut tree, card, _) = sample_tree();
        let mut slots = None;
        let mut stale = Vec::new();
        for _ in 0..5 {
            let container = tree.create_container(1024, Color::WHITE);
            let copy = tree.deep_clone(card).unwrap();
            tree.adopt(container, copy).unwrap();
            tree.attach_offscreen(container).unwrap();
            tree.remove_subtree(container).unwrap();
            stale.push(container);
            assert_eq!(*slots.get_or_insert(tree.nodes.len()), tree.nodes.len());
        }
        for id in stale {
            assert!(matches!(tree.node(id), Err(BiodataError::UnknownNode(_))));
        }
        assert_eq!(tree.node_count(), 3);
    }

    #[test]
    fn live_region_wins_over_offscreen_copy() {
        let (mut tree, card, _) = sample_tree();
        let container = tree.create_container(1024, Color::WHITE);
        let copy = tree.deep_clone(card).unwrap();
        tree.adopt(container, copy).unwrap();
        tree.attach_offscreen(container).unwrap();
        assert_eq!(tree.query_selector(".max-w-5xl").unwrap(), Some(card));
    }

    #[test]
    fn narrow_viewport_shrinks_region() {
        let mut tree = ViewTree::new(600);
        let root = tree.root();
        let card = tree
            .append_child(
                root,
                Node::block().with_style(Style {
                    max_width: Some(1024),
                    ..Default::default()
                }),
            )
            .unwrap();
        assert_eq!(tree.rendered_width(card), Some(600));
    }

    #[test]
    fn removing_root_is_refused() {
        let (mut tree, _, _) = sample_tree();
        let root = tree.root();
        assert!(tree.remove_subtree(root).is_err());
    }
}
