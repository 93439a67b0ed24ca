// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Detached container — an off-screen copy of a region, attached to the live
// tree only for as long as the guard lives.

use std::sync::Arc;

use biodata_core::Color;
use biodata_core::error::{BiodataError, Result};
use tracing::{debug, instrument, warn};

use crate::layout::{LayoutBox, layout_subtree};
use crate::tree::{NodeId, SharedTree, ViewTree, lock_tree};

/// Scoped ownership of an off-screen container.
///
/// Dropping the guard removes the container and every node under it from the
/// tree, whichever way the owning scope is left.
#[derive(Debug)]
pub struct ContainerGuard {
    tree: SharedTree,
    container: NodeId,
}

impl ContainerGuard {
    /// Resolve `selector`, then copy the region it names into a new
    /// container pinned to the region's rendered width.
    ///
    /// Resolution and staging happen under one lock, so the region cannot be
    /// swapped out between the two. Nothing is created when resolution fails.
    #[instrument(skip(tree))]
    pub fn attach_region(tree: &SharedTree, selector: &str, background: Color) -> Result<(Self, LayoutBox)> {
        let mut live = lock_tree(tree);
        let (region, width) = resolve_region(&live, selector)?;
        Self::attach_locked(tree, &mut live, region, width, background)
    }

    /// Copy `region` into a new container of the given width and background,
    /// attach the container off-screen, and lay it out.
    ///
    /// The tree lock is released before returning, so the caller may await
    /// while the container stays attached.
    #[instrument(skip(tree), fields(region = region.index()))]
    pub fn attach_copy(
        tree: &SharedTree,
        region: NodeId,
        width: u32,
        background: Color,
    ) -> Result<(Self, LayoutBox)> {
        let mut live = lock_tree(tree);
        Self::attach_locked(tree, &mut live, region, width, background)
    }

    fn attach_locked(
        tree: &SharedTree,
        live: &mut ViewTree,
        region: NodeId,
        width: u32,
        background: Color,
    ) -> Result<(Self, LayoutBox)> {
        let container = live.create_container(width, background);
        match stage(live, container, region, width) {
            Ok(layout) => {
                debug!(
                    container = container.index(),
                    width,
                    height = layout.rect.height,
                    "detached copy attached"
                );
                Ok((
                    Self {
                        tree: Arc::clone(tree),
                        container,
                    },
                    layout,
                ))
            }
            Err(err) => {
                if let Err(cleanup) = live.remove_subtree(container) {
                    warn!(error = %cleanup, "failed to discard partial container");
                }
                Err(err)
            }
        }
    }

    pub fn container(&self) -> NodeId {
        self.container
    }
}

/// Find the first region matching `selector` and its rendered width.
///
/// Only the visible page is searched; another export's off-screen copy never
/// counts. Malformed selectors, misses, and regions that are not rendered
/// (detached, or zero width) are all reported as `RegionNotFound`.
pub fn resolve_region(tree: &ViewTree, selector: &str) -> Result<(NodeId, u32)> {
    let region = tree
        .query_selector(selector)
        .map_err(|err| BiodataError::RegionNotFound(format!("{selector}: {err}")))?
        .filter(|id| tree.is_on_page(*id))
        .ok_or_else(|| BiodataError::RegionNotFound(selector.to_owned()))?;
    match tree.rendered_width(region) {
        Some(width) if width > 0 => Ok((region, width)),
        _ => Err(BiodataError::RegionNotFound(format!("{selector} is not rendered"))),
    }
}

fn stage(tree: &mut ViewTree, container: NodeId, region: NodeId, width: u32) -> Result<LayoutBox> {
    let copy = tree.deep_clone(region)?;
    tree.adopt(container, copy)?;
    tree.attach_offscreen(container)?;
    layout_subtree(tree, container, width as f32)
}

impl Drop for ContainerGuard {
    fn drop(&mut self) {
        let mut live = lock_tree(&self.tree);
        match live.remove_subtree(self.container) {
            Ok(freed) => debug!(container = self.container.index(), freed, "container removed"),
            Err(err) => warn!(error = %err, "container already gone"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::tree::{Node, Style};

    fn shared_tree() -> (SharedTree, NodeId) {
        let mut tree = ViewTree::new(800);
        let root = tree.root();
        let region = tree
            .append_child(
                root,
                Node::block().with_classes("card").with_style(Style {
                    height: Some(120),
                    ..Default::default()
                }),
            )
            .unwrap();
        (Arc::new(Mutex::new(tree)), region)
    }

    #[test]
    fn container_lives_only_as_long_as_guard() {
        let (tree, region) = shared_tree();
        let before = lock_tree(&tree).node_count();

        let (guard, layout) = ContainerGuard::attach_copy(&tree, region, 800, Color::WHITE).unwrap();
        assert_eq!(layout.rect.width, 800.0);
        assert_eq!(layout.rect.height, 120.0);
        assert_eq!(layout.background, Some(Color::WHITE));
        {
            let live = lock_tree(&tree);
            assert_eq!(live.offscreen_count(), 1);
            assert!(live.is_attached(guard.container()));
        }

        drop(guard);
        let live = lock_tree(&tree);
        assert_eq!(live.offscreen_count(), 0);
        assert_eq!(live.node_count(), before);
    }

    #[test]
    fn failed_staging_leaves_no_nodes() {
        let (tree, region) = shared_tree();
        let before = lock_tree(&tree).node_count();
        lock_tree(&tree).remove_subtree(region).unwrap();

        let result = ContainerGuard::attach_copy(&tree, region, 800, Color::WHITE);
        assert!(result.is_err());
        let live = lock_tree(&tree);
        assert_eq!(live.offscreen_count(), 0);
        assert_eq!(live.node_count(), before - 1);
    }

    #[test]
    fn guard_cleans_up_during_unwind() {
        let (tree, region) = shared_tree();
        let before = lock_tree(&tree).node_count();
        let cloned = Arc::clone(&tree);
        let outcome = std::panic::catch_unwind(move || {
            let (_guard, _) = ContainerGuard::attach_copy(&cloned, region, 800, Color::WHITE).unwrap();
            panic!("capture blew up");
        });
        assert!(outcome.is_err());
        assert_eq!(lock_tree(&tree).node_count(), before);
    }

    #[test]
    fn attach_region_resolves_and_pins_width() {
        let (tree, region) = shared_tree();
        let (guard, layout) = ContainerGuard::attach_region(&tree, ".card", Color::WHITE).unwrap();
        assert_eq!(layout.rect.width, 800.0);
        let live = lock_tree(&tree);
        let copy = live.node(guard.container()).unwrap().children()[0];
        assert_ne!(copy, region);
        assert!(live.node(copy).unwrap().has_class("card"));
    }

    #[test]
    fn offscreen_copies_are_not_exportable() {
        let (tree, _) = shared_tree();
        let (guard, _) = ContainerGuard::attach_region(&tree, ".card", Color::WHITE).unwrap();
        let before = lock_tree(&tree).node_count();

        let err = ContainerGuard::attach_region(&tree, ".export-container", Color::WHITE).unwrap_err();
        assert!(matches!(err, BiodataError::RegionNotFound(_)));
        let live = lock_tree(&tree);
        assert_eq!(live.node_count(), before);
        assert_eq!(live.offscreen_count(), 1);
        assert!(!live.is_on_page(guard.container()));
    }

    #[test]
    fn unresolvable_selector_creates_nothing() {
        let (tree, _) = shared_tree();
        let before = lock_tree(&tree).node_count();
        for selector in [".missing", "not a selector", ""] {
            let err = ContainerGuard::attach_region(&tree, selector, Color::WHITE).unwrap_err();
            assert!(matches!(err, BiodataError::RegionNotFound(_)), "{selector}: {err}");
        }
        let live = lock_tree(&tree);
        assert_eq!(live.node_count(), before);
        assert_eq!(live.offscreen_count(), 0);
    }
}
