// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Profile view controller — owns the live tree and the interactive state
// (gallery selection, modal, mobile menu) and rebuilds the page on change.

use std::sync::{Arc, Mutex};

use biodata_core::Biodata;
use biodata_core::error::{BiodataError, Result};
use tracing::{debug, instrument};

use crate::profile::build_page;
use crate::tree::{SharedTree, lock_tree};

/// Interactive state of the profile page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageState {
    pub selected_image: usize,
    pub modal_image: Option<usize>,
    pub menu_open: bool,
}

#[derive(Debug)]
pub struct ProfileView {
    profile: Biodata,
    state: PageState,
    viewport_width: u32,
    tree: SharedTree,
}

impl ProfileView {
    /// Validate the profile and build the initial page.
    pub fn new(profile: Biodata, viewport_width: u32) -> Result<Self> {
        profile.validate()?;
        let state = PageState::default();
        let tree = build_page(&profile, &state, viewport_width)?;
        Ok(Self {
            profile,
            state,
            viewport_width,
            tree: Arc::new(Mutex::new(tree)),
        })
    }

    /// Handle to the live tree, shared with exporters.
    pub fn tree(&self) -> SharedTree {
        Arc::clone(&self.tree)
    }

    pub fn state(&self) -> &PageState {
        &self.state
    }

    pub fn profile(&self) -> &Biodata {
        &self.profile
    }

    pub fn select_image(&mut self, index: usize) -> Result<()> {
        self.check_gallery_index(index)?;
        self.state.selected_image = index;
        self.render()
    }

    pub fn open_modal(&mut self, index: usize) -> Result<()> {
        self.check_gallery_index(index)?;
        self.state.modal_image = Some(index);
        self.render()
    }

    pub fn close_modal(&mut self) -> Result<()> {
        self.state.modal_image = None;
        self.render()
    }

    pub fn toggle_menu(&mut self) -> Result<()> {
        self.state.menu_open = !self.state.menu_open;
        self.render()
    }

    pub fn set_viewport_width(&mut self, width: u32) -> Result<()> {
        self.viewport_width = width;
        self.render()
    }

    /// Rebuild the live tree from the current state.
    ///
    /// Refused while an export holds an off-screen container, since node ids
    /// of the rebuilt tree would alias the container's.
    #[instrument(skip(self), fields(state = ?self.state))]
    pub fn render(&mut self) -> Result<()> {
        let page = build_page(&self.profile, &self.state, self.viewport_width)?;
        let mut live = lock_tree(&self.tree);
        if live.offscreen_count() > 0 {
            return Err(BiodataError::InvalidTree(
                "cannot rebuild the page while an export is in progress".into(),
            ));
        }
        *live = page;
        debug!(nodes = live.node_count(), "page rendered");
        Ok(())
    }

    fn check_gallery_index(&self, index: usize) -> Result<()> {
        if index < self.profile.gallery.len() {
            Ok(())
        } else {
            Err(BiodataError::InvalidProfile(format!(
                "gallery has {} images, no image {index}",
                self.profile.gallery.len()
            )))
        }
    }
}
