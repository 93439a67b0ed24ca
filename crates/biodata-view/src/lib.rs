// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// biodata-view — The profile page as a view tree.
//
// Provides the node arena and selector queries, a box layout pass, the
// off-screen container guard used during export, and a software rasterizer
// that paints a laid-out subtree into an RGBA snapshot.

pub mod container;
pub mod controller;
pub mod layout;
pub mod profile;
pub mod raster;
pub mod tree;

// Re-export the primary types so callers can use `biodata_view::ViewTree` etc.
pub use container::ContainerGuard;
pub use controller::{PageState, ProfileView};
pub use layout::{LayoutBox, layout_subtree};
pub use raster::{CaptureOptions, Rasterizer, RenderSnapshot, SoftwareRasterizer};
pub use tree::{NodeId, SharedTree, ViewTree, lock_tree};
