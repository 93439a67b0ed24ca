// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Profile page builder — lays the biodata out as a card: hero with personal
// details and photo, education and profession, family, property, gallery,
// the "more photos" link, and a footer holding the Download control.

use biodata_core::config::DEFAULT_REGION_SELECTOR;
use biodata_core::error::Result;
use biodata_core::{Biodata, Color};
use tracing::debug;

use crate::controller::PageState;
use crate::tree::{Border, Direction, Node, NodeId, NodeKind, Style, TextStyle, ViewTree};

/// Viewport width at which rows stop collapsing into columns.
pub const BREAKPOINT_SM: u32 = 640;

/// Id of the Download control.
pub const DOWNLOAD_BUTTON_ID: &str = "download";

pub mod palette {
    use biodata_core::Color;

    pub const GRAY_50: Color = Color::rgb(0xf9, 0xfa, 0xfb);
    pub const GRAY_100: Color = Color::rgb(0xf3, 0xf4, 0xf6);
    pub const GRAY_200: Color = Color::rgb(0xe5, 0xe7, 0xeb);
    pub const GRAY_400: Color = Color::rgb(0x9c, 0xa3, 0xaf);
    pub const GRAY_600: Color = Color::rgb(0x4b, 0x55, 0x63);
    pub const GRAY_700: Color = Color::rgb(0x37, 0x41, 0x51);
    pub const GRAY_900: Color = Color::rgb(0x11, 0x18, 0x27);
    pub const AMBER_700: Color = Color::rgb(0xb4, 0x53, 0x09);
    pub const OVERLAY: Color = Color::rgb(0x1f, 0x1f, 0x1f);
}

use palette::*;

/// Sizes that change at the `sm` breakpoint.
struct Metrics {
    wide: bool,
    page_padding: u32,
    section_padding: u32,
    name_size: f32,
    preview_height: u32,
}

impl Metrics {
    fn for_viewport(width: u32) -> Self {
        let wide = width >= BREAKPOINT_SM;
        Self {
            wide,
            page_padding: if wide { 32 } else { 16 },
            section_padding: if wide { 40 } else { 24 },
            name_size: if wide { 48.0 } else { 36.0 },
            preview_height: if wide { 600 } else { 384 },
        }
    }

    fn row_or_column(&self) -> Direction {
        if self.wide { Direction::Row } else { Direction::Column }
    }
}

/// Build the whole page for `profile` in the given view state.
pub fn build_page(profile: &Biodata, state: &PageState, viewport_width: u32) -> Result<ViewTree> {
    let m = Metrics::for_viewport(viewport_width);
    let mut tree = ViewTree::new(viewport_width);
    let root = tree.root();

    let page = tree.append_child(
        root,
        Node::block().with_classes("min-h-screen").with_style(Style {
            padding: m.page_padding,
            gap: 16,
            background: Some(GRAY_50),
            ..Default::default()
        }),
    )?;

    if state.menu_open {
        build_menu(&mut tree, page)?;
    }

    let region = tree.append_child(
        page,
        Node::block()
            .with_classes(&DEFAULT_REGION_SELECTOR.replace('.', " "))
            .with_style(Style {
                max_width: Some(1024),
                ..Default::default()
            }),
    )?;
    let card = tree.append_child(
        region,
        Node::block().with_classes("card").with_style(Style {
            background: Some(Color::WHITE),
            border: Some(Border::new(1, GRAY_200)),
            ..Default::default()
        }),
    )?;

    build_hero(&mut tree, card, profile, &m)?;
    divider(&mut tree, card)?;
    build_body(&mut tree, card, profile, &m)?;
    divider(&mut tree, card)?;
    build_gallery(&mut tree, card, profile, state, &m)?;
    if let Some(url) = &profile.more_photos_url {
        divider(&mut tree, card)?;
        build_more_photos(&mut tree, card, url, &m)?;
    }
    divider(&mut tree, card)?;
    build_footer(&mut tree, card, &m)?;

    if let Some(index) = state.modal_image {
        if let Some(image) = profile.gallery.get(index) {
            build_modal(&mut tree, root, &image.src, &image.alt, viewport_width)?;
        }
    }

    debug!(nodes = tree.node_count(), wide = m.wide, "profile page built");
    Ok(tree)
}

fn divider(tree: &mut ViewTree, parent: NodeId) -> Result<NodeId> {
    tree.append_child(
        parent,
        Node::block().with_classes("divider").with_style(Style {
            height: Some(1),
            background: Some(GRAY_200),
            ..Default::default()
        }),
    )
}

fn heading(tree: &mut ViewTree, parent: NodeId, text: &str) -> Result<NodeId> {
    tree.append_child(
        parent,
        Node::text(text, TextStyle::new(20.0, GRAY_900).bold()).with_classes("section-title"),
    )
}

/// Label/value pair; label column has a fixed width on wide viewports.
fn info_row(tree: &mut ViewTree, parent: NodeId, label: &str, value: &str, m: &Metrics) -> Result<NodeId> {
    let row = tree.append_child(
        parent,
        Node::block().with_classes("info-row").with_style(Style {
            direction: m.row_or_column(),
            gap: if m.wide { 16 } else { 4 },
            ..Default::default()
        }),
    )?;
    tree.append_child(
        row,
        Node::text(label, TextStyle::new(14.0, GRAY_700).bold().uppercase()).with_style(Style {
            width: m.wide.then_some(180),
            ..Default::default()
        }),
    )?;
    tree.append_child(row, Node::text(value, TextStyle::new(16.0, GRAY_700)))?;
    Ok(row)
}

/// Section with an amber accent bar and an icon heading.
fn section(tree: &mut ViewTree, parent: NodeId, icon: &str, title: &str) -> Result<NodeId> {
    let section = tree.append_child(
        parent,
        Node::block().with_classes("section").with_style(Style {
            padding: 8,
            gap: 12,
            border_left: Some(Border::new(2, AMBER_700)),
            ..Default::default()
        }),
    )?;
    heading(tree, section, &format!("{icon} {title}"))?;
    Ok(section)
}

fn build_menu(tree: &mut ViewTree, page: NodeId) -> Result<()> {
    let menu = tree.append_child(
        page,
        Node::block().with_classes("mobile-menu").with_style(Style {
            padding: 12,
            gap: 8,
            background: Some(Color::WHITE),
            border: Some(Border::new(1, GRAY_200)),
            ..Default::default()
        }),
    )?;
    for (label, anchor) in [
        ("Personal", "#personal"),
        ("Family", "#family"),
        ("Property", "#property"),
        ("Gallery", "#gallery"),
    ] {
        tree.append_child(
            menu,
            Node::new(NodeKind::Link {
                text: label.to_owned(),
                href: anchor.to_owned(),
                style: TextStyle::new(16.0, GRAY_700),
            }),
        )?;
    }
    Ok(())
}

fn build_hero(tree: &mut ViewTree, card: NodeId, profile: &Biodata, m: &Metrics) -> Result<()> {
    let hero = tree.append_child(
        card,
        Node::block().with_classes("hero").with_id("personal").with_style(Style {
            direction: m.row_or_column(),
            padding: m.section_padding,
            gap: 24,
            ..Default::default()
        }),
    )?;

    let details = tree.append_child(
        hero,
        Node::block().with_style(Style {
            gap: 12,
            ..Default::default()
        }),
    )?;
    tree.append_child(
        details,
        Node::text(&profile.name, TextStyle::new(m.name_size, GRAY_900)).with_classes("name"),
    )?;
    if let Some(headline) = &profile.headline {
        tree.append_child(details, Node::text(headline, TextStyle::new(16.0, GRAY_600)))?;
    }
    tree.append_child(
        details,
        Node::text("👤 Personal Information", TextStyle::new(14.0, GRAY_700).bold().uppercase()),
    )?;
    for (label, value) in [
        ("Caste", profile.caste.as_str()),
        ("Height", profile.height.as_str()),
        ("Weight", profile.weight.as_str()),
        ("Date of Birth", profile.dob.as_str()),
        ("Age", profile.age.as_str()),
        ("Blood Group", profile.blood.as_str()),
        ("Current Place", profile.current_place.as_str()),
        ("Phone", profile.phone.as_str()),
        ("Email", profile.email.as_str()),
    ] {
        info_row(tree, details, label, value, m)?;
    }

    tree.append_child(
        hero,
        Node::image(&profile.profile_photo, "profile")
            .with_classes("profile-photo")
            .with_style(Style {
                width: m.wide.then_some(288),
                height: Some(if m.wide { 384 } else { 320 }),
                background: Some(Color::WHITE),
                border: Some(Border::new(1, GRAY_200)),
                ..Default::default()
            }),
    )?;
    Ok(())
}

fn build_body(tree: &mut ViewTree, card: NodeId, profile: &Biodata, m: &Metrics) -> Result<()> {
    let body = tree.append_child(
        card,
        Node::block().with_classes("body").with_style(Style {
            padding: m.section_padding,
            gap: 32,
            ..Default::default()
        }),
    )?;

    let pair = tree.append_child(
        body,
        Node::block().with_style(Style {
            direction: m.row_or_column(),
            gap: 32,
            ..Default::default()
        }),
    )?;
    let education = section(tree, pair, "🎓", "Education")?;
    info_row(tree, education, "Qualification", &profile.education, m)?;
    let professional = section(tree, pair, "💼", "Professional")?;
    info_row(tree, professional, "Occupation", profile.occupation(), m)?;

    let family = section(tree, body, "👨‍👩‍👦", "Family Background")?;
    tree.node_mut(family)?.id_attr = Some("family".into());
    let f = &profile.family;
    info_row(tree, family, "Father", &f.father, m)?;
    info_row(tree, family, "Mother", &f.mother, m)?;
    if let Some(brother) = &f.brother {
        info_row(tree, family, "Brother", brother, m)?;
    }
    info_row(tree, family, "Native Place", &f.native, m)?;
    info_row(tree, family, "Current Residence", &f.current, m)?;
    if let Some(uncle) = &f.maternal_uncle {
        info_row(tree, family, "Maternal Uncle", uncle, m)?;
    }

    if !profile.property.is_empty() {
        let property = section(tree, body, "🏠", "Assets & Property")?;
        tree.node_mut(property)?.id_attr = Some("property".into());
        let per_row = if m.wide { 2 } else { 1 };
        for chunk in profile.property.chunks(per_row) {
            let row = tree.append_child(
                property,
                Node::block().with_style(Style {
                    direction: Direction::Row,
                    gap: 12,
                    ..Default::default()
                }),
            )?;
            for item in chunk {
                tree.append_child(
                    row,
                    Node::text(format!("✓ {item}"), TextStyle::new(16.0, GRAY_700))
                        .with_classes("property-item")
                        .with_style(Style {
                            padding: 16,
                            background: Some(GRAY_50),
                            border: Some(Border::new(1, GRAY_200)),
                            ..Default::default()
                        }),
                )?;
            }
        }
    }
    Ok(())
}

fn build_gallery(
    tree: &mut ViewTree,
    card: NodeId,
    profile: &Biodata,
    state: &PageState,
    m: &Metrics,
) -> Result<()> {
    if profile.gallery.is_empty() {
        return Ok(());
    }
    let gallery = tree.append_child(
        card,
        Node::block().with_classes("gallery").with_id("gallery").with_style(Style {
            padding: m.section_padding,
            gap: 24,
            ..Default::default()
        }),
    )?;
    heading(tree, gallery, "📸 Gallery")?;

    let viewer = tree.append_child(
        gallery,
        Node::block().with_style(Style {
            direction: Direction::Row,
            gap: 16,
            ..Default::default()
        }),
    )?;
    let thumb_size = if m.wide { 80 } else { 64 };
    let menu = tree.append_child(
        viewer,
        Node::block().with_classes("gallery-menu").with_style(Style {
            width: Some(thumb_size),
            gap: 8,
            ..Default::default()
        }),
    )?;
    let selected = state.selected_image.min(profile.gallery.len() - 1);
    for (index, image) in profile.gallery.iter().enumerate() {
        let is_selected = index == selected;
        let classes = if is_selected { "gallery-thumb selected" } else { "gallery-thumb" };
        tree.append_child(
            menu,
            Node::image(&image.src, &image.alt)
                .with_classes(classes)
                .with_style(Style {
                    width: Some(thumb_size),
                    height: Some(thumb_size),
                    padding: 2,
                    background: Some(GRAY_50),
                    border: Some(Border::new(2, if is_selected { AMBER_700 } else { GRAY_200 })),
                    ..Default::default()
                }),
        )?;
    }

    let shown = &profile.gallery[selected];
    let preview = tree.append_child(
        viewer,
        Node::block().with_classes("gallery-preview").with_style(Style {
            background: Some(GRAY_50),
            border: Some(Border::new(1, GRAY_200)),
            ..Default::default()
        }),
    )?;
    tree.append_child(
        preview,
        Node::image(&shown.src, &shown.alt).with_style(Style {
            height: Some(m.preview_height),
            ..Default::default()
        }),
    )?;
    Ok(())
}

fn build_more_photos(tree: &mut ViewTree, card: NodeId, url: &str, m: &Metrics) -> Result<()> {
    let row = tree.append_child(
        card,
        Node::block().with_classes("more-photos").with_style(Style {
            direction: Direction::Row,
            padding: m.section_padding,
            gap: 8,
            ..Default::default()
        }),
    )?;
    tree.append_child(
        row,
        Node::text("More photos:", TextStyle::new(16.0, GRAY_600)).with_style(Style {
            width: Some(120),
            ..Default::default()
        }),
    )?;
    tree.append_child(
        row,
        Node::new(NodeKind::Link {
            text: "View on Google Drive".into(),
            href: url.to_owned(),
            style: TextStyle::new(16.0, AMBER_700).bold(),
        }),
    )?;
    Ok(())
}

fn build_footer(tree: &mut ViewTree, card: NodeId, m: &Metrics) -> Result<()> {
    let footer = tree.append_child(
        card,
        Node::block().with_classes("footer").with_style(Style {
            direction: Direction::Row,
            padding: if m.wide { 24 } else { 16 },
            background: Some(GRAY_50),
            ..Default::default()
        }),
    )?;
    tree.append_child(
        footer,
        Node::new(NodeKind::Button {
            label: "⭳ Download".into(),
            style: TextStyle::new(12.0, GRAY_700).bold(),
        })
        .with_id(DOWNLOAD_BUTTON_ID)
        .with_style(Style {
            width: Some(110),
            padding: 6,
            border: Some(Border::new(1, GRAY_400)),
            ..Default::default()
        }),
    )?;
    Ok(())
}

/// Full-viewport overlay outside the exported card.
fn build_modal(tree: &mut ViewTree, root: NodeId, src: &str, alt: &str, viewport_width: u32) -> Result<()> {
    let modal = tree.append_child(
        root,
        Node::block().with_classes("modal fixed inset-0").with_style(Style {
            padding: 16,
            gap: 12,
            background: Some(OVERLAY),
            ..Default::default()
        }),
    )?;
    tree.append_child(
        modal,
        Node::image(src, alt).with_style(Style {
            height: Some(viewport_width.saturating_mul(4) / 3),
            ..Default::default()
        }),
    )?;
    tree.append_child(
        modal,
        Node::new(NodeKind::Button {
            label: "Close".into(),
            style: TextStyle::new(14.0, GRAY_100).bold(),
        })
        .with_id("modal-close"),
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use biodata_core::{Family, GalleryImage};

    pub(crate) fn sample_profile() -> Biodata {
        Biodata {
            name: "Test Person".into(),
            headline: Some("Software Engineer".into()),
            caste: "Hindu".into(),
            dob: "01/01/2000".into(),
            blood: "O+".into(),
            height: "5' 9\"".into(),
            weight: "70 kg".into(),
            age: "26".into(),
            education: "B.E. in Computer Engineering".into(),
            company: None,
            current_place: "Ahmedabad".into(),
            phone: "+91 00000 00000".into(),
            email: "test@example.com".into(),
            family: Family {
                father: "Father".into(),
                mother: "Mother".into(),
                brother: Some("Brother".into()),
                native: "Village".into(),
                current: "Town".into(),
                maternal_uncle: None,
            },
            property: vec!["Land".into(), "House".into(), "Shop".into()],
            profile_photo: "profile.jpg".into(),
            gallery: vec![
                GalleryImage { src: "a.jpg".into(), alt: "A".into() },
                GalleryImage { src: "b.jpg".into(), alt: "B".into() },
            ],
            more_photos_url: Some("https://example.com/photos".into()),
        }
    }

    #[test]
    fn region_is_resolvable_and_sized() {
        let tree = build_page(&sample_profile(), &PageState::default(), 1280).unwrap();
        let region = tree.query_selector(DEFAULT_REGION_SELECTOR).unwrap().expect("region");
        // 1280 viewport minus 2 * 32 page padding, capped at 1024.
        assert_eq!(tree.rendered_width(region), Some(1024));

        let narrow = build_page(&sample_profile(), &PageState::default(), 400).unwrap();
        let region = narrow.query_selector(DEFAULT_REGION_SELECTOR).unwrap().unwrap();
        assert_eq!(narrow.rendered_width(region), Some(400 - 32));
    }

    #[test]
    fn selected_thumbnail_is_marked() {
        let state = PageState {
            selected_image: 1,
            ..Default::default()
        };
        let tree = build_page(&sample_profile(), &state, 1280).unwrap();
        let selected = tree.query_selector(".gallery-thumb.selected").unwrap().unwrap();
        match &tree.node(selected).unwrap().kind {
            NodeKind::Image { src, .. } => assert_eq!(src, "b.jpg"),
            other => panic!("unexpected kind {other:?}"),
        }
    }

    #[test]
    fn download_control_and_link_present() {
        let tree = build_page(&sample_profile(), &PageState::default(), 1280).unwrap();
        assert!(tree.query_selector("#download").unwrap().is_some());
        assert!(tree.query_selector(".more-photos").unwrap().is_some());
        assert!(tree.query_selector(".modal").unwrap().is_none());
    }

    #[test]
    fn modal_sits_outside_the_region() {
        let state = PageState {
            modal_image: Some(0),
            ..Default::default()
        };
        let tree = build_page(&sample_profile(), &state, 400).unwrap();
        let modal = tree.query_selector(".modal").unwrap().unwrap();
        assert_eq!(tree.node(modal).unwrap().parent(), Some(tree.root()));
        let region = tree.query_selector(DEFAULT_REGION_SELECTOR).unwrap().unwrap();
        assert!(!tree.subtree(region).unwrap().contains(&modal));
    }
}
