use std::collections::HashMap;
use std::sync::Arc;

use eframe::egui::{Color32, Painter, Pos2, Rect, Stroke, vec2};

use crate::config::RadiusScale;
use crate::graph::ResolvedGraph;
use crate::layout::{Snapshot, quadtree_cells};

use super::viewport::Viewport;

const BACKGROUND: Color32 = Color32::from_rgb(19, 23, 29);
// #aaa at 70% opacity.
const LINK_COLOR: Color32 = Color32::from_rgba_premultiplied(119, 119, 119, 179);
const LINK_WIDTH: f32 = 1.0;
const NODE_STROKE_WIDTH: f32 = 2.0;
const PINNED_STROKE: Color32 = Color32::from_rgb(250, 204, 21);

pub trait Surface {
    fn clear(&mut self, rect: Rect);
    fn line(&mut self, from: Pos2, to: Pos2, stroke: Stroke);
    fn disc(&mut self, center: Pos2, radius: f32, fill: Color32, stroke: Stroke);
}

pub struct PainterSurface<'a> {
    painter: &'a Painter,
}

impl<'a> PainterSurface<'a> {
    pub fn new(painter: &'a Painter) -> Self {
        Self { painter }
    }
}

impl Surface for PainterSurface<'_> {
    fn clear(&mut self, rect: Rect) {
        self.painter.rect_filled(rect, 0.0, BACKGROUND);
    }

    fn line(&mut self, from: Pos2, to: Pos2, stroke: Stroke) {
        self.painter.line_segment([from, to], stroke);
    }

    fn disc(&mut self, center: Pos2, radius: f32, fill: Color32, stroke: Stroke) {
        self.painter.circle(center, radius, fill, stroke);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeStyle {
    Internal,
    External,
}

impl NodeStyle {
    pub fn for_node(is_external: bool) -> Self {
        if is_external {
            Self::External
        } else {
            Self::Internal
        }
    }

    pub fn fill(self) -> Color32 {
        match self {
            Self::Internal => Color32::from_rgb(0x25, 0x63, 0xeb),
            Self::External => Color32::from_rgb(0xe1, 0x1d, 0x48),
        }
    }

    pub fn stroke_color(self) -> Color32 {
        match self {
            Self::Internal | Self::External => Color32::WHITE,
        }
    }
}

pub struct SceneIndex {
    slots: HashMap<Arc<str>, usize>,
    styles: Vec<NodeStyle>,
    radii: Vec<f32>,
    links: Vec<(usize, usize)>,
}

impl SceneIndex {
    pub fn new(graph: &ResolvedGraph, radius: RadiusScale) -> Self {
        let max_degree = graph.max_degree();

        Self {
            slots: graph
                .nodes
                .iter()
                .enumerate()
                .map(|(slot, node)| (Arc::clone(&node.id), slot))
                .collect(),
            styles: graph
                .nodes
                .iter()
                .map(|node| NodeStyle::for_node(node.is_external))
                .collect(),
            radii: graph
                .nodes
                .iter()
                .map(|node| radius.radius(node.degree, max_degree))
                .collect(),
            links: graph.links.clone(),
        }
    }

    pub fn slot_of(&self, id: &str) -> Option<usize> {
        self.slots.get(id).copied()
    }

    pub fn style_at(&self, slot: usize) -> Option<NodeStyle> {
        self.styles.get(slot).copied()
    }

    pub fn radius_at(&self, slot: usize) -> Option<f32> {
        self.radii.get(slot).copied()
    }

    pub fn node_count(&self) -> usize {
        self.styles.len()
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DrawOptions {
    pub quadtree_overlay: bool,
}

pub struct Renderer {
    scene: SceneIndex,
    screen_positions: Vec<Option<(Pos2, bool)>>,
}

impl Renderer {
    pub fn new(scene: SceneIndex) -> Self {
        Self {
            scene,
            screen_positions: Vec::new(),
        }
    }

    pub fn scene(&self) -> &SceneIndex {
        &self.scene
    }

    /// Redraws the whole scene from `snapshot` and the viewport transform.
    /// Returns `false` without touching the surface while the viewport has
    /// no rect yet.
    pub fn draw(
        &mut self,
        surface: &mut impl Surface,
        viewport: &Viewport,
        snapshot: Option<&Snapshot>,
        options: DrawOptions,
    ) -> bool {
        let Some(rect) = viewport.rect() else {
            return false;
        };
        let transform = viewport.transform();

        surface.clear(rect);
        let Some(snapshot) = snapshot else {
            return true;
        };

        self.screen_positions.clear();
        self.screen_positions.resize(self.scene.node_count(), None);
        for node in &snapshot.nodes {
            if let Some(slot) = self.scene.slot_of(&node.id) {
                self.screen_positions[slot] =
                    Some((transform.world_to_screen(rect, node.position), node.pinned));
            }
        }

        if options.quadtree_overlay {
            Self::draw_quadtree(surface, viewport, snapshot);
        }

        let link_stroke = Stroke::new(LINK_WIDTH * transform.scale, LINK_COLOR);
        for &(source, target) in &self.scene.links {
            if let (Some((start, _)), Some((end, _))) =
                (self.screen_positions[source], self.screen_positions[target])
            {
                surface.line(start, end, link_stroke);
            }
        }

        for (slot, position) in self.screen_positions.iter().enumerate() {
            let (Some((center, pinned)), Some(style), Some(radius)) = (
                *position,
                self.scene.style_at(slot),
                self.scene.radius_at(slot),
            ) else {
                continue;
            };
            let stroke_color = if pinned {
                PINNED_STROKE
            } else {
                style.stroke_color()
            };
            surface.disc(
                center,
                radius * transform.scale,
                style.fill(),
                Stroke::new(NODE_STROKE_WIDTH * transform.scale, stroke_color),
            );
        }
        true
    }

    fn draw_quadtree(surface: &mut impl Surface, viewport: &Viewport, snapshot: &Snapshot) {
        for cell in quadtree_cells(&snapshot.positions()) {
            let min = cell.center - vec2(cell.half_extent, cell.half_extent);
            let max = cell.center + vec2(cell.half_extent, cell.half_extent);
            let corners = [
                vec2(min.x, min.y),
                vec2(max.x, min.y),
                vec2(max.x, max.y),
                vec2(min.x, max.y),
            ]
            .map(|corner| viewport.world_to_screen(corner));
            let [Some(a), Some(b), Some(c), Some(d)] = corners else {
                return;
            };

            let alpha = if cell.is_leaf { 110 } else { 55 };
            let width = (1.4 - cell.depth as f32 * 0.09).clamp(0.45, 1.4);
            let stroke = Stroke::new(width, Color32::from_rgba_unmultiplied(106, 198, 255, alpha));
            surface.line(a, b, stroke);
            surface.line(b, c, stroke);
            surface.line(c, d, stroke);
            surface.line(d, a, stroke);
        }
    }
}
