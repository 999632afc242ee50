mod forces;
mod quadtree;

use std::collections::HashMap;
use std::sync::Arc;

use eframe::egui::{Rect, Vec2};
use tracing::debug;

use crate::config::LayoutConfig;
use crate::graph::ResolvedGraph;
use crate::util::phyllotaxis;

use forces::{
    ChargeParams, apply_center, apply_charge, apply_collision, apply_links, apply_position_bias,
};
pub use quadtree::quadtree_cells;

pub(crate) struct Body {
    pub(crate) id: Arc<str>,
    pub(crate) position: Vec2,
    pub(crate) velocity: Vec2,
    pub(crate) pinned: Option<Vec2>,
    pub(crate) anchor: Vec2,
    pub(crate) radius: f32,
}

pub(crate) struct Spring {
    pub(crate) source: usize,
    pub(crate) target: usize,
    pub(crate) strength: f32,
    pub(crate) bias: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NodePosition {
    pub id: Arc<str>,
    pub position: Vec2,
    pub pinned: bool,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Snapshot {
    pub step: u64,
    pub alpha: f32,
    pub nodes: Vec<NodePosition>,
}

impl Snapshot {
    #[cfg(test)]
    pub fn position_of(&self, id: &str) -> Option<Vec2> {
        self.nodes
            .iter()
            .find(|node| node.id.as_ref() == id)
            .map(|node| node.position)
    }

    pub fn bounds(&self, margin: f32) -> Option<Rect> {
        let mut nodes = self.nodes.iter();
        let first = nodes.next()?.position;
        let rect = nodes.fold(Rect::from_min_max(first.to_pos2(), first.to_pos2()), |rect, node| {
            rect.union(Rect::from_min_max(node.position.to_pos2(), node.position.to_pos2()))
        });
        Some(rect.expand(margin))
    }

    pub fn positions(&self) -> Vec<Vec2> {
        self.nodes.iter().map(|node| node.position).collect()
    }
}

pub struct LayoutEngine {
    config: LayoutConfig,
    bodies: Vec<Body>,
    springs: Vec<Spring>,
    index_by_id: HashMap<Arc<str>, usize>,
    alpha: f32,
    alpha_target: f32,
    step: u64,
    scratch: Vec<Vec2>,
}

impl LayoutEngine {
    pub fn new(config: LayoutConfig) -> Self {
        Self {
            config,
            bodies: Vec::new(),
            springs: Vec::new(),
            index_by_id: HashMap::new(),
            alpha: 0.0,
            alpha_target: 0.0,
            step: 0,
            scratch: Vec::new(),
        }
    }

    pub fn init(&mut self, graph: &ResolvedGraph) {
        let max_degree = graph.max_degree();
        self.bodies = graph
            .nodes
            .iter()
            .enumerate()
            .map(|(index, node)| {
                let start = node.fixed.or(node.hint).unwrap_or_else(|| phyllotaxis(index));
                Body {
                    id: Arc::clone(&node.id),
                    position: start,
                    velocity: Vec2::ZERO,
                    pinned: node.fixed,
                    anchor: node.hint.unwrap_or(start),
                    radius: self.config.radius.radius(node.degree, max_degree),
                }
            })
            .collect();

        let mut link_counts = vec![0u32; self.bodies.len()];
        for &(source, target) in &graph.links {
            link_counts[source] += 1;
            link_counts[target] += 1;
        }
        self.springs = graph
            .links
            .iter()
            .map(|&(source, target)| {
                let (source_links, target_links) =
                    (link_counts[source] as f32, link_counts[target] as f32);
                Spring {
                    source,
                    target,
                    strength: 1.0 / source_links.min(target_links),
                    bias: source_links / (source_links + target_links),
                }
            })
            .collect();

        self.index_by_id = self
            .bodies
            .iter()
            .enumerate()
            .map(|(index, body)| (Arc::clone(&body.id), index))
            .collect();
        self.alpha = 1.0;
        self.alpha_target = 0.0;
        self.step = 0;

        debug!(
            nodes = self.bodies.len(),
            links = self.springs.len(),
            "layout engine initialised"
        );
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn is_at_rest(&self) -> bool {
        self.alpha < self.config.alpha_min
    }

    pub fn node_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn step(&mut self) -> Option<Snapshot> {
        if self.is_at_rest() {
            return None;
        }

        self.advance();
        if self.is_at_rest() {
            debug!(step = self.step, "layout engine at rest");
        }
        Some(self.snapshot())
    }

    pub fn warm_up(&mut self, steps: usize) {
        for _ in 0..steps {
            if self.is_at_rest() {
                break;
            }
            self.advance();
        }
    }

    fn advance(&mut self) {
        self.alpha += (self.alpha_target - self.alpha) * self.config.alpha_decay;
        let alpha = self.alpha;
        let config = self.config;

        apply_links(&mut self.bodies, &self.springs, config.link_distance, alpha);
        apply_charge(
            &mut self.bodies,
            &mut self.scratch,
            ChargeParams {
                strength: config.charge,
                distance_min_sq: config.charge_distance_min * config.charge_distance_min,
                theta_sq: config.theta * config.theta,
            },
            alpha,
        );
        apply_center(&mut self.bodies);
        if config.position_strength > 0.0 {
            apply_position_bias(&mut self.bodies, config.position_strength, alpha);
        }
        if config.collision {
            apply_collision(&mut self.bodies, &mut self.scratch, config.collision_strength);
        }

        let retain = 1.0 - config.velocity_decay;
        for body in &mut self.bodies {
            match body.pinned {
                Some(pin) => {
                    body.position = pin;
                    body.velocity = Vec2::ZERO;
                }
                None => {
                    body.velocity *= retain;
                    body.position += body.velocity;
                }
            }
        }
        self.step += 1;
    }

    /// Holds `id` at `(x, y)` until released and keeps the simulation live.
    /// Returns `false` for an unknown id.
    pub fn pin(&mut self, id: &str, position: Vec2) -> bool {
        let Some(&index) = self.index_by_id.get(id) else {
            return false;
        };

        self.bodies[index].pinned = Some(position);
        self.alpha_target = self.config.drag_alpha_target;
        self.alpha = self.alpha.max(self.config.drag_alpha_target);
        true
    }

    pub fn release(&mut self, id: &str) -> bool {
        let Some(&index) = self.index_by_id.get(id) else {
            return false;
        };

        self.bodies[index].pinned = None;
        self.alpha_target = 0.0;
        true
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            step: self.step,
            alpha: self.alpha,
            nodes: self
                .bodies
                .iter()
                .map(|body| NodePosition {
                    id: Arc::clone(&body.id),
                    position: body.position,
                    pinned: body.pinned.is_some(),
                })
                .collect(),
        }
    }
}
