use std::sync::Arc;

use eframe::egui::{Pos2, Vec2};

use crate::layout::{NodePosition, Snapshot};

pub fn hit_test(snapshot: &Snapshot, world: Vec2, radius: f32) -> Option<&NodePosition> {
    let radius_sq = radius * radius;
    snapshot
        .nodes
        .iter()
        .map(|node| (node, (node.position - world).length_sq()))
        .filter(|(_, distance_sq)| *distance_sq <= radius_sq)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(node, _)| node)
}

#[derive(Clone, Debug, PartialEq)]
enum DragState {
    Idle,
    Dragging { id: Arc<str>, offset: Vec2 },
}

#[derive(Clone, Debug, PartialEq)]
pub enum DragCommand {
    Pin { id: Arc<str>, position: Vec2 },
    Release { id: Arc<str> },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Tooltip {
    pub id: Arc<str>,
    pub anchor: Pos2,
}

pub struct InteractionController {
    hit_radius: f32,
    state: DragState,
    tooltip: Option<Tooltip>,
}

impl InteractionController {
    pub fn new(hit_radius: f32) -> Self {
        Self {
            hit_radius,
            state: DragState::Idle,
            tooltip: None,
        }
    }

    pub fn pointer_moved(
        &mut self,
        screen: Pos2,
        world: Vec2,
        snapshot: Option<&Snapshot>,
    ) -> Option<DragCommand> {
        if let DragState::Dragging { id, offset } = &self.state {
            self.tooltip = None;
            return Some(DragCommand::Pin {
                id: Arc::clone(id),
                position: world + *offset,
            });
        }

        self.tooltip = snapshot
            .and_then(|snapshot| hit_test(snapshot, world, self.hit_radius))
            .map(|node| Tooltip {
                id: Arc::clone(&node.id),
                anchor: screen,
            });
        None
    }

    /// Starts a drag if a node is under the pointer. Returns `true` when a
    /// node was captured; a press during an active drag is ignored.
    pub fn pointer_down(&mut self, world: Vec2, snapshot: Option<&Snapshot>) -> bool {
        if matches!(self.state, DragState::Dragging { .. }) {
            return false;
        }

        let Some(node) = snapshot.and_then(|snapshot| hit_test(snapshot, world, self.hit_radius))
        else {
            return false;
        };

        self.state = DragState::Dragging {
            id: Arc::clone(&node.id),
            offset: node.position - world,
        };
        self.tooltip = None;
        true
    }

    pub fn pointer_up(&mut self) -> Option<DragCommand> {
        match std::mem::replace(&mut self.state, DragState::Idle) {
            DragState::Dragging { id, .. } => Some(DragCommand::Release { id }),
            DragState::Idle => None,
        }
    }

    pub fn pointer_left(&mut self) {
        self.tooltip = None;
    }

    pub fn reset(&mut self) {
        self.state = DragState::Idle;
        self.tooltip = None;
    }

    pub fn dragging(&self) -> Option<&str> {
        match &self.state {
            DragState::Dragging { id, .. } => Some(id.as_ref()),
            DragState::Idle => None,
        }
    }

    pub fn tooltip(&self) -> Option<&Tooltip> {
        self.tooltip.as_ref()
    }
}
