use eframe::egui::{Pos2, Rect, Vec2};

use crate::config::{RecenterMode, ViewConfig};
use crate::layout::Snapshot;
use crate::util::ease_cubic_in_out;

/// Pan/zoom mapping from simulation space onto the drawable rect:
/// `screen = rect.center() + translate + world * scale`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewportTransform {
    pub translate: Vec2,
    pub scale: f32,
}

impl Default for ViewportTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl ViewportTransform {
    pub const IDENTITY: Self = Self {
        translate: Vec2::ZERO,
        scale: 1.0,
    };

    pub fn world_to_screen(self, rect: Rect, world: Vec2) -> Pos2 {
        rect.center() + self.translate + world * self.scale
    }

    pub fn screen_to_world(self, rect: Rect, screen: Pos2) -> Vec2 {
        (screen - rect.center() - self.translate) / self.scale
    }

    fn lerp(self, other: Self, t: f32) -> Self {
        Self {
            translate: self.translate + (other.translate - self.translate) * t,
            scale: self.scale + (other.scale - self.scale) * t,
        }
    }

    fn fit(bounds: Rect, rect: Rect, padding: f32, min_scale: f32, max_scale: f32) -> Self {
        let available = (rect.size() - Vec2::splat(padding * 2.0)).max(Vec2::splat(1.0));
        let extent = bounds.size().max(Vec2::splat(1.0));
        let scale = (available.x / extent.x)
            .min(available.y / extent.y)
            .clamp(min_scale, max_scale);
        Self {
            translate: -bounds.center().to_vec2() * scale,
            scale,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Recenter {
    from: ViewportTransform,
    to: ViewportTransform,
    started: f64,
}

pub struct Viewport {
    config: ViewConfig,
    rect: Option<Rect>,
    transform: ViewportTransform,
    recenter: Option<Recenter>,
}

impl Viewport {
    pub fn new(config: ViewConfig) -> Self {
        Self {
            config,
            rect: None,
            transform: ViewportTransform::IDENTITY,
            recenter: None,
        }
    }

    pub fn resize(&mut self, rect: Rect) -> bool {
        if self.rect == Some(rect) {
            return false;
        }
        self.rect = Some(rect);
        true
    }

    pub fn rect(&self) -> Option<Rect> {
        self.rect.filter(|rect| rect.is_positive())
    }

    pub fn transform(&self) -> ViewportTransform {
        self.transform
    }

    pub fn world_to_screen(&self, world: Vec2) -> Option<Pos2> {
        self.rect()
            .map(|rect| self.transform.world_to_screen(rect, world))
    }

    pub fn screen_to_world(&self, screen: Pos2) -> Option<Vec2> {
        self.rect()
            .map(|rect| self.transform.screen_to_world(rect, screen))
    }

    pub fn pan_by(&mut self, delta: Vec2) {
        self.recenter = None;
        self.transform.translate += delta;
    }

    pub fn zoom_at(&mut self, anchor: Pos2, factor: f32) {
        let Some(rect) = self.rect() else {
            return;
        };
        if !factor.is_finite() || factor <= 0.0 {
            return;
        }

        self.recenter = None;
        let world = self.transform.screen_to_world(rect, anchor);
        self.transform.scale =
            (self.transform.scale * factor).clamp(self.config.min_zoom, self.config.max_zoom);
        self.transform.translate = anchor - rect.center() - world * self.transform.scale;
    }

    pub fn recenter(&mut self, snapshot: Option<&Snapshot>, now: f64) {
        let target = match (self.config.recenter, self.rect(), snapshot) {
            (RecenterMode::Fit, Some(rect), Some(snapshot)) => snapshot
                .bounds(0.0)
                .map(|bounds| {
                    ViewportTransform::fit(
                        bounds,
                        rect,
                        self.config.fit_padding,
                        self.config.min_zoom,
                        self.config.max_zoom,
                    )
                })
                .unwrap_or(ViewportTransform::IDENTITY),
            _ => ViewportTransform::IDENTITY,
        };

        self.recenter = Some(Recenter {
            from: self.transform,
            to: target,
            started: now,
        });
    }

    pub fn animate(&mut self, now: f64) -> bool {
        let Some(recenter) = self.recenter else {
            return false;
        };

        let duration = self.config.recenter_duration.as_secs_f64();
        let t = if duration <= 0.0 {
            1.0
        } else {
            ((now - recenter.started) / duration) as f32
        };

        if t >= 1.0 {
            self.transform = recenter.to;
            self.recenter = None;
            return false;
        }

        self.transform = recenter
            .from
            .lerp(recenter.to, ease_cubic_in_out(t.max(0.0)));
        true
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use eframe::egui::{pos2, vec2};
    use proptest::prelude::*;

    use super::*;
    use crate::layout::NodePosition;

    fn viewport(mode: RecenterMode) -> Viewport {
        let mut viewport = Viewport::new(ViewConfig {
            recenter: mode,
            ..ViewConfig::default()
        });
        viewport.resize(Rect::from_min_size(Pos2::ZERO, vec2(800.0, 600.0)));
        viewport
    }

    fn snapshot(points: &[(f32, f32)]) -> Snapshot {
        Snapshot {
            step: 1,
            alpha: 0.5,
            nodes: points
                .iter()
                .enumerate()
                .map(|(index, &(x, y))| NodePosition {
                    id: Arc::from(index.to_string()),
                    position: vec2(x, y),
                    pinned: false,
                })
                .collect(),
        }
    }

    #[test]
    fn identity_maps_origin_to_rect_center() {
        let viewport = viewport(RecenterMode::Identity);
        assert_eq!(viewport.world_to_screen(Vec2::ZERO), Some(pos2(400.0, 300.0)));
        assert_eq!(viewport.screen_to_world(pos2(410.0, 290.0)), Some(vec2(10.0, -10.0)));
    }

    #[test]
    fn no_rect_means_no_mapping() {
        let mut viewport = Viewport::new(ViewConfig::default());
        assert!(viewport.world_to_screen(Vec2::ZERO).is_none());
        viewport.zoom_at(Pos2::ZERO, 2.0);
        assert_eq!(viewport.transform(), ViewportTransform::IDENTITY);

        viewport.resize(Rect::from_min_size(Pos2::ZERO, Vec2::ZERO));
        assert!(viewport.rect().is_none());
    }

    #[test]
    fn zoom_is_clamped() {
        let mut viewport = viewport(RecenterMode::Identity);
        for _ in 0..50 {
            viewport.zoom_at(pos2(100.0, 100.0), 2.0);
        }
        assert_eq!(viewport.transform().scale, 5.0);
        for _ in 0..100 {
            viewport.zoom_at(pos2(100.0, 100.0), 0.5);
        }
        assert_eq!(viewport.transform().scale, 0.1);
    }

    #[test]
    fn resize_keeps_transform() {
        let mut viewport = viewport(RecenterMode::Identity);
        viewport.pan_by(vec2(30.0, -20.0));
        viewport.zoom_at(pos2(200.0, 200.0), 1.5);
        let before = viewport.transform();

        assert!(viewport.resize(Rect::from_min_size(Pos2::ZERO, vec2(1024.0, 768.0))));
        assert!(!viewport.resize(Rect::from_min_size(Pos2::ZERO, vec2(1024.0, 768.0))));
        assert_eq!(viewport.transform(), before);
    }

    #[test]
    fn recenter_eases_back_to_identity() {
        let mut viewport = viewport(RecenterMode::Identity);
        viewport.pan_by(vec2(200.0, 0.0));
        viewport.recenter(None, 10.0);

        assert!(viewport.animate(10.1));
        let early = viewport.transform().translate.x;
        assert!(early < 200.0 && early > 100.0);

        assert!(viewport.animate(10.25));
        assert!((viewport.transform().translate.x - 100.0).abs() < 1e-3);

        assert!(!viewport.animate(10.5));
        assert_eq!(viewport.transform(), ViewportTransform::IDENTITY);
        assert!(!viewport.animate(10.6));
    }

    #[test]
    fn pan_interrupts_recenter() {
        let mut viewport = viewport(RecenterMode::Identity);
        viewport.pan_by(vec2(50.0, 0.0));
        viewport.recenter(None, 0.0);
        viewport.pan_by(vec2(1.0, 0.0));
        assert!(!viewport.animate(1.0));
        assert_eq!(viewport.transform().translate, vec2(51.0, 0.0));
    }

    #[test]
    fn fit_mode_frames_every_node() {
        let mut viewport = viewport(RecenterMode::Fit);
        let snapshot = snapshot(&[(-500.0, -100.0), (900.0, 300.0), (0.0, 0.0)]);
        viewport.recenter(Some(&snapshot), 0.0);
        viewport.animate(1.0);

        let rect = viewport.rect().unwrap().shrink(39.0);
        for node in &snapshot.nodes {
            let screen = viewport.world_to_screen(node.position).unwrap();
            assert!(rect.contains(screen), "{screen:?} outside {rect:?}");
        }
        assert!(viewport.transform().scale < 1.0);
    }

    #[test]
    fn fit_mode_without_nodes_falls_back_to_identity() {
        let mut viewport = viewport(RecenterMode::Fit);
        viewport.pan_by(vec2(10.0, 10.0));
        viewport.recenter(Some(&Snapshot::default()), 0.0);
        viewport.animate(1.0);
        assert_eq!(viewport.transform(), ViewportTransform::IDENTITY);
    }

    proptest! {
        #[test]
        fn screen_world_round_trip(
            scale in 0.1f32..=5.0,
            tx in -2000.0f32..2000.0,
            ty in -2000.0f32..2000.0,
            wx in -5000.0f32..5000.0,
            wy in -5000.0f32..5000.0,
        ) {
            let rect = Rect::from_min_size(pos2(13.0, 27.0), vec2(640.0, 480.0));
            let transform = ViewportTransform { translate: vec2(tx, ty), scale };
            let world = vec2(wx, wy);

            let back = transform.screen_to_world(rect, transform.world_to_screen(rect, world));
            let tolerance = 1e-3 * (1.0 + world.length() + vec2(tx, ty).length() / scale);
            prop_assert!((back - world).length() <= tolerance, "{world:?} -> {back:?}");
        }

        #[test]
        fn zoom_keeps_anchor_fixed(
            factor in 0.2f32..4.0,
            ax in 0.0f32..800.0,
            ay in 0.0f32..600.0,
        ) {
            let mut viewport = viewport(RecenterMode::Identity);
            let anchor = pos2(ax, ay);
            let before = viewport.screen_to_world(anchor).unwrap();
            viewport.zoom_at(anchor, factor);
            let after = viewport.screen_to_world(anchor).unwrap();
            prop_assert!((after - before).length() < 1e-2);
        }
    }
}
