use std::path::Path;

use eframe::egui::{self, Align, Context, Id, Layout, Order, vec2};

use super::GraphView;
use super::render::NodeStyle;

impl GraphView {
    pub(super) fn draw_toolbar(
        &mut self,
        ctx: &Context,
        graph_path: &Path,
        is_reloading: bool,
    ) -> bool {
        let mut reload_requested = false;
        let status = self.status_text();

        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("linkgraph-view");
                    ui.separator();
                    ui.label(format!("file: {}", graph_path.display()));
                    ui.label(format!("nodes: {}", self.renderer.scene().node_count()));
                    ui.label(format!("links: {}", self.renderer.scene().link_count()));
                    if self.report.dropped() > 0 {
                        ui.label(format!("dropped: {}", self.report.dropped()))
                            .on_hover_text(format!(
                                "duplicate ids: {}\ndangling links: {}\nself links: {}\nduplicate links: {}",
                                self.report.duplicate_ids,
                                self.report.dangling_links,
                                self.report.self_links,
                                self.report.duplicate_links,
                            ));
                    }

                    if ui.button("Recenter").clicked() {
                        let now = ui.input(|input| input.time);
                        self.viewport.recenter(self.simulation.latest(), now);
                        ui.ctx().request_repaint();
                    }
                    let reload_button =
                        ui.add_enabled(!is_reloading, egui::Button::new("Reload"));
                    if reload_button.clicked() {
                        reload_requested = true;
                    }
                    ui.checkbox(&mut self.options.quadtree_overlay, "Quadtree overlay");

                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        ui.label(status);
                        if let Some(error) = &self.reload_error {
                            let color = ui.visuals().error_fg_color;
                            ui.colored_label(color, format!("reload failed: {error}"));
                        }
                    });
                });
            });

        reload_requested
    }

    fn status_text(&self) -> String {
        if !self.simulation.is_connected() {
            return "layout worker stopped".to_owned();
        }

        match self.simulation.latest() {
            None => "waiting for layout...".to_owned(),
            Some(snapshot) if snapshot.alpha < self.layout.alpha_min => format!(
                "at rest | step {} | gen {}",
                snapshot.step,
                self.simulation.generation()
            ),
            Some(snapshot) => format!(
                "alpha {:.3} | step {} | gen {}",
                snapshot.alpha,
                snapshot.step,
                self.simulation.generation()
            ),
        }
    }

    pub(super) fn draw_tooltip(&self, ctx: &Context) {
        let Some(tooltip) = self.interaction.tooltip() else {
            return;
        };

        egui::Area::new(Id::new("node_tooltip"))
            .order(Order::Tooltip)
            .fixed_pos(tooltip.anchor + vec2(14.0, 14.0))
            .interactable(false)
            .show(ctx, |ui| {
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    ui.label(tooltip.id.as_ref());
                    let scene = self.renderer.scene();
                    if let Some(NodeStyle::External) =
                        scene.slot_of(&tooltip.id).and_then(|slot| scene.style_at(slot))
                    {
                        ui.weak("external");
                    }
                });
            });
    }
}
