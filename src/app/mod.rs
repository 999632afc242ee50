use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use eframe::egui::{self, Context, CursorIcon, PointerButton, Sense, Ui};
use tracing::{info, warn};

use crate::channel::SimulationHandle;
use crate::config::{LayoutConfig, ViewConfig};
use crate::graph::{Graph, ResolveReport, ResolvedGraph, load_graph};

mod interaction;
mod render;
mod ui;
mod viewport;

use interaction::{DragCommand, InteractionController};
use render::{DrawOptions, PainterSurface, Renderer, SceneIndex};
use viewport::Viewport;

type LoadResult = Result<Graph, String>;

pub struct LinkGraphApp {
    graph_path: PathBuf,
    layout: LayoutConfig,
    view: ViewConfig,
    state: AppState,
    reload_rx: Option<Receiver<LoadResult>>,
}

enum AppState {
    Loading { rx: Receiver<LoadResult> },
    Ready(Box<GraphView>),
    Error(String),
}

struct GraphView {
    simulation: SimulationHandle,
    renderer: Renderer,
    viewport: Viewport,
    interaction: InteractionController,
    layout: LayoutConfig,
    report: ResolveReport,
    options: DrawOptions,
    reload_error: Option<String>,
}

impl LinkGraphApp {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        graph_path: PathBuf,
        layout: LayoutConfig,
        view: ViewConfig,
    ) -> Self {
        let state = Self::start_load(&cc.egui_ctx, graph_path.clone());
        Self {
            graph_path,
            layout,
            view,
            state,
            reload_rx: None,
        }
    }

    fn spawn_load(ctx: &Context, graph_path: PathBuf) -> Receiver<LoadResult> {
        let (tx, rx) = mpsc::channel();
        let ctx = ctx.clone();

        thread::spawn(move || {
            let result = load_graph(&graph_path).map_err(|error| format!("{error:#}"));
            let _ = tx.send(result);
            ctx.request_repaint();
        });

        rx
    }

    fn start_load(ctx: &Context, graph_path: PathBuf) -> AppState {
        AppState::Loading {
            rx: Self::spawn_load(ctx, graph_path),
        }
    }
}

impl eframe::App for LinkGraphApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut transition = None;

        match &mut self.state {
            AppState::Loading { rx } => {
                match rx.try_recv() {
                    Ok(Ok(graph)) => {
                        transition = Some(AppState::Ready(Box::new(GraphView::new(
                            ctx,
                            graph,
                            self.layout,
                            self.view,
                        ))));
                    }
                    Ok(Err(error)) => transition = Some(AppState::Error(error)),
                    Err(TryRecvError::Empty) => {}
                    Err(TryRecvError::Disconnected) => {
                        transition =
                            Some(AppState::Error("Background load worker disconnected".to_owned()));
                    }
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Loading graph...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
            }
            AppState::Error(error) => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load graph");
                    ui.add_space(6.0);
                    ui.label(error.as_str());
                    ui.add_space(10.0);
                    if ui.button("Retry").clicked() {
                        transition = Some(Self::start_load(ctx, self.graph_path.clone()));
                    }
                });
            }
            AppState::Ready(view) => {
                let is_reloading = self.reload_rx.is_some();
                let reload_requested = view.show(ctx, &self.graph_path, is_reloading);

                if reload_requested && self.reload_rx.is_none() {
                    self.reload_rx = Some(Self::spawn_load(ctx, self.graph_path.clone()));
                }

                if let Some(rx) = self.reload_rx.take() {
                    match rx.try_recv() {
                        Ok(Ok(graph)) => view.reload(graph),
                        Ok(Err(error)) => {
                            warn!(%error, "reload failed; keeping current graph");
                            view.reload_error = Some(error);
                        }
                        Err(TryRecvError::Empty) => self.reload_rx = Some(rx),
                        Err(TryRecvError::Disconnected) => {
                            view.reload_error =
                                Some("Background load worker disconnected".to_owned());
                        }
                    }
                }
            }
        }

        if let Some(next_state) = transition {
            self.reload_rx = None;
            self.state = next_state;
        }
    }
}

impl GraphView {
    fn new(ctx: &Context, graph: Graph, layout: LayoutConfig, view: ViewConfig) -> Self {
        let repaint = ctx.clone();
        let simulation = SimulationHandle::spawn(
            layout,
            view.step_interval,
            Box::new(move || repaint.request_repaint()),
        );

        let resolved = graph.resolve();
        let mut graph_view = Self {
            simulation,
            renderer: Renderer::new(SceneIndex::new(&resolved, layout.radius)),
            viewport: Viewport::new(view),
            interaction: InteractionController::new(view.hit_radius),
            layout,
            report: resolved.report,
            options: DrawOptions::default(),
            reload_error: None,
        };
        graph_view.send_graph(resolved);
        graph_view
    }

    fn reload(&mut self, graph: Graph) {
        let resolved = graph.resolve();
        self.report = resolved.report;
        self.renderer = Renderer::new(SceneIndex::new(&resolved, self.layout.radius));
        self.interaction.reset();
        self.reload_error = None;
        self.send_graph(resolved);
    }

    fn send_graph(&mut self, resolved: ResolvedGraph) {
        if resolved.is_empty() {
            warn!("graph has no nodes");
        }
        let generation = self.simulation.init(resolved);
        info!(
            generation,
            nodes = self.renderer.scene().node_count(),
            links = self.renderer.scene().link_count(),
            "graph sent to layout worker"
        );
    }

    fn show(&mut self, ctx: &Context, graph_path: &Path, is_reloading: bool) -> bool {
        self.simulation.poll();

        let reload_requested = self.draw_toolbar(ctx, graph_path, is_reloading);
        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| self.draw_graph(ui));
        self.draw_tooltip(ctx);

        reload_requested
    }

    fn draw_graph(&mut self, ui: &mut Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        self.viewport.resize(rect);

        let now = ui.input(|input| input.time);
        if self.viewport.animate(now) {
            ui.ctx().request_repaint();
        }

        self.handle_zoom(ui, &response);
        self.handle_pointer(ui, &response);

        let painter = ui.painter_at(rect);
        self.renderer.draw(
            &mut PainterSurface::new(&painter),
            &self.viewport,
            self.simulation.latest(),
            self.options,
        );
    }

    fn handle_zoom(&mut self, ui: &Ui, response: &egui::Response) {
        if !response.hovered() {
            return;
        }

        let (scroll, pinch, pointer) = ui.input(|input| {
            (
                input.raw_scroll_delta.y,
                input.zoom_delta(),
                input.pointer.hover_pos(),
            )
        });
        let mut factor = pinch;
        if scroll.abs() > f32::EPSILON {
            factor *= (1.0 + (scroll * 0.0018)).clamp(0.85, 1.15);
        }
        if (factor - 1.0).abs() <= f32::EPSILON {
            return;
        }

        let anchor = pointer.unwrap_or_else(|| response.rect.center());
        self.viewport.zoom_at(anchor, factor);
    }

    fn handle_pointer(&mut self, ui: &Ui, response: &egui::Response) {
        let (pointer, moved, pressed, released, primary_down) = ui.input(|input| {
            (
                input.pointer.latest_pos(),
                input.pointer.delta() != egui::Vec2::ZERO,
                input.pointer.button_pressed(PointerButton::Primary),
                input.pointer.button_released(PointerButton::Primary),
                input.pointer.primary_down(),
            )
        });

        if pressed
            && response.hovered()
            && let Some(world) = pointer.and_then(|pos| self.viewport.screen_to_world(pos))
        {
            self.interaction.pointer_down(world, self.simulation.latest());
        }

        let dragging_node = self.interaction.dragging().is_some();
        if !dragging_node && response.dragged() {
            self.viewport.pan_by(response.drag_delta());
        }

        match pointer {
            Some(screen) if moved && (dragging_node || response.hovered()) => {
                if let Some(world) = self.viewport.screen_to_world(screen)
                    && let Some(command) =
                        self.interaction.pointer_moved(screen, world, self.simulation.latest())
                {
                    self.send(command);
                }
            }
            _ if !response.hovered() => self.interaction.pointer_left(),
            _ => {}
        }

        // Observed on the whole window, not just the canvas; a lost release
        // still ends the drag once the button is seen up.
        if (released || !primary_down)
            && let Some(command) = self.interaction.pointer_up()
        {
            self.send(command);
        }

        if self.interaction.dragging().is_some() {
            ui.ctx().set_cursor_icon(CursorIcon::Grabbing);
        } else if self.interaction.tooltip().is_some() {
            ui.ctx().set_cursor_icon(CursorIcon::Grab);
        }
    }

    fn send(&mut self, command: DragCommand) {
        match command {
            DragCommand::Pin { id, position } => self.simulation.pin(&id, position),
            DragCommand::Release { id } => self.simulation.release(&id),
        }
    }
}
