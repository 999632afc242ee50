mod app;
mod channel;
mod config;
mod graph;
mod layout;
mod util;

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use config::{LayoutConfig, RadiusScale, RecenterMode, ViewConfig};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum RadiusMode {
    Fixed,
    Degree,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Recenter {
    Identity,
    Fit,
}

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Graph JSON: `{ "nodes": [{ "id", "isExternal" }], "links": [{ "source", "target" }] }`
    graph: PathBuf,

    /// Many-body strength; negative repels.
    #[arg(long, default_value_t = -200.0, allow_negative_numbers = true)]
    charge: f32,

    #[arg(long, default_value_t = 1.0)]
    charge_distance_min: f32,

    #[arg(long, default_value_t = 30.0)]
    link_distance: f32,

    /// Pull toward each node's starting position; 0 disables it.
    #[arg(long, default_value_t = 0.0)]
    position_strength: f32,

    #[arg(long)]
    no_collision: bool,

    #[arg(long, value_enum, default_value_t = RadiusMode::Fixed)]
    radius_mode: RadiusMode,

    #[arg(long, default_value_t = 10.0)]
    node_radius: f32,

    #[arg(long, default_value_t = 10.0)]
    min_radius: f32,

    #[arg(long, default_value_t = 50.0)]
    max_radius: f32,

    /// Silent steps run after loading, before the first frame.
    #[arg(long, default_value_t = 0)]
    warmup_steps: usize,

    #[arg(long, default_value_t = 16)]
    step_interval_ms: u64,

    #[arg(long, default_value_t = 12.0)]
    hit_radius: f32,

    #[arg(long, value_enum, default_value_t = Recenter::Identity)]
    recenter: Recenter,
}

impl Args {
    fn layout_config(&self) -> LayoutConfig {
        let radius = match self.radius_mode {
            RadiusMode::Fixed => RadiusScale::Fixed(self.node_radius),
            RadiusMode::Degree => RadiusScale::Degree {
                min: self.min_radius.min(self.max_radius),
                max: self.max_radius.max(self.min_radius),
            },
        };

        LayoutConfig {
            charge: self.charge,
            charge_distance_min: self.charge_distance_min.max(0.0),
            link_distance: self.link_distance.max(0.0),
            position_strength: self.position_strength.max(0.0),
            collision: !self.no_collision,
            radius,
            warmup_steps: self.warmup_steps,
            ..LayoutConfig::default()
        }
    }

    fn view_config(&self) -> ViewConfig {
        ViewConfig {
            hit_radius: self.hit_radius.max(0.0),
            recenter: match self.recenter {
                Recenter::Identity => RecenterMode::Identity,
                Recenter::Fit => RecenterMode::Fit,
            },
            step_interval: Duration::from_millis(self.step_interval_ms),
            ..ViewConfig::default()
        }
    }
}

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let layout = args.layout_config();
    let view = args.view_config();
    tracing::debug!(?layout, ?view, "starting");

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1280.0, 860.0]),
        ..Default::default()
    };

    eframe::run_native(
        "linkgraph-view",
        options,
        Box::new(move |cc| {
            Ok(Box::new(app::LinkGraphApp::new(
                cc,
                args.graph.clone(),
                layout,
                view,
            )))
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_map_onto_config_defaults() {
        let args = Args::parse_from(["linkgraph-view", "graph.json"]);
        assert_eq!(args.layout_config(), LayoutConfig::default());
        assert_eq!(args.view_config(), ViewConfig::default());
    }

    #[test]
    fn options_reach_configs() {
        let args = Args::parse_from([
            "linkgraph-view",
            "graph.json",
            "--charge",
            "-80",
            "--no-collision",
            "--radius-mode",
            "degree",
            "--min-radius",
            "4",
            "--max-radius",
            "20",
            "--recenter",
            "fit",
            "--step-interval-ms",
            "33",
        ]);
        let layout = args.layout_config();
        assert_eq!(layout.charge, -80.0);
        assert!(!layout.collision);
        assert_eq!(layout.radius, RadiusScale::Degree { min: 4.0, max: 20.0 });

        let view = args.view_config();
        assert_eq!(view.recenter, RecenterMode::Fit);
        assert_eq!(view.step_interval, Duration::from_millis(33));
    }
}
