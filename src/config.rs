use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayoutConfig {
    pub charge: f32,
    /// Pairs closer than this are treated as this far apart by the charge.
    pub charge_distance_min: f32,
    pub theta: f32,
    pub link_distance: f32,
    pub position_strength: f32,
    pub collision: bool,
    pub collision_strength: f32,
    pub radius: RadiusScale,
    pub alpha_min: f32,
    pub alpha_decay: f32,
    pub drag_alpha_target: f32,
    pub velocity_decay: f32,
    pub warmup_steps: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            charge: -200.0,
            charge_distance_min: 1.0,
            theta: 0.9,
            link_distance: 30.0,
            position_strength: 0.0,
            collision: true,
            collision_strength: 1.0,
            radius: RadiusScale::default(),
            alpha_min: 0.001,
            alpha_decay: 1.0 - 0.001_f32.powf(1.0 / 300.0),
            drag_alpha_target: 0.3,
            velocity_decay: 0.4,
            warmup_steps: 0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RadiusScale {
    Fixed(f32),
    /// Square-root scale from `[0, max_degree]` onto `[min, max]`, so disc
    /// area grows linearly with degree.
    Degree { min: f32, max: f32 },
}

impl Default for RadiusScale {
    fn default() -> Self {
        Self::Fixed(10.0)
    }
}

impl RadiusScale {
    pub fn radius(self, degree: u32, max_degree: u32) -> f32 {
        match self {
            Self::Fixed(radius) => radius,
            Self::Degree { min, max } => {
                if max_degree == 0 {
                    return min;
                }
                let t = (degree as f32 / max_degree as f32).clamp(0.0, 1.0).sqrt();
                min + (max - min) * t
            }
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RecenterMode {
    #[default]
    Identity,
    Fit,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewConfig {
    pub hit_radius: f32,
    pub min_zoom: f32,
    pub max_zoom: f32,
    pub recenter: RecenterMode,
    pub recenter_duration: Duration,
    pub fit_padding: f32,
    pub step_interval: Duration,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            hit_radius: 12.0,
            min_zoom: 0.1,
            max_zoom: 5.0,
            recenter: RecenterMode::Identity,
            recenter_duration: Duration::from_millis(500),
            fit_padding: 40.0,
            step_interval: Duration::from_millis(16),
        }
    }
}
