use std::f32::consts::{PI, TAU};

use eframe::egui::{Vec2, vec2};

pub fn fallback_direction(a: usize, b: usize) -> Vec2 {
    let (low, high, sign) = if a <= b { (a, b, 1.0) } else { (b, a, -1.0) };
    let angle = ((low as f32) * 0.618_034 + (high as f32) * 0.414_214 + 0.37) * TAU;
    vec2(angle.cos(), angle.sin()) * sign
}

pub fn phyllotaxis(index: usize) -> Vec2 {
    const INITIAL_RADIUS: f32 = 10.0;
    let golden_angle = PI * (3.0 - 5.0_f32.sqrt());

    let radius = INITIAL_RADIUS * (0.5 + index as f32).sqrt();
    let angle = index as f32 * golden_angle;
    vec2(angle.cos(), angle.sin()) * radius
}

pub fn ease_cubic_in_out(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0) * 2.0;
    if t <= 1.0 {
        t * t * t / 2.0
    } else {
        let t = t - 2.0;
        (t * t * t + 2.0) / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_direction_is_antisymmetric_unit() {
        for (a, b) in [(0, 1), (3, 17), (42, 5), (7, usize::MAX)] {
            let forward = fallback_direction(a, b);
            let backward = fallback_direction(b, a);
            assert!((forward.length() - 1.0).abs() < 1e-4);
            assert!((forward + backward).length() < 1e-6);
        }
    }

    #[test]
    fn phyllotaxis_points_are_distinct_and_spread() {
        let points = (0..50).map(phyllotaxis).collect::<Vec<_>>();
        for (i, a) in points.iter().enumerate() {
            for b in &points[i + 1..] {
                assert!((*a - *b).length() > 1.0);
            }
        }
        assert!(points[49].length() > points[0].length());
    }

    #[test]
    fn cubic_easing_hits_endpoints_and_midpoint() {
        assert_eq!(ease_cubic_in_out(0.0), 0.0);
        assert_eq!(ease_cubic_in_out(0.5), 0.5);
        assert_eq!(ease_cubic_in_out(1.0), 1.0);
        assert!(ease_cubic_in_out(0.25) < 0.25);
        assert!(ease_cubic_in_out(0.75) > 0.75);
    }
}
