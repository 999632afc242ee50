use eframe::egui::Vec2;

use crate::util::fallback_direction;

use super::quadtree::Quad;
use super::{Body, Spring};

#[derive(Clone, Copy)]
pub(super) struct ChargeParams {
    pub(super) strength: f32,
    pub(super) distance_min_sq: f32,
    pub(super) theta_sq: f32,
}

fn charge_impulse(
    mut delta: Vec2,
    mass: f32,
    pair: (usize, usize),
    params: ChargeParams,
    alpha: f32,
) -> Vec2 {
    let mut distance_sq = delta.length_sq();
    if distance_sq <= f32::EPSILON * f32::EPSILON {
        delta = fallback_direction(pair.0, pair.1) * 1e-3;
        distance_sq = delta.length_sq();
    }
    if distance_sq < params.distance_min_sq {
        distance_sq = (params.distance_min_sq * distance_sq).sqrt();
    }
    delta * (params.strength * mass * alpha / distance_sq)
}

fn charge_on(quad: &Quad, index: usize, positions: &[Vec2], params: ChargeParams, alpha: f32) -> Vec2 {
    let point = positions[index];

    if quad.is_leaf() {
        return quad
            .members
            .iter()
            .filter(|&&other| other != index)
            .map(|&other| {
                charge_impulse(positions[other] - point, 1.0, (index, other), params, alpha)
            })
            .fold(Vec2::ZERO, |sum, impulse| sum + impulse);
    }

    let delta = quad.centroid - point;
    let width = quad.bounds.width();
    if !quad.bounds.contains(point) && width * width < params.theta_sq * delta.length_sq() {
        return charge_impulse(delta, quad.mass, (index, usize::MAX), params, alpha);
    }

    quad.children()
        .map(|child| charge_on(child, index, positions, params, alpha))
        .fold(Vec2::ZERO, |sum, impulse| sum + impulse)
}

pub(super) fn apply_charge(
    bodies: &mut [Body],
    positions: &mut Vec<Vec2>,
    params: ChargeParams,
    alpha: f32,
) {
    positions.clear();
    positions.extend(bodies.iter().map(|body| body.position));
    let Some(tree) = Quad::build(positions) else {
        return;
    };

    for (index, body) in bodies.iter_mut().enumerate() {
        body.velocity += charge_on(&tree, index, positions, params, alpha);
    }
}

pub(super) fn apply_links(bodies: &mut [Body], springs: &[Spring], distance: f32, alpha: f32) {
    for spring in springs {
        let source = &bodies[spring.source];
        let target = &bodies[spring.target];
        let mut delta =
            (target.position + target.velocity) - (source.position + source.velocity);
        if delta.length_sq() <= f32::EPSILON * f32::EPSILON {
            delta = fallback_direction(spring.source, spring.target) * 1e-3;
        }

        let length = delta.length();
        let correction = delta * ((length - distance) / length * alpha * spring.strength);

        bodies[spring.target].velocity -= correction * spring.bias;
        bodies[spring.source].velocity += correction * (1.0 - spring.bias);
    }
}

pub(super) fn apply_center(bodies: &mut [Body]) {
    if bodies.is_empty() {
        return;
    }

    let mean = bodies
        .iter()
        .fold(Vec2::ZERO, |sum, body| sum + body.position)
        / bodies.len() as f32;
    for body in bodies {
        body.position -= mean;
    }
}

pub(super) fn apply_position_bias(bodies: &mut [Body], strength: f32, alpha: f32) {
    for body in bodies {
        body.velocity += (body.anchor - body.position) * (strength * alpha);
    }
}

pub(super) fn apply_collision(bodies: &mut [Body], predicted: &mut Vec<Vec2>, strength: f32) {
    predicted.clear();
    predicted.extend(bodies.iter().map(|body| body.position + body.velocity));
    let Some(tree) = Quad::build(predicted) else {
        return;
    };
    let max_radius = bodies.iter().map(|body| body.radius).fold(0.0, f32::max);

    let mut neighbours = Vec::new();
    for index in 0..bodies.len() {
        let radius = bodies[index].radius;
        neighbours.clear();
        tree.for_each_near(predicted[index], radius + max_radius, &mut |other| {
            if other > index {
                neighbours.push(other);
            }
        });

        for &other in &neighbours {
            let other_radius = bodies[other].radius;
            let reach = radius + other_radius;
            let mut delta = predicted[index] - predicted[other];
            let mut distance_sq = delta.length_sq();
            if distance_sq >= reach * reach {
                continue;
            }
            if distance_sq <= f32::EPSILON * f32::EPSILON {
                delta = fallback_direction(index, other) * 1e-3;
                distance_sq = delta.length_sq();
            }

            let distance = distance_sq.sqrt();
            let push = delta * ((reach - distance) / distance * strength);
            let share = (other_radius * other_radius)
                / (radius * radius + other_radius * other_radius).max(f32::EPSILON);

            bodies[index].velocity += push * share;
            bodies[other].velocity -= push * (1.0 - share);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use eframe::egui::vec2;

    use super::*;

    fn body(x: f32, y: f32) -> Body {
        Body {
            id: Arc::from("n"),
            position: vec2(x, y),
            velocity: Vec2::ZERO,
            pinned: None,
            anchor: vec2(x, y),
            radius: 10.0,
        }
    }

    const CHARGE: ChargeParams = ChargeParams {
        strength: -200.0,
        distance_min_sq: 1.0,
        theta_sq: 0.81,
    };

    #[test]
    fn charge_pushes_pairs_apart_symmetrically() {
        let mut bodies = vec![body(-5.0, 0.0), body(5.0, 0.0)];
        apply_charge(&mut bodies, &mut Vec::new(), CHARGE, 1.0);

        assert!(bodies[0].velocity.x < 0.0);
        assert!(bodies[1].velocity.x > 0.0);
        assert!((bodies[0].velocity + bodies[1].velocity).length() < 1e-4);
    }

    #[test]
    fn barnes_hut_matches_exact_sum_for_distant_cluster() {
        let mut bodies = vec![body(0.0, 0.0)];
        for i in 0..30 {
            bodies.push(body(1000.0 + (i % 6) as f32, (i / 6) as f32));
        }
        let mut exact = Vec2::ZERO;
        for other in &bodies[1..] {
            exact += charge_impulse(other.position, 1.0, (0, 1), CHARGE, 1.0);
        }

        apply_charge(&mut bodies, &mut Vec::new(), CHARGE, 1.0);
        let approx = bodies[0].velocity;
        assert!((approx - exact).length() / exact.length() < 0.01);
    }

    #[test]
    fn coincident_bodies_still_separate() {
        let mut bodies = vec![body(1.0, 1.0), body(1.0, 1.0)];
        apply_charge(&mut bodies, &mut Vec::new(), CHARGE, 1.0);
        assert!(bodies[0].velocity.is_finite());
        assert!(bodies[0].velocity.length() > 0.0);
        assert!(bodies[0].velocity.dot(bodies[1].velocity) < 0.0);
    }

    #[test]
    fn stretched_link_pulls_endpoints_together() {
        let mut bodies = vec![body(0.0, 0.0), body(100.0, 0.0)];
        let springs = [Spring {
            source: 0,
            target: 1,
            strength: 1.0,
            bias: 0.5,
        }];
        apply_links(&mut bodies, &springs, 30.0, 1.0);

        assert!((bodies[0].velocity.x - 35.0).abs() < 1e-4);
        assert!((bodies[1].velocity.x + 35.0).abs() < 1e-4);
    }

    #[test]
    fn center_moves_mean_to_origin() {
        let mut bodies = vec![body(10.0, 10.0), body(30.0, 50.0)];
        apply_center(&mut bodies);
        let mean = (bodies[0].position + bodies[1].position) * 0.5;
        assert!(mean.length() < 1e-5);
        assert_eq!(bodies[1].position - bodies[0].position, vec2(20.0, 40.0));
    }

    #[test]
    fn position_bias_pulls_toward_anchor() {
        let mut bodies = vec![body(0.0, 0.0)];
        bodies[0].anchor = vec2(10.0, -10.0);
        apply_position_bias(&mut bodies, 0.1, 1.0);
        assert_eq!(bodies[0].velocity, vec2(1.0, -1.0));
    }

    #[test]
    fn collision_separates_overlapping_discs_only() {
        let mut bodies = vec![body(0.0, 0.0), body(5.0, 0.0), body(100.0, 0.0)];
        apply_collision(&mut bodies, &mut Vec::new(), 1.0);

        assert!(bodies[0].velocity.x < 0.0);
        assert!(bodies[1].velocity.x > 0.0);
        assert_eq!(bodies[2].velocity, Vec2::ZERO);
        // Equal radii share the push evenly: reach 20, distance 5.
        assert!((bodies[1].velocity.x - 7.5).abs() < 1e-4);
    }
}
