use eframe::egui::{Vec2, vec2};

const LEAF_CAPACITY: usize = 8;
const MAX_DEPTH: usize = 12;

#[derive(Clone, Copy, Debug)]
pub(super) struct Square {
    pub(super) center: Vec2,
    pub(super) half_extent: f32,
}

impl Square {
    fn enclosing(points: &[Vec2]) -> Option<Self> {
        let (min, max) = points.iter().fold(
            (
                vec2(f32::INFINITY, f32::INFINITY),
                vec2(f32::NEG_INFINITY, f32::NEG_INFINITY),
            ),
            |(min, max), point| (min.min(*point), max.max(*point)),
        );

        if !(min.x.is_finite() && min.y.is_finite() && max.x.is_finite() && max.y.is_finite()) {
            return None;
        }

        let span = (max - min).max_elem().max(1.0);
        Some(Self {
            center: (min + max) * 0.5,
            half_extent: span * 0.5 + 1.0,
        })
    }

    pub(super) fn contains(self, point: Vec2) -> bool {
        (point.x - self.center.x).abs() <= self.half_extent
            && (point.y - self.center.y).abs() <= self.half_extent
    }

    pub(super) fn width(self) -> f32 {
        self.half_extent * 2.0
    }

    fn distance_sq_to(self, point: Vec2) -> f32 {
        let dx = ((point.x - self.center.x).abs() - self.half_extent).max(0.0);
        let dy = ((point.y - self.center.y).abs() - self.half_extent).max(0.0);
        dx * dx + dy * dy
    }

    fn quadrant_of(self, point: Vec2) -> usize {
        usize::from(point.x >= self.center.x) | (usize::from(point.y >= self.center.y) << 1)
    }

    fn quadrant(self, quadrant: usize) -> Self {
        let quarter = self.half_extent * 0.5;
        let sign_x = if quadrant & 1 == 0 { -1.0 } else { 1.0 };
        let sign_y = if quadrant & 2 == 0 { -1.0 } else { 1.0 };
        Self {
            center: self.center + vec2(sign_x * quarter, sign_y * quarter),
            half_extent: quarter,
        }
    }
}

pub(super) struct Quad {
    pub(super) bounds: Square,
    pub(super) centroid: Vec2,
    pub(super) mass: f32,
    pub(super) members: Vec<usize>,
    pub(super) children: [Option<Box<Quad>>; 4],
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct QuadtreeCell {
    pub center: Vec2,
    pub half_extent: f32,
    pub depth: usize,
    pub is_leaf: bool,
}

impl Quad {
    pub(super) fn build(positions: &[Vec2]) -> Option<Self> {
        let bounds = Square::enclosing(positions)?;
        Some(Self::subdivide(
            bounds,
            (0..positions.len()).collect(),
            positions,
            0,
        ))
    }

    fn subdivide(bounds: Square, members: Vec<usize>, positions: &[Vec2], depth: usize) -> Self {
        let mass = members.len() as f32;
        let centroid = if members.is_empty() {
            bounds.center
        } else {
            members.iter().fold(Vec2::ZERO, |sum, &index| sum + positions[index]) / mass
        };

        let mut quad = Self {
            bounds,
            centroid,
            mass,
            members,
            children: std::array::from_fn(|_| None),
        };

        if depth >= MAX_DEPTH || quad.members.len() <= LEAF_CAPACITY {
            return quad;
        }

        let mut buckets: [Vec<usize>; 4] = std::array::from_fn(|_| Vec::new());
        for &index in &quad.members {
            buckets[bounds.quadrant_of(positions[index])].push(index);
        }

        // All members in one quadrant (coincident points): splitting further
        // would only recurse to MAX_DEPTH.
        if buckets.iter().filter(|bucket| !bucket.is_empty()).count() <= 1 {
            return quad;
        }

        for (quadrant, bucket) in buckets.into_iter().enumerate() {
            if !bucket.is_empty() {
                quad.children[quadrant] = Some(Box::new(Self::subdivide(
                    bounds.quadrant(quadrant),
                    bucket,
                    positions,
                    depth + 1,
                )));
            }
        }
        quad.members = Vec::new();
        quad
    }

    pub(super) fn is_leaf(&self) -> bool {
        self.children.iter().all(Option::is_none)
    }

    pub(super) fn children(&self) -> impl Iterator<Item = &Quad> {
        self.children.iter().filter_map(|child| child.as_deref())
    }

    /// Calls `visit` with every member whose leaf lies within `radius` of
    /// `point`. Members may be slightly farther than `radius`; callers check
    /// exact distances.
    pub(super) fn for_each_near(&self, point: Vec2, radius: f32, visit: &mut impl FnMut(usize)) {
        if self.bounds.distance_sq_to(point) > radius * radius {
            return;
        }

        if self.is_leaf() {
            for &index in &self.members {
                visit(index);
            }
            return;
        }

        for child in self.children() {
            child.for_each_near(point, radius, visit);
        }
    }

    fn collect_cells(&self, depth: usize, cells: &mut Vec<QuadtreeCell>) {
        cells.push(QuadtreeCell {
            center: self.bounds.center,
            half_extent: self.bounds.half_extent,
            depth,
            is_leaf: self.is_leaf(),
        });
        for child in self.children() {
            child.collect_cells(depth + 1, cells);
        }
    }
}

pub fn quadtree_cells(positions: &[Vec2]) -> Vec<QuadtreeCell> {
    let mut cells = Vec::new();
    if let Some(root) = Quad::build(positions) {
        root.collect_cells(0, &mut cells);
    }
    cells
}
