use crate::error::SimError;
use glam::Vec2;

/// Below this distance from a circle's center the contact normal is
/// ill-defined and a fixed upward normal is used instead.
const MIN_CENTER_DISTANCE: f32 = 1e-3;
/// Squared edge length below which a polygon edge counts as degenerate.
const MIN_EDGE_LENGTH_SQ: f32 = 1e-6;

/// Result of a point-vs-shape overlap query.
///
/// `normal` points out of the shape at the contact; `penetration` is how
/// deep the point sits inside, measured along the normal.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Contact {
    pub normal: Vec2,
    pub penetration: f32,
}

/// A static collision obstacle.
///
/// One variant per supported geometry; every variant answers the same
/// containment / contact / translation queries, so the solver never
/// branches on the concrete kind beyond this enum.
#[derive(Clone, Debug)]
pub enum Shape {
    Circle {
        center: Vec2,
        radius: f32,
    },
    /// Convex polygon. Edge normals are precomputed at construction and
    /// oriented away from the centroid, so containment and contact work
    /// for either winding.
    Polygon {
        vertices: Vec<Vec2>,
        normals: Vec<Vec2>,
    },
}

impl Shape {
    pub fn circle(center: Vec2, radius: f32) -> Self {
        Shape::Circle { center, radius }
    }

    /// Builds a convex polygon from its vertices.
    ///
    /// Rejects polygons with fewer than three vertices or with a
    /// (near-)zero-length edge, which would make the edge normal
    /// undefined.
    pub fn polygon(vertices: Vec<Vec2>) -> Result<Self, SimError> {
        if vertices.len() < 3 {
            return Err(SimError::DegeneratePolygon);
        }

        let centroid = vertices.iter().copied().sum::<Vec2>() / vertices.len() as f32;

        let mut normals = Vec::with_capacity(vertices.len());
        for i in 0..vertices.len() {
            let a = vertices[i];
            let b = vertices[(i + 1) % vertices.len()];
            let edge = b - a;
            if edge.length_squared() < MIN_EDGE_LENGTH_SQ {
                return Err(SimError::DegeneratePolygon);
            }

            let mut normal = edge.perp().normalize();
            // Point the normal away from the interior, whatever the winding.
            let midpoint = (a + b) * 0.5;
            if normal.dot(midpoint - centroid) < 0.0 {
                normal = -normal;
            }
            normals.push(normal);
        }

        Ok(Shape::Polygon { vertices, normals })
    }

    /// Axis-aligned rectangle helper, a common obstacle in the viewer.
    pub fn rect(min: Vec2, max: Vec2) -> Result<Self, SimError> {
        Self::polygon(vec![
            min,
            Vec2::new(max.x, min.y),
            max,
            Vec2::new(min.x, max.y),
        ])
    }

    /// Whether `point` lies inside the shape.
    pub fn contains(&self, point: Vec2) -> bool {
        match self {
            Shape::Circle { center, radius } => (point - *center).length() < *radius,
            Shape::Polygon { vertices, normals } => {
                // Inside iff the point is behind every edge plane.
                vertices
                    .iter()
                    .zip(normals)
                    .all(|(v, n)| (point - *v).dot(*n) <= 0.0)
            }
        }
    }

    /// Contact normal and penetration depth for a point inside the shape.
    ///
    /// Returns `None` when the point is outside. For circles the normal
    /// runs from the center through the point; a point sitting on the
    /// center itself gets a fixed upward normal. For polygons the closest
    /// edge is found by clamped segment projection and the penetration is
    /// the distance to that edge.
    pub fn collide(&self, point: Vec2) -> Option<Contact> {
        if !self.contains(point) {
            return None;
        }

        match self {
            Shape::Circle { center, radius } => {
                let delta = point - *center;
                let distance = delta.length();
                let normal = if distance < MIN_CENTER_DISTANCE {
                    Vec2::NEG_Y
                } else {
                    delta / distance
                };
                Some(Contact {
                    normal,
                    penetration: *radius - distance,
                })
            }
            Shape::Polygon { vertices, normals } => {
                let mut best_edge = 0;
                let mut best_distance = f32::MAX;

                for i in 0..vertices.len() {
                    let a = vertices[i];
                    let b = vertices[(i + 1) % vertices.len()];
                    let edge = b - a;

                    let t = ((point - a).dot(edge) / edge.length_squared()).clamp(0.0, 1.0);
                    let closest = a + edge * t;
                    let distance = (point - closest).length();

                    if distance < best_distance {
                        best_distance = distance;
                        best_edge = i;
                    }
                }

                Some(Contact {
                    normal: normals[best_edge],
                    penetration: best_distance,
                })
            }
        }
    }

    /// Translates the shape by `delta`.
    pub fn move_by(&mut self, delta: Vec2) {
        match self {
            Shape::Circle { center, .. } => *center += delta,
            // Normals are translation-invariant.
            Shape::Polygon { vertices, .. } => {
                for v in vertices.iter_mut() {
                    *v += delta;
                }
            }
        }
    }
}
