use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Segments used when a circle has to be drawn as a polygon.
const CIRCLE_OUTLINE_SEGMENTS: u32 = 24;

/// Collision geometry of a BlockType, centered on the block origin.
///
/// Triangulation and convex decomposition belong to the physics collaborator;
/// this type only carries the description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ShapeDescriptor {
    /// Axis-aligned rectangle of the given full extents.
    Rect { width: f32, height: f32 },
    /// Circle of the given radius.
    Circle { radius: f32 },
    /// Closed polygon, counter-clockwise or clockwise.
    Polygon { points: Vec<(f32, f32)> },
}

impl ShapeDescriptor {
    /// Axis-aligned square with the given side length.
    pub fn square(side: f32) -> Self {
        ShapeDescriptor::Rect {
            width: side,
            height: side,
        }
    }

    /// Enclosed area in world units squared.
    pub fn area(&self) -> f32 {
        match self {
            ShapeDescriptor::Rect { width, height } => (width * height).abs(),
            ShapeDescriptor::Circle { radius } => std::f32::consts::PI * radius * radius,
            ShapeDescriptor::Polygon { points } => {
                if points.len() < 3 {
                    return 0.0;
                }
                // Shoelace
                let mut twice = 0.0f32;
                for (i, &(x0, y0)) in points.iter().enumerate() {
                    let (x1, y1) = points[(i + 1) % points.len()];
                    twice += x0 * y1 - x1 * y0;
                }
                twice.abs() * 0.5
            }
        }
    }

    /// Copy of this shape uniformly scaled about its origin.
    pub fn scaled(&self, scale: f32) -> Self {
        match self {
            ShapeDescriptor::Rect { width, height } => ShapeDescriptor::Rect {
                width: width * scale,
                height: height * scale,
            },
            ShapeDescriptor::Circle { radius } => ShapeDescriptor::Circle {
                radius: radius * scale,
            },
            ShapeDescriptor::Polygon { points } => ShapeDescriptor::Polygon {
                points: points.iter().map(|&(x, y)| (x * scale, y * scale)).collect(),
            },
        }
    }

    /// Closed outline as an ordered list of vertices (last connects to first).
    pub fn outline(&self) -> Vec<Vec2> {
        match self {
            ShapeDescriptor::Rect { width, height } => {
                let hw = width * 0.5;
                let hh = height * 0.5;
                vec![
                    Vec2::new(-hw, -hh),
                    Vec2::new(hw, -hh),
                    Vec2::new(hw, hh),
                    Vec2::new(-hw, hh),
                ]
            }
            ShapeDescriptor::Circle { radius } => (0..CIRCLE_OUTLINE_SEGMENTS)
                .map(|i| {
                    let a = (i as f32) / (CIRCLE_OUTLINE_SEGMENTS as f32) * std::f32::consts::TAU;
                    Vec2::new(radius * a.cos(), radius * a.sin())
                })
                .collect(),
            ShapeDescriptor::Polygon { points } => {
                points.iter().map(|&(x, y)| Vec2::new(x, y)).collect()
            }
        }
    }
}
