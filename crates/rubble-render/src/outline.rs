use glam::Affine2;
use rubble_core::shape::ShapeDescriptor;

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LineVertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
}

impl LineVertex {
    pub fn new(position: [f32; 3], color: [f32; 4]) -> Self {
        Self { position, color }
    }
}

/// Color used for immediate-mode block outlines.
pub const OUTLINE_COLOR: [f32; 4] = [0.3, 1.0, 0.3, 0.8];

/// Line-list vertices (two per edge) tracing `shape` placed by `transform`.
pub fn shape_outline(shape: &ShapeDescriptor, transform: Affine2, color: [f32; 4]) -> Vec<LineVertex> {
    let corners: Vec<[f32; 3]> = shape
        .outline()
        .into_iter()
        .map(|p| {
            let w = transform.transform_point2(p);
            [w.x, w.y, 0.0]
        })
        .collect();

    let mut verts = Vec::with_capacity(corners.len() * 2);
    for (i, &a) in corners.iter().enumerate() {
        let b = corners[(i + 1) % corners.len()];
        verts.push(LineVertex::new(a, color));
        verts.push(LineVertex::new(b, color));
    }
    verts
}
