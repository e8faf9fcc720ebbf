use std::collections::HashMap;

use glam::Affine2;
use rubble_core::shape::ShapeDescriptor;
use rubble_core::types::BodyHandle;

/// Physics collaborator: rigid bodies with ordered, indexable shape lists.
///
/// Shape indices are assigned in append order starting at 0 and are never
/// reused while the body lives.
pub trait PhysicsBackend {
    fn create_body(&mut self) -> BodyHandle;
    fn destroy_body(&mut self, body: BodyHandle);

    /// Attach a new, inactive shape to `body`. Returns its index.
    fn append_shape(&mut self, body: BodyHandle, shape: &ShapeDescriptor) -> u32;
    fn shape_count(&self, body: BodyHandle) -> u32;

    fn set_shape_enabled(&mut self, body: BodyHandle, index: u32, enabled: bool);
    fn shape_enabled(&self, body: BodyHandle, index: u32) -> bool;

    /// Place a shape relative to its body.
    fn set_shape_transform(&mut self, body: BodyHandle, index: u32, transform: Affine2);
    fn shape_transform(&self, body: BodyHandle, index: u32) -> Affine2;
}

#[derive(Debug, Clone)]
pub struct MemoryShape {
    pub shape: ShapeDescriptor,
    pub transform: Affine2,
    pub enabled: bool,
}

/// Headless physics keeping only shape state.
///
/// Between `begin_step` and `end_step` any shape mutation panics, which is
/// how a real engine's contact traversal would be corrupted.
#[derive(Debug, Default)]
pub struct MemoryPhysics {
    bodies: HashMap<BodyHandle, Vec<MemoryShape>>,
    next_handle: u64,
    stepping: bool,
    steps: u64,
}

impl MemoryPhysics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_step(&mut self) {
        assert!(!self.stepping, "physics step already in progress");
        self.stepping = true;
    }

    pub fn end_step(&mut self) {
        assert!(self.stepping, "no physics step in progress");
        self.stepping = false;
        self.steps += 1;
    }

    pub fn is_stepping(&self) -> bool {
        self.stepping
    }

    /// Completed steps.
    pub fn step_count(&self) -> u64 {
        self.steps
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn shapes(&self, body: BodyHandle) -> &[MemoryShape] {
        self.body(body)
    }

    /// Number of active shapes on `body`.
    pub fn enabled_shape_count(&self, body: BodyHandle) -> u32 {
        self.body(body).iter().filter(|s| s.enabled).count() as u32
    }

    fn body(&self, body: BodyHandle) -> &Vec<MemoryShape> {
        self.bodies
            .get(&body)
            .unwrap_or_else(|| panic!("unknown or destroyed body {body:?}"))
    }

    fn shape_mut(&mut self, body: BodyHandle, index: u32) -> &mut MemoryShape {
        assert!(
            !self.stepping,
            "shape {index} of {body:?} mutated during a physics step"
        );
        let shapes = self
            .bodies
            .get_mut(&body)
            .unwrap_or_else(|| panic!("unknown or destroyed body {body:?}"));
        let count = shapes.len();
        shapes
            .get_mut(index as usize)
            .unwrap_or_else(|| panic!("shape index {index} out of range ({count} shapes)"))
    }

    fn shape(&self, body: BodyHandle, index: u32) -> &MemoryShape {
        let shapes = self.body(body);
        shapes
            .get(index as usize)
            .unwrap_or_else(|| panic!("shape index {index} out of range ({} shapes)", shapes.len()))
    }
}

impl PhysicsBackend for MemoryPhysics {
    fn create_body(&mut self) -> BodyHandle {
        let handle = BodyHandle(self.next_handle);
        self.next_handle += 1;
        self.bodies.insert(handle, Vec::new());
        handle
    }

    fn destroy_body(&mut self, body: BodyHandle) {
        assert!(!self.stepping, "body {body:?} destroyed during a physics step");
        self.bodies.remove(&body);
    }

    fn append_shape(&mut self, body: BodyHandle, shape: &ShapeDescriptor) -> u32 {
        assert!(!self.stepping, "shape appended to {body:?} during a physics step");
        let shapes = self
            .bodies
            .get_mut(&body)
            .unwrap_or_else(|| panic!("unknown or destroyed body {body:?}"));
        shapes.push(MemoryShape {
            shape: shape.clone(),
            transform: Affine2::IDENTITY,
            enabled: false,
        });
        (shapes.len() - 1) as u32
    }

    fn shape_count(&self, body: BodyHandle) -> u32 {
        self.body(body).len() as u32
    }

    fn set_shape_enabled(&mut self, body: BodyHandle, index: u32, enabled: bool) {
        self.shape_mut(body, index).enabled = enabled;
    }

    fn shape_enabled(&self, body: BodyHandle, index: u32) -> bool {
        self.shape(body, index).enabled
    }

    fn set_shape_transform(&mut self, body: BodyHandle, index: u32, transform: Affine2) {
        self.shape_mut(body, index).transform = transform;
    }

    fn shape_transform(&self, body: BodyHandle, index: u32) -> Affine2 {
        self.shape(body, index).transform
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    #[test]
    fn test_shapes_indexed_in_append_order() {
        let mut p = MemoryPhysics::new();
        let body = p.create_body();
        assert_eq!(p.append_shape(body, &ShapeDescriptor::square(1.0)), 0);
        assert_eq!(p.append_shape(body, &ShapeDescriptor::Circle { radius: 1.0 }), 1);
        assert_eq!(p.shape_count(body), 2);
        assert!(!p.shape_enabled(body, 1));
    }

    #[test]
    fn test_shape_state_between_steps() {
        let mut p = MemoryPhysics::new();
        let body = p.create_body();
        p.append_shape(body, &ShapeDescriptor::square(1.0));
        p.set_shape_enabled(body, 0, true);
        let t = Affine2::from_translation(Vec2::new(3.0, 1.0));
        p.set_shape_transform(body, 0, t);

        p.begin_step();
        assert!(p.shape_enabled(body, 0));
        assert_eq!(p.shape_transform(body, 0), t);
        p.end_step();
        assert_eq!(p.step_count(), 1);
        assert_eq!(p.enabled_shape_count(body), 1);
    }

    #[test]
    #[should_panic(expected = "during a physics step")]
    fn test_mutation_mid_step_panics() {
        let mut p = MemoryPhysics::new();
        let body = p.create_body();
        p.append_shape(body, &ShapeDescriptor::square(1.0));
        p.begin_step();
        p.set_shape_enabled(body, 0, false);
    }

    #[test]
    fn test_destroy_body() {
        let mut p = MemoryPhysics::new();
        let body = p.create_body();
        p.destroy_body(body);
        assert_eq!(p.body_count(), 0);
    }
}
