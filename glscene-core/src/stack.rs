/// Hierarchical transform stack with save/restore semantics
///
/// The stack always holds at least one entry: the identity base frame pushed
/// at construction. Every transform is right-multiplied onto the top, so the
/// operation issued last is the first one applied to object-local
/// coordinates.
use nalgebra::{Matrix4, Vector3};

use crate::error::StackError;
use crate::transform;

#[derive(Debug, Clone)]
pub struct TransformStack {
    frames: Vec<Matrix4<f32>>,
    pushes: u64,
    pops: u64,
}

impl TransformStack {
    pub fn new() -> Self {
        Self {
            frames: vec![Matrix4::identity()],
            pushes: 0,
            pops: 0,
        }
    }

    /// Number of frames, base frame included.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Duplicate the top frame.
    pub fn push(&mut self) {
        let top = *self.top();
        self.frames.push(top);
        self.pushes += 1;
    }

    /// Discard the top frame.
    ///
    /// Popping the base frame is a push/pop mismatch in the caller; the stack
    /// is left untouched and `StackError::Underflow` is returned.
    pub fn pop(&mut self) -> Result<(), StackError> {
        if self.frames.len() <= 1 {
            log::warn!(
                "transform stack underflow after {} pushes and {} pops",
                self.pushes,
                self.pops
            );
            return Err(StackError::Underflow {
                pushes: self.pushes,
                pops: self.pops,
            });
        }
        self.frames.pop();
        self.pops += 1;
        Ok(())
    }

    /// Run `f` inside a pushed frame and pop it afterwards.
    pub fn with_frame<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        let depth = self.depth();
        self.push();
        let result = f(self);
        // Frames the closure left pushed go away together with ours.
        while self.depth() > depth {
            self.frames.pop();
            self.pops += 1;
        }
        result
    }

    /// Snapshot of the current composed transform.
    pub fn current(&self) -> Matrix4<f32> {
        *self.top()
    }

    pub fn load_identity(&mut self) {
        *self.top_mut() = Matrix4::identity();
    }

    /// top = top * matrix
    pub fn mult_matrix(&mut self, matrix: &Matrix4<f32>) {
        let top = self.top_mut();
        *top = *top * matrix;
    }

    pub fn translate(&mut self, offset: Vector3<f32>) {
        self.mult_matrix(&transform::translation(&offset));
    }

    /// Rotate by `angle_degrees` about `axis` in the current local frame.
    pub fn rotate(&mut self, angle_degrees: f32, axis: Vector3<f32>) {
        self.mult_matrix(&transform::rotation(angle_degrees, &axis));
    }

    pub fn scale(&mut self, factors: Vector3<f32>) {
        self.mult_matrix(&transform::scaling(&factors));
    }

    fn top(&self) -> &Matrix4<f32> {
        // `frames` is never empty; see `pop`.
        &self.frames[self.frames.len() - 1]
    }

    fn top_mut(&mut self) -> &mut Matrix4<f32> {
        let last = self.frames.len() - 1;
        &mut self.frames[last]
    }
}

impl Default for TransformStack {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: &Matrix4<f32>, b: &Matrix4<f32>) -> bool {
        (a - b).norm() < 1e-5
    }

    #[test]
    fn test_new_stack_is_identity_with_depth_one() {
        let stack = TransformStack::new();
        assert_eq!(stack.depth(), 1);
        assert!(close(&stack.current(), &Matrix4::identity()));
    }

    #[test]
    fn test_push_pop_restores_previous_transform() {
        let mut stack = TransformStack::new();
        stack.translate(Vector3::new(0.5, -1.0, 2.0));
        stack.rotate(30.0, Vector3::new(0.0, 1.0, 0.0));
        let before = stack.current();

        stack.push();
        stack.translate(Vector3::new(3.0, 4.0, 5.0));
        stack.rotate(75.0, Vector3::new(1.0, 1.0, 0.0));
        stack.scale(Vector3::new(0.2, 2.0, 7.0));
        stack.load_identity();
        stack.scale(Vector3::new(9.0, 9.0, 9.0));
        stack.pop().unwrap();

        assert_eq!(stack.depth(), 1);
        assert!(close(&stack.current(), &before));
    }

    #[test]
    fn test_pop_on_base_frame_underflows_and_leaves_stack_unchanged() {
        let mut stack = TransformStack::new();
        stack.scale(Vector3::new(2.0, 2.0, 2.0));
        let before = stack.current();

        let err = stack.pop().unwrap_err();
        assert_eq!(err, StackError::Underflow { pushes: 0, pops: 0 });
        assert_eq!(stack.depth(), 1);
        assert!(close(&stack.current(), &before));
    }

    #[test]
    fn test_underflow_reports_push_pop_counts() {
        let mut stack = TransformStack::new();
        stack.push();
        stack.push();
        stack.pop().unwrap();
        stack.pop().unwrap();

        let err = stack.pop().unwrap_err();
        assert_eq!(err, StackError::Underflow { pushes: 2, pops: 2 });
        assert!(err.to_string().contains("2 pushes, 2 pops"));
    }

    #[test]
    fn test_translate_then_rotate_composes_on_the_right() {
        let mut stack = TransformStack::new();
        stack.push();
        stack.translate(Vector3::new(1.0, 0.0, 0.0));
        stack.rotate(90.0, Vector3::new(0.0, 0.0, 1.0));

        #[rustfmt::skip]
        let translate = Matrix4::<f32>::new(
            1.0, 0.0, 0.0, 1.0,
            0.0, 1.0, 0.0, 0.0,
            0.0, 0.0, 1.0, 0.0,
            0.0, 0.0, 0.0, 1.0,
        );
        #[rustfmt::skip]
        let rotate_z = Matrix4::<f32>::new(
            0.0, -1.0, 0.0, 0.0,
            1.0,  0.0, 0.0, 0.0,
            0.0,  0.0, 1.0, 0.0,
            0.0,  0.0, 0.0, 1.0,
        );
        let expected = Matrix4::<f32>::identity() * translate * rotate_z;

        assert!(close(&stack.current(), &expected));
        // The local x axis now points along world y, offset by one along x.
        let p = stack.current().transform_point(&nalgebra::Point3::new(1.0, 0.0, 0.0));
        assert!((p - nalgebra::Point3::new(1.0, 1.0, 0.0)).norm() < 1e-5);
    }

    #[test]
    fn test_sibling_frames_are_independent() {
        let a = Vector3::new(1.0, 2.0, 3.0);
        let b = Vector3::new(-4.0, 0.5, 0.0);
        let mut stack = TransformStack::new();

        stack.push();
        stack.translate(a);
        let v1 = stack.current();
        stack.pop().unwrap();

        stack.push();
        stack.translate(b);
        let v2 = stack.current();
        stack.pop().unwrap();

        assert!(close(&v1, &transform::translation(&a)));
        assert!(close(&v2, &transform::translation(&b)));
        assert_eq!(stack.depth(), 1);
    }

    #[test]
    fn test_depth_accounting() {
        let mut stack = TransformStack::new();
        for _ in 0..7 {
            stack.push();
        }
        for _ in 0..3 {
            stack.pop().unwrap();
        }
        assert_eq!(stack.depth(), 1 + 7 - 3);
    }

    #[test]
    fn test_current_is_a_snapshot() {
        let mut stack = TransformStack::new();
        let mut snapshot = stack.current();
        snapshot[(0, 3)] = 42.0;
        assert!(close(&stack.current(), &Matrix4::identity()));

        stack.translate(Vector3::new(1.0, 0.0, 0.0));
        assert!((snapshot[(0, 3)] - 42.0).abs() < 1e-6);
    }

    #[test]
    fn test_load_identity_only_resets_top() {
        let mut stack = TransformStack::new();
        stack.translate(Vector3::new(1.0, 0.0, 0.0));
        let base = stack.current();

        stack.push();
        stack.scale(Vector3::new(3.0, 3.0, 3.0));
        stack.load_identity();
        assert!(close(&stack.current(), &Matrix4::identity()));

        stack.pop().unwrap();
        assert!(close(&stack.current(), &base));
    }

    #[test]
    fn test_with_frame_balances_push_and_pop() {
        let mut stack = TransformStack::new();
        let inner = stack.with_frame(|ms| {
            ms.translate(Vector3::new(0.0, 1.0, 0.0));
            ms.with_frame(|ms| {
                ms.scale(Vector3::new(2.0, 2.0, 2.0));
                ms.depth()
            })
        });
        assert_eq!(inner, 3);
        assert_eq!(stack.depth(), 1);
        assert!(close(&stack.current(), &Matrix4::identity()));
    }

    #[test]
    fn test_with_frame_clamps_unbalanced_pushes() {
        let mut stack = TransformStack::new();
        stack.with_frame(|ms| {
            ms.push();
            ms.push();
        });
        assert_eq!(stack.depth(), 1);
    }

    #[test]
    fn test_rotate_zero_axis_is_a_no_op() {
        let mut stack = TransformStack::new();
        stack.translate(Vector3::new(1.0, 2.0, 3.0));
        let before = stack.current();
        stack.rotate(90.0, Vector3::zeros());
        assert!(close(&stack.current(), &before));
    }
}
