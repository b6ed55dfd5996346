//! Scissor/clip stack
//!
//! Clipping is realized with the hardware scissor rect, one per draw
//! segment, so every push/pop is a flush point (the batch module enforces
//! that). Rectangles are stored in device pixels; the UI-to-device
//! conversion (pixel ratio) happens once at push time, not per draw.
//!
//! Depth is capped at [`ScissorStack::MAX_DEPTH`]. Pushing past the cap is
//! clamped and logged rather than silently corrupting the stack; popping an
//! empty stack degrades to "clipping disabled".

use lumen_paint::Rect;
use smallvec::SmallVec;

/// Nesting depth bound. UI trees deeper than this in clipped containers are
/// a caller bug; pushes past it keep the top entry.
pub const MAX_DEPTH: usize = 16;

#[derive(Debug, Default)]
pub struct ScissorStack {
    stack: SmallVec<[Rect; MAX_DEPTH]>,
}

impl ScissorStack {
    pub const MAX_DEPTH: usize = MAX_DEPTH;

    pub fn new() -> Self {
        Self::default()
    }

    /// The active clip rect in device pixels, or `None` when clipping is
    /// disabled
    pub fn current(&self) -> Option<&Rect> {
        self.stack.last()
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Push an exact clip rect (device pixels). Containment within the
    /// parent is the caller's responsibility.
    pub fn push(&mut self, rect: Rect) {
        if self.stack.len() >= MAX_DEPTH {
            tracing::error!(
                "scissor stack depth {} exceeded, clamping push",
                MAX_DEPTH
            );
            return;
        }
        self.stack.push(rect);
    }

    /// Push a clip rect clamped against the current top; behaves as a plain
    /// push when the stack is empty
    pub fn push_intersecting(&mut self, rect: Rect) {
        let clipped = match self.current() {
            Some(parent) => parent.intersect(&rect),
            None => rect,
        };
        self.push(clipped);
    }

    /// Restore the previous clip, or disable clipping when the stack
    /// empties. Popping an empty stack is a silent no-op by design.
    pub fn pop(&mut self) {
        self.stack.pop();
    }

    pub fn reset(&mut self) {
        self.stack.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_stack_means_no_clip() {
        let stack = ScissorStack::new();
        assert!(stack.current().is_none());
    }

    #[test]
    fn test_intersecting_push_is_contained_in_all_ancestors() {
        let mut stack = ScissorStack::new();
        let rects = [
            Rect::new(0.0, 0.0, 500.0, 500.0),
            Rect::new(100.0, 50.0, 600.0, 300.0),
            Rect::new(50.0, 100.0, 300.0, 600.0),
            Rect::new(120.0, 120.0, 40.0, 40.0),
        ];
        let mut ancestors: Vec<Rect> = Vec::new();
        for rect in rects {
            stack.push_intersecting(rect);
            let top = *stack.current().unwrap();
            for ancestor in &ancestors {
                assert!(
                    ancestor.contains_rect(&top) || top.is_empty(),
                    "{:?} escapes ancestor {:?}",
                    top,
                    ancestor
                );
            }
            ancestors.push(top);
        }
    }

    #[test]
    fn test_pop_restores_exact_previous() {
        let mut stack = ScissorStack::new();
        stack.push(Rect::new(0.0, 0.0, 100.0, 100.0));
        stack.push_intersecting(Rect::new(10.0, 10.0, 50.0, 50.0));
        stack.push_intersecting(Rect::new(20.0, 20.0, 10.0, 10.0));

        stack.pop();
        assert_eq!(*stack.current().unwrap(), Rect::new(10.0, 10.0, 50.0, 50.0));
        stack.pop();
        assert_eq!(*stack.current().unwrap(), Rect::new(0.0, 0.0, 100.0, 100.0));
        stack.pop();
        assert!(stack.current().is_none());
    }

    #[test]
    fn test_pop_empty_is_noop() {
        let mut stack = ScissorStack::new();
        stack.pop();
        assert!(stack.current().is_none());
    }

    #[test]
    fn test_depth_cap_keeps_top() {
        let mut stack = ScissorStack::new();
        for i in 0..(MAX_DEPTH + 4) {
            stack.push(Rect::new(i as f32, 0.0, 10.0, 10.0));
        }
        assert_eq!(stack.depth(), MAX_DEPTH);
        assert_eq!(
            *stack.current().unwrap(),
            Rect::new((MAX_DEPTH - 1) as f32, 0.0, 10.0, 10.0)
        );
    }

    #[test]
    fn test_disjoint_intersecting_push_is_empty() {
        let mut stack = ScissorStack::new();
        stack.push(Rect::new(0.0, 0.0, 10.0, 10.0));
        stack.push_intersecting(Rect::new(100.0, 100.0, 10.0, 10.0));
        assert!(stack.current().unwrap().is_empty());
    }
}
