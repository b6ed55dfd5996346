//! Per-frame batching and the flush protocol
//!
//! [`FrameState`] is the CPU side of the renderer: an instance arena plus
//! the state that must stay constant within one draw call (transform,
//! scissor). Drawing calls append instance records; any state change, or
//! hitting [`MAX_BATCH`], closes the open run of instances into a
//! [`Segment`]. At frame end the renderer uploads the arena once and replays
//! each segment as one instanced draw with that segment's transform uniform
//! and scissor rect.
//!
//! Arenas are retained across frames (cursor reset at `begin`), so steady
//! state does no per-frame allocation.

use crate::primitives::{self, encode_radii, kind, GpuInstance, MAX_BATCH};
use crate::scissor::ScissorStack;
use lumen_paint::{Color, CornerRadii, FillStyle, Rect, Transform2D};
use smallvec::SmallVec;
use std::ops::Range;

/// Transform save/restore nesting bound
pub const MAX_TRANSFORM_DEPTH: usize = 32;

/// One closed run of instances drawn under a single (transform, scissor)
/// state
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub range: Range<u32>,
    pub transform: Transform2D,
    /// Active clip in device pixels, `None` when clipping is disabled
    pub scissor: Option<Rect>,
}

/// Per-frame drawing state and instance arena
pub struct FrameState {
    instances: Vec<GpuInstance>,
    segments: Vec<Segment>,
    segment_start: usize,

    transform: Transform2D,
    transform_stack: SmallVec<[Transform2D; 8]>,
    scissors: ScissorStack,
    alpha_cap: f32,

    width: f32,
    height: f32,
    pixel_ratio: f32,
}

impl FrameState {
    pub fn new() -> Self {
        Self {
            instances: Vec::new(),
            segments: Vec::new(),
            segment_start: 0,
            transform: Transform2D::identity(),
            transform_stack: SmallVec::new(),
            scissors: ScissorStack::new(),
            alpha_cap: 1.0,
            width: 0.0,
            height: 0.0,
            pixel_ratio: 1.0,
        }
    }

    /// Reset all per-frame state. Arena capacity is kept.
    pub fn begin(&mut self, width: f32, height: f32, pixel_ratio: f32) {
        self.instances.clear();
        self.segments.clear();
        self.segment_start = 0;
        self.transform = Transform2D::identity();
        self.transform_stack.clear();
        self.scissors.reset();
        self.alpha_cap = 1.0;
        self.width = width;
        self.height = height;
        self.pixel_ratio = pixel_ratio;
    }

    /// Close the frame: final flush, then hand out the recorded segments
    pub fn end(&mut self) {
        self.flush();
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn instances(&self) -> &[GpuInstance] {
        &self.instances
    }

    pub fn pixel_ratio(&self) -> f32 {
        self.pixel_ratio
    }

    /// Device-pixel frame size
    pub fn device_size(&self) -> (f32, f32) {
        (self.width * self.pixel_ratio, self.height * self.pixel_ratio)
    }

    fn pending(&self) -> usize {
        self.instances.len() - self.segment_start
    }

    /// Close the open instance run into a segment. No-op with zero pending.
    pub fn flush(&mut self) {
        if self.pending() == 0 {
            return;
        }
        self.segments.push(Segment {
            range: self.segment_start as u32..self.instances.len() as u32,
            transform: self.transform,
            scissor: self.scissors.current().copied(),
        });
        self.segment_start = self.instances.len();
    }

    fn push_instance(&mut self, instance: GpuInstance) {
        if self.pending() >= MAX_BATCH {
            self.flush();
        }
        self.instances.push(instance);
    }

    // === Transform stack ===

    /// Save the current transform. Never flushes: saving changes nothing
    /// about how already-batched instances draw.
    pub fn push(&mut self) {
        // Saving identity onto an empty stack is skippable: the matching pop
        // finds the stack empty and degrades to identity anyway. Only valid
        // at depth zero, or pops would pair with the wrong entries.
        if self.transform_stack.is_empty() && self.transform.is_identity() {
            return;
        }
        if self.transform_stack.len() >= MAX_TRANSFORM_DEPTH {
            debug_assert!(false, "transform stack overflow");
            tracing::error!(
                "transform stack depth {} exceeded, push ignored",
                MAX_TRANSFORM_DEPTH
            );
            return;
        }
        self.transform_stack.push(self.transform);
    }

    /// Restore the previously saved transform, flushing anything batched
    /// under the current one first. Popping with nothing saved degrades to
    /// the identity transform.
    pub fn pop(&mut self) {
        let restored = self
            .transform_stack
            .pop()
            .unwrap_or_else(Transform2D::identity);
        if restored != self.transform {
            self.flush();
            self.transform = restored;
        }
    }

    fn apply_transform(&mut self, op: Transform2D) {
        self.flush();
        self.transform.concat(&op);
    }

    pub fn translate(&mut self, x: f32, y: f32) {
        self.apply_transform(Transform2D::translation(x, y));
    }

    pub fn scale(&mut self, sx: f32, sy: f32) {
        self.apply_transform(Transform2D::scaling(sx, sy));
    }

    pub fn rotate(&mut self, angle: f32) {
        self.apply_transform(Transform2D::rotation(angle));
    }

    pub fn skew_x(&mut self, angle: f32) {
        self.apply_transform(Transform2D::skew_x(angle));
    }

    pub fn skew_y(&mut self, angle: f32) {
        self.apply_transform(Transform2D::skew_y(angle));
    }

    pub fn current_transform(&self) -> &Transform2D {
        &self.transform
    }

    // === Scissor stack ===

    /// UI-space rect to device pixels; the conversion happens once here,
    /// at push time
    fn to_device(&self, x: f32, y: f32, w: f32, h: f32) -> Rect {
        Rect::new(
            x * self.pixel_ratio,
            y * self.pixel_ratio,
            w * self.pixel_ratio,
            h * self.pixel_ratio,
        )
    }

    pub fn push_scissor(&mut self, x: f32, y: f32, w: f32, h: f32) {
        let device = self.to_device(x, y, w, h);
        // Re-pushing the active clip changes nothing; skip the flush but
        // still push so the matching pop stays balanced.
        if self.scissors.current() != Some(&device) {
            self.flush();
        }
        self.scissors.push(device);
    }

    pub fn push_scissor_intersecting(&mut self, x: f32, y: f32, w: f32, h: f32) {
        let device = self.to_device(x, y, w, h);
        let clipped = match self.scissors.current() {
            Some(parent) => parent.intersect(&device),
            None => device,
        };
        if self.scissors.current() != Some(&clipped) {
            self.flush();
        }
        self.scissors.push(clipped);
    }

    pub fn pop_scissor(&mut self) {
        if self.scissors.depth() == 0 {
            return;
        }
        self.flush();
        self.scissors.pop();
    }

    pub fn scissor(&self) -> Option<&Rect> {
        self.scissors.current()
    }

    // === Global alpha ===

    /// Cap the alpha of everything drawn after this call. Applied at record
    /// time, so it needs no flush.
    pub fn global_alpha(&mut self, alpha: f32) {
        self.alpha_cap = alpha.clamp(0.0, 1.0);
    }

    pub fn alpha_cap(&self) -> f32 {
        self.alpha_cap
    }

    // === Drawing ===

    fn finite(values: &[f32]) -> bool {
        values.iter().all(|v| v.is_finite())
    }

    /// Filled (optionally rounded) rectangle with a solid or gradient fill
    pub fn rect(&mut self, x: f32, y: f32, w: f32, h: f32, style: &FillStyle, radii: CornerRadii) {
        if !Self::finite(&[x, y, w, h]) {
            tracing::warn!("rect with non-finite geometry ignored");
            return;
        }
        if style.is_transparent() {
            return;
        }
        let (kind_value, color0, color1, uv) = primitives::resolve_fill(style, self.alpha_cap);
        if color0[3] <= 0.0 && color1[3] <= 0.0 {
            return; // fully transparent after the alpha cap: still a valid no-op
        }
        self.push_instance(GpuInstance {
            bounds: [x, y, w, h],
            radii: encode_radii(&radii),
            color0,
            color1,
            uv,
            kind: [kind_value, 0.0, 0.0, 0.0],
        });
    }

    /// Hollow (stroked) rectangle; the stroke width rides in the kind
    /// discriminant
    pub fn hollow_rect(
        &mut self,
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        line_width: f32,
        color: Color,
        radii: CornerRadii,
    ) {
        if !Self::finite(&[x, y, w, h, line_width]) || line_width <= 0.0 {
            tracing::warn!("hollow_rect with invalid geometry ignored");
            return;
        }
        let color = color.capped(self.alpha_cap);
        if color.is_transparent() {
            return;
        }
        self.push_instance(
            GpuInstance::new([x, y, w, h], line_width)
                .with_radii(&radii)
                .with_color(color),
        );
    }

    /// Axis-aligned line, drawn as a degenerate zero-radius filled rect.
    /// Diagonal lines are not supported and are ignored with a warning.
    pub fn line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, color: Color, width: f32) {
        if !Self::finite(&[x1, y1, x2, y2, width]) || width <= 0.0 {
            tracing::warn!("line with invalid geometry ignored");
            return;
        }
        let half = width / 2.0;
        let (x, y, w, h) = if y1 == y2 {
            let x0 = x1.min(x2);
            (x0, y1 - half, (x2 - x1).abs(), width)
        } else if x1 == x2 {
            let y0 = y1.min(y2);
            (x1 - half, y0, width, (y2 - y1).abs())
        } else {
            tracing::warn!("diagonal lines are unsupported, line ignored");
            return;
        };
        self.rect(x, y, w, h, &FillStyle::Color(color), CornerRadii::ZERO);
    }

    /// Drop shadow around a (rounded) rect: spread and blur ride in the uv
    /// block
    #[allow(clippy::too_many_arguments)]
    pub fn drop_shadow(
        &mut self,
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        blur: f32,
        spread: f32,
        color: Color,
        radii: CornerRadii,
    ) {
        if !Self::finite(&[x, y, w, h, blur, spread]) {
            tracing::warn!("drop_shadow with non-finite geometry ignored");
            return;
        }
        let color = color.capped(self.alpha_cap);
        if color.is_transparent() {
            return;
        }
        self.push_instance(
            GpuInstance::new([x, y, w, h], kind::DROP_SHADOW)
                .with_radii(&radii)
                .with_color(color)
                .with_uv([spread, blur.max(0.0), 0.0, 0.0]),
        );
    }

    /// One text glyph quad sampling the atlas red channel as coverage
    pub fn glyph(&mut self, x: f32, y: f32, w: f32, h: f32, uv: [f32; 4], color: Color) {
        let color = color.capped(self.alpha_cap);
        if color.is_transparent() || w <= 0.0 || h <= 0.0 {
            return;
        }
        self.push_instance(
            GpuInstance::new([x, y, w, h], kind::TEXT)
                .with_color(color)
                .with_uv(uv),
        );
    }

    /// Textured rectangle sampling an atlas region, tinted by `mask`
    #[allow(clippy::too_many_arguments)]
    pub fn image_rect(
        &mut self,
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        uv: [f32; 4],
        mask: Color,
        radii: CornerRadii,
    ) {
        if !Self::finite(&[x, y, w, h]) {
            tracing::warn!("image with non-finite geometry ignored");
            return;
        }
        let mask = mask.capped(self.alpha_cap);
        if mask.is_transparent() {
            return;
        }
        self.push_instance(
            GpuInstance::new([x, y, w, h], kind::FILL)
                .with_radii(&radii)
                .with_color(mask)
                .with_uv(uv),
        );
    }
}

impl Default for FrameState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::RADII_RECT_SENTINEL;

    fn frame() -> FrameState {
        let mut f = FrameState::new();
        f.begin(800.0, 600.0, 1.0);
        f
    }

    fn red() -> FillStyle {
        FillStyle::Color(Color::RED)
    }

    #[test]
    fn test_filled_rounded_rect_encoding() {
        let mut f = frame();
        f.rect(10.0, 10.0, 100.0, 50.0, &red(), CornerRadii::uniform(8.0));
        f.end();

        assert_eq!(f.instances().len(), 1);
        let inst = &f.instances()[0];
        assert_eq!(inst.bounds, [10.0, 10.0, 100.0, 50.0]);
        assert_eq!(inst.radii, [8.0, 8.0, 8.0, 8.0]);
        assert_eq!(inst.kind(), kind::FILL);
        assert_eq!(inst.color0, [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(f.segments().len(), 1);
    }

    #[test]
    fn test_hollow_zero_radius_takes_rect_sentinel() {
        let mut f = frame();
        f.hollow_rect(0.0, 0.0, 50.0, 50.0, 2.0, Color::BLACK, CornerRadii::ZERO);
        f.end();

        let inst = &f.instances()[0];
        assert_eq!(inst.kind(), 2.0);
        assert_eq!(inst.radii[1], RADII_RECT_SENTINEL);
    }

    #[test]
    fn test_flush_count_is_ceil_of_capacity() {
        let mut f = frame();
        let count = MAX_BATCH * 2 + 1;
        for i in 0..count {
            f.rect(i as f32, 0.0, 1.0, 1.0, &red(), CornerRadii::ZERO);
        }
        f.end();

        assert_eq!(f.instances().len(), count);
        assert_eq!(f.segments().len(), 3); // ceil((2*MAX+1) / MAX)

        // Segments partition the arena in order
        let mut expected_start = 0u32;
        for segment in f.segments() {
            assert_eq!(segment.range.start, expected_start);
            expected_start = segment.range.end;
        }
        assert_eq!(expected_start as usize, count);

        // Issue order is preserved
        for (i, inst) in f.instances().iter().enumerate() {
            assert_eq!(inst.bounds[0], i as f32);
        }
    }

    #[test]
    fn test_transparent_draw_is_noop() {
        let mut f = frame();
        f.rect(
            0.0,
            0.0,
            10.0,
            10.0,
            &FillStyle::Color(Color::TRANSPARENT),
            CornerRadii::ZERO,
        );
        f.end();
        assert!(f.instances().is_empty());
        assert!(f.segments().is_empty());
    }

    #[test]
    fn test_transparent_gradient_draw_is_noop() {
        use lumen_paint::{Gradient, Point};

        let mut f = frame();
        // Both endpoints transparent: skipped before fill resolution
        let g = Gradient::linear(
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Color::RED.with_alpha(0.0),
            Color::TRANSPARENT,
        );
        f.rect(0.0, 0.0, 10.0, 10.0, &FillStyle::Gradient(g), CornerRadii::ZERO);
        f.end();
        assert!(f.instances().is_empty());
    }

    #[test]
    fn test_alpha_cap_round_trip() {
        let mut f = frame();
        f.global_alpha(0.5);
        f.rect(
            0.0,
            0.0,
            10.0,
            10.0,
            &FillStyle::Color(Color::RED.with_alpha(0.9)),
            CornerRadii::ZERO,
        );
        f.global_alpha(1.0);
        f.rect(
            0.0,
            0.0,
            10.0,
            10.0,
            &FillStyle::Color(Color::RED.with_alpha(0.9)),
            CornerRadii::ZERO,
        );
        f.end();

        assert_eq!(f.instances()[0].color0[3], 0.5);
        assert_eq!(f.instances()[1].color0[3], 0.9);
    }

    #[test]
    fn test_zero_alpha_cap_suppresses_everything() {
        let mut f = frame();
        f.global_alpha(0.0);
        f.rect(0.0, 0.0, 10.0, 10.0, &red(), CornerRadii::ZERO);
        f.end();
        assert!(f.instances().is_empty());
    }

    #[test]
    fn test_transform_push_pop_restores_bit_identical() {
        let mut f = frame();
        f.translate(3.7, -1.2);
        f.rotate(0.31);
        let saved = *f.current_transform();

        f.push();
        f.translate(10.0, 20.0);
        f.scale(2.0, 0.5);
        f.rotate(1.0);
        f.pop();

        // Bit-identical: no renormalization happens anywhere
        assert_eq!(*f.current_transform(), saved);
    }

    #[test]
    fn test_transform_change_forces_flush() {
        let mut f = frame();
        f.rect(0.0, 0.0, 10.0, 10.0, &red(), CornerRadii::ZERO);
        f.translate(5.0, 5.0);
        f.rect(0.0, 0.0, 10.0, 10.0, &red(), CornerRadii::ZERO);
        f.end();

        assert_eq!(f.segments().len(), 2);
        assert!(f.segments()[0].transform.is_identity());
        assert_eq!(
            f.segments()[1].transform,
            Transform2D::translation(5.0, 5.0)
        );
    }

    #[test]
    fn test_push_pop_without_change_does_not_flush() {
        let mut f = frame();
        f.rect(0.0, 0.0, 10.0, 10.0, &red(), CornerRadii::ZERO);
        f.push();
        f.pop();
        f.rect(0.0, 0.0, 10.0, 10.0, &red(), CornerRadii::ZERO);
        f.end();
        assert_eq!(f.segments().len(), 1);
    }

    #[test]
    fn test_identity_push_at_depth_zero_still_pairs_with_pop() {
        let mut f = frame();
        f.push();
        f.translate(5.0, 5.0);
        f.pop();
        assert!(f.current_transform().is_identity());
    }

    #[test]
    fn test_pop_on_empty_degrades_to_identity() {
        let mut f = frame();
        f.translate(5.0, 5.0);
        f.pop();
        assert!(f.current_transform().is_identity());
    }

    #[test]
    fn test_scissor_change_forces_flush_and_records_device_px() {
        let mut f = FrameState::new();
        f.begin(800.0, 600.0, 2.0);
        f.rect(0.0, 0.0, 10.0, 10.0, &red(), CornerRadii::ZERO);
        f.push_scissor(10.0, 10.0, 100.0, 100.0);
        f.rect(0.0, 0.0, 10.0, 10.0, &red(), CornerRadii::ZERO);
        f.pop_scissor();
        f.end();

        assert_eq!(f.segments().len(), 2);
        assert_eq!(f.segments()[0].scissor, None);
        // Pixel ratio 2: converted at push time
        assert_eq!(
            f.segments()[1].scissor,
            Some(Rect::new(20.0, 20.0, 200.0, 200.0))
        );
    }

    #[test]
    fn test_duplicate_scissor_push_skips_flush() {
        let mut f = frame();
        f.push_scissor(0.0, 0.0, 100.0, 100.0);
        f.rect(0.0, 0.0, 10.0, 10.0, &red(), CornerRadii::ZERO);
        f.push_scissor(0.0, 0.0, 100.0, 100.0);
        f.rect(0.0, 0.0, 10.0, 10.0, &red(), CornerRadii::ZERO);
        f.end();
        assert_eq!(f.segments().len(), 1);
    }

    #[test]
    fn test_line_decomposes_to_degenerate_rect() {
        let mut f = frame();
        f.line(10.0, 20.0, 110.0, 20.0, Color::BLACK, 4.0);
        f.line(50.0, 0.0, 50.0, 80.0, Color::BLACK, 2.0);
        f.line(0.0, 0.0, 10.0, 10.0, Color::BLACK, 1.0); // diagonal: ignored
        f.end();

        assert_eq!(f.instances().len(), 2);
        assert_eq!(f.instances()[0].bounds, [10.0, 18.0, 100.0, 4.0]);
        assert_eq!(f.instances()[0].radii[1], RADII_RECT_SENTINEL);
        assert_eq!(f.instances()[1].bounds, [49.0, 0.0, 2.0, 80.0]);
    }

    #[test]
    fn test_non_finite_geometry_ignored() {
        let mut f = frame();
        f.rect(f32::NAN, 0.0, 10.0, 10.0, &red(), CornerRadii::ZERO);
        f.rect(0.0, f32::INFINITY, 10.0, 10.0, &red(), CornerRadii::ZERO);
        f.end();
        assert!(f.instances().is_empty());
    }

    #[test]
    fn test_begin_resets_state_keeps_capacity() {
        let mut f = frame();
        f.global_alpha(0.2);
        f.translate(1.0, 1.0);
        f.push_scissor(0.0, 0.0, 10.0, 10.0);
        f.rect(0.0, 0.0, 10.0, 10.0, &red(), CornerRadii::ZERO);
        f.end();

        f.begin(400.0, 300.0, 1.0);
        assert!(f.instances().is_empty());
        assert!(f.segments().is_empty());
        assert!(f.current_transform().is_identity());
        assert!(f.scissor().is_none());
        assert_eq!(f.alpha_cap(), 1.0);
    }

    #[test]
    fn test_drop_shadow_encoding() {
        let mut f = frame();
        f.drop_shadow(
            10.0,
            10.0,
            100.0,
            50.0,
            8.0,
            2.0,
            Color::BLACK.with_alpha(0.4),
            CornerRadii::uniform(6.0),
        );
        f.end();

        let inst = &f.instances()[0];
        assert_eq!(inst.kind(), kind::DROP_SHADOW);
        assert_eq!(inst.uv[0], 2.0); // spread
        assert_eq!(inst.uv[1], 8.0); // blur
    }
}
