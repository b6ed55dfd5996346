//! Texture atlas with skyline packing
//!
//! One fixed-size RGBA8 texture holds every glyph bitmap and decoded image
//! the renderer ever uploads, so the whole frame draws with a single texture
//! bind. Placement uses the skyline heuristic: the packer tracks the current
//! occupied height per x-run and places each block at the lowest (then
//! left-most) position it fits. Allocations are append-only; nothing is ever
//! freed, and a block that fits nowhere is an error for that resource.

/// Normalized UV rectangle into the atlas (u0, v0, u1, v1)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UvRect {
    pub u0: f32,
    pub v0: f32,
    pub u1: f32,
    pub v1: f32,
}

impl UvRect {
    pub fn to_array(self) -> [f32; 4] {
        [self.u0, self.v0, self.u1, self.v1]
    }
}

/// Atlas allocation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AtlasError {
    /// No skyline position can host a block of this size. Unrecoverable for
    /// this renderer instance: the atlas never resizes and never evicts.
    Full { width: u32, height: u32 },
    /// Pixel slice length does not match `width * height * 4`
    BadPixelData { expected: usize, actual: usize },
}

impl std::fmt::Display for AtlasError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AtlasError::Full { width, height } => {
                write!(f, "atlas full: no space for {}x{} block", width, height)
            }
            AtlasError::BadPixelData { expected, actual } => {
                write!(f, "bad pixel data: expected {} bytes, got {}", expected, actual)
            }
        }
    }
}

impl std::error::Error for AtlasError {}

/// One skyline segment: the occupied top is at height `y` between `x` and
/// `x + width`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SkylineNode {
    x: u32,
    y: u32,
    width: u32,
}

/// Pure skyline bin packer over a fixed `width x height` area
#[derive(Debug)]
pub struct SkylinePacker {
    width: u32,
    height: u32,
    nodes: Vec<SkylineNode>,
}

impl SkylinePacker {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            nodes: vec![SkylineNode { x: 0, y: 0, width }],
        }
    }

    /// Place a `w x h` block, returning its top-left corner, or `None` when
    /// nothing fits. Chooses minimum y, tie-broken by minimum x.
    pub fn pack(&mut self, w: u32, h: u32) -> Option<(u32, u32)> {
        if w == 0 || h == 0 || w > self.width || h > self.height {
            return None;
        }

        let mut best: Option<(u32, u32, usize)> = None; // (x, y, node index)
        for i in 0..self.nodes.len() {
            if let Some(y) = self.fit(i, w) {
                if y + h <= self.height {
                    let x = self.nodes[i].x;
                    let better = match best {
                        None => true,
                        Some((bx, by, _)) => y < by || (y == by && x < bx),
                    };
                    if better {
                        best = Some((x, y, i));
                    }
                }
            }
        }

        let (x, y, index) = best?;
        self.place(index, x, y, w, h);
        Some((x, y))
    }

    /// Candidate y for a block of width `w` starting at node `index`: the
    /// max height over every node the block's width spans, or `None` when
    /// the span runs past the atlas edge.
    fn fit(&self, index: usize, w: u32) -> Option<u32> {
        let x = self.nodes[index].x;
        if x + w > self.width {
            return None;
        }
        let mut y = 0;
        let mut remaining = w as i64;
        let mut i = index;
        while remaining > 0 {
            let node = self.nodes.get(i)?;
            y = y.max(node.y);
            remaining -= node.width as i64;
            i += 1;
        }
        Some(y)
    }

    /// Replace the covered span with one node at `y + h`, trimming the
    /// partially-overlapped neighbor, then merge equal-height runs.
    fn place(&mut self, index: usize, x: u32, y: u32, w: u32, h: u32) {
        self.nodes.insert(
            index,
            SkylineNode {
                x,
                y: y + h,
                width: w,
            },
        );

        let i = index + 1;
        while i < self.nodes.len() {
            let prev_end = self.nodes[i - 1].x + self.nodes[i - 1].width;
            if self.nodes[i].x >= prev_end {
                break;
            }
            let overlap = prev_end - self.nodes[i].x;
            if overlap >= self.nodes[i].width {
                self.nodes.remove(i);
            } else {
                self.nodes[i].x += overlap;
                self.nodes[i].width -= overlap;
                break;
            }
        }

        self.merge();
    }

    fn merge(&mut self) {
        let mut i = 0;
        while i + 1 < self.nodes.len() {
            if self.nodes[i].y == self.nodes[i + 1].y {
                self.nodes[i].width += self.nodes[i + 1].width;
                self.nodes.remove(i + 1);
            } else {
                i += 1;
            }
        }
    }
}

/// GPU atlas: skyline packer plus the backing texture.
///
/// A one-pixel gutter separates entries so linear sampling never bleeds a
/// neighbor.
pub struct AtlasAllocator {
    packer: SkylinePacker,
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    width: u32,
    height: u32,
}

const GUTTER: u32 = 1;

impl AtlasAllocator {
    pub const DEFAULT_SIZE: u32 = 2048;

    pub fn new(device: &wgpu::Device, size: u32) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Lumen Atlas"),
            size: wgpu::Extent3d {
                width: size,
                height: size,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        tracing::debug!("created {}x{} atlas texture", size, size);
        Self {
            packer: SkylinePacker::new(size, size),
            texture,
            view,
            width: size,
            height: size,
        }
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    /// Place an RGBA8 block and upload it, returning its normalized UVs
    pub fn insert(
        &mut self,
        queue: &wgpu::Queue,
        width: u32,
        height: u32,
        pixels: &[u8],
    ) -> Result<UvRect, AtlasError> {
        let expected = (width * height * 4) as usize;
        if pixels.len() != expected {
            return Err(AtlasError::BadPixelData {
                expected,
                actual: pixels.len(),
            });
        }

        let (x, y) = self
            .packer
            .pack(width + GUTTER, height + GUTTER)
            .ok_or(AtlasError::Full { width, height })?;

        queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d { x, y, z: 0 },
                aspect: wgpu::TextureAspect::All,
            },
            pixels,
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(width * 4),
                rows_per_image: Some(height),
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );

        Ok(self.uv_rect(x, y, width, height))
    }

    /// Expand an 8-bit coverage bitmap into all four RGBA channels and
    /// insert it. Used for glyph coverage masks sharing the RGBA atlas; the
    /// shader's text branch samples coverage from the red channel, so the
    /// background texels of a glyph rect must read as zero there, not as
    /// opaque white.
    pub fn insert_alpha(
        &mut self,
        queue: &wgpu::Queue,
        width: u32,
        height: u32,
        alpha: &[u8],
    ) -> Result<UvRect, AtlasError> {
        let expected = (width * height) as usize;
        if alpha.len() != expected {
            return Err(AtlasError::BadPixelData {
                expected,
                actual: alpha.len(),
            });
        }
        self.insert(queue, width, height, &expand_coverage(alpha))
    }

    fn uv_rect(&self, x: u32, y: u32, width: u32, height: u32) -> UvRect {
        UvRect {
            u0: x as f32 / self.width as f32,
            v0: y as f32 / self.height as f32,
            u1: (x + width) as f32 / self.width as f32,
            v1: (y + height) as f32 / self.height as f32,
        }
    }
}

/// Replicate one coverage byte per channel so a sample of any channel,
/// red included, reads true coverage
fn expand_coverage(alpha: &[u8]) -> Vec<u8> {
    let mut rgba = Vec::with_capacity(alpha.len() * 4);
    for &a in alpha {
        rgba.extend_from_slice(&[a, a, a, a]);
    }
    rgba
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_paint::Rect;

    fn rect_of(placement: (u32, u32), w: u32, h: u32) -> Rect {
        Rect::new(placement.0 as f32, placement.1 as f32, w as f32, h as f32)
    }

    fn overlaps(a: &Rect, b: &Rect) -> bool {
        !a.intersect(b).is_empty()
    }

    #[test]
    fn test_first_placement_is_origin() {
        let mut packer = SkylinePacker::new(256, 256);
        assert_eq!(packer.pack(64, 32), Some((0, 0)));
    }

    #[test]
    fn test_row_fills_left_to_right() {
        let mut packer = SkylinePacker::new(256, 256);
        assert_eq!(packer.pack(100, 10), Some((0, 0)));
        assert_eq!(packer.pack(100, 10), Some((100, 0)));
        // Remaining 56px strip at y=0 is still the lowest fitting level
        assert_eq!(packer.pack(56, 10), Some((200, 0)));
    }

    #[test]
    fn test_lowest_then_leftmost() {
        let mut packer = SkylinePacker::new(100, 100);
        packer.pack(50, 20).unwrap(); // (0,0) height 20
        packer.pack(50, 10).unwrap(); // (50,0) height 10
        // Lowest valid position for a 40-wide block is on the right strip
        assert_eq!(packer.pack(40, 10), Some((50, 10)));
        // Next one of width 60 spans both strips: y = max(20, 20) = 20; the
        // left-most fitting x wins
        assert_eq!(packer.pack(60, 10), Some((0, 20)));
    }

    #[test]
    fn test_no_overlap_across_random_sequence() {
        let mut packer = SkylinePacker::new(512, 512);
        // Deterministic pseudo-random sizes
        let mut seed: u32 = 0x2F6E2B1;
        let mut next = move || {
            seed = seed.wrapping_mul(1664525).wrapping_add(1013904223);
            seed
        };

        let mut placed: Vec<Rect> = Vec::new();
        for _ in 0..200 {
            let w = next() % 60 + 1;
            let h = next() % 40 + 1;
            if let Some(pos) = packer.pack(w, h) {
                let rect = rect_of(pos, w, h);
                for other in &placed {
                    assert!(
                        !overlaps(&rect, other),
                        "{:?} overlaps {:?}",
                        rect,
                        other
                    );
                }
                assert!(pos.0 + w <= 512 && pos.1 + h <= 512);
                placed.push(rect);
            }
        }
        assert!(placed.len() > 100, "packer rejected too many placements");
    }

    #[test]
    fn test_exhaustion_is_explicit() {
        let mut packer = SkylinePacker::new(64, 64);
        assert!(packer.pack(64, 64).is_some());
        assert_eq!(packer.pack(1, 1), None);
    }

    #[test]
    fn test_oversized_rejected() {
        let mut packer = SkylinePacker::new(64, 64);
        assert_eq!(packer.pack(65, 1), None);
        assert_eq!(packer.pack(1, 65), None);
        assert_eq!(packer.pack(0, 10), None);
    }

    #[test]
    fn test_merge_bounds_node_growth() {
        let mut packer = SkylinePacker::new(128, 128);
        // Four blocks of equal height collapse back into one skyline node
        for _ in 0..4 {
            packer.pack(32, 16).unwrap();
        }
        assert_eq!(packer.nodes.len(), 1);
        assert_eq!(packer.nodes[0], SkylineNode { x: 0, y: 16, width: 128 });
    }

    #[test]
    fn test_coverage_expansion_fills_every_channel() {
        // The text shader samples coverage from the red channel: background
        // texels of a glyph bitmap must expand to zero there, not to white.
        let rgba = expand_coverage(&[0, 128, 255]);
        assert_eq!(
            rgba,
            vec![0, 0, 0, 0, 128, 128, 128, 128, 255, 255, 255, 255]
        );
    }
}
