//! GPU-side font store
//!
//! Owns the registered fonts and the memoized `(font, size bucket)` atlas
//! entries. Rasterization happens once per bucket on first use; draw-time
//! lookups only scale cached metrics. Deleting a font drops its CPU-side
//! entries but never reclaims atlas space.

use crate::atlas::AtlasAllocator;
use lumen_text::registry::FontPolicy;
use lumen_text::{size_bucket, Font, FontAtlas, FontRegistry, GlyphRasterizer, TextError};
use rustc_hash::FxHashMap;
use slotmap::SlotMap;
use std::sync::Arc;

slotmap::new_key_type! {
    /// Handle to a registered font
    pub struct FontId;
}

pub struct FontStore {
    registry: FontRegistry,
    rasterizer: GlyphRasterizer,
    fonts: SlotMap<FontId, Arc<Font>>,
    atlases: FxHashMap<(FontId, u32), FontAtlas>,
}

impl FontStore {
    pub fn new(policy: FontPolicy) -> Self {
        Self {
            registry: FontRegistry::new(policy),
            rasterizer: GlyphRasterizer::new(),
            fonts: SlotMap::with_key(),
            atlases: FxHashMap::default(),
        }
    }

    pub fn register_bytes(&mut self, data: Vec<u8>) -> Result<FontId, TextError> {
        let font = self.registry.load_bytes(data)?;
        Ok(self.fonts.insert(font))
    }

    pub fn register_family(&mut self, name: &str) -> Result<FontId, TextError> {
        let font = self.registry.load_family(name)?;
        Ok(self.fonts.insert(font))
    }

    pub fn register_default(&mut self) -> Result<FontId, TextError> {
        let font = self.registry.default_font()?;
        Ok(self.fonts.insert(font))
    }

    /// Drop a font and its cached atlas entries. Atlas texture space stays
    /// allocated; only the CPU-side handles go away.
    pub fn delete(&mut self, id: FontId) {
        if self.fonts.remove(id).is_some() {
            self.atlases.retain(|(font, _), _| *font != id);
            tracing::debug!("deleted font {:?}", id);
        }
    }

    /// The atlas entry for `(id, bucket(size))`, building it on first use
    pub fn atlas(
        &mut self,
        id: FontId,
        pixel_size: f32,
        queue: &wgpu::Queue,
        atlas: &mut AtlasAllocator,
    ) -> Result<&FontAtlas, TextError> {
        let bucket = size_bucket(pixel_size);
        let key = (id, bucket);

        if !self.atlases.contains_key(&key) {
            let font = self
                .fonts
                .get(id)
                .cloned()
                .ok_or_else(|| TextError::FontLoadError(format!("unknown font {:?}", id)))?;

            let mut insert = |w: u32, h: u32, alpha: &[u8]| {
                atlas
                    .insert_alpha(queue, w, h, alpha)
                    .map(|uv| uv.to_array())
                    .map_err(|e| tracing::error!("glyph upload failed: {}", e))
                    .ok()
            };
            let built = FontAtlas::build(&font, &mut self.rasterizer, bucket as f32, &mut insert)?;
            self.atlases.insert(key, built);
        }

        Ok(&self.atlases[&key])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strict_register_rejects_garbage() {
        let mut store = FontStore::new(FontPolicy::Strict);
        assert!(store.register_bytes(vec![0u8; 16]).is_err());
    }

    #[test]
    fn test_delete_is_idempotent() {
        let mut store = FontStore::new(FontPolicy::Strict);
        let id = match store.register_default() {
            Ok(id) => id,
            // Headless CI images may ship no fonts at all
            Err(_) => return,
        };
        store.delete(id);
        store.delete(id);
        assert!(store.fonts.get(id).is_none());
    }
}
