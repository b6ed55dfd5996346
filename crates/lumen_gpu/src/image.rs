//! GPU-side image store
//!
//! Registration is cheap and lazy: `register` only records the source.
//! Decoding and the atlas upload happen on `init`, which is idempotent, so
//! callers can pre-warm images or let the first draw pay the cost. Under
//! `ImagePolicy::Fallback` a failed decode resolves to a small checkerboard
//! placeholder instead of an error.

use crate::atlas::{AtlasAllocator, AtlasError, UvRect};
use lumen_image::{placeholder_image, ImageData, ImageError, ImagePolicy, ImageSource};
use slotmap::SlotMap;

slotmap::new_key_type! {
    /// Handle to a registered image
    pub struct ImageId;
}

#[derive(Debug)]
pub enum ImageStoreError {
    Unknown(ImageId),
    Decode(ImageError),
    Atlas(AtlasError),
}

impl std::fmt::Display for ImageStoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unknown(id) => write!(f, "unknown image {:?}", id),
            Self::Decode(e) => write!(f, "image decode failed: {}", e),
            Self::Atlas(e) => write!(f, "image upload failed: {}", e),
        }
    }
}

impl std::error::Error for ImageStoreError {}

/// Atlas placement of a decoded image
#[derive(Debug, Clone, Copy)]
pub struct ImagePlacement {
    pub uv: UvRect,
    pub width: u32,
    pub height: u32,
}

enum ImageEntry {
    Pending(ImageSource),
    Ready(ImagePlacement),
}

pub struct ImageStore {
    images: SlotMap<ImageId, ImageEntry>,
    policy: ImagePolicy,
}

impl ImageStore {
    pub fn new(policy: ImagePolicy) -> Self {
        Self {
            images: SlotMap::with_key(),
            policy,
        }
    }

    /// Record an image source without decoding it
    pub fn register(&mut self, source: ImageSource) -> ImageId {
        self.images.insert(ImageEntry::Pending(source))
    }

    /// Drop an image handle. Atlas space is not reclaimed.
    pub fn delete(&mut self, id: ImageId) {
        if self.images.remove(id).is_some() {
            tracing::debug!("deleted image {:?}", id);
        }
    }

    /// Decode and upload `id` if it has not been initialized yet, returning
    /// its atlas placement
    pub fn ensure(
        &mut self,
        id: ImageId,
        queue: &wgpu::Queue,
        atlas: &mut AtlasAllocator,
    ) -> Result<ImagePlacement, ImageStoreError> {
        let entry = self.images.get_mut(id).ok_or(ImageStoreError::Unknown(id))?;

        let source = match entry {
            ImageEntry::Ready(placement) => return Ok(*placement),
            ImageEntry::Pending(source) => source,
        };
        let data = match ImageData::load(source) {
            Ok(data) => data,
            Err(e) if self.policy == ImagePolicy::Fallback => {
                tracing::warn!(
                    "image load failed for {}, using placeholder: {}",
                    source.describe(),
                    e
                );
                placeholder_image()
            }
            Err(e) => return Err(ImageStoreError::Decode(e)),
        };

        let placement = upload(queue, atlas, &data)?;
        *entry = ImageEntry::Ready(placement);
        Ok(placement)
    }
}

fn upload(
    queue: &wgpu::Queue,
    atlas: &mut AtlasAllocator,
    data: &ImageData,
) -> Result<ImagePlacement, ImageStoreError> {
    let uv = atlas
        .insert(queue, data.width, data.height, &data.pixels)
        .map_err(ImageStoreError::Atlas)?;
    Ok(ImagePlacement {
        uv,
        width: data.width,
        height: data.height,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_is_lazy_and_handles_are_distinct() {
        let mut store = ImageStore::new(ImagePolicy::Strict);
        // Garbage bytes: registration must not decode
        let a = store.register(ImageSource::bytes(vec![0u8; 4]));
        let b = store.register(ImageSource::bytes(vec![0u8; 4]));
        assert_ne!(a, b);
    }

    #[test]
    fn test_delete_is_idempotent() {
        let mut store = ImageStore::new(ImagePolicy::Strict);
        let id = store.register(ImageSource::bytes(vec![0u8; 4]));
        store.delete(id);
        store.delete(id);
        assert!(store.images.get(id).is_none());
    }
}
