//! Id-keyed cache of images pushed to the terminal
//!
//! An id moves absent -> transmitted -> absent (deleted). Transmitting a
//! present id is a no-op; displaying an absent id is a state error.

use std::collections::BTreeMap;

use crate::errors::{RenderError, Result};

/// Bytes per RGBA pixel
pub const RGBA_BYTES: usize = 4;

/// What the terminal holds for one image id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedImage {
    pub width: u32,
    pub height: u32,
    /// Base64 text as sent (raw RGBA or PNG, depending on the backend)
    pub payload: String,
}

#[derive(Debug, Default)]
pub struct ImageCache {
    entries: BTreeMap<u32, CachedImage>,
}

impl ImageCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: u32) -> bool {
        self.entries.contains_key(&id)
    }

    /// The transmitted image, or a state error
    pub fn get(&self, id: u32) -> Result<&CachedImage> {
        self.entries
            .get(&id)
            .ok_or_else(|| RenderError::invalid_state(format!("image {id} has not been transmitted")))
    }

    /// Record a transmitted image; false when `id` was already present
    pub fn insert(&mut self, id: u32, image: CachedImage) -> bool {
        if self.entries.contains_key(&id) {
            return false;
        }
        self.entries.insert(id, image);
        true
    }

    pub fn remove(&mut self, id: u32) -> Option<CachedImage> {
        self.entries.remove(&id)
    }

    /// Cached ids in ascending order
    pub fn ids(&self) -> Vec<u32> {
        self.entries.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Reject empty payloads, zero dimensions and size mismatches
pub fn validate_rgba(rgba: &[u8], width: u32, height: u32) -> Result<()> {
    if rgba.is_empty() {
        return Err(RenderError::invalid_argument("empty RGBA payload"));
    }
    if width == 0 || height == 0 {
        return Err(RenderError::invalid_argument(format!(
            "image dimensions must be positive, got {width}x{height}"
        )));
    }
    let expected = u64::from(width) * u64::from(height) * RGBA_BYTES as u64;
    if rgba.len() as u64 != expected {
        return Err(RenderError::invalid_argument(format!(
            "RGBA payload is {} bytes, expected {expected} for {width}x{height}",
            rgba.len()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image() -> CachedImage {
        CachedImage {
            width: 1,
            height: 1,
            payload: "AAAAAA==".to_string(),
        }
    }

    #[test]
    fn test_transitions() {
        let mut cache = ImageCache::new();
        assert!(cache.get(3).unwrap_err().is_invalid_state());
        assert!(cache.insert(3, image()));
        assert!(!cache.insert(3, image()));
        assert_eq!(cache.get(3).unwrap().width, 1);
        assert!(cache.remove(3).is_some());
        assert!(cache.remove(3).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_ids_sorted() {
        let mut cache = ImageCache::new();
        for id in [9, 2, 5] {
            cache.insert(id, image());
        }
        assert_eq!(cache.ids(), vec![2, 5, 9]);
    }

    #[test]
    fn test_validate_rgba() {
        assert!(validate_rgba(&[0; 16], 2, 2).is_ok());
        assert!(validate_rgba(&[], 2, 2).unwrap_err().is_invalid_argument());
        assert!(validate_rgba(&[0; 16], 0, 2).unwrap_err().is_invalid_argument());
        assert!(validate_rgba(&[0; 15], 2, 2).unwrap_err().is_invalid_argument());
    }
}
