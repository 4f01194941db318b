//! Texture runs over the fill index array.
//!
//! Consecutive fill indices drawn with the same texture form one run, so a
//! batch can be drawn with one range draw per texture switch.

use tessel_test_utils::TextureHandle;

/// A contiguous span of fill indices sharing one texture (or none).
///
/// `first_index` and `last_index` are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureRun {
    pub texture: Option<TextureHandle>,
    pub first_index: u32,
    pub last_index: u32,
}

impl TextureRun {
    pub fn index_count(&self) -> u32 {
        self.last_index - self.first_index + 1
    }

    pub fn index_range(&self) -> std::ops::Range<u32> {
        self.first_index..self.last_index + 1
    }
}

#[derive(Debug, Clone, Default)]
pub struct TextureRunCache {
    runs: Vec<TextureRun>,
}

impl TextureRunCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cover fill indices up to `index_end` (exclusive) with `texture`.
    ///
    /// Extends the last run if it uses the same texture, otherwise starts a
    /// new run right after it. Does nothing if no new indices were added.
    pub fn extend_or_start(&mut self, texture: Option<TextureHandle>, index_end: u32) {
        let next = self.runs.last().map_or(0, |run| run.last_index + 1);
        if index_end <= next {
            return;
        }
        match self.runs.last_mut() {
            Some(run) if run.texture == texture => run.last_index = index_end - 1,
            _ => self.runs.push(TextureRun {
                texture,
                first_index: next,
                last_index: index_end - 1,
            }),
        }
    }

    pub fn runs(&self) -> &[TextureRun] {
        &self.runs
    }

    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    pub fn clear(&mut self) {
        self.runs.clear();
    }

    /// Whether any run is textured.
    pub fn has_texture(&self) -> bool {
        self.runs.iter().any(|run| run.texture.is_some())
    }

    /// Reset after the indices were flushed; the next run starts at 0.
    ///
    /// Returns the texture of the last run so the caller can keep using it.
    pub fn restart(&mut self) -> Option<TextureHandle> {
        let texture = self.runs.last().and_then(|run| run.texture);
        self.runs.clear();
        texture
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: Option<TextureHandle> = Some(TextureHandle(1));
    const B: Option<TextureHandle> = Some(TextureHandle(2));

    #[test]
    fn test_same_texture_extends() {
        let mut cache = TextureRunCache::new();
        cache.extend_or_start(A, 6);
        cache.extend_or_start(A, 12);
        assert_eq!(
            cache.runs(),
            &[TextureRun {
                texture: A,
                first_index: 0,
                last_index: 11
            }]
        );
    }

    #[test]
    fn test_texture_switch_starts_run() {
        let mut cache = TextureRunCache::new();
        cache.extend_or_start(A, 6);
        cache.extend_or_start(None, 9);
        cache.extend_or_start(B, 15);

        let runs = cache.runs();
        assert_eq!(runs.len(), 3);
        assert_eq!(runs[1].index_range(), 6..9);
        assert_eq!(runs[2].first_index, 9);
        assert_eq!(runs[2].index_count(), 6);
        assert!(cache.has_texture());
    }

    #[test]
    fn test_no_new_indices_is_noop() {
        let mut cache = TextureRunCache::new();
        cache.extend_or_start(None, 0);
        assert!(cache.is_empty());

        cache.extend_or_start(A, 3);
        cache.extend_or_start(B, 3);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.runs()[0].texture, A);
    }

    #[test]
    fn test_restart_carries_texture() {
        let mut cache = TextureRunCache::new();
        cache.extend_or_start(None, 3);
        cache.extend_or_start(B, 9);
        assert_eq!(cache.restart(), B);
        assert!(cache.is_empty());

        cache.extend_or_start(B, 6);
        assert_eq!(cache.runs()[0].first_index, 0);
    }
}
