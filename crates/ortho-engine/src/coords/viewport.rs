/// Drawable size in device pixels.
///
/// This is the size of the surface the frame renders into. The canvas checks it
/// against the size its projection was computed for.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    #[inline]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn is_valid(self) -> bool {
        self.width > 0.0 && self.height > 0.0 && self.width.is_finite() && self.height.is_finite()
    }

    /// Returns the size rounded to whole pixels, or `None` for an invalid viewport.
    #[inline]
    pub fn to_pixels(self) -> Option<(u32, u32)> {
        if !self.is_valid() {
            return None;
        }
        Some((self.width.round() as u32, self.height.round() as u32))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_or_nan_is_invalid() {
        assert!(!Viewport::new(0.0, 10.0).is_valid());
        assert!(!Viewport::new(10.0, f32::NAN).is_valid());
        assert!(Viewport::new(1.0, 1.0).is_valid());
    }

    #[test]
    fn to_pixels_rounds() {
        assert_eq!(Viewport::new(799.6, 800.2).to_pixels(), Some((800, 800)));
        assert_eq!(Viewport::new(-1.0, 800.0).to_pixels(), None);
    }
}
