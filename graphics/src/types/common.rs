//! Common types shared across the graphics system.

/// 2D extent for textures and render targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Extent2d {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Extent2d {
    /// Zero extent, meaning "inherit the render size" in resource requests.
    pub const ZERO: Self = Self {
        width: 0,
        height: 0,
    };

    /// Create a new extent.
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Returns true if either dimension is zero.
    pub fn is_zero(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Number of pixels covered.
    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    /// Component-wise maximum.
    pub fn max(self, other: Self) -> Self {
        Self::new(self.width.max(other.width), self.height.max(other.height))
    }

    /// Returns true if `other` fits inside this extent.
    pub fn contains(&self, other: Self) -> bool {
        other.width <= self.width && other.height <= self.height
    }

    /// Scale by `factor`, rounding and clamping each dimension to at least 1.
    pub fn scaled(self, factor: f32) -> Self {
        let scale = |value: u32| ((value as f32 * factor).round() as u32).max(1);
        Self::new(scale(self.width), scale(self.height))
    }

    /// Number of mip levels in a full chain for this extent.
    pub fn mip_level_count(&self) -> u32 {
        let largest = self.width.max(self.height).max(1);
        u32::BITS - largest.leading_zeros()
    }

    /// Number of `group`-sized workgroups needed to cover this extent.
    pub fn workgroups(&self, group: u32) -> [u32; 3] {
        let group = group.max(1);
        [
            self.width.div_ceil(group),
            self.height.div_ceil(group),
            1,
        ]
    }
}

impl std::fmt::Display for Extent2d {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}
