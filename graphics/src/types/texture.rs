//! Texture types and descriptors.

use super::Extent2d;
use bitflags::bitflags;

/// Pixel format of a shared texture.
///
/// Requests that leave the format unspecified inherit it from another
/// requester or fall back to [`TextureFormat::Rgba16Float`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[non_exhaustive]
pub enum TextureFormat {
    // Display-referred color
    /// RGBA, 8 bits per channel, linear.
    Rgba8Unorm,
    /// RGBA, 8 bits per channel, sRGB encoded.
    Rgba8UnormSrgb,

    // Scene-referred (HDR) color
    #[default]
    Rgba16Float,
    Rgba32Float,
    /// Packed RGB with 11, 11 and 10 bit floats.
    Rg11b10Float,

    // Auxiliary
    /// Single channel mask.
    R8Unorm,
    R16Float,
    R32Float,
    /// Single channel id or counter.
    R32Uint,
    /// Two-channel motion vectors.
    Rg16Float,
    Rg32Float,

    // Depth
    Depth32Float,
}

impl TextureFormat {
    pub fn is_depth(&self) -> bool {
        matches!(self, Self::Depth32Float)
    }

    /// Returns true for floating point color formats that hold scene-referred
    /// values and need tone mapping before display.
    pub fn is_hdr_color(&self) -> bool {
        matches!(
            self,
            Self::Rgba16Float | Self::Rgba32Float | Self::Rg11b10Float
        )
    }

    /// Bytes per pixel.
    pub fn block_size(&self) -> u32 {
        match self {
            Self::R8Unorm => 1,
            Self::R16Float => 2,
            Self::Rgba8Unorm
            | Self::Rgba8UnormSrgb
            | Self::Rg11b10Float
            | Self::R32Float
            | Self::R32Uint
            | Self::Rg16Float
            | Self::Depth32Float => 4,
            Self::Rgba16Float | Self::Rg32Float => 8,
            Self::Rgba32Float => 16,
        }
    }
}

bitflags! {
    /// How the backend may use an allocated texture.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TextureUsage: u32 {
        /// Source of copies, e.g. into a backup twin.
        const COPY_SRC = 1 << 0;
        /// Destination of copies and clears.
        const COPY_DST = 1 << 1;
        /// Read through a sampler.
        const TEXTURE_BINDING = 1 << 2;
        /// Read and written by compute kernels.
        const STORAGE_BINDING = 1 << 3;
        /// Bound as a raster output.
        const RENDER_ATTACHMENT = 1 << 4;
    }
}

impl Default for TextureUsage {
    fn default() -> Self {
        Self::empty()
    }
}

/// Shape of a 2D texture allocation. Two requests for the same name share
/// an allocation only while their descriptors compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TextureDescriptor {
    /// Label shown in backend diagnostics, usually the shared name.
    pub label: Option<String>,
    pub size: Extent2d,
    /// 1 unless a full mip chain was requested.
    pub mip_level_count: u32,
    pub format: TextureFormat,
    pub usage: TextureUsage,
}

impl TextureDescriptor {
    /// Single-level texture of the given size.
    pub fn new_2d(width: u32, height: u32, format: TextureFormat, usage: TextureUsage) -> Self {
        Self {
            label: None,
            size: Extent2d::new(width, height),
            mip_level_count: 1,
            format,
            usage,
        }
    }

    pub fn with_label(self, label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            ..self
        }
    }

    pub fn with_mip_levels(self, mip_level_count: u32) -> Self {
        Self {
            mip_level_count,
            ..self
        }
    }

    /// Approximate memory footprint in bytes, including the mip chain.
    pub fn byte_size(&self) -> u64 {
        let block = u64::from(self.format.block_size());
        (0..self.mip_level_count)
            .map(|level| {
                let width = u64::from((self.size.width >> level).max(1));
                let height = u64::from((self.size.height >> level).max(1));
                width * height * block
            })
            .sum()
    }
}

impl Default for TextureDescriptor {
    fn default() -> Self {
        Self {
            label: None,
            size: Extent2d::default(),
            mip_level_count: 1,
            format: TextureFormat::default(),
            usage: TextureUsage::empty(),
        }
    }
}
