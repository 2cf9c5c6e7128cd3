//! Named resource requests declared by contributors.
//!
//! A request says which shared texture or buffer a contributor needs this
//! frame, how it accesses it, and what lifetime policy applies. Requests for
//! the same name from different contributors are merged by the resolver into
//! one physical resource.

use bitflags::bitflags;

use super::Require;
use crate::types::{Extent2d, TextureFormat};

bitflags! {
    /// How a contributor accesses a shared resource.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Access: u8 {
        /// Resource is read.
        const READ = 1 << 0;
        /// Resource is written.
        const WRITE = 1 << 1;
        /// Resource is read and written.
        const READ_WRITE = Self::READ.bits() | Self::WRITE.bits();
    }
}

// A request that names no access only consumes the resource, so an
// unqualified request never makes a contributor a producer.
impl Default for Access {
    fn default() -> Self {
        Self::READ
    }
}

impl Access {
    /// Returns true if the access includes writing.
    pub fn is_write(self) -> bool {
        self.contains(Self::WRITE)
    }

    /// Returns true if the access includes reading.
    pub fn is_read(self) -> bool {
        self.contains(Self::READ)
    }
}

bitflags! {
    /// Lifetime and initialisation policy of a shared resource.
    ///
    /// An empty set, which is also the default, means a mandatory resource
    /// with no per-frame clear.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ResourceFlags: u8 {
        /// Zero-fill the resource at the start of every frame.
        const CLEAR = 1 << 1;
        /// The resource carries state across frames and must never be cleared.
        const ACCUMULATE = 1 << 2;
        /// The resource may be absent; the request is dropped when its
        /// `require` predicate is not satisfied.
        const OPTIONAL = 1 << 3;
        /// Optional, and freed as soon as no contributor requests it.
        const OPTIONAL_DISCARD = 1 << 4;
        /// Optional, and kept allocated while unrequested so it can come
        /// back unchanged.
        const OPTIONAL_KEEP = 1 << 5;
    }
}

impl ResourceFlags {
    /// Any of the optional lifetime flags.
    pub const ANY_OPTIONAL: Self = Self::OPTIONAL
        .union(Self::OPTIONAL_DISCARD)
        .union(Self::OPTIONAL_KEEP);

    /// Returns true if the request may be dropped.
    pub fn is_optional(self) -> bool {
        self.intersects(Self::ANY_OPTIONAL)
    }
}

/// A request for a shared texture.
#[derive(Debug, Clone, PartialEq)]
pub struct SharedTexture {
    /// Name joining all requests for the same physical texture.
    pub name: String,
    /// Requested access.
    pub access: Access,
    /// Lifetime and initialisation policy.
    pub flags: ResourceFlags,
    /// Concrete format, or `None` to inherit from another requester.
    pub format: Option<TextureFormat>,
    /// Concrete size, or [`Extent2d::ZERO`] to inherit the render size.
    pub dimensions: Extent2d,
    /// Request a full mip chain.
    pub mips: bool,
    /// Name of a same-shaped history twin.
    pub backup_name: Option<String>,
    /// Condition under which the request is honored.
    pub require: Option<Require>,
}

impl SharedTexture {
    /// Create a request with the given access and no flags.
    pub fn new(name: impl Into<String>, access: Access) -> Self {
        Self {
            name: name.into(),
            access,
            flags: ResourceFlags::empty(),
            format: None,
            dimensions: Extent2d::ZERO,
            mips: false,
            backup_name: None,
            require: None,
        }
    }

    /// Create a read-only request.
    pub fn read(name: impl Into<String>) -> Self {
        Self::new(name, Access::READ)
    }

    /// Create a write-only request.
    pub fn write(name: impl Into<String>) -> Self {
        Self::new(name, Access::WRITE)
    }

    /// Create a read-write request.
    pub fn read_write(name: impl Into<String>) -> Self {
        Self::new(name, Access::READ_WRITE)
    }

    /// Set the lifetime flags.
    pub fn with_flags(mut self, flags: ResourceFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Set a concrete format.
    pub fn with_format(mut self, format: TextureFormat) -> Self {
        self.format = Some(format);
        self
    }

    /// Set concrete dimensions.
    pub fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.dimensions = Extent2d::new(width, height);
        self
    }

    /// Request a full mip chain.
    pub fn with_mips(mut self) -> Self {
        self.mips = true;
        self
    }

    /// Request a same-shaped history twin under `backup_name`.
    pub fn with_backup(mut self, backup_name: impl Into<String>) -> Self {
        self.backup_name = Some(backup_name.into());
        self
    }

    /// Honor the request only when `require` holds.
    pub fn with_require(mut self, require: Require) -> Self {
        self.require = Some(require);
        self
    }
}

/// A request for a shared buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct SharedBuffer {
    /// Name joining all requests for the same physical buffer.
    pub name: String,
    /// Requested access.
    pub access: Access,
    /// Lifetime and initialisation policy.
    pub flags: ResourceFlags,
    /// Size in bytes, or zero to size by the render resolution.
    pub size: u64,
    /// Element size in bytes, or zero to inherit.
    pub stride: u32,
    /// Condition under which the request is honored.
    pub require: Option<Require>,
}

impl SharedBuffer {
    /// Create a request with the given access and no flags.
    pub fn new(name: impl Into<String>, access: Access) -> Self {
        Self {
            name: name.into(),
            access,
            flags: ResourceFlags::empty(),
            size: 0,
            stride: 0,
            require: None,
        }
    }

    /// Create a read-only request.
    pub fn read(name: impl Into<String>) -> Self {
        Self::new(name, Access::READ)
    }

    /// Create a write-only request.
    pub fn write(name: impl Into<String>) -> Self {
        Self::new(name, Access::WRITE)
    }

    /// Create a read-write request.
    pub fn read_write(name: impl Into<String>) -> Self {
        Self::new(name, Access::READ_WRITE)
    }

    /// Set the lifetime flags.
    pub fn with_flags(mut self, flags: ResourceFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Set the size in bytes.
    pub fn with_size(mut self, size: u64) -> Self {
        self.size = size;
        self
    }

    /// Set the element stride in bytes.
    pub fn with_stride(mut self, stride: u32) -> Self {
        self.stride = stride;
        self
    }

    /// Honor the request only when `require` holds.
    pub fn with_require(mut self, require: Require) -> Self {
        self.require = Some(require);
        self
    }
}
