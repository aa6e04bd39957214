//! Imagick Core: the part of the bindings that never calls native code
//!
//! Everything that can be decided before a pointer crosses into the engine
//! lives here, so it can be tested without the engine installed.
//!
//! ## What's Inside
//!
//! - [`traits::Destroyer`] - Exactly-once release of a native object
//! - [`traits::PixelSurface`] - Where pixel bytes come from and go to
//! - [`pixels`] - Descriptor validation and typed export/import
//! - [`channel::ChannelMap`] - Channel counting for buffer sizing
//! - [`exception`] - Severity and category of native exception codes
//! - [`config::EngineConfig`] - How the native library is located
//!
//! ## Moving Pixels
//!
//! ```rust
//! use imagick_core::{export_pixels, ChannelMap, PixelBufferDescriptor, PixelSurface, Region};
//!
//! // Any surface works; this one is solid white
//! struct White;
//!
//! impl PixelSurface for White {
//!     fn export_bytes(&self, d: &PixelBufferDescriptor, out: &mut [u8]) -> imagick_core::Result<()> {
//!         d.check_buffer(out.as_ptr(), out.len())?;
//!         out.fill(0xff);
//!         Ok(())
//!     }
//!
//!     fn import_bytes(&mut self, _: &PixelBufferDescriptor, _: &[u8]) -> imagick_core::Result<()> {
//!         Ok(())
//!     }
//! }
//!
//! let map = ChannelMap::new("RGB")?;
//! let pixels: Vec<u8> = export_pixels(&White, Region::new(0, 0, 4, 2), &map)?;
//! assert_eq!(pixels.len(), 4 * 2 * 3);
//! # Ok::<(), imagick_core::MagickError>(())
//! ```

pub mod channel;
pub mod config;
pub mod error;
pub mod exception;
pub mod pixels;
pub mod traits;

#[cfg(test)]
mod proptests;

pub use channel::{Channel, ChannelMap};
pub use config::EngineConfig;
pub use error::{MagickError, NativeError, Result, ValidationError};
pub use exception::{Category, Severity};
pub use pixels::{
    export_pixel_data, export_pixels, import_pixel_data, import_pixels, PixelBufferDescriptor,
    PixelData, PixelElement,
};
pub use traits::{destroy, Destroyer, PixelSurface};
pub use types::{Region, StorageType};

/// Plain values shared by every layer
pub mod types {
    use std::fmt;
    use std::str::FromStr;

    use crate::error::{MagickError, ValidationError};

    /// A rectangle of pixels, anchored at `(x, y)`
    ///
    /// The origin is signed because the engine accepts offsets outside the
    /// image (virtual pixels).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Region {
        pub x: isize,
        pub y: isize,
        pub width: usize,
        pub height: usize,
    }

    impl Region {
        pub fn new(x: isize, y: isize, width: usize, height: usize) -> Self {
            Self {
                x,
                y,
                width,
                height,
            }
        }

        /// The whole of a `width` x `height` image
        pub fn full(width: usize, height: usize) -> Self {
            Self::new(0, 0, width, height)
        }

        /// `width * height`, or `None` on overflow
        pub fn pixel_count(&self) -> Option<usize> {
            self.width.checked_mul(self.height)
        }
    }

    /// Numeric type of each channel value in a pixel buffer
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub enum StorageType {
        /// 8-bit unsigned
        Char,
        /// 16-bit unsigned
        Short,
        /// 32-bit unsigned
        Integer,
        /// 32-bit float, normalized to 0.0..=1.0
        Float,
        /// 64-bit float, normalized to 0.0..=1.0
        Double,
    }

    impl StorageType {
        pub const ALL: [StorageType; 5] = [
            StorageType::Char,
            StorageType::Short,
            StorageType::Integer,
            StorageType::Float,
            StorageType::Double,
        ];

        pub const fn byte_width(self) -> usize {
            match self {
                StorageType::Char => 1,
                StorageType::Short => 2,
                StorageType::Integer | StorageType::Float => 4,
                StorageType::Double => 8,
            }
        }

        pub const fn alignment(self) -> usize {
            match self {
                StorageType::Char => std::mem::align_of::<u8>(),
                StorageType::Short => std::mem::align_of::<u16>(),
                StorageType::Integer => std::mem::align_of::<u32>(),
                StorageType::Float => std::mem::align_of::<f32>(),
                StorageType::Double => std::mem::align_of::<f64>(),
            }
        }

        pub const fn name(self) -> &'static str {
            match self {
                StorageType::Char => "char",
                StorageType::Short => "short",
                StorageType::Integer => "integer",
                StorageType::Float => "float",
                StorageType::Double => "double",
            }
        }
    }

    impl fmt::Display for StorageType {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.name())
        }
    }

    impl FromStr for StorageType {
        type Err = MagickError;

        fn from_str(s: &str) -> Result<Self, Self::Err> {
            match s.to_ascii_lowercase().as_str() {
                "char" | "u8" => Ok(StorageType::Char),
                "short" | "u16" => Ok(StorageType::Short),
                "integer" | "int" | "u32" => Ok(StorageType::Integer),
                "float" | "f32" => Ok(StorageType::Float),
                "double" | "f64" => Ok(StorageType::Double),
                _ => Err(ValidationError::UnsupportedStorage(s.to_string()).into()),
            }
        }
    }

}
