//! Imagick: safe handles over the MagickWand C API
//!
//! The engine is loaded at runtime, so nothing here links against
//! ImageMagick. Start it once, then hand the [`Engine`] token to every
//! constructor:
//!
//! ```ignore
//! use imagick::prelude::*;
//!
//! let engine = Engine::initialize()?;
//! let mut wand = MagickWand::new(&engine)?;
//! wand.read_image("logo:")?;
//!
//! let region = wand.image_region()?;
//! let rgb: Vec<f32> = wand.export_pixels(region, "RGB")?;
//! wand.import_pixels(region, "RGB", &rgb)?;
//! ```
//!
//! # Handles
//!
//! Every handle type owns exactly one native object and releases it on drop
//! or on [`Destroyer::destroy`], whichever comes first. Handles are `Send`
//! but not `Sync`.
//!
//! # Environment
//!
//! - `IMAGICK_WAND_LIBRARY`: exact library file to load
//! - `MAGICK_HOME`: installation prefix searched before the system paths
//! - `IMAGICK_LOG_ERRORS`: log every native error at `warn` level

#![allow(unsafe_code)]

mod drawing_wand;
mod engine;
mod handle;
mod magick_wand;
mod memory;
mod pixel_iterator;
mod pixel_wand;
mod query;

pub use drawing_wand::DrawingWand;
pub use engine::Engine;
pub use magick_wand::MagickWand;
pub use pixel_iterator::{PixelIterator, PixelRow};
pub use pixel_wand::{PixelWand, PixelWandRef};

pub use imagick_core::{
    config, destroy, error, Category, ChannelMap, Destroyer, EngineConfig, MagickError, NativeError,
    PixelData, PixelElement, Region, Result, Severity, StorageType, ValidationError,
};

/// Common imports for typical usage
pub mod prelude {
    pub use crate::{DrawingWand, Engine, MagickWand, PixelIterator, PixelWand};
    pub use imagick_core::{
        Destroyer, MagickError, PixelData, PixelElement, Region, Result, StorageType,
    };
}
