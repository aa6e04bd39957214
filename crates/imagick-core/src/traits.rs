//! The contracts every native-backed type signs
//!
//! - [`Destroyer`] - Release the native object this value owns
//! - [`PixelSurface`] - Move packed pixel bytes in and out of an image

use crate::error::Result;
use crate::pixels::PixelBufferDescriptor;

/// Owner of exactly one native object
///
/// `Drop` calls [`Destroyer::destroy`] for you; call it yourself when the
/// native memory must go away at a known point.
///
/// ```ignore
/// let mut wand = MagickWand::new(&engine)?;
/// wand.destroy();
/// wand.destroy(); // no-op
/// assert!(!wand.is_verified());
/// ```
pub trait Destroyer {
    /// Release the native object
    ///
    /// Idempotent. After the first call the value is dead for good and
    /// [`Destroyer::is_verified`] returns false.
    fn destroy(&mut self);

    /// Whether the value still refers to a live native object
    fn is_verified(&self) -> bool;
}

/// Release any [`Destroyer`]
pub fn destroy<D: Destroyer + ?Sized>(value: &mut D) {
    value.destroy();
}

/// Something the engine can export pixels from and import pixels into
///
/// Implementations receive a validated descriptor and a byte buffer of exactly
/// [`PixelBufferDescriptor::byte_len`] bytes, aligned for the storage type.
/// They should still call [`PixelBufferDescriptor::check_buffer`] before
/// handing the pointer to native code.
pub trait PixelSurface {
    /// Fill `out` with the region's pixels in the descriptor's layout
    fn export_bytes(&self, descriptor: &PixelBufferDescriptor, out: &mut [u8]) -> Result<()>;

    /// Overwrite the region with `data`, laid out as the descriptor says
    fn import_bytes(&mut self, descriptor: &PixelBufferDescriptor, data: &[u8]) -> Result<()>;
}
