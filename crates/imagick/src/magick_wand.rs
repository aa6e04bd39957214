//! Image sequences and the operations on them

use imagick_core::{
    pixels, ChannelMap, Destroyer, MagickError, NativeError, PixelBufferDescriptor, PixelData,
    PixelElement, PixelSurface, Region, Result, StorageType,
};
use imagick_sys as sys;
use libc::{c_void, size_t, ssize_t};

use crate::drawing_wand::DrawingWand;
use crate::engine::Engine;
use crate::handle::{handle_kind, OwnedHandle};
use crate::memory::{c_string, take_blob, NativeString};
use crate::pixel_iterator::PixelIterator;
use crate::pixel_wand::PixelWand;

handle_kind!(
    WandKind, sys::MagickWand, "MagickWand",
    destroy: DestroyMagickWand,
    is_valid: IsMagickWand,
    exception: MagickGetException,
    clear: MagickClearException,
    clone: CloneMagickWand,
);

/// A list of images and the cursor into it
///
/// Dropping the wand releases it. [`Destroyer::destroy`] does the same at a
/// point of your choosing; after that every operation returns
/// [`MagickError::Destroyed`].
#[derive(Debug)]
pub struct MagickWand {
    handle: OwnedHandle<WandKind>,
}

impl MagickWand {
    pub fn new(engine: &Engine) -> Result<Self> {
        engine.ensure_live()?;
        // SAFETY: engine is running
        let raw = unsafe { (engine.api().NewMagickWand)() };
        Ok(Self {
            handle: OwnedHandle::from_raw(*engine, raw)?,
        })
    }

    /// Deep copy, images included
    pub fn try_clone(&self) -> Result<Self> {
        Ok(Self {
            handle: self.handle.try_clone()?,
        })
    }

    pub fn engine(&self) -> Engine {
        self.handle.engine()
    }

    /// Read an image from a path or a built-in such as `"logo:"` or `"rose:"`
    pub fn read_image(&mut self, filename: &str) -> Result<()> {
        let filename = c_string(filename)?;
        let raw = self.handle.raw()?;
        // SAFETY: live wand, NUL-terminated name
        let status = unsafe { (self.handle.api().MagickReadImage)(raw, filename.as_ptr()) };
        self.handle.check(status)
    }

    /// Decode an in-memory encoded image
    pub fn read_image_blob(&mut self, blob: &[u8]) -> Result<()> {
        if blob.is_empty() {
            return Err(MagickError::EmptyInput("zero-length image blob".into()));
        }
        let raw = self.handle.raw()?;
        // SAFETY: live wand; the engine only reads `blob.len()` bytes
        let status = unsafe {
            (self.handle.api().MagickReadImageBlob)(raw, blob.as_ptr().cast::<c_void>(), blob.len())
        };
        self.handle.check(status)
    }

    /// Encode the current image in its format
    pub fn image_blob(&mut self) -> Result<Vec<u8>> {
        let raw = self.handle.raw()?;
        let mut length: size_t = 0;
        // SAFETY: live wand; the blob is ours to relinquish
        let blob = unsafe {
            let ptr = (self.handle.api().MagickGetImageBlob)(raw, &mut length);
            take_blob(self.handle.api(), ptr, length)
        };
        blob.ok_or_else(|| self.handle.take_error())
    }

    /// Append a blank `width` x `height` image filled with `background`
    pub fn new_image(&mut self, width: usize, height: usize, background: &PixelWand) -> Result<()> {
        let raw = self.handle.raw()?;
        let background = background.as_raw()?;
        // SAFETY: both wands live
        let status = unsafe { (self.handle.api().MagickNewImage)(raw, width, height, background) };
        self.handle.check(status)
    }

    pub fn image_width(&self) -> Result<usize> {
        let raw = self.handle.raw()?;
        // SAFETY: live wand
        Ok(unsafe { (self.handle.api().MagickGetImageWidth)(raw) })
    }

    pub fn image_height(&self) -> Result<usize> {
        let raw = self.handle.raw()?;
        // SAFETY: live wand
        Ok(unsafe { (self.handle.api().MagickGetImageHeight)(raw) })
    }

    /// The whole current image as a region
    pub fn image_region(&self) -> Result<Region> {
        Ok(Region::full(self.image_width()?, self.image_height()?))
    }

    pub fn number_images(&self) -> Result<usize> {
        let raw = self.handle.raw()?;
        // SAFETY: live wand
        Ok(unsafe { (self.handle.api().MagickGetNumberImages)(raw) })
    }

    /// Format of the current image, e.g. `"PNG"`
    pub fn image_format(&self) -> Result<String> {
        let raw = self.handle.raw()?;
        // SAFETY: live wand; the string is ours to relinquish
        let format = unsafe {
            NativeString::from_raw(self.handle.api(), (self.handle.api().MagickGetImageFormat)(raw))
        };
        match format {
            Some(format) => Ok(format.to_string_lossy()),
            None => Err(self.handle.take_error()),
        }
    }

    /// Format used by the next [`MagickWand::image_blob`]
    pub fn set_image_format(&mut self, format: &str) -> Result<()> {
        let format = c_string(format)?;
        let raw = self.handle.raw()?;
        // SAFETY: live wand, NUL-terminated format
        let status = unsafe { (self.handle.api().MagickSetImageFormat)(raw, format.as_ptr()) };
        self.handle.check(status)
    }

    pub fn scale_image(&mut self, width: usize, height: usize) -> Result<()> {
        let raw = self.handle.raw()?;
        // SAFETY: live wand
        let status = unsafe { (self.handle.api().MagickScaleImage)(raw, width, height) };
        self.handle.check(status)
    }

    /// Render the commands queued on `drawing` onto the current image
    pub fn draw_image(&mut self, drawing: &DrawingWand) -> Result<()> {
        let raw = self.handle.raw()?;
        let drawing = drawing.as_raw()?;
        // SAFETY: both wands live
        let status = unsafe { (self.handle.api().MagickDrawImage)(raw, drawing) };
        self.handle.check(status)
    }

    /// Copy a region out as `T` values, one per channel in `map`
    ///
    /// ```ignore
    /// let rgb: Vec<f32> = wand.export_pixels(Region::full(w, h), "RGB")?;
    /// assert_eq!(rgb.len(), w * h * 3);
    /// ```
    pub fn export_pixels<T: PixelElement>(&self, region: Region, map: &str) -> Result<Vec<T>> {
        pixels::export_pixels(self, region, &ChannelMap::new(map)?)
    }

    /// Like [`MagickWand::export_pixels`], storage chosen at runtime
    pub fn export_pixel_data(&self, region: Region, map: &str, storage: StorageType) -> Result<PixelData> {
        pixels::export_pixel_data(self, region, &ChannelMap::new(map)?, storage)
    }

    /// Overwrite a region from `T` values laid out as `map` says
    pub fn import_pixels<T: PixelElement>(&mut self, region: Region, map: &str, values: &[T]) -> Result<()> {
        pixels::import_pixels(self, region, &ChannelMap::new(map)?, values)
    }

    pub fn import_pixel_data(&mut self, region: Region, map: &str, data: &PixelData) -> Result<()> {
        pixels::import_pixel_data(self, region, &ChannelMap::new(map)?, data)
    }

    /// Walk the current image row by row
    pub fn pixel_iterator(&mut self) -> Result<PixelIterator<'_>> {
        PixelIterator::new(self)
    }

    /// The pending exception, if any; it stays pending
    pub fn exception(&self) -> Option<NativeError> {
        self.handle.exception()
    }

    pub fn clear_exception(&mut self) {
        self.handle.clear_exception();
    }

    pub(crate) fn as_raw(&mut self) -> Result<*mut sys::MagickWand> {
        self.handle.raw()
    }

    /// Read and clear the exception a failed call left on this wand
    pub(crate) fn take_error(&self) -> MagickError {
        self.handle.take_error()
    }
}

impl Clone for MagickWand {
    fn clone(&self) -> Self {
        Self {
            handle: self.handle.clone_or_empty(),
        }
    }
}

impl Destroyer for MagickWand {
    fn destroy(&mut self) {
        self.handle.release();
    }

    fn is_verified(&self) -> bool {
        self.handle.is_verified()
    }
}

fn storage_ordinal(storage: StorageType) -> sys::StorageType {
    match storage {
        StorageType::Char => sys::CHAR_PIXEL,
        StorageType::Short => sys::SHORT_PIXEL,
        StorageType::Integer => sys::INTEGER_PIXEL,
        StorageType::Float => sys::FLOAT_PIXEL,
        StorageType::Double => sys::DOUBLE_PIXEL,
    }
}

impl PixelSurface for MagickWand {
    fn export_bytes(&self, descriptor: &PixelBufferDescriptor, out: &mut [u8]) -> Result<()> {
        descriptor.check_buffer(out.as_ptr(), out.len())?;
        let map = descriptor.map().to_c_string()?;
        let region = descriptor.region();
        let raw = self.handle.raw()?;
        // SAFETY: live wand; `out` holds exactly the bytes the engine will
        // write for this region, map and storage, suitably aligned.
        let status = unsafe {
            (self.handle.api().MagickExportImagePixels)(
                raw,
                region.x as ssize_t,
                region.y as ssize_t,
                region.width,
                region.height,
                map.as_ptr(),
                storage_ordinal(descriptor.storage()),
                out.as_mut_ptr().cast::<c_void>(),
            )
        };
        self.handle.check(status)
    }

    fn import_bytes(&mut self, descriptor: &PixelBufferDescriptor, data: &[u8]) -> Result<()> {
        descriptor.check_buffer(data.as_ptr(), data.len())?;
        let map = descriptor.map().to_c_string()?;
        let region = descriptor.region();
        let raw = self.handle.raw()?;
        // SAFETY: live wand; `data` holds exactly the bytes the engine will
        // read for this region, map and storage.
        let status = unsafe {
            (self.handle.api().MagickImportImagePixels)(
                raw,
                region.x as ssize_t,
                region.y as ssize_t,
                region.width,
                region.height,
                map.as_ptr(),
                storage_ordinal(descriptor.storage()),
                data.as_ptr().cast::<c_void>(),
            )
        };
        self.handle.check(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use imagick_core::ValidationError;

    fn logo() -> Option<MagickWand> {
        let _ = env_logger::builder().is_test(true).try_init();
        let engine = Engine::initialize().ok()?;
        let mut wand = MagickWand::new(&engine).unwrap();
        wand.read_image("logo:").unwrap();
        Some(wand)
    }

    #[test]
    fn test_storage_ordinals() {
        assert_eq!(storage_ordinal(StorageType::Char), sys::CHAR_PIXEL);
        assert_eq!(storage_ordinal(StorageType::Short), sys::SHORT_PIXEL);
        assert_eq!(storage_ordinal(StorageType::Integer), sys::INTEGER_PIXEL);
        assert_eq!(storage_ordinal(StorageType::Float), sys::FLOAT_PIXEL);
        assert_eq!(storage_ordinal(StorageType::Double), sys::DOUBLE_PIXEL);
    }

    #[test]
    fn test_export_length_and_storage() {
        let Some(wand) = logo() else {
            eprintln!("Skipping test: MagickWand library not available");
            return;
        };
        let region = Region::new(10, 10, 20, 5);
        let data = wand.export_pixel_data(region, "RGBA", StorageType::Short).unwrap();
        assert_eq!(data.storage(), StorageType::Short);
        assert_eq!(data.len(), 20 * 5 * 4);
        assert_eq!(data.as_bytes().len(), 20 * 5 * 4 * 2);
    }

    #[test]
    fn test_empty_region_rejected() {
        let Some(wand) = logo() else {
            eprintln!("Skipping test: MagickWand library not available");
            return;
        };
        let err = wand.export_pixels::<u8>(Region::new(0, 0, 0, 10), "RGB").unwrap_err();
        assert!(matches!(err, MagickError::Validation(ValidationError::EmptyRegion { .. })));
        assert!(wand.exception().is_none());
    }

    #[test]
    fn test_export_without_image_is_native_error() {
        let Ok(engine) = Engine::initialize() else {
            eprintln!("Skipping test: MagickWand library not available");
            return;
        };
        let wand = MagickWand::new(&engine).unwrap();
        let err = wand.export_pixels::<u8>(Region::full(1, 1), "R").unwrap_err();
        assert!(err.native().is_some(), "unexpected error {err}");
        // The failure is cleared, the wand stays usable
        assert!(wand.exception().is_none());
        assert!(wand.is_verified());
    }

    #[test]
    fn test_format_and_scale() {
        let Some(mut wand) = logo() else {
            eprintln!("Skipping test: MagickWand library not available");
            return;
        };
        assert_eq!(wand.number_images().unwrap(), 1);
        wand.scale_image(64, 48).unwrap();
        assert_eq!(wand.image_region().unwrap(), Region::full(64, 48));

        wand.set_image_format("PNG").unwrap();
        assert_eq!(wand.image_format().unwrap(), "PNG");
        let blob = wand.image_blob().unwrap();
        assert!(blob.starts_with(b"\x89PNG"));
    }

    #[test]
    fn test_draw_rectangle() {
        let Ok(engine) = Engine::initialize() else {
            eprintln!("Skipping test: MagickWand library not available");
            return;
        };
        let white = PixelWand::with_color(&engine, "white").unwrap();
        let black = PixelWand::with_color(&engine, "black").unwrap();
        let mut wand = MagickWand::new(&engine).unwrap();
        wand.new_image(8, 8, &white).unwrap();

        let mut drawing = DrawingWand::new(&engine).unwrap();
        drawing.set_fill_color(&black).unwrap();
        drawing.rectangle(0.0, 0.0, 3.0, 3.0).unwrap();
        wand.draw_image(&drawing).unwrap();

        let gray: Vec<u8> = wand.export_pixels(Region::full(8, 8), "I").unwrap();
        assert_eq!(gray[0], 0);
        assert_eq!(gray[63], 255);
    }
}
