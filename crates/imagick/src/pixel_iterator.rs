//! Row-by-row pixel access

use std::marker::PhantomData;
use std::ops::{Deref, DerefMut};
use std::ptr::NonNull;

use imagick_core::{Destroyer, NativeError, Result};
use imagick_sys as sys;
use libc::size_t;

use crate::handle::{handle_kind, OwnedHandle};
use crate::magick_wand::MagickWand;
use crate::pixel_wand::PixelWandRef;

handle_kind!(
    IteratorKind, sys::PixelIterator, "PixelIterator",
    destroy: DestroyPixelIterator,
    is_valid: IsPixelIterator,
    exception: PixelGetIteratorException,
    clear: PixelClearIteratorException,
);

/// Cursor over the rows of a wand's current image
///
/// Holds the wand mutably for its whole life. Edits made through a row are
/// written back by [`PixelIterator::sync`].
///
/// ```ignore
/// let mut rows = wand.pixel_iterator()?;
/// while let Some(mut row) = rows.next_row()? {
///     for pixel in row.iter_mut() {
///         pixel.set_color("red")?;
///     }
///     rows.sync()?;
/// }
/// ```
#[derive(Debug)]
pub struct PixelIterator<'w> {
    handle: OwnedHandle<IteratorKind>,
    _wand: PhantomData<&'w mut MagickWand>,
}

impl<'w> PixelIterator<'w> {
    pub fn new(wand: &'w mut MagickWand) -> Result<Self> {
        let engine = wand.engine();
        let wand_raw = wand.as_raw()?;
        // SAFETY: live wand, which stays borrowed for 'w
        let raw = unsafe { (engine.api().NewPixelIterator)(wand_raw) };
        if raw.is_null() {
            // The engine raises on the wand, e.g. when it holds no image
            return Err(wand.take_error());
        }
        Ok(Self {
            handle: OwnedHandle::from_raw(engine, raw)?,
            _wand: PhantomData,
        })
    }

    /// The next row, or `None` past the last one
    pub fn next_row(&mut self) -> Result<Option<PixelRow<'_>>> {
        let raw = self.handle.raw()?;
        let api = self.handle.api();
        let mut count: size_t = 0;
        // SAFETY: live iterator; the row is owned by it and valid until the
        // next call, which the returned borrow prevents.
        let row = unsafe { (api.PixelGetNextIteratorRow)(raw, &mut count) };
        if row.is_null() {
            return match self.handle.take_failure() {
                Some(err) => Err(err),
                None => Ok(None),
            };
        }
        // SAFETY: as above, `count` entries
        let wands = unsafe { std::slice::from_raw_parts(row, count) };
        let pixels = wands
            .iter()
            .filter_map(|&wand| NonNull::new(wand))
            .map(|wand| PixelWandRef::new(api, wand))
            .collect();
        Ok(Some(PixelRow { pixels }))
    }

    /// Back to the first row
    pub fn reset(&mut self) -> Result<()> {
        let raw = self.handle.raw()?;
        // SAFETY: live iterator
        unsafe { (self.handle.api().PixelResetIterator)(raw) };
        Ok(())
    }

    /// Write the last row's edits back to the image
    pub fn sync(&mut self) -> Result<()> {
        let raw = self.handle.raw()?;
        // SAFETY: live iterator
        let status = unsafe { (self.handle.api().PixelSyncIterator)(raw) };
        self.handle.check(status)
    }

    pub fn exception(&self) -> Option<NativeError> {
        self.handle.exception()
    }
}

impl Destroyer for PixelIterator<'_> {
    fn destroy(&mut self) {
        self.handle.release();
    }

    fn is_verified(&self) -> bool {
        self.handle.is_verified()
    }
}

/// One row of pixels, borrowed from its iterator
#[derive(Debug)]
pub struct PixelRow<'r> {
    pixels: Vec<PixelWandRef<'r>>,
}

impl<'r> Deref for PixelRow<'r> {
    type Target = [PixelWandRef<'r>];

    fn deref(&self) -> &Self::Target {
        &self.pixels
    }
}

impl DerefMut for PixelRow<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.pixels
    }
}
