//! A single color

use std::marker::PhantomData;
use std::ptr::NonNull;

use imagick_core::{Destroyer, MagickError, NativeError, Result};
use imagick_sys::{self as sys, MagickApi, MAGICK_TRUE};

use crate::engine::Engine;
use crate::handle::{handle_kind, take_exception, OwnedHandle};
use crate::memory::{c_string, NativeString};

handle_kind!(
    PixelKind, sys::PixelWand, "PixelWand",
    destroy: DestroyPixelWand,
    is_valid: IsPixelWand,
    exception: PixelGetException,
    clear: PixelClearException,
    clone: ClonePixelWand,
);

/// An owned color value
///
/// Accepts any color the engine understands: names (`"red"`), hex
/// (`"#ff000080"`) or functional notation (`"srgb(255,0,0)"`).
#[derive(Debug)]
pub struct PixelWand {
    handle: OwnedHandle<PixelKind>,
}

impl PixelWand {
    pub fn new(engine: &Engine) -> Result<Self> {
        engine.ensure_live()?;
        // SAFETY: engine is running
        let raw = unsafe { (engine.api().NewPixelWand)() };
        Ok(Self {
            handle: OwnedHandle::from_raw(*engine, raw)?,
        })
    }

    /// New wand already set to `color`
    pub fn with_color(engine: &Engine, color: &str) -> Result<Self> {
        let mut wand = Self::new(engine)?;
        wand.set_color(color)?;
        Ok(wand)
    }

    /// Independent copy; the original is untouched
    pub fn try_clone(&self) -> Result<Self> {
        Ok(Self {
            handle: self.handle.try_clone()?,
        })
    }

    pub fn set_color(&mut self, color: &str) -> Result<()> {
        let color = c_string(color)?;
        let raw = self.handle.raw()?;
        // SAFETY: live wand, NUL-terminated color
        let status = unsafe { (self.handle.api().PixelSetColor)(raw, color.as_ptr()) };
        self.handle.check(status)
    }

    /// Color as the engine prints it, e.g. `"srgb(255,0,0)"`
    pub fn color(&self) -> Result<String> {
        let raw = self.handle.raw()?;
        color_string(self.handle.api(), raw)
    }

    pub fn exception(&self) -> Option<NativeError> {
        self.handle.exception()
    }

    pub fn clear_exception(&mut self) {
        self.handle.clear_exception();
    }

    pub(crate) fn as_raw(&self) -> Result<*mut sys::PixelWand> {
        self.handle.raw()
    }
}

/// Clones that fail come back empty and unverified
impl Clone for PixelWand {
    fn clone(&self) -> Self {
        Self {
            handle: self.handle.clone_or_empty(),
        }
    }
}

impl Destroyer for PixelWand {
    fn destroy(&mut self) {
        self.handle.release();
    }

    fn is_verified(&self) -> bool {
        self.handle.is_verified()
    }
}

/// A pixel owned by a [`PixelIterator`](crate::PixelIterator) row
///
/// Changes reach the image on [`PixelIterator::sync`](crate::PixelIterator::sync).
pub struct PixelWandRef<'a> {
    api: &'static MagickApi,
    raw: NonNull<sys::PixelWand>,
    _row: PhantomData<&'a mut sys::PixelWand>,
}

impl<'a> PixelWandRef<'a> {
    pub(crate) fn new(api: &'static MagickApi, raw: NonNull<sys::PixelWand>) -> Self {
        Self {
            api,
            raw,
            _row: PhantomData,
        }
    }

    pub fn color(&self) -> Result<String> {
        color_string(self.api, self.raw.as_ptr())
    }

    pub fn set_color(&mut self, color: &str) -> Result<()> {
        let color = c_string(color)?;
        // SAFETY: the row, and so this wand, is alive for 'a
        let status = unsafe { (self.api.PixelSetColor)(self.raw.as_ptr(), color.as_ptr()) };
        if status == MAGICK_TRUE {
            Ok(())
        } else {
            // SAFETY: as above
            Err(unsafe { take_exception::<PixelKind>(self.api, self.raw.as_ptr()) }.into())
        }
    }
}

impl std::fmt::Debug for PixelWandRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("PixelWandRef").field(&self.raw).finish()
    }
}

fn color_string(api: &'static MagickApi, raw: *const sys::PixelWand) -> Result<String> {
    // SAFETY: caller passes a live wand; the string is ours to relinquish
    let color = unsafe { NativeString::from_raw(api, (api.PixelGetColorAsString)(raw)) };
    color
        .map(|c| c.to_string_lossy())
        .ok_or(MagickError::Allocation("color string"))
}
