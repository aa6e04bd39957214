//! Vector drawing commands, rendered with [`MagickWand::draw_image`](crate::MagickWand::draw_image)

use imagick_core::{Destroyer, NativeError, Result};
use imagick_sys as sys;

use crate::engine::Engine;
use crate::handle::{handle_kind, OwnedHandle};
use crate::pixel_wand::PixelWand;

handle_kind!(
    DrawingKind, sys::DrawingWand, "DrawingWand",
    destroy: DestroyDrawingWand,
    is_valid: IsDrawingWand,
    exception: DrawGetException,
    clear: DrawClearException,
    clone: CloneDrawingWand,
);

/// A list of drawing commands with its own fill and stroke state
#[derive(Debug)]
pub struct DrawingWand {
    handle: OwnedHandle<DrawingKind>,
}

impl DrawingWand {
    pub fn new(engine: &Engine) -> Result<Self> {
        engine.ensure_live()?;
        // SAFETY: engine is running
        let raw = unsafe { (engine.api().NewDrawingWand)() };
        Ok(Self {
            handle: OwnedHandle::from_raw(*engine, raw)?,
        })
    }

    pub fn try_clone(&self) -> Result<Self> {
        Ok(Self {
            handle: self.handle.try_clone()?,
        })
    }

    /// Fill used by the shapes drawn after this call
    pub fn set_fill_color(&mut self, fill: &PixelWand) -> Result<()> {
        let raw = self.handle.raw()?;
        let fill = fill.as_raw()?;
        // SAFETY: both wands are live; the color is copied
        unsafe { (self.handle.api().DrawSetFillColor)(raw, fill) };
        Ok(())
    }

    /// Queue a rectangle between two corners
    pub fn rectangle(&mut self, x1: f64, y1: f64, x2: f64, y2: f64) -> Result<()> {
        let raw = self.handle.raw()?;
        // SAFETY: live wand
        unsafe { (self.handle.api().DrawRectangle)(raw, x1, y1, x2, y2) };
        Ok(())
    }

    pub fn exception(&self) -> Option<NativeError> {
        self.handle.exception()
    }

    pub fn clear_exception(&mut self) {
        self.handle.clear_exception();
    }

    pub(crate) fn as_raw(&self) -> Result<*mut sys::DrawingWand> {
        self.handle.raw()
    }
}

impl Clone for DrawingWand {
    fn clone(&self) -> Self {
        Self {
            handle: self.handle.clone_or_empty(),
        }
    }
}

impl Destroyer for DrawingWand {
    fn destroy(&mut self) {
        self.handle.release();
    }

    fn is_verified(&self) -> bool {
        self.handle.is_verified()
    }
}
