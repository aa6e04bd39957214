//! Raw MagickWand entry points, resolved at runtime
//!
//! The engine ships under a different file name for every major version,
//! quantum depth and platform (`libMagickWand-7.Q16HDRI.so.10`,
//! `libMagickWand-6.Q16.so.6`, `CORE_RL_MagickWand_.dll`, ...). Rather than
//! pinning one at link time, [`MagickApi::load`] opens the first library that
//! exists and resolves every entry point this workspace uses. A missing
//! symbol fails the load as a whole, so a loaded [`MagickApi`] is always
//! complete.
//!
//! Only the handful of functions needed by the safe layer are declared here.
//! Signatures are shared by ImageMagick 6 and 7.
//!
//! Everything in this crate is `unsafe` to call. The safe wrappers live in the
//! `imagick` crate.

#![allow(non_camel_case_types)]

use std::fmt;
use std::path::{Path, PathBuf};

use libc::{c_char, c_double, c_uchar, c_uint, c_void, size_t, ssize_t};
use libloading::Library;
use thiserror::Error;

/// Opaque `MagickWand`; only ever used behind a pointer
#[repr(C)]
pub struct MagickWand {
    _opaque: [u8; 0],
}

/// Opaque `PixelWand`
#[repr(C)]
pub struct PixelWand {
    _opaque: [u8; 0],
}

/// Opaque `DrawingWand`
#[repr(C)]
pub struct DrawingWand {
    _opaque: [u8; 0],
}

/// Opaque `PixelIterator`
#[repr(C)]
pub struct PixelIterator {
    _opaque: [u8; 0],
}

pub type MagickBooleanType = c_uint;
pub const MAGICK_FALSE: MagickBooleanType = 0;
pub const MAGICK_TRUE: MagickBooleanType = 1;

pub type ExceptionType = c_uint;
pub const UNDEFINED_EXCEPTION: ExceptionType = 0;

// StorageType ordinals. 4 is IntegerPixel in 6.x and LongPixel in 7.x; both
// are 32-bit unsigned.
pub type StorageType = c_uint;
pub const UNDEFINED_PIXEL: StorageType = 0;
pub const CHAR_PIXEL: StorageType = 1;
pub const DOUBLE_PIXEL: StorageType = 2;
pub const FLOAT_PIXEL: StorageType = 3;
pub const INTEGER_PIXEL: StorageType = 4;
pub const SHORT_PIXEL: StorageType = 7;

/// Why the engine could not be loaded
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("no MagickWand library found (tried: {})", tried.join("; "))]
    NotFound { tried: Vec<String> },

    #[error("{path} does not export {symbol}: {source}")]
    MissingSymbol {
        symbol: &'static str,
        path: String,
        #[source]
        source: libloading::Error,
    },
}

macro_rules! magick_api {
    ($(
        $(#[$meta:meta])*
        fn $name:ident($($arg:ident: $ty:ty),* $(,)?) $(-> $ret:ty)?;
    )*) => {
        /// Every entry point, resolved from one open library
        ///
        /// The library stays open for as long as this value lives, which keeps
        /// the function pointers valid.
        #[allow(non_snake_case)]
        pub struct MagickApi {
            $(
                $(#[$meta])*
                pub $name: unsafe extern "C" fn($($ty),*) $(-> $ret)?,
            )*
            path: PathBuf,
            _library: Library,
        }

        impl MagickApi {
            #[allow(non_snake_case)]
            unsafe fn resolve(library: Library, path: PathBuf) -> Result<Self, LoadError> {
                $(
                    let $name = *library
                        .get::<unsafe extern "C" fn($($ty),*) $(-> $ret)?>(
                            concat!(stringify!($name), "\0").as_bytes(),
                        )
                        .map_err(|source| LoadError::MissingSymbol {
                            symbol: stringify!($name),
                            path: path.display().to_string(),
                            source,
                        })?;
                )*
                Ok(Self {
                    $($name,)*
                    path,
                    _library: library,
                })
            }
        }
    };
}

magick_api! {
    // Process lifecycle
    fn MagickWandGenesis();
    fn MagickWandTerminus();
    fn IsMagickWandInstantiated() -> MagickBooleanType;
    /// Returns a static string; never relinquish it
    fn MagickGetVersion(version: *mut size_t) -> *const c_char;
    fn MagickRelinquishMemory(memory: *mut c_void) -> *mut c_void;

    // MagickWand
    fn NewMagickWand() -> *mut MagickWand;
    fn CloneMagickWand(wand: *const MagickWand) -> *mut MagickWand;
    fn DestroyMagickWand(wand: *mut MagickWand) -> *mut MagickWand;
    fn IsMagickWand(wand: *const MagickWand) -> MagickBooleanType;
    fn MagickGetException(wand: *const MagickWand, severity: *mut ExceptionType) -> *mut c_char;
    fn MagickGetExceptionType(wand: *const MagickWand) -> ExceptionType;
    fn MagickClearException(wand: *mut MagickWand) -> MagickBooleanType;
    fn MagickReadImage(wand: *mut MagickWand, filename: *const c_char) -> MagickBooleanType;
    fn MagickReadImageBlob(wand: *mut MagickWand, blob: *const c_void, length: size_t) -> MagickBooleanType;
    fn MagickGetImageBlob(wand: *mut MagickWand, length: *mut size_t) -> *mut c_uchar;
    fn MagickNewImage(wand: *mut MagickWand, columns: size_t, rows: size_t, background: *const PixelWand) -> MagickBooleanType;
    fn MagickGetImageWidth(wand: *mut MagickWand) -> size_t;
    fn MagickGetImageHeight(wand: *mut MagickWand) -> size_t;
    fn MagickGetNumberImages(wand: *mut MagickWand) -> size_t;
    fn MagickGetImageFormat(wand: *mut MagickWand) -> *mut c_char;
    fn MagickSetImageFormat(wand: *mut MagickWand, format: *const c_char) -> MagickBooleanType;
    fn MagickScaleImage(wand: *mut MagickWand, columns: size_t, rows: size_t) -> MagickBooleanType;
    fn MagickDrawImage(wand: *mut MagickWand, drawing: *const DrawingWand) -> MagickBooleanType;
    fn MagickExportImagePixels(
        wand: *mut MagickWand,
        x: ssize_t,
        y: ssize_t,
        columns: size_t,
        rows: size_t,
        map: *const c_char,
        storage: StorageType,
        pixels: *mut c_void,
    ) -> MagickBooleanType;
    fn MagickImportImagePixels(
        wand: *mut MagickWand,
        x: ssize_t,
        y: ssize_t,
        columns: size_t,
        rows: size_t,
        map: *const c_char,
        storage: StorageType,
        pixels: *const c_void,
    ) -> MagickBooleanType;

    // Queries; returned arrays and strings are owned by the caller
    fn MagickQueryConfigureOptions(pattern: *const c_char, count: *mut size_t) -> *mut *mut c_char;
    fn MagickQueryConfigureOption(option: *const c_char) -> *mut c_char;
    fn MagickQueryFormats(pattern: *const c_char, count: *mut size_t) -> *mut *mut c_char;
    fn MagickQueryFonts(pattern: *const c_char, count: *mut size_t) -> *mut *mut c_char;

    // PixelWand
    fn NewPixelWand() -> *mut PixelWand;
    fn ClonePixelWand(wand: *const PixelWand) -> *mut PixelWand;
    fn DestroyPixelWand(wand: *mut PixelWand) -> *mut PixelWand;
    fn IsPixelWand(wand: *const PixelWand) -> MagickBooleanType;
    fn PixelGetException(wand: *const PixelWand, severity: *mut ExceptionType) -> *mut c_char;
    fn PixelClearException(wand: *mut PixelWand) -> MagickBooleanType;
    fn PixelSetColor(wand: *mut PixelWand, color: *const c_char) -> MagickBooleanType;
    fn PixelGetColorAsString(wand: *const PixelWand) -> *mut c_char;

    // DrawingWand
    fn NewDrawingWand() -> *mut DrawingWand;
    fn CloneDrawingWand(wand: *const DrawingWand) -> *mut DrawingWand;
    fn DestroyDrawingWand(wand: *mut DrawingWand) -> *mut DrawingWand;
    fn IsDrawingWand(wand: *const DrawingWand) -> MagickBooleanType;
    fn DrawGetException(wand: *const DrawingWand, severity: *mut ExceptionType) -> *mut c_char;
    fn DrawClearException(wand: *mut DrawingWand) -> MagickBooleanType;
    fn DrawSetFillColor(wand: *mut DrawingWand, fill: *const PixelWand);
    fn DrawRectangle(wand: *mut DrawingWand, x1: c_double, y1: c_double, x2: c_double, y2: c_double);

    // PixelIterator
    fn NewPixelIterator(wand: *mut MagickWand) -> *mut PixelIterator;
    fn DestroyPixelIterator(iterator: *mut PixelIterator) -> *mut PixelIterator;
    fn IsPixelIterator(iterator: *const PixelIterator) -> MagickBooleanType;
    fn PixelGetIteratorException(iterator: *const PixelIterator, severity: *mut ExceptionType) -> *mut c_char;
    fn PixelClearIteratorException(iterator: *mut PixelIterator) -> MagickBooleanType;
    /// The returned row is owned by the iterator
    fn PixelGetNextIteratorRow(iterator: *mut PixelIterator, count: *mut size_t) -> *mut *mut PixelWand;
    fn PixelResetIterator(iterator: *mut PixelIterator);
    fn PixelSyncIterator(iterator: *mut PixelIterator) -> MagickBooleanType;
}

impl MagickApi {
    /// Open the first candidate that loads and resolve every entry point
    ///
    /// A candidate that loads but lacks a symbol is an error, not a reason to
    /// try the next one: it means an incompatible engine is installed.
    pub fn load<P: AsRef<Path>>(candidates: &[P]) -> Result<Self, LoadError> {
        let mut tried = Vec::with_capacity(candidates.len());

        for candidate in candidates {
            let candidate = candidate.as_ref();
            // SAFETY: loading runs the library's initializers. MagickWand's
            // are limited to static data setup.
            match unsafe { Library::new(candidate) } {
                Ok(library) => {
                    log::info!("Loaded MagickWand from {}", candidate.display());
                    // SAFETY: every declared signature matches the C headers
                    // of ImageMagick 6 and 7.
                    return unsafe { Self::resolve(library, candidate.to_path_buf()) };
                },
                Err(err) => {
                    log::debug!("MagickWand not at {}: {}", candidate.display(), err);
                    tried.push(candidate.display().to_string());
                },
            }
        }

        Err(LoadError::NotFound { tried })
    }

    /// The file this table was resolved from
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl fmt::Debug for MagickApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MagickApi")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}
