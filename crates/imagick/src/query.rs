//! Build and registry queries that need no wand

use imagick_core::{MagickError, Result};
use libc::{c_char, size_t};

use crate::engine::Engine;
use crate::memory::{c_string, NativeString, NativeStringArray};

type ListQuery = unsafe extern "C" fn(*const c_char, *mut size_t) -> *mut *mut c_char;

fn list(engine: &Engine, what: &str, query: ListQuery, pattern: &str) -> Result<Vec<String>> {
    engine.ensure_live()?;
    let pattern = c_string(pattern)?;
    let mut count: size_t = 0;
    // SAFETY: pattern is NUL-terminated; the array is ours to relinquish
    let names = unsafe {
        let ptr = query(pattern.as_ptr(), &mut count);
        NativeStringArray::from_raw(engine.api(), ptr, count)
    };
    let names = names.to_vec();
    log::trace!("{} matching {:?}: {}", what, pattern, names.len());
    Ok(names)
}

pub(crate) fn configure_options(engine: &Engine, pattern: &str) -> Result<Vec<String>> {
    list(engine, "configure options", engine.api().MagickQueryConfigureOptions, pattern)
}

pub(crate) fn formats(engine: &Engine, pattern: &str) -> Result<Vec<String>> {
    list(engine, "formats", engine.api().MagickQueryFormats, pattern)
}

pub(crate) fn fonts(engine: &Engine, pattern: &str) -> Result<Vec<String>> {
    list(engine, "fonts", engine.api().MagickQueryFonts, pattern)
}

/// A null answer means the option does not exist; an empty string is a value
pub(crate) fn configure_option(engine: &Engine, name: &str) -> Result<String> {
    engine.ensure_live()?;
    let option = c_string(name)?;
    // SAFETY: option is NUL-terminated; the value is ours to relinquish
    let value = unsafe {
        NativeString::from_raw(engine.api(), (engine.api().MagickQueryConfigureOption)(option.as_ptr()))
    };
    value
        .map(|value| value.to_string_lossy())
        .ok_or_else(|| MagickError::NotFound(format!("configure option {name:?}")))
}
