//! Engine-allocated memory, owned only for as long as it takes to copy it out
//!
//! Strings, string arrays and blobs returned by the engine belong to the
//! caller and must go back through `MagickRelinquishMemory`. The guards here
//! do that on drop, so an early return or a panic while copying never leaks.

use std::ffi::{CStr, CString};
use std::ptr::NonNull;

use imagick_core::{Result, ValidationError};
use imagick_sys::MagickApi;
use libc::{c_char, c_uchar, c_void};

/// A NUL-terminated string the engine allocated
pub(crate) struct NativeString {
    api: &'static MagickApi,
    ptr: NonNull<c_char>,
}

impl NativeString {
    /// # Safety
    /// `ptr` must be null or a NUL-terminated string allocated by the engine
    /// and not owned by anything else.
    pub(crate) unsafe fn from_raw(api: &'static MagickApi, ptr: *mut c_char) -> Option<Self> {
        NonNull::new(ptr).map(|ptr| Self { api, ptr })
    }

    pub(crate) fn to_string_lossy(&self) -> String {
        // SAFETY: non-null and NUL-terminated per from_raw's contract
        unsafe { CStr::from_ptr(self.ptr.as_ptr()) }
            .to_string_lossy()
            .into_owned()
    }
}

impl Drop for NativeString {
    fn drop(&mut self) {
        // SAFETY: allocated by the engine and owned by us
        unsafe {
            (self.api.MagickRelinquishMemory)(self.ptr.as_ptr().cast::<c_void>());
        }
    }
}

/// A `char **` plus its count, as returned by the query calls
pub(crate) struct NativeStringArray {
    api: &'static MagickApi,
    ptr: *mut *mut c_char,
    len: usize,
}

impl NativeStringArray {
    /// # Safety
    /// `ptr` must be null or point to `len` engine-allocated strings (each
    /// possibly null) in an engine-allocated array.
    pub(crate) unsafe fn from_raw(api: &'static MagickApi, ptr: *mut *mut c_char, len: usize) -> Self {
        Self { api, ptr, len }
    }

    fn items(&self) -> &[*mut c_char] {
        if self.ptr.is_null() || self.len == 0 {
            return &[];
        }
        // SAFETY: from_raw's contract
        unsafe { std::slice::from_raw_parts(self.ptr, self.len) }
    }

    pub(crate) fn to_vec(&self) -> Vec<String> {
        self.items()
            .iter()
            .filter(|item| !item.is_null())
            // SAFETY: each non-null item is a NUL-terminated string
            .map(|&item| unsafe { CStr::from_ptr(item) }.to_string_lossy().into_owned())
            .collect()
    }
}

impl Drop for NativeStringArray {
    fn drop(&mut self) {
        if self.ptr.is_null() {
            return;
        }
        // SAFETY: the array and every element were allocated by the engine
        unsafe {
            for &item in self.items() {
                if !item.is_null() {
                    (self.api.MagickRelinquishMemory)(item.cast::<c_void>());
                }
            }
            (self.api.MagickRelinquishMemory)(self.ptr.cast::<c_void>());
        }
    }
}

/// Copy an engine-allocated byte buffer and relinquish it
///
/// # Safety
/// `ptr` must be null or point to `len` bytes allocated by the engine.
pub(crate) unsafe fn take_blob(api: &'static MagickApi, ptr: *mut c_uchar, len: usize) -> Option<Vec<u8>> {
    if ptr.is_null() {
        return None;
    }
    let bytes = if len == 0 {
        Vec::new()
    } else {
        std::slice::from_raw_parts(ptr, len).to_vec()
    };
    (api.MagickRelinquishMemory)(ptr.cast::<c_void>());
    Some(bytes)
}

/// NUL-terminated copy of a caller string
pub(crate) fn c_string(value: &str) -> Result<CString> {
    CString::new(value).map_err(|_| ValidationError::InteriorNul(value.to_string()).into())
}
