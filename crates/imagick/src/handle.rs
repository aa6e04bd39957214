//! Exactly-once ownership of a native object
//!
//! [`OwnedHandle`] is the one place that stores a native pointer. The pointer
//! sits in an `Option`: `release` takes it out before calling the engine's
//! destroy function, so no path can destroy it twice. Every wand type wraps
//! one of these and gets clone, verify, release and exception translation
//! from it.

use std::marker::PhantomData;
use std::ptr::NonNull;

use imagick_core::{config, MagickError, NativeError, Result};
use imagick_sys::{ExceptionType, MagickApi, MagickBooleanType, MAGICK_TRUE, UNDEFINED_EXCEPTION};

use crate::engine::Engine;

/// Where a handle's native functions come from and whether they may be called
pub(crate) trait HandleContext: Copy {
    type Api: 'static;

    fn api(&self) -> &'static Self::Api;

    fn is_live(&self) -> bool;

    fn generation(&self) -> u64;
}

impl HandleContext for Engine {
    type Api = MagickApi;

    fn api(&self) -> &'static MagickApi {
        Engine::api(self)
    }

    fn is_live(&self) -> bool {
        Engine::is_live(self)
    }

    fn generation(&self) -> u64 {
        Engine::generation(self)
    }
}

pub(crate) type Api<K> = <<K as HandleKind>::Context as HandleContext>::Api;

/// The per-type native functions behind a handle
///
/// # Safety
/// Implementations must call the matching engine functions for `Raw`.
pub(crate) unsafe trait HandleKind {
    type Raw;
    type Context: HandleContext;

    /// Used in errors and logs
    const NAME: &'static str;

    unsafe fn destroy(api: &'static Api<Self>, raw: *mut Self::Raw);

    unsafe fn is_valid(api: &'static Api<Self>, raw: *const Self::Raw) -> bool;

    /// Severity and description of the pending exception, left pending
    unsafe fn exception(api: &'static Api<Self>, raw: *const Self::Raw) -> (ExceptionType, Option<String>);

    unsafe fn clear_exception(api: &'static Api<Self>, raw: *mut Self::Raw);
}

/// Handle kinds the engine can duplicate
///
/// # Safety
/// `clone_raw` must return a new, independently owned object or null.
pub(crate) unsafe trait CloneableKind: HandleKind {
    unsafe fn clone_raw(api: &'static Api<Self>, raw: *const Self::Raw) -> *mut Self::Raw;
}

/// Pending exception on `raw`, if any
///
/// # Safety
/// `raw` must be a live object of kind `K`.
pub(crate) unsafe fn read_exception<K: HandleKind>(api: &'static Api<K>, raw: *const K::Raw) -> Option<NativeError> {
    let (severity, description) = K::exception(api, raw);
    if severity == UNDEFINED_EXCEPTION {
        return None;
    }
    Some(NativeError::new(severity, description.unwrap_or_default()))
}

/// Read, clear and log the exception after a failed call
///
/// # Safety
/// `raw` must be a live object of kind `K`.
pub(crate) unsafe fn take_exception<K: HandleKind>(api: &'static Api<K>, raw: *mut K::Raw) -> NativeError {
    let err = read_exception::<K>(api, raw).unwrap_or_else(|| {
        NativeError::new(UNDEFINED_EXCEPTION, format!("{} call failed without an exception", K::NAME))
    });
    K::clear_exception(api, raw);
    if config::is_native_error_logging_enabled() {
        log::warn!("{}: {}", K::NAME, err);
    }
    err
}

pub(crate) struct OwnedHandle<K: HandleKind> {
    ptr: Option<NonNull<K::Raw>>,
    context: K::Context,
    _kind: PhantomData<K>,
}

// SAFETY: the engine lets a handle move between threads as long as it is
// never used from two at once, which `!Sync` guarantees.
unsafe impl<K: HandleKind> Send for OwnedHandle<K> {}

impl<K: HandleKind> OwnedHandle<K> {
    /// Take ownership of a freshly created object
    ///
    /// A null pointer means the engine could not allocate one.
    pub(crate) fn from_raw(context: K::Context, raw: *mut K::Raw) -> Result<Self> {
        let ptr = NonNull::new(raw).ok_or(MagickError::Allocation(K::NAME))?;
        log::debug!("Created {} {:p}", K::NAME, raw);
        Ok(Self {
            ptr: Some(ptr),
            context,
            _kind: PhantomData,
        })
    }

    /// A handle that owns nothing and never verifies
    pub(crate) fn empty(context: K::Context) -> Self {
        Self {
            ptr: None,
            context,
            _kind: PhantomData,
        }
    }

    pub(crate) fn engine(&self) -> K::Context {
        self.context
    }

    pub(crate) fn api(&self) -> &'static Api<K> {
        self.context.api()
    }

    /// The live pointer, or why there is none
    pub(crate) fn raw(&self) -> Result<*mut K::Raw> {
        let ptr = self.ptr.ok_or(MagickError::Destroyed(K::NAME))?;
        if !self.context.is_live() {
            return Err(MagickError::NotInitialized);
        }
        Ok(ptr.as_ptr())
    }

    pub(crate) fn is_verified(&self) -> bool {
        match self.ptr {
            // SAFETY: pointer is owned and the engine is running
            Some(ptr) if self.context.is_live() => unsafe { K::is_valid(self.api(), ptr.as_ptr()) },
            _ => false,
        }
    }

    /// Give the native object back to the engine; no-op after the first call
    pub(crate) fn release(&mut self) {
        let Some(ptr) = self.ptr.take() else {
            return;
        };
        if self.context.is_live() {
            log::debug!("Destroying {} {:p}", K::NAME, ptr.as_ptr());
            // SAFETY: the pointer was owned by this handle and has just been
            // taken out of it, so it cannot be destroyed again.
            unsafe { K::destroy(self.api(), ptr.as_ptr()) };
        } else {
            log::warn!(
                "{} {:p} outlived engine generation {}; leaking it",
                K::NAME,
                ptr.as_ptr(),
                self.context.generation()
            );
        }
    }

    /// Turn a native status into a result, collecting the exception on failure
    pub(crate) fn check(&self, status: MagickBooleanType) -> Result<()> {
        if status == MAGICK_TRUE {
            Ok(())
        } else {
            Err(self.take_error())
        }
    }

    /// Current exception, left in place
    pub(crate) fn exception(&self) -> Option<NativeError> {
        let raw = self.raw().ok()?;
        // SAFETY: live pointer
        unsafe { read_exception::<K>(self.api(), raw) }
    }

    pub(crate) fn clear_exception(&self) {
        if let Ok(raw) = self.raw() {
            // SAFETY: live pointer
            unsafe { K::clear_exception(self.api(), raw) };
        }
    }

    /// Read and clear the exception after a failed call
    pub(crate) fn take_error(&self) -> MagickError {
        match self.raw() {
            // SAFETY: live pointer
            Ok(raw) => unsafe { take_exception::<K>(self.api(), raw) }.into(),
            Err(err) => err,
        }
    }
}

impl<K: HandleKind> OwnedHandle<K> {
    /// After an ambiguous null result: the pending exception if it is a
    /// failure, otherwise `None` with any warning cleared
    pub(crate) fn take_failure(&self) -> Option<MagickError> {
        match self.exception() {
            Some(pending) if pending.severity.is_failure() => Some(self.take_error()),
            Some(_) => {
                self.clear_exception();
                None
            },
            None => None,
        }
    }
}

impl<K: CloneableKind> OwnedHandle<K> {
    /// Independent copy of the native object
    pub(crate) fn try_clone(&self) -> Result<Self> {
        let raw = self.raw()?;
        // SAFETY: live pointer; the copy is a new object owned by the result
        let copy = unsafe { K::clone_raw(self.api(), raw) };
        if copy.is_null() {
            return Err(self.take_error());
        }
        log::debug!("Cloned {} {:p} -> {:p}", K::NAME, raw, copy);
        Self::from_raw(self.context, copy)
    }

    /// Clone or, failing that, an empty handle
    pub(crate) fn clone_or_empty(&self) -> Self {
        self.try_clone().unwrap_or_else(|err| {
            log::warn!("Clone of {} failed: {}", K::NAME, err);
            Self::empty(self.context)
        })
    }
}

impl<K: HandleKind> Drop for OwnedHandle<K> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<K: HandleKind> std::fmt::Debug for OwnedHandle<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct(K::NAME)
            .field("ptr", &self.ptr)
            .field("generation", &self.context.generation())
            .finish()
    }
}

/// Declare a [`HandleKind`] from the engine's function names
macro_rules! handle_kind {
    (
        $kind:ident, $raw:ty, $name:literal,
        destroy: $destroy:ident,
        is_valid: $is_valid:ident,
        exception: $exception:ident,
        clear: $clear:ident
        $(, clone: $clone:ident)? $(,)?
    ) => {
        pub(crate) struct $kind;

        // SAFETY: the named functions are the engine's own for this type
        unsafe impl $crate::handle::HandleKind for $kind {
            type Raw = $raw;
            type Context = $crate::engine::Engine;

            const NAME: &'static str = $name;

            unsafe fn destroy(api: &'static imagick_sys::MagickApi, raw: *mut $raw) {
                (api.$destroy)(raw);
            }

            unsafe fn is_valid(api: &'static imagick_sys::MagickApi, raw: *const $raw) -> bool {
                (api.$is_valid)(raw) == imagick_sys::MAGICK_TRUE
            }

            unsafe fn exception(
                api: &'static imagick_sys::MagickApi,
                raw: *const $raw,
            ) -> (imagick_sys::ExceptionType, Option<String>) {
                let mut severity = imagick_sys::UNDEFINED_EXCEPTION;
                let description = $crate::memory::NativeString::from_raw(api, (api.$exception)(raw, &mut severity));
                (severity, description.map(|d| d.to_string_lossy()))
            }

            unsafe fn clear_exception(api: &'static imagick_sys::MagickApi, raw: *mut $raw) {
                (api.$clear)(raw);
            }
        }

        $(
            // SAFETY: the engine's clone returns a new object or null
            unsafe impl $crate::handle::CloneableKind for $kind {
                unsafe fn clone_raw(api: &'static imagick_sys::MagickApi, raw: *const $raw) -> *mut $raw {
                    (api.$clone)(raw)
                }
            }
        )?
    };
}

pub(crate) use handle_kind;
