//! Error types for imagick

use crate::exception::{Category, Severity};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, MagickError>;

/// Main error type for imagick
#[derive(Debug, Error)]
pub enum MagickError {
    /// Input rejected before anything reached the engine
    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),

    /// The engine returned a failure status
    #[error("Native call failed: {0}")]
    Native(#[from] NativeError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Empty or invalid input: {0}")]
    EmptyInput(String),

    #[error("Engine is not initialized")]
    NotInitialized,

    #[error("{0} handle has already been destroyed")]
    Destroyed(&'static str),

    #[error("Engine could not allocate a {0}")]
    Allocation(&'static str),

    #[error("Native library unavailable: {0}")]
    Library(String),
}

impl MagickError {
    /// The native exception behind this error, if the engine raised one
    pub fn native(&self) -> Option<&NativeError> {
        match self {
            MagickError::Native(err) => Some(err),
            _ => None,
        }
    }
}

/// Eager input validation failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Region must be non-empty: {width}x{height}")]
    EmptyRegion { width: usize, height: usize },

    #[error("Region {width}x{height} with {channels} channels overflows the address space")]
    RegionTooLarge {
        width: usize,
        height: usize,
        channels: usize,
    },

    #[error("Channel map is empty")]
    EmptyChannelMap,

    #[error("String contains an interior NUL byte: {0:?}")]
    InteriorNul(String),

    #[error("Unsupported storage type: {0}")]
    UnsupportedStorage(String),

    #[error("Pixel data has {actual} elements, region needs {expected}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("Storage mismatch: expected {expected}, got {actual}")]
    StorageMismatch {
        expected: &'static str,
        actual: &'static str,
    },

    #[error("Pixel buffer has {actual} bytes, descriptor needs {expected}")]
    BufferSize { expected: usize, actual: usize },

    #[error("Pixel buffer is not aligned to {alignment} bytes")]
    Misaligned { alignment: usize },
}

/// A failure reported by the engine itself
///
/// The description is the engine's own text, unmodified.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{severity} ({category}, code {code}): {description}")]
pub struct NativeError {
    pub code: u32,
    pub severity: Severity,
    pub category: Category,
    pub description: String,
}

impl NativeError {
    pub fn new(code: u32, description: impl Into<String>) -> Self {
        Self {
            code,
            severity: Severity::from_code(code),
            category: Category::from_code(code),
            description: description.into(),
        }
    }
}
