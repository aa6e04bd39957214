//! Translation of native exception codes
//!
//! The engine reports failures as a single numeric exception type. The hundreds
//! digit carries the severity (3xx warning, 4xx error, 7xx fatal) and the
//! remainder names the subsystem that raised it. Both halves are decoded here
//! so callers can match on them instead of on magic numbers.

use std::fmt;

/// How bad a native exception is
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// No exception was recorded
    Undefined,
    /// The operation completed but something was off
    Warning,
    /// The operation failed
    Error,
    /// The engine cannot continue
    Fatal,
}

impl Severity {
    pub fn from_code(code: u32) -> Self {
        match code {
            0..=299 => Severity::Undefined,
            300..=399 => Severity::Warning,
            400..=699 => Severity::Error,
            _ => Severity::Fatal,
        }
    }

    /// Whether an operation reporting this severity should be treated as failed
    pub fn is_failure(self) -> bool {
        matches!(self, Severity::Error | Severity::Fatal)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Severity::Undefined => "undefined",
            Severity::Warning => "warning",
            Severity::Error => "error",
            Severity::Fatal => "fatal",
        };
        f.write_str(name)
    }
}

/// Which engine subsystem raised the exception
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Undefined,
    ResourceLimit,
    Type,
    Option,
    Delegate,
    MissingDelegate,
    CorruptImage,
    FileOpen,
    Blob,
    Stream,
    Cache,
    Coder,
    Filter,
    Module,
    Draw,
    Image,
    Wand,
    Random,
    XServer,
    Monitor,
    Registry,
    Configure,
    Policy,
    /// A code this crate does not know about; the raw offset is kept
    Other(u32),
}

impl Category {
    pub fn from_code(code: u32) -> Self {
        if code < 300 {
            return Category::Undefined;
        }
        match code % 100 {
            0 => Category::ResourceLimit,
            5 => Category::Type,
            10 => Category::Option,
            15 => Category::Delegate,
            20 => Category::MissingDelegate,
            25 => Category::CorruptImage,
            30 => Category::FileOpen,
            35 => Category::Blob,
            40 => Category::Stream,
            45 => Category::Cache,
            50 => Category::Coder,
            52 => Category::Filter,
            55 => Category::Module,
            60 => Category::Draw,
            65 => Category::Image,
            70 => Category::Wand,
            75 => Category::Random,
            80 => Category::XServer,
            85 => Category::Monitor,
            90 => Category::Registry,
            95 => Category::Configure,
            99 => Category::Policy,
            other => Category::Other(other),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Other(offset) => write!(f, "category {}", offset),
            named => write!(f, "{:?}", named),
        }
    }
}
