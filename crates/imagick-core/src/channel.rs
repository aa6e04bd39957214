//! Channel maps: which channels a pixel buffer carries, in which order
//!
//! A map such as `"RGBA"` or `"KCMY"` is one token per channel. The engine reads
//! the map byte by byte, so the channel count here is the byte length of the map.
//! Whether a given token means anything is for the engine to decide; this module
//! only guarantees the count used to size buffers.

use std::ffi::CString;
use std::fmt;
use std::str::FromStr;

use crate::error::{MagickError, Result, ValidationError};

/// A single channel token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Red,
    Green,
    Blue,
    Alpha,
    /// Inverse alpha
    Opacity,
    Cyan,
    Magenta,
    Yellow,
    Black,
    Intensity,
    /// Skipped slot in the buffer
    Pad,
    /// Anything else; passed through for the engine to judge
    Other(u8),
}

impl Channel {
    pub fn from_token(token: u8) -> Self {
        match token {
            b'R' => Channel::Red,
            b'G' => Channel::Green,
            b'B' => Channel::Blue,
            b'A' => Channel::Alpha,
            b'O' => Channel::Opacity,
            b'C' => Channel::Cyan,
            b'M' => Channel::Magenta,
            b'Y' => Channel::Yellow,
            b'K' => Channel::Black,
            b'I' => Channel::Intensity,
            b'P' => Channel::Pad,
            other => Channel::Other(other),
        }
    }

    pub fn is_recognized(self) -> bool {
        !matches!(self, Channel::Other(_))
    }
}

/// A validated channel map
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChannelMap {
    map: String,
}

impl ChannelMap {
    /// Parse a map, rejecting only what can never reach the engine intact
    pub fn new(map: &str) -> Result<Self> {
        if map.is_empty() {
            return Err(ValidationError::EmptyChannelMap.into());
        }
        if map.as_bytes().contains(&0) {
            return Err(ValidationError::InteriorNul(map.to_string()).into());
        }
        Ok(Self {
            map: map.to_string(),
        })
    }

    /// Number of channel slots per pixel
    pub fn channel_count(&self) -> usize {
        self.map.len()
    }

    pub fn channels(&self) -> impl Iterator<Item = Channel> + '_ {
        self.map.bytes().map(Channel::from_token)
    }

    /// True when every token is one the engine documents
    pub fn is_fully_recognized(&self) -> bool {
        self.channels().all(Channel::is_recognized)
    }

    pub fn as_str(&self) -> &str {
        &self.map
    }

    /// NUL-terminated copy for the native call
    pub fn to_c_string(&self) -> Result<CString> {
        CString::new(self.map.as_str())
            .map_err(|_| MagickError::from(ValidationError::InteriorNul(self.map.clone())))
    }
}

impl FromStr for ChannelMap {
    type Err = MagickError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<&str> for ChannelMap {
    type Error = MagickError;

    fn try_from(value: &str) -> Result<Self> {
        Self::new(value)
    }
}

impl fmt::Display for ChannelMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.map)
    }
}
