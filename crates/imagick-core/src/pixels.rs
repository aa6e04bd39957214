//! Pixel marshaling between native packed buffers and typed vectors
//!
//! Every transfer is described by a [`PixelBufferDescriptor`]: a region, a
//! channel map and a storage type. The descriptor is validated before anything
//! touches the engine, and it fixes the exact element count of the buffer:
//! `width * height * channel_count`.
//!
//! Two entry points exist for each direction. The generic ones
//! ([`export_pixels`], [`import_pixels`]) pick the storage type from the element
//! type, so `export_pixels::<f32, _>` always yields `Vec<f32>`. The tagged ones
//! ([`export_pixel_data`], [`import_pixel_data`]) take the storage type at runtime
//! and carry the result in [`PixelData`].

use bytemuck::Pod;

use crate::channel::ChannelMap;
use crate::error::{Result, ValidationError};
use crate::traits::PixelSurface;
use crate::types::{Region, StorageType};

mod private {
    pub trait Sealed {}
}

/// A host element type with a native storage counterpart
///
/// Implemented for `u8`, `u16`, `u32`, `f32` and `f64` only.
pub trait PixelElement: Pod + private::Sealed + Send + Sync + 'static {
    const STORAGE: StorageType;

    fn into_data(pixels: Vec<Self>) -> PixelData;

    fn from_data(data: &PixelData) -> Option<&[Self]>;

    fn take_data(data: PixelData) -> Option<Vec<Self>>;
}

macro_rules! pixel_element {
    ($ty:ty, $variant:ident) => {
        impl private::Sealed for $ty {}

        impl PixelElement for $ty {
            const STORAGE: StorageType = StorageType::$variant;

            fn into_data(pixels: Vec<Self>) -> PixelData {
                PixelData::$variant(pixels)
            }

            fn from_data(data: &PixelData) -> Option<&[Self]> {
                match data {
                    PixelData::$variant(pixels) => Some(pixels),
                    _ => None,
                }
            }

            fn take_data(data: PixelData) -> Option<Vec<Self>> {
                match data {
                    PixelData::$variant(pixels) => Some(pixels),
                    _ => None,
                }
            }
        }
    };
}

pixel_element!(u8, Char);
pixel_element!(u16, Short);
pixel_element!(u32, Integer);
pixel_element!(f32, Float);
pixel_element!(f64, Double);

/// Region, channel map and storage type of one pixel transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBufferDescriptor {
    region: Region,
    map: ChannelMap,
    storage: StorageType,
    element_count: usize,
}

impl PixelBufferDescriptor {
    pub fn new(region: Region, map: ChannelMap, storage: StorageType) -> Result<Self> {
        if region.width == 0 || region.height == 0 {
            return Err(ValidationError::EmptyRegion {
                width: region.width,
                height: region.height,
            }
            .into());
        }

        let channels = map.channel_count();
        let too_large = ValidationError::RegionTooLarge {
            width: region.width,
            height: region.height,
            channels,
        };
        let element_count = region
            .pixel_count()
            .and_then(|pixels| pixels.checked_mul(channels))
            .ok_or_else(|| too_large.clone())?;
        // The byte length must be addressable as well
        element_count
            .checked_mul(storage.byte_width())
            .filter(|bytes| *bytes <= isize::MAX as usize)
            .ok_or(too_large)?;

        Ok(Self {
            region,
            map,
            storage,
            element_count,
        })
    }

    pub fn region(&self) -> Region {
        self.region
    }

    pub fn map(&self) -> &ChannelMap {
        &self.map
    }

    pub fn storage(&self) -> StorageType {
        self.storage
    }

    /// Elements in the buffer: width * height * channel_count
    pub fn element_count(&self) -> usize {
        self.element_count
    }

    /// Bytes in the buffer; validated not to overflow at construction
    pub fn byte_len(&self) -> usize {
        self.element_count * self.storage.byte_width()
    }

    /// Check a raw buffer before handing it to the engine
    pub fn check_buffer(&self, ptr: *const u8, len: usize) -> Result<()> {
        if len != self.byte_len() {
            return Err(ValidationError::BufferSize {
                expected: self.byte_len(),
                actual: len,
            }
            .into());
        }
        let alignment = self.storage.alignment();
        if (ptr as usize) % alignment != 0 {
            return Err(ValidationError::Misaligned { alignment }.into());
        }
        Ok(())
    }
}

/// Pixels whose element type was chosen at runtime
#[derive(Debug, Clone, PartialEq)]
pub enum PixelData {
    Char(Vec<u8>),
    Short(Vec<u16>),
    Integer(Vec<u32>),
    Float(Vec<f32>),
    Double(Vec<f64>),
}

impl PixelData {
    pub fn storage(&self) -> StorageType {
        match self {
            PixelData::Char(_) => StorageType::Char,
            PixelData::Short(_) => StorageType::Short,
            PixelData::Integer(_) => StorageType::Integer,
            PixelData::Float(_) => StorageType::Float,
            PixelData::Double(_) => StorageType::Double,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            PixelData::Char(p) => p.len(),
            PixelData::Short(p) => p.len(),
            PixelData::Integer(p) => p.len(),
            PixelData::Float(p) => p.len(),
            PixelData::Double(p) => p.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Native byte layout of the elements
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            PixelData::Char(p) => p,
            PixelData::Short(p) => bytemuck::cast_slice(p),
            PixelData::Integer(p) => bytemuck::cast_slice(p),
            PixelData::Float(p) => bytemuck::cast_slice(p),
            PixelData::Double(p) => bytemuck::cast_slice(p),
        }
    }

    pub fn as_slice<T: PixelElement>(&self) -> Option<&[T]> {
        T::from_data(self)
    }

    /// Unwrap into a typed vector, failing if the storage type differs
    pub fn into_vec<T: PixelElement>(self) -> Result<Vec<T>> {
        let actual = self.storage();
        T::take_data(self).ok_or_else(|| {
            ValidationError::StorageMismatch {
                expected: T::STORAGE.name(),
                actual: actual.name(),
            }
            .into()
        })
    }
}

impl<T: PixelElement> From<Vec<T>> for PixelData {
    fn from(pixels: Vec<T>) -> Self {
        T::into_data(pixels)
    }
}

/// Read a region out of `surface` as `T` elements
///
/// The returned vector always holds exactly
/// `width * height * map.channel_count()` elements. Nothing is returned when
/// the engine fails.
pub fn export_pixels<T, S>(surface: &S, region: Region, map: &ChannelMap) -> Result<Vec<T>>
where
    T: PixelElement,
    S: PixelSurface + ?Sized,
{
    let descriptor = PixelBufferDescriptor::new(region, map.clone(), T::STORAGE)?;
    let mut pixels = vec![T::zeroed(); descriptor.element_count()];

    log::trace!(
        "export {}x{}+{}+{} map={} storage={}",
        region.width,
        region.height,
        region.x,
        region.y,
        map,
        T::STORAGE
    );
    surface.export_bytes(&descriptor, bytemuck::cast_slice_mut(&mut pixels))?;

    debug_assert_eq!(pixels.len(), descriptor.element_count());
    Ok(pixels)
}

/// Write `pixels` into a region of `surface`
///
/// A length that does not match the region is rejected without calling the engine.
pub fn import_pixels<T, S>(
    surface: &mut S,
    region: Region,
    map: &ChannelMap,
    pixels: &[T],
) -> Result<()>
where
    T: PixelElement,
    S: PixelSurface + ?Sized,
{
    let descriptor = PixelBufferDescriptor::new(region, map.clone(), T::STORAGE)?;
    if pixels.len() != descriptor.element_count() {
        return Err(ValidationError::LengthMismatch {
            expected: descriptor.element_count(),
            actual: pixels.len(),
        }
        .into());
    }

    log::trace!(
        "import {}x{}+{}+{} map={} storage={}",
        region.width,
        region.height,
        region.x,
        region.y,
        map,
        T::STORAGE
    );
    surface.import_bytes(&descriptor, bytemuck::cast_slice(pixels))
}

/// [`export_pixels`] with the storage type picked at runtime
pub fn export_pixel_data<S>(
    surface: &S,
    region: Region,
    map: &ChannelMap,
    storage: StorageType,
) -> Result<PixelData>
where
    S: PixelSurface + ?Sized,
{
    Ok(match storage {
        StorageType::Char => PixelData::Char(export_pixels(surface, region, map)?),
        StorageType::Short => PixelData::Short(export_pixels(surface, region, map)?),
        StorageType::Integer => PixelData::Integer(export_pixels(surface, region, map)?),
        StorageType::Float => PixelData::Float(export_pixels(surface, region, map)?),
        StorageType::Double => PixelData::Double(export_pixels(surface, region, map)?),
    })
}

/// [`import_pixels`] for pixels held in a [`PixelData`]
pub fn import_pixel_data<S>(
    surface: &mut S,
    region: Region,
    map: &ChannelMap,
    data: &PixelData,
) -> Result<()>
where
    S: PixelSurface + ?Sized,
{
    match data {
        PixelData::Char(p) => import_pixels(surface, region, map, p),
        PixelData::Short(p) => import_pixels(surface, region, map, p),
        PixelData::Integer(p) => import_pixels(surface, region, map, p),
        PixelData::Float(p) => import_pixels(surface, region, map, p),
        PixelData::Double(p) => import_pixels(surface, region, map, p),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MagickError;
    use std::cell::Cell;

    /// Surface that fills exports with a ramp and records every call
    struct RampSurface {
        calls: Cell<usize>,
        imported: Vec<u8>,
        fail: bool,
    }

    impl RampSurface {
        fn new() -> Self {
            Self {
                calls: Cell::new(0),
                imported: Vec::new(),
                fail: false,
            }
        }
    }

    impl PixelSurface for RampSurface {
        fn export_bytes(&self, descriptor: &PixelBufferDescriptor, out: &mut [u8]) -> Result<()> {
            self.calls.set(self.calls.get() + 1);
            descriptor.check_buffer(out.as_ptr(), out.len())?;
            if self.fail {
                return Err(crate::NativeError::new(410, "UnrecognizedPixelMap `Q'").into());
            }
            for (i, byte) in out.iter_mut().enumerate() {
                *byte = (i % 251) as u8;
            }
            Ok(())
        }

        fn import_bytes(&mut self, descriptor: &PixelBufferDescriptor, data: &[u8]) -> Result<()> {
            self.calls.set(self.calls.get() + 1);
            descriptor.check_buffer(data.as_ptr(), data.len())?;
            self.imported = data.to_vec();
            Ok(())
        }
    }

    fn map(s: &str) -> ChannelMap {
        ChannelMap::new(s).unwrap()
    }

    #[test]
    fn test_export_length_matches_region() {
        let surface = RampSurface::new();
        let region = Region::new(0, 0, 7, 5);

        let rgb: Vec<f32> = export_pixels(&surface, region, &map("RGB")).unwrap();
        assert_eq!(rgb.len(), 7 * 5 * 3);

        let rgba: Vec<f64> = export_pixels(&surface, region, &map("RGBA")).unwrap();
        assert_eq!(rgba.len(), 7 * 5 * 4);

        let red: Vec<u8> = export_pixels(&surface, region, &map("R")).unwrap();
        assert_eq!(red.len(), 7 * 5);

        let gb: Vec<u16> = export_pixels(&surface, region, &map("GB")).unwrap();
        assert_eq!(gb.len(), 7 * 5 * 2);
    }

    #[test]
    fn test_zero_width_never_reaches_surface() {
        let surface = RampSurface::new();
        let err = export_pixels::<f32, _>(&surface, Region::new(0, 0, 0, 10), &map("RGB"))
            .unwrap_err();
        assert!(matches!(
            err,
            MagickError::Validation(ValidationError::EmptyRegion { width: 0, height: 10 })
        ));

        let err = export_pixels::<f32, _>(&surface, Region::new(0, 0, 10, 0), &map("RGB"))
            .unwrap_err();
        assert!(matches!(err, MagickError::Validation(_)));
        assert_eq!(surface.calls.get(), 0);
    }

    #[test]
    fn test_import_length_mismatch_never_reaches_surface() {
        let mut surface = RampSurface::new();
        let pixels = vec![0.5f32; 2 * 2 * 3 - 1];
        let err = import_pixels(&mut surface, Region::new(0, 0, 2, 2), &map("RGB"), &pixels)
            .unwrap_err();
        assert!(matches!(
            err,
            MagickError::Validation(ValidationError::LengthMismatch {
                expected: 12,
                actual: 11
            })
        ));
        assert_eq!(surface.calls.get(), 0);
    }

    #[test]
    fn test_import_passes_native_layout() {
        let mut surface = RampSurface::new();
        let pixels = [1.0f32, 0.5, 0.25];
        import_pixels(&mut surface, Region::new(3, 4, 1, 1), &map("RGB"), &pixels).unwrap();

        let expected: Vec<u8> = pixels.iter().flat_map(|p| p.to_ne_bytes()).collect();
        assert_eq!(surface.imported, expected);
    }

    #[test]
    fn test_native_failure_surfaces_error() {
        let mut surface = RampSurface::new();
        surface.fail = true;
        let err = export_pixels::<u8, _>(&surface, Region::new(0, 0, 1, 1), &map("Q"))
            .unwrap_err();
        let native = err.native().unwrap();
        assert_eq!(native.description, "UnrecognizedPixelMap `Q'");
    }

    #[test]
    fn test_overflowing_region_rejected() {
        let err = PixelBufferDescriptor::new(
            Region::new(0, 0, usize::MAX, 2),
            map("RGB"),
            StorageType::Double,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            MagickError::Validation(ValidationError::RegionTooLarge { .. })
        ));
    }

    #[test]
    fn test_check_buffer_rejects_wrong_size() {
        let descriptor =
            PixelBufferDescriptor::new(Region::new(0, 0, 2, 2), map("RGBA"), StorageType::Short)
                .unwrap();
        assert_eq!(descriptor.byte_len(), 2 * 2 * 4 * 2);

        let buffer = vec![0u16; 15];
        let bytes: &[u8] = bytemuck::cast_slice(&buffer);
        assert!(matches!(
            descriptor.check_buffer(bytes.as_ptr(), bytes.len()),
            Err(MagickError::Validation(ValidationError::BufferSize {
                expected: 32,
                actual: 30
            }))
        ));
    }

    #[test]
    fn test_pixel_data_matches_requested_storage() {
        let surface = RampSurface::new();
        let region = Region::new(0, 0, 4, 3);
        for storage in StorageType::ALL {
            let data = export_pixel_data(&surface, region, &map("RGB"), storage).unwrap();
            assert_eq!(data.storage(), storage);
            assert_eq!(data.len(), 4 * 3 * 3);
            assert_eq!(data.as_bytes().len(), 4 * 3 * 3 * storage.byte_width());
        }
    }

    #[test]
    fn test_pixel_data_round_trip_through_surface() {
        let mut surface = RampSurface::new();
        let region = Region::new(0, 0, 3, 3);
        let data = export_pixel_data(&surface, region, &map("CMYK"), StorageType::Integer).unwrap();
        import_pixel_data(&mut surface, region, &map("CMYK"), &data).unwrap();
        assert_eq!(surface.imported, data.as_bytes());
    }

    #[test]
    fn test_into_vec_checks_storage() {
        let data = PixelData::from(vec![1u16, 2, 3]);
        assert_eq!(data.as_slice::<u16>(), Some(&[1u16, 2, 3][..]));
        assert!(data.as_slice::<f32>().is_none());

        let err = data.clone().into_vec::<f64>().unwrap_err();
        assert!(matches!(
            err,
            MagickError::Validation(ValidationError::StorageMismatch {
                expected: "double",
                actual: "short"
            })
        ));
        assert_eq!(data.into_vec::<u16>().unwrap(), vec![1, 2, 3]);
    }
}
