//! Marshaling against an in-memory RGBA image
//!
//! The surface below lays bytes out the way the engine does: row-major over
//! the region, one value per map token per pixel.

use imagick_core::{
    export_pixel_data, export_pixels, import_pixel_data, import_pixels, ChannelMap, MagickError,
    NativeError, PixelBufferDescriptor, PixelData, PixelSurface, Region, Result, StorageType,
    ValidationError,
};

/// 8-bit RGBA image
struct MemoryImage {
    width: usize,
    height: usize,
    rgba: Vec<[u8; 4]>,
}

impl MemoryImage {
    fn gradient(width: usize, height: usize) -> Self {
        let rgba = (0..width * height)
            .map(|i| {
                let (x, y) = (i % width, i / width);
                [x as u8, y as u8, (x + y) as u8, 255]
            })
            .collect();
        Self {
            width,
            height,
            rgba,
        }
    }

    fn pixel_indices(&self, region: Region) -> Result<Vec<usize>> {
        let inside = region.x >= 0
            && region.y >= 0
            && region.x as usize + region.width <= self.width
            && region.y as usize + region.height <= self.height;
        if !inside {
            // ImageMagick reports 445 (OptionError) for regions it cannot satisfy
            return Err(NativeError::new(445, "geometry does not contain image").into());
        }
        let (x0, y0) = (region.x as usize, region.y as usize);
        Ok((y0..y0 + region.height)
            .flat_map(|y| (x0..x0 + region.width).map(move |x| y * self.width + x))
            .collect())
    }
}

fn channel_index(token: char) -> Result<usize> {
    match token {
        'R' => Ok(0),
        'G' => Ok(1),
        'B' => Ok(2),
        'A' => Ok(3),
        other => Err(NativeError::new(410, format!("unrecognized pixel map `{other}'")).into()),
    }
}

fn require_char(descriptor: &PixelBufferDescriptor) -> Result<()> {
    match descriptor.storage() {
        StorageType::Char => Ok(()),
        other => Err(ValidationError::UnsupportedStorage(other.to_string()).into()),
    }
}

impl PixelSurface for MemoryImage {
    fn export_bytes(&self, descriptor: &PixelBufferDescriptor, out: &mut [u8]) -> Result<()> {
        descriptor.check_buffer(out.as_ptr(), out.len())?;
        require_char(descriptor)?;
        let channels = descriptor
            .map()
            .as_str()
            .chars()
            .map(channel_index)
            .collect::<Result<Vec<_>>>()?;
        let mut cursor = out.iter_mut();
        for index in self.pixel_indices(descriptor.region())? {
            for &channel in &channels {
                if let Some(slot) = cursor.next() {
                    *slot = self.rgba[index][channel];
                }
            }
        }
        Ok(())
    }

    fn import_bytes(&mut self, descriptor: &PixelBufferDescriptor, data: &[u8]) -> Result<()> {
        descriptor.check_buffer(data.as_ptr(), data.len())?;
        require_char(descriptor)?;
        let channels = descriptor
            .map()
            .as_str()
            .chars()
            .map(channel_index)
            .collect::<Result<Vec<_>>>()?;
        let mut values = data.iter();
        for index in self.pixel_indices(descriptor.region())? {
            for &channel in &channels {
                if let Some(&value) = values.next() {
                    self.rgba[index][channel] = value;
                }
            }
        }
        Ok(())
    }
}

fn map(text: &str) -> ChannelMap {
    ChannelMap::new(text).unwrap()
}

#[test]
fn test_subregion_is_row_major() {
    let _ = env_logger::builder().is_test(true).try_init();
    let image = MemoryImage::gradient(8, 8);

    let pixels: Vec<u8> = export_pixels(&image, Region::new(2, 3, 3, 2), &map("RG")).unwrap();
    assert_eq!(pixels, vec![2, 3, 3, 3, 4, 3, 2, 4, 3, 4, 4, 4]);
}

#[test]
fn test_map_order_is_respected() {
    let image = MemoryImage::gradient(4, 4);

    let rgb: Vec<u8> = export_pixels(&image, Region::new(1, 2, 1, 1), &map("RGB")).unwrap();
    let bgr: Vec<u8> = export_pixels(&image, Region::new(1, 2, 1, 1), &map("BGR")).unwrap();
    assert_eq!(rgb, vec![1, 2, 3]);
    assert_eq!(bgr, vec![3, 2, 1]);
}

#[test]
fn test_import_touches_only_its_region() {
    let mut image = MemoryImage::gradient(4, 4);
    let before = image.rgba.clone();

    import_pixels(&mut image, Region::new(1, 1, 2, 2), &map("A"), &[0u8; 4]).unwrap();

    for (i, (old, new)) in before.iter().zip(&image.rgba).enumerate() {
        let (x, y) = (i % 4, i / 4);
        let inside = (1..3).contains(&x) && (1..3).contains(&y);
        assert_eq!(new[3], if inside { 0 } else { 255 }, "pixel {x},{y}");
        assert_eq!(new[..3], old[..3]);
    }
}

#[test]
fn test_pixel_data_round_trip() {
    let mut image = MemoryImage::gradient(6, 5);
    let region = Region::full(6, 5);

    let data = export_pixel_data(&image, region, &map("RGBA"), StorageType::Char).unwrap();
    let inverted: Vec<u8> = data.as_bytes().iter().map(|v| 255 - v).collect();
    import_pixel_data(&mut image, region, &map("RGBA"), &PixelData::from(inverted.clone())).unwrap();

    let back = export_pixel_data(&image, region, &map("RGBA"), StorageType::Char).unwrap();
    assert_eq!(back.into_vec::<u8>().unwrap(), inverted);
}

#[test]
fn test_surface_errors_pass_through() {
    let image = MemoryImage::gradient(4, 4);

    let err = export_pixels::<u8, _>(&image, Region::new(3, 3, 2, 2), &map("R")).unwrap_err();
    let native = err.native().unwrap();
    assert_eq!(native.code, 445);
    assert!(native.description.contains("geometry"));

    let err = export_pixels::<u8, _>(&image, Region::full(1, 1), &map("K")).unwrap_err();
    assert_eq!(err.native().map(|n| n.code), Some(410));

    let err = export_pixels::<f32, _>(&image, Region::full(1, 1), &map("R")).unwrap_err();
    assert!(matches!(
        err,
        MagickError::Validation(ValidationError::UnsupportedStorage(_))
    ));
}
