use super::*;
use proptest::prelude::*;

/// Surface that checks the buffer it is given and echoes imports back on export
struct EchoSurface {
    stored: Vec<u8>,
}

impl PixelSurface for EchoSurface {
    fn export_bytes(&self, descriptor: &PixelBufferDescriptor, out: &mut [u8]) -> Result<()> {
        descriptor.check_buffer(out.as_ptr(), out.len())?;
        if self.stored.len() == out.len() {
            out.copy_from_slice(&self.stored);
        }
        Ok(())
    }

    fn import_bytes(&mut self, descriptor: &PixelBufferDescriptor, data: &[u8]) -> Result<()> {
        descriptor.check_buffer(data.as_ptr(), data.len())?;
        self.stored = data.to_vec();
        Ok(())
    }
}

fn storage_strategy() -> impl Strategy<Value = StorageType> {
    prop::sample::select(StorageType::ALL.to_vec())
}

// Property: exported length is always width * height * channel_count
proptest! {
    #[test]
    fn prop_export_length(
        width in 1usize..48,
        height in 1usize..48,
        map in "[RGBACMYKIOPX]{1,6}",
        storage in storage_strategy(),
    ) {
        let surface = EchoSurface { stored: Vec::new() };
        let map = ChannelMap::new(&map).unwrap();
        let data = export_pixel_data(&surface, Region::full(width, height), &map, storage).unwrap();
        prop_assert_eq!(data.len(), width * height * map.channel_count());
        prop_assert_eq!(data.storage(), storage);
    }
}

// Property: importing then exporting the same region returns the same values
proptest! {
    #[test]
    fn prop_import_export_identity(
        width in 1usize..16,
        height in 1usize..16,
        seed in any::<u32>(),
    ) {
        let map = ChannelMap::new("RGB").unwrap();
        let region = Region::full(width, height);
        let pixels: Vec<f32> = (0..width * height * 3)
            .map(|i| ((i as u32).wrapping_mul(seed) % 1000) as f32 / 1000.0)
            .collect();

        let mut surface = EchoSurface { stored: Vec::new() };
        import_pixels(&mut surface, region, &map, &pixels).unwrap();
        let back: Vec<f32> = export_pixels(&surface, region, &map).unwrap();
        prop_assert_eq!(back, pixels);
    }
}

// Property: any length other than the exact element count is rejected
proptest! {
    #[test]
    fn prop_import_rejects_wrong_length(
        width in 1usize..16,
        height in 1usize..16,
        delta in 1usize..8,
        shorter in any::<bool>(),
    ) {
        let map = ChannelMap::new("RGBA").unwrap();
        let expected = width * height * 4;
        let len = if shorter { expected.saturating_sub(delta) } else { expected + delta };
        let pixels = vec![0u8; len];

        let mut surface = EchoSurface { stored: Vec::new() };
        let err = import_pixels(&mut surface, Region::full(width, height), &map, &pixels).unwrap_err();
        let is_length_mismatch = matches!(
            err,
            MagickError::Validation(ValidationError::LengthMismatch { .. })
        );
        prop_assert!(is_length_mismatch);
        prop_assert!(surface.stored.is_empty());
    }
}
