//! Engine teardown and restart
//!
//! Terminating the engine affects the whole process, so this binary holds a
//! single test and nothing else runs beside it.

use imagick::prelude::*;

#[test]
fn test_terminate_and_restart() -> anyhow::Result<()> {
    let _ = env_logger::builder().is_test(true).try_init();
    let Ok(engine) = Engine::initialize() else {
        eprintln!("Skipping test: MagickWand library not available");
        return Ok(());
    };
    assert!(engine.is_instantiated());

    let mut wand = MagickWand::new(&engine)?;
    wand.read_image("logo:")?;
    let mut pixel = PixelWand::with_color(&engine, "red")?;
    assert!(wand.is_verified());

    // SAFETY: no handle is in use on another thread
    unsafe { engine.terminate() };
    assert!(!engine.is_live());
    assert!(Engine::current().is_none());

    // Handles from the ended generation are inert
    assert!(!wand.is_verified());
    assert!(!pixel.is_verified());
    assert!(matches!(wand.image_width(), Err(MagickError::NotInitialized)));
    assert!(matches!(MagickWand::new(&engine), Err(MagickError::NotInitialized)));
    assert!(matches!(engine.query_formats("*"), Err(MagickError::NotInitialized)));
    // Release after teardown leaks instead of calling into the engine
    pixel.destroy();
    pixel.destroy();

    // Terminating an ended generation again does nothing
    // SAFETY: as above
    unsafe { engine.terminate() };

    let restarted = Engine::initialize()?;
    assert!(restarted.generation() > engine.generation());
    assert!(restarted.is_live());
    assert!(!engine.is_live());

    let fresh = MagickWand::new(&restarted)?;
    assert!(fresh.is_verified());

    // The old wand stays dead in the new generation
    assert!(!wand.is_verified());
    drop(wand);
    Ok(())
}
