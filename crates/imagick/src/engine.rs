//! Process-wide engine state and the token that proves it is up
//!
//! The engine keeps global state (module registry, caches, resource limits)
//! that must be set up before the first wand exists. [`Engine::initialize`]
//! loads the library and runs genesis; the returned [`Engine`] token is what
//! every constructor asks for.
//!
//! Each genesis starts a new *generation*. Handles remember the generation
//! they were born in; once [`Engine::terminate`] ends it, those handles stop
//! reporting as verified and their release turns into a logged leak rather
//! than a call into torn-down state. There is no reference count: callers
//! must not terminate while a handle is in use.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;

use imagick_core::{EngineConfig, MagickError, Result};
use imagick_sys::{MagickApi, MAGICK_TRUE};
use parking_lot::Mutex;

use crate::query;

/// The library is loaded once and never unloaded
static API: OnceLock<MagickApi> = OnceLock::new();

/// Serializes genesis and terminus
static LIFECYCLE: Mutex<()> = parking_lot::const_mutex(());

/// Generation currently running, 0 when the engine is down
static LIVE_GENERATION: AtomicU64 = AtomicU64::new(0);

static LAST_GENERATION: AtomicU64 = AtomicU64::new(0);

/// Proof that the engine was initialized
///
/// Cheap to copy. Hand it to constructors such as
/// [`MagickWand::new`](crate::MagickWand::new).
#[derive(Debug, Clone, Copy)]
pub struct Engine {
    api: &'static MagickApi,
    generation: u64,
}

impl Engine {
    /// Load the engine as configured by the environment and start it
    ///
    /// Safe to call any number of times; while the engine is running every
    /// call returns a token for the same generation.
    pub fn initialize() -> Result<Self> {
        Self::initialize_with(&EngineConfig::from_env())
    }

    /// Like [`Engine::initialize`] with an explicit configuration
    ///
    /// The configuration only matters for the first successful load; the
    /// library stays loaded for the life of the process.
    pub fn initialize_with(config: &EngineConfig) -> Result<Self> {
        let _guard = LIFECYCLE.lock();
        let api = load_api(config)?;

        let live = LIVE_GENERATION.load(Ordering::SeqCst);
        if live != 0 {
            log::trace!("Engine already running (generation {})", live);
            return Ok(Self {
                api,
                generation: live,
            });
        }

        // SAFETY: genesis has no preconditions; the lock keeps it from racing
        // terminus.
        unsafe { (api.MagickWandGenesis)() };
        let generation = LAST_GENERATION.fetch_add(1, Ordering::SeqCst) + 1;
        LIVE_GENERATION.store(generation, Ordering::SeqCst);
        log::debug!("Engine started (generation {})", generation);

        Ok(Self { api, generation })
    }

    /// Token for the running engine, if there is one
    pub fn current() -> Option<Self> {
        let api = API.get()?;
        match LIVE_GENERATION.load(Ordering::SeqCst) {
            0 => None,
            generation => Some(Self { api, generation }),
        }
    }

    /// Tear the engine down
    ///
    /// Every handle from this generation becomes inert: `is_verified` turns
    /// false, operations fail with [`MagickError::NotInitialized`] and drops
    /// no longer call into the engine. Terminating a generation that already
    /// ended does nothing.
    ///
    /// # Safety
    /// No handle, on any thread, may be inside an engine call while this
    /// runs. Nothing checks this.
    pub unsafe fn terminate(self) {
        let _guard = LIFECYCLE.lock();
        if LIVE_GENERATION.load(Ordering::SeqCst) != self.generation {
            log::debug!("Generation {} already terminated", self.generation);
            return;
        }
        LIVE_GENERATION.store(0, Ordering::SeqCst);
        (self.api.MagickWandTerminus)();
        log::debug!("Engine terminated (generation {})", self.generation);
    }

    /// Whether this token's generation is still running
    pub fn is_live(&self) -> bool {
        LIVE_GENERATION.load(Ordering::SeqCst) == self.generation
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The engine's own view of whether genesis ran
    pub fn is_instantiated(&self) -> bool {
        // SAFETY: reads a global flag
        self.is_live() && unsafe { (self.api.IsMagickWandInstantiated)() } == MAGICK_TRUE
    }

    /// Release string and packed version number, e.g. `("ImageMagick 7.1.1-21 ...", 0x711)`
    pub fn version(&self) -> (String, usize) {
        let mut number = 0;
        // SAFETY: returns a pointer to static storage, never null
        let text = unsafe { (self.api.MagickGetVersion)(&mut number) };
        let text = if text.is_null() {
            String::new()
        } else {
            // SAFETY: NUL-terminated static string
            unsafe { std::ffi::CStr::from_ptr(text) }
                .to_string_lossy()
                .into_owned()
        };
        (text, number)
    }

    /// File the engine was loaded from
    pub fn library_path(&self) -> &Path {
        self.api.path()
    }

    /// Configure option names matching a glob pattern such as `"*"`
    pub fn query_configure_options(&self, pattern: &str) -> Result<Vec<String>> {
        query::configure_options(self, pattern)
    }

    /// Value of one configure option; [`MagickError::NotFound`] if no such option
    pub fn query_configure_option(&self, name: &str) -> Result<String> {
        query::configure_option(self, name)
    }

    /// Image format names matching a glob pattern
    pub fn query_formats(&self, pattern: &str) -> Result<Vec<String>> {
        query::formats(self, pattern)
    }

    /// Font names matching a glob pattern
    pub fn query_fonts(&self, pattern: &str) -> Result<Vec<String>> {
        query::fonts(self, pattern)
    }

    pub(crate) fn api(&self) -> &'static MagickApi {
        self.api
    }

    pub(crate) fn ensure_live(&self) -> Result<()> {
        if self.is_live() {
            Ok(())
        } else {
            Err(MagickError::NotInitialized)
        }
    }
}

fn load_api(config: &EngineConfig) -> Result<&'static MagickApi> {
    if let Some(api) = API.get() {
        return Ok(api);
    }
    let api = MagickApi::load(&config.candidates()).map_err(|err| MagickError::Library(err.to_string()))?;
    Ok(API.get_or_init(|| api))
}
