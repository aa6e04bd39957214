//! Where the engine lives and how loudly it reports
//!
//! The native library is found at runtime. By default a list of well-known
//! file names is handed to the system loader; two environment variables
//! change that:
//!
//! - `IMAGICK_WAND_LIBRARY` - full path to the MagickWand shared library.
//!   When set, nothing else is tried.
//! - `MAGICK_HOME` - installation prefix; `$MAGICK_HOME/lib/<name>` is tried
//!   before the bare name.
//!
//! Native exceptions can also be echoed to the log as they are translated.
//! This is off by default; enable it with `set_native_error_logging(true)` or
//! `IMAGICK_LOG_ERRORS=1`.
//!
//! ```bash
//! IMAGICK_WAND_LIBRARY=/opt/im7/lib/libMagickWand-7.Q16HDRI.so IMAGICK_LOG_ERRORS=1 ./my_app
//! ```

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;

pub const LIBRARY_ENV: &str = "IMAGICK_WAND_LIBRARY";
pub const MAGICK_HOME_ENV: &str = "MAGICK_HOME";
pub const LOG_ERRORS_ENV: &str = "IMAGICK_LOG_ERRORS";

/// How to locate the native library
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    library_path: Option<PathBuf>,
    magick_home: Option<PathBuf>,
    library_names: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            library_path: None,
            magick_home: None,
            library_names: default_library_names()
                .iter()
                .map(|name| name.to_string())
                .collect(),
        }
    }
}

impl EngineConfig {
    /// Defaults, overridden by the environment
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(path) = std::env::var_os(LIBRARY_ENV).filter(|v| !v.is_empty()) {
            log::debug!("{} set, loading engine from {:?}", LIBRARY_ENV, path);
            config.library_path = Some(PathBuf::from(path));
        }
        if let Some(home) = std::env::var_os(MAGICK_HOME_ENV).filter(|v| !v.is_empty()) {
            config.magick_home = Some(PathBuf::from(home));
        }
        config
    }

    pub fn with_library_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.library_path = Some(path.into());
        self
    }

    pub fn with_magick_home(mut self, home: impl Into<PathBuf>) -> Self {
        self.magick_home = Some(home.into());
        self
    }

    pub fn with_library_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.library_names = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn library_path(&self) -> Option<&Path> {
        self.library_path.as_deref()
    }

    pub fn magick_home(&self) -> Option<&Path> {
        self.magick_home.as_deref()
    }

    /// Everything the loader should try, in order
    pub fn candidates(&self) -> Vec<PathBuf> {
        if let Some(path) = &self.library_path {
            return vec![path.clone()];
        }

        let mut candidates = Vec::with_capacity(self.library_names.len() * 2);
        for name in &self.library_names {
            if let Some(home) = &self.magick_home {
                candidates.push(home.join("lib").join(name));
            }
            candidates.push(PathBuf::from(name));
        }
        candidates
    }
}

/// File names of the MagickWand library on this platform, newest first
pub fn default_library_names() -> &'static [&'static str] {
    #[cfg(target_os = "macos")]
    {
        &[
            "libMagickWand-7.Q16HDRI.dylib",
            "libMagickWand-7.Q16.dylib",
            "libMagickWand-6.Q16.dylib",
            "libMagickWand.dylib",
        ]
    }
    #[cfg(target_os = "windows")]
    {
        &[
            "CORE_RL_MagickWand_.dll",
            "libMagickWand-7.Q16HDRI-10.dll",
            "libMagickWand-6.Q16-6.dll",
        ]
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        &[
            "libMagickWand-7.Q16HDRI.so.10",
            "libMagickWand-7.Q16HDRI.so",
            "libMagickWand-7.Q16.so.10",
            "libMagickWand-7.Q16.so",
            "libMagickWand-6.Q16.so.6",
            "libMagickWand-6.Q16.so",
            "libMagickWand-6.Q16HDRI.so.6",
            "libMagickWand.so",
        ]
    }
}

static LOG_NATIVE_ERRORS: AtomicBool = AtomicBool::new(false);

static ENV_CHECKED: OnceLock<()> = OnceLock::new();

fn check_env() {
    ENV_CHECKED.get_or_init(|| {
        if let Ok(val) = std::env::var(LOG_ERRORS_ENV) {
            let enabled = matches!(val.to_lowercase().as_str(), "1" | "true" | "yes" | "on");
            if enabled {
                LOG_NATIVE_ERRORS.store(true, Ordering::SeqCst);
                log::info!("Native error logging enabled via {} env var", LOG_ERRORS_ENV);
            }
        }
    });
}

/// Whether translated native exceptions are echoed to the log
pub fn is_native_error_logging_enabled() -> bool {
    check_env();
    LOG_NATIVE_ERRORS.load(Ordering::SeqCst)
}

/// Turn native exception logging on or off; overrides the environment
pub fn set_native_error_logging(enabled: bool) {
    check_env();
    LOG_NATIVE_ERRORS.store(enabled, Ordering::SeqCst);
}
