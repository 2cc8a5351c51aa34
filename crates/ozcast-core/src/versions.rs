//! Versioned calibrations and atomic hot reload.
//!
//! [`CalibrationSet`] holds any number of calibrations side by side, keyed
//! by tag and resolved once at construction. [`CalibrationHandle`] is the
//! single mutable point in the core: it swaps a whole `Arc<Calibration>`
//! at once, so a reader sees either the old calibration or the new one.

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

use ozcast_types::VersionTag;
use tracing::info;

use crate::config::{BUILT_IN, Calibration};
use crate::error::{ConfigError, ConfigurationError, InferenceError};

/// Calibrations indexed by version tag.
#[derive(Debug, Clone, Default)]
pub struct CalibrationSet {
    versions: BTreeMap<VersionTag, Arc<Calibration>>,
}

impl CalibrationSet {
    /// An empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every calibration compiled into the crate.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a built-in fails to build.
    pub fn built_in() -> Result<Self, ConfigError> {
        let mut set = Self::new();
        for (_, yaml) in BUILT_IN {
            set.insert(Calibration::parse(yaml)?)?;
        }
        Ok(set)
    }

    /// Add a calibration under its own version tag.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::DuplicateVersion`] if the tag is taken.
    pub fn insert(&mut self, calibration: Calibration) -> Result<Arc<Calibration>, ConfigurationError> {
        let version = calibration.version().clone();
        if self.versions.contains_key(&version) {
            return Err(ConfigurationError::DuplicateVersion { version });
        }
        let calibration = Arc::new(calibration);
        self.versions.insert(version, Arc::clone(&calibration));
        Ok(calibration)
    }

    /// Look up a calibration by tag.
    ///
    /// # Errors
    ///
    /// Returns [`InferenceError::UnknownVersion`] if no calibration has the tag.
    pub fn get(&self, version: &VersionTag) -> Result<Arc<Calibration>, InferenceError> {
        self.versions
            .get(version)
            .cloned()
            .ok_or_else(|| InferenceError::UnknownVersion(version.clone()))
    }

    /// Loaded tags in order.
    pub fn versions(&self) -> impl Iterator<Item = &VersionTag> {
        self.versions.keys()
    }

    /// Number of loaded calibrations.
    pub fn len(&self) -> usize {
        self.versions.len()
    }

    /// `true` if nothing is loaded.
    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }
}

/// Shared, atomically replaceable current calibration.
#[derive(Debug)]
pub struct CalibrationHandle {
    current: RwLock<Arc<Calibration>>,
}

impl CalibrationHandle {
    /// Wrap an initial calibration.
    pub const fn new(calibration: Arc<Calibration>) -> Self {
        Self {
            current: RwLock::new(calibration),
        }
    }

    /// Snapshot of the current calibration.
    ///
    /// The snapshot stays valid for the whole call even if the handle is
    /// replaced meanwhile.
    pub fn current(&self) -> Arc<Calibration> {
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Install `next` and return the calibration it replaced.
    pub fn replace(&self, next: Arc<Calibration>) -> Arc<Calibration> {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        info!(
            from = %guard.version(),
            to = %next.version(),
            "calibration swapped"
        );
        std::mem::replace(&mut *guard, next)
    }
}
