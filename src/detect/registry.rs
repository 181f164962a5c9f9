use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};

use crate::detect::result::DetectionResult;
use crate::frame::Frame;

use super::backend::DetectorBackend;

/// Registry of detector backends keyed by name.
///
/// Backends are wrapped in `Mutex` because `DetectorBackend::detect` takes `&mut self`.
pub struct BackendRegistry {
    backends: HashMap<String, Arc<Mutex<dyn DetectorBackend>>>,
    default_name: Option<String>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self {
            backends: HashMap::new(),
            default_name: None,
        }
    }

    /// Register a backend. The first registered backend becomes the default.
    pub fn register<B: DetectorBackend + 'static>(&mut self, backend: B) {
        let name = backend.name().to_string();
        if self.default_name.is_none() {
            self.default_name = Some(name.clone());
        }
        self.backends.insert(name, Arc::new(Mutex::new(backend)));
    }

    /// Set default backend by name.
    pub fn set_default(&mut self, name: &str) -> Result<()> {
        if !self.backends.contains_key(name) {
            return Err(anyhow!("backend '{}' not registered", name));
        }
        self.default_name = Some(name.to_string());
        Ok(())
    }

    /// Get backend by name.
    pub fn get(&self, name: &str) -> Option<Arc<Mutex<dyn DetectorBackend>>> {
        self.backends.get(name).cloned()
    }

    /// Get default backend.
    pub fn default_backend(&self) -> Option<Arc<Mutex<dyn DetectorBackend>>> {
        self.default_name.as_ref().and_then(|name| self.get(name))
    }

    pub fn default_name(&self) -> Option<&str> {
        self.default_name.as_deref()
    }

    /// List registered backends, sorted by name.
    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.backends.keys().cloned().collect();
        names.sort();
        names
    }

    /// Warm up the default backend.
    pub fn warm_up(&self) -> Result<()> {
        let backend = self
            .default_backend()
            .ok_or_else(|| anyhow!("no detector backend registered"))?;
        let mut guard = backend
            .lock()
            .map_err(|_| anyhow!("backend lock poisoned"))?;
        guard.warm_up()
    }

    /// Run detection with the default backend.
    pub fn detect(&self, frame: &Frame) -> Result<DetectionResult> {
        let backend = self
            .default_backend()
            .ok_or_else(|| anyhow!("no detector backend registered"))?;
        let mut guard = backend
            .lock()
            .map_err(|_| anyhow!("backend lock poisoned"))?;
        guard.detect(frame)
    }
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self::new()
    }
}
