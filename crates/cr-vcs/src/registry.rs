use crate::backend::{BackendFactory, VcsError};
use crate::git::GitBackend;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Repository-type name to backend mapping, built once at startup and shared
/// by reference.
#[derive(Clone, Default)]
pub struct BackendRegistry {
    backends: BTreeMap<String, Arc<dyn BackendFactory>>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every backend compiled into this build.
    pub fn with_installed() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(GitBackend));
        registry
    }

    pub fn register(&mut self, factory: Arc<dyn BackendFactory>) {
        let name = factory.name().to_string();
        tracing::debug!(backend = %name, "registered vcs backend");
        self.backends.insert(name, factory);
    }

    /// Keeps only the named backends. Unknown names are reported back.
    pub fn retain(&mut self, enabled: &[String]) -> Vec<String> {
        let unknown = enabled
            .iter()
            .filter(|name| !self.backends.contains_key(name.as_str()))
            .cloned()
            .collect();
        self.backends
            .retain(|name, _| enabled.iter().any(|value| value == name));
        unknown
    }

    pub fn resolve(&self, name: &str) -> Result<Arc<dyn BackendFactory>, VcsError> {
        self.backends
            .get(name)
            .cloned()
            .ok_or_else(|| VcsError::UnknownBackend {
                name: name.to_string(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.backends.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.backends.keys().map(String::as_str).collect()
    }
}

impl fmt::Debug for BackendRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendRegistry")
            .field("backends", &self.names())
            .finish()
    }
}
