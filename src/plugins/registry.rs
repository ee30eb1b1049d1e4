//! Plugin registry for doiici
//!
//! This module provides the `PluginRegistry` struct that maps normalised
//! plugin names to installed plugins. Names are compared case-insensitively:
//! they are lowercased on registration and every selector is lowercased
//! before lookup.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::info;

use crate::error::{BotError, Result};

use super::types::Plugin;

/// A registry of installed plugins keyed by lowercase name.
///
/// The registry is filled once at startup and only read afterwards; the bot
/// runtime takes ownership of it before the first event is consumed.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use doiici::plugins::{EchoPlugin, PluginRegistry};
///
/// let mut registry = PluginRegistry::new();
/// registry.register(Arc::new(EchoPlugin)).unwrap();
///
/// assert_eq!(registry.plugin_count(), 1);
/// assert!(registry.resolve("ECHO").is_some());
/// ```
#[derive(Default)]
pub struct PluginRegistry {
    plugins: HashMap<String, Arc<dyn Plugin>>,
}

/// Lowercase form used both as the registry key and for selector lookup.
fn normalize(name: &str) -> String {
    name.to_lowercase()
}

impl PluginRegistry {
    /// Create a new empty plugin registry.
    pub fn new() -> Self {
        Self {
            plugins: HashMap::new(),
        }
    }

    /// Build a registry from `plugins`, failing on duplicates or when the
    /// iterator is empty.
    pub fn from_plugins<I>(plugins: I) -> Result<Self>
    where
        I: IntoIterator<Item = Arc<dyn Plugin>>,
    {
        let mut registry = Self::new();
        for plugin in plugins {
            registry.register(plugin)?;
        }
        registry.ensure_not_empty()?;
        Ok(registry)
    }

    /// Register a plugin under its lowercased name.
    ///
    /// # Returns
    /// `Ok(())` on success, or `BotError::DuplicatePlugin` if another plugin
    /// already normalises to the same name. The registry is unchanged on
    /// error.
    pub fn register(&mut self, plugin: Arc<dyn Plugin>) -> Result<()> {
        let name = normalize(plugin.name());
        if name.is_empty() {
            return Err(BotError::Config(
                "plugin name cannot be empty".to_string(),
            ));
        }

        info!(plugin = %name, "Loading plugin");

        if self.plugins.contains_key(&name) {
            return Err(BotError::DuplicatePlugin(name));
        }
        self.plugins.insert(name, plugin);
        Ok(())
    }

    /// Fail with `BotError::NoPlugins` if nothing was registered.
    pub fn ensure_not_empty(&self) -> Result<()> {
        if self.plugins.is_empty() {
            return Err(BotError::NoPlugins);
        }
        Ok(())
    }

    /// Look up a plugin by selector, ignoring case.
    pub fn resolve(&self, selector: &str) -> Option<&Arc<dyn Plugin>> {
        self.plugins.get(&normalize(selector))
    }

    /// Get the number of registered plugins.
    pub fn plugin_count(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// Registered (normalised) plugin names, sorted for stable output.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.plugins.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
