//! Plugin formats and the format manager used for scanning.
//!
//! A [`PluginFormat`] knows how to recognise, describe and instantiate one
//! kind of plugin binary. [`FormatManager`] holds an ordered list of formats
//! and asks each of them in turn; nothing it finds is persisted.

use crate::descriptor::PluginDescriptor;
use crate::error::{PluginError, Result};
use crate::instance::PluginInstance;
use std::path::{Path, PathBuf};

/// One hostable plugin format.
pub trait PluginFormat: Send + Sync {
    /// Stable name stored in [`PluginDescriptor::format`].
    fn name(&self) -> &str;

    /// Cheap check (usually the extension) done before any library is opened.
    fn file_might_contain(&self, path: &Path) -> bool;

    /// Every plugin the file exposes. Opens the library.
    fn scan(&self, path: &Path) -> Result<Vec<PluginDescriptor>>;

    fn instantiate(
        &self,
        descriptor: &PluginDescriptor,
        sample_rate: f64,
        block_size: usize,
    ) -> Result<Box<dyn PluginInstance>>;

    /// Platform search directories for this format.
    fn default_locations(&self) -> Vec<PathBuf> {
        Vec::new()
    }
}

/// Ordered collection of formats.
#[derive(Default)]
pub struct FormatManager {
    formats: Vec<Box<dyn PluginFormat>>,
}

impl FormatManager {
    /// A manager with no formats registered.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every format compiled into this build: VST2 first, then CLAP.
    pub fn with_default_formats() -> Self {
        let mut manager = Self::new();
        manager.add_default_formats();
        manager
    }

    pub fn add_default_formats(&mut self) {
        #[cfg(feature = "vst2")]
        self.add_format(Box::new(crate::vst2::Vst2Format::new()));

        #[cfg(feature = "clap")]
        self.add_format(Box::new(crate::clap::ClapFormat::new()));
    }

    pub fn add_format(&mut self, format: Box<dyn PluginFormat>) {
        tracing::debug!("Registered plugin format {}", format.name());
        self.formats.push(format);
    }

    pub fn formats(&self) -> impl Iterator<Item = &dyn PluginFormat> {
        self.formats.iter().map(|f| &**f)
    }

    pub fn format(&self, name: &str) -> Option<&dyn PluginFormat> {
        self.formats().find(|f| f.name() == name)
    }

    pub fn is_empty(&self) -> bool {
        self.formats.is_empty()
    }

    /// Asks every format that claims `path` for its plugins.
    ///
    /// Results are aggregated in registration order. A format that fails to
    /// scan is skipped; an empty list means nothing recognised the file.
    pub fn scan(&self, path: &Path) -> Vec<PluginDescriptor> {
        let mut found = Vec::new();

        for format in &self.formats {
            if !format.file_might_contain(path) {
                continue;
            }

            match format.scan(path) {
                Ok(mut descriptors) => {
                    tracing::debug!(
                        "{} found {} plugin(s) in {}",
                        format.name(),
                        descriptors.len(),
                        path.display()
                    );
                    found.append(&mut descriptors);
                }
                Err(e) => {
                    tracing::debug!("{} could not scan {}: {}", format.name(), path.display(), e);
                }
            }
        }

        found
    }

    /// Scans every plugin-looking entry of `dir` (non-recursive).
    pub fn scan_directory(&self, dir: &Path) -> Result<Vec<PluginDescriptor>> {
        if !dir.is_dir() {
            return Err(PluginError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("Not a directory: {}", dir.display()),
            )));
        }

        let mut entries: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| self.claims(path))
            .collect();
        entries.sort();

        let mut found = Vec::new();
        for path in entries {
            found.extend(self.scan(&path));
        }

        tracing::info!("Found {} plugins in {}", found.len(), dir.display());
        Ok(found)
    }

    /// Search directories of every registered format, in registration order.
    pub fn default_locations(&self) -> Vec<PathBuf> {
        let mut locations = Vec::new();
        for format in &self.formats {
            for location in format.default_locations() {
                if !locations.contains(&location) {
                    locations.push(location);
                }
            }
        }
        locations
    }

    /// Creates an instance through the format that produced `descriptor`.
    pub fn instantiate(
        &self,
        descriptor: &PluginDescriptor,
        sample_rate: f64,
        block_size: usize,
    ) -> Result<Box<dyn PluginInstance>> {
        let format = self
            .format(&descriptor.format)
            .ok_or_else(|| PluginError::UnknownFormat(descriptor.format.clone()))?;

        format.instantiate(descriptor, sample_rate, block_size)
    }

    fn claims(&self, path: &Path) -> bool {
        self.formats.iter().any(|f| f.file_might_contain(path))
    }
}

/// Check if a path looks like any plugin binary this crate knows about.
pub fn is_plugin_file(path: &Path) -> bool {
    if let Some(ext) = path.extension().and_then(|s| s.to_str()) {
        matches!(
            ext.to_ascii_lowercase().as_str(),
            "vst" | "so" | "dll" | "clap"
        )
    } else {
        false
    }
}

/// `$HOME/<suffix>`, for the per-user search directories.
pub(crate) fn home_dir(suffix: &str) -> PathBuf {
    PathBuf::from(format!(
        "{}/{}",
        std::env::var("HOME").unwrap_or_default(),
        suffix
    ))
}
