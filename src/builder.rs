//! Builder for configuring and constructing a `PluginHost`.

use crate::{HostConfig, PluginHost, Result};
use solo_plugin::{FormatManager, PluginFormat};

/// Every format compiled into the build is registered unless
/// [`no_default_formats`](Self::no_default_formats) is called. Extra formats
/// added with [`format`](Self::format) are tried after the defaults.
///
/// # Example
///
/// ```ignore
/// use solo::PluginHost;
///
/// let mut host = PluginHost::builder()
///     .sample_rate(48000.0)
///     .block_size(256)
///     .build()?;
///
/// host.load_plugin("/usr/lib/vst/synth.so")?;
/// ```
pub struct PluginHostBuilder {
    config: HostConfig,
    formats: Vec<Box<dyn PluginFormat>>,
    default_formats: bool,
}

impl Default for PluginHostBuilder {
    fn default() -> Self {
        Self {
            config: HostConfig::default(),
            formats: Vec::new(),
            default_formats: true,
        }
    }
}

impl PluginHostBuilder {
    /// Default: 44100.0
    pub fn sample_rate(mut self, sample_rate: f64) -> Self {
        self.config.sample_rate = sample_rate;
        self
    }

    /// Default: 512
    pub fn block_size(mut self, frames: usize) -> Self {
        self.config.block_size = frames;
        self
    }

    /// Default: 1024
    pub fn midi_queue_capacity(mut self, events: usize) -> Self {
        self.config.midi_queue_capacity = events;
        self
    }

    pub fn config(mut self, config: HostConfig) -> Self {
        self.config = config;
        self
    }

    pub fn format(mut self, format: Box<dyn PluginFormat>) -> Self {
        self.formats.push(format);
        self
    }

    /// Only the formats passed to [`format`](Self::format) will be used.
    pub fn no_default_formats(mut self) -> Self {
        self.default_formats = false;
        self
    }

    pub fn build(self) -> Result<PluginHost> {
        self.config.validate()?;

        let mut formats = FormatManager::new();
        if self.default_formats {
            formats.add_default_formats();
        }
        for format in self.formats {
            formats.add_format(format);
        }

        if formats.is_empty() {
            tracing::warn!("Plugin host built without any plugin format; every load will fail");
        }

        Ok(PluginHost::from_parts(self.config, formats))
    }
}
