//! Host integration shim.
//!
//! A host registers one [`ZlibPlugin`] and asks it for facades. The plugin
//! carries the default settings every facade starts from, so there is no
//! process-wide settings store.

use crate::facade::Compression;
use deflux_core::error::Result;
use deflux_core::settings::Settings;
use deflux_core::variant::Variant;

/// Plugin entry point.
#[derive(Debug, Clone, Default)]
pub struct ZlibPlugin {
    defaults: Settings,
}

impl ZlibPlugin {
    /// Package name.
    pub const NAME: &'static str = env!("CARGO_PKG_NAME");
    /// Package version.
    pub const VERSION: &'static str = env!("CARGO_PKG_VERSION");

    /// A plugin with catalog defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// A plugin with explicit defaults.
    pub fn with_defaults(defaults: Settings) -> Self {
        Self { defaults }
    }

    /// A plugin whose defaults come from a JSON settings document.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(Self::with_defaults(Settings::from_json(json)?))
    }

    /// The defaults new facades start from.
    pub fn defaults(&self) -> &Settings {
        &self.defaults
    }

    /// The variants this plugin serves.
    pub fn variants(&self) -> &'static [Variant] {
        &Variant::ALL
    }

    /// Build a facade for `variant`, seeded with the plugin defaults.
    pub fn compression(&self, variant: &str) -> Result<Compression> {
        Compression::with_defaults(self.defaults.clone(), variant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deflux_core::catalog::Flush;

    #[test]
    fn test_metadata() {
        assert_eq!(ZlibPlugin::NAME, "deflux");
        assert!(!ZlibPlugin::VERSION.is_empty());
        assert_eq!(ZlibPlugin::new().variants().len(), 7);
    }

    #[test]
    fn test_defaults_seed_facades() {
        let plugin =
            ZlibPlugin::from_json(r#"{"level": 9, "finish": "sync", "variant": "inflate"}"#)
                .unwrap();
        let facade = plugin.compression("gzip").unwrap();

        assert_eq!(facade.variant(), Variant::Gzip);
        assert_eq!(facade.settings().level(), 9);
        assert_eq!(facade.settings().finish(), Flush::Sync);
        assert_eq!(plugin.defaults().variant(), Variant::Inflate);
    }

    #[test]
    fn test_bad_defaults_rejected() {
        assert!(ZlibPlugin::from_json(r#"{"memory_level": 12}"#).is_err());
        assert!(ZlibPlugin::new().compression("zip").is_err());
    }
}
