//! Runtime configuration for a debugger session. Deliberately small: the
//! core stop/resume engine takes almost nothing at start-up besides where
//! to load the target image and at what address.

use std::path::PathBuf;

use crate::controller::DEFAULT_LOAD_BASE;

/// Configuration for one [`crate::controller::TargetController`] session.
#[derive(Debug, Clone)]
pub struct DebuggerConfig {
    pub image_path: Option<PathBuf>,
    pub load_base: u32,
}

impl Default for DebuggerConfig {
    fn default() -> Self {
        Self {
            image_path: None,
            load_base: DEFAULT_LOAD_BASE,
        }
    }
}

impl DebuggerConfig {
    pub fn builder() -> DebuggerConfigBuilder {
        DebuggerConfigBuilder::default()
    }
}

#[derive(Default)]
pub struct DebuggerConfigBuilder {
    config: DebuggerConfig,
}

impl DebuggerConfigBuilder {
    pub fn image_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.image_path = Some(path.into());
        self
    }

    pub fn load_base(mut self, load_base: u32) -> Self {
        self.config.load_base = load_base;
        self
    }

    pub fn build(self) -> DebuggerConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_uses_default_load_base() {
        let config = DebuggerConfig::default();
        assert_eq!(config.load_base, DEFAULT_LOAD_BASE);
        assert!(config.image_path.is_none());
    }

    #[test]
    fn builder_overrides_both_fields() {
        let config = DebuggerConfig::builder()
            .image_path("target.bin")
            .load_base(0x4000)
            .build();
        assert_eq!(config.load_base, 0x4000);
        assert_eq!(config.image_path, Some(PathBuf::from("target.bin")));
    }
}
