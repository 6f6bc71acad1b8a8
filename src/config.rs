// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Kernel configuration

use crate::geometry::CsgSettings;
use crate::lang::DEFAULT_MAX_DEPTH;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File picked up by [`KernelConfig::load`] from the working directory
pub const CONFIG_FILE: &str = "scadforge.toml";

/// Kernel configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KernelConfig {
    /// Directories searched for `include`/`use` after the includer's own
    pub search_paths: Vec<PathBuf>,
    /// Scope nesting ceiling
    pub max_scope_depth: usize,
    /// Depth at which BSP construction stops splitting
    pub bsp_max_depth: usize,
    /// Memoize parser results
    pub packrat: bool,
    /// Seed of the BSP splitting-plane picker
    pub csg_seed: u64,
}

impl Default for KernelConfig {
    fn default() -> Self {
        let csg = CsgSettings::default();
        Self {
            search_paths: vec![PathBuf::from(".")],
            max_scope_depth: DEFAULT_MAX_DEPTH,
            bsp_max_depth: csg.max_depth,
            packrat: false,
            csg_seed: csg.seed,
        }
    }
}

impl KernelConfig {
    /// Load configuration from file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        let config: KernelConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path.as_ref()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load `scadforge.toml` if present, then apply environment overrides
    pub fn load() -> Result<Self> {
        let mut config = if Path::new(CONFIG_FILE).exists() {
            Self::from_file(CONFIG_FILE)?
        } else {
            Self::default()
        };
        config.apply_env();
        Ok(config)
    }

    /// `SCADFORGE_SEARCH_PATH` (platform path-list syntax) and `SCADFORGE_PACKRAT`
    pub fn apply_env(&mut self) {
        if let Some(paths) = std::env::var_os("SCADFORGE_SEARCH_PATH") {
            let paths: Vec<PathBuf> = std::env::split_paths(&paths).collect();
            if !paths.is_empty() {
                self.search_paths = paths;
            }
        }

        if let Ok(packrat) = std::env::var("SCADFORGE_PACKRAT") {
            self.packrat = matches!(packrat.trim(), "1" | "true" | "yes" | "on");
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path.as_ref(), content)
            .with_context(|| format!("Failed to write config file: {:?}", path.as_ref()))?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(self.max_scope_depth >= 2, "max_scope_depth must be at least 2");
        anyhow::ensure!(self.bsp_max_depth >= 1, "bsp_max_depth must be at least 1");
        Ok(())
    }

    pub fn csg_settings(&self) -> CsgSettings {
        CsgSettings {
            seed: self.csg_seed,
            max_depth: self.bsp_max_depth,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = KernelConfig::default();
        assert_eq!(config.search_paths, vec![PathBuf::from(".")]);
        assert_eq!(config.max_scope_depth, 32);
        assert_eq!(config.bsp_max_depth, 65536);
        assert!(!config.packrat);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("scadforge.toml");
        std::fs::write(&path, "packrat = true\nsearch_paths = [\"lib\", \"vendor\"]\n").unwrap();

        let config = KernelConfig::from_file(&path).unwrap();
        assert!(config.packrat);
        assert_eq!(config.search_paths, vec![PathBuf::from("lib"), PathBuf::from("vendor")]);
        assert_eq!(config.max_scope_depth, DEFAULT_MAX_DEPTH);
    }

    #[test]
    fn test_save_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.toml");
        let config = KernelConfig {
            csg_seed: 7,
            bsp_max_depth: 128,
            ..KernelConfig::default()
        };
        config.save(&path).unwrap();
        assert_eq!(KernelConfig::from_file(&path).unwrap(), config);
    }

    #[test]
    fn test_rejects_bad_values() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "max_scope_depth = 0\n").unwrap();
        assert!(KernelConfig::from_file(&path).is_err());

        std::fs::write(&path, "packrat = \"maybe\"\n").unwrap();
        assert!(KernelConfig::from_file(&path).is_err());
    }
}
