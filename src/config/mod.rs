//! Layered settings: built-in defaults, then a YAML file, then command-line overrides.
//!
//! The file is looked up as the explicit `--config` path, else `<root>/.docseal.yaml`,
//! else `<config dir>/docseal/config.yaml`.

use std::fs;
use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};
use tracing::debug;
use crate::digest::{DigestAlgorithm, DEFAULT_CHUNK_SIZE};
use crate::error::{DocSealError, Result};
use crate::naming::NamingRule;

pub const ROOT_CONFIG_NAME: &str = ".docseal.yaml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SealConfig {
    pub extensions: Vec<String>,
    pub algorithm: DigestAlgorithm,
    pub alternate_suffixes: Vec<String>,
    pub chunk_size: usize,
    pub recursive: bool,
    pub jobs: usize,
}

impl Default for SealConfig {
    fn default() -> Self {
        Self {
            extensions: vec!["pdf".to_string()],
            algorithm: DigestAlgorithm::Sha256,
            alternate_suffixes: Vec::new(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            recursive: false,
            jobs: 1,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub extensions: Vec<String>,
    pub algorithm: Option<DigestAlgorithm>,
    pub recursive: bool,
    pub jobs: Option<usize>,
    pub chunk_size: Option<usize>,
}

impl SealConfig {
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: SealConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|_| DocSealError::ConfigFileNotFound(path.to_path_buf()))?;
        Self::from_yaml_str(&content)
    }

    /// Loads the first config file found, returning where it came from.
    pub fn load(explicit: Option<&Path>, root: &Path) -> Result<(Self, Option<PathBuf>)> {
        if let Some(path) = explicit {
            return Ok((Self::from_file(path)?, Some(path.to_path_buf())));
        }

        let candidates = [
            Some(root.join(ROOT_CONFIG_NAME)),
            dirs::config_dir().map(|d| d.join("docseal").join("config.yaml")),
        ];

        for path in candidates.into_iter().flatten() {
            if path.is_file() {
                debug!("Loading config from {}", path.display());
                return Ok((Self::from_file(&path)?, Some(path)));
            }
        }

        Ok((Self::default(), None))
    }

    pub fn apply(mut self, overrides: ConfigOverrides) -> Result<Self> {
        if !overrides.extensions.is_empty() {
            self.extensions = overrides.extensions;
        }
        if let Some(algorithm) = overrides.algorithm {
            self.algorithm = algorithm;
        }
        if overrides.recursive {
            self.recursive = true;
        }
        if let Some(jobs) = overrides.jobs {
            self.jobs = jobs;
        }
        if let Some(chunk_size) = overrides.chunk_size {
            self.chunk_size = chunk_size;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.extensions.is_empty() {
            return Err(DocSealError::Config("at least one document extension is required".to_string()));
        }
        for ext in &self.extensions {
            let trimmed = ext.trim_start_matches('.');
            if trimmed.is_empty() || trimmed.contains(&['.', '/', '\\'][..]) {
                return Err(DocSealError::Config(format!("invalid document extension: '{}'", ext)));
            }
        }
        for suffix in &self.alternate_suffixes {
            if suffix.trim().trim_start_matches('.').is_empty() || suffix.contains(&['/', '\\'][..]) {
                return Err(DocSealError::Config(format!("invalid alternate suffix: '{}'", suffix)));
            }
        }
        if self.jobs == 0 {
            return Err(DocSealError::Config("jobs must be at least 1".to_string()));
        }
        if self.chunk_size == 0 {
            return Err(DocSealError::Config("chunk_size must be at least 1".to_string()));
        }
        Ok(())
    }

    pub fn naming_rule(&self) -> NamingRule {
        NamingRule::new(&self.extensions, self.algorithm)
            .with_alternate_suffixes(&self.alternate_suffixes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = SealConfig::default();
        assert_eq!(config.extensions, vec!["pdf"]);
        assert_eq!(config.algorithm, DigestAlgorithm::Sha256);
        assert_eq!(config.chunk_size, 1024 * 1024);
        assert_eq!(config.jobs, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_partial_yaml() {
        let config = SealConfig::from_yaml_str("extensions: [pdf, djvu]\nalgorithm: sha512\n").unwrap();
        assert_eq!(config.extensions, vec!["pdf", "djvu"]);
        assert_eq!(config.algorithm, DigestAlgorithm::Sha512);
        assert!(!config.recursive);
    }

    #[test]
    fn test_empty_yaml_is_default() {
        assert_eq!(SealConfig::from_yaml_str("  \n").unwrap(), SealConfig::default());
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(matches!(
            SealConfig::from_yaml_str("extension: pdf\n"),
            Err(DocSealError::Yaml(_))
        ));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = SealConfig::from_yaml_str("extensions: []\n").unwrap_err();
        assert!(err.to_string().contains("at least one document extension"));

        let err = SealConfig::from_yaml_str("jobs: 0\n").unwrap_err();
        assert!(err.to_string().contains("jobs must be at least 1"));

        let err = SealConfig::from_yaml_str("extensions: ['tar.gz']\n").unwrap_err();
        assert!(err.to_string().contains("invalid document extension"));
    }

    #[test]
    fn test_overrides_win() {
        let config = SealConfig::default()
            .apply(ConfigOverrides {
                extensions: vec!["djvu".to_string()],
                algorithm: Some(DigestAlgorithm::Sha512),
                recursive: true,
                jobs: Some(4),
                chunk_size: None,
            })
            .unwrap();

        assert_eq!(config.extensions, vec!["djvu"]);
        assert_eq!(config.algorithm, DigestAlgorithm::Sha512);
        assert!(config.recursive);
        assert_eq!(config.jobs, 4);
        assert_eq!(config.chunk_size, DEFAULT_CHUNK_SIZE);
    }

    #[test]
    fn test_load_from_root() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(ROOT_CONFIG_NAME), "alternate_suffixes: ['.sha256']\n").unwrap();

        let (config, source) = SealConfig::load(None, dir.path()).unwrap();
        assert_eq!(source, Some(dir.path().join(ROOT_CONFIG_NAME)));
        assert_eq!(config.naming_rule().alternate_suffixes(), &[".sha256".to_string()]);
    }

    #[test]
    fn test_load_explicit_missing() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.yaml");
        let err = SealConfig::load(Some(&missing), dir.path()).unwrap_err();
        assert!(matches!(err, DocSealError::ConfigFileNotFound(_)));
    }
}
