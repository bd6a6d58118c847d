//! repack configuration
//!
//! Loads `.repack.yaml` from the working directory or the nearest ancestor
//! that has one. Every setting has a default, so the file is optional and
//! may be partial. Command-line flags are merged on top.

use crate::cost::CostModel;
use crate::error::{Error, Result};
use crate::matcher::{MatchOptions, Strategy};
use crate::render::RenderConfig;
use crate::walker::WalkPolicy;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file name
pub const CONFIG_FILE: &str = ".repack.yaml";

/// `.repack.yaml`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RepackConfig {
    /// Schema version for migrations
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default)]
    pub cost: CostModel,

    #[serde(default)]
    pub walk: WalkPolicy,

    #[serde(default)]
    pub render: RenderConfig,

    #[serde(default)]
    pub matching: MatchingConfig,
}

fn default_version() -> u32 {
    1
}

/// Matching settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct MatchingConfig {
    #[serde(default)]
    pub strategy: Strategy,

    /// Field-name tokens excluded from matching
    #[serde(default)]
    pub ignore: Vec<String>,

    /// Refuse to match schemas with more leaves than this
    #[serde(default = "default_max_leaves")]
    pub max_leaves: usize,

    #[serde(default = "default_destination_root")]
    pub destination_root: String,

    #[serde(default = "default_source_root")]
    pub source_root: String,
}

fn default_max_leaves() -> usize {
    MatchOptions::default().max_leaves
}

fn default_destination_root() -> String {
    MatchOptions::default().destination_root
}

fn default_source_root() -> String {
    MatchOptions::default().source_root
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::default(),
            ignore: Vec::new(),
            max_leaves: default_max_leaves(),
            destination_root: default_destination_root(),
            source_root: default_source_root(),
        }
    }
}

impl Default for RepackConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            cost: CostModel::default(),
            walk: WalkPolicy::default(),
            render: RenderConfig::default(),
            matching: MatchingConfig::default(),
        }
    }
}

/// Command-line overrides; `None`/empty leaves the file value
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub ignore: Vec<String>,
    pub strategy: Option<Strategy>,
    pub target: Option<crate::render::Target>,
}

impl RepackConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: RepackConfig = serde_norway::from_str(yaml)
            .map_err(|e| Error::Config(format!("Failed to parse {}: {}", CONFIG_FILE, e)))?;

        if config.version != 1 {
            return Err(Error::Config(format!(
                "Unsupported {} version: {}",
                CONFIG_FILE, config.version
            )));
        }
        Ok(config)
    }

    /// Load `.repack.yaml` from a directory
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let file = dir.join(CONFIG_FILE);
        if !file.exists() {
            return Ok(None);
        }
        Self::from_file(&file).map(Some)
    }

    /// Parse a config file; relative `walk.packages` are taken from its directory
    fn from_file(file: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(file).map_err(Error::Io)?;
        let mut config = Self::from_yaml(&content)?;
        if let Some(dir) = file.parent() {
            for package in &mut config.walk.packages {
                if Path::new(package.as_str()).is_relative() {
                    *package = dir.join(package.as_str()).to_string_lossy().into_owned();
                }
            }
        }
        Ok(config)
    }

    /// Nearest config file at or above `start_dir`
    pub fn find(start_dir: &Path) -> Result<Option<PathBuf>> {
        let mut current = start_dir.canonicalize().map_err(Error::Io)?;
        loop {
            let candidate = current.join(CONFIG_FILE);
            if candidate.is_file() {
                return Ok(Some(candidate));
            }
            match current.parent() {
                Some(parent) => current = parent.to_path_buf(),
                None => return Ok(None),
            }
        }
    }

    /// Load the nearest config, or defaults when there is none
    pub fn discover(start_dir: &Path) -> Result<Self> {
        match Self::find(start_dir)? {
            Some(path) => {
                tracing::debug!(path = %path.display(), "using config");
                Self::from_file(&path)
            }
            None => Ok(Self::default()),
        }
    }

    /// Apply command-line overrides. Ignore tokens are added to the file's.
    pub fn merge(&self, overrides: &Overrides) -> RepackConfig {
        let mut merged = self.clone();
        for token in &overrides.ignore {
            if !merged.matching.ignore.contains(token) {
                merged.matching.ignore.push(token.clone());
            }
        }
        if let Some(strategy) = overrides.strategy {
            merged.matching.strategy = strategy;
        }
        if let Some(target) = overrides.target {
            merged.render.target = target;
        }
        merged
    }

    /// Options for the matching pipeline
    pub fn match_options(&self) -> MatchOptions {
        MatchOptions {
            strategy: self.matching.strategy,
            ignore: self.matching.ignore.clone(),
            max_leaves: self.matching.max_leaves,
            destination_root: self.matching.destination_root.clone(),
            source_root: self.matching.source_root.clone(),
            cost: self.cost,
            walk: self.walk.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::Target;
    use tempfile::TempDir;

    #[test]
    fn test_partial_file_uses_defaults() {
        let config = RepackConfig::from_yaml(
            r#"
version: 1
cost:
  substitute: 3
matching:
  ignore: [CreatedAt]
render:
  target: rust
"#,
        )
        .unwrap();
        assert_eq!(config.cost.substitute, 3);
        assert_eq!(config.cost.suffix_len, 5);
        assert_eq!(config.walk.max_depth, 32);
        assert_eq!(config.render.target, Target::Rust);
        assert_eq!(config.matching.ignore, vec!["CreatedAt"]);
        assert_eq!(config.matching.destination_root, "x");
        assert_eq!(config.matching.max_leaves, 512);
    }

    #[test]
    fn test_empty_file_is_default() {
        assert_eq!(RepackConfig::from_yaml("{}").unwrap(), RepackConfig::default());
    }

    #[test]
    fn test_rejects_unknown_version() {
        let err = RepackConfig::from_yaml("version: 2").unwrap_err();
        assert!(err.to_string().contains("Unsupported .repack.yaml version: 2"));
    }

    #[test]
    fn test_merge_overrides() {
        let mut config = RepackConfig::default();
        config.matching.ignore = vec!["ID".into()];
        let merged = config.merge(&Overrides {
            ignore: vec!["ID".into(), "Name".into()],
            strategy: Some(Strategy::Greedy),
            target: None,
        });
        assert_eq!(merged.matching.ignore, vec!["ID", "Name"]);
        assert_eq!(merged.matching.strategy, Strategy::Greedy);
        assert_eq!(merged.render.target, Target::Go);

        let options = merged.match_options();
        assert_eq!(options.ignore, vec!["ID", "Name"]);
        assert_eq!(options.strategy, Strategy::Greedy);
    }

    #[test]
    fn test_discover_walks_up() {
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(
            temp.path().join(CONFIG_FILE),
            "matching:\n  strategy: greedy\n",
        )
        .unwrap();

        let found = RepackConfig::find(&nested).unwrap().unwrap();
        assert_eq!(found, temp.path().canonicalize().unwrap().join(CONFIG_FILE));
        let config = RepackConfig::discover(&nested).unwrap();
        assert_eq!(config.matching.strategy, Strategy::Greedy);
    }

    #[test]
    fn test_load_from_dir_missing() {
        let temp = TempDir::new().unwrap();
        assert!(RepackConfig::load_from_dir(temp.path()).unwrap().is_none());
    }

    #[test]
    fn test_packages_relative_to_config_file() {
        let root = TempDir::new().unwrap();
        std::fs::write(
            root.path().join(CONFIG_FILE),
            "version: 1\nwalk:\n  packages: [legacy/dto, /opt/shared]\n",
        )
        .unwrap();
        let nested = root.path().join("cmd");
        std::fs::create_dir_all(&nested).unwrap();

        let config = RepackConfig::discover(&nested).unwrap();
        let base = root.path().canonicalize().unwrap();
        assert_eq!(
            config.walk.packages,
            vec![
                base.join("legacy/dto").to_string_lossy().into_owned(),
                "/opt/shared".to_string(),
            ]
        );
    }
}
