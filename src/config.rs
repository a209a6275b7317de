//! Configuration for both utilities.
//!
//! Loaded from `xcpatch.json` (or the file passed with `--config`). Every
//! field has a default, so a missing file or a partial file is fine. Relative
//! paths in a config file are resolved against the directory holding it.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use xcpatch_core::ObjectId;

pub const CONFIG_FILE: &str = "xcpatch.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path to the `project.pbxproj` descriptor.
    pub project: PathBuf,
    /// Name of the native target to patch.
    pub target: String,
    /// Explicit target object id. Skips the lookup by name.
    pub target_id: Option<String>,
    pub sources: SourcesConfig,
    pub frameworks: FrameworksConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    /// Directory scanned for source files.
    pub root: PathBuf,
    /// Directory file paths are written relative to. Defaults to the
    /// directory containing the `.xcodeproj` bundle (`SOURCE_ROOT`).
    pub base: Option<PathBuf>,
    /// File extension to register, without the dot.
    pub extension: String,
    /// Directory names whose subtrees are skipped.
    pub exclude: Vec<String>,
    /// Explicit Sources build phase id.
    pub phase_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameworksConfig {
    /// Bundle file names, e.g. `PaykitMobile.xcframework`.
    pub bundles: Vec<String>,
    /// Added to `FRAMEWORK_SEARCH_PATHS` of every target configuration.
    /// Empty disables the edit.
    pub search_path: String,
    /// Explicit `Frameworks` group id.
    pub group_id: Option<String>,
    /// Explicit Frameworks build phase id.
    pub phase_id: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            project: PathBuf::from("Bitkit.xcodeproj/project.pbxproj"),
            target: "Bitkit".to_string(),
            target_id: None,
            sources: SourcesConfig::default(),
            frameworks: FrameworksConfig::default(),
        }
    }
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("Bitkit"),
            base: None,
            extension: "swift".to_string(),
            exclude: vec!["Preview Content".to_string()],
            phase_id: None,
        }
    }
}

impl Default for FrameworksConfig {
    fn default() -> Self {
        Self {
            bundles: vec![
                "PaykitMobile.xcframework".to_string(),
                "PubkyNoise.xcframework".to_string(),
            ],
            search_path: "$(PROJECT_DIR)/Bitkit/PaykitIntegration/Frameworks".to_string(),
            group_id: None,
            phase_id: None,
        }
    }
}

impl Config {
    /// Load from `path`, or from `xcpatch.json` in the working directory when
    /// no path is given. Only an explicitly named file is required to exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_file(path),
            None => {
                let path = Path::new(CONFIG_FILE);
                if path.exists() {
                    Self::load_file(path)
                } else {
                    tracing::debug!("No {} found, using defaults", CONFIG_FILE);
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn load_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let mut config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            config.resolve_relative_to(dir);
        }

        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    fn resolve_relative_to(&mut self, dir: &Path) {
        let join = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = dir.join(&*p);
            }
        };
        join(&mut self.project);
        join(&mut self.sources.root);
        if let Some(base) = self.sources.base.as_mut() {
            join(base);
        }
    }

    /// `SOURCE_ROOT`: the directory holding the `.xcodeproj` bundle.
    pub fn source_root(&self) -> PathBuf {
        let dir = self
            .project
            .parent()
            .and_then(Path::parent)
            .filter(|d| !d.as_os_str().is_empty());
        dir.map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Base directory for source paths.
    pub fn sources_base(&self) -> PathBuf {
        self.sources
            .base
            .clone()
            .unwrap_or_else(|| self.source_root())
    }

    pub fn target_id(&self) -> Result<Option<ObjectId>> {
        parse_id("target_id", self.target_id.as_deref())
    }
}

impl SourcesConfig {
    pub fn phase_id(&self) -> Result<Option<ObjectId>> {
        parse_id("sources.phase_id", self.phase_id.as_deref())
    }
}

impl FrameworksConfig {
    pub fn group_id(&self) -> Result<Option<ObjectId>> {
        parse_id("frameworks.group_id", self.group_id.as_deref())
    }

    pub fn phase_id(&self) -> Result<Option<ObjectId>> {
        parse_id("frameworks.phase_id", self.phase_id.as_deref())
    }
}

fn parse_id(field: &str, value: Option<&str>) -> Result<Option<ObjectId>> {
    value
        .map(|v| {
            ObjectId::parse(v).ok_or_else(|| {
                anyhow::anyhow!("{} must be a 24-digit hex object id, got {:?}", field, v)
            })
        })
        .transpose()
}
