//! Explicit source registration.
//!
//! Projects using folder-synchronised groups do not list their sources in the
//! descriptor, which breaks some command-line builds. This patch scans the
//! source tree and adds a file reference, a build file and a Sources phase
//! entry for every file it finds.

use std::ffi::OsStr;
use std::fs;
use std::path::{Component, Path, PathBuf};

use anyhow::{bail, Context, Result};
use tracing::{debug, info};
use walkdir::{DirEntry, WalkDir};
use xcpatch_core::{
    render, Anchor, Document, EntityKind, EntityRecord, IdGenerator, IdRole,
};

use crate::config::Config;
use crate::pipeline::{Patch, Planned};
use crate::project::{self, SOURCES_PHASE};

const IDS: IdGenerator = IdGenerator::new("EXPLICIT_SOURCE");

/// Display name of the Sources phase in build file comments.
pub const PHASE_NAME: &str = "Sources";

/// What to scan and how to name what is found.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub root: PathBuf,
    pub base: PathBuf,
    pub extension: String,
    pub exclude: Vec<String>,
}

impl ScanOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            root: config.sources.root.clone(),
            base: config.sources_base(),
            extension: config.sources.extension.clone(),
            exclude: config.sources.exclude.clone(),
        }
    }
}

fn is_excluded(entry: &DirEntry, exclude: &[String]) -> bool {
    entry.file_type().is_dir()
        && exclude
            .iter()
            .any(|name| entry.file_name() == OsStr::new(name))
}

/// `/`-separated form of a relative path.
fn to_slash(path: &Path) -> Result<String> {
    let mut parts = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => parts.push(
                part.to_str()
                    .with_context(|| format!("Path is not valid UTF-8: {}", path.display()))?,
            ),
            other => bail!("Unexpected path component {:?} in {}", other, path.display()),
        }
    }
    Ok(parts.join("/"))
}

/// Every file under `root` with the configured extension, outside excluded
/// directories, as sorted `/`-separated paths relative to `base`.
///
/// Unreadable directories fail the scan rather than being skipped.
pub fn scan(options: &ScanOptions) -> Result<Vec<String>> {
    let root = fs::canonicalize(&options.root)
        .with_context(|| format!("Source root not found: {}", options.root.display()))?;
    let base = fs::canonicalize(&options.base)
        .with_context(|| format!("Base directory not found: {}", options.base.display()))?;

    let mut files = Vec::new();
    let walker = WalkDir::new(&root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|entry| !is_excluded(entry, &options.exclude));

    for entry in walker {
        let entry = entry.with_context(|| format!("Failed to scan {}", root.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        if entry.path().extension() != Some(OsStr::new(&options.extension)) {
            continue;
        }

        let relative = entry.path().strip_prefix(&base).with_context(|| {
            format!(
                "{} is not inside base directory {}",
                entry.path().display(),
                base.display()
            )
        })?;
        files.push(to_slash(relative)?);
    }

    files.sort();
    debug!(count = files.len(), root = %root.display(), "Scanned sources");
    Ok(files)
}

/// Entity records for scanned paths, in the given order.
pub fn entities(files: &[String], extension: &str) -> Vec<EntityRecord> {
    files
        .iter()
        .map(|path| {
            let name = path.rsplit('/').next().unwrap_or(path).to_string();
            EntityRecord {
                name,
                path: path.clone(),
                kind: EntityKind::source(extension),
                ref_id: IDS.id(IdRole::Ref, path),
                build_id: IDS.id(IdRole::Build, path),
                embed_id: None,
            }
        })
        .collect()
}

/// Registers scanned source files with the target's Sources phase.
#[derive(Debug, Clone)]
pub struct SourcesPatch {
    config: Config,
    extension: String,
    entities: Vec<EntityRecord>,
}

impl SourcesPatch {
    pub fn new(config: Config, files: &[String]) -> Self {
        let extension = config.sources.extension.clone();
        Self {
            entities: entities(files, &extension),
            extension,
            config,
        }
    }

    /// Scan the configured source tree. An empty scan is an error: it almost
    /// always means the root or extension is wrong.
    pub fn from_config(config: &Config) -> Result<Self> {
        let options = ScanOptions::from_config(config);
        let files = scan(&options)?;
        if files.is_empty() {
            bail!(
                "No .{} files found under {}",
                options.extension,
                options.root.display()
            );
        }
        info!("Found {} {} files", files.len(), options.extension);
        Ok(Self::new(config.clone(), &files))
    }
}

impl Patch for SourcesPatch {
    fn name(&self) -> &'static str {
        "sources"
    }

    fn label(&self) -> String {
        format!("{} files", self.extension)
    }

    fn entities(&self) -> &[EntityRecord] {
        &self.entities
    }

    /// Ids are derived from paths, so any id from a previous run proves it.
    fn already_applied(&self, doc: &Document) -> bool {
        self.entities
            .iter()
            .any(|entity| doc.contains(entity.ref_id.as_str()))
    }

    fn plan(&self, doc: &Document) -> Result<Planned> {
        let target = project::find_target(doc, &self.config.target, self.config.target_id()?.as_ref())?;
        let phase = project::find_phase(
            doc,
            &target,
            SOURCES_PHASE,
            self.config.sources.phase_id()?.as_ref(),
        )?;
        debug!(target = %target.id, phase = %phase, "Resolved Sources phase");

        let file_refs = self.entities.iter().map(render::file_reference).collect();
        let build_files = self
            .entities
            .iter()
            .map(|e| render::build_file(e, PHASE_NAME))
            .collect();
        let phase_items = self
            .entities
            .iter()
            .map(|e| render::list_item(&e.build_id, &format!("{} in {}", e.name, PHASE_NAME)))
            .collect();

        let mut planned = Planned::default();
        planned
            .plan
            .insert(Anchor::section_end("PBXFileReference"), file_refs)
            .insert(Anchor::section_end("PBXBuildFile"), build_files)
            .insert(Anchor::list(&phase, &["files"]), phase_items);

        planned.steps = vec![
            format!("Added {} {} files to project", self.entities.len(), self.extension),
            "Added file references".to_string(),
            "Added build files".to_string(),
            format!("Updated {} build phase", PHASE_NAME),
        ];
        Ok(planned)
    }
}
