//! The read → guard → plan → commit → write cycle shared by both utilities.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;
use xcpatch_core::{Document, EntityRecord, PatchPlan};

use crate::outcome::{Outcome, Status};
use crate::writeback::write_atomic;

/// Insertions a utility wants to make, plus what to tell the user.
#[derive(Debug, Default)]
pub struct Planned {
    pub plan: PatchPlan,
    pub steps: Vec<String>,
    pub warnings: Vec<String>,
}

/// A change to a project descriptor.
pub trait Patch {
    /// Short name used in logs and reports.
    fn name(&self) -> &'static str;

    /// Human label for the entities, e.g. "swift files".
    fn label(&self) -> String;

    fn entities(&self) -> &[EntityRecord];

    /// True if a previous run already applied this patch. Checked once for
    /// the whole patch, before planning.
    fn already_applied(&self, doc: &Document) -> bool;

    fn plan(&self, doc: &Document) -> Result<Planned>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Write,
    DryRun,
}

/// Apply `patch` to the descriptor at `path`.
///
/// Nothing is written unless every insertion in the plan resolved.
pub fn run(path: &Path, patch: &dyn Patch, mode: Mode) -> Result<Outcome> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read project file {}", path.display()))?;
    let doc = Document::parse(text)
        .with_context(|| format!("Failed to parse project file {}", path.display()))?;

    let outcome = |status: Status, steps: Vec<String>, warnings: Vec<String>| Outcome {
        patch: patch.name(),
        project: path.to_path_buf(),
        status,
        label: patch.label(),
        entities: patch.entities().to_vec(),
        steps,
        warnings,
    };

    if patch.already_applied(&doc) {
        info!(patch = patch.name(), "Already applied, skipping");
        return Ok(outcome(Status::AlreadyApplied, Vec::new(), Vec::new()));
    }

    let planned = patch.plan(&doc)?;
    if planned.plan.is_empty() {
        info!(patch = patch.name(), "Nothing to insert, skipping");
        return Ok(outcome(Status::AlreadyApplied, planned.steps, planned.warnings));
    }

    let patched = planned
        .plan
        .commit(&doc)
        .with_context(|| format!("Refusing to modify {}", path.display()))?;

    let status = match mode {
        Mode::Write => {
            write_atomic(path, &patched)?;
            info!(
                patch = patch.name(),
                insertions = planned.plan.len(),
                "Wrote {}",
                path.display()
            );
            Status::Applied
        }
        Mode::DryRun => {
            info!(patch = patch.name(), "Dry run, not writing");
            Status::DryRun
        }
    };

    Ok(outcome(status, planned.steps, planned.warnings))
}
