//! What a run did, for the terminal or as JSON.

use std::path::PathBuf;

use serde::Serialize;
use xcpatch_core::EntityRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// The descriptor was rewritten.
    Applied,
    /// A previous run already registered the entities; nothing was written.
    AlreadyApplied,
    /// The plan was computed and verified but not written.
    DryRun,
}

#[derive(Debug, Clone, Serialize)]
pub struct Outcome {
    pub patch: &'static str,
    pub project: PathBuf,
    pub status: Status,
    /// Human label for the entities, e.g. "swift files".
    pub label: String,
    pub entities: Vec<EntityRecord>,
    pub steps: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl Outcome {
    /// Status lines for the terminal.
    pub fn render_text(&self) -> String {
        let mut out = format!("Found {} {}\n", self.entities.len(), self.label);

        match self.status {
            Status::AlreadyApplied => {
                out.push_str(&format!(
                    "{} already present in {}. Skipping.\n",
                    capitalize(&self.label),
                    self.project.display()
                ));
                return out;
            }
            Status::Applied => {
                for step in &self.steps {
                    out.push_str(&format!("✅ {}\n", step));
                }
            }
            Status::DryRun => {
                out.push_str("Dry run, nothing written. Would apply:\n");
                for step in &self.steps {
                    out.push_str(&format!("  • {}\n", step));
                }
            }
        }

        for warning in &self.warnings {
            out.push_str(&format!("⚠️  {}\n", warning));
        }
        out
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
