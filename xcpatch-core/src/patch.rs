//! Two-phase patching.
//!
//! A [`PatchPlan`] collects every insertion a utility wants to make. Nothing
//! touches the text until [`PatchPlan::commit`] has resolved *all* anchors;
//! a single unresolved anchor aborts the whole plan.

use serde::Serialize;
use tracing::debug;

use crate::document::Document;
use crate::error::{AnchorError, PatchError};
use crate::models::Anchor;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedInsertion {
    pub anchor: Anchor,
    pub lines: Vec<String>,
}

/// Text to splice at a resolved offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Insertion {
    pub offset: usize,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PatchPlan {
    insertions: Vec<PlannedInsertion>,
}

impl PatchPlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `lines` for insertion at `anchor`. Insertions sharing an offset
    /// keep the order they were queued in.
    pub fn insert(&mut self, anchor: Anchor, lines: Vec<String>) -> &mut Self {
        self.insertions.push(PlannedInsertion { anchor, lines });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.insertions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.insertions.len()
    }

    /// Resolve every anchor against `doc`. Fails listing every anchor that
    /// did not match exactly once.
    pub fn resolve(&self, doc: &Document) -> Result<Vec<Insertion>, PatchError> {
        let mut resolved = Vec::with_capacity(self.insertions.len());
        let mut failed: Vec<AnchorError> = Vec::new();

        for planned in &self.insertions {
            match doc.resolve(&planned.anchor) {
                Ok(point) => {
                    debug!(
                        anchor = %planned.anchor,
                        line = doc.line_of(point.offset),
                        lines = planned.lines.len(),
                        "resolved anchor"
                    );
                    resolved.push(Insertion {
                        offset: point.offset,
                        text: point.render(&planned.lines),
                    });
                }
                Err(e) => failed.push(e),
            }
        }

        if failed.is_empty() {
            Ok(resolved)
        } else {
            Err(PatchError::Unresolved(failed))
        }
    }

    /// Resolve all anchors, then apply all insertions. Returns the new text.
    pub fn commit(&self, doc: &Document) -> Result<String, PatchError> {
        let insertions = self.resolve(doc)?;
        Ok(apply(doc.text(), insertions))
    }
}

/// Splice insertions into `text`. Offsets refer to the original text.
pub fn apply(text: &str, insertions: Vec<Insertion>) -> String {
    let mut ordered: Vec<(usize, Insertion)> = insertions.into_iter().enumerate().collect();
    ordered.sort_by_key(|(seq, ins)| (ins.offset, *seq));

    let extra: usize = ordered.iter().map(|(_, ins)| ins.text.len()).sum();
    let mut out = String::with_capacity(text.len() + extra);
    let mut cursor = 0;
    for (_, ins) in ordered {
        out.push_str(&text[cursor..ins.offset]);
        out.push_str(&ins.text);
        cursor = ins.offset;
    }
    out.push_str(&text[cursor..]);
    out
}
