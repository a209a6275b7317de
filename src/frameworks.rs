//! XCFramework registration.
//!
//! Adds each bundle to the project's `Frameworks` group, links it from the
//! target's Frameworks phase, embeds it through an `Embed Frameworks`
//! copy-files phase and, optionally, extends `FRAMEWORK_SEARCH_PATHS`.

use anyhow::{bail, Result};
use tracing::{debug, warn};
use xcpatch_core::document::Node;
use xcpatch_core::render::{self, quote, ITEM_INDENT};
use xcpatch_core::{
    section_begin, Anchor, Document, EntityKind, EntityRecord, IdGenerator, IdRole, ObjectId,
};

use crate::config::Config;
use crate::pipeline::{Patch, Planned};
use crate::project::{self, Target, COPY_FILES_PHASE, FRAMEWORKS_PHASE};

const IDS: IdGenerator = IdGenerator::new("XCFRAMEWORK");

pub const LINK_PHASE_NAME: &str = "Frameworks";
pub const EMBED_PHASE_NAME: &str = "Embed Frameworks";
pub const GROUP_NAME: &str = "Frameworks";
pub const SEARCH_PATHS_KEY: &str = "FRAMEWORK_SEARCH_PATHS";
const INHERITED: &str = "$(inherited)";

/// Entity records for bundle file names, in the given order.
pub fn entities(bundles: &[String]) -> Vec<EntityRecord> {
    bundles
        .iter()
        .map(|name| EntityRecord {
            name: name.clone(),
            path: name.clone(),
            kind: EntityKind::XcFramework,
            ref_id: IDS.id(IdRole::Ref, name),
            build_id: IDS.id(IdRole::Build, name),
            embed_id: Some(IDS.id(IdRole::Embed, name)),
        })
        .collect()
}

/// Id of the `Embed Frameworks` phase created for a target.
pub fn embed_phase_id(target: &str) -> ObjectId {
    IDS.id(IdRole::Phase, target)
}

/// Registers prebuilt xcframeworks with a target.
#[derive(Debug, Clone)]
pub struct FrameworksPatch {
    config: Config,
    entities: Vec<EntityRecord>,
}

impl FrameworksPatch {
    pub fn new(config: Config) -> Self {
        Self {
            entities: entities(&config.frameworks.bundles),
            config,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        if config.frameworks.bundles.is_empty() {
            bail!("No frameworks configured");
        }
        Ok(Self::new(config.clone()))
    }

    /// The embed phase: reuse the target's existing Frameworks copy phase,
    /// or define a new one (in a new section if the project has none).
    fn plan_embed_phase(&self, doc: &Document, target: &Target, planned: &mut Planned) {
        let items: Vec<String> = self
            .entities
            .iter()
            .filter_map(|e| {
                let id = e.embed_id.as_ref()?;
                Some(render::list_item(id, &format!("{} in {}", e.name, EMBED_PHASE_NAME)))
            })
            .collect();

        if let Some(existing) = project::find_embed_phase(doc, target) {
            debug!(phase = %existing, "Reusing existing embed phase");
            planned
                .plan
                .insert(Anchor::list(&existing, &["files"]), items);
            planned
                .steps
                .push(format!("Added to existing {} build phase", EMBED_PHASE_NAME));
            return;
        }

        let phase_id = embed_phase_id(&target.name);
        let phase = render::embed_frameworks_phase(&phase_id, EMBED_PHASE_NAME, &items);

        planned.plan.insert(
            Anchor::list(&target.id, &["buildPhases"]),
            vec![render::list_item(&phase_id, EMBED_PHASE_NAME)],
        );
        if doc.contains(&section_begin(COPY_FILES_PHASE)) {
            planned
                .plan
                .insert(Anchor::section_end(COPY_FILES_PHASE), phase);
        } else {
            planned.plan.insert(
                Anchor::new_section(COPY_FILES_PHASE),
                render::section(COPY_FILES_PHASE, phase),
            );
        }
        planned
            .steps
            .push(format!("Added {} build phase", EMBED_PHASE_NAME));
    }

    /// Add the search path to every build configuration of the target.
    fn plan_search_paths(
        &self,
        doc: &Document,
        target: &Target,
        planned: &mut Planned,
    ) -> Result<()> {
        let search_path = self.config.frameworks.search_path.as_str();
        if search_path.is_empty() {
            return Ok(());
        }

        let mut updated = Vec::new();
        for config in project::build_configurations(doc, target)? {
            let settings = doc
                .object(config.id.as_str())
                .and_then(|o| o.get("buildSettings"));
            let current = settings.and_then(|s| s.get(SEARCH_PATHS_KEY));

            match current.map(|node| (node.as_str(), node.as_list())) {
                None => {
                    planned.plan.insert(
                        Anchor::dict(&config.id, &["buildSettings"]),
                        vec![
                            format!("{}{} = (", ITEM_INDENT, SEARCH_PATHS_KEY),
                            format!("{}\t{},", ITEM_INDENT, quote(INHERITED)),
                            format!("{}\t{},", ITEM_INDENT, quote(search_path)),
                            format!("{});", ITEM_INDENT),
                        ],
                    );
                    updated.push(config.name);
                }
                Some((_, Some(items))) => {
                    if items.iter().filter_map(Node::as_str).any(|p| p == search_path) {
                        continue;
                    }
                    planned.plan.insert(
                        Anchor::list(&config.id, &["buildSettings", SEARCH_PATHS_KEY]),
                        vec![format!("{}\t{},", ITEM_INDENT, quote(search_path))],
                    );
                    updated.push(config.name);
                }
                Some((Some(value), None)) => {
                    if value.split_whitespace().any(|p| p == search_path) {
                        continue;
                    }
                    warn!(
                        configuration = %config.name,
                        "{} is a single value; leaving it unchanged", SEARCH_PATHS_KEY
                    );
                    planned.warnings.push(format!(
                        "{} of {} is a single value; add {} manually",
                        SEARCH_PATHS_KEY, config.name, search_path
                    ));
                }
                Some((None, None)) => {
                    planned.warnings.push(format!(
                        "{} of {} has an unexpected shape; add {} manually",
                        SEARCH_PATHS_KEY, config.name, search_path
                    ));
                }
            }
        }

        if !updated.is_empty() {
            planned.steps.push(format!(
                "Added {} to {} ({})",
                search_path,
                SEARCH_PATHS_KEY,
                updated.join(", ")
            ));
        }
        Ok(())
    }
}

impl Patch for FrameworksPatch {
    fn name(&self) -> &'static str {
        "frameworks"
    }

    fn label(&self) -> String {
        "xcframeworks".to_string()
    }

    fn entities(&self) -> &[EntityRecord] {
        &self.entities
    }

    /// Any configured bundle name in the descriptor means a previous run.
    fn already_applied(&self, doc: &Document) -> bool {
        self.entities.iter().any(|e| doc.contains(&e.name))
    }

    fn plan(&self, doc: &Document) -> Result<Planned> {
        let frameworks = &self.config.frameworks;
        let target = project::find_target(
            doc,
            &self.config.target,
            self.config.target_id()?.as_ref(),
        )?;
        let link_phase = project::find_phase(
            doc,
            &target,
            FRAMEWORKS_PHASE,
            frameworks.phase_id()?.as_ref(),
        )?;
        let group = project::find_top_level_group(doc, GROUP_NAME, frameworks.group_id()?.as_ref())?;
        debug!(target = %target.id, phase = %link_phase, group = %group, "Resolved framework anchors");

        let mut planned = Planned::default();

        let file_refs = self.entities.iter().map(render::file_reference).collect();
        let mut build_files: Vec<String> = self
            .entities
            .iter()
            .map(|e| render::build_file(e, LINK_PHASE_NAME))
            .collect();
        build_files.extend(
            self.entities
                .iter()
                .filter_map(|e| render::embed_file(e, EMBED_PHASE_NAME)),
        );
        let group_items = self
            .entities
            .iter()
            .map(|e| render::list_item(&e.ref_id, &e.name))
            .collect();
        let link_items = self
            .entities
            .iter()
            .map(|e| render::list_item(&e.build_id, &format!("{} in {}", e.name, LINK_PHASE_NAME)))
            .collect();

        planned
            .plan
            .insert(Anchor::section_end("PBXFileReference"), file_refs)
            .insert(Anchor::section_end("PBXBuildFile"), build_files)
            .insert(Anchor::list(&group, &["children"]), group_items)
            .insert(Anchor::list(&link_phase, &["files"]), link_items);

        planned.steps.extend(
            self.entities
                .iter()
                .map(|e| format!("Added {} (ID: {})", e.name, e.ref_id)),
        );
        planned
            .steps
            .push(format!("Added to {} group", GROUP_NAME));
        planned
            .steps
            .push(format!("Added to {} build phase", LINK_PHASE_NAME));

        self.plan_embed_phase(doc, &target, &mut planned);
        self.plan_search_paths(doc, &target, &mut planned)?;

        Ok(planned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entities_have_three_distinct_ids() {
        let records = entities(&["PaykitMobile.xcframework".to_string()]);
        let record = &records[0];
        let embed = record.embed_id.as_ref().unwrap();
        assert_ne!(record.ref_id, record.build_id);
        assert_ne!(&record.build_id, embed);
        assert_ne!(&record.ref_id, embed);
    }

    #[test]
    fn test_ids_are_stable_across_runs() {
        let a = entities(&["PubkyNoise.xcframework".to_string()]);
        let b = entities(&["PubkyNoise.xcframework".to_string()]);
        assert_eq!(a, b);
        assert_eq!(embed_phase_id("Bitkit"), embed_phase_id("Bitkit"));
    }
}
