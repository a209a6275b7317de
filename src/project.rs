//! Lookups of well-known objects in a descriptor.
//!
//! Anchors are addressed by object id. These helpers find the ids from
//! stable names (target name, build phase isa, group name) so configuration
//! does not have to carry raw ids.

use thiserror::Error;
use xcpatch_core::document::Object;
use xcpatch_core::{Document, ObjectId};

pub const NATIVE_TARGET: &str = "PBXNativeTarget";
pub const SOURCES_PHASE: &str = "PBXSourcesBuildPhase";
pub const FRAMEWORKS_PHASE: &str = "PBXFrameworksBuildPhase";
pub const COPY_FILES_PHASE: &str = "PBXCopyFilesBuildPhase";
pub const GROUP: &str = "PBXGroup";
pub const BUILD_CONFIGURATION: &str = "XCBuildConfiguration";

/// `dstSubfolderSpec` of a copy-files phase targeting the Frameworks folder.
pub const FRAMEWORKS_FOLDER_SPEC: &str = "10";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("no native target named {0:?}")]
    TargetNotFound(String),

    #[error("{count} native targets are named {name:?}; set target_id")]
    AmbiguousTarget { name: String, count: usize },

    #[error("object {id} is not defined")]
    MissingObject { id: String },

    #[error("object {id} is a {found}, expected {expected}")]
    WrongIsa {
        id: String,
        expected: &'static str,
        found: String,
    },

    #[error("target {target} has no {isa}")]
    PhaseNotFound { target: String, isa: &'static str },

    #[error("target {target} has {count} {isa} phases; set the phase id explicitly")]
    AmbiguousPhase {
        target: String,
        isa: &'static str,
        count: usize,
    },

    #[error("main group has no child group named {0:?}")]
    GroupNotFound(String),

    #[error("project has no root object")]
    MissingRootObject,
}

/// A native target and the name it was found by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub id: ObjectId,
    pub name: String,
}

/// One build configuration of a target (`Debug`, `Release`, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildConfiguration {
    pub id: ObjectId,
    pub name: String,
}

fn object_id(object: &Object<'_>) -> Result<ObjectId, ResolveError> {
    ObjectId::parse(object.id).ok_or_else(|| ResolveError::MissingObject {
        id: object.id.to_string(),
    })
}

fn expect_isa<'a>(
    doc: &'a Document,
    id: &str,
    expected: &'static str,
) -> Result<Object<'a>, ResolveError> {
    let object = doc.object(id).ok_or_else(|| ResolveError::MissingObject {
        id: id.to_string(),
    })?;
    match object.isa() {
        Some(isa) if isa == expected => Ok(object),
        other => Err(ResolveError::WrongIsa {
            id: id.to_string(),
            expected,
            found: other.unwrap_or("object without isa").to_string(),
        }),
    }
}

/// Find the native target, by explicit id when given, otherwise by name.
pub fn find_target(
    doc: &Document,
    name: &str,
    explicit: Option<&ObjectId>,
) -> Result<Target, ResolveError> {
    if let Some(id) = explicit {
        let object = expect_isa(doc, id.as_str(), NATIVE_TARGET)?;
        return Ok(Target {
            id: id.clone(),
            name: object.str("name").unwrap_or(name).to_string(),
        });
    }

    let matches: Vec<_> = doc
        .objects_of_isa(NATIVE_TARGET)
        .filter(|o| o.str("name") == Some(name))
        .collect();

    match matches.as_slice() {
        [] => Err(ResolveError::TargetNotFound(name.to_string())),
        [object] => Ok(Target {
            id: object_id(object)?,
            name: name.to_string(),
        }),
        _ => Err(ResolveError::AmbiguousTarget {
            name: name.to_string(),
            count: matches.len(),
        }),
    }
}

/// Ids of the target's build phases with the given isa, in phase order.
pub fn phases_of(doc: &Document, target: &Target, isa: &str) -> Vec<ObjectId> {
    let Some(object) = doc.object(target.id.as_str()) else {
        return Vec::new();
    };
    object
        .list("buildPhases")
        .into_iter()
        .filter_map(|id| doc.object(id))
        .filter(|phase| phase.isa() == Some(isa))
        .filter_map(|phase| ObjectId::parse(phase.id))
        .collect()
}

/// The target's single build phase of `isa`, or the explicit id when given.
pub fn find_phase(
    doc: &Document,
    target: &Target,
    isa: &'static str,
    explicit: Option<&ObjectId>,
) -> Result<ObjectId, ResolveError> {
    if let Some(id) = explicit {
        expect_isa(doc, id.as_str(), isa)?;
        return Ok(id.clone());
    }

    let phases = phases_of(doc, target, isa);
    match phases.as_slice() {
        [] => Err(ResolveError::PhaseNotFound {
            target: target.name.clone(),
            isa,
        }),
        [id] => Ok(id.clone()),
        _ => Err(ResolveError::AmbiguousPhase {
            target: target.name.clone(),
            isa,
            count: phases.len(),
        }),
    }
}

/// An existing copy-files phase of the target that embeds into Frameworks.
pub fn find_embed_phase(doc: &Document, target: &Target) -> Option<ObjectId> {
    phases_of(doc, target, COPY_FILES_PHASE)
        .into_iter()
        .find(|id| {
            doc.object(id.as_str())
                .and_then(|o| o.str("dstSubfolderSpec"))
                == Some(FRAMEWORKS_FOLDER_SPEC)
        })
}

/// A group that is a direct child of the project's main group, matched by
/// `name` or, for groups without a name, by `path`.
pub fn find_top_level_group(
    doc: &Document,
    name: &str,
    explicit: Option<&ObjectId>,
) -> Result<ObjectId, ResolveError> {
    if let Some(id) = explicit {
        expect_isa(doc, id.as_str(), GROUP)?;
        return Ok(id.clone());
    }

    let main_group = doc
        .root_object()
        .and_then(|project| project.str("mainGroup"))
        .ok_or(ResolveError::MissingRootObject)?;
    let main_group = expect_isa(doc, main_group, GROUP)?;

    main_group
        .list("children")
        .into_iter()
        .filter_map(|id| doc.object(id))
        .filter(|child| child.isa() == Some(GROUP))
        .find(|child| child.str("name").or_else(|| child.str("path")) == Some(name))
        .map(|child| object_id(&child))
        .transpose()?
        .ok_or_else(|| ResolveError::GroupNotFound(name.to_string()))
}

/// The target's build configurations, via its configuration list.
pub fn build_configurations(
    doc: &Document,
    target: &Target,
) -> Result<Vec<BuildConfiguration>, ResolveError> {
    let object = expect_isa(doc, target.id.as_str(), NATIVE_TARGET)?;
    let Some(list_id) = object.str("buildConfigurationList") else {
        return Ok(Vec::new());
    };
    let list = expect_isa(doc, list_id, "XCConfigurationList")?;

    list.list("buildConfigurations")
        .into_iter()
        .map(|id| -> Result<BuildConfiguration, ResolveError> {
            let config = expect_isa(doc, id, BUILD_CONFIGURATION)?;
            Ok(BuildConfiguration {
                id: object_id(&config)?,
                name: config.str("name").unwrap_or(id).to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROJECT: &str = r#"// !$*UTF8*$!
{
	objects = {
		10000000000000000000000A /* App */ = {
			isa = PBXNativeTarget;
			buildConfigurationList = 10000000000000000000000E;
			buildPhases = (
				10000000000000000000000B /* Sources */,
				10000000000000000000000C /* Frameworks */,
				10000000000000000000000D /* Embed Frameworks */,
			);
			name = App;
		};
		10000000000000000000000B /* Sources */ = {isa = PBXSourcesBuildPhase; files = (); };
		10000000000000000000000C /* Frameworks */ = {isa = PBXFrameworksBuildPhase; files = (); };
		10000000000000000000000D /* Embed Frameworks */ = {isa = PBXCopyFilesBuildPhase; dstSubfolderSpec = 10; files = (); };
		10000000000000000000000E = {isa = XCConfigurationList; buildConfigurations = (10000000000000000000000F, 100000000000000000000010, ); };
		10000000000000000000000F /* Debug */ = {isa = XCBuildConfiguration; buildSettings = { }; name = Debug; };
		100000000000000000000010 /* Release */ = {isa = XCBuildConfiguration; buildSettings = { }; name = Release; };
		100000000000000000000011 = {isa = PBXGroup; children = (100000000000000000000012, 100000000000000000000013, ); sourceTree = "<group>"; };
		100000000000000000000012 /* App */ = {isa = PBXGroup; children = (); path = App; sourceTree = "<group>"; };
		100000000000000000000013 /* Frameworks */ = {isa = PBXGroup; children = (); name = Frameworks; sourceTree = "<group>"; };
		100000000000000000000014 /* Project object */ = {isa = PBXProject; mainGroup = 100000000000000000000011; targets = (10000000000000000000000A, ); };
	};
	rootObject = 100000000000000000000014 /* Project object */;
}
"#;

    fn doc() -> Document {
        Document::parse(PROJECT).unwrap()
    }

    fn id(s: &str) -> ObjectId {
        ObjectId::parse(s).unwrap()
    }

    #[test]
    fn test_find_target_by_name() {
        let doc = doc();
        let target = find_target(&doc, "App", None).unwrap();
        assert_eq!(target.id, id("10000000000000000000000A"));
        assert_eq!(
            find_target(&doc, "Other", None),
            Err(ResolveError::TargetNotFound("Other".into()))
        );
    }

    #[test]
    fn test_explicit_target_must_be_native_target() {
        let doc = doc();
        let err = find_target(&doc, "App", Some(&id("10000000000000000000000B"))).unwrap_err();
        assert!(matches!(err, ResolveError::WrongIsa { .. }));
    }

    #[test]
    fn test_find_phases() {
        let doc = doc();
        let target = find_target(&doc, "App", None).unwrap();
        assert_eq!(
            find_phase(&doc, &target, SOURCES_PHASE, None).unwrap(),
            id("10000000000000000000000B")
        );
        assert_eq!(
            find_phase(&doc, &target, FRAMEWORKS_PHASE, None).unwrap(),
            id("10000000000000000000000C")
        );
        assert_eq!(
            find_embed_phase(&doc, &target),
            Some(id("10000000000000000000000D"))
        );
        assert!(matches!(
            find_phase(&doc, &target, "PBXResourcesBuildPhase", None),
            Err(ResolveError::PhaseNotFound { .. })
        ));
    }

    #[test]
    fn test_find_top_level_group() {
        let doc = doc();
        assert_eq!(
            find_top_level_group(&doc, "Frameworks", None).unwrap(),
            id("100000000000000000000013")
        );
        assert_eq!(
            find_top_level_group(&doc, "App", None).unwrap(),
            id("100000000000000000000012")
        );
        assert!(find_top_level_group(&doc, "Products", None).is_err());
    }

    #[test]
    fn test_build_configurations() {
        let doc = doc();
        let target = find_target(&doc, "App", None).unwrap();
        let names: Vec<_> = build_configurations(&doc, &target)
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["Debug", "Release"]);
    }
}
