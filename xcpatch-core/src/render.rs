//! Serialisation of entries in the layout Xcode itself writes.

use crate::document::is_bare_char;
use crate::id::ObjectId;
use crate::models::EntityRecord;

/// Indentation of an object entry inside the `objects` dictionary.
pub const OBJECT_INDENT: &str = "\t\t";
/// Indentation of a key inside an object body.
pub const KEY_INDENT: &str = "\t\t\t";
/// Indentation of an item inside an object's list or nested dictionary.
pub const ITEM_INDENT: &str = "\t\t\t\t";

/// Quote a string value if it contains characters outside the bare set.
pub fn quote(value: &str) -> String {
    if !value.is_empty() && value.chars().all(is_bare_char) {
        return value.to_string();
    }
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}

/// `PBXFileReference` entry for an entity.
pub fn file_reference(entity: &EntityRecord) -> String {
    format!(
        "{}{} /* {} */ = {{isa = PBXFileReference; lastKnownFileType = {}; path = {}; sourceTree = {}; }};",
        OBJECT_INDENT,
        entity.ref_id,
        entity.name,
        entity.kind.file_type(),
        quote(&entity.path),
        quote(entity.kind.source_tree()),
    )
}

/// `PBXBuildFile` entry placing an entity in the phase named `phase`.
pub fn build_file(entity: &EntityRecord, phase: &str) -> String {
    format!(
        "{}{} /* {} in {} */ = {{isa = PBXBuildFile; fileRef = {} /* {} */; }};",
        OBJECT_INDENT, entity.build_id, entity.name, phase, entity.ref_id, entity.name,
    )
}

/// `PBXBuildFile` entry for the embed copy of a framework. Returns `None`
/// for entities without an embed id.
pub fn embed_file(entity: &EntityRecord, phase: &str) -> Option<String> {
    let embed_id = entity.embed_id.as_ref()?;
    Some(format!(
        "{}{} /* {} in {} */ = {{isa = PBXBuildFile; fileRef = {} /* {} */; settings = {{ATTRIBUTES = (CodeSignOnCopy, RemoveHeadersOnCopy, ); }}; }};",
        OBJECT_INDENT, embed_id, entity.name, phase, entity.ref_id, entity.name,
    ))
}

/// A list item referencing an object, with its display comment.
pub fn list_item(id: &ObjectId, comment: &str) -> String {
    format!("{}{} /* {} */,", ITEM_INDENT, id, comment)
}

/// A `PBXCopyFilesBuildPhase` that embeds frameworks into the app bundle.
pub fn embed_frameworks_phase(id: &ObjectId, name: &str, files: &[String]) -> Vec<String> {
    let mut lines = vec![
        format!("{}{} /* {} */ = {{", OBJECT_INDENT, id, name),
        format!("{}isa = PBXCopyFilesBuildPhase;", KEY_INDENT),
        format!("{}buildActionMask = 2147483647;", KEY_INDENT),
        format!("{}dstPath = \"\";", KEY_INDENT),
        format!("{}dstSubfolderSpec = 10;", KEY_INDENT),
        format!("{}files = (", KEY_INDENT),
    ];
    lines.extend(files.iter().cloned());
    lines.extend([
        format!("{});", KEY_INDENT),
        format!("{}name = {};", KEY_INDENT, quote(name)),
        format!("{}runOnlyForDeploymentPostprocessing = 0;", KEY_INDENT),
        format!("{}}};", OBJECT_INDENT),
    ]);
    lines
}

/// Lines for a whole new section holding `body`.
pub fn section(isa: &str, body: Vec<String>) -> Vec<String> {
    let mut lines = vec![crate::models::section_begin(isa)];
    lines.extend(body);
    lines.push(crate::models::section_end(isa));
    lines.push(String::new());
    lines
}
