use serde::Serialize;

use crate::id::ObjectId;

/// What kind of file an entity is. Determines the file type and source tree
/// written into its `PBXFileReference`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// A source file compiled by the Sources phase, referenced from the
    /// project root.
    Source { file_type: String },
    /// A prebuilt binary bundle, referenced relative to its group.
    XcFramework,
}

impl EntityKind {
    /// Source kind for a file extension (without the dot).
    pub fn source(extension: &str) -> Self {
        Self::Source {
            file_type: source_file_type(extension).to_string(),
        }
    }

    pub fn file_type(&self) -> &str {
        match self {
            Self::Source { file_type } => file_type,
            Self::XcFramework => "wrapper.xcframework",
        }
    }

    pub fn source_tree(&self) -> &'static str {
        match self {
            Self::Source { .. } => "SOURCE_ROOT",
            Self::XcFramework => "<group>",
        }
    }
}

/// The `lastKnownFileType` Xcode uses for a source extension.
pub fn source_file_type(extension: &str) -> &'static str {
    match extension {
        "swift" => "sourcecode.swift",
        "m" => "sourcecode.c.objc",
        "mm" => "sourcecode.cpp.objcpp",
        "c" => "sourcecode.c.c",
        "h" => "sourcecode.c.h",
        "cpp" | "cc" | "cxx" => "sourcecode.cpp.cpp",
        "metal" => "sourcecode.metal",
        _ => "text",
    }
}

/// One file or bundle to register, with the identifiers derived for it.
///
/// Records are built once per run from the scan result and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityRecord {
    /// Display name, used in `/* ... */` comments.
    pub name: String,
    /// Path written into the file reference.
    pub path: String,
    pub kind: EntityKind,
    pub ref_id: ObjectId,
    pub build_id: ObjectId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embed_id: Option<ObjectId>,
}
