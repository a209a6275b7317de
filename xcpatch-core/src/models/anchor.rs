use std::fmt;

use serde::Serialize;

use crate::id::ObjectId;

/// A location in the descriptor that receives inserted lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Anchor {
    /// Directly before the `/* End <isa> section */` sentinel.
    SectionEnd { isa: String },

    /// Where a `<isa>` section would sort among the existing sections.
    /// Only valid while no such section exists.
    NewSection { isa: String },

    /// Before the closing `)` of a list reached from an object through `keys`.
    ObjectList { object: ObjectId, keys: Vec<String> },

    /// Before the closing `}` of a dictionary reached from an object through `keys`.
    ObjectDict { object: ObjectId, keys: Vec<String> },
}

impl Anchor {
    pub fn section_end(isa: &str) -> Self {
        Self::SectionEnd {
            isa: isa.to_string(),
        }
    }

    pub fn new_section(isa: &str) -> Self {
        Self::NewSection {
            isa: isa.to_string(),
        }
    }

    pub fn list(object: &ObjectId, keys: &[&str]) -> Self {
        Self::ObjectList {
            object: object.clone(),
            keys: keys.iter().map(|k| k.to_string()).collect(),
        }
    }

    pub fn dict(object: &ObjectId, keys: &[&str]) -> Self {
        Self::ObjectDict {
            object: object.clone(),
            keys: keys.iter().map(|k| k.to_string()).collect(),
        }
    }
}

/// The sentinel comment opening a section.
pub fn section_begin(isa: &str) -> String {
    format!("/* Begin {} section */", isa)
}

/// The sentinel comment closing a section.
pub fn section_end(isa: &str) -> String {
    format!("/* End {} section */", isa)
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SectionEnd { isa } => write!(f, "{}", section_end(isa)),
            Self::NewSection { isa } => write!(f, "new {} section", isa),
            Self::ObjectList { object, keys } | Self::ObjectDict { object, keys } => {
                write!(f, "{}", object)?;
                for key in keys {
                    write!(f, ".{}", key)?;
                }
                Ok(())
            }
        }
    }
}
