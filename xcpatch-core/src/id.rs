//! Deterministic object identifiers.
//!
//! Xcode identifies every object in a project descriptor by a 24-character
//! uppercase hexadecimal string. Identifiers minted here are derived from a
//! seed string, so running a patch twice over the same inputs produces the
//! same identifiers and the same diff.

use std::fmt;

use serde::{Deserialize, Serialize};
use md5::{Digest, Md5};

/// Number of hex characters in an object identifier.
pub const ID_LEN: usize = 24;

/// A 24-character uppercase hexadecimal object identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(String);

impl ObjectId {
    /// Derive an identifier from a seed string: the first 24 digits of the
    /// uppercase MD5 hex digest, matching ids written by earlier releases.
    pub fn from_seed(seed: &str) -> Self {
        let digest = Md5::digest(seed.as_bytes());
        let mut hex = hex::encode_upper(digest);
        hex.truncate(ID_LEN);
        Self(hex)
    }

    /// Wrap an identifier read from configuration or from a descriptor.
    ///
    /// Returns `None` unless `s` is exactly 24 hex digits. Lowercase digits are
    /// accepted and normalised to uppercase.
    pub fn parse(s: &str) -> Option<Self> {
        if is_object_id(s) {
            Some(Self(s.to_ascii_uppercase()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ObjectId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Returns true if `s` has the shape of an object identifier.
pub fn is_object_id(s: &str) -> bool {
    s.len() == ID_LEN && s.bytes().all(|b| b.is_ascii_hexdigit())
}

/// The part an identifier plays for an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdRole {
    /// `PBXFileReference`
    Ref,
    /// `PBXBuildFile` linked or compiled by a build phase
    Build,
    /// `PBXBuildFile` copied by an embed phase
    Embed,
    /// A build phase object
    Phase,
}

impl IdRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ref => "REF",
            Self::Build => "BUILD",
            Self::Embed => "EMBED",
            Self::Phase => "PHASE",
        }
    }
}

/// Builds identifiers scoped to one utility.
///
/// Seeds have the form `<NAMESPACE>_<ROLE>_<key>`; two utilities using
/// different namespaces never mint the same identifier for the same key.
#[derive(Debug, Clone, Copy)]
pub struct IdGenerator {
    namespace: &'static str,
}

impl IdGenerator {
    pub const fn new(namespace: &'static str) -> Self {
        Self { namespace }
    }

    pub fn seed(&self, role: IdRole, key: &str) -> String {
        format!("{}_{}_{}", self.namespace, role.as_str(), key)
    }

    pub fn id(&self, role: IdRole, key: &str) -> ObjectId {
        ObjectId::from_seed(&self.seed(role, key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;
    use std::collections::HashSet;

    #[test]
    fn test_same_seed_same_id() {
        let a = ObjectId::from_seed("EXPLICIT_SOURCE_REF_Bitkit/App.swift");
        let b = ObjectId::from_seed("EXPLICIT_SOURCE_REF_Bitkit/App.swift");
        assert_eq!(a, b);
    }

    #[test]
    fn test_id_shape() {
        let re = Regex::new("^[0-9A-F]{24}$").unwrap();
        for seed in ["", "a", "EXPLICIT_SOURCE_BUILD_Views/B.swift", "ünïcödé"] {
            let id = ObjectId::from_seed(seed);
            assert!(re.is_match(id.as_str()), "bad id {} for {:?}", id, seed);
        }
    }

    #[test]
    fn test_roles_produce_distinct_ids() {
        let ids = IdGenerator::new("XCFRAMEWORK");
        let key = "PaykitMobile.xcframework";
        let set: HashSet<_> = [IdRole::Ref, IdRole::Build, IdRole::Embed, IdRole::Phase]
            .into_iter()
            .map(|role| ids.id(role, key))
            .collect();
        assert_eq!(set.len(), 4);
    }

    #[test]
    fn test_no_collisions_across_many_paths() {
        let ids = IdGenerator::new("EXPLICIT_SOURCE");
        let set: HashSet<_> = (0..5000)
            .map(|i| ids.id(IdRole::Ref, &format!("Bitkit/Views/View{}.swift", i)))
            .collect();
        assert_eq!(set.len(), 5000);
    }

    #[test]
    fn test_known_digests() {
        let ids = IdGenerator::new("EXPLICIT_SOURCE");
        assert_eq!(
            ids.id(IdRole::Ref, "Bitkit/Models/A.swift").as_str(),
            "24481221FE43223860ED2C9F"
        );
        assert_eq!(
            ids.id(IdRole::Build, "Bitkit/Models/A.swift").as_str(),
            "B3A6AD91072F67ECBB485D65"
        );
        assert_eq!(
            ObjectId::from_seed("EXPLICIT_SOURCE_REF_Bitkit/App.swift").as_str(),
            "449AEA7D46793E72F1CC8552"
        );
    }

    #[test]
    fn test_seed_format() {
        let ids = IdGenerator::new("EXPLICIT_SOURCE");
        assert_eq!(
            ids.seed(IdRole::Build, "Models/A.swift"),
            "EXPLICIT_SOURCE_BUILD_Models/A.swift"
        );
    }

    #[test]
    fn test_parse_normalises_case() {
        let id = ObjectId::parse("96fe1f5d2c2de6aa006d0c8b").unwrap();
        assert_eq!(id.as_str(), "96FE1F5D2C2DE6AA006D0C8B");
        assert!(ObjectId::parse("96FE1F5D2C2DE6AA006D0C8").is_none());
        assert!(ObjectId::parse("96FE1F5D2C2DE6AA006D0C8G").is_none());
    }
}
