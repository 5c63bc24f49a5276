//! Raw and canonical module names.

use crate::PackageName;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Raw module names under this prefix are kernel JavaScript modules.
pub const KERNEL_PREFIX: &str = "Gren.Kernel.";

const MAX_RAW_LEN: usize = 255;

/// A raw module name as written in source: dot-separated capitalized segments.
///
/// Raw names compare as opaque strings; which package a raw name belongs to
/// is context-dependent until it is paired into a [`CanonicalModule`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Raw(String);

/// Module name parse failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModuleNameError {
    /// Empty name or empty segment.
    #[error("module name `{0}` has an empty segment")]
    EmptySegment(String),
    /// A segment does not start with an uppercase ASCII letter.
    #[error("module name segment `{0}` must start with an uppercase letter")]
    BadSegmentStart(String),
    /// A segment contains a character outside `A-Z a-z 0-9 _`.
    #[error("module name segment `{0}` may only contain letters, digits, and underscores")]
    BadSegmentChar(String),
    /// Longer than the 255-byte limit.
    #[error("module name is longer than {MAX_RAW_LEN} bytes")]
    TooLong,
}

fn check_segment(segment: &str) -> Result<(), ModuleNameError> {
    let mut chars = segment.chars();
    match chars.next() {
        None => return Err(ModuleNameError::EmptySegment(segment.to_string())),
        Some(c) if !c.is_ascii_uppercase() => {
            return Err(ModuleNameError::BadSegmentStart(segment.to_string()));
        }
        Some(_) => {}
    }
    if chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Ok(())
    } else {
        Err(ModuleNameError::BadSegmentChar(segment.to_string()))
    }
}

impl Raw {
    /// The dotted name as a string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Is this name in the kernel JavaScript namespace?
    #[must_use]
    pub fn is_kernel(&self) -> bool {
        self.0.starts_with(KERNEL_PREFIX)
    }

    /// The relative source path for this module, e.g. `Json/Decode` + extension.
    #[must_use]
    pub fn to_rel_path(&self, extension: &str) -> String {
        let mut path = self.0.replace('.', "/");
        path.push('.');
        path.push_str(extension);
        path
    }
}

impl FromStr for Raw {
    type Err = ModuleNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() > MAX_RAW_LEN {
            return Err(ModuleNameError::TooLong);
        }
        if s.is_empty() {
            return Err(ModuleNameError::EmptySegment(String::new()));
        }
        for segment in s.split('.') {
            check_segment(segment)?;
        }
        Ok(Self(s.to_string()))
    }
}

impl fmt::Display for Raw {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for Raw {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Raw {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// A module name pinned to the package that owns it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CanonicalModule {
    /// Owning package.
    pub package: PackageName,
    /// Raw name within that package.
    pub module: Raw,
}

impl fmt::Display for CanonicalModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.package, self.module)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_dotted_capitalized_names() {
        for name in ["Main", "Json.Decode", "Html.Attributes", "My_Mod.V2"] {
            assert!(name.parse::<Raw>().is_ok(), "rejected {name}");
        }
    }

    #[test]
    fn rejects_bad_segments() {
        assert!("json.Decode".parse::<Raw>().is_err());
        assert!("Json..Decode".parse::<Raw>().is_err());
        assert!("Json.Decode.".parse::<Raw>().is_err());
        assert!("Json-Decode".parse::<Raw>().is_err());
        assert!("".parse::<Raw>().is_err());
    }

    #[test]
    fn kernel_namespace() {
        let kernel: Raw = "Gren.Kernel.Scheduler".parse().unwrap();
        let plain: Raw = "Gren.Scheduler".parse().unwrap();
        assert!(kernel.is_kernel());
        assert!(!plain.is_kernel());
    }

    #[test]
    fn rel_path_swaps_dots() {
        let name: Raw = "Json.Decode".parse().unwrap();
        assert_eq!(name.to_rel_path("gren"), "Json/Decode.gren");
    }
}
