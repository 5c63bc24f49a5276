//! Package names and their naming rules.

use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// An `author/project` package identifier.
///
/// Both halves follow the registry naming rules checked by [`PackageName::from_str`].
/// Ordering is lexicographic on `(author, project)`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PackageName {
    author: String,
    project: String,
}

/// Which naming rule a candidate name violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameProblem {
    /// Empty string.
    Empty,
    /// Contains a byte outside `a-z`, `0-9`, `-`.
    BadChar,
    /// Contains an uppercase ASCII letter.
    Uppercase,
    /// Starts with a digit.
    LeadingDigit,
    /// Starts or ends with a hyphen.
    EdgeHyphen,
    /// Contains `--`.
    DoubleHyphen,
}

impl NameProblem {
    /// Human-readable rule description.
    #[must_use]
    pub const fn describe(self) -> &'static str {
        match self {
            Self::Empty => "must not be empty",
            Self::BadChar => "may only contain lowercase letters, digits, and hyphens",
            Self::Uppercase => "must not contain uppercase letters",
            Self::LeadingDigit => "must not start with a digit",
            Self::EdgeHyphen => "must not start or end with a hyphen",
            Self::DoubleHyphen => "must not contain a double hyphen",
        }
    }
}

/// Package name parse failure, naming the offending half.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PackageNameError {
    /// Not of the form `author/project`.
    #[error("expected a package name like `gren/core`, found `{0}`")]
    MissingSlash(String),
    /// The author half broke a rule.
    #[error("author `{author}` {}", problem.describe())]
    BadAuthor {
        /// Offending author string.
        author: String,
        /// Which rule failed.
        problem: NameProblem,
    },
    /// The project half broke a rule.
    #[error("project `{project}` {}", problem.describe())]
    BadProject {
        /// Offending project string.
        project: String,
        /// Which rule failed.
        problem: NameProblem,
    },
}

fn check_half(text: &str) -> Result<(), NameProblem> {
    if text.is_empty() {
        return Err(NameProblem::Empty);
    }
    let bytes = text.as_bytes();
    if bytes.iter().any(u8::is_ascii_uppercase) {
        return Err(NameProblem::Uppercase);
    }
    if bytes
        .iter()
        .any(|b| !(b.is_ascii_lowercase() || b.is_ascii_digit() || *b == b'-'))
    {
        return Err(NameProblem::BadChar);
    }
    if bytes[0].is_ascii_digit() {
        return Err(NameProblem::LeadingDigit);
    }
    if bytes[0] == b'-' || bytes[bytes.len() - 1] == b'-' {
        return Err(NameProblem::EdgeHyphen);
    }
    if text.contains("--") {
        return Err(NameProblem::DoubleHyphen);
    }
    Ok(())
}

impl PackageName {
    /// The author half.
    #[must_use]
    pub fn author(&self) -> &str {
        &self.author
    }

    /// The project half.
    #[must_use]
    pub fn project(&self) -> &str {
        &self.project
    }
}

impl FromStr for PackageName {
    type Err = PackageNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some((author, project)) = s.split_once('/') else {
            return Err(PackageNameError::MissingSlash(s.to_string()));
        };
        check_half(author).map_err(|problem| PackageNameError::BadAuthor {
            author: author.to_string(),
            problem,
        })?;
        check_half(project).map_err(|problem| PackageNameError::BadProject {
            project: project.to_string(),
            problem,
        })?;
        Ok(Self {
            author: author.to_string(),
            project: project.to_string(),
        })
    }
}

impl fmt::Display for PackageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.author, self.project)
    }
}

impl Serialize for PackageName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PackageName {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_well_formed_names() {
        for name in ["gren/core", "gren/browser", "lucamug/style-frame", "a1/b2"] {
            assert!(name.parse::<PackageName>().is_ok(), "rejected {name}");
        }
    }

    #[test]
    fn requires_a_slash() {
        assert_eq!(
            "grencore".parse::<PackageName>(),
            Err(PackageNameError::MissingSlash("grencore".to_string()))
        );
    }

    #[test]
    fn names_the_offending_half() {
        assert_eq!(
            "Gren/core".parse::<PackageName>(),
            Err(PackageNameError::BadAuthor {
                author: "Gren".to_string(),
                problem: NameProblem::Uppercase,
            })
        );
        assert_eq!(
            "gren/9core".parse::<PackageName>(),
            Err(PackageNameError::BadProject {
                project: "9core".to_string(),
                problem: NameProblem::LeadingDigit,
            })
        );
    }

    #[test]
    fn hyphen_rules() {
        assert!("gren/ui-kit".parse::<PackageName>().is_ok());
        for bad in ["gren/-core", "gren/core-", "gren/ui--kit", "-gren/core"] {
            assert!(bad.parse::<PackageName>().is_err(), "accepted {bad}");
        }
    }

    #[test]
    fn ordering_is_lexicographic() {
        let a: PackageName = "abc/zzz".parse().unwrap();
        let b: PackageName = "abd/aaa".parse().unwrap();
        assert!(a < b);
    }
}
