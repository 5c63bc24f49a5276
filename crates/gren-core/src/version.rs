//! Three-component versions and half-open version constraints.

use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A published package version.
///
/// Ordering is lexicographic by `(major, minor, patch)`, which the solver
/// relies on to try candidates newest-first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    /// Major component.
    pub major: u16,
    /// Minor component.
    pub minor: u16,
    /// Patch component.
    pub patch: u16,
}

/// Version parse failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VersionError {
    /// Not exactly three dot-separated components.
    #[error("expected a version like 2.0.4, found `{0}`")]
    BadFormat(String),
    /// A component is not a plain decimal number.
    #[error("version component `{0}` is not a number between 0 and 65535")]
    BadComponent(String),
    /// A component has a leading zero (e.g. `01`).
    #[error("version component `{0}` has a leading zero")]
    LeadingZero(String),
}

impl Version {
    /// The only legal initial published version.
    pub const ONE: Self = Self::new(1, 0, 0);

    /// Create a version from its components.
    #[must_use]
    pub const fn new(major: u16, minor: u16, patch: u16) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// The immediate successor, `(major, minor, patch + 1)`.
    ///
    /// `[v, v.next_patch())` therefore admits exactly `v`.
    #[must_use]
    pub const fn next_patch(self) -> Self {
        Self::new(self.major, self.minor, self.patch + 1)
    }

    /// The first version of the next minor series.
    #[must_use]
    pub const fn next_minor(self) -> Self {
        Self::new(self.major, self.minor + 1, 0)
    }

    /// The first version of the next major series.
    #[must_use]
    pub const fn next_major(self) -> Self {
        Self::new(self.major + 1, 0, 0)
    }

    fn parse_component(text: &str) -> Result<u16, VersionError> {
        if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
            return Err(VersionError::BadComponent(text.to_string()));
        }
        if text.len() > 1 && text.starts_with('0') {
            return Err(VersionError::LeadingZero(text.to_string()));
        }
        text.parse()
            .map_err(|_| VersionError::BadComponent(text.to_string()))
    }
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split('.');
        let (Some(major), Some(minor), Some(patch), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(VersionError::BadFormat(s.to_string()));
        };
        Ok(Self::new(
            Self::parse_component(major)?,
            Self::parse_component(minor)?,
            Self::parse_component(patch)?,
        ))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// A half-open version range `[lo, hi)` with `lo <= hi`.
///
/// The textual form is exactly `"LO <= v < HI"` with single spaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Constraint {
    lo: Version,
    hi: Version,
}

/// Constraint parse failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConstraintError {
    /// Not of the form `LO <= v < HI`.
    #[error("expected a constraint like `1.0.0 <= v < 2.0.0`, found `{0}`")]
    BadFormat(String),
    /// A bound failed to parse as a version.
    #[error("bad version in constraint: {0}")]
    BadVersion(#[from] VersionError),
    /// The bounds are inverted (`lo > hi`).
    #[error("constraint lower bound {lo} is above upper bound {hi}")]
    InvertedBounds {
        /// Lower bound.
        lo: Version,
        /// Upper bound.
        hi: Version,
    },
}

impl Constraint {
    /// Create a constraint, rejecting inverted bounds.
    pub fn new(lo: Version, hi: Version) -> Result<Self, ConstraintError> {
        if lo > hi {
            return Err(ConstraintError::InvertedBounds { lo, hi });
        }
        Ok(Self { lo, hi })
    }

    /// The widest legal constraint, `[1.0.0, 65535.0.0)`.
    #[must_use]
    pub const fn anything() -> Self {
        Self {
            lo: Version::ONE,
            hi: Version::new(u16::MAX, 0, 0),
        }
    }

    /// The constraint admitting exactly `version`.
    #[must_use]
    pub const fn exactly(version: Version) -> Self {
        Self {
            lo: version,
            hi: version.next_patch(),
        }
    }

    /// `[version, nextMajor)`, the default constraint for a fresh install.
    #[must_use]
    pub const fn until_next_major(version: Version) -> Self {
        Self {
            lo: version,
            hi: version.next_major(),
        }
    }

    /// `[version, nextMinor)`.
    #[must_use]
    pub const fn until_next_minor(version: Version) -> Self {
        Self {
            lo: version,
            hi: version.next_minor(),
        }
    }

    /// Lower bound (inclusive).
    #[must_use]
    pub const fn lower_bound(self) -> Version {
        self.lo
    }

    /// Upper bound (exclusive).
    #[must_use]
    pub const fn upper_bound(self) -> Version {
        self.hi
    }

    /// Does `version` fall inside the range?
    #[must_use]
    pub fn satisfies(self, version: Version) -> bool {
        self.lo <= version && version < self.hi
    }

    /// Narrow two constraints to their overlap, `None` when disjoint or empty.
    #[must_use]
    pub fn intersect(self, other: Self) -> Option<Self> {
        let lo = self.lo.max(other.lo);
        let hi = self.hi.min(other.hi);
        (lo < hi).then_some(Self { lo, hi })
    }

    /// Does the range accept the running compiler?
    #[must_use]
    pub fn accepts_compiler(self) -> bool {
        self.satisfies(crate::COMPILER_VERSION)
    }
}

impl FromStr for Constraint {
    type Err = ConstraintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut words = s.split(' ');
        let (Some(lo), Some("<="), Some("v"), Some("<"), Some(hi), None) = (
            words.next(),
            words.next(),
            words.next(),
            words.next(),
            words.next(),
            words.next(),
        ) else {
            return Err(ConstraintError::BadFormat(s.to_string()));
        };
        Self::new(lo.parse()?, hi.parse()?)
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <= v < {}", self.lo, self.hi)
    }
}

impl Serialize for Constraint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Constraint {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn v(major: u16, minor: u16, patch: u16) -> Version {
        Version::new(major, minor, patch)
    }

    #[test]
    fn version_parse_roundtrip() {
        let version: Version = "2.10.3".parse().expect("should parse");
        assert_eq!(version, v(2, 10, 3));
        assert_eq!(version.to_string(), "2.10.3");
    }

    #[test]
    fn version_parse_rejects_garbage() {
        assert!("2.10".parse::<Version>().is_err());
        assert!("2.10.3.4".parse::<Version>().is_err());
        assert!("2.x.3".parse::<Version>().is_err());
        assert!("2.10.-3".parse::<Version>().is_err());
        assert_eq!(
            "2.03.1".parse::<Version>(),
            Err(VersionError::LeadingZero("03".to_string()))
        );
    }

    #[test]
    fn version_order_is_lexicographic() {
        assert!(v(1, 0, 0) < v(1, 0, 1));
        assert!(v(1, 9, 9) < v(2, 0, 0));
        assert!(v(1, 2, 0) < v(1, 10, 0));
    }

    #[test]
    fn constraint_parse_is_strict() {
        let constraint: Constraint = "1.0.0 <= v < 2.0.0".parse().expect("should parse");
        assert_eq!(constraint, Constraint::until_next_major(Version::ONE));
        assert!("1.0.0 <= v <= 2.0.0".parse::<Constraint>().is_err());
        assert!("1.0.0<=v<2.0.0".parse::<Constraint>().is_err());
        assert!("1.0.0  <= v < 2.0.0".parse::<Constraint>().is_err());
    }

    #[test]
    fn constraint_is_half_open() {
        let constraint = Constraint::until_next_major(Version::ONE);
        assert!(constraint.satisfies(v(1, 0, 0)));
        assert!(constraint.satisfies(v(1, 99, 4)));
        assert!(!constraint.satisfies(v(2, 0, 0)));
        assert!(!constraint.satisfies(v(0, 19, 1)));
    }

    #[test]
    fn exactly_admits_one_version() {
        let constraint = Constraint::exactly(v(1, 2, 3));
        assert!(constraint.satisfies(v(1, 2, 3)));
        assert!(!constraint.satisfies(v(1, 2, 4)));
        assert!(!constraint.satisfies(v(1, 2, 2)));
    }

    #[test]
    fn intersect_narrows_or_empties() {
        let a = Constraint::new(v(1, 0, 0), v(3, 0, 0)).unwrap();
        let b = Constraint::new(v(2, 0, 0), v(4, 0, 0)).unwrap();
        assert_eq!(
            a.intersect(b),
            Some(Constraint::new(v(2, 0, 0), v(3, 0, 0)).unwrap())
        );

        let c = Constraint::new(v(3, 0, 0), v(4, 0, 0)).unwrap();
        assert_eq!(a.intersect(c), None);
    }

    proptest! {
        #[test]
        fn version_display_parse_roundtrip(major in 0u16..500, minor in 0u16..500, patch in 0u16..500) {
            let version = v(major, minor, patch);
            let reparsed: Version = version.to_string().parse().unwrap();
            prop_assert_eq!(version, reparsed);
        }

        #[test]
        fn intersect_is_commutative(
            a in 0u16..20, b in 0u16..20, c in 0u16..20, d in 0u16..20,
        ) {
            let (lo1, hi1) = (a.min(b), a.max(b));
            let (lo2, hi2) = (c.min(d), c.max(d));
            let x = Constraint::new(v(lo1, 0, 0), v(hi1, 0, 0)).unwrap();
            let y = Constraint::new(v(lo2, 0, 0), v(hi2, 0, 0)).unwrap();
            prop_assert_eq!(x.intersect(y), y.intersect(x));
        }
    }
}
