//! Target platforms and the root-vs-dependency compatibility rule.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Where a project's generated JavaScript is meant to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Platform-independent code, usable from any root.
    Common,
    /// Browser applications.
    Browser,
    /// Node applications.
    Node,
}

impl Platform {
    /// Can a root targeting `self` depend on a package targeting `dependency`?
    ///
    /// A dependency is compatible when it targets the same platform or is
    /// platform-independent.
    #[must_use]
    pub fn compatible(self, dependency: Self) -> bool {
        self == dependency || dependency == Self::Common
    }

    /// The manifest spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Common => "common",
            Self::Browser => "browser",
            Self::Node => "node",
        }
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "common" => Ok(Self::Common),
            "browser" => Ok(Self::Browser),
            "node" => Ok(Self::Node),
            _ => Err(format!(
                "expected `common`, `browser`, or `node`, found `{s}`"
            )),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compatibility_rule() {
        for platform in [Platform::Common, Platform::Browser, Platform::Node] {
            assert!(platform.compatible(platform));
            assert!(platform.compatible(Platform::Common));
        }
        assert!(!Platform::Browser.compatible(Platform::Node));
        assert!(!Platform::Node.compatible(Platform::Browser));
        assert!(!Platform::Common.compatible(Platform::Browser));
        assert!(!Platform::Common.compatible(Platform::Node));
    }

    #[test]
    fn parse_and_display() {
        for platform in [Platform::Common, Platform::Browser, Platform::Node] {
            assert_eq!(platform.as_str().parse::<Platform>(), Ok(platform));
        }
        assert!("wasm".parse::<Platform>().is_err());
    }
}
